// ============================================
// Buildout - Рекурсивное построение квадродерева
// ============================================
//
// Узел больше sector_size по какой-либо оси делится пополам
// (нечётное - округляем вверх) по каждой такой оси:
// NW есть всегда, NE - если делится ширина, SW - если высота,
// SE - если обе. Остальные узлы - листья с собственным мешем.

use crate::error::TerrainError;
use crate::render::MeshAllocator;
use crate::terrain::heightfield::{compute_normals, HeightField, NormalField};
use crate::terrain::mesh::build_leaf_mesh;
use super::node::{LeafData, NodeArena, NodeId, NodeRect, QuadTreeNode, NE, NW, SE, SW};

/// Всё, что неизменно на протяжении одной сборки
pub(crate) struct BuildContext<'a, D> {
    pub cell_size: f32,
    pub sector_size: usize,
    pub field: &'a HeightField,
    pub normals: &'a NormalField,
    pub allocator: &'a mut D,
}

/// Проверить параметры и построить арену целиком
pub(crate) fn build_hierarchy<D: MeshAllocator>(
    allocator: &mut D,
    cell_size: f32,
    sector_size: usize,
    field: &HeightField,
) -> Result<NodeArena<D::Mesh>, TerrainError> {
    if !cell_size.is_finite() || cell_size <= 0.0 {
        return Err(TerrainError::InvalidCellSize(cell_size));
    }
    if sector_size == 0 {
        return Err(TerrainError::InvalidSectorSize(sector_size));
    }
    if field.width() < 2 || field.height() < 2 {
        return Err(TerrainError::DegenerateField {
            width: field.width(),
            height: field.height(),
        });
    }

    let normals = compute_normals(field, cell_size);

    let mut arena = NodeArena::new();
    let mut ctx = BuildContext {
        cell_size,
        sector_size,
        field,
        normals: &normals,
        allocator,
    };
    arena.buildout(&mut ctx, None, 0, 0, field.width(), field.height())?;

    Ok(arena)
}

impl<G> NodeArena<G> {
    /// Построить узел с прямоугольником (min_x, min_y) + (width, height) ячеек
    pub(crate) fn buildout<D: MeshAllocator<Mesh = G>>(
        &mut self,
        ctx: &mut BuildContext<'_, D>,
        parent: Option<NodeId>,
        min_x: usize,
        min_y: usize,
        width: usize,
        height: usize,
    ) -> Result<NodeId, TerrainError> {
        // Последний сектор ряда/столбца может быть неполным
        let width = width.min(ctx.field.width() - 1 - min_x);
        let height = height.min(ctx.field.height() - 1 - min_y);
        if width == 0 || height == 0 {
            return Err(TerrainError::DegenerateField { width, height });
        }

        let cell = ctx.cell_size;
        let rect = NodeRect {
            start_x: cell * min_x as f32,
            start_y: cell * min_y as f32,
            end_x: cell * (min_x + width) as f32,
            end_y: cell * (min_y + height) as f32,
        };
        let id = self.push(QuadTreeNode::new(parent, rect, cell));

        if width > ctx.sector_size || height > ctx.sector_size {
            self.build_children(ctx, id, min_x, min_y, width, height)?;
        } else {
            self.build_leaf(ctx, id, min_x, min_y, width, height)?;
        }

        Ok(id)
    }

    fn build_children<D: MeshAllocator<Mesh = G>>(
        &mut self,
        ctx: &mut BuildContext<'_, D>,
        id: NodeId,
        min_x: usize,
        min_y: usize,
        width: usize,
        height: usize,
    ) -> Result<(), TerrainError> {
        let split_x = width > ctx.sector_size;
        let split_y = height > ctx.sector_size;
        let half_w = if split_x { (width + 1) / 2 } else { width };
        let half_h = if split_y { (height + 1) / 2 } else { height };

        let mut quadrants = [None; 4];
        quadrants[NW] = Some((min_x, min_y, half_w, half_h));
        if split_x {
            quadrants[NE] = Some((min_x + half_w, min_y, width - half_w, half_h));
        }
        if split_y {
            quadrants[SW] = Some((min_x, min_y + half_h, half_w, height - half_h));
        }
        if split_x && split_y {
            quadrants[SE] = Some((min_x + half_w, min_y + half_h, width - half_w, height - half_h));
        }

        let mut children = [None; 4];
        let mut min_height = f32::MAX;
        let mut max_height = f32::MIN;

        for (slot, quadrant) in quadrants.iter().enumerate() {
            let Some((x, y, w, h)) = *quadrant else { continue };
            let child = self.buildout(ctx, Some(id), x, y, w, h)?;

            let child_node = self.node(child);
            min_height = min_height.min(child_node.min_height);
            max_height = max_height.max(child_node.max_height);
            children[slot] = Some(child);
        }

        let node = self.node_mut(id);
        node.children = children;
        node.set_extrema(min_height, max_height);
        Ok(())
    }

    fn build_leaf<D: MeshAllocator<Mesh = G>>(
        &mut self,
        ctx: &mut BuildContext<'_, D>,
        id: NodeId,
        min_x: usize,
        min_y: usize,
        width: usize,
        height: usize,
    ) -> Result<(), TerrainError> {
        // Копируем (height+1) x (width+1) сэмплов: границы дублируются с соседями
        let mut heights = Vec::with_capacity((width + 1) * (height + 1));
        for y in 0..=height {
            for x in 0..=width {
                heights.push(ctx.field.get(min_x + x, min_y + y));
            }
        }

        let min_height = heights.iter().copied().fold(f32::MAX, f32::min);
        let max_height = heights.iter().copied().fold(f32::MIN, f32::max);

        let mesh_data = build_leaf_mesh(
            &heights,
            width,
            height,
            (min_x, min_y),
            ctx.cell_size,
            ctx.normals,
            (ctx.field.width(), ctx.field.height()),
        );
        let label = format!("Terrain Leaf ({}, {})", min_x, min_y);
        let mesh = ctx
            .allocator
            .create_mesh(&label, &mesh_data.vertices, &mesh_data.indices)?;

        let node = self.node_mut(id);
        node.set_extrema(min_height, max_height);
        node.leaf = Some(LeafData {
            heights,
            cells_x: width,
            cells_y: height,
            mesh,
            num_verts: mesh_data.num_verts(),
            num_tris: mesh_data.num_tris(),
        });
        Ok(())
    }
}
