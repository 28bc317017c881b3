// ============================================
// Leaf Mesh - Генерация меша листа квадродерева
// ============================================
// Вершины идут построчно: (w+1) x (h+1), края дублируются
// с соседними листьями, поэтому меш каждого листа самодостаточен.
// На ячейку два треугольника против часовой стрелки.

use crate::terrain::heightfield::NormalField;
use super::vertex::TerrainVertex;

/// CPU данные меша листа до загрузки на GPU
#[derive(Debug, Clone, Default)]
pub struct LeafMeshData {
    pub vertices: Vec<TerrainVertex>,
    pub indices: Vec<u32>,
}

impl LeafMeshData {
    #[inline]
    pub fn num_verts(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn num_tris(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Построить меш листа
///
/// `heights` - локальное окно (cells_y + 1) x (cells_x + 1),
/// `origin` - индекс первого сэмпла окна в глобальной сетке,
/// `field_size` - размер глобальной сетки в сэмплах (для UV).
pub fn build_leaf_mesh(
    heights: &[f32],
    cells_x: usize,
    cells_y: usize,
    origin: (usize, usize),
    cell_size: f32,
    normals: &NormalField,
    field_size: (usize, usize),
) -> LeafMeshData {
    let verts_per_row = cells_x + 1;
    let num_verts = verts_per_row * (cells_y + 1);
    debug_assert_eq!(heights.len(), num_verts);

    let (origin_x, origin_y) = origin;
    let start_x = origin_x as f32 * cell_size;
    let start_z = origin_y as f32 * cell_size;

    // UV в долях всей сетки, чтобы текстура шла непрерывно по листьям
    let u_step = 1.0 / (field_size.0 - 1).max(1) as f32;
    let v_step = 1.0 / (field_size.1 - 1).max(1) as f32;

    let mut vertices = Vec::with_capacity(num_verts);
    for y in 0..=cells_y {
        for x in 0..=cells_x {
            let normal = normals.get(origin_x + x, origin_y + y);
            vertices.push(TerrainVertex::new(
                [
                    start_x + x as f32 * cell_size,
                    heights[y * verts_per_row + x],
                    start_z + y as f32 * cell_size,
                ],
                normal.into(),
                [
                    (origin_x + x) as f32 * u_step,
                    (origin_y + y) as f32 * v_step,
                ],
            ));
        }
    }

    let num_tris = cells_x * cells_y * 2;
    let mut indices = Vec::with_capacity(num_tris * 3);
    for y in 0..cells_y {
        let row_start = (y * verts_per_row) as u32;
        let row = verts_per_row as u32;

        for x in 0..cells_x as u32 {
            let v = row_start + x;
            // Верхний левый треугольник ячейки
            indices.extend_from_slice(&[v + row, v, v + 1]);
            // Нижний правый
            indices.extend_from_slice(&[v + row, v + 1, v + row + 1]);
        }
    }

    log::trace!(
        "Leaf mesh at ({}, {}): {} verts, {} tris",
        origin_x,
        origin_y,
        vertices.len(),
        num_tris
    );

    LeafMeshData { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::heightfield::{compute_normals, HeightField};

    #[test]
    fn test_counts_and_winding() {
        let field = HeightField::from_fn(3, 3, |x, y| (x + y) as f32);
        let normals = compute_normals(&field, 1.0);
        let mesh = build_leaf_mesh(field.samples(), 2, 2, (0, 0), 1.0, &normals, (3, 3));

        assert_eq!(mesh.num_verts(), 9);
        assert_eq!(mesh.num_tris(), 8);
        // Первая ячейка: (1,0)->(0,0)->(0,1) и (1,0)->(0,1)->(1,1) в (row, col)
        assert_eq!(&mesh.indices[..6], &[3, 0, 1, 3, 1, 4]);
        // Последняя ячейка
        assert_eq!(&mesh.indices[18..], &[7, 4, 5, 7, 5, 8]);
    }

    #[test]
    fn test_positions_and_global_uv() {
        let field = HeightField::from_fn(5, 5, |x, y| (x * 10 + y) as f32);
        let normals = compute_normals(&field, 2.0);

        // Окно 2x2 ячейки, начиная с сэмпла (2, 2)
        let mut window = Vec::new();
        for y in 2..=4 {
            for x in 2..=4 {
                window.push(field.get(x, y));
            }
        }
        let mesh = build_leaf_mesh(&window, 2, 2, (2, 2), 2.0, &normals, (5, 5));

        let first = mesh.vertices[0];
        assert_eq!(first.position, [4.0, 22.0, 4.0]);
        assert_eq!(first.tex_coord, [0.5, 0.5]);

        let last = mesh.vertices[8];
        assert_eq!(last.position, [8.0, 44.0, 8.0]);
        assert_eq!(last.tex_coord, [1.0, 1.0]);
    }
}
