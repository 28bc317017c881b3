// ============================================
// Quadtree Node - Узел квадродерева террейна
// ============================================
//
// Все узлы лежат в непрерывном Vec (NodeArena), ссылки через NodeId.
// Родитель владеет детьми только логически: ссылка на родителя
// нужна лишь для обхода вверх.

use std::collections::HashSet;

use ultraviolet::Vec3;

use super::objects::{ComponentId, ModelId};

/// Значение высоты за пределами террейна
pub const OUT_OF_RANGE: f32 = -987_654_321.0;

/// Квадранты детей
pub const NW: usize = 0;
pub const NE: usize = 1;
pub const SW: usize = 2;
pub const SE: usize = 3;

/// Индекс узла в арене
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Прямоугольник узла в мировой плоскости XZ: [start_x, end_x) x [start_y, end_y)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeRect {
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
}

impl NodeRect {
    /// Полуоткрытая проверка: точка на общей границе принадлежит
    /// только одному из соседей
    #[inline]
    pub fn contains(&self, x: f32, z: f32) -> bool {
        x >= self.start_x && x < self.end_x && z >= self.start_y && z < self.end_y
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.end_x - self.start_x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.end_y - self.start_y
    }
}

/// Данные, которые есть только у листа
pub struct LeafData<G> {
    /// Локальное окно высот (cells_y + 1) x (cells_x + 1), края продублированы
    pub(crate) heights: Vec<f32>,
    pub(crate) cells_x: usize,
    pub(crate) cells_y: usize,
    pub(crate) mesh: G,
    pub(crate) num_verts: usize,
    pub(crate) num_tris: usize,
}

impl<G> LeafData<G> {
    #[inline]
    pub(crate) fn sample(&self, x: usize, y: usize) -> f32 {
        self.heights[y * (self.cells_x + 1) + x]
    }
}

/// Узел: прямоугольник + экстремумы высот, либо дети, либо меш
pub struct QuadTreeNode<G> {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: [Option<NodeId>; 4],
    pub(crate) rect: NodeRect,
    pub(crate) cell_size: f32,
    pub(crate) min_height: f32,
    pub(crate) max_height: f32,
    /// 8 углов AABB: 4 на min_height, 4 на max_height (для TryCull)
    pub(crate) corners: [Vec3; 8],
    pub(crate) leaf: Option<LeafData<G>>,
    /// Был ли узел нарисован в последнем кадре
    pub(crate) drawn: bool,
    pub(crate) models: HashSet<ModelId>,
    pub(crate) components: HashSet<ComponentId>,
}

impl<G> QuadTreeNode<G> {
    pub(crate) fn new(parent: Option<NodeId>, rect: NodeRect, cell_size: f32) -> Self {
        Self {
            parent,
            children: [None; 4],
            rect,
            cell_size,
            min_height: 0.0,
            max_height: 0.0,
            corners: [Vec3::zero(); 8],
            leaf: None,
            drawn: false,
            models: HashSet::new(),
            components: HashSet::new(),
        }
    }

    /// Выставить экстремумы и пересчитать углы
    pub(crate) fn set_extrema(&mut self, min_height: f32, max_height: f32) {
        self.min_height = min_height;
        self.max_height = max_height;
        self.corners = compute_corners(&self.rect, min_height, max_height);
    }

    #[inline]
    pub fn rect(&self) -> &NodeRect {
        &self.rect
    }

    #[inline]
    pub fn contains(&self, x: f32, z: f32) -> bool {
        self.rect.contains(x, z)
    }

    #[inline]
    pub fn min_height(&self) -> f32 {
        self.min_height
    }

    #[inline]
    pub fn max_height(&self) -> f32 {
        self.max_height
    }

    #[inline]
    pub fn corners(&self) -> &[Vec3; 8] {
        &self.corners
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Дети в порядке NW, NE, SW, SE (None для отсутствующих)
    #[inline]
    pub fn child_slots(&self) -> &[Option<NodeId>; 4] {
        &self.children
    }

    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().flatten().copied()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.leaf.is_some()
    }

    pub fn mesh(&self) -> Option<&G> {
        self.leaf.as_ref().map(|leaf| &leaf.mesh)
    }

    /// Размер листа в ячейках (None для внутреннего узла)
    pub fn cells(&self) -> Option<(usize, usize)> {
        self.leaf.as_ref().map(|leaf| (leaf.cells_x, leaf.cells_y))
    }

    pub fn num_verts(&self) -> usize {
        self.leaf.as_ref().map_or(0, |leaf| leaf.num_verts)
    }

    pub fn num_tris(&self) -> usize {
        self.leaf.as_ref().map_or(0, |leaf| leaf.num_tris)
    }

    /// Локальные сэмплы листа
    pub fn heights(&self) -> Option<&[f32]> {
        self.leaf.as_ref().map(|leaf| leaf.heights.as_slice())
    }

    #[inline]
    pub fn was_drawn(&self) -> bool {
        self.drawn
    }

    pub fn models(&self) -> impl Iterator<Item = ModelId> + '_ {
        self.models.iter().copied()
    }

    pub fn components(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.components.iter().copied()
    }

    /// Сколько объектов хранит именно этот узел
    pub fn object_count(&self) -> usize {
        self.models.len() + self.components.len()
    }
}

/// Углы AABB узла
pub(crate) fn compute_corners(rect: &NodeRect, min_height: f32, max_height: f32) -> [Vec3; 8] {
    [
        Vec3::new(rect.start_x, min_height, rect.start_y),
        Vec3::new(rect.start_x, min_height, rect.end_y),
        Vec3::new(rect.end_x, min_height, rect.end_y),
        Vec3::new(rect.end_x, min_height, rect.start_y),
        Vec3::new(rect.start_x, max_height, rect.start_y),
        Vec3::new(rect.start_x, max_height, rect.end_y),
        Vec3::new(rect.end_x, max_height, rect.end_y),
        Vec3::new(rect.end_x, max_height, rect.start_y),
    ]
}

/// Плоское хранилище узлов, корень всегда на индексе 0
pub struct NodeArena<G> {
    nodes: Vec<QuadTreeNode<G>>,
}

impl<G> NodeArena<G> {
    pub(crate) fn new() -> Self {
        Self { nodes: Vec::with_capacity(64) }
    }

    pub(crate) fn push(&mut self, node: QuadTreeNode<G>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&QuadTreeNode<G>> {
        self.nodes.get(id.index())
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &QuadTreeNode<G> {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut QuadTreeNode<G> {
        &mut self.nodes[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &QuadTreeNode<G>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    pub fn leaves(&self) -> impl Iterator<Item = (NodeId, &QuadTreeNode<G>)> {
        self.iter().filter(|(_, node)| node.is_leaf())
    }

    /// Самый глубокий узел, содержащий (x, z): спускаемся в первого
    /// ребёнка, который содержит точку
    pub fn find_owner(&self, x: f32, z: f32) -> Option<NodeId> {
        let mut current = self.root();
        if !self.get(current)?.contains(x, z) {
            return None;
        }

        'descend: loop {
            for child in self.node(current).children() {
                if self.node(child).contains(x, z) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_is_half_open() {
        let rect = NodeRect { start_x: 0.0, start_y: 0.0, end_x: 4.0, end_y: 2.0 };

        assert!(rect.contains(0.0, 0.0));
        assert!(rect.contains(3.999, 1.999));
        assert!(!rect.contains(4.0, 1.0));
        assert!(!rect.contains(1.0, 2.0));
        assert!(!rect.contains(-0.001, 1.0));
    }

    #[test]
    fn test_corners_span_box() {
        let rect = NodeRect { start_x: 1.0, start_y: 2.0, end_x: 3.0, end_y: 5.0 };
        let corners = compute_corners(&rect, -1.0, 7.0);

        for c in &corners[..4] {
            assert_eq!(c.y, -1.0);
        }
        for c in &corners[4..] {
            assert_eq!(c.y, 7.0);
        }
        assert!(corners.iter().any(|c| c.x == 1.0 && c.z == 2.0));
        assert!(corners.iter().any(|c| c.x == 3.0 && c.z == 5.0));
    }
}
