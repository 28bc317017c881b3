// ============================================
// Height Query - Высота террейна в точке (x, z)
// ============================================

use crate::config::HeightInterpolation;
use super::node::{LeafData, NodeArena, NodeId, QuadTreeNode, OUT_OF_RANGE};

impl<G> NodeArena<G> {
    /// Высота в (x, z) под узлом `id`, OUT_OF_RANGE если точка вне узла
    pub fn height_at(&self, id: NodeId, x: f32, z: f32, mode: HeightInterpolation) -> f32 {
        let node = self.node(id);
        if !node.contains(x, z) {
            return OUT_OF_RANGE;
        }

        match &node.leaf {
            Some(leaf) => node.leaf_height(leaf, x, z, mode),
            None => {
                // Внутренний узел: первый ребёнок, вернувший реальную высоту
                for child in node.children() {
                    let height = self.height_at(child, x, z, mode);
                    if height != OUT_OF_RANGE {
                        return height;
                    }
                }
                OUT_OF_RANGE
            }
        }
    }
}

impl<G> QuadTreeNode<G> {
    fn leaf_height(&self, leaf: &LeafData<G>, x: f32, z: f32, mode: HeightInterpolation) -> f32 {
        // Ячейка и смещение внутри неё
        let fx = (x - self.rect.start_x) / self.cell_size;
        let fy = (z - self.rect.start_y) / self.cell_size;
        let map_x = cell_index(fx, leaf.cells_x, "x");
        let map_y = cell_index(fy, leaf.cells_y, "y");
        let dx = fx - map_x as f32;
        let dy = fy - map_y as f32;

        let h00 = leaf.sample(map_x, map_y);
        let h10 = leaf.sample(map_x + 1, map_y);
        let h01 = leaf.sample(map_x, map_y + 1);
        let h11 = leaf.sample(map_x + 1, map_y + 1);

        match mode {
            HeightInterpolation::EdgeAverage => {
                // Среднее двух интерполяций по рёбрам, а не барицентрика
                let (hx1, hx2, hy1, hy2) = if dy < dx {
                    (h00, h10, h00, h01)
                } else {
                    (h01, h11, h10, h11)
                };
                ((hx1 + (hx2 - hx1) * dx) + (hy1 + (hy2 - hy1) * dy)) / 2.0
            }
            HeightInterpolation::Barycentric => {
                // Диагональ меша идёт от (0, 1) к (1, 0)
                if dx + dy <= 1.0 {
                    h00 + (h10 - h00) * dx + (h01 - h00) * dy
                } else {
                    h11 + (h01 - h11) * (1.0 - dx) + (h10 - h11) * (1.0 - dy)
                }
            }
        }
    }
}

/// Индекс ячейки по дробной координате внутри листа.
/// Вне листа после проверки прямоугольника быть не может - это баг.
fn cell_index(f: f32, cells: usize, axis: &str) -> usize {
    assert!(
        f >= 0.0 && f <= cells as f32,
        "quadtree leaf height query: {} offset {} out of range 0..{}",
        axis,
        f,
        cells
    );
    // f == cells возможно только из-за округления на правой границе
    (f as usize).min(cells - 1)
}
