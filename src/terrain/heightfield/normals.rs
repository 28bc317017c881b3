// ============================================
// Normals - Нормали вершин сетки высот
// ============================================
// Для внутренней вершины строим веер из 6 треугольников по соседям,
// нормаль каждого = cross(нормализованные рёбра), потом усредняем.
// Граничные вершины получают просто "вверх".

use ultraviolet::Vec3;

use super::field::HeightField;

/// Нормали, по одной на сэмпл, той же размерности что и HeightField
#[derive(Debug, Clone)]
pub struct NormalField {
    width: usize,
    height: usize,
    normals: Vec<Vec3>,
}

impl NormalField {
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Vec3 {
        self.normals[y * self.width + x]
    }
}

/// Соседи вокруг вершины (dx, dy), порядок задаёт обход веера
const FAN: [((i32, i32), (i32, i32)); 6] = [
    ((0, -1), (-1, 0)),
    ((-1, 0), (-1, 1)),
    ((-1, 1), (0, 1)),
    ((0, 1), (1, 0)),
    ((1, 0), (1, -1)),
    ((1, -1), (0, -1)),
];

/// Посчитать нормали для всей сетки
pub fn compute_normals(field: &HeightField, cell_size: f32) -> NormalField {
    let width = field.width();
    let height = field.height();
    let mut normals = Vec::with_capacity(width * height);

    let position = |x: i32, y: i32| {
        Vec3::new(
            cell_size * x as f32,
            field.get(x as usize, y as usize),
            cell_size * y as f32,
        )
    };

    for y in 0..height {
        for x in 0..width {
            // Граница: упрощение, соседей с одной стороны нет
            if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                normals.push(Vec3::unit_y());
                continue;
            }

            let (cx, cy) = (x as i32, y as i32);
            let center = position(cx, cy);

            let mut sum = Vec3::zero();
            for &((ax, ay), (bx, by)) in FAN.iter() {
                let edge_a = (position(cx + ax, cy + ay) - center).normalized();
                let edge_b = (position(cx + bx, cy + by) - center).normalized();
                sum += edge_a.cross(edge_b);
            }

            normals.push((sum / 6.0).normalized());
        }
    }

    NormalField { width, height, normals }
}
