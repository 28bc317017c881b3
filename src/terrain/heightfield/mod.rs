// ============================================
// Height Field - Сетка высот и нормали
// ============================================

mod field;
mod normals;

pub use field::{HeightField, DEFAULT_HEIGHT_SCALE};
pub use normals::{compute_normals, NormalField};
