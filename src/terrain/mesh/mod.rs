// ============================================
// Mesh Module - Вершины и меш листа
// ============================================

mod leaf_mesh;
mod vertex;

pub use leaf_mesh::{build_leaf_mesh, LeafMeshData};
pub use vertex::TerrainVertex;
