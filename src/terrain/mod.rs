// ============================================
// Terrain Module - Квадродерево террейна
// ============================================

pub mod heightfield;
pub mod mesh;
pub mod quadtree;

// Re-exports
pub use heightfield::{compute_normals, HeightField, NormalField, DEFAULT_HEIGHT_SCALE};
pub use mesh::{LeafMeshData, TerrainVertex};
pub use quadtree::{
    ComponentId, CullResult, ModelId, ModelPlacement, NodeArena, NodeId, NodeRect, QuadTree, QuadTreeNode,
    TerrainComponent, OUT_OF_RANGE,
};
