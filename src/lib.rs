// ============================================
// Quadterrain - Террейн из heightmap на квадродереве
// ============================================
// Heightmap -> иерархия мешей, frustum culling,
// запросы высоты и размещение объектов по узлам

pub mod config;
pub mod error;
pub mod render;
pub mod terrain;

pub use config::{HeightInterpolation, TerrainConfig};
pub use error::TerrainError;
pub use render::{FrameContext, MeshAllocator, MeshRenderer, ModelRenderer};
pub use terrain::{
    compute_normals, CullResult, HeightField, NodeArena, NodeId, NormalField, QuadTree, QuadTreeNode,
    ModelId, ModelPlacement, ComponentId, TerrainComponent, TerrainVertex,
    DEFAULT_HEIGHT_SCALE, OUT_OF_RANGE,
};
