// ============================================
// QuadTree Module - Иерархия секторов террейна
// ============================================
// node    - арена узлов, прямоугольники, поиск владельца
// build   - рекурсивный buildout из heightmap
// culling - проверка AABB против frustum
// draw    - проход отрисовки
// query   - высота в точке
// objects - модели и компоненты
// tree    - публичный контейнер

mod build;
mod culling;
mod draw;
mod node;
mod objects;
mod query;
mod tree;

pub use culling::{classify_corners, CullResult};
pub use node::{NodeArena, NodeId, NodeRect, QuadTreeNode, NE, NW, OUT_OF_RANGE, SE, SW};
pub use objects::{ComponentId, ModelId, ModelPlacement, TerrainComponent};
pub use tree::QuadTree;
