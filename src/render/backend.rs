// ============================================
// Backend Traits - Что квадродерево требует от рендера
// ============================================

use ultraviolet::Mat4;

use crate::error::TerrainError;
use crate::terrain::TerrainVertex;

/// Выделение меша (вершинный + индексный буфер) на стороне устройства
pub trait MeshAllocator {
    /// Хэндл меша, которым владеет лист
    type Mesh;

    fn create_mesh(
        &mut self,
        label: &str,
        vertices: &[TerrainVertex],
        indices: &[u32],
    ) -> Result<Self::Mesh, TerrainError>;
}

/// Привязать и нарисовать меш листа (indexed triangle list)
pub trait MeshRenderer<G> {
    fn draw_mesh(&mut self, mesh: &G);
}

/// Нарисовать модель с мировой матрицей
pub trait ModelRenderer<A> {
    fn draw_model(&mut self, asset: &A, world: Mat4, view: &Mat4, projection: &Mat4);
}

/// Матрицы кадра
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub view: Mat4,
    pub projection: Mat4,
    /// projection * view, по нему идёт culling
    pub view_projection: Mat4,
}

impl FrameContext {
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self {
            view,
            projection,
            view_projection: projection * view,
        }
    }
}

impl Default for FrameContext {
    fn default() -> Self {
        Self::new(Mat4::identity(), Mat4::identity())
    }
}
