// ============================================
// Headless Backend - Меши в памяти, запись draw-вызовов
// ============================================
// Без GPU: для утилит, диагностики и тестов.

use ultraviolet::Mat4;

use crate::error::TerrainError;
use crate::terrain::TerrainVertex;
use super::backend::{MeshAllocator, MeshRenderer, ModelRenderer};

/// Меш, хранящийся на CPU
#[derive(Debug, Clone)]
pub struct CpuMesh {
    pub label: String,
    pub vertices: Vec<TerrainVertex>,
    pub indices: Vec<u32>,
}

impl CpuMesh {
    pub fn num_tris(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Аллокатор CPU мешей
#[derive(Debug, Default)]
pub struct CpuMeshAllocator {
    /// Сколько мешей выделено за всё время
    pub allocated: usize,
}

impl CpuMeshAllocator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MeshAllocator for CpuMeshAllocator {
    type Mesh = CpuMesh;

    fn create_mesh(
        &mut self,
        label: &str,
        vertices: &[TerrainVertex],
        indices: &[u32],
    ) -> Result<CpuMesh, TerrainError> {
        self.allocated += 1;
        Ok(CpuMesh {
            label: label.to_string(),
            vertices: vertices.to_vec(),
            indices: indices.to_vec(),
        })
    }
}

/// Записанный вызов отрисовки модели
#[derive(Debug, Clone)]
pub struct ModelDraw<A> {
    pub asset: A,
    pub world: Mat4,
}

/// Рендерер, который только запоминает, что его попросили нарисовать
#[derive(Debug)]
pub struct DrawRecorder<A> {
    pub meshes: Vec<String>,
    pub triangles: usize,
    pub models: Vec<ModelDraw<A>>,
}

impl<A> DrawRecorder<A> {
    pub fn new() -> Self {
        Self {
            meshes: Vec::new(),
            triangles: 0,
            models: Vec::new(),
        }
    }

    /// Очистить перед новым кадром
    pub fn clear(&mut self) {
        self.meshes.clear();
        self.triangles = 0;
        self.models.clear();
    }
}

impl<A> Default for DrawRecorder<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> MeshRenderer<CpuMesh> for DrawRecorder<A> {
    fn draw_mesh(&mut self, mesh: &CpuMesh) {
        self.meshes.push(mesh.label.clone());
        self.triangles += mesh.num_tris();
    }
}

impl<A: Clone> ModelRenderer<A> for DrawRecorder<A> {
    fn draw_model(&mut self, asset: &A, world: Mat4, _view: &Mat4, _projection: &Mat4) {
        self.models.push(ModelDraw {
            asset: asset.clone(),
            world,
        });
    }
}
