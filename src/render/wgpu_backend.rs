// ============================================
// WGPU Backend - Буферы листьев на GPU
// ============================================

use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::error::TerrainError;
use crate::terrain::TerrainVertex;
use super::backend::{MeshAllocator, MeshRenderer};

/// GPU буферы одного листа
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        vertices: &[TerrainVertex],
        indices: &[u32],
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertices", label)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Indices", label)),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }
}

/// Аллокатор мешей поверх wgpu::Device
pub struct WgpuMeshAllocator {
    device: Arc<wgpu::Device>,
}

impl WgpuMeshAllocator {
    pub fn new(device: Arc<wgpu::Device>) -> Self {
        Self { device }
    }
}

impl MeshAllocator for WgpuMeshAllocator {
    type Mesh = GpuMesh;

    fn create_mesh(
        &mut self,
        label: &str,
        vertices: &[TerrainVertex],
        indices: &[u32],
    ) -> Result<GpuMesh, TerrainError> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(TerrainError::MeshAllocation(format!("{} has no geometry", label)));
        }
        Ok(GpuMesh::new(&self.device, label, vertices, indices))
    }
}

/// Пайплайн и bind group'ы выставляет вызывающий, здесь только буферы и draw
impl MeshRenderer<GpuMesh> for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &GpuMesh) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}
