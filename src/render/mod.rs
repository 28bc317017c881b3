// ============================================
// Render Module - Граница с графическим устройством
// ============================================
// Квадродерево само не рисует: оно выделяет меши через MeshAllocator
// и отдаёт решения culling'а в MeshRenderer / ModelRenderer.

mod backend;
pub mod headless;
pub mod wgpu_backend;

pub use backend::{FrameContext, MeshAllocator, MeshRenderer, ModelRenderer};
