// ============================================
// Terrain Probe - Сборка террейна без окна
// ============================================
// terrain-probe [config.json]
// Строит квадродерево на CPU мешах и печатает статистику.
// Без heightmap в конфиге генерируется тестовый рельеф.

use std::env;
use std::process::ExitCode;

use quadterrain::render::headless::{CpuMesh, CpuMeshAllocator, DrawRecorder};
use quadterrain::{FrameContext, HeightField, QuadTree, TerrainConfig, TerrainError};
use ultraviolet::{Mat4, Vec3};

/// Размер синтетического поля
const DEMO_SIZE: usize = 129;

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("terrain-probe: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), TerrainError> {
    let config = match env::args().nth(1) {
        Some(path) => TerrainConfig::load_from_file(path)?,
        None => TerrainConfig::default(),
    };

    let field = match config.load_height_field()? {
        Some(field) => field,
        None => demo_field(),
    };

    let mut allocator = CpuMeshAllocator::new();
    let mut tree: QuadTree<CpuMesh, String> = QuadTree::with_config(&config);
    tree.create_with_config(&mut allocator, &field)?;

    println!("=== Terrain ===");
    println!("Field:   {}x{} samples", field.width(), field.height());
    println!("Extent:  {:.1} x {:.1}", tree.width(), tree.height());
    println!("Heights: {:.2} .. {:.2}", tree.min_height(), tree.max_height());
    println!("Nodes:   {} ({} leaves, {} meshes)", tree.node_count(), tree.leaf_count(), allocator.allocated);
    println!("Tris:    {}", tree.triangle_count());

    // Несколько точек по диагонали
    for i in 0..=4 {
        let t = i as f32 / 4.0;
        let (x, z) = (tree.width() * t, tree.height() * t);
        match tree.try_height_at(x, z) {
            Some(h) => println!("height({:.1}, {:.1}) = {:.3}", x, z, h),
            None => println!("height({:.1}, {:.1}) = outside", x, z),
        }
    }

    // Один кадр сверху на центр
    let center = Vec3::new(tree.width() * 0.5, 0.0, tree.height() * 0.5);
    tree.add_model("marker".to_string(), center, 1.0, Vec3::zero());

    let eye = center + Vec3::new(0.0, tree.width().max(tree.height()), -tree.height());
    let view = Mat4::look_at(eye, center, Vec3::unit_y());
    let proj = ultraviolet::projection::perspective_wgpu_dx(70f32.to_radians(), 16.0 / 9.0, 0.1, 10_000.0);

    let mut recorder = DrawRecorder::new();
    tree.draw(&mut recorder, &FrameContext::new(view, proj));
    println!(
        "Frame:   {} of {} leaves drawn, {} tris, {} models",
        recorder.meshes.len(),
        tree.leaf_count(),
        recorder.triangles,
        recorder.models.len()
    );

    Ok(())
}

/// Холмы из пары синусов
fn demo_field() -> HeightField {
    HeightField::from_fn(DEMO_SIZE, DEMO_SIZE, |x, y| {
        let (fx, fy) = (x as f32 * 0.08, y as f32 * 0.11);
        (fx.sin() * fy.cos() + 1.0) * 40.0
    })
}
