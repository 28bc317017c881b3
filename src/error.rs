// ============================================
// Terrain Error - Ошибки построения террейна
// ============================================

use thiserror::Error;

/// Ошибки сборки квадродерева и загрузки высот
#[derive(Debug, Error)]
pub enum TerrainError {
    /// Число пикселей источника не совпадает с width * height
    #[error("height source has {actual} samples, expected {width}x{height}")]
    Format {
        width: usize,
        height: usize,
        actual: usize,
    },

    /// Слишком маленькое поле: нужно минимум 2x2 сэмпла (одна ячейка)
    #[error("height field {width}x{height} is too small to build a terrain")]
    DegenerateField { width: usize, height: usize },

    #[error("cell size must be finite and positive, got {0}")]
    InvalidCellSize(f32),

    #[error("sector size must be positive, got {0}")]
    InvalidSectorSize(usize),

    /// Бэкенд не смог выделить вершинный/индексный буфер
    #[error("mesh allocation failed: {0}")]
    MeshAllocation(String),

    #[error("failed to decode heightmap image: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid terrain config: {0}")]
    Config(#[from] serde_json::Error),
}
