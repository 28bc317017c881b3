// ============================================
// Terrain Config - Data-Driven параметры из JSON
// ============================================

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TerrainError;
use crate::terrain::{HeightField, DEFAULT_HEIGHT_SCALE};

/// Способ интерполяции высоты внутри ячейки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightInterpolation {
    /// Среднее двух интерполяций по рёбрам ячейки (исходное поведение)
    #[default]
    EdgeAverage,
    /// Точная высота треугольника, который реально рендерится
    Barycentric,
}

/// Параметры террейна
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Мировой размер одной ячейки (между двумя сэмплами)
    pub cell_size: f32,
    /// Сколько ячеек по X и Z рисуется или отсекается как единое целое
    pub sector_size: usize,
    /// Множитель канала heightmap
    pub height_scale: f32,
    /// Путь к heightmap картинке
    pub heightmap: Option<PathBuf>,
    pub culling: bool,
    pub interpolation: HeightInterpolation,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            cell_size: 10.0,
            sector_size: 16,
            height_scale: DEFAULT_HEIGHT_SCALE,
            heightmap: None,
            culling: true,
            interpolation: HeightInterpolation::EdgeAverage,
        }
    }
}

impl TerrainConfig {
    /// Загрузить конфиг из JSON строки
    pub fn from_json(json: &str) -> Result<Self, TerrainError> {
        let config: TerrainConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Загрузить конфиг из файла
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, TerrainError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn validate(&self) -> Result<(), TerrainError> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(TerrainError::InvalidCellSize(self.cell_size));
        }
        if self.sector_size == 0 {
            return Err(TerrainError::InvalidSectorSize(self.sector_size));
        }
        Ok(())
    }

    /// Прочитать heightmap из `heightmap`, если путь задан
    pub fn load_height_field(&self) -> Result<Option<HeightField>, TerrainError> {
        match &self.heightmap {
            Some(path) => HeightField::load_image(path, self.height_scale).map(Some),
            None => Ok(None),
        }
    }
}
