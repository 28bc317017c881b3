// ============================================
// Height Field - Плотная сетка высот
// ============================================
// Источник высот для квадродерева:
// - сырой float массив
// - упакованный растр (один канал * масштаб)
// - картинка с диска через `image`

use std::path::Path;

use crate::error::TerrainError;

/// Масштаб канала heightmap по умолчанию
pub const DEFAULT_HEIGHT_SCALE: f32 = 2.5;

/// Сетка высот width x height, хранится построчно
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    width: usize,
    height: usize,
    samples: Vec<f32>,
}

impl HeightField {
    /// Создать из готового массива (row-major)
    pub fn new(width: usize, height: usize, samples: Vec<f32>) -> Result<Self, TerrainError> {
        if samples.len() != width * height {
            return Err(TerrainError::Format {
                width,
                height,
                actual: samples.len(),
            });
        }
        Ok(Self { width, height, samples })
    }

    /// Заполнить сетку функцией f(x, y)
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f32,
    {
        let mut samples = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                samples.push(f(x, y));
            }
        }
        Self { width, height, samples }
    }

    /// Декодировать упакованный растр: берём младший байт каждого пикселя
    /// (первый канал) и умножаем на `scale`
    pub fn decode(width: usize, height: usize, pixels: &[u32], scale: f32) -> Result<Self, TerrainError> {
        if pixels.len() != width * height {
            return Err(TerrainError::Format {
                width,
                height,
                actual: pixels.len(),
            });
        }

        let samples = pixels
            .iter()
            .map(|&pixel| (pixel & 0x0000_00FF) as f32 * scale)
            .collect();

        Ok(Self { width, height, samples })
    }

    /// Загрузить heightmap картинку
    pub fn load_image<P: AsRef<Path>>(path: P, scale: f32) -> Result<Self, TerrainError> {
        let image = image::open(path.as_ref())?.to_rgba8();
        let (width, height) = image.dimensions();

        // RGBA -> u32 little-endian, так что R оказывается в младшем байте
        let pixels: Vec<u32> = image.pixels().map(|p| u32::from_le_bytes(p.0)).collect();

        log::debug!(
            "Loaded heightmap {:?}: {}x{}",
            path.as_ref(),
            width,
            height
        );
        Self::decode(width as usize, height as usize, &pixels, scale)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Высота сэмпла (x - столбец, y - строка)
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.samples[y * self.width + x]
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// (min, max) по всем сэмплам, None для пустого поля
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut iter = self.samples.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), h| (lo.min(h), hi.max(h))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_uses_first_channel() {
        // 0xAABBGGRR: только RR идёт в высоту
        let pixels = [0xFF00_0000, 0xFF12_3404, 0x0000_00FF, 0xFFFF_FF10];
        let field = HeightField::decode(2, 2, &pixels, DEFAULT_HEIGHT_SCALE).unwrap();

        assert_eq!(field.get(0, 0), 0.0);
        assert_eq!(field.get(1, 0), 4.0 * 2.5);
        assert_eq!(field.get(0, 1), 255.0 * 2.5);
        assert_eq!(field.get(1, 1), 16.0 * 2.5);
    }

    #[test]
    fn test_decode_rejects_size_mismatch() {
        let err = HeightField::decode(3, 3, &[0; 8], 1.0).unwrap_err();
        assert!(matches!(
            err,
            TerrainError::Format { width: 3, height: 3, actual: 8 }
        ));
    }

    #[test]
    fn test_row_major_layout() {
        let field = HeightField::from_fn(3, 2, |x, y| (y * 10 + x) as f32);

        assert_eq!(field.get(2, 0), 2.0);
        assert_eq!(field.get(0, 1), 10.0);
        assert_eq!(field.samples().len(), 6);
        assert_eq!(field.min_max(), Some((0.0, 12.0)));
    }

    #[test]
    fn test_load_image_roundtrip() {
        let path = std::env::temp_dir().join("quadterrain_heightmap_test.png");
        let mut img = image::RgbaImage::new(2, 2);
        img.put_pixel(0, 0, image::Rgba([8, 0, 0, 255]));
        img.put_pixel(1, 0, image::Rgba([16, 99, 99, 255]));
        img.put_pixel(0, 1, image::Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 1, image::Rgba([200, 0, 0, 0]));
        img.save(&path).unwrap();

        let field = HeightField::load_image(&path, 0.5).unwrap();

        assert_eq!(field.width(), 2);
        assert_eq!(field.height(), 2);
        assert_eq!(field.get(0, 0), 4.0);
        assert_eq!(field.get(1, 0), 8.0);
        assert_eq!(field.get(1, 1), 100.0);

        std::fs::remove_file(&path).ok();
    }
}
