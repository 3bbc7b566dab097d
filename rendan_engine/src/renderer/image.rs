/// CPU-side image data and sampler descriptor

use crate::error::Result;

/// Decoded pixels handed over by the asset loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Bytes per pixel: 1 (gray), 2 (gray + alpha), 3 (RGB) or 4 (RGBA)
    pub channels: u32,
}

impl ImageData {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, channels: u32) -> Result<Self> {
        let data = Self { pixels, width, height, channels };
        data.validate()?;
        Ok(data)
    }

    /// Single-color RGBA image
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba.repeat((width * height) as usize);
        Self { pixels, width, height, channels: 4 }
    }

    /// 1x1 opaque white, bound until the application provides a texture
    pub fn white() -> Self {
        Self::solid(1, 1, [255, 255, 255, 255])
    }

    /// RGBA checkerboard with `cells` squares per side
    pub fn checkerboard(size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let cell = (size / cells.max(1)).max(1);
        let mut pixels = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let color = if ((x / cell) + (y / cell)) % 2 == 0 { a } else { b };
                pixels.extend_from_slice(&color);
            }
        }
        Self { pixels, width: size, height: size, channels: 4 }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            crate::engine_bail!(
                InvalidResource,
                "rendan::Image",
                "Image has zero extent {}x{}",
                self.width,
                self.height
            );
        }
        if !(1..=4).contains(&self.channels) {
            crate::engine_bail!(
                InvalidResource,
                "rendan::Image",
                "Unsupported channel count {}",
                self.channels
            );
        }
        let expected = self.width as u64 * self.height as u64 * self.channels as u64;
        if self.pixels.len() as u64 != expected {
            crate::engine_bail!(
                InvalidResource,
                "rendan::Image",
                "Pixel buffer holds {} bytes, {}x{}x{} needs {}",
                self.pixels.len(),
                self.width,
                self.height,
                self.channels,
                expected
            );
        }
        Ok(())
    }

    /// Expand to tightly packed RGBA8 (textures are uploaded as R8G8B8A8_SRGB)
    pub fn to_rgba8(&self) -> Result<Vec<u8>> {
        self.validate()?;
        let rgba = match self.channels {
            4 => self.pixels.clone(),
            3 => self.pixels
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
            2 => self.pixels
                .chunks_exact(2)
                .flat_map(|p| [p[0], p[0], p[0], p[1]])
                .collect(),
            _ => self.pixels
                .iter()
                .flat_map(|&g| [g, g, g, 255])
                .collect(),
        };
        Ok(rgba)
    }
}

/// Texture filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Texture coordinate addressing outside [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

/// Descriptor for creating a sampler
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerDesc {
    pub mag_filter: FilterMode,
    pub min_filter: FilterMode,
    pub address_mode: AddressMode,
    /// Requested max anisotropy, clamped by the device limit (None = disabled)
    pub max_anisotropy: Option<f32>,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            address_mode: AddressMode::Repeat,
            max_anisotropy: Some(16.0),
        }
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
