use std::sync::OnceLock;

use crate::character::CharacterId;
use crate::render::device::RenderDevice;

/// Backend-issued texture id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// CPU-side bitmap surface in RGBA8.
///
/// - `rgba` is row-major, 4 bytes per pixel (R,G,B,A).
/// - Alpha is *straight* (not pre-multiplied).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitmapSurface {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl BitmapSurface {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self { width, height, rgba }
    }

    pub fn is_valid(&self) -> bool {
        let px = self.width as usize * self.height as usize;
        px > 0 && self.rgba.len() == px * 4
    }

    /// Nearest-neighbor lookup with clamped coordinates.
    pub fn sample(&self, u: f32, v: f32) -> [u8; 4] {
        if !self.is_valid() {
            return [0; 4];
        }
        let fx = if u.is_finite() { u.clamp(0.0, 1.0) } else { 0.0 };
        let fy = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        let x = ((fx * self.width as f32) as u32).min(self.width - 1) as usize;
        let y = ((fy * self.height as f32) as u32).min(self.height - 1) as usize;
        let i = 4 * (y * self.width as usize + x);
        [self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]]
    }
}

/// Bitmap character: decoded pixels plus the texture they were uploaded to.
///
/// The upload happens on first use and is cached for the document's lifetime.
#[derive(Debug)]
pub struct Bitmap {
    id: CharacterId,
    surface: BitmapSurface,
    texture: OnceLock<Option<TextureHandle>>,
}

impl Bitmap {
    pub fn new(id: CharacterId, surface: BitmapSurface) -> Self {
        Self { id, surface, texture: OnceLock::new() }
    }

    pub fn character_id(&self) -> CharacterId {
        self.id
    }

    pub fn surface(&self) -> &BitmapSurface {
        &self.surface
    }

    pub fn texture(&self, device: &mut dyn RenderDevice) -> Option<TextureHandle> {
        *self.texture.get_or_init(|| {
            let handle = device.create_texture(&self.surface);
            if handle.is_none() {
                log::warn!("bitmap {}: texture upload failed ({}x{})", self.id, self.surface.width, self.surface.height);
            }
            handle
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::RecordingDevice;

    fn checker() -> BitmapSurface {
        let mut rgba = Vec::new();
        for px in [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255], [255, 255, 255, 255]] {
            rgba.extend_from_slice(&px);
        }
        BitmapSurface::new(2, 2, rgba)
    }

    #[test]
    fn sample_picks_nearest_texel() {
        let s = checker();
        assert_eq!(s.sample(0.0, 0.0), [255, 0, 0, 255]);
        assert_eq!(s.sample(0.9, 0.0), [0, 255, 0, 255]);
        assert_eq!(s.sample(0.0, 0.9), [0, 0, 255, 255]);
        assert_eq!(s.sample(1.0, 1.0), [255, 255, 255, 255]);
        assert_eq!(s.sample(f32::NAN, -3.0), [255, 0, 0, 255]);
    }

    #[test]
    fn bitmap_uploads_once() {
        let bitmap = Bitmap::new(4, checker());
        let mut device = RecordingDevice::new(64, 64);
        let first = bitmap.texture(&mut device);
        let second = bitmap.texture(&mut device);
        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(device.textures_created(), 1);
    }

    #[test]
    fn invalid_surface_is_reported() {
        assert!(!BitmapSurface::new(2, 2, vec![0; 3]).is_valid());
        assert!(!BitmapSurface::new(0, 0, Vec::new()).is_valid());
    }
}
