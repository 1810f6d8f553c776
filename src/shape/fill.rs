use std::sync::{Arc, OnceLock};

use crate::character::{Character, CharacterId, Dictionary};
use crate::render::device::RenderDevice;
use crate::render::{BitmapSurface, Color, Matrix2D, Point2f, TextureHandle, TWIPS_PER_PIXEL};

/// Half-extent of the texture-mapping domain square, in twips.
const TEXTURE_DOMAIN_TWIPS: f32 = 16384.0;

/// Fill style of a shape: additive color pair plus an optional bitmap source.
///
/// Immutable after construction except for the resolved texture, which is written once.
#[derive(Debug)]
pub struct ShapeFill {
    bitmap_id: Option<CharacterId>,
    embedded: Option<Arc<BitmapSurface>>,
    additive_start: Color,
    additive_end: Color,
    texcoord_start: Matrix2D,
    texcoord_end: Matrix2D,
    texture: OnceLock<Option<TextureHandle>>,
}

impl ShapeFill {
    fn create(
        bitmap_id: Option<CharacterId>,
        embedded: Option<Arc<BitmapSurface>>,
        additive_start: Color,
        additive_end: Color,
        texcoord_start: Matrix2D,
        texcoord_end: Matrix2D,
    ) -> Self {
        Self {
            bitmap_id,
            embedded,
            additive_start,
            additive_end,
            texcoord_start,
            texcoord_end,
            texture: OnceLock::new(),
        }
    }

    pub fn solid(color: Color) -> Self {
        Self::create(None, None, color, color, Matrix2D::IDENTITY, Matrix2D::IDENTITY)
    }

    /// Morphing color fill.
    pub fn interpolated(start: Color, end: Color) -> Self {
        Self::create(None, None, start, end, Matrix2D::IDENTITY, Matrix2D::IDENTITY)
    }

    pub fn bitmap(id: CharacterId, transform: Matrix2D) -> Self {
        Self::create(Some(id), None, Color::BLACK, Color::BLACK, transform, transform)
    }

    pub fn bitmap_morph(id: CharacterId, start: Matrix2D, end: Matrix2D) -> Self {
        Self::create(Some(id), None, Color::BLACK, Color::BLACK, start, end)
    }

    pub fn embedded(surface: Arc<BitmapSurface>, transform: Matrix2D) -> Self {
        Self::create(None, Some(surface), Color::BLACK, Color::BLACK, transform, transform)
    }

    pub fn bitmap_id(&self) -> Option<CharacterId> {
        self.bitmap_id
    }

    pub fn has_bitmap(&self) -> bool {
        self.bitmap_id.is_some() || self.embedded.is_some()
    }

    pub fn texture_matrices(&self) -> (Matrix2D, Matrix2D) {
        (self.texcoord_start, self.texcoord_end)
    }

    /// Additive color at morph `ratio` (clamped to `[0, 1]`).
    pub fn resolved_color(&self, ratio: f32) -> Color {
        self.additive_start.lerp(self.additive_end, ratio)
    }

    /// Backend texture for this fill, resolved on first call and cached.
    ///
    /// A dictionary bitmap wins over embedded pixels. A miss is cached too.
    pub fn resolved_texture(&self, dictionary: &Dictionary, device: &mut dyn RenderDevice) -> Option<TextureHandle> {
        *self.texture.get_or_init(|| {
            if let Some(id) = self.bitmap_id {
                if let Some(Character::Bitmap(bitmap)) = dictionary.lookup(id) {
                    return bitmap.texture(device);
                }
                log::debug!("fill: bitmap character {} not in dictionary", id);
            }
            self.embedded.as_ref().and_then(|surface| device.create_texture(surface))
        })
    }

    /// Map a pixel-space position into unit texture space.
    ///
    /// The domain is the fixed square `[-16384, 16384]²` (twips) through the start matrix.
    /// A zero-width or zero-height domain maps everything to `(0, 0)`.
    pub fn texcoord(&self, position: Point2f) -> Point2f {
        let extent = TEXTURE_DOMAIN_TWIPS / TWIPS_PER_PIXEL;
        let ll = self.texcoord_start.apply_point(Point2f::new(-extent, -extent));
        let ru = self.texcoord_start.apply_point(Point2f::new(extent, extent));
        let w = ru.x - ll.x;
        let h = ru.y - ll.y;
        if w == 0.0 || h == 0.0 || !w.is_finite() || !h.is_finite() {
            return Point2f::default();
        }
        Point2f::new((position.x - ll.x) / w, (position.y - ll.y) / h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::RecordingDevice;
    use crate::render::Bitmap;

    fn surface() -> BitmapSurface {
        BitmapSurface::new(1, 1, vec![1, 2, 3, 255])
    }

    #[test]
    fn resolved_color_interpolates_between_endpoints() {
        let start = Color::rgba(0, 0, 0, 255);
        let end = Color::rgba(255, 128, 64, 0);
        let fill = ShapeFill::interpolated(start, end);
        assert_eq!(fill.resolved_color(0.0), start);
        assert_eq!(fill.resolved_color(1.0), end);
        assert_eq!(fill.resolved_color(0.5), Color::rgba(128, 64, 32, 128));
        assert_eq!(fill.resolved_color(7.0), end);
    }

    #[test]
    fn texcoord_maps_domain_corners() {
        let fill = ShapeFill::solid(Color::WHITE);
        let extent = 16384.0 / 20.0;
        let lo = fill.texcoord(Point2f::new(-extent, -extent));
        let hi = fill.texcoord(Point2f::new(extent, extent));
        let mid = fill.texcoord(Point2f::new(0.0, 0.0));
        assert_eq!(lo, Point2f::new(0.0, 0.0));
        assert_eq!(hi, Point2f::new(1.0, 1.0));
        assert_eq!(mid, Point2f::new(0.5, 0.5));
    }

    #[test]
    fn texcoord_follows_start_matrix() {
        // Scale the domain down to a 40px square at the origin.
        let m = Matrix2D { a: 40.0 / 1638.4, d: 40.0 / 1638.4, tx: 20.0, ty: 20.0, ..Matrix2D::IDENTITY };
        let fill = ShapeFill::bitmap(9, m);
        let tc = fill.texcoord(Point2f::new(10.0, 30.0));
        assert!((tc.x - 0.25).abs() < 1e-4);
        assert!((tc.y - 0.75).abs() < 1e-4);
    }

    #[test]
    fn degenerate_texture_matrix_falls_back_to_origin() {
        let fill = ShapeFill::bitmap(3, Matrix2D::scale(0.0, 1.0));
        assert_eq!(fill.texcoord(Point2f::new(12.0, 5.0)), Point2f::new(0.0, 0.0));
    }

    #[test]
    fn texture_resolution_is_memoized() {
        let mut dictionary = Dictionary::new();
        dictionary.define_bitmap(Bitmap::new(7, surface()));
        let mut device = RecordingDevice::new(8, 8);

        let fill = ShapeFill::bitmap(7, Matrix2D::IDENTITY);
        let first = fill.resolved_texture(&dictionary, &mut device);
        let second = fill.resolved_texture(&dictionary, &mut device);
        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(device.textures_created(), 1);
    }

    #[test]
    fn embedded_bitmap_uploads_when_dictionary_misses() {
        let dictionary = Dictionary::new();
        let mut device = RecordingDevice::new(8, 8);
        let fill = ShapeFill::embedded(Arc::new(surface()), Matrix2D::IDENTITY);
        assert!(fill.resolved_texture(&dictionary, &mut device).is_some());
        assert!(fill.resolved_texture(&dictionary, &mut device).is_some());
        assert_eq!(device.textures_created(), 1);

        let solid = ShapeFill::solid(Color::WHITE);
        assert_eq!(solid.resolved_texture(&dictionary, &mut device), None);
    }
}
