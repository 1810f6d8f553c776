pub mod cache;
pub mod device;
mod frame;

pub use cache::bitmaps::{Bitmap, BitmapSurface, TextureHandle};
pub use frame::{
    Color, ColorTransform, DrawCall, FramePacket, Matrix2D, Point2f, Rect, RenderCmd, VertexPack,
    TWIPS_PER_PIXEL,
};

use crate::character::Dictionary;
use crate::render::device::RenderDevice;

/// Per-frame state threaded through display-list rendering.
///
/// This contains no node types; nodes borrow it to resolve fill textures and submit
/// `DrawCall`s to the device.
pub struct RenderContext<'a> {
    pub(crate) dictionary: &'a Dictionary,
    pub(crate) device: &'a mut dyn RenderDevice,
    pub(crate) textured_fills: bool,
    /// Reused per-slice vertex buffer (additive color is written per draw).
    pub(crate) scratch: Vec<VertexPack>,
    draw_calls: u32,
}

impl<'a> RenderContext<'a> {
    pub fn new(dictionary: &'a Dictionary, device: &'a mut dyn RenderDevice) -> Self {
        Self { dictionary, device, textured_fills: true, scratch: Vec::new(), draw_calls: 0 }
    }

    pub fn with_textured_fills(mut self, enabled: bool) -> Self {
        self.textured_fills = enabled;
        self
    }

    /// Reuse a vertex buffer from an earlier frame.
    pub fn with_scratch(mut self, mut scratch: Vec<VertexPack>) -> Self {
        scratch.clear();
        self.scratch = scratch;
        self
    }

    pub fn draw_calls(&self) -> u32 {
        self.draw_calls
    }

    /// Hand the scratch buffer back for the next frame.
    pub fn into_scratch(self) -> Vec<VertexPack> {
        self.scratch
    }

    pub(crate) fn submit(&mut self, call: &DrawCall<'_>) {
        self.draw_calls = self.draw_calls.saturating_add(1);
        self.device.draw(call);
    }
}
