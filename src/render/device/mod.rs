mod recording;
mod software;

pub use recording::RecordingDevice;
pub use software::SoftwareDevice;

use crate::render::cache::bitmaps::{BitmapSurface, TextureHandle};
use crate::render::frame::{Color, DrawCall};

/// Platform drawing interface.
///
/// Design rule: only `render/device/*` can touch backend resources. The display list
/// talks to a device exclusively through `DrawCall`s and texture handles.
pub trait RenderDevice {
    /// Display surface width in pixels.
    fn surface_width(&self) -> i32;

    /// Display surface height in pixels.
    fn surface_height(&self) -> i32;

    /// Called at the beginning of each frame.
    fn begin_frame(&mut self);

    fn clear(&mut self, color: Color);

    /// Upload an RGBA8 surface. `None` means the backend refused it.
    fn create_texture(&mut self, surface: &BitmapSurface) -> Option<TextureHandle>;

    /// Draw one fill slice.
    ///
    /// Vertices are in shape-local pixel units; `call.matrix` maps them to the surface.
    /// Indices are local to `call.vertices`.
    fn draw(&mut self, call: &DrawCall<'_>);

    /// Called at the end of each frame.
    fn end_frame(&mut self);
}
