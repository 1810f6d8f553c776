use crate::render::cache::bitmaps::{BitmapSurface, TextureHandle};
use crate::render::device::RenderDevice;
use crate::render::frame::{Color, DrawCall, FramePacket, RenderCmd};

/// Device that captures each frame as a `FramePacket` instead of drawing.
///
/// Hosts with their own GPU path pull the packet after `end_frame`; tests use it to
/// inspect draw order and buffers.
pub struct RecordingDevice {
    width: i32,
    height: i32,
    recording: FramePacket,
    last_frame: FramePacket,
    next_texture: u32,
    frames_presented: u64,
}

impl RecordingDevice {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            recording: FramePacket::new(),
            last_frame: FramePacket::new(),
            next_texture: 1,
            frames_presented: 0,
        }
    }

    /// Commands of the most recently completed frame.
    pub fn last_frame(&self) -> &FramePacket {
        &self.last_frame
    }

    /// Commands recorded since `begin_frame`, for callers drawing outside a frame.
    pub fn pending(&self) -> &FramePacket {
        &self.recording
    }

    pub fn textures_created(&self) -> u32 {
        self.next_texture - 1
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl RenderDevice for RecordingDevice {
    fn surface_width(&self) -> i32 {
        self.width
    }

    fn surface_height(&self) -> i32 {
        self.height
    }

    fn begin_frame(&mut self) {
        self.recording.reset();
    }

    fn clear(&mut self, color: Color) {
        self.recording.cmds.push(RenderCmd::Clear(color));
    }

    fn create_texture(&mut self, surface: &BitmapSurface) -> Option<TextureHandle> {
        if !surface.is_valid() {
            return None;
        }
        let handle = TextureHandle(self.next_texture);
        self.next_texture += 1;
        Some(handle)
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        self.recording.cmds.push(RenderCmd::from_draw(call));
    }

    fn end_frame(&mut self) {
        // Keep both vec capacities alive across frames.
        std::mem::swap(&mut self.last_frame, &mut self.recording);
        self.recording.reset();
        self.frames_presented += 1;
    }
}
