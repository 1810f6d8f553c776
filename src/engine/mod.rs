use std::sync::Arc;

use crate::character::{Dictionary, Sprite};
use crate::display::MovieClip;
use crate::render::device::RenderDevice;
use crate::render::{Color, ColorTransform, Matrix2D, RenderContext, VertexPack};
use crate::util::config::PlayerConfig;

/// Frames between debug heartbeats.
const HEARTBEAT_FRAMES: u64 = 1800;

/// A loaded document: its characters, main timeline and stage color.
#[derive(Debug)]
pub struct Movie {
    pub dictionary: Dictionary,
    pub root: Sprite,
    pub background: Color,
}

impl Movie {
    pub fn new(dictionary: Dictionary, root: Sprite) -> Self {
        Self { dictionary, root, background: Color::BLACK }
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }
}

/// Host loop facade over the root clip and a render device.
///
/// Design rule: the host talks only to `Player`; it never walks the display list to draw.
pub struct Player<D: RenderDevice> {
    dictionary: Arc<Dictionary>,
    root: MovieClip,
    device: D,
    config: PlayerConfig,
    background: Color,
    scratch: Vec<VertexPack>,
    frame_counter: u64,
    last_draw_calls: u32,
}

impl<D: RenderDevice> Player<D> {
    pub fn new(movie: Movie, device: D, config: PlayerConfig) -> Self {
        let Movie { dictionary, root, background } = movie;
        log::info!(
            "Player::new characters={} frames={} rate={} surface={}x{}",
            dictionary.len(),
            root.frame_count(),
            root.frame_rate(),
            device.surface_width(),
            device.surface_height()
        );
        if dictionary.shapes_discarded() > 0 {
            log::warn!("Player::new {} shape(s) failed to build", dictionary.shapes_discarded());
        }

        let dictionary = Arc::new(dictionary);
        let root = MovieClip::new(Arc::clone(&dictionary), Arc::new(root));

        Self {
            dictionary,
            root,
            device,
            config,
            background,
            scratch: Vec::new(),
            frame_counter: 0,
            last_draw_calls: 0,
        }
    }

    /// Advance the timeline by `dt` seconds and present a frame.
    pub fn tick(&mut self, dt: f32) {
        self.root.update(dt);
        self.render();
    }

    /// `tick` with the configured fixed step.
    pub fn tick_fixed(&mut self) {
        self.tick(self.config.fixed_step());
    }

    /// Draw the current display list without advancing time.
    pub fn render(&mut self) {
        self.frame_counter = self.frame_counter.wrapping_add(1);

        self.device.begin_frame();
        self.device.clear(self.background);

        let scratch = std::mem::take(&mut self.scratch);
        let mut ctx = RenderContext::new(&self.dictionary, &mut self.device)
            .with_textured_fills(self.config.textured_fills)
            .with_scratch(scratch);
        self.root.render(&mut ctx, &Matrix2D::IDENTITY, &ColorTransform::IDENTITY);
        self.last_draw_calls = ctx.draw_calls();
        self.scratch = ctx.into_scratch();

        self.device.end_frame();

        if self.frame_counter % HEARTBEAT_FRAMES == 0 {
            log::debug!("heartbeat {}", self.status_text());
        }
    }

    pub fn root(&self) -> &MovieClip {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut MovieClip {
        &mut self.root
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn background(&self) -> Color {
        self.background
    }

    /// Frames rendered so far.
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    /// Draw calls submitted by the last `render`.
    pub fn last_draw_calls(&self) -> u32 {
        self.last_draw_calls
    }

    /// One-line status for host overlays.
    pub fn status_text(&self) -> String {
        format!(
            "frame {}/{} rendered={} draws={}{}",
            self.root.current_frame(),
            self.root.frame_count(),
            self.frame_counter,
            self.last_draw_calls,
            if self.root.is_paused() { " paused" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::PlaceObject;
    use crate::render::device::RecordingDevice;
    use crate::render::{Point2f, Rect, RenderCmd};
    use crate::shape::{Contour, ShapeBuilder, ShapeFill, ShapeRecord};

    fn movie() -> Movie {
        let mut dictionary = Dictionary::new();
        let record = ShapeRecord::new(
            Rect::new(0, 200, 0, 200),
            vec![Contour::filled(
                vec![Point2f::new(0.0, 0.0), Point2f::new(200.0, 0.0), Point2f::new(200.0, 200.0), Point2f::new(0.0, 200.0)],
                1,
            )],
        );
        assert!(dictionary.define_shape(ShapeBuilder::new(1).fill(ShapeFill::solid(Color::WHITE)), record));

        let mut root = Sprite::new(0, 2, 10.0);
        root.place(2, PlaceObject::new(1, 1));
        Movie::new(dictionary, root).with_background(Color::rgba(1, 2, 3, 255))
    }

    #[test]
    fn render_clears_then_draws() {
        let mut player = Player::new(movie(), RecordingDevice::new(32, 32), PlayerConfig::default());
        player.render();
        let frame = player.device().last_frame();
        assert_eq!(frame.cmds.first(), Some(&RenderCmd::Clear(Color::rgba(1, 2, 3, 255))));
        assert_eq!(frame.draw_count(), 0);
        assert_eq!(player.frame_counter(), 1);
    }

    #[test]
    fn tick_advances_then_renders() {
        let mut player = Player::new(movie(), RecordingDevice::new(32, 32), PlayerConfig::default());
        player.tick(0.1);
        assert_eq!(player.root().current_frame(), 2);
        assert_eq!(player.device().last_frame().draw_count(), 1);
        assert_eq!(player.last_draw_calls(), 1);
        assert_eq!(player.device().frames_presented(), 1);
    }

    #[test]
    fn fixed_tick_uses_configured_rate() {
        let config = PlayerConfig { fixed_tick_hz: 10.0, ..PlayerConfig::default() };
        let mut player = Player::new(movie(), RecordingDevice::new(32, 32), config);
        player.tick_fixed();
        assert_eq!(player.root().current_frame(), 2);
        player.root_mut().goto_and_stop(1);
        player.tick_fixed();
        assert_eq!(player.root().current_frame(), 1);
        assert!(player.status_text().contains("paused"));
    }
}
