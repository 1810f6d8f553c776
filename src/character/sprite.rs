use std::collections::HashMap;

use crate::character::CharacterId;
use crate::display::Depth;
use crate::render::{ColorTransform, Matrix2D};

pub const MIN_FRAME_RATE: f32 = 0.1;
pub const MAX_FRAME_RATE: f32 = 120.0;

/// Place a character at a depth, replacing any occupant.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaceObject {
    pub depth: Depth,
    pub character_id: CharacterId,
    pub matrix: Matrix2D,
    pub cxform: ColorTransform,
    /// Morph ratio, 0..=65535 maps to 0..=1.
    pub ratio: u16,
}

impl PlaceObject {
    pub fn new(depth: Depth, character_id: CharacterId) -> Self {
        Self { depth, character_id, matrix: Matrix2D::IDENTITY, cxform: ColorTransform::IDENTITY, ratio: 0 }
    }

    pub fn with_matrix(mut self, matrix: Matrix2D) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn with_cxform(mut self, cxform: ColorTransform) -> Self {
        self.cxform = cxform;
        self
    }

    pub fn with_ratio(mut self, ratio: u16) -> Self {
        self.ratio = ratio;
        self
    }
}

/// One display-list edit recorded on a sprite's timeline.
#[derive(Clone, Debug, PartialEq)]
pub enum Directive {
    Place(PlaceObject),
    Modify { depth: Depth, matrix: Matrix2D, cxform: ColorTransform },
    Erase { depth: Depth },
}

/// Timeline character: ordered per-frame directive batches.
///
/// Frames are 1-based. Immutable once built.
#[derive(Clone, Debug)]
pub struct Sprite {
    character_id: CharacterId,
    frame_rate: f32,
    frames: Vec<Vec<Directive>>,
    labels: HashMap<String, u32>,
}

impl Sprite {
    /// `frame_count` is raised to the number of recorded batches and to at least 1.
    pub fn new(character_id: CharacterId, frame_count: u32, frame_rate: f32) -> Self {
        let clamped = if frame_rate.is_finite() {
            frame_rate.clamp(MIN_FRAME_RATE, MAX_FRAME_RATE)
        } else {
            MIN_FRAME_RATE
        };
        if clamped != frame_rate {
            log::warn!("sprite {}: frame rate {} clamped to {}", character_id, frame_rate, clamped);
        }
        let frame_count = frame_count.max(1) as usize;
        Self { character_id, frame_rate: clamped, frames: vec![Vec::new(); frame_count], labels: HashMap::new() }
    }

    pub fn character_id(&self) -> CharacterId {
        self.character_id
    }

    pub fn frame_count(&self) -> u32 {
        self.frames.len() as u32
    }

    pub fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    pub fn frame_delta(&self) -> f32 {
        1.0 / self.frame_rate
    }

    /// Append a directive to `frame` (1-based), growing the timeline if needed.
    pub fn push(&mut self, frame: u32, directive: Directive) {
        let frame = frame.max(1) as usize;
        if frame > self.frames.len() {
            self.frames.resize(frame, Vec::new());
        }
        self.frames[frame - 1].push(directive);
    }

    pub fn place(&mut self, frame: u32, place: PlaceObject) {
        self.push(frame, Directive::Place(place));
    }

    pub fn modify(&mut self, frame: u32, depth: Depth, matrix: Matrix2D, cxform: ColorTransform) {
        self.push(frame, Directive::Modify { depth, matrix, cxform });
    }

    pub fn erase(&mut self, frame: u32, depth: Depth) {
        self.push(frame, Directive::Erase { depth });
    }

    pub fn set_label(&mut self, frame: u32, label: impl Into<String>) {
        self.labels.insert(label.into(), frame.max(1));
    }

    /// Directives for `frame` (1-based) in recorded order; empty outside the timeline.
    pub fn directives_for_frame(&self, frame: u32) -> &[Directive] {
        frame
            .checked_sub(1)
            .and_then(|i| self.frames.get(i as usize))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn frame_for_label(&self, label: &str) -> Option<u32> {
        self.labels.get(label).copied()
    }
}
