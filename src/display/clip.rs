use std::collections::BTreeMap;
use std::sync::Arc;

use crate::character::{Character, CharacterId, Dictionary, Directive, PlaceObject, Sprite};
use crate::display::{Depth, Node, Primitive};
use crate::render::{ColorTransform, Matrix2D, RenderContext};

/// Sprites placing themselves (directly or through a cycle) stop nesting here.
pub const MAX_CLIP_NESTING: u16 = 64;

/// Timeline instance of a sprite.
///
/// `current_frame` is 1-based; 0 means the clip was reset and holds no frame yet.
/// Seeking backwards rebuilds the display list by replaying from frame 1, since
/// directive batches only describe forward edits.
#[derive(Debug)]
pub struct MovieClip {
    environment: Arc<Dictionary>,
    sprite: Arc<Sprite>,
    children: BTreeMap<Depth, Node>,
    matrix: Matrix2D,
    cxform: ColorTransform,
    ratio: f32,
    current_frame: u32,
    frame_timer: f32,
    frame_delta: f32,
    paused: bool,
    nesting: u16,
}

impl MovieClip {
    /// Instantiate `sprite` and enter frame 1, playing.
    pub fn new(environment: Arc<Dictionary>, sprite: Arc<Sprite>) -> Self {
        Self::with_nesting(environment, sprite, 0)
    }

    fn with_nesting(environment: Arc<Dictionary>, sprite: Arc<Sprite>, nesting: u16) -> Self {
        let frame_delta = sprite.frame_delta();
        let mut clip = Self {
            environment,
            sprite,
            children: BTreeMap::new(),
            matrix: Matrix2D::IDENTITY,
            cxform: ColorTransform::IDENTITY,
            ratio: 0.0,
            current_frame: 0,
            frame_timer: 0.0,
            frame_delta,
            paused: false,
            nesting,
        };
        clip.goto_and_play(1);
        clip
    }

    pub fn character_id(&self) -> CharacterId {
        self.sprite.character_id()
    }

    pub fn sprite(&self) -> &Arc<Sprite> {
        &self.sprite
    }

    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    pub fn frame_count(&self) -> u32 {
        self.sprite.frame_count()
    }

    pub fn frame_timer(&self) -> f32 {
        self.frame_timer
    }

    pub fn frame_delta(&self) -> f32 {
        self.frame_delta
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn matrix(&self) -> Matrix2D {
        self.matrix
    }

    pub fn cxform(&self) -> ColorTransform {
        self.cxform
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn set_transform(&mut self, matrix: Matrix2D, cxform: ColorTransform) {
        self.matrix = matrix;
        self.cxform = cxform;
    }

    pub(crate) fn set_ratio(&mut self, ratio: f32) {
        self.ratio = ratio;
    }

    pub fn child(&self, depth: Depth) -> Option<&Node> {
        self.children.get(&depth)
    }

    pub fn child_mut(&mut self, depth: Depth) -> Option<&mut Node> {
        self.children.get_mut(&depth)
    }

    /// Occupied depths, ascending.
    pub fn depths(&self) -> impl Iterator<Item = Depth> + '_ {
        self.children.keys().copied()
    }

    /// Children in paint order.
    pub fn children(&self) -> impl Iterator<Item = (Depth, &Node)> + '_ {
        self.children.iter().map(|(d, n)| (*d, n))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    // ---------------------
    // Display-list edits
    // ---------------------

    pub fn place(&mut self, depth: Depth, character_id: CharacterId, matrix: Matrix2D, cxform: ColorTransform) {
        self.place_object(&PlaceObject { depth, character_id, matrix, cxform, ratio: 0 });
    }

    /// Replace whatever sits at `place.depth` with a new instance of `place.character_id`.
    ///
    /// The old occupant is dropped first; an unresolvable id leaves the depth empty.
    pub fn place_object(&mut self, place: &PlaceObject) {
        self.children.remove(&place.depth);

        let mut node = match self.environment.lookup(place.character_id) {
            Some(Character::Sprite(sprite)) => {
                if self.nesting >= MAX_CLIP_NESTING {
                    log::warn!(
                        "place depth={} id={}: clip nesting limit {} reached",
                        place.depth,
                        place.character_id,
                        MAX_CLIP_NESTING
                    );
                    return;
                }
                Node::Clip(MovieClip::with_nesting(
                    Arc::clone(&self.environment),
                    Arc::clone(sprite),
                    self.nesting + 1,
                ))
            }
            Some(Character::Shape(shape)) => Node::Primitive(Primitive::new(Arc::clone(shape))),
            Some(Character::Bitmap(_)) => {
                log::debug!("place depth={} id={}: bitmap is not placeable", place.depth, place.character_id);
                return;
            }
            None => {
                log::debug!("place depth={} id={}: character not found", place.depth, place.character_id);
                return;
            }
        };

        node.set_transform(place.matrix, place.cxform);
        node.set_ratio(place.ratio as f32 / u16::MAX as f32);
        self.children.insert(place.depth, node);
    }

    pub fn modify(&mut self, depth: Depth, matrix: Matrix2D, cxform: ColorTransform) {
        if let Some(node) = self.children.get_mut(&depth) {
            node.set_transform(matrix, cxform);
        }
    }

    pub fn erase(&mut self, depth: Depth) {
        self.children.remove(&depth);
    }

    /// Drop every child and return to the uninitialized frame 0.
    pub fn reset(&mut self) {
        self.children.clear();
        self.current_frame = 0;
    }

    fn execute(&mut self, directive: &Directive) {
        match directive {
            Directive::Place(place) => self.place_object(place),
            Directive::Modify { depth, matrix, cxform } => self.modify(*depth, *matrix, *cxform),
            Directive::Erase { depth } => self.erase(*depth),
        }
    }

    // ---------------------
    // Timeline control
    // ---------------------

    pub fn play(&mut self) {
        self.paused = false;
    }

    pub fn stop(&mut self) {
        self.paused = true;
    }

    pub fn goto_and_play(&mut self, frame: u32) {
        self.paused = false;
        self.goto_frame(frame);
    }

    pub fn goto_and_stop(&mut self, frame: u32) {
        self.paused = true;
        self.goto_frame(frame);
    }

    /// Returns `false` (and does nothing) when the label is unknown.
    pub fn goto_and_play_label(&mut self, label: &str) -> bool {
        match self.sprite.frame_for_label(label) {
            Some(frame) => {
                self.goto_and_play(frame);
                true
            }
            None => {
                log::debug!("clip {}: no frame labelled {:?}", self.character_id(), label);
                false
            }
        }
    }

    /// Returns `false` (and does nothing) when the label is unknown.
    pub fn goto_and_stop_label(&mut self, label: &str) -> bool {
        match self.sprite.frame_for_label(label) {
            Some(frame) => {
                self.goto_and_stop(frame);
                true
            }
            None => {
                log::debug!("clip {}: no frame labelled {:?}", self.character_id(), label);
                false
            }
        }
    }

    /// Seek to `frame` by replaying directive batches.
    ///
    /// `frame` is clamped to `[1, frame_count]`, so `current_frame` never points past the
    /// last batch. Always zeroes the frame timer, even when already on `frame`.
    pub fn goto_frame(&mut self, frame: u32) {
        self.frame_timer = 0.0;

        let target = frame.clamp(1, self.sprite.frame_count());
        if target == self.current_frame {
            return;
        }
        if target < self.current_frame {
            self.reset();
        }

        let sprite = Arc::clone(&self.sprite);
        while self.current_frame < target {
            self.current_frame += 1;
            for directive in sprite.directives_for_frame(self.current_frame) {
                self.execute(directive);
            }
        }
    }

    /// Advance this clock by `dt` seconds, then every child's.
    ///
    /// All frames elapsed in one call collapse into a single seek. A paused clip does
    /// not pause its children.
    pub fn update(&mut self, dt: f32) {
        if !self.paused && dt.is_finite() && dt > 0.0 {
            self.frame_timer += dt;
            if self.frame_timer >= self.frame_delta {
                let ticks = (self.frame_timer / self.frame_delta).floor();
                let mut remainder = self.frame_timer - ticks * self.frame_delta;
                let mut ticks = ticks as u64;
                // Float slop around exact multiples.
                if remainder >= self.frame_delta {
                    remainder -= self.frame_delta;
                    ticks = ticks.saturating_add(1);
                }
                // Precision is gone at huge timers; restart the frame instead.
                let remainder = if (0.0..self.frame_delta).contains(&remainder) { remainder } else { 0.0 };

                let frame = self.advance(ticks);
                self.goto_frame(frame);
                self.frame_timer = remainder;
            }
        }

        for child in self.children.values_mut() {
            child.update(dt);
        }
    }

    /// Frame reached after `ticks` steps, wrapping from the last frame to 1.
    fn advance(&self, ticks: u64) -> u32 {
        let count = self.sprite.frame_count() as u64;
        if ticks == 0 {
            return self.current_frame;
        }
        let (start, ticks) = if self.current_frame == 0 { (1u64, ticks - 1) } else { (self.current_frame as u64, ticks) };
        (((start - 1 + ticks % count) % count) + 1) as u32
    }

    /// Draw children back to front under `matrix ∘ own`.
    pub fn render(&self, ctx: &mut RenderContext<'_>, matrix: &Matrix2D, cxform: &ColorTransform) {
        let matrix = *matrix * self.matrix;
        let cxform = *cxform * self.cxform;
        for child in self.children.values() {
            child.render(ctx, &matrix, &cxform);
        }
    }
}
