//! Display list: a depth-ordered tree of shape primitives and timeline clips.
//!
//! Design rules:
//! - A clip exclusively owns its children; dropping a node drops its whole subtree.
//! - Children iterate in ascending depth, which is also paint order (back to front).
//! - Runtime operations never fail: missing characters and empty depths are no-ops.

mod clip;

use std::sync::Arc;

use crate::character::CharacterId;
use crate::render::{ColorTransform, Matrix2D, RenderContext};
use crate::shape::Shape;

pub use clip::{MovieClip, MAX_CLIP_NESTING};

/// Slot key inside a clip; also paint order.
pub type Depth = u16;

/// Leaf node drawing one shape character.
#[derive(Debug)]
pub struct Primitive {
    shape: Arc<Shape>,
    matrix: Matrix2D,
    cxform: ColorTransform,
    ratio: f32,
}

impl Primitive {
    pub fn new(shape: Arc<Shape>) -> Self {
        Self { shape, matrix: Matrix2D::IDENTITY, cxform: ColorTransform::IDENTITY, ratio: 0.0 }
    }

    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    pub fn render(&self, ctx: &mut RenderContext<'_>, matrix: &Matrix2D, cxform: &ColorTransform) {
        self.shape.render(ctx, &(*matrix * self.matrix), &(*cxform * self.cxform), self.ratio);
    }
}

#[derive(Debug)]
pub enum Node {
    Primitive(Primitive),
    Clip(MovieClip),
}

impl Node {
    pub fn character_id(&self) -> CharacterId {
        match self {
            Node::Primitive(p) => p.shape.character_id(),
            Node::Clip(c) => c.character_id(),
        }
    }

    pub fn matrix(&self) -> Matrix2D {
        match self {
            Node::Primitive(p) => p.matrix,
            Node::Clip(c) => c.matrix(),
        }
    }

    pub fn cxform(&self) -> ColorTransform {
        match self {
            Node::Primitive(p) => p.cxform,
            Node::Clip(c) => c.cxform(),
        }
    }

    /// Morph ratio in `[0, 1]`; clips carry it but do not use it.
    pub fn ratio(&self) -> f32 {
        match self {
            Node::Primitive(p) => p.ratio,
            Node::Clip(c) => c.ratio(),
        }
    }

    pub fn set_transform(&mut self, matrix: Matrix2D, cxform: ColorTransform) {
        match self {
            Node::Primitive(p) => {
                p.matrix = matrix;
                p.cxform = cxform;
            }
            Node::Clip(c) => c.set_transform(matrix, cxform),
        }
    }

    pub(crate) fn set_ratio(&mut self, ratio: f32) {
        match self {
            Node::Primitive(p) => p.ratio = ratio,
            Node::Clip(c) => c.set_ratio(ratio),
        }
    }

    pub fn as_clip(&self) -> Option<&MovieClip> {
        match self {
            Node::Clip(c) => Some(c),
            Node::Primitive(_) => None,
        }
    }

    pub fn as_clip_mut(&mut self) -> Option<&mut MovieClip> {
        match self {
            Node::Clip(c) => Some(c),
            Node::Primitive(_) => None,
        }
    }

    pub fn update(&mut self, dt: f32) {
        match self {
            Node::Primitive(_) => {}
            Node::Clip(c) => c.update(dt),
        }
    }

    pub fn render(&self, ctx: &mut RenderContext<'_>, matrix: &Matrix2D, cxform: &ColorTransform) {
        match self {
            Node::Primitive(p) => p.render(ctx, matrix, cxform),
            Node::Clip(c) => c.render(ctx, matrix, cxform),
        }
    }
}
