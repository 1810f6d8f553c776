//! Character dictionary: immutable definitions keyed by character id.
//!
//! Definitions are shared read-only (`Arc`) by every display-list instance that
//! references them and live as long as the document.

mod sprite;

use std::collections::HashMap;
use std::sync::Arc;

use crate::render::Bitmap;
use crate::shape::{Shape, ShapeBuilder, ShapeRecord};

pub use sprite::{Directive, PlaceObject, Sprite, MAX_FRAME_RATE, MIN_FRAME_RATE};

pub type CharacterId = u16;

#[derive(Clone, Debug)]
pub enum Character {
    Shape(Arc<Shape>),
    Sprite(Arc<Sprite>),
    Bitmap(Arc<Bitmap>),
}

#[derive(Default, Debug)]
pub struct Dictionary {
    by_id: HashMap<CharacterId, Character>,
    shapes_discarded: u32,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, id: CharacterId) -> Option<&Character> {
        self.by_id.get(&id)
    }

    pub fn contains(&self, id: CharacterId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Shapes whose tessellation failed and were left out.
    pub fn shapes_discarded(&self) -> u32 {
        self.shapes_discarded
    }

    /// Build and register a shape. A failed build is logged and the id stays absent.
    pub fn define_shape(&mut self, builder: ShapeBuilder, record: ShapeRecord) -> bool {
        match builder.build(record) {
            Ok(shape) => {
                log::debug!(
                    "define_shape id={} contours={} tris={}",
                    shape.character_id(),
                    shape.contour_count(),
                    shape.triangle_count()
                );
                self.insert_shape(shape);
                true
            }
            Err(e) => {
                self.shapes_discarded = self.shapes_discarded.saturating_add(1);
                log::warn!("shape discarded: {e}");
                false
            }
        }
    }

    pub fn insert_shape(&mut self, shape: Shape) {
        self.insert(shape.character_id(), Character::Shape(Arc::new(shape)));
    }

    pub fn define_sprite(&mut self, sprite: Sprite) {
        self.insert(sprite.character_id(), Character::Sprite(Arc::new(sprite)));
    }

    pub fn define_bitmap(&mut self, bitmap: Bitmap) {
        self.insert(bitmap.character_id(), Character::Bitmap(Arc::new(bitmap)));
    }

    fn insert(&mut self, id: CharacterId, character: Character) {
        if self.by_id.insert(id, character).is_some() {
            log::warn!("character {} redefined; keeping the later definition", id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Color, Point2f, Rect};
    use crate::shape::{Contour, ShapeFill};

    #[test]
    fn failed_shape_leaves_id_absent() {
        let mut dictionary = Dictionary::new();
        let bad = ShapeRecord::new(
            Rect::default(),
            vec![Contour::filled(vec![Point2f::new(f32::NAN, 0.0), Point2f::new(1.0, 0.0), Point2f::new(1.0, 1.0)], 1)],
        );
        let ok = ShapeRecord::new(
            Rect::default(),
            vec![Contour::filled(vec![Point2f::new(0.0, 0.0), Point2f::new(20.0, 0.0), Point2f::new(20.0, 20.0)], 1)],
        );
        assert!(!dictionary.define_shape(ShapeBuilder::new(1).fill(ShapeFill::solid(Color::WHITE)), bad));
        assert!(dictionary.define_shape(ShapeBuilder::new(2).fill(ShapeFill::solid(Color::WHITE)), ok));
        assert!(dictionary.lookup(1).is_none());
        assert!(matches!(dictionary.lookup(2), Some(Character::Shape(_))));
        assert_eq!(dictionary.shapes_discarded(), 1);
    }

    #[test]
    fn sprites_and_bitmaps_are_registered_by_id() {
        let mut dictionary = Dictionary::new();
        dictionary.define_sprite(Sprite::new(10, 3, 24.0));
        dictionary.define_bitmap(Bitmap::new(11, crate::render::BitmapSurface::new(1, 1, vec![0; 4])));
        assert!(matches!(dictionary.lookup(10), Some(Character::Sprite(_))));
        assert!(matches!(dictionary.lookup(11), Some(Character::Bitmap(_))));
        assert_eq!(dictionary.len(), 2);
    }
}
