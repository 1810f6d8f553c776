use crate::render::{Color, Point2f, Rect};

/// One closed outline in twips, already flattened to straight segments.
///
/// Style indices are 1-based into the owning shape's style lists; 0 means "none".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contour {
    pub points: Vec<Point2f>,
    pub left_fill: u32,
    pub right_fill: u32,
    pub line: u32,
}

impl Contour {
    pub fn new(points: Vec<Point2f>, left_fill: u32, right_fill: u32, line: u32) -> Self {
        Self { points, left_fill, right_fill, line }
    }

    /// Contour filled on its right side with `fill` (1-based).
    pub fn filled(points: Vec<Point2f>, fill: u32) -> Self {
        Self { points, left_fill: 0, right_fill: fill, line: 0 }
    }

    /// 0-based index of the fill that paints this contour, if any.
    ///
    /// The right side wins when both sides are filled.
    pub fn fill_index(&self) -> Option<usize> {
        match (self.right_fill, self.left_fill) {
            (0, 0) => None,
            (0, left) => Some(left as usize - 1),
            (right, _) => Some(right as usize - 1),
        }
    }
}

/// Load-time geometry for one shape character. Consumed once by `ShapeBuilder`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapeRecord {
    pub bounds: Rect,
    pub contours: Vec<Contour>,
}

impl ShapeRecord {
    pub fn new(bounds: Rect, contours: Vec<Contour>) -> Self {
        Self { bounds, contours }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineStyle {
    /// Stroke width in twips.
    pub width: u16,
    pub color: Color,
}
