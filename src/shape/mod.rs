//! Shape characters: tessellated meshes plus their resolved fill and line styles.
//!
//! Design constraints:
//! - Tessellation runs once, at definition time, never per frame.
//! - One shared vertex/index buffer per shape; contour `i` owns the slice between the
//!   cumulative counts recorded after contours `i - 1` and `i`.

pub mod fill;
pub mod record;
pub mod tessellate;

use crate::character::CharacterId;
use crate::render::{ColorTransform, DrawCall, Matrix2D, Rect, RenderContext, VertexPack};

pub use fill::ShapeFill;
pub use record::{Contour, LineStyle, ShapeRecord};
pub use tessellate::{tessellate_contour, TessError, TessOutput, MAX_POLYGON_SIZE};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("contour {contour}: {source}")]
    Tessellation {
        contour: usize,
        #[source]
        source: TessError,
    },
    #[error("contour {contour} references fill {fill}, shape has {available}")]
    MissingFill { contour: usize, fill: usize, available: usize },
    #[error("shape buffers exceed {0} entries")]
    BufferOverflow(usize),
}

/// Immutable, dictionary-owned shape character.
#[derive(Debug)]
pub struct Shape {
    character_id: CharacterId,
    bounds: Rect,
    fill_styles: Vec<ShapeFill>,
    line_styles: Vec<LineStyle>,
    vertices: Vec<VertexPack>,
    /// Cumulative vertex count after each contour.
    vertices_size: Vec<usize>,
    indices: Vec<u16>,
    /// Cumulative index count after each contour.
    indices_size: Vec<usize>,
    /// Owning fill (0-based) per contour.
    contour_fills: Vec<Option<usize>>,
}

/// One contour's addressable slice of a shape's shared buffers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContourSlice<'a> {
    pub fill: Option<usize>,
    pub vertices: &'a [VertexPack],
    pub indices: &'a [u16],
}

impl Shape {
    pub fn character_id(&self) -> CharacterId {
        self.character_id
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn fill_styles(&self) -> &[ShapeFill] {
        &self.fill_styles
    }

    pub fn line_styles(&self) -> &[LineStyle] {
        &self.line_styles
    }

    pub fn vertices(&self) -> &[VertexPack] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn vertex_counts(&self) -> &[usize] {
        &self.vertices_size
    }

    pub fn index_counts(&self) -> &[usize] {
        &self.indices_size
    }

    pub fn contour_count(&self) -> usize {
        self.vertices_size.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn contour(&self, i: usize) -> Option<ContourSlice<'_>> {
        let vend = *self.vertices_size.get(i)?;
        let iend = *self.indices_size.get(i)?;
        let vbase = if i == 0 { 0 } else { self.vertices_size[i - 1] };
        let ibase = if i == 0 { 0 } else { self.indices_size[i - 1] };
        Some(ContourSlice {
            fill: self.contour_fills[i],
            vertices: &self.vertices[vbase..vend],
            indices: &self.indices[ibase..iend],
        })
    }

    pub fn contours(&self) -> impl Iterator<Item = ContourSlice<'_>> + '_ {
        (0..self.contour_count()).filter_map(move |i| self.contour(i))
    }

    /// Emit one draw call per filled, non-empty contour slice.
    pub fn render(&self, ctx: &mut RenderContext<'_>, matrix: &Matrix2D, cxform: &ColorTransform, ratio: f32) {
        let mut scratch = std::mem::take(&mut ctx.scratch);
        for slice in self.contours() {
            let Some(fill) = slice.fill.and_then(|f| self.fill_styles.get(f)) else {
                continue;
            };
            if slice.indices.is_empty() {
                continue;
            }

            let color = fill.resolved_color(ratio);
            scratch.clear();
            scratch.extend(slice.vertices.iter().map(|v| VertexPack { additive: color, ..*v }));

            let texture = if ctx.textured_fills && fill.has_bitmap() {
                fill.resolved_texture(ctx.dictionary, &mut *ctx.device)
            } else {
                None
            };

            ctx.submit(&DrawCall {
                vertices: &scratch,
                indices: slice.indices,
                texture,
                matrix: *matrix,
                cxform: *cxform,
            });
        }
        ctx.scratch = scratch;
    }
}

/// Builds a `Shape` from its load-time geometry.
pub struct ShapeBuilder {
    character_id: CharacterId,
    fill_styles: Vec<ShapeFill>,
    line_styles: Vec<LineStyle>,
}

impl ShapeBuilder {
    pub fn new(character_id: CharacterId) -> Self {
        Self { character_id, fill_styles: Vec::new(), line_styles: Vec::new() }
    }

    pub fn fill(mut self, fill: ShapeFill) -> Self {
        self.fill_styles.push(fill);
        self
    }

    pub fn fills(mut self, fills: impl IntoIterator<Item = ShapeFill>) -> Self {
        self.fill_styles.extend(fills);
        self
    }

    pub fn line(mut self, line: LineStyle) -> Self {
        self.line_styles.push(line);
        self
    }

    /// Tessellate every contour in order into one packed buffer.
    ///
    /// Atomic: the first failing contour fails the whole shape.
    pub fn build(self, record: ShapeRecord) -> Result<Shape, ShapeError> {
        let available = self.fill_styles.len();
        let contour_count = record.contours.len();

        let mut vertices: Vec<VertexPack> = Vec::new();
        let mut indices: Vec<u16> = Vec::new();
        let mut vertices_size: Vec<usize> = Vec::with_capacity(contour_count);
        let mut indices_size: Vec<usize> = Vec::with_capacity(contour_count);
        let mut contour_fills: Vec<Option<usize>> = Vec::with_capacity(contour_count);

        for (i, contour) in record.contours.iter().enumerate() {
            let fill_index = contour.fill_index();
            match fill_index {
                Some(f) if f >= available => {
                    return Err(ShapeError::MissingFill { contour: i, fill: f, available });
                }
                Some(f) => {
                    let fill = &self.fill_styles[f];
                    let tess = tessellate_contour(&contour.points)
                        .map_err(|source| ShapeError::Tessellation { contour: i, source })?;

                    vertices.reserve(tess.vertices.len());
                    for p in &tess.vertices {
                        let tc = fill.texcoord(*p);
                        vertices.push(VertexPack { x: p.x, y: p.y, u: tc.x, v: tc.y, additive: fill.resolved_color(0.0) });
                    }
                    indices.extend_from_slice(&tess.indices);
                }
                // Stroke-only contour: keeps its (empty) slice so indices stay aligned.
                None => {}
            }

            if indices.len() > u32::MAX as usize {
                return Err(ShapeError::BufferOverflow(indices.len()));
            }
            vertices_size.push(vertices.len());
            indices_size.push(indices.len());
            contour_fills.push(fill_index);
        }

        debug_assert_eq!(indices_size.last().copied().unwrap_or(0), indices.len());
        debug_assert_eq!(indices_size.len(), vertices_size.len());

        Ok(Shape {
            character_id: self.character_id,
            bounds: record.bounds,
            fill_styles: self.fill_styles,
            line_styles: self.line_styles,
            vertices,
            vertices_size,
            indices,
            indices_size,
            contour_fills,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Color, Point2f};

    fn square(x: f32, y: f32, size: f32) -> Vec<Point2f> {
        vec![
            Point2f::new(x, y),
            Point2f::new(x + size, y),
            Point2f::new(x + size, y + size),
            Point2f::new(x, y + size),
        ]
    }

    fn two_fill_builder() -> ShapeBuilder {
        ShapeBuilder::new(1)
            .fill(ShapeFill::solid(Color::rgba(255, 0, 0, 255)))
            .fill(ShapeFill::solid(Color::rgba(0, 0, 255, 255)))
    }

    #[test]
    fn slices_are_cumulative_per_contour() {
        let record = ShapeRecord::new(
            Rect::new(0, 400, 0, 400),
            vec![
                Contour::filled(square(0.0, 0.0, 200.0), 1),
                Contour::filled(
                    vec![
                        Point2f::new(200.0, 200.0),
                        Point2f::new(400.0, 200.0),
                        Point2f::new(400.0, 400.0),
                        Point2f::new(300.0, 450.0),
                        Point2f::new(200.0, 400.0),
                    ],
                    2,
                ),
            ],
        );
        let shape = two_fill_builder().build(record).unwrap();
        assert_eq!(shape.vertex_counts(), &[4, 9]);
        assert_eq!(shape.index_counts(), &[6, 15]);

        for slice in shape.contours() {
            assert_eq!(slice.indices.len() % 3, 0);
            assert!(slice.indices.iter().all(|&i| (i as usize) < slice.vertices.len()));
        }
        assert_eq!(shape.contour(1).unwrap().fill, Some(1));
        assert_eq!(shape.contour(0).unwrap().vertices[2].x, 10.0);
    }

    #[test]
    fn stroke_only_contour_keeps_an_empty_slice() {
        let record = ShapeRecord::new(
            Rect::default(),
            vec![Contour::new(square(0.0, 0.0, 20.0), 0, 0, 1), Contour::filled(square(0.0, 0.0, 20.0), 1)],
        );
        let shape = two_fill_builder()
            .line(LineStyle { width: 20, color: Color::BLACK })
            .build(record)
            .unwrap();
        assert_eq!(shape.vertex_counts(), &[0, 4]);
        assert_eq!(shape.contour(0).unwrap().fill, None);
        assert_eq!(shape.line_styles().len(), 1);
    }

    #[test]
    fn build_fails_atomically_on_bad_contour() {
        let mut bad = square(0.0, 0.0, 20.0);
        bad[1].x = f32::INFINITY;
        let record = ShapeRecord::new(
            Rect::default(),
            vec![Contour::filled(square(0.0, 0.0, 20.0), 1), Contour::filled(bad, 1)],
        );
        let err = two_fill_builder().build(record).unwrap_err();
        assert_eq!(err, ShapeError::Tessellation { contour: 1, source: TessError::NonFinite });
    }

    #[test]
    fn missing_fill_is_a_build_failure() {
        let record = ShapeRecord::new(Rect::default(), vec![Contour::filled(square(0.0, 0.0, 20.0), 5)]);
        let err = two_fill_builder().build(record).unwrap_err();
        assert!(matches!(err, ShapeError::MissingFill { contour: 0, fill: 4, available: 2 }));
    }

    #[test]
    fn texcoords_come_from_the_owning_fill() {
        let m = Matrix2D { a: 10.0 / 1638.4, d: 10.0 / 1638.4, tx: 5.0, ty: 5.0, ..Matrix2D::IDENTITY };
        let record = ShapeRecord::new(Rect::default(), vec![Contour::filled(square(0.0, 0.0, 200.0), 1)]);
        let shape = ShapeBuilder::new(2).fill(ShapeFill::bitmap(40, m)).build(record).unwrap();
        let v = shape.vertices()[2];
        assert_eq!((v.x, v.y), (10.0, 10.0));
        assert!((v.u - 1.0).abs() < 1e-4 && (v.v - 1.0).abs() < 1e-4);
    }
}
