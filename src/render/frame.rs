use core::ops::Mul;

use crate::render::cache::bitmaps::TextureHandle;

/// Geometry input is stored in twips (1/20 pixel).
pub const TWIPS_PER_PIXEL: f32 = 20.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point2f {
    pub x: f32,
    pub y: f32,
}

impl Point2f {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_pixels(self) -> Self {
        Self { x: self.x / TWIPS_PER_PIXEL, y: self.y / TWIPS_PER_PIXEL }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned bounds in twips.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
}

impl Rect {
    pub fn new(x_min: i32, x_max: i32, y_min: i32, y_max: i32) -> Self {
        Self { x_min, x_max, y_min, y_max }
    }

    pub fn width(&self) -> i32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> i32 {
        self.y_max - self.y_min
    }

    /// Returns `(x_min, y_min, x_max, y_max)` in pixels.
    pub fn to_pixels(&self) -> (f32, f32, f32, f32) {
        (
            self.x_min as f32 / TWIPS_PER_PIXEL,
            self.y_min as f32 / TWIPS_PER_PIXEL,
            self.x_max as f32 / TWIPS_PER_PIXEL,
            self.y_max as f32 / TWIPS_PER_PIXEL,
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(c: [u8; 4]) -> Self {
        Self { r: c[0], g: c[1], b: c[2], a: c[3] }
    }

    /// Per-channel linear interpolation; `t` is clamped to `[0, 1]`.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let a = self.to_array();
        let b = other.to_array();
        let mut out = [0u8; 4];
        for i in 0..4 {
            let v = a[i] as f32 + (b[i] as f32 - a[i] as f32) * t;
            out[i] = v.round().clamp(0.0, 255.0) as u8;
        }
        Color::from_array(out)
    }
}

/// Affine 2D transform. `x' = a*x + c*y + tx`, `y' = b*x + d*y + ty`, translation in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix2D {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Matrix2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix2D {
    pub const IDENTITY: Matrix2D = Matrix2D { a: 1.0, b: 0.0, c: 0.0, d: 1.0, tx: 0.0, ty: 0.0 };

    pub fn translate(tx: f32, ty: f32) -> Self {
        Self { tx, ty, ..Self::IDENTITY }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self { a: sx, d: sy, ..Self::IDENTITY }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (self.a * x + self.c * y + self.tx, self.b * x + self.d * y + self.ty)
    }

    pub fn apply_point(&self, p: Point2f) -> Point2f {
        let (x, y) = self.apply(p.x, p.y);
        Point2f { x, y }
    }

    pub fn is_identity(&self) -> bool {
        approx_eq_f32(self.a, 1.0)
            && approx_eq_f32(self.d, 1.0)
            && approx_eq_f32(self.b, 0.0)
            && approx_eq_f32(self.c, 0.0)
            && approx_eq_f32(self.tx, 0.0)
            && approx_eq_f32(self.ty, 0.0)
    }

    pub fn is_translation(&self) -> bool {
        approx_eq_f32(self.a, 1.0)
            && approx_eq_f32(self.d, 1.0)
            && approx_eq_f32(self.b, 0.0)
            && approx_eq_f32(self.c, 0.0)
    }
}

/// `parent * own` applies `own` first, then `parent`.
impl Mul for Matrix2D {
    type Output = Matrix2D;

    fn mul(self, rhs: Matrix2D) -> Matrix2D {
        let p = self;
        Matrix2D {
            a: p.a * rhs.a + p.c * rhs.b,
            b: p.b * rhs.a + p.d * rhs.b,
            c: p.a * rhs.c + p.c * rhs.d,
            d: p.b * rhs.c + p.d * rhs.d,
            tx: p.a * rhs.tx + p.c * rhs.ty + p.tx,
            ty: p.b * rhs.tx + p.d * rhs.ty + p.ty,
        }
    }
}

/// Per-channel `value * mul + add`, in 0..255 space, RGBA order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorTransform {
    pub mul: [f32; 4],
    pub add: [f32; 4],
}

impl Default for ColorTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ColorTransform {
    pub const IDENTITY: ColorTransform = ColorTransform { mul: [1.0; 4], add: [0.0; 4] };

    pub fn apply(&self, c: Color) -> Color {
        let mut rgba = c.to_array();
        for i in 0..4 {
            let v = rgba[i] as f32 * self.mul[i] + self.add[i];
            rgba[i] = v.clamp(0.0, 255.0) as u8;
        }
        Color::from_array(rgba)
    }

    pub fn is_identity(&self) -> bool {
        self.mul.iter().all(|m| approx_eq_f32(*m, 1.0)) && self.add.iter().all(|a| approx_eq_f32(*a, 0.0))
    }
}

/// `parent * own` applies `own` first, then `parent`.
impl Mul for ColorTransform {
    type Output = ColorTransform;

    fn mul(self, rhs: ColorTransform) -> ColorTransform {
        let mut out = ColorTransform::IDENTITY;
        for i in 0..4 {
            out.mul[i] = rhs.mul[i] * self.mul[i];
            out.add[i] = rhs.add[i] * self.mul[i] + self.add[i];
        }
        out
    }
}

/// One packed vertex: pixel-space position, texture coordinate and additive color.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VertexPack {
    pub x: f32,
    pub y: f32,
    pub u: f32,
    pub v: f32,
    pub additive: Color,
}

/// One fill-batched draw: a contour slice of a shape's shared buffers.
#[derive(Clone, Copy, Debug)]
pub struct DrawCall<'a> {
    pub vertices: &'a [VertexPack],
    pub indices: &'a [u16],
    pub texture: Option<TextureHandle>,
    pub matrix: Matrix2D,
    pub cxform: ColorTransform,
}

impl DrawCall<'_> {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RenderCmd {
    Clear(Color),
    Draw {
        vertices: Vec<VertexPack>,
        indices: Vec<u16>,
        texture: Option<TextureHandle>,
        matrix: Matrix2D,
        cxform: ColorTransform,
    },
}

impl RenderCmd {
    pub fn from_draw(call: &DrawCall<'_>) -> Self {
        RenderCmd::Draw {
            vertices: call.vertices.to_vec(),
            indices: call.indices.to_vec(),
            texture: call.texture,
            matrix: call.matrix,
            cxform: call.cxform,
        }
    }
}

/// Commands captured for one presented frame.
#[derive(Clone, Debug, Default)]
pub struct FramePacket {
    pub cmds: Vec<RenderCmd>,
}

impl FramePacket {
    pub fn new() -> Self {
        Self { cmds: Vec::new() }
    }

    pub fn reset(&mut self) {
        self.cmds.clear();
    }

    pub fn draw_count(&self) -> usize {
        self.cmds.iter().filter(|c| matches!(c, RenderCmd::Draw { .. })).count()
    }

    pub fn draws(&self) -> impl Iterator<Item = &RenderCmd> {
        self.cmds.iter().filter(|c| matches!(c, RenderCmd::Draw { .. }))
    }
}

pub(crate) fn approx_eq_f32(a: f32, b: f32) -> bool {
    (a - b).abs() <= 0.0001
}
