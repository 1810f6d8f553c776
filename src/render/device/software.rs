use crate::render::cache::bitmaps::{BitmapSurface, TextureHandle};
use crate::render::device::RenderDevice;
use crate::render::frame::{Color, ColorTransform, DrawCall, VertexPack};

/// CPU framebuffer-backed device (RGBA8, row-major, straight alpha).
///
/// Triangles are filled with column spans: for every covered pixel column the edge
/// intersections at the pixel center give one `[y0, y1)` run.
pub struct SoftwareDevice {
    width: i32,
    height: i32,
    pixels: Vec<u8>,
    textures: Vec<BitmapSurface>,
}

impl SoftwareDevice {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.min(i32::MAX as u32) as i32;
        let height = height.min(i32::MAX as u32) as i32;
        Self {
            width,
            height,
            pixels: vec![0u8; width as usize * height as usize * 4],
            textures: Vec::new(),
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        let i = 4 * (y as usize * self.width as usize + x as usize);
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    #[inline(always)]
    fn blend_pixel(&mut self, x: i32, y: i32, src: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        let i = 4 * (y as usize * self.width as usize + x as usize);
        let sa = src[3] as u16;
        if sa == 255 {
            self.pixels[i..i + 4].copy_from_slice(&src);
        } else if sa != 0 {
            // Straight-alpha blend: out = src*a + dst*(1-a)
            let inv = 255u16 - sa;
            for c in 0..3 {
                let d = self.pixels[i + c] as u16;
                self.pixels[i + c] = ((src[c] as u16 * sa + d * inv + 127) / 255) as u8;
            }
            let da = self.pixels[i + 3] as u16;
            self.pixels[i + 3] = (sa + (da * inv + 127) / 255).min(255) as u8;
        }
    }

    fn shade(texture: Option<&BitmapSurface>, v: &VertexPack, u: f32, t: f32, cxform: &ColorTransform) -> [u8; 4] {
        let base = match texture {
            Some(tex) => {
                let texel = tex.sample(u, t);
                let add = v.additive;
                [
                    texel[0].saturating_add(add.r),
                    texel[1].saturating_add(add.g),
                    texel[2].saturating_add(add.b),
                    texel[3],
                ]
            }
            None => v.additive.to_array(),
        };
        cxform.apply(Color::from_array(base)).to_array()
    }

    fn fill_triangle(&mut self, p: [(f32, f32); 3], src: [&VertexPack; 3], texture: Option<&BitmapSurface>, cxform: &ColorTransform) {
        let [(ax, ay), (bx, by), (cx, cy)] = p;

        // Degenerate reject (area == 0).
        let area2 = (bx - ax) * (cy - ay) - (by - ay) * (cx - ax);
        if area2.abs() <= f32::EPSILON || !area2.is_finite() {
            return;
        }

        let minx = ax.min(bx.min(cx));
        let maxx = ax.max(bx.max(cx));
        let x_start = ((minx - 0.5).ceil() as i32).max(0);
        let x_end = ((maxx - 0.5).floor() as i32).min(self.width - 1);
        if x_end < x_start {
            return;
        }

        let vx = [ax, bx, cx];
        let vy = [ay, by, cy];

        for x in x_start..=x_end {
            let sx = x as f32 + 0.5;
            let mut y_min = f32::INFINITY;
            let mut y_max = f32::NEG_INFINITY;
            let mut hits = 0;

            for e in 0..3 {
                let j = (e + 1) % 3;
                let (x0, y0, x1, y1) = (vx[e], vy[e], vx[j], vy[j]);
                if x0 == x1 {
                    continue;
                }
                // Half-open rule in X to avoid double hits on shared vertices.
                if sx < x0.min(x1) || sx >= x0.max(x1) {
                    continue;
                }
                let y = y0 + (sx - x0) * (y1 - y0) / (x1 - x0);
                y_min = y_min.min(y);
                y_max = y_max.max(y);
                hits += 1;
            }
            if hits < 2 {
                continue;
            }

            let y_start = ((y_min - 0.5).ceil() as i32).max(0);
            let y_end = ((y_max - 0.5).floor() as i32).min(self.height - 1);
            for y in y_start..=y_end {
                let sy = y as f32 + 0.5;
                // Barycentric weights for texture coordinates.
                let w0 = ((bx - sx) * (cy - sy) - (by - sy) * (cx - sx)) / area2;
                let w1 = ((cx - sx) * (ay - sy) - (cy - sy) * (ax - sx)) / area2;
                let w2 = 1.0 - w0 - w1;
                let u = w0 * src[0].u + w1 * src[1].u + w2 * src[2].u;
                let t = w0 * src[0].v + w1 * src[1].v + w2 * src[2].v;
                let rgba = Self::shade(texture, src[0], u, t, cxform);
                self.blend_pixel(x, y, rgba);
            }
        }
    }
}

impl RenderDevice for SoftwareDevice {
    fn surface_width(&self) -> i32 {
        self.width
    }

    fn surface_height(&self) -> i32 {
        self.height
    }

    fn begin_frame(&mut self) {}

    fn clear(&mut self, color: Color) {
        let rgba = color.to_array();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    fn create_texture(&mut self, surface: &BitmapSurface) -> Option<TextureHandle> {
        if !surface.is_valid() {
            return None;
        }
        self.textures.push(surface.clone());
        Some(TextureHandle(self.textures.len() as u32))
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        let textures = std::mem::take(&mut self.textures);
        let texture = call
            .texture
            .and_then(|h| (h.0 as usize).checked_sub(1))
            .and_then(|i| textures.get(i));
        let transformed: Vec<(f32, f32)> = call.vertices.iter().map(|v| call.matrix.apply(v.x, v.y)).collect();

        for tri in call.indices.chunks_exact(3) {
            let (ia, ib, ic) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            if ia >= transformed.len() || ib >= transformed.len() || ic >= transformed.len() {
                continue;
            }
            self.fill_triangle(
                [transformed[ia], transformed[ib], transformed[ic]],
                [&call.vertices[ia], &call.vertices[ib], &call.vertices[ic]],
                texture,
                &call.cxform,
            );
        }
        self.textures = textures;
    }

    fn end_frame(&mut self) {}
}
