//! Contour tessellation: convert one closed twip-space contour into triangle fans in
//! pixel units.
//!
//! Each contour is tessellated in isolation. Winding is not shared across contours, so
//! holes must already be expressed upstream as separate contours with their own fill.
//!
//! Pipeline per contour:
//! 1. normalize the ring (closing point, consecutive duplicates)
//! 2. triangulate: earcut for simple rings, a non-zero fill tessellation for rings that
//!    cross or touch themselves (intersection points become new vertices)
//! 3. greedy merge into convex polygons of at most `MAX_POLYGON_SIZE` vertices
//! 4. emit each polygon as a triangle fan anchored at its first vertex

use crate::render::Point2f;

use earcutr::earcut;
use lyon_tessellation::math::point;
use lyon_tessellation::path::Path;
use lyon_tessellation::{BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers};

/// Upper bound on vertices per convex polygon before fan decomposition.
pub const MAX_POLYGON_SIZE: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TessError {
    #[error("contour contains a non-finite coordinate")]
    NonFinite,
    #[error("contour has {0} vertices, more than a u16 index buffer can address")]
    TooManyVertices(usize),
    #[error("triangulation failed")]
    Triangulation,
}

/// Output of one contour's tessellation.
///
/// `indices` address `vertices` and always come in triangles.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TessOutput {
    /// Positions in pixel units.
    pub vertices: Vec<Point2f>,
    pub indices: Vec<u16>,
}

impl TessOutput {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Tessellate one contour under the non-zero winding rule.
///
/// A contour with fewer than three distinct points yields an empty output, not an error.
pub fn tessellate_contour(points: &[Point2f]) -> Result<TessOutput, TessError> {
    // The context owns every scratch buffer; it is dropped on each return path below.
    let mut ctx = TessContext::new(points)?;
    ctx.tessellate()?;
    Ok(ctx.finish())
}

/// Scratch state for one contour.
struct TessContext {
    /// Normalized ring in twips.
    ring: Vec<Point2f>,
    polygons: Vec<Vec<u16>>,
}

impl TessContext {
    fn new(points: &[Point2f]) -> Result<Self, TessError> {
        if points.iter().any(|p| !p.is_finite()) {
            return Err(TessError::NonFinite);
        }
        let mut ring = points.to_vec();
        normalize_ring(&mut ring);
        if ring.len() > u16::MAX as usize {
            return Err(TessError::TooManyVertices(ring.len()));
        }
        Ok(Self { ring, polygons: Vec::new() })
    }

    fn tessellate(&mut self) -> Result<(), TessError> {
        if self.ring.len() < 3 {
            return Ok(());
        }

        let idx = if is_simple_ring(&self.ring) {
            self.earcut_ring()?
        } else {
            self.non_zero_fill()?
        };
        if idx.len() % 3 != 0 || idx.iter().any(|&i| i >= self.ring.len()) {
            return Err(TessError::Triangulation);
        }

        self.polygons.reserve(idx.len() / 3);
        for tri in idx.chunks_exact(3) {
            let (a, b, c) = (tri[0] as u16, tri[1] as u16, tri[2] as u16);
            let area = cross(self.ring[a as usize], self.ring[b as usize], self.ring[c as usize]);
            if area > 0.0 {
                self.polygons.push(vec![a, b, c]);
            } else if area < 0.0 {
                self.polygons.push(vec![a, c, b]);
            }
            // Zero-area slivers cover nothing; drop them.
        }

        merge_convex(&mut self.polygons, &self.ring);
        Ok(())
    }

    fn earcut_ring(&self) -> Result<Vec<usize>, TessError> {
        let mut coords: Vec<f64> = Vec::with_capacity(self.ring.len() * 2);
        for p in &self.ring {
            coords.push(p.x as f64);
            coords.push(p.y as f64);
        }
        earcut(&coords, &[], 2).map_err(|_| TessError::Triangulation)
    }

    /// Tessellate a self-intersecting ring under the non-zero rule.
    ///
    /// Replaces `ring` with the tessellator's vertices, which include every crossing.
    fn non_zero_fill(&mut self) -> Result<Vec<usize>, TessError> {
        let mut builder = Path::builder();
        builder.begin(point(self.ring[0].x, self.ring[0].y));
        for p in &self.ring[1..] {
            builder.line_to(point(p.x, p.y));
        }
        builder.end(true);
        let path = builder.build();

        let mut geom: VertexBuffers<Point2f, u16> = VertexBuffers::new();
        FillTessellator::new()
            .tessellate_path(
                path.as_slice(),
                &FillOptions::non_zero(),
                &mut BuffersBuilder::new(&mut geom, |v: FillVertex| {
                    let p = v.position();
                    Point2f::new(p.x, p.y)
                }),
            )
            .map_err(|e| {
                log::debug!("non-zero fill failed: {e:?}");
                TessError::Triangulation
            })?;

        self.ring = geom.vertices;
        Ok(geom.indices.into_iter().map(usize::from).collect())
    }

    fn finish(self) -> TessOutput {
        let mut indices: Vec<u16> = Vec::with_capacity(self.polygons.iter().map(|p| (p.len() - 2) * 3).sum());
        for poly in &self.polygons {
            // triangle fans
            for k in 2..poly.len() {
                indices.push(poly[0]);
                indices.push(poly[k - 1]);
                indices.push(poly[k]);
            }
        }
        let vertices = self.ring.iter().map(|p| p.to_pixels()).collect();
        TessOutput { vertices, indices }
    }
}

/// Greedily merge edge-adjacent polygons while the union stays convex and small.
///
/// Iterates in index order, so the result depends only on the triangulation.
fn merge_convex(polys: &mut Vec<Vec<u16>>, ring: &[Point2f]) {
    let mut i = 0;
    while i < polys.len() {
        let mut j = i + 1;
        while j < polys.len() {
            if polys[i].len() + polys[j].len() - 2 <= MAX_POLYGON_SIZE {
                if let Some(merged) = try_merge(&polys[i], &polys[j], ring) {
                    polys[i] = merged;
                    polys.remove(j);
                    j = i + 1;
                    continue;
                }
            }
            j += 1;
        }
        i += 1;
    }
}

/// Join `p` and `q` across a shared edge `(a, b)` in `p` / `(b, a)` in `q`.
fn try_merge(p: &[u16], q: &[u16], ring: &[Point2f]) -> Option<Vec<u16>> {
    let n = p.len();
    let m = q.len();
    for i in 0..n {
        let a = p[i];
        let b = p[(i + 1) % n];
        for j in 0..m {
            if q[j] != b || q[(j + 1) % m] != a {
                continue;
            }
            let mut out: Vec<u16> = Vec::with_capacity(n + m - 2);
            // b .. a along p
            for k in 0..n {
                out.push(p[(i + 1 + k) % n]);
            }
            // after a, back to (excluding) b along q
            for k in 2..m {
                out.push(q[(j + k) % m]);
            }
            return (has_unique_vertices(&out) && is_convex(&out, ring)).then_some(out);
        }
    }
    None
}

fn has_unique_vertices(poly: &[u16]) -> bool {
    poly.iter().enumerate().all(|(i, v)| !poly[i + 1..].contains(v))
}

/// Every turn is a left turn (or straight) for a positively oriented polygon.
fn is_convex(poly: &[u16], ring: &[Point2f]) -> bool {
    let n = poly.len();
    (0..n).all(|k| {
        let a = ring[poly[k] as usize];
        let b = ring[poly[(k + 1) % n] as usize];
        let c = ring[poly[(k + 2) % n] as usize];
        cross(a, b, c) >= 0.0
    })
}

#[inline(always)]
fn cross(a: Point2f, b: Point2f, c: Point2f) -> f64 {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let (cx, cy) = (c.x as f64, c.y as f64);
    (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
}

/// No two edges cross or touch, and no edge folds straight back onto its predecessor.
fn is_simple_ring(ring: &[Point2f]) -> bool {
    let n = ring.len();
    for k in 0..n {
        let prev = ring[(k + n - 1) % n];
        let cur = ring[k];
        let next = ring[(k + 1) % n];
        let dot = (cur.x as f64 - prev.x as f64) * (next.x as f64 - cur.x as f64)
            + (cur.y as f64 - prev.y as f64) * (next.y as f64 - cur.y as f64);
        if cross(prev, cur, next) == 0.0 && dot < 0.0 {
            return false;
        }
    }
    for i in 0..n {
        let (a, b) = (ring[i], ring[(i + 1) % n]);
        for j in i + 2..n {
            // edges sharing a vertex
            if i == 0 && j == n - 1 {
                continue;
            }
            let (c, d) = (ring[j], ring[(j + 1) % n]);
            if segments_touch(a, b, c, d) {
                return false;
            }
        }
    }
    true
}

fn segments_touch(a: Point2f, b: Point2f, c: Point2f, d: Point2f) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    if d1 * d2 < 0.0 && d3 * d4 < 0.0 {
        return true;
    }
    (d1 == 0.0 && within_bounds(c, d, a))
        || (d2 == 0.0 && within_bounds(c, d, b))
        || (d3 == 0.0 && within_bounds(a, b, c))
        || (d4 == 0.0 && within_bounds(a, b, d))
}

/// `r` lies in the bounding box of segment `pq`.
fn within_bounds(p: Point2f, q: Point2f, r: Point2f) -> bool {
    r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
}

/// Remove the duplicated closing vertex and consecutive duplicates.
fn normalize_ring(ring: &mut Vec<Point2f>) {
    ring.dedup();
    while ring.len() >= 2 && ring[0] == ring[ring.len() - 1] {
        ring.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f32, f32)]) -> Vec<Point2f> {
        raw.iter().map(|&(x, y)| Point2f::new(x, y)).collect()
    }

    fn polygons_of(raw: &[(f32, f32)]) -> Vec<Vec<u16>> {
        let mut ctx = TessContext::new(&pts(raw)).unwrap();
        ctx.tessellate().unwrap();
        ctx.polygons
    }

    #[test]
    fn square_becomes_one_quad_fan() {
        let out = tessellate_contour(&pts(&[(0.0, 0.0), (200.0, 0.0), (200.0, 200.0), (0.0, 200.0)])).unwrap();
        assert_eq!(out.vertices.len(), 4);
        assert_eq!(out.indices.len(), 6);
        assert_eq!(out.vertices[2], Point2f::new(10.0, 10.0));
        // Fan: both triangles share the anchor.
        assert_eq!(out.indices[0], out.indices[3]);
    }

    #[test]
    fn winding_direction_does_not_matter_for_one_contour() {
        let ccw = tessellate_contour(&pts(&[(0.0, 0.0), (200.0, 0.0), (200.0, 200.0), (0.0, 200.0)])).unwrap();
        let cw = tessellate_contour(&pts(&[(0.0, 0.0), (0.0, 200.0), (200.0, 200.0), (200.0, 0.0)])).unwrap();
        assert_eq!(ccw.triangle_count(), cw.triangle_count());
    }

    #[test]
    fn closing_point_is_dropped() {
        let out = tessellate_contour(&pts(&[(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (0.0, 0.0)])).unwrap();
        assert_eq!(out.vertices.len(), 3);
        assert_eq!(out.indices.len(), 3);
    }

    #[test]
    fn hexagon_merges_into_single_polygon() {
        let polys = polygons_of(&[(2.0, 0.0), (4.0, 1.0), (4.0, 3.0), (2.0, 4.0), (0.0, 3.0), (0.0, 1.0)]);
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].len(), 6);
    }

    #[test]
    fn octagon_is_split_into_bounded_polygons() {
        let polys = polygons_of(&[
            (3.0, 0.0),
            (6.0, 0.0),
            (9.0, 3.0),
            (9.0, 6.0),
            (6.0, 9.0),
            (3.0, 9.0),
            (0.0, 6.0),
            (0.0, 3.0),
        ]);
        assert!(polys.len() >= 2);
        assert!(polys.iter().all(|p| p.len() <= MAX_POLYGON_SIZE));
        let tris: usize = polys.iter().map(|p| p.len() - 2).sum();
        assert_eq!(tris, 6);
    }

    #[test]
    fn concave_contour_yields_convex_pieces() {
        let raw = [(0.0, 0.0), (40.0, 0.0), (40.0, 20.0), (20.0, 20.0), (20.0, 40.0), (0.0, 40.0)];
        let ring = pts(&raw);
        let polys = polygons_of(&raw);
        assert!(polys.len() >= 2);
        for p in &polys {
            assert!(p.len() <= MAX_POLYGON_SIZE);
            assert!(is_convex(p, &ring));
        }
        let out = tessellate_contour(&ring).unwrap();
        assert_eq!(out.triangle_count(), 4);
    }

    #[test]
    fn degenerate_contours_are_empty_not_errors() {
        assert_eq!(tessellate_contour(&[]).unwrap(), TessOutput::default());
        let line = tessellate_contour(&pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 0.0)])).unwrap();
        assert!(line.indices.is_empty());
    }

    #[test]
    fn non_finite_input_fails() {
        let err = tessellate_contour(&pts(&[(0.0, 0.0), (f32::NAN, 0.0), (1.0, 1.0)])).unwrap_err();
        assert_eq!(err, TessError::NonFinite);
    }

    fn triangles(out: &TessOutput) -> Vec<[Point2f; 3]> {
        out.indices
            .chunks_exact(3)
            .map(|t| [out.vertices[t[0] as usize], out.vertices[t[1] as usize], out.vertices[t[2] as usize]])
            .collect()
    }

    fn covered_area(out: &TessOutput) -> f64 {
        triangles(out).iter().map(|[a, b, c]| cross(*a, *b, *c).abs() / 2.0).sum()
    }

    fn covers(out: &TessOutput, p: Point2f) -> bool {
        triangles(out).iter().any(|[a, b, c]| {
            let (d1, d2, d3) = (cross(*a, *b, p), cross(*b, *c, p), cross(*c, *a, p));
            (d1 >= 0.0 && d2 >= 0.0 && d3 >= 0.0) || (d1 <= 0.0 && d2 <= 0.0 && d3 <= 0.0)
        })
    }

    #[test]
    fn simple_rings_are_detected() {
        assert!(is_simple_ring(&pts(&[(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (0.0, 20.0)])));
        assert!(!is_simple_ring(&pts(&[(0.0, 0.0), (200.0, 200.0), (200.0, 0.0), (0.0, 200.0)])));
        // touches itself at (10, 0)
        assert!(!is_simple_ring(&pts(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (20.0, 20.0), (10.0, 0.0), (0.0, 20.0)])));
    }

    #[test]
    fn bowtie_fills_both_lobes() {
        let out = tessellate_contour(&pts(&[(0.0, 0.0), (200.0, 200.0), (200.0, 0.0), (0.0, 200.0)])).unwrap();
        assert!((covered_area(&out) - 50.0).abs() < 1e-3);
        assert!(covers(&out, Point2f::new(2.0, 5.0)));
        assert!(covers(&out, Point2f::new(8.0, 5.0)));
        assert!(!covers(&out, Point2f::new(5.0, 2.0)));
        assert!(!covers(&out, Point2f::new(5.0, 8.0)));
        assert!(out.indices.iter().all(|&i| (i as usize) < out.vertices.len()));
    }

    #[test]
    fn pentagram_center_is_filled_once() {
        // Outer radius 1000 twips (50 px), every second point joined.
        let star: Vec<Point2f> = (0..5)
            .map(|k| {
                let angle = -std::f32::consts::FRAC_PI_2 + k as f32 * 4.0 * std::f32::consts::PI / 5.0;
                Point2f::new(1000.0 * angle.cos(), 1000.0 * angle.sin())
            })
            .collect();
        let out = tessellate_contour(&star).unwrap();

        // Regular pentagram area is about 1.12257 * R^2.
        let expected = 1.122_569_f64 * 50.0 * 50.0;
        assert!((covered_area(&out) - expected).abs() < expected * 0.01, "area {}", covered_area(&out));
        assert!(covers(&out, Point2f::new(0.0, 0.0)));
        assert!(covers(&out, Point2f::new(0.0, -45.0)));
        assert!(out.indices.len() % 3 == 0);
    }

    #[test]
    fn output_is_deterministic() {
        let raw = pts(&[(0.0, 0.0), (60.0, 10.0), (80.0, 50.0), (40.0, 30.0), (10.0, 70.0), (-20.0, 30.0)]);
        let a = tessellate_contour(&raw).unwrap();
        let b = tessellate_contour(&raw).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.indices.len() % 3, 0);
        assert!(a.indices.iter().all(|&i| (i as usize) < a.vertices.len()));
    }
}
