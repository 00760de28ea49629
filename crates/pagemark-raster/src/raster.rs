//! Scanline path rasterisation and pixel compositing.
//!
//! Paths are flattened to line segments and sampled at pixel centres with
//! the non-zero winding rule. Coverage is binary: a pixel is either inside
//! the path or not, and every covered pixel is composited exactly once per
//! draw call.

use kurbo::{BezPath, PathEl, Point};
use peniko::Compose;

/// Flattening tolerance in pixels.
const FLATTEN_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy)]
struct Edge {
    top: Point,
    bottom: Point,
    /// +1 for downward edges, -1 for upward ones.
    winding: i32,
}

impl Edge {
    fn new(from: Point, to: Point) -> Option<Self> {
        if from.y == to.y {
            return None;
        }
        Some(if from.y < to.y {
            Self { top: from, bottom: to, winding: 1 }
        } else {
            Self { top: to, bottom: from, winding: -1 }
        })
    }

    fn crossing(&self, y: f64) -> Option<f64> {
        if y < self.top.y || y >= self.bottom.y {
            return None;
        }
        let t = (y - self.top.y) / (self.bottom.y - self.top.y);
        Some(self.top.x + t * (self.bottom.x - self.top.x))
    }
}

fn edges(path: &BezPath) -> Vec<Edge> {
    let mut out = Vec::new();
    let mut start = Point::ZERO;
    let mut current = Point::ZERO;
    kurbo::flatten(path.iter(), FLATTEN_TOLERANCE, |el| match el {
        PathEl::MoveTo(p) => {
            // Fill implicitly closes every subpath.
            out.extend(Edge::new(current, start));
            start = p;
            current = p;
        }
        PathEl::LineTo(p) => {
            out.extend(Edge::new(current, p));
            current = p;
        }
        PathEl::ClosePath => {
            out.extend(Edge::new(current, start));
            current = start;
        }
        _ => {}
    });
    out.extend(Edge::new(current, start));
    out
}

/// A horizontal run of covered pixels `[x0, x1)` on row `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub y: u32,
    pub x0: u32,
    pub x1: u32,
}

/// Pixels of a `width` x `height` grid covered by `path` (non-zero rule).
pub(crate) fn spans(path: &BezPath, width: u32, height: u32) -> Vec<Span> {
    let edges = edges(path);
    if edges.is_empty() || width == 0 || height == 0 {
        return Vec::new();
    }

    let min_y = edges.iter().map(|e| e.top.y).fold(f64::INFINITY, f64::min);
    let max_y = edges.iter().map(|e| e.bottom.y).fold(f64::NEG_INFINITY, f64::max);
    let row_start = (min_y - 0.5).ceil().max(0.0) as u32;
    let row_end = ((max_y - 0.5).ceil().max(0.0) as u32).min(height);

    let mut out = Vec::new();
    let mut crossings: Vec<(f64, i32)> = Vec::new();
    for y in row_start..row_end {
        let cy = f64::from(y) + 0.5;
        crossings.clear();
        crossings.extend(edges.iter().filter_map(|e| e.crossing(cy).map(|x| (x, e.winding))));
        crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut winding = 0;
        for pair in crossings.windows(2) {
            winding += pair[0].1;
            if winding == 0 {
                continue;
            }
            let x0 = (pair[0].0 - 0.5).ceil().clamp(0.0, f64::from(width)) as u32;
            let x1 = (pair[1].0 - 0.5).ceil().clamp(0.0, f64::from(width)) as u32;
            if x0 >= x1 {
                continue;
            }
            // Merge with the previous span when adjacent.
            match out.last_mut() {
                Some(Span { y: last_y, x1: last_x1, .. }) if *last_y == y && *last_x1 == x0 => {
                    *last_x1 = x1;
                }
                _ => out.push(Span { y, x0, x1 }),
            }
        }
    }
    out
}

fn to_unit(v: u8) -> f32 {
    f32::from(v) / 255.0
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Composite a straight-alpha source color onto a straight-alpha RGBA8
/// pixel. Only `SrcOver` and `DestOut` are distinguished; every other
/// operator composites as `SrcOver`.
pub(crate) fn composite(dst: &mut [u8], src: [u8; 3], src_alpha: f32, compose: Compose) {
    let sa = src_alpha.clamp(0.0, 1.0);
    let da = to_unit(dst[3]);
    match compose {
        Compose::DestOut => {
            let a = da * (1.0 - sa);
            if a <= 0.0 {
                dst.copy_from_slice(&[0, 0, 0, 0]);
            } else {
                dst[3] = to_byte(a);
            }
        }
        _ => {
            let a = sa + da * (1.0 - sa);
            if a <= 0.0 {
                return;
            }
            for i in 0..3 {
                let c = (to_unit(src[i]) * sa + to_unit(dst[i]) * da * (1.0 - sa)) / a;
                dst[i] = to_byte(c);
            }
            dst[3] = to_byte(a);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Rect, Shape};

    fn covered(spans: &[Span]) -> usize {
        spans.iter().map(|s| (s.x1 - s.x0) as usize).sum()
    }

    #[test]
    fn test_rect_covers_pixel_centres() {
        let path = Rect::new(2.0, 2.0, 5.0, 5.0).to_path(0.1);
        let spans = spans(&path, 10, 10);
        assert_eq!(spans.len(), 3);
        assert!(spans.iter().all(|s| s.x0 == 2 && s.x1 == 5));
        assert_eq!(spans[0].y, 2);
        assert_eq!(spans[2].y, 4);
    }

    #[test]
    fn test_clipped_to_grid() {
        let path = Rect::new(-5.0, -5.0, 50.0, 3.0).to_path(0.1);
        let spans = spans(&path, 10, 10);
        assert_eq!(covered(&spans), 30);
    }

    #[test]
    fn test_overlapping_subpaths_counted_once() {
        let mut path = Rect::new(0.0, 0.0, 6.0, 1.0).to_path(0.1);
        path.extend(Rect::new(3.0, 0.0, 9.0, 1.0).to_path(0.1));
        let spans = spans(&path, 10, 10);
        assert_eq!(spans, vec![Span { y: 0, x0: 0, x1: 9 }]);
    }

    #[test]
    fn test_nonzero_keeps_same_direction_hole_filled() {
        // Inner rect wound the same way: non-zero fills it.
        let mut path = Rect::new(0.0, 0.0, 8.0, 8.0).to_path(0.1);
        path.extend(Rect::new(2.0, 2.0, 6.0, 6.0).to_path(0.1));
        assert_eq!(covered(&spans(&path, 8, 8)), 64);
    }

    #[test]
    fn test_open_path_closed_implicitly() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((4.0, 0.0));
        path.line_to((4.0, 4.0));
        path.line_to((0.0, 4.0));
        assert_eq!(covered(&spans(&path, 10, 10)), 16);
    }

    #[test]
    fn test_src_over_on_transparent() {
        let mut px = [0u8, 0, 0, 0];
        composite(&mut px, [255, 255, 0], 0.4, Compose::SrcOver);
        assert_eq!(px, [255, 255, 0, 102]);
    }

    #[test]
    fn test_src_over_on_opaque() {
        let mut px = [255u8, 255, 255, 255];
        composite(&mut px, [255, 0, 0], 0.4, Compose::SrcOver);
        assert_eq!(px, [255, 153, 153, 255]);
    }

    #[test]
    fn test_dest_out() {
        let mut px = [10u8, 20, 30, 255];
        composite(&mut px, [0, 0, 0], 1.0, Compose::DestOut);
        assert_eq!(px, [0, 0, 0, 0]);

        let mut half = [10u8, 20, 30, 255];
        composite(&mut half, [0, 0, 0], 0.6, Compose::DestOut);
        assert_eq!(half, [10, 20, 30, 102]);
    }

    #[test]
    fn test_unsupported_compose_falls_back_to_src_over() {
        let mut px = [0u8, 0, 0, 0];
        composite(&mut px, [0, 0, 255], 1.0, Compose::Xor);
        assert_eq!(px, [0, 0, 255, 255]);
    }
}
