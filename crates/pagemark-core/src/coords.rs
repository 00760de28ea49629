//! Client-to-surface coordinate mapping.
//!
//! Surfaces are often displayed at a different size than their backing
//! resolution (CSS scaling, HiDPI). Pointer positions arrive in client
//! space and have to be rescaled into native pixels, otherwise strokes
//! drift away from the cursor.

use crate::surface::RenderSurface;
use kurbo::{Affine, Point, Rect, Vec2};

/// Maps client-space points onto a surface's native pixel grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMapping {
    /// Top-left corner of the displayed surface in client space.
    pub origin: Point,
    /// Native pixels per displayed pixel on each axis.
    pub scale: Vec2,
}

impl SurfaceMapping {
    /// Build a mapping from the native size and the displayed rectangle.
    ///
    /// An axis with a zero-sized display extent keeps a scale of 1.
    pub fn new(pixel_size: (u32, u32), display: Rect) -> Self {
        let axis_scale = |native: u32, shown: f64| {
            if shown.abs() > f64::EPSILON {
                f64::from(native) / shown
            } else {
                1.0
            }
        };
        Self {
            origin: display.origin(),
            scale: Vec2::new(
                axis_scale(pixel_size.0, display.width()),
                axis_scale(pixel_size.1, display.height()),
            ),
        }
    }

    /// Mapping for the given surface's current layout.
    pub fn for_surface<S: RenderSurface + ?Sized>(surface: &S) -> Self {
        Self::new(surface.pixel_size(), surface.display_rect())
    }

    /// Transform from client space to surface space.
    pub fn transform(&self) -> Affine {
        Affine::scale_non_uniform(self.scale.x, self.scale.y) * Affine::translate(-self.origin.to_vec2())
    }

    /// Convert a client point into native surface pixels.
    pub fn to_surface(&self, client: Point) -> Point {
        self.transform() * client
    }
}
