//! Render surface abstraction.
//!
//! A surface is a mutable 2D raster with a native pixel resolution and an
//! on-screen display rectangle. The drawing engine and the text overlay
//! only talk to surfaces through [`RenderSurface`]; restoring history
//! entries onto a surface is the caller's job.

mod recording;

pub use recording::{DrawOp, RecordingSurface};

use crate::text::TextRun;
use kurbo::{BezPath, Rect, Stroke};
use peniko::{Color, Compose};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Surface errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("Snapshot is {found_w}x{found_h} but surface is {expected_w}x{expected_h}")]
    SizeMismatch {
        expected_w: u32,
        expected_h: u32,
        found_w: u32,
        found_h: u32,
    },
    #[error("Corrupt snapshot: {0}")]
    Corrupt(String),
}

/// Result type for surface operations.
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// Unique identifier of a render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(Uuid);

impl SurfaceId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a draw call combines with existing pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    /// Source color.
    pub color: Color,
    /// Global alpha multiplied into the source color (0.0 to 1.0).
    pub alpha: f32,
    /// Compositing operator. Surfaces support at least `SrcOver` and `DestOut`.
    pub compose: Compose,
}

impl Paint {
    /// Standard painting: source over destination.
    pub fn normal(color: Color, alpha: f32) -> Self {
        Self {
            color,
            alpha: alpha.clamp(0.0, 1.0),
            compose: Compose::SrcOver,
        }
    }

    /// Erasing: removes destination alpha wherever the path covers.
    pub fn erase() -> Self {
        Self {
            color: Color::from_rgba8(0, 0, 0, 255),
            alpha: 1.0,
            compose: Compose::DestOut,
        }
    }

    pub fn is_erase(&self) -> bool {
        self.compose == Compose::DestOut
    }
}

/// An immutable capture of a surface's full contents.
///
/// The byte layout is private to the surface implementation that produced
/// it; callers only copy it around and hand it back to `restore`.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
    width: u32,
    height: u32,
    data: Arc<[u8]>,
}

impl Snapshot {
    pub fn new(width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Fail unless this snapshot was taken from a surface of the given size.
    pub fn check_size(&self, width: u32, height: u32) -> SurfaceResult<()> {
        if self.width == width && self.height == height {
            Ok(())
        } else {
            Err(SurfaceError::SizeMismatch {
                expected_w: width,
                expected_h: height,
                found_w: self.width,
                found_h: self.height,
            })
        }
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// A mutable raster that can be drawn on, captured and restored.
pub trait RenderSurface {
    /// Identity used to bind a stroke session to this surface.
    fn id(&self) -> SurfaceId;

    /// Native (backing) resolution in pixels.
    fn pixel_size(&self) -> (u32, u32);

    /// Bounding rectangle of the surface as displayed, in client coordinates.
    fn display_rect(&self) -> Rect;

    /// Stroke `path` with the given stroke geometry.
    fn stroke(&mut self, path: &BezPath, style: &Stroke, paint: &Paint);

    /// Fill `path` using the non-zero winding rule.
    fn fill(&mut self, path: &BezPath, paint: &Paint);

    /// Draw a single run of text with its baseline at `run.origin`.
    ///
    /// Returns `false` when nothing could be drawn (no usable font).
    fn fill_text(&mut self, run: &TextRun) -> bool;

    /// Capture the whole surface.
    fn snapshot(&self) -> Snapshot;

    /// Replace the whole surface with a previous capture.
    fn restore(&mut self, snapshot: &Snapshot) -> SurfaceResult<()>;
}
