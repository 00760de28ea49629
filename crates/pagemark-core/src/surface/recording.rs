//! Display-list surface.

use super::{Paint, RenderSurface, Snapshot, SurfaceError, SurfaceId, SurfaceResult};
use crate::style::SerializableColor;
use crate::text::TextRun;
use kurbo::{BezPath, Rect, Stroke};
use serde::{Deserialize, Serialize};

/// Paint parameters as recorded in a [`DrawOp`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedPaint {
    pub color: SerializableColor,
    pub alpha: f32,
    pub erase: bool,
}

impl From<&Paint> for RecordedPaint {
    fn from(paint: &Paint) -> Self {
        Self {
            color: paint.color.into(),
            alpha: paint.alpha,
            erase: paint.is_erase(),
        }
    }
}

/// A single recorded draw call. Paths are stored as SVG path data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Stroke {
        path: String,
        width: f64,
        paint: RecordedPaint,
    },
    Fill {
        path: String,
        paint: RecordedPaint,
    },
    Text(TextRun),
}

impl DrawOp {
    /// Parse the recorded path back into geometry (text ops have none).
    pub fn path(&self) -> Option<BezPath> {
        match self {
            DrawOp::Stroke { path, .. } | DrawOp::Fill { path, .. } => BezPath::from_svg(path).ok(),
            DrawOp::Text(_) => None,
        }
    }
}

/// A surface that records draw calls instead of rasterising them.
///
/// Snapshots serialise the display list, so restoring one brings back the
/// exact sequence of operations recorded at capture time.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    id: SurfaceId,
    width: u32,
    height: u32,
    display: Rect,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    /// Create a surface displayed at its native size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            id: SurfaceId::new(),
            width,
            height,
            display: Rect::new(0.0, 0.0, f64::from(width), f64::from(height)),
            ops: Vec::new(),
        }
    }

    /// Set the on-screen rectangle the surface is displayed in.
    pub fn with_display_rect(mut self, display: Rect) -> Self {
        self.display = display;
        self
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl RenderSurface for RecordingSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn pixel_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn display_rect(&self) -> Rect {
        self.display
    }

    fn stroke(&mut self, path: &BezPath, style: &Stroke, paint: &Paint) {
        self.ops.push(DrawOp::Stroke {
            path: path.to_svg(),
            width: style.width,
            paint: paint.into(),
        });
    }

    fn fill(&mut self, path: &BezPath, paint: &Paint) {
        self.ops.push(DrawOp::Fill {
            path: path.to_svg(),
            paint: paint.into(),
        });
    }

    fn fill_text(&mut self, run: &TextRun) -> bool {
        self.ops.push(DrawOp::Text(run.clone()));
        true
    }

    fn snapshot(&self) -> Snapshot {
        let data = match serde_json::to_vec(&self.ops) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("recording: failed to serialise display list: {e}");
                Vec::new()
            }
        };
        Snapshot::new(self.width, self.height, data)
    }

    fn restore(&mut self, snapshot: &Snapshot) -> SurfaceResult<()> {
        snapshot.check_size(self.width, self.height)?;
        let ops: Vec<DrawOp> = serde_json::from_slice(snapshot.data())
            .map_err(|e| SurfaceError::Corrupt(e.to_string()))?;
        self.ops = ops;
        Ok(())
    }
}
