//! Drawing tools and their configuration.

use crate::style::SerializableColor;
use kurbo::{BezPath, Cap, Ellipse, Join, Line, Point, Rect, Shape, Stroke};
use serde::{Deserialize, Serialize};

/// Global alpha of the highlighter.
pub const HIGHLIGHTER_ALPHA: f32 = 0.4;

/// Global alpha of the pen (and of every shape).
pub const PEN_ALPHA: f32 = 1.0;

/// Flattening tolerance used when converting shapes to paths.
pub const PATH_TOLERANCE: f64 = 0.1;

/// Available drawing tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Pen,
    Highlighter,
    Eraser,
    Shape,
}

impl ToolKind {
    /// Tools that accumulate a continuous path while the pointer moves.
    pub fn is_freehand(self) -> bool {
        matches!(self, ToolKind::Pen | ToolKind::Highlighter | ToolKind::Eraser)
    }

    /// Global alpha applied while painting with this tool.
    pub fn alpha(self) -> f32 {
        match self {
            ToolKind::Highlighter => HIGHLIGHTER_ALPHA,
            ToolKind::Pen | ToolKind::Eraser | ToolKind::Shape => PEN_ALPHA,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Pen => "pen",
            ToolKind::Highlighter => "highlighter",
            ToolKind::Eraser => "eraser",
            ToolKind::Shape => "shape",
        }
    }
}

/// Geometry drawn by the shape tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Ellipse,
    Line,
}

impl ShapeKind {
    /// Lines ignore fill mode.
    pub fn can_fill(self) -> bool {
        !matches!(self, ShapeKind::Line)
    }
}

/// Current tool configuration, read at gesture start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingOptions {
    pub tool: ToolKind,
    pub shape: ShapeKind,
    pub color: SerializableColor,
    /// Stroke width in surface pixels.
    pub size: f64,
    /// Fill rectangles and ellipses instead of outlining them.
    pub filled: bool,
}

impl Default for DrawingOptions {
    fn default() -> Self {
        Self {
            tool: ToolKind::Pen,
            shape: ShapeKind::Rectangle,
            color: SerializableColor::black(),
            size: 5.0,
            filled: false,
        }
    }
}

impl DrawingOptions {
    /// Stroke geometry: configured width with round caps and joins.
    pub fn stroke_style(&self) -> Stroke {
        Stroke::new(self.size.max(0.0))
            .with_caps(Cap::Round)
            .with_join(Join::Round)
    }

    /// Whether the final shape is filled rather than stroked.
    pub fn fills_shape(&self) -> bool {
        self.filled && self.shape.can_fill()
    }
}

/// Path of `kind` spanning from `origin` to `end`.
///
/// Rectangles and ellipses use the signed extent `end - origin`, so
/// dragging up or left works the same as dragging down or right.
pub fn shape_path(kind: ShapeKind, origin: Point, end: Point) -> BezPath {
    let w = end.x - origin.x;
    let h = end.y - origin.y;
    match kind {
        ShapeKind::Rectangle => {
            Rect::new(origin.x, origin.y, origin.x + w, origin.y + h)
                .abs()
                .to_path(PATH_TOLERANCE)
        }
        ShapeKind::Ellipse => {
            let center = Point::new(origin.x + w / 2.0, origin.y + h / 2.0);
            Ellipse::new(center, (w.abs() / 2.0, h.abs() / 2.0), 0.0).to_path(PATH_TOLERANCE)
        }
        ShapeKind::Line => Line::new(origin, end).to_path(PATH_TOLERANCE),
    }
}
