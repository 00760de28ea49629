//! Pointer input and the editor mode flag.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Editor panel currently shown. Drawing input is only accepted while the
/// drawing panel is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivePanel {
    #[default]
    Draw,
    Text,
    Organise,
    Convert,
    Advanced,
}

impl ActivePanel {
    /// Whether the drawing engine is armed under this panel.
    pub fn accepts_drawing(self) -> bool {
        self == ActivePanel::Draw
    }
}

/// Pointer event in client coordinates, unified for mouse, pen and touch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointerEvent {
    Down { position: Point },
    Move { position: Point },
    /// Release. `position` is absent when the platform gives no coordinate
    /// (e.g. the pointer left the window).
    Up { position: Option<Point> },
    /// Pointer capture was lost mid-gesture.
    Cancel,
}

impl PointerEvent {
    pub fn position(&self) -> Option<Point> {
        match self {
            PointerEvent::Down { position } | PointerEvent::Move { position } => Some(*position),
            PointerEvent::Up { position } => *position,
            PointerEvent::Cancel => None,
        }
    }
}
