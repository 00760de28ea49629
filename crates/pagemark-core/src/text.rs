//! Text overlay rendering.
//!
//! Text is anchored at its top-left corner in page space. Surfaces draw text
//! from a baseline, so the baseline is placed one font size below the
//! anchor, and everything is multiplied by the page-to-surface scale.

use crate::style::SerializableColor;
use crate::surface::RenderSurface;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text styling options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// Font size in page units.
    pub size: f64,
    pub color: SerializableColor,
    /// Font family name, e.g. "Helvetica" or "Times".
    pub font: String,
    pub bold: bool,
    pub italic: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 16.0,
            color: SerializableColor::black(),
            font: "Helvetica".to_string(),
            bold: false,
            italic: false,
        }
    }
}

/// Resolved font for a single text run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDescriptor {
    pub family: String,
    /// Size in surface pixels.
    pub size_px: f64,
    pub bold: bool,
    pub italic: bool,
}

impl FontDescriptor {
    /// Resolve `style` at the given scale.
    pub fn from_style(style: &TextStyle, scale: f64) -> Self {
        Self {
            family: style.font.clone(),
            size_px: style.size * scale,
            bold: style.bold,
            italic: style.italic,
        }
    }
}

/// CSS font shorthand: `[italic] [bold] <size>px <family>`.
impl fmt::Display for FontDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.italic {
            write!(f, "italic ")?;
        }
        if self.bold {
            write!(f, "bold ")?;
        }
        write!(f, "{}px {}", self.size_px, self.family)
    }
}

/// A positioned run of text, ready for a surface to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    /// Baseline origin in surface pixels.
    pub origin: Point,
    pub font: FontDescriptor,
    pub color: SerializableColor,
}

impl TextRun {
    /// Lay out `text` anchored at `anchor` (top-left, page space).
    ///
    /// Returns `None` for empty or whitespace-only text, and for anchors,
    /// scales or sizes that are not finite.
    pub fn layout(text: &str, anchor: Point, scale: f64, style: &TextStyle) -> Option<Self> {
        if text.trim().is_empty() {
            return None;
        }
        if !anchor.is_finite() || !scale.is_finite() || !style.size.is_finite() {
            log::debug!("text: rejecting non-finite placement {anchor:?} x{scale}");
            return None;
        }
        Some(Self {
            text: text.to_string(),
            origin: Point::new(anchor.x * scale, anchor.y * scale + style.size * scale),
            font: FontDescriptor::from_style(style, scale),
            color: style.color,
        })
    }
}

/// Draw `text` onto `surface`.
///
/// Returns whether anything was drawn: `false` for blank text or when the
/// surface could not render the run.
pub fn draw_text<S: RenderSurface + ?Sized>(
    surface: &mut S,
    text: &str,
    anchor: Point,
    scale: f64,
    style: &TextStyle,
) -> bool {
    match TextRun::layout(text, anchor, scale, style) {
        Some(run) => {
            log::trace!("text: drawing {:?} with font '{}'", run.text, run.font);
            surface.fill_text(&run)
        }
        None => false,
    }
}
