//! Gesture script replay.
//!
//! A script describes a set of blank annotation layers and a sequence of
//! editor steps (tool changes, pointer events, text placement, undo and
//! redo). Replaying it drives an [`EditorSession`] over raster layers the
//! same way the editor UI would.
//!
//! ```json
//! {
//!   "width": 200, "height": 200,
//!   "display": { "width": 100, "height": 100 },
//!   "steps": [
//!     { "op": "options", "tool": "highlighter", "color": "#ffff00", "size": 12 },
//!     { "op": "down", "at": { "x": 10, "y": 10 } },
//!     { "op": "move", "at": { "x": 80, "y": 10 } },
//!     { "op": "up" },
//!     { "op": "undo" }
//!   ]
//! }
//! ```

use clap::Parser;
use kurbo::{Point, Rect, Size};
use pagemark_core::history::HistoryStatus;
use pagemark_core::input::ActivePanel;
use pagemark_core::session::{EditorSession, SessionConfig, SessionError};
use pagemark_core::text::TextStyle;
use pagemark_core::tools::DrawingOptions;
use pagemark_core::GestureOutcome;
use pagemark_raster::{PixelSurface, RasterError, export::encode_png};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Command line of `pagemark-replay`.
#[derive(Debug, Parser)]
#[command(name = "pagemark-replay")]
#[command(about = "Replay a gesture script and write each annotation layer as a PNG")]
pub struct Cli {
    /// JSON gesture script.
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,
    /// Directory that receives `layer_{i}.png`.
    #[arg(value_name = "OUT_DIR")]
    pub out_dir: PathBuf,
}

/// Replay errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid script: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Script must declare at least one layer")]
    NoLayers,
    #[error("Step {step}: {source}")]
    Step {
        step: usize,
        #[source]
        source: SessionError,
    },
    #[error(transparent)]
    Raster(#[from] RasterError),
}

/// Result type for replay operations.
pub type ReplayResult<T> = Result<T, ReplayError>;

fn default_layers() -> usize {
    1
}

/// A replay script.
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// Native pixel width of every layer.
    pub width: u32,
    /// Native pixel height of every layer.
    pub height: u32,
    /// On-screen size of every layer; defaults to the native size.
    #[serde(default)]
    pub display: Option<Size>,
    #[serde(default = "default_layers")]
    pub layers: usize,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_scale() -> f64 {
    1.0
}

/// One editor step.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Replace the drawing options.
    Options(DrawingOptions),
    /// Switch the active panel.
    Panel { panel: ActivePanel },
    /// Replace the text style.
    TextStyle(TextStyle),
    Down {
        #[serde(default)]
        layer: usize,
        at: Point,
    },
    Move {
        #[serde(default)]
        layer: usize,
        at: Point,
    },
    Up {
        #[serde(default)]
        layer: usize,
        #[serde(default)]
        at: Option<Point>,
    },
    Cancel {
        #[serde(default)]
        layer: usize,
    },
    /// Place a text run anchored at `at` (page space).
    Text {
        #[serde(default)]
        layer: usize,
        text: String,
        at: Point,
        #[serde(default = "default_scale")]
        scale: f64,
    },
    Undo,
    Redo,
}

/// Result of a replay.
#[derive(Debug)]
pub struct Replay {
    pub layers: Vec<PixelSurface>,
    /// Number of gestures that completed and were committed.
    pub committed: usize,
    pub history: HistoryStatus,
}

impl Script {
    pub fn from_json(json: &str) -> ReplayResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn blank_layers(&self) -> Vec<PixelSurface> {
        let display = self
            .display
            .unwrap_or_else(|| Size::new(f64::from(self.width), f64::from(self.height)));
        (0..self.layers)
            .map(|_| {
                PixelSurface::new(self.width, self.height).with_display_rect(Rect::from_origin_size(Point::ZERO, display))
            })
            .collect()
    }
}

/// Run every step of `script` against fresh layers.
pub fn replay(script: &Script) -> ReplayResult<Replay> {
    if script.layers == 0 {
        return Err(ReplayError::NoLayers);
    }
    let mut session = EditorSession::new(script.blank_layers(), &script.session);
    let mut committed = 0;

    for (index, step) in script.steps.iter().enumerate() {
        let at_step = |source| ReplayError::Step { step: index, source };
        log::trace!("replay: step {index}: {step:?}");
        let outcome = match step {
            Step::Options(options) => {
                session.options = options.clone();
                None
            }
            Step::Panel { panel } => {
                session.panel = *panel;
                None
            }
            Step::TextStyle(style) => {
                session.text_style = style.clone();
                None
            }
            Step::Down { layer, at } => Some(session.pointer_down(*layer, *at).map_err(at_step)?),
            Step::Move { layer, at } => Some(session.pointer_move(*layer, *at).map_err(at_step)?),
            Step::Up { layer, at } => Some(session.pointer_up(*layer, *at).map_err(at_step)?),
            Step::Cancel { layer } => Some(session.pointer_cancel(*layer).map_err(at_step)?),
            Step::Text { layer, text, at, scale } => {
                if session.place_text(*layer, text, *at, *scale).map_err(at_step)? {
                    committed += 1;
                }
                None
            }
            Step::Undo => {
                if !session.undo().map_err(at_step)? {
                    log::debug!("replay: step {index}: nothing to undo");
                }
                None
            }
            Step::Redo => {
                if !session.redo().map_err(at_step)? {
                    log::debug!("replay: step {index}: nothing to redo");
                }
                None
            }
        };
        if let Some(GestureOutcome::Completed(gesture)) = outcome {
            committed += 1;
            log::debug!(
                "replay: step {index}: {} gesture committed, bounds {:?}",
                gesture.tool.name(),
                gesture.bounds
            );
        }
    }

    let history = session.history_status();
    Ok(Replay {
        layers: session.into_layers(),
        committed,
        history,
    })
}

/// Replay the script at `script_path` and write `layer_{i}.png` files into
/// `out_dir`. Returns the written paths.
pub fn run(script_path: &Path, out_dir: &Path) -> ReplayResult<Vec<PathBuf>> {
    let script = Script::from_json(&std::fs::read_to_string(script_path)?)?;
    let result = replay(&script)?;
    log::info!(
        "Replayed {} steps, {} committed, history at {:?} of {}",
        script.steps.len(),
        result.committed,
        result.history.cursor,
        result.history.len
    );

    std::fs::create_dir_all(out_dir)?;
    let mut written = Vec::with_capacity(result.layers.len());
    for (i, layer) in result.layers.iter().enumerate() {
        let path = out_dir.join(format!("layer_{i}.png"));
        std::fs::write(&path, encode_png(layer.image())?)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HIGHLIGHT: &str = r##"{
        "width": 40, "height": 40,
        "steps": [
            { "op": "options", "tool": "highlighter", "color": "#ffff00", "size": 4 },
            { "op": "down", "at": { "x": 5, "y": 20 } },
            { "op": "move", "at": { "x": 35, "y": 20 } },
            { "op": "up" }
        ]
    }"##;

    fn script(json: &str) -> Script {
        Script::from_json(json).unwrap()
    }

    #[test]
    fn test_parse_defaults() {
        let script = script(r#"{ "width": 10, "height": 20 }"#);
        assert_eq!(script.layers, 1);
        assert!(script.display.is_none());
        assert!(script.steps.is_empty());
        assert_eq!(script.session.history_limit, Some(50));
    }

    #[test]
    fn test_parse_steps() {
        let script = script(
            r#"{ "width": 10, "height": 10, "steps": [
                { "op": "panel", "panel": "text" },
                { "op": "text", "text": "Hi", "at": { "x": 1, "y": 2 } },
                { "op": "up", "layer": 1, "at": { "x": 3, "y": 4 } },
                { "op": "undo" }
            ] }"#,
        );
        assert!(matches!(script.steps[0], Step::Panel { panel: ActivePanel::Text }));
        assert!(matches!(script.steps[1], Step::Text { scale, .. } if scale == 1.0));
        assert!(matches!(script.steps[2], Step::Up { layer: 1, at: Some(_) }));
        assert!(matches!(script.steps[3], Step::Undo));
    }

    #[test]
    fn test_replay_highlighter() {
        let result = replay(&script(HIGHLIGHT)).unwrap();
        assert_eq!(result.committed, 1);
        assert!(result.history.can_undo);
        assert_eq!(result.layers[0].pixel(20, 20), Some([255, 255, 0, 102]));
    }

    #[test]
    fn test_replay_undo_clears_layer() {
        let mut script = script(HIGHLIGHT);
        script.steps.push(Step::Undo);
        let result = replay(&script).unwrap();
        assert!(result.history.can_redo);
        assert_eq!(result.layers[0].pixel(20, 20), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_replay_requires_layers() {
        let script = script(r#"{ "width": 10, "height": 10, "layers": 0 }"#);
        assert!(matches!(replay(&script), Err(ReplayError::NoLayers)));
    }

    #[test]
    fn test_replay_reports_bad_layer() {
        let script = script(
            r#"{ "width": 10, "height": 10, "steps": [
                { "op": "down", "layer": 3, "at": { "x": 1, "y": 1 } }
            ] }"#,
        );
        match replay(&script) {
            Err(ReplayError::Step { step: 0, source }) => {
                assert_eq!(source, SessionError::LayerOutOfRange { index: 3, count: 1 });
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_run_writes_pngs() {
        let dir = tempfile::tempdir().unwrap();
        let script_path = dir.path().join("script.json");
        std::fs::write(&script_path, HIGHLIGHT.replace("\"width\": 40", "\"layers\": 2, \"width\": 40")).unwrap();

        let out = dir.path().join("out");
        let written = run(&script_path, &out).unwrap();
        assert_eq!(written, vec![out.join("layer_0.png"), out.join("layer_1.png")]);

        let decoded = image::load_from_memory(&std::fs::read(&written[0]).unwrap()).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(20, 20).0, [255, 255, 0, 102]);
    }

    #[test]
    fn test_cli_positional_args() {
        let cli = Cli::try_parse_from(["pagemark-replay", "script.json", "out"]).unwrap();
        assert_eq!(cli.script, PathBuf::from("script.json"));
        assert_eq!(cli.out_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_cli_requires_out_dir() {
        assert!(Cli::try_parse_from(["pagemark-replay", "script.json"]).is_err());
    }

    #[test]
    fn test_run_missing_script() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&dir.path().join("missing.json"), dir.path()).unwrap_err();
        assert!(matches!(err, ReplayError::Io(_)));
    }
}
