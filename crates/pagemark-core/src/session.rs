//! Editor session: annotation layers, drawing engine and history together.
//!
//! The session plays the caller role around the [`DrawingEngine`]: it feeds
//! pointer input to the engine, captures every layer when a gesture
//! completes and pushes the capture to the history log, and restores
//! layers on undo and redo.

use crate::drawing::{DrawingEngine, GestureOutcome};
use crate::history::{HistoryLog, HistoryStatus};
use crate::input::{ActivePanel, PointerEvent};
use crate::surface::{RenderSurface, Snapshot, SurfaceError};
use crate::text::{TextStyle, draw_text};
use crate::tools::DrawingOptions;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of retained history entries.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Session errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Layer {index} out of range (session has {count} layers)")]
    LayerOutOfRange { index: usize, count: usize },
    #[error("History entry has {found} layers, session has {expected}")]
    LayerCountMismatch { expected: usize, found: usize },
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum retained history entries (`None` = unbounded).
    pub history_limit: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: Some(DEFAULT_HISTORY_LIMIT),
        }
    }
}

/// All annotation layers captured at one moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    layers: Vec<Snapshot>,
}

impl HistoryEntry {
    /// Capture every layer.
    pub fn capture<S: RenderSurface>(layers: &[S]) -> Self {
        Self {
            layers: layers.iter().map(RenderSurface::snapshot).collect(),
        }
    }

    pub fn layers(&self) -> &[Snapshot] {
        &self.layers
    }

    /// Restore every layer from this entry.
    pub fn restore_into<S: RenderSurface>(&self, layers: &mut [S]) -> SessionResult<()> {
        if self.layers.len() != layers.len() {
            return Err(SessionError::LayerCountMismatch {
                expected: layers.len(),
                found: self.layers.len(),
            });
        }
        for (layer, snapshot) in layers.iter_mut().zip(&self.layers) {
            layer.restore(snapshot)?;
        }
        Ok(())
    }
}

/// An annotation session over a set of layers (typically one per page).
pub struct EditorSession<S: RenderSurface> {
    layers: Vec<S>,
    engine: DrawingEngine,
    history: HistoryLog<HistoryEntry>,
    /// Tool configuration used for new gestures.
    pub options: DrawingOptions,
    /// Style used by [`place_text`](Self::place_text).
    pub text_style: TextStyle,
    /// Panel shown in the editor; drawing only happens under `Draw`.
    pub panel: ActivePanel,
}

impl<S: RenderSurface> EditorSession<S> {
    /// Start a session. The current layer contents become the baseline
    /// history entry.
    pub fn new(layers: Vec<S>, config: &SessionConfig) -> Self {
        let history = match config.history_limit {
            Some(limit) => HistoryLog::with_limit(limit),
            None => HistoryLog::new(),
        };
        let mut session = Self {
            layers,
            engine: DrawingEngine::new(),
            history,
            options: DrawingOptions::default(),
            text_style: TextStyle::default(),
            panel: ActivePanel::Draw,
        };
        session.commit();
        session
    }

    /// Replace all layers (document reload). History restarts from the new
    /// layers and any in-flight gesture is dropped.
    pub fn reset(&mut self, layers: Vec<S>) {
        self.engine.cancel();
        self.layers = layers;
        self.history.clear();
        self.commit();
        log::debug!("session: reset with {} layers", self.layers.len());
    }

    pub fn layers(&self) -> &[S] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> SessionResult<&S> {
        let count = self.layers.len();
        self.layers
            .get(index)
            .ok_or(SessionError::LayerOutOfRange { index, count })
    }

    /// Mutable access to a layer. Changes made directly are not recorded
    /// until [`commit`](Self::commit) is called.
    pub fn layer_mut(&mut self, index: usize) -> SessionResult<&mut S> {
        let count = self.layers.len();
        self.layers
            .get_mut(index)
            .ok_or(SessionError::LayerOutOfRange { index, count })
    }

    /// Consume the session and hand back its layers.
    pub fn into_layers(self) -> Vec<S> {
        self.layers
    }

    pub fn engine(&self) -> &DrawingEngine {
        &self.engine
    }

    pub fn history(&self) -> &HistoryLog<HistoryEntry> {
        &self.history
    }

    /// Capture every layer and push the capture to history.
    pub fn commit(&mut self) {
        self.history.push(HistoryEntry::capture(&self.layers));
    }

    /// Route a pointer event to the engine for the given layer.
    ///
    /// Completed gestures are committed to history before returning.
    pub fn handle_pointer(&mut self, layer: usize, event: PointerEvent) -> SessionResult<GestureOutcome> {
        let count = self.layers.len();
        let surface = self
            .layers
            .get_mut(layer)
            .ok_or(SessionError::LayerOutOfRange { index: layer, count })?;
        let outcome = self.engine.handle(surface, event, self.panel, &self.options);
        if let GestureOutcome::Completed(gesture) = &outcome {
            log::debug!("session: committing {} gesture on layer {layer}", gesture.tool.name());
            self.commit();
        }
        Ok(outcome)
    }

    pub fn pointer_down(&mut self, layer: usize, position: Point) -> SessionResult<GestureOutcome> {
        self.handle_pointer(layer, PointerEvent::Down { position })
    }

    pub fn pointer_move(&mut self, layer: usize, position: Point) -> SessionResult<GestureOutcome> {
        self.handle_pointer(layer, PointerEvent::Move { position })
    }

    pub fn pointer_up(&mut self, layer: usize, position: Option<Point>) -> SessionResult<GestureOutcome> {
        self.handle_pointer(layer, PointerEvent::Up { position })
    }

    pub fn pointer_cancel(&mut self, layer: usize) -> SessionResult<GestureOutcome> {
        self.handle_pointer(layer, PointerEvent::Cancel)
    }

    /// Draw `text` on a layer with the session text style and commit it.
    ///
    /// Returns `false` (and commits nothing) for blank text or when the
    /// layer could not draw it.
    pub fn place_text(&mut self, layer: usize, text: &str, anchor: Point, scale: f64) -> SessionResult<bool> {
        let style = self.text_style.clone();
        let surface = self.layer_mut(layer)?;
        if !draw_text(surface, text, anchor, scale, &style) {
            return Ok(false);
        }
        self.commit();
        Ok(true)
    }

    /// Restore the previous history entry. Returns `false` when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> SessionResult<bool> {
        self.engine.cancel();
        match self.history.undo() {
            Some(entry) => {
                entry.restore_into(&mut self.layers)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Restore the next history entry. Returns `false` when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> SessionResult<bool> {
        self.engine.cancel();
        match self.history.redo() {
            Some(entry) => {
                entry.restore_into(&mut self.layers)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_status(&self) -> HistoryStatus {
        self.history.status()
    }
}
