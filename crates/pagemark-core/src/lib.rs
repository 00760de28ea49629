//! Pagemark Core Library
//!
//! Drawing engine, undo/redo history and page tools for the Pagemark PDF
//! annotator. Rendering backends plug in through [`RenderSurface`].

pub mod coords;
pub mod drawing;
pub mod export;
pub mod history;
pub mod input;
pub mod organise;
pub mod session;
pub mod style;
pub mod surface;
pub mod text;
pub mod tools;
pub mod watermark;

pub use coords::SurfaceMapping;
pub use drawing::{CompletedGesture, DrawingEngine, EngineState, GestureOutcome, StrokeSession};
pub use history::{HistoryLog, HistoryStatus};
pub use input::{ActivePanel, PointerEvent};
pub use session::{EditorSession, HistoryEntry, SessionConfig, SessionError, SessionResult};
pub use style::SerializableColor;
pub use surface::{Paint, RecordingSurface, RenderSurface, Snapshot, SurfaceError, SurfaceId, SurfaceResult};
pub use text::{FontDescriptor, TextRun, TextStyle};
pub use tools::{DrawingOptions, ShapeKind, ToolKind};
pub use watermark::WatermarkOptions;
