//! Gesture-driven drawing engine.
//!
//! The engine turns a start → move* → stop pointer sequence into raster
//! mutations on a [`RenderSurface`]. It is either idle or running exactly
//! one stroke session; input that arrives out of order, on the wrong
//! surface, or while the drawing panel is not active is ignored.
//!
//! Freehand tools (pen, highlighter, eraser) paint as the pointer moves.
//! The shape tool captures the surface when the gesture starts and, on
//! every move, restores that capture before drawing the shape at the new
//! end point, so only one preview is ever visible. Translucent freehand
//! strokes are redrawn the same way, so the whole stroke blends once.

use crate::coords::SurfaceMapping;
use crate::input::{ActivePanel, PointerEvent};
use crate::surface::{Paint, RenderSurface, Snapshot, SurfaceId};
use crate::tools::{DrawingOptions, ShapeKind, ToolKind, PEN_ALPHA, shape_path};
use kurbo::{BezPath, Point, Rect, Shape, Stroke};
use peniko::Color;

/// A gesture that produced pixels and should be committed to history.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedGesture {
    pub tool: ToolKind,
    /// Surface the gesture drew on.
    pub surface: SurfaceId,
    /// Area touched by the final mutation, in surface pixels.
    pub bounds: Rect,
}

/// Result of feeding input to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// The input did not apply (not armed, no session, wrong surface).
    Ignored,
    /// A session is running.
    InProgress,
    /// The gesture ended without any movement; nothing was drawn.
    Discarded,
    /// The gesture ended after drawing.
    Completed(CompletedGesture),
}

impl GestureOutcome {
    pub fn completed(&self) -> Option<&CompletedGesture> {
        match self {
            GestureOutcome::Completed(gesture) => Some(gesture),
            _ => None,
        }
    }
}

/// State of one in-flight gesture.
#[derive(Debug, Clone)]
pub struct StrokeSession {
    tool: ToolKind,
    shape: ShapeKind,
    surface: SurfaceId,
    /// Starting point in surface pixels.
    origin: Point,
    /// Most recent point in surface pixels.
    last: Point,
    /// Surface capture taken at gesture start (shape tool only).
    snapshot: Option<Snapshot>,
    has_moved: bool,
    /// Accumulated freehand path.
    path: BezPath,
    stroke: Stroke,
    paint: Paint,
    filled: bool,
}

impl StrokeSession {
    fn new(options: &DrawingOptions, surface: SurfaceId, origin: Point) -> Self {
        let color: Color = options.color.into();
        let paint = match options.tool {
            ToolKind::Eraser => Paint::erase(),
            ToolKind::Pen | ToolKind::Highlighter => Paint::normal(color, options.tool.alpha()),
            // Shapes always paint at full opacity.
            ToolKind::Shape => Paint::normal(color, PEN_ALPHA),
        };
        let mut path = BezPath::new();
        path.move_to(origin);
        Self {
            tool: options.tool,
            shape: options.shape,
            surface,
            origin,
            last: origin,
            snapshot: None,
            has_moved: false,
            path,
            stroke: options.stroke_style(),
            paint,
            filled: options.fills_shape(),
        }
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn last_point(&self) -> Point {
        self.last
    }

    pub fn has_moved(&self) -> bool {
        self.has_moved
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn path(&self) -> &BezPath {
        &self.path
    }

    /// Partially transparent, non-erasing paint.
    fn is_translucent(&self) -> bool {
        !self.paint.is_erase() && self.paint.alpha < 1.0
    }

    /// Area covered by the shape from the origin to `end`.
    fn shape_bounds(&self, end: Point) -> Rect {
        let bounds = shape_path(self.shape, self.origin, end).bounding_box();
        if self.filled {
            bounds
        } else {
            let pad = self.stroke.width / 2.0;
            bounds.inflate(pad, pad)
        }
    }

    /// Draw the current shape from the origin to `end`.
    fn draw_shape<S: RenderSurface + ?Sized>(&self, surface: &mut S, end: Point) -> Rect {
        let path = shape_path(self.shape, self.origin, end);
        if self.filled {
            surface.fill(&path, &self.paint);
        } else {
            surface.stroke(&path, &self.stroke, &self.paint);
        }
        self.shape_bounds(end)
    }

    /// Put the surface back to how it looked when the gesture started.
    fn restore_snapshot<S: RenderSurface + ?Sized>(&self, surface: &mut S) {
        if let Some(snapshot) = &self.snapshot {
            if let Err(e) = surface.restore(snapshot) {
                log::warn!("drawing: failed to restore pre-gesture snapshot: {e}");
            }
        }
    }

    fn freehand_bounds(&self) -> Rect {
        let pad = self.stroke.width / 2.0;
        self.path.bounding_box().inflate(pad, pad)
    }
}

/// State of the drawing engine.
#[derive(Debug, Clone, Default)]
pub enum EngineState {
    #[default]
    Idle,
    Active(Box<StrokeSession>),
}

/// Converts pointer gestures into strokes and shapes.
#[derive(Debug, Clone, Default)]
pub struct DrawingEngine {
    state: EngineState,
}

impl DrawingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, EngineState::Active(_))
    }

    pub fn session(&self) -> Option<&StrokeSession> {
        match &self.state {
            EngineState::Active(session) => Some(session),
            EngineState::Idle => None,
        }
    }

    /// Start a gesture at `client` (client coordinates).
    ///
    /// Ignored unless `panel` is the drawing panel and no other gesture is
    /// in flight. Returns whether a session was started.
    pub fn begin<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        client: Point,
        panel: ActivePanel,
        options: &DrawingOptions,
    ) -> bool {
        if !panel.accepts_drawing() {
            log::trace!("drawing: ignoring start, panel is {panel:?}");
            return false;
        }
        if self.is_active() {
            log::debug!("drawing: ignoring start, a gesture is already in flight");
            return false;
        }

        let origin = SurfaceMapping::for_surface(surface).to_surface(client);
        let mut session = StrokeSession::new(options, surface.id(), origin);
        if session.tool == ToolKind::Shape || session.is_translucent() {
            session.snapshot = Some(surface.snapshot());
        }
        log::debug!(
            "drawing: {} gesture started at ({:.1}, {:.1}) on {}",
            session.tool.name(),
            origin.x,
            origin.y,
            session.surface
        );
        self.state = EngineState::Active(Box::new(session));
        true
    }

    /// Continue the gesture to `client`.
    ///
    /// Returns whether the move was applied.
    pub fn extend<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        client: Point,
        panel: ActivePanel,
    ) -> bool {
        if !panel.accepts_drawing() {
            return false;
        }
        let EngineState::Active(session) = &mut self.state else {
            return false;
        };
        if session.surface != surface.id() {
            log::trace!("drawing: ignoring move on foreign surface {}", surface.id());
            return false;
        }

        let point = SurfaceMapping::for_surface(surface).to_surface(client);
        session.has_moved = true;

        if session.tool.is_freehand() {
            session.path.line_to(point);
            if session.snapshot.is_some() {
                // Overlapping segments must not blend twice.
                session.restore_snapshot(surface);
                surface.stroke(&session.path, &session.stroke, &session.paint);
            } else {
                let mut segment = BezPath::new();
                segment.move_to(session.last);
                segment.line_to(point);
                surface.stroke(&segment, &session.stroke, &session.paint);
            }
        } else {
            session.restore_snapshot(surface);
            session.draw_shape(surface, point);
        }
        session.last = point;
        true
    }

    /// Finish the gesture. The engine is always idle afterwards.
    ///
    /// `client` is the release position if the platform reported one. Shape
    /// gestures without one are finalised at the last move position, and so
    /// are gestures whose stop arrives on another surface: their last
    /// preview is kept as the final shape.
    pub fn end<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        client: Option<Point>,
    ) -> GestureOutcome {
        let EngineState::Active(mut session) = std::mem::take(&mut self.state) else {
            return GestureOutcome::Ignored;
        };

        if !session.has_moved {
            log::debug!("drawing: {} gesture discarded without movement", session.tool.name());
            return GestureOutcome::Discarded;
        }

        let own_surface = session.surface == surface.id();
        if !own_surface {
            log::debug!(
                "drawing: stop arrived on {}, finishing gesture on {}",
                surface.id(),
                session.surface
            );
        }

        let bounds = if session.tool.is_freehand() {
            session.path.close_path();
            session.freehand_bounds()
        } else if own_surface {
            let end = client
                .map(|p| SurfaceMapping::for_surface(surface).to_surface(p))
                .unwrap_or(session.last);
            session.restore_snapshot(surface);
            session.draw_shape(surface, end)
        } else {
            session.shape_bounds(session.last)
        };

        log::debug!("drawing: {} gesture completed", session.tool.name());
        GestureOutcome::Completed(CompletedGesture {
            tool: session.tool,
            surface: session.surface,
            bounds,
        })
    }

    /// Like [`end`](Self::end), invoking `on_complete` exactly once if the
    /// gesture produced pixels. The callback runs after the final mutation
    /// and sees the surface the stop arrived on.
    pub fn end_with<S, F>(&mut self, surface: &mut S, client: Option<Point>, on_complete: F) -> GestureOutcome
    where
        S: RenderSurface + ?Sized,
        F: FnOnce(&S),
    {
        let outcome = self.end(surface, client);
        if matches!(outcome, GestureOutcome::Completed(_)) {
            on_complete(surface);
        }
        outcome
    }

    /// Drop any in-flight gesture without touching the surface.
    pub fn cancel(&mut self) {
        if self.is_active() {
            log::debug!("drawing: gesture cancelled");
        }
        self.state = EngineState::Idle;
    }

    /// Dispatch a pointer event.
    ///
    /// `Cancel` is a forced stop without a coordinate: a gesture that moved
    /// is still committed, one that did not is discarded.
    pub fn handle<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        event: PointerEvent,
        panel: ActivePanel,
        options: &DrawingOptions,
    ) -> GestureOutcome {
        let applied = match event {
            PointerEvent::Down { position } => self.begin(surface, position, panel, options),
            PointerEvent::Move { position } => self.extend(surface, position, panel),
            PointerEvent::Up { position } => return self.end(surface, position),
            PointerEvent::Cancel => return self.end(surface, None),
        };
        if applied {
            GestureOutcome::InProgress
        } else {
            GestureOutcome::Ignored
        }
    }
}
