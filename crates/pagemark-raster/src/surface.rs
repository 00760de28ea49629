//! CPU-backed render surface.

use crate::fonts::FontGlyphs;
use crate::raster::{self, Span};
use image::{Rgba, RgbaImage};
use kurbo::{BezPath, Rect, Stroke, StrokeOpts};
use pagemark_core::surface::{Paint, RenderSurface, Snapshot, SurfaceError, SurfaceId, SurfaceResult};
use pagemark_core::text::TextRun;
use peniko::{Color, Compose};
use std::fmt;
use std::sync::Arc;

/// Stroke expansion tolerance in pixels.
const STROKE_TOLERANCE: f64 = 0.1;

/// Turns text runs into fillable glyph outlines.
pub trait GlyphRasterizer: Send + Sync {
    /// Outline of `run` in surface pixels, or `None` if the font is unavailable.
    fn outline(&self, run: &TextRun) -> Option<BezPath>;
}

/// Straight-alpha RGBA8 surface.
///
/// Text is outlined with the system fonts unless another
/// [`GlyphRasterizer`] is attached.
#[derive(Clone)]
pub struct PixelSurface {
    id: SurfaceId,
    image: RgbaImage,
    display: Rect,
    glyphs: Option<Arc<dyn GlyphRasterizer>>,
}

impl PixelSurface {
    /// Create a transparent surface, displayed at its native size.
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_image(RgbaImage::new(width, height))
    }

    pub fn from_image(image: RgbaImage) -> Self {
        let display = Rect::new(0.0, 0.0, f64::from(image.width()), f64::from(image.height()));
        Self {
            id: SurfaceId::new(),
            image,
            display,
            glyphs: None,
        }
    }

    pub fn with_display_rect(mut self, display: Rect) -> Self {
        self.display = display;
        self
    }

    pub fn set_display_rect(&mut self, display: Rect) {
        self.display = display;
    }

    pub fn with_glyph_rasterizer(mut self, glyphs: Arc<dyn GlyphRasterizer>) -> Self {
        self.glyphs = Some(glyphs);
        self
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// RGBA value at `(x, y)`, `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Overwrite every pixel with `color`.
    pub fn fill_background(&mut self, color: Color) {
        let rgba = color.to_rgba8();
        let px = Rgba([rgba.r, rgba.g, rgba.b, rgba.a]);
        for p in self.image.pixels_mut() {
            *p = px;
        }
    }

    fn paint_spans(&mut self, spans: &[Span], color: Color, alpha: f32, compose: Compose) {
        let rgba = color.to_rgba8();
        let src = [rgba.r, rgba.g, rgba.b];
        let src_alpha = f32::from(rgba.a) / 255.0 * alpha;
        for span in spans {
            for x in span.x0..span.x1 {
                let px = self.image.get_pixel_mut(x, span.y);
                raster::composite(&mut px.0, src, src_alpha, compose);
            }
        }
    }

    fn fill_path(&mut self, path: &BezPath, color: Color, alpha: f32, compose: Compose) {
        let spans = raster::spans(path, self.width(), self.height());
        self.paint_spans(&spans, color, alpha, compose);
    }
}

impl fmt::Debug for PixelSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelSurface")
            .field("id", &self.id)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("display", &self.display)
            .field("glyphs", &self.glyphs.is_some())
            .finish()
    }
}

impl RenderSurface for PixelSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn pixel_size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn display_rect(&self) -> Rect {
        self.display
    }

    fn stroke(&mut self, path: &BezPath, style: &Stroke, paint: &Paint) {
        let outline = kurbo::stroke(path.iter(), style, &StrokeOpts::default(), STROKE_TOLERANCE);
        self.fill_path(&outline, paint.color, paint.alpha, paint.compose);
    }

    fn fill(&mut self, path: &BezPath, paint: &Paint) {
        self.fill_path(path, paint.color, paint.alpha, paint.compose);
    }

    fn fill_text(&mut self, run: &TextRun) -> bool {
        let glyphs: Arc<dyn GlyphRasterizer> = match &self.glyphs {
            Some(glyphs) => glyphs.clone(),
            None => FontGlyphs::system(),
        };
        match glyphs.outline(run) {
            Some(outline) => {
                self.fill_path(&outline, run.color.into(), 1.0, Compose::SrcOver);
                true
            }
            None => {
                log::warn!("raster: no glyphs for '{}', text {:?} not drawn", run.font, run.text);
                false
            }
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.width(), self.height(), self.image.as_raw().as_slice())
    }

    fn restore(&mut self, snapshot: &Snapshot) -> SurfaceResult<()> {
        snapshot.check_size(self.width(), self.height())?;
        if snapshot.data().len() != self.image.len() {
            return Err(SurfaceError::Corrupt(format!(
                "expected {} bytes, got {}",
                self.image.len(),
                snapshot.data().len()
            )));
        }
        self.image.copy_from_slice(snapshot.data());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Point, Shape};
    use pagemark_core::drawing::DrawingEngine;
    use pagemark_core::input::ActivePanel;
    use pagemark_core::session::{EditorSession, SessionConfig};
    use pagemark_core::style::SerializableColor;
    use pagemark_core::text::{TextStyle, draw_text};
    use pagemark_core::tools::{DrawingOptions, ShapeKind, ToolKind, shape_path};

    const YELLOW: SerializableColor = SerializableColor::new(255, 255, 0, 255);

    fn options(tool: ToolKind) -> DrawingOptions {
        DrawingOptions {
            tool,
            color: YELLOW,
            size: 4.0,
            ..Default::default()
        }
    }

    fn drag(engine: &mut DrawingEngine, surface: &mut PixelSurface, options: &DrawingOptions, points: &[Point]) {
        assert!(engine.begin(surface, points[0], ActivePanel::Draw, options));
        for &p in &points[1..] {
            engine.extend(surface, p, ActivePanel::Draw);
        }
        engine.end(surface, points.last().copied());
    }

    /// Draws a box covering the run's first em for every run.
    struct BoxGlyphs;

    impl GlyphRasterizer for BoxGlyphs {
        fn outline(&self, run: &TextRun) -> Option<BezPath> {
            let size = run.font.size_px;
            Some(Rect::new(run.origin.x, run.origin.y - size, run.origin.x + size, run.origin.y).to_path(0.1))
        }
    }

    /// Stands in for a font that cannot be found.
    struct NoGlyphs;

    impl GlyphRasterizer for NoGlyphs {
        fn outline(&self, _run: &TextRun) -> Option<BezPath> {
            None
        }
    }

    #[test]
    fn test_new_surface_is_transparent() {
        let surface = PixelSurface::new(4, 3);
        assert_eq!(surface.pixel_size(), (4, 3));
        assert_eq!(surface.display_rect(), Rect::new(0.0, 0.0, 4.0, 3.0));
        assert_eq!(surface.pixel(3, 2), Some([0, 0, 0, 0]));
        assert_eq!(surface.pixel(4, 0), None);
    }

    #[test]
    fn test_pen_stroke_opaque() {
        let mut surface = PixelSurface::new(40, 40);
        let mut engine = DrawingEngine::new();
        drag(&mut engine, &mut surface, &options(ToolKind::Pen), &[Point::new(5.0, 20.0), Point::new(35.0, 20.0)]);
        assert_eq!(surface.pixel(20, 20), Some([255, 255, 0, 255]));
        assert_eq!(surface.pixel(20, 10), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_highlighter_is_translucent() {
        let mut surface = PixelSurface::new(40, 40);
        let mut engine = DrawingEngine::new();
        drag(
            &mut engine,
            &mut surface,
            &options(ToolKind::Highlighter),
            &[Point::new(5.0, 20.0), Point::new(35.0, 20.0)],
        );
        assert_eq!(surface.pixel(20, 20), Some([255, 255, 0, 102]));
    }

    #[test]
    fn test_highlighter_joint_blends_once() {
        let mut surface = PixelSurface::new(40, 40);
        let mut engine = DrawingEngine::new();
        drag(
            &mut engine,
            &mut surface,
            &options(ToolKind::Highlighter),
            &[Point::new(5.0, 20.0), Point::new(20.0, 20.0), Point::new(35.0, 20.0)],
        );
        assert_eq!(surface.pixel(20, 20), Some([255, 255, 0, 102]));
        assert_eq!(surface.pixel(12, 20), Some([255, 255, 0, 102]));
        assert_eq!(surface.pixel(28, 20), Some([255, 255, 0, 102]));
    }

    #[test]
    fn test_eraser_clears_alpha() {
        let mut surface = PixelSurface::new(40, 40);
        surface.fill_background(Color::from_rgba8(0, 0, 255, 255));
        let mut engine = DrawingEngine::new();
        drag(&mut engine, &mut surface, &options(ToolKind::Eraser), &[Point::new(5.0, 20.0), Point::new(35.0, 20.0)]);
        assert_eq!(surface.pixel(20, 20).map(|p| p[3]), Some(0));
        assert_eq!(surface.pixel(20, 5), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_shape_preview_matches_direct_draw() {
        let shape = DrawingOptions {
            tool: ToolKind::Shape,
            shape: ShapeKind::Rectangle,
            ..options(ToolKind::Shape)
        };
        let mut previewed = PixelSurface::new(64, 64);
        let mut engine = DrawingEngine::new();
        drag(
            &mut engine,
            &mut previewed,
            &shape,
            &[Point::new(10.0, 10.0), Point::new(50.0, 50.0), Point::new(30.0, 40.0), Point::new(20.0, 20.0)],
        );

        let mut direct = PixelSurface::new(64, 64);
        let path = shape_path(ShapeKind::Rectangle, Point::new(10.0, 10.0), Point::new(20.0, 20.0));
        direct.stroke(&path, &shape.stroke_style(), &Paint::normal(YELLOW.into(), 1.0));

        assert!(previewed.image().as_raw() == direct.image().as_raw());
        assert_eq!(previewed.pixel(50, 30), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_client_coordinates_scaled() {
        let mut surface = PixelSurface::new(200, 200).with_display_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut engine = DrawingEngine::new();
        drag(&mut engine, &mut surface, &options(ToolKind::Pen), &[Point::new(10.0, 10.0), Point::new(40.0, 10.0)]);
        assert_eq!(surface.pixel(50, 20), Some([255, 255, 0, 255]));
        assert_eq!(surface.pixel(50, 10), Some([0, 0, 0, 0]));
        assert_eq!(surface.pixel(90, 20), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_snapshot_restore() {
        let mut surface = PixelSurface::new(8, 8);
        let before = surface.snapshot();
        surface.fill(&Rect::new(0.0, 0.0, 8.0, 8.0).to_path(0.1), &Paint::normal(Color::from_rgba8(1, 2, 3, 255), 1.0));
        assert_eq!(surface.pixel(4, 4), Some([1, 2, 3, 255]));

        surface.restore(&before).unwrap();
        assert_eq!(surface.pixel(4, 4), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_restore_rejects_foreign_snapshot() {
        let mut surface = PixelSurface::new(8, 8);
        let other = PixelSurface::new(4, 4).snapshot();
        assert!(matches!(surface.restore(&other), Err(SurfaceError::SizeMismatch { .. })));

        let truncated = Snapshot::new(8, 8, vec![0u8; 10]);
        assert!(matches!(surface.restore(&truncated), Err(SurfaceError::Corrupt(_))));
    }

    #[test]
    fn test_text_not_drawn_without_glyphs() {
        let mut surface = PixelSurface::new(50, 50).with_glyph_rasterizer(Arc::new(NoGlyphs));
        assert!(!draw_text(&mut surface, "Hi", Point::new(5.0, 5.0), 1.0, &TextStyle::default()));
        assert!(surface.image().pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_undrawn_text_is_not_committed() {
        let layer = PixelSurface::new(50, 50).with_glyph_rasterizer(Arc::new(NoGlyphs));
        let mut session = EditorSession::new(vec![layer], &SessionConfig::default());
        assert!(!session.place_text(0, "Hi", Point::new(5.0, 5.0), 1.0).unwrap());
        assert_eq!(session.history().len(), 1);
        assert!(!session.can_undo());
    }

    #[test]
    fn test_drawn_text_is_committed() {
        let layer = PixelSurface::new(50, 50).with_glyph_rasterizer(Arc::new(BoxGlyphs));
        let mut session = EditorSession::new(vec![layer], &SessionConfig::default());
        assert!(session.place_text(0, "Hi", Point::new(5.0, 5.0), 1.0).unwrap());
        assert_eq!(session.history().len(), 2);
        assert!(session.layer(0).unwrap().image().pixels().any(|p| p.0[3] > 0));
    }

    #[test]
    fn test_system_fonts_used_by_default() {
        if FontGlyphs::system().is_empty() {
            return;
        }
        let mut surface = PixelSurface::new(120, 60);
        let style = TextStyle {
            size: 24.0,
            ..Default::default()
        };
        assert!(draw_text(&mut surface, "Approved", Point::new(5.0, 5.0), 1.0, &style));
        assert!(surface.image().pixels().any(|p| p.0[3] == 255));
    }

    #[test]
    fn test_text_drawn_with_rasterizer() {
        let mut surface = PixelSurface::new(50, 50).with_glyph_rasterizer(Arc::new(BoxGlyphs));
        let style = TextStyle {
            size: 10.0,
            color: SerializableColor::new(255, 0, 0, 255),
            ..Default::default()
        };
        draw_text(&mut surface, "Hi", Point::new(5.0, 5.0), 1.0, &style);
        // Baseline at y = 15, box spans 5..15 both ways.
        assert_eq!(surface.pixel(10, 10), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(10, 20), Some([0, 0, 0, 0]));
    }
}
