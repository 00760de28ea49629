//! Glyph outlines from installed fonts.
//!
//! Faces are discovered through `fontdb` and parsed with `ttf-parser`. Each
//! glyph outline is scaled from font units to surface pixels and placed
//! along the baseline using the horizontal advances from the face.

use crate::surface::GlyphRasterizer;
use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use kurbo::{BezPath, Point};
use pagemark_core::text::{FontDescriptor, TextRun};
use std::fmt;
use std::sync::{Arc, OnceLock};
use ttf_parser::{Face, GlyphId, OutlineBuilder};

static SYSTEM_FONTS: OnceLock<Arc<FontGlyphs>> = OnceLock::new();

/// A [`GlyphRasterizer`] backed by a font database.
pub struct FontGlyphs {
    db: Database,
}

impl FontGlyphs {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// A rasterizer over a single in-memory font file.
    pub fn from_font_data(data: Vec<u8>) -> Self {
        let mut db = Database::new();
        db.load_font_data(data);
        Self::new(db)
    }

    /// Shared rasterizer over the fonts installed on this machine, loaded
    /// on first use.
    pub fn system() -> Arc<FontGlyphs> {
        SYSTEM_FONTS
            .get_or_init(|| {
                let mut db = Database::new();
                db.load_system_fonts();
                log::debug!("fonts: loaded {} system faces", db.len());
                Arc::new(Self::new(db))
            })
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Best face for `font`: the named family, then the generic sans-serif
    /// family, then whatever face is loaded first.
    fn find_face(&self, font: &FontDescriptor) -> Option<fontdb::ID> {
        let named = match font.family.to_ascii_lowercase().as_str() {
            "serif" => Family::Serif,
            "sans-serif" => Family::SansSerif,
            "monospace" => Family::Monospace,
            _ => Family::Name(&font.family),
        };
        let query = Query {
            families: &[named, Family::SansSerif],
            weight: if font.bold { Weight::BOLD } else { Weight::NORMAL },
            stretch: Stretch::Normal,
            style: if font.italic { Style::Italic } else { Style::Normal },
        };
        self.db.query(&query).or_else(|| {
            log::debug!("fonts: no match for '{}', using first loaded face", font.family);
            self.db.faces().next().map(|face| face.id)
        })
    }
}

impl fmt::Debug for FontGlyphs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontGlyphs").field("faces", &self.db.len()).finish()
    }
}

impl GlyphRasterizer for FontGlyphs {
    fn outline(&self, run: &TextRun) -> Option<BezPath> {
        let id = self.find_face(&run.font)?;
        self.db.with_face_data(id, |data, index| outline_run(data, index, run)).flatten()
    }
}

fn outline_run(data: &[u8], index: u32, run: &TextRun) -> Option<BezPath> {
    let face = match Face::parse(data, index) {
        Ok(face) => face,
        Err(e) => {
            log::warn!("fonts: failed to parse face: {e}");
            return None;
        }
    };
    let scale = run.font.size_px / f64::from(face.units_per_em());
    let mut path = BezPath::new();
    let mut pen_x = run.origin.x;
    for ch in run.text.chars() {
        let glyph = face.glyph_index(ch).unwrap_or(GlyphId(0));
        let mut sink = PathSink {
            path: &mut path,
            origin: Point::new(pen_x, run.origin.y),
            scale,
        };
        // Blank glyphs such as spaces have no outline but still advance.
        face.outline_glyph(glyph, &mut sink);
        pen_x += f64::from(face.glyph_hor_advance(glyph).unwrap_or(0)) * scale;
    }
    if path.elements().is_empty() { None } else { Some(path) }
}

/// Writes y-up font-unit outlines into a y-down pixel path.
struct PathSink<'a> {
    path: &'a mut BezPath,
    origin: Point,
    scale: f64,
}

impl PathSink<'_> {
    fn point(&self, x: f32, y: f32) -> Point {
        Point::new(
            self.origin.x + f64::from(x) * self.scale,
            self.origin.y - f64::from(y) * self.scale,
        )
    }
}

impl OutlineBuilder for PathSink<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.path.move_to(p);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.path.line_to(p);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (p1, p) = (self.point(x1, y1), self.point(x, y));
        self.path.quad_to(p1, p);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (p1, p2, p) = (self.point(x1, y1), self.point(x2, y2), self.point(x, y));
        self.path.curve_to(p1, p2, p);
    }

    fn close(&mut self) {
        self.path.close_path();
    }
}
