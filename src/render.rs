use std::{path::PathBuf, sync::Arc};

use usvg::fontdb;

use crate::{
    foundation::{
        core::Canvas,
        error::{ChartError, ChartResult},
    },
    theme::{Era, Font, Generic},
};

/// Largest pixmap edge we are willing to allocate.
const MAX_DIM: u32 = 16_384;

// Installed families tried, in order, for each generic CSS family. fontdb's own defaults are the
// first entry of each list, which most non-Windows hosts lack.
const SERIF_FACES: &[&str] = &[
    "Times New Roman",
    "DejaVu Serif",
    "Liberation Serif",
    "Noto Serif",
    "FreeSerif",
    "Times",
];
const SANS_SERIF_FACES: &[&str] = &[
    "Arial",
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "FreeSans",
    "Helvetica",
];
const MONOSPACE_FACES: &[&str] = &[
    "Courier New",
    "DejaVu Sans Mono",
    "Liberation Mono",
    "Noto Sans Mono",
    "FreeMono",
    "Menlo",
];
const CURSIVE_FACES: &[&str] = &["Comic Sans MS", "Brush Script MT", "URW Chancery L", "Z003"];

#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// RGBA at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Font database shared by every frame.
#[derive(Clone)]
pub struct FontSet {
    db: Arc<fontdb::Database>,
}

impl FontSet {
    /// No fonts at all; text is skipped. Keeps tests independent of the host.
    pub fn empty() -> Self {
        Self {
            db: Arc::new(fontdb::Database::new()),
        }
    }

    /// System fonts plus every font found under `dirs`.
    pub fn load(dirs: &[PathBuf]) -> ChartResult<Self> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        for dir in dirs {
            if !dir.is_dir() {
                return Err(ChartError::validation(format!(
                    "font directory '{}' does not exist",
                    dir.display()
                )));
            }
            let before = db.len();
            db.load_fonts_dir(dir);
            tracing::debug!(dir = %dir.display(), faces = db.len() - before, "loaded font dir");
        }
        bind_generic_families(&mut db);
        tracing::info!(faces = db.len(), "font database ready");
        Ok(Self { db: Arc::new(db) })
    }

    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    pub fn has_family(&self, family: &str) -> bool {
        has_family(&self.db, family)
    }

    /// Face that a generic family resolves to, if any.
    pub fn generic_face(&self, generic: Generic) -> Option<String> {
        let family = match generic {
            Generic::Serif => fontdb::Family::Serif,
            Generic::SansSerif => fontdb::Family::SansSerif,
            Generic::Cursive => fontdb::Family::Cursive,
            Generic::Monospace => fontdb::Family::Monospace,
        };
        let query = fontdb::Query {
            families: &[family],
            ..fontdb::Query::default()
        };
        let id = self.db.query(&query)?;
        let face = self.db.face(id)?;
        face.families.first().map(|(name, _)| name.clone())
    }

    /// Theme fonts that are not installed, with the era that wants them.
    pub fn missing_theme_fonts(&self) -> Vec<(Era, Font)> {
        let mut missing = Vec::new();
        for era in Era::ALL {
            let t = era.theme();
            for font in [t.title_font, t.axis_label_font, t.tick_label_font] {
                if !self.has_family(font.family)
                    && !missing.iter().any(|(_, f): &(Era, Font)| f.family == font.family)
                {
                    missing.push((era, font));
                }
            }
        }
        missing
    }
}

fn has_family(db: &fontdb::Database, family: &str) -> bool {
    let query = fontdb::Query {
        families: &[fontdb::Family::Name(family)],
        ..fontdb::Query::default()
    };
    db.query(&query).is_some()
}

fn first_installed(db: &fontdb::Database, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find(|name| has_family(db, name))
        .map(|name| (*name).to_owned())
}

/// Points the generic families at installed faces so themed text whose named face is missing still
/// renders. Generics with no candidate installed use any face at all.
fn bind_generic_families(db: &mut fontdb::Database) {
    let Some(any) = db
        .faces()
        .find_map(|f| f.families.first())
        .map(|(name, _)| name.clone())
    else {
        tracing::warn!("no fonts found; frames will have no text");
        return;
    };

    let serif = first_installed(db, SERIF_FACES).unwrap_or_else(|| any.clone());
    let sans_serif = first_installed(db, SANS_SERIF_FACES).unwrap_or_else(|| any.clone());
    let monospace = first_installed(db, MONOSPACE_FACES).unwrap_or_else(|| any.clone());
    let cursive = first_installed(db, CURSIVE_FACES).unwrap_or_else(|| sans_serif.clone());
    tracing::debug!(%serif, %sans_serif, %monospace, %cursive, "generic font families");

    db.set_serif_family(serif);
    db.set_sans_serif_family(sans_serif);
    db.set_monospace_family(monospace);
    db.set_cursive_family(cursive);
}

/// usvg font selection: the requested families, then the generic ones, then any face.
fn font_resolver() -> usvg::FontResolver<'static> {
    usvg::FontResolver {
        select_font: Box::new(|font, db| {
            let mut families: Vec<fontdb::Family<'_>> = font
                .families()
                .iter()
                .map(|family| match family {
                    usvg::FontFamily::Serif => fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => fontdb::Family::Monospace,
                    usvg::FontFamily::Named(name) => fontdb::Family::Name(name),
                })
                .collect();
            families.extend([
                fontdb::Family::SansSerif,
                fontdb::Family::Serif,
                fontdb::Family::Monospace,
            ]);

            let stretch = match font.stretch() {
                usvg::FontStretch::UltraCondensed => fontdb::Stretch::UltraCondensed,
                usvg::FontStretch::ExtraCondensed => fontdb::Stretch::ExtraCondensed,
                usvg::FontStretch::Condensed => fontdb::Stretch::Condensed,
                usvg::FontStretch::SemiCondensed => fontdb::Stretch::SemiCondensed,
                usvg::FontStretch::Normal => fontdb::Stretch::Normal,
                usvg::FontStretch::SemiExpanded => fontdb::Stretch::SemiExpanded,
                usvg::FontStretch::Expanded => fontdb::Stretch::Expanded,
                usvg::FontStretch::ExtraExpanded => fontdb::Stretch::ExtraExpanded,
                usvg::FontStretch::UltraExpanded => fontdb::Stretch::UltraExpanded,
            };
            let style = match font.style() {
                usvg::FontStyle::Normal => fontdb::Style::Normal,
                usvg::FontStyle::Italic => fontdb::Style::Italic,
                usvg::FontStyle::Oblique => fontdb::Style::Oblique,
            };

            let query = fontdb::Query {
                families: &families,
                weight: fontdb::Weight(font.weight()),
                stretch,
                style,
            };
            db.query(&query).or_else(|| db.faces().next().map(|f| f.id))
        }),
        select_fallback: usvg::FontResolver::default_fallback_selector(),
    }
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet")
            .field("faces", &self.db.len())
            .finish()
    }
}

/// Turns frame SVG documents into RGBA pixels.
pub struct Rasterizer {
    options: usvg::Options<'static>,
}

impl Rasterizer {
    pub fn new(fonts: &FontSet) -> Self {
        let options = usvg::Options {
            fontdb: Arc::clone(&fonts.db),
            font_resolver: font_resolver(),
            ..usvg::Options::default()
        };
        Self { options }
    }

    /// Parse `svg` and render it scaled to fill `canvas`.
    pub fn rasterize(&self, svg: &str, canvas: Canvas) -> ChartResult<FrameRGBA> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(ChartError::render("canvas width/height must be non-zero"));
        }
        if canvas.width > MAX_DIM || canvas.height > MAX_DIM {
            return Err(ChartError::render(format!(
                "canvas too large: {}x{} (max {MAX_DIM}x{MAX_DIM})",
                canvas.width, canvas.height
            )));
        }

        let tree = usvg::Tree::from_str(svg, &self.options)
            .map_err(|e| ChartError::render(format!("parse frame svg: {e}")))?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(canvas.width, canvas.height)
            .ok_or_else(|| ChartError::render("failed to allocate frame pixmap"))?;

        let sx = (canvas.width as f32) / tree.size().width();
        let sy = (canvas.height as f32) / tree.size().height();
        let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

        resvg::render(&tree, xform, &mut pixmap.as_mut());

        Ok(FrameRGBA {
            width: canvas.width,
            height: canvas.height,
            data: pixmap.take(),
            premultiplied: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
        <rect width="10" height="10" fill="#d0bfab"/>
        <rect x="5" width="5" height="10" fill="#000000"/>
    </svg>"##;

    #[test]
    fn rasterize_scales_to_canvas() {
        let r = Rasterizer::new(&FontSet::empty());
        let frame = r
            .rasterize(
                SQUARE,
                Canvas {
                    width: 40,
                    height: 20,
                },
            )
            .unwrap();
        assert_eq!((frame.width, frame.height), (40, 20));
        assert_eq!(frame.data.len(), 40 * 20 * 4);
        assert_eq!(frame.pixel(0, 0), Some([0xd0, 0xbf, 0xab, 0xff]));
        assert_eq!(frame.pixel(39, 19), Some([0, 0, 0, 0xff]));
        assert_eq!(frame.pixel(40, 0), None);
    }

    #[test]
    fn rasterize_rejects_bad_input() {
        let r = Rasterizer::new(&FontSet::empty());
        let c = Canvas {
            width: 4,
            height: 4,
        };
        assert!(matches!(r.rasterize("<svg", c), Err(ChartError::Render(_))));
        assert!(
            r.rasterize(
                SQUARE,
                Canvas {
                    width: 0,
                    height: 4
                }
            )
            .is_err()
        );
    }

    #[test]
    fn empty_font_set_reports_every_theme_font_missing() {
        let fonts = FontSet::empty();
        assert_eq!(fonts.face_count(), 0);
        assert!(!fonts.has_family("Consolas"));
        let missing = fonts.missing_theme_fonts();
        assert!(missing.iter().any(|(_, f)| f.family == "Consolas"));
        // Each family is reported once even when several eras use it.
        assert_eq!(
            missing
                .iter()
                .filter(|(_, f)| f.family == "SimSun")
                .count(),
            1
        );
    }

    fn ink(frame: &FrameRGBA) -> usize {
        frame
            .data
            .chunks_exact(4)
            .filter(|px| px[0] < 128 && px[1] < 128 && px[2] < 128)
            .count()
    }

    fn text_svg(font: Font) -> String {
        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="240" height="60">
            <rect width="240" height="60" fill="#ffffff"/>
            <text x="8" y="42" font-family="{}" font-size="30" fill="#000000">Year 1863</text>
        </svg>"##,
            font.css_family()
        )
    }

    #[test]
    fn generic_families_resolve_to_installed_faces() {
        let fonts = FontSet::load(&[]).unwrap();
        if fonts.face_count() == 0 {
            eprintln!("no system fonts, nothing to resolve");
            return;
        }
        for generic in [
            Generic::Serif,
            Generic::SansSerif,
            Generic::Cursive,
            Generic::Monospace,
        ] {
            let face = fonts.generic_face(generic);
            assert!(
                face.as_deref().is_some_and(|f| fonts.has_family(f)),
                "{generic:?} resolved to {face:?}"
            );
        }
    }

    #[test]
    fn every_theme_font_draws_text() {
        let fonts = FontSet::load(&[]).unwrap();
        if fonts.face_count() == 0 {
            eprintln!("no system fonts, text cannot be drawn");
            return;
        }
        let r = Rasterizer::new(&fonts);
        let canvas = Canvas {
            width: 240,
            height: 60,
        };
        for era in Era::ALL {
            let t = era.theme();
            for font in [t.title_font, t.axis_label_font, t.tick_label_font] {
                let frame = r.rasterize(&text_svg(font), canvas).unwrap();
                assert!(ink(&frame) > 0, "no text drawn for {}", font.css_family());
            }
        }
    }

    #[test]
    fn unknown_family_without_generic_still_draws() {
        let fonts = FontSet::load(&[]).unwrap();
        if fonts.face_count() == 0 {
            return;
        }
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="240" height="60">
            <rect width="240" height="60" fill="#ffffff"/>
            <text x="8" y="42" font-family="'No Such Face'" font-size="30">Year 1863</text>
        </svg>"##;
        let frame = Rasterizer::new(&fonts)
            .rasterize(
                svg,
                Canvas {
                    width: 240,
                    height: 60,
                },
            )
            .unwrap();
        assert!(ink(&frame) > 0);
    }
}
