use std::{path::Path, sync::Arc};

use anyhow::Context;

use crate::foundation::{
    core::Canvas,
    error::{BehindTextError, BehindTextResult},
};

/// Rasterizes full-canvas SVG layers with a shared font database.
///
/// Building the database scans system fonts, so one rasterizer is created per process or
/// session and reused for every frame.
#[derive(Clone)]
pub struct TextRasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for TextRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRasterizer")
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl TextRasterizer {
    /// System fonts plus every `.ttf`/`.otf`/`.ttc` file directly inside `fonts_dir`.
    pub fn new(fonts_dir: Option<&Path>) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        if let Some(dir) = fonts_dir {
            load_fonts_from_dir(&mut db, dir);
        }
        tracing::debug!(faces = db.len(), "font database ready");
        Self::with_fontdb(db)
    }

    pub fn with_fontdb(db: usvg::fontdb::Database) -> Self {
        Self {
            fontdb: Arc::new(db),
        }
    }

    pub fn face_count(&self) -> usize {
        self.fontdb.len()
    }

    /// Render an SVG document sized to `canvas` into premultiplied RGBA8.
    pub fn rasterize(&self, svg: &str, canvas: Canvas) -> BehindTextResult<Vec<u8>> {
        let mut out = vec![0u8; canvas.rgba_len()?];
        self.rasterize_into(svg, canvas, &mut out)?;
        Ok(out)
    }

    /// Render into a caller-owned buffer, which is cleared first.
    pub fn rasterize_into(
        &self,
        svg: &str,
        canvas: Canvas,
        out: &mut [u8],
    ) -> BehindTextResult<()> {
        if out.len() != canvas.rgba_len()? {
            return Err(BehindTextError::render(
                "layer buffer does not match canvas",
            ));
        }
        let opts = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            font_resolver: make_font_resolver(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(svg, &opts).context("parse layer svg")?;

        out.fill(0);
        let mut pixmap =
            resvg::tiny_skia::PixmapMut::from_bytes(out, canvas.width, canvas.height)
                .ok_or_else(|| BehindTextError::render("failed to wrap layer pixmap"))?;

        let sx = canvas.width as f32 / tree.size().width();
        let sy = canvas.height as f32 / tree.size().height();
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::from_scale(sx, sy),
            &mut pixmap,
        );
        Ok(())
    }
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "fonts directory not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "skipping font file");
        }
    }
}

/// Resolve the requested families, then generic sans-serif, then any face at all, so a
/// missing display font still renders legibly.
fn make_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<usvg::fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                });
            }
            families.push(usvg::fontdb::Family::SansSerif);

            let style = match font.style() {
                usvg::FontStyle::Normal => usvg::fontdb::Style::Normal,
                usvg::FontStyle::Italic => usvg::fontdb::Style::Italic,
                usvg::FontStyle::Oblique => usvg::fontdb::Style::Oblique,
            };

            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style,
            };

            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/raster.rs"]
mod tests;
