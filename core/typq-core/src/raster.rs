//! Glyph rasterization backends (made by FontLab https://www.fontlab.com/)

use std::fmt;

use anyhow::{anyhow, Result};
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::{FontRef, GlyphId, MetadataProvider};

use crate::font::FontFace;

/// Something that can render every glyph of a face.
pub trait Rasterizer: Send + Sync {
    fn name(&self) -> &str;

    /// Render all glyphs, returning how many were drawn. An error is a crash.
    fn render_all(&self, font: &FontFace) -> Result<usize>;
}

impl fmt::Debug for dyn Rasterizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rasterizer({})", self.name())
    }
}

/// Draws every outline through skrifa's scaler at a fixed size.
#[derive(Debug, Clone, Copy)]
pub struct OutlineRasterizer {
    pub ppem: f32,
}

impl Default for OutlineRasterizer {
    fn default() -> Self {
        Self { ppem: 24.0 }
    }
}

impl Rasterizer for OutlineRasterizer {
    fn name(&self) -> &str {
        "skrifa-outline"
    }

    fn render_all(&self, font: &FontFace) -> Result<usize> {
        let data = font
            .data
            .as_ref()
            .ok_or_else(|| anyhow!("font bytes for {} are not loaded", font.identity()))?;
        let bytes = data.as_slice();
        let sfont = match font.source.ttc_index {
            Some(idx) => FontRef::from_index(bytes, idx)?,
            None => FontRef::new(bytes)?,
        };

        let outlines = sfont.outline_glyphs();
        let mut pen = SinkPen;
        let mut drawn = 0;
        for gid in 0..font.glyphs.len() as u32 {
            if let Some(glyph) = outlines.get(GlyphId::new(gid)) {
                let settings = DrawSettings::unhinted(Size::new(self.ppem), LocationRef::default());
                glyph
                    .draw(settings, &mut pen)
                    .map_err(|err| anyhow!("glyph {gid}: {err}"))?;
                drawn += 1;
            }
        }
        Ok(drawn)
    }
}

struct SinkPen;

impl OutlinePen for SinkPen {
    fn move_to(&mut self, _x: f32, _y: f32) {}
    fn line_to(&mut self, _x: f32, _y: f32) {}
    fn quad_to(&mut self, _cx0: f32, _cy0: f32, _x: f32, _y: f32) {}
    fn curve_to(&mut self, _cx0: f32, _cy0: f32, _cx1: f32, _cy1: f32, _x: f32, _y: f32) {}
    fn close(&mut self) {}
}
