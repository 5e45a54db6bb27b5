//! Rendering checks that need a rasterizer backend.

use std::panic::{catch_unwind, AssertUnwindSafe};

use anyhow::Result;

use crate::check::{CheckImplementation, TargetKind};
use crate::error::ConfigError;
use crate::registry::CheckRegistry;
use crate::resolve::{panic_message, Args, INPUT_FONT, INPUT_RASTERIZER};
use crate::status::Outcome;

pub const FREETYPE_RASTERIZER: &str = "com.adobe.fonts/check/freetype_rasterizer";

pub const KEY_NOT_INSTALLED: &str = "freetype-not-installed";
pub const KEY_CRASH: &str = "freetype-crash";

pub(crate) fn register(registry: &mut CheckRegistry) -> Result<(), ConfigError> {
    registry.register_check(freetype_rasterizer())
}

pub fn freetype_rasterizer() -> CheckImplementation {
    CheckImplementation::new(FREETYPE_RASTERIZER, TargetKind::Font, render_font)
        .with_title("Ensure that the font can be rasterized by FreeType.")
        .with_inputs(&[INPUT_FONT, INPUT_RASTERIZER])
}

/// Render every glyph of the subject font.
///
/// A missing backend yields SKIP `freetype-not-installed`; profiles that
/// require rendering remap that outcome.
pub fn render_font(args: &Args) -> Result<Vec<Outcome>> {
    let font = args.font()?;
    let Some(rasterizer) = args.rasterizer() else {
        return Ok(vec![Outcome::skip(
            KEY_NOT_INSTALLED,
            "FreeType is not available. No rasterizer backend was configured for this run.",
        )]);
    };

    let rendered = catch_unwind(AssertUnwindSafe(|| rasterizer.render_all(font)));
    let outcome = match rendered {
        Ok(Ok(count)) => {
            log::debug!("{} rendered {count} glyph(s) of {}", rasterizer.name(), font.identity());
            Outcome::pass("Font can be rasterized by FreeType.")
        }
        Ok(Err(err)) => Outcome::fail(
            KEY_CRASH,
            format!("Font caused FreeType to crash with this error: {err:#}"),
        ),
        Err(payload) => Outcome::fail(
            KEY_CRASH,
            format!(
                "Font caused FreeType to crash with this error: {}",
                panic_message(payload)
            ),
        ),
    };
    Ok(vec![outcome])
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::anyhow;

    use super::*;
    use crate::font::FontFace;
    use crate::raster::Rasterizer;
    use crate::status::Severity;
    use crate::testing::{assert_pass, assert_results_contain, sample_face, CheckTester};

    struct Stub(Option<&'static str>);

    impl Rasterizer for Stub {
        fn name(&self) -> &str {
            "stub"
        }

        fn render_all(&self, font: &FontFace) -> Result<usize> {
            match self.0 {
                Some(err) => Err(anyhow!(err)),
                None => Ok(font.glyphs.len()),
            }
        }
    }

    #[test]
    fn missing_backend_is_skipped_by_default() {
        let check = CheckTester::builtin("universal", FREETYPE_RASTERIZER);
        let msg = assert_results_contain(
            &check.run_font(sample_face("Cabin-Regular.ttf")),
            Severity::Skip,
            KEY_NOT_INSTALLED,
        );
        assert!(msg.contains("FreeType is not available"));
    }

    #[test]
    fn backend_results_map_to_pass_and_fail() {
        let ok = CheckTester::builtin("universal", FREETYPE_RASTERIZER)
            .with_rasterizer(Arc::new(Stub(None)));
        assert_pass(&ok.run_font(sample_face("Cabin-Regular.ttf")));

        let broken = CheckTester::builtin("universal", FREETYPE_RASTERIZER)
            .with_rasterizer(Arc::new(Stub(Some("invalid outline"))));
        let msg = assert_results_contain(
            &broken.run_font(sample_face("Cabin-Regular.ttf")),
            Severity::Fail,
            KEY_CRASH,
        );
        assert!(msg.contains("invalid outline"));
    }
}
