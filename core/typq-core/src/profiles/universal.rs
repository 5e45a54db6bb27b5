//! Checks that apply to any font, whatever its vendor.

use crate::checks::{family, glyphs, metrics, names, render, tables};
use crate::profile::Profile;

use super::opentype;

pub const NAME: &str = "universal";

pub fn profile() -> Profile {
    Profile::new(NAME).include(opentype::NAME).section(
        "Universal Profile Checks",
        &[
            family::SINGLE_DIRECTORY,
            family::VERTICAL_METRICS,
            metrics::WIN_ASCENT_AND_DESCENT,
            render::FREETYPE_RASTERIZER,
            metrics::LINEGAPS,
            glyphs::MANDATORY_GLYPHS,
            names::TRAILING_SPACES,
            metrics::OS2_METRICS_MATCH_HHEA,
            tables::REQUIRED_TABLES,
            tables::SFNT_VERSION,
            glyphs::SOFT_HYPHEN,
            glyphs::UNIQUE_GLYPHNAMES,
            tables::UNWANTED_TABLES,
            glyphs::VALID_GLYPHNAMES,
            glyphs::WHITESPACE_GLYPHNAMES,
            glyphs::WHITESPACE_GLYPHS,
            glyphs::WHITESPACE_WIDTHS,
        ],
    )
}
