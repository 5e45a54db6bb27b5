//! Checks derived from the OpenType specification.

use crate::checks::{family, metrics, tables};
use crate::profile::Profile;

pub const NAME: &str = "opentype";

pub fn profile() -> Profile {
    Profile::new(NAME)
        .section(
            "Family Checks",
            &[
                family::UNDERLINE_THICKNESS,
                family::PANOSE_PROPORTION,
                family::PANOSE_FAMILYTYPE,
                family::EQUAL_UNICODE_ENCODINGS,
                family::EQUAL_FONT_VERSIONS,
                family::BOLD_ITALIC_UNIQUE_FOR_NAMEID1,
                family::MAX_4_FONTS_PER_FAMILY_NAME,
            ],
        )
        .section(
            "OpenType Tables",
            &[
                tables::REQUIRED_TABLES,
                metrics::UNITSPEREM,
                metrics::FSSELECTION_MATCHES_MACSTYLE,
            ],
        )
}
