//! Google Fonts onboarding checks.

use crate::checks::metadata;
use crate::profile::Profile;

use super::universal;

pub const NAME: &str = "googlefonts";

pub fn profile() -> Profile {
    Profile::new(NAME)
        .include(universal::NAME)
        .section(
            "Metadata Checks",
            &[metadata::RESERVED_FONT_NAME, metadata::METADATA_FILENAMES],
        )
        .section("Repository Checks", &[metadata::HAS_LICENSE])
}
