//! Checks over the table directory.

use anyhow::Result;

use crate::check::{CheckImplementation, TargetKind};
use crate::checks::conditions::{IS_CFF, IS_TTF};
use crate::error::ConfigError;
use crate::font::{SFNT_VERSION_CFF, SFNT_VERSION_TRUETYPE};
use crate::registry::CheckRegistry;
use crate::status::Outcome;

pub const SFNT_VERSION: &str = "com.adobe.fonts/check/sfnt_version";
pub const REQUIRED_TABLES: &str = "com.google.fonts/check/required_tables";
pub const UNWANTED_TABLES: &str = "com.google.fonts/check/unwanted_tables";

const REQUIRED: [&str; 8] = ["cmap", "head", "hhea", "hmtx", "maxp", "name", "OS/2", "post"];

/// Tables left behind by font tools, with the reason they should go.
const UNWANTED: [(&str, &str); 10] = [
    ("FFTM", "Table contains redundant FontForge timestamp info"),
    ("TTFA", "Redundant TTFAutohint table"),
    ("TSI0", "Table contains data only used in VTT"),
    ("TSI1", "Table contains data only used in VTT"),
    ("TSI2", "Table contains data only used in VTT"),
    ("TSI3", "Table contains data only used in VTT"),
    ("TSI5", "Table contains data only used in VTT"),
    ("prop", "Table used on AAT, Apple's OS X specific technology"),
    ("Debg", "FontTools debugging table"),
    ("TSIV", "Table contains data only used in VOLT"),
];

pub(crate) fn register(registry: &mut CheckRegistry) -> Result<(), ConfigError> {
    registry.register_check(sfnt_version())?;
    registry.register_check(required_tables())?;
    registry.register_check(unwanted_tables())?;
    Ok(())
}

fn render_version(version: u32) -> String {
    version
        .to_be_bytes()
        .iter()
        .map(|b| {
            if b.is_ascii_graphic() {
                (*b as char).to_string()
            } else {
                format!("\\x{b:02x}")
            }
        })
        .collect()
}

pub fn sfnt_version() -> CheckImplementation {
    CheckImplementation::new(SFNT_VERSION, TargetKind::Font, |args| {
        let font = args.font()?;
        let is_cff = args.flag(IS_CFF)?;
        let is_ttf = args.flag(IS_TTF)?;
        let shown = render_version(font.sfnt_version);

        let outcome = if is_cff && font.sfnt_version != SFNT_VERSION_CFF {
            Outcome::fail(
                "wrong-sfnt-version-cff",
                format!("Font with CFF data has incorrect sfntVersion value: '{shown}'"),
            )
        } else if is_ttf && font.sfnt_version != SFNT_VERSION_TRUETYPE {
            Outcome::fail(
                "wrong-sfnt-version-ttf",
                format!("Font with TrueType outlines has incorrect sfntVersion value: '{shown}'"),
            )
        } else {
            Outcome::pass("Font has the correct sfntVersion value.")
        };
        Ok(vec![outcome])
    })
    .with_title("Font has the proper sfntVersion value?")
    .with_inputs(&["font", IS_CFF, IS_TTF])
}

pub fn required_tables() -> CheckImplementation {
    CheckImplementation::new(REQUIRED_TABLES, TargetKind::Font, |args| {
        let font = args.font()?;
        let mut missing: Vec<&str> = REQUIRED
            .iter()
            .copied()
            .filter(|tag| !font.has_table(tag))
            .collect();
        if !font.has_table("glyf") && !font.is_cff() {
            missing.push("glyf|CFF|CFF2");
        }

        let outcome = if missing.is_empty() {
            Outcome::pass("Font contains all required tables.")
        } else {
            Outcome::fail(
                "required-tables",
                format!("Font is missing required tables: [{}]", missing.join(", ")),
            )
        };
        Ok(vec![outcome])
    })
    .with_title("Font contains all required tables?")
    .with_inputs(&["font"])
}

pub fn unwanted_tables() -> CheckImplementation {
    CheckImplementation::new(UNWANTED_TABLES, TargetKind::Font, |args| {
        let font = args.font()?;
        let found: Vec<String> = UNWANTED
            .iter()
            .filter(|(tag, _)| font.has_table(tag))
            .map(|(tag, reason)| format!("* {tag} - {reason}"))
            .collect();

        let outcome = if found.is_empty() {
            Outcome::pass("There are no unwanted tables.")
        } else {
            Outcome::fail(
                "unwanted-tables",
                format!(
                    "The following unwanted font tables were found:\n{}\n\nThey can be \
                     removed with the fix-unwanted-tables script provided by gftools.",
                    found.join("\n")
                ),
            )
        };
        Ok(vec![outcome])
    })
    .with_title("Are there unwanted tables?")
    .with_inputs(&["font"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Severity;
    use crate::tags::tag4;
    use crate::testing::{assert_pass, assert_results_contain, sample_face, CheckTester};

    #[test]
    fn renders_sfnt_versions_like_bytes() {
        assert_eq!(render_version(SFNT_VERSION_CFF), "OTTO");
        assert_eq!(render_version(SFNT_VERSION_TRUETYPE), "\\x00\\x01\\x00\\x00");
    }

    #[test]
    fn sfnt_version_must_match_outlines() {
        let check = CheckTester::builtin("universal", SFNT_VERSION);
        let mut face = sample_face("Cabin-Regular.ttf");
        assert_pass(&check.run_font(face.clone()));
        face.sfnt_version = SFNT_VERSION_CFF;
        assert_results_contain(&check.run_font(face), Severity::Fail, "wrong-sfnt-version-ttf");
    }

    #[test]
    fn table_presence() {
        let required = CheckTester::builtin("opentype", REQUIRED_TABLES);
        let unwanted = CheckTester::builtin("universal", UNWANTED_TABLES);
        let mut face = sample_face("Cabin-Regular.ttf");
        assert_pass(&required.run_font(face.clone()));
        assert_pass(&unwanted.run_font(face.clone()));

        face.table_tags.retain(|t| *t != tag4("post").unwrap());
        face.table_tags.push(tag4("FFTM").unwrap());
        let msg = assert_results_contain(&required.run_font(face.clone()), Severity::Fail, "required-tables");
        assert!(msg.contains("post"));
        let msg = assert_results_contain(&unwanted.run_font(face), Severity::Fail, "unwanted-tables");
        assert!(msg.contains("FFTM"));
    }
}
