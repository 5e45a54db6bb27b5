//! Checks for the Adobe Fonts (formerly Typekit) onboarding process.
//!
//! Builds on `universal`, drops the usWin metrics check and relaxes or
//! tightens three inherited checks through `:adobefonts` variants.

use crate::check::CheckImplementation;
use crate::checks::{family, glyphs, metrics, names, render};
use crate::profile::Profile;
use crate::status::Severity;

use super::universal;

pub const NAME: &str = "adobefonts";
pub const QUALIFIER: &str = "adobefonts";

pub fn profile() -> Profile {
    Profile::new(NAME)
        .with_qualifier(QUALIFIER)
        .include(universal::NAME)
        .exclude(metrics::WIN_ASCENT_AND_DESCENT)
        .section(
            "Adobe Fonts Checks",
            &[
                family::CONSISTENT_UPM,
                glyphs::FIND_EMPTY_LETTERS,
                names::NAMEID_1_WIN_ENGLISH,
            ],
        )
        .override_status(
            glyphs::WHITESPACE_GLYPHS,
            "missing-whitespace-glyph-0x00A0",
            Severity::Warn,
            "For Adobe, this is not as severe as assessed in the original check for 0x00A0.",
        )
        .override_status(
            glyphs::VALID_GLYPHNAMES,
            "found-invalid-names",
            Severity::Warn,
            "Adobe fonts with nonconforming glyph names still work in the onboarding toolchain.",
        )
        .replace(render::FREETYPE_RASTERIZER, freetype_required())
}

/// Rendering is mandatory for Adobe Fonts, so a missing backend is an ERROR.
fn freetype_required() -> CheckImplementation {
    CheckImplementation::overriding(&render::freetype_rasterizer(), QUALIFIER, |args| {
        let outcomes = render::render_font(args)?;
        Ok(outcomes
            .into_iter()
            .map(|mut outcome| {
                if outcome.has_key(render::KEY_NOT_INSTALLED) {
                    outcome.severity = Severity::Error;
                }
                outcome
            })
            .collect())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::qualified_id;
    use crate::checks::conditions::NBSP;
    use crate::profile::builtin_profile;
    use crate::testing::{assert_pass, assert_results_contain, sample_face, CheckTester};

    #[test]
    fn family_checks_are_the_expected_ten() {
        let (_, profile) = builtin_profile(NAME).unwrap();
        let mut ids: Vec<&str> = profile
            .get_family_checks()
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        ids.sort_unstable();
        let mut expected = vec![
            family::BOLD_ITALIC_UNIQUE_FOR_NAMEID1,
            family::CONSISTENT_UPM,
            family::MAX_4_FONTS_PER_FAMILY_NAME,
            family::UNDERLINE_THICKNESS,
            family::PANOSE_PROPORTION,
            family::PANOSE_FAMILYTYPE,
            family::EQUAL_UNICODE_ENCODINGS,
            family::EQUAL_FONT_VERSIONS,
            family::VERTICAL_METRICS,
            family::SINGLE_DIRECTORY,
        ];
        expected.sort_unstable();
        assert_eq!(ids, expected);
        assert!(profile.get(metrics::WIN_ASCENT_AND_DESCENT).is_none());
    }

    #[test]
    fn overridden_ids_carry_the_qualifier() {
        let (_, profile) = builtin_profile(NAME).unwrap();
        let overridden = profile.overridden_ids();
        assert_eq!(overridden.len(), 3);
        assert_eq!(
            overridden.get(glyphs::WHITESPACE_GLYPHS).copied(),
            Some(qualified_id(glyphs::WHITESPACE_GLYPHS, QUALIFIER).as_str())
        );
        assert!(overridden.contains_key(render::FREETYPE_RASTERIZER));
        assert!(overridden.contains_key(glyphs::VALID_GLYPHNAMES));
    }

    #[test]
    fn missing_nbsp_is_only_a_warning() {
        let check = CheckTester::builtin(
            NAME,
            &qualified_id(glyphs::WHITESPACE_GLYPHS, QUALIFIER),
        );
        let mut face = sample_face("SourceSansPro-Regular.otf");
        assert_pass(&check.run_font(face.clone()));
        face.cmap.remove(&NBSP);
        assert_results_contain(
            &check.run_font(face),
            Severity::Warn,
            "missing-whitespace-glyph-0x00A0",
        );
    }

    #[test]
    fn invalid_glyph_names_are_only_a_warning() {
        let check = CheckTester::builtin(
            NAME,
            &qualified_id(glyphs::VALID_GLYPHNAMES, QUALIFIER),
        );
        let mut face = sample_face("Nunito-Regular.ttf");
        assert_pass(&check.run_font(face.clone()));

        let good_name = "b".repeat(63);
        face.glyphs[2].name = "a".repeat(64);
        face.glyphs[3].name = "3cents".to_string();
        face.glyphs[4].name = ".threecents".to_string();
        face.glyphs[5].name = good_name.clone();
        let message = assert_results_contain(
            &check.run_font(face),
            Severity::Warn,
            "found-invalid-names",
        );
        assert!(!message.contains(&good_name));
    }

    #[test]
    fn missing_rasterizer_is_an_error() {
        let check = CheckTester::builtin(NAME, render::FREETYPE_RASTERIZER);
        let outcomes = check.run_font(sample_face("SourceSansPro-Regular.otf"));
        let message =
            assert_results_contain(&outcomes, Severity::Error, render::KEY_NOT_INSTALLED);
        assert!(message.contains("FreeType is not available"));
    }
}
