//! Checks over the glyph set, glyph names and the character map.

use std::collections::BTreeMap;

use anyhow::Result;
use unicode_general_category::{get_general_category, GeneralCategory};

use crate::check::{CheckImplementation, TargetKind};
use crate::checks::conditions::{
    HAS_GLYPH_NAMES, MISSING_WHITESPACE_CHARS, NBSP, SPACE, WHITESPACE_COMPLETE,
};
use crate::error::ConfigError;
use crate::font::FontFace;
use crate::registry::CheckRegistry;
use crate::resolve::Args;
use crate::status::Outcome;

pub const FIND_EMPTY_LETTERS: &str = "com.adobe.fonts/check/find_empty_letters";
pub const MANDATORY_GLYPHS: &str = "com.google.fonts/check/mandatory_glyphs";
pub const SOFT_HYPHEN: &str = "com.google.fonts/check/soft_hyphen";
pub const UNIQUE_GLYPHNAMES: &str = "com.google.fonts/check/unique_glyphnames";
pub const VALID_GLYPHNAMES: &str = "com.google.fonts/check/valid_glyphnames";
pub const WHITESPACE_GLYPHNAMES: &str = "com.google.fonts/check/whitespace_glyphnames";
pub const WHITESPACE_GLYPHS: &str = "com.google.fonts/check/whitespace_glyphs";
pub const WHITESPACE_WIDTHS: &str = "com.google.fonts/check/whitespace_widths";

/// Hangul fillers are letters by category but are meant to be invisible.
const HANGUL_FILLERS: [u32; 4] = [0x115F, 0x1160, 0x3164, 0xFFA0];
const HANGUL_SYLLABLES: std::ops::RangeInclusive<u32> = 0xAC00..=0xD7A3;

pub(crate) fn register(registry: &mut CheckRegistry) -> Result<(), ConfigError> {
    registry.register_check(find_empty_letters())?;
    registry.register_check(mandatory_glyphs())?;
    registry.register_check(soft_hyphen())?;
    registry.register_check(unique_glyphnames())?;
    registry.register_check(valid_glyphnames())?;
    registry.register_check(whitespace_glyphnames())?;
    registry.register_check(whitespace_glyphs())?;
    registry.register_check(whitespace_widths())?;
    Ok(())
}

pub fn find_empty_letters() -> CheckImplementation {
    CheckImplementation::new(FIND_EMPTY_LETTERS, TargetKind::Font, check_find_empty_letters)
        .with_title("Letters in font have glyphs that are not empty?")
        .with_inputs(&["font"])
}

fn is_letter(cp: u32) -> bool {
    char::from_u32(cp).is_some_and(|ch| {
        matches!(
            get_general_category(ch),
            GeneralCategory::UppercaseLetter
                | GeneralCategory::LowercaseLetter
                | GeneralCategory::TitlecaseLetter
                | GeneralCategory::ModifierLetter
                | GeneralCategory::OtherLetter
        )
    })
}

/// Hangul syllables outside KS X 1001 may legitimately be left blank.
///
/// KS X 1001 syllables are exactly those encoded by EUC-KR in rows
/// 0xB0-0xC8 with a trail byte of at least 0xA1; the rest only exist in the
/// Unified Hangul Code extension.
fn is_blank_ok_hangul(cp: u32) -> bool {
    if !HANGUL_SYLLABLES.contains(&cp) {
        return false;
    }
    let Some(ch) = char::from_u32(cp) else {
        return false;
    };
    let mut buf = [0u8; 4];
    let (bytes, _, unmappable) = encoding_rs::EUC_KR.encode(ch.encode_utf8(&mut buf));
    let in_ks_x_1001 = !unmappable
        && bytes.len() == 2
        && (0xB0..=0xC8).contains(&bytes[0])
        && bytes[1] >= 0xA1;
    !in_ks_x_1001
}

fn check_find_empty_letters(args: &Args) -> Result<Vec<Outcome>> {
    let font = args.font()?;
    let mut outcomes = Vec::new();
    let mut blank_hangul = 0;

    for (&cp, &gid) in &font.cmap {
        if HANGUL_FILLERS.contains(&cp) || !is_letter(cp) {
            continue;
        }
        let Some(glyph) = font.glyph(gid) else {
            continue;
        };
        if !glyph.is_empty {
            continue;
        }
        if is_blank_ok_hangul(cp) {
            blank_hangul += 1;
        } else {
            outcomes.push(Outcome::fail(
                "empty-letter",
                format!(
                    "U+{cp:04X} should be visible, but its glyph ('{}') is empty.",
                    glyph.name
                ),
            ));
        }
    }

    if blank_hangul > 0 {
        outcomes.push(Outcome::warn(
            "empty-hangul-letter",
            format!("Found {blank_hangul} empty hangul glyph(s)."),
        ));
    }
    if outcomes.is_empty() {
        outcomes.push(Outcome::pass("No empty glyphs for letters found."));
    }
    Ok(outcomes)
}

pub fn mandatory_glyphs() -> CheckImplementation {
    CheckImplementation::new(MANDATORY_GLYPHS, TargetKind::Font, check_mandatory_glyphs)
        .with_title("Font contains '.notdef' as its first glyph?")
        .with_inputs(&["font", HAS_GLYPH_NAMES])
}

fn check_mandatory_glyphs(args: &Args) -> Result<Vec<Outcome>> {
    let font = args.font()?;
    let named = args.flag(HAS_GLYPH_NAMES)?;
    let mut outcomes = Vec::new();

    let notdef = if named {
        font.glyph_id_by_name(".notdef")
    } else {
        (!font.glyphs.is_empty()).then_some(0)
    };

    match notdef {
        None => outcomes.push(Outcome::fail(
            "notdef-not-found",
            "Font should contain the '.notdef' glyph.",
        )),
        Some(gid) => {
            if gid != 0 {
                outcomes.push(Outcome::warn(
                    "notdef-not-first",
                    "The '.notdef' should be the font's first glyph.",
                ));
            }
            if font.cmap.values().any(|mapped| *mapped == gid) {
                outcomes.push(Outcome::warn(
                    "notdef-has-codepoint",
                    "The '.notdef' glyph should not have a Unicode codepoint value assigned, \
                     but has one.",
                ));
            }
            if font.glyph(gid).is_some_and(|g| g.is_empty) {
                outcomes.push(Outcome::warn(
                    "notdef-is-blank",
                    "The '.notdef' glyph should contain a drawing, but it is blank.",
                ));
            }
        }
    }

    if outcomes.is_empty() {
        outcomes.push(Outcome::pass(
            "OK! Font contains '.notdef' as its first glyph, and this glyph is not empty.",
        ));
    }
    Ok(outcomes)
}

pub fn soft_hyphen() -> CheckImplementation {
    CheckImplementation::new(SOFT_HYPHEN, TargetKind::Font, |args| {
        let outcome = if args.font()?.glyph_for(0x00AD).is_some() {
            Outcome::warn("softhyphen", "This font has a 'Soft Hyphen' character.")
        } else {
            Outcome::pass("Looks good!")
        };
        Ok(vec![outcome])
    })
    .with_title("Does the font contain a soft hyphen?")
    .with_inputs(&["font"])
}

pub fn unique_glyphnames() -> CheckImplementation {
    CheckImplementation::new(UNIQUE_GLYPHNAMES, TargetKind::Font, check_unique_glyphnames)
        .with_title("Font contains unique glyph names?")
        .with_inputs(&["font"])
        .with_conditions(&[HAS_GLYPH_NAMES])
}

fn check_unique_glyphnames(args: &Args) -> Result<Vec<Outcome>> {
    let font = args.font()?;
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    for glyph in &font.glyphs {
        *seen.entry(glyph.name.as_str()).or_insert(0) += 1;
    }
    let duplicates: Vec<&str> = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name)
        .collect();

    let outcome = if duplicates.is_empty() {
        Outcome::pass("Font contains unique glyph names.")
    } else {
        Outcome::fail(
            "duplicated-glyph-names",
            format!("These glyph names occur more than once: {}", duplicates.join(", ")),
        )
    };
    Ok(vec![outcome])
}

pub fn valid_glyphnames() -> CheckImplementation {
    CheckImplementation::new(VALID_GLYPHNAMES, TargetKind::Font, check_valid_glyphnames)
        .with_title("Glyph names are all valid?")
        .with_inputs(&["font"])
        .with_conditions(&[HAS_GLYPH_NAMES])
}

/// Production glyph name rules: 1-63 chars from `[A-Za-z0-9._]`, not starting
/// with a digit or a period.
fn is_valid_glyph_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() <= 63
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}

fn check_valid_glyphnames(args: &Args) -> Result<Vec<Outcome>> {
    let font = args.font()?;
    let mut bad_names = Vec::new();
    let mut long_names = Vec::new();

    for glyph in &font.glyphs {
        let name = glyph.name.as_str();
        if [".notdef", ".null", ".ttfautohint"]
            .iter()
            .any(|special| name.starts_with(special))
        {
            continue;
        }
        if !is_valid_glyph_name(name) {
            bad_names.push(name);
        } else if name.len() > 31 {
            long_names.push(name);
        }
    }
    bad_names.sort_unstable();
    bad_names.dedup();
    long_names.sort_unstable();
    long_names.dedup();

    let mut outcomes = Vec::new();
    if !bad_names.is_empty() {
        outcomes.push(Outcome::fail(
            "found-invalid-names",
            format!(
                "The following glyph names do not comply with naming conventions: {}\n\n\
                 A glyph name must be entirely comprised of characters from the following \
                 set: A-Z a-z 0-9 .(period) _(underscore). A glyph name must not start with \
                 a digit or period. There are a few exceptions such as the special glyph \
                 '.notdef'. The glyph names 'twocents', 'a1', and '_' are all valid, while \
                 '2cents' and '.twocents' are not.",
                bad_names.join(", ")
            ),
        ));
    }
    if !long_names.is_empty() {
        outcomes.push(Outcome::warn(
            "legacy-long-names",
            format!(
                "The following glyph names may be too long for some legacy systems which may \
                 expect a maximum 31-char length limit: {}",
                long_names.join(", ")
            ),
        ));
    }
    if outcomes.is_empty() {
        outcomes.push(Outcome::pass("Glyph names are all valid."));
    }
    Ok(outcomes)
}

pub fn whitespace_glyphs() -> CheckImplementation {
    CheckImplementation::new(WHITESPACE_GLYPHS, TargetKind::Font, |args| {
        let missing = args.get::<Vec<u32>>(MISSING_WHITESPACE_CHARS)?;
        if missing.is_empty() {
            return Ok(vec![Outcome::pass(
                "Font contains glyphs for whitespace characters.",
            )]);
        }
        Ok(missing
            .iter()
            .map(|cp| {
                Outcome::fail(
                    &format!("missing-whitespace-glyph-0x{cp:04X}"),
                    format!("Whitespace glyph missing for codepoint 0x{cp:04X}."),
                )
            })
            .collect())
    })
    .with_title("Font contains glyphs for whitespace characters?")
    .with_inputs(&["font", MISSING_WHITESPACE_CHARS])
}

pub fn whitespace_glyphnames() -> CheckImplementation {
    CheckImplementation::new(
        WHITESPACE_GLYPHNAMES,
        TargetKind::Font,
        check_whitespace_glyphnames,
    )
    .with_title("Font has **proper** whitespace glyph names?")
    .with_inputs(&["font"])
    .with_conditions(&[WHITESPACE_COMPLETE, HAS_GLYPH_NAMES])
}

fn glyph_name_for(font: &FontFace, cp: u32) -> Option<&str> {
    font.glyph_for_char(cp).map(|g| g.name.as_str())
}

fn check_whitespace_glyphnames(args: &Args) -> Result<Vec<Outcome>> {
    let font = args.font()?;
    let mut outcomes = Vec::new();

    match glyph_name_for(font, SPACE) {
        Some("space") | Some("uni0020") => {}
        other => outcomes.push(Outcome::fail(
            "bad-space",
            format!(
                "Glyph 0x0020 is called \"{}\": Change to \"space\" or \"uni0020\"",
                other.unwrap_or_default()
            ),
        )),
    }

    match glyph_name_for(font, NBSP) {
        Some("uni00A0") => {}
        Some(name @ ("nbspace" | "nbsp" | "nonbreakingspace")) => outcomes.push(Outcome::warn(
            "not-recommended-00a0",
            format!(
                "Glyph 0x00A0 is called \"{name}\": Change to \"uni00A0\" \
                 (not a mandatory change)"
            ),
        )),
        other => outcomes.push(Outcome::fail(
            "bad-nbsp",
            format!(
                "Glyph 0x00A0 is called \"{}\": Change to \"uni00A0\"",
                other.unwrap_or_default()
            ),
        )),
    }

    if outcomes.is_empty() {
        outcomes.push(Outcome::pass(
            "Font has **AGL recommended** names for whitespace glyphs.",
        ));
    }
    Ok(outcomes)
}

pub fn whitespace_widths() -> CheckImplementation {
    CheckImplementation::new(WHITESPACE_WIDTHS, TargetKind::Font, |args| {
        let font = args.font()?;
        let space = font.glyph_for_char(SPACE);
        let nbsp = font.glyph_for_char(NBSP);
        let outcome = match (space, nbsp) {
            (Some(space), Some(nbsp)) if space.advance == nbsp.advance && space.advance > 0 => {
                Outcome::pass("Space and non-breaking space have the same width.")
            }
            (Some(space), Some(nbsp)) => Outcome::fail(
                "different-widths",
                format!(
                    "Space and non-breaking space have differing width: The space glyph named \
                     {} is {} font units wide, non-breaking space named ({}) is {} font units \
                     wide, and both should be positive and the same.",
                    space.name, space.advance, nbsp.name, nbsp.advance
                ),
            ),
            _ => Outcome::fail(
                "missing-glyphs",
                "Space and non-breaking space glyphs are not both present.",
            ),
        };
        Ok(vec![outcome])
    })
    .with_title("Space and non-breaking space have the same width?")
    .with_inputs(&["font"])
    .with_conditions(&[WHITESPACE_COMPLETE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::Glyph;
    use crate::status::Severity;
    use crate::testing::{assert_pass, assert_results_contain, sample_face, CheckTester};

    #[test]
    fn ks_x_1001_syllables_are_not_blank_ok() {
        assert!(!is_blank_ok_hangul(0xAC00));
        assert!(is_blank_ok_hangul(0xB646));
        assert!(is_blank_ok_hangul(0xD7A0));
        assert!(!is_blank_ok_hangul(0x0042));
    }

    #[test]
    fn glyph_name_rules() {
        assert!(is_valid_glyph_name("twocents"));
        assert!(is_valid_glyph_name("a1"));
        assert!(is_valid_glyph_name("_"));
        assert!(is_valid_glyph_name(&"b".repeat(63)));
        assert!(!is_valid_glyph_name(&"a".repeat(64)));
        assert!(!is_valid_glyph_name("2cents"));
        assert!(!is_valid_glyph_name(".twocents"));
        assert!(!is_valid_glyph_name(""));
    }

    #[test]
    fn empty_letters_fail_and_blank_hangul_warns() {
        let check = CheckTester::builtin("adobefonts", FIND_EMPTY_LETTERS);
        let face = sample_face("SourceSansPro-Bold.ttf");
        assert_eq!(
            assert_pass(&check.run_font(face.clone())),
            "No empty glyphs for letters found."
        );

        let mut hangul = face.clone();
        let space = hangul.glyph_for(SPACE).unwrap();
        hangul.cmap.insert(0xB646, space);
        hangul.cmap.insert(0xD7A0, space);
        let outcomes = check.run_font(hangul);
        assert_eq!(
            assert_results_contain(&outcomes, Severity::Warn, "empty-hangul-letter"),
            "Found 2 empty hangul glyph(s)."
        );
        assert!(outcomes.iter().all(|o| o.severity != Severity::Fail));

        let mut empty_b = face;
        let gid = empty_b.glyph_for('B' as u32).unwrap();
        empty_b.glyphs[gid as usize].is_empty = true;
        assert_eq!(
            assert_results_contain(&check.run_font(empty_b), Severity::Fail, "empty-letter"),
            "U+0042 should be visible, but its glyph ('B') is empty."
        );
    }

    #[test]
    fn valid_glyphnames_reports_bad_and_long_names() {
        let check = CheckTester::builtin("universal", VALID_GLYPHNAMES);
        let mut face = sample_face("Nunito-Regular.ttf");
        assert_pass(&check.run_font(face.clone()));

        let good_name = "b".repeat(63);
        let bad_name1 = "a".repeat(64);
        face.glyphs[2].name = bad_name1.clone();
        face.glyphs[3].name = "3cents".to_string();
        face.glyphs[4].name = ".threecents".to_string();
        face.glyphs[5].name = good_name.clone();
        let outcomes = check.run_font(face);
        let message = assert_results_contain(&outcomes, Severity::Fail, "found-invalid-names");
        assert!(!message.contains(&good_name));
        assert!(message.contains(&bad_name1));
        assert!(message.contains("3cents"));
        assert!(message.contains(".threecents"));
        let long = assert_results_contain(&outcomes, Severity::Warn, "legacy-long-names");
        assert!(long.contains(&good_name));
    }

    #[test]
    fn format_3_post_skips_glyph_name_checks() {
        let check = CheckTester::builtin("universal", UNIQUE_GLYPHNAMES);
        let mut face = sample_face("Cabin-Regular.ttf");
        if let Some(post) = face.post.as_mut() {
            post.version = crate::font::PostInfo::VERSION_3;
        }
        assert_results_contain(&check.run_font(face), Severity::Skip, "unfulfilled-conditions");
    }

    #[test]
    fn missing_nbsp_fails_whitespace_glyphs() {
        let check = CheckTester::builtin("universal", WHITESPACE_GLYPHS);
        let mut face = sample_face("Cabin-Regular.ttf");
        assert_pass(&check.run_font(face.clone()));
        face.cmap.remove(&NBSP);
        assert_results_contain(
            &check.run_font(face),
            Severity::Fail,
            "missing-whitespace-glyph-0x00A0",
        );
    }

    #[test]
    fn whitespace_names_and_widths() {
        let names = CheckTester::builtin("universal", WHITESPACE_GLYPHNAMES);
        let widths = CheckTester::builtin("universal", WHITESPACE_WIDTHS);
        let mut face = sample_face("Cabin-Regular.ttf");
        assert_pass(&names.run_font(face.clone()));
        assert_pass(&widths.run_font(face.clone()));

        let gid = face.glyph_for(NBSP).unwrap() as usize;
        face.glyphs[gid] = Glyph::new("nbsp", 300, true);
        assert_results_contain(&names.run_font(face.clone()), Severity::Warn, "not-recommended-00a0");
        assert_results_contain(&widths.run_font(face), Severity::Fail, "different-widths");
    }

    #[test]
    fn notdef_and_soft_hyphen() {
        let mandatory = CheckTester::builtin("universal", MANDATORY_GLYPHS);
        let hyphen = CheckTester::builtin("universal", SOFT_HYPHEN);
        let mut face = sample_face("Cabin-Regular.ttf");
        assert_pass(&mandatory.run_font(face.clone()));
        assert_pass(&hyphen.run_font(face.clone()));

        face.glyphs[0].is_empty = true;
        face.cmap.insert(0x00AD, 0);
        let outcomes = mandatory.run_font(face.clone());
        assert_results_contain(&outcomes, Severity::Warn, "notdef-is-blank");
        assert_results_contain(&outcomes, Severity::Warn, "notdef-has-codepoint");
        assert_results_contain(&hyphen.run_font(face), Severity::Warn, "softhyphen");
    }
}
