//! Checks that compare the fonts of one family with each other.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::check::{CheckImplementation, TargetKind};
use crate::error::ConfigError;
use crate::font::FontFace;
use crate::registry::CheckRegistry;
use crate::resolve::Args;
use crate::status::Outcome;

pub const CONSISTENT_UPM: &str = "com.adobe.fonts/check/family/consistent_upm";
pub const BOLD_ITALIC_UNIQUE_FOR_NAMEID1: &str =
    "com.adobe.fonts/check/family/bold_italic_unique_for_nameid1";
pub const MAX_4_FONTS_PER_FAMILY_NAME: &str =
    "com.adobe.fonts/check/family/max_4_fonts_per_family_name";
pub const UNDERLINE_THICKNESS: &str = "com.google.fonts/check/family/underline_thickness";
pub const PANOSE_PROPORTION: &str = "com.google.fonts/check/family/panose_proportion";
pub const PANOSE_FAMILYTYPE: &str = "com.google.fonts/check/family/panose_familytype";
pub const EQUAL_UNICODE_ENCODINGS: &str = "com.google.fonts/check/family/equal_unicode_encodings";
pub const EQUAL_FONT_VERSIONS: &str = "com.google.fonts/check/family/equal_font_versions";
pub const VERTICAL_METRICS: &str = "com.google.fonts/check/family/vertical_metrics";
pub const SINGLE_DIRECTORY: &str = "com.google.fonts/check/family/single_directory";

pub(crate) fn register(registry: &mut CheckRegistry) -> Result<(), ConfigError> {
    registry.register_check(consistent_upm())?;
    registry.register_check(bold_italic_unique_for_nameid1())?;
    registry.register_check(max_4_fonts_per_family_name())?;
    registry.register_check(underline_thickness())?;
    registry.register_check(panose_proportion())?;
    registry.register_check(panose_familytype())?;
    registry.register_check(equal_unicode_encodings())?;
    registry.register_check(equal_font_versions())?;
    registry.register_check(vertical_metrics())?;
    registry.register_check(single_directory())?;
    Ok(())
}

fn family_check<F>(id: &str, title: &str, predicate: F) -> CheckImplementation
where
    F: Fn(&[Arc<FontFace>]) -> Vec<Outcome> + Send + Sync + 'static,
{
    CheckImplementation::new(id, TargetKind::Family, move |args: &Args| {
        Ok(predicate(args.fonts()?))
    })
    .with_title(title)
    .with_inputs(&["fonts"])
}

/// Group fonts by a per-font value; `None` values are left out.
fn distinct<T, F>(fonts: &[Arc<FontFace>], value: F) -> BTreeMap<T, Vec<String>>
where
    T: Ord,
    F: Fn(&FontFace) -> Option<T>,
{
    let mut groups: BTreeMap<T, Vec<String>> = BTreeMap::new();
    for font in fonts {
        if let Some(v) = value(font) {
            groups.entry(v).or_default().push(file_name(font));
        }
    }
    groups
}

fn file_name(font: &FontFace) -> String {
    font.source
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| font.identity())
}

fn describe<T: Debug>(groups: &BTreeMap<T, Vec<String>>) -> String {
    groups
        .iter()
        .map(|(value, files)| format!("{value:?}: {}", files.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn consistent_upm() -> CheckImplementation {
    family_check(
        CONSISTENT_UPM,
        "Fonts have consistent Units Per Em?",
        |fonts| {
            let upms: BTreeSet<u16> = fonts.iter().filter_map(|f| f.units_per_em()).collect();
            let outcome = if upms.len() > 1 {
                Outcome::fail(
                    "inconsistent-upem",
                    format!(
                        "Fonts have different units per em: {:?}.",
                        upms.into_iter().collect::<Vec<_>>()
                    ),
                )
            } else {
                Outcome::pass("Fonts have consistent units per em.")
            };
            vec![outcome]
        },
    )
}

pub fn bold_italic_unique_for_nameid1() -> CheckImplementation {
    family_check(
        BOLD_ITALIC_UNIQUE_FOR_NAMEID1,
        "Check that OS/2.fsSelection bold & italic settings are unique for each NameID1",
        |fonts| {
            let mut styles: BTreeMap<(String, bool, bool), Vec<String>> = BTreeMap::new();
            for font in fonts {
                let (Some(family), Some(os2)) = (font.family_name(), font.os2) else {
                    continue;
                };
                styles
                    .entry((family, os2.is_bold(), os2.is_italic()))
                    .or_default()
                    .push(file_name(font));
            }

            let mut outcomes: Vec<Outcome> = styles
                .into_iter()
                .filter(|(_, files)| files.len() > 1)
                .map(|((family, bold, italic), files)| {
                    Outcome::fail(
                        "unique-fsselection",
                        format!(
                            "Family '{family}' has {} fonts with the same OS/2.fsSelection \
                             bold & italic settings: bold={bold}, italic={italic} ({})",
                            files.len(),
                            files.join(", ")
                        ),
                    )
                })
                .collect();
            if outcomes.is_empty() {
                outcomes.push(Outcome::pass(
                    "The OS/2.fsSelection bold & italic settings were unique within each \
                     compatible family group.",
                ));
            }
            outcomes
        },
    )
}

pub fn max_4_fonts_per_family_name() -> CheckImplementation {
    family_check(
        MAX_4_FONTS_PER_FAMILY_NAME,
        "Verify that each group of fonts with the same nameID 1 has maximum of 4 fonts.",
        |fonts| {
            let groups = distinct(fonts, FontFace::family_name);
            let mut outcomes: Vec<Outcome> = groups
                .iter()
                .filter(|(_, files)| files.len() > 4)
                .map(|(family, files)| {
                    Outcome::fail(
                        "too-many",
                        format!(
                            "Family '{family}' has {} fonts (should be 4 or fewer).",
                            files.len()
                        ),
                    )
                })
                .collect();
            if outcomes.is_empty() {
                outcomes.push(Outcome::pass(
                    "There were no more than 4 fonts per family name.",
                ));
            }
            outcomes
        },
    )
}

pub fn underline_thickness() -> CheckImplementation {
    family_check(
        UNDERLINE_THICKNESS,
        "Fonts have consistent underline thickness?",
        |fonts| {
            let groups = distinct(fonts, |f| f.post.map(|p| p.underline_thickness));
            let outcome = if groups.len() > 1 {
                Outcome::fail(
                    "inconsistent-underline-thickness",
                    format!(
                        "Thickness of the underline is not the same across this family. \
                         In order to fix this, please make sure that the \
                         underlineThickness value is the same in the 'post' table of all of \
                         this family font files. Detected underlineThickness values are: {}",
                        describe(&groups)
                    ),
                )
            } else {
                Outcome::pass("Fonts have consistent underline thickness.")
            };
            vec![outcome]
        },
    )
}

pub fn panose_proportion() -> CheckImplementation {
    family_check(
        PANOSE_PROPORTION,
        "Fonts have consistent PANOSE proportion?",
        |fonts| {
            let groups = distinct(fonts, |f| f.os2.map(|os2| os2.panose[3]));
            let outcome = if groups.len() > 1 {
                Outcome::warn(
                    "inconsistent-panose-proportion",
                    format!(
                        "PANOSE proportion is not the same across this family. In order to \
                         fix this, please make sure that the panose.bProportion value is the \
                         same in the OS/2 table of all of this family font files. Detected \
                         values: {}",
                        describe(&groups)
                    ),
                )
            } else {
                Outcome::pass("Fonts have consistent PANOSE proportion.")
            };
            vec![outcome]
        },
    )
}

pub fn panose_familytype() -> CheckImplementation {
    family_check(
        PANOSE_FAMILYTYPE,
        "Fonts have consistent PANOSE family type?",
        |fonts| {
            let groups = distinct(fonts, |f| f.os2.map(|os2| os2.panose[0]));
            let outcome = if groups.len() > 1 {
                Outcome::warn(
                    "inconsistent-panose-familytype",
                    format!(
                        "PANOSE family type is not the same across this family. In order to \
                         fix this, please make sure that the panose.bFamilyType value is the \
                         same in the OS/2 table of all of this family font files. Detected \
                         values: {}",
                        describe(&groups)
                    ),
                )
            } else {
                Outcome::pass("Fonts have consistent PANOSE family type.")
            };
            vec![outcome]
        },
    )
}

pub fn equal_unicode_encodings() -> CheckImplementation {
    family_check(
        EQUAL_UNICODE_ENCODINGS,
        "Fonts have equal unicode encodings?",
        |fonts| {
            let groups = distinct(fonts, |f| {
                let mut encodings = f.cmap_encodings.clone();
                encodings.sort_unstable();
                encodings.dedup();
                Some(encodings)
            });
            let outcome = if groups.len() > 1 {
                Outcome::fail("mismatch", "Fonts have different unicode encodings.")
            } else {
                Outcome::pass("Fonts have equal unicode encodings.")
            };
            vec![outcome]
        },
    )
}

pub fn equal_font_versions() -> CheckImplementation {
    family_check(
        EQUAL_FONT_VERSIONS,
        "Make sure all font files have the same version value.",
        |fonts| {
            // head.fontRevision is 16.16 fixed point; compare the raw bits.
            let groups = distinct(fonts, |f| f.head.map(|h| (h.font_revision * 65536.0).round() as i64));
            let outcome = if groups.len() > 1 {
                let versions: Vec<String> = groups
                    .iter()
                    .map(|(raw, files)| format!("{:.3}: {}", *raw as f64 / 65536.0, files.join(", ")))
                    .collect();
                Outcome::warn(
                    "mismatch",
                    format!(
                        "Version info differs among font files of the same font project.\n\
                         These were the version values found: {}",
                        versions.join("; ")
                    ),
                )
            } else {
                Outcome::pass("All font files have the same version.")
            };
            vec![outcome]
        },
    )
}

pub fn vertical_metrics() -> CheckImplementation {
    family_check(
        VERTICAL_METRICS,
        "Each font in a family must have the same set of vertical metrics values.",
        |fonts| {
            let fields: [(&str, fn(&FontFace) -> Option<i32>); 8] = [
                ("sTypoAscender", |f| f.os2.map(|o| i32::from(o.typo_ascender))),
                ("sTypoDescender", |f| f.os2.map(|o| i32::from(o.typo_descender))),
                ("sTypoLineGap", |f| f.os2.map(|o| i32::from(o.typo_line_gap))),
                ("usWinAscent", |f| f.os2.map(|o| i32::from(o.win_ascent))),
                ("usWinDescent", |f| f.os2.map(|o| i32::from(o.win_descent))),
                ("ascent", |f| f.hhea.map(|h| i32::from(h.ascender))),
                ("descent", |f| f.hhea.map(|h| i32::from(h.descender))),
                ("lineGap", |f| f.hhea.map(|h| i32::from(h.line_gap))),
            ];

            let mut outcomes: Vec<Outcome> = fields
                .iter()
                .filter_map(|(name, value)| {
                    let groups = distinct(fonts, value);
                    (groups.len() > 1).then(|| {
                        Outcome::fail(
                            &format!("{name}-mismatch"),
                            format!(
                                "{name} is not the same across the family: {}",
                                describe(&groups)
                            ),
                        )
                    })
                })
                .collect();
            if outcomes.is_empty() {
                outcomes.push(Outcome::pass(
                    "Vertical metrics are the same across the family.",
                ));
            }
            outcomes
        },
    )
}

pub fn single_directory() -> CheckImplementation {
    family_check(
        SINGLE_DIRECTORY,
        "Checking all files are in the same directory.",
        |fonts| {
            let directories: BTreeSet<&Path> = fonts
                .iter()
                .filter_map(|f| f.source.path.parent())
                .collect();
            let outcome = if directories.len() > 1 {
                let listed: Vec<String> = directories
                    .iter()
                    .map(|d| d.display().to_string())
                    .collect();
                Outcome::fail(
                    "single-directory",
                    format!(
                        "Not all fonts passed in the command line are in the same directory. \
                         This may lead to bad results as the tool will interpret all font \
                         files as belonging to a single font family. The detected \
                         directories are: {}",
                        listed.join(", ")
                    ),
                )
            } else {
                Outcome::pass("All files are in the same directory.")
            };
            vec![outcome]
        },
    )
}
