//! Checks over per-font metrics in `head`, `hhea` and `OS/2`.

use anyhow::Result;

use crate::check::{CheckImplementation, TargetKind};
use crate::checks::conditions::{FamilyBounds, FAMILY_VMETRICS};
use crate::error::ConfigError;
use crate::registry::CheckRegistry;
use crate::resolve::Args;
use crate::status::Outcome;

pub const UNITSPEREM: &str = "com.google.fonts/check/unitsperem";
pub const LINEGAPS: &str = "com.google.fonts/check/linegaps";
pub const OS2_METRICS_MATCH_HHEA: &str = "com.google.fonts/check/os2_metrics_match_hhea";
pub const WIN_ASCENT_AND_DESCENT: &str = "com.google.fonts/check/family/win_ascent_and_descent";
pub const FSSELECTION_MATCHES_MACSTYLE: &str = "com.adobe.fonts/check/fsselection_matches_macstyle";

/// unitsPerEm values that render well across rasterizers.
const RECOMMENDED_UPM: [u16; 10] = [16, 32, 64, 128, 256, 512, 1000, 1024, 2000, 2048];

const MAC_STYLE_BOLD: u16 = 1 << 0;
const MAC_STYLE_ITALIC: u16 = 1 << 1;

pub(crate) fn register(registry: &mut CheckRegistry) -> Result<(), ConfigError> {
    registry.register_check(unitsperem())?;
    registry.register_check(linegaps())?;
    registry.register_check(os2_metrics_match_hhea())?;
    registry.register_check(win_ascent_and_descent())?;
    registry.register_check(fsselection_matches_macstyle())?;
    Ok(())
}

fn lacks(table: &str) -> Outcome {
    Outcome::fail(
        &format!("lacks-{}", table.to_ascii_lowercase().replace('/', "")),
        format!("Font lacks a '{table}' table."),
    )
}

pub fn unitsperem() -> CheckImplementation {
    CheckImplementation::new(UNITSPEREM, TargetKind::Font, |args| {
        let Some(upm) = args.font()?.units_per_em() else {
            return Ok(vec![lacks("head")]);
        };
        let outcome = if !(16..=16384).contains(&upm) {
            Outcome::fail(
                "out-of-range",
                format!(
                    "The value of unitsPerEm at the head table must be a value between 16 \
                     and 16384. Got {upm} instead."
                ),
            )
        } else if !RECOMMENDED_UPM.contains(&upm) {
            Outcome::warn(
                "suboptimal-value",
                format!(
                    "In order to optimize performance on some legacy renderers, the value of \
                     unitsPerEm at the head table should ideally be a power of 2 between 16 \
                     to 16384. And values of 1000 and 2000 are also common and may be just \
                     fine as well. But we got {upm} instead."
                ),
            )
        } else {
            Outcome::pass(format!(
                "The unitsPerEm value ({upm}) on the 'head' table is reasonable."
            ))
        };
        Ok(vec![outcome])
    })
    .with_title("Checking unitsPerEm value is reasonable.")
    .with_inputs(&["font"])
}

pub fn linegaps() -> CheckImplementation {
    CheckImplementation::new(LINEGAPS, TargetKind::Font, |args| {
        let font = args.font()?;
        let (Some(hhea), Some(os2)) = (font.hhea, font.os2) else {
            return Ok(vec![lacks(if font.hhea.is_none() { "hhea" } else { "OS/2" })]);
        };
        let mut outcomes = Vec::new();
        if hhea.line_gap != 0 {
            outcomes.push(Outcome::warn("hhea", "hhea lineGap is not equal to 0."));
        }
        if os2.typo_line_gap != 0 {
            outcomes.push(Outcome::warn("OS/2", "OS/2 sTypoLineGap is not equal to 0."));
        }
        if outcomes.is_empty() {
            outcomes.push(Outcome::pass("hhea and OS/2 table lineGaps are both 0."));
        }
        Ok(outcomes)
    })
    .with_title("Checking Vertical Metric Linegaps.")
    .with_inputs(&["font"])
}

pub fn os2_metrics_match_hhea() -> CheckImplementation {
    CheckImplementation::new(OS2_METRICS_MATCH_HHEA, TargetKind::Font, |args| {
        let font = args.font()?;
        let (Some(hhea), Some(os2)) = (font.hhea, font.os2) else {
            return Ok(vec![lacks(if font.hhea.is_none() { "hhea" } else { "OS/2" })]);
        };
        let mut outcomes = Vec::new();
        if os2.typo_ascender != hhea.ascender {
            outcomes.push(Outcome::fail(
                "ascender",
                format!(
                    "OS/2 sTypoAscender ({}) and hhea ascent ({}) must be equal.",
                    os2.typo_ascender, hhea.ascender
                ),
            ));
        }
        if os2.typo_descender != hhea.descender {
            outcomes.push(Outcome::fail(
                "descender",
                format!(
                    "OS/2 sTypoDescender ({}) and hhea descent ({}) must be equal.",
                    os2.typo_descender, hhea.descender
                ),
            ));
        }
        if outcomes.is_empty() {
            outcomes.push(Outcome::pass(
                "OS/2.sTypoAscender/Descender values match hhea.ascent/descent.",
            ));
        }
        Ok(outcomes)
    })
    .with_title("Checking OS/2 Metrics match hhea Metrics.")
    .with_inputs(&["font"])
}

pub fn win_ascent_and_descent() -> CheckImplementation {
    CheckImplementation::new(WIN_ASCENT_AND_DESCENT, TargetKind::Font, check_win_metrics)
        .with_title("Checking OS/2 usWinAscent & usWinDescent.")
        .with_inputs(&["font", FAMILY_VMETRICS])
}

/// usWin* must cover the family's bounding box without exceeding twice its extent.
fn check_win_metrics(args: &Args) -> Result<Vec<Outcome>> {
    let font = args.font()?;
    let bounds = args.get::<FamilyBounds>(FAMILY_VMETRICS)?;
    let Some(os2) = font.os2 else {
        return Ok(vec![lacks("OS/2")]);
    };

    let y_max = i32::from(bounds.y_max);
    let y_min = i32::from(bounds.y_min).abs();
    let win_ascent = i32::from(os2.win_ascent);
    let win_descent = i32::from(os2.win_descent);
    let mut outcomes = Vec::new();

    if win_ascent < y_max {
        outcomes.push(Outcome::fail(
            "ascent",
            format!(
                "OS/2.usWinAscent value should be equal or greater than {y_max}, \
                 but got {win_ascent} instead"
            ),
        ));
    }
    if win_ascent > y_max * 2 {
        outcomes.push(Outcome::fail(
            "ascent",
            format!(
                "OS/2.usWinAscent value {win_ascent} is too large. It should be less \
                 than double the yMax. Current yMax value is {y_max}"
            ),
        ));
    }
    if win_descent < y_min {
        outcomes.push(Outcome::fail(
            "descent",
            format!(
                "OS/2.usWinDescent value should be equal or greater than {y_min}, \
                 but got {win_descent} instead"
            ),
        ));
    }
    if win_descent > y_min * 2 {
        outcomes.push(Outcome::fail(
            "descent",
            format!(
                "OS/2.usWinDescent value {win_descent} is too large. It should be less \
                 than double the yMin. Current absolute yMin value is {y_min}"
            ),
        ));
    }
    if outcomes.is_empty() {
        outcomes.push(Outcome::pass(
            "OS/2 usWinAscent & usWinDescent values look good!",
        ));
    }
    Ok(outcomes)
}

pub fn fsselection_matches_macstyle() -> CheckImplementation {
    CheckImplementation::new(FSSELECTION_MATCHES_MACSTYLE, TargetKind::Font, |args| {
        let font = args.font()?;
        let (Some(head), Some(os2)) = (font.head, font.os2) else {
            return Ok(vec![lacks(if font.head.is_none() { "head" } else { "OS/2" })]);
        };
        let mut outcomes = Vec::new();
        if os2.is_bold() != (head.mac_style & MAC_STYLE_BOLD != 0) {
            outcomes.push(Outcome::fail(
                "fsselection-macstyle-bold",
                "The OS/2.fsSelection and head.macStyle bold settings do not match.",
            ));
        }
        if os2.is_italic() != (head.mac_style & MAC_STYLE_ITALIC != 0) {
            outcomes.push(Outcome::fail(
                "fsselection-macstyle-italic",
                "The OS/2.fsSelection and head.macStyle italic settings do not match.",
            ));
        }
        if outcomes.is_empty() {
            outcomes.push(Outcome::pass(
                "The OS/2.fsSelection and head.macStyle bold and italic settings match.",
            ));
        }
        Ok(outcomes)
    })
    .with_title("Check if OS/2 fsSelection matches head macStyle bold and italic bits.")
    .with_inputs(&["font"])
}
