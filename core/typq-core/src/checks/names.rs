//! Checks over the `name` table.

use anyhow::Result;

use crate::check::{CheckImplementation, TargetKind};
use crate::error::ConfigError;
use crate::registry::CheckRegistry;
use crate::resolve::Args;
use crate::status::Outcome;

pub const NAMEID_1_WIN_ENGLISH: &str = "com.adobe.fonts/check/nameid_1_win_english";
pub const TRAILING_SPACES: &str = "com.google.fonts/check/name/trailing_spaces";

pub(crate) fn register(registry: &mut CheckRegistry) -> Result<(), ConfigError> {
    registry.register_check(nameid_1_win_english())?;
    registry.register_check(trailing_spaces())?;
    Ok(())
}

pub fn nameid_1_win_english() -> CheckImplementation {
    CheckImplementation::new(NAMEID_1_WIN_ENGLISH, TargetKind::Font, check_nameid_1_win_english)
        .with_title("Font has a good nameID 1, Windows/Unicode/US-English `name` table record?")
        .with_inputs(&["font"])
}

fn check_nameid_1_win_english(args: &Args) -> Result<Vec<Outcome>> {
    let font = args.font()?;
    if font.names.is_none() {
        return Ok(vec![Outcome::fail(
            "name-table-not-found",
            "Font has no 'name' table.",
        )]);
    }

    let Some(record) = font.windows_english_record(1) else {
        return Ok(vec![Outcome::fail(
            "nameid-1-not-found",
            "Windows nameID 1 US-English record not found.",
        )]);
    };

    let outcome = match record.decode() {
        None => Outcome::error(
            "nameid-1-decoding-error",
            "Windows nameID 1 US-English record could not be decoded.",
        ),
        Some(text) if text.trim().is_empty() => Outcome::fail(
            "nameid-1-empty",
            "Windows nameID 1 US-English record is empty.",
        ),
        Some(_) => Outcome::pass("Font contains a good Windows nameID 1 US-English record."),
    };
    Ok(vec![outcome])
}

pub fn trailing_spaces() -> CheckImplementation {
    CheckImplementation::new(TRAILING_SPACES, TargetKind::Font, check_trailing_spaces)
        .with_title("Name table records must not have trailing spaces.")
        .with_inputs(&["font"])
}

fn check_trailing_spaces(args: &Args) -> Result<Vec<Outcome>> {
    let font = args.font()?;
    let mut outcomes = Vec::new();
    for record in font.name_records() {
        let Some(text) = record.decode() else {
            continue;
        };
        if text != text.trim() {
            outcomes.push(Outcome::fail(
                "trailing-space",
                format!(
                    "Name table record with key = ({}, {}, {}, {}) has trailing spaces \
                     that must be removed: '{text}'",
                    record.platform_id, record.encoding_id, record.language_id, record.name_id
                ),
            ));
        }
    }
    if outcomes.is_empty() {
        outcomes.push(Outcome::pass("No trailing spaces on name table entries."));
    }
    Ok(outcomes)
}
