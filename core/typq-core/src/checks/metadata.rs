//! Checks over `METADATA.json` and the family directory.

use std::collections::BTreeSet;
use std::fs;

use anyhow::{Context, Result};

use crate::check::{CheckImplementation, TargetKind};
use crate::error::ConfigError;
use crate::registry::CheckRegistry;
use crate::resolve::{Args, INPUT_DIRECTORY, INPUT_FONTS, INPUT_METADATA};
use crate::status::Outcome;

pub const RESERVED_FONT_NAME: &str = "com.google.fonts/check/metadata/reserved_font_name";
pub const METADATA_FILENAMES: &str = "com.google.fonts/check/metadata/filenames";
pub const HAS_LICENSE: &str = "com.google.fonts/check/family/has_license";

const LICENSE_FILES: [&str; 3] = ["OFL.txt", "LICENSE.txt", "UFL.txt"];

pub(crate) fn register(registry: &mut CheckRegistry) -> Result<(), ConfigError> {
    registry.register_check(reserved_font_name())?;
    registry.register_check(metadata_filenames())?;
    registry.register_check(has_license())?;
    Ok(())
}

pub fn reserved_font_name() -> CheckImplementation {
    CheckImplementation::new(RESERVED_FONT_NAME, TargetKind::Metadata, |args| {
        let metadata = args.metadata()?;
        let mut outcomes: Vec<Outcome> = metadata
            .fonts
            .iter()
            .filter(|font| !font.copyright.contains("Reserved Font Name"))
            .map(|font| {
                Outcome::fail(
                    "lacks-rfn",
                    format!(
                        "METADATA.json copyright field of {} does not contain \
                         \"Reserved Font Name\": \"{}\"",
                        font.filename, font.copyright
                    ),
                )
            })
            .collect();
        if outcomes.is_empty() {
            outcomes.push(Outcome::pass(
                "All copyright fields in METADATA.json declare a Reserved Font Name.",
            ));
        }
        Ok(outcomes)
    })
    .with_title("Copyright notice on METADATA.json contains Reserved Font Name?")
    .with_inputs(&[INPUT_METADATA])
}

pub fn metadata_filenames() -> CheckImplementation {
    CheckImplementation::new(METADATA_FILENAMES, TargetKind::Metadata, check_filenames)
        .with_title("METADATA.json lists fonts named according to the family files?")
        .with_inputs(&[INPUT_METADATA, INPUT_FONTS])
}

/// Declared file names and loaded font file names must be the same set.
fn check_filenames(args: &Args) -> Result<Vec<Outcome>> {
    let metadata = args.metadata()?;
    let declared: BTreeSet<&str> = metadata.fonts.iter().map(|f| f.filename.as_str()).collect();
    let present: BTreeSet<String> = args
        .fonts()?
        .iter()
        .filter_map(|f| f.source.path.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .collect();

    let mut outcomes = Vec::new();
    for name in &declared {
        if !present.contains(*name) {
            outcomes.push(Outcome::fail(
                "file-not-found",
                format!("Filename \"{name}\" is listed on METADATA.json but an actual font file with that name was not found."),
            ));
        }
    }
    for name in &present {
        if !declared.contains(name.as_str()) {
            outcomes.push(Outcome::fail(
                "file-not-declared",
                format!("Filename \"{name}\" is not declared on METADATA.json as a font.filename entry."),
            ));
        }
    }
    if outcomes.is_empty() {
        outcomes.push(Outcome::pass(
            "METADATA.json font.filename entries match font files in the family.",
        ));
    }
    Ok(outcomes)
}

pub fn has_license() -> CheckImplementation {
    CheckImplementation::new(HAS_LICENSE, TargetKind::Directory, |args| {
        let directory = args.directory()?;
        let mut found = Vec::new();
        for entry in fs::read_dir(directory)
            .with_context(|| format!("listing {}", directory.display()))?
        {
            let name = entry?.file_name().to_string_lossy().to_string();
            if LICENSE_FILES.contains(&name.as_str()) {
                found.push(name);
            }
        }
        found.sort();

        let outcome = match found.as_slice() {
            [] => Outcome::fail(
                "no-license",
                format!(
                    "No license file was found. Please add one of: {}.",
                    LICENSE_FILES.join(", ")
                ),
            ),
            [single] => Outcome::pass(format!("Found license at '{single}'.")),
            many => Outcome::fail(
                "multiple",
                format!(
                    "More than a single license file found: {}",
                    many.join(", ")
                ),
            ),
        };
        Ok(vec![outcome])
    })
    .with_title("Check font has a license.")
    .with_inputs(&[INPUT_DIRECTORY])
}
