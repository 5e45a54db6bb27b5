//! Run configuration files and environment overrides
//! (made by FontLab https://www.fontlab.com/)

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::profile::{Profile, ProfileCatalog};
use crate::status::Severity;

/// Colon/semicolon separated list of extra profile JSON files.
pub const PROFILE_PATH_ENV: &str = "TYPQ_PROFILE_PATH";

/// Settings read from `--config <file>`. Command-line flags win over these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub profile: Option<String>,
    pub checkid: Vec<String>,
    pub exclude_checkid: Vec<String>,
    pub jobs: Option<usize>,
    pub error_on: Option<Severity>,
    pub profile_files: Vec<PathBuf>,
}

impl RunConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("parsing run configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("loading config {}", path.display()))
    }
}

/// Split a `TYPQ_PROFILE_PATH` style value into paths.
pub fn split_profile_path(raw: &str) -> Vec<PathBuf> {
    raw.split([':', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Profile files named by `TYPQ_PROFILE_PATH`; they must exist when it is set.
pub fn profile_paths_from_env() -> Result<Vec<PathBuf>> {
    let Ok(raw) = env::var(PROFILE_PATH_ENV) else {
        return Ok(Vec::new());
    };
    let paths = split_profile_path(&raw);
    if let Some(missing) = paths.iter().find(|p| !p.exists()) {
        return Err(anyhow!(
            "{PROFILE_PATH_ENV} names a missing file: {}",
            missing.display()
        ));
    }
    Ok(paths)
}

/// Built-in profiles plus the JSON profiles in `extra`, later files replacing
/// earlier profiles of the same name.
pub fn load_catalog(extra: &[PathBuf]) -> Result<ProfileCatalog> {
    let mut catalog = ProfileCatalog::builtin();
    for path in extra {
        let profile = Profile::from_path(path)?;
        log::debug!("loaded profile `{}` from {}", profile.name, path.display());
        catalog.insert(profile);
    }
    Ok(catalog)
}
