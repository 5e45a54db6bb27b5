//! Family metadata files (`METADATA.json`) (made by FontLab https://www.fontlab.com/)

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File name the discovery step looks for next to the fonts.
pub const METADATA_FILE_NAME: &str = "METADATA.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontMetadata {
    pub filename: String,
    #[serde(default)]
    pub post_script_name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub weight: u16,
    #[serde(default)]
    pub copyright: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyMetadata {
    pub name: String,
    #[serde(default)]
    pub designer: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub fonts: Vec<FontMetadata>,
    /// Where the metadata was read from.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl FamilyMetadata {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("parsing family metadata")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading metadata {}", path.display()))?;
        let mut metadata =
            Self::from_json(&raw).with_context(|| format!("loading {}", path.display()))?;
        metadata.source = Some(path.to_path_buf());
        Ok(metadata)
    }

    pub fn identity(&self) -> String {
        match &self.source {
            Some(path) => path.display().to_string(),
            None => format!("{METADATA_FILE_NAME} ({})", self.name),
        }
    }
}
