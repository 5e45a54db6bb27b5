//! Finding check targets on disk (made by FontLab https://www.fontlab.com/)

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use walkdir::WalkDir;

use crate::metadata::METADATA_FILE_NAME;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFileKind {
    Font,
    Metadata,
}

/// Path to a candidate target file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRef {
    pub path: PathBuf,
    pub kind: TargetFileKind,
}

/// Trait for enumerating targets from some backing store.
pub trait TargetDiscovery {
    fn discover(&self) -> Result<Vec<TargetRef>>;
}

/// Recursive filesystem walker that collects fonts and family metadata files.
#[derive(Debug, Clone)]
pub struct PathDiscovery {
    roots: Vec<PathBuf>,
    follow_symlinks: bool,
}

impl PathDiscovery {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let roots = roots.into_iter().map(Into::into).collect();
        Self {
            roots,
            follow_symlinks: false,
        }
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

impl TargetDiscovery for PathDiscovery {
    fn discover(&self) -> Result<Vec<TargetRef>> {
        let mut found = Vec::new();

        for root in &self.roots {
            if !root.exists() {
                return Err(anyhow!("root path does not exist: {}", root.display()));
            }

            for entry in WalkDir::new(root)
                .follow_links(self.follow_symlinks)
                .sort_by_file_name()
            {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Some(kind) = classify(entry.path()) {
                    found.push(TargetRef {
                        path: entry.path().to_path_buf(),
                        kind,
                    });
                }
            }
        }

        found.dedup();
        Ok(found)
    }
}

fn classify(path: &Path) -> Option<TargetFileKind> {
    if is_font(path) {
        Some(TargetFileKind::Font)
    } else if path.file_name().and_then(|n| n.to_str()) == Some(METADATA_FILE_NAME) {
        Some(TargetFileKind::Metadata)
    } else {
        None
    }
}

fn is_font(path: &Path) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return false,
    };

    matches!(ext.as_str(), "ttf" | "otf" | "ttc" | "otc")
}
