//! Executing a composed profile against targets (made by FontLab https://www.fontlab.com/)
//!
//! Targets are split into subjects (each font, the family, its directory,
//! each metadata file). Subjects run in parallel; the checks of one subject
//! run in section order and share that subject's condition cache.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::check::TargetKind;
use crate::discovery::{PathDiscovery, TargetDiscovery, TargetFileKind};
use crate::filter::CheckFilter;
use crate::font::{load_faces, FontFace};
use crate::metadata::FamilyMetadata;
use crate::profile::{EffectiveCheck, EffectiveProfile};
use crate::raster::Rasterizer;
use crate::registry::CheckRegistry;
use crate::report::{CheckResult, Report};
use crate::resolve::{
    panic_message, Args, Resolution, Resolver, Value, INPUT_DIRECTORY, INPUT_FONT, INPUT_FONTS,
    INPUT_METADATA, INPUT_RASTERIZER,
};
use crate::status::Outcome;

/// The inputs of a run.
#[derive(Debug, Clone, Default)]
pub struct Targets {
    pub fonts: Vec<Arc<FontFace>>,
    pub metadata: Vec<Arc<FamilyMetadata>>,
    pub directory: Option<PathBuf>,
}

impl Targets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fonts(mut self, fonts: impl IntoIterator<Item = FontFace>) -> Self {
        self.fonts.extend(fonts.into_iter().map(Arc::new));
        self
    }

    pub fn with_metadata(mut self, metadata: FamilyMetadata) -> Self {
        self.metadata.push(Arc::new(metadata));
        self
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty() && self.metadata.is_empty() && self.directory.is_none()
    }

    /// Discover and load fonts and metadata files under `paths`.
    ///
    /// The family directory is the single directory argument when one is
    /// given, otherwise the parent shared by every font (if there is one).
    pub fn load(paths: &[PathBuf], jobs: Option<usize>) -> Result<Self> {
        let found = PathDiscovery::new(paths.iter().cloned()).discover()?;
        let font_paths: Vec<&Path> = found
            .iter()
            .filter(|t| t.kind == TargetFileKind::Font)
            .map(|t| t.path.as_path())
            .collect();

        let load_fonts = || -> Result<Vec<Vec<FontFace>>> {
            font_paths.par_iter().map(|path| load_faces(path)).collect()
        };
        let faces = if let Some(jobs) = jobs {
            let pool = ThreadPoolBuilder::new().num_threads(jobs).build()?;
            pool.install(load_fonts)?
        } else {
            load_fonts()?
        };

        let metadata = found
            .iter()
            .filter(|t| t.kind == TargetFileKind::Metadata)
            .map(|t| FamilyMetadata::load(&t.path).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        let directory = match paths {
            [single] if single.is_dir() => Some(single.clone()),
            _ => shared_parent(&font_paths),
        };

        let targets = Self {
            fonts: faces.into_iter().flatten().map(Arc::new).collect(),
            metadata,
            directory,
        };
        log::info!(
            "loaded {} font(s) and {} metadata file(s)",
            targets.fonts.len(),
            targets.metadata.len()
        );
        Ok(targets)
    }
}

fn shared_parent(paths: &[&Path]) -> Option<PathBuf> {
    let first = paths.first()?.parent()?;
    paths
        .iter()
        .all(|p| p.parent() == Some(first))
        .then(|| first.to_path_buf())
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Worker threads; `None` uses the global rayon pool.
    pub jobs: Option<usize>,
    pub filter: CheckFilter,
    /// Backend handed to checks asking for `rasterizer`; `None` means unavailable.
    pub rasterizer: Option<Arc<dyn Rasterizer>>,
}

/// One thing checks run against, with the inputs it provides.
#[derive(Clone)]
struct Subject {
    kind: TargetKind,
    identity: String,
    provided: Args,
}

fn subjects(targets: &Targets, rasterizer: &Option<Arc<dyn Rasterizer>>) -> Vec<Subject> {
    let fonts: Value = Arc::new(targets.fonts.clone());
    let rasterizer: Value = Arc::new(rasterizer.clone());
    let directory: Option<Value> = targets
        .directory
        .clone()
        .map(|dir| Arc::new(dir) as Value);

    let base = |mut args: Args| {
        args.insert(INPUT_FONTS, Arc::clone(&fonts));
        args.insert(INPUT_RASTERIZER, Arc::clone(&rasterizer));
        if let Some(dir) = &directory {
            args.insert(INPUT_DIRECTORY, Arc::clone(dir));
        }
        args
    };

    let mut subjects = Vec::new();
    for font in &targets.fonts {
        let mut args = Args::new();
        args.insert(INPUT_FONT, Arc::new(Arc::clone(font)));
        subjects.push(Subject {
            kind: TargetKind::Font,
            identity: font.identity(),
            provided: base(args),
        });
    }

    if !targets.fonts.is_empty() {
        let identity = match &targets.directory {
            Some(dir) => dir.display().to_string(),
            None => format!("family of {} font(s)", targets.fonts.len()),
        };
        subjects.push(Subject {
            kind: TargetKind::Family,
            identity,
            provided: base(Args::new()),
        });
    }

    if let Some(dir) = &targets.directory {
        subjects.push(Subject {
            kind: TargetKind::Directory,
            identity: dir.display().to_string(),
            provided: base(Args::new()),
        });
    }

    for metadata in &targets.metadata {
        let mut args = Args::new();
        args.insert(INPUT_METADATA, Arc::new(Arc::clone(metadata)));
        subjects.push(Subject {
            kind: TargetKind::Metadata,
            identity: metadata.identity(),
            provided: base(args),
        });
    }

    subjects
}

/// Runs the checks of an [`EffectiveProfile`].
pub struct Runner<'a> {
    registry: &'a CheckRegistry,
    profile: &'a EffectiveProfile,
    options: RunOptions,
}

impl<'a> Runner<'a> {
    pub fn new(registry: &'a CheckRegistry, profile: &'a EffectiveProfile) -> Self {
        Self {
            registry,
            profile,
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Checks of `kind` that survive the id filter, in section order.
    pub fn applicable(&self, kind: TargetKind) -> Vec<&'a EffectiveCheck> {
        self.profile
            .checks()
            .iter()
            .filter(|c| c.target() == kind)
            .filter(|c| self.options.filter.matches(&c.id, c.variant_id()))
            .collect()
    }

    pub fn run(&self, targets: &Targets) -> Result<Report> {
        let subjects = subjects(targets, &self.options.rasterizer);
        log::info!(
            "running profile `{}` over {} subject(s)",
            self.profile.name(),
            subjects.len()
        );

        let run_all = || -> Vec<Vec<CheckResult>> {
            subjects
                .par_iter()
                .map(|subject| {
                    let checks = self.applicable(subject.kind);
                    self.run_subject(subject, &checks)
                })
                .collect()
        };
        let per_subject = if let Some(jobs) = self.options.jobs {
            let pool = ThreadPoolBuilder::new().num_threads(jobs).build()?;
            pool.install(run_all)
        } else {
            run_all()
        };

        let report = Report::new(
            self.profile.name(),
            per_subject.into_iter().flatten().collect(),
        );
        log::info!("run finished with verdict {:?}", report.verdict());
        Ok(report)
    }

    /// Run a single composed check over every subject of its kind.
    pub fn run_check(&self, check: &EffectiveCheck, targets: &Targets) -> Vec<CheckResult> {
        subjects(targets, &self.options.rasterizer)
            .iter()
            .filter(|subject| subject.kind == check.target())
            .flat_map(|subject| self.run_subject(subject, &[check]))
            .collect()
    }

    fn run_subject(&self, subject: &Subject, checks: &[&EffectiveCheck]) -> Vec<CheckResult> {
        let mut resolver = Resolver::new(self.registry, subject.provided.clone());
        checks
            .iter()
            .map(|check| CheckResult {
                check_id: check.id.clone(),
                variant: check.is_overridden().then(|| check.variant_id().to_string()),
                section: check.section.clone(),
                target: subject.identity.clone(),
                outcomes: execute(check, &mut resolver),
            })
            .collect()
    }
}

fn execute(check: &EffectiveCheck, resolver: &mut Resolver) -> Vec<Outcome> {
    let implementation = &check.implementation;
    match resolver.resolve(implementation) {
        Err(err) => {
            log::warn!("{}: {err:#}", check.id);
            vec![Outcome::error("failed-condition", format!("{err:#}"))]
        }
        Ok(Resolution::Skip(signal)) => vec![Outcome::skip(signal.key, signal.reason)],
        Ok(Resolution::Ready(args)) => {
            match catch_unwind(AssertUnwindSafe(|| implementation.evaluate(&args))) {
                Ok(Ok(outcomes)) => outcomes,
                Ok(Err(err)) => {
                    log::warn!("{} failed: {err:#}", check.variant_id());
                    vec![Outcome::error(
                        "failed-check",
                        format!("Failed with {err:#}"),
                    )]
                }
                Err(payload) => {
                    let message = panic_message(payload);
                    log::warn!("{} panicked: {message}", check.variant_id());
                    vec![Outcome::error(
                        "failed-check",
                        format!("Check panicked: {message}"),
                    )]
                }
            }
        }
    }
}
