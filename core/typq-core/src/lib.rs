/// typq-core: The patient inspector of font families
///
/// Like a proofreader who reads every page twice, this library walks through
/// a family's fonts and paperwork with a list of questions, and writes down
/// every answer it gets. Each answer carries a severity, so the verdict of a
/// whole run is just the worst thing anyone found.
///
/// ## Three Acts of Font Inspection
///
/// **Registration**: Meeting the inspectors
/// - Every check has a reverse-DNS id, a target kind and the inputs it needs
/// - Conditions are named helpers computed once per subject and shared
/// - Bad wiring (unknown inputs, cycles, duplicates) is refused up front
///
/// **Composition**: Deciding who gets to speak
/// - Profiles pull in other profiles, drop checks and add their own sections
/// - A profile may swap the logic behind an inherited check; the variant
///   answers to `<id>:<qualifier>` while reports keep the original id
/// - The flattened result holds every check once, in section order
///
/// **Running**: Asking the questions
/// - Fonts, the family, its directory and metadata files become subjects
/// - Subjects run in parallel; checks of one subject share a condition cache
/// - Failing conditions, errors and panics turn into ERROR outcomes instead
///   of stopping the run
///
/// ## A Sample Inspection
///
/// ```rust,no_run
/// use std::path::PathBuf;
/// use typq_core::profile::builtin_profile;
/// use typq_core::runner::{RunOptions, Runner, Targets};
///
/// let (registry, profile) = builtin_profile("adobefonts")?;
/// let targets = Targets::load(&[PathBuf::from("fonts/SourceSansPro")], None)?;
/// let report = Runner::new(&registry, &profile)
///     .with_options(RunOptions::default())
///     .run(&targets)?;
///
/// println!("verdict: {:?}", report.verdict());
/// for result in report.results() {
///     println!("  {} on {}: {:?}", result.check_id, result.target, result.worst());
/// }
/// #
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// ## The Cast of Characters
///
/// - [`check::CheckImplementation`]: One question and how to ask it
/// - [`registry::CheckRegistry`]: The roll call of checks and conditions
/// - [`profile::ProfileCatalog`]: The playbooks, ready to be flattened
/// - [`runner::Runner`]: The one who actually knocks on every door
/// - [`report::Report`]: The minutes of the meeting
///
/// ## Playground Rules
///
/// Fonts are read once through read-fonts and skrifa into plain snapshots,
/// so checks never touch the parser and tests can build fonts by hand.
///
/// ---
///
/// Crafted with care at FontLab https://www.fontlab.com/

pub mod check;
pub mod checks;
pub mod config;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod font;
pub mod metadata;
pub mod output;
pub mod profile;
pub mod profiles;
pub mod raster;
pub mod registry;
pub mod report;
pub mod resolve;
pub mod runner;
pub mod status;
pub mod tags;
pub mod testing;
