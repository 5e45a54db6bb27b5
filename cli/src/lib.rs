//! typq CLI (made by FontLab https://www.fontlab.com/)

pub mod server;

use std::collections::BTreeMap;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use log::LevelFilter;

use typq_core::config::{load_catalog, profile_paths_from_env, RunConfig};
use typq_core::filter::CheckFilter;
use typq_core::output::{write_json_pretty, write_ndjson};
use typq_core::profile::{EffectiveProfile, ProfileCatalog};
use typq_core::raster::{OutlineRasterizer, Rasterizer};
use typq_core::registry::CheckRegistry;
use typq_core::report::Report;
use typq_core::runner::{RunOptions, Runner, Targets};
use typq_core::status::Severity;

/// Profile used when neither the command line nor a config file names one.
pub const DEFAULT_PROFILE: &str = "universal";

/// No outcome reached the `--error-on` threshold.
pub const EXIT_OK: i32 = 0;
/// At least one outcome reached the threshold.
pub const EXIT_FAILING: i32 = 1;
/// The run could not be set up or finished.
pub const EXIT_FATAL: i32 = 2;

/// CLI entrypoint for typq.
#[derive(Debug, Parser)]
#[command(
    name = "typq",
    about = "Font quality checks driven by composable profiles (made by FontLab https://www.fontlab.com/)"
)]
pub struct Cli {
    /// Log more (repeat for debug output)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the checks of a profile over fonts, families and metadata files
    Check(CheckArgs),
    /// List profiles, or the sections and checks of one profile
    Profiles(ProfilesArgs),
    /// Serve checks over HTTP
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Font files, METADATA.json files or directories holding them
    #[arg(value_hint = ValueHint::AnyPath, required = true)]
    paths: Vec<PathBuf>,

    /// Profile to run (defaults to `universal`)
    #[arg(short = 'p', long = "profile")]
    profile: Option<String>,

    /// Extra profile JSON files to add to the catalog
    #[arg(long = "profile-file", value_hint = ValueHint::FilePath)]
    profile_files: Vec<PathBuf>,

    /// Only run checks whose id matches one of these regexes
    #[arg(short = 'c', long = "checkid", value_hint = ValueHint::Other)]
    checkid: Vec<String>,

    /// Skip checks whose id matches one of these regexes
    #[arg(short = 'x', long = "exclude-checkid", value_hint = ValueHint::Other)]
    exclude_checkid: Vec<String>,

    /// Worker threads for loading fonts and running checks
    #[arg(short = 'j', long = "jobs")]
    jobs: Option<usize>,

    /// Lowest severity that makes the exit status non-zero (default FAIL)
    #[arg(long = "error-on", value_name = "SEVERITY")]
    error_on: Option<String>,

    /// JSON run configuration; command-line flags take precedence
    #[arg(long = "config", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Run without a rasterizer backend
    #[arg(long = "no-rasterizer", action = ArgAction::SetTrue)]
    no_rasterizer: bool,

    /// Emit a single JSON document
    #[arg(long = "json", action = ArgAction::SetTrue, conflicts_with = "ndjson")]
    json: bool,

    /// Emit one JSON check result per line
    #[arg(long = "ndjson", action = ArgAction::SetTrue)]
    ndjson: bool,

    /// Control colorized output (auto|always|never)
    #[arg(long = "color", default_value_t = ColorChoice::Auto, value_enum)]
    color: ColorChoice,
}

#[derive(Debug, Args)]
struct ProfilesArgs {
    /// Show the composed checks of this profile
    name: Option<String>,

    /// Extra profile JSON files to add to the catalog
    #[arg(long = "profile-file", value_hint = ValueHint::FilePath)]
    profile_files: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long = "bind", default_value = "127.0.0.1:8765")]
    bind: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

/// Effective settings of a check run after merging flags, config and environment.
#[derive(Debug, Clone, PartialEq)]
struct RunSettings {
    profile: String,
    profile_files: Vec<PathBuf>,
    checkid: Vec<String>,
    exclude_checkid: Vec<String>,
    jobs: Option<usize>,
    error_on: Severity,
}

/// Parse CLI args, execute the selected command and return the exit status.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Check(args) => run_check(args),
        Command::Profiles(args) => run_profiles(args).map(|_| EXIT_OK),
        Command::Serve(args) => run_serve(args).map(|_| EXIT_OK),
    }
}

fn log_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// `RUST_LOG` refines the level picked by `-v`/`-q`.
fn init_logging(verbose: u8, quiet: bool) {
    let _ = env_logger::Builder::new()
        .filter_level(log_level(verbose, quiet))
        .parse_default_env()
        .try_init();
}

fn run_check(args: CheckArgs) -> Result<i32> {
    let config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    let settings = merge_settings(&args, config, profile_paths_from_env()?)?;
    let (registry, profile, filter) = prepare_run(
        &settings.profile,
        &settings.profile_files,
        &settings.checkid,
        &settings.exclude_checkid,
    )?;

    let targets = Targets::load(&args.paths, settings.jobs)?;
    if targets.is_empty() {
        return Err(anyhow!("nothing to check under the given paths"));
    }
    log::info!(
        "checking {} fonts and {} metadata files with `{}`",
        targets.fonts.len(),
        targets.metadata.len(),
        profile.name()
    );

    let rasterizer: Option<Arc<dyn Rasterizer>> = if args.no_rasterizer {
        None
    } else {
        Some(Arc::new(OutlineRasterizer::default()))
    };
    let report = Runner::new(&registry, &profile)
        .with_options(RunOptions {
            jobs: settings.jobs,
            filter,
            rasterizer,
        })
        .run(&targets)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let use_color = match args.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => handle.is_terminal(),
    };

    if args.ndjson {
        write_ndjson(&report, &mut handle)?;
    } else if args.json {
        write_json_pretty(&report, &mut handle)?;
    } else {
        write_plain(&report, &mut handle, use_color)?;
    }

    Ok(exit_status(&report, settings.error_on))
}

fn merge_settings(args: &CheckArgs, config: RunConfig, env_files: Vec<PathBuf>) -> Result<RunSettings> {
    let error_on = match &args.error_on {
        Some(raw) => raw.parse::<Severity>()?,
        None => config.error_on.unwrap_or(Severity::Fail),
    };
    let jobs = args.jobs.or(config.jobs);
    if matches!(jobs, Some(0)) {
        return Err(anyhow!("jobs must be at least 1 when provided"));
    }

    // Later files replace earlier profiles of the same name.
    let mut profile_files = env_files;
    profile_files.extend(config.profile_files);
    profile_files.extend(args.profile_files.iter().cloned());

    Ok(RunSettings {
        profile: args
            .profile
            .clone()
            .or(config.profile)
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string()),
        profile_files,
        checkid: prefer_flags(&args.checkid, config.checkid),
        exclude_checkid: prefer_flags(&args.exclude_checkid, config.exclude_checkid),
        jobs,
        error_on,
    })
}

fn prefer_flags(flags: &[String], configured: Vec<String>) -> Vec<String> {
    if flags.is_empty() {
        configured
    } else {
        flags.to_vec()
    }
}

/// Build the registry, compose `profile` and compile the id filters.
pub(crate) fn prepare_run(
    profile: &str,
    profile_files: &[PathBuf],
    checkid: &[String],
    exclude_checkid: &[String],
) -> Result<(CheckRegistry, EffectiveProfile, CheckFilter)> {
    let registry = CheckRegistry::builtin()?;
    let catalog = load_catalog(profile_files)?;
    let composed = catalog
        .compose(profile, &registry)
        .with_context(|| format!("composing profile `{profile}`"))?;
    let filter = CheckFilter::from_patterns(checkid, exclude_checkid)?;
    Ok((registry, composed, filter))
}

fn exit_status(report: &Report, threshold: Severity) -> i32 {
    if report.is_failing(threshold) {
        EXIT_FAILING
    } else {
        EXIT_OK
    }
}

fn run_profiles(args: ProfilesArgs) -> Result<()> {
    let mut files = profile_paths_from_env()?;
    files.extend(args.profile_files);
    let catalog = load_catalog(&files)?;
    let registry = CheckRegistry::builtin()?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match args.name {
        None => write_profile_list(&catalog, &registry, &mut handle)?,
        Some(name) => {
            let composed = catalog
                .compose(&name, &registry)
                .with_context(|| format!("composing profile `{name}`"))?;
            write_profile(&composed, &mut handle)?;
        }
    }
    Ok(())
}

/// One line per profile; a profile that fails to compose reports its error in place.
fn write_profile_list(
    catalog: &ProfileCatalog,
    registry: &CheckRegistry,
    mut w: impl Write,
) -> Result<()> {
    for name in catalog.names() {
        match catalog.compose(name, registry) {
            Ok(composed) => writeln!(w, "{name} ({} checks)", composed.len())?,
            Err(err) => {
                log::warn!("profile `{name}` does not compose: {err}");
                writeln!(w, "{name} (error: {err})")?;
            }
        }
    }
    Ok(())
}

fn write_profile(profile: &EffectiveProfile, mut w: impl Write) -> Result<()> {
    for section in profile.sections() {
        writeln!(w, "{}", section.name)?;
        for id in &section.checks {
            let shown = profile.get(id).map(|c| c.variant_id()).unwrap_or(id.as_str());
            writeln!(w, "  {shown}")?;
        }
    }
    Ok(())
}

fn run_serve(args: ServeArgs) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    log::info!("serving on {}", args.bind);
    runtime.block_on(server::serve(&args.bind))
}

fn write_plain(report: &Report, mut w: impl Write, color: bool) -> Result<()> {
    for result in report.results() {
        let Some(worst) = result.worst() else {
            continue;
        };
        let label = apply_color(&format!("{:<5}", worst.as_str()), color, severity_color(worst));
        let id = result.variant.as_deref().unwrap_or(&result.check_id);
        writeln!(w, "{label} {id} [{}]", result.target)?;

        for outcome in &result.outcomes {
            if outcome.severity <= Severity::Pass {
                continue;
            }
            let sev = apply_color(outcome.severity.as_str(), color, severity_color(outcome.severity));
            match &outcome.key {
                Some(key) => writeln!(w, "      {sev} [{key}] {}", outcome.message)?,
                None => writeln!(w, "      {sev} {}", outcome.message)?,
            }
        }
    }

    writeln!(w, "{}", summary_line(&report.summary(), report.verdict()))?;
    Ok(())
}

fn summary_line(summary: &BTreeMap<Severity, usize>, verdict: Option<Severity>) -> String {
    let counts: Vec<String> = summary
        .iter()
        .map(|(severity, count)| format!("{severity}: {count}"))
        .collect();
    let verdict = verdict.map(Severity::as_str).unwrap_or("none");
    if counts.is_empty() {
        format!("Summary: no checks ran; verdict {verdict}")
    } else {
        format!("Summary: {}; verdict {verdict}", counts.join(", "))
    }
}

#[derive(Copy, Clone)]
enum AnsiColor {
    Red,
    Yellow,
    Green,
    Cyan,
}

fn severity_color(severity: Severity) -> AnsiColor {
    match severity {
        Severity::Fail | Severity::Error => AnsiColor::Red,
        Severity::Warn => AnsiColor::Yellow,
        Severity::Pass => AnsiColor::Green,
        Severity::Debug | Severity::Info | Severity::Skip => AnsiColor::Cyan,
    }
}

fn apply_color(text: &str, color: bool, code: AnsiColor) -> String {
    if !color {
        return text.to_string();
    }

    let code_str = match code {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
        AnsiColor::Green => "32",
        AnsiColor::Cyan => "36",
    };

    format!("\u{1b}[{}m{}\u{1b}[0m", code_str, text)
}

#[cfg(test)]
mod tests;
