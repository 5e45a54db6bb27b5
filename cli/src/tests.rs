use super::*;
use clap::CommandFactory;
use typq_core::checks::metrics::UNITSPEREM;
use typq_core::profile::Profile;
use typq_core::testing::sample_face;

fn check_args(argv: &[&str]) -> CheckArgs {
    let mut full = vec!["typq", "check"];
    full.extend_from_slice(argv);
    let cli = Cli::try_parse_from(full).expect("parse cli");
    match cli.command {
        Command::Check(args) => args,
        other => panic!("expected check command, got {other:?}"),
    }
}

fn unitsperem_report(upm: u16) -> Report {
    let (registry, profile, filter) =
        prepare_run("opentype", &[], &["unitsperem".to_string()], &[]).expect("prepare");
    let mut face = sample_face("Cabin-Regular.ttf");
    if let Some(head) = face.head.as_mut() {
        head.units_per_em = upm;
    }
    Runner::new(&registry, &profile)
        .with_options(RunOptions {
            filter,
            ..RunOptions::default()
        })
        .run(&Targets::new().with_fonts([face]))
        .expect("run")
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn parses_check_args() {
    let args = check_args(&[
        "-p",
        "adobefonts",
        "-c",
        "whitespace",
        "-x",
        "glyphnames",
        "-j",
        "2",
        "--error-on",
        "warn",
        "--ndjson",
        "--no-rasterizer",
        "/fonts",
    ]);
    assert_eq!(args.profile.as_deref(), Some("adobefonts"));
    assert_eq!(args.checkid, vec!["whitespace"]);
    assert_eq!(args.exclude_checkid, vec!["glyphnames"]);
    assert_eq!(args.jobs, Some(2));
    assert!(args.ndjson && !args.json);
    assert!(args.no_rasterizer);
    assert_eq!(args.color, ColorChoice::Auto);
    assert_eq!(args.paths, vec![PathBuf::from("/fonts")]);
}

#[test]
fn json_and_ndjson_conflict() {
    let parse = Cli::try_parse_from(["typq", "check", "--json", "--ndjson", "/fonts"]);
    assert!(parse.is_err());
}

#[test]
fn check_requires_a_path() {
    assert!(Cli::try_parse_from(["typq", "check"]).is_err());
}

#[test]
fn verbosity_flags_are_global() {
    let cli = Cli::try_parse_from(["typq", "check", "-vv", "/fonts"]).expect("parse cli");
    assert_eq!(log_level(cli.verbose, cli.quiet), LevelFilter::Debug);

    let cli = Cli::try_parse_from(["typq", "-q", "profiles"]).expect("parse cli");
    assert_eq!(log_level(cli.verbose, cli.quiet), LevelFilter::Error);
    assert_eq!(log_level(0, false), LevelFilter::Warn);
}

#[test]
fn flags_take_precedence_over_config() {
    let args = check_args(&["-p", "opentype", "--profile-file", "cli.json", "/fonts"]);
    let config = RunConfig {
        profile: Some("adobefonts".into()),
        checkid: vec!["from-config".into()],
        exclude_checkid: vec!["dropped".into()],
        jobs: Some(3),
        error_on: Some(Severity::Warn),
        profile_files: vec![PathBuf::from("config.json")],
    };

    let settings =
        merge_settings(&args, config, vec![PathBuf::from("env.json")]).expect("settings");
    assert_eq!(settings.profile, "opentype");
    assert_eq!(settings.checkid, vec!["from-config"]);
    assert_eq!(settings.exclude_checkid, vec!["dropped"]);
    assert_eq!(settings.jobs, Some(3));
    assert_eq!(settings.error_on, Severity::Warn);
    assert_eq!(
        settings.profile_files,
        vec![
            PathBuf::from("env.json"),
            PathBuf::from("config.json"),
            PathBuf::from("cli.json")
        ]
    );
}

#[test]
fn defaults_apply_without_config() {
    let args = check_args(&["/fonts"]);
    let settings = merge_settings(&args, RunConfig::default(), Vec::new()).expect("settings");
    assert_eq!(settings.profile, DEFAULT_PROFILE);
    assert_eq!(settings.error_on, Severity::Fail);
    assert_eq!(settings.jobs, None);
}

#[test]
fn bad_error_on_and_zero_jobs_are_rejected() {
    let args = check_args(&["--error-on", "loud", "/fonts"]);
    assert!(merge_settings(&args, RunConfig::default(), Vec::new()).is_err());

    let args = check_args(&["-j", "0", "/fonts"]);
    let err = merge_settings(&args, RunConfig::default(), Vec::new()).unwrap_err();
    assert!(err.to_string().contains("jobs must be at least 1"));
}

#[test]
fn unknown_profile_is_reported_by_name() {
    let err = prepare_run("no-such-profile", &[], &[], &[]).unwrap_err();
    assert!(format!("{err:#}").contains("no-such-profile"));
}

#[test]
fn exit_status_follows_threshold() {
    let suboptimal = unitsperem_report(1500);
    assert_eq!(suboptimal.verdict(), Some(Severity::Warn));
    assert_eq!(exit_status(&suboptimal, Severity::Fail), EXIT_OK);
    assert_eq!(exit_status(&suboptimal, Severity::Warn), EXIT_FAILING);

    let broken = unitsperem_report(8);
    assert_eq!(exit_status(&broken, Severity::Fail), EXIT_FAILING);
}

#[test]
fn plain_output_lists_problems_and_summary() {
    let report = unitsperem_report(8);
    let mut buf = Vec::new();
    write_plain(&report, &mut buf, false).expect("write plain");
    let text = String::from_utf8(buf).expect("utf8");

    let first = text.lines().next().expect("first line");
    assert!(first.starts_with("FAIL "), "{text}");
    assert!(first.contains(UNITSPEREM), "{text}");
    assert!(text.contains("FAIL [out-of-range]"), "{text}");
    assert!(text.ends_with("Summary: FAIL: 1; verdict FAIL\n"), "{text}");
    assert!(!text.contains('\u{1b}'));
}

#[test]
fn plain_output_hides_pass_details() {
    let report = unitsperem_report(1000);
    let mut buf = Vec::new();
    write_plain(&report, &mut buf, true).expect("write plain");
    let text = String::from_utf8(buf).expect("utf8");

    assert_eq!(text.lines().count(), 2, "{text}");
    assert!(text.starts_with("\u{1b}[32mPASS \u{1b}[0m"), "{text}");
}

#[test]
fn summary_line_handles_empty_runs() {
    assert_eq!(
        summary_line(&BTreeMap::new(), None),
        "Summary: no checks ran; verdict none"
    );
}

#[test]
fn profile_listing_uses_variant_ids() {
    let (_, profile, _) = prepare_run("adobefonts", &[], &[], &[]).expect("prepare");
    let mut buf = Vec::new();
    write_profile(&profile, &mut buf).expect("write profile");
    let text = String::from_utf8(buf).expect("utf8");

    assert!(text.lines().any(|l| l == "Adobe Fonts Checks"), "{text}");
    assert!(
        text.contains("  com.adobe.fonts/check/freetype_rasterizer:adobefonts"),
        "{text}"
    );
}

#[test]
fn profile_list_reports_broken_profiles_and_continues() {
    let mut catalog = ProfileCatalog::builtin();
    catalog.insert(Profile::new("aaa-broken").include("missing"));
    let registry = CheckRegistry::builtin().expect("registry");

    let mut buf = Vec::new();
    write_profile_list(&catalog, &registry, &mut buf).expect("write list");
    let text = String::from_utf8(buf).expect("utf8");

    let first = text.lines().next().expect("first line");
    assert!(first.starts_with("aaa-broken (error: "), "{text}");
    assert!(first.contains("missing"), "{text}");
    for name in ["adobefonts", "googlefonts", "opentype", "universal"] {
        assert!(
            text.lines().any(|l| l.starts_with(&format!("{name} (")) && l.ends_with(" checks)")),
            "{text}"
        );
    }
}
