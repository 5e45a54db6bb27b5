/// Profile composition, seen from the outside
///
/// Built-in profiles must flatten the same way every time, keep overridden
/// checks under their original ids, and refuse wiring mistakes before a
/// single font is opened.
use typq_core::check::{qualified_id, CheckImplementation, TargetKind};
use typq_core::checks::{family, glyphs, metrics, render};
use typq_core::error::ConfigError;
use typq_core::profile::{Profile, ProfileCatalog};
use typq_core::registry::CheckRegistry;
use typq_core::resolve::Condition;
use typq_core::status::{Outcome, Severity};

fn builtin() -> (CheckRegistry, ProfileCatalog) {
    (
        CheckRegistry::builtin().expect("registry"),
        ProfileCatalog::builtin(),
    )
}

#[test]
fn composition_is_idempotent_for_every_builtin_profile() {
    let (registry, catalog) = builtin();
    for name in catalog.names() {
        let first = catalog.compose(name, &registry).expect("compose");
        let second = catalog.compose(name, &registry).expect("compose again");
        assert_eq!(first.check_ids(), second.check_ids(), "{name}");
        assert_eq!(
            first.explicit_ids_with_overrides(),
            second.explicit_ids_with_overrides(),
            "{name}"
        );
    }
}

#[test]
fn every_check_appears_once() {
    let (registry, catalog) = builtin();
    let profile = catalog.compose("googlefonts", &registry).expect("compose");
    let mut ids = profile.check_ids();
    let total = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), total);
}

#[test]
fn family_checks_are_a_subset_of_family_kind() {
    let (registry, catalog) = builtin();
    for name in catalog.names() {
        let profile = catalog.compose(name, &registry).expect("compose");
        for check in profile.get_family_checks() {
            assert_eq!(check.target(), TargetKind::Family);
            assert!(profile.get(&check.id).is_some());
        }
    }
}

#[test]
fn adobefonts_explicit_ids_spell_out_overrides() {
    let (registry, catalog) = builtin();
    let profile = catalog.compose("adobefonts", &registry).expect("compose");
    let explicit = profile.explicit_ids_with_overrides();

    for id in [glyphs::WHITESPACE_GLYPHS, glyphs::VALID_GLYPHNAMES, render::FREETYPE_RASTERIZER] {
        let variant = qualified_id(id, "adobefonts");
        assert!(explicit.contains(&variant.as_str()), "{variant}");
        assert!(!explicit.contains(&id));
        assert_eq!(profile.get(&variant).expect("variant").id, id);
    }
    assert!(explicit.contains(&family::CONSISTENT_UPM));
    assert!(!explicit.contains(&metrics::WIN_ASCENT_AND_DESCENT));
    assert_eq!(explicit.len(), profile.len());
}

#[test]
fn user_profile_can_build_on_adobefonts() {
    let (registry, mut catalog) = builtin();
    catalog.insert(
        Profile::new("house")
            .include("adobefonts")
            .section("House", &[metrics::LINEGAPS]),
    );
    let profile = catalog.compose("house", &registry).expect("compose");
    // Inherited variants survive a plain include.
    assert_eq!(
        profile.get(glyphs::WHITESPACE_GLYPHS).expect("check").variant_id(),
        qualified_id(glyphs::WHITESPACE_GLYPHS, "adobefonts")
    );
    assert_eq!(profile.get(metrics::LINEGAPS).expect("check").section, "House");
}

#[test]
fn two_vendors_overriding_one_check_conflict() {
    let (registry, mut catalog) = builtin();
    let relaxed = CheckImplementation::overriding(
        registry.check(render::FREETYPE_RASTERIZER).expect("base"),
        "relaxed",
        |_| Ok(vec![Outcome::info("relaxed", "Rendering is not required here.")]),
    );
    catalog.insert(
        Profile::new("relaxed")
            .include("universal")
            .replace(render::FREETYPE_RASTERIZER, relaxed),
    );
    catalog.insert(Profile::new("both").include("adobefonts").include("relaxed"));

    let err = catalog.compose("both", &registry).unwrap_err();
    assert!(matches!(err, ConfigError::OverrideConflict { .. }), "{err}");

    // Resolving it in the including profile is accepted.
    catalog.insert(
        Profile::new("both")
            .include("adobefonts")
            .include("relaxed")
            .override_status(render::FREETYPE_RASTERIZER, "relaxed", Severity::Pass, "decided"),
    );
    let profile = catalog.compose("both", &registry).expect("resolved");
    assert_eq!(
        profile.get(render::FREETYPE_RASTERIZER).expect("check").variant_id(),
        qualified_id(render::FREETYPE_RASTERIZER, "both")
    );
}

#[test]
fn overriding_an_excluded_check_is_rejected() {
    let (registry, mut catalog) = builtin();
    catalog.insert(
        Profile::new("odd")
            .include("adobefonts")
            .override_status(metrics::WIN_ASCENT_AND_DESCENT, "ascent", Severity::Warn, ""),
    );
    let err = catalog.compose("odd", &registry).unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnknownOverride {
            profile: "odd".into(),
            check: metrics::WIN_ASCENT_AND_DESCENT.into(),
        }
    );
}

fn gated_registry(conditions: &[(&str, &[&str])], gate: &str) -> CheckRegistry {
    let mut registry = CheckRegistry::new();
    for (name, inputs) in conditions {
        registry
            .register_condition(Condition::new(name, inputs, |_| Ok(None)))
            .expect("condition");
    }
    registry
        .register_check(
            CheckImplementation::new("x/gated", TargetKind::Font, |_| {
                Ok(vec![Outcome::pass("ran")])
            })
            .with_inputs(&["font"])
            .with_conditions(&[gate]),
        )
        .expect("check");
    registry
}

fn gated_catalog() -> ProfileCatalog {
    let mut catalog = ProfileCatalog::new();
    catalog.insert(Profile::new("gated").section("Gated", &["x/gated"]));
    catalog
}

#[test]
fn composing_over_a_cyclic_registry_fails_fast() {
    let registry = gated_registry(&[("x", &["y"]), ("y", &["x"])], "x");
    let err = gated_catalog().compose("gated", &registry).unwrap_err();
    assert!(
        matches!(&err, ConfigError::ConditionCycle(chain) if chain.len() == 3),
        "{err:?}"
    );
}

#[test]
fn composing_with_an_unknown_condition_fails_fast() {
    let registry = gated_registry(&[], "ghost");
    let err = gated_catalog().compose("gated", &registry).unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnknownInput {
            owner: "x/gated".into(),
            name: "ghost".into(),
        }
    );
}
