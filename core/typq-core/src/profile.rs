//! Profiles and their composition (made by FontLab https://www.fontlab.com/)
//!
//! A profile lists checks in sections, pulls in other profiles, and may
//! swap the logic behind some of the checks it inherits. Composing a profile
//! flattens all of that into one ordered list where every check id appears
//! exactly once and points at the implementation that will actually run.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::check::{CheckId, CheckImplementation, StatusOverride, TargetKind};
use crate::error::ConfigError;
use crate::profiles;
use crate::registry::CheckRegistry;
use crate::status::Severity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub checks: Vec<CheckId>,
}

/// Declarative profile definition, as written in code or in a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    /// Suffix for override variants; defaults to the profile name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    #[serde(default)]
    pub include_profiles: Vec<String>,
    #[serde(default)]
    pub exclude_checks: Vec<CheckId>,
    #[serde(default)]
    pub sections: Vec<Section>,
    /// Severity remaps keyed by the check they apply to.
    #[serde(default)]
    pub overrides: BTreeMap<CheckId, Vec<StatusOverride>>,
    /// Full replacement implementations keyed by the check they supersede.
    #[serde(skip)]
    pub replacements: BTreeMap<CheckId, Arc<CheckImplementation>>,
}

impl Profile {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("parsing profile JSON")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading profile {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("loading profile {}", path.display()))
    }

    pub fn with_qualifier(mut self, qualifier: &str) -> Self {
        self.qualifier = Some(qualifier.to_string());
        self
    }

    pub fn include(mut self, profile: &str) -> Self {
        self.include_profiles.push(profile.to_string());
        self
    }

    pub fn exclude(mut self, check: &str) -> Self {
        self.exclude_checks.push(check.to_string());
        self
    }

    pub fn section(mut self, name: &str, checks: &[&str]) -> Self {
        self.sections.push(Section {
            name: name.to_string(),
            checks: checks.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn override_status(mut self, check: &str, key: &str, status: Severity, reason: &str) -> Self {
        self.overrides
            .entry(check.to_string())
            .or_default()
            .push(StatusOverride::new(key, status, reason));
        self
    }

    /// Replace `check` with `implementation`, which must supersede it.
    pub fn replace(mut self, check: &str, implementation: CheckImplementation) -> Self {
        self.replacements
            .insert(check.to_string(), Arc::new(implementation));
        self
    }

    pub fn qualifier(&self) -> &str {
        self.qualifier.as_deref().unwrap_or(&self.name)
    }

    fn overrides_check(&self, id: &str) -> bool {
        self.overrides.contains_key(id) || self.replacements.contains_key(id)
    }
}

/// One entry of a composed profile.
#[derive(Debug, Clone)]
pub struct EffectiveCheck {
    /// The id consumers see, even when an override runs.
    pub id: CheckId,
    pub section: String,
    pub implementation: Arc<CheckImplementation>,
}

impl EffectiveCheck {
    pub fn is_overridden(&self) -> bool {
        self.implementation.id != self.id
    }

    /// Qualified id when overridden, the plain id otherwise.
    pub fn variant_id(&self) -> &str {
        &self.implementation.id
    }

    pub fn target(&self) -> TargetKind {
        self.implementation.target
    }
}

/// Flattened result of composing a profile with its includes.
#[derive(Debug, Clone)]
pub struct EffectiveProfile {
    name: String,
    qualifier: String,
    checks: Vec<EffectiveCheck>,
}

impl EffectiveProfile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    pub fn checks(&self) -> &[EffectiveCheck] {
        &self.checks
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Look a check up by its plain id or by its qualified variant id.
    pub fn get(&self, id: &str) -> Option<&EffectiveCheck> {
        self.checks
            .iter()
            .find(|check| check.id == id || check.variant_id() == id)
    }

    pub fn check_ids(&self) -> Vec<&str> {
        self.checks.iter().map(|check| check.id.as_str()).collect()
    }

    /// Every id, spelled with its qualifier where the profile overrides it.
    pub fn explicit_ids_with_overrides(&self) -> Vec<&str> {
        self.checks.iter().map(EffectiveCheck::variant_id).collect()
    }

    /// Overridden ids mapped to the variant that runs in their place.
    pub fn overridden_ids(&self) -> BTreeMap<&str, &str> {
        self.checks
            .iter()
            .filter(|check| check.is_overridden())
            .map(|check| (check.id.as_str(), check.variant_id()))
            .collect()
    }

    /// Sections in first-appearance order with their check ids.
    pub fn sections(&self) -> Vec<Section> {
        let mut sections: Vec<Section> = Vec::new();
        for check in &self.checks {
            match sections.iter_mut().find(|s| s.name == check.section) {
                Some(section) => section.checks.push(check.id.clone()),
                None => sections.push(Section {
                    name: check.section.clone(),
                    checks: vec![check.id.clone()],
                }),
            }
        }
        sections
    }

    /// Checks that run once per family rather than once per font.
    pub fn get_family_checks(&self) -> Vec<&EffectiveCheck> {
        self.checks
            .iter()
            .filter(|check| check.target() == TargetKind::Family)
            .collect()
    }
}

/// Named profiles available for composition.
#[derive(Debug, Clone, Default)]
pub struct ProfileCatalog {
    profiles: BTreeMap<String, Profile>,
}

impl ProfileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the built-in profiles.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for profile in profiles::builtin() {
            catalog.insert(profile);
        }
        catalog
    }

    /// Add or replace a profile by name.
    pub fn insert(&mut self, profile: Profile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Flatten `name` and everything it includes into an [`EffectiveProfile`].
    pub fn compose(
        &self,
        name: &str,
        registry: &CheckRegistry,
    ) -> Result<EffectiveProfile, ConfigError> {
        registry.validate()?;
        let mut visiting = Vec::new();
        let mut composed = HashMap::new();
        let checks = self.compose_inner(name, None, registry, &mut visiting, &mut composed)?;
        let profile = self.profiles.get(name).ok_or_else(|| ConfigError::UnknownProfile {
            name: name.to_string(),
            included_by: None,
        })?;
        log::debug!("composed profile `{name}` with {} checks", checks.len());
        Ok(EffectiveProfile {
            name: name.to_string(),
            qualifier: profile.qualifier().to_string(),
            checks,
        })
    }

    fn compose_inner(
        &self,
        name: &str,
        included_by: Option<&str>,
        registry: &CheckRegistry,
        visiting: &mut Vec<String>,
        composed: &mut HashMap<String, Vec<EffectiveCheck>>,
    ) -> Result<Vec<EffectiveCheck>, ConfigError> {
        if let Some(pos) = visiting.iter().position(|n| n == name) {
            let mut chain = visiting[pos..].to_vec();
            chain.push(name.to_string());
            return Err(ConfigError::IncludeCycle(chain));
        }
        if let Some(done) = composed.get(name) {
            return Ok(done.clone());
        }
        let profile = self
            .profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: name.to_string(),
                included_by: included_by.map(str::to_string),
            })?;

        visiting.push(name.to_string());
        let mut checks: Vec<EffectiveCheck> = Vec::new();

        for include in &profile.include_profiles {
            let inherited = self.compose_inner(include, Some(name), registry, visiting, composed)?;
            for entry in inherited {
                let entry = match checks.iter().find(|c| c.id == entry.id) {
                    Some(existing) if existing.is_overridden() => {
                        if entry.is_overridden()
                            && entry.variant_id() != existing.variant_id()
                            && !profile.overrides_check(&entry.id)
                        {
                            return Err(ConfigError::OverrideConflict {
                                profile: name.to_string(),
                                check: entry.id.clone(),
                                first: existing.variant_id().to_string(),
                                second: entry.variant_id().to_string(),
                            });
                        }
                        if entry.is_overridden() {
                            entry
                        } else {
                            // A plain copy never undoes an inherited variant.
                            EffectiveCheck {
                                implementation: Arc::clone(&existing.implementation),
                                ..entry
                            }
                        }
                    }
                    _ => entry,
                };
                upsert(&mut checks, entry);
            }
        }

        if !profile.exclude_checks.is_empty() {
            checks.retain(|c| !profile.exclude_checks.contains(&c.id));
        }

        for section in &profile.sections {
            for id in &section.checks {
                let base = registry.check(id).ok_or_else(|| ConfigError::UnknownCheck {
                    profile: name.to_string(),
                    section: section.name.clone(),
                    check: id.clone(),
                })?;
                let implementation = checks
                    .iter()
                    .find(|c| &c.id == id)
                    .map(|c| Arc::clone(&c.implementation))
                    .unwrap_or_else(|| Arc::clone(base));
                upsert(
                    &mut checks,
                    EffectiveCheck {
                        id: id.clone(),
                        section: section.name.clone(),
                        implementation,
                    },
                );
            }
        }

        for (id, replacement) in &profile.replacements {
            let entry = find_override_target(&mut checks, registry, name, id)?;
            if replacement.supersedes.as_deref() != Some(id.as_str()) {
                return Err(ConfigError::MismatchedOverride {
                    profile: name.to_string(),
                    check: id.clone(),
                    variant: replacement.id.clone(),
                });
            }
            registry.validate_check(replacement)?;
            entry.implementation = Arc::clone(replacement);
        }

        for (id, remaps) in &profile.overrides {
            let entry = find_override_target(&mut checks, registry, name, id)?;
            let wrapped = CheckImplementation::with_status_overrides(
                Arc::clone(&entry.implementation),
                profile.qualifier(),
                remaps,
            );
            entry.implementation = Arc::new(wrapped);
        }

        visiting.pop();
        composed.insert(name.to_string(), checks.clone());
        Ok(checks)
    }
}

fn find_override_target<'a>(
    checks: &'a mut [EffectiveCheck],
    registry: &CheckRegistry,
    profile: &str,
    id: &str,
) -> Result<&'a mut EffectiveCheck, ConfigError> {
    let unknown = || ConfigError::UnknownOverride {
        profile: profile.to_string(),
        check: id.to_string(),
    };
    if registry.check(id).is_none() {
        return Err(unknown());
    }
    checks.iter_mut().find(|c| c.id == id).ok_or_else(unknown)
}

/// Insert `entry`, moving an existing entry with the same id to the end.
fn upsert(checks: &mut Vec<EffectiveCheck>, entry: EffectiveCheck) {
    checks.retain(|c| c.id != entry.id);
    checks.push(entry);
}

/// Compose `name` against the built-in registry and catalog.
pub fn builtin_profile(name: &str) -> Result<(CheckRegistry, EffectiveProfile)> {
    let registry = CheckRegistry::builtin()?;
    let profile = ProfileCatalog::builtin().compose(name, &registry)?;
    Ok((registry, profile))
}
