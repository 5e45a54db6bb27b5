//! Check implementations and their profile-specific variants
//! (made by FontLab https://www.fontlab.com/)

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::resolve::Args;
use crate::status::{Outcome, Severity};

/// Globally unique, reverse-DNS style check identifier.
pub type CheckId = String;

/// Predicate body. Returns every outcome the check yields for one invocation.
pub type CheckFn = Arc<dyn Fn(&Args) -> Result<Vec<Outcome>> + Send + Sync>;

/// What a check runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// One face at a time.
    Font,
    /// All faces of the family together.
    Family,
    /// The directory the family lives in.
    Directory,
    /// A `METADATA.json` family metadata file.
    Metadata,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Font => "font",
            TargetKind::Family => "family",
            TargetKind::Directory => "directory",
            TargetKind::Metadata => "metadata",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `<id>:<qualifier>`, the address of a profile's variant of `id`.
pub fn qualified_id(id: &str, qualifier: &str) -> CheckId {
    format!("{id}:{qualifier}")
}

/// Split `"not is_cff"` into `("is_cff", true)`.
pub fn split_condition(raw: &str) -> (&str, bool) {
    match raw.trim().strip_prefix("not ") {
        Some(name) => (name.trim(), true),
        None => (raw.trim(), false),
    }
}

/// Declarative severity remap for outcomes carrying `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOverride {
    pub key: String,
    pub status: Severity,
    #[serde(default)]
    pub reason: String,
}

impl StatusOverride {
    pub fn new(key: &str, status: Severity, reason: &str) -> Self {
        Self {
            key: key.to_string(),
            status,
            reason: reason.to_string(),
        }
    }
}

/// A registered check. Built once and shared behind `Arc`; never mutated per run.
#[derive(Clone)]
pub struct CheckImplementation {
    pub id: CheckId,
    pub title: String,
    pub target: TargetKind,
    /// Names resolved by the resolver and handed to the predicate.
    pub inputs: Vec<String>,
    /// Boolean conditions gating the check, optionally prefixed with `not `.
    pub conditions: Vec<String>,
    pub tags: Vec<String>,
    /// Base check this implementation replaces inside a profile.
    pub supersedes: Option<CheckId>,
    predicate: CheckFn,
}

impl CheckImplementation {
    pub fn new<F>(id: &str, target: TargetKind, predicate: F) -> Self
    where
        F: Fn(&Args) -> Result<Vec<Outcome>> + Send + Sync + 'static,
    {
        Self {
            id: id.to_string(),
            title: String::new(),
            target,
            inputs: Vec::new(),
            conditions: Vec::new(),
            tags: Vec::new(),
            supersedes: None,
            predicate: Arc::new(predicate),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_inputs(mut self, inputs: &[&str]) -> Self {
        self.inputs = inputs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_conditions(mut self, conditions: &[&str]) -> Self {
        self.conditions = conditions.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|s| s.to_string()).collect();
        self
    }

    /// A variant of `base` with new logic, addressed as `<base>:<qualifier>`.
    ///
    /// Inputs, conditions and target are inherited; the variant always
    /// supersedes the original base id, even when `base` is itself a variant.
    pub fn overriding<F>(base: &CheckImplementation, qualifier: &str, predicate: F) -> Self
    where
        F: Fn(&Args) -> Result<Vec<Outcome>> + Send + Sync + 'static,
    {
        let base_id = base.base_id().to_string();
        Self {
            id: qualified_id(&base_id, qualifier),
            title: base.title.clone(),
            target: base.target,
            inputs: base.inputs.clone(),
            conditions: base.conditions.clone(),
            tags: base.tags.clone(),
            supersedes: Some(base_id),
            predicate: Arc::new(predicate),
        }
    }

    /// Wrap `base` so outcomes whose key matches a remap take its severity.
    pub fn with_status_overrides(
        base: Arc<CheckImplementation>,
        qualifier: &str,
        remaps: &[StatusOverride],
    ) -> Self {
        let remaps = remaps.to_vec();
        let inner = Arc::clone(&base);
        Self::overriding(&base, qualifier, move |args| {
            let outcomes = inner.evaluate(args)?;
            Ok(apply_status_overrides(outcomes, &remaps))
        })
    }

    /// The id this implementation answers to in reports.
    pub fn base_id(&self) -> &str {
        self.supersedes.as_deref().unwrap_or(&self.id)
    }

    pub fn is_override(&self) -> bool {
        self.supersedes.is_some()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn evaluate(&self, args: &Args) -> Result<Vec<Outcome>> {
        (self.predicate)(args)
    }
}

impl fmt::Debug for CheckImplementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckImplementation")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("inputs", &self.inputs)
            .field("conditions", &self.conditions)
            .field("tags", &self.tags)
            .field("supersedes", &self.supersedes)
            .finish_non_exhaustive()
    }
}

fn apply_status_overrides(outcomes: Vec<Outcome>, remaps: &[StatusOverride]) -> Vec<Outcome> {
    outcomes
        .into_iter()
        .map(|mut outcome| {
            if let Some(remap) = remaps.iter().find(|r| outcome.has_key(&r.key)) {
                outcome.severity = remap.status;
                if !remap.reason.is_empty() {
                    outcome.override_reason = Some(remap.reason.clone());
                }
            }
            outcome
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always_fails() -> CheckImplementation {
        CheckImplementation::new("com.example/check/a", TargetKind::Font, |_| {
            Ok(vec![
                Outcome::fail("bad-thing", "bad"),
                Outcome::fail("other-thing", "other"),
            ])
        })
        .with_inputs(&["font"])
        .with_conditions(&["not is_cff"])
    }

    #[test]
    fn splits_negated_conditions() {
        assert_eq!(split_condition("not is_cff"), ("is_cff", true));
        assert_eq!(split_condition("is_ttf"), ("is_ttf", false));
    }

    #[test]
    fn override_keeps_metadata_and_supersedes_base() {
        let base = always_fails();
        let variant = CheckImplementation::overriding(&base, "vendor", |_| Ok(vec![]));
        assert_eq!(variant.id, "com.example/check/a:vendor");
        assert_eq!(variant.base_id(), "com.example/check/a");
        assert_eq!(variant.inputs, base.inputs);
        assert_eq!(variant.conditions, base.conditions);

        let again = CheckImplementation::overriding(&variant, "outer", |_| Ok(vec![]));
        assert_eq!(again.supersedes.as_deref(), Some("com.example/check/a"));
    }

    #[test]
    fn status_override_remaps_only_matching_keys() {
        let wrapped = CheckImplementation::with_status_overrides(
            Arc::new(always_fails()),
            "vendor",
            &[StatusOverride::new("bad-thing", Severity::Warn, "tolerated")],
        );
        let outcomes = wrapped.evaluate(&Args::new()).unwrap();
        assert_eq!(outcomes[0].severity, Severity::Warn);
        assert_eq!(outcomes[0].override_reason.as_deref(), Some("tolerated"));
        assert_eq!(outcomes[1].severity, Severity::Fail);
        assert_eq!(outcomes[1].override_reason, None);
    }
}
