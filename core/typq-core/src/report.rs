//! Run reports (made by FontLab https://www.fontlab.com/)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::check::CheckId;
use crate::status::{worst, Outcome, Severity};

/// Everything one check yielded for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_id: CheckId,
    /// Qualified id of the override that actually ran, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<CheckId>,
    pub section: String,
    pub target: String,
    pub outcomes: Vec<Outcome>,
}

impl CheckResult {
    pub fn worst(&self) -> Option<Severity> {
        worst(&self.outcomes)
    }
}

/// Results of a finished run, in subject then section order. Read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    profile: String,
    results: Vec<CheckResult>,
}

impl Report {
    pub(crate) fn new(profile: &str, results: Vec<CheckResult>) -> Self {
        Self {
            profile: profile.to_string(),
            results,
        }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Highest severity over every outcome of the run.
    pub fn verdict(&self) -> Option<Severity> {
        worst(self.results.iter().flat_map(|r| r.outcomes.iter()))
    }

    /// Number of check results per worst severity.
    pub fn summary(&self) -> BTreeMap<Severity, usize> {
        let mut summary = BTreeMap::new();
        for severity in self.results.iter().filter_map(CheckResult::worst) {
            *summary.entry(severity).or_insert(0) += 1;
        }
        summary
    }

    /// Results of `id`, given either as the plain or the qualified id.
    pub fn results_for(&self, id: &str) -> Vec<&CheckResult> {
        self.results
            .iter()
            .filter(|r| r.check_id == id || r.variant.as_deref() == Some(id))
            .collect()
    }

    /// True when some outcome reaches `threshold`. SKIP never counts.
    pub fn is_failing(&self, threshold: Severity) -> bool {
        self.results
            .iter()
            .flat_map(|r| r.outcomes.iter())
            .any(|o| o.severity != Severity::Skip && o.severity >= threshold)
    }
}
