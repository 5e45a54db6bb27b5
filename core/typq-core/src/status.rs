//! Severities and check outcomes (made by FontLab https://www.fontlab.com/)

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Classification of a single outcome.
///
/// The declaration order is the total order used everywhere else:
/// `DEBUG < PASS < INFO < WARN < FAIL < ERROR < SKIP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Pass,
    Info,
    Warn,
    Fail,
    Error,
    Skip,
}

impl Severity {
    pub const ALL: [Severity; 7] = [
        Severity::Debug,
        Severity::Pass,
        Severity::Info,
        Severity::Warn,
        Severity::Fail,
        Severity::Error,
        Severity::Skip,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Pass => "PASS",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Fail => "FAIL",
            Severity::Error => "ERROR",
            Severity::Skip => "SKIP",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        Severity::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| anyhow!("unknown severity: {raw}"))
    }
}

/// One finding yielded by a check invocation. Never mutated after creation,
/// except by a profile override remapping its severity before it is reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_reason: Option<String>,
}

impl Outcome {
    pub fn new(severity: Severity, key: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            key: key.map(str::to_string),
            override_reason: None,
        }
    }

    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(Severity::Debug, None, message)
    }

    pub fn pass(message: impl Into<String>) -> Self {
        Self::new(Severity::Pass, None, message)
    }

    pub fn info(key: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, Some(key), message)
    }

    pub fn warn(key: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Warn, Some(key), message)
    }

    pub fn fail(key: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Fail, Some(key), message)
    }

    pub fn error(key: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, Some(key), message)
    }

    pub fn skip(key: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Skip, Some(key), message)
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.key.as_deref() == Some(key)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{}: {} [code: {key}]", self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Highest severity in `outcomes`, or `None` when nothing was yielded.
pub fn worst<'a>(outcomes: impl IntoIterator<Item = &'a Outcome>) -> Option<Severity> {
    outcomes.into_iter().map(|o| o.severity).max()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_order_matches_declaration() {
        for pair in Severity::ALL.windows(2) {
            assert!(pair[0] < pair[1], "{} should sort before {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn parses_severity_case_insensitively() {
        assert_eq!("warn".parse::<Severity>().unwrap(), Severity::Warn);
        assert_eq!(" FAIL ".parse::<Severity>().unwrap(), Severity::Fail);
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn serializes_uppercase_and_omits_empty_key() {
        let json = serde_json::to_string(&Outcome::pass("ok")).unwrap();
        assert_eq!(json, r#"{"severity":"PASS","message":"ok"}"#);
    }

    #[test]
    fn worst_of_nothing_is_none() {
        assert_eq!(worst(&Vec::<Outcome>::new()), None);
        let outcomes = [Outcome::pass("a"), Outcome::fail("x", "b"), Outcome::warn("y", "c")];
        assert_eq!(worst(&outcomes), Some(Severity::Fail));
    }
}
