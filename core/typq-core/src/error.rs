//! Configuration errors raised while building registries and composing profiles
//! (made by FontLab https://www.fontlab.com/)

use thiserror::Error;

/// A malformed registry or profile. These abort a run before any check executes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("duplicate check id `{0}`")]
    DuplicateCheck(String),
    #[error("duplicate condition `{0}`")]
    DuplicateCondition(String),
    #[error("`{owner}` requires unknown input `{name}`")]
    UnknownInput { owner: String, name: String },
    #[error("condition dependency cycle: {}", .0.join(" -> "))]
    ConditionCycle(Vec<String>),
    #[error("unknown profile `{name}`{}", .included_by.as_ref().map(|p| format!(" (included by `{p}`)")).unwrap_or_default())]
    UnknownProfile {
        name: String,
        included_by: Option<String>,
    },
    #[error("profile inclusion cycle: {}", .0.join(" -> "))]
    IncludeCycle(Vec<String>),
    #[error("profile `{profile}` lists unknown check `{check}` in section `{section}`")]
    UnknownCheck {
        profile: String,
        section: String,
        check: String,
    },
    #[error("profile `{profile}` overrides unknown check `{check}`")]
    UnknownOverride { profile: String, check: String },
    #[error("override `{variant}` in profile `{profile}` does not supersede `{check}`")]
    MismatchedOverride {
        profile: String,
        check: String,
        variant: String,
    },
    #[error("profile `{profile}` inherits conflicting overrides for `{check}`: `{first}` and `{second}`")]
    OverrideConflict {
        profile: String,
        check: String,
        first: String,
        second: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_lists_chain() {
        let err = ConfigError::IncludeCycle(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(err.to_string(), "profile inclusion cycle: a -> b -> a");
    }

    #[test]
    fn unknown_profile_mentions_includer() {
        let err = ConfigError::UnknownProfile {
            name: "ghost".into(),
            included_by: Some("vendor".into()),
        };
        assert_eq!(err.to_string(), "unknown profile `ghost` (included by `vendor`)");
    }
}
