//! Check id filtering (made by FontLab https://www.fontlab.com/)

use anyhow::{Context, Result};
use regex::Regex;

/// Include/exclude patterns over check ids, matched anywhere in the id.
#[derive(Debug, Clone, Default)]
pub struct CheckFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl CheckFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include(mut self, patterns: Vec<Regex>) -> Self {
        self.include = patterns;
        self
    }

    pub fn with_exclude(mut self, patterns: Vec<Regex>) -> Self {
        self.exclude = patterns;
        self
    }

    /// Build a filter straight from user-supplied pattern strings.
    pub fn from_patterns(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self::new()
            .with_include(compile_patterns(include)?)
            .with_exclude(compile_patterns(exclude)?))
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// True when `id` passes: it matches an include (if any) and no exclude.
    ///
    /// Both the plain id and its qualified variant are tried so that
    /// `whitespace_glyphs:adobefonts` selects the override too.
    pub fn matches(&self, id: &str, variant: &str) -> bool {
        let hit = |re: &Regex| re.is_match(id) || re.is_match(variant);
        if !self.include.is_empty() && !self.include.iter().any(hit) {
            return false;
        }
        !self.exclude.iter().any(hit)
    }
}

pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).with_context(|| format!("invalid regex: {p}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_lets_everything_through() {
        assert!(CheckFilter::new().matches("com.google.fonts/check/linegaps", "com.google.fonts/check/linegaps"));
    }

    #[test]
    fn include_then_exclude() {
        let filter = CheckFilter::from_patterns(
            &["whitespace".to_string()],
            &["widths$".to_string()],
        )
        .unwrap();
        let glyphs = "com.google.fonts/check/whitespace_glyphs";
        let widths = "com.google.fonts/check/whitespace_widths";
        assert!(filter.matches(glyphs, glyphs));
        assert!(!filter.matches(widths, widths));
        assert!(!filter.matches("com.google.fonts/check/linegaps", "com.google.fonts/check/linegaps"));
    }

    #[test]
    fn qualified_variant_can_be_selected() {
        let filter = CheckFilter::from_patterns(&[":adobefonts$".to_string()], &[]).unwrap();
        assert!(filter.matches("x/valid_glyphnames", "x/valid_glyphnames:adobefonts"));
        assert!(!filter.matches("x/linegaps", "x/linegaps"));
    }

    #[test]
    fn bad_regex_is_reported() {
        let err = compile_patterns(&["(".to_string()]).unwrap_err();
        assert!(err.to_string().contains("invalid regex"));
    }
}
