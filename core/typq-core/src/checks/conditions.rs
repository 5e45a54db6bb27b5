//! Shared conditions used by the built-in checks.

use std::sync::Arc;

use anyhow::Result;

use crate::error::ConfigError;
use crate::font::PostInfo;
use crate::registry::CheckRegistry;
use crate::resolve::{Args, Condition, Value};

pub const IS_CFF: &str = "is_cff";
pub const IS_TTF: &str = "is_ttf";
pub const HAS_GLYPH_NAMES: &str = "has_glyph_names";
pub const MISSING_WHITESPACE_CHARS: &str = "missing_whitespace_chars";
pub const WHITESPACE_COMPLETE: &str = "whitespace_complete";
pub const FAMILY_VMETRICS: &str = "family_vmetrics";

pub const SPACE: u32 = 0x0020;
pub const NBSP: u32 = 0x00A0;

/// Extreme glyph bounds over every font of the family, from `head`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyBounds {
    pub y_max: i16,
    pub y_min: i16,
}

pub(crate) fn register(registry: &mut CheckRegistry) -> Result<(), ConfigError> {
    registry.register_condition(Condition::flag(IS_CFF, &["font"], |args| {
        Ok(args.font()?.is_cff())
    }))?;
    registry.register_condition(Condition::flag(IS_TTF, &["font"], |args| {
        Ok(args.font()?.has_table("glyf"))
    }))?;
    registry.register_condition(Condition::flag(HAS_GLYPH_NAMES, &["font"], has_glyph_names))?;
    registry.register_condition(Condition::new(
        MISSING_WHITESPACE_CHARS,
        &["font"],
        missing_whitespace_chars,
    ))?;
    registry.register_condition(Condition::flag(
        WHITESPACE_COMPLETE,
        &[MISSING_WHITESPACE_CHARS],
        |args| Ok(args.get::<Vec<u32>>(MISSING_WHITESPACE_CHARS)?.is_empty()),
    ))?;
    registry.register_condition(Condition::new(FAMILY_VMETRICS, &["fonts"], family_vmetrics))?;
    Ok(())
}

/// CFF fonts always carry names; TrueType ones only without a format 3 `post`.
fn has_glyph_names(args: &Args) -> Result<bool> {
    let font = args.font()?;
    if font.is_cff() {
        return Ok(true);
    }
    Ok(matches!(font.post, Some(post) if post.version != PostInfo::VERSION_3))
}

fn missing_whitespace_chars(args: &Args) -> Result<Option<Value>> {
    let font = args.font()?;
    let missing: Vec<u32> = [SPACE, NBSP]
        .into_iter()
        .filter(|cp| font.glyph_for(*cp).is_none())
        .collect();
    let value: Value = Arc::new(missing);
    Ok(Some(value))
}

fn family_vmetrics(args: &Args) -> Result<Option<Value>> {
    let heads: Vec<_> = args.fonts()?.iter().filter_map(|f| f.head).collect();
    if heads.is_empty() {
        return Ok(None);
    }
    let bounds = FamilyBounds {
        y_max: heads.iter().map(|h| h.y_max).max().unwrap_or(0),
        y_min: heads.iter().map(|h| h.y_min).min().unwrap_or(0),
    };
    let value: Value = Arc::new(bounds);
    Ok(Some(value))
}
