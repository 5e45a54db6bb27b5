//! Built-in checks and the conditions they share (made by FontLab https://www.fontlab.com/)

pub mod conditions;
pub mod family;
pub mod glyphs;
pub mod metadata;
pub mod metrics;
pub mod names;
pub mod render;
pub mod tables;

use crate::error::ConfigError;
use crate::registry::CheckRegistry;

/// Register every built-in condition and check.
pub(crate) fn register_all(registry: &mut CheckRegistry) -> Result<(), ConfigError> {
    conditions::register(registry)?;
    family::register(registry)?;
    glyphs::register(registry)?;
    metadata::register(registry)?;
    metrics::register(registry)?;
    names::register(registry)?;
    render::register(registry)?;
    tables::register(registry)?;
    Ok(())
}
