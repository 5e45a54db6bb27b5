//! Four-byte OpenType tags, for humans and for serde (made by FontLab https://www.fontlab.com/)
//!
//! Table tags are how fonts introduce their parts to each other: `head`,
//! `OS/2`, `CFF `. The checks speak in strings, the parser speaks in `Tag`s,
//! and these helpers translate in both directions.

use anyhow::{anyhow, Result};
use read_fonts::types::Tag;
use serde::{Deserialize, Serialize};

/// Encode 1-4 printable ASCII characters as a tag, padding with spaces.
///
/// `"CFF"` becomes `CFF ` exactly as the table directory spells it.
pub fn tag4(raw: &str) -> Result<Tag> {
    if raw.is_empty() || raw.len() > 4 {
        return Err(anyhow!("tag must be 1-4 printable ASCII chars"));
    }

    let mut buf = [b' '; 4];
    for (i, byte) in raw.as_bytes().iter().take(4).enumerate() {
        if !(0x20..=0x7E).contains(byte) {
            return Err(anyhow!("tag byte out of range: {raw}"));
        }
        buf[i] = *byte;
    }

    Ok(Tag::new(&buf))
}

/// Render a tag back into its four characters, trailing spaces included.
pub fn tag_to_string(tag: Tag) -> String {
    String::from_utf8_lossy(&tag.to_be_bytes()).to_string()
}

pub(crate) fn serialize_tags<S>(tags: &[Tag], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let as_strings: Vec<String> = tags.iter().copied().map(tag_to_string).collect();
    as_strings.serialize(serializer)
}

pub(crate) fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<Tag>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Vec<String> = Vec::<String>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|s| tag4(&s).map_err(serde::de::Error::custom))
        .collect()
}
