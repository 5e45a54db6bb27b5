//! Font snapshots extracted with read-fonts and skrifa (made by FontLab https://www.fontlab.com/)
//!
//! Checks never talk to the parser directly. Each face is read once into an
//! owned [`FontFace`] that holds just the table fields the checks inspect,
//! which keeps predicates pure and lets tests build or tweak faces by hand.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use read_fonts::tables::name::Name;
use read_fonts::types::Tag;
use read_fonts::{FontRef, Offset, TableProvider};
use serde::{Deserialize, Serialize};
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::{FontRef as SkrifaFontRef, GlyphId, MetadataProvider};

use crate::tags::{deserialize_tags, serialize_tags, tag4};

/// `sfntVersion` of fonts with TrueType outlines.
pub const SFNT_VERSION_TRUETYPE: u32 = 0x0001_0000;
/// `sfntVersion` of fonts with CFF/CFF2 outlines (`OTTO`).
pub const SFNT_VERSION_CFF: u32 = 0x4F54_544F;

pub const PLATFORM_UNICODE: u16 = 0;
pub const PLATFORM_MAC: u16 = 1;
pub const PLATFORM_WINDOWS: u16 = 3;
pub const WINDOWS_ENCODING_UNICODE_BMP: u16 = 1;
pub const WINDOWS_LANGUAGE_ENGLISH_US: u16 = 0x409;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSource {
    pub path: PathBuf,
    pub ttc_index: Option<u32>,
}

impl FontSource {
    /// Render the path, appending `#<index>` for TTC/OTC collections.
    pub fn path_with_index(&self) -> String {
        if let Some(idx) = self.ttc_index {
            format!("{}#{idx}", self.path.display())
        } else {
            self.path.display().to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadInfo {
    pub units_per_em: u16,
    pub font_revision: f64,
    pub mac_style: u16,
    pub y_min: i16,
    pub y_max: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HheaInfo {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Os2Info {
    pub weight_class: u16,
    pub width_class: u16,
    pub fs_selection: u16,
    pub typo_ascender: i16,
    pub typo_descender: i16,
    pub typo_line_gap: i16,
    pub win_ascent: u16,
    pub win_descent: u16,
    pub panose: [u8; 10],
}

impl Os2Info {
    pub const FS_SELECTION_ITALIC: u16 = 1 << 0;
    pub const FS_SELECTION_BOLD: u16 = 1 << 5;

    pub fn is_bold(&self) -> bool {
        self.fs_selection & Self::FS_SELECTION_BOLD != 0
    }

    pub fn is_italic(&self) -> bool {
        self.fs_selection & Self::FS_SELECTION_ITALIC != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostInfo {
    /// Raw 16.16 version, e.g. `0x0003_0000` for a format 3 table.
    pub version: u32,
    pub underline_thickness: i16,
    pub is_fixed_pitch: bool,
}

impl PostInfo {
    pub const VERSION_3: u32 = 0x0003_0000;
}

/// A `name` table record with its undecoded string bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: u16,
    pub bytes: Vec<u8>,
}

impl NameRecord {
    /// A Windows/Unicode BMP/US-English record holding `text` as UTF-16BE.
    pub fn windows_english(name_id: u16, text: &str) -> Self {
        Self {
            platform_id: PLATFORM_WINDOWS,
            encoding_id: WINDOWS_ENCODING_UNICODE_BMP,
            language_id: WINDOWS_LANGUAGE_ENGLISH_US,
            name_id,
            bytes: text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        }
    }

    pub fn is_windows_english(&self) -> bool {
        self.platform_id == PLATFORM_WINDOWS
            && self.encoding_id == WINDOWS_ENCODING_UNICODE_BMP
            && self.language_id == WINDOWS_LANGUAGE_ENGLISH_US
    }

    /// Decode the string bytes, or `None` when they are malformed for the
    /// record's encoding (or the encoding is not one we read).
    pub fn decode(&self) -> Option<String> {
        match self.platform_id {
            PLATFORM_UNICODE | PLATFORM_WINDOWS => encoding_rs::UTF_16BE
                .decode_without_bom_handling_and_without_replacement(&self.bytes)
                .map(Cow::into_owned),
            PLATFORM_MAC if self.encoding_id == 0 => {
                let (text, had_errors) =
                    encoding_rs::MACINTOSH.decode_without_bom_handling(&self.bytes);
                (!had_errors).then(|| text.into_owned())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Glyph {
    pub name: String,
    pub advance: u16,
    /// True when the outline draws nothing.
    pub is_empty: bool,
}

impl Glyph {
    pub fn new(name: &str, advance: u16, is_empty: bool) -> Self {
        Self {
            name: name.to_string(),
            advance,
            is_empty,
        }
    }
}

/// Everything the checks know about one face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontFace {
    pub source: FontSource,
    pub sfnt_version: u32,
    #[serde(
        serialize_with = "serialize_tags",
        deserialize_with = "deserialize_tags"
    )]
    pub table_tags: Vec<Tag>,
    #[serde(default)]
    pub head: Option<HeadInfo>,
    #[serde(default)]
    pub hhea: Option<HheaInfo>,
    #[serde(default)]
    pub os2: Option<Os2Info>,
    #[serde(default)]
    pub post: Option<PostInfo>,
    /// `None` when the font has no `name` table at all.
    #[serde(default)]
    pub names: Option<Vec<NameRecord>>,
    /// Best Unicode cmap: codepoint to glyph id.
    #[serde(default)]
    pub cmap: BTreeMap<u32, u32>,
    /// `(platformID, encodingID)` of every cmap subtable record.
    #[serde(default)]
    pub cmap_encodings: Vec<(u16, u16)>,
    /// Glyphs in glyph-id order.
    #[serde(default)]
    pub glyphs: Vec<Glyph>,
    #[serde(skip)]
    pub data: Option<Arc<Vec<u8>>>,
}

impl FontFace {
    /// A bare snapshot with no tables, useful as a starting point for fixtures.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            source: FontSource {
                path: path.into(),
                ttc_index: None,
            },
            sfnt_version: SFNT_VERSION_TRUETYPE,
            table_tags: Vec::new(),
            head: None,
            hhea: None,
            os2: None,
            post: None,
            names: None,
            cmap: BTreeMap::new(),
            cmap_encodings: Vec::new(),
            glyphs: Vec::new(),
            data: None,
        }
    }

    pub fn identity(&self) -> String {
        self.source.path_with_index()
    }

    pub fn has_table(&self, tag: &str) -> bool {
        tag4(tag)
            .map(|tag| self.table_tags.contains(&tag))
            .unwrap_or(false)
    }

    pub fn is_cff(&self) -> bool {
        self.has_table("CFF ") || self.has_table("CFF2")
    }

    pub fn glyph_for(&self, codepoint: u32) -> Option<u32> {
        self.cmap.get(&codepoint).copied()
    }

    pub fn glyph(&self, gid: u32) -> Option<&Glyph> {
        self.glyphs.get(gid as usize)
    }

    pub fn glyph_name(&self, gid: u32) -> Option<&str> {
        self.glyph(gid).map(|g| g.name.as_str())
    }

    pub fn glyph_for_char(&self, codepoint: u32) -> Option<&Glyph> {
        self.glyph_for(codepoint).and_then(|gid| self.glyph(gid))
    }

    pub fn glyph_id_by_name(&self, name: &str) -> Option<u32> {
        self.glyphs
            .iter()
            .position(|g| g.name == name)
            .map(|idx| idx as u32)
    }

    pub fn name_records(&self) -> &[NameRecord] {
        self.names.as_deref().unwrap_or_default()
    }

    pub fn windows_english_record(&self, name_id: u16) -> Option<&NameRecord> {
        self.name_records()
            .iter()
            .find(|rec| rec.name_id == name_id && rec.is_windows_english())
    }

    /// Decoded Windows US-English string for `name_id`, if present and valid.
    pub fn windows_english_name(&self, name_id: u16) -> Option<String> {
        self.windows_english_record(name_id)
            .and_then(NameRecord::decode)
    }

    /// nameID 1 (legacy family name).
    pub fn family_name(&self) -> Option<String> {
        self.windows_english_name(1)
    }

    /// nameID 2 (legacy subfamily name).
    pub fn style_name(&self) -> Option<String> {
        self.windows_english_name(2)
    }

    pub fn units_per_em(&self) -> Option<u16> {
        self.head.map(|head| head.units_per_em)
    }
}

/// Read every face stored in `path` (one for TTF/OTF, several for TTC/OTC).
pub fn load_faces(path: &Path) -> Result<Vec<FontFace>> {
    let data = Arc::new(fs::read(path).with_context(|| format!("reading font {}", path.display()))?);
    let bytes: &[u8] = &data;
    let mut faces = Vec::new();

    for font in FontRef::fonts(bytes) {
        let font = font.with_context(|| format!("parsing font {}", path.display()))?;
        let ttc_index = font.ttc_index();
        let sfont = if let Some(idx) = ttc_index {
            SkrifaFontRef::from_index(bytes, idx)?
        } else {
            SkrifaFontRef::new(bytes)?
        };

        let mut face = extract_face(&font, &sfont);
        face.source = FontSource {
            path: path.to_path_buf(),
            ttc_index,
        };
        face.data = Some(Arc::clone(&data));
        faces.push(face);
    }
    if faces.is_empty() {
        return Err(anyhow!("parsing font {}: no font data found", path.display()));
    }

    log::debug!("loaded {} face(s) from {}", faces.len(), path.display());
    Ok(faces)
}

fn extract_face(font: &FontRef, sfont: &SkrifaFontRef) -> FontFace {
    let mut face = FontFace::new(PathBuf::new());
    face.sfnt_version = font.table_directory.sfnt_version();
    face.table_tags = font
        .table_directory
        .table_records()
        .iter()
        .map(|rec| rec.tag())
        .collect();

    face.head = font.head().ok().map(|head| HeadInfo {
        units_per_em: head.units_per_em(),
        font_revision: head.font_revision().to_f64(),
        mac_style: head.mac_style().bits(),
        y_min: head.y_min(),
        y_max: head.y_max(),
    });

    face.hhea = font.hhea().ok().map(|hhea| HheaInfo {
        ascender: hhea.ascender().to_i16(),
        descender: hhea.descender().to_i16(),
        line_gap: hhea.line_gap().to_i16(),
    });

    face.os2 = font.os2().ok().map(|os2| {
        let mut panose = [0u8; 10];
        for (slot, byte) in panose.iter_mut().zip(os2.panose_10()) {
            *slot = *byte;
        }
        Os2Info {
            weight_class: os2.us_weight_class(),
            width_class: os2.us_width_class(),
            fs_selection: os2.fs_selection().bits(),
            typo_ascender: os2.s_typo_ascender(),
            typo_descender: os2.s_typo_descender(),
            typo_line_gap: os2.s_typo_line_gap(),
            win_ascent: os2.us_win_ascent(),
            win_descent: os2.us_win_descent(),
            panose,
        }
    });

    face.post = font.post().ok().map(|post| PostInfo {
        version: u32::from_be_bytes(post.version().to_be_bytes()),
        underline_thickness: post.underline_thickness().to_i16(),
        is_fixed_pitch: post.is_fixed_pitch() != 0,
    });
    face.names = font.name().ok().map(|name| read_name_records(&name));
    face.cmap_encodings = font
        .cmap()
        .map(|cmap| {
            cmap.encoding_records()
                .iter()
                .map(|rec| (rec.platform_id() as u16, rec.encoding_id()))
                .collect()
        })
        .unwrap_or_default();

    face.cmap = sfont
        .charmap()
        .mappings()
        .map(|(cp, gid)| (cp, gid.to_u32()))
        .collect();

    let num_glyphs = font.maxp().map(|maxp| maxp.num_glyphs()).unwrap_or(0) as u32;
    face.glyphs = collect_glyphs(sfont, num_glyphs);
    face
}

fn collect_glyphs(sfont: &SkrifaFontRef, num_glyphs: u32) -> Vec<Glyph> {
    let names = sfont.glyph_names();
    let metrics = sfont.glyph_metrics(Size::unscaled(), LocationRef::default());
    let outlines = sfont.outline_glyphs();

    (0..num_glyphs)
        .map(|gid| {
            let glyph_id = GlyphId::new(gid);
            let name = names
                .get(glyph_id)
                .map(|name| name.as_str().to_string())
                .unwrap_or_else(|| format!("glyph{gid:05}"));
            let advance = metrics.advance_width(glyph_id).unwrap_or(0.0).round() as u16;
            let is_empty = match outlines.get(glyph_id) {
                Some(outline) => {
                    let mut pen = InkPen::default();
                    let settings = DrawSettings::unhinted(Size::unscaled(), LocationRef::default());
                    // A glyph that fails to draw is not known to be empty.
                    match outline.draw(settings, &mut pen) {
                        Ok(_) => !pen.has_ink(),
                        Err(_) => false,
                    }
                }
                None => true,
            };
            Glyph {
                name,
                advance,
                is_empty,
            }
        })
        .collect()
}

/// Records whether an outline emitted any drawing segment.
#[derive(Default)]
struct InkPen {
    segments: usize,
}

impl InkPen {
    fn has_ink(&self) -> bool {
        self.segments > 0
    }
}

impl OutlinePen for InkPen {
    fn move_to(&mut self, _x: f32, _y: f32) {}

    fn line_to(&mut self, _x: f32, _y: f32) {
        self.segments += 1;
    }

    fn quad_to(&mut self, _cx0: f32, _cy0: f32, _x: f32, _y: f32) {
        self.segments += 1;
    }

    fn curve_to(&mut self, _cx0: f32, _cy0: f32, _cx1: f32, _cy1: f32, _x: f32, _y: f32) {
        self.segments += 1;
    }

    fn close(&mut self) {}
}

/// Records keep their raw string bytes so that undecodable names stay visible.
fn read_name_records(name: &Name) -> Vec<NameRecord> {
    let storage = name.string_data().as_bytes();
    name.name_record()
        .iter()
        .filter_map(|rec| {
            let start = rec.string_offset().non_null().unwrap_or(0);
            let bytes = storage.get(start..start + rec.length() as usize)?;
            Some(NameRecord {
                platform_id: rec.platform_id(),
                encoding_id: rec.encoding_id(),
                language_id: rec.language_id(),
                name_id: rec.name_id().to_u16(),
                bytes: bytes.to_vec(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_english_round_trips_through_utf16() {
        let rec = NameRecord::windows_english(1, "Source Sans Pro");
        assert!(rec.is_windows_english());
        assert_eq!(rec.decode().as_deref(), Some("Source Sans Pro"));
    }

    #[test]
    fn odd_length_utf16_does_not_decode() {
        let mut rec = NameRecord::windows_english(1, "x");
        rec.bytes = b"+AP8-".to_vec();
        assert_eq!(rec.decode(), None);
    }

    fn be16(v: u16) -> [u8; 2] {
        v.to_be_bytes()
    }

    /// A bare sfnt holding `tables`, which must be sorted by tag.
    fn sfnt(tables: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&SFNT_VERSION_TRUETYPE.to_be_bytes());
        out.extend_from_slice(&be16(tables.len() as u16));
        out.extend_from_slice(&[0; 6]);
        let mut offset = 12 + 16 * tables.len();
        let mut body = Vec::new();
        for (tag, data) in tables {
            out.extend_from_slice(*tag);
            out.extend_from_slice(&[0; 4]);
            out.extend_from_slice(&(offset as u32).to_be_bytes());
            out.extend_from_slice(&(data.len() as u32).to_be_bytes());
            let mut padded = data.clone();
            padded.resize((data.len() + 3) & !3, 0);
            offset += padded.len();
            body.extend(padded);
        }
        out.extend(body);
        out
    }

    fn cmap_table() -> Vec<u8> {
        let mut t = Vec::new();
        for v in [0u16, 2, 0, 3, 0, 20, 3, 1, 0, 20] {
            t.extend_from_slice(&be16(v));
        }
        // format 4 subtable with only the 0xFFFF terminator segment
        for v in [4u16, 24, 0, 2, 2, 0, 0, 0xFFFF, 0, 0xFFFF, 1, 0] {
            t.extend_from_slice(&be16(v));
        }
        t
    }

    fn name_table() -> Vec<u8> {
        let family: Vec<u8> = "Ab".encode_utf16().flat_map(u16::to_be_bytes).collect();
        let mut t = Vec::new();
        for v in [0u16, 3, 6 + 12 * 3] {
            t.extend_from_slice(&be16(v));
        }
        for v in [1u16, 0, 0, 2, 4, 4] {
            t.extend_from_slice(&be16(v));
        }
        for v in [3u16, 1, 0x409, 1, 4, 0] {
            t.extend_from_slice(&be16(v));
        }
        // points past the end of the storage area
        for v in [3u16, 1, 0x409, 4, 4, 100] {
            t.extend_from_slice(&be16(v));
        }
        t.extend(family);
        t.extend_from_slice(b"Bold");
        t
    }

    fn post_table() -> Vec<u8> {
        let mut t = Vec::new();
        t.extend_from_slice(&PostInfo::VERSION_3.to_be_bytes());
        t.extend_from_slice(&[0; 4]);
        t.extend_from_slice(&be16((-75i16) as u16));
        t.extend_from_slice(&be16(50));
        t.extend_from_slice(&1u32.to_be_bytes());
        t.extend_from_slice(&[0; 16]);
        t
    }

    #[test]
    fn loads_post_name_and_cmap_tables() {
        let bytes = sfnt(&[
            (b"cmap", cmap_table()),
            (b"name", name_table()),
            (b"post", post_table()),
        ]);
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("Ab-Bold.ttf");
        fs::write(&path, bytes).expect("write font");

        let faces = load_faces(&path).expect("load");
        assert_eq!(faces.len(), 1);
        let face = &faces[0];

        assert_eq!(
            face.post,
            Some(PostInfo {
                version: PostInfo::VERSION_3,
                underline_thickness: 50,
                is_fixed_pitch: true,
            })
        );
        assert_eq!(face.cmap_encodings, vec![(0, 3), (3, 1)]);

        let records = face.name_records();
        assert_eq!(records.len(), 2, "{records:?}");
        assert_eq!(records[0].platform_id, PLATFORM_MAC);
        assert_eq!(records[0].decode().as_deref(), Some("Bold"));
        assert_eq!(face.family_name().as_deref(), Some("Ab"));
        assert!(face.has_table("post"));
    }

    #[test]
    fn has_table_pads_short_tags() {
        let mut face = FontFace::new("/fonts/A.otf");
        face.table_tags = vec![Tag::new(b"CFF ")];
        assert!(face.has_table("CFF"));
        assert!(face.is_cff());
    }

    #[test]
    fn path_with_index_marks_collections() {
        let source = FontSource {
            path: PathBuf::from("/fonts/A.ttc"),
            ttc_index: Some(2),
        };
        assert_eq!(source.path_with_index(), "/fonts/A.ttc#2");
    }
}
