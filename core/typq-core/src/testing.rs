//! Helpers for testing checks in isolation (made by FontLab https://www.fontlab.com/)
//!
//! [`CheckTester`] picks one check out of a composed profile, variant
//! included, and runs it the same way a full run would. The assertion
//! helpers panic with the offending outcomes so failures read well.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::font::{
    FontFace, Glyph, HeadInfo, HheaInfo, NameRecord, Os2Info, PostInfo, SFNT_VERSION_TRUETYPE,
};
use crate::metadata::FamilyMetadata;
use crate::profile::{builtin_profile, EffectiveCheck, EffectiveProfile};
use crate::raster::Rasterizer;
use crate::registry::CheckRegistry;
use crate::runner::{RunOptions, Runner, Targets};
use crate::status::{worst, Outcome, Severity};
use crate::tags::tag4;

/// Runs a single check of a composed profile.
pub struct CheckTester {
    registry: CheckRegistry,
    profile: EffectiveProfile,
    check: EffectiveCheck,
    rasterizer: Option<Arc<dyn Rasterizer>>,
}

impl CheckTester {
    /// `check_id` may be the plain id or the profile's qualified variant id.
    pub fn new(registry: CheckRegistry, profile: EffectiveProfile, check_id: &str) -> Result<Self> {
        let check = profile.get(check_id).cloned().ok_or_else(|| {
            anyhow!(
                "check `{check_id}` is not part of profile `{}`",
                profile.name()
            )
        })?;
        Ok(Self {
            registry,
            profile,
            check,
            rasterizer: None,
        })
    }

    /// Tester over a built-in profile. Panics when the profile or check is unknown.
    pub fn builtin(profile: &str, check_id: &str) -> Self {
        builtin_profile(profile)
            .and_then(|(registry, composed)| Self::new(registry, composed, check_id))
            .unwrap_or_else(|err| panic!("cannot test `{check_id}` in `{profile}`: {err:#}"))
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn check(&self) -> &EffectiveCheck {
        &self.check
    }

    /// Outcomes of every subject the check applies to, flattened in order.
    pub fn run(&self, targets: &Targets) -> Vec<Outcome> {
        let options = RunOptions {
            rasterizer: self.rasterizer.clone(),
            ..RunOptions::default()
        };
        Runner::new(&self.registry, &self.profile)
            .with_options(options)
            .run_check(&self.check, targets)
            .into_iter()
            .flat_map(|result| result.outcomes)
            .collect()
    }

    pub fn run_font(&self, font: FontFace) -> Vec<Outcome> {
        self.run(&Targets::new().with_fonts([font]))
    }

    pub fn run_family(&self, fonts: Vec<FontFace>) -> Vec<Outcome> {
        self.run(&Targets::new().with_fonts(fonts))
    }

    pub fn run_metadata(&self, metadata: FamilyMetadata, fonts: Vec<FontFace>) -> Vec<Outcome> {
        self.run(&Targets::new().with_fonts(fonts).with_metadata(metadata))
    }

    pub fn run_directory(&self, directory: &Path) -> Vec<Outcome> {
        self.run(&Targets::new().with_directory(directory))
    }
}

fn render(outcomes: &[Outcome]) -> String {
    outcomes
        .iter()
        .map(|o| match &o.key {
            Some(key) => format!("  {} [{key}] {}", o.severity, o.message),
            None => format!("  {} {}", o.severity, o.message),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Assert the worst outcome is PASS and return the last PASS message.
pub fn assert_pass(outcomes: &[Outcome]) -> String {
    if worst(outcomes) != Some(Severity::Pass) {
        panic!("expected PASS, got:\n{}", render(outcomes));
    }
    outcomes
        .iter()
        .rev()
        .find(|o| o.severity == Severity::Pass)
        .map(|o| o.message.clone())
        .unwrap_or_default()
}

/// Assert an outcome with `severity` and `key` exists and return its message.
pub fn assert_results_contain(outcomes: &[Outcome], severity: Severity, key: &str) -> String {
    match outcomes
        .iter()
        .find(|o| o.severity == severity && o.has_key(key))
    {
        Some(outcome) => outcome.message.clone(),
        None => panic!(
            "expected {severity} [{key}], got:\n{}",
            render(outcomes)
        ),
    }
}

/// A hand-built TrueType face shaped after a real family member.
///
/// `file_name` such as `Cabin-BoldItalic.ttf` gives the family (`Cabin`) and
/// style (`BoldItalic`); style bits follow the words `Bold` and `Italic`.
/// The face has `.notdef`, `space`, `uni00A0` and the ASCII letters, with
/// consistent vertical metrics and a format 2 `post` table.
pub fn sample_face(file_name: &str) -> FontFace {
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name);
    let (family, style) = stem.split_once('-').unwrap_or((stem, "Regular"));
    let bold = style.contains("Bold");
    let italic = style.contains("Italic");

    let mut face = FontFace::new(PathBuf::from("/fonts").join(file_name));
    face.sfnt_version = SFNT_VERSION_TRUETYPE;
    face.table_tags = [
        "OS/2", "cmap", "glyf", "head", "hhea", "hmtx", "loca", "maxp", "name", "post",
    ]
    .iter()
    .filter_map(|tag| tag4(tag).ok())
    .collect();

    let mut mac_style = 0;
    let mut fs_selection = 0;
    if bold {
        mac_style |= 1 << 0;
        fs_selection |= Os2Info::FS_SELECTION_BOLD;
    }
    if italic {
        mac_style |= 1 << 1;
        fs_selection |= Os2Info::FS_SELECTION_ITALIC;
    }
    if !bold && !italic {
        fs_selection |= 1 << 6;
    }

    face.head = Some(HeadInfo {
        units_per_em: 1000,
        font_revision: 1.0,
        mac_style,
        y_min: -250,
        y_max: 900,
    });
    face.hhea = Some(HheaInfo {
        ascender: 750,
        descender: -250,
        line_gap: 0,
    });
    face.os2 = Some(Os2Info {
        weight_class: if bold { 700 } else { 400 },
        width_class: 5,
        fs_selection,
        typo_ascender: 750,
        typo_descender: -250,
        typo_line_gap: 0,
        win_ascent: 1000,
        win_descent: 300,
        panose: [2, 11, 5, 3, 3, 4, 3, 2, 2, 4],
    });
    face.post = Some(PostInfo {
        version: 0x0002_0000,
        underline_thickness: 50,
        is_fixed_pitch: false,
    });
    face.names = Some(vec![
        NameRecord::windows_english(1, family),
        NameRecord::windows_english(2, style),
        NameRecord::windows_english(4, &format!("{family} {style}")),
        NameRecord::windows_english(6, &format!("{family}-{style}")),
    ]);
    face.cmap_encodings = vec![(0, 3), (3, 1)];

    face.glyphs = vec![
        Glyph::new(".notdef", 500, false),
        Glyph::new("space", 200, true),
        Glyph::new("uni00A0", 200, true),
    ];
    face.cmap.insert(0x0020, 1);
    face.cmap.insert(0x00A0, 2);
    for ch in ('A'..='Z').chain('a'..='z') {
        face.cmap.insert(ch as u32, face.glyphs.len() as u32);
        face.glyphs.push(Glyph::new(&ch.to_string(), 600, false));
    }
    face
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::glyphs::WHITESPACE_GLYPHS;

    #[test]
    fn sample_face_follows_the_file_name() {
        let face = sample_face("Cabin-BoldItalic.ttf");
        assert_eq!(face.family_name().as_deref(), Some("Cabin"));
        assert_eq!(face.style_name().as_deref(), Some("BoldItalic"));
        let os2 = face.os2.unwrap();
        assert!(os2.is_bold() && os2.is_italic());
        assert_eq!(face.glyph_name(face.glyph_for('B' as u32).unwrap()), Some("B"));
    }

    #[test]
    fn unknown_checks_are_rejected() {
        let (registry, profile) = builtin_profile("opentype").unwrap();
        assert!(CheckTester::new(registry, profile, WHITESPACE_GLYPHS).is_err());
    }

    #[test]
    #[should_panic(expected = "expected PASS")]
    fn assert_pass_rejects_failures() {
        assert_pass(&[Outcome::pass("ok"), Outcome::fail("bad", "not ok")]);
    }
}
