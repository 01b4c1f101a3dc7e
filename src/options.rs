//! Translation settings
//!
//! One immutable [`TranslationOptions`] value is built before any pass runs
//! and handed by reference to every stage. The CLI layer that produces it is
//! outside this crate; the opaque key→value bag it collects can be supplied
//! here as JSON ([`TranslationOptions::from_json`]).
//!
//! Validation is eager: [`TranslationOptions::validate`] runs before the
//! first pass, so a rejected configuration never corrupts any output.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, TranslationError};

/// Which output the pipeline produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreOutputKind {
    LilyPond,
    Braille,
}

/// Byte ordering for UTF-16 braille output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ByteOrdering {
    BigEndian,
    LittleEndian,
}

/// Textual encoding of the braille cell stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BrailleOutputKind {
    /// 7-bit North American ASCII braille
    Ascii,
    /// UTF-8 braille patterns (U+2800 block)
    Utf8,
    /// UTF-8 with visible line/page markers for debugging
    Utf8Debug,
    /// UTF-16 code units with explicit byte ordering
    Utf16(ByteOrdering),
}

/// Layout policy for simultaneous braille staves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParallelLayoutKind {
    BarOverBar,
    LineOverLine,
}

/// Pipeline pass identifiers, used by the exit-after-pass debug option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PassKind {
    /// After the MSR tree is built
    Msr,
    /// After the LPSR wrapper is built
    Lpsr,
    /// After the BSR tree is built and finalized
    Bsr,
}

/// Per-part chromatic transposition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PartTransposition {
    pub semitones: i32,
    #[serde(default)]
    pub octave_shift: i32,
}

/// LilyPond generation toggles
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LilyPondOptions {
    /// \version header emitted at the top of the document
    pub lilypond_version: String,
    pub omit_ties: bool,
    pub omit_slurs: bool,
    pub omit_dynamics: bool,
    pub omit_wedges: bool,
    pub omit_words: bool,
    pub omit_harmonies: bool,
    pub omit_figured_basses: bool,
    /// Defer a dynamic attached to a rest onto the next sounding note
    pub delay_rests_dynamics: bool,
    /// Defer words attached to a rest onto the next sounding note
    pub delay_rests_words: bool,
    /// Defer a wedge attached to a rest onto the next sounding note
    pub delay_rests_wedges: bool,
    /// Maximum music-stream tokens per generated source line
    pub max_music_line_elements: usize,
    /// Maximum lyrics-stream tokens per generated source line
    pub max_lyrics_line_elements: usize,
    /// Emit a \break after an incomplete-right measure
    pub break_at_incomplete_right_measures: bool,
}

impl Default for LilyPondOptions {
    fn default() -> Self {
        LilyPondOptions {
            lilypond_version: "2.24.0".to_string(),
            omit_ties: false,
            omit_slurs: false,
            omit_dynamics: false,
            omit_wedges: false,
            omit_words: false,
            omit_harmonies: false,
            omit_figured_basses: false,
            delay_rests_dynamics: false,
            delay_rests_words: false,
            delay_rests_wedges: false,
            max_music_line_elements: 10,
            max_lyrics_line_elements: 12,
            break_at_incomplete_right_measures: false,
        }
    }
}

/// Braille layout and encoding settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrailleOptions {
    pub encoding: BrailleOutputKind,
    /// Physical line capacity in cells
    pub cells_per_line: usize,
    /// Cap on measures placed on one line; 0 means capacity-bound only
    pub measures_per_line: usize,
    /// Physical page capacity in lines
    pub lines_per_page: usize,
    pub parallel_layout: ParallelLayoutKind,
}

impl Default for BrailleOptions {
    fn default() -> Self {
        BrailleOptions {
            encoding: BrailleOutputKind::Utf8,
            cells_per_line: 30,
            measures_per_line: 0,
            lines_per_page: 27,
            parallel_layout: ParallelLayoutKind::BarOverBar,
        }
    }
}

/// Part selection and adaptation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PartFilterOptions {
    pub omit_part_ids: BTreeSet<String>,
    pub keep_part_ids: BTreeSet<String>,
    pub omit_part_names: BTreeSet<String>,
    pub keep_part_names: BTreeSet<String>,
    /// old part name → new part name
    pub renames: BTreeMap<String, String>,
    /// part id → chromatic transposition
    pub transpositions: BTreeMap<String, PartTransposition>,
}

/// The full settings bag consumed by every pass
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TranslationOptions {
    pub output: ScoreOutputKind,
    pub lilypond: LilyPondOptions,
    pub braille: BrailleOptions,
    pub parts: PartFilterOptions,
    /// Stop after the named pass and return its debug dump instead of output
    pub exit_after_pass: Option<PassKind>,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        TranslationOptions {
            output: ScoreOutputKind::LilyPond,
            lilypond: LilyPondOptions::default(),
            braille: BrailleOptions::default(),
            parts: PartFilterOptions::default(),
            exit_after_pass: None,
        }
    }
}

impl TranslationOptions {
    /// Deserialize options from the JSON form of the CLI's key→value bag.
    pub fn from_json(json: &str) -> Result<Self, TranslationError> {
        let options: TranslationOptions = serde_json::from_str(json).map_err(|e| {
            ConfigError::MalformedSpec {
                option: "options-json".to_string(),
                spec: json.chars().take(60).collect(),
                reason: e.to_string(),
            }
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Check cross-option consistency. Must run before any pass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.parts.omit_part_ids.is_empty() && !self.parts.keep_part_ids.is_empty() {
            return Err(ConfigError::MutuallyExclusive {
                first: "omit-part-id".to_string(),
                second: "keep-part-id".to_string(),
            });
        }
        if !self.parts.omit_part_names.is_empty() && !self.parts.keep_part_names.is_empty() {
            return Err(ConfigError::MutuallyExclusive {
                first: "omit-part-name".to_string(),
                second: "keep-part-name".to_string(),
            });
        }
        if self.lilypond.max_music_line_elements == 0 {
            return Err(ConfigError::OutOfRange {
                option: "max-music-line-elements".to_string(),
                value: 0,
                reason: "at least one token must fit on a line".to_string(),
            });
        }
        if self.lilypond.max_lyrics_line_elements == 0 {
            return Err(ConfigError::OutOfRange {
                option: "max-lyrics-line-elements".to_string(),
                value: 0,
                reason: "at least one syllable must fit on a line".to_string(),
            });
        }
        if self.braille.cells_per_line < 8 {
            return Err(ConfigError::OutOfRange {
                option: "cells-per-line".to_string(),
                value: self.braille.cells_per_line as i64,
                reason: "a line must hold at least 8 cells".to_string(),
            });
        }
        if self.braille.lines_per_page == 0 {
            return Err(ConfigError::OutOfRange {
                option: "lines-per-page".to_string(),
                value: 0,
                reason: "a page must hold at least one line".to_string(),
            });
        }
        Ok(())
    }
}

/// Parse a part rename specification of the form `OLD=NEW`.
pub fn parse_rename_spec(spec: &str) -> Result<(String, String), ConfigError> {
    let (old, new) = spec.split_once('=').ok_or_else(|| ConfigError::MalformedSpec {
        option: "rename-part".to_string(),
        spec: spec.to_string(),
        reason: "expected OLD=NEW".to_string(),
    })?;
    let (old, new) = (old.trim(), new.trim());
    if old.is_empty() || new.is_empty() {
        return Err(ConfigError::MalformedSpec {
            option: "rename-part".to_string(),
            spec: spec.to_string(),
            reason: "both names must be non-empty".to_string(),
        });
    }
    Ok((old.to_string(), new.to_string()))
}

/// Parse a part transposition specification of the form
/// `ID=SEMITONES[/OCTAVES]`, e.g. `P1=-3` or `Horn=+2/-1`.
pub fn parse_transpose_spec(spec: &str) -> Result<(String, PartTransposition), ConfigError> {
    let malformed = |reason: &str| ConfigError::MalformedSpec {
        option: "transpose-part".to_string(),
        spec: spec.to_string(),
        reason: reason.to_string(),
    };
    let (id, shift) = spec.split_once('=').ok_or_else(|| malformed("expected ID=SEMITONES[/OCTAVES]"))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(malformed("part id must be non-empty"));
    }
    let (semitones, octaves) = match shift.split_once('/') {
        Some((s, o)) => (s.trim(), Some(o.trim())),
        None => (shift.trim(), None),
    };
    let semitones: i32 = semitones
        .parse()
        .map_err(|_| malformed("semitone count is not an integer"))?;
    let octave_shift: i32 = match octaves {
        Some(o) => o.parse().map_err(|_| malformed("octave shift is not an integer"))?,
        None => 0,
    };
    Ok((
        id.to_string(),
        PartTransposition {
            semitones,
            octave_shift,
        },
    ))
}
