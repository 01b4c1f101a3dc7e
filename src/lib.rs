//! MusicXML to LilyPond and braille music translation
//!
//! The pipeline runs in passes over immutable trees:
//!
//! ```text
//! MusicXML text -> MSR -> LPSR -> LilyPond source
//!                    `--> BSR  -> braille byte stream
//! ```
//!
//! The MSR (Music Score Representation) is the format-neutral score tree
//! the front-end builds; the LPSR wraps it with LilyPond document blocks;
//! the BSR holds braille cell runs and their page layout. Each pass walks
//! its input with a visitor and writes to its own output, so a tree is
//! never mutated after construction.
//!
//! [`translate_musicxml_to_lilypond`] and [`translate_musicxml_to_braille`]
//! run the whole pipeline; the pass-level functions are for callers that
//! already hold an intermediate tree.

pub mod bsr;
pub mod errors;
pub mod lilypond;
pub mod lpsr;
pub mod msr;
pub mod musicxml;
pub mod options;

use std::io::Write;

use log::info;

use crate::bsr::{bsr_from_msr, finalize_bsr, write_bsr, BsrTranscription};
use crate::errors::{Result, SkippedElement};
use crate::lilypond::generate_lilypond;
use crate::lpsr::lpsr_from_msr;
use crate::msr::Score;
use crate::options::{PassKind, TranslationOptions};

pub use crate::errors::{ConfigError, ParseError, TranslationError};

/// What a translation run produced: the textual output (LilyPond source,
/// or a debug dump when `exit_after_pass` is set) plus the skip report.
#[derive(Debug, Clone)]
pub struct TranslationResult {
    pub output: String,
    pub skipped: Vec<SkippedElement>,
}

/// Translate MusicXML text to a LilyPond document.
pub fn translate_musicxml_to_lilypond(
    xml: &str,
    options: &TranslationOptions,
) -> Result<TranslationResult> {
    options.validate()?;
    let parsed = musicxml::build_score(xml)?;
    info!(
        target: "pipeline",
        "MSR built: {} part groups, {} skipped elements",
        parsed.score.part_groups.len(),
        parsed.skipped.len()
    );
    if options.exit_after_pass == Some(PassKind::Msr) {
        return Ok(TranslationResult {
            output: msr::display::dump_score(&parsed.score),
            skipped: parsed.skipped,
        });
    }
    let mut result = msr_to_lilypond(&parsed.score, options)?;
    let mut skipped = parsed.skipped;
    skipped.append(&mut result.skipped);
    result.skipped = skipped;
    Ok(result)
}

/// Translate an MSR score to a LilyPond document.
pub fn msr_to_lilypond(score: &Score, options: &TranslationOptions) -> Result<TranslationResult> {
    let lpsr = lpsr_from_msr(score, options)?;
    if options.exit_after_pass == Some(PassKind::Lpsr) {
        return Ok(TranslationResult {
            output: lpsr.debug_dump(),
            skipped: Vec::new(),
        });
    }
    let generated = generate_lilypond(&lpsr, &options.lilypond)?;
    Ok(TranslationResult {
        output: generated.source,
        skipped: generated.skipped,
    })
}

/// Translate MusicXML text to braille, writing the encoded byte stream to
/// `out`. The returned result carries the skip report; its output text is
/// empty unless `exit_after_pass` asked for a debug dump.
pub fn translate_musicxml_to_braille<W: Write>(
    xml: &str,
    options: &TranslationOptions,
    out: &mut W,
) -> Result<TranslationResult> {
    options.validate()?;
    let parsed = musicxml::build_score(xml)?;
    if options.exit_after_pass == Some(PassKind::Msr) {
        return Ok(TranslationResult {
            output: msr::display::dump_score(&parsed.score),
            skipped: parsed.skipped,
        });
    }
    let transcription = msr_to_bsr(&parsed.score, options)?;
    let mut skipped = parsed.skipped;
    skipped.extend(transcription.skipped.iter().cloned());
    if options.exit_after_pass == Some(PassKind::Bsr) {
        return Ok(TranslationResult {
            output: transcription.score.debug_dump(),
            skipped,
        });
    }
    bsr_to_braille(&transcription.score, options, out)?;
    Ok(TranslationResult {
        output: String::new(),
        skipped,
    })
}

/// Transcribe an MSR score to a finalized (laid-out) BSR score.
pub fn msr_to_bsr(score: &Score, options: &TranslationOptions) -> Result<BsrTranscription> {
    let mut transcription = bsr_from_msr(score, &options.braille)?;
    finalize_bsr(&mut transcription.score, &options.braille)?;
    info!(
        target: "pipeline",
        "BSR finalized: {} voices, {} pages",
        transcription.score.voices.len(),
        transcription.score.pages.len()
    );
    Ok(transcription)
}

/// Serialize a finalized BSR score to a writer.
pub fn bsr_to_braille<W: Write>(
    score: &bsr::BsrScore,
    options: &TranslationOptions,
    out: &mut W,
) -> Result<()> {
    write_bsr(score, &options.braille, out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ScoreOutputKind;

    const SIMPLE: &str = concat!(
        "<score-partwise version=\"3.1\">",
        "<part-list><score-part id=\"P1\"><part-name>Music</part-name></score-part></part-list>",
        "<part id=\"P1\"><measure number=\"1\">",
        "<attributes><divisions>1</divisions>",
        "<key><fifths>0</fifths></key>",
        "<time><beats>4</beats><beat-type>4</beat-type></time>",
        "<clef><sign>G</sign><line>2</line></clef></attributes>",
        "<note><pitch><step>C</step><octave>4</octave></pitch>",
        "<duration>1</duration><voice>1</voice><type>quarter</type></note>",
        "<note><rest/><duration>1</duration><voice>1</voice><type>quarter</type></note>",
        "<note><pitch><step>C</step><octave>4</octave></pitch>",
        "<duration>1</duration><voice>1</voice><type>quarter</type></note>",
        "<note><rest/><duration>1</duration><voice>1</voice><type>quarter</type></note>",
        "</measure></part></score-partwise>"
    );

    #[test]
    fn quarter_and_rest_scenario() {
        // The rest must preserve the relative-octave reference, so the
        // second c needs no octave mark at all.
        let result =
            translate_musicxml_to_lilypond(SIMPLE, &TranslationOptions::default()).unwrap();
        assert!(result.output.contains("c'4 r4 c4 r4"), "{}", result.output);
    }

    #[test]
    fn exit_after_msr_returns_a_dump() {
        let mut options = TranslationOptions::default();
        options.exit_after_pass = Some(PassKind::Msr);
        let result = translate_musicxml_to_lilypond(SIMPLE, &options).unwrap();
        assert!(result.output.contains("P1"));
        assert!(!result.output.contains("\\version"));
    }

    #[test]
    fn braille_pipeline_writes_bytes() {
        let mut options = TranslationOptions::default();
        options.output = ScoreOutputKind::Braille;
        let mut bytes = Vec::new();
        let result = translate_musicxml_to_braille(SIMPLE, &options, &mut bytes).unwrap();
        assert!(result.output.is_empty());
        assert!(!bytes.is_empty());
        let text = String::from_utf8(bytes).unwrap();
        // Every music cell is a braille pattern or layout whitespace.
        assert!(text
            .chars()
            .all(|c| ('\u{2800}'..='\u{28ff}').contains(&c) || c == '\n' || c == '\u{0c}'));
    }

    #[test]
    fn invalid_configuration_is_rejected_before_parsing() {
        let mut options = TranslationOptions::default();
        options.parts.omit_part_ids.insert("P1".to_string());
        options.parts.keep_part_ids.insert("P2".to_string());
        let err = translate_musicxml_to_lilypond("not xml at all", &options).unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }
}
