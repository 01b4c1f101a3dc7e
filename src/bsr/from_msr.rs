//! MSR → BSR transcription pass
//!
//! A visitor over the MSR tree producing cell runs per voice. The octave
//! mark policy follows standard music braille: the first note of a voice
//! is always marked; after that a third or less is unmarked, a fourth or
//! fifth is marked only when the octave changes, and a sixth or more is
//! always marked.

use log::debug;

use crate::bsr::cells::{
    self, accidental_cell, clef_cells, interval_cell, note_cell, number_cells, octave_mark,
    rest_cell, Cell,
};
use crate::bsr::structure::{BsrMeasure, BsrScore, BsrVoice};
use crate::errors::{Result, SkippedElement, TranslationError};
use crate::msr::browse::{browse_score, MsrVisitor};
use crate::msr::durations::TupletFactor;
use crate::msr::elements::{Clef, Key, SlurKind, TieKind, Time, TimeSymbolKind};
use crate::msr::notes::{Chord, GraceGroup, Harmony, Note, NoteKind, Tuplet};
use crate::msr::pitch::Pitch;
use crate::msr::structure::{
    Measure, MeasureKind, Part, Repeat, RepeatEnding, Score, Staff, Voice, VoiceKind,
};
use crate::options::BrailleOptions;

/// Transcription result: the BSR tree plus the skip report
#[derive(Debug, Clone)]
pub struct BsrTranscription {
    pub score: BsrScore,
    pub skipped: Vec<SkippedElement>,
}

/// Transcribe an MSR score to an unlaid-out BSR tree.
pub fn bsr_from_msr(score: &Score, _options: &BrailleOptions) -> Result<BsrTranscription> {
    let mut transcriber = BsrTranscriber::new();
    transcriber.heading_from(score);
    browse_score(score, &mut transcriber);
    transcriber.finish()
}

struct BsrTranscriber {
    score: BsrScore,
    voice: Option<BsrVoice>,
    measure: Option<BsrMeasure>,
    measure_counter: u32,

    // octave mark policy state
    previous_pitch: Option<Pitch>,

    in_harmony_voice: bool,
    in_chord: bool,
    /// Cells prepended to the next measure (repeat ending numbers)
    pending_measure_prefix: Vec<Cell>,
    chord_first_pitch: Option<Pitch>,
    tuplet_stack: Vec<TupletFactor>,

    current_part_id: String,
    current_staff_number: u32,
    current_measure_number: String,

    skipped: Vec<SkippedElement>,
    error: Option<TranslationError>,
}

impl BsrTranscriber {
    fn new() -> Self {
        BsrTranscriber {
            score: BsrScore::new(),
            voice: None,
            measure: None,
            measure_counter: 0,
            previous_pitch: None,
            in_harmony_voice: false,
            in_chord: false,
            pending_measure_prefix: Vec::new(),
            chord_first_pitch: None,
            tuplet_stack: Vec::new(),
            current_part_id: String::new(),
            current_staff_number: 0,
            current_measure_number: String::new(),
            skipped: Vec::new(),
            error: None,
        }
    }

    fn finish(self) -> Result<BsrTranscription> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(BsrTranscription {
                score: self.score,
                skipped: self.skipped,
            }),
        }
    }

    fn heading_from(&mut self, score: &Score) {
        let mut text = String::new();
        if let Some(title) = &score.work_title {
            text.push_str(title);
        }
        if let Some(composer) = &score.composer {
            if !text.is_empty() {
                text.push_str("  ");
            }
            text.push_str(composer);
        }
        self.score.heading = literary_cells(&text);
    }

    fn halted(&self) -> bool {
        self.error.is_some() || self.in_harmony_voice
    }

    fn push_cells(&mut self, new_cells: &[Cell]) {
        if let Some(measure) = &mut self.measure {
            measure.cells.extend_from_slice(new_cells);
        } else if let Some(voice) = &mut self.voice {
            // Attributes before the first measure become the signature.
            voice.signature.extend_from_slice(new_cells);
        }
    }

    fn record_skipped(&mut self, element_type: &str, reason: &str) {
        self.skipped.push(SkippedElement {
            element_type: element_type.to_string(),
            measure_number: if self.current_measure_number.is_empty() {
                None
            } else {
                Some(self.current_measure_number.clone())
            },
            part_id: if self.current_part_id.is_empty() {
                None
            } else {
                Some(self.current_part_id.clone())
            },
            reason: reason.to_string(),
        });
    }

    fn needs_octave_mark(&self, pitch: &Pitch) -> bool {
        match &self.previous_pitch {
            None => true,
            Some(previous) => {
                let interval = (pitch.diatonic_ordinal() - previous.diatonic_ordinal()).abs();
                if interval <= 2 {
                    false
                } else if interval <= 4 {
                    pitch.octave != previous.octave
                } else {
                    true
                }
            }
        }
    }

    fn transcribe_pitched_note(&mut self, note: &Note, pitch: &Pitch) {
        let mut run: Vec<Cell> = Vec::new();
        run.extend(accidental_cell(pitch.alteration));
        if self.needs_octave_mark(pitch) {
            run.push(octave_mark(pitch.octave));
        }
        run.push(note_cell(pitch.step, note.duration.kind));
        for _ in 0..note.duration.dots {
            run.push(cells::AUGMENTATION_DOT);
        }
        self.previous_pitch = Some(*pitch);
        self.push_cells(&run);
        self.transcribe_note_suffixes(note);
    }

    fn transcribe_note_suffixes(&mut self, note: &Note) {
        if matches!(note.tie, Some(TieKind::Start) | Some(TieKind::Continue)) {
            self.push_cells(&cells::TIE);
        }
        let slur_starts: Vec<Cell> = note
            .attachments
            .slurs
            .iter()
            .filter(|s| s.kind == SlurKind::Start)
            .map(|_| cells::SLUR)
            .collect();
        self.push_cells(&slur_starts);
    }

    fn transcribe_rest(&mut self, note: &Note) {
        let mut run = vec![rest_cell(note.duration.kind)];
        for _ in 0..note.duration.dots {
            run.push(cells::AUGMENTATION_DOT);
        }
        self.push_cells(&run);
    }
}

impl MsrVisitor for BsrTranscriber {
    fn visit_start_part(&mut self, part: &Part) {
        if self.error.is_some() {
            return;
        }
        debug!(target: "bsr", "transcribing part {} ({})", part.id, part.name);
        self.current_part_id = part.id.clone();
    }

    fn visit_start_staff(&mut self, staff: &Staff) {
        self.current_staff_number = staff.number;
    }

    fn visit_start_voice(&mut self, voice: &Voice) {
        if self.error.is_some() {
            return;
        }
        self.in_harmony_voice = voice.kind == VoiceKind::Harmony;
        if self.in_harmony_voice {
            self.record_skipped("harmony-voice", "chord symbols are not transcribed to braille");
            return;
        }
        self.voice = Some(BsrVoice::new(
            self.current_part_id.clone(),
            self.current_staff_number,
            voice.number,
        ));
        self.measure_counter = 0;
        self.previous_pitch = None;
    }

    fn visit_end_voice(&mut self, _voice: &Voice) {
        if self.error.is_some() {
            return;
        }
        if self.in_harmony_voice {
            self.in_harmony_voice = false;
            return;
        }
        if let Some(mut finished) = self.voice.take() {
            // Final double bar after the last measure.
            if let Some(last) = finished.measures.last_mut() {
                last.cells.extend_from_slice(&cells::FINAL_BARLINE);
            }
            self.score.voices.push(finished);
        }
    }

    fn visit_start_measure(&mut self, measure: &Measure) {
        if self.halted() {
            return;
        }
        self.current_measure_number = measure.number.clone();
        self.measure_counter += 1;
        let mut transcribed = BsrMeasure::new(measure.number.clone(), self.measure_counter);
        transcribed.cells.append(&mut self.pending_measure_prefix);
        if measure.kind == MeasureKind::Empty {
            transcribed
                .cells
                .push(rest_cell(crate::msr::durations::DurationKind::Whole));
        }
        self.measure = Some(transcribed);
    }

    fn visit_end_measure(&mut self, _measure: &Measure) {
        if self.halted() {
            return;
        }
        if let (Some(finished), Some(voice)) = (self.measure.take(), self.voice.as_mut()) {
            voice.measures.push(finished);
        }
    }

    fn visit_end_repeat(&mut self, _repeat: &Repeat) {
        if self.halted() {
            return;
        }
        if let Some(voice) = self.voice.as_mut() {
            if let Some(last) = voice.measures.last_mut() {
                last.cells.extend_from_slice(&cells::DOUBLE_BARLINE);
            }
        }
    }

    fn visit_start_repeat_ending(&mut self, ending: &RepeatEnding, _total: u32) {
        if self.halted() {
            return;
        }
        // The ending number prefixes the ending's first measure.
        self.pending_measure_prefix = number_cells(ending.number);
    }

    fn visit_start_note(&mut self, note: &Note) {
        if self.halted() {
            return;
        }
        if self.in_chord {
            if let Some(pitch) = &note.pitch {
                match self.chord_first_pitch {
                    None => {
                        self.chord_first_pitch = Some(*pitch);
                        let pitch = *pitch;
                        self.transcribe_pitched_note(note, &pitch);
                    }
                    Some(first) => {
                        let interval =
                            (pitch.diatonic_ordinal() - first.diatonic_ordinal()).unsigned_abs();
                        let simple = (interval % 7) + 1;
                        self.push_cells(&[interval_cell(simple)]);
                    }
                }
            }
            return;
        }
        match note.kind {
            NoteKind::Rest | NoteKind::Skip => self.transcribe_rest(note),
            _ => match &note.pitch {
                Some(pitch) => {
                    let pitch = *pitch;
                    self.transcribe_pitched_note(note, &pitch);
                }
                None => self.transcribe_rest(note),
            },
        }
    }

    fn visit_start_chord(&mut self, _chord: &Chord) {
        if self.halted() {
            return;
        }
        self.in_chord = true;
        self.chord_first_pitch = None;
    }

    fn visit_end_chord(&mut self, _chord: &Chord) {
        self.in_chord = false;
    }

    fn visit_start_tuplet(&mut self, tuplet: &Tuplet) {
        if self.halted() {
            return;
        }
        let own = match self.tuplet_stack.last() {
            Some(outer) => tuplet.factor.unapplied_from(outer),
            None => tuplet.factor,
        };
        if own.actual_notes == 3 && own.normal_notes == 2 {
            self.push_cells(&[cells::TRIPLET]);
        } else {
            let mut run = vec![cells::TUPLET_PREFIX];
            run.extend(number_cells(own.actual_notes.unsigned_abs() as u32));
            run.push(cells::TUPLET_TERMINATOR);
            self.push_cells(&run);
        }
        self.tuplet_stack.push(tuplet.factor);
    }

    fn visit_end_tuplet(&mut self, _tuplet: &Tuplet) {
        self.tuplet_stack.pop();
    }

    fn visit_start_grace_group(&mut self, _grace_group: &GraceGroup) {
        if self.halted() {
            return;
        }
        // Appoggiatura sign before each grace run.
        self.push_cells(&[Cell::from_dots(&[5]), Cell::from_dots(&[2, 6])]);
    }

    fn visit_harmony(&mut self, _harmony: &Harmony) {
        if self.error.is_some() {
            return;
        }
        if !self.in_harmony_voice {
            self.record_skipped("harmony", "chord symbols are not transcribed to braille");
        }
    }

    fn visit_clef(&mut self, clef: &Clef) {
        if self.halted() {
            return;
        }
        self.push_cells(&clef_cells(clef.kind));
    }

    fn visit_key(&mut self, key: &Key) {
        if self.halted() {
            return;
        }
        let count = key.fifths.unsigned_abs();
        let accidental = if key.fifths >= 0 { cells::SHARP } else { cells::FLAT };
        let mut run = Vec::new();
        if count == 0 {
            return;
        } else if count <= 3 {
            run.extend(std::iter::repeat(accidental).take(count as usize));
        } else {
            run.extend(number_cells(count));
            run.push(accidental);
        }
        self.push_cells(&run);
    }

    fn visit_time(&mut self, time: &Time) {
        if self.halted() {
            return;
        }
        if time.symbol == TimeSymbolKind::SenzaMisura || time.items.is_empty() {
            return;
        }
        let item = &time.items[0];
        let numerator: i64 = item.beats.iter().sum();
        let mut run = vec![cells::NUMBER_SIGN];
        run.extend(cells::upper_digit_cells(numerator.unsigned_abs() as u32));
        run.extend(cells::lower_digit_cells(item.beat_value.unsigned_abs() as u32));
        self.push_cells(&run);
    }
}

/// Literary braille for headings: letters, digits, spaces; anything else
/// is dropped. Uppercase letters take the capital sign.
pub fn literary_cells(text: &str) -> Vec<Cell> {
    const CAPITAL: Cell = Cell::from_dots(&[6]);
    const LETTERS: [Cell; 26] = [
        Cell::from_dots(&[1]),
        Cell::from_dots(&[1, 2]),
        Cell::from_dots(&[1, 4]),
        Cell::from_dots(&[1, 4, 5]),
        Cell::from_dots(&[1, 5]),
        Cell::from_dots(&[1, 2, 4]),
        Cell::from_dots(&[1, 2, 4, 5]),
        Cell::from_dots(&[1, 2, 5]),
        Cell::from_dots(&[2, 4]),
        Cell::from_dots(&[2, 4, 5]),
        Cell::from_dots(&[1, 3]),
        Cell::from_dots(&[1, 2, 3]),
        Cell::from_dots(&[1, 3, 4]),
        Cell::from_dots(&[1, 3, 4, 5]),
        Cell::from_dots(&[1, 3, 5]),
        Cell::from_dots(&[1, 2, 3, 4]),
        Cell::from_dots(&[1, 2, 3, 4, 5]),
        Cell::from_dots(&[1, 2, 3, 5]),
        Cell::from_dots(&[2, 3, 4]),
        Cell::from_dots(&[2, 3, 4, 5]),
        Cell::from_dots(&[1, 3, 6]),
        Cell::from_dots(&[1, 2, 3, 6]),
        Cell::from_dots(&[2, 4, 5, 6]),
        Cell::from_dots(&[1, 3, 4, 6]),
        Cell::from_dots(&[1, 3, 4, 5, 6]),
        Cell::from_dots(&[1, 3, 5, 6]),
    ];
    let mut out = Vec::new();
    let mut number_mode = false;
    for c in text.chars() {
        match c {
            'a'..='z' => {
                number_mode = false;
                out.push(LETTERS[(c as u8 - b'a') as usize]);
            }
            'A'..='Z' => {
                number_mode = false;
                out.push(CAPITAL);
                out.push(LETTERS[(c as u8 - b'A') as usize]);
            }
            '0'..='9' => {
                if !number_mode {
                    out.push(cells::NUMBER_SIGN);
                    number_mode = true;
                }
                out.push(cells::upper_digit(c as u8 - b'0'));
            }
            ' ' => {
                number_mode = false;
                out.push(Cell::BLANK);
            }
            _ => {}
        }
    }
    out
}
