//! Debug dump pass
//!
//! An independent visitor pass that renders the MSR tree as an indented
//! textual outline. Serves the exit-after-pass debug option and doubles as
//! a demonstration that passes can be added without touching the model.

use std::fmt::Write as _;

use crate::msr::browse::{browse_score, MsrVisitor};
use crate::msr::elements::{Barline, Clef, Key, Time};
use crate::msr::notes::{Chord, DoubleTremolo, GraceGroup, Harmony, Note, Tuplet};
use crate::msr::structure::{
    Direction, Measure, Part, PartGroup, Repeat, RepeatEnding, Score, Staff, Voice,
};

/// Render an indented outline of the whole score tree.
pub fn dump_score(score: &Score) -> String {
    let mut printer = MsrPrinter::default();
    browse_score(score, &mut printer);
    printer.output
}

#[derive(Default)]
struct MsrPrinter {
    output: String,
    depth: usize,
}

impl MsrPrinter {
    fn line(&mut self, text: impl AsRef<str>) {
        let _ = writeln!(
            self.output,
            "{}{}",
            "  ".repeat(self.depth),
            text.as_ref()
        );
    }
}

impl MsrVisitor for MsrPrinter {
    fn visit_start_score(&mut self, score: &Score) {
        self.line(format!(
            "Score \"{}\"",
            score.work_title.as_deref().unwrap_or("(untitled)")
        ));
        self.depth += 1;
    }
    fn visit_end_score(&mut self, _score: &Score) {
        self.depth -= 1;
    }

    fn visit_start_part_group(&mut self, part_group: &PartGroup) {
        self.line(format!(
            "PartGroup {} symbol={:?}",
            part_group.number, part_group.symbol
        ));
        self.depth += 1;
    }
    fn visit_end_part_group(&mut self, _part_group: &PartGroup) {
        self.depth -= 1;
    }

    fn visit_start_part(&mut self, part: &Part) {
        self.line(format!(
            "Part {} \"{}\" divisions={}",
            part.id, part.name, part.divisions_per_quarter
        ));
        self.depth += 1;
    }
    fn visit_end_part(&mut self, _part: &Part) {
        self.depth -= 1;
    }

    fn visit_start_staff(&mut self, staff: &Staff) {
        self.line(format!("Staff {}", staff.number));
        self.depth += 1;
    }
    fn visit_end_staff(&mut self, _staff: &Staff) {
        self.depth -= 1;
    }

    fn visit_start_voice(&mut self, voice: &Voice) {
        self.line(format!("Voice {} kind={:?}", voice.number, voice.kind));
        self.depth += 1;
    }
    fn visit_end_voice(&mut self, _voice: &Voice) {
        self.depth -= 1;
    }

    fn visit_start_measure(&mut self, measure: &Measure) {
        self.line(format!(
            "Measure {} kind={:?} length={}/{} (line {})",
            measure.number,
            measure.kind,
            measure.actual_length.numer(),
            measure.actual_length.denom(),
            measure.input_line
        ));
        self.depth += 1;
    }
    fn visit_end_measure(&mut self, _measure: &Measure) {
        self.depth -= 1;
    }

    fn visit_start_repeat(&mut self, repeat: &Repeat) {
        self.line(format!("Repeat endings={}", repeat.endings.len()));
        self.depth += 1;
    }
    fn visit_end_repeat(&mut self, _repeat: &Repeat) {
        self.depth -= 1;
    }

    fn visit_start_repeat_ending(&mut self, ending: &RepeatEnding, total: u32) {
        self.line(format!("Ending {}/{}", ending.number, total));
        self.depth += 1;
    }
    fn visit_end_repeat_ending(&mut self, _ending: &RepeatEnding, _total: u32) {
        self.depth -= 1;
    }

    fn visit_start_note(&mut self, note: &Note) {
        match &note.pitch {
            Some(pitch) => self.line(format!(
                "Note {:?} {}{} octave={} {}",
                note.kind,
                pitch.lilypond_name(),
                ".".repeat(note.duration.dots as usize),
                pitch.octave,
                note.duration.lilypond_string()
            )),
            None => self.line(format!(
                "Note {:?} {}",
                note.kind,
                note.duration.lilypond_string()
            )),
        }
    }

    fn visit_start_chord(&mut self, chord: &Chord) {
        self.line(format!("Chord of {}", chord.notes.len()));
        self.depth += 1;
    }
    fn visit_end_chord(&mut self, _chord: &Chord) {
        self.depth -= 1;
    }

    fn visit_start_tuplet(&mut self, tuplet: &Tuplet) {
        self.line(format!(
            "Tuplet {}/{}",
            tuplet.factor.actual_notes, tuplet.factor.normal_notes
        ));
        self.depth += 1;
    }
    fn visit_end_tuplet(&mut self, _tuplet: &Tuplet) {
        self.depth -= 1;
    }

    fn visit_start_grace_group(&mut self, grace_group: &GraceGroup) {
        self.line(format!(
            "GraceGroup slash={} notes={}",
            grace_group.slash,
            grace_group.notes.len()
        ));
        self.depth += 1;
    }
    fn visit_end_grace_group(&mut self, _grace_group: &GraceGroup) {
        self.depth -= 1;
    }

    fn visit_start_double_tremolo(&mut self, tremolo: &DoubleTremolo) {
        self.line(format!("DoubleTremolo marks={}", tremolo.marks_number));
        self.depth += 1;
    }
    fn visit_end_double_tremolo(&mut self, _tremolo: &DoubleTremolo) {
        self.depth -= 1;
    }

    fn visit_harmony(&mut self, harmony: &Harmony) {
        self.line(format!(
            "Harmony {}{:?}",
            harmony.root_step.lilypond_name(),
            harmony.kind
        ));
    }
    fn visit_clef(&mut self, clef: &Clef) {
        self.line(format!("Clef {:?}", clef.kind));
    }
    fn visit_key(&mut self, key: &Key) {
        self.line(format!("Key fifths={} mode={:?}", key.fifths, key.mode));
    }
    fn visit_time(&mut self, time: &Time) {
        self.line(format!("Time {:?} items={}", time.symbol, time.items.len()));
    }
    fn visit_barline(&mut self, barline: &Barline) {
        self.line(format!("Barline {:?} {:?}", barline.location, barline.style));
    }
    fn visit_direction(&mut self, direction: &Direction) {
        self.line(format!("Direction {:?}", direction));
    }
}
