//! Tree traversal
//!
//! Output passes implement [`MsrVisitor`], overriding only the node types
//! they care about (every method defaults to a no-op). The `browse_*`
//! functions perform the synchronous, single-threaded, depth-first walk in
//! document order: `visit_start`, children in insertion order, `visit_end`.
//! Translators rely on that pairing to open a block on start and close it
//! on end.

use crate::msr::elements::{Barline, Clef, Key, Time};
use crate::msr::notes::{Chord, DoubleTremolo, GraceGroup, Harmony, Note, Tuplet, TupletMember};
use crate::msr::structure::{
    Direction, Measure, MeasureElement, Part, PartGroup, Repeat, RepeatEnding, Score, Staff, Voice,
    VoiceElement,
};

/// A pass over the MSR tree. All methods are no-ops by default.
#[allow(unused_variables)]
pub trait MsrVisitor {
    fn visit_start_score(&mut self, score: &Score) {}
    fn visit_end_score(&mut self, score: &Score) {}

    fn visit_start_part_group(&mut self, part_group: &PartGroup) {}
    fn visit_end_part_group(&mut self, part_group: &PartGroup) {}

    fn visit_start_part(&mut self, part: &Part) {}
    fn visit_end_part(&mut self, part: &Part) {}

    fn visit_start_staff(&mut self, staff: &Staff) {}
    fn visit_end_staff(&mut self, staff: &Staff) {}

    fn visit_start_voice(&mut self, voice: &Voice) {}
    fn visit_end_voice(&mut self, voice: &Voice) {}

    fn visit_start_measure(&mut self, measure: &Measure) {}
    fn visit_end_measure(&mut self, measure: &Measure) {}

    fn visit_start_repeat(&mut self, repeat: &Repeat) {}
    fn visit_end_repeat(&mut self, repeat: &Repeat) {}

    fn visit_start_repeat_ending(&mut self, ending: &RepeatEnding, total: u32) {}
    fn visit_end_repeat_ending(&mut self, ending: &RepeatEnding, total: u32) {}

    fn visit_start_note(&mut self, note: &Note) {}
    fn visit_end_note(&mut self, note: &Note) {}

    fn visit_start_chord(&mut self, chord: &Chord) {}
    fn visit_end_chord(&mut self, chord: &Chord) {}

    fn visit_start_tuplet(&mut self, tuplet: &Tuplet) {}
    fn visit_end_tuplet(&mut self, tuplet: &Tuplet) {}

    fn visit_start_grace_group(&mut self, grace_group: &GraceGroup) {}
    fn visit_end_grace_group(&mut self, grace_group: &GraceGroup) {}

    fn visit_start_double_tremolo(&mut self, tremolo: &DoubleTremolo) {}
    fn visit_end_double_tremolo(&mut self, tremolo: &DoubleTremolo) {}

    fn visit_harmony(&mut self, harmony: &Harmony) {}
    fn visit_clef(&mut self, clef: &Clef) {}
    fn visit_key(&mut self, key: &Key) {}
    fn visit_time(&mut self, time: &Time) {}
    fn visit_barline(&mut self, barline: &Barline) {}
    fn visit_direction(&mut self, direction: &Direction) {}
}

pub fn browse_score(score: &Score, visitor: &mut dyn MsrVisitor) {
    visitor.visit_start_score(score);
    for part_group in &score.part_groups {
        browse_part_group(part_group, visitor);
    }
    visitor.visit_end_score(score);
}

pub fn browse_part_group(part_group: &PartGroup, visitor: &mut dyn MsrVisitor) {
    visitor.visit_start_part_group(part_group);
    for part in &part_group.parts {
        browse_part(part, visitor);
    }
    visitor.visit_end_part_group(part_group);
}

pub fn browse_part(part: &Part, visitor: &mut dyn MsrVisitor) {
    visitor.visit_start_part(part);
    for staff in &part.staves {
        browse_staff(staff, visitor);
    }
    visitor.visit_end_part(part);
}

pub fn browse_staff(staff: &Staff, visitor: &mut dyn MsrVisitor) {
    visitor.visit_start_staff(staff);
    for voice in &staff.voices {
        browse_voice(voice, visitor);
    }
    visitor.visit_end_staff(staff);
}

pub fn browse_voice(voice: &Voice, visitor: &mut dyn MsrVisitor) {
    visitor.visit_start_voice(voice);
    for element in &voice.elements {
        match element {
            VoiceElement::Measure(measure) => browse_measure(measure, visitor),
            VoiceElement::Repeat(repeat) => browse_repeat(repeat, visitor),
        }
    }
    visitor.visit_end_voice(voice);
}

pub fn browse_repeat(repeat: &Repeat, visitor: &mut dyn MsrVisitor) {
    visitor.visit_start_repeat(repeat);
    for measure in &repeat.common {
        browse_measure(measure, visitor);
    }
    let total = repeat.endings.len() as u32;
    for ending in &repeat.endings {
        visitor.visit_start_repeat_ending(ending, total);
        for measure in &ending.measures {
            browse_measure(measure, visitor);
        }
        visitor.visit_end_repeat_ending(ending, total);
    }
    visitor.visit_end_repeat(repeat);
}

pub fn browse_measure(measure: &Measure, visitor: &mut dyn MsrVisitor) {
    visitor.visit_start_measure(measure);
    for element in &measure.elements {
        match element {
            MeasureElement::Clef(clef) => visitor.visit_clef(clef),
            MeasureElement::Key(key) => visitor.visit_key(key),
            MeasureElement::Time(time) => visitor.visit_time(time),
            MeasureElement::Barline(barline) => visitor.visit_barline(barline),
            MeasureElement::Note(note) => browse_note(note, visitor),
            MeasureElement::Chord(chord) => browse_chord(chord, visitor),
            MeasureElement::Tuplet(tuplet) => browse_tuplet(tuplet, visitor),
            MeasureElement::GraceGroup(grace_group) => browse_grace_group(grace_group, visitor),
            MeasureElement::DoubleTremolo(tremolo) => browse_double_tremolo(tremolo, visitor),
            MeasureElement::Harmony(harmony) => visitor.visit_harmony(harmony),
            MeasureElement::Direction(direction) => visitor.visit_direction(direction),
        }
    }
    visitor.visit_end_measure(measure);
}

pub fn browse_note(note: &Note, visitor: &mut dyn MsrVisitor) {
    visitor.visit_start_note(note);
    visitor.visit_end_note(note);
}

pub fn browse_chord(chord: &Chord, visitor: &mut dyn MsrVisitor) {
    visitor.visit_start_chord(chord);
    for note in &chord.notes {
        browse_note(note, visitor);
    }
    visitor.visit_end_chord(chord);
}

pub fn browse_tuplet(tuplet: &Tuplet, visitor: &mut dyn MsrVisitor) {
    visitor.visit_start_tuplet(tuplet);
    for member in &tuplet.members {
        match member {
            TupletMember::Note(note) => browse_note(note, visitor),
            TupletMember::Chord(chord) => browse_chord(chord, visitor),
            TupletMember::Tuplet(nested) => browse_tuplet(nested, visitor),
        }
    }
    visitor.visit_end_tuplet(tuplet);
}

pub fn browse_grace_group(grace_group: &GraceGroup, visitor: &mut dyn MsrVisitor) {
    visitor.visit_start_grace_group(grace_group);
    for note in &grace_group.notes {
        browse_note(note, visitor);
    }
    visitor.visit_end_grace_group(grace_group);
}

pub fn browse_double_tremolo(tremolo: &DoubleTremolo, visitor: &mut dyn MsrVisitor) {
    visitor.visit_start_double_tremolo(tremolo);
    browse_note(&tremolo.first, visitor);
    browse_note(&tremolo.second, visitor);
    visitor.visit_end_double_tremolo(tremolo);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msr::durations::{DurationKind, NoteDuration};
    use crate::msr::pitch::{Alteration, DiatonicStep, Pitch};
    use crate::msr::structure::Uplink;

    /// Records start/end events to check ordering
    #[derive(Default)]
    struct EventRecorder {
        events: Vec<String>,
    }

    impl MsrVisitor for EventRecorder {
        fn visit_start_measure(&mut self, measure: &Measure) {
            self.events.push(format!("+measure {}", measure.number));
        }
        fn visit_end_measure(&mut self, measure: &Measure) {
            self.events.push(format!("-measure {}", measure.number));
        }
        fn visit_start_note(&mut self, _note: &Note) {
            self.events.push("+note".to_string());
        }
        fn visit_end_note(&mut self, _note: &Note) {
            self.events.push("-note".to_string());
        }
    }

    #[test]
    fn walk_is_preorder_postorder_paired() {
        let mut measure = Measure::new(1, "1", Uplink::default());
        let quarter = NoteDuration::new(DurationKind::Quarter, 0);
        measure.append_element(MeasureElement::Note(Note::standalone(
            2,
            Pitch::new(DiatonicStep::C, Alteration::Natural, 4),
            quarter,
        )));
        measure.append_element(MeasureElement::Note(Note::rest(3, quarter)));

        let mut recorder = EventRecorder::default();
        browse_measure(&measure, &mut recorder);
        assert_eq!(
            recorder.events,
            vec![
                "+measure 1",
                "+note",
                "-note",
                "+note",
                "-note",
                "-measure 1"
            ]
        );
    }
}
