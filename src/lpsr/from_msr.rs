//! MSR → LPSR pass
//!
//! Applies the part-level adaptations (omit/keep filters, renames,
//! chromatic transpositions) and captures the header fields, producing
//! the LPSR tree the LilyPond translator walks. Options are validated
//! before this pass runs; filters here assume consistency.

use log::debug;

use crate::errors::Result;
use crate::msr::notes::{Chord, GraceGroup, Note, Tuplet, TupletMember};
use crate::msr::structure::{MeasureElement, Part, VoiceElement};
use crate::msr::Score;
use crate::options::{PartTransposition, TranslationOptions};

use super::{LpsrHeader, LpsrLayout, LpsrPaper, LpsrScore};

/// Build the LPSR wrapper from an MSR score.
pub fn lpsr_from_msr(score: &Score, options: &TranslationOptions) -> Result<LpsrScore> {
    options.validate()?;

    let mut adapted = score.clone();

    for part_group in &mut adapted.part_groups {
        part_group.parts.retain(|part| part_is_kept(part, options));
        for part in &mut part_group.parts {
            if let Some(new_name) = options.parts.renames.get(&part.name) {
                debug!(target: "lpsr", "renaming part '{}' to '{}'", part.name, new_name);
                part.name = new_name.clone();
            }
            if let Some(shift) = options.parts.transpositions.get(&part.id) {
                debug!(
                    target: "lpsr",
                    "transposing part '{}' by {} semitones, {} octaves",
                    part.id, shift.semitones, shift.octave_shift
                );
                transpose_part(part, shift);
            }
        }
    }
    adapted.part_groups.retain(|g| !g.parts.is_empty());

    Ok(LpsrScore {
        header: LpsrHeader {
            title: adapted.work_title.clone(),
            opus: adapted.work_number.clone(),
            composer: adapted.composer.clone(),
        },
        paper: LpsrPaper::default(),
        layout: LpsrLayout::default(),
        score: adapted,
    })
}

fn part_is_kept(part: &Part, options: &TranslationOptions) -> bool {
    let parts = &options.parts;
    if parts.omit_part_ids.contains(&part.id) || parts.omit_part_names.contains(&part.name) {
        return false;
    }
    if !parts.keep_part_ids.is_empty() && !parts.keep_part_ids.contains(&part.id) {
        return false;
    }
    if !parts.keep_part_names.is_empty() && !parts.keep_part_names.contains(&part.name) {
        return false;
    }
    true
}

fn transpose_part(part: &mut Part, shift: &PartTransposition) {
    for staff in &mut part.staves {
        for voice in &mut staff.voices {
            for element in &mut voice.elements {
                match element {
                    VoiceElement::Measure(measure) => {
                        for me in &mut measure.elements {
                            transpose_measure_element(me, shift);
                        }
                    }
                    VoiceElement::Repeat(repeat) => {
                        for measure in &mut repeat.common {
                            for me in &mut measure.elements {
                                transpose_measure_element(me, shift);
                            }
                        }
                        for ending in &mut repeat.endings {
                            for measure in &mut ending.measures {
                                for me in &mut measure.elements {
                                    transpose_measure_element(me, shift);
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn transpose_measure_element(element: &mut MeasureElement, shift: &PartTransposition) {
    match element {
        MeasureElement::Note(note) => transpose_note(note, shift),
        MeasureElement::Chord(chord) => transpose_chord(chord, shift),
        MeasureElement::Tuplet(tuplet) => transpose_tuplet(tuplet, shift),
        MeasureElement::GraceGroup(grace_group) => transpose_grace_group(grace_group, shift),
        MeasureElement::DoubleTremolo(tremolo) => {
            transpose_note(&mut tremolo.first, shift);
            transpose_note(&mut tremolo.second, shift);
        }
        MeasureElement::Harmony(harmony) => {
            let root = crate::msr::Pitch::new(harmony.root_step, harmony.root_alteration, 4)
                .transposed(shift.semitones, 0);
            harmony.root_step = root.step;
            harmony.root_alteration = root.alteration;
        }
        MeasureElement::Clef(_)
        | MeasureElement::Key(_)
        | MeasureElement::Time(_)
        | MeasureElement::Barline(_)
        | MeasureElement::Direction(_) => {}
    }
}

fn transpose_note(note: &mut Note, shift: &PartTransposition) {
    if let Some(pitch) = &note.pitch {
        note.pitch = Some(pitch.transposed(shift.semitones, shift.octave_shift));
    }
}

fn transpose_chord(chord: &mut Chord, shift: &PartTransposition) {
    for note in &mut chord.notes {
        transpose_note(note, shift);
    }
}

fn transpose_tuplet(tuplet: &mut Tuplet, shift: &PartTransposition) {
    for member in &mut tuplet.members {
        match member {
            TupletMember::Note(note) => transpose_note(note, shift),
            TupletMember::Chord(chord) => transpose_chord(chord, shift),
            TupletMember::Tuplet(nested) => transpose_tuplet(nested, shift),
        }
    }
}

fn transpose_grace_group(grace_group: &mut GraceGroup, shift: &PartTransposition) {
    for note in &mut grace_group.notes {
        transpose_note(note, shift);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msr::durations::{DurationKind, NoteDuration};
    use crate::msr::pitch::{Alteration, DiatonicStep, Pitch};
    use crate::msr::structure::{Measure, PartGroup, Staff, Uplink, Voice, VoiceKind};

    fn one_part_score(part_id: &str, part_name: &str) -> Score {
        let mut score = Score::new();
        let mut group = PartGroup::new(1);
        let mut part = Part::new(part_id, part_name);
        let mut staff = Staff::new(1);
        let mut voice = Voice::new(1, VoiceKind::Regular);
        let mut measure = Measure::new(1, "1", Uplink::default());
        measure.append_element(MeasureElement::Note(Note::standalone(
            2,
            Pitch::new(DiatonicStep::C, Alteration::Natural, 4),
            NoteDuration::new(DurationKind::Quarter, 0),
        )));
        voice.append_measure(measure);
        staff.append_voice(voice);
        part.append_staff(staff);
        group.append_part(part);
        score.append_part_group(group);
        score
    }

    #[test]
    fn omit_filter_drops_part() {
        let score = one_part_score("P1", "Flute");
        let mut options = TranslationOptions::default();
        options.parts.omit_part_ids.insert("P1".to_string());
        let lpsr = lpsr_from_msr(&score, &options).unwrap();
        assert!(lpsr.score.part_groups.is_empty());
    }

    #[test]
    fn keep_filter_keeps_only_named() {
        let score = one_part_score("P1", "Flute");
        let mut options = TranslationOptions::default();
        options.parts.keep_part_ids.insert("P2".to_string());
        let lpsr = lpsr_from_msr(&score, &options).unwrap();
        assert!(lpsr.score.part_groups.is_empty());

        let mut options = TranslationOptions::default();
        options.parts.keep_part_ids.insert("P1".to_string());
        let lpsr = lpsr_from_msr(&score, &options).unwrap();
        assert_eq!(lpsr.score.parts().count(), 1);
    }

    #[test]
    fn conflicting_filters_rejected_before_translation() {
        let score = one_part_score("P1", "Flute");
        let mut options = TranslationOptions::default();
        options.parts.omit_part_ids.insert("P1".to_string());
        options.parts.keep_part_ids.insert("P1".to_string());
        assert!(lpsr_from_msr(&score, &options).is_err());
    }

    #[test]
    fn rename_and_transpose_apply() {
        let score = one_part_score("P1", "Voice");
        let mut options = TranslationOptions::default();
        options
            .parts
            .renames
            .insert("Voice".to_string(), "Soprano".to_string());
        options.parts.transpositions.insert(
            "P1".to_string(),
            PartTransposition {
                semitones: 2,
                octave_shift: 1,
            },
        );
        let lpsr = lpsr_from_msr(&score, &options).unwrap();
        let part = lpsr.score.parts().next().unwrap();
        assert_eq!(part.name, "Soprano");
        let measure = part.staves[0].voices[0].measures().next().unwrap();
        match &measure.elements[0] {
            MeasureElement::Note(note) => {
                let pitch = note.pitch.unwrap();
                assert_eq!(pitch.step, DiatonicStep::D);
                assert_eq!(pitch.octave, 5);
            }
            other => panic!("unexpected element {:?}", other),
        }
    }
}
