//! Pitch representation
//!
//! Pitches are diatonic step + alteration + octave, with MusicXML octave
//! numbering (octave 4 contains middle C). The diatonic ordinal
//! (`octave * 7 + step`) is the quantity the relative-octave algorithm in
//! the LilyPond translator works on.

use serde::{Deserialize, Serialize};

/// Diatonic step, C through B
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiatonicStep {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl DiatonicStep {
    /// Index within the octave, C = 0 .. B = 6
    pub fn index(self) -> i32 {
        match self {
            DiatonicStep::C => 0,
            DiatonicStep::D => 1,
            DiatonicStep::E => 2,
            DiatonicStep::F => 3,
            DiatonicStep::G => 4,
            DiatonicStep::A => 5,
            DiatonicStep::B => 6,
        }
    }

    /// Semitones above C within the octave
    pub fn semitones(self) -> i32 {
        match self {
            DiatonicStep::C => 0,
            DiatonicStep::D => 2,
            DiatonicStep::E => 4,
            DiatonicStep::F => 5,
            DiatonicStep::G => 7,
            DiatonicStep::A => 9,
            DiatonicStep::B => 11,
        }
    }

    pub fn from_index(index: i32) -> DiatonicStep {
        match index.rem_euclid(7) {
            0 => DiatonicStep::C,
            1 => DiatonicStep::D,
            2 => DiatonicStep::E,
            3 => DiatonicStep::F,
            4 => DiatonicStep::G,
            5 => DiatonicStep::A,
            _ => DiatonicStep::B,
        }
    }

    pub fn parse(text: &str) -> Option<DiatonicStep> {
        match text {
            "C" => Some(DiatonicStep::C),
            "D" => Some(DiatonicStep::D),
            "E" => Some(DiatonicStep::E),
            "F" => Some(DiatonicStep::F),
            "G" => Some(DiatonicStep::G),
            "A" => Some(DiatonicStep::A),
            "B" => Some(DiatonicStep::B),
            _ => None,
        }
    }

    /// LilyPond (nederlands) note letter
    pub fn lilypond_name(self) -> &'static str {
        match self {
            DiatonicStep::C => "c",
            DiatonicStep::D => "d",
            DiatonicStep::E => "e",
            DiatonicStep::F => "f",
            DiatonicStep::G => "g",
            DiatonicStep::A => "a",
            DiatonicStep::B => "b",
        }
    }
}

/// Chromatic alteration of a diatonic step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alteration {
    DoubleFlat,
    Flat,
    Natural,
    Sharp,
    DoubleSharp,
}

impl Alteration {
    pub fn semitones(self) -> i32 {
        match self {
            Alteration::DoubleFlat => -2,
            Alteration::Flat => -1,
            Alteration::Natural => 0,
            Alteration::Sharp => 1,
            Alteration::DoubleSharp => 2,
        }
    }

    pub fn from_semitones(semitones: i32) -> Option<Alteration> {
        match semitones {
            -2 => Some(Alteration::DoubleFlat),
            -1 => Some(Alteration::Flat),
            0 => Some(Alteration::Natural),
            1 => Some(Alteration::Sharp),
            2 => Some(Alteration::DoubleSharp),
            _ => None,
        }
    }

    /// LilyPond (nederlands) alteration suffix
    pub fn lilypond_suffix(self) -> &'static str {
        match self {
            Alteration::DoubleFlat => "eses",
            Alteration::Flat => "es",
            Alteration::Natural => "",
            Alteration::Sharp => "is",
            Alteration::DoubleSharp => "isis",
        }
    }
}

/// A concrete pitch: step, alteration, MusicXML octave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pitch {
    pub step: DiatonicStep,
    pub alteration: Alteration,
    pub octave: i32,
}

impl Pitch {
    pub fn new(step: DiatonicStep, alteration: Alteration, octave: i32) -> Self {
        Pitch {
            step,
            alteration,
            octave,
        }
    }

    /// Diatonic ordinal: one value per staff position, 7 per octave.
    /// Middle C (C4) is 28.
    pub fn diatonic_ordinal(&self) -> i32 {
        self.octave * 7 + self.step.index()
    }

    /// MIDI-style absolute semitone number (C4 = 60)
    pub fn chromatic_number(&self) -> i32 {
        (self.octave + 1) * 12 + self.step.semitones() + self.alteration.semitones()
    }

    /// LilyPond note name without octave marks, e.g. `cis`
    pub fn lilypond_name(&self) -> String {
        format!(
            "{}{}",
            self.step.lilypond_name(),
            self.alteration.lilypond_suffix()
        )
    }

    /// Transpose chromatically, respelling to a fixed per-pitch-class table.
    pub fn transposed(&self, semitones: i32, octave_shift: i32) -> Pitch {
        let chromatic = self.chromatic_number() + semitones;
        let (step, alteration) = spell_pitch_class(chromatic.rem_euclid(12));
        // Octave derives from the spelled step so Cb/B# land correctly.
        let octave = (chromatic - step.semitones() - alteration.semitones()) / 12 - 1;
        Pitch {
            step,
            alteration,
            octave: octave + octave_shift,
        }
    }
}

/// Canonical spelling for each pitch class, mixing the common sharp and
/// flat choices (C# D Eb E F F# G Ab A Bb B).
fn spell_pitch_class(pitch_class: i32) -> (DiatonicStep, Alteration) {
    match pitch_class {
        0 => (DiatonicStep::C, Alteration::Natural),
        1 => (DiatonicStep::C, Alteration::Sharp),
        2 => (DiatonicStep::D, Alteration::Natural),
        3 => (DiatonicStep::E, Alteration::Flat),
        4 => (DiatonicStep::E, Alteration::Natural),
        5 => (DiatonicStep::F, Alteration::Natural),
        6 => (DiatonicStep::F, Alteration::Sharp),
        7 => (DiatonicStep::G, Alteration::Natural),
        8 => (DiatonicStep::A, Alteration::Flat),
        9 => (DiatonicStep::A, Alteration::Natural),
        10 => (DiatonicStep::B, Alteration::Flat),
        _ => (DiatonicStep::B, Alteration::Natural),
    }
}

/// Octave marks for a pitch relative to the previously emitted reference
/// ordinal. With no reference the marks are absolute (octave 3 carries no
/// mark, so C4 renders as `c'`). With a reference, the unmarked reading is
/// the octave that lands the step within a fourth of the reference; each
/// mark moves the note one octave from there.
pub fn relative_octave_marks(reference: Option<i32>, pitch: &Pitch) -> i32 {
    match reference {
        None => pitch.octave - 3,
        Some(reference_ordinal) => {
            let candidate = pitch.diatonic_ordinal();
            // Unique ordinal congruent to the candidate step inside the
            // seven-value window centered on the reference.
            let offset = (candidate - reference_ordinal + 3).rem_euclid(7) - 3;
            let default_ordinal = reference_ordinal + offset;
            (candidate - default_ordinal) / 7
        }
    }
}

/// Render octave marks: apostrophes up, commas down.
pub fn octave_marks_string(marks: i32) -> String {
    if marks >= 0 {
        "'".repeat(marks as usize)
    } else {
        ",".repeat((-marks) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pitch(step: DiatonicStep, octave: i32) -> Pitch {
        Pitch::new(step, Alteration::Natural, octave)
    }

    #[test]
    fn middle_c_ordinal() {
        assert_eq!(pitch(DiatonicStep::C, 4).diatonic_ordinal(), 28);
        assert_eq!(pitch(DiatonicStep::C, 4).chromatic_number(), 60);
    }

    #[test]
    fn first_note_marks_are_absolute() {
        assert_eq!(relative_octave_marks(None, &pitch(DiatonicStep::C, 4)), 1);
        assert_eq!(relative_octave_marks(None, &pitch(DiatonicStep::C, 3)), 0);
        assert_eq!(relative_octave_marks(None, &pitch(DiatonicStep::C, 2)), -1);
    }

    #[test]
    fn fourth_or_less_needs_no_marks() {
        let reference = pitch(DiatonicStep::C, 4).diatonic_ordinal();
        for step in [DiatonicStep::D, DiatonicStep::E, DiatonicStep::F] {
            assert_eq!(relative_octave_marks(Some(reference), &pitch(step, 4)), 0);
        }
        // A fourth below also reads unmarked
        for (step, octave) in [
            (DiatonicStep::B, 3),
            (DiatonicStep::A, 3),
            (DiatonicStep::G, 3),
        ] {
            assert_eq!(
                relative_octave_marks(Some(reference), &pitch(step, octave)),
                0
            );
        }
    }

    #[test]
    fn fifth_up_needs_a_mark() {
        // From C4, G4 is a fifth up: the unmarked reading is G3, so one
        // apostrophe is required.
        let reference = pitch(DiatonicStep::C, 4).diatonic_ordinal();
        assert_eq!(
            relative_octave_marks(Some(reference), &pitch(DiatonicStep::G, 4)),
            1
        );
        assert_eq!(
            relative_octave_marks(Some(reference), &pitch(DiatonicStep::G, 3)),
            0
        );
    }

    #[test]
    fn octave_mark_round_trip() {
        // Re-deriving the absolute octave from reference + marks must give
        // back the original octave for every pair in a two-octave sweep.
        for reference_octave in 2..=5 {
            for reference_step in 0..7 {
                let reference =
                    Pitch::new(DiatonicStep::from_index(reference_step), Alteration::Natural, reference_octave);
                for octave in 2..=5 {
                    for step in 0..7 {
                        let candidate =
                            Pitch::new(DiatonicStep::from_index(step), Alteration::Natural, octave);
                        let marks =
                            relative_octave_marks(Some(reference.diatonic_ordinal()), &candidate);
                        let offset = (candidate.diatonic_ordinal() - reference.diatonic_ordinal()
                            + 3)
                        .rem_euclid(7)
                            - 3;
                        let rederived = reference.diatonic_ordinal() + offset + marks * 7;
                        assert_eq!(rederived, candidate.diatonic_ordinal());
                    }
                }
            }
        }
    }

    #[test]
    fn default_reading_is_within_a_fourth() {
        for reference_ordinal in 14..=42 {
            for step in 0..7 {
                let candidate = Pitch::new(DiatonicStep::from_index(step), Alteration::Natural, 4);
                let marks = relative_octave_marks(Some(reference_ordinal), &candidate);
                let unmarked = candidate.diatonic_ordinal() - marks * 7;
                let distance = unmarked - reference_ordinal;
                assert!((-3..=3).contains(&distance), "distance {}", distance);
            }
        }
    }

    #[test]
    fn transposition_respells() {
        let c4 = pitch(DiatonicStep::C, 4);
        let up_minor_third = c4.transposed(3, 0);
        assert_eq!(up_minor_third.step, DiatonicStep::E);
        assert_eq!(up_minor_third.alteration, Alteration::Flat);
        assert_eq!(up_minor_third.octave, 4);

        let down_whole_tone = c4.transposed(-2, 0);
        assert_eq!(down_whole_tone.step, DiatonicStep::B);
        assert_eq!(down_whole_tone.alteration, Alteration::Flat);
        assert_eq!(down_whole_tone.octave, 3);

        let octave_down = c4.transposed(0, -1);
        assert_eq!(octave_down.octave, 3);
    }

    #[test]
    fn lilypond_names() {
        assert_eq!(
            Pitch::new(DiatonicStep::C, Alteration::Sharp, 4).lilypond_name(),
            "cis"
        );
        assert_eq!(
            Pitch::new(DiatonicStep::B, Alteration::Flat, 3).lilypond_name(),
            "bes"
        );
        assert_eq!(octave_marks_string(2), "''");
        assert_eq!(octave_marks_string(-1), ",");
    }
}
