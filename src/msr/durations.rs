//! Duration arithmetic
//!
//! Durations are exact rationals measured in whole notes. A notated
//! duration is a base value plus dots, optionally scaled by the enclosing
//! tuplet's factor; the factor of a nested tuplet must be unapplied from
//! the enclosing one before use, because MusicXML pre-multiplies nested
//! tuplet durations.

use num_rational::Rational64;
use num_traits::{Signed, Zero};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TranslationError};

/// Exact duration in whole notes
pub type WholeNotes = Rational64;

/// Notated base duration value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DurationKind {
    Breve,
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    SixtyFourth,
    HundredTwentyEighth,
}

impl DurationKind {
    /// Length of the undotted value in whole notes
    pub fn whole_notes(self) -> WholeNotes {
        match self {
            DurationKind::Breve => Rational64::new(2, 1),
            DurationKind::Whole => Rational64::new(1, 1),
            DurationKind::Half => Rational64::new(1, 2),
            DurationKind::Quarter => Rational64::new(1, 4),
            DurationKind::Eighth => Rational64::new(1, 8),
            DurationKind::Sixteenth => Rational64::new(1, 16),
            DurationKind::ThirtySecond => Rational64::new(1, 32),
            DurationKind::SixtyFourth => Rational64::new(1, 64),
            DurationKind::HundredTwentyEighth => Rational64::new(1, 128),
        }
    }

    /// LilyPond duration token
    pub fn lilypond_number(self) -> &'static str {
        match self {
            DurationKind::Breve => "\\breve",
            DurationKind::Whole => "1",
            DurationKind::Half => "2",
            DurationKind::Quarter => "4",
            DurationKind::Eighth => "8",
            DurationKind::Sixteenth => "16",
            DurationKind::ThirtySecond => "32",
            DurationKind::SixtyFourth => "64",
            DurationKind::HundredTwentyEighth => "128",
        }
    }

    /// MusicXML `<type>` name
    pub fn parse(text: &str) -> Option<DurationKind> {
        match text {
            "breve" => Some(DurationKind::Breve),
            "whole" => Some(DurationKind::Whole),
            "half" => Some(DurationKind::Half),
            "quarter" => Some(DurationKind::Quarter),
            "eighth" => Some(DurationKind::Eighth),
            "16th" => Some(DurationKind::Sixteenth),
            "32nd" => Some(DurationKind::ThirtySecond),
            "64th" => Some(DurationKind::SixtyFourth),
            "128th" => Some(DurationKind::HundredTwentyEighth),
            _ => None,
        }
    }

    const ALL: [DurationKind; 9] = [
        DurationKind::Breve,
        DurationKind::Whole,
        DurationKind::Half,
        DurationKind::Quarter,
        DurationKind::Eighth,
        DurationKind::Sixteenth,
        DurationKind::ThirtySecond,
        DurationKind::SixtyFourth,
        DurationKind::HundredTwentyEighth,
    ];
}

/// Tuplet ratio: `actual` notes sound in the time of `normal` notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupletFactor {
    pub actual_notes: i64,
    pub normal_notes: i64,
}

impl TupletFactor {
    pub fn new(actual_notes: i64, normal_notes: i64) -> Self {
        TupletFactor {
            actual_notes,
            normal_notes,
        }
    }

    /// Multiplier applied to member durations (normal / actual)
    pub fn duration_multiplier(&self) -> WholeNotes {
        Rational64::new(self.normal_notes, self.actual_notes)
    }

    /// Ratio as a rational, actual / normal
    pub fn as_ratio(&self) -> Rational64 {
        Rational64::new(self.actual_notes, self.normal_notes)
    }

    fn from_ratio(ratio: Rational64) -> Self {
        TupletFactor {
            actual_notes: *ratio.numer(),
            normal_notes: *ratio.denom(),
        }
    }

    /// Compose with an enclosing factor (member durations get both).
    pub fn applied_to(&self, outer: &TupletFactor) -> TupletFactor {
        TupletFactor::from_ratio(self.as_ratio() * outer.as_ratio())
    }

    /// Divide out an enclosing factor. MusicXML reports nested tuplet
    /// ratios pre-multiplied by the enclosing one, so a nested `c/d`
    /// inside `a/b` denotes `(c/a)/(d/b)` on its own.
    pub fn unapplied_from(&self, outer: &TupletFactor) -> TupletFactor {
        TupletFactor::from_ratio(self.as_ratio() / outer.as_ratio())
    }
}

/// A notated duration: base value, dots, optional tuplet scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDuration {
    pub kind: DurationKind,
    pub dots: u32,
    pub tuplet_factor: Option<TupletFactor>,
}

impl NoteDuration {
    pub fn new(kind: DurationKind, dots: u32) -> Self {
        NoteDuration {
            kind,
            dots,
            tuplet_factor: None,
        }
    }

    pub fn with_tuplet_factor(kind: DurationKind, dots: u32, factor: TupletFactor) -> Self {
        NoteDuration {
            kind,
            dots,
            tuplet_factor: Some(factor),
        }
    }

    /// Notated length (dots applied, tuplet factor not applied)
    pub fn notated_whole_notes(&self) -> WholeNotes {
        let base = self.kind.whole_notes();
        // Each dot adds half of the previous value.
        let mut length = base;
        let mut increment = base;
        for _ in 0..self.dots {
            increment /= 2;
            length += increment;
        }
        length
    }

    /// Sounding length with the tuplet factor applied
    pub fn sounding_whole_notes(&self) -> WholeNotes {
        let notated = self.notated_whole_notes();
        match &self.tuplet_factor {
            Some(factor) => notated * factor.duration_multiplier(),
            None => notated,
        }
    }

    /// Find the base value + dots notation for an exact whole-note length.
    /// Returns None for lengths no single notated value can express.
    pub fn from_whole_notes(length: WholeNotes) -> Option<NoteDuration> {
        if length <= Rational64::zero() {
            return None;
        }
        for kind in DurationKind::ALL {
            let mut candidate = NoteDuration::new(kind, 0);
            for dots in 0..=3 {
                candidate.dots = dots;
                if candidate.notated_whole_notes() == length {
                    return Some(candidate);
                }
            }
        }
        None
    }

    /// LilyPond duration string, e.g. `4.` for a dotted quarter
    pub fn lilypond_string(&self) -> String {
        format!(
            "{}{}",
            self.kind.lilypond_number(),
            ".".repeat(self.dots as usize)
        )
    }
}

/// Derived emission parameters for a double tremolo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoubleTremoloDerivation {
    /// Per-element LilyPond duration number, `2^(marks + 2)`
    pub element_duration: u32,
    /// `\repeat tremolo` count
    pub repeats: u32,
}

/// Derive the per-element duration and repeat count for a two-note tremolo
/// with `marks_number` beams, given the part's divisions-per-quarter and
/// the total divisions the pair occupies.
pub fn derive_double_tremolo(
    marks_number: u32,
    divisions_per_quarter: i64,
    total_divisions: i64,
    input_line: u32,
) -> Result<DoubleTremoloDerivation> {
    let element_duration = 1u32 << (marks_number + 2);
    if divisions_per_quarter <= 0 {
        return Err(TranslationError::internal(
            input_line,
            format!(
                "double tremolo with non-positive divisions-per-quarter {}",
                divisions_per_quarter
            ),
        ));
    }
    // Divisions one tremolo element occupies.
    let per_element_divisions =
        Rational64::new(divisions_per_quarter * 4, i64::from(element_duration));
    if per_element_divisions <= Rational64::zero() {
        return Err(TranslationError::internal(
            input_line,
            "double tremolo derived a non-positive per-element division count",
        ));
    }
    let repeats = Rational64::new(total_divisions, 1) / (per_element_divisions * 2);
    if !repeats.is_integer() || !repeats.is_positive() {
        return Err(TranslationError::internal(
            input_line,
            format!(
                "double tremolo repeat count {}/{} is not a positive integer",
                repeats.numer(),
                repeats.denom()
            ),
        ));
    }
    Ok(DoubleTremoloDerivation {
        element_duration,
        repeats: *repeats.numer() as u32,
    })
}

/// Format a whole-note length as a LilyPond duration, falling back to a
/// fraction of a whole note when no single value expresses it (used by
/// `\partial` and full-measure rests).
pub fn lilypond_duration_for(length: WholeNotes) -> String {
    if let Some(duration) = NoteDuration::from_whole_notes(length) {
        duration.lilypond_string()
    } else {
        // 1*n/d multiplies a whole note, expressing irregular lengths.
        format!("1*{}/{}", length.numer(), length.denom())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;

    #[test]
    fn dotted_values() {
        let dotted_quarter = NoteDuration::new(DurationKind::Quarter, 1);
        assert_eq!(dotted_quarter.notated_whole_notes(), Rational64::new(3, 8));
        let double_dotted_half = NoteDuration::new(DurationKind::Half, 2);
        assert_eq!(
            double_dotted_half.notated_whole_notes(),
            Rational64::new(7, 8)
        );
        assert_eq!(dotted_quarter.lilypond_string(), "4.");
    }

    #[test]
    fn tuplet_member_sounding_length() {
        let triplet_eighth = NoteDuration::with_tuplet_factor(
            DurationKind::Eighth,
            0,
            TupletFactor::new(3, 2),
        );
        assert_eq!(
            triplet_eighth.sounding_whole_notes(),
            Rational64::new(1, 12)
        );
    }

    #[test]
    fn tuplet_factor_apply_unapply_is_identity() {
        let outer = TupletFactor::new(3, 2);
        for (actual, normal) in [(5, 4), (7, 4), (3, 2), (6, 4)] {
            let nested = TupletFactor::new(actual, normal);
            let round_trip = nested.applied_to(&outer).unapplied_from(&outer);
            assert_eq!(round_trip.as_ratio(), nested.as_ratio());
        }
    }

    #[test]
    fn unapply_divides_componentwise() {
        // Nested 6/4 inside 3/2 reads as a plain 2/2 once the enclosing
        // ratio is divided out: (6/3)/(4/2) = 2/2 = 1/1 in lowest terms.
        let nested = TupletFactor::new(6, 4);
        let outer = TupletFactor::new(3, 2);
        let own = nested.unapplied_from(&outer);
        assert_eq!(own.as_ratio(), Rational64::one());
    }

    #[test]
    fn from_whole_notes_recovers_notation() {
        let cases = [
            (Rational64::new(1, 4), DurationKind::Quarter, 0),
            (Rational64::new(3, 8), DurationKind::Quarter, 1),
            (Rational64::new(7, 16), DurationKind::Quarter, 2),
            (Rational64::new(1, 1), DurationKind::Whole, 0),
            (Rational64::new(2, 1), DurationKind::Breve, 0),
        ];
        for (length, kind, dots) in cases {
            let duration = NoteDuration::from_whole_notes(length).unwrap();
            assert_eq!(duration.kind, kind);
            assert_eq!(duration.dots, dots);
        }
        assert!(NoteDuration::from_whole_notes(Rational64::new(5, 8)).is_none());
        assert_eq!(
            lilypond_duration_for(Rational64::new(5, 8)),
            "1*5/8".to_string()
        );
    }

    #[test]
    fn double_tremolo_derivation() {
        // Two eighths at divisions-per-quarter 4 with 3 marks: 32nd
        // elements repeated 4 times.
        let derived = derive_double_tremolo(3, 4, 4, 1).unwrap();
        assert_eq!(derived.element_duration, 32);
        assert_eq!(derived.repeats, 4);

        // Two halves with 2 marks at dpq 8: 16th elements, half+half = 32
        // divisions, per element 2 divisions, repeats 8.
        let derived = derive_double_tremolo(2, 8, 32, 1).unwrap();
        assert_eq!(derived.element_duration, 16);
        assert_eq!(derived.repeats, 8);
    }

    #[test]
    fn double_tremolo_rejects_bad_timing() {
        assert!(derive_double_tremolo(3, 0, 4, 7).is_err());
        // One mark means 8th elements (4 divisions per repeat here); 3
        // divisions cannot split into whole repeats.
        assert!(derive_double_tremolo(1, 4, 3, 7).is_err());
        let err = derive_double_tremolo(3, 4, -4, 9).unwrap_err();
        assert!(err.to_string().contains("line 9"));
    }
}
