//! Score containment hierarchy
//!
//! Score → part-group → part → staff → voice → measure → element, owned
//! strictly top-down. The only back-references are [`Uplink`] values:
//! plain copies of the identifying context wired at construction time,
//! answering "which part/staff/voice contains me" without owning anything.

use num_rational::Rational64;
use serde::{Deserialize, Serialize};

use crate::msr::durations::WholeNotes;
use crate::msr::elements::{Barline, Clef, Key, Tempo, Time, Words};
use crate::msr::notes::{Chord, DoubleTremolo, GraceGroup, Harmony, Note, Tuplet};

/// Non-owning containment context, wired once during construction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uplink {
    pub part_id: String,
    pub staff_number: u32,
    pub voice_number: u32,
}

/// How a measure relates to its nominal length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasureKind {
    /// Exactly the nominal length
    Regular,
    /// Underfull opening measure (anacrusis)
    IncompleteLeft,
    /// Underfull non-opening measure
    IncompleteRight,
    /// Longer than the nominal length; rendered as a cadenza
    Overfull,
    /// No sounding content; rendered as a full-measure rest
    Empty,
}

/// Classify a measure from its accumulated length against the nominal
/// measure length, position, and content.
pub fn classify_measure_kind(
    actual: WholeNotes,
    nominal: WholeNotes,
    is_first_in_voice: bool,
    has_sounding_content: bool,
) -> MeasureKind {
    if !has_sounding_content {
        return MeasureKind::Empty;
    }
    if nominal == Rational64::new(0, 1) {
        // Senza misura: everything is a cadenza.
        return MeasureKind::Overfull;
    }
    if actual == nominal {
        MeasureKind::Regular
    } else if actual > nominal {
        MeasureKind::Overfull
    } else if is_first_in_voice {
        MeasureKind::IncompleteLeft
    } else {
        MeasureKind::IncompleteRight
    }
}

/// A standalone direction between notes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Direction {
    Dynamic(crate::msr::elements::DynamicKind),
    Wedge(crate::msr::elements::WedgeKind),
    Words(Words),
    Tempo(Tempo),
}

/// Everything a measure can own, in document order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MeasureElement {
    Clef(Clef),
    Key(Key),
    Time(Time),
    Barline(Barline),
    Note(Note),
    Chord(Chord),
    Tuplet(Tuplet),
    GraceGroup(GraceGroup),
    DoubleTremolo(DoubleTremolo),
    Harmony(Harmony),
    Direction(Direction),
}

/// The unit of rhythmic accounting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub input_line: u32,
    /// Print measure number as written in the source
    pub number: String,
    pub kind: MeasureKind,
    /// Nominal length per the governing time signature
    pub nominal_length: WholeNotes,
    /// Accumulated sounding length
    pub actual_length: WholeNotes,
    pub elements: Vec<MeasureElement>,
    pub uplink: Uplink,
}

impl Measure {
    pub fn new(input_line: u32, number: impl Into<String>, uplink: Uplink) -> Self {
        Measure {
            input_line,
            number: number.into(),
            kind: MeasureKind::Regular,
            nominal_length: Rational64::new(1, 1),
            actual_length: Rational64::new(0, 1),
            elements: Vec::new(),
            uplink,
        }
    }

    pub fn append_element(&mut self, element: MeasureElement) {
        self.elements.push(element);
    }

    /// Whether any element produces sound or occupies time
    pub fn has_sounding_content(&self) -> bool {
        self.elements.iter().any(|e| {
            matches!(
                e,
                MeasureElement::Note(_)
                    | MeasureElement::Chord(_)
                    | MeasureElement::Tuplet(_)
                    | MeasureElement::GraceGroup(_)
                    | MeasureElement::DoubleTremolo(_)
            )
        })
    }
}

/// One volta alternative of a repeat. Numbers are 1-based and contiguous;
/// the translator's bracket bookkeeping depends on #1 and #total doing
/// extra work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatEnding {
    pub input_line: u32,
    pub number: u32,
    pub measures: Vec<Measure>,
}

/// A repeated passage with optional endings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repeat {
    pub input_line: u32,
    pub common: Vec<Measure>,
    pub endings: Vec<RepeatEnding>,
}

impl Repeat {
    /// Volta count: one pass per ending, minimum two passes
    pub fn volta_count(&self) -> u32 {
        (self.endings.len() as u32).max(2)
    }
}

/// Voice contents: plain measures interleaved with repeat structures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VoiceElement {
    Measure(Measure),
    Repeat(Repeat),
}

/// What a voice is for; alters how translators emit it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceKind {
    Regular,
    /// Chord symbols; renders as \chordmode
    Harmony,
    /// Aggregated control voice
    Master,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub number: u32,
    pub kind: VoiceKind,
    pub elements: Vec<VoiceElement>,
}

impl Voice {
    pub fn new(number: u32, kind: VoiceKind) -> Self {
        Voice {
            number,
            kind,
            elements: Vec::new(),
        }
    }

    pub fn append_measure(&mut self, measure: Measure) {
        self.elements.push(VoiceElement::Measure(measure));
    }

    pub fn append_repeat(&mut self, repeat: Repeat) {
        self.elements.push(VoiceElement::Repeat(repeat));
    }

    /// All measures in document order, descending into repeats
    pub fn measures(&self) -> impl Iterator<Item = &Measure> {
        self.elements.iter().flat_map(|element| match element {
            VoiceElement::Measure(m) => vec![m],
            VoiceElement::Repeat(r) => {
                let mut all: Vec<&Measure> = r.common.iter().collect();
                for ending in &r.endings {
                    all.extend(ending.measures.iter());
                }
                all
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub number: u32,
    pub voices: Vec<Voice>,
}

impl Staff {
    pub fn new(number: u32) -> Self {
        Staff {
            number,
            voices: Vec::new(),
        }
    }

    pub fn append_voice(&mut self, voice: Voice) {
        self.voices.push(voice);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: String,
    pub name: String,
    pub abbreviation: Option<String>,
    pub divisions_per_quarter: i64,
    pub staves: Vec<Staff>,
}

impl Part {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Part {
            id: id.into(),
            name: name.into(),
            abbreviation: None,
            divisions_per_quarter: 1,
            staves: Vec::new(),
        }
    }

    pub fn append_staff(&mut self, staff: Staff) {
        self.staves.push(staff);
    }
}

/// Visual grouping of parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartGroupSymbolKind {
    Bracket,
    Brace,
    Line,
    Square,
    NoSymbol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartGroup {
    pub number: u32,
    pub name: Option<String>,
    pub symbol: PartGroupSymbolKind,
    pub barline_spans_group: bool,
    pub parts: Vec<Part>,
}

impl PartGroup {
    pub fn new(number: u32) -> Self {
        PartGroup {
            number,
            name: None,
            symbol: PartGroupSymbolKind::NoSymbol,
            barline_spans_group: true,
            parts: Vec::new(),
        }
    }

    pub fn append_part(&mut self, part: Part) {
        self.parts.push(part);
    }
}

/// The root of the MSR tree, one per input document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub work_title: Option<String>,
    pub work_number: Option<String>,
    pub composer: Option<String>,
    pub part_groups: Vec<PartGroup>,
}

impl Score {
    pub fn new() -> Self {
        Score::default()
    }

    pub fn append_part_group(&mut self, part_group: PartGroup) {
        self.part_groups.push(part_group);
    }

    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.part_groups.iter().flat_map(|g| g.parts.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whole(n: i64, d: i64) -> WholeNotes {
        Rational64::new(n, d)
    }

    #[test]
    fn measure_kind_classification() {
        let nominal = whole(1, 1);
        assert_eq!(
            classify_measure_kind(whole(1, 1), nominal, false, true),
            MeasureKind::Regular
        );
        assert_eq!(
            classify_measure_kind(whole(1, 4), nominal, true, true),
            MeasureKind::IncompleteLeft
        );
        assert_eq!(
            classify_measure_kind(whole(3, 4), nominal, false, true),
            MeasureKind::IncompleteRight
        );
        assert_eq!(
            classify_measure_kind(whole(5, 4), nominal, false, true),
            MeasureKind::Overfull
        );
        assert_eq!(
            classify_measure_kind(whole(0, 1), nominal, false, false),
            MeasureKind::Empty
        );
        // Senza misura nominal zero
        assert_eq!(
            classify_measure_kind(whole(1, 2), whole(0, 1), false, true),
            MeasureKind::Overfull
        );
    }

    #[test]
    fn volta_count_has_a_floor_of_two() {
        let repeat = Repeat {
            input_line: 1,
            common: vec![],
            endings: vec![],
        };
        assert_eq!(repeat.volta_count(), 2);
    }
}
