//! Notes, chords, tuplets, grace groups, tremolos, harmonies
//!
//! A note's kind is a closed enum, so exactly one kind is active by
//! construction. Rests and skips carry no pitch; the factory functions
//! are the only way the front-end builds notes, keeping that invariant
//! out of reach of later passes (trees are read-only once built).

use serde::{Deserialize, Serialize};

use crate::msr::durations::{NoteDuration, TupletFactor};
use crate::msr::elements::{
    ArticulationKind, DynamicKind, Lyric, OrnamentKind, Slur, TieKind, WedgeKind, Words,
};
use crate::msr::pitch::{Alteration, DiatonicStep, Pitch};

/// What a note event is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteKind {
    /// Ordinary pitched note
    Standalone,
    /// Audible silence
    Rest,
    /// Invisible spacer
    Skip,
    /// Grace note inside a grace group
    Grace,
    /// Member of a chord
    ChordMember,
    /// Member of a tuplet
    TupletMember,
    /// One half of a double tremolo
    DoubleTremoloMember,
}

/// Ornamentation attached to a note or chord
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachments {
    pub articulations: Vec<ArticulationKind>,
    pub ornaments: Vec<OrnamentKind>,
    pub dynamics: Vec<DynamicKind>,
    pub wedges: Vec<WedgeKind>,
    pub words: Vec<Words>,
    pub slurs: Vec<Slur>,
    pub lyrics: Vec<Lyric>,
}

impl Attachments {
    pub fn is_empty(&self) -> bool {
        self.articulations.is_empty()
            && self.ornaments.is_empty()
            && self.dynamics.is_empty()
            && self.wedges.is_empty()
            && self.words.is_empty()
            && self.slurs.is_empty()
            && self.lyrics.is_empty()
    }
}

/// The most complex leaf of the score tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub input_line: u32,
    pub kind: NoteKind,
    /// None exactly when the kind is Rest or Skip
    pub pitch: Option<Pitch>,
    pub duration: NoteDuration,
    pub tie: Option<TieKind>,
    pub attachments: Attachments,
}

impl Note {
    pub fn standalone(input_line: u32, pitch: Pitch, duration: NoteDuration) -> Self {
        Note {
            input_line,
            kind: NoteKind::Standalone,
            pitch: Some(pitch),
            duration,
            tie: None,
            attachments: Attachments::default(),
        }
    }

    pub fn rest(input_line: u32, duration: NoteDuration) -> Self {
        Note {
            input_line,
            kind: NoteKind::Rest,
            pitch: None,
            duration,
            tie: None,
            attachments: Attachments::default(),
        }
    }

    pub fn skip(input_line: u32, duration: NoteDuration) -> Self {
        Note {
            input_line,
            kind: NoteKind::Skip,
            pitch: None,
            duration,
            tie: None,
            attachments: Attachments::default(),
        }
    }

    pub fn with_kind(mut self, kind: NoteKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_pitched(&self) -> bool {
        self.pitch.is_some()
    }

    /// Whether this note updates the relative-octave reference. Rests and
    /// skips do not; they preserve whatever reference preceded them.
    pub fn updates_octave_reference(&self) -> bool {
        self.is_pitched()
    }
}

/// Notes sounding together under one duration. Ornamentation attaches to
/// the chord, not to member notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    pub input_line: u32,
    pub notes: Vec<Note>,
    pub duration: NoteDuration,
    pub tie: Option<TieKind>,
    pub attachments: Attachments,
}

impl Chord {
    pub fn new(input_line: u32, notes: Vec<Note>, duration: NoteDuration) -> Self {
        Chord {
            input_line,
            notes,
            duration,
            tie: None,
            attachments: Attachments::default(),
        }
    }

    /// The first member's pitch anchors the relative-octave reference.
    pub fn first_pitch(&self) -> Option<&Pitch> {
        self.notes.iter().find_map(|n| n.pitch.as_ref())
    }
}

/// A tuplet member: a note or a nested tuplet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TupletMember {
    Note(Note),
    Chord(Chord),
    Tuplet(Box<Tuplet>),
}

/// A tuplet: ratio plus ordered members, nesting allowed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuplet {
    pub input_line: u32,
    pub factor: TupletFactor,
    pub members: Vec<TupletMember>,
}

impl Tuplet {
    pub fn new(input_line: u32, factor: TupletFactor, members: Vec<TupletMember>) -> Self {
        Tuplet {
            input_line,
            factor,
            members,
        }
    }
}

/// A run of grace notes before a principal note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraceGroup {
    pub input_line: u32,
    /// Slashed grace groups render as \acciaccatura
    pub slash: bool,
    pub notes: Vec<Note>,
}

/// Two-note tremolo; the marks number is the beam count between the pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoubleTremolo {
    pub input_line: u32,
    pub marks_number: u32,
    pub first: Note,
    pub second: Note,
    /// Divisions the whole pair occupies in the source timing
    pub total_divisions: i64,
}

/// Chord-symbol kinds for harmony voices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmonyKind {
    Major,
    Minor,
    Dominant,
    MajorSeventh,
    MinorSeventh,
    Diminished,
    Augmented,
    SuspendedFourth,
}

impl HarmonyKind {
    pub fn parse(text: &str) -> Option<HarmonyKind> {
        match text {
            "major" => Some(HarmonyKind::Major),
            "minor" => Some(HarmonyKind::Minor),
            "dominant" => Some(HarmonyKind::Dominant),
            "major-seventh" => Some(HarmonyKind::MajorSeventh),
            "minor-seventh" => Some(HarmonyKind::MinorSeventh),
            "diminished" => Some(HarmonyKind::Diminished),
            "augmented" => Some(HarmonyKind::Augmented),
            "suspended-fourth" => Some(HarmonyKind::SuspendedFourth),
            _ => None,
        }
    }

    /// \chordmode suffix after the root name, empty for plain major
    pub fn chordmode_suffix(self) -> &'static str {
        match self {
            HarmonyKind::Major => "",
            HarmonyKind::Minor => ":m",
            HarmonyKind::Dominant => ":7",
            HarmonyKind::MajorSeventh => ":maj7",
            HarmonyKind::MinorSeventh => ":m7",
            HarmonyKind::Diminished => ":dim",
            HarmonyKind::Augmented => ":aug",
            HarmonyKind::SuspendedFourth => ":sus4",
        }
    }
}

/// A chord symbol, rendered in \chordmode within harmony voices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Harmony {
    pub input_line: u32,
    pub root_step: DiatonicStep,
    pub root_alteration: Alteration,
    pub kind: HarmonyKind,
    pub duration: NoteDuration,
}
