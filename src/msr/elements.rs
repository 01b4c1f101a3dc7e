//! Score attribute elements and note attachments
//!
//! Clef/key/time carry an `is_equal_to` comparison over their semantic
//! fields (the input line is provenance, not content); translators use it
//! to suppress re-assertions that would change nothing.

use num_rational::Rational64;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TranslationError};
use crate::msr::durations::WholeNotes;

/// Clef kinds the translation maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClefKind {
    Treble,
    Bass,
    Alto,
    Tenor,
    Soprano,
    MezzoSoprano,
    Baritone,
    Percussion,
}

impl ClefKind {
    pub fn lilypond_name(self) -> &'static str {
        match self {
            ClefKind::Treble => "treble",
            ClefKind::Bass => "bass",
            ClefKind::Alto => "alto",
            ClefKind::Tenor => "tenor",
            ClefKind::Soprano => "soprano",
            ClefKind::MezzoSoprano => "mezzosoprano",
            ClefKind::Baritone => "baritone",
            ClefKind::Percussion => "percussion",
        }
    }

    /// Map a MusicXML sign/line pair
    pub fn from_sign_and_line(sign: &str, line: Option<i32>) -> Option<ClefKind> {
        match (sign, line) {
            ("G", _) => Some(ClefKind::Treble),
            ("F", _) => Some(ClefKind::Bass),
            ("C", Some(1)) => Some(ClefKind::Soprano),
            ("C", Some(2)) => Some(ClefKind::MezzoSoprano),
            ("C", Some(4)) => Some(ClefKind::Tenor),
            ("C", Some(5)) => Some(ClefKind::Baritone),
            ("C", _) => Some(ClefKind::Alto),
            ("percussion", _) => Some(ClefKind::Percussion),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Clef {
    pub input_line: u32,
    pub kind: ClefKind,
}

impl Clef {
    pub fn new(input_line: u32, kind: ClefKind) -> Self {
        Clef { input_line, kind }
    }

    pub fn is_equal_to(&self, other: &Clef) -> bool {
        self.kind == other.kind
    }
}

/// Key mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyMode {
    Major,
    Minor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
}

impl KeyMode {
    pub fn parse(text: &str) -> KeyMode {
        match text {
            "minor" => KeyMode::Minor,
            "dorian" => KeyMode::Dorian,
            "phrygian" => KeyMode::Phrygian,
            "lydian" => KeyMode::Lydian,
            "mixolydian" => KeyMode::Mixolydian,
            "aeolian" => KeyMode::Aeolian,
            "locrian" => KeyMode::Locrian,
            _ => KeyMode::Major,
        }
    }

    pub fn lilypond_name(self) -> &'static str {
        match self {
            KeyMode::Major => "\\major",
            KeyMode::Minor => "\\minor",
            KeyMode::Dorian => "\\dorian",
            KeyMode::Phrygian => "\\phrygian",
            KeyMode::Lydian => "\\lydian",
            KeyMode::Mixolydian => "\\mixolydian",
            // Aeolian and minor share the signature
            KeyMode::Aeolian => "\\minor",
            KeyMode::Locrian => "\\locrian",
        }
    }
}

/// Traditional key signature: fifths on the circle plus mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Key {
    pub input_line: u32,
    pub fifths: i32,
    pub mode: KeyMode,
}

impl Key {
    pub fn new(input_line: u32, fifths: i32, mode: KeyMode) -> Self {
        Key {
            input_line,
            fifths,
            mode,
        }
    }

    pub fn is_equal_to(&self, other: &Key) -> bool {
        self.fifths == other.fifths && self.mode == other.mode
    }

    /// LilyPond tonic for the major-mode reading of the signature
    pub fn lilypond_tonic(&self) -> &'static str {
        match self.fifths.clamp(-7, 7) {
            -7 => "ces",
            -6 => "ges",
            -5 => "des",
            -4 => "aes",
            -3 => "ees",
            -2 => "bes",
            -1 => "f",
            0 => "c",
            1 => "g",
            2 => "d",
            3 => "a",
            4 => "e",
            5 => "b",
            6 => "fis",
            _ => "cis",
        }
    }
}

/// Time signature symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSymbolKind {
    /// Plain numeric signature
    None,
    Common,
    Cut,
    SenzaMisura,
}

/// One beats/beat-value pair; compound numerators ("3+2") keep each addend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeItem {
    pub beats: Vec<i64>,
    pub beat_value: i64,
}

impl TimeItem {
    pub fn new(beats: Vec<i64>, beat_value: i64) -> Self {
        TimeItem { beats, beat_value }
    }

    pub fn whole_notes(&self) -> WholeNotes {
        let total: i64 = self.beats.iter().sum();
        Rational64::new(total, self.beat_value)
    }
}

/// Time signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Time {
    pub input_line: u32,
    pub symbol: TimeSymbolKind,
    pub items: Vec<TimeItem>,
}

impl Time {
    pub fn new(input_line: u32, symbol: TimeSymbolKind, items: Vec<TimeItem>) -> Self {
        Time {
            input_line,
            symbol,
            items,
        }
    }

    pub fn is_equal_to(&self, other: &Time) -> bool {
        self.symbol == other.symbol && self.items == other.items
    }

    /// The measure-duration oracle: total whole notes per measure under
    /// this signature. An empty item list is only legal senza misura.
    pub fn whole_notes_per_measure(&self) -> Result<WholeNotes> {
        if self.items.is_empty() {
            if self.symbol == TimeSymbolKind::SenzaMisura {
                return Ok(Rational64::new(0, 1));
            }
            return Err(TranslationError::internal(
                self.input_line,
                "time signature has no beat items and is not senza misura",
            ));
        }
        Ok(self.items.iter().map(TimeItem::whole_notes).sum())
    }

    /// LilyPond \time fragment (first item; LilyPond writes compound
    /// numerators with +). An item-less signature that is not senza
    /// misura is the same fatal case `whole_notes_per_measure` rejects.
    pub fn lilypond_string(&self) -> Result<String> {
        match self.symbol {
            TimeSymbolKind::SenzaMisura => Ok("\\cadenzaOn".to_string()),
            _ => {
                let item = self.items.first().ok_or_else(|| {
                    TranslationError::internal(
                        self.input_line,
                        "time signature has no beat items and is not senza misura",
                    )
                })?;
                let numerator = item
                    .beats
                    .iter()
                    .map(|b| b.to_string())
                    .collect::<Vec<_>>()
                    .join("+");
                Ok(format!("\\time {}/{}", numerator, item.beat_value))
            }
        }
    }
}

/// Barline styles; the closed contract list, matched exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarlineStyle {
    Regular,
    Dotted,
    Dashed,
    Heavy,
    LightLight,
    LightHeavy,
    HeavyLight,
    HeavyHeavy,
    Tick,
    Short,
    None,
}

impl BarlineStyle {
    pub fn parse(text: &str) -> Option<BarlineStyle> {
        match text {
            "regular" => Some(BarlineStyle::Regular),
            "dotted" => Some(BarlineStyle::Dotted),
            "dashed" => Some(BarlineStyle::Dashed),
            "heavy" => Some(BarlineStyle::Heavy),
            "light-light" => Some(BarlineStyle::LightLight),
            "light-heavy" => Some(BarlineStyle::LightHeavy),
            "heavy-light" => Some(BarlineStyle::HeavyLight),
            "heavy-heavy" => Some(BarlineStyle::HeavyHeavy),
            "tick" => Some(BarlineStyle::Tick),
            "short" => Some(BarlineStyle::Short),
            "none" => Some(BarlineStyle::None),
            _ => None,
        }
    }

    pub fn lilypond_string(self) -> &'static str {
        match self {
            BarlineStyle::Regular => "|",
            BarlineStyle::Dotted => ";",
            BarlineStyle::Dashed => "!",
            BarlineStyle::Heavy => ".",
            BarlineStyle::LightLight => "||",
            BarlineStyle::LightHeavy => "|.",
            BarlineStyle::HeavyLight => ".|",
            BarlineStyle::HeavyHeavy => "..",
            BarlineStyle::Tick => "'",
            BarlineStyle::Short => ",",
            BarlineStyle::None => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarlineLocation {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Barline {
    pub input_line: u32,
    pub location: BarlineLocation,
    pub style: BarlineStyle,
}

/// Dynamic markings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DynamicKind {
    Ppp,
    Pp,
    P,
    Mp,
    Mf,
    F,
    Ff,
    Fff,
    Fp,
    Sf,
    Sfz,
}

impl DynamicKind {
    pub fn parse(text: &str) -> Option<DynamicKind> {
        match text {
            "ppp" => Some(DynamicKind::Ppp),
            "pp" => Some(DynamicKind::Pp),
            "p" => Some(DynamicKind::P),
            "mp" => Some(DynamicKind::Mp),
            "mf" => Some(DynamicKind::Mf),
            "f" => Some(DynamicKind::F),
            "ff" => Some(DynamicKind::Ff),
            "fff" => Some(DynamicKind::Fff),
            "fp" => Some(DynamicKind::Fp),
            "sf" => Some(DynamicKind::Sf),
            "sfz" => Some(DynamicKind::Sfz),
            _ => None,
        }
    }

    pub fn lilypond_string(self) -> &'static str {
        match self {
            DynamicKind::Ppp => "\\ppp",
            DynamicKind::Pp => "\\pp",
            DynamicKind::P => "\\p",
            DynamicKind::Mp => "\\mp",
            DynamicKind::Mf => "\\mf",
            DynamicKind::F => "\\f",
            DynamicKind::Ff => "\\ff",
            DynamicKind::Fff => "\\fff",
            DynamicKind::Fp => "\\fp",
            DynamicKind::Sf => "\\sf",
            DynamicKind::Sfz => "\\sfz",
        }
    }
}

/// Hairpin wedges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WedgeKind {
    CrescendoStart,
    DecrescendoStart,
    Stop,
}

impl WedgeKind {
    pub fn lilypond_string(self) -> &'static str {
        match self {
            WedgeKind::CrescendoStart => "\\<",
            WedgeKind::DecrescendoStart => "\\>",
            WedgeKind::Stop => "\\!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    Above,
    Below,
}

/// Free text attached above or below the staff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Words {
    pub text: String,
    pub placement: Placement,
}

/// Articulation kinds. Some are recognized by the model without having a
/// LilyPond mapping yet; those emit placeholder comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArticulationKind {
    Staccato,
    Staccatissimo,
    Accent,
    Marcato,
    Tenuto,
    Portato,
    BreathMark,
    Doit,
    Falloff,
    Plop,
    Scoop,
}

impl ArticulationKind {
    pub fn parse(tag: &str) -> Option<ArticulationKind> {
        match tag {
            "staccato" => Some(ArticulationKind::Staccato),
            "staccatissimo" => Some(ArticulationKind::Staccatissimo),
            "accent" => Some(ArticulationKind::Accent),
            "strong-accent" => Some(ArticulationKind::Marcato),
            "tenuto" => Some(ArticulationKind::Tenuto),
            "detached-legato" => Some(ArticulationKind::Portato),
            "breath-mark" => Some(ArticulationKind::BreathMark),
            "doit" => Some(ArticulationKind::Doit),
            "falloff" => Some(ArticulationKind::Falloff),
            "plop" => Some(ArticulationKind::Plop),
            "scoop" => Some(ArticulationKind::Scoop),
            _ => None,
        }
    }

    /// Output token, or None for kinds without a mapping
    pub fn lilypond_string(self) -> Option<&'static str> {
        match self {
            ArticulationKind::Staccato => Some("-."),
            ArticulationKind::Staccatissimo => Some("-!"),
            ArticulationKind::Accent => Some("->"),
            ArticulationKind::Marcato => Some("-^"),
            ArticulationKind::Tenuto => Some("--"),
            ArticulationKind::Portato => Some("-_"),
            ArticulationKind::BreathMark => Some("\\breathe"),
            ArticulationKind::Doit
            | ArticulationKind::Falloff
            | ArticulationKind::Plop
            | ArticulationKind::Scoop => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ArticulationKind::Staccato => "staccato",
            ArticulationKind::Staccatissimo => "staccatissimo",
            ArticulationKind::Accent => "accent",
            ArticulationKind::Marcato => "marcato",
            ArticulationKind::Tenuto => "tenuto",
            ArticulationKind::Portato => "portato",
            ArticulationKind::BreathMark => "breath-mark",
            ArticulationKind::Doit => "doit",
            ArticulationKind::Falloff => "falloff",
            ArticulationKind::Plop => "plop",
            ArticulationKind::Scoop => "scoop",
        }
    }
}

/// Ornament kinds, mapped or placeholder like articulations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrnamentKind {
    Trill,
    Turn,
    InvertedTurn,
    Mordent,
    InvertedMordent,
    Schleifer,
    Shake,
    WavyLine,
}

impl OrnamentKind {
    pub fn parse(tag: &str) -> Option<OrnamentKind> {
        match tag {
            "trill-mark" => Some(OrnamentKind::Trill),
            "turn" => Some(OrnamentKind::Turn),
            "inverted-turn" => Some(OrnamentKind::InvertedTurn),
            "mordent" => Some(OrnamentKind::Mordent),
            "inverted-mordent" => Some(OrnamentKind::InvertedMordent),
            "schleifer" => Some(OrnamentKind::Schleifer),
            "shake" => Some(OrnamentKind::Shake),
            "wavy-line" => Some(OrnamentKind::WavyLine),
            _ => None,
        }
    }

    pub fn lilypond_string(self) -> Option<&'static str> {
        match self {
            OrnamentKind::Trill => Some("\\trill"),
            OrnamentKind::Turn => Some("\\turn"),
            OrnamentKind::InvertedTurn => Some("\\reverseturn"),
            OrnamentKind::Mordent => Some("\\mordent"),
            OrnamentKind::InvertedMordent => Some("\\prall"),
            OrnamentKind::Schleifer | OrnamentKind::Shake | OrnamentKind::WavyLine => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OrnamentKind::Trill => "trill",
            OrnamentKind::Turn => "turn",
            OrnamentKind::InvertedTurn => "inverted-turn",
            OrnamentKind::Mordent => "mordent",
            OrnamentKind::InvertedMordent => "inverted-mordent",
            OrnamentKind::Schleifer => "schleifer",
            OrnamentKind::Shake => "shake",
            OrnamentKind::WavyLine => "wavy-line",
        }
    }
}

/// Slur start/stop with number for overlapping slurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlurKind {
    Start,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slur {
    pub kind: SlurKind,
    pub number: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieKind {
    Start,
    Stop,
    Continue,
}

/// Lyric syllable position within a word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LyricSyllabic {
    Single,
    Begin,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lyric {
    pub text: String,
    pub syllabic: LyricSyllabic,
}

/// Metronome indication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tempo {
    pub input_line: u32,
    pub beats_per_minute: u32,
    pub beat_unit: crate::msr::durations::DurationKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_rational::Rational64;

    #[test]
    fn four_four_is_one_whole_note() {
        let time = Time::new(1, TimeSymbolKind::None, vec![TimeItem::new(vec![4], 4)]);
        assert_eq!(
            time.whole_notes_per_measure().unwrap(),
            Rational64::new(1, 1)
        );
    }

    #[test]
    fn compound_meter_sums_addends() {
        let time = Time::new(1, TimeSymbolKind::None, vec![TimeItem::new(vec![3, 2], 8)]);
        assert_eq!(
            time.whole_notes_per_measure().unwrap(),
            Rational64::new(5, 8)
        );
        assert_eq!(time.lilypond_string().unwrap(), "\\time 3+2/8");
    }

    #[test]
    fn itemless_time_is_a_fatal_error_not_a_panic() {
        let time = Time::new(7, TimeSymbolKind::None, vec![]);
        assert!(time.whole_notes_per_measure().is_err());
        assert!(time.lilypond_string().is_err());
        let senza = Time::new(7, TimeSymbolKind::SenzaMisura, vec![]);
        assert_eq!(senza.lilypond_string().unwrap(), "\\cadenzaOn");
    }

    #[test]
    fn measure_duration_invariant_under_item_reordering() {
        let forward = Time::new(
            1,
            TimeSymbolKind::None,
            vec![TimeItem::new(vec![3], 8), TimeItem::new(vec![2], 4)],
        );
        let backward = Time::new(
            1,
            TimeSymbolKind::None,
            vec![TimeItem::new(vec![2], 4), TimeItem::new(vec![3], 8)],
        );
        assert_eq!(
            forward.whole_notes_per_measure().unwrap(),
            backward.whole_notes_per_measure().unwrap()
        );
    }

    #[test]
    fn empty_items_fatal_unless_senza_misura() {
        let bad = Time::new(17, TimeSymbolKind::None, vec![]);
        let err = bad.whole_notes_per_measure().unwrap_err();
        assert!(err.to_string().contains("line 17"));

        let senza = Time::new(17, TimeSymbolKind::SenzaMisura, vec![]);
        assert_eq!(
            senza.whole_notes_per_measure().unwrap(),
            Rational64::new(0, 1)
        );
    }

    #[test]
    fn attribute_equality_ignores_input_line() {
        let first = Clef::new(3, ClefKind::Treble);
        let second = Clef::new(99, ClefKind::Treble);
        assert!(first.is_equal_to(&second));

        let g_major_a = Key::new(1, 1, KeyMode::Major);
        let g_major_b = Key::new(50, 1, KeyMode::Major);
        assert!(g_major_a.is_equal_to(&g_major_b));
        assert!(!g_major_a.is_equal_to(&Key::new(1, 1, KeyMode::Minor)));
    }

    #[test]
    fn barline_styles_map_exhaustively() {
        for style in [
            BarlineStyle::Regular,
            BarlineStyle::Dotted,
            BarlineStyle::Dashed,
            BarlineStyle::Heavy,
            BarlineStyle::LightLight,
            BarlineStyle::LightHeavy,
            BarlineStyle::HeavyLight,
            BarlineStyle::HeavyHeavy,
            BarlineStyle::Tick,
            BarlineStyle::Short,
        ] {
            assert!(!style.lilypond_string().is_empty());
        }
        assert_eq!(BarlineStyle::parse("light-heavy"), Some(BarlineStyle::LightHeavy));
    }
}
