//! Braille cells and the music-braille cell tables
//!
//! A cell is a 6-bit dot mask, dot 1 in bit 0 through dot 6 in bit 5.
//! That gives the Unicode mapping for free (U+2800 + mask) and makes the
//! North American ASCII table a flat 64-entry lookup.

use serde::{Deserialize, Serialize};

use crate::msr::durations::DurationKind;
use crate::msr::pitch::{Alteration, DiatonicStep};

/// One braille cell as a dot mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell(u8);

impl Cell {
    pub const BLANK: Cell = Cell(0);

    /// Build a cell from dot numbers 1 through 6.
    pub const fn from_dots(dots: &[u8]) -> Cell {
        let mut mask = 0u8;
        let mut i = 0;
        while i < dots.len() {
            mask |= 1 << (dots[i] - 1);
            i += 1;
        }
        Cell(mask)
    }

    pub fn mask(self) -> u8 {
        self.0 & 0x3f
    }

    /// The cell's Unicode braille pattern character
    pub fn unicode(self) -> char {
        // U+2800 + mask is always a valid scalar value.
        char::from_u32(0x2800 + u32::from(self.mask())).unwrap_or('\u{2800}')
    }

    /// North American Braille ASCII character
    pub fn ascii(self) -> char {
        const TABLE: [char; 64] = [
            ' ', 'A', '1', 'B', '\'', 'K', '2', 'L', '@', 'C', 'I', 'F', '/', 'M', 'S', 'P', '"',
            'E', '3', 'H', '9', 'O', '6', 'R', '^', 'D', 'J', 'G', '>', 'N', 'T', 'Q', ',', '*',
            '5', '<', '-', 'U', '8', 'V', '.', '%', '[', '$', '+', 'X', '!', '&', ';', ':', '4',
            '\\', '0', 'Z', '7', '(', '_', '?', 'W', ']', '#', 'Y', ')', '=',
        ];
        TABLE[self.mask() as usize]
    }
}

// Pitch-and-value cells. The eighth-note shapes carry the step; longer
// values add dot 6 (quarter), dot 3 (half) or both (whole). The series
// repeats for 16th and shorter values.
const EIGHTH_SHAPES: [Cell; 7] = [
    Cell::from_dots(&[1, 4, 5]),    // C
    Cell::from_dots(&[1, 5]),       // D
    Cell::from_dots(&[1, 2, 4]),    // E
    Cell::from_dots(&[1, 2, 4, 5]), // F
    Cell::from_dots(&[1, 2, 5]),    // G
    Cell::from_dots(&[2, 4]),       // A
    Cell::from_dots(&[2, 4, 5]),    // B
];

/// Value group a duration falls into; 16ths and shorter reuse the shapes
/// of the whole-to-eighth group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueShape {
    Whole,
    Half,
    Quarter,
    Eighth,
}

fn value_shape(kind: DurationKind) -> ValueShape {
    match kind {
        DurationKind::Breve | DurationKind::Whole | DurationKind::Sixteenth => ValueShape::Whole,
        DurationKind::Half | DurationKind::ThirtySecond => ValueShape::Half,
        DurationKind::Quarter | DurationKind::SixtyFourth => ValueShape::Quarter,
        DurationKind::Eighth | DurationKind::HundredTwentyEighth => ValueShape::Eighth,
    }
}

fn value_dots(shape: ValueShape) -> u8 {
    match shape {
        ValueShape::Whole => Cell::from_dots(&[3, 6]).mask(),
        ValueShape::Half => Cell::from_dots(&[3]).mask(),
        ValueShape::Quarter => Cell::from_dots(&[6]).mask(),
        ValueShape::Eighth => 0,
    }
}

/// The note cell for a step at a duration value
pub fn note_cell(step: DiatonicStep, kind: DurationKind) -> Cell {
    let shape = EIGHTH_SHAPES[step.index() as usize];
    Cell(shape.mask() | value_dots(value_shape(kind)))
}

/// Rest cell for a duration value
pub fn rest_cell(kind: DurationKind) -> Cell {
    match value_shape(kind) {
        ValueShape::Whole => Cell::from_dots(&[1, 3, 4]),
        ValueShape::Half => Cell::from_dots(&[1, 3, 6]),
        ValueShape::Quarter => Cell::from_dots(&[1, 2, 3, 6]),
        ValueShape::Eighth => Cell::from_dots(&[1, 3, 4, 6]),
    }
}

/// Augmentation dot
pub const AUGMENTATION_DOT: Cell = Cell::from_dots(&[3]);

/// Octave marks for braille octaves 1 through 7 (octave 4 holds middle C)
pub fn octave_mark(braille_octave: i32) -> Cell {
    match braille_octave.clamp(1, 7) {
        1 => Cell::from_dots(&[4]),
        2 => Cell::from_dots(&[4, 5]),
        3 => Cell::from_dots(&[4, 5, 6]),
        4 => Cell::from_dots(&[5]),
        5 => Cell::from_dots(&[4, 6]),
        6 => Cell::from_dots(&[5, 6]),
        _ => Cell::from_dots(&[6]),
    }
}

/// Accidental cells; naturals in the source are not transcribed.
pub fn accidental_cell(alteration: Alteration) -> Vec<Cell> {
    const SHARP: Cell = Cell::from_dots(&[1, 4, 6]);
    const FLAT: Cell = Cell::from_dots(&[1, 2, 6]);
    match alteration {
        Alteration::Natural => vec![],
        Alteration::Sharp => vec![SHARP],
        Alteration::DoubleSharp => vec![SHARP, SHARP],
        Alteration::Flat => vec![FLAT],
        Alteration::DoubleFlat => vec![FLAT, FLAT],
    }
}

pub const NATURAL: Cell = Cell::from_dots(&[1, 6]);
pub const SHARP: Cell = Cell::from_dots(&[1, 4, 6]);
pub const FLAT: Cell = Cell::from_dots(&[1, 2, 6]);

/// Numeric indicator preceding digits
pub const NUMBER_SIGN: Cell = Cell::from_dots(&[3, 4, 5, 6]);

/// Upper-cell digit, 0 through 9
pub fn upper_digit(digit: u8) -> Cell {
    const DIGITS: [Cell; 10] = [
        Cell::from_dots(&[2, 4, 5]),    // 0 (j)
        Cell::from_dots(&[1]),          // 1 (a)
        Cell::from_dots(&[1, 2]),       // 2 (b)
        Cell::from_dots(&[1, 4]),       // 3 (c)
        Cell::from_dots(&[1, 4, 5]),    // 4 (d)
        Cell::from_dots(&[1, 5]),       // 5 (e)
        Cell::from_dots(&[1, 2, 4]),    // 6 (f)
        Cell::from_dots(&[1, 2, 4, 5]), // 7 (g)
        Cell::from_dots(&[1, 2, 5]),    // 8 (h)
        Cell::from_dots(&[2, 4]),       // 9 (i)
    ];
    DIGITS[(digit % 10) as usize]
}

/// Lower-cell digit, used for time signature denominators
pub fn lower_digit(digit: u8) -> Cell {
    const DIGITS: [Cell; 10] = [
        Cell::from_dots(&[3, 5, 6]),    // 0
        Cell::from_dots(&[2]),          // 1
        Cell::from_dots(&[2, 3]),       // 2
        Cell::from_dots(&[2, 5]),       // 3
        Cell::from_dots(&[2, 5, 6]),    // 4
        Cell::from_dots(&[2, 6]),       // 5
        Cell::from_dots(&[2, 3, 5]),    // 6
        Cell::from_dots(&[2, 3, 5, 6]), // 7
        Cell::from_dots(&[2, 3, 6]),    // 8
        Cell::from_dots(&[3, 5]),       // 9
    ];
    DIGITS[(digit % 10) as usize]
}

/// Render a non-negative number as number sign plus upper digits.
pub fn number_cells(value: u32) -> Vec<Cell> {
    let mut cells = vec![NUMBER_SIGN];
    cells.extend(digit_cells(value, upper_digit));
    cells
}

fn digit_cells(value: u32, digit: fn(u8) -> Cell) -> Vec<Cell> {
    let text = value.to_string();
    text.bytes().map(|b| digit(b - b'0')).collect()
}

/// Upper digits without the number sign
pub fn upper_digit_cells(value: u32) -> Vec<Cell> {
    digit_cells(value, upper_digit)
}

/// Lower digits without the number sign
pub fn lower_digit_cells(value: u32) -> Vec<Cell> {
    digit_cells(value, lower_digit)
}

/// Simple triplet sign
pub const TRIPLET: Cell = Cell::from_dots(&[2, 3]);

/// General tuplet prefix and terminator for non-triplet ratios
pub const TUPLET_PREFIX: Cell = Cell::from_dots(&[4, 5, 6]);
pub const TUPLET_TERMINATOR: Cell = Cell::from_dots(&[3]);

/// Music hyphen, written where a measure continues on the next line
pub const MUSIC_HYPHEN: Cell = Cell::from_dots(&[5]);

/// Final double bar at the end of a voice
pub const FINAL_BARLINE: [Cell; 2] = [Cell::from_dots(&[1, 2, 6]), Cell::from_dots(&[1, 3])];

/// Sectional double bar
pub const DOUBLE_BARLINE: [Cell; 3] = [
    Cell::from_dots(&[1, 2, 6]),
    Cell::from_dots(&[1, 3]),
    Cell::from_dots(&[3]),
];

/// Chord interval cells, read downward from the written note
pub fn interval_cell(interval: u32) -> Cell {
    match interval {
        2 => Cell::from_dots(&[3, 4]),
        3 => Cell::from_dots(&[3, 4, 6]),
        4 => Cell::from_dots(&[3, 4, 5, 6]),
        5 => Cell::from_dots(&[3, 5]),
        6 => Cell::from_dots(&[3, 5, 6]),
        7 => Cell::from_dots(&[2, 5]),
        _ => Cell::from_dots(&[3, 6]), // octave
    }
}

/// Tie between two notes
pub const TIE: [Cell; 2] = [Cell::from_dots(&[4]), Cell::from_dots(&[1, 4])];

/// Slur between adjacent notes
pub const SLUR: Cell = Cell::from_dots(&[1, 4]);

/// Clef signs; transcribed at voice start when present
pub fn clef_cells(kind: crate::msr::elements::ClefKind) -> Vec<Cell> {
    use crate::msr::elements::ClefKind;
    const PREFIX: Cell = Cell::from_dots(&[3, 4, 5]);
    const SUFFIX: Cell = Cell::from_dots(&[1, 2, 3]);
    let middle = match kind {
        ClefKind::Bass => Cell::from_dots(&[3, 4, 5, 6]),
        ClefKind::Alto
        | ClefKind::Tenor
        | ClefKind::Soprano
        | ClefKind::MezzoSoprano
        | ClefKind::Baritone => Cell::from_dots(&[3, 4, 6]),
        // Treble and percussion take the G-clef sign.
        ClefKind::Treble | ClefKind::Percussion => Cell::from_dots(&[3, 4]),
    };
    vec![PREFIX, middle, SUFFIX]
}
