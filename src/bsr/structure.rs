//! BSR containment hierarchy
//!
//! Transcription builds voices of measures; finalization lays those out
//! into lines and pages. Measures and pages carry both the print number
//! from the source and the braille number assigned during layout, because
//! the two diverge as soon as a score is split across volumes or a
//! measure range is transcribed.

use serde::{Deserialize, Serialize};

use crate::bsr::cells::Cell;
use crate::options::ParallelLayoutKind;

/// One transcribed measure: cells only, no layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BsrMeasure {
    /// Measure number as printed in the source
    pub print_number: String,
    /// Sequential number assigned during transcription
    pub braille_number: u32,
    pub cells: Vec<Cell>,
}

impl BsrMeasure {
    pub fn new(print_number: impl Into<String>, braille_number: u32) -> Self {
        BsrMeasure {
            print_number: print_number.into(),
            braille_number,
            cells: Vec::new(),
        }
    }
}

/// One transcribed voice: an optional signature prefix plus measures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BsrVoice {
    pub part_id: String,
    pub staff_number: u32,
    pub voice_number: u32,
    /// Clef/key/time cells emitted once before the first measure
    pub signature: Vec<Cell>,
    pub measures: Vec<BsrMeasure>,
}

impl BsrVoice {
    pub fn new(part_id: impl Into<String>, staff_number: u32, voice_number: u32) -> Self {
        BsrVoice {
            part_id: part_id.into(),
            staff_number,
            voice_number,
            signature: Vec::new(),
            measures: Vec::new(),
        }
    }
}

/// One physical output line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BsrLine {
    pub cells: Vec<Cell>,
}

impl BsrLine {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Lines that sound together, laid out under one policy. Sequential
/// layouts produce single-line parallels; bar-over-bar groups one line
/// per voice for each span of measure columns, and such a group never
/// splits across a page boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BsrParallel {
    pub layout: ParallelLayoutKind,
    pub lines: Vec<BsrLine>,
}

impl BsrParallel {
    pub fn single(line: BsrLine) -> Self {
        BsrParallel {
            layout: ParallelLayoutKind::LineOverLine,
            lines: vec![line],
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// One physical output page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BsrPage {
    /// Source page, when a print correspondence is known
    pub print_page_number: Option<u32>,
    /// Sequential braille page number assigned during layout
    pub braille_page_number: u32,
    pub parallels: Vec<BsrParallel>,
}

impl BsrPage {
    pub fn new(braille_page_number: u32) -> Self {
        BsrPage {
            print_page_number: None,
            braille_page_number,
            parallels: Vec::new(),
        }
    }

    /// Physical lines in page order.
    pub fn lines(&self) -> impl Iterator<Item = &BsrLine> {
        self.parallels.iter().flat_map(|p| p.lines.iter())
    }

    pub fn line_count(&self) -> usize {
        self.parallels.iter().map(BsrParallel::line_count).sum()
    }
}

/// The BSR root. `voices` is the transcription output; `pages` is empty
/// until finalization lays the voices out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BsrScore {
    /// Title/composer heading, already in cells
    pub heading: Vec<Cell>,
    pub voices: Vec<BsrVoice>,
    pub pages: Vec<BsrPage>,
}

impl BsrScore {
    pub fn new() -> Self {
        BsrScore::default()
    }

    /// A copy with the transcription kept and the layout discarded, so a
    /// finalization pass can run again under different layout settings.
    pub fn newborn_clone(&self) -> BsrScore {
        BsrScore {
            heading: self.heading.clone(),
            voices: self.voices.clone(),
            pages: Vec::new(),
        }
    }

    pub fn measure_count(&self) -> usize {
        self.voices.iter().map(|v| v.measures.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsr::cells;

    #[test]
    fn newborn_clone_keeps_cells_drops_layout() {
        let mut score = BsrScore::new();
        let mut voice = BsrVoice::new("P1", 1, 1);
        let mut measure = BsrMeasure::new("1", 1);
        measure.cells.push(cells::NUMBER_SIGN);
        voice.measures.push(measure);
        score.voices.push(voice);
        score.pages.push(BsrPage::new(1));

        let newborn = score.newborn_clone();
        assert_eq!(newborn.voices, score.voices);
        assert!(newborn.pages.is_empty());
    }

    #[test]
    fn print_and_braille_numbers_are_independent() {
        let measure = BsrMeasure::new("12a", 3);
        assert_eq!(measure.print_number, "12a");
        assert_eq!(measure.braille_number, 3);
    }
}
