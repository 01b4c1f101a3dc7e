//! LPSR: the LilyPond Score Representation
//!
//! A thin wrapper adding the LilyPond-specific document blocks (header,
//! paper, layout) around an MSR score that has already been filtered and
//! adapted for output.

pub mod from_msr;

use serde::Serialize;

use crate::msr::Score;

/// \header block fields
#[derive(Debug, Clone, Default, Serialize)]
pub struct LpsrHeader {
    pub title: Option<String>,
    pub opus: Option<String>,
    pub composer: Option<String>,
}

/// \paper block fields, in millimeters where dimensional
#[derive(Debug, Clone, Serialize)]
pub struct LpsrPaper {
    pub indent: f32,
    pub ragged_last: bool,
}

impl Default for LpsrPaper {
    fn default() -> Self {
        LpsrPaper {
            indent: 0.0,
            ragged_last: true,
        }
    }
}

/// \layout block fields
#[derive(Debug, Clone, Default, Serialize)]
pub struct LpsrLayout {
    pub global_staff_size: Option<f32>,
}

/// The LPSR root: document blocks plus the adapted MSR score
#[derive(Debug, Clone)]
pub struct LpsrScore {
    pub header: LpsrHeader,
    pub paper: LpsrPaper,
    pub layout: LpsrLayout,
    pub score: Score,
}

impl LpsrScore {
    /// Short textual summary for the exit-after-pass debug dump.
    pub fn debug_dump(&self) -> String {
        format!(
            "LpsrScore title={:?} composer={:?}\n{}",
            self.header.title,
            self.header.composer,
            crate::msr::display::dump_score(&self.score)
        )
    }
}

pub use from_msr::lpsr_from_msr;
