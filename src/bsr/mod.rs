//! BSR: the Braille Score Representation
//!
//! Transcription ([`bsr_from_msr`]) turns an MSR score into cell runs per
//! voice; finalization ([`finalize_bsr`]) lays them out into lines and
//! pages; serialization ([`bsr_to_bytes`]) encodes the layout.

pub mod browse;
pub mod cells;
pub mod encoding;
pub mod finalize;
pub mod from_msr;
pub mod structure;
pub mod to_braille;

pub use browse::{browse_bsr_score, BsrVisitor};
pub use cells::Cell;
pub use finalize::finalize_bsr;
pub use from_msr::{bsr_from_msr, BsrTranscription};
pub use structure::{BsrLine, BsrMeasure, BsrPage, BsrParallel, BsrScore, BsrVoice};
pub use to_braille::{bsr_to_bytes, write_bsr};

impl BsrScore {
    /// Short textual summary for the exit-after-pass debug dump.
    pub fn debug_dump(&self) -> String {
        let mut out = format!(
            "BsrScore voices={} measures={} pages={}\n",
            self.voices.len(),
            self.measure_count(),
            self.pages.len()
        );
        for voice in &self.voices {
            out.push_str(&format!(
                "  voice {}/{}/{}: {} measures\n",
                voice.part_id,
                voice.staff_number,
                voice.voice_number,
                voice.measures.len()
            ));
        }
        out
    }
}
