//! BSR → braille byte stream
//!
//! Walks the finalized page layout with a [`BsrVisitor`] and hands the
//! collected pages to the encoder.

use std::io;

use log::info;

use crate::bsr::browse::{browse_bsr_score, BsrVisitor};
use crate::bsr::encoding::{encode_pages, EncodedPage};
use crate::bsr::structure::{BsrLine, BsrPage, BsrScore};
use crate::options::BrailleOptions;

/// Serialize a finalized BSR score to bytes in the configured encoding.
pub fn bsr_to_bytes(score: &BsrScore, options: &BrailleOptions) -> Vec<u8> {
    let mut collector = PageCollector::default();
    browse_bsr_score(score, &mut collector);
    let bytes = encode_pages(&collector.pages, options.encoding);
    info!(
        target: "bsr",
        "serialized {} pages to {} bytes",
        collector.pages.len(),
        bytes.len()
    );
    bytes
}

/// Serialize to a writer.
pub fn write_bsr<W: io::Write>(
    score: &BsrScore,
    options: &BrailleOptions,
    writer: &mut W,
) -> io::Result<()> {
    writer.write_all(&bsr_to_bytes(score, options))
}

#[derive(Default)]
struct PageCollector {
    pages: Vec<EncodedPage>,
}

impl BsrVisitor for PageCollector {
    fn visit_start_page(&mut self, page: &BsrPage) {
        self.pages.push(EncodedPage {
            braille_page_number: page.braille_page_number,
            lines: Vec::new(),
        });
    }

    fn visit_line(&mut self, line: &BsrLine) {
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(line.cells.clone());
        }
    }
}
