//! Byte-level encodings of braille text
//!
//! The serializer produces pages of lines of cells; this module turns
//! them into the configured byte stream. ASCII uses the North American
//! table, UTF-8 the U+2800 block, and UTF-16 the same characters as
//! explicitly ordered code units.

use crate::bsr::cells::Cell;
use crate::options::{BrailleOutputKind, ByteOrdering};

/// A fully laid-out page ready for encoding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedPage {
    pub braille_page_number: u32,
    pub lines: Vec<Vec<Cell>>,
}

/// Encode pages into the output byte stream. Lines end with `\n`; pages
/// after the first are separated by a form feed.
pub fn encode_pages(pages: &[EncodedPage], kind: BrailleOutputKind) -> Vec<u8> {
    match kind {
        BrailleOutputKind::Ascii => text_bytes(pages, |cell| cell.ascii(), false),
        BrailleOutputKind::Utf8 => text_bytes(pages, |cell| cell.unicode(), false),
        BrailleOutputKind::Utf8Debug => text_bytes(pages, |cell| cell.unicode(), true),
        BrailleOutputKind::Utf16(ordering) => {
            let text = build_text(pages, |cell| cell.unicode(), false);
            let mut bytes = Vec::with_capacity(text.len() * 2);
            for unit in text.encode_utf16() {
                match ordering {
                    ByteOrdering::BigEndian => bytes.extend_from_slice(&unit.to_be_bytes()),
                    ByteOrdering::LittleEndian => bytes.extend_from_slice(&unit.to_le_bytes()),
                }
            }
            bytes
        }
    }
}

fn text_bytes(pages: &[EncodedPage], glyph: fn(Cell) -> char, debug: bool) -> Vec<u8> {
    build_text(pages, glyph, debug).into_bytes()
}

fn build_text(pages: &[EncodedPage], glyph: fn(Cell) -> char, debug: bool) -> String {
    let mut text = String::new();
    for (index, page) in pages.iter().enumerate() {
        if index > 0 {
            text.push('\u{0c}');
        }
        if debug {
            text.push_str(&format!("=== page {} ===\n", page.braille_page_number));
        }
        for line in &page.lines {
            for cell in line {
                text.push(glyph(*cell));
            }
            text.push('\n');
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_page(cells: Vec<Cell>) -> Vec<EncodedPage> {
        vec![EncodedPage {
            braille_page_number: 1,
            lines: vec![cells],
        }]
    }

    #[test]
    fn ascii_encoding_uses_nabcc_table() {
        let pages = one_page(vec![
            Cell::from_dots(&[1]),
            Cell::BLANK,
            Cell::from_dots(&[3, 4, 5, 6]),
        ]);
        assert_eq!(encode_pages(&pages, BrailleOutputKind::Ascii), b"A #\n");
    }

    #[test]
    fn utf8_encoding_hits_braille_block() {
        let pages = one_page(vec![Cell::from_dots(&[1])]);
        let bytes = encode_pages(&pages, BrailleOutputKind::Utf8);
        assert_eq!(String::from_utf8(bytes).unwrap(), "\u{2801}\n");
    }

    #[test]
    fn utf16_orderings_differ_only_in_byte_order() {
        let pages = one_page(vec![Cell::from_dots(&[1])]);
        let big = encode_pages(&pages, BrailleOutputKind::Utf16(ByteOrdering::BigEndian));
        let little = encode_pages(&pages, BrailleOutputKind::Utf16(ByteOrdering::LittleEndian));
        assert_eq!(big.len(), little.len());
        assert_eq!(big[0], little[1]);
        assert_eq!(big[1], little[0]);
        // U+2801 big-endian
        assert_eq!(&big[0..2], &[0x28, 0x01]);
    }

    #[test]
    fn debug_encoding_marks_pages() {
        let pages = vec![
            EncodedPage {
                braille_page_number: 1,
                lines: vec![vec![Cell::from_dots(&[1])]],
            },
            EncodedPage {
                braille_page_number: 2,
                lines: vec![vec![Cell::from_dots(&[1, 2])]],
            },
        ];
        let text =
            String::from_utf8(encode_pages(&pages, BrailleOutputKind::Utf8Debug)).unwrap();
        assert!(text.contains("=== page 1 ==="));
        assert!(text.contains("=== page 2 ==="));
        assert!(text.contains('\u{0c}'));
    }
}
