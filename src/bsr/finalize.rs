//! BSR finalization: lay transcribed voices out into lines and pages
//!
//! Measures are never split unless one alone exceeds the line capacity;
//! a split line ends with the music hyphen. Continuation lines of a voice
//! are indented two cells. Bar-over-bar layout groups the voices measure
//! by measure; line-over-line transcribes each voice fully before the
//! next one starts.

use log::debug;

use crate::bsr::cells::{Cell, MUSIC_HYPHEN};
use crate::bsr::structure::{BsrLine, BsrPage, BsrParallel, BsrScore, BsrVoice};
use crate::errors::Result;
use crate::options::{BrailleOptions, ParallelLayoutKind};

const CONTINUATION_INDENT: usize = 2;

/// Assign parallels, lines and pages to a transcribed score.
pub fn finalize_bsr(score: &mut BsrScore, options: &BrailleOptions) -> Result<()> {
    let mut parallels: Vec<BsrParallel> = Vec::new();

    for chunk in wrap_cells(&score.heading, options.cells_per_line, 0) {
        parallels.push(BsrParallel::single(BsrLine { cells: chunk }));
    }
    if !score.heading.is_empty() {
        parallels.push(BsrParallel::single(BsrLine::default()));
    }

    let grouped = score.voices.len() > 1
        && options.parallel_layout == ParallelLayoutKind::BarOverBar;
    if grouped {
        layout_bar_over_bar(&score.voices, options, &mut parallels);
    } else {
        for voice in &score.voices {
            layout_voice(voice, options, &mut parallels);
        }
    }

    score.pages = paginate(parallels, options.lines_per_page);
    debug!(target: "bsr", "finalized into {} pages", score.pages.len());
    Ok(())
}

/// Flow one voice's signature and measures into single-line parallels.
fn layout_voice(voice: &BsrVoice, options: &BrailleOptions, parallels: &mut Vec<BsrParallel>) {
    let mut current: Vec<Cell> = voice.signature.clone();
    let mut measures_on_line = 0usize;
    let mut first_line = true;

    for measure in &voice.measures {
        let separator = if current.is_empty() { 0 } else { 1 };
        let fits = current.len() + separator + measure.cells.len() <= options.cells_per_line;
        let under_cap =
            options.measures_per_line == 0 || measures_on_line < options.measures_per_line;
        if !(fits && under_cap) && !current.is_empty() {
            parallels.push(BsrParallel::single(BsrLine { cells: current }));
            current = indent(first_line_done(&mut first_line));
            measures_on_line = 0;
        }
        if !current.is_empty() && !ends_with_indent_only(&current) {
            current.push(Cell::BLANK);
        }
        if current.len() + measure.cells.len() <= options.cells_per_line {
            current.extend_from_slice(&measure.cells);
        } else {
            // A measure longer than a whole line: split with hyphens.
            let mut remaining = measure.cells.as_slice();
            loop {
                let capacity = options.cells_per_line.saturating_sub(current.len() + 1);
                if remaining.len() <= capacity + 1 {
                    current.extend_from_slice(remaining);
                    break;
                }
                let (head, tail) = remaining.split_at(capacity);
                current.extend_from_slice(head);
                current.push(MUSIC_HYPHEN);
                parallels.push(BsrParallel::single(BsrLine { cells: current }));
                current = indent(first_line_done(&mut first_line));
                remaining = tail;
            }
        }
        measures_on_line += 1;
    }
    if !current.is_empty() {
        parallels.push(BsrParallel::single(BsrLine { cells: current }));
    }
}

/// Bar-over-bar: each measure-column group becomes one parallel holding
/// a line per voice plus a blank spacer.
fn layout_bar_over_bar(
    voices: &[BsrVoice],
    options: &BrailleOptions,
    parallels: &mut Vec<BsrParallel>,
) {
    let columns = voices.iter().map(|v| v.measures.len()).max().unwrap_or(0);
    let mut index = 0usize;
    while index < columns {
        // Greedy group: as many measure columns as fit every voice's line.
        let mut group_end = index + 1;
        'grow: while group_end < columns {
            for voice in voices {
                let width = line_width(voice, index, group_end + 1);
                if width > options.cells_per_line.saturating_sub(CONTINUATION_INDENT) {
                    break 'grow;
                }
            }
            if options.measures_per_line != 0 && group_end - index >= options.measures_per_line {
                break;
            }
            group_end += 1;
        }
        let mut group = BsrParallel {
            layout: ParallelLayoutKind::BarOverBar,
            lines: Vec::new(),
        };
        for voice in voices {
            let mut cells: Vec<Cell> = Vec::new();
            if index == 0 {
                cells.extend_from_slice(&voice.signature);
            }
            for column in index..group_end {
                if let Some(measure) = voice.measures.get(column) {
                    if !cells.is_empty() {
                        cells.push(Cell::BLANK);
                    }
                    cells.extend_from_slice(&measure.cells);
                }
            }
            group.lines.push(BsrLine { cells });
        }
        group.lines.push(BsrLine::default());
        parallels.push(group);
        index = group_end;
    }
}

fn line_width(voice: &BsrVoice, from: usize, to: usize) -> usize {
    let mut width = 0;
    for column in from..to {
        if let Some(measure) = voice.measures.get(column) {
            if width > 0 {
                width += 1;
            }
            width += measure.cells.len();
        }
    }
    width
}

fn wrap_cells(cells: &[Cell], capacity: usize, indent_by: usize) -> Vec<Vec<Cell>> {
    let mut chunks = Vec::new();
    let mut remaining = cells;
    while !remaining.is_empty() {
        let take = (capacity - indent_by).min(remaining.len());
        let (head, tail) = remaining.split_at(take);
        let mut chunk = vec![Cell::BLANK; indent_by];
        chunk.extend_from_slice(head);
        chunks.push(chunk);
        remaining = tail;
    }
    chunks
}

fn indent(continuation: bool) -> Vec<Cell> {
    if continuation {
        vec![Cell::BLANK; CONTINUATION_INDENT]
    } else {
        Vec::new()
    }
}

fn first_line_done(first_line: &mut bool) -> bool {
    *first_line = false;
    true
}

fn ends_with_indent_only(cells: &[Cell]) -> bool {
    cells.iter().all(|c| *c == Cell::BLANK)
}

/// A parallel never splits across a page boundary; an oversized one
/// overflows its page rather than being torn apart.
fn paginate(parallels: Vec<BsrParallel>, lines_per_page: usize) -> Vec<BsrPage> {
    let mut pages = Vec::new();
    let mut page = BsrPage::new(1);
    for parallel in parallels {
        let overflows = page.line_count() + parallel.line_count() > lines_per_page;
        if overflows && page.line_count() > 0 {
            let next_number = page.braille_page_number + 1;
            pages.push(page);
            page = BsrPage::new(next_number);
        }
        page.parallels.push(parallel);
    }
    if page.line_count() > 0 || pages.is_empty() {
        pages.push(page);
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsr::cells;
    use crate::bsr::structure::BsrMeasure;

    fn measure_of(width: usize, number: u32) -> BsrMeasure {
        let mut measure = BsrMeasure::new(number.to_string(), number);
        measure.cells = vec![cells::NUMBER_SIGN; width];
        measure
    }

    fn voice_of(measures: Vec<BsrMeasure>) -> BsrVoice {
        let mut voice = BsrVoice::new("P1", 1, 1);
        voice.measures = measures;
        voice
    }

    #[test]
    fn lines_respect_cell_capacity() {
        let mut score = BsrScore::new();
        score.voices.push(voice_of(
            (1..=10).map(|n| measure_of(10, n)).collect(),
        ));
        let mut options = BrailleOptions::default();
        options.cells_per_line = 24;
        finalize_bsr(&mut score, &options).unwrap();
        for page in &score.pages {
            for line in page.lines() {
                assert!(line.len() <= 24, "line has {} cells", line.len());
            }
        }
    }

    #[test]
    fn measures_per_line_caps_packing() {
        let mut score = BsrScore::new();
        score
            .voices
            .push(voice_of((1..=6).map(|n| measure_of(3, n)).collect()));
        let mut options = BrailleOptions::default();
        options.cells_per_line = 40;
        options.measures_per_line = 2;
        finalize_bsr(&mut score, &options).unwrap();
        let lines: Vec<_> = score.pages.iter().flat_map(|p| p.lines()).collect();
        // Two 3-cell measures and a separator per line.
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.len() == 7 || l.len() == 9));
    }

    #[test]
    fn oversized_measure_splits_with_music_hyphen() {
        let mut score = BsrScore::new();
        score.voices.push(voice_of(vec![measure_of(30, 1)]));
        let mut options = BrailleOptions::default();
        options.cells_per_line = 12;
        finalize_bsr(&mut score, &options).unwrap();
        let first_line = score.pages[0].lines().next().unwrap();
        assert_eq!(*first_line.cells.last().unwrap(), MUSIC_HYPHEN);
    }

    #[test]
    fn pages_fill_to_lines_per_page() {
        let mut score = BsrScore::new();
        score.voices.push(voice_of(
            (1..=40).map(|n| measure_of(20, n)).collect(),
        ));
        let mut options = BrailleOptions::default();
        options.cells_per_line = 24;
        options.lines_per_page = 10;
        finalize_bsr(&mut score, &options).unwrap();
        assert!(score.pages.len() > 1);
        for page in &score.pages {
            assert!(page.line_count() <= 10);
        }
        // Braille page numbers are sequential from one.
        for (index, page) in score.pages.iter().enumerate() {
            assert_eq!(page.braille_page_number, index as u32 + 1);
        }
    }

    #[test]
    fn bar_over_bar_emits_one_line_per_voice_per_group() {
        let mut score = BsrScore::new();
        score
            .voices
            .push(voice_of((1..=2).map(|n| measure_of(8, n)).collect()));
        score
            .voices
            .push(voice_of((1..=2).map(|n| measure_of(8, n)).collect()));
        let mut options = BrailleOptions::default();
        options.cells_per_line = 30;
        options.parallel_layout = ParallelLayoutKind::BarOverBar;
        finalize_bsr(&mut score, &options).unwrap();
        // Both measures fit one group: one parallel carrying a line per
        // voice plus a blank spacer.
        let parallels: Vec<_> = score.pages.iter().flat_map(|p| p.parallels.iter()).collect();
        assert_eq!(parallels.len(), 1);
        assert_eq!(parallels[0].layout, ParallelLayoutKind::BarOverBar);
        let non_empty = parallels[0].lines.iter().filter(|l| !l.is_empty()).count();
        assert_eq!(non_empty, 2);
    }

    #[test]
    fn bar_over_bar_group_never_splits_across_pages() {
        let mut score = BsrScore::new();
        score
            .voices
            .push(voice_of((1..=8).map(|n| measure_of(12, n)).collect()));
        score
            .voices
            .push(voice_of((1..=8).map(|n| measure_of(12, n)).collect()));
        let mut options = BrailleOptions::default();
        options.cells_per_line = 16;
        options.lines_per_page = 5;
        options.parallel_layout = ParallelLayoutKind::BarOverBar;
        finalize_bsr(&mut score, &options).unwrap();
        // Each group is 3 lines; a 5-line page holds exactly one group,
        // never half of one.
        for page in &score.pages {
            for parallel in &page.parallels {
                assert_eq!(parallel.lines.len(), 3);
            }
        }
        assert!(score.pages.len() > 1);
    }

    #[test]
    fn sequential_layout_yields_single_line_parallels() {
        let mut score = BsrScore::new();
        score
            .voices
            .push(voice_of((1..=4).map(|n| measure_of(10, n)).collect()));
        let mut options = BrailleOptions::default();
        options.cells_per_line = 24;
        finalize_bsr(&mut score, &options).unwrap();
        for page in &score.pages {
            for parallel in &page.parallels {
                assert_eq!(parallel.layout, ParallelLayoutKind::LineOverLine);
                assert_eq!(parallel.line_count(), 1);
            }
        }
    }
}
