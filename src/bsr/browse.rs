//! BSR traversal, mirroring the MSR walk: start/end pairs in document
//! order, no-op defaults.

use crate::bsr::structure::{BsrLine, BsrMeasure, BsrPage, BsrParallel, BsrScore, BsrVoice};

#[allow(unused_variables)]
pub trait BsrVisitor {
    fn visit_start_score(&mut self, score: &BsrScore) {}
    fn visit_end_score(&mut self, score: &BsrScore) {}

    fn visit_start_voice(&mut self, voice: &BsrVoice) {}
    fn visit_end_voice(&mut self, voice: &BsrVoice) {}

    fn visit_measure(&mut self, measure: &BsrMeasure) {}

    fn visit_start_page(&mut self, page: &BsrPage) {}
    fn visit_end_page(&mut self, page: &BsrPage) {}

    fn visit_start_parallel(&mut self, parallel: &BsrParallel) {}
    fn visit_end_parallel(&mut self, parallel: &BsrParallel) {}

    fn visit_line(&mut self, line: &BsrLine) {}
}

/// Walk the transcription (voices, then measures) followed by the layout
/// (pages, then parallels, then lines) when present.
pub fn browse_bsr_score(score: &BsrScore, visitor: &mut dyn BsrVisitor) {
    visitor.visit_start_score(score);
    for voice in &score.voices {
        visitor.visit_start_voice(voice);
        for measure in &voice.measures {
            visitor.visit_measure(measure);
        }
        visitor.visit_end_voice(voice);
    }
    for page in &score.pages {
        visitor.visit_start_page(page);
        for parallel in &page.parallels {
            visitor.visit_start_parallel(parallel);
            for line in &parallel.lines {
                visitor.visit_line(line);
            }
            visitor.visit_end_parallel(parallel);
        }
        visitor.visit_end_page(page);
    }
    visitor.visit_end_score(score);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsr::structure::{BsrLine, BsrMeasure, BsrPage, BsrVoice};

    #[derive(Default)]
    struct Counter {
        measures: usize,
        parallels: usize,
        lines: usize,
        pages: usize,
    }

    impl BsrVisitor for Counter {
        fn visit_measure(&mut self, _measure: &BsrMeasure) {
            self.measures += 1;
        }
        fn visit_start_page(&mut self, _page: &BsrPage) {
            self.pages += 1;
        }
        fn visit_start_parallel(&mut self, _parallel: &BsrParallel) {
            self.parallels += 1;
        }
        fn visit_line(&mut self, _line: &BsrLine) {
            self.lines += 1;
        }
    }

    #[test]
    fn walk_covers_transcription_and_layout() {
        let mut score = BsrScore::new();
        let mut voice = BsrVoice::new("P1", 1, 1);
        voice.measures.push(BsrMeasure::new("1", 1));
        voice.measures.push(BsrMeasure::new("2", 2));
        score.voices.push(voice);
        let mut page = BsrPage::new(1);
        page.parallels.push(BsrParallel::single(BsrLine::default()));
        score.pages.push(page);

        let mut counter = Counter::default();
        browse_bsr_score(&score, &mut counter);
        assert_eq!(counter.measures, 2);
        assert_eq!(counter.pages, 1);
        assert_eq!(counter.parallels, 1);
        assert_eq!(counter.lines, 1);
    }
}
