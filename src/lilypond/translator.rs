//! LPSR → LilyPond translation pass
//!
//! A single long-lived visitor walked over the adapted score tree. It
//! keeps the running context the emission decisions depend on: the
//! relative-octave reference, the tuplet factor stack, repeat/ending
//! bookkeeping, line-wrap counters for the music and lyrics streams, and
//! the pending decorations deferred from rests.
//!
//! Voices are emitted inside `\relative { … }`: the first pitched note is
//! written with absolute octave marks, every later note with the mark
//! count that brings it within a fourth of the reference, so LilyPond's
//! own relative rule reconstructs the absolute pitches exactly.

use log::{debug, trace};

use crate::errors::{Result, SkippedElement, TranslationError};
use crate::msr::browse::MsrVisitor;
use crate::msr::durations::{derive_double_tremolo, lilypond_duration_for, TupletFactor};
use crate::msr::elements::{
    Barline, BarlineLocation, BarlineStyle, Clef, Key, KeyMode, LyricSyllabic, Placement, Time,
    TimeSymbolKind,
};
use crate::msr::notes::{
    Attachments, Chord, DoubleTremolo, GraceGroup, Harmony, Note, NoteKind, Tuplet,
};
use crate::msr::pitch::{octave_marks_string, relative_octave_marks, Pitch};
use crate::msr::structure::{
    Direction, Measure, MeasureKind, Part, PartGroup, PartGroupSymbolKind, Repeat, RepeatEnding,
    Score, Staff, Voice, VoiceKind,
};
use crate::options::LilyPondOptions;

use super::templates::escape_lilypond_string;

/// Output of the translation walk, before document assembly
#[derive(Debug, Clone)]
pub struct TranslatedScore {
    /// The full \score { … } block
    pub score_block: String,
    pub skipped: Vec<SkippedElement>,
}

/// A wrapping output stream: counts tokens per generated line and forces
/// a newline + indent once the configured maximum is reached.
struct TokenLine {
    buffer: String,
    tokens_on_line: usize,
    max_tokens: usize,
    indent: String,
}

impl TokenLine {
    fn new(max_tokens: usize, indent: String) -> Self {
        TokenLine {
            buffer: String::new(),
            tokens_on_line: 0,
            max_tokens,
            indent,
        }
    }

    fn push(&mut self, token: &str) {
        if self.buffer.is_empty() || self.buffer.ends_with('\n') {
            self.buffer.push_str(&self.indent);
        } else {
            self.buffer.push(' ');
        }
        self.buffer.push_str(token);
        self.tokens_on_line += 1;
        if self.tokens_on_line >= self.max_tokens {
            self.newline();
        }
    }

    fn newline(&mut self) {
        if !self.buffer.is_empty() && !self.buffer.ends_with('\n') {
            self.buffer.push('\n');
        }
        self.tokens_on_line = 0;
    }

    fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn take(&mut self) -> String {
        self.tokens_on_line = 0;
        let mut text = std::mem::take(&mut self.buffer);
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text
    }
}

struct RepeatState {
    expected_endings: u32,
    seen_endings: u32,
}

/// The LPSR → LilyPond translator
pub struct LilyPondTranslator<'a> {
    options: &'a LilyPondOptions,

    // document assembly
    score_block: String,
    depth: usize,
    group_context_open: bool,

    // per-voice streams
    music: TokenLine,
    lyrics: TokenLine,
    voice_name: String,

    // running context flags
    in_harmony_voice: bool,
    skipping_voice: bool,
    in_chord: bool,
    chord_pitches: Vec<String>,
    chord_local_reference: Option<i32>,
    tremolo_element_duration: Option<u32>,

    // relative octave reference: diatonic ordinal of the last emitted
    // pitched note; rests and skips leave it untouched
    reference: Option<i32>,

    // redundancy suppression
    last_clef: Option<Clef>,
    last_key: Option<Key>,
    last_time: Option<Time>,

    tuplet_stack: Vec<TupletFactor>,
    repeat_stack: Vec<RepeatState>,

    // decorations waiting for the next sounding note
    pending_suffixes: Vec<String>,

    // provenance for skip reports and errors
    current_part_id: String,
    current_part_name: String,
    current_divisions: i64,
    current_staff_number: u32,
    staves_seen_in_part: u32,
    current_measure_number: String,

    skipped: Vec<SkippedElement>,
    error: Option<TranslationError>,
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn sanitize_name(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

impl<'a> LilyPondTranslator<'a> {
    pub fn new(options: &'a LilyPondOptions) -> Self {
        LilyPondTranslator {
            options,
            score_block: String::new(),
            depth: 0,
            group_context_open: false,
            music: TokenLine::new(options.max_music_line_elements, String::new()),
            lyrics: TokenLine::new(options.max_lyrics_line_elements, String::new()),
            voice_name: String::new(),
            in_harmony_voice: false,
            skipping_voice: false,
            in_chord: false,
            chord_pitches: Vec::new(),
            chord_local_reference: None,
            tremolo_element_duration: None,
            reference: None,
            last_clef: None,
            last_key: None,
            last_time: None,
            tuplet_stack: Vec::new(),
            repeat_stack: Vec::new(),
            pending_suffixes: Vec::new(),
            current_part_id: String::new(),
            current_part_name: String::new(),
            current_divisions: 1,
            current_staff_number: 0,
            staves_seen_in_part: 0,
            current_measure_number: String::new(),
            skipped: Vec::new(),
            error: None,
        }
    }

    /// Consume the translator after the walk.
    pub fn finish(self) -> Result<TranslatedScore> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(TranslatedScore {
                score_block: self.score_block,
                skipped: self.skipped,
            }),
        }
    }

    fn fail(&mut self, error: TranslationError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn halted(&self) -> bool {
        self.error.is_some() || self.skipping_voice
    }

    fn structural(&mut self, line: &str) {
        self.score_block.push_str(&indent(self.depth));
        self.score_block.push_str(line);
        self.score_block.push('\n');
    }

    fn record_skipped(&mut self, element_type: &str, reason: &str) {
        self.skipped.push(SkippedElement {
            element_type: element_type.to_string(),
            measure_number: if self.current_measure_number.is_empty() {
                None
            } else {
                Some(self.current_measure_number.clone())
            },
            part_id: if self.current_part_id.is_empty() {
                None
            } else {
                Some(self.current_part_id.clone())
            },
            reason: reason.to_string(),
        });
    }

    fn pitch_token(&mut self, pitch: &Pitch, update_reference: bool) -> String {
        let marks = relative_octave_marks(self.reference, pitch);
        let token = format!("{}{}", pitch.lilypond_name(), octave_marks_string(marks));
        if update_reference {
            self.reference = Some(pitch.diatonic_ordinal());
        }
        token
    }

    fn duration_token(&self, note: &Note) -> String {
        match self.tremolo_element_duration {
            Some(duration) => duration.to_string(),
            None => note.duration.lilypond_string(),
        }
    }

    /// Render the attachments of a note or chord into a suffix string,
    /// honoring omit toggles and recording unsupported kinds.
    fn attachments_suffix(&mut self, attachments: &Attachments) -> String {
        let mut suffix = String::new();
        for articulation in &attachments.articulations {
            match articulation.lilypond_string() {
                Some(token) => suffix.push_str(token),
                None => {
                    self.record_skipped(
                        &format!("articulation:{}", articulation.name()),
                        "no LilyPond mapping for this articulation kind",
                    );
                    suffix.push_str(&format!(
                        " %{{ unsupported articulation: {} %}}",
                        articulation.name()
                    ));
                }
            }
        }
        for ornament in &attachments.ornaments {
            match ornament.lilypond_string() {
                Some(token) => {
                    suffix.push(' ');
                    suffix.push_str(token);
                }
                None => {
                    self.record_skipped(
                        &format!("ornament:{}", ornament.name()),
                        "no LilyPond mapping for this ornament kind",
                    );
                    suffix.push_str(&format!(" %{{ unsupported ornament: {} %}}", ornament.name()));
                }
            }
        }
        if !self.options.omit_slurs {
            for slur in &attachments.slurs {
                let mark = match slur.kind {
                    crate::msr::elements::SlurKind::Start => "(",
                    crate::msr::elements::SlurKind::Stop => ")",
                };
                if slur.number > 1 {
                    suffix.push_str(&format!("\\={}{}", slur.number, mark));
                } else {
                    suffix.push_str(mark);
                }
            }
        }
        if !self.options.omit_dynamics {
            for dynamic in &attachments.dynamics {
                suffix.push_str(dynamic.lilypond_string());
            }
        }
        if !self.options.omit_wedges {
            for wedge in &attachments.wedges {
                suffix.push_str(wedge.lilypond_string());
            }
        }
        if !self.options.omit_words {
            for words in &attachments.words {
                let anchor = match words.placement {
                    Placement::Above => '^',
                    Placement::Below => '_',
                };
                suffix.push_str(&format!(
                    "{}\\markup {{ {} }}",
                    anchor,
                    escape_lilypond_string(&words.text)
                ));
            }
        }
        suffix
    }

    fn tie_suffix(&self, tie: Option<crate::msr::elements::TieKind>) -> &'static str {
        use crate::msr::elements::TieKind;
        if self.options.omit_ties {
            return "";
        }
        match tie {
            Some(TieKind::Start) | Some(TieKind::Continue) => " ~",
            Some(TieKind::Stop) | None => "",
        }
    }

    fn collect_lyrics(&mut self, attachments: &Attachments) {
        for lyric in &attachments.lyrics {
            let escaped = escape_lilypond_string(&lyric.text);
            let token = match lyric.syllabic {
                LyricSyllabic::Begin | LyricSyllabic::Middle => format!("{} --", escaped),
                LyricSyllabic::End | LyricSyllabic::Single => escaped,
            };
            self.lyrics.push(&token);
        }
    }

    fn take_pending_suffixes(&mut self) -> String {
        let joined = self.pending_suffixes.concat();
        self.pending_suffixes.clear();
        joined
    }

    /// True when a rest's decoration should be deferred to the next note.
    fn defer_from_rest(&mut self, attachments: &Attachments) -> bool {
        let mut deferred = false;
        if self.options.delay_rests_dynamics && !self.options.omit_dynamics {
            for dynamic in &attachments.dynamics {
                self.pending_suffixes.push(dynamic.lilypond_string().to_string());
                deferred = true;
            }
        }
        if self.options.delay_rests_wedges && !self.options.omit_wedges {
            for wedge in &attachments.wedges {
                self.pending_suffixes.push(wedge.lilypond_string().to_string());
                deferred = true;
            }
        }
        if self.options.delay_rests_words && !self.options.omit_words {
            for words in &attachments.words {
                let anchor = match words.placement {
                    Placement::Above => '^',
                    Placement::Below => '_',
                };
                self.pending_suffixes.push(format!(
                    "{}\\markup {{ {} }}",
                    anchor,
                    escape_lilypond_string(&words.text)
                ));
                deferred = true;
            }
        }
        deferred
    }

    fn lilypond_key_token(key: &Key) -> String {
        // The tonic sits `offset` steps around the circle of fifths from
        // the major tonic of the same signature.
        let offset = match key.mode {
            KeyMode::Major => 0,
            KeyMode::Minor | KeyMode::Aeolian => 3,
            KeyMode::Dorian => 2,
            KeyMode::Phrygian => 4,
            KeyMode::Lydian => -1,
            KeyMode::Mixolydian => 1,
            KeyMode::Locrian => 5,
        };
        let shifted = Key::new(key.input_line, key.fifths + offset, key.mode);
        format!(
            "\\key {} {}",
            shifted.lilypond_tonic(),
            key.mode.lilypond_name()
        )
    }
}

impl<'a> MsrVisitor for LilyPondTranslator<'a> {
    fn visit_start_score(&mut self, _score: &Score) {
        self.structural("\\score {");
        self.depth += 1;
        self.structural("<<");
        self.depth += 1;
    }

    fn visit_end_score(&mut self, _score: &Score) {
        if self.error.is_some() {
            return;
        }
        self.depth -= 1;
        self.structural(">>");
        self.structural("\\layout { }");
        self.depth -= 1;
        self.structural("}");
    }

    fn visit_start_part_group(&mut self, part_group: &PartGroup) {
        if self.error.is_some() {
            return;
        }
        let context = match part_group.symbol {
            PartGroupSymbolKind::Bracket
            | PartGroupSymbolKind::Line
            | PartGroupSymbolKind::Square => Some("StaffGroup"),
            PartGroupSymbolKind::Brace => Some("GrandStaff"),
            PartGroupSymbolKind::NoSymbol => None,
        };
        match context {
            Some(name) => {
                self.structural(&format!("\\new {} <<", name));
                self.depth += 1;
                self.group_context_open = true;
            }
            None => self.group_context_open = false,
        }
    }

    fn visit_end_part_group(&mut self, _part_group: &PartGroup) {
        if self.error.is_some() {
            return;
        }
        if self.group_context_open {
            self.depth -= 1;
            self.structural(">>");
            self.group_context_open = false;
        }
    }

    fn visit_start_part(&mut self, part: &Part) {
        if self.error.is_some() {
            return;
        }
        debug!(target: "lily", "translating part {} ({})", part.id, part.name);
        self.current_part_id = part.id.clone();
        self.current_part_name = part.name.clone();
        self.current_divisions = part.divisions_per_quarter;
        self.staves_seen_in_part = 0;
        self.structural(&format!("% part {} \"{}\"", part.id, part.name));
    }

    fn visit_end_part(&mut self, _part: &Part) {}

    fn visit_start_staff(&mut self, staff: &Staff) {
        if self.error.is_some() {
            return;
        }
        self.current_staff_number = staff.number;
        self.staves_seen_in_part += 1;
        if self.staves_seen_in_part == 1 && !self.current_part_name.is_empty() {
            self.structural(&format!(
                "\\new Staff \\with {{ instrumentName = \"{}\" }} <<",
                escape_lilypond_string(&self.current_part_name.clone())
            ));
        } else {
            self.structural("\\new Staff <<");
        }
        self.depth += 1;
    }

    fn visit_end_staff(&mut self, _staff: &Staff) {
        if self.error.is_some() {
            return;
        }
        self.depth -= 1;
        self.structural(">>");
    }

    fn visit_start_voice(&mut self, voice: &Voice) {
        if self.error.is_some() {
            return;
        }
        self.voice_name = format!(
            "{}s{}v{}",
            sanitize_name(&self.current_part_id),
            self.current_staff_number,
            voice.number
        );
        self.reference = None;
        self.last_clef = None;
        self.last_key = None;
        self.last_time = None;
        self.pending_suffixes.clear();
        self.in_harmony_voice = voice.kind == VoiceKind::Harmony;
        if self.in_harmony_voice && self.options.omit_harmonies {
            self.skipping_voice = true;
            self.record_skipped("harmony-voice", "omitted by omit-harmonies");
            return;
        }
        if self.in_harmony_voice {
            self.structural("\\new ChordNames \\chordmode {");
        } else {
            self.structural(&format!("\\new Voice = \"{}\" \\relative {{", self.voice_name));
        }
        self.depth += 1;
        let music_indent = indent(self.depth);
        self.music = TokenLine::new(self.options.max_music_line_elements, music_indent);
        let lyrics_indent = indent(self.depth + 1);
        self.lyrics = TokenLine::new(self.options.max_lyrics_line_elements, lyrics_indent);
    }

    fn visit_end_voice(&mut self, _voice: &Voice) {
        if self.error.is_some() {
            return;
        }
        if self.skipping_voice {
            self.skipping_voice = false;
            return;
        }
        let music = self.music.take();
        self.score_block.push_str(&music);
        self.depth -= 1;
        self.structural("}");
        if !self.lyrics.is_empty() {
            let voice_name = self.voice_name.clone();
            self.structural(&format!("\\new Lyrics \\lyricsto \"{}\" {{", voice_name));
            let lyrics = self.lyrics.take();
            self.score_block.push_str(&lyrics);
            self.structural("}");
        }
    }

    fn visit_start_measure(&mut self, measure: &Measure) {
        if self.halted() {
            return;
        }
        trace!(target: "lily", "measure {} kind {:?}", measure.number, measure.kind);
        self.current_measure_number = measure.number.clone();
        match measure.kind {
            MeasureKind::Regular => {}
            MeasureKind::IncompleteLeft => {
                let token = format!(
                    "\\partial {}",
                    lilypond_duration_for(measure.actual_length)
                );
                self.music.push(&token);
            }
            MeasureKind::IncompleteRight => {
                let token = format!(
                    "\\set Timing.measureLength = #(ly:make-moment {}/{})",
                    measure.actual_length.numer(),
                    measure.actual_length.denom()
                );
                self.music.push(&token);
            }
            MeasureKind::Overfull => {
                self.music.push("\\cadenzaOn");
            }
            MeasureKind::Empty => {
                let token = format!("R{}", lilypond_duration_for(measure.nominal_length));
                self.music.push(&token);
            }
        }
    }

    fn visit_end_measure(&mut self, measure: &Measure) {
        if self.halted() {
            return;
        }
        match measure.kind {
            MeasureKind::Overfull => {
                self.music.push("\\cadenzaOff");
                self.music.push("\\bar \"|\"");
            }
            MeasureKind::IncompleteRight => {
                let token = format!(
                    "\\set Timing.measureLength = #(ly:make-moment {}/{})",
                    measure.nominal_length.numer(),
                    measure.nominal_length.denom()
                );
                self.music.push(&token);
                if self.options.break_at_incomplete_right_measures {
                    self.music.push("\\break");
                }
                self.music.push("|");
            }
            _ => {
                self.music.push("|");
            }
        }
        self.music.newline();
    }

    fn visit_start_repeat(&mut self, repeat: &Repeat) {
        if self.halted() {
            return;
        }
        self.music.newline();
        self.music
            .push(&format!("\\repeat volta {} {{", repeat.volta_count()));
        self.music.newline();
        self.repeat_stack.push(RepeatState {
            expected_endings: repeat.endings.len() as u32,
            seen_endings: 0,
        });
    }

    fn visit_end_repeat(&mut self, repeat: &Repeat) {
        if self.halted() {
            return;
        }
        match self.repeat_stack.pop() {
            Some(state) => {
                if state.expected_endings == 0 {
                    // No explicit endings: plain volta-2 close.
                    self.music.push("}");
                    self.music.newline();
                } else if state.seen_endings != state.expected_endings {
                    self.fail(TranslationError::internal(
                        repeat.input_line,
                        format!(
                            "repeat expected {} endings but saw {}",
                            state.expected_endings, state.seen_endings
                        ),
                    ));
                }
            }
            None => self.fail(TranslationError::internal(
                repeat.input_line,
                "repeat end without matching start",
            )),
        }
    }

    fn visit_start_repeat_ending(&mut self, ending: &RepeatEnding, total: u32) {
        if self.halted() {
            return;
        }
        let state = match self.repeat_stack.last_mut() {
            Some(state) => state,
            None => {
                self.fail(TranslationError::internal(
                    ending.input_line,
                    "repeat ending outside any repeat",
                ));
                return;
            }
        };
        state.seen_endings += 1;
        let seen = state.seen_endings;
        if ending.number != seen {
            self.fail(TranslationError::internal(
                ending.input_line,
                format!(
                    "repeat ending number {} does not match position {}",
                    ending.number, seen
                ),
            ));
            return;
        }
        // The first ending closes the repeat body and opens the
        // alternative block; everyone opens its own brace.
        if ending.number == 1 {
            self.music.newline();
            self.music.push("}");
            self.music.push("\\alternative {");
            self.music.newline();
        }
        self.music.push("{");
        let _ = total;
    }

    fn visit_end_repeat_ending(&mut self, ending: &RepeatEnding, total: u32) {
        if self.halted() {
            return;
        }
        self.music.push("}");
        self.music.newline();
        // The last ending closes the alternative block.
        if ending.number == total {
            self.music.push("}");
            self.music.newline();
        }
    }

    fn visit_start_note(&mut self, note: &Note) {
        if self.halted() {
            return;
        }
        if self.in_chord {
            if let Some(pitch) = &note.pitch {
                let marks = relative_octave_marks(self.chord_local_reference, pitch);
                let token = format!("{}{}", pitch.lilypond_name(), octave_marks_string(marks));
                // The first chord member becomes the running reference;
                // later members only move the intra-chord reference.
                if self.chord_pitches.is_empty() {
                    let marks_from_running = relative_octave_marks(self.reference, pitch);
                    let first_token = format!(
                        "{}{}",
                        pitch.lilypond_name(),
                        octave_marks_string(marks_from_running)
                    );
                    self.chord_pitches.push(first_token);
                    self.reference = Some(pitch.diatonic_ordinal());
                } else {
                    self.chord_pitches.push(token);
                }
                self.chord_local_reference = Some(pitch.diatonic_ordinal());
            }
            return;
        }

        match note.kind {
            NoteKind::Rest => {
                let mut token = format!("r{}", self.duration_token(note));
                if !self.defer_from_rest(&note.attachments) {
                    token.push_str(&self.attachments_suffix(&note.attachments));
                }
                self.music.push(&token);
            }
            NoteKind::Skip => {
                let token = format!("s{}", self.duration_token(note));
                self.music.push(&token);
            }
            NoteKind::Standalone
            | NoteKind::Grace
            | NoteKind::TupletMember
            | NoteKind::DoubleTremoloMember => {
                let pitch = match &note.pitch {
                    Some(pitch) => *pitch,
                    None => {
                        // Pitchless tuplet members are rests inside the
                        // tuplet; emit as rest.
                        let token = format!("r{}", self.duration_token(note));
                        self.music.push(&token);
                        return;
                    }
                };
                let mut token = self.pitch_token(&pitch, true);
                token.push_str(&self.duration_token(note));
                let pending = self.take_pending_suffixes();
                token.push_str(&pending);
                token.push_str(&self.attachments_suffix(&note.attachments));
                token.push_str(self.tie_suffix(note.tie));
                self.music.push(&token);
                self.collect_lyrics(&note.attachments);
            }
            NoteKind::ChordMember => {
                // Chord members outside a chord indicate a construction
                // bug upstream.
                self.fail(TranslationError::internal(
                    note.input_line,
                    "chord-member note outside a chord",
                ));
            }
        }
    }

    fn visit_start_chord(&mut self, _chord: &Chord) {
        if self.halted() {
            return;
        }
        self.in_chord = true;
        self.chord_pitches.clear();
        self.chord_local_reference = self.reference;
    }

    fn visit_end_chord(&mut self, chord: &Chord) {
        if self.halted() {
            return;
        }
        self.in_chord = false;
        let mut token = format!("< {} >", self.chord_pitches.join(" "));
        token.push_str(&chord.duration.lilypond_string());
        let pending = self.take_pending_suffixes();
        token.push_str(&pending);
        token.push_str(&self.attachments_suffix(&chord.attachments));
        token.push_str(self.tie_suffix(chord.tie));
        self.music.push(&token);
        self.collect_lyrics(&chord.attachments);
    }

    fn visit_start_tuplet(&mut self, tuplet: &Tuplet) {
        if self.halted() {
            return;
        }
        // MusicXML pre-multiplies nested ratios by the enclosing ones;
        // divide the enclosing factor out before display.
        let own = match self.tuplet_stack.last() {
            Some(outer) => tuplet.factor.unapplied_from(outer),
            None => tuplet.factor,
        };
        if own.actual_notes <= 0 || own.normal_notes <= 0 {
            self.fail(TranslationError::internal(
                tuplet.input_line,
                format!(
                    "tuplet ratio {}/{} is not positive after unapplying the enclosing ratio",
                    own.actual_notes, own.normal_notes
                ),
            ));
            return;
        }
        self.music.push(&format!(
            "\\tuplet {}/{} {{",
            own.actual_notes, own.normal_notes
        ));
        self.tuplet_stack.push(tuplet.factor);
    }

    fn visit_end_tuplet(&mut self, _tuplet: &Tuplet) {
        if self.halted() {
            return;
        }
        self.tuplet_stack.pop();
        self.music.push("}");
    }

    fn visit_start_grace_group(&mut self, grace_group: &GraceGroup) {
        if self.halted() {
            return;
        }
        if grace_group.slash {
            self.music.push("\\acciaccatura {");
        } else {
            self.music.push("\\grace {");
        }
    }

    fn visit_end_grace_group(&mut self, _grace_group: &GraceGroup) {
        if self.halted() {
            return;
        }
        self.music.push("}");
    }

    fn visit_start_double_tremolo(&mut self, tremolo: &DoubleTremolo) {
        if self.halted() {
            return;
        }
        let derivation = match derive_double_tremolo(
            tremolo.marks_number,
            self.current_divisions,
            tremolo.total_divisions,
            tremolo.input_line,
        ) {
            Ok(derivation) => derivation,
            Err(error) => {
                self.fail(error);
                return;
            }
        };
        self.music
            .push(&format!("\\repeat tremolo {} {{", derivation.repeats));
        self.tremolo_element_duration = Some(derivation.element_duration);
    }

    fn visit_end_double_tremolo(&mut self, _tremolo: &DoubleTremolo) {
        if self.halted() {
            return;
        }
        self.tremolo_element_duration = None;
        self.music.push("}");
    }

    fn visit_harmony(&mut self, harmony: &Harmony) {
        if self.halted() {
            return;
        }
        if !self.in_harmony_voice {
            // A harmony in a regular voice renders as an inline comment.
            if !self.options.omit_harmonies {
                self.music.push(&format!(
                    "%{{ harmony: {}{}{} %}}",
                    harmony.root_step.lilypond_name(),
                    harmony.root_alteration.lilypond_suffix(),
                    harmony.kind.chordmode_suffix()
                ));
            }
            return;
        }
        let token = format!(
            "{}{}{}{}",
            harmony.root_step.lilypond_name(),
            harmony.root_alteration.lilypond_suffix(),
            harmony.duration.lilypond_string(),
            harmony.kind.chordmode_suffix()
        );
        self.music.push(&token);
    }

    fn visit_clef(&mut self, clef: &Clef) {
        if self.halted() {
            return;
        }
        if let Some(last) = &self.last_clef {
            if last.is_equal_to(clef) {
                return;
            }
        }
        self.last_clef = Some(*clef);
        self.music.push(&format!("\\clef {}", clef.kind.lilypond_name()));
    }

    fn visit_key(&mut self, key: &Key) {
        if self.halted() {
            return;
        }
        if let Some(last) = &self.last_key {
            if last.is_equal_to(key) {
                return;
            }
        }
        self.last_key = Some(*key);
        let token = Self::lilypond_key_token(key);
        self.music.push(&token);
    }

    fn visit_time(&mut self, time: &Time) {
        if self.halted() {
            return;
        }
        if time.symbol == TimeSymbolKind::SenzaMisura {
            // The overfull measure kind emits \cadenzaOn.
            return;
        }
        if let Some(last) = &self.last_time {
            if last.is_equal_to(time) {
                return;
            }
        }
        self.last_time = Some(time.clone());
        match time.lilypond_string() {
            Ok(token) => self.music.push(&token),
            Err(error) => self.fail(error),
        }
    }

    fn visit_barline(&mut self, barline: &Barline) {
        if self.halted() {
            return;
        }
        if barline.location != BarlineLocation::Right || barline.style == BarlineStyle::Regular {
            return;
        }
        self.music
            .push(&format!("\\bar \"{}\"", barline.style.lilypond_string()));
    }

    fn visit_direction(&mut self, direction: &Direction) {
        if self.halted() {
            return;
        }
        match direction {
            Direction::Tempo(tempo) => {
                self.music.push(&format!(
                    "\\tempo {} = {}",
                    tempo.beat_unit.lilypond_number(),
                    tempo.beats_per_minute
                ));
            }
            Direction::Dynamic(kind) => {
                if !self.options.omit_dynamics {
                    self.pending_suffixes.push(kind.lilypond_string().to_string());
                }
            }
            Direction::Wedge(kind) => {
                if !self.options.omit_wedges {
                    self.pending_suffixes.push(kind.lilypond_string().to_string());
                }
            }
            Direction::Words(words) => {
                if !self.options.omit_words {
                    let anchor = match words.placement {
                        Placement::Above => '^',
                        Placement::Below => '_',
                    };
                    self.pending_suffixes.push(format!(
                        "{}\\markup {{ {} }}",
                        anchor,
                        escape_lilypond_string(&words.text)
                    ));
                }
            }
        }
    }
}
