//! MSR construction from a parsed MusicXML document
//!
//! Walks the score-partwise element tree in document order and assembles
//! the MSR score. Chords, tuplets, grace runs and double tremolos arrive
//! flattened in MusicXML (a `<chord/>` child joins a note to its
//! predecessor, tuplet stops ride on their last member), so the builder
//! keeps a small pending-element state per voice and flushes it as each
//! following element reveals what the pending one was.

use std::collections::BTreeMap;

use log::{debug, warn};
use roxmltree::Node;

use crate::errors::{ParseError, Result, SkippedElement};
use crate::msr::durations::WholeNotes;
use crate::msr::elements::{
    ArticulationKind, Barline, Clef, DynamicKind, Key, Lyric, LyricSyllabic, OrnamentKind,
    Placement, Slur, SlurKind, Tempo, TieKind, Time, WedgeKind, Words,
};
use crate::msr::notes::{
    Attachments, Chord, DoubleTremolo, GraceGroup, Harmony, HarmonyKind, Note, NoteKind, Tuplet,
    TupletMember,
};
use crate::msr::pitch::{Alteration, DiatonicStep};
use crate::msr::structure::{
    classify_measure_kind, Direction, Measure, MeasureElement, Part, PartGroup,
    PartGroupSymbolKind, Repeat, RepeatEnding, Score, Staff, Uplink, Voice, VoiceElement,
    VoiceKind,
};
use crate::msr::durations::{DurationKind, NoteDuration, TupletFactor};

use super::parser::{
    children_named, get_child, get_child_text, get_text, line_of, parse_barline_style, parse_clef,
    parse_document, parse_key, parse_note_duration, parse_note_timing, parse_pitch, parse_time,
    strip_doctype,
};

/// Front-end output: the MSR tree plus constructs left untranslated
#[derive(Debug, Clone)]
pub struct ParsedScore {
    pub score: Score,
    pub skipped: Vec<SkippedElement>,
}

/// Parse MusicXML text and build the MSR score.
pub fn build_score(xml: &str) -> Result<ParsedScore> {
    let cleaned = strip_doctype(xml);
    let doc = parse_document(&cleaned)?;
    let root = doc.root_element();

    let mut builder = ScoreBuilder::new();
    builder.read_header(root);
    builder.read_part_list(root);
    for part_node in children_named(root, "part") {
        builder.read_part(part_node)?;
    }
    Ok(builder.finish())
}

#[derive(Debug, Clone, Default)]
struct PartInfo {
    name: String,
    abbreviation: Option<String>,
}

struct ScoreBuilder {
    score: Score,
    part_infos: BTreeMap<String, PartInfo>,
    /// (group template, member part ids) in document order
    groups: Vec<(PartGroup, Vec<String>)>,
    skipped: Vec<SkippedElement>,
}

impl ScoreBuilder {
    fn new() -> Self {
        ScoreBuilder {
            score: Score::new(),
            part_infos: BTreeMap::new(),
            groups: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn finish(self) -> ParsedScore {
        ParsedScore {
            score: self.score,
            skipped: self.skipped,
        }
    }

    fn read_header(&mut self, root: Node) {
        self.score.work_title = get_child(root, "movement-title").and_then(get_text).or_else(|| {
            get_child(root, "work").and_then(|w| get_child_text(w, "work-title"))
        });
        self.score.work_number =
            get_child(root, "work").and_then(|w| get_child_text(w, "work-number"));
        if let Some(identification) = get_child(root, "identification") {
            let composer = children_named(identification, "creator")
                .find(|c| c.attribute("type") == Some("composer"))
                .and_then(get_text)
                .or_else(|| children_named(identification, "creator").find_map(get_text));
            self.score.composer = composer;
        }
    }

    /// Read `<part-list>`: part names and group boundaries. Parts outside
    /// any explicit group land in a default symbol-less group.
    fn read_part_list(&mut self, root: Node) {
        let Some(part_list) = get_child(root, "part-list") else {
            return;
        };
        let mut active: Option<usize> = None;
        let mut default_group: Option<usize> = None;
        let mut group_number = 0u32;

        for child in part_list.children().filter(|n| n.is_element()) {
            match child.tag_name().name() {
                "part-group" => match child.attribute("type") {
                    Some("start") => {
                        group_number += 1;
                        let symbol = get_child_text(child, "group-symbol")
                            .map(|s| match s.as_str() {
                                "brace" => PartGroupSymbolKind::Brace,
                                "line" => PartGroupSymbolKind::Line,
                                "square" => PartGroupSymbolKind::Square,
                                "none" => PartGroupSymbolKind::NoSymbol,
                                _ => PartGroupSymbolKind::Bracket,
                            })
                            .unwrap_or(PartGroupSymbolKind::Bracket);
                        let mut group = PartGroup::new(group_number);
                        group.symbol = symbol;
                        group.name = get_child_text(child, "group-name");
                        group.barline_spans_group = get_child_text(child, "group-barline")
                            .map(|t| t != "no")
                            .unwrap_or(true);
                        self.groups.push((group, Vec::new()));
                        active = Some(self.groups.len() - 1);
                    }
                    Some("stop") => active = None,
                    _ => {}
                },
                "score-part" => {
                    let Some(id) = child.attribute("id") else { continue };
                    let info = PartInfo {
                        name: get_child_text(child, "part-name").unwrap_or_else(|| id.to_string()),
                        abbreviation: get_child_text(child, "part-abbreviation"),
                    };
                    self.part_infos.insert(id.to_string(), info);
                    let slot = match active {
                        Some(index) => index,
                        None => *default_group.get_or_insert_with(|| {
                            group_number += 1;
                            self.groups.push((PartGroup::new(group_number), Vec::new()));
                            self.groups.len() - 1
                        }),
                    };
                    self.groups[slot].1.push(id.to_string());
                }
                _ => {}
            }
        }
    }

    fn read_part(&mut self, part_node: Node) -> Result<()> {
        let id = part_node.attribute("id").unwrap_or("unknown").to_string();
        let info = self.part_infos.get(&id).cloned().unwrap_or_default();
        debug!(target: "musicxml", "building part {} ({})", id, info.name);

        let mut builder = PartBuilder::new(&id, &info);
        for measure_node in children_named(part_node, "measure") {
            builder.read_measure(measure_node)?;
        }
        let (part, mut skipped) = builder.finish();
        self.skipped.append(&mut skipped);
        self.place_part(part);
        Ok(())
    }

    /// Attach a finished part to its group from the part-list, creating a
    /// fallback group for parts the list never mentioned.
    fn place_part(&mut self, part: Part) {
        for (group, members) in &self.groups {
            if members.contains(&part.id) {
                let number = group.number;
                if let Some(existing) =
                    self.score.part_groups.iter_mut().find(|g| g.number == number)
                {
                    existing.append_part(part);
                    return;
                }
                let mut fresh = group.clone();
                fresh.append_part(part);
                self.score.append_part_group(fresh);
                return;
            }
        }
        let mut fallback = PartGroup::new(self.score.part_groups.len() as u32 + 100);
        fallback.append_part(part);
        self.score.append_part_group(fallback);
    }
}

/// Pending sounding element of a voice, waiting for the next element to
/// reveal chord membership and tuplet stops.
enum PendingItem {
    Note(Note),
    Chord(Chord),
}

#[derive(Default)]
struct PendingState {
    item: Option<PendingItem>,
    tuplet_stops: u32,
}

/// In-progress measure for one voice
struct MeasureBuilder {
    measure: Measure,
    actual: WholeNotes,
    pending: PendingState,
    tuplet_stack: Vec<Tuplet>,
    grace: Option<GraceGroup>,
    tremolo_start: Option<(Note, u32, i64)>,
}

impl MeasureBuilder {
    fn new(input_line: u32, number: &str, uplink: Uplink) -> Self {
        MeasureBuilder {
            measure: Measure::new(input_line, number, uplink),
            actual: WholeNotes::new(0, 1),
            pending: PendingState::default(),
            tuplet_stack: Vec::new(),
            grace: None,
            tremolo_start: None,
        }
    }

    fn push_completed(&mut self, element: MeasureElement) {
        if let Some(tuplet) = self.tuplet_stack.last_mut() {
            let member = match element {
                MeasureElement::Note(note) => Some(TupletMember::Note(note)),
                MeasureElement::Chord(chord) => Some(TupletMember::Chord(chord)),
                MeasureElement::Tuplet(nested) => Some(TupletMember::Tuplet(Box::new(nested))),
                other => {
                    // Attributes and directions bypass tuplet grouping.
                    self.measure.elements.push(other);
                    None
                }
            };
            if let Some(member) = member {
                tuplet.members.push(member);
            }
        } else {
            self.measure.elements.push(element);
        }
    }

    fn close_tuplet(&mut self) {
        if let Some(closed) = self.tuplet_stack.pop() {
            self.push_completed(MeasureElement::Tuplet(closed));
        }
    }

    fn flush_pending(&mut self) {
        let stops = self.pending.tuplet_stops;
        self.pending.tuplet_stops = 0;
        if let Some(item) = self.pending.item.take() {
            match item {
                PendingItem::Note(note) => self.push_completed(MeasureElement::Note(note)),
                PendingItem::Chord(chord) => self.push_completed(MeasureElement::Chord(chord)),
            }
        }
        for _ in 0..stops {
            self.close_tuplet();
        }
    }

    fn flush_grace(&mut self) {
        if let Some(group) = self.grace.take() {
            self.push_completed(MeasureElement::GraceGroup(group));
        }
    }
}

/// Open repeat structure for one voice. The backward repeat barline sits
/// inside the first ending, so a repeat with endings stays open
/// (`closing`) until a measure arrives that starts no further ending.
struct RepeatBuilder {
    input_line: u32,
    common: Vec<Measure>,
    endings: Vec<RepeatEnding>,
    current_ending: Option<RepeatEnding>,
    closing: bool,
}

impl RepeatBuilder {
    fn new(input_line: u32) -> Self {
        RepeatBuilder {
            input_line,
            common: Vec::new(),
            endings: Vec::new(),
            current_ending: None,
            closing: false,
        }
    }
}

struct VoiceBuilder {
    number: u32,
    kind: VoiceKind,
    elements: Vec<VoiceElement>,
    repeat: Option<RepeatBuilder>,
    seen_first_measure: bool,
}

impl VoiceBuilder {
    fn new(number: u32, kind: VoiceKind) -> Self {
        VoiceBuilder {
            number,
            kind,
            elements: Vec::new(),
            repeat: None,
            seen_first_measure: false,
        }
    }

    fn append_measure(&mut self, measure: Measure) {
        match &mut self.repeat {
            Some(repeat) => match &mut repeat.current_ending {
                Some(ending) => ending.measures.push(measure),
                None => repeat.common.push(measure),
            },
            None => self.elements.push(VoiceElement::Measure(measure)),
        }
        self.seen_first_measure = true;
    }

    fn close_repeat(&mut self) {
        if let Some(mut repeat) = self.repeat.take() {
            if let Some(ending) = repeat.current_ending.take() {
                repeat.endings.push(ending);
            }
            self.elements.push(VoiceElement::Repeat(Repeat {
                input_line: repeat.input_line,
                common: repeat.common,
                endings: repeat.endings,
            }));
        }
    }

    fn into_voice(mut self) -> Voice {
        // An unclosed repeat at the end of the part still plays.
        self.close_repeat();
        let mut voice = Voice::new(self.number, self.kind);
        voice.elements = self.elements;
        voice
    }
}

struct PartBuilder {
    part_id: String,
    info: PartInfo,
    divisions: i64,
    nominal_length: WholeNotes,
    voices: BTreeMap<(u32, u32), VoiceBuilder>,
    harmony_voice: Option<VoiceBuilder>,
    harmony_measure: Option<Measure>,
    measures: BTreeMap<(u32, u32), MeasureBuilder>,
    skipped: Vec<SkippedElement>,
    current_measure_number: String,
    // Attribute broadcasts only reach measure builders that exist at the
    // time; these caches replay them into voices first seen later.
    current_key: Option<Key>,
    current_time: Option<Time>,
    current_clefs: BTreeMap<u32, Clef>,
}

impl PartBuilder {
    fn new(part_id: &str, info: &PartInfo) -> Self {
        PartBuilder {
            part_id: part_id.to_string(),
            info: info.clone(),
            divisions: 1,
            nominal_length: WholeNotes::new(1, 1),
            voices: BTreeMap::new(),
            harmony_voice: None,
            harmony_measure: None,
            measures: BTreeMap::new(),
            skipped: Vec::new(),
            current_measure_number: String::new(),
            current_key: None,
            current_time: None,
            current_clefs: BTreeMap::new(),
        }
    }

    fn record_skipped(&mut self, element_type: &str, reason: &str) {
        self.skipped.push(SkippedElement {
            element_type: element_type.to_string(),
            measure_number: Some(self.current_measure_number.clone()),
            part_id: Some(self.part_id.clone()),
            reason: reason.to_string(),
        });
    }

    fn uplink(&self, staff: u32, voice: u32) -> Uplink {
        Uplink {
            part_id: self.part_id.clone(),
            staff_number: staff,
            voice_number: voice,
        }
    }

    fn measure_for(&mut self, input_line: u32, staff: u32, voice: u32) -> &mut MeasureBuilder {
        // A voice first seen mid-measure missed the attribute broadcast;
        // replay the running key/time/clef into its fresh builder.
        let mut replay: Vec<MeasureElement> = Vec::new();
        if !self.measures.contains_key(&(staff, voice))
            && !self.voices.contains_key(&(staff, voice))
        {
            if let Some(key) = self.current_key {
                replay.push(MeasureElement::Key(key));
            }
            if let Some(time) = &self.current_time {
                replay.push(MeasureElement::Time(time.clone()));
            }
            if let Some(clef) = self.current_clefs.get(&staff) {
                replay.push(MeasureElement::Clef(*clef));
            }
        }
        let number = self.current_measure_number.clone();
        let uplink = self.uplink(staff, voice);
        let builder = self
            .measures
            .entry((staff, voice))
            .or_insert_with(|| MeasureBuilder::new(input_line, &number, uplink));
        for element in replay {
            builder.push_completed(element);
        }
        builder
    }

    fn read_measure(&mut self, measure_node: Node) -> Result<()> {
        let input_line = line_of(measure_node);
        self.current_measure_number = measure_node
            .attribute("number")
            .unwrap_or_default()
            .to_string();

        // Open a measure for every voice already known, so attribute
        // changes reach voices that rest this measure.
        let known: Vec<(u32, u32)> = self.voices.keys().cloned().collect();
        for (staff, voice) in known {
            self.measure_for(input_line, staff, voice);
        }
        if self.measures.is_empty() {
            self.measure_for(input_line, 1, 1);
        }
        if self.harmony_voice.is_some() {
            self.harmony_measure = Some(Measure::new(
                input_line,
                &self.current_measure_number,
                self.uplink(1, 0),
            ));
        }

        // Repeat markers apply to measure boundaries; scan them first.
        let mut starts_repeat = false;
        let mut ends_repeat = false;
        let mut starts_ending: Option<u32> = None;
        let mut ends_ending = false;
        for barline_node in children_named(measure_node, "barline") {
            if let Some(repeat_node) = get_child(barline_node, "repeat") {
                match repeat_node.attribute("direction") {
                    Some("forward") => starts_repeat = true,
                    Some("backward") => ends_repeat = true,
                    _ => {}
                }
            }
            if let Some(ending_node) = get_child(barline_node, "ending") {
                match ending_node.attribute("type") {
                    Some("start") => {
                        starts_ending = ending_node
                            .attribute("number")
                            .and_then(|n| n.split(',').next())
                            .and_then(|n| n.trim().parse().ok())
                            .or(Some(1));
                    }
                    Some("stop") | Some("discontinue") => ends_ending = true,
                    _ => {}
                }
            }
        }
        // A repeat whose backward barline sat in an earlier ending closes
        // once a measure opens no further ending.
        if starts_ending.is_none() {
            for voice in self.voices.values_mut() {
                if voice.repeat.as_ref().map_or(false, |r| r.closing) {
                    voice.close_repeat();
                }
            }
        }
        if starts_repeat {
            let line = input_line;
            for voice in self.all_voice_builders() {
                voice.repeat.get_or_insert_with(|| RepeatBuilder::new(line));
            }
        }
        if let Some(number) = starts_ending {
            let line = input_line;
            for voice in self.all_voice_builders() {
                let repeat = voice.repeat.get_or_insert_with(|| RepeatBuilder::new(line));
                repeat.current_ending = Some(RepeatEnding {
                    input_line: line,
                    number,
                    measures: Vec::new(),
                });
            }
        }

        for child in measure_node.children().filter(|n| n.is_element()) {
            match child.tag_name().name() {
                "attributes" => self.read_attributes(child)?,
                "note" => self.read_note(child)?,
                "direction" => self.read_direction(child),
                "harmony" => self.read_harmony(child),
                "barline" => {
                    let (location, style) = parse_barline_style(child);
                    if let Some(style) = style {
                        let barline = Barline {
                            input_line: line_of(child),
                            location,
                            style,
                        };
                        for builder in self.measures.values_mut() {
                            builder.push_completed(MeasureElement::Barline(barline));
                        }
                    }
                }
                "forward" => self.read_forward(child)?,
                "backup" => {} // voices are tracked independently
                "figured-bass" => {
                    self.record_skipped("figured-bass", "figured bass is not translated");
                }
                "print" | "sound" => {}
                other => {
                    debug!(target: "musicxml", "ignoring measure child <{}>", other);
                }
            }
        }

        self.close_measures();

        if ends_ending {
            for voice in self.voices.values_mut() {
                if let Some(repeat) = &mut voice.repeat {
                    if let Some(ending) = repeat.current_ending.take() {
                        repeat.endings.push(ending);
                    }
                }
            }
        }
        if ends_repeat {
            for voice in self.voices.values_mut() {
                let plain = voice
                    .repeat
                    .as_ref()
                    .map_or(false, |r| r.endings.is_empty() && r.current_ending.is_none());
                if plain {
                    voice.close_repeat();
                } else if let Some(repeat) = &mut voice.repeat {
                    repeat.closing = true;
                }
            }
        }
        Ok(())
    }

    fn all_voice_builders(&mut self) -> impl Iterator<Item = &mut VoiceBuilder> {
        // Voices present in the current measure map may not exist yet.
        let keys: Vec<(u32, u32)> = self.measures.keys().cloned().collect();
        for (staff, voice) in keys {
            self.voices
                .entry((staff, voice))
                .or_insert_with(|| VoiceBuilder::new(voice, VoiceKind::Regular));
        }
        self.voices.values_mut()
    }

    fn close_measures(&mut self) {
        let nominal = self.nominal_length;
        let finished: Vec<((u32, u32), MeasureBuilder)> =
            std::mem::take(&mut self.measures).into_iter().collect();
        for ((staff, voice_number), mut builder) in finished {
            builder.flush_pending();
            builder.flush_grace();
            if let Some((orphan, _, _)) = builder.tremolo_start.take() {
                self.record_skipped(
                    "tremolo",
                    "tremolo start without a matching stop in the same measure",
                );
                builder.push_completed(MeasureElement::Note(orphan));
            }
            while !builder.tuplet_stack.is_empty() {
                builder.close_tuplet();
            }

            let mut measure = builder.measure;
            measure.nominal_length = nominal;
            measure.actual_length = builder.actual;
            let voice = self
                .voices
                .entry((staff, voice_number))
                .or_insert_with(|| VoiceBuilder::new(voice_number, VoiceKind::Regular));
            measure.kind = classify_measure_kind(
                builder.actual,
                nominal,
                !voice.seen_first_measure,
                measure.has_sounding_content(),
            );
            voice.append_measure(measure);
        }
        if let Some(harmony_measure) = self.harmony_measure.take() {
            if let Some(voice) = &mut self.harmony_voice {
                let mut measure = harmony_measure;
                measure.nominal_length = nominal;
                measure.actual_length = nominal;
                voice.append_measure(measure);
            }
        }
    }

    fn read_attributes(&mut self, attributes_node: Node) -> Result<()> {
        if let Some(text) = get_child_text(attributes_node, "divisions") {
            self.divisions = text.parse().map_err(|_| ParseError::InvalidValue {
                element: "divisions".to_string(),
                value: text,
            })?;
        }
        if let Some(key_node) = get_child(attributes_node, "key") {
            let key = parse_key(key_node)?;
            self.current_key = Some(key);
            for builder in self.measures.values_mut() {
                builder.push_completed(MeasureElement::Key(key));
            }
        }
        if let Some(time_node) = get_child(attributes_node, "time") {
            let time = parse_time(time_node)?;
            self.nominal_length = time.whole_notes_per_measure()?;
            self.current_time = Some(time.clone());
            for builder in self.measures.values_mut() {
                builder.push_completed(MeasureElement::Time(time.clone()));
            }
        }
        for clef_node in children_named(attributes_node, "clef") {
            let clef = parse_clef(clef_node)?;
            let staff: u32 = clef_node
                .attribute("number")
                .and_then(|n| n.parse().ok())
                .unwrap_or(1);
            self.current_clefs.insert(staff, clef);
            for ((clef_staff, _), builder) in self.measures.iter_mut() {
                if *clef_staff == staff {
                    builder.push_completed(MeasureElement::Clef(clef));
                }
            }
        }
        Ok(())
    }

    fn read_forward(&mut self, forward_node: Node) -> Result<()> {
        let timing = parse_note_timing(forward_node, self.divisions)?;
        let staff = child_number(forward_node, "staff");
        let voice = child_number(forward_node, "voice");
        let input_line = line_of(forward_node);
        let duration = NoteDuration::from_whole_notes(timing.whole_notes)
            .unwrap_or(NoteDuration::new(DurationKind::Quarter, 0));
        let builder = self.measure_for(input_line, staff, voice);
        builder.flush_pending();
        builder.push_completed(MeasureElement::Note(Note::skip(input_line, duration)));
        builder.actual += timing.whole_notes;
        Ok(())
    }

    fn read_note(&mut self, note_node: Node) -> Result<()> {
        let input_line = line_of(note_node);
        let staff = child_number(note_node, "staff");
        let voice_number = child_number(note_node, "voice");
        let is_grace = get_child(note_node, "grace");
        let is_chord_member = get_child(note_node, "chord").is_some();
        let is_rest = get_child(note_node, "rest").is_some();
        let divisions = self.divisions;

        let timing = if is_grace.is_some() {
            None
        } else {
            Some(parse_note_timing(note_node, divisions)?)
        };
        let duration = parse_note_duration(note_node, timing)?;

        let pitch = if is_rest {
            None
        } else {
            match get_child(note_node, "pitch") {
                Some(pitch_node) => Some(parse_pitch(pitch_node)?),
                None => None,
            }
        };

        let notations = Notations::read(note_node);
        let tie = read_tie(note_node);
        let attachments = self.read_attachments(note_node, &notations);

        // Grace notes collect into a run attached before the next note.
        if let Some(grace_node) = is_grace {
            let slash = grace_node.attribute("slash") == Some("yes");
            let note = match pitch {
                Some(pitch) => {
                    Note::standalone(input_line, pitch, duration).with_kind(NoteKind::Grace)
                }
                None => Note::rest(input_line, duration).with_kind(NoteKind::Grace),
            };
            let builder = self.measure_for(input_line, staff, voice_number);
            builder
                .grace
                .get_or_insert_with(|| GraceGroup {
                    input_line,
                    slash,
                    notes: Vec::new(),
                })
                .notes
                .push(note);
            return Ok(());
        }

        let mut note = match pitch {
            Some(pitch) => Note::standalone(input_line, pitch, duration),
            None => Note::rest(input_line, duration),
        };
        note.tie = tie;
        note.attachments = attachments;

        if is_chord_member {
            let builder = self.measure_for(input_line, staff, voice_number);
            let member = note.with_kind(NoteKind::ChordMember);
            match builder.pending.item.take() {
                Some(PendingItem::Chord(mut chord)) => {
                    chord.notes.push(member);
                    builder.pending.item = Some(PendingItem::Chord(chord));
                }
                Some(PendingItem::Note(first)) => {
                    let mut chord =
                        Chord::new(first.input_line, Vec::new(), first.duration);
                    chord.tie = first.tie;
                    chord.attachments = first.attachments.clone();
                    chord.notes.push(first.with_kind(NoteKind::ChordMember));
                    chord.notes.push(member);
                    builder.pending.item = Some(PendingItem::Chord(chord));
                }
                None => {
                    warn!(
                        target: "musicxml",
                        "chord member without a preceding note at line {}", input_line
                    );
                    builder.pending.item = Some(PendingItem::Note(
                        member.with_kind(NoteKind::Standalone),
                    ));
                }
            }
            return Ok(());
        }

        let note_divisions = timing.map(|t| t.divisions).unwrap_or(0);
        let note_whole_notes = timing
            .map(|t| t.whole_notes)
            .unwrap_or_else(|| WholeNotes::new(0, 1));
        let tremolo = notations.tremolo;
        let tuplet_starts = notations.tuplet_starts;
        let tuplet_stops = notations.tuplet_stops;

        let builder = self.measure_for(input_line, staff, voice_number);
        builder.flush_pending();

        // Double tremolo halves pair up across the pending machinery.
        if let Some((kind, marks)) = tremolo {
            match kind {
                TremoloKind::Start => {
                    builder.flush_grace();
                    builder.tremolo_start =
                        Some((note.with_kind(NoteKind::DoubleTremoloMember), marks, note_divisions));
                    builder.actual += note_whole_notes;
                    return Ok(());
                }
                TremoloKind::Stop => {
                    if let Some((first, marks, first_divisions)) = builder.tremolo_start.take() {
                        let tremolo = DoubleTremolo {
                            input_line: first.input_line,
                            marks_number: marks,
                            first,
                            second: note.with_kind(NoteKind::DoubleTremoloMember),
                            total_divisions: first_divisions + note_divisions,
                        };
                        builder.push_completed(MeasureElement::DoubleTremolo(tremolo));
                        builder.actual += note_whole_notes;
                        return Ok(());
                    }
                    self.record_skipped("tremolo", "tremolo stop without a start");
                }
                TremoloKind::Single => {
                    self.record_skipped("tremolo:single", "single-note tremolos are not translated");
                }
            }
        }

        let builder = self.measure_for(input_line, staff, voice_number);
        for _ in 0..tuplet_starts {
            let factor = note
                .duration
                .tuplet_factor
                .unwrap_or_else(|| TupletFactor::new(1, 1));
            builder.tuplet_stack.push(Tuplet::new(input_line, factor, Vec::new()));
        }
        builder.flush_grace();

        let in_tuplet = !builder.tuplet_stack.is_empty();
        if in_tuplet && note.kind == NoteKind::Standalone {
            note.kind = NoteKind::TupletMember;
        }
        builder.pending.item = Some(PendingItem::Note(note));
        builder.pending.tuplet_stops = tuplet_stops;
        builder.actual += note_whole_notes;
        Ok(())
    }

    fn read_attachments(&mut self, note_node: Node, notations: &Notations) -> Attachments {
        let mut attachments = Attachments::default();
        attachments.articulations = notations.articulations.clone();
        attachments.ornaments = notations.ornaments.clone();
        attachments.slurs = notations.slurs.clone();
        for unknown in &notations.unknown {
            self.record_skipped(unknown, "unrecognized notation");
        }
        for lyric_node in children_named(note_node, "lyric") {
            let Some(text) = get_child_text(lyric_node, "text") else {
                continue;
            };
            let syllabic = match get_child_text(lyric_node, "syllabic").as_deref() {
                Some("begin") => LyricSyllabic::Begin,
                Some("middle") => LyricSyllabic::Middle,
                Some("end") => LyricSyllabic::End,
                _ => LyricSyllabic::Single,
            };
            attachments.lyrics.push(Lyric { text, syllabic });
        }
        attachments
    }

    fn read_direction(&mut self, direction_node: Node) {
        let staff = child_number(direction_node, "staff");
        let voice = child_number(direction_node, "voice");
        let input_line = line_of(direction_node);
        let placement = match direction_node.attribute("placement") {
            Some("below") => Placement::Below,
            _ => Placement::Above,
        };
        let mut directions: Vec<Direction> = Vec::new();
        for direction_type in children_named(direction_node, "direction-type") {
            for child in direction_type.children().filter(|n| n.is_element()) {
                match child.tag_name().name() {
                    "dynamics" => {
                        for mark in child.children().filter(|n| n.is_element()) {
                            match DynamicKind::parse(mark.tag_name().name()) {
                                Some(kind) => directions.push(Direction::Dynamic(kind)),
                                None => self.record_skipped(
                                    &format!("dynamics:{}", mark.tag_name().name()),
                                    "unrecognized dynamic mark",
                                ),
                            }
                        }
                    }
                    "wedge" => match child.attribute("type") {
                        Some("crescendo") => {
                            directions.push(Direction::Wedge(WedgeKind::CrescendoStart))
                        }
                        Some("diminuendo") => {
                            directions.push(Direction::Wedge(WedgeKind::DecrescendoStart))
                        }
                        Some("stop") => directions.push(Direction::Wedge(WedgeKind::Stop)),
                        _ => {}
                    },
                    "words" => {
                        if let Some(text) = get_text(child) {
                            directions.push(Direction::Words(Words { text, placement }));
                        }
                    }
                    "metronome" => {
                        let beat_unit = get_child_text(child, "beat-unit")
                            .and_then(|t| DurationKind::parse(&t))
                            .unwrap_or(DurationKind::Quarter);
                        if let Some(per_minute) = get_child_text(child, "per-minute")
                            .and_then(|t| t.parse::<u32>().ok())
                        {
                            directions.push(Direction::Tempo(Tempo {
                                input_line,
                                beats_per_minute: per_minute,
                                beat_unit,
                            }));
                        }
                    }
                    other => {
                        debug!(target: "musicxml", "ignoring direction-type <{}>", other);
                    }
                }
            }
        }
        if directions.is_empty() {
            return;
        }
        let builder = self.measure_for(input_line, staff, voice);
        builder.flush_pending();
        for direction in directions {
            builder.push_completed(MeasureElement::Direction(direction));
        }
    }

    fn read_harmony(&mut self, harmony_node: Node) {
        let input_line = line_of(harmony_node);
        let Some(root_node) = get_child(harmony_node, "root") else {
            self.record_skipped("harmony", "harmony without a root");
            return;
        };
        let Some(step) = get_child_text(root_node, "root-step")
            .and_then(|t| DiatonicStep::parse(&t))
        else {
            self.record_skipped("harmony", "harmony root step is missing or invalid");
            return;
        };
        let alteration = get_child_text(root_node, "root-alter")
            .and_then(|t| t.parse::<f32>().ok())
            .and_then(|f| Alteration::from_semitones(f.round() as i32))
            .unwrap_or(Alteration::Natural);
        let kind = get_child_text(harmony_node, "kind")
            .and_then(|t| HarmonyKind::parse(&t))
            .unwrap_or(HarmonyKind::Major);

        let duration = NoteDuration::from_whole_notes(self.nominal_length)
            .unwrap_or(NoteDuration::new(DurationKind::Whole, 0));
        let harmony = Harmony {
            input_line,
            root_step: step,
            root_alteration: alteration,
            kind,
            duration,
        };

        if self.harmony_voice.is_none() {
            self.harmony_voice = Some(VoiceBuilder::new(0, VoiceKind::Harmony));
        }
        if self.harmony_measure.is_none() {
            self.harmony_measure = Some(Measure::new(
                input_line,
                &self.current_measure_number,
                self.uplink(1, 0),
            ));
        }
        if let Some(measure) = &mut self.harmony_measure {
            measure.append_element(MeasureElement::Harmony(harmony));
        }
    }

    fn finish(mut self) -> (Part, Vec<SkippedElement>) {
        let mut part = Part::new(&self.part_id, &self.info.name);
        part.abbreviation = self.info.abbreviation.clone();
        part.divisions_per_quarter = self.divisions;

        let mut staves: BTreeMap<u32, Staff> = BTreeMap::new();
        for ((staff_number, _), voice_builder) in std::mem::take(&mut self.voices) {
            staves
                .entry(staff_number)
                .or_insert_with(|| Staff::new(staff_number))
                .append_voice(voice_builder.into_voice());
        }
        if let Some(harmony) = self.harmony_voice.take() {
            staves
                .entry(1)
                .or_insert_with(|| Staff::new(1))
                .append_voice(harmony.into_voice());
        }
        for (_, staff) in staves {
            part.append_staff(staff);
        }
        (part, self.skipped)
    }
}

fn child_number(node: Node, tag: &str) -> u32 {
    get_child_text(node, tag)
        .and_then(|t| t.parse().ok())
        .unwrap_or(1)
}

enum TremoloKind {
    Start,
    Stop,
    Single,
}

/// Everything gathered from a note's `<notations>` child
#[derive(Default)]
struct Notations {
    articulations: Vec<ArticulationKind>,
    ornaments: Vec<OrnamentKind>,
    slurs: Vec<Slur>,
    tuplet_starts: u32,
    tuplet_stops: u32,
    tremolo: Option<(TremoloKind, u32)>,
    unknown: Vec<String>,
}

impl Notations {
    fn read(note_node: Node) -> Notations {
        let mut notations = Notations::default();
        for notations_node in children_named(note_node, "notations") {
            for child in notations_node.children().filter(|n| n.is_element()) {
                match child.tag_name().name() {
                    "articulations" => {
                        for mark in child.children().filter(|n| n.is_element()) {
                            match ArticulationKind::parse(mark.tag_name().name()) {
                                Some(kind) => notations.articulations.push(kind),
                                None => notations
                                    .unknown
                                    .push(format!("articulation:{}", mark.tag_name().name())),
                            }
                        }
                    }
                    "ornaments" => {
                        for mark in child.children().filter(|n| n.is_element()) {
                            let name = mark.tag_name().name();
                            if name == "tremolo" {
                                let marks = get_text(mark)
                                    .and_then(|t| t.parse().ok())
                                    .unwrap_or(3);
                                let kind = match mark.attribute("type") {
                                    Some("start") => TremoloKind::Start,
                                    Some("stop") => TremoloKind::Stop,
                                    _ => TremoloKind::Single,
                                };
                                notations.tremolo = Some((kind, marks));
                                continue;
                            }
                            match OrnamentKind::parse(name) {
                                Some(kind) => notations.ornaments.push(kind),
                                None => notations.unknown.push(format!("ornament:{}", name)),
                            }
                        }
                    }
                    "slur" => {
                        let kind = match child.attribute("type") {
                            Some("start") => Some(SlurKind::Start),
                            Some("stop") => Some(SlurKind::Stop),
                            _ => None,
                        };
                        if let Some(kind) = kind {
                            let number = child
                                .attribute("number")
                                .and_then(|n| n.parse().ok())
                                .unwrap_or(1);
                            notations.slurs.push(Slur { kind, number });
                        }
                    }
                    "tuplet" => match child.attribute("type") {
                        Some("start") => notations.tuplet_starts += 1,
                        Some("stop") => notations.tuplet_stops += 1,
                        _ => {}
                    },
                    "tied" => {} // handled by the <tie> elements
                    other => {
                        debug!(target: "musicxml", "ignoring notation <{}>", other);
                    }
                }
            }
        }
        notations
    }
}

fn read_tie(note_node: Node) -> Option<TieKind> {
    let mut start = false;
    let mut stop = false;
    for tie_node in children_named(note_node, "tie") {
        match tie_node.attribute("type") {
            Some("start") => start = true,
            Some("stop") => stop = true,
            _ => {}
        }
    }
    match (start, stop) {
        (true, true) => Some(TieKind::Continue),
        (true, false) => Some(TieKind::Start),
        (false, true) => Some(TieKind::Stop),
        (false, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msr::structure::MeasureKind;
    use num_rational::Rational64;

    fn score_with(measures: &str) -> ParsedScore {
        let xml = format!(
            concat!(
                "<score-partwise version=\"3.1\">",
                "<movement-title>Test Piece</movement-title>",
                "<identification><creator type=\"composer\">Someone</creator></identification>",
                "<part-list><score-part id=\"P1\"><part-name>Music</part-name></score-part></part-list>",
                "<part id=\"P1\">{}</part>",
                "</score-partwise>"
            ),
            measures
        );
        build_score(&xml).unwrap()
    }

    const ATTRIBUTES: &str = concat!(
        "<attributes><divisions>1</divisions>",
        "<key><fifths>0</fifths></key>",
        "<time><beats>4</beats><beat-type>4</beat-type></time>",
        "<clef><sign>G</sign><line>2</line></clef></attributes>"
    );

    fn quarter(step: char, octave: u32) -> String {
        format!(
            "<note><pitch><step>{}</step><octave>{}</octave></pitch>\
             <duration>1</duration><voice>1</voice><type>quarter</type></note>",
            step, octave
        )
    }

    fn first_voice(parsed: &ParsedScore) -> &Voice {
        &parsed.score.part_groups[0].parts[0].staves[0].voices[0]
    }

    #[test]
    fn header_and_part_metadata() {
        let parsed = score_with(&format!(
            "<measure number=\"1\">{}{}</measure>",
            ATTRIBUTES,
            quarter('C', 4)
        ));
        assert_eq!(parsed.score.work_title.as_deref(), Some("Test Piece"));
        assert_eq!(parsed.score.composer.as_deref(), Some("Someone"));
        let part = &parsed.score.part_groups[0].parts[0];
        assert_eq!(part.id, "P1");
        assert_eq!(part.name, "Music");
        assert_eq!(part.divisions_per_quarter, 1);
    }

    #[test]
    fn full_measure_is_regular() {
        let notes: String = (0..4).map(|_| quarter('C', 4)).collect();
        let parsed = score_with(&format!(
            "<measure number=\"1\">{}{}</measure>",
            ATTRIBUTES, notes
        ));
        let voice = first_voice(&parsed);
        let measure = voice.measures().next().unwrap();
        assert_eq!(measure.kind, MeasureKind::Regular);
        assert_eq!(measure.actual_length, Rational64::new(1, 1));
        let note_count = measure
            .elements
            .iter()
            .filter(|e| matches!(e, MeasureElement::Note(_)))
            .count();
        assert_eq!(note_count, 4);
    }

    #[test]
    fn anacrusis_is_incomplete_left() {
        let parsed = score_with(&format!(
            "<measure number=\"0\">{}{}</measure><measure number=\"1\">{}</measure>",
            ATTRIBUTES,
            quarter('C', 4),
            (0..4).map(|_| quarter('D', 4)).collect::<String>()
        ));
        let voice = first_voice(&parsed);
        let kinds: Vec<MeasureKind> = voice.measures().map(|m| m.kind).collect();
        assert_eq!(kinds, vec![MeasureKind::IncompleteLeft, MeasureKind::Regular]);
    }

    #[test]
    fn silent_measure_is_empty() {
        let parsed = score_with(&format!(
            "<measure number=\"1\">{}{}</measure><measure number=\"2\"></measure>",
            ATTRIBUTES,
            (0..4).map(|_| quarter('C', 4)).collect::<String>()
        ));
        let voice = first_voice(&parsed);
        let kinds: Vec<MeasureKind> = voice.measures().map(|m| m.kind).collect();
        assert_eq!(kinds, vec![MeasureKind::Regular, MeasureKind::Empty]);
    }

    #[test]
    fn chord_members_collapse_into_one_chord() {
        let chord_xml = concat!(
            "<note><pitch><step>C</step><octave>4</octave></pitch>",
            "<duration>4</duration><voice>1</voice><type>whole</type></note>",
            "<note><chord/><pitch><step>E</step><octave>4</octave></pitch>",
            "<duration>4</duration><voice>1</voice><type>whole</type></note>",
            "<note><chord/><pitch><step>G</step><octave>4</octave></pitch>",
            "<duration>4</duration><voice>1</voice><type>whole</type></note>"
        );
        let parsed = score_with(&format!(
            "<measure number=\"1\">{}{}</measure>",
            ATTRIBUTES, chord_xml
        ));
        let voice = first_voice(&parsed);
        let measure = voice.measures().next().unwrap();
        let chords: Vec<&Chord> = measure
            .elements
            .iter()
            .filter_map(|e| match e {
                MeasureElement::Chord(c) => Some(c),
                _ => None,
            })
            .collect();
        assert_eq!(chords.len(), 1);
        assert_eq!(chords[0].notes.len(), 3);
        // Chord counts once toward the measure length.
        assert_eq!(measure.actual_length, Rational64::new(1, 1));
        assert_eq!(measure.kind, MeasureKind::Regular);
    }

    #[test]
    fn triplet_groups_into_a_tuplet() {
        let triplet: String = "CDE"
            .chars()
            .enumerate()
            .map(|(i, step)| {
                let start = if i == 0 {
                    "<notations><tuplet type=\"start\"/></notations>"
                } else if i == 2 {
                    "<notations><tuplet type=\"stop\"/></notations>"
                } else {
                    ""
                };
                format!(
                    "<note><pitch><step>{}</step><octave>4</octave></pitch>\
                     <duration>2</duration><voice>1</voice><type>eighth</type>\
                     <time-modification><actual-notes>3</actual-notes>\
                     <normal-notes>2</normal-notes></time-modification>{}</note>",
                    step, start
                )
            })
            .collect();
        let parsed = score_with(&format!(
            "<measure number=\"1\"><attributes><divisions>6</divisions>\
             <time><beats>1</beats><beat-type>4</beat-type></time></attributes>{}</measure>",
            triplet
        ));
        let voice = first_voice(&parsed);
        let measure = voice.measures().next().unwrap();
        let tuplets: Vec<&Tuplet> = measure
            .elements
            .iter()
            .filter_map(|e| match e {
                MeasureElement::Tuplet(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(tuplets.len(), 1);
        assert_eq!(tuplets[0].members.len(), 3);
        assert_eq!(tuplets[0].factor, TupletFactor::new(3, 2));
        assert_eq!(measure.kind, MeasureKind::Regular);
    }

    #[test]
    fn repeat_with_two_endings() {
        let measures = format!(
            concat!(
                "<measure number=\"1\">{attrs}",
                "<barline location=\"left\"><repeat direction=\"forward\"/></barline>",
                "{m1}</measure>",
                "<measure number=\"2\">",
                "<barline location=\"left\"><ending number=\"1\" type=\"start\"/></barline>",
                "{m2}",
                "<barline location=\"right\"><ending number=\"1\" type=\"stop\"/>",
                "<repeat direction=\"backward\"/></barline></measure>",
                "<measure number=\"3\">",
                "<barline location=\"left\"><ending number=\"2\" type=\"start\"/></barline>",
                "{m3}",
                "<barline location=\"right\"><ending number=\"2\" type=\"stop\"/></barline>",
                "</measure>"
            ),
            attrs = ATTRIBUTES,
            m1 = (0..4).map(|_| quarter('C', 4)).collect::<String>(),
            m2 = (0..4).map(|_| quarter('D', 4)).collect::<String>(),
            m3 = (0..4).map(|_| quarter('E', 4)).collect::<String>(),
        );
        let parsed = score_with(&measures);
        let voice = first_voice(&parsed);
        let repeats: Vec<&Repeat> = voice
            .elements
            .iter()
            .filter_map(|e| match e {
                VoiceElement::Repeat(r) => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(repeats.len(), 1);
        assert_eq!(repeats[0].common.len(), 1);
        assert_eq!(repeats[0].endings.len(), 2);
        assert_eq!(repeats[0].endings[0].number, 1);
        assert_eq!(repeats[0].endings[1].number, 2);
        // The backward barline sits inside ending 1, yet ending 2 still
        // belongs to the same repeat.
        assert_eq!(voice.measures().count(), 3);
    }

    #[test]
    fn grace_notes_attach_before_their_principal() {
        let grace_xml = concat!(
            "<note><grace slash=\"yes\"/><pitch><step>D</step><octave>5</octave></pitch>",
            "<voice>1</voice><type>eighth</type></note>",
            "<note><pitch><step>C</step><octave>5</octave></pitch>",
            "<duration>4</duration><voice>1</voice><type>whole</type></note>"
        );
        let parsed = score_with(&format!(
            "<measure number=\"1\">{}{}</measure>",
            ATTRIBUTES, grace_xml
        ));
        let voice = first_voice(&parsed);
        let measure = voice.measures().next().unwrap();
        let positions: Vec<&str> = measure
            .elements
            .iter()
            .filter_map(|e| match e {
                MeasureElement::GraceGroup(g) => {
                    assert!(g.slash);
                    assert_eq!(g.notes.len(), 1);
                    Some("grace")
                }
                MeasureElement::Note(_) => Some("note"),
                _ => None,
            })
            .collect();
        assert_eq!(positions, vec!["grace", "note"]);
    }

    #[test]
    fn double_tremolo_pairs_both_halves() {
        let tremolo_xml = concat!(
            "<note><pitch><step>C</step><octave>4</octave></pitch>",
            "<duration>2</duration><voice>1</voice><type>half</type>",
            "<notations><ornaments><tremolo type=\"start\">3</tremolo></ornaments></notations></note>",
            "<note><pitch><step>E</step><octave>4</octave></pitch>",
            "<duration>2</duration><voice>1</voice><type>half</type>",
            "<notations><ornaments><tremolo type=\"stop\">3</tremolo></ornaments></notations></note>"
        );
        let parsed = score_with(&format!(
            "<measure number=\"1\">{}{}</measure>",
            ATTRIBUTES, tremolo_xml
        ));
        let voice = first_voice(&parsed);
        let measure = voice.measures().next().unwrap();
        let tremolos: Vec<&DoubleTremolo> = measure
            .elements
            .iter()
            .filter_map(|e| match e {
                MeasureElement::DoubleTremolo(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(tremolos.len(), 1);
        assert_eq!(tremolos[0].marks_number, 3);
        assert_eq!(tremolos[0].total_divisions, 4);
        assert_eq!(measure.actual_length, Rational64::new(1, 1));
    }

    #[test]
    fn harmony_lands_in_a_dedicated_voice() {
        let parsed = score_with(&format!(
            "<measure number=\"1\">{}<harmony><root><root-step>C</root-step></root>\
             <kind>minor-seventh</kind></harmony>{}</measure>",
            ATTRIBUTES,
            (0..4).map(|_| quarter('C', 4)).collect::<String>()
        ));
        let staff = &parsed.score.part_groups[0].parts[0].staves[0];
        assert_eq!(staff.voices.len(), 2);
        let harmony_voice = staff
            .voices
            .iter()
            .find(|v| v.kind == VoiceKind::Harmony)
            .unwrap();
        let measure = harmony_voice.measures().next().unwrap();
        let harmony = measure
            .elements
            .iter()
            .find_map(|e| match e {
                MeasureElement::Harmony(h) => Some(h),
                _ => None,
            })
            .unwrap();
        assert_eq!(harmony.kind, HarmonyKind::MinorSeventh);
        assert_eq!(harmony.root_step, DiatonicStep::C);
    }

    #[test]
    fn figured_bass_is_reported_as_skipped() {
        let parsed = score_with(&format!(
            "<measure number=\"1\">{}<figured-bass><figure>\
             <figure-number>6</figure-number></figure></figured-bass>{}</measure>",
            ATTRIBUTES,
            (0..4).map(|_| quarter('C', 4)).collect::<String>()
        ));
        assert!(parsed
            .skipped
            .iter()
            .any(|s| s.element_type == "figured-bass"));
    }

    #[test]
    fn two_voices_account_length_independently() {
        let two_voice = format!(
            "{}{}<backup><duration>4</duration></backup>{}",
            ATTRIBUTES,
            (0..4)
                .map(|_| quarter('C', 5).replace("<voice>1</voice>", "<voice>1</voice>"))
                .collect::<String>(),
            (0..2)
                .map(|_| {
                    "<note><pitch><step>C</step><octave>3</octave></pitch>\
                     <duration>2</duration><voice>2</voice><type>half</type></note>"
                        .to_string()
                })
                .collect::<String>()
        );
        let parsed = score_with(&format!("<measure number=\"1\">{}</measure>", two_voice));
        let staff = &parsed.score.part_groups[0].parts[0].staves[0];
        assert_eq!(staff.voices.len(), 2);
        for voice in &staff.voices {
            let measure = voice.measures().next().unwrap();
            assert_eq!(measure.kind, MeasureKind::Regular);
            assert_eq!(measure.actual_length, Rational64::new(1, 1));
        }
    }

    #[test]
    fn late_voice_receives_the_running_attributes() {
        // Voice 2 only appears after the backup, so it missed the
        // attribute broadcast at the top of the measure.
        let two_voice = format!(
            "{}{}<backup><duration>4</duration></backup>{}",
            ATTRIBUTES,
            (0..4).map(|_| quarter('C', 5)).collect::<String>(),
            (0..4)
                .map(|_| {
                    "<note><pitch><step>G</step><octave>3</octave></pitch>\
                     <duration>1</duration><voice>2</voice><type>quarter</type></note>"
                        .to_string()
                })
                .collect::<String>()
        );
        let parsed = score_with(&format!("<measure number=\"1\">{}</measure>", two_voice));
        let staff = &parsed.score.part_groups[0].parts[0].staves[0];
        assert_eq!(staff.voices.len(), 2);
        let measure = staff.voices[1].measures().next().unwrap();
        let has = |want: fn(&MeasureElement) -> bool| measure.elements.iter().any(want);
        assert!(
            has(|e| matches!(e, MeasureElement::Key(_))),
            "second voice should carry the key"
        );
        assert!(
            has(|e| matches!(e, MeasureElement::Time(_))),
            "second voice should carry the time signature"
        );
        assert!(
            has(|e| matches!(e, MeasureElement::Clef(_))),
            "second voice should carry the clef"
        );
    }

    #[test]
    fn part_groups_follow_the_part_list() {
        let xml = concat!(
            "<score-partwise version=\"3.1\"><part-list>",
            "<part-group type=\"start\" number=\"1\"><group-symbol>brace</group-symbol></part-group>",
            "<score-part id=\"P1\"><part-name>RH</part-name></score-part>",
            "<score-part id=\"P2\"><part-name>LH</part-name></score-part>",
            "<part-group type=\"stop\" number=\"1\"/>",
            "<score-part id=\"P3\"><part-name>Solo</part-name></score-part>",
            "</part-list>",
            "<part id=\"P1\"><measure number=\"1\"/></part>",
            "<part id=\"P2\"><measure number=\"1\"/></part>",
            "<part id=\"P3\"><measure number=\"1\"/></part>",
            "</score-partwise>"
        );
        let parsed = build_score(xml).unwrap();
        assert_eq!(parsed.score.part_groups.len(), 2);
        let braced = &parsed.score.part_groups[0];
        assert_eq!(braced.symbol, PartGroupSymbolKind::Brace);
        assert_eq!(braced.parts.len(), 2);
        assert_eq!(parsed.score.part_groups[1].parts.len(), 1);
    }
}
