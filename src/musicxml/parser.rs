//! XML parsing layer for MusicXML documents
//!
//! Thin wrappers around roxmltree. This layer finds structure and parses
//! leaf elements (pitches, durations, attributes); assembling the MSR
//! tree is the builder's job.

use roxmltree::{Document, Node};

use crate::errors::ParseError;
use crate::msr::durations::{DurationKind, NoteDuration, TupletFactor, WholeNotes};
use crate::msr::elements::{
    BarlineLocation, BarlineStyle, Clef, ClefKind, Key, KeyMode, Time, TimeItem, TimeSymbolKind,
};
use crate::msr::pitch::{Alteration, DiatonicStep, Pitch};
use num_rational::Rational64;

/// Strip the DOCTYPE declaration; roxmltree rejects DTDs.
pub fn strip_doctype(xml: &str) -> String {
    if xml.contains("<!DOCTYPE") {
        xml.lines()
            .filter(|line| !line.trim_start().starts_with("<!DOCTYPE"))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        xml.to_string()
    }
}

/// Parse the document and check the root is score-partwise.
pub fn parse_document(xml: &str) -> Result<Document<'_>, ParseError> {
    let doc = Document::parse(xml).map_err(|e| ParseError::InvalidXml(e.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != "score-partwise" {
        return Err(ParseError::UnsupportedFormat(format!(
            "expected score-partwise, found {}",
            root.tag_name().name()
        )));
    }
    Ok(doc)
}

/// Source line of an element, for diagnostics
pub fn line_of(node: Node) -> u32 {
    node.document().text_pos_at(node.range().start).row
}

/// Get first child element with given tag name
pub fn get_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == tag)
}

/// Get text content of a node
pub fn get_text(node: Node) -> Option<String> {
    node.text().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Get text content of first child with given tag
pub fn get_child_text(node: Node, tag: &str) -> Option<String> {
    get_child(node, tag).and_then(get_text)
}

/// All element children with a given tag, in document order
pub fn children_named<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == tag)
}

/// Parse a `<pitch>` element.
pub fn parse_pitch(pitch_node: Node) -> Result<Pitch, ParseError> {
    let step_text = get_child_text(pitch_node, "step")
        .ok_or_else(|| ParseError::MissingRequiredElement("pitch/step".to_string()))?;
    let step = DiatonicStep::parse(&step_text).ok_or_else(|| ParseError::InvalidValue {
        element: "step".to_string(),
        value: step_text.clone(),
    })?;

    let octave_text = get_child_text(pitch_node, "octave")
        .ok_or_else(|| ParseError::MissingRequiredElement("pitch/octave".to_string()))?;
    let octave: i32 = octave_text.parse().map_err(|_| ParseError::InvalidValue {
        element: "octave".to_string(),
        value: octave_text.clone(),
    })?;

    let alteration = match get_child_text(pitch_node, "alter") {
        None => Alteration::Natural,
        Some(text) => {
            let semitones: i32 = text
                .parse::<f32>()
                .map(|f| f.round() as i32)
                .map_err(|_| ParseError::InvalidValue {
                    element: "alter".to_string(),
                    value: text.clone(),
                })?;
            Alteration::from_semitones(semitones).ok_or(ParseError::InvalidValue {
                element: "alter".to_string(),
                value: text,
            })?
        }
    };

    Ok(Pitch::new(step, alteration, octave))
}

/// Raw timing fields of a `<note>`
#[derive(Debug, Clone, Copy)]
pub struct NoteTiming {
    /// Divisions the note occupies; grace notes have none
    pub divisions: i64,
    pub whole_notes: WholeNotes,
}

/// Parse a note's `<duration>` against the current divisions-per-quarter.
pub fn parse_note_timing(
    note_node: Node,
    divisions_per_quarter: i64,
) -> Result<NoteTiming, ParseError> {
    let text = get_child_text(note_node, "duration")
        .ok_or_else(|| ParseError::MissingRequiredElement("note/duration".to_string()))?;
    let divisions: i64 = text.parse().map_err(|_| ParseError::InvalidValue {
        element: "duration".to_string(),
        value: text.clone(),
    })?;
    Ok(NoteTiming {
        divisions,
        whole_notes: Rational64::new(divisions, divisions_per_quarter * 4),
    })
}

/// Parse a note's notated duration: `<type>` plus `<dot>` count plus the
/// `<time-modification>` tuplet factor. Falls back to deriving the value
/// from the timing when `<type>` is absent.
pub fn parse_note_duration(
    note_node: Node,
    timing: Option<NoteTiming>,
) -> Result<NoteDuration, ParseError> {
    let dots = children_named(note_node, "dot").count() as u32;
    let factor = parse_time_modification(note_node)?;

    let kind = match get_child_text(note_node, "type") {
        Some(text) => DurationKind::parse(&text).ok_or(ParseError::InvalidValue {
            element: "type".to_string(),
            value: text,
        })?,
        None => {
            let timing = timing.ok_or_else(|| {
                ParseError::MissingRequiredElement("note/type or note/duration".to_string())
            })?;
            match NoteDuration::from_whole_notes(timing.whole_notes) {
                Some(derived) => return Ok(derived),
                None => DurationKind::Quarter,
            }
        }
    };

    Ok(match factor {
        Some(factor) => NoteDuration::with_tuplet_factor(kind, dots, factor),
        None => NoteDuration::new(kind, dots),
    })
}

/// Parse `<time-modification>` into a tuplet factor, when present.
pub fn parse_time_modification(note_node: Node) -> Result<Option<TupletFactor>, ParseError> {
    let Some(modification) = get_child(note_node, "time-modification") else {
        return Ok(None);
    };
    let actual = get_child_text(modification, "actual-notes")
        .ok_or_else(|| ParseError::MissingRequiredElement("time-modification/actual-notes".to_string()))?;
    let normal = get_child_text(modification, "normal-notes")
        .ok_or_else(|| ParseError::MissingRequiredElement("time-modification/normal-notes".to_string()))?;
    let actual: i64 = actual.parse().map_err(|_| ParseError::InvalidValue {
        element: "actual-notes".to_string(),
        value: actual.clone(),
    })?;
    let normal: i64 = normal.parse().map_err(|_| ParseError::InvalidValue {
        element: "normal-notes".to_string(),
        value: normal.clone(),
    })?;
    if actual <= 0 || normal <= 0 {
        return Err(ParseError::InvalidValue {
            element: "time-modification".to_string(),
            value: format!("{}/{}", actual, normal),
        });
    }
    Ok(Some(TupletFactor::new(actual, normal)))
}

/// Parse a `<clef>` element.
pub fn parse_clef(clef_node: Node) -> Result<Clef, ParseError> {
    let sign = get_child_text(clef_node, "sign")
        .ok_or_else(|| ParseError::MissingRequiredElement("clef/sign".to_string()))?;
    let clef_line = get_child_text(clef_node, "line").and_then(|t| t.parse().ok());
    let kind = ClefKind::from_sign_and_line(&sign, clef_line).ok_or(ParseError::InvalidValue {
        element: "clef/sign".to_string(),
        value: sign,
    })?;
    Ok(Clef::new(line_of(clef_node), kind))
}

/// Parse a `<key>` element (traditional fifths form).
pub fn parse_key(key_node: Node) -> Result<Key, ParseError> {
    let fifths_text = get_child_text(key_node, "fifths")
        .ok_or_else(|| ParseError::MissingRequiredElement("key/fifths".to_string()))?;
    let fifths: i32 = fifths_text.parse().map_err(|_| ParseError::InvalidValue {
        element: "fifths".to_string(),
        value: fifths_text,
    })?;
    let mode = get_child_text(key_node, "mode")
        .map(|t| KeyMode::parse(&t))
        .unwrap_or(KeyMode::Major);
    Ok(Key::new(line_of(key_node), fifths, mode))
}

/// Parse a `<time>` element, including compound numerators like "3+2".
pub fn parse_time(time_node: Node) -> Result<Time, ParseError> {
    let symbol = match time_node.attribute("symbol") {
        Some("common") => TimeSymbolKind::Common,
        Some("cut") => TimeSymbolKind::Cut,
        _ => TimeSymbolKind::None,
    };
    if get_child(time_node, "senza-misura").is_some() {
        return Ok(Time::new(line_of(time_node), TimeSymbolKind::SenzaMisura, vec![]));
    }

    let mut items = Vec::new();
    let mut beats_iter = children_named(time_node, "beats");
    let mut types_iter = children_named(time_node, "beat-type");
    loop {
        match (beats_iter.next(), types_iter.next()) {
            (Some(beats_node), Some(type_node)) => {
                let beats_text = get_text(beats_node).unwrap_or_default();
                let beats: Result<Vec<i64>, _> =
                    beats_text.split('+').map(|b| b.trim().parse::<i64>()).collect();
                let beats = beats.map_err(|_| ParseError::InvalidValue {
                    element: "beats".to_string(),
                    value: beats_text.clone(),
                })?;
                let type_text = get_text(type_node).unwrap_or_default();
                let beat_value: i64 = type_text.parse().map_err(|_| ParseError::InvalidValue {
                    element: "beat-type".to_string(),
                    value: type_text.clone(),
                })?;
                items.push(TimeItem::new(beats, beat_value));
            }
            (None, None) => break,
            _ => {
                return Err(ParseError::InvalidValue {
                    element: "time".to_string(),
                    value: "unpaired beats/beat-type".to_string(),
                })
            }
        }
    }
    if items.is_empty() {
        return Err(ParseError::MissingRequiredElement("time/beats".to_string()));
    }
    Ok(Time::new(line_of(time_node), symbol, items))
}

/// Parse a `<barline>` style and location.
pub fn parse_barline_style(barline_node: Node) -> (BarlineLocation, Option<BarlineStyle>) {
    let location = match barline_node.attribute("location") {
        Some("left") => BarlineLocation::Left,
        Some("middle") => BarlineLocation::Middle,
        _ => BarlineLocation::Right,
    };
    let style = get_child_text(barline_node, "bar-style").and_then(|t| BarlineStyle::parse(&t));
    (location, style)
}
