// End-to-end MusicXML to LilyPond translation

use partwise::options::TranslationOptions;
use partwise::translate_musicxml_to_lilypond;

fn score_partwise(part_list: &str, parts: &str) -> String {
    format!(
        "<score-partwise version=\"3.1\"><part-list>{}</part-list>{}</score-partwise>",
        part_list, parts
    )
}

fn one_part(measures: &str) -> String {
    score_partwise(
        "<score-part id=\"P1\"><part-name>Flute</part-name></score-part>",
        &format!("<part id=\"P1\">{}</part>", measures),
    )
}

const ATTRIBUTES: &str = concat!(
    "<attributes><divisions>2</divisions>",
    "<key><fifths>2</fifths></key>",
    "<time><beats>4</beats><beat-type>4</beat-type></time>",
    "<clef><sign>G</sign><line>2</line></clef></attributes>"
);

fn note(step: char, octave: u32, duration: u32, kind: &str) -> String {
    format!(
        "<note><pitch><step>{}</step><octave>{}</octave></pitch>\
         <duration>{}</duration><voice>1</voice><type>{}</type></note>",
        step, octave, duration, kind
    )
}

#[test]
fn test_simple_melody_renders_relative_pitches() {
    let measures = format!(
        "<measure number=\"1\">{}{}{}{}{}</measure>",
        ATTRIBUTES,
        note('D', 4, 2, "quarter"),
        note('F', 4, 2, "quarter"),
        note('A', 4, 2, "quarter"),
        note('D', 5, 2, "quarter"),
    );
    let result =
        translate_musicxml_to_lilypond(&one_part(&measures), &TranslationOptions::default())
            .expect("translation should succeed");
    // D4 is absolute d'; each later note is within a fourth of its
    // predecessor so no further marks appear.
    assert!(
        result.output.contains("d'4 f4 a4 d4"),
        "expected unmarked relative run, got:\n{}",
        result.output
    );
    assert!(result.output.contains("\\key d \\major"));
    assert!(result.output.contains("\\time 4/4"));
    assert!(result.output.contains("\\clef \"treble\""));
    assert!(result.output.contains("\\version"));
}

#[test]
fn test_anacrusis_gets_a_partial() {
    let measures = format!(
        "<measure number=\"0\">{}{}</measure><measure number=\"1\">{}{}{}{}</measure>",
        ATTRIBUTES,
        note('A', 4, 2, "quarter"),
        note('D', 5, 2, "quarter"),
        note('D', 5, 2, "quarter"),
        note('D', 5, 2, "quarter"),
        note('D', 5, 2, "quarter"),
    );
    let result =
        translate_musicxml_to_lilypond(&one_part(&measures), &TranslationOptions::default())
            .expect("translation should succeed");
    assert!(
        result.output.contains("\\partial 4"),
        "anacrusis should emit \\partial, got:\n{}",
        result.output
    );
}

#[test]
fn test_repeat_with_endings_brackets() {
    let measures = format!(
        concat!(
            "<measure number=\"1\">{attrs}",
            "<barline location=\"left\"><repeat direction=\"forward\"/></barline>",
            "{m}</measure>",
            "<measure number=\"2\">",
            "<barline location=\"left\"><ending number=\"1\" type=\"start\"/></barline>{m}",
            "<barline location=\"right\"><ending number=\"1\" type=\"stop\"/>",
            "<repeat direction=\"backward\"/></barline></measure>",
            "<measure number=\"3\">",
            "<barline location=\"left\"><ending number=\"2\" type=\"start\"/></barline>{m}",
            "<barline location=\"right\"><ending number=\"2\" type=\"stop\"/></barline></measure>"
        ),
        attrs = ATTRIBUTES,
        m = format!(
            "{}{}",
            note('D', 4, 4, "half"),
            note('A', 4, 4, "half")
        ),
    );
    let result =
        translate_musicxml_to_lilypond(&one_part(&measures), &TranslationOptions::default())
            .expect("translation should succeed");
    assert!(
        result.output.contains("\\repeat volta 2 {"),
        "got:\n{}",
        result.output
    );
    assert!(result.output.contains("\\alternative {"));
}

#[test]
fn test_triplet_emits_tuplet_command() {
    let triplet: String = "DEF"
        .chars()
        .enumerate()
        .map(|(i, step)| {
            let marker = match i {
                0 => "<notations><tuplet type=\"start\"/></notations>",
                2 => "<notations><tuplet type=\"stop\"/></notations>",
                _ => "",
            };
            format!(
                "<note><pitch><step>{}</step><octave>4</octave></pitch>\
                 <duration>2</duration><voice>1</voice><type>eighth</type>\
                 <time-modification><actual-notes>3</actual-notes>\
                 <normal-notes>2</normal-notes></time-modification>{}</note>",
                step, marker
            )
        })
        .collect();
    let measures = format!(
        "<measure number=\"1\"><attributes><divisions>6</divisions>\
         <time><beats>1</beats><beat-type>4</beat-type></time></attributes>{}</measure>",
        triplet
    );
    let result =
        translate_musicxml_to_lilypond(&one_part(&measures), &TranslationOptions::default())
            .expect("translation should succeed");
    assert!(
        result.output.contains("\\tuplet 3/2 {"),
        "got:\n{}",
        result.output
    );
}

#[test]
fn test_part_rename_reaches_instrument_name() {
    let measures = format!(
        "<measure number=\"1\">{}{}",
        ATTRIBUTES,
        note('D', 4, 8, "whole")
    ) + "</measure>";
    let mut options = TranslationOptions::default();
    options
        .parts
        .renames
        .insert("Flute".to_string(), "Traverso".to_string());
    let result = translate_musicxml_to_lilypond(&one_part(&measures), &options)
        .expect("translation should succeed");
    assert!(
        result.output.contains("instrumentName = \"Traverso\""),
        "got:\n{}",
        result.output
    );
    assert!(!result.output.contains("\"Flute\""));
}

#[test]
fn test_omitted_part_disappears_from_output() {
    let xml = score_partwise(
        concat!(
            "<score-part id=\"P1\"><part-name>Flute</part-name></score-part>",
            "<score-part id=\"P2\"><part-name>Oboe</part-name></score-part>"
        ),
        &format!(
            "<part id=\"P1\"><measure number=\"1\">{a}{n}</measure></part>\
             <part id=\"P2\"><measure number=\"1\">{a}{n}</measure></part>",
            a = ATTRIBUTES,
            n = note('C', 4, 8, "whole"),
        ),
    );
    let mut options = TranslationOptions::default();
    options.parts.omit_part_ids.insert("P2".to_string());
    let result =
        translate_musicxml_to_lilypond(&xml, &options).expect("translation should succeed");
    assert!(result.output.contains("P1s1v1"));
    assert!(!result.output.contains("P2s1v1"));
}

#[test]
fn test_transposition_moves_pitches() {
    let measures = format!(
        "<measure number=\"1\">{}{}</measure>",
        ATTRIBUTES,
        note('C', 4, 8, "whole")
    );
    let mut options = TranslationOptions::default();
    options.parts.transpositions.insert(
        "P1".to_string(),
        partwise::options::PartTransposition {
            semitones: 2,
            octave_shift: 0,
        },
    );
    let result = translate_musicxml_to_lilypond(&one_part(&measures), &options)
        .expect("translation should succeed");
    assert!(
        result.output.contains("d'1"),
        "C4 up a whole tone should be d', got:\n{}",
        result.output
    );
}

#[test]
fn test_lyrics_stream_follows_the_voice() {
    let measures = format!(
        "<measure number=\"1\">{}\
         <note><pitch><step>D</step><octave>4</octave></pitch>\
         <duration>4</duration><voice>1</voice><type>half</type>\
         <lyric><syllabic>begin</syllabic><text>glo</text></lyric></note>\
         <note><pitch><step>E</step><octave>4</octave></pitch>\
         <duration>4</duration><voice>1</voice><type>half</type>\
         <lyric><syllabic>end</syllabic><text>ry</text></lyric></note>\
         </measure>",
        ATTRIBUTES
    );
    let result =
        translate_musicxml_to_lilypond(&one_part(&measures), &TranslationOptions::default())
            .expect("translation should succeed");
    assert!(
        result.output.contains("\\new Lyrics \\lyricsto \"P1s1v1\""),
        "got:\n{}",
        result.output
    );
    assert!(result.output.contains("glo --"));
    assert!(result.output.contains("ry"));
}

#[test]
fn test_unsupported_ornament_is_reported_and_placeholdered() {
    let measures = format!(
        "<measure number=\"1\">{}\
         <note><pitch><step>D</step><octave>4</octave></pitch>\
         <duration>8</duration><voice>1</voice><type>whole</type>\
         <notations><ornaments><shake/></ornaments></notations></note></measure>",
        ATTRIBUTES
    );
    let result =
        translate_musicxml_to_lilypond(&one_part(&measures), &TranslationOptions::default())
            .expect("translation should succeed");
    assert!(
        result.output.contains("%{ unsupported ornament: shake %}"),
        "got:\n{}",
        result.output
    );
    assert!(result
        .skipped
        .iter()
        .any(|s| s.element_type.contains("shake")));
}

#[test]
fn test_harmony_voice_renders_chordmode() {
    let measures = format!(
        "<measure number=\"1\">{}\
         <harmony><root><root-step>D</root-step></root><kind>minor-seventh</kind></harmony>{}\
         </measure>",
        ATTRIBUTES,
        note('D', 4, 8, "whole")
    );
    let result =
        translate_musicxml_to_lilypond(&one_part(&measures), &TranslationOptions::default())
            .expect("translation should succeed");
    assert!(
        result.output.contains("\\new ChordNames \\chordmode {"),
        "got:\n{}",
        result.output
    );
    assert!(result.output.contains("d1:m7"), "got:\n{}", result.output);
}

#[test]
fn test_omit_harmonies_drops_the_chord_voice() {
    let measures = format!(
        "<measure number=\"1\">{}\
         <harmony><root><root-step>D</root-step></root><kind>major</kind></harmony>{}\
         </measure>",
        ATTRIBUTES,
        note('D', 4, 8, "whole")
    );
    let mut options = TranslationOptions::default();
    options.lilypond.omit_harmonies = true;
    let result = translate_musicxml_to_lilypond(&one_part(&measures), &options)
        .expect("translation should succeed");
    assert!(!result.output.contains("ChordNames"));
    assert!(result
        .skipped
        .iter()
        .any(|s| s.element_type == "harmony-voice"));
}
