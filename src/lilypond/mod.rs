//! LilyPond generation
//!
//! Walks the adapted score with [`translator::LilyPondTranslator`] and
//! stitches the resulting score block into a document via the mustache
//! templates.

pub mod templates;
pub mod translator;

use log::info;

use crate::errors::{Result, SkippedElement};
use crate::lpsr::LpsrScore;
use crate::msr::browse_score;
use crate::options::LilyPondOptions;

use templates::{escape_lilypond_string, render_lilypond, LilyPondTemplate, TemplateContext};
use translator::LilyPondTranslator;

/// A generated LilyPond document plus the skip report for the run
#[derive(Debug, Clone)]
pub struct LilyPondOutput {
    pub source: String,
    pub skipped: Vec<SkippedElement>,
}

/// Generate a complete LilyPond document from an LPSR score.
pub fn generate_lilypond(lpsr: &LpsrScore, options: &LilyPondOptions) -> Result<LilyPondOutput> {
    let mut visitor = LilyPondTranslator::new(options);
    browse_score(&lpsr.score, &mut visitor);
    let translated = visitor.finish()?;

    let header = render_header_block(lpsr);
    let paper = render_paper_block(lpsr);
    let template = if header.is_empty() && paper.is_empty() {
        LilyPondTemplate::Minimal
    } else {
        LilyPondTemplate::Standard
    };
    let source = render_lilypond(
        template,
        &TemplateContext {
            version: options.lilypond_version.clone(),
            header,
            paper,
            score: translated.score_block,
        },
    )?;

    info!(
        target: "lily",
        "generated {} bytes of LilyPond, {} skipped elements",
        source.len(),
        translated.skipped.len()
    );
    Ok(LilyPondOutput {
        source,
        skipped: translated.skipped,
    })
}

fn render_header_block(lpsr: &LpsrScore) -> String {
    let mut fields = Vec::new();
    if let Some(title) = &lpsr.header.title {
        fields.push(format!("  title = \"{}\"", escape_lilypond_string(title)));
    }
    if let Some(opus) = &lpsr.header.opus {
        fields.push(format!("  opus = \"{}\"", escape_lilypond_string(opus)));
    }
    if let Some(composer) = &lpsr.header.composer {
        fields.push(format!(
            "  composer = \"{}\"",
            escape_lilypond_string(composer)
        ));
    }
    if fields.is_empty() {
        return String::new();
    }
    format!("\\header {{\n{}\n}}\n", fields.join("\n"))
}

fn render_paper_block(lpsr: &LpsrScore) -> String {
    let mut fields = vec![format!("  indent = {}\\mm", lpsr.paper.indent)];
    if lpsr.paper.ragged_last {
        fields.push("  ragged-last = ##t".to_string());
    }
    format!("\\paper {{\n{}\n}}\n", fields.join("\n"))
}
