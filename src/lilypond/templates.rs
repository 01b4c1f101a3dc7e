//! LilyPond document templates
//!
//! Mustache templates supply the outer document skeleton; the translator
//! supplies pre-rendered header/paper/score blocks so the templates stay
//! free of escaping concerns (triple-stache insertion).

use serde::Serialize;

use crate::errors::{Result, TranslationError};

/// Template selection for the outer document
#[derive(Debug, Clone, Copy)]
pub enum LilyPondTemplate {
    /// Bare version + score, for embedding
    Minimal,
    /// Version, header and paper blocks, score
    Standard,
}

/// Pre-rendered blocks handed to the template
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext {
    pub version: String,
    pub header: String,
    pub paper: String,
    pub score: String,
}

fn template_content(template: LilyPondTemplate) -> &'static str {
    match template {
        LilyPondTemplate::Minimal => include_str!("templates/minimal.ly.mustache"),
        LilyPondTemplate::Standard => include_str!("templates/standard.ly.mustache"),
    }
}

/// Render the outer LilyPond document.
pub fn render_lilypond(template: LilyPondTemplate, context: &TemplateContext) -> Result<String> {
    let compiled = mustache::compile_str(template_content(template)).map_err(|e| {
        TranslationError::internal(0, format!("template compilation failed: {}", e))
    })?;
    compiled
        .render_to_string(context)
        .map_err(|e| TranslationError::internal(0, format!("template rendering failed: {}", e)))
}

/// Escape special characters for LilyPond string literals.
pub fn escape_lilypond_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
