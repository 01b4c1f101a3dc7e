//! Error types for the translation pipeline
//!
//! Fatal structural errors carry the input line number of the offending
//! MusicXML element so diagnostics point back at the source document.
//! Unsupported constructs are never errors; they are collected as
//! [`SkippedElement`] entries and surface as placeholder comments in the
//! generated output.

use thiserror::Error;

/// Top-level error type for a translation run
#[derive(Debug, Clone, Error)]
pub enum TranslationError {
    /// Fatal XML parsing error from the front-end
    #[error("XML parsing failed: {0}")]
    Parse(#[from] ParseError),

    /// Configuration rejected before any pass ran
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Structural inconsistency in the score tree. Indicates a data-model
    /// violation upstream; never caught and retried.
    #[error("internal error at input line {input_line}: {message}")]
    Internal { input_line: u32, message: String },

    /// Writing the output stream failed
    #[error("output write failed: {0}")]
    Io(String),
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::Io(error.to_string())
    }
}

impl TranslationError {
    pub fn internal(input_line: u32, message: impl Into<String>) -> Self {
        TranslationError::Internal {
            input_line,
            message: message.into(),
        }
    }
}

/// Fatal MusicXML parsing errors
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// XML is not well-formed
    #[error("invalid XML: {0}")]
    InvalidXml(String),

    /// Document root is not score-partwise
    #[error("unsupported MusicXML format: {0}")]
    UnsupportedFormat(String),

    /// Required structural element is missing
    #[error("missing required element: {0}")]
    MissingRequiredElement(String),

    /// An element carries a value the translation cannot interpret
    #[error("invalid value for {element}: {value}")]
    InvalidValue { element: String, value: String },
}

/// Configuration errors, reported eagerly before translation starts
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Two options that exclude each other are both set; names both
    /// identifiers so the caller can see the conflict.
    #[error("options '{first}' and '{second}' are mutually exclusive")]
    MutuallyExclusive { first: String, second: String },

    /// A part rename/transpose specification string did not parse
    #[error("malformed specification for option '{option}': '{spec}' ({reason})")]
    MalformedSpec {
        option: String,
        spec: String,
        reason: String,
    },

    /// A numeric option is outside its allowed range
    #[error("option '{option}' value {value} is out of range ({reason})")]
    OutOfRange {
        option: String,
        value: i64,
        reason: String,
    },
}

/// A construct the translator recognized but could not map to output.
/// Mirrors the skip report the conversion keeps so callers can show what
/// was left out of a best-effort translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedElement {
    /// Element or construct kind (e.g. "figured-bass", "ornament:shake")
    pub element_type: String,
    /// Measure number where it occurred, when known
    pub measure_number: Option<String>,
    /// Part id, when known
    pub part_id: Option<String>,
    /// Why it was skipped
    pub reason: String,
}

pub type Result<T> = std::result::Result<T, TranslationError>;
