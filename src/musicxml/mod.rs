//! MusicXML front-end
//!
//! [`parser`] handles the XML layer (roxmltree wrappers plus leaf-element
//! parsing); [`builder`] assembles the MSR tree from the element stream.

pub mod builder;
pub mod parser;

pub use builder::{build_score, ParsedScore};
