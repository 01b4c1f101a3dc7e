//! MSR: the Music Score Representation
//!
//! The format-neutral in-memory score tree. Built once, top to bottom, in
//! source document order; read-only afterwards. Output passes walk it via
//! [`browse::MsrVisitor`] and write to their own streams.

pub mod browse;
pub mod display;
pub mod durations;
pub mod elements;
pub mod notes;
pub mod pitch;
pub mod structure;

pub use browse::{browse_score, MsrVisitor};
pub use durations::{NoteDuration, TupletFactor, WholeNotes};
pub use pitch::{Alteration, DiatonicStep, Pitch};
pub use structure::{Measure, Part, PartGroup, Score, Staff, Voice};
