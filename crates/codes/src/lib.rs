//! Prefix-typed identifier codes.
//!
//! Every externally addressable record in MedConnect is handled through a short,
//! human-presentable code whose prefix encodes the record kind:
//!
//! - `PAT-` + 5 digits: a registered patient (`PAT-00042`)
//! - `EM-` + UUID: an emergency intake record (`EM-550e8400-e29b-41d4-a716-446655440000`)
//! - `VST-` + 6 digits: a single hospital visit (`VST-382114`)
//!
//! These strings are the sole payload handed to QR renderers and the sole input
//! accepted from scanners and manual entry, so their format is load-bearing:
//! resolution classifies raw input by prefix before touching the store.
//!
//! This crate owns the formats and nothing else. It validates externally supplied
//! codes, renders canonical ones, and constructs random candidates. Whether a
//! candidate is actually *unique* is a store concern; callers pair the random
//! constructors here with a store-side uniqueness check and retry loop.
//!
//! ## Canonical forms
//! - Prefixes are uppercase, digits are ASCII, UUID suffixes are lowercase and
//!   hyphenated (the `uuid` crate's default textual form).
//! - Numeric suffixes are zero-padded to their full width (`PAT-00042`, never
//!   `PAT-42`).

mod format;

pub use format::{CodeKind, EmergencyCode, PatientCode, VisitCode};

/// Error type for code parsing.
#[derive(Debug, thiserror::Error)]
pub enum CodeError {
    /// Invalid input provided
    #[error("Invalid code: {0}")]
    InvalidInput(String),
}

/// Result type for code operations.
pub type CodeResult<T> = Result<T, CodeError>;
