//! Constants used throughout the MedConnect core crate.

/// Default bound on code allocation / insert retry loops.
pub const DEFAULT_GENERATION_RETRY_CAP: u32 = 16;

/// Name recorded for a promoted patient when intake captured none.
pub const UNKNOWN_PATIENT_NAME: &str = "Unknown";
