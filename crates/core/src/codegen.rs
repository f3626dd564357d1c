//! Store-checked code allocation.
//!
//! Candidate codes come from `medconnect_codes`; this module adds the part a
//! pure format crate cannot: checking a candidate against the store and
//! retrying on collision. The human-readable numeric spaces (`PAT-`, `VST-`)
//! are small, so collisions are expected and corrected here rather than
//! surfaced. A store-level insert conflict can still slip through between
//! check and insert; creation flows handle that with the same bounded retry.
//!
//! There is deliberately no in-process counter anywhere in this path:
//! multiple service instances may allocate against the same store at once, so
//! the store's uniqueness constraint is the only arbiter.

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::store::RecordStore;
use medconnect_codes::{CodeKind, EmergencyCode, PatientCode, VisitCode};
use std::sync::Arc;

/// Allocates collision-resistant, prefix-typed codes.
#[derive(Clone)]
pub struct CodeIssuer {
    store: Arc<dyn RecordStore>,
    retry_cap: u32,
}

impl CodeIssuer {
    pub fn new(store: Arc<dyn RecordStore>, cfg: &CoreConfig) -> Self {
        Self {
            store,
            retry_cap: cfg.generation_retry_cap(),
        }
    }

    /// The bounded number of allocation attempts before giving up.
    pub fn retry_cap(&self) -> u32 {
        self.retry_cap
    }

    /// Allocates a code of the given kind, rendered as its canonical string.
    ///
    /// This is the generic entry point for callers that only know the kind at
    /// runtime; the typed variants below are preferred inside the core.
    pub fn issue(&self, kind: CodeKind) -> CoreResult<String> {
        match kind {
            CodeKind::Patient => self.issue_patient_code().map(|c| c.as_str().to_owned()),
            CodeKind::Emergency => self.issue_emergency_code().map(|c| c.as_str().to_owned()),
            CodeKind::Visit => self.issue_visit_code().map(|c| c.as_str().to_owned()),
        }
    }

    /// Allocates a `PAT-` code not currently present in the store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::GenerationExhausted`] after the retry cap, or
    /// [`CoreError::StoreUnavailable`] if the uniqueness check itself fails.
    pub fn issue_patient_code(&self) -> CoreResult<PatientCode> {
        for _ in 0..self.retry_cap {
            let candidate = PatientCode::random();
            if self.store.patient_by_code(candidate.as_str())?.is_none() {
                return Ok(candidate);
            }
            tracing::warn!(code = %candidate, "patient code already allocated, retrying");
        }
        Err(CoreError::GenerationExhausted(self.retry_cap))
    }

    /// Allocates a `VST-` code not currently present in the store.
    pub fn issue_visit_code(&self) -> CoreResult<VisitCode> {
        for _ in 0..self.retry_cap {
            let candidate = VisitCode::random();
            if self.store.visit_by_code(candidate.as_str())?.is_none() {
                return Ok(candidate);
            }
            tracing::warn!(code = %candidate, "visit code already allocated, retrying");
        }
        Err(CoreError::GenerationExhausted(self.retry_cap))
    }

    /// Allocates an `EM-` code.
    ///
    /// The UUID suffix space makes a collision negligible, but the store check
    /// runs anyway so every kind goes through the same corrective loop.
    pub fn issue_emergency_code(&self) -> CoreResult<EmergencyCode> {
        for _ in 0..self.retry_cap {
            let candidate = EmergencyCode::generate();
            if self.store.emergency_by_code(candidate.as_str())?.is_none() {
                return Ok(candidate);
            }
            tracing::warn!(code = %candidate, "emergency code already allocated, retrying");
        }
        Err(CoreError::GenerationExhausted(self.retry_cap))
    }
}
