//! Code resolution.
//!
//! Maps a raw code string, as scanned or typed, to the stored record it
//! addresses. Resolution is pure identity lookup: it performs no
//! authorization and leaves no audit rows; both are the Access Gate's job.
//!
//! ## Classification
//!
//! Input is trimmed and classified by prefix: `PAT-` looks up patients, `EM-`
//! emergency records, `VST-` visits. Anything else is treated as *ambiguous*
//! rather than rejected, because real-world entry often omits the prefix. An
//! ambiguous code is tried against patients first and emergency records
//! second, in that fixed order: a converted emergency record should surface
//! its promoted patient, not its own terminal self. (Emergency-first would
//! better match urgent-care priority; the ordering is a policy decision and
//! must not change without confirming the intended clinical workflow.)
//!
//! A hit on a converted emergency record additionally carries the linked
//! patient when the link is known, so callers can show the live profile
//! instead of a dead end.

use crate::error::{CoreError, CoreResult};
use crate::store::RecordStore;
use crate::{EmergencyPatient, EmergencyStatus, Patient, Visit};
use medconnect_codes::CodeKind;
use std::sync::Arc;

/// A normalized resolved identity, regardless of which record kind matched.
#[derive(Clone, Debug)]
pub enum Resolved {
    Patient(Patient),
    Emergency {
        record: EmergencyPatient,
        /// The promoted patient, when the record is converted and its link is
        /// known. Callers should redirect to this profile.
        redirect: Option<Patient>,
    },
    Visit(Visit),
}

impl Resolved {
    /// The canonical code of whatever record matched.
    pub fn code(&self) -> &str {
        match self {
            Resolved::Patient(p) => p.patient_code.as_str(),
            Resolved::Emergency { record, .. } => record.emergency_code.as_str(),
            Resolved::Visit(v) => v.visit_code.as_str(),
        }
    }
}

/// Resolves raw codes to records.
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn RecordStore>,
}

impl Resolver {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Resolves a raw code string.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if nothing matches, including for empty or
    ///   whitespace-only input, which is a miss, not a fault, so caller code
    ///   stays uniform.
    /// - [`CoreError::StoreUnavailable`] if a lookup fails. Lookup failures
    ///   are definitive; the resolver never retries them.
    pub fn resolve(&self, raw_code: &str) -> CoreResult<Resolved> {
        let code = raw_code.trim();
        if code.is_empty() {
            return Err(CoreError::NotFound);
        }

        match CodeKind::classify(code) {
            Some(CodeKind::Patient) => self.patient(code)?.ok_or(CoreError::NotFound),
            Some(CodeKind::Emergency) => self.emergency(code)?.ok_or(CoreError::NotFound),
            Some(CodeKind::Visit) => self
                .store
                .visit_by_code(code)?
                .map(Resolved::Visit)
                .ok_or(CoreError::NotFound),
            // Ambiguous input: explicit two-branch fallback, patient first.
            None => {
                if let Some(hit) = self.patient(code)? {
                    return Ok(hit);
                }
                if let Some(hit) = self.emergency(code)? {
                    return Ok(hit);
                }
                tracing::debug!(code, "resolution miss on ambiguous input");
                Err(CoreError::NotFound)
            }
        }
    }

    fn patient(&self, code: &str) -> CoreResult<Option<Resolved>> {
        Ok(self.store.patient_by_code(code)?.map(Resolved::Patient))
    }

    fn emergency(&self, code: &str) -> CoreResult<Option<Resolved>> {
        let Some(record) = self.store.emergency_by_code(code)? else {
            return Ok(None);
        };
        let redirect = match (record.status, record.linked_patient_id) {
            (EmergencyStatus::Converted, Some(patient_id)) => {
                let linked = self.store.patient_by_id(patient_id)?;
                if linked.is_none() {
                    tracing::warn!(
                        code = %record.emergency_code,
                        %patient_id,
                        "converted emergency record links to a missing patient"
                    );
                }
                linked
            }
            _ => None,
        };
        Ok(Some(Resolved::Emergency { record, redirect }))
    }
}
