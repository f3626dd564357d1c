//! Hospital visits: scheduling and staff completion.
//!
//! A visit ties a patient to one hospital encounter through a single-use
//! `VST-` code. Completion is a staff write: it runs through the Access Gate
//! (audited, hospital-matched) and then lands as one conditional update so a
//! visit can only ever be completed once, by one staff member.

use crate::access::{AccessGate, Intent};
use crate::codegen::CodeIssuer;
use crate::error::{CoreError, CoreResult};
use crate::resolver::Resolved;
use crate::staff::StaffIdentity;
use crate::store::{ConditionalOutcome, RecordStore, StoreError};
use chrono::{DateTime, Utc};
use medconnect_codes::VisitCode;
use medconnect_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Lifecycle state of a visit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    Scheduled,
    Completed,
}

/// A single hospital encounter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Visit {
    pub id: Uuid,
    pub visit_code: VisitCode,
    pub patient_id: Uuid,
    pub hospital_id: Uuid,
    pub visit_reason: Option<String>,
    /// Staff-authored clinical notes, written once at completion.
    pub doctor_notes: Option<String>,
    /// The staff member who completed the visit.
    pub staff_id: Option<Uuid>,
    pub status: VisitStatus,
    pub visit_date: DateTime<Utc>,
}

/// Schedules and completes visits.
#[derive(Clone)]
pub struct VisitService {
    store: Arc<dyn RecordStore>,
    issuer: CodeIssuer,
    gate: AccessGate,
}

impl VisitService {
    pub fn new(store: Arc<dyn RecordStore>, issuer: CodeIssuer, gate: AccessGate) -> Self {
        Self { store, issuer, gate }
    }

    /// Schedules a visit for an existing patient at a hospital.
    ///
    /// Allocates a single-use visit code; a store uniqueness conflict is
    /// corrected by regenerating the code within the configured retry cap.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if no patient matches `patient_code`.
    /// - [`CoreError::GenerationExhausted`] if no unique visit code could be
    ///   allocated within the retry cap.
    /// - [`CoreError::StoreUnavailable`] on store failure.
    pub fn schedule(
        &self,
        patient_code: &str,
        hospital_id: Uuid,
        visit_reason: Option<NonEmptyText>,
    ) -> CoreResult<Visit> {
        let patient = self
            .store
            .patient_by_code(patient_code.trim())?
            .ok_or(CoreError::NotFound)?;

        let cap = self.issuer.retry_cap();
        for _ in 0..cap {
            let visit = Visit {
                id: Uuid::new_v4(),
                visit_code: self.issuer.issue_visit_code()?,
                patient_id: patient.id,
                hospital_id,
                visit_reason: visit_reason.clone().map(NonEmptyText::into_inner),
                doctor_notes: None,
                staff_id: None,
                status: VisitStatus::Scheduled,
                visit_date: Utc::now(),
            };
            match self.store.insert_visit(&visit) {
                Ok(()) => {
                    tracing::info!(code = %visit.visit_code, patient = %patient.patient_code, "visit scheduled");
                    return Ok(visit);
                }
                Err(StoreError::Conflict) => {
                    tracing::warn!(code = %visit.visit_code, "visit code collision on insert, regenerating");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(CoreError::GenerationExhausted(cap))
    }

    /// Completes a visit, recording doctor notes and staff attribution.
    ///
    /// The write is authorized through the Access Gate first (one audited
    /// attempt; the staff member's hospital must match the visit's), then
    /// applied as a single conditional update keyed on the visit still being
    /// `scheduled`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Denied`] from the gate (inactive staff, wrong hospital,
    ///   or audit trail unavailable).
    /// - [`CoreError::NotFound`] if the code resolves to nothing.
    /// - [`CoreError::InvalidInput`] if the code resolves to something other
    ///   than a visit.
    /// - [`CoreError::VisitClosed`] if the visit was already completed.
    pub fn complete(
        &self,
        staff: &StaffIdentity,
        visit_code: &str,
        notes: Option<NonEmptyText>,
    ) -> CoreResult<Visit> {
        let view = self.gate.authorize(staff, visit_code, Intent::Write)?;
        let visit = match view.target {
            Resolved::Visit(visit) => visit,
            _ => {
                return Err(CoreError::InvalidInput(
                    "code does not address a visit".into(),
                ))
            }
        };

        let outcome = self.store.complete_visit(
            visit.visit_code.as_str(),
            staff.user_id,
            notes.map(NonEmptyText::into_inner),
        )?;
        match outcome {
            ConditionalOutcome::Updated => {
                let completed = self
                    .store
                    .visit_by_code(visit.visit_code.as_str())?
                    .ok_or(CoreError::NotFound)?;
                tracing::info!(code = %completed.visit_code, staff = %staff.user_id, "visit completed");
                Ok(completed)
            }
            ConditionalOutcome::PreconditionFailed => Err(CoreError::VisitClosed),
        }
    }
}
