//! Emergency intake records and the unauthenticated intake service.
//!
//! Emergency records are created at the roadside or the front desk, before
//! anyone has authenticated. They carry a reduced clinical subset and live
//! under an `EM-` code until the Promotion Engine folds them into a permanent
//! patient record. A converted record is terminal: it is retained forever as
//! an audit artifact and never transitions back to `active`.

use crate::codegen::CodeIssuer;
use crate::error::CoreResult;
use crate::store::{RecordStore, StoreError};
use crate::ClinicalText;
use chrono::{DateTime, Utc};
use medconnect_codes::EmergencyCode;
use medconnect_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Lifecycle state of an emergency record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyStatus {
    /// Awaiting conversion; the record is the live source of truth.
    Active,
    /// Promoted into a Patient. Terminal; no further mutation.
    Converted,
}

/// An ad-hoc emergency intake record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmergencyPatient {
    pub id: Uuid,
    pub emergency_code: EmergencyCode,
    pub patient_name: Option<String>,
    pub estimated_age: Option<u32>,
    pub gender: Option<String>,
    pub condition_description: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub emergency_contact_phone: Option<String>,
    /// Free-text hospital name as reported at intake; not a hospital key, so
    /// it never gates staff writes.
    pub hospital_name: Option<String>,
    pub status: EmergencyStatus,
    /// Set exactly once, by the Promotion Engine, together with the flip to
    /// [`EmergencyStatus::Converted`].
    pub linked_patient_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Input accepted from the unauthenticated intake form.
///
/// Clinical free text is opaque to the core but length-capped; nothing here is
/// required, because intake happens under the worst possible conditions.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EmergencyIntake {
    pub patient_name: Option<NonEmptyText>,
    pub estimated_age: Option<u32>,
    pub gender: Option<String>,
    pub condition_description: Option<ClinicalText>,
    pub allergies: Option<ClinicalText>,
    pub medications: Option<ClinicalText>,
    pub emergency_contact_phone: Option<String>,
    pub hospital_name: Option<String>,
}

/// Creates and lists emergency records.
#[derive(Clone)]
pub struct EmergencyIntakeService {
    store: Arc<dyn RecordStore>,
    issuer: CodeIssuer,
}

impl EmergencyIntakeService {
    pub fn new(store: Arc<dyn RecordStore>, issuer: CodeIssuer) -> Self {
        Self { store, issuer }
    }

    /// Creates a new emergency record with a fresh `EM-` code.
    ///
    /// The record starts `active` with no patient link. A store uniqueness
    /// conflict (vanishingly rare for the UUID suffix space) is corrected by
    /// regenerating the code, bounded by the configured retry cap.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::GenerationExhausted`](crate::CoreError::GenerationExhausted)
    /// if the retry cap is hit, or
    /// [`CoreError::StoreUnavailable`](crate::CoreError::StoreUnavailable) on
    /// store failure.
    pub fn create(&self, intake: EmergencyIntake) -> CoreResult<EmergencyPatient> {
        let cap = self.issuer.retry_cap();
        for _ in 0..cap {
            let record = EmergencyPatient {
                id: Uuid::new_v4(),
                emergency_code: self.issuer.issue_emergency_code()?,
                patient_name: intake.patient_name.clone().map(NonEmptyText::into_inner),
                estimated_age: intake.estimated_age,
                gender: intake.gender.clone(),
                condition_description: opaque_text(&intake.condition_description),
                allergies: opaque_text(&intake.allergies),
                medications: opaque_text(&intake.medications),
                emergency_contact_phone: intake.emergency_contact_phone.clone(),
                hospital_name: intake.hospital_name.clone(),
                status: EmergencyStatus::Active,
                linked_patient_id: None,
                created_at: Utc::now(),
            };
            match self.store.insert_emergency(&record) {
                Ok(()) => {
                    tracing::info!(code = %record.emergency_code, "emergency record created");
                    return Ok(record);
                }
                Err(StoreError::Conflict) => {
                    tracing::warn!(
                        code = %record.emergency_code,
                        "emergency code collision on insert, regenerating"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(crate::CoreError::GenerationExhausted(cap))
    }

    /// Lists records still awaiting conversion, for the staff emergency board.
    pub fn list_active(&self) -> CoreResult<Vec<EmergencyPatient>> {
        Ok(self.store.active_emergencies()?)
    }
}

fn opaque_text(value: &Option<ClinicalText>) -> Option<String> {
    value
        .as_ref()
        .filter(|t| !t.is_empty())
        .map(|t| t.as_str().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::store::MemoryStore;

    fn service() -> (Arc<MemoryStore>, EmergencyIntakeService) {
        let store = Arc::new(MemoryStore::default());
        let cfg = Arc::new(CoreConfig::default());
        let issuer = CodeIssuer::new(store.clone() as Arc<dyn RecordStore>, &cfg);
        let service = EmergencyIntakeService::new(store.clone() as Arc<dyn RecordStore>, issuer);
        (store, service)
    }

    fn intake_named(name: &str) -> EmergencyIntake {
        EmergencyIntake {
            patient_name: Some(NonEmptyText::new(name).unwrap()),
            estimated_age: Some(45),
            condition_description: Some(ClinicalText::new("unresponsive, suspected stroke").unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_starts_active_and_unlinked() {
        let (_, service) = service();
        let record = service.create(intake_named("John Doe")).unwrap();

        assert_eq!(record.status, EmergencyStatus::Active);
        assert_eq!(record.linked_patient_id, None);
        assert_eq!(record.patient_name.as_deref(), Some("John Doe"));
        assert!(record.emergency_code.as_str().starts_with("EM-"));
    }

    #[test]
    fn test_create_blanks_empty_clinical_text() {
        let (_, service) = service();
        let record = service
            .create(EmergencyIntake {
                allergies: Some(ClinicalText::new("  ").unwrap()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(record.allergies, None);
    }

    #[test]
    fn test_created_records_appear_in_active_list() {
        let (_, service) = service();
        let a = service.create(intake_named("A")).unwrap();
        let b = service.create(intake_named("B")).unwrap();

        let active = service.list_active().unwrap();
        let codes: Vec<&str> = active.iter().map(|r| r.emergency_code.as_str()).collect();
        assert!(codes.contains(&a.emergency_code.as_str()));
        assert!(codes.contains(&b.emergency_code.as_str()));
    }
}
