//! The Promotion Engine: one-time conversion of an emergency record.
//!
//! Promotion folds an emergency record into a permanent patient record:
//! either an existing one, or a new one seeded from whatever intake captured.
//! The transition is non-repeatable: the status flip and the patient
//! back-link land in a single conditional write keyed on the record still
//! being `active`, so under concurrent attempts exactly one caller wins and
//! every other observes [`CoreError::AlreadyConverted`]. When a new patient
//! is being created, its identity is allocated *before* that write and the
//! row is inserted only after winning it; a losing caller therefore creates
//! nothing.

use crate::codegen::CodeIssuer;
use crate::constants::UNKNOWN_PATIENT_NAME;
use crate::error::{CoreError, CoreResult};
use crate::store::{ConditionalOutcome, RecordStore, StoreError};
use crate::{EmergencyPatient, EmergencyStatus, Patient};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Promotes emergency records into permanent patients.
#[derive(Clone)]
pub struct PromotionEngine {
    store: Arc<dyn RecordStore>,
    issuer: CodeIssuer,
}

impl PromotionEngine {
    pub fn new(store: Arc<dyn RecordStore>, issuer: CodeIssuer) -> Self {
        Self { store, issuer }
    }

    /// Promotes the emergency record behind `emergency_code`.
    ///
    /// With `target_patient` supplied, links to that existing patient;
    /// otherwise creates a new patient seeded from the emergency record's
    /// fields and a freshly allocated `PAT-` code.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the emergency code (or a supplied target
    ///   patient code) matches nothing.
    /// - [`CoreError::AlreadyConverted`] if the record was already promoted;
    ///   callers should treat this as success-equivalent and follow the
    ///   carried link.
    /// - [`CoreError::GenerationExhausted`] if no unique patient code could
    ///   be allocated.
    /// - [`CoreError::StoreUnavailable`] on store failure.
    pub fn promote(
        &self,
        emergency_code: &str,
        target_patient: Option<&str>,
    ) -> CoreResult<Patient> {
        let code = emergency_code.trim();
        let record = self
            .store
            .emergency_by_code(code)?
            .ok_or(CoreError::NotFound)?;
        if record.status == EmergencyStatus::Converted {
            return Err(CoreError::AlreadyConverted {
                linked_patient: record.linked_patient_id,
            });
        }

        match target_patient {
            Some(target) => self.promote_into_existing(code, target),
            None => self.promote_into_new(code, &record),
        }
    }

    fn promote_into_existing(&self, code: &str, target: &str) -> CoreResult<Patient> {
        let patient = self
            .store
            .patient_by_code(target.trim())?
            .ok_or(CoreError::NotFound)?;

        match self.store.convert_emergency(code, patient.id)? {
            ConditionalOutcome::Updated => {
                tracing::info!(emergency = code, patient = %patient.patient_code, "emergency record promoted");
                Ok(patient)
            }
            ConditionalOutcome::PreconditionFailed => Err(self.already_converted(code)?),
        }
    }

    fn promote_into_new(&self, code: &str, record: &EmergencyPatient) -> CoreResult<Patient> {
        let mut patient = seed_patient(record, self.issuer.issue_patient_code()?);

        // Win the conversion before inserting: a losing concurrent caller
        // must not leave a stray patient row behind.
        match self.store.convert_emergency(code, patient.id)? {
            ConditionalOutcome::Updated => {}
            ConditionalOutcome::PreconditionFailed => return Err(self.already_converted(code)?),
        }

        let cap = self.issuer.retry_cap();
        for _ in 0..cap {
            match self.store.insert_patient(&patient) {
                Ok(()) => {
                    tracing::info!(
                        emergency = code,
                        patient = %patient.patient_code,
                        "emergency record promoted into new patient"
                    );
                    return Ok(patient);
                }
                // Lost a code race between the uniqueness check and the
                // insert. The emergency link is keyed on the patient id, not
                // the code, so a fresh code keeps the link intact.
                Err(StoreError::Conflict) => {
                    patient.patient_code = self.issuer.issue_patient_code()?;
                    tracing::warn!(
                        emergency = code,
                        "patient code conflicted on insert, reallocated"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(CoreError::GenerationExhausted(cap))
    }

    /// Builds the `AlreadyConverted` outcome, re-fetching the record so the
    /// winner's link is carried to the caller.
    fn already_converted(&self, code: &str) -> CoreResult<CoreError> {
        let linked_patient = self
            .store
            .emergency_by_code(code)?
            .and_then(|r| r.linked_patient_id);
        Ok(CoreError::AlreadyConverted { linked_patient })
    }
}

fn seed_patient(record: &EmergencyPatient, patient_code: medconnect_codes::PatientCode) -> Patient {
    let now = Utc::now();
    Patient {
        id: Uuid::new_v4(),
        patient_code,
        full_name: record
            .patient_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_PATIENT_NAME.to_owned()),
        date_of_birth: None,
        gender: record.gender.clone(),
        phone: None,
        emergency_contact_name: None,
        emergency_contact_phone: record.emergency_contact_phone.clone(),
        insurance_info: None,
        owner_user_id: None,
        intake_notes: intake_notes(record),
        created_at: now,
        updated_at: now,
    }
}

/// Carries the emergency record's clinical free text over as one note blob.
fn intake_notes(record: &EmergencyPatient) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(condition) = record.condition_description.as_deref() {
        lines.push(format!("Condition at intake: {condition}"));
    }
    if let Some(allergies) = record.allergies.as_deref() {
        lines.push(format!("Allergies: {allergies}"));
    }
    if let Some(medications) = record.medications.as_deref() {
        lines.push(format!("Medications: {medications}"));
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::emergency::{EmergencyIntake, EmergencyIntakeService};
    use crate::patient::NewPatient;
    use crate::registration::RegistrationService;
    use crate::resolver::{Resolved, Resolver};
    use crate::store::MemoryStore;
    use crate::ClinicalText;
    use medconnect_types::NonEmptyText;
    use std::thread;

    struct Harness {
        store: Arc<MemoryStore>,
        engine: PromotionEngine,
        intake: EmergencyIntakeService,
        registration: RegistrationService,
        resolver: Resolver,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::default());
        let dyn_store: Arc<dyn RecordStore> = store.clone();
        let cfg = Arc::new(CoreConfig::default());
        let issuer = CodeIssuer::new(dyn_store.clone(), &cfg);
        Harness {
            store,
            engine: PromotionEngine::new(dyn_store.clone(), issuer.clone()),
            intake: EmergencyIntakeService::new(dyn_store.clone(), issuer.clone()),
            registration: RegistrationService::new(dyn_store.clone(), issuer),
            resolver: Resolver::new(dyn_store),
        }
    }

    fn full_intake() -> EmergencyIntake {
        EmergencyIntake {
            patient_name: Some(NonEmptyText::new("Jane Roe").unwrap()),
            estimated_age: Some(34),
            gender: Some("female".into()),
            condition_description: Some(ClinicalText::new("anaphylaxis").unwrap()),
            allergies: Some(ClinicalText::new("peanuts").unwrap()),
            medications: Some(ClinicalText::new("epinephrine").unwrap()),
            emergency_contact_phone: Some("+44 20 7946 0000".into()),
            hospital_name: None,
        }
    }

    #[test]
    fn test_promote_creates_seeded_patient() {
        let h = harness();
        let record = h.intake.create(full_intake()).unwrap();

        let patient = h.engine.promote(record.emergency_code.as_str(), None).unwrap();

        assert_eq!(patient.full_name, "Jane Roe");
        assert_eq!(patient.gender.as_deref(), Some("female"));
        assert_eq!(patient.emergency_contact_phone.as_deref(), Some("+44 20 7946 0000"));
        assert_eq!(patient.owner_user_id, None);
        let notes = patient.intake_notes.as_deref().unwrap();
        assert!(notes.contains("anaphylaxis"));
        assert!(notes.contains("peanuts"));
        assert!(notes.contains("epinephrine"));

        let stored = h.store.patient_by_id(patient.id).unwrap().unwrap();
        assert_eq!(stored.patient_code, patient.patient_code);

        let converted = h
            .store
            .emergency_by_code(record.emergency_code.as_str())
            .unwrap()
            .unwrap();
        assert_eq!(converted.status, EmergencyStatus::Converted);
        assert_eq!(converted.linked_patient_id, Some(patient.id));
    }

    #[test]
    fn test_promote_without_name_uses_placeholder() {
        let h = harness();
        let record = h.intake.create(EmergencyIntake::default()).unwrap();

        let patient = h.engine.promote(record.emergency_code.as_str(), None).unwrap();

        assert_eq!(patient.full_name, UNKNOWN_PATIENT_NAME);
        assert_eq!(patient.intake_notes, None);
    }

    #[test]
    fn test_promote_into_existing_patient() {
        let h = harness();
        let existing = h
            .registration
            .register(NewPatient {
                full_name: NonEmptyText::new("Known Patient").unwrap(),
                date_of_birth: None,
                gender: None,
                phone: None,
                emergency_contact_name: None,
                emergency_contact_phone: None,
                insurance_info: None,
                owner_user_id: None,
            })
            .unwrap();
        let record = h.intake.create(full_intake()).unwrap();

        let linked = h
            .engine
            .promote(
                record.emergency_code.as_str(),
                Some(existing.patient_code.as_str()),
            )
            .unwrap();

        assert_eq!(linked.id, existing.id);
        let converted = h
            .store
            .emergency_by_code(record.emergency_code.as_str())
            .unwrap()
            .unwrap();
        assert_eq!(converted.linked_patient_id, Some(existing.id));
    }

    #[test]
    fn test_promote_missing_emergency_is_not_found() {
        let h = harness();
        let code = format!("EM-{}", Uuid::new_v4());
        assert!(matches!(
            h.engine.promote(&code, None),
            Err(CoreError::NotFound)
        ));
    }

    #[test]
    fn test_promote_missing_target_is_not_found() {
        let h = harness();
        let record = h.intake.create(EmergencyIntake::default()).unwrap();
        let err = h
            .engine
            .promote(record.emergency_code.as_str(), Some("PAT-99999"))
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound));

        // The failed attempt must not have consumed the record.
        let still_active = h
            .store
            .emergency_by_code(record.emergency_code.as_str())
            .unwrap()
            .unwrap();
        assert_eq!(still_active.status, EmergencyStatus::Active);
    }

    #[test]
    fn test_second_promotion_is_already_converted_with_link() {
        let h = harness();
        let record = h.intake.create(full_intake()).unwrap();

        let patient = h.engine.promote(record.emergency_code.as_str(), None).unwrap();
        let err = h
            .engine
            .promote(record.emergency_code.as_str(), None)
            .unwrap_err();

        match err {
            CoreError::AlreadyConverted { linked_patient } => {
                assert_eq!(linked_patient, Some(patient.id));
            }
            other => panic!("expected AlreadyConverted, got {other:?}"),
        }
    }

    #[test]
    fn test_resolving_after_promotion_redirects() {
        let h = harness();
        let record = h.intake.create(full_intake()).unwrap();
        let patient = h.engine.promote(record.emergency_code.as_str(), None).unwrap();

        match h.resolver.resolve(record.emergency_code.as_str()).unwrap() {
            Resolved::Emergency { record: r, redirect } => {
                assert_eq!(r.status, EmergencyStatus::Converted);
                assert_eq!(redirect.unwrap().id, patient.id);
            }
            other => panic!("expected emergency with redirect, got {other:?}"),
        }
    }

    #[test]
    fn test_concurrent_promotion_has_exactly_one_winner() {
        for _ in 0..16 {
            let h = harness();
            let record = h.intake.create(full_intake()).unwrap();
            let code = record.emergency_code.as_str().to_owned();

            let engines = [h.engine.clone(), h.engine.clone()];
            let results: Vec<_> = engines
                .into_iter()
                .map(|engine| {
                    let code = code.clone();
                    thread::spawn(move || engine.promote(&code, None))
                })
                .collect::<Vec<_>>()
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect();

            let winners = results.iter().filter(|r| r.is_ok()).count();
            let losers = results
                .iter()
                .filter(|r| matches!(r, Err(CoreError::AlreadyConverted { .. })))
                .count();
            assert_eq!(winners, 1, "exactly one promotion must win");
            assert_eq!(losers, 1, "the loser must observe AlreadyConverted");

            // Exactly one patient row exists for the emergency record.
            let converted = h.store.emergency_by_code(&code).unwrap().unwrap();
            let linked = converted.linked_patient_id.unwrap();
            assert!(h.store.patient_by_id(linked).unwrap().is_some());
            assert_eq!(h.store.patient_count(), 1);
        }
    }
}
