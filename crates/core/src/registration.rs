//! Patient registration.

use crate::codegen::CodeIssuer;
use crate::error::{CoreError, CoreResult};
use crate::patient::{NewPatient, Patient};
use crate::store::{RecordStore, StoreError};
use std::sync::Arc;

/// Registers durable patient records.
#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn RecordStore>,
    issuer: CodeIssuer,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn RecordStore>, issuer: CodeIssuer) -> Self {
        Self { store, issuer }
    }

    /// Registers a new patient under a freshly allocated `PAT-` code.
    ///
    /// Code allocation pre-checks uniqueness against the store, but another
    /// service instance can win the same code between check and insert; the
    /// store reports that as a conflict and the registration retries with a
    /// fresh code, bounded by the configured cap.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::GenerationExhausted`] if the cap is hit, or
    /// [`CoreError::StoreUnavailable`] on store failure.
    pub fn register(&self, input: NewPatient) -> CoreResult<Patient> {
        let cap = self.issuer.retry_cap();
        for _ in 0..cap {
            let patient =
                Patient::from_registration(input.clone(), self.issuer.issue_patient_code()?);
            match self.store.insert_patient(&patient) {
                Ok(()) => {
                    tracing::info!(code = %patient.patient_code, "patient registered");
                    return Ok(patient);
                }
                Err(StoreError::Conflict) => {
                    tracing::warn!(
                        code = %patient.patient_code,
                        "patient code conflicted on insert, retrying"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(CoreError::GenerationExhausted(cap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::store::MemoryStore;
    use crate::testutil::ConflictingStore;
    use medconnect_codes::PatientCode;
    use medconnect_types::NonEmptyText;
    use std::collections::HashSet;
    use std::thread;

    fn new_patient(name: &str) -> NewPatient {
        NewPatient {
            full_name: NonEmptyText::new(name).unwrap(),
            date_of_birth: None,
            gender: None,
            phone: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            insurance_info: None,
            owner_user_id: None,
        }
    }

    fn service_over(store: Arc<dyn RecordStore>, cap: u32) -> RegistrationService {
        let cfg = CoreConfig::new(cap).unwrap();
        let issuer = CodeIssuer::new(store.clone(), &cfg);
        RegistrationService::new(store, issuer)
    }

    #[test]
    fn test_register_allocates_wellformed_code() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::default());
        let service = service_over(store, 16);

        let patient = service.register(new_patient("Ada Lovelace")).unwrap();

        assert!(PatientCode::parse(patient.patient_code.as_str()).is_ok());
        assert_eq!(patient.full_name, "Ada Lovelace");
    }

    #[test]
    fn test_concurrent_registrations_get_distinct_codes() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::default());
        let service = service_over(store, 64);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let service = service.clone();
                thread::spawn(move || {
                    (0..25)
                        .map(|i| {
                            service
                                .register(new_patient(&format!("Patient {t}-{i}")))
                                .unwrap()
                                .patient_code
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for code in handle.join().unwrap() {
                assert!(
                    seen.insert(code.as_str().to_owned()),
                    "duplicate patient code issued"
                );
            }
        }
        assert_eq!(seen.len(), 200);
    }

    #[test]
    fn test_bounded_conflicts_are_corrected() {
        let store = Arc::new(ConflictingStore::conflicting(3));
        let service = service_over(store, 8);

        let patient = service.register(new_patient("Eventually Stored")).unwrap();
        assert!(PatientCode::parse(patient.patient_code.as_str()).is_ok());
    }

    #[test]
    fn test_persistent_conflicts_exhaust_generation() {
        let store = Arc::new(ConflictingStore::conflicting(u32::MAX));
        let service = service_over(store, 4);

        let err = service.register(new_patient("Never Stored")).unwrap_err();
        assert!(matches!(err, CoreError::GenerationExhausted(4)));
    }
}
