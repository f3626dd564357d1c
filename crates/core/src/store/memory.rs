//! In-process reference store adapter.
//!
//! Backs development servers and the test suite. One mutex over the tables
//! stands in for the durable store's transactional machinery: inside the
//! guard, check-then-write is atomic, which is exactly the contract the
//! conditional updates need. The core itself never takes a lock; everything
//! here is the *store's* exclusivity primitive, behind the trait.

use crate::store::{ConditionalOutcome, RecordStore, StoreError, StoreResult};
use crate::{EmergencyPatient, EmergencyStatus, Patient, ScanEvent, Visit, VisitStatus};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    /// Patients keyed by their full code string.
    patients: HashMap<String, Patient>,
    /// Emergency records keyed by their full code string.
    emergencies: HashMap<String, EmergencyPatient>,
    /// Visits keyed by their full code string.
    visits: HashMap<String, Visit>,
    /// Append-only scan log.
    scans: Vec<ScanEvent>,
}

/// An in-memory [`RecordStore`].
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".into()))
    }

    /// Snapshot of the scan log, for audit assertions in tests and tooling.
    pub fn scan_events(&self) -> Vec<ScanEvent> {
        self.tables
            .lock()
            .map(|t| t.scans.clone())
            .unwrap_or_default()
    }

    /// Number of patient rows held.
    pub fn patient_count(&self) -> usize {
        self.tables.lock().map(|t| t.patients.len()).unwrap_or(0)
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Keys an existing patient row under an arbitrary raw string, simulating
    /// legacy rows whose codes predate the prefixed formats. Test-only.
    pub(crate) fn raw_alias_patient(&self, raw: &str, patient: &Patient) {
        self.tables
            .lock()
            .expect("test mutex")
            .patients
            .insert(raw.to_owned(), patient.clone());
    }

    /// Same as [`raw_alias_patient`](Self::raw_alias_patient), for emergency rows.
    pub(crate) fn raw_alias_emergency(&self, raw: &str, record: &EmergencyPatient) {
        self.tables
            .lock()
            .expect("test mutex")
            .emergencies
            .insert(raw.to_owned(), record.clone());
    }
}

impl RecordStore for MemoryStore {
    fn insert_patient(&self, patient: &Patient) -> StoreResult<()> {
        let mut tables = self.tables()?;
        let key = patient.patient_code.as_str();
        if tables.patients.contains_key(key) {
            return Err(StoreError::Conflict);
        }
        tables.patients.insert(key.to_owned(), patient.clone());
        Ok(())
    }

    fn patient_by_code(&self, code: &str) -> StoreResult<Option<Patient>> {
        Ok(self.tables()?.patients.get(code).cloned())
    }

    fn patient_by_id(&self, id: Uuid) -> StoreResult<Option<Patient>> {
        Ok(self
            .tables()?
            .patients
            .values()
            .find(|p| p.id == id)
            .cloned())
    }

    fn insert_emergency(&self, record: &EmergencyPatient) -> StoreResult<()> {
        let mut tables = self.tables()?;
        let key = record.emergency_code.as_str();
        if tables.emergencies.contains_key(key) {
            return Err(StoreError::Conflict);
        }
        tables.emergencies.insert(key.to_owned(), record.clone());
        Ok(())
    }

    fn emergency_by_code(&self, code: &str) -> StoreResult<Option<EmergencyPatient>> {
        Ok(self.tables()?.emergencies.get(code).cloned())
    }

    fn active_emergencies(&self) -> StoreResult<Vec<EmergencyPatient>> {
        let tables = self.tables()?;
        let mut active: Vec<EmergencyPatient> = tables
            .emergencies
            .values()
            .filter(|r| r.status == EmergencyStatus::Active)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(active)
    }

    fn convert_emergency(&self, code: &str, patient_id: Uuid) -> StoreResult<ConditionalOutcome> {
        let mut tables = self.tables()?;
        let Some(record) = tables.emergencies.get_mut(code) else {
            return Ok(ConditionalOutcome::PreconditionFailed);
        };
        if record.status != EmergencyStatus::Active {
            return Ok(ConditionalOutcome::PreconditionFailed);
        }
        record.status = EmergencyStatus::Converted;
        record.linked_patient_id = Some(patient_id);
        Ok(ConditionalOutcome::Updated)
    }

    fn insert_visit(&self, visit: &Visit) -> StoreResult<()> {
        let mut tables = self.tables()?;
        let key = visit.visit_code.as_str();
        if tables.visits.contains_key(key) {
            return Err(StoreError::Conflict);
        }
        tables.visits.insert(key.to_owned(), visit.clone());
        Ok(())
    }

    fn visit_by_code(&self, code: &str) -> StoreResult<Option<Visit>> {
        Ok(self.tables()?.visits.get(code).cloned())
    }

    fn complete_visit(
        &self,
        code: &str,
        staff_id: Uuid,
        notes: Option<String>,
    ) -> StoreResult<ConditionalOutcome> {
        let mut tables = self.tables()?;
        let Some(visit) = tables.visits.get_mut(code) else {
            return Ok(ConditionalOutcome::PreconditionFailed);
        };
        if visit.status != VisitStatus::Scheduled {
            return Ok(ConditionalOutcome::PreconditionFailed);
        }
        visit.status = VisitStatus::Completed;
        visit.staff_id = Some(staff_id);
        visit.doctor_notes = notes;
        Ok(ConditionalOutcome::Updated)
    }

    fn append_scan(&self, event: &ScanEvent) -> StoreResult<()> {
        self.tables()?.scans.push(event.clone());
        Ok(())
    }
}
