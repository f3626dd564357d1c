//! Shared test doubles.

use crate::store::{ConditionalOutcome, MemoryStore, RecordStore, StoreError, StoreResult};
use crate::{EmergencyPatient, Patient, ScanEvent, Visit};
use uuid::Uuid;

/// Store double that behaves like [`MemoryStore`] except that every ledger
/// append fails, for exercising the fail-closed audit path.
#[derive(Default)]
pub(crate) struct NoLedgerStore(pub MemoryStore);

impl RecordStore for NoLedgerStore {
    fn insert_patient(&self, patient: &Patient) -> StoreResult<()> {
        self.0.insert_patient(patient)
    }
    fn patient_by_code(&self, code: &str) -> StoreResult<Option<Patient>> {
        self.0.patient_by_code(code)
    }
    fn patient_by_id(&self, id: Uuid) -> StoreResult<Option<Patient>> {
        self.0.patient_by_id(id)
    }
    fn insert_emergency(&self, record: &EmergencyPatient) -> StoreResult<()> {
        self.0.insert_emergency(record)
    }
    fn emergency_by_code(&self, code: &str) -> StoreResult<Option<EmergencyPatient>> {
        self.0.emergency_by_code(code)
    }
    fn active_emergencies(&self) -> StoreResult<Vec<EmergencyPatient>> {
        self.0.active_emergencies()
    }
    fn convert_emergency(&self, code: &str, patient_id: Uuid) -> StoreResult<ConditionalOutcome> {
        self.0.convert_emergency(code, patient_id)
    }
    fn insert_visit(&self, visit: &Visit) -> StoreResult<()> {
        self.0.insert_visit(visit)
    }
    fn visit_by_code(&self, code: &str) -> StoreResult<Option<Visit>> {
        self.0.visit_by_code(code)
    }
    fn complete_visit(
        &self,
        code: &str,
        staff_id: Uuid,
        notes: Option<String>,
    ) -> StoreResult<ConditionalOutcome> {
        self.0.complete_visit(code, staff_id, notes)
    }
    fn append_scan(&self, _event: &ScanEvent) -> StoreResult<()> {
        Err(StoreError::Unavailable("ledger write refused".into()))
    }
}

/// Store double whose patient inserts report a uniqueness conflict a fixed
/// number of times before succeeding, for exercising corrective retry loops.
pub(crate) struct ConflictingStore {
    pub inner: MemoryStore,
    conflicts_left: std::sync::Mutex<u32>,
}

impl ConflictingStore {
    pub fn conflicting(n: u32) -> Self {
        Self {
            inner: MemoryStore::default(),
            conflicts_left: std::sync::Mutex::new(n),
        }
    }
}

impl RecordStore for ConflictingStore {
    fn insert_patient(&self, patient: &Patient) -> StoreResult<()> {
        let mut left = self.conflicts_left.lock().expect("test mutex");
        if *left > 0 {
            *left -= 1;
            return Err(StoreError::Conflict);
        }
        self.inner.insert_patient(patient)
    }
    fn patient_by_code(&self, code: &str) -> StoreResult<Option<Patient>> {
        self.inner.patient_by_code(code)
    }
    fn patient_by_id(&self, id: Uuid) -> StoreResult<Option<Patient>> {
        self.inner.patient_by_id(id)
    }
    fn insert_emergency(&self, record: &EmergencyPatient) -> StoreResult<()> {
        self.inner.insert_emergency(record)
    }
    fn emergency_by_code(&self, code: &str) -> StoreResult<Option<EmergencyPatient>> {
        self.inner.emergency_by_code(code)
    }
    fn active_emergencies(&self) -> StoreResult<Vec<EmergencyPatient>> {
        self.inner.active_emergencies()
    }
    fn convert_emergency(&self, code: &str, patient_id: Uuid) -> StoreResult<ConditionalOutcome> {
        self.inner.convert_emergency(code, patient_id)
    }
    fn insert_visit(&self, visit: &Visit) -> StoreResult<()> {
        self.inner.insert_visit(visit)
    }
    fn visit_by_code(&self, code: &str) -> StoreResult<Option<Visit>> {
        self.inner.visit_by_code(code)
    }
    fn complete_visit(
        &self,
        code: &str,
        staff_id: Uuid,
        notes: Option<String>,
    ) -> StoreResult<ConditionalOutcome> {
        self.inner.complete_visit(code, staff_id, notes)
    }
    fn append_scan(&self, event: &ScanEvent) -> StoreResult<()> {
        self.inner.append_scan(event)
    }
}
