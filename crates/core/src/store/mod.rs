//! Record store adapter boundary.
//!
//! The core talks to durable storage exclusively through [`RecordStore`]: typed
//! inserts, fetches by code, two conditional updates, and an append-only scan
//! log. Everything behind the trait, from transport to replication, is a
//! collaborator concern.
//!
//! The trait is deliberately narrow. All exclusivity the core relies on
//! (unique codes, single promotion, single visit completion) is expressed as
//! insert-conflict and compare-and-swap semantics *inside* the store, because
//! multiple service instances may run against the same store concurrently and
//! an in-process lock would protect nothing.

mod memory;

pub use memory::MemoryStore;

use crate::{EmergencyPatient, Patient, ScanEvent, Visit};
use uuid::Uuid;

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An insert violated a uniqueness constraint (duplicate code).
    #[error("record conflicts with an existing one")]
    Conflict,
    /// The store could not be reached or failed mid-operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Outcome of a conditional update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConditionalOutcome {
    /// The expected state held and the new fields were written.
    Updated,
    /// The record was not in the expected state; nothing was written.
    PreconditionFailed,
}

/// Typed CRUD façade over the durable record store.
///
/// Implementations must guarantee:
///
/// - inserts are atomic and return [`StoreError::Conflict`] when the record's
///   code is already present (codes are unique across all time; a retired
///   record still occupies its code);
/// - the conditional updates ([`convert_emergency`](RecordStore::convert_emergency),
///   [`complete_visit`](RecordStore::complete_visit)) are single atomic
///   compare-and-swap writes with exactly-one-winner semantics under
///   concurrency;
/// - [`append_scan`](RecordStore::append_scan) either durably appends or
///   errors; it never silently drops an event.
pub trait RecordStore: Send + Sync {
    fn insert_patient(&self, patient: &Patient) -> StoreResult<()>;
    fn patient_by_code(&self, code: &str) -> StoreResult<Option<Patient>>;
    fn patient_by_id(&self, id: Uuid) -> StoreResult<Option<Patient>>;

    fn insert_emergency(&self, record: &EmergencyPatient) -> StoreResult<()>;
    fn emergency_by_code(&self, code: &str) -> StoreResult<Option<EmergencyPatient>>;
    /// Lists emergency records still awaiting conversion, newest first.
    fn active_emergencies(&self) -> StoreResult<Vec<EmergencyPatient>>;
    /// Atomically flips an emergency record from `active` to `converted` and
    /// writes the back-link to `patient_id`, keyed on the record still being
    /// `active`. Both fields land in the same write or not at all.
    fn convert_emergency(&self, code: &str, patient_id: Uuid) -> StoreResult<ConditionalOutcome>;

    fn insert_visit(&self, visit: &Visit) -> StoreResult<()>;
    fn visit_by_code(&self, code: &str) -> StoreResult<Option<Visit>>;
    /// Atomically completes a visit, keyed on it still being `scheduled`:
    /// records the doctor notes, the completing staff id and the `completed`
    /// status in one write.
    fn complete_visit(
        &self,
        code: &str,
        staff_id: Uuid,
        notes: Option<String>,
    ) -> StoreResult<ConditionalOutcome>;

    /// Appends one immutable scan event. There is no update or delete.
    fn append_scan(&self, event: &ScanEvent) -> StoreResult<()>;
}
