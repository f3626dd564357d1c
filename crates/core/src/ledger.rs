//! Append-only scan ledger.
//!
//! Every resolution attempt against the store, successful or not, leaves
//! exactly one row here, attributed to the staff member and the raw input
//! they used. Rows are never updated or deleted by this core; retention is
//! compliance tooling's problem.

use crate::error::CoreResult;
use crate::store::RecordStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// How a lookup reached the system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanType {
    /// A camera scan of a code image.
    QrScan,
    /// A code typed in by hand.
    ManualSearch,
    /// A free-text name search.
    NameSearch,
    /// An Access Gate read attempt.
    CodeLookup,
    /// An Access Gate write attempt.
    RecordWrite,
}

/// One immutable scan/lookup event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanEvent {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub scan_type: ScanType,
    /// The raw code or search term as entered, trimmed.
    pub scan_data: String,
    pub scanned_at: DateTime<Utc>,
}

/// Appends scan events to the store.
#[derive(Clone)]
pub struct ScanLedger {
    store: Arc<dyn RecordStore>,
}

impl ScanLedger {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Appends one event and returns it.
    ///
    /// A store failure here is surfaced, never swallowed: the Access Gate
    /// relies on this to fail closed when the audit trail cannot be written.
    pub fn record(
        &self,
        staff_id: Uuid,
        scan_type: ScanType,
        scan_data: &str,
    ) -> CoreResult<ScanEvent> {
        let event = ScanEvent {
            id: Uuid::new_v4(),
            staff_id,
            scan_type,
            scan_data: scan_data.trim().to_owned(),
            scanned_at: Utc::now(),
        };
        self.store.append_scan(&event)?;
        tracing::debug!(staff = %staff_id, scan_type = ?scan_type, "scan event recorded");
        Ok(event)
    }
}
