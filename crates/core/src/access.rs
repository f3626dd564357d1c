//! The Access Gate: role-gated, audited record access.
//!
//! Every staff read or write enters here with an explicit [`StaffIdentity`]
//! and a raw code. The gate appends exactly one scan ledger row per call,
//! whether it succeeds or not, *before* any result is returned, so the
//! audit trail captures denied attempts as well as granted ones. If that
//! append fails, the whole call fails closed: no audit, no access.
//!
//! ## Policy
//!
//! - Inactive staff are always denied, regardless of role.
//! - Any active staff member may read any resolved record. Broad read access
//!   is a documented clinical policy choice: in an emergency the treating
//!   staff cannot wait on a role review.
//! - Writes require the staff member's hospital to match the target's
//!   hospital context where one exists (a visit's `hospital_id`). Records
//!   with no hospital association yet (an emergency record pending its first
//!   visit, say) are writable by any active staff.

use crate::error::{CoreError, CoreResult};
use crate::ledger::{ScanLedger, ScanType};
use crate::resolver::{Resolved, Resolver};
use crate::staff::StaffIdentity;
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// What the caller wants to do with the resolved record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Read,
    Write,
}

/// A granted access: the resolved target plus the audit row that covers it.
#[derive(Clone, Debug)]
pub struct AuthorizedView {
    pub staff_user_id: Uuid,
    pub intent: Intent,
    pub target: Resolved,
    /// Id of the scan event appended for this call.
    pub scan_id: Uuid,
}

/// Decides whether a staff access is permitted, leaving an audit row either way.
#[derive(Clone)]
pub struct AccessGate {
    resolver: Resolver,
    ledger: ScanLedger,
}

impl AccessGate {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            resolver: Resolver::new(store.clone()),
            ledger: ScanLedger::new(store),
        }
    }

    /// Authorizes one read or write against the record a raw code addresses.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Denied`] for inactive staff, hospital mismatch on a
    ///   write, or an unwritable audit ledger (fail-closed).
    /// - [`CoreError::NotFound`] when the code resolves to nothing. This is
    ///   a different kind from `Denied`, so the UI can tell "no such patient"
    ///   from "you are not permitted".
    /// - [`CoreError::StoreUnavailable`] if resolution itself fails.
    pub fn authorize(
        &self,
        staff: &StaffIdentity,
        raw_code: &str,
        intent: Intent,
    ) -> CoreResult<AuthorizedView> {
        let scan_type = match intent {
            Intent::Read => ScanType::CodeLookup,
            Intent::Write => ScanType::RecordWrite,
        };
        let scan = match self.ledger.record(staff.user_id, scan_type, raw_code) {
            Ok(scan) => scan,
            Err(err) => {
                tracing::error!(staff = %staff.user_id, %err, "audit append failed, denying access");
                return Err(CoreError::Denied("audit trail unavailable".into()));
            }
        };

        if !staff.is_active {
            tracing::warn!(staff = %staff.user_id, "denied: staff identity inactive");
            return Err(CoreError::Denied("staff identity is inactive".into()));
        }

        let target = self.resolver.resolve(raw_code)?;

        if intent == Intent::Write {
            if let Resolved::Visit(visit) = &target {
                if visit.hospital_id != staff.hospital_id {
                    tracing::warn!(
                        staff = %staff.user_id,
                        visit = %visit.visit_code,
                        "denied: visit belongs to a different hospital"
                    );
                    return Err(CoreError::Denied(
                        "visit belongs to a different hospital".into(),
                    ));
                }
            }
        }

        Ok(AuthorizedView {
            staff_user_id: staff.user_id,
            intent,
            target,
            scan_id: scan.id,
        })
    }
}
