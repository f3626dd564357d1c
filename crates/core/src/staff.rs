//! Staff identity as supplied by the authentication collaborator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Professional role of a staff member.
///
/// Roles are carried for audit and display. The access policy deliberately
/// does not branch on them for reads: any active staff member may read any
/// resolved record, because emergency care cannot wait for a role lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Doctor,
    Nurse,
    Paramedic,
    Technician,
    Admin,
}

/// The identity of the staff member performing a request.
///
/// Issued by the external authentication collaborator and passed explicitly
/// into every Access Gate call; the core never creates, mutates, or caches
/// one. There is no ambient "current session" anywhere in this crate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaffIdentity {
    pub user_id: Uuid,
    pub hospital_id: Uuid,
    pub role: StaffRole,
    pub is_active: bool,
}
