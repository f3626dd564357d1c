//! Request and response bodies for the REST API.
//!
//! These mirror the core record types field-for-field but stay separate from
//! them: the core knows nothing about OpenAPI schemas, and wire compatibility
//! should not constrain core refactors.

use medconnect_core::{
    EmergencyPatient, Patient, Resolved, ScanEvent, StaffIdentity, StaffRole, Visit, VisitStatus,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterPatientReq {
    pub full_name: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub insurance_info: Option<serde_json::Value>,
    pub owner_user_id: Option<Uuid>,
}

#[derive(Serialize, ToSchema)]
pub struct PatientRes {
    pub id: Uuid,
    pub patient_code: String,
    pub full_name: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub insurance_info: Option<serde_json::Value>,
    pub owner_user_id: Option<Uuid>,
    pub intake_notes: Option<String>,
    pub created_at: String,
}

impl From<Patient> for PatientRes {
    fn from(p: Patient) -> Self {
        Self {
            id: p.id,
            patient_code: p.patient_code.as_str().to_owned(),
            full_name: p.full_name,
            date_of_birth: p.date_of_birth.map(|d| d.to_string()),
            gender: p.gender,
            phone: p.phone,
            emergency_contact_name: p.emergency_contact_name,
            emergency_contact_phone: p.emergency_contact_phone,
            insurance_info: p.insurance_info,
            owner_user_id: p.owner_user_id,
            intake_notes: p.intake_notes,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct EmergencyIntakeReq {
    pub patient_name: Option<String>,
    pub estimated_age: Option<u32>,
    pub gender: Option<String>,
    pub condition_description: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub hospital_name: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmergencyRes {
    pub id: Uuid,
    pub emergency_code: String,
    pub patient_name: Option<String>,
    pub estimated_age: Option<u32>,
    pub gender: Option<String>,
    pub condition_description: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub hospital_name: Option<String>,
    pub status: String,
    pub linked_patient_id: Option<Uuid>,
    pub created_at: String,
}

impl From<EmergencyPatient> for EmergencyRes {
    fn from(r: EmergencyPatient) -> Self {
        Self {
            id: r.id,
            emergency_code: r.emergency_code.as_str().to_owned(),
            patient_name: r.patient_name,
            estimated_age: r.estimated_age,
            gender: r.gender,
            condition_description: r.condition_description,
            allergies: r.allergies,
            medications: r.medications,
            emergency_contact_phone: r.emergency_contact_phone,
            hospital_name: r.hospital_name,
            status: match r.status {
                medconnect_core::EmergencyStatus::Active => "active".into(),
                medconnect_core::EmergencyStatus::Converted => "converted".into(),
            },
            linked_patient_id: r.linked_patient_id,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct EmergencyListRes {
    pub emergencies: Vec<EmergencyRes>,
}

#[derive(Deserialize, ToSchema)]
pub struct ScheduleVisitReq {
    pub patient_code: String,
    pub hospital_id: Uuid,
    pub visit_reason: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct VisitRes {
    pub id: Uuid,
    pub visit_code: String,
    pub patient_id: Uuid,
    pub hospital_id: Uuid,
    pub visit_reason: Option<String>,
    pub doctor_notes: Option<String>,
    pub staff_id: Option<Uuid>,
    pub status: String,
    pub visit_date: String,
}

impl From<Visit> for VisitRes {
    fn from(v: Visit) -> Self {
        Self {
            id: v.id,
            visit_code: v.visit_code.as_str().to_owned(),
            patient_id: v.patient_id,
            hospital_id: v.hospital_id,
            visit_reason: v.visit_reason,
            doctor_notes: v.doctor_notes,
            staff_id: v.staff_id,
            status: match v.status {
                VisitStatus::Scheduled => "scheduled".into(),
                VisitStatus::Completed => "completed".into(),
            },
            visit_date: v.visit_date.to_rfc3339(),
        }
    }
}

/// Staff identity as supplied by the authentication collaborator.
#[derive(Clone, Deserialize, ToSchema)]
pub struct StaffDto {
    pub user_id: Uuid,
    pub hospital_id: Uuid,
    /// One of: doctor, nurse, paramedic, technician, admin.
    pub role: String,
    pub is_active: bool,
}

impl StaffDto {
    pub fn into_identity(self) -> Result<StaffIdentity, String> {
        let role = match self.role.as_str() {
            "doctor" => StaffRole::Doctor,
            "nurse" => StaffRole::Nurse,
            "paramedic" => StaffRole::Paramedic,
            "technician" => StaffRole::Technician,
            "admin" => StaffRole::Admin,
            other => return Err(format!("unknown staff role '{other}'")),
        };
        Ok(StaffIdentity {
            user_id: self.user_id,
            hospital_id: self.hospital_id,
            role,
            is_active: self.is_active,
        })
    }
}

#[derive(Deserialize, ToSchema)]
pub struct StaffLookupReq {
    pub staff: StaffDto,
    /// Raw code as scanned or typed; may omit its prefix.
    pub code: String,
    /// "read" or "write".
    pub intent: String,
}

/// The resolved identity, normalized across record kinds.
///
/// Exactly one of `patient`, `emergency`, `visit` is set, matching `kind`.
#[derive(Serialize, ToSchema)]
pub struct ResolvedRes {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<PatientRes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency: Option<EmergencyRes>,
    /// The promoted patient a converted emergency record points at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<PatientRes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit: Option<VisitRes>,
}

impl From<Resolved> for ResolvedRes {
    fn from(resolved: Resolved) -> Self {
        match resolved {
            Resolved::Patient(p) => Self {
                kind: "patient".into(),
                patient: Some(p.into()),
                emergency: None,
                redirect: None,
                visit: None,
            },
            Resolved::Emergency { record, redirect } => Self {
                kind: "emergency".into(),
                patient: None,
                emergency: Some(record.into()),
                redirect: redirect.map(Into::into),
                visit: None,
            },
            Resolved::Visit(v) => Self {
                kind: "visit".into(),
                patient: None,
                emergency: None,
                redirect: None,
                visit: Some(v.into()),
            },
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct StaffLookupRes {
    /// Id of the audit row covering this access.
    pub scan_id: Uuid,
    pub target: ResolvedRes,
}

#[derive(Deserialize, ToSchema)]
pub struct PromoteReq {
    /// Existing patient to link; omit to create a new patient from the
    /// emergency record's fields.
    pub target_patient_code: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CompleteVisitReq {
    pub staff: StaffDto,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RecordScanReq {
    pub staff_id: Uuid,
    /// One of: qr_scan, manual_search, name_search.
    pub scan_type: String,
    pub scan_data: String,
}

#[derive(Serialize, ToSchema)]
pub struct ScanRes {
    pub id: Uuid,
    pub scanned_at: String,
}

impl From<ScanEvent> for ScanRes {
    fn from(event: ScanEvent) -> Self {
        Self {
            id: event.id,
            scanned_at: event.scanned_at.to_rfc3339(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct GenerateCodeReq {
    /// One of: patient, emergency, visit.
    pub kind: String,
}

#[derive(Serialize, ToSchema)]
pub struct GenerateCodeRes {
    pub code: String,
}
