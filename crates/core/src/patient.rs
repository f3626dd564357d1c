//! Registered patient records.

use chrono::{DateTime, NaiveDate, Utc};
use medconnect_codes::PatientCode;
use medconnect_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A durably registered patient.
///
/// `patient_code` is the external handle: stable, globally unique, immutable
/// once assigned and never reused, even if the record is later retired. The
/// `id` is the store key and never leaves the service boundary in QR form.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub patient_code: PatientCode,
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    /// Opaque structured payload; the core never looks inside.
    pub insurance_info: Option<serde_json::Value>,
    /// The authenticated end-user who controls this profile. Empty for
    /// records created by promotion until the person claims them.
    pub owner_user_id: Option<Uuid>,
    /// Free-text notes carried over from an emergency record at promotion.
    pub intake_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a new patient.
#[derive(Clone, Debug, Deserialize)]
pub struct NewPatient {
    pub full_name: NonEmptyText,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub insurance_info: Option<serde_json::Value>,
    pub owner_user_id: Option<Uuid>,
}

impl Patient {
    /// Builds a patient record from registration input and a freshly
    /// allocated code.
    pub fn from_registration(input: NewPatient, patient_code: PatientCode) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            patient_code,
            full_name: input.full_name.into_inner(),
            date_of_birth: input.date_of_birth,
            gender: input.gender,
            phone: input.phone,
            emergency_contact_name: input.emergency_contact_name,
            emergency_contact_phone: input.emergency_contact_phone,
            insurance_info: input.insurance_info,
            owner_user_id: input.owner_user_id,
            intake_notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}
