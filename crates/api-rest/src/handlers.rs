//! REST request handlers.

use crate::dto::*;
use crate::AppState;
use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use medconnect_core::{
    CodeKind, CoreError, EmergencyIntake, Intent, NewPatient, NonEmptyText, ScanType,
};

/// Maps a core error to a response, preserving the error taxonomy: "no such
/// record" (404) is distinct from "you are not permitted" (403), and a
/// re-promoted record (409) tells the caller where the live profile is.
fn error_response(err: CoreError) -> (StatusCode, String) {
    match &err {
        CoreError::NotFound => (StatusCode::NOT_FOUND, "no matching record".into()),
        CoreError::Denied(reason) => (StatusCode::FORBIDDEN, format!("access denied: {reason}")),
        CoreError::AlreadyConverted { linked_patient } => (
            StatusCode::CONFLICT,
            match linked_patient {
                Some(id) => format!("emergency record already converted; linked patient {id}"),
                None => "emergency record already converted".into(),
            },
        ),
        CoreError::VisitClosed => (StatusCode::CONFLICT, "visit is already completed".into()),
        CoreError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, format!("invalid input: {msg}")),
        CoreError::GenerationExhausted(_) => {
            tracing::error!(%err, "code allocation exhausted");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "could not allocate a unique code".into(),
            )
        }
        CoreError::StoreUnavailable(_) => {
            tracing::error!(%err, "record store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "record store unavailable".into(),
            )
        }
    }
}

fn bad_request(msg: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, msg.into())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint used by monitoring and load balancers.
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "MedConnect REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = RegisterPatientReq,
    responses(
        (status = 201, description = "Patient registered", body = PatientRes),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error"),
        (status = 503, description = "Store unavailable")
    )
)]
/// Register a new patient.
///
/// Allocates a fresh `PAT-` code and stores the profile. The code in the
/// response is the payload to hand to the QR renderer.
#[axum::debug_handler]
pub async fn register_patient(
    State(state): State<AppState>,
    Json(req): Json<RegisterPatientReq>,
) -> Result<(StatusCode, Json<PatientRes>), (StatusCode, String)> {
    let full_name = NonEmptyText::new(&req.full_name)
        .map_err(|_| bad_request("full_name must not be empty"))?;
    let date_of_birth = req
        .date_of_birth
        .as_deref()
        .map(|d| d.parse::<NaiveDate>())
        .transpose()
        .map_err(|e| bad_request(format!("invalid date_of_birth: {e}")))?;

    let input = NewPatient {
        full_name,
        date_of_birth,
        gender: req.gender,
        phone: req.phone,
        emergency_contact_name: req.emergency_contact_name,
        emergency_contact_phone: req.emergency_contact_phone,
        insurance_info: req.insurance_info,
        owner_user_id: req.owner_user_id,
    };
    match state.registration.register(input) {
        Ok(patient) => Ok((StatusCode::CREATED, Json(patient.into()))),
        Err(err) => Err(error_response(err)),
    }
}

#[utoipa::path(
    post,
    path = "/emergency",
    request_body = EmergencyIntakeReq,
    responses(
        (status = 201, description = "Emergency record created", body = EmergencyRes),
        (status = 400, description = "Bad request"),
        (status = 503, description = "Store unavailable")
    )
)]
/// Unauthenticated emergency intake.
///
/// Every field is optional; intake happens under the worst possible
/// conditions. The returned `EM-` code addresses the record until promotion.
#[axum::debug_handler]
pub async fn emergency_intake(
    State(state): State<AppState>,
    Json(req): Json<EmergencyIntakeReq>,
) -> Result<(StatusCode, Json<EmergencyRes>), (StatusCode, String)> {
    let intake = EmergencyIntake {
        patient_name: req
            .patient_name
            .as_deref()
            .map(NonEmptyText::new)
            .transpose()
            .map_err(|_| bad_request("patient_name must not be blank when supplied"))?,
        estimated_age: req.estimated_age,
        gender: req.gender,
        condition_description: clinical_text(req.condition_description, "condition_description")?,
        allergies: clinical_text(req.allergies, "allergies")?,
        medications: clinical_text(req.medications, "medications")?,
        emergency_contact_phone: req.emergency_contact_phone,
        hospital_name: req.hospital_name,
    };
    match state.intake.create(intake) {
        Ok(record) => Ok((StatusCode::CREATED, Json(record.into()))),
        Err(err) => Err(error_response(err)),
    }
}

fn clinical_text(
    value: Option<String>,
    field: &str,
) -> Result<Option<medconnect_core::ClinicalText>, (StatusCode, String)> {
    value
        .as_deref()
        .map(medconnect_core::ClinicalText::new)
        .transpose()
        .map_err(|e| bad_request(format!("invalid {field}: {e}")))
}

#[utoipa::path(
    get,
    path = "/emergency/active",
    responses(
        (status = 200, description = "Active emergency records", body = EmergencyListRes),
        (status = 503, description = "Store unavailable")
    )
)]
/// List emergency records still awaiting conversion, newest first.
#[axum::debug_handler]
pub async fn list_active_emergencies(
    State(state): State<AppState>,
) -> Result<Json<EmergencyListRes>, (StatusCode, String)> {
    match state.intake.list_active() {
        Ok(records) => Ok(Json(EmergencyListRes {
            emergencies: records.into_iter().map(Into::into).collect(),
        })),
        Err(err) => Err(error_response(err)),
    }
}

#[utoipa::path(
    post,
    path = "/visits",
    request_body = ScheduleVisitReq,
    responses(
        (status = 201, description = "Visit scheduled", body = VisitRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Patient not found"),
        (status = 503, description = "Store unavailable")
    )
)]
/// Schedule a visit for an existing patient, allocating its single-use code.
#[axum::debug_handler]
pub async fn schedule_visit(
    State(state): State<AppState>,
    Json(req): Json<ScheduleVisitReq>,
) -> Result<(StatusCode, Json<VisitRes>), (StatusCode, String)> {
    let visit_reason = req
        .visit_reason
        .as_deref()
        .map(NonEmptyText::new)
        .transpose()
        .map_err(|_| bad_request("visit_reason must not be blank when supplied"))?;

    match state
        .visits
        .schedule(&req.patient_code, req.hospital_id, visit_reason)
    {
        Ok(visit) => Ok((StatusCode::CREATED, Json(visit.into()))),
        Err(err) => Err(error_response(err)),
    }
}

#[utoipa::path(
    post,
    path = "/staff/lookup",
    request_body = StaffLookupReq,
    responses(
        (status = 200, description = "Access granted", body = StaffLookupRes),
        (status = 400, description = "Bad request"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "No matching record"),
        (status = 503, description = "Store unavailable")
    )
)]
/// Resolve a code and authorize staff access to it.
///
/// Every call, whether it is granted or not, appends exactly one scan ledger
/// row before the result is returned; if the ledger cannot be written the
/// call is denied.
#[axum::debug_handler]
pub async fn staff_lookup(
    State(state): State<AppState>,
    Json(req): Json<StaffLookupReq>,
) -> Result<Json<StaffLookupRes>, (StatusCode, String)> {
    let staff = req.staff.into_identity().map_err(bad_request)?;
    let intent = match req.intent.as_str() {
        "read" => Intent::Read,
        "write" => Intent::Write,
        other => return Err(bad_request(format!("unknown intent '{other}'"))),
    };

    match state.gate.authorize(&staff, &req.code, intent) {
        Ok(view) => Ok(Json(StaffLookupRes {
            scan_id: view.scan_id,
            target: view.target.into(),
        })),
        Err(err) => Err(error_response(err)),
    }
}

#[utoipa::path(
    post,
    path = "/emergency/{code}/promote",
    request_body = PromoteReq,
    responses(
        (status = 200, description = "Promoted; the linked or created patient", body = PatientRes),
        (status = 404, description = "No matching record"),
        (status = 409, description = "Already converted"),
        (status = 503, description = "Store unavailable")
    )
)]
/// Promote an emergency record into a permanent patient record.
///
/// A repeated promotion returns 409 with the linked patient id in the
/// message; callers should treat that as success-equivalent.
#[axum::debug_handler]
pub async fn promote_emergency(
    State(state): State<AppState>,
    AxumPath(code): AxumPath<String>,
    Json(req): Json<PromoteReq>,
) -> Result<Json<PatientRes>, (StatusCode, String)> {
    match state
        .promotion
        .promote(&code, req.target_patient_code.as_deref())
    {
        Ok(patient) => Ok(Json(patient.into())),
        Err(err) => Err(error_response(err)),
    }
}

#[utoipa::path(
    post,
    path = "/visits/{code}/notes",
    request_body = CompleteVisitReq,
    responses(
        (status = 200, description = "Visit completed", body = VisitRes),
        (status = 400, description = "Bad request"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "No matching record"),
        (status = 409, description = "Visit already completed"),
        (status = 503, description = "Store unavailable")
    )
)]
/// Complete a visit with doctor notes.
///
/// The write runs through the Access Gate: the staff member's hospital must
/// match the visit's, and the attempt is audited either way.
#[axum::debug_handler]
pub async fn complete_visit(
    State(state): State<AppState>,
    AxumPath(code): AxumPath<String>,
    Json(req): Json<CompleteVisitReq>,
) -> Result<Json<VisitRes>, (StatusCode, String)> {
    let staff = req.staff.into_identity().map_err(bad_request)?;
    let notes = req
        .notes
        .as_deref()
        .map(NonEmptyText::new)
        .transpose()
        .map_err(|_| bad_request("notes must not be blank when supplied"))?;

    match state.visits.complete(&staff, &code, notes) {
        Ok(visit) => Ok(Json(visit.into())),
        Err(err) => Err(error_response(err)),
    }
}

#[utoipa::path(
    post,
    path = "/scans",
    request_body = RecordScanReq,
    responses(
        (status = 201, description = "Scan event recorded", body = ScanRes),
        (status = 400, description = "Bad request"),
        (status = 503, description = "Store unavailable")
    )
)]
/// Record a UI-driven scan event (camera scan, manual entry, name search).
///
/// Gate-driven audit rows are appended by the gate itself; this endpoint only
/// accepts the UI-originated scan types.
#[axum::debug_handler]
pub async fn record_scan(
    State(state): State<AppState>,
    Json(req): Json<RecordScanReq>,
) -> Result<(StatusCode, Json<ScanRes>), (StatusCode, String)> {
    let scan_type = match req.scan_type.as_str() {
        "qr_scan" => ScanType::QrScan,
        "manual_search" => ScanType::ManualSearch,
        "name_search" => ScanType::NameSearch,
        other => return Err(bad_request(format!("unknown scan type '{other}'"))),
    };

    match state
        .ledger
        .record(req.staff_id, scan_type, &req.scan_data)
    {
        Ok(event) => Ok((StatusCode::CREATED, Json(event.into()))),
        Err(err) => Err(error_response(err)),
    }
}

#[utoipa::path(
    post,
    path = "/codes",
    request_body = GenerateCodeReq,
    responses(
        (status = 201, description = "Code allocated", body = GenerateCodeRes),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error"),
        (status = 503, description = "Store unavailable")
    )
)]
/// Allocate a fresh code of the given kind.
#[axum::debug_handler]
pub async fn generate_code(
    State(state): State<AppState>,
    Json(req): Json<GenerateCodeReq>,
) -> Result<(StatusCode, Json<GenerateCodeRes>), (StatusCode, String)> {
    let kind = match req.kind.as_str() {
        "patient" => CodeKind::Patient,
        "emergency" => CodeKind::Emergency,
        "visit" => CodeKind::Visit,
        other => return Err(bad_request(format!("unknown code kind '{other}'"))),
    };

    match state.issuer.issue(kind) {
        Ok(code) => Ok((StatusCode::CREATED, Json(GenerateCodeRes { code }))),
        Err(err) => Err(error_response(err)),
    }
}
