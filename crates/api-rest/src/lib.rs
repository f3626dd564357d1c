//! # API REST
//!
//! REST API implementation for MedConnect.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status mapping)
//!
//! The core is consumed as ready-made services; this crate adds no policy of
//! its own. Staff identity arrives in request bodies from the external
//! authentication collaborator and is passed through to the Access Gate
//! untouched.

#![warn(rust_2018_idioms)]

pub mod dto;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use medconnect_core::{
    AccessGate, CodeIssuer, CoreConfig, EmergencyIntakeService, PromotionEngine, RecordStore,
    RegistrationService, ScanLedger, VisitService,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across REST API handlers.
///
/// All services are cheap clones over the same store handle; constructing the
/// state wires them together once at startup.
#[derive(Clone)]
pub struct AppState {
    pub registration: RegistrationService,
    pub intake: EmergencyIntakeService,
    pub visits: VisitService,
    pub gate: AccessGate,
    pub promotion: PromotionEngine,
    pub ledger: ScanLedger,
    pub issuer: CodeIssuer,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, cfg: Arc<CoreConfig>) -> Self {
        let issuer = CodeIssuer::new(store.clone(), &cfg);
        let gate = AccessGate::new(store.clone());
        Self {
            registration: RegistrationService::new(store.clone(), issuer.clone()),
            intake: EmergencyIntakeService::new(store.clone(), issuer.clone()),
            visits: VisitService::new(store.clone(), issuer.clone(), gate.clone()),
            promotion: PromotionEngine::new(store.clone(), issuer.clone()),
            ledger: ScanLedger::new(store),
            gate,
            issuer,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::register_patient,
        handlers::emergency_intake,
        handlers::list_active_emergencies,
        handlers::schedule_visit,
        handlers::staff_lookup,
        handlers::promote_emergency,
        handlers::complete_visit,
        handlers::record_scan,
        handlers::generate_code,
    ),
    components(schemas(
        dto::HealthRes,
        dto::RegisterPatientReq,
        dto::PatientRes,
        dto::EmergencyIntakeReq,
        dto::EmergencyRes,
        dto::EmergencyListRes,
        dto::ScheduleVisitReq,
        dto::VisitRes,
        dto::StaffDto,
        dto::StaffLookupReq,
        dto::ResolvedRes,
        dto::StaffLookupRes,
        dto::PromoteReq,
        dto::CompleteVisitReq,
        dto::RecordScanReq,
        dto::ScanRes,
        dto::GenerateCodeReq,
        dto::GenerateCodeRes,
    ))
)]
struct ApiDoc;

/// Builds the application router with Swagger UI and permissive CORS.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/patients", post(handlers::register_patient))
        .route("/emergency", post(handlers::emergency_intake))
        .route("/emergency/active", get(handlers::list_active_emergencies))
        .route(
            "/emergency/:code/promote",
            post(handlers::promote_emergency),
        )
        .route("/visits", post(handlers::schedule_visit))
        .route("/visits/:code/notes", post(handlers::complete_visit))
        .route("/staff/lookup", post(handlers::staff_lookup))
        .route("/scans", post(handlers::record_scan))
        .route("/codes", post(handlers::generate_code))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use medconnect_core::MemoryStore;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_app() -> Router {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::default());
        let cfg = Arc::new(CoreConfig::default());
        app(AppState::new(store, cfg))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request builds")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn staff_json(hospital_id: Uuid, active: bool) -> Value {
        json!({
            "user_id": Uuid::new_v4(),
            "hospital_id": hospital_id,
            "role": "doctor",
            "is_active": active,
        })
    }

    #[tokio::test]
    async fn test_health_is_alive() {
        let response = test_app().oneshot(get_req("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["ok"], json!(true));
    }

    #[tokio::test]
    async fn test_register_then_lookup_roundtrip() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(post_json("/patients", json!({ "full_name": "Ada Lovelace" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let patient = body_json(response).await;
        let code = patient["patient_code"].as_str().unwrap().to_owned();
        assert!(code.starts_with("PAT-"));

        let response = app
            .oneshot(post_json(
                "/staff/lookup",
                json!({
                    "staff": staff_json(Uuid::new_v4(), true),
                    "code": code,
                    "intent": "read",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["target"]["kind"], json!("patient"));
        assert_eq!(body["target"]["patient"]["patient_code"], json!(code));
        assert!(body["scan_id"].is_string());
    }

    #[tokio::test]
    async fn test_lookup_distinguishes_missing_from_denied() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/staff/lookup",
                json!({
                    "staff": staff_json(Uuid::new_v4(), true),
                    "code": "PAT-99999",
                    "intent": "read",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(post_json(
                "/staff/lookup",
                json!({
                    "staff": staff_json(Uuid::new_v4(), false),
                    "code": "PAT-99999",
                    "intent": "read",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_intake_promote_and_repeat_conflicts() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/emergency",
                json!({ "patient_name": "Jane Roe", "condition_description": "collapsed" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let record = body_json(response).await;
        let code = record["emergency_code"].as_str().unwrap().to_owned();
        assert_eq!(record["status"], json!("active"));

        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/emergency/{code}/promote"),
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let patient = body_json(response).await;
        assert_eq!(patient["full_name"], json!("Jane Roe"));

        let response = app
            .oneshot(post_json(
                &format!("/emergency/{code}/promote"),
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_visit_completion_is_hospital_gated() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(post_json("/patients", json!({ "full_name": "Visiting Patient" })))
            .await
            .unwrap();
        let patient = body_json(response).await;
        let patient_code = patient["patient_code"].as_str().unwrap().to_owned();

        let hospital = Uuid::new_v4();
        let response = app
            .clone()
            .oneshot(post_json(
                "/visits",
                json!({ "patient_code": patient_code, "hospital_id": hospital }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let visit = body_json(response).await;
        let visit_code = visit["visit_code"].as_str().unwrap().to_owned();

        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/visits/{visit_code}/notes"),
                json!({
                    "staff": staff_json(Uuid::new_v4(), true),
                    "notes": "cross-hospital write",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(post_json(
                &format!("/visits/{visit_code}/notes"),
                json!({
                    "staff": staff_json(hospital, true),
                    "notes": "BP stable, discharged",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], json!("completed"));
        assert_eq!(body["doctor_notes"], json!("BP stable, discharged"));
    }

    #[tokio::test]
    async fn test_record_scan_rejects_gate_internal_types() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/scans",
                json!({
                    "staff_id": Uuid::new_v4(),
                    "scan_type": "code_lookup",
                    "scan_data": "PAT-00042",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(post_json(
                "/scans",
                json!({
                    "staff_id": Uuid::new_v4(),
                    "scan_type": "name_search",
                    "scan_data": "Jane Roe",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_generate_code_renders_each_kind() {
        let app = test_app();
        for (kind, prefix) in [("patient", "PAT-"), ("emergency", "EM-"), ("visit", "VST-")] {
            let response = app
                .clone()
                .oneshot(post_json("/codes", json!({ "kind": kind })))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
            let body = body_json(response).await;
            assert!(body["code"].as_str().unwrap().starts_with(prefix));
        }
    }
}
