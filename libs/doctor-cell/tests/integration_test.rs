mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::router::doctor_routes;
use doctor_cell::DoctorCellState;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

use common::{configure_body, date, FixedBookedSlots};

const TEMPLATE: [&str; 5] = [
    "10:00 AM - 10:30 AM",
    "10:30 AM - 11:00 AM",
    "11:00 AM - 11:30 AM",
    "11:30 AM - 12:00 PM",
    "12:30 PM - 01:00 PM",
];

fn supabase_state(mock_server: &MockServer, booked: Arc<FixedBookedSlots>) -> Arc<DoctorCellState> {
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    Arc::new(DoctorCellState::from_config(config, booked))
}

fn authorized(method_name: &str, uri: &str, user: &TestUser, body: Option<Value>) -> Request<Body> {
    let token = JwtTestUtils::create_test_token(user, &TestConfig::default().jwt_secret, Some(1));
    let builder = Request::builder()
        .method(method_name)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token));

    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_configure_schedule_writes_generated_slots() {
    let mock_server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com");

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_schedules"))
        .and(header("apikey", "test-service-key"))
        .and(header("Prefer", "return=representation"))
        .and(body_partial_json(json!({
            "doctor_id": doctor.id,
            "slots": TEMPLATE,
            "status": "available",
            "slot_duration_minutes": 30
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::schedule_response(&doctor.id, &TEMPLATE)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = doctor_routes(supabase_state(&mock_server, Arc::new(FixedBookedSlots::default())));
    let response = app
        .oneshot(authorized("POST", "/schedule", &doctor, Some(configure_body())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["schedule"]["slots"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_duplicate_schedule_maps_to_conflict() {
    let mock_server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com");

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_schedules"))
        .respond_with(ResponseTemplate::new(409).set_body_json(MockSupabaseResponses::error_response(
            "duplicate key value violates unique constraint \"doctor_schedules_doctor_id_key\"",
            "23505",
        )))
        .mount(&mock_server)
        .await;

    let app = doctor_routes(supabase_state(&mock_server, Arc::new(FixedBookedSlots::default())));
    let response = app
        .oneshot(authorized("POST", "/schedule", &doctor, Some(configure_body())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_reused_license_number_is_its_own_conflict() {
    let mock_server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com");

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_schedules"))
        .respond_with(ResponseTemplate::new(409).set_body_json(MockSupabaseResponses::error_response(
            "duplicate key value violates unique constraint \"doctor_schedules_license_number_key\"",
            "23505",
        )))
        .mount(&mock_server)
        .await;

    let app = doctor_routes(supabase_state(&mock_server, Arc::new(FixedBookedSlots::default())));
    let response = app
        .oneshot(authorized("POST", "/schedule", &doctor, Some(configure_body())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "License number already registered to another doctor");
}

#[tokio::test]
async fn test_slots_read_schedule_from_supabase() {
    let mock_server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com");
    let patient = TestUser::patient("pat@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_schedules"))
        .and(query_param("doctor_id", format!("eq.{}", doctor.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::schedule_response(&doctor.id, &TEMPLATE)
        ])))
        .mount(&mock_server)
        .await;

    let booked = Arc::new(FixedBookedSlots::default());
    booked.book(doctor.uuid(), date("2024-06-03"), "11:30 AM - 12:00 PM");

    let app = doctor_routes(supabase_state(&mock_server, booked));
    let response = app
        .oneshot(authorized("GET", &format!("/{}/slots/2024-06-03", doctor.id), &patient, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total"], 4);
    assert!(!body["available_slots"].as_array().unwrap().contains(&json!("11:30 AM - 12:00 PM")));
}

#[tokio::test]
async fn test_available_doctors_joins_directory_and_schedules() {
    let mock_server = MockServer::start().await;
    let patient = TestUser::patient("pat@example.com");
    let listed = TestUser::doctor("a@example.com");
    let unlisted = TestUser::doctor("b@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("is_verified", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_account_response(&listed.id, "Dr. Listed")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::schedule_response(&listed.id, &TEMPLATE),
            MockSupabaseResponses::schedule_response(&unlisted.id, &TEMPLATE)
        ])))
        .mount(&mock_server)
        .await;

    let app = doctor_routes(supabase_state(&mock_server, Arc::new(FixedBookedSlots::default())));
    let response = app
        .oneshot(authorized("GET", "/available/2024-06-03", &patient, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["doctors"][0]["doctor_id"], listed.id);
    assert_eq!(body["doctors"][0]["fee"], 500.0);
    assert_eq!(body["doctors"][0]["location"]["city"], "Pune");
}

#[tokio::test]
async fn test_storage_failure_is_opaque() {
    let mock_server = MockServer::start().await;
    let patient = TestUser::patient("pat@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(500).set_body_string("connection refused"))
        .mount(&mock_server)
        .await;

    let app = doctor_routes(supabase_state(&mock_server, Arc::new(FixedBookedSlots::default())));
    let response = app
        .oneshot(authorized("GET", "/available/2024-06-03", &patient, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Internal Server Error");
}
