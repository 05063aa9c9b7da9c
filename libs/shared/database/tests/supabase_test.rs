use assert_matches::assert_matches;
use reqwest::Method;
use serde_json::{json, Value};
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{body_json, header, method, path, query_param};

use shared_config::AppConfig;
use shared_database::{DatabaseError, SupabaseClient, is_unique_violation};

fn config_for(mock_server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: mock_server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        supabase_service_role_key: "test-service-key".to_string(),
        supabase_jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
        port: 3000,
    }
}

#[tokio::test]
async fn test_request_uses_service_role_key_without_user_token() {
    let mock_server = MockServer::start().await;
    let client = SupabaseClient::new(&config_for(&mock_server));

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_schedules"))
        .and(query_param("doctor_id", "eq.42"))
        .and(header("apikey", "test-service-key"))
        .and(header("Authorization", "Bearer test-service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "doctor_id": "42" }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let rows: Vec<Value> = client
        .request(Method::GET, "/rest/v1/doctor_schedules?doctor_id=eq.42", None, None)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["doctor_id"], "42");
}

#[tokio::test]
async fn test_conflict_status_maps_to_unique_violation() {
    let mock_server = MockServer::start().await;
    let client = SupabaseClient::new(&config_for(&mock_server));

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_schedules"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"doctor_schedules_doctor_id_key\""
        })))
        .mount(&mock_server)
        .await;

    let err = client
        .request_with_headers::<Vec<Value>>(
            Method::POST,
            "/rest/v1/doctor_schedules",
            None,
            Some(json!({ "doctor_id": "42" })),
            Some(SupabaseClient::representation_headers()),
        )
        .await
        .unwrap_err();

    assert!(is_unique_violation(&err));
}

#[tokio::test]
async fn test_server_error_maps_to_api_error() {
    let mock_server = MockServer::start().await;
    let client = SupabaseClient::new(&config_for(&mock_server));

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database offline"))
        .mount(&mock_server)
        .await;

    let err = client
        .request::<Vec<Value>>(Method::GET, "/rest/v1/appointments", None, None)
        .await
        .unwrap_err();

    assert_matches!(
        DatabaseError::from_anyhow(&err),
        Some(DatabaseError::Api { status: 500, .. })
    );
}

#[tokio::test]
async fn test_rpc_posts_arguments() {
    let mock_server = MockServer::start().await;
    let client = SupabaseClient::new(&config_for(&mock_server));

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/cancel_appointment"))
        .and(body_json(json!({ "p_appointment_id": "abc" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Null))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome: Option<Value> = client
        .rpc("cancel_appointment", json!({ "p_appointment_id": "abc" }))
        .await
        .unwrap();

    assert!(outcome.is_none());
}
