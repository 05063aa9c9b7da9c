use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use appointment_cell::AppointmentCellState;
use doctor_cell::router::doctor_routes;
use doctor_cell::DoctorCellState;

pub fn create_router(doctors: Arc<DoctorCellState>, appointments: Arc<AppointmentCellState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .nest("/doctors", doctor_routes(doctors))
        .nest("/appointments", appointment_routes(appointments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use doctor_cell::repository::memory::{MemoryDoctorDirectory, MemoryScheduleRepository};
    use appointment_cell::repository::memory::MemoryAppointmentStore;
    use shared_config::AppConfig;
    use tower::ServiceExt;

    fn app() -> Router {
        let config = Arc::new(AppConfig {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "anon".to_string(),
            supabase_service_role_key: "service".to_string(),
            supabase_jwt_secret: "secret".to_string(),
            port: 3000,
        });
        let store = Arc::new(MemoryAppointmentStore::new());
        let schedules = Arc::new(MemoryScheduleRepository::new());

        let doctors = Arc::new(DoctorCellState::new(
            config.clone(),
            schedules.clone(),
            Arc::new(MemoryDoctorDirectory::new()),
            store.clone(),
        ));
        let appointments = Arc::new(AppointmentCellState::new(config, store.clone(), store, schedules));
        create_router(doctors, appointments)
    }

    #[tokio::test]
    async fn test_liveness_route() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cells_are_nested_behind_auth() {
        for uri in ["/doctors/schedule", "/appointments/patient"] {
            let response = app()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }
}
