use std::net::SocketAddr;
use std::sync::Arc;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::repository::{SupabaseAppointmentRepository, SupabaseCancellationRepository};
use appointment_cell::AppointmentCellState;
use doctor_cell::repository::SupabaseScheduleRepository;
use doctor_cell::DoctorCellState;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic API server");

    let config = Arc::new(AppConfig::from_env());
    if !config.is_configured() {
        warn!("Starting with incomplete Supabase configuration; storage calls will fail");
    }

    let supabase = SupabaseClient::new(&config);

    // One appointment store answers both lifecycle writes and the doctor cell's booked-slot reads
    let appointments = Arc::new(SupabaseAppointmentRepository::new(supabase.clone()));

    let doctors = Arc::new(DoctorCellState::from_config(config.clone(), appointments.clone()));
    let bookings = Arc::new(AppointmentCellState::new(
        config.clone(),
        appointments,
        Arc::new(SupabaseCancellationRepository::new(supabase.clone())),
        Arc::new(SupabaseScheduleRepository::new(supabase)),
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router::create_router(doctors, bookings)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
