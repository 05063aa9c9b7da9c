use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::resolve_caller;

use crate::models::{ConfigureScheduleRequest, LeaveRequest};
use crate::state::DoctorCellState;

// ==============================================================================
// SCHEDULE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn configure_schedule(
    State(state): State<Arc<DoctorCellState>>,
    Extension(user): Extension<User>,
    Json(request): Json<ConfigureScheduleRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let caller = resolve_caller(&user)?;
    let schedule = state.schedules.configure(&caller, request).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "schedule": schedule,
        "message": "Schedule configured successfully"
    }))))
}

#[axum::debug_handler]
pub async fn get_own_schedule(
    State(state): State<Arc<DoctorCellState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(&user)?;
    if !caller.is_doctor() {
        return Err(AppError::Auth("Only doctors have a schedule".to_string()));
    }

    let schedule = state.schedules.get_schedule(caller.id).await?;
    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn get_doctor_schedule(
    State(state): State<Arc<DoctorCellState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let schedule = state.schedules.get_schedule(doctor_id).await?;
    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn set_leave(
    State(state): State<Arc<DoctorCellState>>,
    Extension(user): Extension<User>,
    Json(request): Json<LeaveRequest>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(&user)?;
    let schedule = state.schedules.set_leave(&caller, request).await?;

    Ok(Json(json!({
        "schedule": schedule,
        "message": "Leave status updated"
    })))
}

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_doctor_slots(
    State(state): State<Arc<DoctorCellState>>,
    Path((doctor_id, date)): Path<(Uuid, String)>,
) -> Result<Json<Value>, AppError> {
    let slots = state.availability.doctor_slots(doctor_id, &date).await?;
    let total = slots.available_slots.len();

    Ok(Json(json!({
        "doctor_id": slots.doctor_id,
        "date": slots.date,
        "is_day_off": slots.is_day_off,
        "is_on_leave": slots.is_on_leave,
        "available_slots": slots.available_slots,
        "total": total
    })))
}

#[axum::debug_handler]
pub async fn get_available_doctors(
    State(state): State<Arc<DoctorCellState>>,
    Path(date): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctors = state.availability.available_doctors(&date).await?;

    if doctors.is_empty() {
        return Ok(Json(json!({
            "date": date,
            "doctors": [],
            "total": 0,
            "message": "No doctors available on this date"
        })));
    }

    Ok(Json(json!({
        "date": date,
        "total": doctors.len(),
        "doctors": doctors
    })))
}
