use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    /// One of the doctor's slot labels, or empty while the time is still being negotiated.
    #[serde(default)]
    pub slot_time: String,
    pub status: AppointmentStatus,
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub prescription: Option<String>,
    pub next_appointment_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[serde(alias = "Accepted")]
    Accepted,
    #[serde(alias = "Pending")]
    Pending,
    #[serde(alias = "Confirmed")]
    Confirmed,
    #[serde(alias = "Completed")]
    Completed,
    #[serde(alias = "Cancelled")]
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Accepted => "accepted",
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row written when a patient books.
#[derive(Debug, Clone, Serialize)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    pub slot_time: String,
    pub status: AppointmentStatus,
    pub description: Option<String>,
    pub images: Vec<String>,
}

/// Fields a transition writes. Unset fields are left untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentPatch {
    pub status: AppointmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prescription: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_appointment_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

impl AppointmentPatch {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status,
            slot_time: None,
            appointment_date: None,
            prescription: None,
            next_appointment_date: None,
            updated_at: Utc::now(),
        }
    }

    pub fn apply(&self, appointment: &mut Appointment) {
        appointment.status = self.status;
        if let Some(slot_time) = &self.slot_time {
            appointment.slot_time = slot_time.clone();
        }
        if let Some(date) = self.appointment_date {
            appointment.appointment_date = date;
        }
        if let Some(prescription) = &self.prescription {
            appointment.prescription = Some(prescription.clone());
        }
        if let Some(next) = self.next_appointment_date {
            appointment.next_appointment_date = Some(next);
        }
        appointment.updated_at = self.updated_at;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancellationRecord {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Appointment as listed to its owners, with the ledger reason joined in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub cancellation_reason: Option<String>,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub doctor_id: Uuid,
    pub appointment_date: String,
    pub slot_time: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmAppointmentRequest {
    pub slot_time: String,
    pub appointment_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompleteAppointmentRequest {
    pub prescription: Option<String>,
    pub next_appointment_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorAppointmentsQuery {
    pub status: AppointmentStatus,
    pub date: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientAppointmentsQuery {
    pub status: Option<AppointmentStatus>,
    pub from: Option<String>,
    pub to: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("No active appointment found")]
    NoActiveAppointment,

    #[error("Doctor has no configured schedule")]
    DoctorNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Slot already confirmed for another appointment")]
    SlotTaken,

    #[error("Appointment was modified by another request")]
    ConcurrentModification,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound
            | AppointmentError::NoActiveAppointment
            | AppointmentError::DoctorNotFound => AppError::NotFound(err.to_string()),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::InvalidDate(msg) => AppError::InvalidDate(msg),
            AppointmentError::SlotTaken | AppointmentError::ConcurrentModification => {
                AppError::Conflict(err.to_string())
            }
            AppointmentError::Unauthorized(msg) => AppError::Auth(msg),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
