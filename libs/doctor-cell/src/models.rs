use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate, NaiveTime};

use shared_models::error::AppError;

/// Every slot in a doctor's template has this length.
pub const SLOT_DURATION_MINUTES: i64 = 30;

// ==============================================================================
// SCHEDULE MODELS
// ==============================================================================

/// A `[start, end)` span of wall-clock time, stored as `"HH:MM"` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockInterval {
    #[serde(with = "clock_time")]
    pub start: NaiveTime,
    #[serde(with = "clock_time")]
    pub end: NaiveTime,
}

impl ClockInterval {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn is_well_formed(&self) -> bool {
        self.end > self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Available,
    #[serde(alias = "on leave")]
    OnLeave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Specialization {
    #[serde(rename = "Cosmetic dermatology")]
    CosmeticDermatology,
    #[serde(rename = "Dermatopathology")]
    Dermatopathology,
    #[serde(rename = "Mohs surgery")]
    MohsSurgery,
    #[serde(rename = "Pediatric dermatology")]
    PediatricDermatology,
    #[serde(rename = "Immunodermatology")]
    Immunodermatology,
    #[serde(rename = "Trichology")]
    Trichology,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSchedule {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub working_hours: ClockInterval,
    pub lunch_break: ClockInterval,
    pub day_off: Option<String>,
    pub slot_duration_minutes: i64,
    pub slots: Vec<String>,
    pub status: ScheduleStatus,
    pub leave_start_date: Option<NaiveDate>,
    pub leave_end_date: Option<NaiveDate>,
    pub fee: f64,
    pub gender: Gender,
    pub location: Value,
    pub age: i32,
    pub experience: f64,
    pub license_number: String,
    pub specialization: Specialization,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DoctorSchedule {
    /// Open-ended leave bounds extend indefinitely in that direction.
    pub fn is_on_leave(&self, date: NaiveDate) -> bool {
        if self.status != ScheduleStatus::OnLeave {
            return false;
        }

        let after_start = self.leave_start_date.map_or(true, |start| date >= start);
        let before_end = self.leave_end_date.map_or(true, |end| date <= end);
        after_start && before_end
    }
}

/// Row written when a doctor configures their schedule.
#[derive(Debug, Clone, Serialize)]
pub struct NewDoctorSchedule {
    pub doctor_id: Uuid,
    pub working_hours: ClockInterval,
    pub lunch_break: ClockInterval,
    pub day_off: Option<String>,
    pub slot_duration_minutes: i64,
    pub slots: Vec<String>,
    pub status: ScheduleStatus,
    pub fee: f64,
    pub gender: Gender,
    pub location: Value,
    pub age: i32,
    pub experience: f64,
    pub license_number: String,
    pub specialization: Specialization,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaveUpdate {
    pub status: ScheduleStatus,
    pub leave_start_date: Option<NaiveDate>,
    pub leave_end_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

/// Verified account as listed by the doctor directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorAccount {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub is_verified: bool,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Clock interval as submitted by a client; parsed during validation so a malformed
/// time is a validation failure rather than a body rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockIntervalInput {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigureScheduleRequest {
    pub working_hours: ClockIntervalInput,
    pub lunch_break: ClockIntervalInput,
    pub day_off: Option<String>,
    pub fee: f64,
    pub gender: Gender,
    pub location: Value,
    pub age: i32,
    pub experience: f64,
    pub license_number: String,
    pub specialization: Specialization,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub on_leave: bool,
    pub leave_start_date: Option<NaiveDate>,
    pub leave_end_date: Option<NaiveDate>,
}

/// Remaining slots of one doctor on one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSlots {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub is_day_off: bool,
    pub is_on_leave: bool,
    pub available_slots: Vec<String>,
}

/// One row of the all-doctors availability listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableDoctor {
    pub doctor_id: Uuid,
    pub name: String,
    pub fee: f64,
    pub gender: Gender,
    pub location: Value,
    pub age: i32,
    pub experience: f64,
    pub specialization: Specialization,
    pub available_slots: Vec<String>,
    pub available_slot_count: usize,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleError {
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Schedule not found")]
    NotFound,

    #[error("Schedule already configured for this doctor")]
    AlreadyConfigured,

    #[error("License number already registered to another doctor")]
    LicenseNumberTaken,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::InvalidSchedule(msg) => AppError::ValidationError(msg),
            ScheduleError::ValidationError(msg) => AppError::ValidationError(msg),
            ScheduleError::InvalidDate(msg) => AppError::InvalidDate(msg),
            ScheduleError::NotFound => AppError::NotFound("Schedule not found".to_string()),
            ScheduleError::AlreadyConfigured | ScheduleError::LicenseNumberTaken => {
                AppError::Conflict(err.to_string())
            }
            ScheduleError::Unauthorized(msg) => AppError::Auth(msg),
            ScheduleError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

/// `"HH:MM"` on the way out, `"HH:MM"` or `"HH:MM:00"` on the way in.
pub mod clock_time {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    /// Whole minutes only; the stored form has no seconds.
    pub fn parse(raw: &str) -> Option<NaiveTime> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .ok()
            .filter(|time| time.second() == 0)
    }

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid clock time: {}", raw)))
    }
}
