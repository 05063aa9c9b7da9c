use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::DatabaseError;
use shared_models::auth::Caller;

use crate::models::{
    ConfigureScheduleRequest, DoctorSchedule, LeaveRequest, LeaveUpdate, NewDoctorSchedule,
    ScheduleError, ScheduleStatus,
};
use crate::repository::ScheduleRepository;
use crate::services::slots::{parse_interval, SlotGenerator};

const WEEKDAYS: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

pub struct ScheduleService {
    schedules: Arc<dyn ScheduleRepository>,
    generator: SlotGenerator,
}

impl ScheduleService {
    pub fn new(schedules: Arc<dyn ScheduleRepository>) -> Self {
        Self {
            schedules,
            generator: SlotGenerator::default(),
        }
    }

    /// One-shot: a doctor that already has a schedule gets `AlreadyConfigured`.
    pub async fn configure(
        &self,
        caller: &Caller,
        request: ConfigureScheduleRequest,
    ) -> Result<DoctorSchedule, ScheduleError> {
        if !caller.is_doctor() {
            return Err(ScheduleError::Unauthorized(
                "Only doctors can configure a schedule".to_string(),
            ));
        }

        debug!("Configuring schedule for doctor {}", caller.id);

        let working_hours = parse_interval("working_hours", &request.working_hours)?;
        let lunch_break = parse_interval("lunch_break", &request.lunch_break)?;
        let day_off = normalize_day_off(request.day_off)?;
        validate_profile(&request.license_number, request.fee, request.age, request.experience)?;

        let slots = self.generator.generate(&working_hours, &lunch_break)?;
        if slots.is_empty() {
            warn!("Schedule for doctor {} yields no bookable slots", caller.id);
        }

        let new_schedule = NewDoctorSchedule {
            doctor_id: caller.id,
            working_hours,
            lunch_break,
            day_off,
            slot_duration_minutes: self.generator.duration_minutes(),
            slots,
            status: ScheduleStatus::Available,
            fee: request.fee,
            gender: request.gender,
            location: request.location,
            age: request.age,
            experience: request.experience,
            license_number: request.license_number.trim().to_string(),
            specialization: request.specialization,
        };

        let schedule = self.schedules.create(new_schedule).await.map_err(create_failure)?;

        info!("Doctor {} configured {} slots", schedule.doctor_id, schedule.slots.len());
        Ok(schedule)
    }

    pub async fn get_schedule(&self, doctor_id: Uuid) -> Result<DoctorSchedule, ScheduleError> {
        self.schedules.find_by_doctor(doctor_id).await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?
            .ok_or(ScheduleError::NotFound)
    }

    pub async fn set_leave(
        &self,
        caller: &Caller,
        request: LeaveRequest,
    ) -> Result<DoctorSchedule, ScheduleError> {
        if !caller.is_doctor() {
            return Err(ScheduleError::Unauthorized(
                "Only doctors can change their leave".to_string(),
            ));
        }

        let update = if request.on_leave {
            if let (Some(start), Some(end)) = (request.leave_start_date, request.leave_end_date) {
                if end < start {
                    return Err(ScheduleError::ValidationError(
                        "Leave end date must not precede its start date".to_string(),
                    ));
                }
            }
            LeaveUpdate {
                status: ScheduleStatus::OnLeave,
                leave_start_date: request.leave_start_date,
                leave_end_date: request.leave_end_date,
                updated_at: Utc::now(),
            }
        } else {
            LeaveUpdate {
                status: ScheduleStatus::Available,
                leave_start_date: None,
                leave_end_date: None,
                updated_at: Utc::now(),
            }
        };

        let schedule = self.schedules.update_leave(caller.id, update).await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?
            .ok_or(ScheduleError::NotFound)?;

        info!("Doctor {} is now {:?}", caller.id, schedule.status);
        Ok(schedule)
    }
}

/// Two unique keys guard a schedule row; the violated one is named in the storage message.
fn create_failure(err: anyhow::Error) -> ScheduleError {
    match DatabaseError::from_anyhow(&err) {
        Some(DatabaseError::UniqueViolation(detail)) if detail.contains("license_number") => {
            ScheduleError::LicenseNumberTaken
        }
        Some(DatabaseError::UniqueViolation(_)) => ScheduleError::AlreadyConfigured,
        _ => ScheduleError::DatabaseError(err.to_string()),
    }
}

fn normalize_day_off(day_off: Option<String>) -> Result<Option<String>, ScheduleError> {
    match day_off.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(day) => WEEKDAYS
            .iter()
            .find(|weekday| weekday.eq_ignore_ascii_case(day))
            .map(|weekday| Some(weekday.to_string()))
            .ok_or_else(|| ScheduleError::ValidationError(format!("Unknown day off: {}", day))),
    }
}

fn validate_profile(license_number: &str, fee: f64, age: i32, experience: f64) -> Result<(), ScheduleError> {
    if license_number.trim().is_empty() {
        return Err(ScheduleError::ValidationError("License number is required".to_string()));
    }
    if !fee.is_finite() || fee < 0.0 {
        return Err(ScheduleError::ValidationError("Fee must be a non-negative amount".to_string()));
    }
    if age <= 0 {
        return Err(ScheduleError::ValidationError("Age must be positive".to_string()));
    }
    if !experience.is_finite() || experience < 0.0 {
        return Err(ScheduleError::ValidationError("Experience must not be negative".to_string()));
    }
    Ok(())
}
