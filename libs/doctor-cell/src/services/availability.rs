use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{AvailableDoctor, DoctorAccount, DoctorSchedule, DoctorSlots, ScheduleError};
use crate::repository::{BookedSlots, DoctorDirectory, ScheduleRepository};

/// Dates arrive as `YYYY-MM-DD` path segments.
pub fn parse_request_date(raw: &str) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ScheduleError::InvalidDate(format!("Expected YYYY-MM-DD, got '{}'", raw)))
}

/// English weekday name, the same vocabulary `day_off` is stored in.
pub fn weekday_name(date: NaiveDate) -> String {
    date.format("%A").to_string()
}

pub fn is_day_off(day_off: Option<&str>, date: NaiveDate) -> bool {
    day_off.is_some_and(|day| day == weekday_name(date))
}

/// Slot template minus the labels already held by confirmed appointments, in template order.
pub fn remaining_slots(template: &[String], confirmed: &[String]) -> Vec<String> {
    let taken: HashSet<&str> = confirmed.iter().map(String::as_str).collect();
    template
        .iter()
        .filter(|slot| !taken.contains(slot.as_str()))
        .cloned()
        .collect()
}

/// Availability of one schedule on one date. Day off and leave both mean no slots.
pub fn slots_for_date(schedule: &DoctorSchedule, date: NaiveDate, confirmed: &[String]) -> Vec<String> {
    if is_day_off(schedule.day_off.as_deref(), date) || schedule.is_on_leave(date) {
        return Vec::new();
    }
    remaining_slots(&schedule.slots, confirmed)
}

pub struct AvailabilityService {
    schedules: Arc<dyn ScheduleRepository>,
    directory: Arc<dyn DoctorDirectory>,
    booked: Arc<dyn BookedSlots>,
}

impl AvailabilityService {
    pub fn new(
        schedules: Arc<dyn ScheduleRepository>,
        directory: Arc<dyn DoctorDirectory>,
        booked: Arc<dyn BookedSlots>,
    ) -> Self {
        Self { schedules, directory, booked }
    }

    pub async fn doctor_slots(&self, doctor_id: Uuid, raw_date: &str) -> Result<DoctorSlots, ScheduleError> {
        let date = parse_request_date(raw_date)?;
        debug!("Computing slots for doctor {} on {}", doctor_id, date);

        let schedule = self.schedules.find_by_doctor(doctor_id).await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?
            .ok_or(ScheduleError::NotFound)?;

        let day_off = is_day_off(schedule.day_off.as_deref(), date);
        let on_leave = schedule.is_on_leave(date);

        let available_slots = if day_off || on_leave {
            Vec::new()
        } else {
            let confirmed = self.booked.confirmed_slots(doctor_id, date).await
                .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;
            remaining_slots(&schedule.slots, &confirmed)
        };

        Ok(DoctorSlots {
            doctor_id,
            date,
            is_day_off: day_off,
            is_on_leave: on_leave,
            available_slots,
        })
    }

    /// Verified doctors with at least one open slot on the date, ordered by doctor id.
    pub async fn available_doctors(&self, raw_date: &str) -> Result<Vec<AvailableDoctor>, ScheduleError> {
        let date = parse_request_date(raw_date)?;

        let doctors = self.directory.verified_doctors().await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;
        let schedules = self.schedules.list_all().await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;
        let confirmed = self.booked.confirmed_slots_on(date).await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        let result = join_available(doctors, schedules, &confirmed, date);
        info!("{} doctors available on {}", result.len(), date);
        Ok(result)
    }
}

fn join_available(
    doctors: Vec<DoctorAccount>,
    schedules: Vec<DoctorSchedule>,
    confirmed: &HashMap<Uuid, Vec<String>>,
    date: NaiveDate,
) -> Vec<AvailableDoctor> {
    let schedules: HashMap<Uuid, DoctorSchedule> = schedules
        .into_iter()
        .map(|schedule| (schedule.doctor_id, schedule))
        .collect();

    let mut available: Vec<AvailableDoctor> = doctors
        .into_iter()
        .filter(|doctor| doctor.is_verified)
        .filter_map(|doctor| {
            let schedule = schedules.get(&doctor.id)?;
            let taken = confirmed.get(&doctor.id).map(Vec::as_slice).unwrap_or(&[]);
            let slots = slots_for_date(schedule, date, taken);
            if slots.is_empty() {
                return None;
            }

            Some(AvailableDoctor {
                doctor_id: doctor.id,
                name: doctor.name,
                fee: schedule.fee,
                gender: schedule.gender,
                location: schedule.location.clone(),
                age: schedule.age,
                experience: schedule.experience,
                specialization: schedule.specialization,
                available_slot_count: slots.len(),
                available_slots: slots,
            })
        })
        .collect();

    available.sort_by_key(|doctor| doctor.doctor_id);
    available
}
