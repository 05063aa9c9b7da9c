#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveTime;
use serde_json::json;
use uuid::Uuid;

use appointment_cell::models::{Appointment, CreateAppointmentRequest};
use appointment_cell::repository::memory::MemoryAppointmentStore;
use appointment_cell::AppointmentCellState;
use doctor_cell::models::{ClockInterval, NewDoctorSchedule, Gender, ScheduleStatus, Specialization};
use doctor_cell::repository::memory::MemoryScheduleRepository;
use doctor_cell::services::SlotGenerator;
use doctor_cell::ScheduleRepository;
use shared_models::auth::Caller;
use shared_utils::test_utils::TestConfig;

pub const DATE: &str = "2024-06-03";
pub const SLOT_X: &str = "10:00 AM - 10:30 AM";
pub const SLOT_Y: &str = "11:00 AM - 11:30 AM";
pub const SLOT_Z: &str = "12:30 PM - 01:00 PM";
pub const NOT_A_SLOT: &str = "12:00 PM - 12:30 PM";

pub struct Clinic {
    pub store: Arc<MemoryAppointmentStore>,
    pub schedules: Arc<MemoryScheduleRepository>,
    pub state: Arc<AppointmentCellState>,
    pub doctor: Caller,
    pub patient: Caller,
}

/// One doctor working 10:00-13:00 with lunch at noon, and one patient.
pub async fn clinic() -> Clinic {
    let store = Arc::new(MemoryAppointmentStore::new());
    let schedules = Arc::new(MemoryScheduleRepository::new());
    let doctor = Caller::doctor(Uuid::new_v4());
    let patient = Caller::patient(Uuid::new_v4());

    add_doctor(&schedules, doctor.id).await;

    let state = Arc::new(AppointmentCellState::new(
        TestConfig::default().to_arc(),
        store.clone(),
        store.clone(),
        schedules.clone(),
    ));

    Clinic { store, schedules, state, doctor, patient }
}

pub async fn add_doctor(schedules: &MemoryScheduleRepository, doctor_id: Uuid) {
    let working_hours = ClockInterval::new(
        NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
    );
    let lunch_break = ClockInterval::new(
        NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(12, 30, 0).unwrap(),
    );
    let slots = SlotGenerator::default().generate(&working_hours, &lunch_break).unwrap();

    schedules.create(NewDoctorSchedule {
        doctor_id,
        working_hours,
        lunch_break,
        day_off: Some("Sunday".to_string()),
        slot_duration_minutes: 30,
        slots,
        status: ScheduleStatus::Available,
        fee: 350.0,
        gender: Gender::Other,
        location: json!({ "city": "Indore" }),
        age: 45,
        experience: 15.0,
        license_number: format!("LIC-{}", doctor_id),
        specialization: Specialization::Dermatopathology,
    }).await.unwrap();
}

pub fn booking(doctor_id: Uuid, slot: &str) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        doctor_id,
        appointment_date: DATE.to_string(),
        slot_time: Some(slot.to_string()),
        description: Some("Recurring rash".to_string()),
        images: Some(vec!["uploads/rash-1.png".to_string()]),
    }
}

pub async fn book(clinic: &Clinic, slot: &str) -> Appointment {
    clinic.state.appointments
        .create(&clinic.patient, booking(clinic.doctor.id, slot))
        .await
        .unwrap()
}
