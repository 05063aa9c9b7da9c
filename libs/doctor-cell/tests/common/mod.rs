#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use uuid::Uuid;

use doctor_cell::repository::memory::{MemoryDoctorDirectory, MemoryScheduleRepository};
use doctor_cell::{BookedSlots, DoctorAccount, DoctorCellState};
use shared_utils::test_utils::TestConfig;

/// Confirmed bookings keyed by doctor and date.
#[derive(Default)]
pub struct FixedBookedSlots {
    confirmed: Mutex<Vec<(Uuid, NaiveDate, String)>>,
}

impl FixedBookedSlots {
    pub fn book(&self, doctor_id: Uuid, date: NaiveDate, slot: &str) {
        self.confirmed.lock().unwrap().push((doctor_id, date, slot.to_string()));
    }
}

#[async_trait]
impl BookedSlots for FixedBookedSlots {
    async fn confirmed_slots(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<String>> {
        Ok(self.confirmed.lock().unwrap().iter()
            .filter(|(doctor, day, _)| *doctor == doctor_id && *day == date)
            .map(|(_, _, slot)| slot.clone())
            .collect())
    }

    async fn confirmed_slots_on(&self, date: NaiveDate) -> Result<HashMap<Uuid, Vec<String>>> {
        let mut by_doctor: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (doctor, day, slot) in self.confirmed.lock().unwrap().iter() {
            if *day == date {
                by_doctor.entry(*doctor).or_default().push(slot.clone());
            }
        }
        Ok(by_doctor)
    }
}

pub struct MemoryFixture {
    pub schedules: Arc<MemoryScheduleRepository>,
    pub directory: Arc<MemoryDoctorDirectory>,
    pub booked: Arc<FixedBookedSlots>,
    pub state: Arc<DoctorCellState>,
}

pub fn memory_fixture() -> MemoryFixture {
    let schedules = Arc::new(MemoryScheduleRepository::new());
    let directory = Arc::new(MemoryDoctorDirectory::new());
    let booked = Arc::new(FixedBookedSlots::default());

    let state = Arc::new(DoctorCellState::new(
        TestConfig::default().to_arc(),
        schedules.clone(),
        directory.clone(),
        booked.clone(),
    ));

    MemoryFixture { schedules, directory, booked, state }
}

pub fn account(id: Uuid, name: &str, verified: bool) -> DoctorAccount {
    DoctorAccount {
        id,
        name: name.to_string(),
        email: None,
        is_verified: verified,
    }
}

/// 10:00-13:00 with lunch at noon, Sunday off: five slots.
pub fn configure_body() -> Value {
    json!({
        "working_hours": { "start": "10:00", "end": "13:00" },
        "lunch_break": { "start": "12:00", "end": "12:30" },
        "day_off": "Sunday",
        "fee": 400.0,
        "gender": "Female",
        "location": { "city": "Nagpur" },
        "age": 38,
        "experience": 9.0,
        "license_number": "MH-4521",
        "specialization": "Trichology"
    })
}

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}
