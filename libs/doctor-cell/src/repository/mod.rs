use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{DoctorAccount, DoctorSchedule, LeaveUpdate, NewDoctorSchedule};

pub mod memory;
pub mod supabase;

pub use supabase::{SupabaseDoctorDirectory, SupabaseScheduleRepository};

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn find_by_doctor(&self, doctor_id: Uuid) -> Result<Option<DoctorSchedule>>;

    /// Fails with `DatabaseError::UniqueViolation` when the doctor already has a schedule.
    async fn create(&self, schedule: NewDoctorSchedule) -> Result<DoctorSchedule>;

    async fn list_all(&self) -> Result<Vec<DoctorSchedule>>;

    async fn update_leave(&self, doctor_id: Uuid, leave: LeaveUpdate) -> Result<Option<DoctorSchedule>>;
}

#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    async fn verified_doctors(&self) -> Result<Vec<DoctorAccount>>;
}

/// Read side of the appointment store that availability depends on.
#[async_trait]
pub trait BookedSlots: Send + Sync {
    /// Slot labels held by confirmed appointments of one doctor on one date.
    async fn confirmed_slots(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<String>>;

    /// Same as `confirmed_slots`, for every doctor at once.
    async fn confirmed_slots_on(&self, date: NaiveDate) -> Result<HashMap<Uuid, Vec<String>>>;
}
