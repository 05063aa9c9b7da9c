//! In-process stores with the same contracts as the Supabase tables. Used by tests
//! and by local runs without a database.

use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use shared_database::DatabaseError;

use crate::models::{DoctorAccount, DoctorSchedule, LeaveUpdate, NewDoctorSchedule};
use super::{DoctorDirectory, ScheduleRepository};

#[derive(Default)]
pub struct MemoryScheduleRepository {
    schedules: RwLock<BTreeMap<Uuid, DoctorSchedule>>,
}

impl MemoryScheduleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScheduleRepository for MemoryScheduleRepository {
    async fn find_by_doctor(&self, doctor_id: Uuid) -> Result<Option<DoctorSchedule>> {
        let schedules = self.schedules.read().map_err(|_| anyhow!("schedule store poisoned"))?;
        Ok(schedules.get(&doctor_id).cloned())
    }

    async fn create(&self, schedule: NewDoctorSchedule) -> Result<DoctorSchedule> {
        let mut schedules = self.schedules.write().map_err(|_| anyhow!("schedule store poisoned"))?;

        if schedules.contains_key(&schedule.doctor_id) {
            return Err(DatabaseError::UniqueViolation(format!(
                "doctor_schedules.doctor_id {} already exists",
                schedule.doctor_id
            ))
            .into());
        }
        if schedules.values().any(|s| s.license_number == schedule.license_number) {
            return Err(DatabaseError::UniqueViolation(format!(
                "doctor_schedules.license_number {} already exists",
                schedule.license_number
            ))
            .into());
        }

        let now = Utc::now();
        let stored = DoctorSchedule {
            id: Uuid::new_v4(),
            doctor_id: schedule.doctor_id,
            working_hours: schedule.working_hours,
            lunch_break: schedule.lunch_break,
            day_off: schedule.day_off,
            slot_duration_minutes: schedule.slot_duration_minutes,
            slots: schedule.slots,
            status: schedule.status,
            leave_start_date: None,
            leave_end_date: None,
            fee: schedule.fee,
            gender: schedule.gender,
            location: schedule.location,
            age: schedule.age,
            experience: schedule.experience,
            license_number: schedule.license_number,
            specialization: schedule.specialization,
            created_at: now,
            updated_at: now,
        };

        schedules.insert(stored.doctor_id, stored.clone());
        Ok(stored)
    }

    async fn list_all(&self) -> Result<Vec<DoctorSchedule>> {
        let schedules = self.schedules.read().map_err(|_| anyhow!("schedule store poisoned"))?;
        Ok(schedules.values().cloned().collect())
    }

    async fn update_leave(&self, doctor_id: Uuid, leave: LeaveUpdate) -> Result<Option<DoctorSchedule>> {
        let mut schedules = self.schedules.write().map_err(|_| anyhow!("schedule store poisoned"))?;

        Ok(schedules.get_mut(&doctor_id).map(|schedule| {
            schedule.status = leave.status;
            schedule.leave_start_date = leave.leave_start_date;
            schedule.leave_end_date = leave.leave_end_date;
            schedule.updated_at = leave.updated_at;
            schedule.clone()
        }))
    }
}

#[derive(Default)]
pub struct MemoryDoctorDirectory {
    accounts: RwLock<Vec<DoctorAccount>>,
}

impl MemoryDoctorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: Vec<DoctorAccount>) -> Self {
        Self { accounts: RwLock::new(accounts) }
    }

    pub fn insert(&self, account: DoctorAccount) -> Result<()> {
        let mut accounts = self.accounts.write().map_err(|_| anyhow!("doctor directory poisoned"))?;
        accounts.retain(|existing| existing.id != account.id);
        accounts.push(account);
        Ok(())
    }
}

#[async_trait]
impl DoctorDirectory for MemoryDoctorDirectory {
    async fn verified_doctors(&self) -> Result<Vec<DoctorAccount>> {
        let accounts = self.accounts.read().map_err(|_| anyhow!("doctor directory poisoned"))?;
        let mut verified: Vec<DoctorAccount> = accounts.iter()
            .filter(|account| account.is_verified)
            .cloned()
            .collect();
        verified.sort_by_key(|account| account.id);
        Ok(verified)
    }
}
