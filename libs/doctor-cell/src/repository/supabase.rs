use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{DoctorAccount, DoctorSchedule, LeaveUpdate, NewDoctorSchedule};
use super::{DoctorDirectory, ScheduleRepository};

const SCHEDULES: &str = "/rest/v1/doctor_schedules";
const DOCTORS: &str = "/rest/v1/doctors";

pub struct SupabaseScheduleRepository {
    supabase: SupabaseClient,
}

impl SupabaseScheduleRepository {
    pub fn new(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl ScheduleRepository for SupabaseScheduleRepository {
    async fn find_by_doctor(&self, doctor_id: Uuid) -> Result<Option<DoctorSchedule>> {
        let path = format!("{}?doctor_id=eq.{}&limit=1", SCHEDULES, doctor_id);
        let rows: Vec<DoctorSchedule> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn create(&self, schedule: NewDoctorSchedule) -> Result<DoctorSchedule> {
        debug!("Inserting schedule for doctor {}", schedule.doctor_id);

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            SCHEDULES,
            None,
            Some(serde_json::to_value(&schedule)?),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        let row = result.into_iter().next()
            .ok_or_else(|| anyhow!("Failed to create schedule"))?;
        Ok(serde_json::from_value(row)?)
    }

    async fn list_all(&self) -> Result<Vec<DoctorSchedule>> {
        let path = format!("{}?order=doctor_id.asc", SCHEDULES);
        self.supabase.request(Method::GET, &path, None, None).await
    }

    async fn update_leave(&self, doctor_id: Uuid, leave: LeaveUpdate) -> Result<Option<DoctorSchedule>> {
        let path = format!("{}?doctor_id=eq.{}", SCHEDULES, doctor_id);

        let result: Vec<DoctorSchedule> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            None,
            Some(serde_json::to_value(&leave)?),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        Ok(result.into_iter().next())
    }
}

pub struct SupabaseDoctorDirectory {
    supabase: SupabaseClient,
}

impl SupabaseDoctorDirectory {
    pub fn new(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl DoctorDirectory for SupabaseDoctorDirectory {
    async fn verified_doctors(&self) -> Result<Vec<DoctorAccount>> {
        let path = format!(
            "{}?select=id,name,email,is_verified&is_verified=eq.true&order=id.asc",
            DOCTORS
        );
        self.supabase.request(Method::GET, &path, None, None).await
    }
}
