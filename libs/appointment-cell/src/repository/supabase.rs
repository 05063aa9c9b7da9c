use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use doctor_cell::BookedSlots;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Appointment, AppointmentPatch, AppointmentStatus, CancellationRecord, NewAppointment,
};
use crate::services::lifecycle::Ownership;
use super::{AppointmentFilter, AppointmentRepository, CancellationRepository};

const APPOINTMENTS: &str = "/rest/v1/appointments";
const CANCELLATIONS: &str = "/rest/v1/cancellations";

#[derive(Deserialize)]
struct CancelOutcome {
    appointment: Appointment,
    cancellation: CancellationRecord,
}

#[derive(Deserialize)]
struct ConfirmedSlotRow {
    doctor_id: Uuid,
    slot_time: String,
}

#[derive(Deserialize)]
struct ReasonRow {
    appointment_id: Uuid,
    reason: String,
}

pub struct SupabaseAppointmentRepository {
    supabase: SupabaseClient,
}

impl SupabaseAppointmentRepository {
    pub fn new(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }

    async fn confirmed_rows(&self, date: NaiveDate, doctor_id: Option<Uuid>) -> Result<Vec<ConfirmedSlotRow>> {
        let mut path = format!(
            "{}?select=doctor_id,slot_time&status=eq.{}&appointment_date=eq.{}",
            APPOINTMENTS,
            AppointmentStatus::Confirmed,
            date
        );
        if let Some(doctor_id) = doctor_id {
            path.push_str(&format!("&doctor_id=eq.{}", doctor_id));
        }
        self.supabase.request(Method::GET, &path, None, None).await
    }
}

/// Bounds of one UTC day, encoded for a PostgREST filter value.
fn day_bounds(date: NaiveDate) -> (String, String) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::days(1);
    (
        urlencoding::encode(&start.to_rfc3339()).into_owned(),
        urlencoding::encode(&end.to_rfc3339()).into_owned(),
    )
}

fn filter_query(filter: &AppointmentFilter) -> String {
    match filter {
        AppointmentFilter::Doctor { doctor_id, status, date } => {
            let mut query = format!("doctor_id=eq.{}&status=eq.{}", doctor_id, status);
            if status.is_terminal() {
                let (start, end) = day_bounds(*date);
                query.push_str(&format!("&updated_at=gte.{}&updated_at=lt.{}", start, end));
            } else {
                query.push_str(&format!("&appointment_date=eq.{}", date));
            }
            query.push_str("&order=created_at.asc");
            query
        }
        AppointmentFilter::Patient { patient_id, status, from, to } => {
            let mut query = format!("patient_id=eq.{}", patient_id);
            if let Some(status) = status {
                query.push_str(&format!("&status=eq.{}", status));
            }
            if let Some(from) = from {
                query.push_str(&format!("&appointment_date=gte.{}", from));
            }
            if let Some(to) = to {
                query.push_str(&format!("&appointment_date=lte.{}", to));
            }
            query.push_str("&order=appointment_date.asc,created_at.asc");
            query
        }
    }
}

#[async_trait]
impl AppointmentRepository for SupabaseAppointmentRepository {
    async fn find_for_owner(&self, id: Uuid, owner: &Ownership) -> Result<Option<Appointment>> {
        let path = format!(
            "{}?id=eq.{}&{}=eq.{}&limit=1",
            APPOINTMENTS, id, owner.column(), owner.id()
        );
        let rows: Vec<Appointment> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>> {
        let path = format!("{}?{}", APPOINTMENTS, filter_query(filter));
        self.supabase.request(Method::GET, &path, None, None).await
    }

    async fn create(&self, appointment: NewAppointment) -> Result<Appointment> {
        debug!("Inserting appointment for patient {} with doctor {}", appointment.patient_id, appointment.doctor_id);

        let result: Vec<Appointment> = self.supabase.request_with_headers(
            Method::POST,
            APPOINTMENTS,
            None,
            Some(serde_json::to_value(&appointment)?),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        result.into_iter().next().ok_or_else(|| anyhow!("Failed to create appointment"))
    }

    async fn update_if_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        patch: AppointmentPatch,
    ) -> Result<Option<Appointment>> {
        let path = format!("{}?id=eq.{}&status=eq.{}", APPOINTMENTS, id, expected);

        let result: Vec<Appointment> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            None,
            Some(serde_json::to_value(&patch)?),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        if result.is_empty() {
            warn!("Appointment {} no longer {}; update skipped", id, expected);
        }
        Ok(result.into_iter().next())
    }

    async fn cancel_if_status(
        &self,
        id: Uuid,
        owner: &Ownership,
        expected: AppointmentStatus,
        reason: String,
    ) -> Result<Option<(Appointment, CancellationRecord)>> {
        let (doctor_id, patient_id) = match owner {
            Ownership::Doctor(id) => (Some(*id), None),
            Ownership::Patient(id) => (None, Some(*id)),
        };

        let outcome: Value = self.supabase.rpc("cancel_appointment", json!({
            "p_appointment_id": id,
            "p_doctor_id": doctor_id,
            "p_patient_id": patient_id,
            "p_expected_status": expected,
            "p_reason": reason
        })).await?;

        if outcome.is_null() {
            return Ok(None);
        }

        let outcome: CancelOutcome = serde_json::from_value(outcome)?;
        Ok(Some((outcome.appointment, outcome.cancellation)))
    }

    async fn delete_if_status(&self, id: Uuid, patient_id: Uuid, expected: AppointmentStatus) -> Result<bool> {
        let path = format!(
            "{}?id=eq.{}&patient_id=eq.{}&status=eq.{}",
            APPOINTMENTS, id, patient_id, expected
        );

        let removed: Vec<Value> = self.supabase.request_with_headers(
            Method::DELETE,
            &path,
            None,
            None,
            Some(SupabaseClient::representation_headers()),
        ).await?;

        Ok(!removed.is_empty())
    }
}

#[async_trait]
impl BookedSlots for SupabaseAppointmentRepository {
    async fn confirmed_slots(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<String>> {
        let rows = self.confirmed_rows(date, Some(doctor_id)).await?;
        Ok(rows.into_iter().map(|row| row.slot_time).collect())
    }

    async fn confirmed_slots_on(&self, date: NaiveDate) -> Result<HashMap<Uuid, Vec<String>>> {
        let rows = self.confirmed_rows(date, None).await?;

        let mut by_doctor: HashMap<Uuid, Vec<String>> = HashMap::new();
        for row in rows {
            by_doctor.entry(row.doctor_id).or_default().push(row.slot_time);
        }
        Ok(by_doctor)
    }
}

pub struct SupabaseCancellationRepository {
    supabase: SupabaseClient,
}

impl SupabaseCancellationRepository {
    pub fn new(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl CancellationRepository for SupabaseCancellationRepository {
    async fn find_by_appointment(&self, appointment_id: Uuid) -> Result<Option<CancellationRecord>> {
        let path = format!("{}?appointment_id=eq.{}&limit=1", CANCELLATIONS, appointment_id);
        let rows: Vec<CancellationRecord> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn reasons_for(&self, appointment_ids: &[Uuid]) -> Result<HashMap<Uuid, String>> {
        if appointment_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids = appointment_ids.iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let path = format!("{}?select=appointment_id,reason&appointment_id=in.({})", CANCELLATIONS, ids);

        let rows: Vec<ReasonRow> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(rows.into_iter().map(|row| (row.appointment_id, row.reason)).collect())
    }
}
