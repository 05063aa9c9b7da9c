use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentPatch, AppointmentStatus, CancellationRecord, NewAppointment,
};
use crate::services::lifecycle::Ownership;

pub mod memory;
pub mod supabase;

pub use supabase::{SupabaseAppointmentRepository, SupabaseCancellationRepository};

#[derive(Debug, Clone, PartialEq)]
pub enum AppointmentFilter {
    /// Open statuses match on `appointment_date`; resolved ones on the day they were last updated.
    Doctor {
        doctor_id: Uuid,
        status: AppointmentStatus,
        date: NaiveDate,
    },
    Patient {
        patient_id: Uuid,
        status: Option<AppointmentStatus>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn find_for_owner(&self, id: Uuid, owner: &Ownership) -> Result<Option<Appointment>>;

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>>;

    async fn create(&self, appointment: NewAppointment) -> Result<Appointment>;

    /// Writes `patch` only while the row still has status `expected`; `None` otherwise.
    /// A second confirmed row for the same doctor, date and slot fails with
    /// `DatabaseError::UniqueViolation`.
    async fn update_if_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        patch: AppointmentPatch,
    ) -> Result<Option<Appointment>>;

    /// Moves the row to `Cancelled` and appends its ledger record in one step.
    async fn cancel_if_status(
        &self,
        id: Uuid,
        owner: &Ownership,
        expected: AppointmentStatus,
        reason: String,
    ) -> Result<Option<(Appointment, CancellationRecord)>>;

    async fn delete_if_status(&self, id: Uuid, patient_id: Uuid, expected: AppointmentStatus) -> Result<bool>;
}

#[async_trait]
pub trait CancellationRepository: Send + Sync {
    async fn find_by_appointment(&self, appointment_id: Uuid) -> Result<Option<CancellationRecord>>;

    /// Reasons keyed by appointment id; appointments without a record are absent.
    async fn reasons_for(&self, appointment_ids: &[Uuid]) -> Result<HashMap<Uuid, String>>;
}
