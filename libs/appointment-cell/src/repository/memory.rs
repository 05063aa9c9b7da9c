//! Appointment store held in process memory. Every write runs under one lock, which gives
//! the same guarantees the database provides with its partial unique index and the
//! `cancel_appointment` function.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use doctor_cell::BookedSlots;
use shared_database::DatabaseError;

use crate::models::{
    Appointment, AppointmentPatch, AppointmentStatus, CancellationRecord, NewAppointment,
};
use crate::services::lifecycle::Ownership;
use super::{AppointmentFilter, AppointmentRepository, CancellationRepository};

#[derive(Default)]
struct StoreInner {
    appointments: BTreeMap<Uuid, Appointment>,
    cancellations: Vec<CancellationRecord>,
}

impl StoreInner {
    fn slot_taken(&self, candidate: &Appointment) -> bool {
        candidate.status == AppointmentStatus::Confirmed
            && self.appointments.values().any(|other| {
                other.id != candidate.id
                    && other.status == AppointmentStatus::Confirmed
                    && other.doctor_id == candidate.doctor_id
                    && other.appointment_date == candidate.appointment_date
                    && other.slot_time == candidate.slot_time
            })
    }
}

#[derive(Default)]
pub struct MemoryAppointmentStore {
    inner: Mutex<StoreInner>,
}

impl MemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>> {
        self.inner.lock().map_err(|_| anyhow!("appointment store poisoned"))
    }

    /// Inserts a row as-is, bypassing the lifecycle. Test setup uses it to seed resolved records.
    pub fn insert_raw(&self, appointment: Appointment) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.slot_taken(&appointment) {
            return Err(DatabaseError::UniqueViolation("confirmed slot already taken".to_string()).into());
        }
        inner.appointments.insert(appointment.id, appointment);
        Ok(())
    }

    pub fn cancellation_count(&self, appointment_id: Uuid) -> Result<usize> {
        let inner = self.lock()?;
        Ok(inner.cancellations.iter().filter(|c| c.appointment_id == appointment_id).count())
    }
}

fn matches_filter(appointment: &Appointment, filter: &AppointmentFilter) -> bool {
    match filter {
        AppointmentFilter::Doctor { doctor_id, status, date } => {
            appointment.doctor_id == *doctor_id
                && appointment.status == *status
                && if status.is_terminal() {
                    appointment.updated_at.date_naive() == *date
                } else {
                    appointment.appointment_date == *date
                }
        }
        AppointmentFilter::Patient { patient_id, status, from, to } => {
            appointment.patient_id == *patient_id
                && status.map_or(true, |s| appointment.status == s)
                && from.map_or(true, |from| appointment.appointment_date >= from)
                && to.map_or(true, |to| appointment.appointment_date <= to)
        }
    }
}

#[async_trait]
impl AppointmentRepository for MemoryAppointmentStore {
    async fn find_for_owner(&self, id: Uuid, owner: &Ownership) -> Result<Option<Appointment>> {
        let inner = self.lock()?;
        Ok(inner.appointments.get(&id).filter(|a| owner.owns(a)).cloned())
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>> {
        let inner = self.lock()?;
        let mut rows: Vec<Appointment> = inner.appointments.values()
            .filter(|a| matches_filter(a, filter))
            .cloned()
            .collect();
        rows.sort_by_key(|a| (a.appointment_date, a.created_at));
        Ok(rows)
    }

    async fn create(&self, appointment: NewAppointment) -> Result<Appointment> {
        let now = Utc::now();
        let stored = Appointment {
            id: Uuid::new_v4(),
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            appointment_date: appointment.appointment_date,
            slot_time: appointment.slot_time,
            status: appointment.status,
            description: appointment.description,
            images: appointment.images,
            prescription: None,
            next_appointment_date: None,
            created_at: now,
            updated_at: now,
        };

        self.insert_raw(stored.clone())?;
        Ok(stored)
    }

    async fn update_if_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        patch: AppointmentPatch,
    ) -> Result<Option<Appointment>> {
        let mut inner = self.lock()?;

        let mut updated = match inner.appointments.get(&id) {
            Some(current) if current.status == expected => current.clone(),
            _ => return Ok(None),
        };
        patch.apply(&mut updated);

        if inner.slot_taken(&updated) {
            return Err(DatabaseError::UniqueViolation(format!(
                "slot {} on {} already confirmed for doctor {}",
                updated.slot_time, updated.appointment_date, updated.doctor_id
            ))
            .into());
        }

        inner.appointments.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn cancel_if_status(
        &self,
        id: Uuid,
        owner: &Ownership,
        expected: AppointmentStatus,
        reason: String,
    ) -> Result<Option<(Appointment, CancellationRecord)>> {
        let mut inner = self.lock()?;

        let mut cancelled = match inner.appointments.get(&id) {
            Some(current) if current.status == expected && owner.owns(current) => current.clone(),
            _ => return Ok(None),
        };
        if inner.cancellations.iter().any(|c| c.appointment_id == id) {
            return Err(DatabaseError::UniqueViolation(format!("appointment {} already has a cancellation", id)).into());
        }

        let now = Utc::now();
        cancelled.status = AppointmentStatus::Cancelled;
        cancelled.updated_at = now;

        let record = CancellationRecord {
            id: Uuid::new_v4(),
            appointment_id: id,
            doctor_id: cancelled.doctor_id,
            patient_id: cancelled.patient_id,
            reason,
            created_at: now,
        };

        inner.appointments.insert(id, cancelled.clone());
        inner.cancellations.push(record.clone());
        Ok(Some((cancelled, record)))
    }

    async fn delete_if_status(&self, id: Uuid, patient_id: Uuid, expected: AppointmentStatus) -> Result<bool> {
        let mut inner = self.lock()?;

        let removable = inner.appointments.get(&id)
            .is_some_and(|a| a.patient_id == patient_id && a.status == expected);
        if removable {
            inner.appointments.remove(&id);
        }
        Ok(removable)
    }
}

#[async_trait]
impl CancellationRepository for MemoryAppointmentStore {
    async fn find_by_appointment(&self, appointment_id: Uuid) -> Result<Option<CancellationRecord>> {
        let inner = self.lock()?;
        Ok(inner.cancellations.iter().find(|c| c.appointment_id == appointment_id).cloned())
    }

    async fn reasons_for(&self, appointment_ids: &[Uuid]) -> Result<HashMap<Uuid, String>> {
        let inner = self.lock()?;
        Ok(inner.cancellations.iter()
            .filter(|c| appointment_ids.contains(&c.appointment_id))
            .map(|c| (c.appointment_id, c.reason.clone()))
            .collect())
    }
}

#[async_trait]
impl BookedSlots for MemoryAppointmentStore {
    async fn confirmed_slots(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<String>> {
        let inner = self.lock()?;
        Ok(inner.appointments.values()
            .filter(|a| {
                a.status == AppointmentStatus::Confirmed
                    && a.doctor_id == doctor_id
                    && a.appointment_date == date
            })
            .map(|a| a.slot_time.clone())
            .collect())
    }

    async fn confirmed_slots_on(&self, date: NaiveDate) -> Result<HashMap<Uuid, Vec<String>>> {
        let inner = self.lock()?;
        let mut by_doctor: HashMap<Uuid, Vec<String>> = HashMap::new();
        for appointment in inner.appointments.values() {
            if appointment.status == AppointmentStatus::Confirmed && appointment.appointment_date == date {
                by_doctor.entry(appointment.doctor_id).or_default().push(appointment.slot_time.clone());
            }
        }
        Ok(by_doctor)
    }
}
