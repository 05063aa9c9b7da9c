use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::{Caller, Role};

use crate::models::{Appointment, AppointmentError, AppointmentPatch, AppointmentStatus};

/// Which side of an appointment the caller is on. Resolved once per operation and used
/// both to scope storage lookups and to pick the transition rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Doctor(Uuid),
    Patient(Uuid),
}

impl Ownership {
    pub fn id(&self) -> Uuid {
        match self {
            Ownership::Doctor(id) | Ownership::Patient(id) => *id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Ownership::Doctor(_) => Role::Doctor,
            Ownership::Patient(_) => Role::Patient,
        }
    }

    /// Appointment column holding this side's id.
    pub fn column(&self) -> &'static str {
        match self {
            Ownership::Doctor(_) => "doctor_id",
            Ownership::Patient(_) => "patient_id",
        }
    }

    pub fn owns(&self, appointment: &Appointment) -> bool {
        match self {
            Ownership::Doctor(id) => appointment.doctor_id == *id,
            Ownership::Patient(id) => appointment.patient_id == *id,
        }
    }
}

impl From<&Caller> for Ownership {
    fn from(caller: &Caller) -> Self {
        match caller.role {
            Role::Doctor => Ownership::Doctor(caller.id),
            Role::Patient => Ownership::Patient(caller.id),
        }
    }
}

/// Transition rules for a single appointment. Produces the patch to write; persisting it
/// with a status precondition is the caller's job.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentStateMachine;

impl AppointmentStateMachine {
    pub fn new() -> Self {
        Self
    }

    /// Doctor: same slot and date confirms, anything else is a counter-proposal.
    /// Patient: always confirms with the supplied slot.
    pub fn confirm(
        &self,
        current: &Appointment,
        actor: &Ownership,
        slot_time: &str,
        appointment_date: Option<NaiveDate>,
    ) -> Result<AppointmentPatch, AppointmentError> {
        if !actor.owns(current) {
            return Err(AppointmentError::NotFound);
        }
        if current.status.is_terminal() {
            return Err(AppointmentError::NoActiveAppointment);
        }

        let date = appointment_date.unwrap_or(current.appointment_date);
        let status = match actor {
            Ownership::Doctor(_) => {
                if slot_time == current.slot_time && date == current.appointment_date {
                    AppointmentStatus::Confirmed
                } else {
                    AppointmentStatus::Pending
                }
            }
            Ownership::Patient(_) => AppointmentStatus::Confirmed,
        };

        debug!(
            "Appointment {}: {} -> {} by {}",
            current.id, current.status, status, actor.role()
        );

        let mut patch = AppointmentPatch::status(status);
        patch.slot_time = Some(slot_time.to_string());
        patch.appointment_date = Some(date);
        Ok(patch)
    }

    pub fn complete(
        &self,
        current: &Appointment,
        actor: &Ownership,
        prescription: Option<String>,
        next_appointment_date: Option<NaiveDate>,
    ) -> Result<AppointmentPatch, AppointmentError> {
        match actor {
            Ownership::Doctor(_) if actor.owns(current) => {}
            _ => return Err(AppointmentError::NotFound),
        }
        if current.status.is_terminal() {
            return Err(AppointmentError::NoActiveAppointment);
        }

        let mut patch = AppointmentPatch::status(AppointmentStatus::Completed);
        patch.prescription = prescription.filter(|p| !p.trim().is_empty());
        patch.next_appointment_date = next_appointment_date;
        Ok(patch)
    }

    pub fn cancel(&self, current: &Appointment, actor: &Ownership) -> Result<(), AppointmentError> {
        if !actor.owns(current) {
            return Err(AppointmentError::NotFound);
        }
        if current.status.is_terminal() {
            return Err(AppointmentError::NoActiveAppointment);
        }
        Ok(())
    }

    /// Only the booking patient may delete. Any status is removable; the ledger row outlives it.
    pub fn delete(&self, current: &Appointment, actor: &Ownership) -> Result<(), AppointmentError> {
        match actor {
            Ownership::Patient(_) if actor.owns(current) => Ok(()),
            _ => Err(AppointmentError::NotFound),
        }
    }
}
