use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::models::DoctorSchedule;
use doctor_cell::ScheduleRepository;
use shared_database::is_unique_violation;
use shared_models::auth::Caller;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, AppointmentView,
    CancelAppointmentRequest, CancellationRecord, CompleteAppointmentRequest,
    ConfirmAppointmentRequest, CreateAppointmentRequest, DoctorAppointmentsQuery,
    NewAppointment, PatientAppointmentsQuery,
};
use crate::repository::{AppointmentFilter, AppointmentRepository, CancellationRepository};
use crate::services::cancellation::{attach_reasons, ledger_reason};
use crate::services::lifecycle::{AppointmentStateMachine, Ownership};

pub fn parse_date(raw: &str) -> Result<NaiveDate, AppointmentError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppointmentError::InvalidDate(format!("Expected YYYY-MM-DD, got '{}'", raw)))
}

fn parse_optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>, AppointmentError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value).map(Some),
    }
}

fn storage(err: anyhow::Error) -> AppointmentError {
    AppointmentError::DatabaseError(err.to_string())
}

/// Maps a failed compare-and-swap write: a unique violation means the slot was taken.
fn write_failure(err: anyhow::Error) -> AppointmentError {
    if is_unique_violation(&err) {
        AppointmentError::SlotTaken
    } else {
        storage(err)
    }
}

pub struct AppointmentService {
    appointments: Arc<dyn AppointmentRepository>,
    cancellations: Arc<dyn CancellationRepository>,
    schedules: Arc<dyn ScheduleRepository>,
    machine: AppointmentStateMachine,
}

impl AppointmentService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        cancellations: Arc<dyn CancellationRepository>,
        schedules: Arc<dyn ScheduleRepository>,
    ) -> Self {
        Self {
            appointments,
            cancellations,
            schedules,
            machine: AppointmentStateMachine::new(),
        }
    }

    async fn schedule_for(&self, doctor_id: Uuid) -> Result<DoctorSchedule, AppointmentError> {
        self.schedules.find_by_doctor(doctor_id).await
            .map_err(storage)?
            .ok_or(AppointmentError::DoctorNotFound)
    }

    async fn owned(&self, id: Uuid, owner: &Ownership) -> Result<Appointment, AppointmentError> {
        self.appointments.find_for_owner(id, owner).await
            .map_err(storage)?
            .ok_or(AppointmentError::NotFound)
    }

    fn require_template_slot(schedule: &DoctorSchedule, slot_time: &str) -> Result<(), AppointmentError> {
        if schedule.slots.iter().any(|slot| slot == slot_time) {
            Ok(())
        } else {
            Err(AppointmentError::ValidationError(format!(
                "'{}' is not one of the doctor's slots",
                slot_time
            )))
        }
    }

    // ==========================================================================
    // LIFECYCLE
    // ==========================================================================

    pub async fn create(
        &self,
        caller: &Caller,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        if !caller.is_patient() {
            return Err(AppointmentError::Unauthorized("Only patients can book appointments".to_string()));
        }

        let appointment_date = parse_date(&request.appointment_date)?;
        let schedule = self.schedule_for(request.doctor_id).await?;

        let slot_time = request.slot_time.as_deref().map(str::trim).unwrap_or_default().to_string();
        if !slot_time.is_empty() {
            Self::require_template_slot(&schedule, &slot_time)?;
        }

        let appointment = self.appointments.create(NewAppointment {
            patient_id: caller.id,
            doctor_id: request.doctor_id,
            appointment_date,
            slot_time,
            status: AppointmentStatus::Accepted,
            description: request.description.filter(|d| !d.trim().is_empty()),
            images: request.images.unwrap_or_default(),
        }).await.map_err(storage)?;

        info!(
            "Patient {} booked appointment {} with doctor {} on {}",
            caller.id, appointment.id, appointment.doctor_id, appointment.appointment_date
        );
        Ok(appointment)
    }

    pub async fn confirm(
        &self,
        caller: &Caller,
        id: Uuid,
        request: ConfirmAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let owner = Ownership::from(caller);
        let current = self.owned(id, &owner).await?;
        let proposed_date = parse_optional_date(request.appointment_date.as_deref())?;

        let slot_time = request.slot_time.trim();
        if !current.status.is_terminal() {
            let schedule = self.schedule_for(current.doctor_id).await?;
            Self::require_template_slot(&schedule, slot_time)?;
        }

        let patch = self.machine.confirm(&current, &owner, slot_time, proposed_date)?;
        let next_status = patch.status;

        let updated = self.appointments
            .update_if_status(id, current.status, patch).await
            .map_err(write_failure)?
            .ok_or(AppointmentError::ConcurrentModification)?;

        info!("Appointment {} {} -> {} by {}", id, current.status, next_status, owner.role());
        Ok(updated)
    }

    pub async fn complete(
        &self,
        caller: &Caller,
        id: Uuid,
        request: CompleteAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let owner = Ownership::from(caller);
        let current = self.owned(id, &owner).await?;
        let next_appointment_date = parse_optional_date(request.next_appointment_date.as_deref())?;

        let patch = self.machine.complete(&current, &owner, request.prescription, next_appointment_date)?;

        let updated = self.appointments
            .update_if_status(id, current.status, patch).await
            .map_err(write_failure)?
            .ok_or(AppointmentError::ConcurrentModification)?;

        info!("Appointment {} completed by doctor {}", id, caller.id);
        Ok(updated)
    }

    pub async fn cancel(
        &self,
        caller: &Caller,
        id: Uuid,
        request: CancelAppointmentRequest,
    ) -> Result<(Appointment, CancellationRecord), AppointmentError> {
        let owner = Ownership::from(caller);
        let current = self.owned(id, &owner).await?;
        self.machine.cancel(&current, &owner)?;
        let reason = ledger_reason(owner.role(), &request.reason)?;

        let (cancelled, record) = self.appointments
            .cancel_if_status(id, &owner, current.status, reason).await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppointmentError::ConcurrentModification
                } else {
                    storage(e)
                }
            })?
            .ok_or(AppointmentError::ConcurrentModification)?;

        info!("Appointment {} cancelled by {}", id, owner.role());
        Ok((cancelled, record))
    }

    pub async fn delete(&self, caller: &Caller, id: Uuid) -> Result<(), AppointmentError> {
        let owner = Ownership::from(caller);
        let current = self.owned(id, &owner).await?;
        self.machine.delete(&current, &owner)?;

        let removed = self.appointments
            .delete_if_status(id, caller.id, current.status).await
            .map_err(storage)?;
        if !removed {
            warn!("Appointment {} changed before it could be deleted", id);
            return Err(AppointmentError::ConcurrentModification);
        }

        info!("Appointment {} deleted by patient {}", id, caller.id);
        Ok(())
    }

    // ==========================================================================
    // QUERIES
    // ==========================================================================

    pub async fn get(&self, caller: &Caller, id: Uuid) -> Result<AppointmentView, AppointmentError> {
        let owner = Ownership::from(caller);
        let appointment = self.owned(id, &owner).await?;

        let cancellation_reason = if appointment.status == AppointmentStatus::Cancelled {
            self.cancellations.find_by_appointment(id).await
                .map_err(storage)?
                .map(|record| record.reason)
        } else {
            None
        };

        Ok(AppointmentView { appointment, cancellation_reason })
    }

    pub async fn doctor_appointments(
        &self,
        caller: &Caller,
        query: DoctorAppointmentsQuery,
    ) -> Result<Vec<AppointmentView>, AppointmentError> {
        if !caller.is_doctor() {
            return Err(AppointmentError::Unauthorized("Only doctors can list their appointments".to_string()));
        }

        let filter = AppointmentFilter::Doctor {
            doctor_id: caller.id,
            status: query.status,
            date: parse_date(&query.date)?,
        };
        self.list_with_reasons(&filter).await
    }

    pub async fn patient_appointments(
        &self,
        caller: &Caller,
        query: PatientAppointmentsQuery,
    ) -> Result<Vec<AppointmentView>, AppointmentError> {
        if !caller.is_patient() {
            return Err(AppointmentError::Unauthorized("Only patients can list their bookings".to_string()));
        }

        let from = parse_optional_date(query.from.as_deref())?;
        let to = parse_optional_date(query.to.as_deref())?;
        if let (Some(from), Some(to)) = (from, to) {
            if to < from {
                return Err(AppointmentError::ValidationError("'to' must not precede 'from'".to_string()));
            }
        }

        let filter = AppointmentFilter::Patient {
            patient_id: caller.id,
            status: query.status,
            from,
            to,
        };
        self.list_with_reasons(&filter).await
    }

    async fn list_with_reasons(&self, filter: &AppointmentFilter) -> Result<Vec<AppointmentView>, AppointmentError> {
        let appointments = self.appointments.list(filter).await.map_err(storage)?;

        let cancelled: Vec<Uuid> = appointments.iter()
            .filter(|a| a.status == AppointmentStatus::Cancelled)
            .map(|a| a.id)
            .collect();
        let reasons = self.cancellations.reasons_for(&cancelled).await.map_err(storage)?;

        debug!("Listed {} appointments ({} cancelled)", appointments.len(), cancelled.len());
        Ok(attach_reasons(appointments, &reasons))
    }
}
