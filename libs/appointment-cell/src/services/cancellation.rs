use std::collections::HashMap;

use uuid::Uuid;

use shared_models::auth::Role;

use crate::models::{Appointment, AppointmentError, AppointmentStatus, AppointmentView};

pub fn reason_prefix(role: Role) -> &'static str {
    match role {
        Role::Doctor => "Cancel reason by doctor: ",
        Role::Patient => "Cancel reason by patient: ",
    }
}

/// Ledger text for a cancellation: the cancelling side followed by their reason.
pub fn ledger_reason(role: Role, reason: &str) -> Result<String, AppointmentError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppointmentError::ValidationError(
            "A cancellation reason is required".to_string(),
        ));
    }
    Ok(format!("{}{}", reason_prefix(role), reason))
}

/// Attaches ledger reasons to cancelled appointments; other statuses get `None`.
pub fn attach_reasons(appointments: Vec<Appointment>, reasons: &HashMap<Uuid, String>) -> Vec<AppointmentView> {
    appointments
        .into_iter()
        .map(|appointment| {
            let cancellation_reason = match appointment.status {
                AppointmentStatus::Cancelled => reasons.get(&appointment.id).cloned(),
                _ => None,
            };
            AppointmentView { appointment, cancellation_reason }
        })
        .collect()
}
