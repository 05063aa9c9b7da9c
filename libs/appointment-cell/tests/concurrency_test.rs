mod common;

use std::sync::Arc;

use appointment_cell::models::{
    AppointmentError, AppointmentPatch, AppointmentStatus, ConfirmAppointmentRequest,
};
use appointment_cell::AppointmentRepository;
use appointment_cell::services::AppointmentService;
use doctor_cell::BookedSlots;
use shared_models::auth::Caller;
use uuid::Uuid;

use common::{book, booking, clinic, DATE, SLOT_X};

fn confirm(slot: &str) -> ConfirmAppointmentRequest {
    ConfirmAppointmentRequest { slot_time: slot.to_string(), appointment_date: None }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_confirms_leave_one_confirmed_row() {
    let clinic = clinic().await;
    let service: &AppointmentService = &clinic.state.appointments;

    let second_patient = Caller::patient(Uuid::new_v4());
    let first = book(&clinic, SLOT_X).await;
    let second = service.create(&second_patient, booking(clinic.doctor.id, SLOT_X)).await.unwrap();

    let state_a = clinic.state.clone();
    let state_b = clinic.state.clone();
    let doctor = clinic.doctor;

    let (a, b) = tokio::join!(
        tokio::spawn(async move { state_a.appointments.confirm(&doctor, first.id, confirm(SLOT_X)).await }),
        tokio::spawn(async move { state_b.appointments.confirm(&doctor, second.id, confirm(SLOT_X)).await }),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    let winners = outcomes.iter().filter(|o| o.is_ok()).count();
    let conflicts = outcomes.iter()
        .filter(|o| matches!(o, Err(AppointmentError::SlotTaken)))
        .count();
    assert_eq!(winners, 1);
    assert_eq!(conflicts, 1);

    let booked = clinic.store.confirmed_slots(clinic.doctor.id, DATE.parse().unwrap()).await.unwrap();
    assert_eq!(booked, vec![SLOT_X]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_patients_one_slot() {
    let clinic = clinic().await;

    let mut ids = Vec::new();
    for _ in 0..8 {
        let patient = Caller::patient(Uuid::new_v4());
        let appointment = clinic.state.appointments
            .create(&patient, booking(clinic.doctor.id, SLOT_X))
            .await
            .unwrap();
        ids.push((patient, appointment.id));
    }

    let handles: Vec<_> = ids.into_iter()
        .map(|(patient, id)| {
            let state = Arc::clone(&clinic.state);
            tokio::spawn(async move { state.appointments.confirm(&patient, id, confirm(SLOT_X)).await })
        })
        .collect();

    let mut confirmed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(appointment) => {
                assert_eq!(appointment.status, AppointmentStatus::Confirmed);
                confirmed += 1;
            }
            Err(err) => assert_eq!(err, AppointmentError::SlotTaken),
        }
    }
    assert_eq!(confirmed, 1);
}

#[tokio::test]
async fn test_stale_transition_is_a_conflict() {
    let clinic = clinic().await;
    let appointment = book(&clinic, SLOT_X).await;

    // The doctor moves the record on underneath a stale status read
    clinic.state.appointments
        .confirm(&clinic.doctor, appointment.id, confirm(SLOT_X))
        .await
        .unwrap();

    let stale = clinic.store
        .update_if_status(appointment.id, AppointmentStatus::Accepted, AppointmentPatch::status(AppointmentStatus::Pending))
        .await
        .unwrap();
    assert!(stale.is_none());
}
