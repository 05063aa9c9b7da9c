use std::sync::Arc;

use doctor_cell::ScheduleRepository;
use shared_config::AppConfig;

use crate::repository::{AppointmentRepository, CancellationRepository};
use crate::services::AppointmentService;

pub struct AppointmentCellState {
    pub config: Arc<AppConfig>,
    pub appointments: AppointmentService,
}

impl AppointmentCellState {
    pub fn new(
        config: Arc<AppConfig>,
        appointments: Arc<dyn AppointmentRepository>,
        cancellations: Arc<dyn CancellationRepository>,
        schedules: Arc<dyn ScheduleRepository>,
    ) -> Self {
        Self {
            config,
            appointments: AppointmentService::new(appointments, cancellations, schedules),
        }
    }
}
