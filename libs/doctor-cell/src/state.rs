use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::repository::{
    BookedSlots, DoctorDirectory, ScheduleRepository, SupabaseDoctorDirectory,
    SupabaseScheduleRepository,
};
use crate::services::{AvailabilityService, ScheduleService};

pub struct DoctorCellState {
    pub config: Arc<AppConfig>,
    pub schedules: ScheduleService,
    pub availability: AvailabilityService,
}

impl DoctorCellState {
    pub fn new(
        config: Arc<AppConfig>,
        schedules: Arc<dyn ScheduleRepository>,
        directory: Arc<dyn DoctorDirectory>,
        booked: Arc<dyn BookedSlots>,
    ) -> Self {
        Self {
            config,
            schedules: ScheduleService::new(schedules.clone()),
            availability: AvailabilityService::new(schedules, directory, booked),
        }
    }

    /// Supabase-backed state. Confirmed bookings come from the appointment store,
    /// which the caller supplies.
    pub fn from_config(config: Arc<AppConfig>, booked: Arc<dyn BookedSlots>) -> Self {
        let supabase = SupabaseClient::new(&config);
        Self::new(
            config,
            Arc::new(SupabaseScheduleRepository::new(supabase.clone())),
            Arc::new(SupabaseDoctorDirectory::new(supabase)),
            booked,
        )
    }
}
