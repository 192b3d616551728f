// libs/appointment-cell/src/state.rs
use std::sync::Arc;

use doctor_cell::services::UserDirectory;
use shared_config::AppConfig;
use shared_utils::clock::Clock;

use crate::services::{
    AppointmentStore, BookingTransactionManager, DoctorDashboardService, SlotAvailabilityResolver,
};

/// Collaborators shared by every appointment request.
#[derive(Clone)]
pub struct AppointmentState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn AppointmentStore>,
    pub directory: Arc<dyn UserDirectory>,
    pub clock: Arc<dyn Clock>,
}

impl AppointmentState {
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn AppointmentStore>,
        directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { config, store, directory, clock }
    }

    pub fn booking_manager(&self) -> BookingTransactionManager {
        BookingTransactionManager::new(
            Arc::clone(&self.store),
            Arc::clone(&self.directory),
            Arc::clone(&self.clock),
        )
    }

    pub fn availability_resolver(&self) -> SlotAvailabilityResolver {
        SlotAvailabilityResolver::new(Arc::clone(&self.store), Arc::clone(&self.directory))
    }

    pub fn dashboard_service(&self) -> DoctorDashboardService {
        DoctorDashboardService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.directory),
            Arc::clone(&self.clock),
        )
    }
}
