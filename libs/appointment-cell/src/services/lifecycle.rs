// libs/appointment-cell/src/services/lifecycle.rs
use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::models::{Appointment, AppointmentStatus, BookingError};

#[derive(Debug, Clone, Copy, Default)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// All valid next statuses for a given current status.
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> &'static [AppointmentStatus] {
        match current_status {
            AppointmentStatus::Pending => &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled],
            AppointmentStatus::Confirmed => &[AppointmentStatus::Cancelled],
            // Terminal
            AppointmentStatus::Cancelled => &[],
        }
    }

    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), BookingError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(BookingError::InvalidTransition(current_status));
        }

        Ok(())
    }

    /// Cancellation is only allowed strictly before the appointment starts.
    pub fn ensure_not_started(&self, appointment: &Appointment, now: NaiveDateTime) -> Result<(), BookingError> {
        if appointment.is_expired(now) {
            return Err(BookingError::AlreadyOccurred);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        let lifecycle = AppointmentLifecycleService::new();

        assert!(lifecycle
            .validate_status_transition(AppointmentStatus::Pending, AppointmentStatus::Confirmed)
            .is_ok());
        assert!(lifecycle
            .validate_status_transition(AppointmentStatus::Pending, AppointmentStatus::Cancelled)
            .is_ok());
        assert!(lifecycle
            .validate_status_transition(AppointmentStatus::Confirmed, AppointmentStatus::Cancelled)
            .is_ok());

        assert_eq!(
            lifecycle.validate_status_transition(AppointmentStatus::Confirmed, AppointmentStatus::Confirmed),
            Err(BookingError::InvalidTransition(AppointmentStatus::Confirmed))
        );
        assert_eq!(
            lifecycle.validate_status_transition(AppointmentStatus::Cancelled, AppointmentStatus::Pending),
            Err(BookingError::InvalidTransition(AppointmentStatus::Cancelled))
        );
        assert!(lifecycle.get_valid_transitions(AppointmentStatus::Cancelled).is_empty());
    }
}
