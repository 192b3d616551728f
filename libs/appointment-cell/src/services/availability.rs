// libs/appointment-cell/src/services/availability.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use doctor_cell::services::UserDirectory;

use crate::models::{BookingError, TimeSlot};
use crate::services::store::AppointmentStore;

/// Open slots for a doctor on a date: the daily schedule minus active bookings.
///
/// Always read through to the store so concurrent bookings are reflected.
pub struct SlotAvailabilityResolver {
    store: Arc<dyn AppointmentStore>,
    directory: Arc<dyn UserDirectory>,
}

impl SlotAvailabilityResolver {
    pub fn new(store: Arc<dyn AppointmentStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { store, directory }
    }

    /// Past dates are still resolved for display; booking them is rejected elsewhere.
    pub async fn available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>, BookingError> {
        self.directory
            .find_doctor(doctor_id)
            .await
            .map_err(|e| BookingError::Store(e.to_string()))?
            .ok_or(BookingError::InvalidDoctor)?;

        let booked: HashSet<TimeSlot> = self
            .store
            .booked_slots(doctor_id, date)
            .await?
            .into_iter()
            .collect();

        let available: Vec<TimeSlot> = TimeSlot::all().filter(|slot| !booked.contains(slot)).collect();

        debug!("Doctor {} on {}: {} booked, {} available", doctor_id, date, booked.len(), available.len());
        Ok(available)
    }
}
