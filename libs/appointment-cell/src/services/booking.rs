// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::services::UserDirectory;
use shared_utils::clock::Clock;

use crate::models::{
    Appointment, AppointmentListing, AppointmentStatus, AppointmentView, BookAppointmentRequest,
    BookingError, CancelOutcome, NewAppointment, sort_newest_first, MAX_ACTIVE_PER_PATIENT_PER_DAY,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::store::{AppointmentStore, StoreError};

/// Lost compare-and-set races are re-evaluated at most this many times.
const MAX_STATUS_ATTEMPTS: usize = 3;

#[derive(Debug, Clone)]
pub struct BookingRules {
    pub max_active_per_patient_per_day: usize,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            max_active_per_patient_per_day: MAX_ACTIVE_PER_PATIENT_PER_DAY,
        }
    }
}

/// Validates and commits bookings and drives their status transitions.
pub struct BookingTransactionManager {
    store: Arc<dyn AppointmentStore>,
    directory: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
    lifecycle: AppointmentLifecycleService,
    rules: BookingRules,
}

impl BookingTransactionManager {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_rules(store, directory, clock, BookingRules::default())
    }

    pub fn with_rules(
        store: Arc<dyn AppointmentStore>,
        directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
        rules: BookingRules,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
            lifecycle: AppointmentLifecycleService::new(),
            rules,
        }
    }

    pub async fn create_booking(
        &self,
        patient_id: Uuid,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, BookingError> {
        info!("Booking {} on {} for patient {} with doctor {}",
              request.time_slot, request.date, patient_id, request.doctor_id);

        // **Step 1: Doctor must exist and hold the doctor role**
        self.directory
            .find_doctor(request.doctor_id)
            .await
            .map_err(|e| BookingError::Store(e.to_string()))?
            .ok_or_else(|| {
                warn!("Booking rejected: {} is not a doctor", request.doctor_id);
                BookingError::InvalidDoctor
            })?;

        // **Step 2: No past dates**
        let today = self.clock.today();
        if request.date < today {
            warn!("Booking rejected: {} is before {}", request.date, today);
            return Err(BookingError::PastDate(request.date));
        }

        // **Step 3: Patient daily limit**
        let active = self.store.active_count_for_patient(patient_id, request.date).await?;
        if active >= self.rules.max_active_per_patient_per_day {
            warn!("Booking rejected: patient {} already has {} active appointments on {}",
                  patient_id, active, request.date);
            return Err(BookingError::DailyLimitExceeded(request.date));
        }

        // **Step 4: Slot must be free**
        let slot_conflict = BookingError::SlotAlreadyBooked {
            date: request.date,
            slot: request.time_slot,
        };
        if self.store.slot_is_taken(request.doctor_id, request.date, request.time_slot).await? {
            warn!("Booking rejected: doctor {} already booked at {} on {}",
                  request.doctor_id, request.time_slot, request.date);
            return Err(slot_conflict);
        }

        // **Step 5: Constrained insert; the store has the final word**
        let new_appointment = NewAppointment {
            patient_id,
            doctor_id: request.doctor_id,
            date: request.date,
            time_slot: request.time_slot,
            reason: request.reason.filter(|r| !r.trim().is_empty()),
            created_at: self.clock.now(),
        };

        let appointment = self
            .store
            .insert(new_appointment, self.rules.max_active_per_patient_per_day)
            .await
            .map_err(|e| match e {
                StoreError::SlotTaken => {
                    warn!("Slot {} on {} taken by a concurrent booking", request.time_slot, request.date);
                    slot_conflict
                }
                StoreError::DailyLimitReached => {
                    warn!("Patient {} reached the daily limit concurrently", patient_id);
                    BookingError::DailyLimitExceeded(request.date)
                }
                other => other.into(),
            })?;

        info!("Appointment {} booked, awaiting confirmation", appointment.id);
        Ok(appointment)
    }

    /// Cancel on behalf of the appointment's patient or doctor.
    pub async fn cancel_booking(
        &self,
        appointment_id: Uuid,
        actor_id: Uuid,
    ) -> Result<CancelOutcome, BookingError> {
        let mut appointment = self.load(appointment_id).await?;

        if !appointment.involves(actor_id) {
            warn!("User {} may not cancel appointment {}", actor_id, appointment_id);
            return Err(BookingError::PermissionDenied);
        }

        self.lifecycle.ensure_not_started(&appointment, self.clock.now())?;

        for _ in 0..MAX_STATUS_ATTEMPTS {
            if appointment.status == AppointmentStatus::Cancelled {
                warn!("Appointment {} is already cancelled", appointment_id);
                return Ok(CancelOutcome::AlreadyCancelled(appointment));
            }

            self.lifecycle
                .validate_status_transition(appointment.status, AppointmentStatus::Cancelled)?;

            match self
                .store
                .set_status(appointment_id, appointment.status, AppointmentStatus::Cancelled)
                .await
            {
                Ok(cancelled) => {
                    info!("Appointment {} cancelled by {}", appointment_id, actor_id);
                    return Ok(CancelOutcome::Cancelled(cancelled));
                }
                Err(StoreError::StatusMismatch { current }) => {
                    debug!("Appointment {} changed to {} during cancel, retrying", appointment_id, current);
                    appointment.status = current;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(BookingError::Store(format!(
            "appointment {} kept changing during cancellation", appointment_id
        )))
    }

    /// Pending -> confirmed. Any other starting status is a warning-level `InvalidTransition`.
    pub async fn confirm_booking(&self, appointment_id: Uuid) -> Result<Appointment, BookingError> {
        let appointment = self.load(appointment_id).await?;

        self.lifecycle
            .validate_status_transition(appointment.status, AppointmentStatus::Confirmed)?;

        match self
            .store
            .set_status(appointment_id, AppointmentStatus::Pending, AppointmentStatus::Confirmed)
            .await
        {
            Ok(confirmed) => {
                info!("Appointment {} confirmed", appointment_id);
                Ok(confirmed)
            }
            Err(StoreError::StatusMismatch { current }) => {
                warn!("Appointment {} moved to {} before it could be confirmed", appointment_id, current);
                Err(BookingError::InvalidTransition(current))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Single appointment, visible only to its patient and doctor.
    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        actor_id: Uuid,
    ) -> Result<AppointmentView, BookingError> {
        let appointment = self.load(appointment_id).await?;
        if !appointment.involves(actor_id) {
            return Err(BookingError::PermissionDenied);
        }
        Ok(AppointmentView::at(appointment, self.clock.now()))
    }

    pub async fn list_appointments(
        &self,
        listing: AppointmentListing,
    ) -> Result<Vec<AppointmentView>, BookingError> {
        let mut appointments = self.store.list(&listing.into()).await?;
        sort_newest_first(&mut appointments);

        let now = self.clock.now();
        Ok(appointments
            .into_iter()
            .map(|a| AppointmentView::at(a, now))
            .collect())
    }

    async fn load(&self, appointment_id: Uuid) -> Result<Appointment, BookingError> {
        self.store
            .get(appointment_id)
            .await?
            .ok_or(BookingError::NotFound)
    }
}
