// libs/appointment-cell/src/services/store.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentFilter, AppointmentStatus, BookingError, NewAppointment, TimeSlot,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// An active appointment already holds (doctor, date, slot).
    #[error("slot already taken")]
    SlotTaken,

    #[error("patient daily limit reached")]
    DailyLimitReached,

    #[error("appointment {0} not found")]
    NotFound(Uuid),

    /// Compare-and-set lost: the row is no longer in the expected status.
    #[error("appointment status changed concurrently (now {current})")]
    StatusMismatch { current: AppointmentStatus },

    #[error("{0}")]
    Backend(String),
}

impl From<StoreError> for BookingError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => BookingError::NotFound,
            other => BookingError::Store(other.to_string()),
        }
    }
}

/// Persistent appointment records.
///
/// `insert` is the serialization point for bookings: implementations must check
/// both constraints and write the row atomically, rejecting with `SlotTaken` or
/// `DailyLimitReached` instead of writing.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    async fn insert(
        &self,
        appointment: NewAppointment,
        daily_limit: usize,
    ) -> Result<Appointment, StoreError>;

    async fn set_status(
        &self,
        id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Appointment, StoreError>;

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, StoreError>;

    async fn booked_slots(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<TimeSlot>, StoreError> {
        let filter = AppointmentFilter {
            doctor_id: Some(doctor_id),
            date: Some(date),
            active_only: true,
            ..Default::default()
        };
        Ok(self.list(&filter).await?.into_iter().map(|a| a.time_slot).collect())
    }

    async fn active_count_for_patient(&self, patient_id: Uuid, date: NaiveDate) -> Result<usize, StoreError> {
        let filter = AppointmentFilter {
            patient_id: Some(patient_id),
            date: Some(date),
            active_only: true,
            ..Default::default()
        };
        Ok(self.list(&filter).await?.len())
    }

    async fn slot_is_taken(&self, doctor_id: Uuid, date: NaiveDate, slot: TimeSlot) -> Result<bool, StoreError> {
        let filter = AppointmentFilter {
            doctor_id: Some(doctor_id),
            date: Some(date),
            time_slot: Some(slot),
            active_only: true,
            ..Default::default()
        };
        Ok(!self.list(&filter).await?.is_empty())
    }
}

/// Process-local store; constraints are checked and applied under one write lock.
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.appointments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.appointments.read().await.is_empty()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.appointments.read().await.get(&id).cloned())
    }

    async fn insert(
        &self,
        appointment: NewAppointment,
        daily_limit: usize,
    ) -> Result<Appointment, StoreError> {
        let mut rows = self.appointments.write().await;

        let slot_taken = rows.values().any(|a| {
            a.is_active()
                && a.doctor_id == appointment.doctor_id
                && a.date == appointment.date
                && a.time_slot == appointment.time_slot
        });
        if slot_taken {
            return Err(StoreError::SlotTaken);
        }

        let patient_active = rows
            .values()
            .filter(|a| a.is_active() && a.patient_id == appointment.patient_id && a.date == appointment.date)
            .count();
        if patient_active >= daily_limit {
            return Err(StoreError::DailyLimitReached);
        }

        let created = appointment.into_appointment(Uuid::new_v4());
        debug!("Stored appointment {}", created.id);
        rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn set_status(
        &self,
        id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        let mut rows = self.appointments.write().await;
        let row = rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if row.status != from {
            return Err(StoreError::StatusMismatch { current: row.status });
        }

        row.status = to;
        Ok(row.clone())
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, StoreError> {
        Ok(self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }
}
