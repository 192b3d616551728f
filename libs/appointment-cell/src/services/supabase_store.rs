// libs/appointment-cell/src/services/supabase_store.rs
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{DatabaseError, SupabaseClient};

use crate::models::{Appointment, AppointmentFilter, AppointmentStatus, NewAppointment};
use crate::services::store::{AppointmentStore, StoreError};

/// Message raised by `book_appointment()` when the patient is at the daily cap.
const DAILY_LIMIT_MESSAGE: &str = "daily_limit_exceeded";

/// Appointments in Postgres, reached through PostgREST.
///
/// Bookings go through the `book_appointment` RPC, which checks the daily cap and
/// inserts in one transaction; the partial unique index on active
/// (doctor_id, date, time_slot) rows rejects concurrent double bookings.
pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
    auth_token: Option<String>,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            auth_token: config.store_token().map(str::to_string),
        }
    }

    fn token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    fn query_string(filter: &AppointmentFilter) -> String {
        let mut params = Vec::new();

        if let Some(patient_id) = filter.patient_id {
            params.push(format!("patient_id=eq.{}", patient_id));
        }
        if let Some(doctor_id) = filter.doctor_id {
            params.push(format!("doctor_id=eq.{}", doctor_id));
        }
        if let Some(date) = filter.date {
            params.push(format!("date=eq.{}", date.format("%Y-%m-%d")));
        }
        if let Some(slot) = filter.time_slot {
            params.push(format!("time_slot=eq.{}", String::from(slot)));
        }
        if filter.active_only {
            params.push(format!("status=neq.{}", AppointmentStatus::Cancelled));
        }
        params.push("order=date.desc,time_slot.desc".to_string());

        params.join("&")
    }
}

fn backend(e: DatabaseError) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&limit=1", id);
        let rows: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, self.token(), None)
            .await
            .map_err(backend)?;

        Ok(rows.into_iter().next())
    }

    async fn insert(
        &self,
        appointment: NewAppointment,
        daily_limit: usize,
    ) -> Result<Appointment, StoreError> {
        debug!("Booking {} on {} with doctor {} through RPC",
               appointment.time_slot, appointment.date, appointment.doctor_id);

        let body = json!({
            "p_patient_id": appointment.patient_id,
            "p_doctor_id": appointment.doctor_id,
            "p_date": appointment.date.format("%Y-%m-%d").to_string(),
            "p_time_slot": String::from(appointment.time_slot),
            "p_reason": appointment.reason,
            "p_created_at": appointment.created_at,
            "p_daily_limit": daily_limit,
        });

        let rows: Vec<Appointment> = self
            .supabase
            .request(Method::POST, "/rest/v1/rpc/book_appointment", self.token(), Some(body))
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    StoreError::SlotTaken
                } else if e.message_contains(DAILY_LIMIT_MESSAGE) {
                    StoreError::DailyLimitReached
                } else {
                    backend(e)
                }
            })?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("book_appointment returned no row".to_string()))
    }

    async fn set_status(
        &self,
        id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&status=eq.{}", id, from);

        let rows: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                self.token(),
                Some(json!({ "status": to })),
                Some(SupabaseClient::return_representation()),
            )
            .await
            .map_err(backend)?;

        if let Some(updated) = rows.into_iter().next() {
            return Ok(updated);
        }

        match self.get(id).await? {
            Some(current) => {
                warn!("Status update {} -> {} lost for appointment {}: now {}", from, to, id, current.status);
                Err(StoreError::StatusMismatch { current: current.status })
            }
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, StoreError> {
        let path = format!("/rest/v1/appointments?{}", Self::query_string(filter));
        self.supabase
            .request(Method::GET, &path, self.token(), None)
            .await
            .map_err(backend)
    }
}
