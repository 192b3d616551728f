// libs/appointment-cell/src/services/dashboard.rs
use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use doctor_cell::services::UserDirectory;
use shared_utils::clock::Clock;

use crate::models::{AppointmentFilter, AppointmentView, BookingError, DoctorDashboard, PatientSummary};
use crate::services::store::AppointmentStore;

/// Per-doctor overview derived from the appointment store.
pub struct DoctorDashboardService {
    store: Arc<dyn AppointmentStore>,
    directory: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
}

impl DoctorDashboardService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, directory, clock }
    }

    pub async fn dashboard(&self, doctor_id: Uuid) -> Result<DoctorDashboard, BookingError> {
        let now = self.clock.now();
        let today = now.date();

        let mut todays = self
            .store
            .list(&AppointmentFilter {
                doctor_id: Some(doctor_id),
                date: Some(today),
                active_only: true,
                ..Default::default()
            })
            .await?;
        todays.sort_by_key(|a| a.time_slot);

        let unique_patients_count = self.patient_ids(doctor_id).await?.len();

        debug!("Dashboard for doctor {}: {} today, {} patients", doctor_id, todays.len(), unique_patients_count);

        Ok(DoctorDashboard {
            date: today,
            todays_appointments_count: todays.len(),
            todays_appointments: todays.into_iter().map(|a| AppointmentView::at(a, now)).collect(),
            unique_patients_count,
        })
    }

    /// Everyone who has ever booked with the doctor, cancelled bookings included.
    pub async fn patients(&self, doctor_id: Uuid) -> Result<Vec<PatientSummary>, BookingError> {
        let mut patients = Vec::new();

        for patient_id in self.patient_ids(doctor_id).await? {
            match self.directory.find_user(patient_id).await {
                Ok(Some(user)) => patients.push(PatientSummary {
                    id: user.id,
                    display_name: user.display_name(),
                    email: user.email,
                }),
                Ok(None) => warn!("Patient {} not found in directory, skipping", patient_id),
                Err(e) => return Err(BookingError::Store(e.to_string())),
            }
        }

        patients.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(patients)
    }

    async fn patient_ids(&self, doctor_id: Uuid) -> Result<BTreeSet<Uuid>, BookingError> {
        let appointments = self
            .store
            .list(&AppointmentFilter {
                doctor_id: Some(doctor_id),
                ..Default::default()
            })
            .await?;

        Ok(appointments.into_iter().map(|a| a.patient_id).collect())
    }
}
