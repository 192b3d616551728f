use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::user::{ClinicUser, RoleProfile};

use crate::services::UserDirectory;

/// Doctor as shown to patients browsing the clinic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorSummary {
    pub id: Uuid,
    pub display_name: String,
    pub specialization: Option<String>,
    pub qualification: Option<String>,
}

impl DoctorSummary {
    /// `None` when the user is not a doctor.
    pub fn from_user(user: &ClinicUser) -> Option<Self> {
        match &user.profile {
            RoleProfile::Doctor(profile) => Some(Self {
                id: user.id,
                display_name: user.display_name(),
                specialization: profile.specialization.clone(),
                qualification: profile.qualification.clone(),
            }),
            RoleProfile::Patient(_) => None,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid user seed: {0}")]
    InvalidSeed(String),
}

#[derive(Clone)]
pub struct DoctorState {
    pub directory: Arc<dyn UserDirectory>,
}

impl DoctorState {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }
}
