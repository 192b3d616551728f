use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Doctor,
    Patient,
}

impl Role {
    /// Only doctors may move a pending appointment to confirmed.
    pub fn can_confirm_appointments(&self) -> bool {
        matches!(self, Role::Doctor)
    }

    pub fn can_have_specialization(&self) -> bool {
        matches!(self, Role::Doctor)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "doctor" => Ok(Role::Doctor),
            "patient" => Ok(Role::Patient),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Doctor => write!(f, "doctor"),
            Role::Patient => write!(f, "patient"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub specialization: Option<String>,
    pub qualification: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub phone: Option<String>,
}

/// Role-specific payload, tagged by the `role` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RoleProfile {
    Doctor(DoctorProfile),
    Patient(PatientProfile),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicUser {
    pub id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(flatten)]
    pub profile: RoleProfile,
}

impl ClinicUser {
    pub fn role(&self) -> Role {
        match self.profile {
            RoleProfile::Doctor(_) => Role::Doctor,
            RoleProfile::Patient(_) => Role::Patient,
        }
    }

    pub fn is_doctor(&self) -> bool {
        self.role() == Role::Doctor
    }

    pub fn can_confirm_appointments(&self) -> bool {
        self.role().can_confirm_appointments()
    }

    pub fn specialization(&self) -> Option<&str> {
        match &self.profile {
            RoleProfile::Doctor(profile) => profile.specialization.as_deref(),
            RoleProfile::Patient(_) => None,
        }
    }

    pub fn full_name(&self) -> Option<String> {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
                Some(format!("{} {}", first, last))
            }
            _ => None,
        }
    }

    /// "Dr. First Last" for doctors, falling back to the username.
    pub fn display_name(&self) -> String {
        let name = self.full_name().unwrap_or_else(|| self.username.clone());
        match self.role() {
            Role::Doctor => format!("Dr. {}", name),
            Role::Patient => name,
        }
    }
}
