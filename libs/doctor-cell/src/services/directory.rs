use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::user::ClinicUser;

use crate::models::DoctorError;

/// Read access to clinic users and their roles.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<ClinicUser>, DoctorError>;

    async fn list_doctors(&self) -> Result<Vec<ClinicUser>, DoctorError>;

    /// The user, only if it exists and is a doctor.
    async fn find_doctor(&self, id: Uuid) -> Result<Option<ClinicUser>, DoctorError> {
        Ok(self.find_user(id).await?.filter(ClinicUser::is_doctor))
    }
}

#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Uuid, ClinicUser>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = ClinicUser>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id, u)).collect()),
        }
    }

    pub async fn upsert(&self, user: ClinicUser) {
        self.users.write().await.insert(user.id, user);
    }

    /// Load a JSON array of user rows (same shape as the `users` table) and
    /// return how many were stored.
    pub async fn seed_from_json(&self, raw: &str) -> Result<usize, DoctorError> {
        let users: Vec<ClinicUser> =
            serde_json::from_str(raw).map_err(|e| DoctorError::InvalidSeed(e.to_string()))?;
        let count = users.len();

        for user in users {
            debug!("Seeding {} user {}", user.role(), user.id);
            self.upsert(user).await;
        }

        Ok(count)
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, id: Uuid) -> Result<Option<ClinicUser>, DoctorError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn list_doctors(&self) -> Result<Vec<ClinicUser>, DoctorError> {
        let mut doctors: Vec<ClinicUser> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.is_doctor())
            .cloned()
            .collect();
        doctors.sort_by_key(|d| d.display_name());
        Ok(doctors)
    }
}

/// Users backed by the `users` table exposed through PostgREST.
pub struct SupabaseUserDirectory {
    supabase: Arc<SupabaseClient>,
    auth_token: Option<String>,
}

impl SupabaseUserDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            auth_token: config.store_token().map(str::to_string),
        }
    }
}

#[async_trait]
impl UserDirectory for SupabaseUserDirectory {
    async fn find_user(&self, id: Uuid) -> Result<Option<ClinicUser>, DoctorError> {
        debug!("Looking up user {}", id);

        let path = format!("/rest/v1/users?id=eq.{}&limit=1", id);
        let rows: Vec<ClinicUser> = self
            .supabase
            .request(Method::GET, &path, self.auth_token.as_deref(), None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().next())
    }

    async fn list_doctors(&self) -> Result<Vec<ClinicUser>, DoctorError> {
        let rows: Vec<ClinicUser> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/users?role=eq.doctor&order=last_name.asc,username.asc",
                self.auth_token.as_deref(),
                None,
            )
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        debug!("Found {} doctors", rows.len());
        Ok(rows)
    }
}
