use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Where appointment and user records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Supabase,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(StoreBackend::Supabase),
            "memory" | "in_memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Supabase => write!(f, "supabase"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub supabase_service_role_key: String,
    pub store_backend: StoreBackend,
    /// JSON array of users loaded into the in-memory directory at startup.
    pub user_seed_file: Option<String>,
    pub server_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, store calls will use the anon key only");
                    String::new()
                }),
            store_backend: StoreBackend::Memory,
            user_seed_file: env::var("USER_SEED_FILE").ok().filter(|path| !path.trim().is_empty()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|port| match port.parse() {
                    Ok(port) => Some(port),
                    Err(_) => {
                        warn!("SERVER_PORT '{}' is not a valid port, using default", port);
                        None
                    }
                })
                .unwrap_or(3000),
        };

        config.store_backend = match env::var("STORE_BACKEND") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                warn!("{}, falling back to default backend", e);
                config.default_backend()
            }),
            Err(_) => config.default_backend(),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        if config.store_backend == StoreBackend::Supabase && !config.is_configured() {
            warn!("Supabase store requested without Supabase settings, using in-memory store");
            config.store_backend = StoreBackend::Memory;
        }

        if config.store_backend == StoreBackend::Memory && config.user_seed_file.is_none() {
            warn!("USER_SEED_FILE not set, the in-memory directory starts without doctors");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    /// Bearer token used for server-side store calls, if one is configured.
    pub fn store_token(&self) -> Option<&str> {
        if self.supabase_service_role_key.is_empty() {
            None
        } else {
            Some(&self.supabase_service_role_key)
        }
    }

    fn default_backend(&self) -> StoreBackend {
        if self.is_configured() {
            StoreBackend::Supabase
        } else {
            StoreBackend::Memory
        }
    }
}
