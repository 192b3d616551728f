use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Postgres error code for unique constraint violations.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Error body returned by PostgREST on a failed request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostgrestError {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl DatabaseError {
    /// Postgres/PostgREST error code, when the backend reported one.
    pub fn code(&self) -> Option<&str> {
        match self {
            DatabaseError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Api { status, code, .. } => {
                code.as_deref() == Some(UNIQUE_VIOLATION) || *status == 409
            }
            _ => false,
        }
    }

    /// True when the backend rejected the write with a message containing `needle`.
    pub fn message_contains(&self, needle: &str) -> bool {
        match self {
            DatabaseError::Api { message, .. } => message.contains(needle),
            _ => false,
        }
    }
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, DatabaseError> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key)
                .map_err(|e| DatabaseError::InvalidHeader(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| DatabaseError::InvalidHeader(e.to_string()))?,
            );
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T, DatabaseError>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, DatabaseError>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            let parsed: PostgrestError = serde_json::from_str(&error_text).unwrap_or_default();
            let message = parsed.message.clone().unwrap_or_else(|| error_text.clone());

            return Err(match status.as_u16() {
                401 | 403 => DatabaseError::Auth(message),
                404 => DatabaseError::NotFound(message),
                code => DatabaseError::Api {
                    status: code,
                    code: parsed.code,
                    message,
                },
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Headers asking PostgREST to echo back the written rows.
    pub fn return_representation() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }
}
