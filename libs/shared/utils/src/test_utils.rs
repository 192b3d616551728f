use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::{AppConfig, StoreBackend};
use shared_models::auth::User;
use shared_models::user::{ClinicUser, DoctorProfile, PatientProfile, RoleProfile};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            supabase_service_role_key: String::new(),
            store_backend: StoreBackend::Memory,
            user_seed_file: None,
            server_port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl TestUser {
    fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn uuid(&self) -> Uuid {
        Uuid::parse_str(&self.id).expect("test user ids are generated UUIDs")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }

    /// Directory record matching this identity.
    pub fn to_clinic_user(&self) -> ClinicUser {
        let username = self.email.split('@').next().unwrap_or(&self.email).to_string();
        let profile = if self.role == "doctor" {
            RoleProfile::Doctor(DoctorProfile {
                specialization: Some("General Dentistry".to_string()),
                qualification: Some("BDS".to_string()),
            })
        } else {
            RoleProfile::Patient(PatientProfile::default())
        };

        ClinicUser {
            id: self.uuid(),
            username,
            first_name: None,
            last_name: None,
            email: Some(self.email.clone()),
            profile,
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn doctor_row(user_id: &str, username: &str, specialization: &str) -> serde_json::Value {
        json!({
            "id": user_id,
            "username": username,
            "first_name": "Test",
            "last_name": "Doctor",
            "email": format!("{}@example.com", username),
            "role": "doctor",
            "specialization": specialization,
            "qualification": "BDS",
            "age": null,
            "gender": null,
            "phone": null
        })
    }

    pub fn patient_row(user_id: &str, username: &str) -> serde_json::Value {
        json!({
            "id": user_id,
            "username": username,
            "first_name": "Test",
            "last_name": "Patient",
            "email": format!("{}@example.com", username),
            "role": "patient",
            "specialization": null,
            "qualification": null,
            "age": 30,
            "gender": "other",
            "phone": null
        })
    }

    pub fn appointment_row(
        patient_id: &str,
        doctor_id: &str,
        date: &str,
        time_slot: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "date": date,
            "time_slot": time_slot,
            "status": status,
            "reason": null,
            "created_at": "2025-06-01T08:00:00"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "code": code,
            "message": message,
            "details": null,
            "hint": null
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_models::user::Role;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert!(!app_config.supabase_jwt_secret.is_empty());
        assert_eq!(app_config.store_backend, StoreBackend::Memory);
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::doctor("doc@example.com");
        assert_eq!(user.email, "doc@example.com");
        assert_eq!(user.role, "doctor");

        let user_model = user.to_user();
        assert_eq!(user_model.email, Some(user.email.clone()));
        assert_eq!(user_model.role(), Some(Role::Doctor));
        assert_eq!(user_model.id, user.id);

        let record = user.to_clinic_user();
        assert_eq!(record.id, user.uuid());
        assert_eq!(record.username, "doc");
        assert!(record.is_doctor());
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::patient("pat@example.com");
        let secret = "test-secret";
        let token = JwtTestUtils::create_test_token(&user, secret, Some(1));

        assert!(token.contains('.'));
        assert_eq!(token.split('.').count(), 3);
    }
}
