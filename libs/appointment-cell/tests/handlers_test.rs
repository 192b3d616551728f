use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;

use appointment_cell::router::appointment_routes;
use appointment_cell::services::InMemoryAppointmentStore;
use appointment_cell::AppointmentState;
use doctor_cell::services::InMemoryUserDirectory;
use shared_utils::clock::FixedClock;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

struct TestApp {
    router: Router,
    config: TestConfig,
    doctor: TestUser,
    patient: TestUser,
    other_patient: TestUser,
}

impl TestApp {
    fn new() -> Self {
        let config = TestConfig::default();
        let doctor = TestUser::doctor("doc@example.com");
        let patient = TestUser::patient("pat@example.com");
        let other_patient = TestUser::patient("quinn@example.com");

        let directory = InMemoryUserDirectory::with_users(
            [&doctor, &patient, &other_patient].iter().map(|u| u.to_clinic_user()),
        );
        let clock = FixedClock::new(day().and_hms_opt(8, 0, 0).unwrap());
        let state = AppointmentState::new(
            config.to_arc(),
            Arc::new(InMemoryAppointmentStore::new()),
            Arc::new(directory),
            Arc::new(clock),
        );

        Self {
            router: appointment_routes(state),
            config,
            doctor,
            patient,
            other_patient,
        }
    }

    fn token(&self, user: &TestUser) -> String {
        JwtTestUtils::create_test_token(user, &self.config.jwt_secret, Some(1))
    }

    async fn send(&self, as_user: &TestUser, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", self.token(as_user)));

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn book(&self, patient: &TestUser, slot: &str) -> (StatusCode, Value) {
        let body = json!({
            "doctor_id": self.doctor.id,
            "date": "2025-06-10",
            "time_slot": slot,
            "reason": "Tooth ache"
        });
        self.send(patient, "POST", "/", Some(body)).await
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/mine").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let forged = JwtTestUtils::create_invalid_signature_token(&app.patient);
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/mine")
                .header("Authorization", format!("Bearer {}", forged))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_availability_and_booking_flow() {
    let app = TestApp::new();
    let uri = format!("/availability?doctor_id={}&date=2025-06-10", app.doctor.id);

    let (status, body) = app.send(&app.patient, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available_slots"].as_array().unwrap().len(), 9);
    assert_eq!(body["bookable"], true);

    let (status, body) = app.book(&app.patient, "10:00").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["appointment"]["status"], "pending");
    assert_eq!(body["appointment"]["time_slot"], "10:00:00");
    assert_eq!(body["appointment"]["patient_id"], app.patient.id);

    let (_, body) = app.send(&app.patient, "GET", &uri, None).await;
    let slots = body["available_slots"].as_array().unwrap();
    assert_eq!(slots.len(), 8);
    assert!(!slots.contains(&json!("10:00:00")));

    let (status, body) = app.book(&app.other_patient, "10:00").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already booked"));
}

#[tokio::test]
async fn test_booking_validation_errors() {
    let app = TestApp::new();

    let past = json!({"doctor_id": app.doctor.id, "date": "2025-06-09", "time_slot": "10:00"});
    let (status, _) = app.send(&app.patient, "POST", "/", Some(past)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let not_a_doctor = json!({"doctor_id": app.other_patient.id, "date": "2025-06-10", "time_slot": "10:00"});
    let (status, body) = app.send(&app.patient, "POST", "/", Some(not_a_doctor)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid doctor selected");

    app.book(&app.patient, "09:00").await;
    app.book(&app.patient, "11:00").await;
    let (status, body) = app.book(&app.patient, "13:00").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("two appointments per day"));
}

#[tokio::test]
async fn test_out_of_schedule_slot_is_rejected_by_extractor() {
    let app = TestApp::new();
    let (status, _) = app.book(&app.patient, "18:00").await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_cancel_and_confirm_report_warnings() {
    let app = TestApp::new();
    let (_, body) = app.book(&app.patient, "15:00").await;
    let id = body["appointment"]["id"].as_str().unwrap().to_string();

    // Patients cannot confirm.
    let (status, _) = app.send(&app.patient, "POST", &format!("/{}/confirm", id), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send(&app.doctor, "POST", &format!("/{}/confirm", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["status"], "confirmed");

    let (status, body) = app.send(&app.doctor, "POST", &format!("/{}/confirm", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["warning"].as_str().unwrap().contains("confirmed"));

    let (status, _) = app.send(&app.other_patient, "POST", &format!("/{}/cancel", id), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send(&app.patient, "POST", &format!("/{}/cancel", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["already_cancelled"], false);
    assert_eq!(body["appointment"]["status"], "cancelled");

    let (status, body) = app.send(&app.doctor, "POST", &format!("/{}/cancel", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["already_cancelled"], true);
    assert!(body["warning"].is_string());
}

#[tokio::test]
async fn test_unknown_appointment_is_not_found() {
    let app = TestApp::new();
    let id = uuid::Uuid::new_v4();

    let (status, _) = app.send(&app.patient, "GET", &format!("/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(&app.doctor, "POST", &format!("/{}/confirm", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_listings_by_role() {
    let app = TestApp::new();
    app.book(&app.patient, "09:00").await;
    app.book(&app.other_patient, "12:00").await;

    let (_, mine) = app.send(&app.patient, "GET", "/mine", None).await;
    assert_eq!(mine["total"], 1);
    assert_eq!(mine["appointments"][0]["is_expired"], false);

    let (_, doctors) = app.send(&app.doctor, "GET", "/mine", None).await;
    assert_eq!(doctors["total"], 2);
    assert_eq!(doctors["appointments"][0]["time_slot"], "12:00:00");

    let (status, _) = app.send(&app.patient, "GET", "/?date=2025-06-10", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, by_date) = app.send(&app.doctor, "GET", "/?date=2025-06-11", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_date["total"], 0);
}

#[tokio::test]
async fn test_doctor_dashboard_and_patients() {
    let app = TestApp::new();
    app.book(&app.patient, "09:00").await;
    app.book(&app.other_patient, "10:00").await;

    let (status, _) = app.send(&app.patient, "GET", "/dashboard", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, dashboard) = app.send(&app.doctor, "GET", "/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["todays_appointments_count"], 2);
    assert_eq!(dashboard["unique_patients_count"], 2);

    let (status, patients) = app.send(&app.doctor, "GET", "/patients", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patients["total"], 2);
    assert_eq!(patients["patients"][0]["display_name"], "pat");
}
