use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use doctor_cell::models::DoctorState;
use doctor_cell::router::doctor_routes;
use doctor_cell::services::InMemoryUserDirectory;
use shared_utils::test_utils::TestUser;

fn app(users: &[&TestUser]) -> axum::Router {
    let directory = InMemoryUserDirectory::with_users(users.iter().map(|u| u.to_clinic_user()));
    doctor_routes(DoctorState::new(Arc::new(directory)))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_list_doctors_excludes_patients() {
    let doctor = TestUser::doctor("doc@example.com");
    let patient = TestUser::patient("pat@example.com");

    let response = app(&[&doctor, &patient])
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["doctors"][0]["id"], doctor.id);
    assert_eq!(body["doctors"][0]["display_name"], "Dr. doc");
    assert_eq!(body["doctors"][0]["specialization"], "General Dentistry");
}

#[tokio::test]
async fn test_get_doctor_not_found_for_patient_or_unknown_id() {
    let doctor = TestUser::doctor("doc@example.com");
    let patient = TestUser::patient("pat@example.com");
    let app = app(&[&doctor, &patient]);

    let ok = app
        .clone()
        .oneshot(Request::builder().uri(format!("/{}", doctor.id)).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    let as_patient = app
        .clone()
        .oneshot(Request::builder().uri(format!("/{}", patient.id)).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(as_patient.status(), StatusCode::NOT_FOUND);

    let unknown = app
        .oneshot(Request::builder().uri(format!("/{}", Uuid::new_v4())).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}
