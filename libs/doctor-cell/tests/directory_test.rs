use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, query_param};

use doctor_cell::models::DoctorError;
use doctor_cell::services::{InMemoryUserDirectory, SupabaseUserDirectory, UserDirectory};
use shared_models::user::Role;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};

#[tokio::test]
async fn test_in_memory_directory_separates_doctors_and_patients() {
    let doctor = TestUser::doctor("doc@example.com");
    let patient = TestUser::patient("pat@example.com");
    let directory = InMemoryUserDirectory::with_users([
        doctor.to_clinic_user(),
        patient.to_clinic_user(),
    ]);

    assert!(directory.find_doctor(doctor.uuid()).await.unwrap().is_some());
    assert!(directory.find_doctor(patient.uuid()).await.unwrap().is_none());
    assert!(directory.find_user(patient.uuid()).await.unwrap().is_some());
    assert!(directory.find_user(Uuid::new_v4()).await.unwrap().is_none());

    let doctors = directory.list_doctors().await.unwrap();
    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0].id, doctor.uuid());
}

#[tokio::test]
async fn test_supabase_directory_reads_users_table() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_row(&doctor_id.to_string(), "drsmile", "Orthodontics")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", patient_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_row(&patient_id.to_string(), "pat")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("role", "eq.doctor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_row(&doctor_id.to_string(), "drsmile", "Orthodontics")
        ])))
        .mount(&mock_server)
        .await;

    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();
    let directory = SupabaseUserDirectory::new(&config);

    let doctor = directory.find_doctor(doctor_id).await.unwrap().unwrap();
    assert_eq!(doctor.role(), Role::Doctor);
    assert_eq!(doctor.specialization(), Some("Orthodontics"));
    assert_eq!(doctor.display_name(), "Dr. Test Doctor");

    assert!(directory.find_doctor(patient_id).await.unwrap().is_none());
    assert_eq!(directory.list_doctors().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_seeded_directory_serves_doctors() {
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let rows = json!([
        MockSupabaseResponses::doctor_row(&doctor_id.to_string(), "drsmile", "Orthodontics"),
        MockSupabaseResponses::patient_row(&patient_id.to_string(), "pat")
    ]);

    let directory = InMemoryUserDirectory::new();
    assert_eq!(directory.seed_from_json(&rows.to_string()).await.unwrap(), 2);

    let doctor = directory.find_doctor(doctor_id).await.unwrap().unwrap();
    assert_eq!(doctor.specialization(), Some("Orthodontics"));
    assert!(directory.find_doctor(patient_id).await.unwrap().is_none());
    assert_eq!(directory.find_user(patient_id).await.unwrap().unwrap().role(), Role::Patient);
}

#[tokio::test]
async fn test_example_seed_file_loads() {
    let directory = InMemoryUserDirectory::new();
    let seeded = directory
        .seed_from_json(include_str!("../../../apps/api/seed/users.example.json"))
        .await
        .unwrap();

    assert_eq!(seeded, 3);
    assert_eq!(directory.list_doctors().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_seed_is_rejected() {
    let directory = InMemoryUserDirectory::new();

    assert_matches!(
        directory.seed_from_json(r#"[{"id": "not-a-uuid", "role": "doctor"}]"#).await,
        Err(DoctorError::InvalidSeed(_))
    );
    assert!(directory.list_doctors().await.unwrap().is_empty());
}
