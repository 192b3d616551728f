use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{DoctorError, DoctorState, DoctorSummary};

fn map_doctor_error(e: DoctorError) -> AppError {
    match e {
        DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
        DoctorError::DatabaseError(msg) => AppError::Database(msg),
        DoctorError::InvalidSeed(msg) => AppError::Internal(msg),
    }
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<DoctorState>,
) -> Result<Json<Value>, AppError> {
    let doctors: Vec<DoctorSummary> = state
        .directory
        .list_doctors()
        .await
        .map_err(map_doctor_error)?
        .iter()
        .filter_map(DoctorSummary::from_user)
        .collect();

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<DoctorState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor = state
        .directory
        .find_doctor(doctor_id)
        .await
        .map_err(map_doctor_error)?
        .and_then(|user| DoctorSummary::from_user(&user))
        .ok_or_else(|| map_doctor_error(DoctorError::NotFound))?;

    Ok(Json(json!(doctor)))
}
