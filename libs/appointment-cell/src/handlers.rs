// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::{Path, Query, State, Extension},
    Json,
};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::user::Role;
use shared_utils::extractor::{caller_id, require_role};

use crate::models::{
    AppointmentDateQuery, AppointmentListing, AvailabilityQuery, BookAppointmentRequest,
    BookingError, CancelOutcome,
};
use crate::state::AppointmentState;

fn map_booking_error(e: BookingError) -> AppError {
    match e {
        BookingError::InvalidDoctor => AppError::BadRequest(e.to_string()),
        BookingError::PastDate(_) => AppError::ValidationError(e.to_string()),
        BookingError::DailyLimitExceeded(_) => AppError::Conflict(e.to_string()),
        BookingError::SlotAlreadyBooked { .. } => AppError::Conflict(e.to_string()),
        BookingError::PermissionDenied => AppError::Forbidden(e.to_string()),
        BookingError::AlreadyOccurred => AppError::BadRequest(e.to_string()),
        BookingError::InvalidTransition(_) => AppError::BadRequest(e.to_string()),
        BookingError::NotFound => AppError::NotFound(e.to_string()),
        BookingError::Store(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<AppointmentState>,
    Extension(_user): Extension<User>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = state
        .availability_resolver()
        .available_slots(query.doctor_id, query.date)
        .await
        .map_err(map_booking_error)?;

    let bookable = query.date >= state.clock.today();

    Ok(Json(json!({
        "doctor_id": query.doctor_id,
        "date": query.date,
        "bookable": bookable,
        "available_slots": slots,
        "message": if slots.is_empty() {
            Some("No available slots for this doctor on the selected date.")
        } else {
            None
        }
    })))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let patient_id = caller_id(&user)?;

    let appointment = state
        .booking_manager()
        .create_booking(patient_id, request)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully! Awaiting confirmation."
    })))
}

/// Appointments where the caller is the patient, or the doctor for doctor accounts.
#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let user_id = caller_id(&user)?;
    let listing = match user.role() {
        Some(Role::Doctor) => AppointmentListing::ForDoctor(user_id),
        _ => AppointmentListing::ForPatient(user_id),
    };

    let appointments = state
        .booking_manager()
        .list_appointments(listing)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn list_all_appointments(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Query(query): Query<AppointmentDateQuery>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Doctor)?;

    let appointments = state
        .booking_manager()
        .list_appointments(AppointmentListing::ByDate(query.date))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "selected_date": query.date,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .booking_manager()
        .get_appointment(appointment_id, caller_id(&user)?)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let outcome = state
        .booking_manager()
        .cancel_booking(appointment_id, caller_id(&user)?)
        .await
        .map_err(map_booking_error)?;

    let body = match outcome {
        CancelOutcome::Cancelled(appointment) => json!({
            "success": true,
            "already_cancelled": false,
            "appointment": appointment,
            "message": "Appointment cancelled successfully."
        }),
        CancelOutcome::AlreadyCancelled(appointment) => json!({
            "success": true,
            "already_cancelled": true,
            "appointment": appointment,
            "warning": "This appointment is already cancelled."
        }),
    };

    Ok(Json(body))
}

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.can_confirm_appointments() {
        return Err(AppError::Forbidden("Only doctors can confirm appointments".to_string()));
    }

    match state.booking_manager().confirm_booking(appointment_id).await {
        Ok(appointment) => Ok(Json(json!({
            "success": true,
            "appointment": appointment,
            "message": "Appointment confirmed."
        }))),
        Err(e) if e.is_warning() => {
            warn!("Confirm of {} by {} not applied: {}", appointment_id, user.id, e);
            Ok(Json(json!({
                "success": false,
                "warning": e.to_string()
            })))
        }
        Err(e) => Err(map_booking_error(e)),
    }
}

#[axum::debug_handler]
pub async fn get_doctor_dashboard(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Doctor)?;

    let dashboard = state
        .dashboard_service()
        .dashboard(caller_id(&user)?)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!(dashboard)))
}

#[axum::debug_handler]
pub async fn get_doctor_patients(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Doctor)?;

    let patients = state
        .dashboard_service()
        .patients(caller_id(&user)?)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "patients": patients,
        "total": patients.len()
    })))
}
