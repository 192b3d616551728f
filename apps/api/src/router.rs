use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use appointment_cell::AppointmentState;
use doctor_cell::models::DoctorState;
use doctor_cell::router::doctor_routes;

pub fn create_router(state: AppointmentState) -> Router {
    let doctors = DoctorState::new(state.directory.clone());

    Router::new()
        .route("/", get(|| async { "DentalCare API is running!" }))
        .nest("/doctors", doctor_routes(doctors))
        .nest("/appointments", appointment_routes(state))
}
