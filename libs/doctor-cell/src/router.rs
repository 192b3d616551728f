use axum::{routing::get, Router};

use crate::handlers;
use crate::models::DoctorState;

/// Doctor browsing is public; booking against a doctor goes through the appointment routes.
pub fn doctor_routes(state: DoctorState) -> Router {
    Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .with_state(state)
}
