// libs/appointment-cell/src/router.rs
use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::state::AppointmentState;

pub fn appointment_routes(state: AppointmentState) -> Router {
    // All appointment operations require authentication
    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment).get(handlers::list_all_appointments)) // GET: doctors only
        .route("/availability", get(handlers::get_available_slots))
        .route("/mine", get(handlers::get_my_appointments))
        .route("/dashboard", get(handlers::get_doctor_dashboard)) // Doctors only
        .route("/patients", get(handlers::get_doctor_patients)) // Doctors only
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/confirm", post(handlers::confirm_appointment))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
