use std::sync::Arc;

use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
    body::Body,
};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::user::Role;
use shared_config::AppConfig;

use crate::jwt::validate_token;

/// Validates the bearer token and stores the caller in request extensions.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_value = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    let token = auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))?;

    let user = validate_token(token, &config.supabase_jwt_secret)
        .map_err(|e| AppError::Auth(e.to_string()))?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Caller id as a UUID; identities with non-UUID subjects cannot act on appointments.
pub fn caller_id(user: &User) -> Result<Uuid, AppError> {
    user.user_id()
        .ok_or_else(|| AppError::Auth("Token subject is not a valid user id".to_string()))
}

pub fn require_role(user: &User, role: Role) -> Result<(), AppError> {
    match user.role() {
        Some(actual) if actual == role => Ok(()),
        _ => Err(AppError::Forbidden(format!("Access denied. {} accounts only.", role))),
    }
}
