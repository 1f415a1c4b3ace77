pub mod bookings;
pub mod health;
pub mod payments;
pub mod slots;

use axum::http::HeaderMap;

use crate::errors::AppError;

/// Bearer-token guard for the admin surface. Token comparison only; user
/// management lives outside this service.
pub(crate) fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}
