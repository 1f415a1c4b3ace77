use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use super::check_auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::BookingRequest;
use crate::services::engine;
use crate::state::AppState;

// POST /api/bookings/check
//
// Runs every creation guard without touching the calendar, so the booking
// form can surface conflicts before collecting payment details.
pub async fn check(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BookingRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    {
        let db = state.db.lock().unwrap();
        engine::check_availability(&db, &req)?;
    }
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "the selected slot is available"
    })))
}

// POST /api/bookings
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BookingRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let outcome = engine::create_booking(&state, req).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "bookingId": outcome.booking.id,
        "paymentId": outcome.provider_payment_id,
        "approvalUrl": outcome.approval_url,
        "totalPrice": outcome.booking.total_price,
    })))
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn admin_list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let page = {
        let db = state.db.lock().unwrap();
        queries::search_bookings(
            &db,
            query.search.as_deref(),
            query.page.unwrap_or(1),
            query.limit.unwrap_or(10),
        )?
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "bookings": page.bookings,
        "total": page.total,
        "totalPages": page.total_pages,
        "page": page.page,
    })))
}

// GET /api/admin/bookings/:id
pub async fn admin_get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking(&db, &id)?
    }
    .ok_or_else(|| AppError::NotFound("booking".to_string()))?;

    Ok(Json(serde_json::json!({ "success": true, "booking": booking })))
}

// POST /api/admin/bookings
pub async fn admin_create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<BookingRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = engine::create_booking_by_admin(&state, req)?;
    Ok(Json(serde_json::json!({ "success": true, "booking": booking })))
}

// PUT /api/admin/bookings/:id
pub async fn admin_update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<engine::BookingPatch>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = engine::update_booking_by_admin(&state, &id, patch)?;
    Ok(Json(serde_json::json!({ "success": true, "booking": booking })))
}

// DELETE /api/admin/bookings/:id
pub async fn admin_delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = engine::delete_booking(&state, &id)?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("booking {} deleted", booking.id),
    })))
}
