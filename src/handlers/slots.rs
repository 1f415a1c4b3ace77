use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use super::check_auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::TimeLabel;
use crate::state::AppState;

fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("invalid date format, please use YYYY-MM-DD".to_string()))
}

fn parse_label(s: &str) -> Result<TimeLabel, AppError> {
    TimeLabel::parse(s)
        .ok_or_else(|| AppError::Validation("please select a valid time slot".to_string()))
}

// GET /api/slots?date=YYYY-MM-DD
#[derive(Deserialize)]
pub struct DayQuery {
    pub date: String,
}

pub async fn day(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DayQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let date = parse_date(&query.date)?;

    let slots = {
        let db = state.db.lock().unwrap();
        queries::day_availability(&db, date)?
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "date": query.date,
        "slots": slots,
    })))
}

// GET /api/slots/disabled?year=YYYY&month=MM
//
// Dates where every slot is admin-blocked; the booking calendar greys
// these out.
#[derive(Deserialize)]
pub struct DisabledQuery {
    pub year: i32,
    pub month: u32,
}

pub async fn disabled(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DisabledQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let start = NaiveDate::from_ymd_opt(query.year, query.month, 1)
        .ok_or_else(|| AppError::Validation("invalid year or month".to_string()))?;
    let end = if query.month == 12 {
        NaiveDate::from_ymd_opt(query.year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(query.year, query.month + 1, 1)
    }
    .and_then(|d| d.pred_opt())
    .ok_or_else(|| AppError::Validation("invalid year or month".to_string()))?;

    let dates = {
        let db = state.db.lock().unwrap();
        queries::fully_blocked_dates(&db, start, end)?
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "disabledDates": dates
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect::<Vec<_>>(),
    })))
}

// POST /api/admin/slots/block and /api/admin/slots/unblock
//
// Both take a list of labels so a whole day can be closed or reopened in
// one request.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRequest {
    pub date: String,
    pub times: Vec<String>,
    pub admin_id: String,
}

fn parse_labels(times: &[String]) -> Result<Vec<TimeLabel>, AppError> {
    if times.is_empty() {
        return Err(AppError::Validation(
            "select at least one time slot".to_string(),
        ));
    }
    times.iter().map(|s| parse_label(s)).collect()
}

pub async fn block(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<BlockRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let date = parse_date(&body.date)?;
    let labels = parse_labels(&body.times)?;

    {
        let db = state.db.lock().unwrap();
        queries::block_slots(&db, date, &labels, &body.admin_id)?;
    }

    tracing::info!(date = %body.date, count = labels.len(), admin = %body.admin_id, "slots blocked");
    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("{} slot(s) on {} blocked", labels.len(), body.date),
    })))
}

pub async fn unblock(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<BlockRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let date = parse_date(&body.date)?;
    let labels = parse_labels(&body.times)?;

    {
        let db = state.db.lock().unwrap();
        queries::unblock_slots(&db, date, &labels, &body.admin_id)?;
    }

    tracing::info!(date = %body.date, count = labels.len(), admin = %body.admin_id, "slots unblocked");
    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("{} slot(s) on {} unblocked", labels.len(), body.date),
    })))
}
