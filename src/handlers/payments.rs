use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Form;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{PaymentMethod, Provider};
use crate::services::engine;
use crate::services::payments::ProviderStatus;
use crate::state::AppState;

// GET /api/payments/:booking_id/status
pub async fn status(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (booking, status) = engine::payment_status(&state, &booking_id).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "bookingId": booking.id,
        "paymentStatus": booking.payment_status,
        "providerStatus": status.as_str(),
    })))
}

// POST /api/payments/paypal/capture
//
// The storefront captures the order through the PayPal JS SDK and reports
// the result here; the order id is what we correlate on.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayPalCapture {
    pub order_id: String,
    pub capture_id: Option<String>,
}

pub async fn paypal_capture(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PayPalCapture>,
) -> Result<Json<serde_json::Value>, AppError> {
    let outcome = engine::confirm_payment(
        &state,
        Provider::PayPal,
        &body.order_id,
        body.capture_id.as_deref(),
    )
    .await?;

    let booking = outcome.booking();
    Ok(Json(serde_json::json!({
        "success": true,
        "bookingId": booking.id,
        "paymentStatus": booking.payment_status,
    })))
}

// POST /api/payments/paypal/cancel
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayPalCancel {
    pub order_id: String,
}

pub async fn paypal_cancel(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PayPalCancel>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = engine::cancel_pending(&state, Provider::PayPal, &body.order_id)?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("booking {} cancelled and slot released", booking.id),
    })))
}

// POST /api/payments/mollie/cancel/:payment_id
pub async fn mollie_cancel(
    State(state): State<Arc<AppState>>,
    Path(payment_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = engine::cancel_pending(&state, Provider::Mollie, &payment_id)?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("booking {} cancelled and slot released", booking.id),
    })))
}

// POST /api/payments/refund  (PayPal, keyed by capture id)
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayPalRefund {
    pub capture_id: String,
    pub amount: Option<Decimal>,
    pub reason: Option<String>,
}

pub async fn paypal_refund(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PayPalRefund>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::booking_by_capture_id(&db, &body.capture_id)?
    }
    .ok_or_else(|| AppError::NotFound("booking".to_string()))?;

    let amount = body.amount.unwrap_or(booking.total_price);
    let reason = body.reason.as_deref().unwrap_or("requested by customer");

    let (booking, receipt) = engine::refund_payment(&state, &booking.id, amount, reason).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "bookingId": booking.id,
        "refundId": receipt.refund_id,
        "refundStatus": booking.refund_status,
    })))
}

// POST /api/payments/mollie/refund  (keyed by booking id)
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MollieRefund {
    pub booking_id: String,
    pub amount: Option<Decimal>,
    pub reason: Option<String>,
}

pub async fn mollie_refund(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MollieRefund>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking(&db, &body.booking_id)?
    }
    .ok_or_else(|| AppError::NotFound("booking".to_string()))?;

    if booking.payment_method != PaymentMethod::Mollie {
        return Err(AppError::InvalidState(
            "this booking was not paid through Mollie".to_string(),
        ));
    }

    let amount = body.amount.unwrap_or(booking.total_price);
    let reason = body.reason.as_deref().unwrap_or("requested by customer");

    let (booking, receipt) = engine::refund_payment(&state, &booking.id, amount, reason).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "bookingId": booking.id,
        "refundId": receipt.refund_id,
        "refundStatus": booking.refund_status,
    })))
}

// POST /webhooks/mollie
//
// Mollie posts only the payment id; the authoritative status is re-fetched
// from the API before anything changes. Always acknowledges with 200 for
// payments we no longer know about, so Mollie stops retrying.
#[derive(Deserialize)]
pub struct MollieWebhook {
    pub id: String,
}

pub async fn mollie_webhook(
    State(state): State<Arc<AppState>>,
    Form(body): Form<MollieWebhook>,
) -> Result<Json<serde_json::Value>, AppError> {
    let status = state
        .gateway(PaymentMethod::Mollie)
        .query_status(&body.id)
        .await
        .map_err(|e| AppError::Gateway(e.to_string()))?;

    tracing::info!(payment_id = %body.id, status = status.as_str(), "mollie webhook received");

    match status {
        ProviderStatus::Paid => {
            match engine::confirm_payment(&state, Provider::Mollie, &body.id, None).await {
                Ok(_) => {}
                Err(AppError::NotFound(_)) => {
                    tracing::warn!(payment_id = %body.id, "paid webhook for unknown booking");
                }
                Err(e) => return Err(e),
            }
        }
        ProviderStatus::Expired => {
            engine::expire_payment(&state, &body.id)?;
        }
        ProviderStatus::Cancelled | ProviderStatus::Failed => {
            match engine::cancel_pending(&state, Provider::Mollie, &body.id) {
                Ok(_) => {}
                Err(AppError::NotFound(_)) | Err(AppError::InvalidState(_)) => {
                    tracing::warn!(
                        payment_id = %body.id,
                        status = status.as_str(),
                        "webhook for booking not in a cancellable state"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        ProviderStatus::Pending => {}
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
