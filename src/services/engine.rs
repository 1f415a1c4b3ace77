use chrono::{Datelike, NaiveDate, Utc, Weekday};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    Bedrooms, BookedBy, Booking, BookingRequest, CleaningArea, HomeStyle, PaymentMethod,
    PaymentStatus, Provider, RefundStatus, RepairItem, ServiceKind, TimeLabel,
};
use crate::services::notify::BookingDetails;
use crate::services::payments::{PaymentContext, ProviderStatus, RefundReceipt};
use crate::services::{postcode, pricing};
use crate::state::AppState;

/// A booking request with every field parsed and every stateless guard
/// passed. Producing one of these is the precondition for touching the
/// calendar.
#[derive(Debug)]
pub struct ValidRequest {
    pub date: NaiveDate,
    pub label: TimeLabel,
    pub service: ServiceKind,
    pub cleaning: Vec<CleaningArea>,
    pub repairs: Vec<RepairItem>,
    pub home_style: HomeStyle,
    pub bedrooms: Option<Bedrooms>,
    pub method: PaymentMethod,
    pub group: &'static str,
    pub quote: pricing::PriceQuote,
}

pub fn validate_request(req: &BookingRequest) -> Result<ValidRequest, AppError> {
    let required = [
        ("customer name", &req.customer_name),
        ("email", &req.email),
        ("contact number", &req.contact_number),
        ("first line of address", &req.first_line_of_address),
        ("town", &req.town),
        ("postcode", &req.postcode),
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "required fields are missing: {}",
            missing.join(", ")
        )));
    }
    if !req.terms_conditions {
        return Err(AppError::Validation(
            "you must accept the terms and conditions".to_string(),
        ));
    }
    if !req.email.contains('@') {
        return Err(AppError::Validation(
            "please provide a valid email address".to_string(),
        ));
    }

    let date = NaiveDate::parse_from_str(&req.selected_date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("invalid date format, please use YYYY-MM-DD".to_string()))?;

    let now = Utc::now().naive_utc();
    if date == now.date() {
        return Err(AppError::Validation(
            "bookings for today are not allowed".to_string(),
        ));
    }
    if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        return Err(AppError::Validation(
            "bookings are only allowed from Monday to Friday".to_string(),
        ));
    }

    let label = TimeLabel::parse(&req.selected_time_slot)
        .ok_or_else(|| AppError::Validation("please select a valid time slot".to_string()))?;

    // Guard at slot-label granularity: a slot in progress or already started
    // is not bookable even if the date itself is fine.
    let slot_start = date.and_time(label.start());
    let slot_end = date.and_time(label.end());
    if now >= slot_start && now <= slot_end {
        return Err(AppError::Validation(
            "the selected time slot is currently in progress, please select a different time slot"
                .to_string(),
        ));
    }
    if slot_start <= now {
        return Err(AppError::Validation(
            "the selected time slot is in the past, please select a future time slot".to_string(),
        ));
    }

    let service = ServiceKind::parse(&req.select_service)
        .ok_or_else(|| AppError::Validation("please select a valid service".to_string()))?;
    let home_style = HomeStyle::parse(&req.select_home_style)
        .ok_or_else(|| AppError::Validation("please select a valid home style".to_string()))?;
    let bedrooms = match &req.number_of_bedrooms {
        Some(s) if !s.is_empty() => Some(Bedrooms::parse(s).ok_or_else(|| {
            AppError::Validation("please select a valid number of bedrooms".to_string())
        })?),
        _ => None,
    };
    let cleaning = req
        .gutter_cleaning_options
        .iter()
        .map(|s| {
            CleaningArea::parse(s)
                .ok_or_else(|| AppError::Validation("invalid gutter cleaning option".to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let repairs = req
        .gutter_repairs_options
        .iter()
        .map(|s| {
            RepairItem::parse(s)
                .ok_or_else(|| AppError::Validation("invalid gutter repair option".to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let method = PaymentMethod::parse(&req.payment_method)
        .ok_or_else(|| AppError::Validation("please select a valid payment method".to_string()))?;

    let group = postcode::resolve_group(&req.postcode).ok_or(AppError::UnserviceableArea)?;

    let quote = pricing::quote(service, home_style, bedrooms, &cleaning, &repairs);
    if quote.net <= Decimal::ZERO {
        return Err(AppError::InvalidSelection);
    }

    Ok(ValidRequest {
        date,
        label,
        service,
        cleaning,
        repairs,
        home_style,
        bedrooms,
        method,
        group,
        quote,
    })
}

/// Same-day rules against existing bookings: one postcode group per date,
/// and each time label taken at most once.
fn guard_day(
    conn: &Connection,
    date: NaiveDate,
    label: TimeLabel,
    group: &str,
) -> Result<(), AppError> {
    let existing = queries::bookings_on_date(conn, date)?;
    let Some(first) = existing.first() else {
        return Ok(());
    };

    let existing_group = postcode::resolve_group(&first.postcode);
    if existing_group != Some(group) {
        return Err(AppError::BookingConflict(format!(
            "bookings are already made for this date; only customers from the same postcode \
             area group ({}) can book for this date",
            existing_group.unwrap_or("unknown")
        )));
    }
    if existing.iter().any(|b| b.selected_time_slot == label) {
        return Err(AppError::BookingConflict(format!(
            "the selected time slot is already booked: {}",
            label.as_str()
        )));
    }
    Ok(())
}

fn new_booking(req: &BookingRequest, valid: &ValidRequest, booked_by: BookedBy) -> Booking {
    let now = Utc::now().naive_utc();
    Booking {
        id: Uuid::new_v4().to_string(),
        customer_name: req.customer_name.trim().to_string(),
        email: req.email.trim().to_string(),
        contact_number: req.contact_number.trim().to_string(),
        first_line_of_address: req.first_line_of_address.trim().to_string(),
        town: req.town.trim().to_string(),
        postcode: req.postcode.trim().to_uppercase(),
        selected_date: valid.date,
        selected_time_slot: valid.label,
        service: valid.service,
        cleaning_options: valid.cleaning.clone(),
        repair_options: valid.repairs.clone(),
        home_style: valid.home_style,
        bedrooms: valid.bedrooms,
        stories: req.number_of_stories.clone(),
        message: req.message.clone(),
        // The stored total is the net amount; VAT is reported alongside but
        // not folded in. See DESIGN.md.
        total_price: valid.quote.net,
        payment_method: valid.method,
        payment_status: PaymentStatus::Pending,
        refund_status: RefundStatus::Pending,
        paypal_order_id: None,
        mollie_payment_id: None,
        capture_id: None,
        refund_id: None,
        refund_amount: None,
        refund_reason: None,
        refund_date: None,
        is_locked: true,
        lock_expires_at: None,
        is_booked: false,
        booked_by,
        created_at: now,
        updated_at: now,
    }
}

/// Every creation guard, without mutating anything. Backs the availability
/// pre-check the booking form runs before collecting payment details.
pub fn check_availability(conn: &Connection, req: &BookingRequest) -> Result<(), AppError> {
    let valid = validate_request(req)?;
    guard_day(conn, valid.date, valid.label, valid.group)
}

pub struct CreateOutcome {
    pub booking: Booking,
    pub provider_payment_id: Option<String>,
    pub approval_url: Option<String>,
}

/// Requested → Pending. Slot reservation and booking insert happen inside
/// one critical section over the store; the payment intent is created
/// afterwards and a failure there compensates by releasing the slot and
/// discarding the booking.
pub async fn create_booking(
    state: &AppState,
    req: BookingRequest,
) -> Result<CreateOutcome, AppError> {
    let valid = validate_request(&req)?;

    let mut booking = {
        let db = state.db.lock().unwrap();
        guard_day(&db, valid.date, valid.label, valid.group)?;
        let booking = new_booking(&req, &valid, BookedBy::Customer);
        queries::reserve_slot(&db, valid.date, valid.label, &booking.id)?;
        queries::create_booking(&db, &booking)?;
        booking
    };

    tracing::info!(
        booking_id = %booking.id,
        date = %valid.date,
        slot = valid.label.as_str(),
        group = valid.group,
        "slot reserved, booking pending"
    );

    if valid.method == PaymentMethod::Cash {
        // No provider involved; the booking stays locked until settled on site.
        return Ok(CreateOutcome {
            booking,
            provider_payment_id: None,
            approval_url: None,
        });
    }

    let ctx = PaymentContext {
        booking_id: booking.id.clone(),
        service: booking.service.as_str().to_string(),
        date: booking.selected_date.format("%Y-%m-%d").to_string(),
        time_slot: booking.selected_time_slot.as_str().to_string(),
    };

    match state
        .gateway(valid.method)
        .create_intent(booking.total_price, &ctx)
        .await
    {
        Ok(intent) => {
            let provider = match valid.method {
                PaymentMethod::PayPal => Provider::PayPal,
                PaymentMethod::Mollie => Provider::Mollie,
                PaymentMethod::Cash => unreachable!("cash handled above"),
            };
            {
                let db = state.db.lock().unwrap();
                queries::set_provider_payment_id(&db, &booking.id, provider, &intent.payment_id)?;
            }
            match provider {
                Provider::PayPal => booking.paypal_order_id = Some(intent.payment_id.clone()),
                Provider::Mollie => booking.mollie_payment_id = Some(intent.payment_id.clone()),
            }
            Ok(CreateOutcome {
                booking,
                provider_payment_id: Some(intent.payment_id),
                approval_url: intent.approval_url,
            })
        }
        Err(e) => {
            // Reservation and intent creation are one logical transaction;
            // undo the first half before surfacing the failure.
            {
                let db = state.db.lock().unwrap();
                queries::delete_booking(&db, &booking.id)?;
                queries::release_slot(&db, valid.date, valid.label)?;
            }
            tracing::warn!(
                booking_id = %booking.id,
                error = %e,
                "payment intent creation failed, booking rolled back"
            );
            Err(AppError::Gateway(e.to_string()))
        }
    }
}

/// Admin-created bookings skip the gateway entirely and land completed.
pub fn create_booking_by_admin(state: &AppState, req: BookingRequest) -> Result<Booking, AppError> {
    let valid = validate_request(&req)?;

    let db = state.db.lock().unwrap();
    guard_day(&db, valid.date, valid.label, valid.group)?;

    let mut booking = new_booking(&req, &valid, BookedBy::Admin);
    booking.payment_status = PaymentStatus::Completed;
    booking.is_booked = true;

    queries::reserve_slot(&db, valid.date, valid.label, &booking.id)?;
    queries::create_booking(&db, &booking)?;

    tracing::info!(booking_id = %booking.id, "booking created by admin");
    Ok(booking)
}

pub enum ConfirmOutcome {
    /// First confirmation: state flipped, notifications sent.
    Confirmed(Booking),
    /// Duplicate delivery: nothing changed, nothing sent.
    AlreadyCompleted(Booking),
}

impl ConfirmOutcome {
    pub fn booking(&self) -> &Booking {
        match self {
            ConfirmOutcome::Confirmed(b) | ConfirmOutcome::AlreadyCompleted(b) => b,
        }
    }
}

/// Pending → Completed, driven by either a synchronous capture callback or
/// an asynchronous `paid` webhook. Safe to invoke any number of times for
/// the same payment id.
pub async fn confirm_payment(
    state: &AppState,
    provider: Provider,
    payment_id: &str,
    capture_id: Option<&str>,
) -> Result<ConfirmOutcome, AppError> {
    let (booking, first_transition) = {
        let db = state.db.lock().unwrap();
        let booking = queries::booking_by_provider_id(&db, provider, payment_id)?
            .ok_or_else(|| AppError::NotFound("booking".to_string()))?;

        if booking.payment_status == PaymentStatus::Completed {
            (booking, false)
        } else {
            queries::mark_payment_completed(&db, &booking.id, capture_id)?;
            let booking = queries::get_booking(&db, &booking.id)?
                .ok_or_else(|| AppError::NotFound("booking".to_string()))?;
            (booking, true)
        }
    };

    if !first_transition {
        tracing::info!(booking_id = %booking.id, "payment already captured, ignoring duplicate");
        return Ok(ConfirmOutcome::AlreadyCompleted(booking));
    }

    tracing::info!(booking_id = %booking.id, payment_id, "payment confirmed, booking completed");

    let details = BookingDetails::from_booking(&booking);
    if let Err(e) = state.notifier.send_confirmation(&booking, &details).await {
        tracing::error!(booking_id = %booking.id, error = %e, "failed to send confirmation email");
    }
    if let Err(e) = state
        .notifier
        .send_admin_notification(&booking, &details)
        .await
    {
        tracing::error!(booking_id = %booking.id, error = %e, "failed to send admin notification");
    }

    Ok(ConfirmOutcome::Confirmed(booking))
}

/// Pending → Expired: the provider gave up on the intent. The booking is
/// discarded and its slot returns to the pool. A booking that cannot be
/// matched is ignored (late webhook for an already-removed booking); a
/// missing slot row is a consistency bug and propagates.
pub fn expire_payment(state: &AppState, payment_id: &str) -> Result<Option<Booking>, AppError> {
    let db = state.db.lock().unwrap();

    let Some(booking) = queries::booking_by_provider_id(&db, Provider::Mollie, payment_id)? else {
        tracing::warn!(payment_id, "no booking found for expired payment");
        return Ok(None);
    };

    queries::delete_booking(&db, &booking.id)?;
    queries::release_slot(&db, booking.selected_date, booking.selected_time_slot)?;

    tracing::info!(booking_id = %booking.id, payment_id, "payment expired, booking removed");
    Ok(Some(booking))
}

/// Pending → Cancelled, on explicit customer/admin cancellation. Only
/// pending payments can be cancelled; the booking is discarded and the slot
/// released.
pub fn cancel_pending(
    state: &AppState,
    provider: Provider,
    payment_id: &str,
) -> Result<Booking, AppError> {
    let db = state.db.lock().unwrap();

    let booking = queries::booking_by_provider_id(&db, provider, payment_id)?
        .ok_or_else(|| AppError::NotFound("booking".to_string()))?;

    if booking.payment_status != PaymentStatus::Pending {
        return Err(AppError::InvalidState(
            "this booking's payment has already been processed or cancelled".to_string(),
        ));
    }

    queries::delete_booking(&db, &booking.id)?;
    queries::release_slot(&db, booking.selected_date, booking.selected_time_slot)?;

    tracing::info!(booking_id = %booking.id, "pending booking cancelled, slot released");
    Ok(booking)
}

/// Admin removal of a booking in any state; the slot is released.
pub fn delete_booking(state: &AppState, booking_id: &str) -> Result<Booking, AppError> {
    let db = state.db.lock().unwrap();

    let booking = queries::get_booking(&db, booking_id)?
        .ok_or_else(|| AppError::NotFound("booking".to_string()))?;

    queries::delete_booking(&db, &booking.id)?;
    queries::release_slot(&db, booking.selected_date, booking.selected_time_slot)?;

    tracing::info!(booking_id = %booking.id, "booking deleted by admin");
    Ok(booking)
}

/// Completed → Refund-Completed. The gateway is the arbiter of
/// refundability; on success the refund is recorded and the customer and
/// admin are notified. The slot deliberately stays booked (see DESIGN.md).
pub async fn refund_payment(
    state: &AppState,
    booking_id: &str,
    amount: Decimal,
    reason: &str,
) -> Result<(Booking, RefundReceipt), AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking(&db, booking_id)?
            .ok_or_else(|| AppError::NotFound("booking".to_string()))?
    };

    if booking.payment_status != PaymentStatus::Completed {
        return Err(AppError::InvalidState(
            "only completed payments can be refunded".to_string(),
        ));
    }

    let payment_ref = match booking.payment_method {
        PaymentMethod::PayPal => booking.capture_id.clone().ok_or_else(|| {
            AppError::InvalidState("no capture id recorded for this booking".to_string())
        })?,
        PaymentMethod::Mollie => booking.mollie_payment_id.clone().ok_or_else(|| {
            AppError::InvalidState("no Mollie payment id found for this booking".to_string())
        })?,
        PaymentMethod::Cash => {
            return Err(AppError::InvalidState(
                "cash bookings cannot be refunded through a payment provider".to_string(),
            ))
        }
    };

    let receipt = state
        .gateway(booking.payment_method)
        .refund(&payment_ref, amount, reason)
        .await
        .map_err(|e| AppError::Gateway(e.to_string()))?;

    let booking = {
        let db = state.db.lock().unwrap();
        queries::record_refund(&db, &booking.id, &receipt.refund_id, amount, reason)?;
        queries::get_booking(&db, &booking.id)?
            .ok_or_else(|| AppError::NotFound("booking".to_string()))?
    };

    tracing::info!(
        booking_id = %booking.id,
        refund_id = %receipt.refund_id,
        "refund completed"
    );

    if let Err(e) = state
        .notifier
        .send_refund_notice(&booking, &receipt.refund_id)
        .await
    {
        tracing::error!(booking_id = %booking.id, error = %e, "failed to send refund notices");
    }

    Ok((booking, receipt))
}

/// Current provider-side status of a booking's payment.
pub async fn payment_status(
    state: &AppState,
    booking_id: &str,
) -> Result<(Booking, ProviderStatus), AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking(&db, booking_id)?
            .ok_or_else(|| AppError::NotFound("booking".to_string()))?
    };

    let status = match booking.provider_payment_id() {
        Some(payment_id) => state
            .gateway(booking.payment_method)
            .query_status(payment_id)
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?,
        // Cash: the no-op gateway reports pending until manual settlement.
        None => state
            .cash
            .query_status(&booking.id)
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?,
    };

    Ok((booking, status))
}

/// Partial admin edit. Moving the booking to another date/slot re-runs the
/// calendar guards (weekday, not today, single group, target slot free) and
/// re-seats the slot reservation; postcode edits are held to the same
/// single-group rule for the booking's date.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPatch {
    pub customer_name: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub first_line_of_address: Option<String>,
    pub town: Option<String>,
    pub postcode: Option<String>,
    pub selected_date: Option<String>,
    pub selected_time_slot: Option<String>,
    pub message: Option<String>,
}

pub fn update_booking_by_admin(
    state: &AppState,
    booking_id: &str,
    patch: BookingPatch,
) -> Result<Booking, AppError> {
    let db = state.db.lock().unwrap();

    let mut booking = queries::get_booking(&db, booking_id)?
        .ok_or_else(|| AppError::NotFound("booking".to_string()))?;

    let new_date = match &patch.selected_date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
            AppError::Validation("invalid date format, please use YYYY-MM-DD".to_string())
        })?,
        None => booking.selected_date,
    };
    let new_label = match &patch.selected_time_slot {
        Some(s) => TimeLabel::parse(s)
            .ok_or_else(|| AppError::Validation("please select a valid time slot".to_string()))?,
        None => booking.selected_time_slot,
    };

    let new_postcode = match &patch.postcode {
        Some(p) => p.trim().to_uppercase(),
        None => booking.postcode.clone(),
    };
    let group = postcode::resolve_group(&new_postcode).ok_or(AppError::UnserviceableArea)?;

    let moving = (new_date, new_label) != (booking.selected_date, booking.selected_time_slot);
    if moving {
        if new_date == Utc::now().date_naive() {
            return Err(AppError::Validation(
                "cannot move a booking to today".to_string(),
            ));
        }
        if matches!(new_date.weekday(), Weekday::Sat | Weekday::Sun) {
            return Err(AppError::Validation(
                "bookings can only be moved to weekdays".to_string(),
            ));
        }
    }

    // A date move or postcode edit must keep the target date single-group.
    // The booking's own record is excluded so same-day slot moves pass.
    let existing = queries::bookings_on_date(&db, new_date)?;
    if let Some(other) = existing.iter().find(|b| b.id != booking.id) {
        let day_group = postcode::resolve_group(&other.postcode);
        if day_group != Some(group) {
            return Err(AppError::BookingConflict(format!(
                "bookings on this date belong to the {} postcode area group",
                day_group.unwrap_or("unknown")
            )));
        }
    }

    if moving {
        // Take the new slot before giving up the old one, so a lost race
        // leaves the booking where it was.
        queries::reserve_slot(&db, new_date, new_label, &booking.id)?;
        queries::release_slot(&db, booking.selected_date, booking.selected_time_slot)?;

        booking.selected_date = new_date;
        booking.selected_time_slot = new_label;
    }
    booking.postcode = new_postcode;

    if let Some(v) = patch.customer_name {
        booking.customer_name = v;
    }
    if let Some(v) = patch.email {
        booking.email = v;
    }
    if let Some(v) = patch.contact_number {
        booking.contact_number = v;
    }
    if let Some(v) = patch.first_line_of_address {
        booking.first_line_of_address = v;
    }
    if let Some(v) = patch.town {
        booking.town = v;
    }
    if let Some(v) = patch.message {
        booking.message = Some(v);
    }

    if !queries::update_booking(&db, &booking)? {
        return Err(AppError::NotFound("booking".to_string()));
    }

    tracing::info!(booking_id = %booking.id, "booking updated by admin");
    Ok(booking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn future_weekday(weeks_ahead: i64) -> NaiveDate {
        let mut date = Utc::now().date_naive() + Duration::weeks(weeks_ahead);
        while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            date += Duration::days(1);
        }
        date
    }

    fn base_request() -> BookingRequest {
        BookingRequest {
            customer_name: "Jamie Price".to_string(),
            email: "jamie@example.com".to_string(),
            contact_number: "+447700900123".to_string(),
            first_line_of_address: "12 Mill Lane".to_string(),
            town: "Crawley".to_string(),
            postcode: "RH10 1AA".to_string(),
            selected_date: future_weekday(2).format("%Y-%m-%d").to_string(),
            selected_time_slot: "9:00-9:45 AM".to_string(),
            select_service: "Gutter Cleaning".to_string(),
            select_home_style: "Terrace".to_string(),
            number_of_bedrooms: Some("3 Bedroom".to_string()),
            payment_method: "Mollie".to_string(),
            terms_conditions: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_request_passes_and_prices() {
        let valid = validate_request(&base_request()).unwrap();
        assert_eq!(valid.group, "Crawley");
        assert_eq!(valid.quote.net.to_string(), "69");
    }

    #[test]
    fn test_missing_required_fields_rejected() {
        let mut req = base_request();
        req.customer_name = String::new();
        req.town = "  ".to_string();
        let err = validate_request(&req).unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("customer name"));
                assert!(msg.contains("town"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_today_rejected() {
        let mut req = base_request();
        req.selected_date = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        let err = validate_request(&req).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("today")));
    }

    #[test]
    fn test_weekend_rejected() {
        let mut req = base_request();
        let mut date = Utc::now().date_naive() + Duration::weeks(1);
        while date.weekday() != Weekday::Sat {
            date += Duration::days(1);
        }
        req.selected_date = date.format("%Y-%m-%d").to_string();
        let err = validate_request(&req).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("Monday to Friday")));
    }

    #[test]
    fn test_unknown_time_slot_rejected() {
        let mut req = base_request();
        req.selected_time_slot = "4:00-4:45 PM".to_string();
        let err = validate_request(&req).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("time slot")));
    }

    #[test]
    fn test_unserviced_postcode_rejected() {
        let mut req = base_request();
        req.postcode = "OX1 2JD".to_string();
        let err = validate_request(&req).unwrap_err();
        assert!(matches!(err, AppError::UnserviceableArea));
    }

    #[test]
    fn test_zero_price_selection_rejected() {
        let mut req = base_request();
        req.select_home_style = "Town House/3 Stories".to_string();
        req.number_of_bedrooms = Some("2 Bedroom".to_string());
        let err = validate_request(&req).unwrap_err();
        assert!(matches!(err, AppError::InvalidSelection));
    }

    #[test]
    fn test_group_conflict_detected() {
        let conn = crate::db::init_db(":memory:").unwrap();
        let req = base_request();
        let valid = validate_request(&req).unwrap();

        let existing = new_booking(&req, &valid, BookedBy::Customer);
        queries::create_booking(&conn, &existing).unwrap();

        // same group, different slot: fine
        guard_day(&conn, valid.date, TimeLabel::Slot0945, "Crawley").unwrap();

        // different group, same date: conflict
        let err = guard_day(&conn, valid.date, TimeLabel::Slot0945, "Horsham").unwrap_err();
        assert!(matches!(err, AppError::BookingConflict(_)));

        // same group, same slot: conflict
        let err = guard_day(&conn, valid.date, valid.label, "Crawley").unwrap_err();
        assert!(matches!(err, AppError::BookingConflict(_)));
    }
}
