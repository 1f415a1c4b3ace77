use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use tower::ServiceExt;

use gutterbook::config::AppConfig;
use gutterbook::db;
use gutterbook::handlers;
use gutterbook::models::Booking;
use gutterbook::services::notify::{BookingDetails, Notifier};
use gutterbook::services::payments::{
    PaymentContext, PaymentGateway, PaymentIntent, ProviderStatus, RefundReceipt,
};
use gutterbook::state::AppState;

// ── Mock Providers ──

struct MockGateway {
    prefix: &'static str,
    fail_intent: bool,
    status: Arc<Mutex<ProviderStatus>>,
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_intent(
        &self,
        _amount: Decimal,
        ctx: &PaymentContext,
    ) -> anyhow::Result<PaymentIntent> {
        if self.fail_intent {
            anyhow::bail!("provider unavailable");
        }
        Ok(PaymentIntent {
            payment_id: format!("{}_{}", self.prefix, ctx.booking_id),
            approval_url: Some("https://pay.example/checkout".to_string()),
        })
    }

    async fn query_status(&self, _payment_id: &str) -> anyhow::Result<ProviderStatus> {
        Ok(*self.status.lock().unwrap())
    }

    async fn refund(
        &self,
        payment_id: &str,
        _amount: Decimal,
        _reason: &str,
    ) -> anyhow::Result<RefundReceipt> {
        Ok(RefundReceipt {
            refund_id: format!("re_{payment_id}"),
        })
    }
}

struct MockNotifier {
    events: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_confirmation(
        &self,
        _booking: &Booking,
        _details: &BookingDetails,
    ) -> anyhow::Result<()> {
        self.events.lock().unwrap().push("confirmation".to_string());
        Ok(())
    }

    async fn send_admin_notification(
        &self,
        _booking: &Booking,
        _details: &BookingDetails,
    ) -> anyhow::Result<()> {
        self.events.lock().unwrap().push("admin".to_string());
        Ok(())
    }

    async fn send_refund_notice(
        &self,
        _booking: &Booking,
        _refund_id: &str,
    ) -> anyhow::Result<()> {
        self.events.lock().unwrap().push("refund".to_string());
        Ok(())
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        base_url: "http://localhost:3000".to_string(),
        frontend_url: "http://localhost:5173".to_string(),
        paypal_api_url: "http://localhost:9/paypal".to_string(),
        paypal_client_id: "".to_string(),
        paypal_client_secret: "".to_string(),
        mollie_api_url: "http://localhost:9/mollie".to_string(),
        mollie_api_key: "".to_string(),
        notify_url: "".to_string(),
        admin_email: "admin@example.com".to_string(),
    }
}

struct Harness {
    state: Arc<AppState>,
    mollie_status: Arc<Mutex<ProviderStatus>>,
    notifications: Arc<Mutex<Vec<String>>>,
}

fn harness_with(fail_intent: bool) -> Harness {
    let mollie_status = Arc::new(Mutex::new(ProviderStatus::Pending));
    let notifications = Arc::new(Mutex::new(vec![]));

    let conn = db::init_db(":memory:").unwrap();
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
        paypal: Box::new(MockGateway {
            prefix: "pp",
            fail_intent,
            status: Arc::new(Mutex::new(ProviderStatus::Pending)),
        }),
        mollie: Box::new(MockGateway {
            prefix: "tr",
            fail_intent,
            status: Arc::clone(&mollie_status),
        }),
        cash: Box::new(gutterbook::services::payments::cash::CashGateway),
        notifier: Box::new(MockNotifier {
            events: Arc::clone(&notifications),
        }),
    });

    Harness {
        state,
        mollie_status,
        notifications,
    }
}

fn harness() -> Harness {
    harness_with(false)
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/bookings/check", post(handlers::bookings::check))
        .route("/api/bookings", post(handlers::bookings::create))
        .route(
            "/api/payments/:booking_id/status",
            get(handlers::payments::status),
        )
        .route(
            "/api/payments/paypal/capture",
            post(handlers::payments::paypal_capture),
        )
        .route(
            "/api/payments/paypal/cancel",
            post(handlers::payments::paypal_cancel),
        )
        .route(
            "/api/payments/mollie/cancel/:payment_id",
            post(handlers::payments::mollie_cancel),
        )
        .route(
            "/api/payments/refund",
            post(handlers::payments::paypal_refund),
        )
        .route(
            "/api/payments/mollie/refund",
            post(handlers::payments::mollie_refund),
        )
        .route("/webhooks/mollie", post(handlers::payments::mollie_webhook))
        .route("/api/slots", get(handlers::slots::day))
        .route("/api/slots/disabled", get(handlers::slots::disabled))
        .route("/api/admin/slots/block", post(handlers::slots::block))
        .route("/api/admin/slots/unblock", post(handlers::slots::unblock))
        .route(
            "/api/admin/bookings",
            get(handlers::bookings::admin_list).post(handlers::bookings::admin_create),
        )
        .route(
            "/api/admin/bookings/:id",
            get(handlers::bookings::admin_get)
                .put(handlers::bookings::admin_update)
                .delete(handlers::bookings::admin_delete),
        )
        .with_state(state)
}

/// Next weekday at least `weeks` weeks out, so slot-start guards always pass.
fn future_weekday(weeks: i64) -> NaiveDate {
    let mut date = Utc::now().date_naive() + Duration::weeks(weeks);
    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        date += Duration::days(1);
    }
    date
}

fn fmt(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn booking_body(postcode: &str, date: &str, slot: &str, method: &str) -> serde_json::Value {
    serde_json::json!({
        "customerName": "Jamie Price",
        "email": "jamie@example.com",
        "contactNumber": "+447700900123",
        "firstLineOfAddress": "12 Mill Lane",
        "town": "Crawley",
        "postcode": postcode,
        "selectedDate": date,
        "selectedTimeSlot": slot,
        "selectService": "Gutter Cleaning",
        "selectHomeStyle": "Terrace",
        "numberOfBedrooms": "3 Bedroom",
        "paymentMethod": method,
        "termsConditions": true,
    })
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_request(method: &str, uri: &str, body: Option<&serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", "Bearer test-token");
    match body {
        Some(b) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn webhook_form(payment_id: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhooks/mollie")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(format!("id={payment_id}")))
        .unwrap()
}

async fn json_body(res: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn slot_status(app: &Router, date: &str, slot: &str) -> String {
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/slots?date={date}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    body["slots"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["time"] == slot)
        .map(|s| s["status"].as_str().unwrap().to_string())
        .unwrap()
}

/// Creates a Mollie booking and returns (bookingId, paymentId).
async fn create_mollie_booking(app: &Router, date: &str, slot: &str) -> (String, String) {
    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            &booking_body("RH10 1AA", date, slot, "Mollie"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["success"], true);
    (
        body["bookingId"].as_str().unwrap().to_string(),
        body["paymentId"].as_str().unwrap().to_string(),
    )
}

// ── Health and auth ──

#[tokio::test]
async fn test_health_ok() {
    let app = test_app(harness().state);
    let res = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_requires_auth() {
    let app = test_app(harness().state);

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/bookings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/bookings")
                .header("Authorization", "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

// ── Booking creation ──

#[tokio::test]
async fn test_booking_reserves_slot_and_prices_correctly() {
    let app = test_app(harness().state);
    let date = fmt(future_weekday(2));

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            &booking_body("RH10 1AA", &date, "9:00-9:45 AM", "Mollie"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["totalPrice"], "69");
    assert!(body["paymentId"].as_str().unwrap().starts_with("tr_"));
    assert_eq!(body["approvalUrl"], "https://pay.example/checkout");

    assert_eq!(slot_status(&app, &date, "9:00-9:45 AM").await, "booked");

    // same slot again loses
    let res = app
        .oneshot(post_json(
            "/api/bookings",
            &booking_body("RH11 7GH", &date, "9:00-9:45 AM", "Mollie"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_one_postcode_group_per_day() {
    let app = test_app(harness().state);
    let date = fmt(future_weekday(2));

    create_mollie_booking(&app, &date, "9:00-9:45 AM").await;

    // Horsham postcode on a Crawley day
    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            &booking_body("RH12 2AB", &date, "9:45-10:30 AM", "Mollie"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // another Crawley postcode is fine
    let res = app
        .oneshot(post_json(
            "/api/bookings",
            &booking_body("RH11 7GH", &date, "9:45-10:30 AM", "Mollie"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_today_and_weekend_rejected() {
    let app = test_app(harness().state);

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            &booking_body(
                "RH10 1AA",
                &fmt(Utc::now().date_naive()),
                "9:00-9:45 AM",
                "Mollie",
            ),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let mut saturday = Utc::now().date_naive() + Duration::weeks(1);
    while saturday.weekday() != Weekday::Sat {
        saturday += Duration::days(1);
    }
    let res = app
        .oneshot(post_json(
            "/api/bookings",
            &booking_body("RH10 1AA", &fmt(saturday), "9:00-9:45 AM", "Mollie"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unserviced_postcode_rejected() {
    let app = test_app(harness().state);
    let res = app
        .oneshot(post_json(
            "/api/bookings",
            &booking_body("OX1 2JD", &fmt(future_weekday(2)), "9:00-9:45 AM", "Mollie"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_zero_price_selection_rejected_before_reservation() {
    let app = test_app(harness().state);
    let date = fmt(future_weekday(2));

    let mut body = booking_body("RH10 1AA", &date, "9:00-9:45 AM", "Mollie");
    body["selectHomeStyle"] = "Town House/3 Stories".into();
    body["numberOfBedrooms"] = "2 Bedroom".into();

    let res = app
        .clone()
        .oneshot(post_json("/api/bookings", &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert_eq!(slot_status(&app, &date, "9:00-9:45 AM").await, "available");
}

#[tokio::test]
async fn test_gateway_failure_rolls_back_reservation() {
    let app = test_app(harness_with(true).state);
    let date = fmt(future_weekday(2));

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            &booking_body("RH10 1AA", &date, "9:00-9:45 AM", "Mollie"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    // slot free again, no orphan booking left behind
    assert_eq!(slot_status(&app, &date, "9:00-9:45 AM").await, "available");

    let res = app
        .oneshot(admin_request("GET", "/api/admin/bookings", None))
        .await
        .unwrap();
    let body = json_body(res).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_availability_check_does_not_reserve() {
    let app = test_app(harness().state);
    let date = fmt(future_weekday(2));
    let body = booking_body("RH10 1AA", &date, "9:00-9:45 AM", "Mollie");

    let res = app
        .clone()
        .oneshot(post_json("/api/bookings/check", &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(slot_status(&app, &date, "9:00-9:45 AM").await, "available");

    create_mollie_booking(&app, &date, "9:00-9:45 AM").await;

    let res = app
        .oneshot(post_json("/api/bookings/check", &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

// ── Payment lifecycle ──

#[tokio::test]
async fn test_mollie_webhook_confirms_exactly_once() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));
    let date = fmt(future_weekday(2));

    let (booking_id, payment_id) = create_mollie_booking(&app, &date, "9:00-9:45 AM").await;

    *h.mollie_status.lock().unwrap() = ProviderStatus::Paid;
    let res = app.clone().oneshot(webhook_form(&payment_id)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(admin_request(
            "GET",
            &format!("/api/admin/bookings/{booking_id}"),
            None,
        ))
        .await
        .unwrap();
    let body = json_body(res).await;
    assert_eq!(body["booking"]["payment_status"], "completed");
    assert_eq!(body["booking"]["is_booked"], true);
    assert_eq!(h.notifications.lock().unwrap().len(), 2);

    // duplicate delivery: no state change, no second round of emails
    let res = app.oneshot(webhook_form(&payment_id)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(h.notifications.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_mollie_webhook_expiry_releases_slot() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));
    let date = fmt(future_weekday(2));

    let (_, payment_id) = create_mollie_booking(&app, &date, "9:00-9:45 AM").await;

    *h.mollie_status.lock().unwrap() = ProviderStatus::Expired;
    let res = app.clone().oneshot(webhook_form(&payment_id)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    assert_eq!(slot_status(&app, &date, "9:00-9:45 AM").await, "available");

    // the slot can be taken again
    create_mollie_booking(&app, &date, "9:00-9:45 AM").await;
}

#[tokio::test]
async fn test_cancel_pending_releases_slot() {
    let app = test_app(harness().state);
    let date = fmt(future_weekday(2));

    let (_, payment_id) = create_mollie_booking(&app, &date, "9:00-9:45 AM").await;

    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/api/payments/mollie/cancel/{payment_id}"),
            &serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(slot_status(&app, &date, "9:00-9:45 AM").await, "available");

    // already gone
    let res = app
        .oneshot(post_json(
            &format!("/api/payments/mollie/cancel/{payment_id}"),
            &serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_after_completion_rejected() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));
    let date = fmt(future_weekday(2));

    let (_, payment_id) = create_mollie_booking(&app, &date, "9:00-9:45 AM").await;
    *h.mollie_status.lock().unwrap() = ProviderStatus::Paid;
    app.clone().oneshot(webhook_form(&payment_id)).await.unwrap();

    let res = app
        .oneshot(post_json(
            &format!("/api/payments/mollie/cancel/{payment_id}"),
            &serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_refund_keeps_slot_booked() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));
    let date = fmt(future_weekday(2));

    let (booking_id, payment_id) = create_mollie_booking(&app, &date, "9:00-9:45 AM").await;
    *h.mollie_status.lock().unwrap() = ProviderStatus::Paid;
    app.clone().oneshot(webhook_form(&payment_id)).await.unwrap();

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/payments/mollie/refund",
            &serde_json::json!({ "bookingId": booking_id, "reason": "cancelled visit" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["refundStatus"], "completed");
    assert!(body["refundId"].as_str().unwrap().starts_with("re_"));
    assert!(h
        .notifications
        .lock()
        .unwrap()
        .contains(&"refund".to_string()));

    // the day is not reopened by a refund
    assert_eq!(slot_status(&app, &date, "9:00-9:45 AM").await, "booked");
    let res = app
        .oneshot(post_json(
            "/api/bookings",
            &booking_body("RH11 7GH", &date, "9:00-9:45 AM", "Mollie"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_refund_requires_completed_payment() {
    let app = test_app(harness().state);
    let date = fmt(future_weekday(2));

    let (booking_id, _) = create_mollie_booking(&app, &date, "9:00-9:45 AM").await;

    let res = app
        .oneshot(post_json(
            "/api/payments/mollie/refund",
            &serde_json::json!({ "bookingId": booking_id }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_paypal_capture_and_refund() {
    let app = test_app(harness().state);
    let date = fmt(future_weekday(2));

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            &booking_body("RH10 1AA", &date, "9:00-9:45 AM", "PayPal"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let order_id = body["paymentId"].as_str().unwrap().to_string();
    assert!(order_id.starts_with("pp_"));

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/payments/paypal/capture",
            &serde_json::json!({ "orderId": order_id, "captureId": "CAP123" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["paymentStatus"], "completed");

    let res = app
        .oneshot(post_json(
            "/api/payments/refund",
            &serde_json::json!({ "captureId": "CAP123" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["refundStatus"], "completed");
}

#[tokio::test]
async fn test_paypal_cancel_releases_slot() {
    let app = test_app(harness().state);
    let date = fmt(future_weekday(2));

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            &booking_body("RH10 1AA", &date, "9:00-9:45 AM", "PayPal"),
        ))
        .await
        .unwrap();
    let body = json_body(res).await;
    let order_id = body["paymentId"].as_str().unwrap().to_string();

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/payments/paypal/cancel",
            &serde_json::json!({ "orderId": order_id }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(slot_status(&app, &date, "9:00-9:45 AM").await, "available");
}

#[tokio::test]
async fn test_payment_status_endpoint() {
    let app = test_app(harness().state);
    let date = fmt(future_weekday(2));

    let (booking_id, _) = create_mollie_booking(&app, &date, "9:00-9:45 AM").await;

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/payments/{booking_id}/status"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["paymentStatus"], "pending");
    assert_eq!(body["providerStatus"], "pending");

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/payments/no-such-booking/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

// ── Slot administration ──

#[tokio::test]
async fn test_block_prevents_booking_and_unblock_is_owned() {
    let app = test_app(harness().state);
    let date = fmt(future_weekday(2));

    let res = app
        .clone()
        .oneshot(admin_request(
            "POST",
            "/api/admin/slots/block",
            Some(&serde_json::json!({
                "date": date, "times": ["9:00-9:45 AM"], "adminId": "admin-1"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(slot_status(&app, &date, "9:00-9:45 AM").await, "blocked");

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            &booking_body("RH10 1AA", &date, "9:00-9:45 AM", "Mollie"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // a different admin cannot lift the block
    let res = app
        .clone()
        .oneshot(admin_request(
            "POST",
            "/api/admin/slots/unblock",
            Some(&serde_json::json!({
                "date": date, "times": ["9:00-9:45 AM"], "adminId": "admin-2"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .clone()
        .oneshot(admin_request(
            "POST",
            "/api/admin/slots/unblock",
            Some(&serde_json::json!({
                "date": date, "times": ["9:00-9:45 AM"], "adminId": "admin-1"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(post_json(
            "/api/bookings",
            &booking_body("RH10 1AA", &date, "9:00-9:45 AM", "Mollie"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_whole_day_blocked_in_one_request_disables_the_date() {
    let app = test_app(harness().state);
    let date = future_weekday(2);
    let all_slots = [
        "9:00-9:45 AM",
        "9:45-10:30 AM",
        "10:30-11:15 AM",
        "11:15-12:00 PM",
        "12:00-12:45 PM",
        "12:45-1:30 PM",
        "1:30-2:15 PM",
        "2:15-3:00 PM",
    ];

    let res = app
        .clone()
        .oneshot(admin_request(
            "POST",
            "/api/admin/slots/block",
            Some(&serde_json::json!({
                "date": fmt(date), "times": all_slots, "adminId": "admin-1"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(slot_status(&app, &fmt(date), "2:15-3:00 PM").await, "blocked");

    // a partially blocked day elsewhere in the month must not appear
    let other = future_weekday(3);
    app.clone()
        .oneshot(admin_request(
            "POST",
            "/api/admin/slots/block",
            Some(&serde_json::json!({
                "date": fmt(other), "times": ["9:00-9:45 AM"], "adminId": "admin-1"
            })),
        ))
        .await
        .unwrap();

    let res = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/slots/disabled?year={}&month={}",
                    date.year(),
                    date.month()
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let disabled: Vec<&str> = body["disabledDates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(disabled.contains(&fmt(date).as_str()));
    if other.month() == date.month() {
        assert!(!disabled.contains(&fmt(other).as_str()));
    }
}

#[tokio::test]
async fn test_batch_block_with_booked_slot_changes_nothing() {
    let app = test_app(harness().state);
    let date = fmt(future_weekday(2));

    create_mollie_booking(&app, &date, "9:00-9:45 AM").await;

    let res = app
        .clone()
        .oneshot(admin_request(
            "POST",
            "/api/admin/slots/block",
            Some(&serde_json::json!({
                "date": date,
                "times": ["9:00-9:45 AM", "9:45-10:30 AM"],
                "adminId": "admin-1"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // the free slot in the rejected batch stays available
    assert_eq!(slot_status(&app, &date, "9:45-10:30 AM").await, "available");
}

// ── Admin booking management ──

#[tokio::test]
async fn test_admin_created_booking_is_completed() {
    let app = test_app(harness().state);
    let date = fmt(future_weekday(2));

    let res = app
        .clone()
        .oneshot(admin_request(
            "POST",
            "/api/admin/bookings",
            Some(&booking_body("RH10 1AA", &date, "9:00-9:45 AM", "Cash")),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["booking"]["payment_status"], "completed");
    assert_eq!(body["booking"]["booked_by"], "admin");
    assert_eq!(body["booking"]["is_booked"], true);

    assert_eq!(slot_status(&app, &date, "9:00-9:45 AM").await, "booked");
}

#[tokio::test]
async fn test_admin_update_moves_slot() {
    let app = test_app(harness().state);
    let date = fmt(future_weekday(2));

    let (booking_id, _) = create_mollie_booking(&app, &date, "9:00-9:45 AM").await;

    let res = app
        .clone()
        .oneshot(admin_request(
            "PUT",
            &format!("/api/admin/bookings/{booking_id}"),
            Some(&serde_json::json!({ "selectedTimeSlot": "1:30-2:15 PM" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["booking"]["selected_time_slot"], "1:30-2:15 PM");

    assert_eq!(slot_status(&app, &date, "9:00-9:45 AM").await, "available");
    assert_eq!(slot_status(&app, &date, "1:30-2:15 PM").await, "booked");
}

#[tokio::test]
async fn test_admin_update_rejects_taken_slot() {
    let app = test_app(harness().state);
    let date = fmt(future_weekday(2));

    let (booking_id, _) = create_mollie_booking(&app, &date, "9:00-9:45 AM").await;
    create_mollie_booking(&app, &date, "9:45-10:30 AM").await;

    let res = app
        .oneshot(admin_request(
            "PUT",
            &format!("/api/admin/bookings/{booking_id}"),
            Some(&serde_json::json!({ "selectedTimeSlot": "9:45-10:30 AM" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_admin_update_cannot_move_into_another_groups_day() {
    let app = test_app(harness().state);
    let crawley_day = fmt(future_weekday(2));
    let horsham_day = fmt(future_weekday(3));

    create_mollie_booking(&app, &crawley_day, "9:00-9:45 AM").await;

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            &booking_body("RH12 2AB", &horsham_day, "9:00-9:45 AM", "Mollie"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let horsham_booking = body["bookingId"].as_str().unwrap().to_string();

    // moving the Horsham booking onto the Crawley day must not mix groups
    let res = app
        .clone()
        .oneshot(admin_request(
            "PUT",
            &format!("/api/admin/bookings/{horsham_booking}"),
            Some(&serde_json::json!({
                "selectedDate": crawley_day,
                "selectedTimeSlot": "9:45-10:30 AM",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // and the booking stays where it was
    assert_eq!(slot_status(&app, &horsham_day, "9:00-9:45 AM").await, "booked");
    assert_eq!(slot_status(&app, &crawley_day, "9:45-10:30 AM").await, "available");
}

#[tokio::test]
async fn test_admin_update_postcode_held_to_day_group() {
    let app = test_app(harness().state);
    let date = fmt(future_weekday(2));

    create_mollie_booking(&app, &date, "9:00-9:45 AM").await;

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            &booking_body("RH11 7GH", &date, "9:45-10:30 AM", "Mollie"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let booking_id = body["bookingId"].as_str().unwrap().to_string();

    // editing the postcode into the other group breaks the day's exclusivity
    let res = app
        .clone()
        .oneshot(admin_request(
            "PUT",
            &format!("/api/admin/bookings/{booking_id}"),
            Some(&serde_json::json!({ "postcode": "RH12 2AB" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // an unserviced postcode is rejected outright
    let res = app
        .clone()
        .oneshot(admin_request(
            "PUT",
            &format!("/api/admin/bookings/{booking_id}"),
            Some(&serde_json::json!({ "postcode": "OX1 2JD" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // staying inside the group is fine
    let res = app
        .oneshot(admin_request(
            "PUT",
            &format!("/api/admin/bookings/{booking_id}"),
            Some(&serde_json::json!({ "postcode": "RH10 9ZZ" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["booking"]["postcode"], "RH10 9ZZ");
}

#[tokio::test]
async fn test_admin_delete_releases_slot() {
    let app = test_app(harness().state);
    let date = fmt(future_weekday(2));

    let (booking_id, _) = create_mollie_booking(&app, &date, "9:00-9:45 AM").await;

    let res = app
        .clone()
        .oneshot(admin_request(
            "DELETE",
            &format!("/api/admin/bookings/{booking_id}"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(slot_status(&app, &date, "9:00-9:45 AM").await, "available");
}

#[tokio::test]
async fn test_admin_search_filters_bookings() {
    let app = test_app(harness().state);
    let date = fmt(future_weekday(2));

    create_mollie_booking(&app, &date, "9:00-9:45 AM").await;

    let res = app
        .clone()
        .oneshot(admin_request(
            "GET",
            "/api/admin/bookings?search=jamie",
            None,
        ))
        .await
        .unwrap();
    let body = json_body(res).await;
    assert_eq!(body["total"], 1);

    let res = app
        .oneshot(admin_request(
            "GET",
            "/api/admin/bookings?search=nobody-here",
            None,
        ))
        .await
        .unwrap();
    let body = json_body(res).await;
    assert_eq!(body["total"], 0);
}
