use anyhow::Context;
use async_trait::async_trait;

use super::{BookingDetails, Notifier};
use crate::models::Booking;

/// Posts notification payloads to an external mail relay. When no relay URL
/// is configured the mailer degrades to logging, which keeps local
/// development quiet.
pub struct HttpMailer {
    relay_url: String,
    admin_email: String,
    client: reqwest::Client,
}

impl HttpMailer {
    pub fn new(relay_url: String, admin_email: String) -> Self {
        Self {
            relay_url,
            admin_email,
            client: reqwest::Client::new(),
        }
    }

    async fn post(&self, template: &str, to: &str, payload: serde_json::Value) -> anyhow::Result<()> {
        if self.relay_url.is_empty() {
            tracing::info!(template, to, "mail relay not configured, skipping send");
            return Ok(());
        }

        self.client
            .post(&self.relay_url)
            .json(&serde_json::json!({
                "to": to,
                "template": template,
                "payload": payload,
            }))
            .send()
            .await
            .context("failed to reach mail relay")?
            .error_for_status()
            .context("mail relay returned error")?;

        Ok(())
    }
}

#[async_trait]
impl Notifier for HttpMailer {
    async fn send_confirmation(
        &self,
        booking: &Booking,
        details: &BookingDetails,
    ) -> anyhow::Result<()> {
        self.post(
            "booking-confirmation",
            &booking.email,
            serde_json::json!({
                "customerName": booking.customer_name,
                "details": details,
            }),
        )
        .await
    }

    async fn send_admin_notification(
        &self,
        booking: &Booking,
        details: &BookingDetails,
    ) -> anyhow::Result<()> {
        self.post(
            "admin-booking-notice",
            &self.admin_email,
            serde_json::json!({
                "bookingId": booking.id,
                "customerName": booking.customer_name,
                "contactNumber": booking.contact_number,
                "postcode": booking.postcode,
                "details": details,
            }),
        )
        .await
    }

    async fn send_refund_notice(&self, booking: &Booking, refund_id: &str) -> anyhow::Result<()> {
        let payload = serde_json::json!({
            "bookingId": booking.id,
            "customerName": booking.customer_name,
            "refundId": refund_id,
            "amount": booking.refund_amount.map(|a| a.to_string()),
            "reason": booking.refund_reason,
        });

        self.post("refund-notice", &booking.email, payload.clone())
            .await?;
        self.post("admin-refund-notice", &self.admin_email, payload)
            .await
    }
}
