pub mod mailer;

use async_trait::async_trait;
use serde::Serialize;

use crate::models::Booking;

/// What a confirmation or refund message needs to say. Rendering is the mail
/// relay's job; this payload is the contract.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    pub date: String,
    pub time_slot: String,
    pub amount: String,
    pub service: String,
}

impl BookingDetails {
    pub fn from_booking(booking: &Booking) -> Self {
        Self {
            date: booking.selected_date.format("%Y-%m-%d").to_string(),
            time_slot: booking.selected_time_slot.as_str().to_string(),
            amount: booking.total_price.to_string(),
            service: booking.service.as_str().to_string(),
        }
    }
}

/// Fire-and-forget customer/admin messaging. The engine logs failures and
/// carries on; a lost email never fails a booking.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_confirmation(
        &self,
        booking: &Booking,
        details: &BookingDetails,
    ) -> anyhow::Result<()>;

    async fn send_admin_notification(
        &self,
        booking: &Booking,
        details: &BookingDetails,
    ) -> anyhow::Result<()>;

    async fn send_refund_notice(&self, booking: &Booking, refund_id: &str) -> anyhow::Result<()>;
}
