pub mod cash;
pub mod mollie;
pub mod paypal;

use async_trait::async_trait;
use rust_decimal::Decimal;

/// Provider payment state normalized across gateways.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStatus {
    Paid,
    Pending,
    Expired,
    Cancelled,
    Failed,
}

impl ProviderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderStatus::Paid => "paid",
            ProviderStatus::Pending => "pending",
            ProviderStatus::Expired => "expired",
            ProviderStatus::Cancelled => "cancelled",
            ProviderStatus::Failed => "failed",
        }
    }
}

/// Booking details carried into the provider-facing payment description and
/// metadata.
#[derive(Debug, Clone)]
pub struct PaymentContext {
    pub booking_id: String,
    pub service: String,
    pub date: String,
    pub time_slot: String,
}

#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub payment_id: String,
    pub approval_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RefundReceipt {
    pub refund_id: String,
}

/// Uniform capability set over the external payment providers. One
/// implementation is selected per booking at creation time; the engine never
/// branches on provider-specific shapes.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(
        &self,
        amount: Decimal,
        ctx: &PaymentContext,
    ) -> anyhow::Result<PaymentIntent>;

    async fn query_status(&self, payment_id: &str) -> anyhow::Result<ProviderStatus>;

    async fn refund(
        &self,
        payment_id: &str,
        amount: Decimal,
        reason: &str,
    ) -> anyhow::Result<RefundReceipt>;
}
