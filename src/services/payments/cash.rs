use anyhow::bail;
use async_trait::async_trait;
use rust_decimal::Decimal;

use super::{PaymentContext, PaymentGateway, PaymentIntent, ProviderStatus, RefundReceipt};

/// Cash bookings have no external provider: no intent, no redirect, and the
/// payment stays pending until settled manually on site.
pub struct CashGateway;

#[async_trait]
impl PaymentGateway for CashGateway {
    async fn create_intent(
        &self,
        _amount: Decimal,
        ctx: &PaymentContext,
    ) -> anyhow::Result<PaymentIntent> {
        Ok(PaymentIntent {
            payment_id: format!("cash_{}", ctx.booking_id),
            approval_url: None,
        })
    }

    async fn query_status(&self, _payment_id: &str) -> anyhow::Result<ProviderStatus> {
        Ok(ProviderStatus::Pending)
    }

    async fn refund(
        &self,
        _payment_id: &str,
        _amount: Decimal,
        _reason: &str,
    ) -> anyhow::Result<RefundReceipt> {
        bail!("cash bookings cannot be refunded through a payment provider")
    }
}
