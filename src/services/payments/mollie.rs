use anyhow::{bail, Context};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{PaymentContext, PaymentGateway, PaymentIntent, ProviderStatus, RefundReceipt};

/// Mollie Payments API. Confirmation is delivered asynchronously: Mollie
/// posts the payment id to our webhook and we fetch the authoritative status
/// back from the API.
pub struct MollieGateway {
    api_url: String,
    api_key: String,
    base_url: String,
    frontend_url: String,
    client: reqwest::Client,
}

impl MollieGateway {
    pub fn new(api_url: String, api_key: String, base_url: String, frontend_url: String) -> Self {
        Self {
            api_url,
            api_key,
            base_url,
            frontend_url,
            client: reqwest::Client::new(),
        }
    }

    async fn get_payment(&self, payment_id: &str) -> anyhow::Result<PaymentResponse> {
        self.client
            .get(format!("{}/payments/{payment_id}", self.api_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context("failed to reach Mollie payments endpoint")?
            .error_for_status()
            .context("Mollie payment lookup failed")?
            .json()
            .await
            .context("failed to decode Mollie payment response")
    }
}

#[derive(Deserialize)]
struct PaymentResponse {
    id: String,
    status: String,
    #[serde(rename = "_links", default)]
    links: PaymentLinks,
}

#[derive(Deserialize, Default)]
struct PaymentLinks {
    checkout: Option<Link>,
}

#[derive(Deserialize)]
struct Link {
    href: String,
}

fn normalize_status(status: &str) -> ProviderStatus {
    match status {
        "paid" => ProviderStatus::Paid,
        "open" | "pending" | "authorized" => ProviderStatus::Pending,
        "expired" => ProviderStatus::Expired,
        "canceled" => ProviderStatus::Cancelled,
        _ => ProviderStatus::Failed,
    }
}

// Mollie wants amounts as exact two-decimal strings.
fn money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

#[async_trait]
impl PaymentGateway for MollieGateway {
    async fn create_intent(
        &self,
        amount: Decimal,
        ctx: &PaymentContext,
    ) -> anyhow::Result<PaymentIntent> {
        if amount <= Decimal::ZERO {
            bail!("payment amount must be positive");
        }

        let body = serde_json::json!({
            "amount": { "currency": "GBP", "value": money(amount) },
            "description": format!(
                "Service: {}, Date: {}, Time: {}",
                ctx.service, ctx.date, ctx.time_slot
            ),
            "redirectUrl": format!(
                "{}/booking/confirmation?id={}", self.frontend_url, ctx.booking_id
            ),
            "cancelUrl": format!(
                "{}/booking/booking-cancelled?id={}", self.frontend_url, ctx.booking_id
            ),
            "webhookUrl": format!("{}/webhooks/mollie", self.base_url),
            "metadata": {
                "bookingId": ctx.booking_id,
                "service": ctx.service,
                "date": ctx.date,
                "timeSlot": ctx.time_slot,
            },
        });

        let payment: PaymentResponse = self
            .client
            .post(format!("{}/payments", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to reach Mollie payments endpoint")?
            .error_for_status()
            .context("Mollie rejected payment creation")?
            .json()
            .await
            .context("failed to decode Mollie payment response")?;

        tracing::info!(
            payment_id = %payment.id,
            booking_id = %ctx.booking_id,
            "Mollie payment created"
        );

        Ok(PaymentIntent {
            approval_url: payment.links.checkout.map(|l| l.href),
            payment_id: payment.id,
        })
    }

    async fn query_status(&self, payment_id: &str) -> anyhow::Result<ProviderStatus> {
        let payment = self.get_payment(payment_id).await?;
        Ok(normalize_status(&payment.status))
    }

    async fn refund(
        &self,
        payment_id: &str,
        amount: Decimal,
        reason: &str,
    ) -> anyhow::Result<RefundReceipt> {
        #[derive(Deserialize)]
        struct RefundResponse {
            id: String,
        }

        // Only settled payments can be refunded.
        let payment = self.get_payment(payment_id).await?;
        if payment.status != "paid" {
            bail!(
                "payment {payment_id} is not in a refundable state (status: {})",
                payment.status
            );
        }

        let body = serde_json::json!({
            "amount": { "currency": "GBP", "value": money(amount) },
            "description": reason,
        });

        let refund: RefundResponse = self
            .client
            .post(format!("{}/payments/{payment_id}/refunds", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to reach Mollie refunds endpoint")?
            .error_for_status()
            .context("Mollie rejected the refund")?
            .json()
            .await
            .context("failed to decode Mollie refund response")?;

        tracing::info!(payment_id = %payment_id, refund_id = %refund.id, "Mollie refund issued");

        Ok(RefundReceipt {
            refund_id: refund.id,
        })
    }
}
