use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{PaymentContext, PaymentGateway, PaymentIntent, ProviderStatus, RefundReceipt};

/// PayPal Orders v2. Confirmation is delivered synchronously: the front end
/// captures the approved order and posts the capture result back to us, so
/// `query_status` is mostly used for cancel/expiry reconciliation.
pub struct PayPalGateway {
    api_url: String,
    client_id: String,
    client_secret: String,
    frontend_url: String,
    client: reqwest::Client,
}

impl PayPalGateway {
    pub fn new(
        api_url: String,
        client_id: String,
        client_secret: String,
        frontend_url: String,
    ) -> Self {
        Self {
            api_url,
            client_id,
            client_secret,
            frontend_url,
            client: reqwest::Client::new(),
        }
    }

    async fn access_token(&self) -> anyhow::Result<String> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let resp: TokenResponse = self
            .client
            .post(format!("{}/v1/oauth2/token", self.api_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("failed to reach PayPal token endpoint")?
            .error_for_status()
            .context("PayPal rejected client credentials")?
            .json()
            .await
            .context("failed to decode PayPal token response")?;

        Ok(resp.access_token)
    }
}

#[derive(Deserialize)]
struct OrderResponse {
    id: String,
    status: String,
    #[serde(default)]
    links: Vec<OrderLink>,
}

#[derive(Deserialize)]
struct OrderLink {
    rel: String,
    href: String,
}

fn normalize_status(status: &str) -> ProviderStatus {
    match status {
        "COMPLETED" => ProviderStatus::Paid,
        "CREATED" | "SAVED" | "APPROVED" | "PAYER_ACTION_REQUIRED" => ProviderStatus::Pending,
        "VOIDED" | "CANCELLED" => ProviderStatus::Cancelled,
        _ => ProviderStatus::Failed,
    }
}

#[async_trait]
impl PaymentGateway for PayPalGateway {
    async fn create_intent(
        &self,
        amount: Decimal,
        ctx: &PaymentContext,
    ) -> anyhow::Result<PaymentIntent> {
        let token = self.access_token().await?;

        let body = serde_json::json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "amount": { "currency_code": "GBP", "value": amount.to_string() },
                "description": format!(
                    "Service: {}, Date: {}, Time: {}",
                    ctx.service, ctx.date, ctx.time_slot
                ),
            }],
            "application_context": {
                "return_url": format!("{}/paypal/return", self.frontend_url),
                "cancel_url": format!("{}/booking-cancelled", self.frontend_url),
            },
        });

        let order: OrderResponse = self
            .client
            .post(format!("{}/v2/checkout/orders", self.api_url))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .context("failed to reach PayPal orders endpoint")?
            .error_for_status()
            .context("PayPal rejected order creation")?
            .json()
            .await
            .context("failed to decode PayPal order response")?;

        let approval_url = order
            .links
            .into_iter()
            .find(|l| l.rel == "approve")
            .map(|l| l.href);

        tracing::info!(order_id = %order.id, booking_id = %ctx.booking_id, "PayPal order created");

        Ok(PaymentIntent {
            payment_id: order.id,
            approval_url,
        })
    }

    async fn query_status(&self, payment_id: &str) -> anyhow::Result<ProviderStatus> {
        let token = self.access_token().await?;

        let order: OrderResponse = self
            .client
            .get(format!("{}/v2/checkout/orders/{payment_id}", self.api_url))
            .bearer_auth(&token)
            .send()
            .await
            .context("failed to reach PayPal orders endpoint")?
            .error_for_status()
            .context("PayPal order lookup failed")?
            .json()
            .await
            .context("failed to decode PayPal order response")?;

        Ok(normalize_status(&order.status))
    }

    async fn refund(
        &self,
        capture_id: &str,
        amount: Decimal,
        reason: &str,
    ) -> anyhow::Result<RefundReceipt> {
        #[derive(Deserialize)]
        struct RefundResponse {
            id: String,
        }

        let token = self.access_token().await?;

        let body = serde_json::json!({
            "amount": { "currency_code": "GBP", "value": amount.to_string() },
            "note_to_payer": reason,
        });

        let refund: RefundResponse = self
            .client
            .post(format!(
                "{}/v2/payments/captures/{capture_id}/refund",
                self.api_url
            ))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .context("failed to reach PayPal refund endpoint")?
            .error_for_status()
            .context("PayPal rejected the refund")?
            .json()
            .await
            .context("failed to decode PayPal refund response")?;

        tracing::info!(capture_id = %capture_id, refund_id = %refund.id, "PayPal refund issued");

        Ok(RefundReceipt {
            refund_id: refund.id,
        })
    }
}
