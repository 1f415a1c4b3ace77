use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::service::{Bedrooms, CleaningArea, HomeStyle, RepairItem, ServiceKind};
use super::slot::TimeLabel;

/// A customer's reservation of one time slot, carrying payment and refund
/// sub-state. The booking store is the sole owner of this record; the slot
/// table holds only a weak `booked_by` back-reference to the id.
#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: String,
    pub customer_name: String,
    pub email: String,
    pub contact_number: String,
    pub first_line_of_address: String,
    pub town: String,
    pub postcode: String,
    pub selected_date: NaiveDate,
    pub selected_time_slot: TimeLabel,
    pub service: ServiceKind,
    pub cleaning_options: Vec<CleaningArea>,
    pub repair_options: Vec<RepairItem>,
    pub home_style: HomeStyle,
    pub bedrooms: Option<Bedrooms>,
    pub stories: Option<String>,
    pub message: Option<String>,
    pub total_price: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub refund_status: RefundStatus,
    pub paypal_order_id: Option<String>,
    pub mollie_payment_id: Option<String>,
    pub capture_id: Option<String>,
    pub refund_id: Option<String>,
    pub refund_amount: Option<Decimal>,
    pub refund_reason: Option<String>,
    pub refund_date: Option<NaiveDateTime>,
    pub is_locked: bool,
    pub lock_expires_at: Option<NaiveDateTime>,
    pub is_booked: bool,
    pub booked_by: BookedBy,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    /// The correlation id the owning payment provider knows this booking by.
    pub fn provider_payment_id(&self) -> Option<&str> {
        match self.payment_method {
            PaymentMethod::PayPal => self.paypal_order_id.as_deref(),
            PaymentMethod::Mollie => self.mollie_payment_id.as_deref(),
            PaymentMethod::Cash => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    PayPal,
    Mollie,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::PayPal => "PayPal",
            PaymentMethod::Mollie => "Mollie",
            PaymentMethod::Cash => "Cash",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PayPal" => Some(PaymentMethod::PayPal),
            "Mollie" => Some(PaymentMethod::Mollie),
            "Cash" => Some(PaymentMethod::Cash),
            _ => None,
        }
    }
}

/// Payment providers a booking can be correlated against. `Cash` has no
/// provider, so it is absent here on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    PayPal,
    Mollie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => PaymentStatus::Completed,
            "failed" => PaymentStatus::Failed,
            "cancelled" => PaymentStatus::Cancelled,
            _ => PaymentStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    Pending,
    Completed,
    Failed,
    Reversed,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Pending => "pending",
            RefundStatus::Completed => "completed",
            RefundStatus::Failed => "failed",
            RefundStatus::Reversed => "reversed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => RefundStatus::Completed,
            "failed" => RefundStatus::Failed,
            "reversed" => RefundStatus::Reversed,
            _ => RefundStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookedBy {
    Admin,
    Customer,
}

impl BookedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookedBy::Admin => "admin",
            BookedBy::Customer => "customer",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => BookedBy::Admin,
            _ => BookedBy::Customer,
        }
    }
}

/// Inbound booking submission. Fields arrive as plain strings and are
/// validated into typed values by the lifecycle engine so every rejection
/// carries a customer-facing message rather than a deserializer error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub first_line_of_address: String,
    #[serde(default)]
    pub town: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub selected_date: String,
    #[serde(default)]
    pub selected_time_slot: String,
    #[serde(default)]
    pub select_service: String,
    #[serde(default)]
    pub gutter_cleaning_options: Vec<String>,
    #[serde(default)]
    pub gutter_repairs_options: Vec<String>,
    #[serde(default)]
    pub select_home_style: String,
    pub number_of_bedrooms: Option<String>,
    pub number_of_stories: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub terms_conditions: bool,
}
