use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::models::PaymentMethod;
use crate::services::notify::Notifier;
use crate::services::payments::PaymentGateway;

/// Shared application state. Gateways and the notifier are constructed once
/// at startup and injected; nothing reads provider credentials after boot.
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub paypal: Box<dyn PaymentGateway>,
    pub mollie: Box<dyn PaymentGateway>,
    pub cash: Box<dyn PaymentGateway>,
    pub notifier: Box<dyn Notifier>,
}

impl AppState {
    /// The gateway a booking's payment method routes through.
    pub fn gateway(&self, method: PaymentMethod) -> &dyn PaymentGateway {
        match method {
            PaymentMethod::PayPal => self.paypal.as_ref(),
            PaymentMethod::Mollie => self.mollie.as_ref(),
            PaymentMethod::Cash => self.cash.as_ref(),
        }
    }
}
