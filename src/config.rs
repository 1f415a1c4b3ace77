use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    /// Public base URL of this service, used for provider webhook callbacks.
    pub base_url: String,
    /// Front-end origin for post-payment redirect targets.
    pub frontend_url: String,
    pub paypal_api_url: String,
    pub paypal_client_id: String,
    pub paypal_client_secret: String,
    pub mollie_api_url: String,
    pub mollie_api_key: String,
    /// Mail relay endpoint the notifier posts to; empty disables sending.
    pub notify_url: String,
    pub admin_email: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "gutterbook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            base_url: env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            paypal_api_url: env::var("PAYPAL_API_URL")
                .unwrap_or_else(|_| "https://api-m.paypal.com".to_string()),
            paypal_client_id: env::var("PAYPAL_CLIENT_ID").unwrap_or_default(),
            paypal_client_secret: env::var("PAYPAL_CLIENT_SECRET").unwrap_or_default(),
            mollie_api_url: env::var("MOLLIE_API_URL")
                .unwrap_or_else(|_| "https://api.mollie.com/v2".to_string()),
            mollie_api_key: env::var("MOLLIE_API_KEY").unwrap_or_default(),
            notify_url: env::var("NOTIFY_URL").unwrap_or_default(),
            admin_email: env::var("ADMIN_EMAIL").unwrap_or_default(),
        }
    }
}
