use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage table name (default: "newsletter")
    /// Note: Only used when the `dynamodb` feature is enabled.
    #[allow(dead_code)]
    pub table_name: String,
    /// Outbound email queue URL (default: "")
    /// Note: Only used when the `sqs` feature is enabled.
    #[allow(dead_code)]
    pub email_queue_url: String,
    /// reCAPTCHA secret for challenge verification (default: "").
    /// When empty, verification is disabled and every token passes.
    pub recaptcha_secret: String,
    /// Website domain used in outbound email links (default: "example.com")
    pub website_domain: String,
    /// API domain used in outbound email links (default: "api.example.com")
    pub api_domain: String,
    /// Sender address for outbound email (default: "noreply@example.com")
    pub from_address: String,
    /// Recipient address for admin notices (default: "admin@example.com")
    pub admin_address: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TABLE_NAME` - Storage table name (default: "newsletter")
    /// - `EMAIL_QUEUE_URL` - Outbound email queue URL (default: "")
    /// - `RECAPTCHA_SECRET` - reCAPTCHA secret (default: "")
    /// - `WEBSITE_DOMAIN` - Website domain for email links (default: "example.com")
    /// - `API_DOMAIN` - API domain for email links (default: "api.example.com")
    /// - `FROM_ADDRESS` - Sender address (default: "noreply@example.com")
    /// - `ADMIN_ADDRESS` - Admin notice recipient (default: "admin@example.com")
    pub fn from_env() -> Self {
        Self {
            table_name: env::var("TABLE_NAME").unwrap_or_else(|_| "newsletter".to_string()),
            email_queue_url: env::var("EMAIL_QUEUE_URL").unwrap_or_default(),
            recaptcha_secret: env::var("RECAPTCHA_SECRET").unwrap_or_default(),
            website_domain: env::var("WEBSITE_DOMAIN")
                .unwrap_or_else(|_| "example.com".to_string()),
            api_domain: env::var("API_DOMAIN").unwrap_or_else(|_| "api.example.com".to_string()),
            from_address: env::var("FROM_ADDRESS")
                .unwrap_or_else(|_| "noreply@example.com".to_string()),
            admin_address: env::var("ADMIN_ADDRESS")
                .unwrap_or_else(|_| "admin@example.com".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
