//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use meridian_infra::{AutosaveConfig, DataApiConfig, FixedWindowConfig, MailerConfig};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Hosted data service; `None` runs the in-memory repositories.
    pub data_api: Option<DataApiConfig>,
    /// Email relay; `None` captures mail in memory instead of sending.
    pub mailer: Option<MailerConfig>,
    /// Inbox that receives enquiry notifications.
    pub enquiry_inbox: String,
    pub rate_limit: FixedWindowConfig,
    pub autosave: AutosaveConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let autosave = AutosaveConfig {
            debounce: Duration::from_millis(
                env::var("AUTOSAVE_DEBOUNCE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
            ..AutosaveConfig::default()
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            data_api: DataApiConfig::from_env(),
            mailer: MailerConfig::from_env(),
            enquiry_inbox: env::var("ENQUIRY_INBOX")
                .unwrap_or_else(|_| "team@meridianadmissions.co.uk".to_string()),
            rate_limit: FixedWindowConfig::from_env(),
            autosave,
        }
    }
}
