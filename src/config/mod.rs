// ============================================================================
// Configuration Module
// ============================================================================
//
// - constants.rs: Configuration defaults
// - database.rs: Post storage configuration
// - security.rs: Tracking cookie, one-time token and authentication settings
// - logging.rs: Logging configuration
//
// Everything is read from the environment (and an optional .env file).
//
// ============================================================================

mod constants;
mod database;
mod logging;
mod security;

pub use constants::{MAX_REQUEST_BODY_SIZE, MIN_SECRET_LENGTH};
pub use database::DbConfig;
pub use logging::LoggingConfig;
pub use security::{AuthConfig, AuthMode, OneTimeTokenConfig, TrackingConfig};

use anyhow::Result;
use chrono::{FixedOffset, Offset, Utc};
use constants::*;

/// Main configuration structure
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub bind_address: String,
    pub rust_log: String,
    /// Offset used when formatting post timestamps for display
    pub display_utc_offset_secs: i32,
    pub db: DbConfig,
    pub tracking: TrackingConfig,
    pub one_time_token: OneTimeTokenConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let display_utc_offset_secs = std::env::var("DISPLAY_UTC_OFFSET_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DISPLAY_UTC_OFFSET_SECS);
        if FixedOffset::east_opt(display_utc_offset_secs).is_none() {
            anyhow::bail!(
                "DISPLAY_UTC_OFFSET_SECS out of range: {}",
                display_utc_offset_secs
            );
        }

        Ok(Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string()),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            display_utc_offset_secs,
            db: DbConfig::from_env(),
            tracking: TrackingConfig::from_env()?,
            one_time_token: OneTimeTokenConfig::from_env(),
            auth: AuthConfig::from_env()?,
            logging: LoggingConfig::from_env(),
        })
    }

    /// Time zone for rendered timestamps
    pub fn display_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.display_utc_offset_secs)
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
