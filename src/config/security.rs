// ============================================================================
// Security Configuration
// ============================================================================
//
// - TrackingConfig: keyed-hash secret and cookie attributes for tracking ids
// - OneTimeTokenConfig: lifetime of per-user one-time tokens
// - AuthConfig: how the requesting user's identity is established
//
// ============================================================================

use std::collections::HashMap;
use std::str::FromStr;

use rand::Rng;

use super::constants::*;

/// Tracking cookie configuration
#[derive(Clone, Debug)]
pub struct TrackingConfig {
    /// Secret appended to every keyed hash. Never compiled into the binary.
    pub secret: String,
    /// Cookie name (default: "tracking_id")
    pub cookie_name: String,
    /// Cookie lifetime in seconds (default: 86400 = 24 hours)
    pub cookie_ttl_secs: i64,
}

impl TrackingConfig {
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        let secret = match std::env::var("TRACKING_SECRET") {
            Ok(s) if s.len() >= MIN_SECRET_LENGTH => s,
            Ok(s) => {
                anyhow::bail!(
                    "TRACKING_SECRET must be at least {} characters long (got {}). \
                    Generate with: openssl rand -hex 32",
                    MIN_SECRET_LENGTH,
                    s.len()
                );
            }
            Err(_) if is_production() => {
                anyhow::bail!(
                    "TRACKING_SECRET is REQUIRED in production. \
                    Generate with: openssl rand -hex 32"
                );
            }
            Err(_) => {
                tracing::warn!(
                    "TRACKING_SECRET not set - using random secret. \
                    Tracking cookies will be reissued after every restart. \
                    Set TRACKING_SECRET in production!"
                );
                random_secret(64)
            }
        };

        Ok(Self {
            secret,
            cookie_name: std::env::var("TRACKING_COOKIE_NAME")
                .unwrap_or_else(|_| DEFAULT_TRACKING_COOKIE_NAME.to_string()),
            cookie_ttl_secs: std::env::var("TRACKING_COOKIE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|ttl: &i64| *ttl > 0)
                .unwrap_or(DEFAULT_TRACKING_COOKIE_TTL_SECS),
        })
    }
}

/// One-time token configuration
#[derive(Clone, Debug)]
pub struct OneTimeTokenConfig {
    /// Token lifetime in seconds. 0 keeps tokens until consumed or overwritten.
    pub ttl_secs: u64,
    /// How often expired tokens are swept from the store
    pub purge_interval_secs: u64,
}

impl OneTimeTokenConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            ttl_secs: std::env::var("ONE_TIME_TOKEN_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_ONE_TIME_TOKEN_TTL_SECS),
            purge_interval_secs: std::env::var("ONE_TIME_TOKEN_PURGE_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs: &u64| *secs > 0)
                .unwrap_or(DEFAULT_ONE_TIME_TOKEN_PURGE_INTERVAL_SECS),
        }
    }
}

/// How the requesting user is identified
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthMode {
    /// HTTP Basic authentication against `AuthConfig::users`
    Basic,
    /// Identity header set by an authenticating reverse proxy
    TrustedHeader,
}

impl FromStr for AuthMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "trusted_header" | "header" => Ok(Self::TrustedHeader),
            _ => anyhow::bail!(
                "Invalid AUTH_MODE: {}. Must be 'basic' or 'trusted_header'",
                s
            ),
        }
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub mode: AuthMode,
    /// Distinguished identity allowed to delete any post
    pub admin_user: String,
    /// user name -> password, for `AuthMode::Basic`
    pub users: HashMap<String, String>,
    pub realm: String,
    /// Header name for `AuthMode::TrustedHeader`
    pub trusted_header: String,
}

impl AuthConfig {
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        let mode: AuthMode = std::env::var("AUTH_MODE")
            .unwrap_or_else(|_| "basic".to_string())
            .parse()?;

        let users = std::env::var("BASIC_AUTH_USERS")
            .map(|s| parse_users(&s))
            .unwrap_or_default();

        if mode == AuthMode::Basic && users.is_empty() {
            tracing::warn!("AUTH_MODE=basic but BASIC_AUTH_USERS is empty - every request will be rejected");
        }

        Ok(Self {
            mode,
            admin_user: std::env::var("ADMIN_USER")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_ADMIN_USER.to_string()),
            users,
            realm: std::env::var("BASIC_AUTH_REALM")
                .unwrap_or_else(|_| DEFAULT_BASIC_AUTH_REALM.to_string()),
            trusted_header: std::env::var("TRUSTED_USER_HEADER")
                .map(|h| h.to_lowercase())
                .unwrap_or_else(|_| DEFAULT_TRUSTED_USER_HEADER.to_string()),
        })
    }
}

/// Parse "user:password,user2:password2". Entries without a colon are skipped.
pub(crate) fn parse_users(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|entry| {
            let (user, password) = entry.trim().split_once(':')?;
            let user = user.trim();
            if user.is_empty() {
                return None;
            }
            Some((user.to_string(), password.to_string()))
        })
        .collect()
}

// Production indicators: PRODUCTION=true, or ENVIRONMENT set to anything
// other than development/dev/local.
fn is_production() -> bool {
    std::env::var("PRODUCTION")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or_else(|_| {
            std::env::var("ENVIRONMENT")
                .map(|v| {
                    let env_lower = v.to_lowercase();
                    env_lower != "development" && env_lower != "dev" && env_lower != "local"
                })
                .unwrap_or(false)
        })
}

pub(crate) fn random_secret(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| rng.sample(rand::distributions::Alphanumeric) as char)
        .collect()
}
