// ============================================================================
// Logging Configuration
// ============================================================================

use super::security::random_secret;

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Log raw user names instead of salted hashes
    pub enable_user_identifiers: bool,
    pub hash_salt: String,
}

impl LoggingConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            enable_user_identifiers: std::env::var("LOG_USER_IDENTIFIERS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            hash_salt: std::env::var("LOG_HASH_SALT")
                .ok()
                .filter(|salt| !salt.is_empty())
                .unwrap_or_else(|| random_secret(16)),
        }
    }

    /// Identifier to put in log lines for a user name.
    pub fn user_label(&self, user: &str) -> String {
        if self.enable_user_identifiers {
            user.to_string()
        } else {
            crate::utils::log_safe_id(user, &self.hash_salt)
        }
    }
}
