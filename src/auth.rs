// ============================================================================
// Request Authentication
// ============================================================================
//
// The board itself has no accounts; it trusts whatever identity the
// authentication layer in front of it established:
// - Basic: HTTP Basic credentials checked against a configured user list
// - TrustedHeader: a header written by an authenticating reverse proxy
//
// ============================================================================

use std::collections::HashMap;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use subtle::ConstantTimeEq;

use crate::config::{AuthConfig, AuthMode};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AuthManager {
    mode: AuthMode,
    users: HashMap<String, String>,
    challenge: String,
    trusted_header: String,
}

impl AuthManager {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            mode: config.mode.clone(),
            users: config.users.clone(),
            challenge: format!("Basic realm=\"{}\"", config.realm.replace('"', "")),
            trusted_header: config.trusted_header.clone(),
        }
    }

    /// `WWW-Authenticate` value sent with 401 responses
    pub fn challenge(&self) -> Option<String> {
        match self.mode {
            AuthMode::Basic => Some(self.challenge.clone()),
            AuthMode::TrustedHeader => None,
        }
    }

    /// Resolve the requesting user's name from request headers
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<String, AppError> {
        match self.mode {
            AuthMode::Basic => self.authenticate_basic(headers),
            AuthMode::TrustedHeader => self.authenticate_trusted(headers),
        }
    }

    fn authenticate_basic(&self, headers: &HeaderMap) -> Result<String, AppError> {
        let (user, password) = parse_basic_credentials(headers).ok_or_else(|| {
            AppError::unauthenticated("Missing or malformed Basic credentials", self.challenge())
        })?;

        let valid = self.users.get(&user).is_some_and(|expected| {
            bool::from(expected.as_bytes().ct_eq(password.as_bytes()))
        });

        if !valid {
            return Err(AppError::unauthenticated(
                "Invalid user name or password",
                self.challenge(),
            ));
        }

        Ok(user)
    }

    fn authenticate_trusted(&self, headers: &HeaderMap) -> Result<String, AppError> {
        headers
            .get(self.trusted_header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|user| !user.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                tracing::error!(
                    header = %self.trusted_header,
                    "Missing user header. Is this request coming through the auth proxy?"
                );
                AppError::unauthenticated("Missing trusted user header", None)
            })
    }
}

/// Decode `Authorization: Basic base64(user:password)`
pub fn parse_basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    if user.is_empty() {
        return None;
    }

    Some((user.to_string(), password.to_string()))
}
