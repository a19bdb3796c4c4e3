// ============================================================================
// Tracking Cookie Manager
// ============================================================================
//
// Every visitor carries a tracking id used to correlate log lines and posts:
//
//   tracking_id = <original_id>_<hash>
//   hash        = hex(HMAC-SHA256(secret, original_id || '_' || user_name))
//
// original_id is a random u64 in decimal form. A cookie whose hash does not
// match the requesting user is treated like a missing cookie and replaced.
// Ids are never stored server-side apart from the copy kept on each post.
//
// ============================================================================

use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tower_cookies::{
    cookie::{
        time::{Duration, OffsetDateTime},
        SameSite,
    },
    Cookie, Cookies,
};

use crate::config::TrackingConfig;

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: char = '_';

/// Result of checking the cookie presented with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingDecision {
    /// The presented id is valid for this user and is kept as is
    Existing(String),
    /// A fresh id was minted and must be written to the cookie
    Issued(String),
}

impl TrackingDecision {
    pub fn tracking_id(&self) -> &str {
        match self {
            TrackingDecision::Existing(id) | TrackingDecision::Issued(id) => id,
        }
    }

    pub fn into_tracking_id(self) -> String {
        match self {
            TrackingDecision::Existing(id) | TrackingDecision::Issued(id) => id,
        }
    }
}

#[derive(Clone)]
pub struct TrackingCookieManager {
    secret: String,
    cookie_name: String,
    cookie_ttl_secs: i64,
}

impl TrackingCookieManager {
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            cookie_name: config.cookie_name.clone(),
            cookie_ttl_secs: config.cookie_ttl_secs,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Keyed hash of `original_id` bound to `user_name`, hex encoded
    pub fn keyed_hash(&self, original_id: &str, user_name: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(original_id.as_bytes());
        // The decimal id never contains the separator, so this fixes the boundary
        mac.update(&[SEPARATOR as u8]);
        mac.update(user_name.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Build the tracking id for a given original id and user
    pub fn issue(&self, original_id: u64, user_name: &str) -> String {
        let original_id = original_id.to_string();
        let hash = self.keyed_hash(&original_id, user_name);
        format!("{}{}{}", original_id, SEPARATOR, hash)
    }

    /// Check that the embedded hash matches the keyed hash of the embedded id.
    ///
    /// Absent or malformed values are simply invalid.
    pub fn is_valid(&self, tracking_id: Option<&str>, user_name: &str) -> bool {
        let Some((original_id, requested_hash)) =
            tracking_id.and_then(|id| id.split_once(SEPARATOR))
        else {
            return false;
        };

        if original_id.is_empty() || !original_id.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }

        let expected = self.keyed_hash(original_id, user_name);
        bool::from(requested_hash.as_bytes().ct_eq(expected.as_bytes()))
    }

    /// Keep a valid presented id, otherwise mint a new one
    pub fn resolve(&self, existing: Option<&str>, user_name: &str) -> TrackingDecision {
        match existing {
            Some(id) if self.is_valid(Some(id), user_name) => {
                TrackingDecision::Existing(id.to_string())
            }
            _ => TrackingDecision::Issued(self.issue(generate_original_id(), user_name)),
        }
    }

    /// Return the request's tracking id, writing a new cookie only when the
    /// presented one is missing or invalid.
    pub fn ensure_tracking_id(&self, cookies: &Cookies, user_name: &str) -> String {
        let existing = cookies.get(&self.cookie_name);
        let decision = self.resolve(existing.as_ref().map(|c| c.value()), user_name);

        if let TrackingDecision::Issued(ref tracking_id) = decision {
            tracing::debug!("Issuing new tracking cookie");
            cookies.add(self.build_cookie(tracking_id.clone()));
        }

        decision.into_tracking_id()
    }

    fn build_cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .expires(OffsetDateTime::now_utc() + Duration::seconds(self.cookie_ttl_secs))
            .build()
    }
}

/// Random original id drawn from the OS CSPRNG
pub fn generate_original_id() -> u64 {
    OsRng.next_u64()
}
