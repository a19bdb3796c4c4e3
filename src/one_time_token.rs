// ============================================================================
// One-Time Token Store
// ============================================================================
//
// Double-submit defense for mutating requests. Rendering the listing mints a
// token for the viewing user; the next create/delete from that user must echo
// it back. One active token per user: issuing overwrites, a successful
// mutation consumes.
//
// Handlers go through `claim`, which validates and takes the token under one
// lock so two concurrent submissions cannot both use it. The returned claim
// is restored explicitly when the mutation is refused or fails.
//
// ============================================================================

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use rand::{rngs::OsRng, RngCore};
use subtle::ConstantTimeEq;

use crate::config::OneTimeTokenConfig;

/// Entropy per token in bytes
pub const TOKEN_BYTES: usize = 16;

#[derive(Debug, Clone)]
struct TokenEntry {
    token: String,
    issued_at: Instant,
}

#[derive(Debug, Default)]
pub struct OneTimeTokenStore {
    entries: Mutex<HashMap<String, TokenEntry>>,
    /// `None` keeps tokens until consumed or overwritten
    ttl: Option<Duration>,
}

impl OneTimeTokenStore {
    pub fn new(config: &OneTimeTokenConfig) -> Self {
        Self::with_ttl((config.ttl_secs > 0).then(|| Duration::from_secs(config.ttl_secs)))
    }

    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TokenEntry>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_live(&self, entry: &TokenEntry) -> bool {
        self.ttl
            .map_or(true, |ttl| entry.issued_at.elapsed() < ttl)
    }

    /// Mint a fresh token for `user_name`, replacing any previous one
    pub fn issue(&self, user_name: &str) -> String {
        let token = generate_token();
        self.lock().insert(
            user_name.to_string(),
            TokenEntry {
                token: token.clone(),
                issued_at: Instant::now(),
            },
        );
        token
    }

    /// True iff the stored token for `user_name` equals `submitted` exactly
    pub fn validate(&self, user_name: &str, submitted: &str) -> bool {
        self.lock()
            .get(user_name)
            .is_some_and(|entry| self.is_live(entry) && tokens_match(&entry.token, submitted))
    }

    /// Remove the token for `user_name`
    pub fn consume(&self, user_name: &str) {
        self.lock().remove(user_name);
    }

    /// Validate and take the token in one step.
    ///
    /// On mismatch nothing changes and `None` is returned. On match the token
    /// is removed; call [`TokenClaim::restore`] if the mutation does not go
    /// through.
    pub fn claim(&self, user_name: &str, submitted: &str) -> Option<TokenClaim<'_>> {
        let mut entries = self.lock();

        let matches = entries
            .get(user_name)
            .is_some_and(|entry| self.is_live(entry) && tokens_match(&entry.token, submitted));
        if !matches {
            return None;
        }

        let entry = entries.remove(user_name)?;
        Some(TokenClaim {
            store: self,
            user_name: user_name.to_string(),
            entry: Some(entry),
        })
    }

    /// Drop expired tokens. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }

        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| self.is_live(entry));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// A token taken out of the store on behalf of one mutating request.
///
/// Dropping the claim leaves the token consumed, including when the request
/// future is cancelled mid-mutation. Refused or failed mutations call
/// [`TokenClaim::restore`].
#[derive(Debug)]
pub struct TokenClaim<'a> {
    store: &'a OneTimeTokenStore,
    user_name: String,
    entry: Option<TokenEntry>,
}

impl TokenClaim<'_> {
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// The mutation succeeded: the token stays consumed
    pub fn commit(mut self) {
        self.entry = None;
    }

    /// Put the token back so the user can retry with the same page.
    ///
    /// A newer token issued meanwhile by another page render wins.
    pub fn restore(&mut self) {
        let Some(entry) = self.entry.take() else {
            return;
        };

        self.store
            .lock()
            .entry(self.user_name.clone())
            .or_insert(entry);
    }

    /// Restore the token when `result` is an error, then pass it through
    pub fn restore_on_err<T, E>(&mut self, result: Result<T, E>) -> Result<T, E> {
        if result.is_err() {
            self.restore();
        }
        result
    }
}

fn tokens_match(stored: &str, submitted: &str) -> bool {
    bool::from(stored.as_bytes().ct_eq(submitted.as_bytes()))
}

/// Random hex token from the OS CSPRNG
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> OneTimeTokenStore {
        OneTimeTokenStore::with_ttl(None)
    }

    #[test]
    fn test_issue_and_validate() {
        let store = store();
        let token = store.issue("guest1");

        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(store.validate("guest1", &token));
        assert!(!store.validate("guest2", &token));
    }

    #[test]
    fn test_validate_is_exact() {
        let store = store();
        let token = store.issue("guest1");

        assert!(!store.validate("guest1", &token.to_uppercase()));
        assert!(!store.validate("guest1", &format!(" {}", token)));
        assert!(!store.validate("guest1", ""));
        assert!(!store.validate("nobody", ""));
    }

    #[test]
    fn test_issue_overwrites_previous_token() {
        let store = store();
        let first = store.issue("guest1");
        let second = store.issue("guest1");

        assert_ne!(first, second);
        assert!(!store.validate("guest1", &first));
        assert!(store.validate("guest1", &second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_consume_prevents_replay() {
        let store = store();
        let token = store.issue("guest1");

        store.consume("guest1");
        assert!(!store.validate("guest1", &token));
        assert!(store.claim("guest1", &token).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_claim_commit_consumes() {
        let store = store();
        let token = store.issue("guest1");

        let claim = store.claim("guest1", &token).expect("token should match");
        assert_eq!(claim.user_name(), "guest1");
        // Taken while the claim is outstanding
        assert!(store.claim("guest1", &token).is_none());
        claim.commit();

        assert!(!store.validate("guest1", &token));
    }

    #[test]
    fn test_claim_mismatch_leaves_token_intact() {
        let store = store();
        let token = store.issue("guest1");

        assert!(store.claim("guest1", "wrong").is_none());
        assert!(store.validate("guest1", &token));
    }

    #[test]
    fn test_dropped_claim_stays_consumed() {
        let store = store();
        let token = store.issue("guest1");

        // e.g. the request was cancelled while storage was writing
        drop(store.claim("guest1", &token).unwrap());
        assert!(!store.validate("guest1", &token));
    }

    #[test]
    fn test_restore_puts_token_back() {
        let store = store();
        let token = store.issue("guest1");

        let mut claim = store.claim("guest1", &token).unwrap();
        claim.restore();
        drop(claim);
        assert!(store.validate("guest1", &token));
    }

    #[test]
    fn test_restore_on_err() {
        let store = store();
        let token = store.issue("guest1");

        let mut claim = store.claim("guest1", &token).unwrap();
        assert_eq!(claim.restore_on_err(Ok::<_, ()>(1)), Ok(1));
        claim.commit();
        assert!(!store.validate("guest1", &token));

        let token = store.issue("guest1");
        let mut claim = store.claim("guest1", &token).unwrap();
        assert_eq!(claim.restore_on_err(Err::<(), _>("boom")), Err("boom"));
        drop(claim);
        assert!(store.validate("guest1", &token));
    }

    #[test]
    fn test_restore_does_not_clobber_newer_token() {
        let store = store();
        let old = store.issue("guest1");

        let mut claim = store.claim("guest1", &old).unwrap();
        let newer = store.issue("guest1");
        claim.restore();

        assert!(store.validate("guest1", &newer));
        assert!(!store.validate("guest1", &old));
    }

    #[test]
    fn test_expired_tokens_rejected_and_purged() {
        let store = OneTimeTokenStore::with_ttl(Some(Duration::from_millis(10)));
        let token = store.issue("guest1");

        std::thread::sleep(Duration::from_millis(30));

        assert!(!store.validate("guest1", &token));
        assert!(store.claim("guest1", &token).is_none());
        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_purge_without_ttl_is_noop() {
        let store = store();
        store.issue("guest1");
        store.issue("guest2");

        assert_eq!(store.purge_expired(), 0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_config_zero_ttl_disables_expiry() {
        let store = OneTimeTokenStore::new(&OneTimeTokenConfig {
            ttl_secs: 0,
            purge_interval_secs: 300,
        });
        assert!(store.ttl.is_none());
    }
}
