// ============================================================================
// Configuration Constants
// ============================================================================

// Listener
pub(crate) const DEFAULT_PORT: u16 = 8000;
pub(crate) const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

// Tracking cookie
pub(crate) const DEFAULT_TRACKING_COOKIE_NAME: &str = "tracking_id";
pub(crate) const DEFAULT_TRACKING_COOKIE_TTL_SECS: i64 = SECONDS_PER_DAY;

// One-time tokens (0 disables expiry)
pub(crate) const DEFAULT_ONE_TIME_TOKEN_TTL_SECS: u64 = SECONDS_PER_DAY as u64;
pub(crate) const DEFAULT_ONE_TIME_TOKEN_PURGE_INTERVAL_SECS: u64 = 300;

// Authentication
pub(crate) const DEFAULT_ADMIN_USER: &str = "admin";
pub(crate) const DEFAULT_BASIC_AUTH_REALM: &str = "Enter username and password.";
pub(crate) const DEFAULT_TRUSTED_USER_HEADER: &str = "x-remote-user";

// Display: Asia/Tokyo, which has no daylight saving time
pub(crate) const DEFAULT_DISPLAY_UTC_OFFSET_SECS: i32 = 9 * SECONDS_PER_HOUR as i32;

// Secrets
pub const MIN_SECRET_LENGTH: usize = 32;

// Time conversion constants
pub(crate) const SECONDS_PER_HOUR: i64 = 3600;
pub(crate) const SECONDS_PER_DAY: i64 = 86400;

// Request bodies are small form posts
pub const MAX_REQUEST_BODY_SIZE: usize = 64 * 1024;
