pub const STYLIST_BASE_URL: &str = "STYLIST_BASE_URL";
pub const STYLIST_USER_ID: &str = "STYLIST_USER_ID";
pub const STYLIST_TURN_PATH: &str = "STYLIST_TURN_PATH";
pub const STYLIST_ANALYZE_PATH: &str = "STYLIST_ANALYZE_PATH";
pub const STYLIST_PROFILE_PATH: &str = "STYLIST_PROFILE_PATH";

pub const BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_USER_ID: &str = "demo-user";
pub const TURN_PATH: &str = "/turn";
pub const ANALYZE_PATH: &str = "/analyze-equivalent";
pub const PROFILE_PATH: &str = "/profile";

pub const EVENT_STREAM: &str = "text/event-stream";

/// Shown when a result carries no usable stylist text.
pub const FALLBACK_REPLY: &str = "Here's what I pulled together for you.";
/// Shown for any failed turn. The underlying error is only logged.
pub const APOLOGY_REPLY: &str = "Sorry, I ran into a problem putting that together. Please try again.";
