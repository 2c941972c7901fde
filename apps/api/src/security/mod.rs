//! Security — input sanitization, prompt-injection detection, and booking
//! input validation.
//!
//! Everything in this module is pure and deterministic: no model calls, no
//! I/O beyond log lines. The detector runs before any LLM request is built,
//! so a rejected input never reaches the network.

pub mod injection;
pub mod sanitize;
pub mod validate;

pub use injection::{detect_prompt_injection, SecurityVerdict};
pub use sanitize::sanitize_input;

/// Maximum question length after trimming, in characters.
pub const MAX_QUESTION_LENGTH: usize = 500;
/// Maximum candidate name length for booking requests.
pub const MAX_NAME_LENGTH: usize = 100;
/// Maximum email length (RFC 5321 limit).
pub const MAX_EMAIL_LENGTH: usize = 254;
/// Interview duration bounds in hours.
pub const MIN_DURATION_HOURS: f64 = 0.25;
pub const MAX_DURATION_HOURS: f64 = 8.0;
