use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub owner_email: String,
    pub resume_path: String,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_refresh_token: Option<String>,
    pub google_calendar_id: String,
    pub calendar_search_days: i64,
    pub interview_search_query: String,
    pub interview_location: String,
    pub reminder_email_minutes: u32,
    pub reminder_popup_minutes: u32,
    pub session_timeout_secs: i64,
    /// How many prior session messages are replayed into each prompt.
    pub history_window: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            owner_email: require_env("OWNER_EMAIL")?,
            resume_path: env_or("RESUME_PATH", "resume.txt"),
            google_client_id: std::env::var("GOOGLE_CLIENT_ID").ok(),
            google_client_secret: std::env::var("GOOGLE_CLIENT_SECRET").ok(),
            google_refresh_token: std::env::var("GOOGLE_REFRESH_TOKEN").ok(),
            google_calendar_id: env_or("GOOGLE_CALENDAR_ID", "primary"),
            calendar_search_days: parse_env("CALENDAR_SEARCH_DAYS", 7)?,
            interview_search_query: env_or("INTERVIEW_SEARCH_QUERY", "interview block"),
            interview_location: env_or("INTERVIEW_LOCATION", "Video Call"),
            reminder_email_minutes: parse_env("INTERVIEW_REMINDER_EMAIL_MINUTES", 24 * 60)?,
            reminder_popup_minutes: parse_env("INTERVIEW_REMINDER_POPUP_MINUTES", 10)?,
            session_timeout_secs: parse_env("SESSION_TIMEOUT_SECS", 3600)?,
            history_window: parse_env("HISTORY_WINDOW", 6)?,
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Config for unit tests: no credentials, defaults everywhere.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            openai_api_key: "test-key".to_string(),
            owner_email: "owner@example.com".to_string(),
            resume_path: "resume.txt".to_string(),
            google_client_id: None,
            google_client_secret: None,
            google_refresh_token: None,
            google_calendar_id: "primary".to_string(),
            calendar_search_days: 7,
            interview_search_query: "interview block".to_string(),
            interview_location: "Video Call".to_string(),
            reminder_email_minutes: 1440,
            reminder_popup_minutes: 10,
            session_timeout_secs: 3600,
            history_window: 6,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("'{key}' must be a valid value")),
        Err(_) => Ok(default),
    }
}
