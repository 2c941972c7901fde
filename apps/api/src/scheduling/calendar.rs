//! Google Calendar REST client.
//!
//! Credentials are an OAuth client id/secret plus a refresh token; an access
//! token is obtained per operation via the refresh grant. When credentials
//! are not configured, availability degrades to an empty slot list and
//! booking fails with an error the handler surfaces as HTTP 500.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, FixedOffset, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::config::Config;

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

#[derive(Debug, Clone)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

pub struct CalendarClient {
    http: Client,
    credentials: Option<GoogleCredentials>,
    calendar_id: String,
    owner_email: String,
    search_query: String,
    search_days: i64,
    location: String,
    reminder_email_minutes: u32,
    reminder_popup_minutes: u32,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<Event>,
}

#[derive(Debug, Deserialize)]
struct Event {
    start: EventTime,
}

#[derive(Debug, Deserialize)]
struct EventTime {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    #[serde(rename = "htmlLink")]
    html_link: Option<String>,
}

impl CalendarClient {
    pub fn new(config: &Config) -> Self {
        let credentials = match (
            &config.google_client_id,
            &config.google_client_secret,
            &config.google_refresh_token,
        ) {
            (Some(id), Some(secret), Some(refresh)) => Some(GoogleCredentials {
                client_id: id.clone(),
                client_secret: secret.clone(),
                refresh_token: refresh.clone(),
            }),
            _ => None,
        };

        Self {
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            credentials,
            calendar_id: config.google_calendar_id.clone(),
            owner_email: config.owner_email.clone(),
            search_query: config.interview_search_query.clone(),
            search_days: config.calendar_search_days,
            location: config.interview_location.clone(),
            reminder_email_minutes: config.reminder_email_minutes,
            reminder_popup_minutes: config.reminder_popup_minutes,
        }
    }

    async fn access_token(&self) -> Result<String> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or_else(|| anyhow!("Google Calendar credentials are not configured"))?;

        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("client_id", creds.client_id.as_str()),
                ("client_secret", creds.client_secret.as_str()),
                ("refresh_token", creds.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .context("token refresh request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("token refresh failed (status {status}): {body}");
        }

        Ok(response
            .json::<TokenResponse>()
            .await
            .context("malformed token response")?
            .access_token)
    }

    /// Lists start times of upcoming events matching the configured search
    /// query within the search window, in chronological order.
    ///
    /// Missing credentials or a calendar API error degrade to an empty list;
    /// only transport-level failures propagate.
    pub async fn find_available_slots(&self) -> Result<Vec<String>> {
        if self.credentials.is_none() {
            error!("No Google Calendar credentials configured; returning no slots");
            return Ok(Vec::new());
        }

        let token = self.access_token().await?;
        let now = Utc::now();
        let time_max = now + Duration::days(self.search_days);
        let url = format!("{CALENDAR_API_BASE}/calendars/{}/events", self.calendar_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .query(&[
                ("timeMin", now.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("timeMax", time_max.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("q", self.search_query.clone()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await
            .context("calendar list request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Calendar API error (status {status}): {body}");
            return Ok(Vec::new());
        }

        let events: EventList = response
            .json()
            .await
            .context("malformed calendar list response")?;
        let slots = extract_slots(events);

        if slots.is_empty() {
            info!(
                "No '{}' events found in the next {} days",
                self.search_query, self.search_days
            );
        }
        Ok(slots)
    }

    /// Creates the interview event and returns its htmlLink.
    pub async fn create_interview_event(
        &self,
        start_time: &str,
        candidate_email: &str,
        candidate_name: &str,
        duration_hours: f64,
    ) -> Result<String> {
        let start: DateTime<FixedOffset> = DateTime::parse_from_rfc3339(start_time)
            .with_context(|| format!("invalid start time: {start_time}"))?;
        let end = start + Duration::seconds((duration_hours * 3600.0).round() as i64);

        let body = build_event_body(
            candidate_name,
            candidate_email,
            &self.owner_email,
            &self.location,
            &start,
            &end,
            self.reminder_email_minutes,
            self.reminder_popup_minutes,
        );

        let token = self.access_token().await?;
        let url = format!("{CALENDAR_API_BASE}/calendars/{}/events", self.calendar_id);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .context("calendar insert request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("failed to create event (status {status}): {text}");
        }

        let created: CreatedEvent = response
            .json()
            .await
            .context("malformed event insert response")?;
        let link = created.html_link.unwrap_or_default();
        info!("Event created: {link}");
        Ok(link)
    }
}

fn extract_slots(events: EventList) -> Vec<String> {
    events
        .items
        .into_iter()
        .filter_map(|e| e.start.date_time.or(e.start.date))
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn build_event_body(
    candidate_name: &str,
    candidate_email: &str,
    owner_email: &str,
    location: &str,
    start: &DateTime<FixedOffset>,
    end: &DateTime<FixedOffset>,
    reminder_email_minutes: u32,
    reminder_popup_minutes: u32,
) -> Value {
    json!({
        "summary": format!("Interview with {candidate_name}"),
        "location": location,
        "description": format!("Interview with candidate {candidate_name}."),
        "start": {"dateTime": start.to_rfc3339(), "timeZone": "UTC"},
        "end": {"dateTime": end.to_rfc3339(), "timeZone": "UTC"},
        "attendees": [
            {"email": candidate_email},
            {"email": owner_email},
        ],
        "reminders": {
            "useDefault": false,
            "overrides": [
                {"method": "email", "minutes": reminder_email_minutes},
                {"method": "popup", "minutes": reminder_popup_minutes},
            ],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_slots_prefers_datetime_over_date() {
        let raw = r#"{
            "items": [
                {"start": {"dateTime": "2026-09-01T10:00:00Z"}},
                {"start": {"date": "2026-09-02"}},
                {"start": {}}
            ]
        }"#;
        let events: EventList = serde_json::from_str(raw).unwrap();
        assert_eq!(
            extract_slots(events),
            vec!["2026-09-01T10:00:00Z", "2026-09-02"]
        );
    }

    #[test]
    fn test_extract_slots_empty_list() {
        let events: EventList = serde_json::from_str("{}").unwrap();
        assert!(extract_slots(events).is_empty());
    }

    #[test]
    fn test_build_event_body_shape() {
        let start = DateTime::parse_from_rfc3339("2026-09-01T10:00:00+00:00").unwrap();
        let end = start + Duration::minutes(90);
        let body = build_event_body(
            "Ada Lovelace",
            "ada@example.com",
            "owner@example.com",
            "Video Call",
            &start,
            &end,
            1440,
            10,
        );

        assert_eq!(body["summary"], "Interview with Ada Lovelace");
        assert_eq!(body["location"], "Video Call");
        assert_eq!(body["attendees"][0]["email"], "ada@example.com");
        assert_eq!(body["attendees"][1]["email"], "owner@example.com");
        assert_eq!(body["start"]["timeZone"], "UTC");
        assert_eq!(body["end"]["dateTime"], "2026-09-01T11:30:00+00:00");
        assert_eq!(body["reminders"]["useDefault"], false);
        assert_eq!(body["reminders"]["overrides"][0]["minutes"], 1440);
    }

    #[test]
    fn test_duration_to_end_time_rounds_fractional_hours() {
        let start = DateTime::parse_from_rfc3339("2026-09-01T10:00:00+00:00").unwrap();
        let end = start + Duration::seconds((1.5f64 * 3600.0).round() as i64);
        assert_eq!(end.to_rfc3339(), "2026-09-01T11:30:00+00:00");
    }
}
