use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::errors::AppError;
use crate::security::sanitize::sanitize_input;
use crate::security::validate::{duration_in_bounds, parse_duration, validate_email, validate_name};
use crate::security::{MAX_EMAIL_LENGTH, MAX_NAME_LENGTH};
use crate::state::AppState;

const MAX_TIME_LENGTH: usize = 50;

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub slots: Vec<String>,
}

/// GET /scheduling/get-availability
pub async fn handle_get_availability(
    State(state): State<AppState>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let slots = state.calendar.find_available_slots().await.map_err(|e| {
        error!("Error getting availability: {e:?}");
        AppError::Scheduling(e.to_string())
    })?;
    Ok(Json(AvailabilityResponse { slots }))
}

#[derive(Debug, Deserialize)]
pub struct BookRequest {
    pub name: String,
    pub email: String,
    pub time: String,
    pub duration_hours: DurationInput,
}

/// Duration arrives as a number from the booking form, but string values
/// ("1.5", "1,5") are accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DurationInput {
    Hours(f64),
    Text(String),
}

#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub status: &'static str,
    pub event_link: String,
}

/// POST /scheduling/book-interview
pub async fn handle_book_interview(
    State(state): State<AppState>,
    Json(payload): Json<BookRequest>,
) -> Result<Json<BookResponse>, AppError> {
    let name = sanitize_input(payload.name.trim(), Some(MAX_NAME_LENGTH));
    if name.is_empty() {
        return Err(AppError::Validation("Name cannot be empty".to_string()));
    }
    if !validate_name(&name) {
        return Err(AppError::Validation("Invalid name format".to_string()));
    }

    let email = sanitize_input(&payload.email.trim().to_lowercase(), Some(MAX_EMAIL_LENGTH));
    if email.is_empty() {
        return Err(AppError::Validation("Email cannot be empty".to_string()));
    }
    if !validate_email(&email) {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }

    let time = sanitize_input(payload.time.trim(), Some(MAX_TIME_LENGTH));
    if time.is_empty() {
        return Err(AppError::Validation("Time cannot be empty".to_string()));
    }

    let duration_hours = match payload.duration_hours {
        DurationInput::Hours(h) if duration_in_bounds(h) => h,
        DurationInput::Text(ref s) => parse_duration(s).ok_or_else(invalid_duration)?,
        _ => return Err(invalid_duration()),
    };

    info!(email = %email, "Interview booking attempt");

    let event_link = state
        .calendar
        .create_interview_event(&time, &email, &name, duration_hours)
        .await
        .map_err(|e| {
            error!("Error booking interview: {e:?}");
            AppError::Scheduling(e.to_string())
        })?;

    Ok(Json(BookResponse {
        status: "success",
        event_link,
    }))
}

fn invalid_duration() -> AppError {
    AppError::Validation("Invalid duration: must be between 0.25 and 8 hours".to_string())
}
