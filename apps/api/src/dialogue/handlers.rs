use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName},
    response::{IntoResponse, Response},
    Json,
};
use futures::stream;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::dialogue::orchestrator::answer_question;
use crate::errors::AppError;
use crate::security::{detect_prompt_injection, MAX_QUESTION_LENGTH};
use crate::session::Role;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
}

/// POST /qa/create-session
pub async fn handle_create_session(State(state): State<AppState>) -> Json<CreateSessionResponse> {
    Json(CreateSessionResponse {
        session_id: state.sessions.create_session(),
    })
}

/// POST /qa/ask
///
/// Validates and security-screens the question before any model call; a
/// rejected input yields HTTP 400 with a generic message — the risk score
/// and matched patterns stay in the logs.
pub async fn handle_ask(
    State(state): State<AppState>,
    Json(payload): Json<AskRequest>,
) -> Result<Response, AppError> {
    let question = payload.question.trim();
    if question.is_empty() {
        return Err(AppError::Validation("Question cannot be empty".to_string()));
    }
    if question.chars().count() > MAX_QUESTION_LENGTH {
        return Err(AppError::Validation(format!(
            "Question too long (max {MAX_QUESTION_LENGTH} characters)"
        )));
    }

    info!(
        "Received question: {}...",
        question.chars().take(100).collect::<String>()
    );

    let verdict = detect_prompt_injection(question);
    if !verdict.is_safe {
        warn!(
            risk_score = verdict.risk_score,
            patterns = ?verdict.detected_patterns,
            "Blocked potentially unsafe question"
        );
        return Err(AppError::Validation(
            "Your question contains potentially unsafe content. Please rephrase your question \
             about the resume."
                .to_string(),
        ));
    }
    let question = verdict.cleaned_input;

    // Bind the session only when the id parses and is still live; an expired
    // or unknown id makes this a stateless turn, not an error.
    let session_id = payload
        .session_id
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .filter(|id| state.sessions.get(*id).is_some());
    if let Some(id) = session_id {
        state.sessions.add_message(id, Role::User, &question, None);
    }

    let reply = answer_question(
        state.llm.as_ref(),
        &state.sessions,
        &state.resume_text,
        &question,
        session_id,
        state.config.history_window,
    )
    .await;

    let session_header = session_id.map(|id| id.to_string()).unwrap_or_default();
    let body = Body::from_stream(stream::once(async move {
        Ok::<_, std::convert::Infallible>(reply)
    }));

    let headers = [
        (
            header::CONTENT_TYPE,
            "text/plain; charset=utf-8".to_string(),
        ),
        (HeaderName::from_static("x-session-id"), session_header),
    ];
    Ok((headers, body).into_response())
}
