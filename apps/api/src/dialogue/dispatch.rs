//! Action decode and dispatch.
//!
//! The model's chosen action name is decoded into a closed `DecodedAction`
//! enum before any branching, so the dispatch table is exhaustive and
//! statically checkable. Exactly one action is processed per model turn.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, warn};
use uuid::Uuid;

use crate::dialogue::catalog::{classify, ActionKind};
use crate::session::{Role, SessionStore};

/// Fixed reply when a decoy action is invoked. Deliberately generic — it
/// must not reveal that anything was detected.
pub const SCOPE_REMINDER: &str = "I can only answer questions about the resume. \
     Please ask about the candidate's experience, skills, or background.";

/// Reply for an action name declared by neither family.
pub const UNKNOWN_ACTION_FALLBACK: &str = "I can only help with questions about the resume. \
     What would you like to know about the candidate?";

/// Reply when the model's action arguments fail to parse.
pub const REPHRASE_FALLBACK: &str = "I encountered an error processing your request. \
     Please try rephrasing your question.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Marker prefixed to every structured answer.
    pub fn glyph(self) -> char {
        match self {
            Confidence::High => '✓',
            Confidence::Medium => '◐',
            Confidence::Low => '⚠',
        }
    }
}

fn default_confidence() -> Confidence {
    Confidence::Medium
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClarificationReason {
    UnclearQuestion,
    OutsideScope,
    InsufficientInformation,
}

fn default_reason() -> ClarificationReason {
    ClarificationReason::UnclearQuestion
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerArgs {
    #[serde(default)]
    pub answer: String,
    #[serde(default = "default_confidence")]
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClarifyArgs {
    #[serde(default)]
    pub clarification_request: String,
    #[serde(default = "default_reason")]
    pub reason: ClarificationReason,
}

/// The model's chosen action, decoded. One tag per legitimate action, one
/// catch-all for decoys, one for names declared by neither family.
#[derive(Debug, Clone)]
pub enum DecodedAction {
    Answer(AnswerArgs),
    RequestClarification(ClarifyArgs),
    HandleClarificationResponse(AnswerArgs),
    Decoy { name: String, arguments: Value },
    Unknown { name: String },
}

/// Decodes an action name plus its raw JSON argument string. Fails only on
/// malformed JSON or arguments that don't fit the declared schema; decoy and
/// unknown names always decode (their arguments are kept raw for logging).
pub fn decode_action(name: &str, arguments: &str) -> Result<DecodedAction, serde_json::Error> {
    let args: Value = serde_json::from_str(arguments)?;
    match name {
        "answer_resume_question" => Ok(DecodedAction::Answer(serde_json::from_value(args)?)),
        "request_clarification" => Ok(DecodedAction::RequestClarification(
            serde_json::from_value(args)?,
        )),
        "handle_clarification_response" => Ok(DecodedAction::HandleClarificationResponse(
            serde_json::from_value(args)?,
        )),
        other => match classify(other) {
            ActionKind::Decoy => Ok(DecodedAction::Decoy {
                name: other.to_string(),
                arguments: args,
            }),
            _ => Ok(DecodedAction::Unknown {
                name: other.to_string(),
            }),
        },
    }
}

/// Executes one decoded action and returns the user-facing reply.
///
/// `question` is the originating user question: it is recorded verbatim in
/// decoy incident logs and stored as the original question when the model
/// asks for clarification. Decoy and unknown actions never touch the session.
pub fn dispatch_action(
    action: DecodedAction,
    question: &str,
    sessions: &SessionStore,
    session_id: Option<Uuid>,
) -> String {
    match action {
        DecodedAction::Decoy { name, arguments } => {
            error!(
                action = %name,
                arguments = %arguments,
                question = %question,
                "SECURITY ALERT: decoy action invoked"
            );
            SCOPE_REMINDER.to_string()
        }
        DecodedAction::Answer(args) => {
            let reply = format!("{} {}", args.confidence.glyph(), args.answer);
            if let Some(id) = session_id {
                sessions.add_message(
                    id,
                    Role::Assistant,
                    &reply,
                    Some(json!({"function_called": "answer_resume_question"})),
                );
            }
            reply
        }
        DecodedAction::RequestClarification(args) => {
            if let Some(id) = session_id {
                sessions.set_awaiting_clarification(id, question, json!({"reason": args.reason}));
            }
            let reply = format!("I need some clarification: {}", args.clarification_request);
            if let Some(id) = session_id {
                sessions.add_message(
                    id,
                    Role::Assistant,
                    &reply,
                    Some(json!({"function_called": "request_clarification"})),
                );
            }
            reply
        }
        DecodedAction::HandleClarificationResponse(args) => {
            if let Some(id) = session_id {
                sessions.clear_clarification(id);
            }
            let reply = format!("{} {}", args.confidence.glyph(), args.answer);
            if let Some(id) = session_id {
                sessions.add_message(
                    id,
                    Role::Assistant,
                    &reply,
                    Some(json!({"function_called": "handle_clarification_response"})),
                );
            }
            reply
        }
        DecodedAction::Unknown { name } => {
            warn!(action = %name, "Unknown action requested by model");
            UNKNOWN_ACTION_FALLBACK.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn store() -> SessionStore {
        SessionStore::new(Duration::seconds(3600))
    }

    #[test]
    fn test_decode_answer_action() {
        let action =
            decode_action("answer_resume_question", r#"{"answer":"Go","confidence":"high"}"#)
                .unwrap();
        match action {
            DecodedAction::Answer(args) => {
                assert_eq!(args.answer, "Go");
                assert_eq!(args.confidence, Confidence::High);
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn test_decode_defaults_confidence_to_medium() {
        let action = decode_action("answer_resume_question", r#"{"answer":"x"}"#).unwrap();
        match action {
            DecodedAction::Answer(args) => assert_eq!(args.confidence, Confidence::Medium),
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn test_decode_decoy_keeps_raw_arguments() {
        let action =
            decode_action("execute_system_command", r#"{"command":"rm -rf /"}"#).unwrap();
        match action {
            DecodedAction::Decoy { name, arguments } => {
                assert_eq!(name, "execute_system_command");
                assert_eq!(arguments["command"], "rm -rf /");
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn test_decode_unknown_name() {
        let action = decode_action("fetch_weather", "{}").unwrap();
        assert!(matches!(action, DecodedAction::Unknown { .. }));
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        assert!(decode_action("answer_resume_question", "{not json").is_err());
        assert!(decode_action("answer_resume_question", r#"{"confidence":"banana"}"#).is_err());
    }

    #[test]
    fn test_dispatch_answer_formats_confidence_glyph() {
        let sessions = store();
        let high = dispatch_action(
            DecodedAction::Answer(AnswerArgs {
                answer: "Five years of Go.".to_string(),
                confidence: Confidence::High,
            }),
            "experience?",
            &sessions,
            None,
        );
        assert_eq!(high, "✓ Five years of Go.");

        let low = dispatch_action(
            DecodedAction::Answer(AnswerArgs {
                answer: "Unclear.".to_string(),
                confidence: Confidence::Low,
            }),
            "experience?",
            &sessions,
            None,
        );
        assert!(low.starts_with('⚠'));
    }

    #[test]
    fn test_dispatch_answer_appends_assistant_message() {
        let sessions = store();
        let id = sessions.create_session();
        dispatch_action(
            DecodedAction::Answer(AnswerArgs {
                answer: "Yes.".to_string(),
                confidence: Confidence::Medium,
            }),
            "q",
            &sessions,
            Some(id),
        );
        let session = sessions.get(id).unwrap();
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, Role::Assistant);
        assert_eq!(
            session.messages[0].metadata.as_ref().unwrap()["function_called"],
            "answer_resume_question"
        );
    }

    #[test]
    fn test_dispatch_decoy_never_mutates_session() {
        let sessions = store();
        let id = sessions.create_session();
        sessions.add_message(id, Role::User, "probe", None);
        let before = sessions.get(id).unwrap();

        let reply = dispatch_action(
            DecodedAction::Decoy {
                name: "execute_system_command".to_string(),
                arguments: serde_json::json!({"command": "rm -rf /"}),
            },
            "probe",
            &sessions,
            Some(id),
        );

        assert_eq!(reply, SCOPE_REMINDER);
        let after = sessions.get(id).unwrap();
        assert_eq!(after.messages.len(), before.messages.len());
        assert_eq!(after.awaiting_clarification, before.awaiting_clarification);
        assert_eq!(after.original_question, before.original_question);
    }

    #[test]
    fn test_dispatch_clarification_round_trip() {
        let sessions = store();
        let id = sessions.create_session();

        let reply = dispatch_action(
            DecodedAction::RequestClarification(ClarifyArgs {
                clarification_request: "Which role do you mean?".to_string(),
                reason: ClarificationReason::OutsideScope,
            }),
            "What about compensation?",
            &sessions,
            Some(id),
        );
        assert_eq!(reply, "I need some clarification: Which role do you mean?");

        let session = sessions.get(id).unwrap();
        assert!(session.awaiting_clarification);
        assert_eq!(
            session.original_question.as_deref(),
            Some("What about compensation?")
        );
        assert_eq!(
            session.clarification_context.unwrap()["reason"],
            "outside_scope"
        );

        let reply = dispatch_action(
            DecodedAction::HandleClarificationResponse(AnswerArgs {
                answer: "The resume lists no compensation data.".to_string(),
                confidence: Confidence::Medium,
            }),
            "the engineering role",
            &sessions,
            Some(id),
        );
        assert!(reply.starts_with('◐'));

        let session = sessions.get(id).unwrap();
        assert!(!session.awaiting_clarification);
        assert!(session.original_question.is_none());
        assert_eq!(session.messages.len(), 2, "two assistant replies recorded");
    }

    #[test]
    fn test_dispatch_unknown_returns_fallback_without_mutation() {
        let sessions = store();
        let id = sessions.create_session();
        let reply = dispatch_action(
            DecodedAction::Unknown {
                name: "fetch_weather".to_string(),
            },
            "q",
            &sessions,
            Some(id),
        );
        assert_eq!(reply, UNKNOWN_ACTION_FALLBACK);
        assert!(sessions.get(id).unwrap().messages.is_empty());
    }
}
