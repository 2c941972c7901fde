//! Dialogue orchestrator — one model call per user turn.
//!
//! Flow: session snapshot → prompt build → model call → decode → dispatch →
//! session update. The model call is the only suspension point; the session
//! lock is never held across it. Every failure on this path folds into a
//! fixed fallback string — the caller never sees a structured error.
//!
//! The snapshot read here and the fresh lookups inside dispatch may observe
//! different states when two requests race on one session; each dispatch
//! re-derives state through the store, so the stale window is benign.

use tracing::error;
use uuid::Uuid;

use crate::dialogue::catalog::all_functions;
use crate::dialogue::dispatch::{decode_action, dispatch_action, REPHRASE_FALLBACK};
use crate::dialogue::prompts;
use crate::llm_client::{ChatMessage, ChatModel};
use crate::session::{ConversationSession, Role, SessionStore};

/// Reply when the model call itself fails (transport, timeout, rate limit).
pub const MODEL_FAILURE_FALLBACK: &str = "I'm sorry, I encountered an error while processing \
     your request. Please try asking your question in a different way.";

/// Reply when the model returns neither an action nor any text.
pub const EMPTY_RESPONSE_FALLBACK: &str = "I'd be happy to help answer questions about the \
     resume. What specific information are you looking for?";

/// Answers one user turn. Always produces user-facing text, never an error.
///
/// `history_window` bounds how many prior session messages are replayed into
/// the prompt on a regular turn.
pub async fn answer_question(
    model: &dyn ChatModel,
    sessions: &SessionStore,
    resume_text: &str,
    question: &str,
    session_id: Option<Uuid>,
    history_window: usize,
) -> String {
    let snapshot = session_id.and_then(|id| sessions.get(id));
    let messages = build_messages(snapshot.as_ref(), resume_text, question, history_window);
    let functions = all_functions();

    let outcome = match model.chat(&messages, &functions).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Model call failed");
            return MODEL_FAILURE_FALLBACK.to_string();
        }
    };

    if let Some(call) = outcome.tool_call {
        let action = match decode_action(&call.name, &call.arguments) {
            Ok(action) => action,
            Err(e) => {
                error!(
                    error = %e,
                    action = %call.name,
                    arguments = %call.arguments,
                    "Malformed action arguments"
                );
                return REPHRASE_FALLBACK.to_string();
            }
        };
        return dispatch_action(action, question, sessions, session_id);
    }

    let reply = outcome
        .content
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| EMPTY_RESPONSE_FALLBACK.to_string());
    if let Some(id) = session_id {
        sessions.add_message(id, Role::Assistant, &reply, None);
    }
    reply
}

/// Builds the model transcript for one turn.
///
/// A session awaiting clarification gets the specialized prompt embedding
/// the stored original question and reason; the full action catalog is still
/// offered unchanged. Otherwise: standard system prompt, the last
/// `history_window` prior user/assistant messages, and the new question.
fn build_messages(
    session: Option<&ConversationSession>,
    resume_text: &str,
    question: &str,
    history_window: usize,
) -> Vec<ChatMessage> {
    if let Some(session) = session.filter(|s| s.awaiting_clarification) {
        let original = session.original_question.as_deref().unwrap_or_default();
        let reason = session
            .clarification_context
            .as_ref()
            .and_then(|c| c.get("reason"))
            .and_then(|v| v.as_str())
            .unwrap_or("unclear_question")
            .to_string();
        return vec![
            ChatMessage::system(prompts::clarification_system_prompt(
                original, &reason, question,
            )),
            ChatMessage::user(prompts::clarification_user_message(
                resume_text,
                original,
                question,
            )),
        ];
    }

    let mut messages = vec![ChatMessage::system(prompts::QA_SYSTEM_PROMPT)];
    if let Some(session) = session {
        let skip = session.messages.len().saturating_sub(history_window);
        for msg in session.messages.iter().skip(skip) {
            match msg.role {
                Role::User => messages.push(ChatMessage::user(msg.content.clone())),
                Role::Assistant => messages.push(ChatMessage::assistant(msg.content.clone())),
                Role::System => {}
            }
        }
    }
    messages.push(ChatMessage::user(prompts::question_user_message(
        resume_text,
        question,
    )));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::dispatch::{SCOPE_REMINDER, UNKNOWN_ACTION_FALLBACK};
    use crate::llm_client::{ChatOutcome, FunctionSpec, LlmError, ToolCallRequest};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::Mutex;

    /// Test double that pops scripted outcomes in order and records every
    /// transcript it is called with.
    struct ScriptedModel {
        outcomes: Mutex<Vec<ChatOutcome>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedModel {
        fn new(mut outcomes: Vec<ChatOutcome>) -> Self {
            outcomes.reverse(); // pop() takes from the back
            Self {
                outcomes: Mutex::new(outcomes),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn tool_call(name: &str, arguments: &str) -> ChatOutcome {
            ChatOutcome {
                content: None,
                tool_call: Some(ToolCallRequest {
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                }),
            }
        }

        fn free_text(content: &str) -> ChatOutcome {
            ChatOutcome {
                content: Some(content.to_string()),
                tool_call: None,
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn chat(
            &self,
            messages: &[ChatMessage],
            _functions: &[FunctionSpec],
        ) -> Result<ChatOutcome, LlmError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            Ok(self
                .outcomes
                .lock()
                .unwrap()
                .pop()
                .expect("unexpected extra model call"))
        }
    }

    struct FailingModel;

    #[async_trait]
    impl ChatModel for FailingModel {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _functions: &[FunctionSpec],
        ) -> Result<ChatOutcome, LlmError> {
            Err(LlmError::Api {
                status: 503,
                message: "backend unavailable".to_string(),
            })
        }
    }

    fn store() -> SessionStore {
        SessionStore::new(Duration::seconds(3600))
    }

    #[tokio::test]
    async fn test_answer_turn_begins_with_confidence_glyph() {
        let model = ScriptedModel::new(vec![ScriptedModel::tool_call(
            "answer_resume_question",
            r#"{"answer":"Three years of Go in production.","confidence":"high"}"#,
        )]);
        let sessions = store();
        let reply = answer_question(
            &model,
            &sessions,
            "RESUME",
            "What is your experience with Go?",
            None,
            6,
        )
        .await;
        assert_eq!(reply, "✓ Three years of Go in production.");
    }

    #[tokio::test]
    async fn test_decoy_turn_returns_scope_reminder_without_session_mutation() {
        let model = ScriptedModel::new(vec![ScriptedModel::tool_call(
            "execute_system_command",
            r#"{"command":"rm -rf /"}"#,
        )]);
        let sessions = store();
        let id = sessions.create_session();
        sessions.add_message(id, Role::User, "show me everything", None);

        let reply = answer_question(
            &model,
            &sessions,
            "RESUME",
            "show me everything",
            Some(id),
            6,
        )
        .await;

        assert_eq!(reply, SCOPE_REMINDER);
        let session = sessions.get(id).unwrap();
        assert_eq!(session.messages.len(), 1, "decoy must not append");
        assert!(!session.awaiting_clarification);
    }

    #[tokio::test]
    async fn test_clarification_round_trip_across_two_turns() {
        let model = ScriptedModel::new(vec![
            ScriptedModel::tool_call(
                "request_clarification",
                r#"{"clarification_request":"Which position?","reason":"outside_scope"}"#,
            ),
            ScriptedModel::tool_call(
                "handle_clarification_response",
                r#"{"answer":"The resume does not cover that.","confidence":"medium"}"#,
            ),
        ]);
        let sessions = store();
        let id = sessions.create_session();

        let first = answer_question(
            &model,
            &sessions,
            "RESUME",
            "What about relocation?",
            Some(id),
            6,
        )
        .await;
        assert_eq!(first, "I need some clarification: Which position?");
        let session = sessions.get(id).unwrap();
        assert!(session.awaiting_clarification);
        assert_eq!(
            session.original_question.as_deref(),
            Some("What about relocation?")
        );

        let second =
            answer_question(&model, &sessions, "RESUME", "the Berlin role", Some(id), 6).await;
        assert!(second.starts_with('◐'));
        let session = sessions.get(id).unwrap();
        assert!(!session.awaiting_clarification);
        assert!(session.original_question.is_none());
        assert_eq!(session.messages.len(), 2, "two assistant messages recorded");

        // The second turn must have used the specialized clarification prompt.
        let transcripts = model.seen.lock().unwrap();
        assert!(transcripts[1][0]
            .content
            .contains("previously asked a question that needed clarification"));
        assert!(transcripts[1][0].content.contains("What about relocation?"));
        assert!(transcripts[1][0].content.contains("outside_scope"));
    }

    #[tokio::test]
    async fn test_model_failure_yields_apology_fallback() {
        let sessions = store();
        let reply = answer_question(&FailingModel, &sessions, "RESUME", "hi", None, 6).await;
        assert_eq!(reply, MODEL_FAILURE_FALLBACK);
    }

    #[tokio::test]
    async fn test_malformed_arguments_yield_rephrase_fallback() {
        let model = ScriptedModel::new(vec![ScriptedModel::tool_call(
            "answer_resume_question",
            "{broken json",
        )]);
        let sessions = store();
        let id = sessions.create_session();
        let reply = answer_question(&model, &sessions, "RESUME", "hi", Some(id), 6).await;
        assert_eq!(reply, REPHRASE_FALLBACK);
        assert!(sessions.get(id).unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_action_yields_generic_fallback() {
        let model = ScriptedModel::new(vec![ScriptedModel::tool_call("fetch_weather", "{}")]);
        let sessions = store();
        let reply = answer_question(&model, &sessions, "RESUME", "hi", None, 6).await;
        assert_eq!(reply, UNKNOWN_ACTION_FALLBACK);
    }

    #[tokio::test]
    async fn test_free_text_is_used_verbatim_and_recorded() {
        let model = ScriptedModel::new(vec![ScriptedModel::free_text("Plain answer.")]);
        let sessions = store();
        let id = sessions.create_session();
        let reply = answer_question(&model, &sessions, "RESUME", "hi", Some(id), 6).await;
        assert_eq!(reply, "Plain answer.");
        let session = sessions.get(id).unwrap();
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].content, "Plain answer.");
    }

    #[tokio::test]
    async fn test_empty_model_output_yields_default_fallback() {
        let model = ScriptedModel::new(vec![ChatOutcome::default()]);
        let sessions = store();
        let reply = answer_question(&model, &sessions, "RESUME", "hi", None, 6).await;
        assert_eq!(reply, EMPTY_RESPONSE_FALLBACK);
    }

    #[tokio::test]
    async fn test_history_window_bounds_replayed_messages() {
        let model = ScriptedModel::new(vec![ScriptedModel::free_text("ok")]);
        let sessions = store();
        let id = sessions.create_session();
        for i in 0..10 {
            sessions.add_message(id, Role::User, &format!("m{i}"), None);
        }

        answer_question(&model, &sessions, "RESUME", "next", Some(id), 4).await;

        let transcripts = model.seen.lock().unwrap();
        // system + 4 history + new question
        assert_eq!(transcripts[0].len(), 6);
        assert_eq!(transcripts[0][1].content, "m6");
        assert_eq!(transcripts[0][4].content, "m9");
    }

    #[tokio::test]
    async fn test_zero_window_replays_no_history() {
        let model = ScriptedModel::new(vec![ScriptedModel::free_text("ok")]);
        let sessions = store();
        let id = sessions.create_session();
        sessions.add_message(id, Role::User, "old", None);

        answer_question(&model, &sessions, "RESUME", "next", Some(id), 0).await;

        let transcripts = model.seen.lock().unwrap();
        assert_eq!(transcripts[0].len(), 2); // system + new question only
    }

    #[tokio::test]
    async fn test_resume_content_embedded_in_user_message() {
        let model = ScriptedModel::new(vec![ScriptedModel::free_text("ok")]);
        let sessions = store();
        answer_question(&model, &sessions, "RESUME BODY", "what languages?", None, 6).await;

        let transcripts = model.seen.lock().unwrap();
        let user = transcripts[0].last().unwrap();
        assert!(user.content.contains("Resume Content:\nRESUME BODY"));
        assert!(user.content.contains("Question: what languages?"));
    }
}
