//! In-memory session store for multi-turn conversation context.
//!
//! The store is an injected service (`Arc<SessionStore>` in `AppState`), not
//! a process-global. It exclusively owns every `ConversationSession`; callers
//! only ever receive cloned snapshots and always mutate back through the
//! store, so the idle-timeout check and `last_accessed` refresh cannot be
//! bypassed. The single mutex is held only for in-memory mutation — never
//! across the model call.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single message in a conversation. Immutable once appended.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<Value>,
}

/// One conversation and its clarification state.
///
/// Invariant: `awaiting_clarification` is true iff `original_question` is
/// present. Both are set and cleared together.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    pub id: Uuid,
    pub messages: Vec<ConversationMessage>,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub awaiting_clarification: bool,
    pub original_question: Option<String>,
    pub clarification_context: Option<Value>,
}

pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, ConversationSession>>,
    timeout: Duration,
}

impl SessionStore {
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Creates a new session and returns its id.
    pub fn create_session(&self) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let session = ConversationSession {
            id,
            messages: Vec::new(),
            created_at: now,
            last_accessed: now,
            awaiting_clarification: false,
            original_question: None,
            clarification_context: None,
        };
        self.lock().insert(id, session);
        id
    }

    /// Returns a snapshot of the session, refreshing `last_accessed`.
    /// An idle session past the timeout is evicted and reported as absent.
    pub fn get(&self, id: Uuid) -> Option<ConversationSession> {
        let mut sessions = self.lock();
        Self::live_entry(&mut sessions, id, self.timeout).map(|s| s.clone())
    }

    /// Appends a message. Returns false when the session is gone or expired.
    pub fn add_message(
        &self,
        id: Uuid,
        role: Role,
        content: &str,
        metadata: Option<Value>,
    ) -> bool {
        let mut sessions = self.lock();
        match Self::live_entry(&mut sessions, id, self.timeout) {
            Some(session) => {
                session.messages.push(ConversationMessage {
                    role,
                    content: content.to_string(),
                    timestamp: Utc::now(),
                    metadata,
                });
                true
            }
            None => false,
        }
    }

    /// Marks the session as awaiting a clarification response, recording the
    /// question that triggered it and the reason context.
    pub fn set_awaiting_clarification(
        &self,
        id: Uuid,
        original_question: &str,
        context: Value,
    ) -> bool {
        let mut sessions = self.lock();
        match Self::live_entry(&mut sessions, id, self.timeout) {
            Some(session) => {
                session.awaiting_clarification = true;
                session.original_question = Some(original_question.to_string());
                session.clarification_context = Some(context);
                true
            }
            None => false,
        }
    }

    /// Clears the clarification state.
    pub fn clear_clarification(&self, id: Uuid) -> bool {
        let mut sessions = self.lock();
        match Self::live_entry(&mut sessions, id, self.timeout) {
            Some(session) => {
                session.awaiting_clarification = false;
                session.original_question = None;
                session.clarification_context = None;
                true
            }
            None => false,
        }
    }

    /// Evicts every expired session. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, s| now - s.last_accessed <= self.timeout);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, ConversationSession>> {
        // A poisoned lock means another request panicked mid-mutation; the
        // session map itself is still structurally valid.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Looks up a live session within an already-held lock: evicts it when
    /// idle past the timeout, refreshes `last_accessed` otherwise.
    fn live_entry(
        sessions: &mut HashMap<Uuid, ConversationSession>,
        id: Uuid,
        timeout: Duration,
    ) -> Option<&mut ConversationSession> {
        let now = Utc::now();
        match sessions.entry(id) {
            Entry::Occupied(entry) if now - entry.get().last_accessed > timeout => {
                entry.remove();
                None
            }
            Entry::Occupied(entry) => {
                let session = entry.into_mut();
                session.last_accessed = now;
                Some(session)
            }
            Entry::Vacant(_) => None,
        }
    }
}
