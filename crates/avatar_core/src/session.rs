//! crates/avatar_core/src/session.rs
//!
//! The conversation state tracker: one `SessionState` per (user, chat) pair,
//! kept in memory for the lifetime of the process.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::domain::SessionState;

/// Identifies a session: the user who wrote and the chat they wrote in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub user_id: i64,
    pub chat_id: i64,
}

impl SessionKey {
    /// Builds a key only when both identity components are known.
    pub fn from_parts(user_id: Option<i64>, chat_id: Option<i64>) -> Option<Self> {
        Some(Self {
            user_id: user_id?,
            chat_id: chat_id?,
        })
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_id, self.chat_id)
    }
}

/// Shared, lockable access to one session's state.
pub type SessionHandle = Arc<Mutex<SessionState>>;

/// In-memory session store. Unbounded and never evicted.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionKey, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for this identity pair, creating an empty one on
    /// first contact. Events without a user or chat are not tracked.
    pub async fn get_or_create(
        &self,
        user_id: Option<i64>,
        chat_id: Option<i64>,
    ) -> Option<SessionHandle> {
        let key = SessionKey::from_parts(user_id, chat_id)?;

        if let Some(handle) = self.sessions.read().await.get(&key) {
            return Some(handle.clone());
        }

        let mut sessions = self.sessions.write().await;
        let handle = sessions.entry(key).or_insert_with(|| {
            debug!(session = %key, "Creating session");
            Arc::new(Mutex::new(SessionState::default()))
        });
        Some(handle.clone())
    }

    /// A snapshot of the stored state, if the session exists.
    pub async fn get(&self, key: SessionKey) -> Option<SessionState> {
        let handle = self.sessions.read().await.get(&key).cloned()?;
        let state = handle.lock().await.clone();
        Some(state)
    }

    /// Replaces the stored state, creating the session if needed.
    pub async fn set(&self, key: SessionKey, state: SessionState) {
        let handle = self
            .get_or_create(Some(key.user_id), Some(key.chat_id))
            .await;
        if let Some(handle) = handle {
            *handle.lock().await = state;
        }
    }

    /// Resets the session's fields. The entry itself stays in the store.
    pub async fn clear(&self, key: SessionKey) {
        let handle = self.sessions.read().await.get(&key).cloned();
        if let Some(handle) = handle {
            handle.lock().await.clear();
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
