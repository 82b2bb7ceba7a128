//! services/bot/src/web/state.rs
//!
//! Defines the shared state of the notification relay.

use crate::config::Config;
use avatar_core::ports::ChatTransport;
use std::sync::Arc;

//=========================================================================================
// RelayState (Shared Across All Requests)
//=========================================================================================

/// The shared relay state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct RelayState {
    pub transport: Arc<dyn ChatTransport>,
    /// The secret callers must present in `x-internal-token`.
    pub internal_token: Option<String>,
    /// Broadcast targets used when a request names no chat.
    pub admin_chat_ids: Vec<i64>,
}

impl RelayState {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        internal_token: Option<String>,
        admin_chat_ids: Vec<i64>,
    ) -> Self {
        Self {
            transport,
            internal_token,
            admin_chat_ids,
        }
    }

    pub fn from_config(transport: Arc<dyn ChatTransport>, config: &Config) -> Self {
        Self::new(
            transport,
            config.internal_api_token.clone(),
            config.admin_chat_ids.clone(),
        )
    }
}
