//! crates/avatar_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core logic depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the chat transport and the document renderer.

use async_trait::async_trait;

use crate::domain::OutboundMessage;
use crate::report::AvatarReport;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., Telegram, PDF).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Delivers a single message to a chat.
    async fn send(&self, chat_id: i64, message: OutboundMessage) -> PortResult<()>;

    /// Confirms receipt of an inline button press so the client stops its spinner.
    async fn acknowledge(&self, callback_id: &str) -> PortResult<()>;
}

#[async_trait]
pub trait ReportRenderer: Send + Sync {
    /// Lays out a report as a downloadable document and returns its bytes.
    async fn render_report(&self, report: &AvatarReport) -> PortResult<Vec<u8>>;
}
