//! services/bot/src/web/notify.rs
//!
//! Contains the notification relay: an internal HTTP endpoint that lets other
//! services push messages into Telegram chats through the bot, and the master
//! definition for its OpenAPI specification.

use crate::web::state::RelayState;
use avatar_core::domain::{OutboundMessage, ParseMode};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::{OpenApi, ToSchema};

pub const NOTIFY_PATH: &str = "/internal/notify";
pub const TOKEN_HEADER: &str = "x-internal-token";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        notify_handler,
    ),
    components(
        schemas(NotifyRequest, NotifyResponse, DeliveryResult, ErrorResponse)
    ),
    tags(
        (name = "Avatar Bot Relay", description = "Internal endpoint for pushing notifications into Telegram chats.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The request payload. Every field is optional at the JSON level and
/// validated by the handler.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct NotifyRequest {
    /// Target chat id, as a number or a numeric string. Absent means "all admin chats".
    #[serde(rename = "chatId", default)]
    #[schema(value_type = Option<i64>)]
    pub chat_id: Option<Value>,
    /// Message text. Must not be blank.
    #[serde(default)]
    #[schema(value_type = String)]
    pub text: Option<Value>,
    /// One of `HTML` (default), `MarkdownV2`, `Markdown`.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub parse_mode: Option<Value>,
}

/// The outcome of one delivery.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryResult {
    #[serde(rename = "chatId")]
    pub chat_id: i64,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The response sent after the relay attempted every delivery.
#[derive(Debug, Serialize, ToSchema)]
pub struct NotifyResponse {
    pub ok: bool,
    /// The chat ids the relay attempted, in order.
    pub targets: Vec<i64>,
    pub results: Vec<DeliveryResult>,
}

/// The body of every rejected request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

//=========================================================================================
// Relay Errors
//=========================================================================================

/// Reasons the relay rejects a request before attempting any delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("internal_api_token_missing")]
    TokenMissing,
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid_json")]
    InvalidJson,
    #[error("text_required")]
    TextRequired,
    #[error("invalid_chat_id")]
    InvalidChatId,
    #[error("invalid_parse_mode")]
    InvalidParseMode,
    #[error("no_targets")]
    NoTargets,
    #[error("not_found")]
    NotFound,
}

impl RelayError {
    pub fn status(self) -> StatusCode {
        match self {
            RelayError::TokenMissing => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Unauthorized => StatusCode::UNAUTHORIZED,
            RelayError::NotFound => StatusCode::NOT_FOUND,
            RelayError::InvalidJson
            | RelayError::TextRequired
            | RelayError::InvalidChatId
            | RelayError::InvalidParseMode
            | RelayError::NoTargets => StatusCode::BAD_REQUEST,
        }
    }

    fn hint(self) -> Option<String> {
        match self {
            RelayError::NoTargets => {
                Some("Pass chatId or configure BOT_ADMIN_CHAT_IDS".to_string())
            }
            _ => None,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            ok: false,
            error: self.to_string(),
            hint: self.hint(),
        };
        (self.status(), Json(body)).into_response()
    }
}

//=========================================================================================
// Request Validation
//=========================================================================================

/// A validated relay request.
#[derive(Debug, PartialEq, Eq)]
struct Notification {
    targets: Vec<i64>,
    text: String,
    parse_mode: ParseMode,
}

fn authorize(state: &RelayState, headers: &HeaderMap) -> Result<(), RelayError> {
    let Some(expected) = state.internal_token.as_deref() else {
        return Err(RelayError::TokenMissing);
    };
    let presented = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok());
    if presented != Some(expected) {
        return Err(RelayError::Unauthorized);
    }
    Ok(())
}

fn parse_body(body: &[u8]) -> Result<NotifyRequest, RelayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(NotifyRequest::default());
    }
    serde_json::from_slice(body).map_err(|_| RelayError::InvalidJson)
}

fn parse_chat_id(value: Option<&Value>) -> Result<Option<i64>, RelayError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or(RelayError::InvalidChatId),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| RelayError::InvalidChatId),
        Some(_) => Err(RelayError::InvalidChatId),
    }
}

fn parse_mode(value: Option<&Value>) -> Result<ParseMode, RelayError> {
    match value {
        None | Some(Value::Null) => Ok(ParseMode::Html),
        Some(Value::String(s)) => ParseMode::parse(s).ok_or(RelayError::InvalidParseMode),
        Some(_) => Err(RelayError::InvalidParseMode),
    }
}

fn validate(state: &RelayState, request: NotifyRequest) -> Result<Notification, RelayError> {
    let text = match &request.text {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => return Err(RelayError::TextRequired),
    };
    let chat_id = parse_chat_id(request.chat_id.as_ref())?;
    let parse_mode = parse_mode(request.parse_mode.as_ref())?;

    let targets = match chat_id {
        Some(id) => vec![id],
        None => state.admin_chat_ids.clone(),
    };
    if targets.is_empty() {
        return Err(RelayError::NoTargets);
    }

    Ok(Notification {
        targets,
        text,
        parse_mode,
    })
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Deliver a notification to one chat or to every admin chat.
///
/// An empty body is treated as `{}`. Deliveries run concurrently; the response
/// lists the outcome of each one.
#[utoipa::path(
    post,
    path = "/internal/notify",
    request_body(content = NotifyRequest, description = "The notification to deliver."),
    responses(
        (status = 200, description = "Delivered to every target", body = NotifyResponse),
        (status = 207, description = "At least one delivery failed", body = NotifyResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or wrong token", body = ErrorResponse),
        (status = 500, description = "The relay secret is not configured", body = ErrorResponse)
    ),
    params(
        ("x-internal-token" = String, Header, description = "The shared relay secret.")
    )
)]
pub async fn notify_handler(
    State(state): State<Arc<RelayState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, RelayError> {
    let notification = authorize(&state, &headers)
        .and_then(|()| parse_body(&body))
        .and_then(|request| validate(&state, request))
        .inspect_err(|e| warn!("Rejected relay request: {}", e))?;

    let sends = notification.targets.iter().map(|&chat_id| {
        let message = OutboundMessage::Text {
            text: notification.text.clone(),
            keyboard: None,
            parse_mode: Some(notification.parse_mode),
        };
        let transport = state.transport.clone();
        async move {
            match transport.send(chat_id, message).await {
                Ok(()) => DeliveryResult {
                    chat_id,
                    ok: true,
                    error: None,
                },
                Err(e) => {
                    warn!("Relay delivery to chat {} failed: {}", chat_id, e);
                    DeliveryResult {
                        chat_id,
                        ok: false,
                        error: Some(e.to_string()),
                    }
                }
            }
        }
    });
    let results = join_all(sends).await;

    let ok = results.iter().all(|r| r.ok);
    info!(
        targets = results.len(),
        delivered = results.iter().filter(|r| r.ok).count(),
        "Relay notification processed"
    );
    let status = if ok {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((
        status,
        Json(NotifyResponse {
            ok,
            targets: notification.targets,
            results,
        }),
    ))
}

async fn not_found() -> RelayError {
    RelayError::NotFound
}

/// The relay's router: one route, JSON 404 for everything else.
pub fn relay_router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route(NOTIFY_PATH, post(notify_handler).fallback(not_found))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use avatar_core::ports::{ChatTransport, PortResult};
    use serde_json::json as j;

    struct Silent;

    #[async_trait]
    impl ChatTransport for Silent {
        async fn send(&self, _chat_id: i64, _message: OutboundMessage) -> PortResult<()> {
            Ok(())
        }

        async fn acknowledge(&self, _callback_id: &str) -> PortResult<()> {
            Ok(())
        }
    }

    #[test]
    fn chat_ids_accept_numbers_and_numeric_strings() {
        assert_eq!(parse_chat_id(Some(&j!(42))), Ok(Some(42)));
        assert_eq!(parse_chat_id(Some(&j!("-100123"))), Ok(Some(-100123)));
        assert_eq!(parse_chat_id(Some(&j!(""))), Ok(None));
        assert_eq!(parse_chat_id(None), Ok(None));
        assert_eq!(parse_chat_id(Some(&j!("abc"))), Err(RelayError::InvalidChatId));
        assert_eq!(parse_chat_id(Some(&j!(1.5))), Err(RelayError::InvalidChatId));
        assert_eq!(parse_chat_id(Some(&j!([1]))), Err(RelayError::InvalidChatId));
    }

    #[test]
    fn parse_mode_defaults_to_html() {
        assert_eq!(parse_mode(None), Ok(ParseMode::Html));
        assert_eq!(parse_mode(Some(&j!("MarkdownV2"))), Ok(ParseMode::MarkdownV2));
        assert_eq!(parse_mode(Some(&j!("markdown"))), Err(RelayError::InvalidParseMode));
    }

    #[test]
    fn blank_body_is_an_empty_object() {
        let request = parse_body(b"  \n").unwrap();
        assert!(request.text.is_none());
        assert!(matches!(parse_body(b"{oops"), Err(RelayError::InvalidJson)));
    }

    #[test]
    fn text_is_kept_as_sent() {
        let state = RelayState::new(Arc::new(Silent), None, vec![7]);
        let request = NotifyRequest {
            text: Some(j!("  <b>hi</b>\n")),
            ..NotifyRequest::default()
        };
        let notification = validate(&state, request).unwrap();
        assert_eq!(notification.text, "  <b>hi</b>\n");
        assert_eq!(notification.targets, vec![7]);
    }

    #[test]
    fn errors_render_their_code() {
        assert_eq!(RelayError::NoTargets.to_string(), "no_targets");
        assert_eq!(RelayError::TokenMissing.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
