//! services/bot/src/chat/handlers.rs
//!
//! Receives Telegram updates and hands them to the dialogue controller.
//!
//! Each update is reduced to a transport-neutral `InboundEvent`; all decisions
//! about what to reply are made in the core crate.

use avatar_core::dialogue::DialogueController;
use avatar_core::domain::{EventKind, InboundEvent};
use std::sync::Arc;
use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

//=========================================================================================
// Update Conversion
//=========================================================================================

/// Converts a text message. Messages without text (stickers, photos) yield `None`.
pub fn message_event(msg: &Message) -> Option<InboundEvent> {
    let text = msg.text()?;
    Some(InboundEvent {
        user_id: msg.from.as_ref().map(|u| u.id.0 as i64),
        chat_id: Some(msg.chat.id.0),
        kind: EventKind::Text(text.to_string()),
    })
}

/// Converts an inline button press. The chat is taken from the message the
/// button was attached to, when Telegram still provides it.
pub fn callback_event(q: &CallbackQuery) -> InboundEvent {
    InboundEvent {
        user_id: Some(q.from.id.0 as i64),
        chat_id: q.message.as_ref().map(|m| m.chat().id.0),
        kind: EventKind::Callback {
            id: q.id.clone(),
            data: q.data.clone().unwrap_or_default(),
        },
    }
}

//=========================================================================================
// Endpoints
//=========================================================================================

async fn on_message(msg: Message, controller: Arc<DialogueController>) -> ResponseResult<()> {
    match message_event(&msg) {
        Some(event) => controller.handle(event).await,
        None => debug!(chat_id = msg.chat.id.0, "Ignoring message without text"),
    }
    Ok(())
}

async fn on_callback(q: CallbackQuery, controller: Arc<DialogueController>) -> ResponseResult<()> {
    controller.handle(callback_event(&q)).await;
    Ok(())
}

/// Runs the long-polling dispatcher until `shutdown` is cancelled.
pub async fn run_dispatcher(
    bot: Bot,
    controller: Arc<DialogueController>,
    shutdown: CancellationToken,
) {
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![controller])
        .build();

    let dispatcher_token = dispatcher.shutdown_token();
    tokio::spawn(async move {
        shutdown.cancelled().await;
        match dispatcher_token.shutdown() {
            Ok(stopped) => stopped.await,
            Err(e) => warn!("Dispatcher was not running at shutdown: {}", e),
        }
    });

    info!("Starting Telegram dispatcher");
    dispatcher.dispatch().await;
    info!("Telegram dispatcher stopped");
}
