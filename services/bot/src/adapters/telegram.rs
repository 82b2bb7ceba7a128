//! services/bot/src/adapters/telegram.rs
//!
//! This module contains the adapter for the Telegram Bot API.
//! It implements the `ChatTransport` port from the `core` crate.

use async_trait::async_trait;
use avatar_core::domain::{ButtonAction, InlineButton, Keyboard, OutboundMessage, ParseMode};
use avatar_core::ports::{ChatTransport, PortError, PortResult};
use avatar_core::texts;
use teloxide::prelude::*;
use teloxide::types::{
    BotCommand, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton,
    KeyboardMarkup, ReplyMarkup,
};
use teloxide::{ApiError as TelegramApiError, RequestError};
use tracing::{debug, info};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ChatTransport` port using a teloxide `Bot`.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Advertises `/start` in the client's command menu.
    pub async fn register_commands(&self) -> Result<(), RequestError> {
        self.bot
            .set_my_commands(vec![BotCommand::new(
                "start",
                "Начать / получить расшифровку Аватаров",
            )])
            .await?;
        info!("Bot commands registered");
        Ok(())
    }
}

//=========================================================================================
// `ChatTransport` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send(&self, chat_id: i64, message: OutboundMessage) -> PortResult<()> {
        match message {
            OutboundMessage::Text {
                text,
                keyboard,
                parse_mode,
            } => {
                let mut request = self.bot.send_message(ChatId(chat_id), text);
                if let Some(keyboard) = keyboard {
                    request = request.reply_markup(reply_markup(&keyboard)?);
                }
                if let Some(mode) = parse_mode {
                    request = request.parse_mode(telegram_parse_mode(mode));
                }
                request.await.map_err(map_request_error)?;
            }
            OutboundMessage::Document {
                bytes,
                filename,
                caption,
            } => {
                debug!(chat_id, %filename, size = bytes.len(), "Sending document");
                self.bot
                    .send_document(ChatId(chat_id), InputFile::memory(bytes).file_name(filename))
                    .caption(caption)
                    .await
                    .map_err(map_request_error)?;
            }
        }
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> PortResult<()> {
        self.bot
            .answer_callback_query(callback_id.to_string())
            .await
            .map_err(map_request_error)?;
        Ok(())
    }
}

//=========================================================================================
// Conversions
//=========================================================================================

fn reply_markup(keyboard: &Keyboard) -> PortResult<ReplyMarkup> {
    match keyboard {
        Keyboard::MainMenu => Ok(main_menu().into()),
        Keyboard::Inline(rows) => {
            let rows = rows
                .iter()
                .map(|row| row.iter().map(inline_button).collect::<PortResult<Vec<_>>>())
                .collect::<PortResult<Vec<_>>>()?;
            Ok(InlineKeyboardMarkup::new(rows).into())
        }
    }
}

/// The persistent two-button keyboard shown under the input field.
fn main_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(texts::MENU_ENTER_DATE)],
        vec![KeyboardButton::new(texts::MENU_CONSULTATION)],
    ])
    .resize_keyboard()
    .persistent()
}

fn inline_button(button: &InlineButton) -> PortResult<InlineKeyboardButton> {
    match &button.action {
        ButtonAction::Callback(data) => Ok(InlineKeyboardButton::callback(
            button.label.clone(),
            data.clone(),
        )),
        ButtonAction::Url(url) => {
            let url = reqwest::Url::parse(url)
                .map_err(|e| PortError::Unexpected(format!("Invalid button URL '{}': {}", url, e)))?;
            Ok(InlineKeyboardButton::url(button.label.clone(), url))
        }
    }
}

#[allow(deprecated)]
fn telegram_parse_mode(mode: ParseMode) -> teloxide::types::ParseMode {
    match mode {
        ParseMode::Html => teloxide::types::ParseMode::Html,
        ParseMode::MarkdownV2 => teloxide::types::ParseMode::MarkdownV2,
        ParseMode::Markdown => teloxide::types::ParseMode::Markdown,
    }
}

fn map_request_error(e: RequestError) -> PortError {
    match e {
        RequestError::Api(TelegramApiError::ChatNotFound) => {
            PortError::NotFound("chat not found".to_string())
        }
        RequestError::Api(TelegramApiError::BotBlocked) => PortError::Unauthorized,
        other => PortError::Unexpected(other.to_string()),
    }
}
