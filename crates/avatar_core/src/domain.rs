//! crates/avatar_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of the chat transport, HTTP and PDF libraries.

use serde::{Deserialize, Serialize};
use std::fmt;

//=========================================================================================
// Calculation Inputs and Outputs
//=========================================================================================

/// The user's gender, chosen explicitly with a button. Selects the content variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Maps a button callback payload (`gender_male` / `gender_female`) to a gender.
    pub fn from_callback(data: &str) -> Option<Self> {
        match data {
            "gender_male" => Some(Gender::Male),
            "gender_female" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn callback_data(self) -> &'static str {
        match self {
            Gender::Male => "gender_male",
            Gender::Female => "gender_female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("male"),
            Gender::Female => f.write_str("female"),
        }
    }
}

/// A single pre-authored content entry, already resolved for one gender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub title: String,
    /// Image filename inside the avatar images directory.
    pub image: Option<String>,
    /// What the avatar says about character. Also read for the comfort zone's advice.
    pub character: String,
    pub talents: String,
    pub money: String,
    /// What the avatar says about lessons in the fall. Also read for the comfort zone.
    pub lessons: String,
    /// Advice attached to the character reading.
    pub recommendations: Vec<String>,
}

/// One named point of the result: its index and the content it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarPoint {
    pub index: u32,
    pub content: ContentRecord,
}

/// The full set of indices derived from a birth date.
///
/// Only A, B, V, G and D are rendered; K, L, M, N and B2 are kept for
/// consumers that want the extended chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvatarIndices {
    pub a: u32,
    pub b: u32,
    pub v: u32,
    pub g: u32,
    pub d: u32,
    pub k: u32,
    pub l: u32,
    pub m: u32,
    pub n: u32,
    pub b2: u32,
}

/// The outcome of a successful calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarResult {
    pub gender: Gender,
    pub indices: AvatarIndices,
    /// Character.
    pub a: AvatarPoint,
    /// Talents.
    pub b: AvatarPoint,
    /// Money.
    pub v: AvatarPoint,
    /// Lessons in the fall.
    pub g: AvatarPoint,
    /// Comfort zone.
    pub d: AvatarPoint,
}

//=========================================================================================
// Conversation State
//=========================================================================================

/// The mutable per-(user, chat) record tracked for the lifetime of the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub birth_day: Option<u32>,
    pub birth_month: Option<u32>,
    pub birth_year: Option<i32>,
    pub gender: Option<Gender>,
}

/// Where a session currently is in the dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueStage {
    AwaitingDate,
    AwaitingGender,
    Complete,
}

impl SessionState {
    /// Resets the date and gender, returning the session to the start of the flow.
    pub fn clear(&mut self) {
        *self = SessionState::default();
    }

    /// Returns the stored `(day, month, year)` when all three fields are present.
    pub fn birth_date(&self) -> Option<(u32, u32, i32)> {
        match (self.birth_day, self.birth_month, self.birth_year) {
            (Some(day), Some(month), Some(year)) => Some((day, month, year)),
            _ => None,
        }
    }

    pub fn stage(&self) -> DialogueStage {
        match (self.birth_date(), self.gender) {
            (None, _) => DialogueStage::AwaitingDate,
            (Some(_), None) => DialogueStage::AwaitingGender,
            (Some(_), Some(_)) => DialogueStage::Complete,
        }
    }
}

//=========================================================================================
// Chat Events (inbound) and Replies (outbound)
//=========================================================================================

/// A transport-neutral inbound chat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub user_id: Option<i64>,
    pub chat_id: Option<i64>,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Free-form text, including commands such as `/start`.
    Text(String),
    /// An inline button press carrying its callback payload.
    Callback { id: String, data: String },
}

/// Text formatting understood by the chat transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
    MarkdownV2,
    Markdown,
}

impl ParseMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "HTML" => Some(ParseMode::Html),
            "MarkdownV2" => Some(ParseMode::MarkdownV2),
            "Markdown" => Some(ParseMode::Markdown),
            _ => None,
        }
    }
}

/// What happens when an inline button is pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Callback(String),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub action: ButtonAction,
}

impl InlineButton {
    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Url(url.into()),
        }
    }
}

/// Keyboards that may accompany a text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// The persistent reply keyboard shown under the input field.
    MainMenu,
    /// Rows of inline buttons attached to the message itself.
    Inline(Vec<Vec<InlineButton>>),
}

/// A message the bot wants delivered to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Text {
        text: String,
        keyboard: Option<Keyboard>,
        parse_mode: Option<ParseMode>,
    },
    Document {
        bytes: Vec<u8>,
        filename: String,
        caption: String,
    },
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        OutboundMessage::Text {
            text: text.into(),
            keyboard: None,
            parse_mode: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        OutboundMessage::Text {
            text: text.into(),
            keyboard: Some(keyboard),
            parse_mode: None,
        }
    }
}
