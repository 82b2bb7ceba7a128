pub mod birth_date;
pub mod calculator;
pub mod content;
pub mod dialogue;
pub mod domain;
pub mod numbers;
pub mod ports;
pub mod render;
pub mod report;
pub mod session;
pub mod texts;

pub use birth_date::{BirthDate, DateParseError};
pub use calculator::AvatarCalculator;
pub use content::{ContentError, ContentTable};
pub use dialogue::DialogueController;
pub use domain::{
    AvatarResult, ButtonAction, EventKind, Gender, InboundEvent, InlineButton, Keyboard,
    OutboundMessage, ParseMode, SessionState,
};
pub use ports::{ChatTransport, PortError, PortResult, ReportRenderer};
pub use report::AvatarReport;
pub use session::{SessionKey, SessionStore};
