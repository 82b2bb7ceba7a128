pub mod handlers;

pub use handlers::{callback_event, message_event, run_dispatcher};
