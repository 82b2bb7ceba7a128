pub mod notify;
pub mod state;

pub use notify::{notify_handler, relay_router, ApiDoc};
pub use state::RelayState;
