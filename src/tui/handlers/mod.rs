pub mod async_ops;
pub mod key;
pub mod message;

pub use key::handle_event;
pub use message::{drain_chat_events, handle_tui_msg};
