pub mod controller;
pub mod conversation;
pub mod gateway;

pub use controller::{ChatController, ChatEvent, ChatState, Submission};
pub use conversation::{Message, Sender};
pub use gateway::Generator;

#[cfg(test)]
pub mod testing;
