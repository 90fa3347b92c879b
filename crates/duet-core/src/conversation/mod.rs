//! Conversation types.
//!
//! - `message`: role-tagged chat turns
//! - `history`: append-only per-model history
//! - `mode`: prefix dispatch that picks the routing mode for a message
//! - `backend`: the chat-completion trait both remote models implement

mod backend;
mod history;
mod message;
mod mode;

pub use backend::{ANALYSIS_TEMPERATURE, ChatBackend, REPLY_TEMPERATURE};
pub use history::ConversationHistory;
pub use message::{ChatMessage, MessageRole};
pub use mode::{ANALYSIS_ONLY_PREFIX, DIRECT_PREFIX, RouteMode, RoutedInput};
