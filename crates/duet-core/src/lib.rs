//! Core domain for duet.
//!
//! Holds the data model (preferences, credentials, voices, histories), the routing
//! rules that pick which remote model handles a message, the prompt builder and the
//! service traits implemented by the infrastructure and interaction crates.

pub mod cache;
pub mod conversation;
pub mod error;
pub mod prompt;
pub mod secret;
pub mod user;
pub mod voice;

pub use error::{DuetError, EMPTY_INPUT_MESSAGE, REMOTE_FAILURE_MESSAGE, Result};
