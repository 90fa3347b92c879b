//! Chat-completion backend trait.

use super::message::ChatMessage;
use crate::error::Result;

/// Sampling temperature for model A; analysis should be repeatable.
pub const ANALYSIS_TEMPERATURE: f32 = 0.3;

/// Sampling temperature for model B; replies should feel varied.
pub const REPLY_TEMPERATURE: f32 = 0.7;

/// A remote chat-completion model.
///
/// `messages` always starts with one system turn and ends with the new user
/// turn. Implementations return the text of a single assistant turn or a
/// [`DuetError::RemoteCall`](crate::DuetError::RemoteCall).
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Short name used in logs and errors, e.g. "analysis".
    fn name(&self) -> &str;

    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String>;
}
