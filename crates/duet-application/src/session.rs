//! One chat session: the router plus the state it threads through.

use crate::router::{ConversationRouter, RouteReply};
use duet_core::Result;
use duet_core::conversation::ConversationHistory;
use duet_core::prompt::build_system_prompt;
use duet_core::user::UserPreferences;

/// Owns both histories and model B's system instruction for one process run.
pub struct ChatSession {
    router: ConversationRouter,
    analysis_history: ConversationHistory,
    reply_history: ConversationHistory,
    preferences: UserPreferences,
    system_prompt: String,
}

impl ChatSession {
    pub fn new(router: ConversationRouter, preferences: UserPreferences) -> Self {
        let system_prompt = build_system_prompt(&preferences);
        Self {
            router,
            analysis_history: ConversationHistory::new(),
            reply_history: ConversationHistory::new(),
            preferences,
            system_prompt,
        }
    }

    /// Routes one message, updating the histories on success.
    pub async fn send(&mut self, raw_message: &str) -> Result<RouteReply> {
        self.router
            .route(
                raw_message,
                &mut self.analysis_history,
                &mut self.reply_history,
                &self.system_prompt,
            )
            .await
    }

    /// Forgets both histories. Preferences stay.
    pub fn clear(&mut self) {
        self.analysis_history.clear();
        self.reply_history.clear();
        tracing::info!("[Session] Histories cleared");
    }

    /// Replaces the preferences and rebuilds the reply instruction.
    ///
    /// Existing histories are kept; later turns use the new instruction.
    pub fn set_preferences(&mut self, preferences: UserPreferences) {
        self.system_prompt = build_system_prompt(&preferences);
        self.preferences = preferences;
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn analysis_history(&self) -> &ConversationHistory {
        &self.analysis_history
    }

    pub fn reply_history(&self) -> &ConversationHistory {
        &self.reply_history
    }
}
