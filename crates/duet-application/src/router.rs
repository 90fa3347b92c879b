//! Two-stage conversation routing.
//!
//! Each message is dispatched by its prefix:
//!
//! | prefix | mode          | model A | model B |
//! |--------|---------------|---------|---------|
//! | `！`   | Direct        | -       | yes     |
//! | `#`    | AnalysisOnly  | yes     | -       |
//! | none   | Full          | yes     | yes, with A's analysis |
//!
//! A history gains a turn only when its own model answered. In Full mode a
//! failed reply still keeps model A's exchange.

use duet_core::conversation::{
    ANALYSIS_TEMPERATURE, ChatBackend, ConversationHistory, REPLY_TEMPERATURE, RouteMode,
    RoutedInput,
};
use duet_core::prompt::{ANALYSIS_SYSTEM_PROMPT, compose_reply_request};
use duet_core::Result;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of one routed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteReply {
    pub mode: RouteMode,
    /// Text to show the user.
    pub reply: String,
    /// Model A's output whenever model A was called. Never shown in Full mode.
    pub analysis: Option<String>,
}

impl RouteReply {
    /// Whether the visible reply came from model B (and may be spoken).
    pub fn is_humanized(&self) -> bool {
        self.mode.calls_reply()
    }
}

/// Routes messages between the analysis model (A) and the reply model (B).
#[derive(Clone)]
pub struct ConversationRouter {
    analysis: Arc<dyn ChatBackend>,
    reply: Arc<dyn ChatBackend>,
}

impl ConversationRouter {
    pub fn new(analysis: Arc<dyn ChatBackend>, reply: Arc<dyn ChatBackend>) -> Self {
        Self { analysis, reply }
    }

    /// Routes one raw message.
    ///
    /// `system_prompt` is model B's instruction; model A always uses the fixed
    /// analysis instruction. A failed call leaves its own history untouched.
    pub async fn route(
        &self,
        raw_message: &str,
        analysis_history: &mut ConversationHistory,
        reply_history: &mut ConversationHistory,
        system_prompt: &str,
    ) -> Result<RouteReply> {
        let input = RoutedInput::parse(raw_message)?;
        let started = Instant::now();
        tracing::info!("[Router] Routing message in {} mode", input.mode);

        let result = self
            .dispatch(&input, analysis_history, reply_history, system_prompt)
            .await;

        match &result {
            Ok(_) => tracing::info!(
                "[Router] {} route finished in {:.2}s",
                input.mode,
                started.elapsed().as_secs_f64()
            ),
            Err(e) => tracing::error!(
                "[Router] {} route failed after {:.2}s: {}",
                input.mode,
                started.elapsed().as_secs_f64(),
                e
            ),
        }
        result
    }

    async fn dispatch(
        &self,
        input: &RoutedInput,
        analysis_history: &mut ConversationHistory,
        reply_history: &mut ConversationHistory,
        system_prompt: &str,
    ) -> Result<RouteReply> {
        let text = input.text.as_str();
        match input.mode {
            RouteMode::Direct => {
                let reply = self.ask_reply(reply_history, system_prompt, text).await?;
                reply_history.push_exchange(text, reply.clone());
                Ok(RouteReply {
                    mode: RouteMode::Direct,
                    reply,
                    analysis: None,
                })
            }
            RouteMode::AnalysisOnly => {
                let analysis = self.ask_analysis(analysis_history, text).await?;
                analysis_history.push_exchange(text, analysis.clone());
                Ok(RouteReply {
                    mode: RouteMode::AnalysisOnly,
                    reply: analysis.clone(),
                    analysis: Some(analysis),
                })
            }
            RouteMode::Full => {
                let analysis = self.ask_analysis(analysis_history, text).await?;
                analysis_history.push_exchange(text, analysis.clone());

                let request = compose_reply_request(&analysis, text);
                let reply = self.ask_reply(reply_history, system_prompt, &request).await?;
                // Model B's history keeps the plain question, not the wrapped request.
                reply_history.push_exchange(text, reply.clone());
                Ok(RouteReply {
                    mode: RouteMode::Full,
                    reply,
                    analysis: Some(analysis),
                })
            }
        }
    }

    async fn ask_analysis(&self, history: &ConversationHistory, text: &str) -> Result<String> {
        let messages = history.request_messages(ANALYSIS_SYSTEM_PROMPT, text);
        tracing::debug!("[Router] Analysis request: {:?}", messages);
        self.analysis.complete(&messages, ANALYSIS_TEMPERATURE).await
    }

    async fn ask_reply(
        &self,
        history: &ConversationHistory,
        system_prompt: &str,
        user_turn: &str,
    ) -> Result<String> {
        let messages = history.request_messages(system_prompt, user_turn);
        tracing::debug!("[Router] Reply request: {:?}", messages);
        self.reply.complete(&messages, REPLY_TEMPERATURE).await
    }
}
