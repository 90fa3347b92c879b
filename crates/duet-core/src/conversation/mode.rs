//! Prefix dispatch.

use crate::error::{DuetError, Result};
use strum::Display;

/// Marker that skips the analysis stage (full-width exclamation mark).
pub const DIRECT_PREFIX: char = '！';

/// Marker that stops after the analysis stage.
pub const ANALYSIS_ONLY_PREFIX: char = '#';

/// Which remote models handle a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RouteMode {
    /// Model A analyses, model B replies based on the analysis.
    Full,
    /// Model B replies directly.
    Direct,
    /// Model A's analysis is the reply.
    AnalysisOnly,
}

impl RouteMode {
    pub fn calls_analysis(&self) -> bool {
        matches!(self, Self::Full | Self::AnalysisOnly)
    }

    pub fn calls_reply(&self) -> bool {
        matches!(self, Self::Full | Self::Direct)
    }
}

/// A message with its routing prefix resolved and removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedInput {
    pub mode: RouteMode,
    pub text: String,
}

impl RoutedInput {
    /// Picks the mode from the leading marker and strips it.
    ///
    /// The direct marker is checked before the analysis-only marker. Fails with
    /// [`DuetError::EmptyInput`] when nothing but whitespace remains.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim_start();
        let (mode, rest) = if let Some(rest) = raw.strip_prefix(DIRECT_PREFIX) {
            (RouteMode::Direct, rest)
        } else if let Some(rest) = raw.strip_prefix(ANALYSIS_ONLY_PREFIX) {
            (RouteMode::AnalysisOnly, rest)
        } else {
            (RouteMode::Full, raw)
        };

        let text = rest.trim();
        if text.is_empty() {
            return Err(DuetError::EmptyInput);
        }

        Ok(Self {
            mode,
            text: text.to_string(),
        })
    }
}
