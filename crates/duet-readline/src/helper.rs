//! Line editing for the conversation prompt.
//!
//! Whole-line commands (`/clear` and the exit words) are completed and hinted;
//! mode prefixes are colored so the routing is visible before Enter.

use crate::menu::EXIT_WORDS;
use colored::Colorize;
use duet_core::conversation::{ANALYSIS_ONLY_PREFIX, DIRECT_PREFIX};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow::{self, Borrowed, Owned};

/// Clears both conversation histories.
pub const CLEAR_COMMAND: &str = "/clear";

fn line_commands() -> impl Iterator<Item = &'static str> {
    std::iter::once(CLEAR_COMMAND).chain(EXIT_WORDS)
}

/// Commands that start with `typed`. Nothing once the line holds a space.
fn matching_commands(typed: &str) -> Vec<&'static str> {
    if typed.is_empty() || typed.contains(char::is_whitespace) {
        return Vec::new();
    }
    let lowered = typed.to_lowercase();
    line_commands()
        .filter(|command| command.starts_with(lowered.as_str()))
        .collect()
}

/// The untyped rest of the first matching command.
fn command_hint(typed: &str) -> Option<String> {
    let typed_len = typed.to_lowercase().len();
    matching_commands(typed)
        .into_iter()
        .find(|command| command.len() > typed_len)
        .map(|command| command[typed_len..].to_string())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CliHelper;

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let candidates = matching_commands(&line[..pos])
            .into_iter()
            .map(|command| Pair {
                display: command.to_string(),
                replacement: command.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let trimmed = line.trim().to_lowercase();
        if line_commands().any(|command| command == trimmed) {
            Owned(line.bright_cyan().to_string())
        } else if line.starts_with(DIRECT_PREFIX) {
            Owned(line.bright_magenta().to_string())
        } else if line.starts_with(ANALYSIS_ONLY_PREFIX) {
            Owned(line.bright_yellow().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        // Only at the end of the line, where accepting the hint makes sense.
        if pos < line.len() {
            return None;
        }
        command_hint(line)
    }
}

impl Validator for CliHelper {}
