//! Main menu and small input parsers.

use colored::Colorize;
use duet_core::conversation::{ANALYSIS_ONLY_PREFIX, DIRECT_PREFIX};
use strum::{Display, EnumIter, IntoEnumIterator};

/// Words that leave a conversation and return to the menu.
pub const EXIT_WORDS: [&str; 3] = ["quit", "exit", "退出"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum MenuChoice {
    #[strum(serialize = "Start chatting (text only)")]
    TextChat,
    #[strum(serialize = "Start chatting (text + voice)")]
    VoiceChat,
    #[strum(serialize = "Select a voice")]
    SelectVoice,
    #[strum(serialize = "Update preferences")]
    UpdatePreferences,
    #[strum(serialize = "Exit")]
    Exit,
}

impl MenuChoice {
    /// Parses the 1-based menu number.
    pub fn parse(input: &str) -> Option<Self> {
        let index: usize = input.trim().parse().ok()?;
        index.checked_sub(1).and_then(|i| Self::iter().nth(i))
    }
}

pub fn print_menu() {
    let rule = "=".repeat(50);
    println!();
    println!("{}", rule.bright_black());
    println!("{}", "           duet: analysis + reply chat".bright_magenta().bold());
    println!("{}", rule.bright_black());
    for (number, choice) in MenuChoice::iter().enumerate() {
        println!("{}. {}", number + 1, choice);
    }
    println!("{}", rule.bright_black());
    print_prefix_tips();
    println!("{}", rule.bright_black());
}

pub fn print_prefix_tips() {
    println!("{}", "Tips:".bright_black());
    println!(
        "{}",
        format!("   {DIRECT_PREFIX}message  - skip the analysis, reply directly").bright_black()
    );
    println!(
        "{}",
        format!("   {ANALYSIS_ONLY_PREFIX}message  - analysis only, no humanized reply")
            .bright_black()
    );
}

/// Case-insensitive match against `quit`, `exit` and `退出`.
pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    EXIT_WORDS.contains(&input.as_str())
}

/// Only an explicit `y`/`yes` counts as agreement.
pub fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Answer to the numbered voice list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoicePick {
    Skip,
    Pick(usize),
    Invalid,
}

/// Parses a 1-based voice number; `0` skips.
pub fn parse_voice_pick(input: &str, count: usize) -> VoicePick {
    match input.trim().parse::<usize>() {
        Ok(0) => VoicePick::Skip,
        Ok(n) if n <= count => VoicePick::Pick(n - 1),
        _ => VoicePick::Invalid,
    }
}
