//! Menu-driven terminal session.

use crate::helper::{CLEAR_COMMAND, CliHelper};
use crate::menu::{self, MenuChoice, VoicePick};
use anyhow::Result;
use colored::Colorize;
use duet_application::onboarding::{PREFERENCE_QUESTIONS, env_api_keys, preferences_from_answers};
use duet_application::{AppContext, ChatSession, SPEECH_FAILURE_MESSAGE, VoiceReplyService};
use duet_core::conversation::RouteMode;
use duet_core::secret::ApiCredentials;
use duet_core::user::UserPreferences;
use duet_core::voice::{SelectedVoice, VoiceRegistry};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use std::time::Instant;

/// One line of user input.
enum Line {
    Text(String),
    /// Ctrl-C
    Interrupted,
    /// Ctrl-D
    Eof,
}

/// Where to go after a conversation ends.
enum AfterChat {
    Menu,
    Quit,
}

pub struct TerminalApp {
    context: AppContext,
    editor: Editor<CliHelper, DefaultHistory>,
    credentials: ApiCredentials,
    preferences: UserPreferences,
    voice: Option<SelectedVoice>,
}

impl TerminalApp {
    /// Runs onboarding. Returns `None` if the user aborted it.
    pub fn onboard(context: AppContext) -> Result<Option<Self>> {
        let mut editor = Editor::<CliHelper, DefaultHistory>::new()?;
        editor.set_helper(Some(CliHelper));

        let Some(credentials) = ask_credentials(&context, &mut editor)? else {
            return Ok(None);
        };
        let Some(preferences) = ask_preferences(&context, &mut editor, true)? else {
            return Ok(None);
        };

        let voice = context.profiles().voice();
        if let Some(voice) = &voice {
            tracing::info!("[Terminal] Loaded cached voice '{}'", voice.display_name());
        }

        Ok(Some(Self {
            context,
            editor,
            credentials,
            preferences,
            voice,
        }))
    }

    pub async fn run(&mut self) -> Result<()> {
        loop {
            menu::print_menu();
            let choice = match self.read_line("Choose an option (1-5): ")? {
                Line::Text(input) => match MenuChoice::parse(&input) {
                    Some(choice) => choice,
                    None => {
                        println!("{}", "Please enter a number between 1 and 5.".yellow());
                        continue;
                    }
                },
                Line::Interrupted | Line::Eof => MenuChoice::Exit,
            };
            tracing::info!("[Terminal] Menu choice: {:?}", choice);

            let after = match choice {
                MenuChoice::TextChat => self.chat(false).await?,
                MenuChoice::VoiceChat => self.voice_chat().await?,
                MenuChoice::SelectVoice => {
                    match self.choose_voice().await? {
                        Some(voice) => println!(
                            "{}",
                            format!("Voice set: {}", voice.display_name()).bright_green()
                        ),
                        None => println!("{}", "No voice selected.".yellow()),
                    }
                    AfterChat::Menu
                }
                MenuChoice::UpdatePreferences => {
                    if let Some(preferences) =
                        ask_preferences(&self.context, &mut self.editor, false)?
                    {
                        self.preferences = preferences;
                        println!("{}", "Preferences updated.".bright_green());
                    }
                    AfterChat::Menu
                }
                MenuChoice::Exit => AfterChat::Quit,
            };

            if let AfterChat::Quit = after {
                println!("{}", "Thanks for chatting, goodbye!".bright_green());
                return Ok(());
            }
        }
    }

    async fn voice_chat(&mut self) -> Result<AfterChat> {
        if self.voice.is_none() {
            println!("{}", "Please choose a voice first.".yellow());
            if self.choose_voice().await?.is_none() {
                println!("{}", "No voice selected, using text-only mode.".yellow());
                return self.chat(false).await;
            }
        }
        self.chat(true).await
    }

    /// Lists voices and lets the user pick one. The pick is cached.
    async fn choose_voice(&mut self) -> Result<Option<SelectedVoice>> {
        println!("{}", "Loading voices...".bright_black());
        let registry = self.context.voice_registry(&self.credentials);
        let voices = match registry.list_voices().await {
            Ok(voices) => voices,
            Err(e) => {
                tracing::error!("[Terminal] Voice list unavailable: {}", e);
                Vec::new()
            }
        };

        if voices.is_empty() {
            println!(
                "{}",
                "Could not load any voices. Check the network connection and API key.".red()
            );
            return Ok(None);
        }

        println!();
        println!("{}", "=== Available voices ===".bright_magenta());
        for (number, voice) in voices.iter().enumerate() {
            println!(
                "{}. {} - {}...",
                number + 1,
                voice.display_name(),
                voice.sample_preview(50)
            );
        }

        loop {
            let prompt = format!("\nChoose a voice (1-{}), or 0 to skip: ", voices.len());
            let input = match self.read_line(&prompt)? {
                Line::Text(input) => input,
                Line::Interrupted | Line::Eof => return Ok(None),
            };
            match menu::parse_voice_pick(&input, voices.len()) {
                VoicePick::Skip => {
                    tracing::info!("[Terminal] Voice selection skipped");
                    return Ok(None);
                }
                VoicePick::Pick(index) => {
                    let voice = voices[index].clone();
                    self.context.profiles().save_voice(voice.clone());
                    self.voice = Some(voice.clone());
                    return Ok(Some(voice));
                }
                VoicePick::Invalid => println!("{}", "Invalid choice, try again.".yellow()),
            }
        }
    }

    /// One conversation with fresh histories.
    async fn chat(&mut self, with_voice: bool) -> Result<AfterChat> {
        let mut session = self
            .context
            .chat_session(&self.credentials, self.preferences.clone());
        let speech = if with_voice {
            Some(self.context.voice_reply_service(&self.credentials)?)
        } else {
            None
        };

        let mode_text = if with_voice { "text + voice" } else { "text only" };
        println!();
        println!(
            "{}",
            format!("=== Conversation started ({mode_text}) ===").bright_magenta().bold()
        );
        if let (true, Some(voice)) = (with_voice, &self.voice) {
            println!("Current voice: {}", voice.display_name());
        }
        println!(
            "{}",
            format!("Type 'quit' or 'exit' to return to the menu, '{CLEAR_COMMAND}' to start over.")
                .bright_black()
        );
        menu::print_prefix_tips();
        println!();

        loop {
            let input = match self.read_line("You: ")? {
                Line::Text(input) => input,
                Line::Interrupted => {
                    tracing::info!("[Terminal] Conversation interrupted");
                    return Ok(AfterChat::Menu);
                }
                Line::Eof => return Ok(AfterChat::Quit),
            };
            let trimmed = input.trim();

            if menu::is_exit_command(trimmed) {
                tracing::info!("[Terminal] Returning to the menu");
                return Ok(AfterChat::Menu);
            }
            if trimmed.is_empty() {
                println!("{}", "Please enter something.".yellow());
                continue;
            }
            if trimmed == CLEAR_COMMAND {
                session.clear();
                println!("{}", "Conversation history cleared.".bright_black());
                continue;
            }
            if let Err(e) = self.editor.add_history_entry(trimmed) {
                tracing::debug!("[Terminal] Could not record line history: {}", e);
            }

            let started = Instant::now();
            self.handle_message(&mut session, speech.as_ref(), trimmed)
                .await;
            tracing::info!(
                "[Terminal] Message handled in {:.2}s",
                started.elapsed().as_secs_f64()
            );
        }
    }

    async fn handle_message(
        &self,
        session: &mut ChatSession,
        speech: Option<&VoiceReplyService>,
        input: &str,
    ) {
        let reply = match session.send(input).await {
            Ok(reply) => reply,
            Err(e) => {
                println!("{}", e.user_message().red());
                return;
            }
        };

        if reply.mode == RouteMode::AnalysisOnly {
            println!("{}", "📊 Logical analysis:".bright_yellow());
            println!("{}", reply.reply.bright_blue());
            println!();
            return;
        }

        println!("{} {}", "AI:".bright_green().bold(), reply.reply.bright_blue());
        if let (Some(speech), Some(voice)) = (speech, &self.voice) {
            match speech.speak(&reply.reply, voice).await {
                Ok(_) => println!("{}", "🔊 Playing the voice reply...".bright_black()),
                Err(_) => println!("{}", format!("⚠️ {SPEECH_FAILURE_MESSAGE}").yellow()),
            }
        }
        println!();
    }

    fn read_line(&mut self, prompt: &str) -> Result<Line> {
        read_line(&mut self.editor, prompt)
    }
}

fn read_line(editor: &mut Editor<CliHelper, DefaultHistory>, prompt: &str) -> Result<Line> {
    match editor.readline(prompt) {
        Ok(line) => Ok(Line::Text(line)),
        Err(ReadlineError::Interrupted) => Ok(Line::Interrupted),
        Err(ReadlineError::Eof) => Ok(Line::Eof),
        Err(err) => Err(err.into()),
    }
}

/// Reads a line during onboarding; Ctrl-C/Ctrl-D abort.
fn ask(editor: &mut Editor<CliHelper, DefaultHistory>, prompt: &str) -> Result<Option<String>> {
    match read_line(editor, prompt)? {
        Line::Text(line) => Ok(Some(line.trim().to_string())),
        Line::Interrupted | Line::Eof => Ok(None),
    }
}

fn ask_credentials(
    context: &AppContext,
    editor: &mut Editor<CliHelper, DefaultHistory>,
) -> Result<Option<ApiCredentials>> {
    if context.profiles().credentials().is_some() {
        let Some(answer) = ask(editor, "Saved API keys found. Use them? (y/n): ")? else {
            return Ok(None);
        };
        if menu::is_yes(&answer) {
            tracing::info!("[Terminal] Using cached API keys");
            return Ok(context.profiles().credentials());
        }
    }

    let (env_analysis, env_reply) = env_api_keys();
    let Some(analysis) = ask_key(editor, "analysis (model A)", env_analysis)? else {
        return Ok(None);
    };
    let Some(reply) = ask_key(editor, "reply (model B)", env_reply)? else {
        return Ok(None);
    };

    let credentials = ApiCredentials::new(analysis, reply);
    context.profiles().save_credentials(credentials.clone());
    Ok(Some(credentials))
}

/// Asks for one key; an environment value is used when the answer is blank.
fn ask_key(
    editor: &mut Editor<CliHelper, DefaultHistory>,
    label: &str,
    from_env: Option<String>,
) -> Result<Option<String>> {
    loop {
        let prompt = match &from_env {
            Some(_) => format!("Enter your {label} API key (blank = use environment): "),
            None => format!("Enter your {label} API key: "),
        };
        let Some(answer) = ask(editor, &prompt)? else {
            return Ok(None);
        };
        match (answer.is_empty(), &from_env) {
            (false, _) => return Ok(Some(answer)),
            (true, Some(key)) => return Ok(Some(key.clone())),
            (true, None) => println!("{}", "The key cannot be empty.".yellow()),
        }
    }
}

/// With `offer_cached`, cached preferences can be reused instead of re-asked.
fn ask_preferences(
    context: &AppContext,
    editor: &mut Editor<CliHelper, DefaultHistory>,
    offer_cached: bool,
) -> Result<Option<UserPreferences>> {
    if offer_cached {
        if let Some(cached) = context.profiles().preferences() {
            let Some(answer) = ask(editor, "Saved preferences found. Use them? (y/n): ")? else {
                return Ok(None);
            };
            if menu::is_yes(&answer) {
                tracing::info!("[Terminal] Using cached preferences");
                return Ok(Some(cached));
            }
        }
    }

    println!("{}", "Leave any answer blank to skip it.".bright_black());
    let mut answers: [String; 4] = Default::default();
    for (answer, question) in answers.iter_mut().zip(PREFERENCE_QUESTIONS) {
        let Some(line) = ask(editor, &format!("{question}: "))? else {
            return Ok(None);
        };
        *answer = line;
    }

    let preferences = preferences_from_answers(&answers);
    context.profiles().save_preferences(preferences.clone());
    Ok(Some(preferences))
}
