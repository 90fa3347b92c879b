//! UI state and key handling, independent of the terminal backend.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use duet_application::onboarding::{PREFERENCE_QUESTIONS, preferences_from_answers};
use duet_application::{
    ChatWorker, ProfileService, WorkerCommand, WorkerError, WorkerEvent, WorkerEvents,
};
use duet_core::conversation::RouteMode;
use duet_core::secret::ApiCredentials;
use duet_core::user::UserPreferences;
use duet_core::voice::SelectedVoice;

/// Starts a chat worker for a set of API keys.
pub type Connector =
    Box<dyn FnMut(&ApiCredentials) -> anyhow::Result<(ChatWorker, WorkerEvents)>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    User,
    Reply,
    Analysis,
    System,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub kind: EntryKind,
    pub text: String,
}

/// Voice list shown after F2.
#[derive(Debug, Clone)]
pub struct VoicePicker {
    pub voices: Vec<SelectedVoice>,
    pub selected: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    ApiKeys,
    Preferences,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    /// Drawn as `*` per character.
    pub masked: bool,
}

/// Popup with one text field per line, opened with F3 or F4.
#[derive(Debug, Clone)]
pub struct Form {
    pub kind: FormKind,
    pub fields: Vec<FormField>,
    pub focused: usize,
}

impl Form {
    fn api_keys(current: Option<ApiCredentials>) -> Self {
        let (analysis, reply) = current
            .map(|c| (c.analysis_key, c.reply_key))
            .unwrap_or_default();
        Self {
            kind: FormKind::ApiKeys,
            fields: vec![
                FormField {
                    label: "Analysis model API key",
                    value: analysis,
                    masked: true,
                },
                FormField {
                    label: "Reply model API key",
                    value: reply,
                    masked: true,
                },
            ],
            focused: 0,
        }
    }

    fn preferences(current: Option<UserPreferences>) -> Self {
        let current = current.unwrap_or_default();
        let values = [
            current.profession,
            current.preferred_title,
            current.reply_style,
            current.additional_info,
        ];
        Self {
            kind: FormKind::Preferences,
            fields: PREFERENCE_QUESTIONS
                .into_iter()
                .zip(values)
                .map(|(label, value)| FormField {
                    label,
                    value: value.unwrap_or_default(),
                    masked: false,
                })
                .collect(),
            focused: 0,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            FormKind::ApiKeys => " API keys ",
            FormKind::Preferences => " Preferences ",
        }
    }

    fn value(&self, index: usize) -> String {
        self.fields
            .get(index)
            .map(|field| field.value.clone())
            .unwrap_or_default()
    }

    fn focus_next(&mut self) {
        self.focused = (self.focused + 1) % self.fields.len();
    }

    fn focus_previous(&mut self) {
        self.focused = (self.focused + self.fields.len() - 1) % self.fields.len();
    }
}

struct Connection {
    worker: ChatWorker,
    events: WorkerEvents,
}

pub struct TuiApp {
    connection: Option<Connection>,
    connector: Connector,
    profiles: ProfileService,
    log: Vec<LogEntry>,
    input: String,
    status: String,
    voice: Option<SelectedVoice>,
    speech_enabled: bool,
    busy: bool,
    picker: Option<VoicePicker>,
    form: Option<Form>,
    /// Lines scrolled up from the bottom of the log.
    scroll_back: u16,
}

impl TuiApp {
    /// Connects with the cached keys, or opens the key form when there are none.
    pub fn new(profiles: ProfileService, connector: Connector) -> Self {
        let voice = profiles.voice();
        let mut app = Self {
            connection: None,
            connector,
            profiles,
            log: Vec::new(),
            input: String::new(),
            status: "Ready".to_string(),
            voice,
            speech_enabled: false,
            busy: false,
            picker: None,
            form: None,
            scroll_back: 0,
        };
        app.push(
            EntryKind::System,
            "Welcome! Prefix a message with ！ to skip the analysis or # for analysis only.",
        );

        match app.profiles.credentials() {
            Some(credentials) => app.connect(&credentials),
            None => {
                tracing::info!("[Tui] No cached API keys, asking for them");
                app.push(EntryKind::System, "Enter your API keys to start chatting.");
                app.form = Some(Form::api_keys(None));
            }
        }
        app
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn voice(&self) -> Option<&SelectedVoice> {
        self.voice.as_ref()
    }

    pub fn speech_enabled(&self) -> bool {
        self.speech_enabled
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn picker(&self) -> Option<&VoicePicker> {
        self.picker.as_ref()
    }

    pub fn form(&self) -> Option<&Form> {
        self.form.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn scroll_back(&self) -> u16 {
        self.scroll_back
    }

    /// Applies every queued worker event. Returns whether anything changed.
    pub fn tick(&mut self) -> bool {
        let events = match self.connection.as_mut() {
            Some(connection) => connection.events.drain(),
            None => return false,
        };
        let changed = !events.is_empty();
        for event in events {
            self.apply_event(event);
        }
        changed
    }

    pub fn apply_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Thinking => {
                self.busy = true;
                self.status = "Thinking...".to_string();
            }
            WorkerEvent::Reply(reply) => {
                let kind = if reply.mode == RouteMode::AnalysisOnly {
                    EntryKind::Analysis
                } else {
                    EntryKind::Reply
                };
                self.push(kind, reply.reply);
            }
            WorkerEvent::Failed(message) => self.push(EntryKind::Error, message),
            WorkerEvent::Ready => {
                self.busy = false;
                self.status = "Ready".to_string();
            }
            WorkerEvent::Cleared => {
                self.log.clear();
                self.scroll_back = 0;
                self.push(EntryKind::System, "Conversation cleared.");
            }
            WorkerEvent::SpeechStarted => self.status = "Generating speech...".to_string(),
            WorkerEvent::SpeechPlaying(_) => self.status = "Playing voice reply".to_string(),
            WorkerEvent::SpeechFailed(message) => self.push(EntryKind::Error, message),
            WorkerEvent::Voices(voices) => {
                if voices.is_empty() {
                    self.status = "No voices available".to_string();
                } else {
                    let selected = self
                        .voice
                        .as_ref()
                        .and_then(|current| voices.iter().position(|v| v.uri == current.uri))
                        .unwrap_or(0);
                    self.status = "Choose a voice (Enter to pick, Esc to skip)".to_string();
                    self.picker = Some(VoicePicker { voices, selected });
                }
            }
            WorkerEvent::VoicesFailed(message) => {
                self.status = "Voice list unavailable".to_string();
                self.push(EntryKind::Error, message);
            }
        }
    }

    /// Handles one key press. Returns `true` when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        if self.form.is_some() {
            self.handle_form_key(key);
            return false;
        }
        if self.picker.is_some() {
            self.handle_picker_key(key);
            return false;
        }

        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.send_command(WorkerCommand::Clear);
            }
            KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.toggle_speech();
            }
            KeyCode::F(2) => {
                self.status = "Loading voices...".to_string();
                self.send_command(WorkerCommand::LoadVoices);
            }
            KeyCode::F(3) => self.open_form(Form::api_keys(self.profiles.credentials())),
            KeyCode::F(4) => self.open_form(Form::preferences(self.profiles.preferences())),
            KeyCode::Enter => self.submit_input(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c);
            }
            KeyCode::PageUp | KeyCode::Up => self.scroll_back = self.scroll_back.saturating_add(3),
            KeyCode::PageDown | KeyCode::Down => {
                self.scroll_back = self.scroll_back.saturating_sub(3)
            }
            KeyCode::End => self.scroll_back = 0,
            _ => {}
        }
        false
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        let Some(picker) = self.picker.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Up => picker.selected = picker.selected.saturating_sub(1),
            KeyCode::Down => {
                if picker.selected + 1 < picker.voices.len() {
                    picker.selected += 1;
                }
            }
            KeyCode::Enter => {
                let voice = picker.voices[picker.selected].clone();
                self.picker = None;
                self.choose_voice(voice);
            }
            KeyCode::Esc => {
                self.picker = None;
                self.status = "Voice unchanged".to_string();
            }
            _ => {}
        }
    }

    fn open_form(&mut self, form: Form) {
        self.status = "Tab moves between fields, Enter saves, Esc cancels".to_string();
        self.form = Some(form);
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.form = None;
                self.status = if self.connection.is_some() {
                    "Unchanged".to_string()
                } else {
                    "API keys are needed to chat (F3)".to_string()
                };
            }
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_previous(),
            KeyCode::Enter if form.focused + 1 < form.fields.len() => form.focus_next(),
            KeyCode::Enter => {
                if let Some(form) = self.form.take() {
                    self.submit_form(form);
                }
            }
            KeyCode::Backspace => {
                form.fields[form.focused].value.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                form.fields[form.focused].value.push(c);
            }
            _ => {}
        }
    }

    fn submit_form(&mut self, form: Form) {
        match form.kind {
            FormKind::ApiKeys => {
                let credentials = ApiCredentials::new(form.value(0), form.value(1));
                if !credentials.is_complete() {
                    self.status = "Both API keys are required".to_string();
                    self.form = Some(form);
                    return;
                }
                if self.busy {
                    self.status = "Please wait for the current reply".to_string();
                    self.form = Some(form);
                    return;
                }
                if !self.profiles.save_credentials(credentials.clone()) {
                    self.push(EntryKind::Error, "Could not save the API keys to the cache.");
                }
                self.connect(&credentials);
            }
            FormKind::Preferences => {
                let answers: [String; 4] = std::array::from_fn(|i| form.value(i));
                let preferences = preferences_from_answers(&answers);
                if !self.profiles.save_preferences(preferences.clone()) {
                    self.push(EntryKind::Error, "Could not save the preferences to the cache.");
                }
                self.push(EntryKind::System, "Preferences saved.");
                self.status = "Ready".to_string();
                if self.connection.is_some() {
                    self.send_command(WorkerCommand::SetPreferences(preferences));
                }
            }
        }
    }

    /// Replaces the running worker, if any, with one using `credentials`.
    /// Histories start empty again.
    fn connect(&mut self, credentials: &ApiCredentials) {
        match (self.connector)(credentials) {
            Ok((worker, events)) => {
                let reconnect = self.connection.is_some();
                self.connection = Some(Connection { worker, events });
                self.busy = false;
                self.speech_enabled = false;
                self.status = "Ready".to_string();
                if reconnect {
                    self.push(EntryKind::System, "API keys updated. Conversation restarted.");
                }
            }
            Err(e) => {
                tracing::error!("[Tui] Starting the chat worker failed: {:#}", e);
                self.push(EntryKind::Error, format!("Could not start the chat: {e}"));
                self.status = "API keys are needed to chat (F3)".to_string();
            }
        }
    }

    fn choose_voice(&mut self, voice: SelectedVoice) {
        self.profiles.save_voice(voice.clone());
        self.push(
            EntryKind::System,
            format!("Voice set: {}", voice.display_name()),
        );
        self.status = "Ready".to_string();
        self.voice = Some(voice.clone());
        self.send_command(WorkerCommand::SetVoice(Some(voice)));
    }

    fn toggle_speech(&mut self) {
        if !self.speech_enabled && self.voice.is_none() {
            self.status = "Select a voice with F2 first".to_string();
            return;
        }
        self.speech_enabled = !self.speech_enabled;
        self.status = if self.speech_enabled {
            "Voice replies on".to_string()
        } else {
            "Voice replies off".to_string()
        };
        self.send_command(WorkerCommand::SetSpeechEnabled(self.speech_enabled));
    }

    fn submit_input(&mut self) {
        if self.busy {
            self.status = "Please wait for the current reply".to_string();
            return;
        }
        let message = self.input.trim().to_string();
        if message.is_empty() {
            return;
        }

        let Some(connection) = self.connection.as_ref() else {
            self.status = "Set your API keys with F3 first".to_string();
            return;
        };
        match connection.worker.submit(message.clone()) {
            Ok(()) => {
                self.busy = true;
                self.input.clear();
                self.scroll_back = 0;
                self.push(EntryKind::User, message);
            }
            Err(WorkerError::Busy) => {
                self.status = "Please wait for the current reply".to_string();
            }
            Err(WorkerError::Closed) => self.worker_gone(),
        }
    }

    fn send_command(&mut self, command: WorkerCommand) {
        let sent = match self.connection.as_ref() {
            Some(connection) => connection.worker.send(command),
            None => {
                self.status = "Set your API keys with F3 first".to_string();
                return;
            }
        };
        if sent.is_err() {
            self.worker_gone();
        }
    }

    fn worker_gone(&mut self) {
        tracing::error!("[Tui] Chat worker is no longer running");
        self.push(EntryKind::Error, "The chat worker stopped. Please restart.");
    }

    fn push(&mut self, kind: EntryKind, text: impl Into<String>) {
        self.log.push(LogEntry {
            kind,
            text: text.into(),
        });
    }
}
