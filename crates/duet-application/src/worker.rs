//! Background worker for front-ends that must never block on the network.
//!
//! The worker task owns the [`ChatSession`]; the UI thread only sends
//! [`WorkerCommand`]s and drains [`WorkerEvent`]s. One message is in flight at
//! a time: a submit while busy is rejected instead of queued.

use crate::router::RouteReply;
use crate::session::ChatSession;
use crate::voice_reply::{SPEECH_FAILURE_MESSAGE, VoiceReplyService};
use duet_core::user::UserPreferences;
use duet_core::voice::{SelectedVoice, VoiceRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Requests from the UI thread.
#[derive(Debug, Clone)]
pub enum WorkerCommand {
    Submit(String),
    Clear,
    SetVoice(Option<SelectedVoice>),
    SetSpeechEnabled(bool),
    SetPreferences(UserPreferences),
    LoadVoices,
}

/// Results delivered back to the UI thread, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// A submitted message is being routed.
    Thinking,
    Reply(RouteReply),
    /// The message failed; the text is ready to display.
    Failed(String),
    /// The worker accepts a new submit.
    Ready,
    Cleared,
    SpeechStarted,
    SpeechPlaying(PathBuf),
    SpeechFailed(String),
    Voices(Vec<SelectedVoice>),
    VoicesFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WorkerError {
    #[error("A message is already being processed")]
    Busy,
    #[error("The chat worker has stopped")]
    Closed,
}

/// Optional collaborators of the worker.
#[derive(Clone, Default)]
pub struct WorkerServices {
    pub speech: Option<VoiceReplyService>,
    pub registry: Option<Arc<dyn VoiceRegistry>>,
    pub voice: Option<SelectedVoice>,
    pub speech_enabled: bool,
}

/// Handle for submitting work. Dropping it stops the worker task.
pub struct ChatWorker {
    commands: UnboundedSender<WorkerCommand>,
    busy: Arc<AtomicBool>,
}

/// Receiving end of the event queue.
pub struct WorkerEvents {
    events: UnboundedReceiver<WorkerEvent>,
}

impl WorkerEvents {
    /// Takes every event queued so far without waiting.
    pub fn drain(&mut self) -> Vec<WorkerEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }

    /// Waits for the next event; `None` once the worker is gone.
    pub async fn recv(&mut self) -> Option<WorkerEvent> {
        self.events.recv().await
    }
}

impl ChatWorker {
    /// Starts the worker task on `handle`.
    pub fn spawn(
        session: ChatSession,
        services: WorkerServices,
        handle: &Handle,
    ) -> (Self, WorkerEvents) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let busy = Arc::new(AtomicBool::new(false));

        let state = WorkerState {
            session,
            services,
            events: event_tx,
            busy: busy.clone(),
        };
        handle.spawn(state.run(command_rx));

        (
            Self {
                commands: command_tx,
                busy,
            },
            WorkerEvents { events: event_rx },
        )
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Queues a message for routing. Fails with [`WorkerError::Busy`] while a
    /// previous message is still in flight.
    pub fn submit(&self, message: impl Into<String>) -> Result<(), WorkerError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(WorkerError::Busy);
        }

        if self
            .commands
            .send(WorkerCommand::Submit(message.into()))
            .is_err()
        {
            self.busy.store(false, Ordering::SeqCst);
            return Err(WorkerError::Closed);
        }
        Ok(())
    }

    /// Sends any non-submit command.
    pub fn send(&self, command: WorkerCommand) -> Result<(), WorkerError> {
        if let WorkerCommand::Submit(message) = command {
            return self.submit(message);
        }
        self.commands.send(command).map_err(|_| WorkerError::Closed)
    }
}

struct WorkerState {
    session: ChatSession,
    services: WorkerServices,
    events: UnboundedSender<WorkerEvent>,
    busy: Arc<AtomicBool>,
}

impl WorkerState {
    async fn run(mut self, mut commands: UnboundedReceiver<WorkerCommand>) {
        tracing::debug!("[Worker] Started");
        while let Some(command) = commands.recv().await {
            match command {
                WorkerCommand::Submit(message) => self.handle_submit(&message).await,
                WorkerCommand::Clear => {
                    self.session.clear();
                    self.emit(WorkerEvent::Cleared);
                }
                WorkerCommand::SetVoice(voice) => self.services.voice = voice,
                WorkerCommand::SetSpeechEnabled(enabled) => {
                    self.services.speech_enabled = enabled
                }
                WorkerCommand::SetPreferences(preferences) => {
                    self.session.set_preferences(preferences)
                }
                WorkerCommand::LoadVoices => self.load_voices(),
            }
        }
        tracing::debug!("[Worker] Command channel closed, stopping");
    }

    async fn handle_submit(&mut self, message: &str) {
        self.emit(WorkerEvent::Thinking);

        match self.session.send(message).await {
            Ok(reply) => {
                let speak = reply.is_humanized() && self.services.speech_enabled;
                let text = reply.reply.clone();
                self.emit(WorkerEvent::Reply(reply));
                if speak {
                    self.start_speech(text);
                }
            }
            Err(e) => {
                if !e.is_empty_input() {
                    tracing::error!("[Worker] Message failed: {}", e);
                }
                self.emit(WorkerEvent::Failed(e.user_message()));
            }
        }

        self.busy.store(false, Ordering::SeqCst);
        self.emit(WorkerEvent::Ready);
    }

    /// Speech runs in its own task so the next message is not held up by it.
    /// [`VoiceReplyService`] queues overlapping replies on its output file.
    fn start_speech(&self, text: String) {
        let (Some(speech), Some(voice)) = (&self.services.speech, &self.services.voice) else {
            return;
        };
        let speech = speech.clone();
        let voice = voice.clone();
        let events = self.events.clone();

        self.emit(WorkerEvent::SpeechStarted);
        tokio::spawn(async move {
            let event = match speech.speak(&text, &voice).await {
                Ok(path) => WorkerEvent::SpeechPlaying(path),
                Err(_) => WorkerEvent::SpeechFailed(SPEECH_FAILURE_MESSAGE.to_string()),
            };
            events.send(event).ok();
        });
    }

    fn load_voices(&self) {
        let Some(registry) = self.services.registry.clone() else {
            self.emit(WorkerEvent::VoicesFailed(
                "No voice registry is configured.".to_string(),
            ));
            return;
        };
        let events = self.events.clone();

        tokio::spawn(async move {
            let event = match registry.list_voices().await {
                Ok(voices) => WorkerEvent::Voices(voices),
                Err(e) => {
                    tracing::error!("[Worker] Loading voices failed: {}", e);
                    WorkerEvent::VoicesFailed(e.user_message())
                }
            };
            events.send(event).ok();
        });
    }

    fn emit(&self, event: WorkerEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("[Worker] Event receiver dropped");
        }
    }
}
