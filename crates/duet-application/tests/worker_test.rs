//! Integration tests for the background chat worker.

use async_trait::async_trait;
use duet_application::{
    ChatSession, ChatWorker, ConversationRouter, SPEECH_FAILURE_MESSAGE, VoiceReplyService,
    WorkerCommand, WorkerError, WorkerEvent, WorkerEvents, WorkerServices,
};
use duet_core::conversation::{ChatBackend, ChatMessage, RouteMode};
use duet_core::user::UserPreferences;
use duet_core::voice::{AudioPlayer, SelectedVoice, SpeechSynthesizer, VoiceRegistry};
use duet_core::{DuetError, EMPTY_INPUT_MESSAGE, REMOTE_FAILURE_MESSAGE, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;

/// Answers with a fixed prefix plus the last user turn, optionally after a gate opens.
struct EchoBackend {
    prefix: &'static str,
    gate: Option<Arc<Notify>>,
    fail: bool,
}

#[async_trait]
impl ChatBackend for EchoBackend {
    fn name(&self) -> &str {
        self.prefix
    }

    async fn complete(&self, messages: &[ChatMessage], _temperature: f32) -> Result<String> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            return Err(DuetError::remote(self.prefix, "boom"));
        }
        let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        Ok(format!("{}:{}", self.prefix, last))
    }
}

fn echo(prefix: &'static str) -> Arc<EchoBackend> {
    Arc::new(EchoBackend {
        prefix,
        gate: None,
        fail: false,
    })
}

fn session(analysis: Arc<EchoBackend>, reply: Arc<EchoBackend>) -> ChatSession {
    ChatSession::new(
        ConversationRouter::new(analysis, reply),
        UserPreferences::unset(),
    )
}

async fn next_event(events: &mut WorkerEvents) -> WorkerEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for worker event")
        .expect("worker stopped")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_events_arrive_in_order() {
    let (worker, mut events) = ChatWorker::spawn(
        session(echo("a"), echo("b")),
        WorkerServices::default(),
        &Handle::current(),
    );

    worker.submit("！hello").unwrap();

    assert_eq!(next_event(&mut events).await, WorkerEvent::Thinking);
    match next_event(&mut events).await {
        WorkerEvent::Reply(reply) => {
            assert_eq!(reply.mode, RouteMode::Direct);
            assert_eq!(reply.reply, "b:hello");
        }
        other => panic!("expected Reply, got {other:?}"),
    }
    assert_eq!(next_event(&mut events).await, WorkerEvent::Ready);
    assert!(!worker.is_busy());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_submit_while_busy_is_rejected() {
    let gate = Arc::new(Notify::new());
    let slow = Arc::new(EchoBackend {
        prefix: "b",
        gate: Some(gate.clone()),
        fail: false,
    });
    let (worker, mut events) = ChatWorker::spawn(
        session(echo("a"), slow),
        WorkerServices::default(),
        &Handle::current(),
    );

    worker.submit("！first").unwrap();
    assert!(worker.is_busy());
    assert_eq!(worker.submit("！second"), Err(WorkerError::Busy));

    assert_eq!(next_event(&mut events).await, WorkerEvent::Thinking);
    gate.notify_one();
    assert!(matches!(next_event(&mut events).await, WorkerEvent::Reply(_)));
    assert_eq!(next_event(&mut events).await, WorkerEvent::Ready);

    // Accepted again once Ready has been observed.
    worker.submit("！third").unwrap();
    gate.notify_one();
    assert_eq!(next_event(&mut events).await, WorkerEvent::Thinking);
    match next_event(&mut events).await {
        WorkerEvent::Reply(reply) => assert_eq!(reply.reply, "b:third"),
        other => panic!("expected Reply, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failures_become_user_messages() {
    let failing = Arc::new(EchoBackend {
        prefix: "a",
        gate: None,
        fail: true,
    });
    let (worker, mut events) = ChatWorker::spawn(
        session(failing, echo("b")),
        WorkerServices::default(),
        &Handle::current(),
    );

    worker.submit("#").unwrap();
    assert_eq!(next_event(&mut events).await, WorkerEvent::Thinking);
    assert_eq!(
        next_event(&mut events).await,
        WorkerEvent::Failed(EMPTY_INPUT_MESSAGE.to_string())
    );
    assert_eq!(next_event(&mut events).await, WorkerEvent::Ready);

    worker.submit("#real question").unwrap();
    assert_eq!(next_event(&mut events).await, WorkerEvent::Thinking);
    assert_eq!(
        next_event(&mut events).await,
        WorkerEvent::Failed(REMOTE_FAILURE_MESSAGE.to_string())
    );
    assert_eq!(next_event(&mut events).await, WorkerEvent::Ready);
}

/// Replies with the system instruction it was sent.
struct PromptBackend;

#[async_trait]
impl ChatBackend for PromptBackend {
    fn name(&self) -> &str {
        "prompt"
    }

    async fn complete(&self, messages: &[ChatMessage], _temperature: f32) -> Result<String> {
        Ok(messages[0].content.clone())
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_preferences_applies_to_next_message() {
    let session = ChatSession::new(
        ConversationRouter::new(echo("a"), Arc::new(PromptBackend)),
        UserPreferences::unset(),
    );
    let (worker, mut events) =
        ChatWorker::spawn(session, WorkerServices::default(), &Handle::current());

    worker
        .send(WorkerCommand::SetPreferences(UserPreferences::from_answers(
            "", "Captain", "", "",
        )))
        .unwrap();
    worker.submit("！hi").unwrap();

    assert_eq!(next_event(&mut events).await, WorkerEvent::Thinking);
    match next_event(&mut events).await {
        WorkerEvent::Reply(reply) => {
            assert!(reply.reply.contains("Please address the user as \"Captain\""))
        }
        other => panic!("expected Reply, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_clear_is_acknowledged() {
    let (worker, mut events) = ChatWorker::spawn(
        session(echo("a"), echo("b")),
        WorkerServices::default(),
        &Handle::current(),
    );

    worker.send(WorkerCommand::Clear).unwrap();
    assert_eq!(next_event(&mut events).await, WorkerEvent::Cleared);
}

struct FixedRegistry;

#[async_trait]
impl VoiceRegistry for FixedRegistry {
    async fn list_voices(&self) -> Result<Vec<SelectedVoice>> {
        Ok(vec![voice()])
    }
}

struct FailingSynthesizer;

#[async_trait]
impl SpeechSynthesizer for FailingSynthesizer {
    async fn synthesize(&self, _text: &str, _voice_uri: &str, _output: &Path) -> Result<()> {
        Err(DuetError::remote("speech", "no quota"))
    }
}

#[derive(Default)]
struct SilentPlayer {
    played: Mutex<Vec<PathBuf>>,
}

impl AudioPlayer for SilentPlayer {
    fn play(&self, path: &Path) -> Result<()> {
        self.played.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

fn voice() -> SelectedVoice {
    SelectedVoice {
        uri: "speech:narrator:1".to_string(),
        name: "narrator".to_string(),
        sample_text: "sample".to_string(),
        model: None,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_load_voices() {
    let services = WorkerServices {
        registry: Some(Arc::new(FixedRegistry)),
        ..WorkerServices::default()
    };
    let (worker, mut events) =
        ChatWorker::spawn(session(echo("a"), echo("b")), services, &Handle::current());

    worker.send(WorkerCommand::LoadVoices).unwrap();
    assert_eq!(next_event(&mut events).await, WorkerEvent::Voices(vec![voice()]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_speech_failure_keeps_text_reply() {
    let player = Arc::new(SilentPlayer::default());
    let services = WorkerServices {
        speech: Some(VoiceReplyService::new(
            Arc::new(FailingSynthesizer),
            player.clone(),
            PathBuf::from("unused.mp3"),
        )),
        registry: None,
        voice: Some(voice()),
        speech_enabled: true,
    };
    let (worker, mut events) =
        ChatWorker::spawn(session(echo("a"), echo("b")), services, &Handle::current());

    worker.submit("！hi").unwrap();

    let mut seen = Vec::new();
    while !seen.iter().any(|e| matches!(e, WorkerEvent::SpeechFailed(_)))
        || !seen.contains(&WorkerEvent::Ready)
    {
        seen.push(next_event(&mut events).await);
    }

    assert_eq!(seen[0], WorkerEvent::Thinking);
    assert!(matches!(&seen[1], WorkerEvent::Reply(r) if r.reply == "b:hi"));
    assert_eq!(seen[2], WorkerEvent::SpeechStarted);
    assert!(seen.contains(&WorkerEvent::SpeechFailed(
        SPEECH_FAILURE_MESSAGE.to_string()
    )));
    assert!(player.played.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_analysis_only_is_never_spoken() {
    let player = Arc::new(SilentPlayer::default());
    let services = WorkerServices {
        speech: Some(VoiceReplyService::new(
            Arc::new(FailingSynthesizer),
            player,
            PathBuf::from("unused.mp3"),
        )),
        registry: None,
        voice: Some(voice()),
        speech_enabled: true,
    };
    let (worker, mut events) =
        ChatWorker::spawn(session(echo("a"), echo("b")), services, &Handle::current());

    worker.submit("#think").unwrap();
    assert_eq!(next_event(&mut events).await, WorkerEvent::Thinking);
    assert!(matches!(next_event(&mut events).await, WorkerEvent::Reply(_)));
    assert_eq!(next_event(&mut events).await, WorkerEvent::Ready);
    assert!(events.drain().is_empty());
}

/// Holds every synthesis until released and records how many overlap.
#[derive(Default)]
struct GatedSynthesizer {
    release: Notify,
    started: AtomicUsize,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

#[async_trait]
impl SpeechSynthesizer for GatedSynthesizer {
    async fn synthesize(&self, _text: &str, _voice_uri: &str, _output: &Path) -> Result<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(running, Ordering::SeqCst);
        self.release.notified().await;
        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

async fn wait_for(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition never held");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_replies_are_spoken_one_at_a_time() {
    let synthesizer = Arc::new(GatedSynthesizer::default());
    let player = Arc::new(SilentPlayer::default());
    let services = WorkerServices {
        speech: Some(VoiceReplyService::new(
            synthesizer.clone(),
            player.clone(),
            PathBuf::from("reply.mp3"),
        )),
        registry: None,
        voice: Some(voice()),
        speech_enabled: true,
    };
    let (worker, mut events) =
        ChatWorker::spawn(session(echo("a"), echo("b")), services, &Handle::current());

    // Ready comes before speech finishes, so the second reply arrives while
    // the first is still being synthesized.
    for message in ["！one", "！two"] {
        worker.submit(message).unwrap();
        assert_eq!(next_event(&mut events).await, WorkerEvent::Thinking);
        assert!(matches!(next_event(&mut events).await, WorkerEvent::Reply(_)));
        assert_eq!(next_event(&mut events).await, WorkerEvent::SpeechStarted);
        assert_eq!(next_event(&mut events).await, WorkerEvent::Ready);
    }

    wait_for(|| synthesizer.started.load(Ordering::SeqCst) == 1).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(synthesizer.started.load(Ordering::SeqCst), 1);

    synthesizer.release.notify_one();
    assert_eq!(
        next_event(&mut events).await,
        WorkerEvent::SpeechPlaying(PathBuf::from("reply.mp3"))
    );

    wait_for(|| synthesizer.started.load(Ordering::SeqCst) == 2).await;
    synthesizer.release.notify_one();
    assert_eq!(
        next_event(&mut events).await,
        WorkerEvent::SpeechPlaying(PathBuf::from("reply.mp3"))
    );

    assert_eq!(synthesizer.max_running.load(Ordering::SeqCst), 1);
    assert_eq!(player.played.lock().unwrap().len(), 2);
}
