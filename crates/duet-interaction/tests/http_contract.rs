//! HTTP contract tests for the endpoint clients.
//!
//! A local mock server stands in for each endpoint; the tests pin down request
//! shape, bearer auth, response parsing and error mapping.

use duet_core::DuetError;
use duet_core::conversation::{ChatBackend, ChatMessage};
use duet_core::voice::{SpeechSynthesizer, VoiceRegistry};
use duet_interaction::{
    OpenAiCompatibleChat, SiliconFlowVoiceRegistry, SpeechClient, VoiceUpload, VoiceUploader,
};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

// ─── Chat completions ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_chat_request_shape_and_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-analysis"))
        .and(body_partial_json(json!({
            "model": "deepseek-ai/DeepSeek-R1",
            "messages": [
                {"role": "system", "content": "analyze"},
                {"role": "user", "content": "why?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("because")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = OpenAiCompatibleChat::new(
        "analysis",
        format!("{}/v1", mock_server.uri()),
        "sk-analysis",
        "deepseek-ai/DeepSeek-R1",
    );
    let messages = vec![ChatMessage::system("analyze"), ChatMessage::user("why?")];

    let reply = backend.complete(&messages, 0.3).await.unwrap();
    assert_eq!(reply, "because");

    let requests = mock_server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    let temperature = body["temperature"].as_f64().unwrap();
    assert!((temperature - 0.3).abs() < 1e-6);
}

#[tokio::test]
async fn test_chat_trailing_slash_base_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("ok")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = OpenAiCompatibleChat::new(
        "reply",
        format!("{}/v1/", mock_server.uri()),
        "k",
        "gpt-4o",
    );
    let reply = backend.complete(&[ChatMessage::user("hi")], 0.7).await.unwrap();
    assert_eq!(reply, "ok");
}

#[tokio::test]
async fn test_chat_error_status_maps_to_remote_call() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&mock_server)
        .await;

    let backend =
        OpenAiCompatibleChat::new("reply", format!("{}/v1", mock_server.uri()), "bad", "gpt-4o");
    let err = backend
        .complete(&[ChatMessage::user("hi")], 0.7)
        .await
        .unwrap_err();

    match err {
        DuetError::RemoteCall {
            service,
            status,
            message,
        } => {
            assert_eq!(service, "reply");
            assert_eq!(status, Some(401));
            assert!(message.contains("Incorrect API key provided"));
        }
        other => panic!("expected RemoteCall, got {other:?}"),
    }
}

#[tokio::test]
async fn test_chat_empty_choices_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&mock_server)
        .await;

    let backend =
        OpenAiCompatibleChat::new("reply", format!("{}/v1", mock_server.uri()), "k", "gpt-4o");
    let err = backend
        .complete(&[ChatMessage::user("hi")], 0.7)
        .await
        .unwrap_err();
    assert!(err.is_remote());
}

#[tokio::test]
async fn test_chat_unreachable_server() {
    let backend = OpenAiCompatibleChat::new("analysis", "http://127.0.0.1:1/v1", "k", "m");
    let err = backend
        .complete(&[ChatMessage::user("hi")], 0.3)
        .await
        .unwrap_err();
    assert!(err.is_remote());
}

// ─── Voice registry ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_voice_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/audio/voice/list"))
        .and(header("authorization", "Bearer sk-voice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                {
                    "model": "FunAudioLLM/CosyVoice2-0.5B",
                    "customName": "narrator",
                    "text": "Once upon a time",
                    "uri": "speech:narrator:1"
                },
                {"customName": "bare", "uri": "speech:bare:2"}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let registry = SiliconFlowVoiceRegistry::new(format!("{}/v1", mock_server.uri()), "sk-voice");
    let voices = registry.list_voices().await.unwrap();

    assert_eq!(voices.len(), 2);
    assert_eq!(voices[0].display_name(), "narrator");
    assert_eq!(voices[0].sample_text, "Once upon a time");
    assert_eq!(voices[1].uri, "speech:bare:2");
    assert_eq!(voices[1].sample_preview(50), "No description");
}

#[tokio::test]
async fn test_voice_list_without_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/audio/voice/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let registry = SiliconFlowVoiceRegistry::new(format!("{}/v1", mock_server.uri()), "k");
    assert!(registry.list_voices().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_voice_list_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/audio/voice/list"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let registry = SiliconFlowVoiceRegistry::new(format!("{}/v1", mock_server.uri()), "k");
    let err = registry.list_voices().await.unwrap_err();
    assert!(matches!(err, DuetError::RemoteCall { status: Some(500), .. }));
}

// ─── Speech synthesis ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_speech_writes_audio_file() {
    let mock_server = MockServer::start().await;
    let audio = vec![0x49u8, 0x44, 0x33, 0x04, 0x00, 0x01, 0x02];

    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .and(header("authorization", "Bearer sk-analysis"))
        .and(body_partial_json(json!({
            "model": "FunAudioLLM/CosyVoice2-0.5B",
            "voice": "speech:narrator:1",
            "input": "Hello there",
            "response_format": "mp3"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(audio.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out/ai_reply.mp3");
    let client = SpeechClient::new(
        format!("{}/v1", mock_server.uri()),
        "sk-analysis",
        "FunAudioLLM/CosyVoice2-0.5B",
    );

    client
        .synthesize("Hello there", "speech:narrator:1", &output)
        .await
        .unwrap();

    assert_eq!(std::fs::read(&output).unwrap(), audio);
}

#[tokio::test]
async fn test_speech_empty_body_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("ai_reply.mp3");
    let client = SpeechClient::new(format!("{}/v1", mock_server.uri()), "k", "m");

    let err = client.synthesize("hi", "v", &output).await.unwrap_err();
    assert!(err.is_remote());
    assert!(!output.exists());
}

// ─── Voice upload ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_voice_upload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/uploads/audio/voice"))
        .and(header("authorization", "Bearer sk-upload"))
        .and(body_partial_json(json!({
            "model": "FunAudioLLM/CosyVoice2-0.5B",
            "customName": "me",
            "audio": "data:audio/wav;base64,YWJj",
            "text": "sample words"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"uri": "speech:me:new"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let sample = dir.path().join("sample.wav");
    std::fs::write(&sample, b"abc").unwrap();

    let upload = VoiceUpload::from_file(&sample, "FunAudioLLM/CosyVoice2-0.5B", "me", "sample words")
        .await
        .unwrap();
    let uploader = VoiceUploader::new(format!("{}/v1", mock_server.uri()), "sk-upload");
    let response = uploader.upload(&upload).await.unwrap();

    assert_eq!(response["uri"], "speech:me:new");
}

#[tokio::test]
async fn test_voice_upload_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = VoiceUpload::from_file(&dir.path().join("nope.mp3"), "m", "n", "t")
        .await
        .unwrap_err();
    assert!(matches!(err, DuetError::Io { .. }));
}
