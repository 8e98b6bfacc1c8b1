use std::sync::Arc;
use tally_types::voice::{VoiceModel, VoiceProfile};
use tally_types::Speaker;
use tally_voice::{CheckinSession, SttService, TtsService, CHECKIN_GREETING};
use tempfile::tempdir;

fn missing_binary_services(voices_dir: &std::path::Path) -> (Arc<SttService>, Arc<TtsService>) {
    let stt = Arc::new(SttService::new(
        "/nonexistent/model.bin",
        "/nonexistent/whisper-cli",
    ));
    let tts = Arc::new(TtsService::new(voices_dir, "/nonexistent/piper"));
    (stt, tts)
}

async fn session_with_broken_engines(dir: &std::path::Path) -> CheckinSession {
    let (stt, tts) = missing_binary_services(dir);
    // A piper profile whose model file does not exist: synthesis fails
    // deterministically without touching any real binary.
    tts.add_profile(VoiceProfile {
        id: "test".to_string(),
        name: "Test".to_string(),
        model: VoiceModel::Piper,
        model_path: "missing.onnx".to_string(),
        speed: 1.0,
        speaker_id: None,
    })
    .await;

    CheckinSession::start("kai", dir.join("transcripts"), stt, tts, "test")
        .expect("session should start")
}

#[tokio::test]
async fn session_start_creates_a_bound_transcript_file() {
    let dir = tempdir().unwrap();
    let session = session_with_broken_engines(dir.path()).await;

    assert!(session.transcript_path().exists());
    let name = session
        .transcript_path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .to_string();
    assert!(name.starts_with("transcript_kai_"));
    assert!(name.ends_with(".json"));
}

#[tokio::test]
async fn greeting_is_recorded_even_when_synthesis_fails() {
    let dir = tempdir().unwrap();
    let session = session_with_broken_engines(dir.path()).await;

    let result = session.greet().await;
    assert!(result.is_err(), "synthesis should fail with a missing model");

    // The utterance is part of the conversation regardless.
    assert_eq!(session.transcript_text(), format!("Bot: {CHECKIN_GREETING}"));
}

#[tokio::test]
async fn failed_transcription_records_nothing() {
    let dir = tempdir().unwrap();
    let session = session_with_broken_engines(dir.path()).await;

    let result = session.hear(b"pcm bytes").await;
    assert!(result.is_err(), "missing STT binary should error");
    assert!(session.transcript_text().is_empty());
}

#[tokio::test]
async fn utterance_events_reach_subscribers_once() {
    let dir = tempdir().unwrap();
    let session = session_with_broken_engines(dir.path()).await;
    let mut events = session.subscribe_utterances();

    let _ = session.say("Thank you for your time").await;
    // A repeated utterance is deduplicated and must not re-broadcast.
    let _ = session.say("Thank you for your time").await;

    let event = events.try_recv().expect("one event should be queued");
    assert_eq!(event.speaker, Speaker::Bot);
    assert_eq!(event.text, "Thank you for your time");
    assert!(events.try_recv().is_err(), "no second event expected");
}
