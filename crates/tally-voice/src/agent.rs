//! The scripted check-in agent session.
//!
//! Wires STT, TTS, and the transcript recorder into one conversation:
//! audio comes in, transcribed user speech and synthesized agent replies
//! go out, and every utterance lands in the transcript at the moment it
//! is produced.

use crate::error::VoiceError;
use crate::stt::SttService;
use crate::transcript::{session_transcript_path, TranscriptRecorder};
use crate::tts::TtsService;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tally_types::Speaker;
use tokio::sync::broadcast;

/// Capacity of the per-session utterance broadcast channel.
const UTTERANCE_BROADCAST_CAPACITY: usize = 256;

/// Conversation steering for the language model driving the agent.
pub const CHECKIN_SYSTEM_PROMPT: &str = "You are a bot that tracks an employee's daily progress. \
     Provide short, concise responses and avoid unpronounceable punctuation. \
     The user provides only voice input, so don't expect text. \
     End the conversation with 'Thank you for your time'.";

/// Fixed opening line, spoken and recorded at session start.
pub const CHECKIN_GREETING: &str =
    "Hey, ready to tell me your completed tasks and your new tasks?";

/// Event emitted whenever a new utterance enters the transcript.
#[derive(Debug, Clone)]
pub struct UtteranceEvent {
    pub speaker: Speaker,
    pub text: String,
}

/// One live check-in conversation.
///
/// Owns the session transcript recorder; shares the STT/TTS services with
/// the rest of the process. All entry points may be called concurrently —
/// the recorder serializes transcript mutation internally.
pub struct CheckinSession {
    participant: String,
    transcript_path: PathBuf,
    recorder: Arc<TranscriptRecorder>,
    stt: Arc<SttService>,
    tts: Arc<TtsService>,
    voice_profile_id: String,
    utterance_tx: broadcast::Sender<UtteranceEvent>,
}

impl CheckinSession {
    /// Starts a session for `participant`: creates the transcript
    /// directory if needed, derives the transcript path from the identity
    /// and start time, and binds a fresh recorder to it.
    pub fn start(
        participant: &str,
        transcript_dir: impl AsRef<Path>,
        stt: Arc<SttService>,
        tts: Arc<TtsService>,
        voice_profile_id: &str,
    ) -> Result<Self, VoiceError> {
        let dir = transcript_dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| {
            VoiceError::Transcript(format!("failed to create transcript directory: {}", e))
        })?;

        let transcript_path = session_transcript_path(dir, participant, chrono::Utc::now());
        let recorder = Arc::new(TranscriptRecorder::new());
        recorder.bind(&transcript_path)?;

        tracing::info!(
            participant,
            path = %transcript_path.display(),
            "started check-in session"
        );

        let (utterance_tx, _) = broadcast::channel(UTTERANCE_BROADCAST_CAPACITY);

        Ok(Self {
            participant: participant.to_string(),
            transcript_path,
            recorder,
            stt,
            tts,
            voice_profile_id: voice_profile_id.to_string(),
            utterance_tx,
        })
    }

    /// Speaks and records the fixed session greeting.
    pub async fn greet(&self) -> Result<Vec<u8>, VoiceError> {
        self.say(CHECKIN_GREETING).await
    }

    /// Transcribes one audio buffer from the participant.
    ///
    /// Returns the recognized text if it produced a new transcript entry;
    /// `None` when recognition yielded nothing new (silence, or an exact
    /// repeat of an earlier utterance).
    pub async fn hear(&self, audio: &[u8]) -> Result<Option<String>, VoiceError> {
        let text = self.stt.transcribe(audio).await?;

        if self.record_and_broadcast(Speaker::User, &text)? {
            Ok(Some(text))
        } else {
            Ok(None)
        }
    }

    /// Records an agent reply and synthesizes it to audio.
    ///
    /// The utterance is recorded before synthesis: it is part of the
    /// conversation even when rendering to audio fails.
    pub async fn say(&self, text: &str) -> Result<Vec<u8>, VoiceError> {
        self.record_and_broadcast(Speaker::Bot, text)?;
        self.tts.synthesize(text, &self.voice_profile_id).await
    }

    /// Subscribes to utterance events from this session.
    pub fn subscribe_utterances(&self) -> broadcast::Receiver<UtteranceEvent> {
        self.utterance_tx.subscribe()
    }

    /// The transcript so far as `Speaker: text` lines, ready to hand to
    /// the transcript classifier.
    pub fn transcript_text(&self) -> String {
        self.recorder.as_dialogue()
    }

    /// The session's transcript file.
    pub fn transcript_path(&self) -> &Path {
        &self.transcript_path
    }

    pub fn participant(&self) -> &str {
        &self.participant
    }

    /// The session recorder, for callers that append from their own
    /// callbacks (e.g. a transport-level interim-result handler).
    pub fn recorder(&self) -> Arc<TranscriptRecorder> {
        self.recorder.clone()
    }

    fn record_and_broadcast(&self, speaker: Speaker, text: &str) -> Result<bool, VoiceError> {
        let appended = self.recorder.record(speaker, text)?;
        if appended {
            // No receivers is fine; the event stream is best-effort.
            let _ = self.utterance_tx.send(UtteranceEvent {
                speaker,
                text: text.to_string(),
            });
        }
        Ok(appended)
    }
}
