//! Voice check-in infrastructure for the Tally platform.
//!
//! Provides STT (speech-to-text) transcription and TTS (text-to-speech)
//! rendering as bounded external subprocesses, the durable per-session
//! transcript recorder, and the scripted check-in agent session that ties
//! them together.
//!
//! The architecture separates concerns: audio arrives as PCM buffers from
//! the surrounding transport, human speech is transcribed to text for the
//! agent, agent replies are rendered to audio, and every utterance is
//! appended to the session transcript at the point it is produced.

pub mod agent;
pub mod config;
pub mod error;
pub mod stt;
pub mod transcript;
pub mod tts;

pub use agent::{CheckinSession, UtteranceEvent, CHECKIN_GREETING, CHECKIN_SYSTEM_PROMPT};
pub use config::VoiceConfig;
pub use error::VoiceError;
pub use stt::SttService;
pub use transcript::{session_transcript_path, TranscriptRecorder};
pub use tts::TtsService;
