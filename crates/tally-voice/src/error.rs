use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("STT error: {0}")]
    Stt(String),

    #[error("transcript error: {0}")]
    Transcript(String),

    #[error("voice profile not found: {0}")]
    ProfileNotFound(String),
}
