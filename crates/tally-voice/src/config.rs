use serde::{Deserialize, Serialize};

fn default_stt_binary() -> String {
    "whisper-cli".to_string()
}

fn default_stt_model() -> String {
    "models/ggml-base.en.bin".to_string()
}

fn default_tts_binary() -> String {
    "piper".to_string()
}

fn default_voices_dir() -> String {
    "assets/voices".to_string()
}

fn default_transcript_dir() -> String {
    "transcriptions".to_string()
}

/// Configuration for the voice subsystem.
///
/// All paths may be absolute or relative to the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Path to the STT binary (whisper.cpp-style CLI reading WAV on stdin).
    #[serde(default = "default_stt_binary")]
    pub stt_binary: String,

    /// Path to the STT model file.
    #[serde(default = "default_stt_model")]
    pub stt_model: String,

    /// Path to the TTS binary (piper-style CLI).
    #[serde(default = "default_tts_binary")]
    pub tts_binary: String,

    /// Directory holding TTS voice model files.
    #[serde(default = "default_voices_dir")]
    pub voices_dir: String,

    /// Directory where session transcripts are written.
    #[serde(default = "default_transcript_dir")]
    pub transcript_dir: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            stt_binary: default_stt_binary(),
            stt_model: default_stt_model(),
            tts_binary: default_tts_binary(),
            voices_dir: default_voices_dir(),
            transcript_dir: default_transcript_dir(),
        }
    }
}
