//! Voice profile configuration.
//!
//! A `VoiceProfile` maps a logical ID to a TTS engine and its parameters.

use serde::{Deserialize, Serialize};

/// Supported TTS engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceModel {
    /// Piper TTS (ONNX-based, fast, local).
    #[default]
    Piper,
    /// System TTS (OS-provided, espeak-ng fallback).
    System,
}

/// A voice profile configuration.
///
/// Defines how the check-in agent's voice sounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// Unique identifier for the voice profile.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// The underlying TTS engine.
    #[serde(default)]
    pub model: VoiceModel,
    /// Path to the model file (relative to the voices directory or absolute).
    pub model_path: String,
    /// Speech speed multiplier (1.0 is normal).
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Speaker ID within a multi-speaker model (0-indexed).
    #[serde(default)]
    pub speaker_id: Option<u32>,
}

fn default_speed() -> f32 {
    1.0
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            name: "Default Voice".to_string(),
            model: VoiceModel::Piper,
            model_path: "en_US-lessac-medium.onnx".to_string(),
            speed: 1.0,
            speaker_id: None,
        }
    }
}
