//! Durable per-session transcript recording.
//!
//! The recorder is an explicitly constructed instance scoped to one
//! conversation session — no process-wide transcript state. Appends are
//! made directly at the point each utterance is produced.

use crate::error::VoiceError;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tally_types::{Speaker, TranscriptDocument, TranscriptEntry};

struct RecorderState {
    path: Option<PathBuf>,
    document: TranscriptDocument,
}

/// Append-only, deduplicated transcript log for one conversation session.
///
/// Entries are immutable once appended. The full document is rewritten to
/// the bound destination on every append so that a crash at any point
/// leaves a complete, valid JSON snapshot on disk. The O(n) rewrite per
/// entry is accepted for simplicity.
///
/// The recorder is called concurrently from audio callbacks and the agent
/// loop; the read-check-append-persist sequence is one critical section.
pub struct TranscriptRecorder {
    state: Mutex<RecorderState>,
}

impl TranscriptRecorder {
    /// Creates an unbound recorder. [`record`](Self::record) is a no-op
    /// until [`bind`](Self::bind) sets a destination.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RecorderState {
                path: None,
                document: TranscriptDocument::default(),
            }),
        }
    }

    /// Binds the recorder to its destination file and writes the initial
    /// empty snapshot.
    pub fn bind(&self, path: impl Into<PathBuf>) -> Result<(), VoiceError> {
        let path = path.into();
        let mut state = self.lock();

        write_snapshot(&path, &state.document)?;
        tracing::info!(path = %path.display(), "initialized transcript file");
        state.path = Some(path);
        Ok(())
    }

    /// Appends a speaker-attributed utterance and persists the snapshot.
    ///
    /// Returns `Ok(true)` when an entry was appended, `Ok(false)` when the
    /// call was a no-op: empty/whitespace-only text, an unbound recorder,
    /// or an exact `(speaker, text)` duplicate of a prior entry.
    ///
    /// On a persist failure the entry is kept in memory (the next
    /// successful append rewrites the complete log) and the error is
    /// returned.
    pub fn record(&self, speaker: Speaker, text: &str) -> Result<bool, VoiceError> {
        if text.trim().is_empty() {
            return Ok(false);
        }

        let mut state = self.lock();

        let Some(path) = state.path.clone() else {
            return Ok(false);
        };

        let duplicate = state
            .document
            .conversations
            .iter()
            .any(|entry| entry.speaker == speaker && entry.text == text);
        if duplicate {
            return Ok(false);
        }

        state.document.conversations.push(TranscriptEntry {
            timestamp: Utc::now(),
            speaker,
            text: text.to_string(),
        });

        write_snapshot(&path, &state.document)?;
        tracing::debug!(speaker = speaker.as_str(), text, "saved transcript entry");
        Ok(true)
    }

    /// A copy of the entries appended so far.
    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.lock().document.conversations.clone()
    }

    /// The transcript rendered as `Speaker: text` lines, ready for
    /// classification.
    pub fn as_dialogue(&self) -> String {
        self.lock()
            .document
            .conversations
            .iter()
            .map(|entry| format!("{}: {}", entry.speaker.as_str(), entry.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecorderState> {
        // A panic while holding the lock leaves only a shorter-than-real
        // in-memory log; refusing all further appends would lose more.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for TranscriptRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives the session transcript path from the participant identity and
/// session start time: `<dir>/transcript_<identity>_<YYYYMMDD_HHMMSS>.json`.
pub fn session_transcript_path(
    dir: impl AsRef<Path>,
    participant: &str,
    started_at: DateTime<Utc>,
) -> PathBuf {
    dir.as_ref().join(format!(
        "transcript_{}_{}.json",
        participant,
        started_at.format("%Y%m%d_%H%M%S")
    ))
}

fn write_snapshot(path: &Path, document: &TranscriptDocument) -> Result<(), VoiceError> {
    let json = serde_json::to_string_pretty(document)
        .map_err(|e| VoiceError::Transcript(format!("failed to serialize transcript: {}", e)))?;
    std::fs::write(path, json).map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "failed to persist transcript snapshot");
        VoiceError::Transcript(format!("failed to write transcript file: {}", e))
    })
}
