//! Shared types and constants for the Tally platform.
//!
//! This crate provides the foundational types used across all Tally crates:
//! task status codes, transcript entries and the persisted transcript
//! document shape, the task extraction result produced by the classifier,
//! and voice profile configuration.
//!
//! No crate in the workspace depends on anything *except* `tally-types` for
//! cross-cutting type definitions. This keeps the dependency graph clean and
//! prevents circular dependencies.

pub mod voice;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a task.
///
/// Stored in the database as the screaming-snake string form (`TODO`,
/// `IN_PROGRESS`, `COMPLETED`), which is also the wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not started.
    Todo,
    /// Work has begun.
    InProgress,
    /// Finished. A completed task is never reverted by reconciliation.
    Completed,
}

impl TaskStatus {
    /// Returns the canonical string form used in the database and API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }

    /// Parses the canonical string form.
    ///
    /// Returns `None` for unrecognized strings.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TODO" => Some(Self::Todo),
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who produced a transcript utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    /// The human participant.
    User,
    /// The check-in agent.
    Bot,
}

impl Speaker {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Bot => "Bot",
        }
    }
}

/// One speaker-attributed utterance in a conversation session.
///
/// Entries are immutable once appended to a transcript log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// When the utterance was recorded (UTC, serialized as ISO-8601).
    pub timestamp: DateTime<Utc>,
    /// Who said it.
    pub speaker: Speaker,
    /// What was said.
    pub text: String,
}

/// The persisted transcript document.
///
/// Serialized shape: `{"conversations": [{"timestamp": ..., "speaker":
/// "User"|"Bot", "text": ...}, ...]}`. The recorder rewrites the whole
/// document on every append so a crash always leaves a valid snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptDocument {
    pub conversations: Vec<TranscriptEntry>,
}

/// A task the classifier believes the user is planning to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    /// Short title; the reconciliation matching key.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// Structured output of one transcript classification call.
///
/// Transient: produced per call, consumed by the reconciler. An empty
/// result is also the degrade-to-empty value returned when extraction
/// fails — callers cannot distinguish the two (log output can).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskExtractionResult {
    /// Titles of tasks the user reported finishing.
    #[serde(default)]
    pub completed_tasks: Vec<String>,
    /// Tasks the user reported picking up next.
    #[serde(default)]
    pub new_tasks: Vec<NewTask>,
}

impl TaskExtractionResult {
    /// True when the classifier found nothing actionable (or degraded).
    pub fn is_empty(&self) -> bool {
        self.completed_tasks.is_empty() && self.new_tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_status_round_trips_through_strings() {
        for status in [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Completed] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("DONE"), None);
    }

    #[test]
    fn task_status_serde_uses_screaming_snake() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        let back: TaskStatus = serde_json::from_str("\"COMPLETED\"").unwrap();
        assert_eq!(back, TaskStatus::Completed);
    }

    #[test]
    fn transcript_document_wire_shape() {
        let doc = TranscriptDocument {
            conversations: vec![TranscriptEntry {
                timestamp: "2025-03-01T09:30:00Z".parse().unwrap(),
                speaker: Speaker::Bot,
                text: "Hey, ready to tell me your completed tasks?".to_string(),
            }],
        };

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["conversations"][0]["speaker"], "Bot");
        assert!(value["conversations"][0]["timestamp"]
            .as_str()
            .unwrap()
            .starts_with("2025-03-01T09:30:00"));
    }

    #[test]
    fn extraction_result_tolerates_missing_keys() {
        let result: TaskExtractionResult = serde_json::from_str("{}").unwrap();
        assert!(result.is_empty());

        let result: TaskExtractionResult =
            serde_json::from_str(r#"{"completed_tasks": ["login page"]}"#).unwrap();
        assert_eq!(result.completed_tasks, vec!["login page"]);
        assert!(result.new_tasks.is_empty());
    }

    #[test]
    fn new_task_description_defaults_to_empty() {
        let task: NewTask = serde_json::from_str(r#"{"title": "write tests"}"#).unwrap();
        assert_eq!(task.title, "write tests");
        assert_eq!(task.description, "");
    }
}
