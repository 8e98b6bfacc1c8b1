//! Transcript classification.
//!
//! Turns a free-form conversation transcript into a structured
//! [`TaskExtractionResult`] via a single language-model call.

use crate::error::ExtractError;
use crate::extract::extract_json_payload;
use crate::llm::LanguageModel;
use std::sync::Arc;
use tally_types::TaskExtractionResult;

/// Instruction prefix sent with every classification call. The transcript
/// is appended verbatim after it.
const CLASSIFY_INSTRUCTIONS: &str = "\
You review a workplace check-in conversation between an employee and a \
progress-tracking assistant. Extract the employee's task updates.

Respond with ONLY a JSON object inside a fenced code block, with exactly \
these keys:

```json
{
  \"completed_tasks\": [\"short title of each task the employee finished\"],
  \"new_tasks\": [{\"title\": \"short title\", \"description\": \"one sentence\"}]
}
```

Use empty arrays when the transcript mentions nothing of that kind. Do not \
include any text outside the fenced block.

Transcript:
";

/// Classifies transcripts into completed-task and new-task sets.
///
/// Holds the language model behind a trait object so tests inject scripted
/// fakes. One external call per [`classify`](Self::classify) invocation;
/// every failure degrades to the empty result and is logged here, at the
/// point of occurrence — callers never see an error.
#[derive(Clone)]
pub struct TranscriptClassifier {
    llm: Arc<dyn LanguageModel>,
}

impl TranscriptClassifier {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Builds the full prompt for a transcript.
    fn build_prompt(transcript: &str) -> String {
        format!("{CLASSIFY_INSTRUCTIONS}{transcript}")
    }

    /// Extracts task updates from `transcript`.
    ///
    /// Returns the empty result when the model call fails, times out, or
    /// its reply cannot be parsed. An empty transcript classification is
    /// therefore indistinguishable from a failed one at the type level;
    /// the warning log is the operational signal.
    pub async fn classify(&self, transcript: &str) -> TaskExtractionResult {
        let prompt = Self::build_prompt(transcript);

        let response = match self.llm.complete(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "language model call failed, returning empty extraction");
                return TaskExtractionResult::default();
            }
        };

        match parse_extraction(&response) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "could not parse model reply, returning empty extraction");
                TaskExtractionResult::default()
            }
        }
    }
}

/// Parses a model reply: direct JSON first, embedded-payload search second.
fn parse_extraction(response: &str) -> Result<TaskExtractionResult, ExtractError> {
    let trimmed = response.trim();
    if let Ok(result) = serde_json::from_str::<TaskExtractionResult>(trimmed) {
        return Ok(result);
    }

    let value = extract_json_payload(response)?;
    serde_json::from_value(value.clone()).map_err(|source| ExtractError::MalformedJson {
        snippet: value.to_string(),
        source,
    })
}
