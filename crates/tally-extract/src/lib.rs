//! Transcript-to-task extraction for the Tally platform.
//!
//! This crate owns the pipeline between raw conversation text and a
//! structured task delta:
//!
//! 1. [`extract_json_payload`] locates a JSON object embedded in model
//!    output, tolerating markdown fencing and surrounding prose.
//! 2. [`TranscriptClassifier`] sends a transcript to a language model with
//!    a fixed instruction prompt and parses the reply into a
//!    [`tally_types::TaskExtractionResult`].
//! 3. The [`LanguageModel`] trait keeps the model call behind a seam so
//!    tests substitute scripted fakes; [`OpenAiCompatClient`] is the
//!    production implementation.
//!
//! The classifier deliberately degrades to an empty result on any failure
//! (transport, timeout, unparseable reply). Failures are logged where they
//! occur; callers always receive a well-typed result.

mod classify;
mod error;
mod extract;
mod llm;

pub use classify::TranscriptClassifier;
pub use error::{ExtractError, LlmError};
pub use extract::extract_json_payload;
pub use llm::{LanguageModel, LlmConfig, OpenAiCompatClient};
