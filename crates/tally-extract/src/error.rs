use thiserror::Error;

/// Errors from locating and parsing an embedded JSON payload.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The text contains no fenced block and no `{...}` span at all.
    #[error("no JSON content found in response")]
    NoJsonContent,

    /// A candidate payload was found but is not valid JSON. Carries a
    /// truncated copy of the offending text for diagnostics.
    #[error("malformed JSON payload ({source}): {snippet}")]
    MalformedJson {
        /// The candidate text that failed to parse, truncated.
        snippet: String,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from the language-model call itself.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The HTTP request failed (connect error, timeout, TLS, ...).
    #[error("language model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("language model returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The response decoded but carried no completion text.
    #[error("language model response contained no completion content")]
    MissingContent,
}
