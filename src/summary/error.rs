//! Error types for commit message generation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("API key not found in environment variable {var}")]
    MissingApiKey { var: String },

    #[error("Nothing to summarize: no changes have been recorded")]
    NothingToSummarize,

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

pub type SummaryResult<T> = Result<T, SummaryError>;
