use http::StatusCode;
use thiserror::Error;

/// Why a single fetch did not produce a payload. Consumed by the state
/// holder instead of escaping as an unobserved task failure.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error, status: {}", .0.as_u16())]
    Status(StatusCode),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unable to decode {endpoint} response: {source}. Body was: \"{body}\"")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

impl FetchError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Status(code) => Some(*code),
            FetchError::Transport(e) => e.status(),
            FetchError::Decode { .. } => None,
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
