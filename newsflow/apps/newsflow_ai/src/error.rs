use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("network error: {0}")]
    Network(reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("upstream call exceeded its deadline")]
    Timeout,
    #[error("upstream response carried no text")]
    EmptyResponse,
}

impl From<reqwest::Error> for AiError {
    /// The request URL is dropped; it may carry credentials.
    fn from(e: reqwest::Error) -> Self {
        AiError::Network(e.without_url())
    }
}

/// Conditions that keep a personalized feed from being assembled at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PersonalizeError {
    #[error("Gemini API key not found. Please set it in your profile.")]
    MissingApiKey,
    #[error("No interests found")]
    NoInterests,
}
