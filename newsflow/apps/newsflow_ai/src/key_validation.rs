use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::AiError;
use crate::gemini::TextGenerator;

/// Google API keys share this prefix.
const KEY_PREFIX: &str = "AIza";

const VALID_KEY_HINTS: [&str; 4] = ["safety", "blocked", "not available", "rate limit"];
const INVALID_KEY_HINTS: [&str; 5] = ["api key", "invalid", "authentication", "unauthorized", "unauthenticated"];

/// What to conclude when a well-formed key could not be checked live
/// (network trouble, unrecognised upstream error, deadline hit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyValidationPolicy {
    /// Accept the key; the user finds out on first real use.
    #[default]
    Lenient,
    /// Reject the key.
    Strict,
}

impl FromStr for KeyValidationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown key validation policy `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyVerdict {
    Valid,
    Invalid,
    /// Well-formed, unverified, accepted under `KeyValidationPolicy::Lenient`.
    AssumedValid,
}

impl KeyVerdict {
    pub fn is_usable(self) -> bool {
        !matches!(self, KeyVerdict::Invalid)
    }
}

pub async fn validate_key(
    generator: &dyn TextGenerator,
    key: &str,
    policy: KeyValidationPolicy,
    deadline: Duration,
) -> KeyVerdict {
    let key = key.trim();
    if key.is_empty() {
        return KeyVerdict::Invalid;
    }
    if !key.starts_with(KEY_PREFIX) {
        info!("key rejected: unexpected format");
        return KeyVerdict::Invalid;
    }

    let outcome = tokio::time::timeout(deadline, generator.generate(key, "Hello")).await;
    match outcome {
        Ok(Ok(_)) => KeyVerdict::Valid,
        Ok(Err(e)) => classify(&e, policy),
        Err(_) => {
            warn!("key validation timed out");
            unverified(policy)
        }
    }
}

fn classify(err: &AiError, policy: KeyValidationPolicy) -> KeyVerdict {
    let text = err.to_string().to_ascii_lowercase();
    if VALID_KEY_HINTS.iter().any(|h| text.contains(h)) {
        // the model refused the content, which only happens after the key was accepted
        return KeyVerdict::Valid;
    }
    if INVALID_KEY_HINTS.iter().any(|h| text.contains(h)) {
        info!(error = %err, "key rejected by upstream");
        return KeyVerdict::Invalid;
    }
    warn!(error = %err, "key validation inconclusive");
    unverified(policy)
}

fn unverified(policy: KeyValidationPolicy) -> KeyVerdict {
    match policy {
        KeyValidationPolicy::Lenient => KeyVerdict::AssumedValid,
        KeyValidationPolicy::Strict => KeyVerdict::Invalid,
    }
}
