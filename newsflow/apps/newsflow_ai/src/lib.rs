//! Outbound integrations: the news-listing API, the generative-AI API, and
//! the personalized feed built on top of them.

pub mod article;
pub mod category;
pub mod error;
pub mod gemini;
pub mod key_validation;
pub mod news_api;
pub mod personalize;

use std::time::Duration;

pub use article::Article;
pub use category::Category;
pub use error::{AiError, PersonalizeError};
pub use gemini::{summarize_article, ArticleBrief, GeminiClient, TextGenerator};
pub use key_validation::{validate_key, KeyValidationPolicy, KeyVerdict};
pub use news_api::{ArticleSource, NewsApiClient};
pub use personalize::fetch_personalized;

#[derive(Clone, Debug)]
pub struct NewsCfg {
    pub api_key: String,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl NewsCfg {
    pub fn from_env() -> Self {
        let api_key = std::env::var("NEWS_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            tracing::warn!("NEWS_API_KEY not set; news listing calls will be rejected upstream");
        }
        Self {
            api_key,
            base_url: std::env::var("NEWS_API_URL").unwrap_or("https://newsapi.org/v2".into()),
            request_timeout_secs: env_secs("NEWS_TIMEOUT_SECS", 10),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GeminiCfg {
    pub base_url: String,
    pub model: String,
    /// Deadline for article generation (default 60s).
    pub generation_timeout_secs: u64,
    /// Deadline for the live key check (default 15s).
    pub validation_timeout_secs: u64,
    pub validation_policy: KeyValidationPolicy,
}

impl GeminiCfg {
    pub fn from_env() -> Self {
        let validation_policy = match std::env::var("KEY_VALIDATION_POLICY") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{e}, falling back to lenient");
                KeyValidationPolicy::Lenient
            }),
            Err(_) => KeyValidationPolicy::Lenient,
        };
        Self {
            base_url: std::env::var("GEMINI_API_URL")
                .unwrap_or("https://generativelanguage.googleapis.com/v1beta".into()),
            model: std::env::var("GEMINI_MODEL").unwrap_or("gemini-1.5-pro".into()),
            generation_timeout_secs: env_secs("GENERATION_TIMEOUT_SECS", 60),
            validation_timeout_secs: env_secs("KEY_VALIDATION_TIMEOUT_SECS", 15),
            validation_policy,
        }
    }

    pub fn generation_deadline(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn validation_deadline(&self) -> Duration {
        Duration::from_secs(self.validation_timeout_secs)
    }
}

fn env_secs(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
