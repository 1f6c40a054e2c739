use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AiError;
use crate::GeminiCfg;

/// Free-text generation with a caller-supplied key.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, AiError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<PartIn<'a>>,
}

#[derive(Serialize)]
struct PartIn<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Deserialize)]
struct PartOut {
    text: Option<String>,
}

/// Keys travel in a header so they never appear in a logged URL.
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(cfg: &GeminiCfg) -> Result<Self, AiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.generation_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, AiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!(model = %self.model, "generateContent request");

        let body = GenerateRequest {
            contents: vec![Content { role: "user", parts: vec![PartIn { text: prompt }] }],
        };
        let resp = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AiError::Upstream { status: status.as_u16(), body });
        }

        let parsed: GenerateResponse = resp.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(text)
    }
}

/// What the summarizer needs to know about an article.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleBrief {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

pub fn summary_prompt(article: &ArticleBrief) -> String {
    format!(
        "You are an expert journalist. Based on the title, description, and any available content provided,
write a well-structured, detailed, and informative news article.

Create a full article with a proper introduction, body, and conclusion. Include analysis and context around the topic.
Make the content engaging, factual, and in a journalistic style.

Article should be at least 5-6 paragraphs to fully cover the topic. Avoid making up specific facts, quotes,
or statistics that aren't clearly implied by the provided information.

Title: {}
Description: {}
Content: {}
URL: {}
",
        article.title,
        article.description.as_deref().unwrap_or_default(),
        article.content.as_deref().unwrap_or_default(),
        article.url.as_deref().unwrap_or_default(),
    )
}

/// Expand an article into a full write-up. Gives up with `AiError::Timeout`
/// once `deadline` passes.
pub async fn summarize_article(
    generator: &dyn TextGenerator,
    api_key: &str,
    article: &ArticleBrief,
    deadline: Duration,
) -> Result<String, AiError> {
    let prompt = summary_prompt(article);
    tokio::time::timeout(deadline, generator.generate(api_key, &prompt))
        .await
        .map_err(|_| AiError::Timeout)?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_leaves_missing_fields_blank() {
        let brief = ArticleBrief { title: "Rust 2.0".into(), ..Default::default() };
        let prompt = summary_prompt(&brief);
        assert!(prompt.contains("Title: Rust 2.0\n"));
        assert!(prompt.contains("Description: \n"));
        assert!(prompt.contains("URL: \n"));
    }
}
