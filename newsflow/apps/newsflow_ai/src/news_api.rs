use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::article::Article;
use crate::error::AiError;
use crate::NewsCfg;

/// Where articles come from. The listing API in production, fakes in tests.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// First page of top headlines for one category.
    async fn top_headlines(&self, category: &str, page_size: u32) -> Result<Vec<Article>, AiError>;

    /// Free-text search, most relevant first.
    async fn search(&self, query: &str, page_size: u32) -> Result<Vec<Article>, AiError>;
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(default)]
    articles: Option<Vec<Article>>,
}

#[derive(Clone)]
pub struct NewsApiClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    pub fn new(cfg: &NewsCfg) -> Result<Self, AiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        })
    }

    async fn listing(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Vec<Article>, AiError> {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!(%url, "news listing request");

        let resp = self
            .http
            .get(&url)
            .header("X-Api-Key", self.api_key.as_str())
            .query(&[("language", "en")])
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AiError::Upstream { status: status.as_u16(), body });
        }

        let listing: ListingResponse = resp.json().await?;
        Ok(listing.articles.unwrap_or_default())
    }
}

#[async_trait]
impl ArticleSource for NewsApiClient {
    async fn top_headlines(&self, category: &str, page_size: u32) -> Result<Vec<Article>, AiError> {
        self.listing(
            "top-headlines",
            &[("category", category.to_string()), ("pageSize", page_size.to_string())],
        )
        .await
    }

    async fn search(&self, query: &str, page_size: u32) -> Result<Vec<Article>, AiError> {
        self.listing(
            "everything",
            &[
                ("q", query.to_string()),
                ("sortBy", "relevancy".to_string()),
                ("pageSize", page_size.to_string()),
            ],
        )
        .await
    }
}
