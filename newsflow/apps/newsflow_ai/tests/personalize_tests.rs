use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use newsflow_ai::news_api::ArticleSource;
use newsflow_ai::{fetch_personalized, AiError, Article, PersonalizeError};

/// Serves `per_source` articles for every query, except the listed failures.
/// Records every call it receives.
struct FakeSource {
    per_source: usize,
    failing: Vec<&'static str>,
    calls: Mutex<Vec<String>>,
}

impl FakeSource {
    fn new(per_source: usize) -> Self {
        Self { per_source, failing: Vec::new(), calls: Mutex::new(Vec::new()) }
    }

    fn failing(mut self, name: &'static str) -> Self {
        self.failing.push(name);
        self
    }

    fn serve(&self, kind: &str, name: &str) -> Result<Vec<Article>, AiError> {
        self.calls.lock().unwrap().push(format!("{kind}:{name}"));
        if self.failing.contains(&name) {
            return Err(AiError::Upstream { status: 500, body: "boom".into() });
        }
        Ok((0..self.per_source)
            .map(|i| Article::titled(&format!("{name} {i}"), &format!("https://news.test/{name}/{i}")))
            .collect())
    }
}

#[async_trait]
impl ArticleSource for FakeSource {
    async fn top_headlines(&self, category: &str, _page_size: u32) -> Result<Vec<Article>, AiError> {
        self.serve("headlines", category)
    }

    async fn search(&self, query: &str, _page_size: u32) -> Result<Vec<Article>, AiError> {
        self.serve("search", query)
    }
}

fn interests(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn missing_key_and_missing_interests_are_distinct() {
    let source = FakeSource::new(1);
    let err = fetch_personalized(&source, &interests(&["science"]), None).await.unwrap_err();
    assert_eq!(err, PersonalizeError::MissingApiKey);

    let err = fetch_personalized(&source, &interests(&["science"]), Some("  ")).await.unwrap_err();
    assert_eq!(err, PersonalizeError::MissingApiKey);

    let err = fetch_personalized(&source, &[], Some("AIzaKey")).await.unwrap_err();
    assert_eq!(err, PersonalizeError::NoInterests);
    assert_ne!(
        PersonalizeError::MissingApiKey.to_string(),
        PersonalizeError::NoInterests.to_string()
    );
    assert!(source.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn feed_is_capped_and_every_article_has_a_reason() {
    // 2 standard + 2 custom sources, 10 each = 40 candidates
    let source = FakeSource::new(10);
    let feed = fetch_personalized(
        &source,
        &interests(&["technology", "space", "health", "rust"]),
        Some("AIzaKey"),
    )
    .await
    .unwrap();

    assert_eq!(feed.len(), 20);
    for article in &feed {
        let category = article.category.as_deref().unwrap();
        assert_eq!(
            article.ai_reason.as_deref(),
            Some(format!("Selected based on your interest in {category}").as_str())
        );
        assert!(article.title.as_deref().unwrap().starts_with(category));
    }
    let distinct: HashSet<_> = feed.iter().map(|a| a.url.clone()).collect();
    assert_eq!(distinct.len(), 20);
}

#[tokio::test]
async fn small_feeds_are_returned_whole() {
    let source = FakeSource::new(3);
    let feed = fetch_personalized(&source, &interests(&["business", "quantum"]), Some("AIzaKey"))
        .await
        .unwrap();
    assert_eq!(feed.len(), 6);
}

#[tokio::test]
async fn at_most_three_sources_of_each_kind_are_queried() {
    let source = FakeSource::new(1);
    fetch_personalized(
        &source,
        &interests(&[
            "technology", "business", "science", "health", "a", "b", "c", "d",
        ]),
        Some("AIzaKey"),
    )
    .await
    .unwrap();

    let calls: HashSet<String> = source.calls.lock().unwrap().iter().cloned().collect();
    let expected: HashSet<String> = [
        "headlines:technology",
        "headlines:business",
        "headlines:science",
        "search:a",
        "search:b",
        "search:c",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assert_eq!(calls, expected);
}

#[tokio::test]
async fn failing_sources_are_skipped() {
    let source = FakeSource::new(2).failing("science").failing("space");
    let feed = fetch_personalized(
        &source,
        &interests(&["science", "sports", "space"]),
        Some("AIzaKey"),
    )
    .await
    .unwrap();

    assert_eq!(feed.len(), 2);
    assert!(feed.iter().all(|a| a.category.as_deref() == Some("sports")));
}

#[tokio::test]
async fn all_sources_failing_yields_an_empty_feed() {
    let source = FakeSource::new(2).failing("science");
    let feed = fetch_personalized(&source, &interests(&["science"]), Some("AIzaKey"))
        .await
        .unwrap();
    assert!(feed.is_empty());
}
