use futures_util::future::join_all;
use rand::seq::SliceRandom;
use tracing::warn;

use crate::article::Article;
use crate::category::Category;
use crate::error::PersonalizeError;
use crate::news_api::ArticleSource;

/// Page size for the plain category listing.
pub const HEADLINES_PAGE_SIZE: u32 = 20;
/// Page size for each source queried while building a personalized feed.
pub const PERSONALIZED_PAGE_SIZE: u32 = 10;
/// Standard categories and custom topics consulted, each.
pub const MAX_SOURCES_PER_KIND: usize = 3;
/// Length cap of the personalized feed.
pub const FEED_LIMIT: usize = 20;

/// Interests split by how they are resolved, each side in original order.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Partition<'a> {
    pub standard: Vec<&'a str>,
    pub custom: Vec<&'a str>,
}

pub fn partition(interests: &[String]) -> Partition<'_> {
    let mut out = Partition::default();
    for interest in interests {
        if interest.parse::<Category>().is_ok() {
            out.standard.push(interest);
        } else {
            out.custom.push(interest);
        }
    }
    out
}

pub fn reason_for(category: Option<&str>) -> String {
    format!("Selected based on your interest in {}", category.unwrap_or("news"))
}

/// Build a personalized feed from a user's interests.
///
/// The key is only checked for presence here; it gates the feature but the
/// fan-out below talks to the listing API alone. Sources fail independently:
/// a broken category is logged and skipped. The result is shuffled, so two
/// calls over the same interests differ in order and, past `FEED_LIMIT`
/// articles, in membership.
pub async fn fetch_personalized(
    source: &dyn ArticleSource,
    interests: &[String],
    api_key: Option<&str>,
) -> Result<Vec<Article>, PersonalizeError> {
    if api_key.map_or(true, |k| k.trim().is_empty()) {
        return Err(PersonalizeError::MissingApiKey);
    }
    if interests.is_empty() {
        return Err(PersonalizeError::NoInterests);
    }

    let Partition { standard, custom } = partition(interests);

    let standard_fetches = standard.into_iter().take(MAX_SOURCES_PER_KIND).map(|category| async move {
        match source.top_headlines(category, PERSONALIZED_PAGE_SIZE).await {
            Ok(articles) => tag(articles, category),
            Err(e) => {
                warn!(category, error = %e, "category fetch failed, skipping");
                Vec::new()
            }
        }
    });
    let custom_fetches = custom.into_iter().take(MAX_SOURCES_PER_KIND).map(|topic| async move {
        match source.search(topic, PERSONALIZED_PAGE_SIZE).await {
            Ok(articles) => tag(articles, topic),
            Err(e) => {
                warn!(topic, error = %e, "custom topic fetch failed, skipping");
                Vec::new()
            }
        }
    });

    let (standard_results, custom_results) =
        futures_util::join!(join_all(standard_fetches), join_all(custom_fetches));

    let mut articles: Vec<Article> = standard_results
        .into_iter()
        .chain(custom_results)
        .flatten()
        .collect();
    if articles.is_empty() {
        return Ok(articles);
    }

    articles.shuffle(&mut rand::thread_rng());
    articles.truncate(FEED_LIMIT);
    for article in &mut articles {
        article.ai_reason = Some(reason_for(article.category.as_deref()));
    }
    Ok(articles)
}

fn tag(articles: Vec<Article>, category: &str) -> Vec<Article> {
    articles
        .into_iter()
        .map(|mut a| {
            a.category = Some(category.to_string());
            a
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_keeps_order_within_each_side() {
        let interests: Vec<String> = ["space", "technology", "rust lang", "health", "ai"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let p = partition(&interests);
        assert_eq!(p.standard, vec!["technology", "health"]);
        assert_eq!(p.custom, vec!["space", "rust lang", "ai"]);
    }

    #[test]
    fn reason_falls_back_to_news() {
        assert_eq!(reason_for(None), "Selected based on your interest in news");
        assert_eq!(reason_for(Some("space")), "Selected based on your interest in space");
    }
}
