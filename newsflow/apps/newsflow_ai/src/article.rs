use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSourceRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A news item as returned by the listing API.
///
/// Upstream fields are all nullable and are written back as `null` when
/// absent. Fields not modelled here survive in `extra`, so re-serializing an
/// article yields the upstream shape plus the two fields this crate injects
/// (`category`, `ai_reason`), which are omitted until set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub source: Option<ArticleSourceRef>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, rename = "ai_reason", skip_serializing_if = "Option::is_none")]
    pub ai_reason: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Article {
    pub fn titled(title: &str, url: &str) -> Self {
        Self {
            source: None,
            author: None,
            title: Some(title.to_string()),
            description: None,
            url: Some(url.to_string()),
            url_to_image: None,
            published_at: None,
            content: None,
            category: None,
            ai_reason: None,
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_upstream_fields_pass_through() {
        let raw = serde_json::json!({
            "source": {"id": null, "name": "Wire"},
            "title": "T",
            "url": "https://example.com/a",
            "urlToImage": "https://example.com/a.png",
            "sentiment": 0.4
        });
        let article: Article = serde_json::from_value(raw).unwrap();
        assert_eq!(article.url_to_image.as_deref(), Some("https://example.com/a.png"));

        let back = serde_json::to_value(&article).unwrap();
        assert_eq!(back["sentiment"], 0.4);
        assert_eq!(back["urlToImage"], "https://example.com/a.png");
        assert!(back.get("ai_reason").is_none());
        assert!(back.get("category").is_none());
    }

    #[test]
    fn upstream_nulls_are_kept() {
        let raw = serde_json::json!({
            "source": {"id": null, "name": "A"},
            "author": null,
            "title": null,
            "description": null,
            "url": "u",
            "urlToImage": null,
            "publishedAt": "2025-01-01T00:00:00Z",
            "content": null
        });
        let article: Article = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(article.title, None);
        assert_eq!(serde_json::to_value(&article).unwrap(), raw);
    }
}
