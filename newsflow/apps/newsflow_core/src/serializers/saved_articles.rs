use serde::Deserialize;

use crate::storage::NewSavedArticle;

#[derive(Debug, Deserialize)]
pub struct SaveArticleReq {
    #[serde(default)]
    pub article_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub source: Option<String>,
    pub category: Option<String>,
    pub published_at: Option<String>,
}

impl SaveArticleReq {
    /// Names of required fields left blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [("article_id", &self.article_id), ("title", &self.title), ("url", &self.url)]
            .into_iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }

    pub fn into_new(self, user_id: i64) -> NewSavedArticle {
        NewSavedArticle {
            user_id,
            article_id: self.article_id,
            title: self.title,
            description: non_blank(self.description),
            url: self.url,
            image_url: non_blank(self.image_url),
            source: non_blank(self.source),
            category: non_blank(self.category),
            published_at: non_blank(self.published_at),
        }
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}
