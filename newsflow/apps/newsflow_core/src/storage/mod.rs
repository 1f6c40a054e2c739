//! Persistence boundary. Handlers talk to `dyn Storage`; which implementation
//! sits behind it is decided once, at process start.

mod memory;
mod sql;

pub use memory::MemoryStorage;
pub use sql::SqlStorage;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("corrupt stored value: {0}")]
    Corrupt(String),
    #[error("unknown reference: {0}")]
    Dangling(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------- records ----------

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub supabase_id: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub supabase_id: Option<String>,
    pub is_admin: bool,
}

/// Partial profile update; `None` leaves a field alone. The name fields are
/// doubly optional so they can be cleared.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub first_name: Option<Option<String>>,
    pub last_name: Option<Option<String>>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
    }
}

/// A user's interests in the order they were chosen: standard category ids
/// and free-text topics mixed. On the wire this is a plain array; in storage
/// it is the blob `{"categories": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Categories(Vec<String>);

#[derive(Serialize, Deserialize)]
struct CategoriesBlob {
    categories: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCategories {
    Wrapped(CategoriesBlob),
    Bare(Vec<String>),
}

impl Categories {
    pub fn new(items: Vec<String>) -> Self {
        Self(items)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_blob(&self) -> String {
        serde_json::json!({ "categories": self.0 }).to_string()
    }

    pub fn from_blob(raw: &str) -> StoreResult<Self> {
        match serde_json::from_str::<StoredCategories>(raw) {
            Ok(StoredCategories::Wrapped(blob)) => Ok(Self(blob.categories)),
            Ok(StoredCategories::Bare(items)) => Ok(Self(items)),
            Err(e) => Err(StoreError::Corrupt(format!("interests blob: {e}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interest {
    pub id: i64,
    pub user_id: i64,
    pub categories: Categories,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiKey {
    pub id: i64,
    pub user_id: i64,
    pub gemini_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedArticle {
    pub id: i64,
    pub user_id: i64,
    pub article_id: String,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub image_url: Option<String>,
    pub source: Option<String>,
    pub category: Option<String>,
    pub published_at: Option<String>,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewSavedArticle {
    pub user_id: i64,
    pub article_id: String,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub image_url: Option<String>,
    pub source: Option<String>,
    pub category: Option<String>,
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    GrantAdmin,
    RevokeAdmin,
    DeleteUser,
}

impl AdminAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AdminAction::GrantAdmin => "GRANT_ADMIN",
            AdminAction::RevokeAdmin => "REVOKE_ADMIN",
            AdminAction::DeleteUser => "DELETE_USER",
        }
    }
}

pub const TARGET_USER: &str = "USER";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminLog {
    pub id: i64,
    pub admin_id: i64,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAdminLog {
    pub admin_id: i64,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub details: Option<String>,
}

impl NewAdminLog {
    pub fn on_user(admin_id: i64, action: AdminAction, user_id: i64, details: String) -> Self {
        Self {
            admin_id,
            action: action.as_str().to_string(),
            target_type: TARGET_USER.to_string(),
            target_id: user_id.to_string(),
            details: Some(details),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub sid: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now <= self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: i64,
    pub sid: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ---------- interface ----------

#[async_trait]
pub trait Storage: Send + Sync {
    // users
    async fn get_user(&self, id: i64) -> StoreResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn get_user_by_supabase_id(&self, supabase_id: &str) -> StoreResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn update_user(&self, id: i64, update: UserUpdate) -> StoreResult<Option<User>>;

    // interests
    async fn get_interests(&self, user_id: i64) -> StoreResult<Option<Interest>>;
    async fn create_interests(&self, user_id: i64, categories: Categories) -> StoreResult<Interest>;
    async fn update_interests(&self, user_id: i64, categories: Categories) -> StoreResult<Option<Interest>>;

    // api keys
    async fn get_api_key(&self, user_id: i64) -> StoreResult<Option<ApiKey>>;
    async fn create_api_key(&self, user_id: i64, gemini_key: String) -> StoreResult<ApiKey>;
    async fn update_api_key(&self, user_id: i64, gemini_key: String) -> StoreResult<Option<ApiKey>>;

    // saved articles
    async fn get_saved_articles(&self, user_id: i64) -> StoreResult<Vec<SavedArticle>>;
    async fn get_saved_article(&self, user_id: i64, article_id: &str) -> StoreResult<Option<SavedArticle>>;
    /// Fails with `StoreError::Conflict` if the user already saved this article.
    async fn create_saved_article(&self, article: NewSavedArticle) -> StoreResult<SavedArticle>;
    async fn delete_saved_article(&self, user_id: i64, article_id: &str) -> StoreResult<bool>;

    // admin
    async fn get_all_users(&self) -> StoreResult<Vec<User>>;
    async fn get_all_saved_articles(&self) -> StoreResult<Vec<SavedArticle>>;
    /// With `audit`, the flag change and the log row are written together or
    /// not at all.
    async fn set_user_admin_status(
        &self,
        user_id: i64,
        is_admin: bool,
        audit: Option<NewAdminLog>,
    ) -> StoreResult<Option<User>>;
    /// Removes the user and everything that references it, plus the `audit`
    /// row, or nothing at all.
    async fn delete_user(&self, user_id: i64, audit: Option<NewAdminLog>) -> StoreResult<bool>;
    async fn create_admin_log(&self, log: NewAdminLog) -> StoreResult<AdminLog>;
    /// Newest first.
    async fn get_admin_logs(&self) -> StoreResult<Vec<AdminLog>>;

    // sessions
    async fn create_session(&self, session: NewSession) -> StoreResult<Session>;
    async fn get_session(&self, sid: Uuid) -> StoreResult<Option<Session>>;
    async fn revoke_session(&self, sid: Uuid) -> StoreResult<()>;
    /// Drops expired sessions and sessions revoked longer than `retention` ago.
    async fn purge_sessions(&self, retention: Duration) -> StoreResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_blob_keeps_order() {
        let cats = Categories::new(vec!["technology".into(), "space".into()]);
        let blob = cats.to_blob();
        assert_eq!(blob, r#"{"categories":["technology","space"]}"#);
        assert_eq!(Categories::from_blob(&blob).unwrap(), cats);
    }

    #[test]
    fn bare_array_blobs_are_accepted() {
        let cats = Categories::from_blob(r#"["health"]"#).unwrap();
        assert_eq!(cats.first(), Some("health"));
    }

    #[test]
    fn garbage_blob_is_corrupt() {
        assert!(matches!(Categories::from_blob("{"), Err(StoreError::Corrupt(_))));
    }
}
