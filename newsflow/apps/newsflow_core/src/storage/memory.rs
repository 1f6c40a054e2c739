use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AdminLog, ApiKey, Categories, Interest, NewAdminLog, NewSavedArticle, NewSession, NewUser,
    SavedArticle, Session, Storage, StoreError, StoreResult, User, UserUpdate,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    interests: BTreeMap<i64, Interest>,
    api_keys: BTreeMap<i64, ApiKey>,
    saved_articles: BTreeMap<i64, SavedArticle>,
    admin_logs: BTreeMap<i64, AdminLog>,
    sessions: HashMap<Uuid, Session>,
    seq: i64,
}

impl Tables {
    /// One sequence shared by every table; ids only need to be unique per table.
    fn next_id(&mut self) -> i64 {
        self.seq += 1;
        self.seq
    }

    /// Admin logs reference their author, as the SQL foreign key does.
    fn push_log(&mut self, new: NewAdminLog) -> StoreResult<AdminLog> {
        if !self.users.contains_key(&new.admin_id) {
            return Err(StoreError::Dangling(format!("admin {}", new.admin_id)));
        }
        let id = self.next_id();
        let log = AdminLog {
            id,
            admin_id: new.admin_id,
            action: new.action,
            target_type: new.target_type,
            target_id: new.target_id,
            details: new.details,
            created_at: Utc::now(),
        };
        self.admin_logs.insert(id, log.clone());
        Ok(log)
    }

    fn user_taken(&self, username: Option<&str>, email: Option<&str>, except: Option<i64>) -> Option<StoreError> {
        self.users.values().filter(|u| Some(u.id) != except).find_map(|u| {
            if username == Some(u.username.as_str()) {
                Some(StoreError::Conflict("username already exists".into()))
            } else if email == Some(u.email.as_str()) {
                Some(StoreError::Conflict("email already exists".into()))
            } else {
                None
            }
        })
    }
}

/// Process-local storage; everything is lost on restart. Each operation holds
/// the table lock for its whole duration, so multi-row operations are atomic.
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_supabase_id(&self, supabase_id: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t
            .users
            .values()
            .find(|u| u.supabase_id.as_deref() == Some(supabase_id))
            .cloned())
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        if let Some(err) = t.user_taken(Some(new.username.as_str()), Some(new.email.as_str()), None) {
            return Err(err);
        }
        let id = t.next_id();
        let user = User {
            id,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            supabase_id: new.supabase_id,
            is_admin: new.is_admin,
            created_at: Utc::now(),
        };
        t.users.insert(id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> StoreResult<Option<User>> {
        let mut t = self.tables.write().await;
        if let Some(err) = t.user_taken(update.username.as_deref(), update.email.as_deref(), Some(id)) {
            return Err(err);
        }
        let Some(user) = t.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = update.username {
            user.username = username;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(hash) = update.password_hash {
            user.password_hash = hash;
        }
        if let Some(first_name) = update.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            user.last_name = last_name;
        }
        Ok(Some(user.clone()))
    }

    async fn get_interests(&self, user_id: i64) -> StoreResult<Option<Interest>> {
        let t = self.tables.read().await;
        Ok(t.interests.values().find(|i| i.user_id == user_id).cloned())
    }

    async fn create_interests(&self, user_id: i64, categories: Categories) -> StoreResult<Interest> {
        let mut t = self.tables.write().await;
        if t.interests.values().any(|i| i.user_id == user_id) {
            return Err(StoreError::Conflict("interests already exist".into()));
        }
        let id = t.next_id();
        let interest = Interest { id, user_id, categories };
        t.interests.insert(id, interest.clone());
        Ok(interest)
    }

    async fn update_interests(&self, user_id: i64, categories: Categories) -> StoreResult<Option<Interest>> {
        let mut t = self.tables.write().await;
        Ok(t.interests.values_mut().find(|i| i.user_id == user_id).map(|i| {
            i.categories = categories;
            i.clone()
        }))
    }

    async fn get_api_key(&self, user_id: i64) -> StoreResult<Option<ApiKey>> {
        let t = self.tables.read().await;
        Ok(t.api_keys.values().find(|k| k.user_id == user_id).cloned())
    }

    async fn create_api_key(&self, user_id: i64, gemini_key: String) -> StoreResult<ApiKey> {
        let mut t = self.tables.write().await;
        if t.api_keys.values().any(|k| k.user_id == user_id) {
            return Err(StoreError::Conflict("api key already exists".into()));
        }
        let id = t.next_id();
        let key = ApiKey { id, user_id, gemini_key: Some(gemini_key) };
        t.api_keys.insert(id, key.clone());
        Ok(key)
    }

    async fn update_api_key(&self, user_id: i64, gemini_key: String) -> StoreResult<Option<ApiKey>> {
        let mut t = self.tables.write().await;
        Ok(t.api_keys.values_mut().find(|k| k.user_id == user_id).map(|k| {
            k.gemini_key = Some(gemini_key);
            k.clone()
        }))
    }

    async fn get_saved_articles(&self, user_id: i64) -> StoreResult<Vec<SavedArticle>> {
        let t = self.tables.read().await;
        // newest first; ids grow with insertion order
        Ok(t
            .saved_articles
            .values()
            .rev()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_saved_article(&self, user_id: i64, article_id: &str) -> StoreResult<Option<SavedArticle>> {
        let t = self.tables.read().await;
        Ok(t
            .saved_articles
            .values()
            .find(|a| a.user_id == user_id && a.article_id == article_id)
            .cloned())
    }

    async fn create_saved_article(&self, new: NewSavedArticle) -> StoreResult<SavedArticle> {
        let mut t = self.tables.write().await;
        if t
            .saved_articles
            .values()
            .any(|a| a.user_id == new.user_id && a.article_id == new.article_id)
        {
            return Err(StoreError::Conflict("article already saved".into()));
        }
        let id = t.next_id();
        let article = SavedArticle {
            id,
            user_id: new.user_id,
            article_id: new.article_id,
            title: new.title,
            description: new.description,
            url: new.url,
            image_url: new.image_url,
            source: new.source,
            category: new.category,
            published_at: new.published_at,
            saved_at: Utc::now(),
        };
        t.saved_articles.insert(id, article.clone());
        Ok(article)
    }

    async fn delete_saved_article(&self, user_id: i64, article_id: &str) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let found = t
            .saved_articles
            .values()
            .find(|a| a.user_id == user_id && a.article_id == article_id)
            .map(|a| a.id);
        Ok(match found {
            Some(id) => t.saved_articles.remove(&id).is_some(),
            None => false,
        })
    }

    async fn get_all_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn get_all_saved_articles(&self) -> StoreResult<Vec<SavedArticle>> {
        Ok(self.tables.read().await.saved_articles.values().rev().cloned().collect())
    }

    async fn set_user_admin_status(
        &self,
        user_id: i64,
        is_admin: bool,
        audit: Option<NewAdminLog>,
    ) -> StoreResult<Option<User>> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&user_id) {
            return Ok(None);
        }
        // log first: a failed log leaves the flag untouched
        if let Some(log) = audit {
            t.push_log(log)?;
        }
        Ok(t.users.get_mut(&user_id).map(|u| {
            u.is_admin = is_admin;
            u.clone()
        }))
    }

    async fn delete_user(&self, user_id: i64, audit: Option<NewAdminLog>) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&user_id) {
            return Ok(false);
        }
        if let Some(ref log) = audit {
            if log.admin_id == user_id || !t.users.contains_key(&log.admin_id) {
                return Err(StoreError::Dangling(format!("admin {}", log.admin_id)));
            }
        }
        t.users.remove(&user_id);
        t.interests.retain(|_, i| i.user_id != user_id);
        t.api_keys.retain(|_, k| k.user_id != user_id);
        t.saved_articles.retain(|_, a| a.user_id != user_id);
        t.admin_logs.retain(|_, l| l.admin_id != user_id);
        t.sessions.retain(|_, s| s.user_id != user_id);
        if let Some(log) = audit {
            t.push_log(log)?;
        }
        Ok(true)
    }

    async fn create_admin_log(&self, new: NewAdminLog) -> StoreResult<AdminLog> {
        self.tables.write().await.push_log(new)
    }

    async fn get_admin_logs(&self) -> StoreResult<Vec<AdminLog>> {
        Ok(self.tables.read().await.admin_logs.values().rev().cloned().collect())
    }

    async fn create_session(&self, new: NewSession) -> StoreResult<Session> {
        let mut t = self.tables.write().await;
        let id = t.next_id();
        let session = Session {
            id,
            user_id: new.user_id,
            sid: new.sid,
            issued_at: new.issued_at,
            expires_at: new.expires_at,
            revoked_at: None,
        };
        t.sessions.insert(new.sid, session.clone());
        Ok(session)
    }

    async fn get_session(&self, sid: Uuid) -> StoreResult<Option<Session>> {
        Ok(self.tables.read().await.sessions.get(&sid).cloned())
    }

    async fn revoke_session(&self, sid: Uuid) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if let Some(s) = t.sessions.get_mut(&sid) {
            s.revoked_at.get_or_insert_with(Utc::now);
        }
        Ok(())
    }

    async fn purge_sessions(&self, retention: Duration) -> StoreResult<u64> {
        let mut t = self.tables.write().await;
        let now = Utc::now();
        let before = t.sessions.len();
        t.sessions.retain(|_, s| {
            s.expires_at >= now && s.revoked_at.map_or(true, |r| r >= now - retention)
        });
        Ok((before - t.sessions.len()) as u64)
    }
}
