use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use super::{
    AdminLog, ApiKey, Categories, Interest, NewAdminLog, NewSavedArticle, NewSession, NewUser,
    SavedArticle, Session, Storage, StoreError, StoreResult, User, UserUpdate,
};
use crate::models::admin_log::{self, Column as LogCol, Entity as AdminLogs};
use crate::models::api_key::{self, Column as KeyCol, Entity as ApiKeys};
use crate::models::interest::{self, Column as InterestCol, Entity as Interests};
use crate::models::saved_article::{self, Column as ArticleCol, Entity as SavedArticles};
use crate::models::session::{self, Column as SessionCol, Entity as Sessions};
use crate::models::user::{self, Column as UserCol, Entity as Users};

/// SeaORM-backed storage (Postgres in production, SQLite in tests).
#[derive(Clone)]
pub struct SqlStorage {
    db: DatabaseConnection,
}

impl SqlStorage {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Unique-index violations become `Conflict`; everything else stays a db error.
fn on_write(what: &str) -> impl FnOnce(DbErr) -> StoreError + '_ {
    move |e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::Conflict(format!("{what} already exists")),
        _ => StoreError::Db(e),
    }
}

fn log_row(new: NewAdminLog) -> admin_log::ActiveModel {
    admin_log::ActiveModel {
        id: NotSet,
        admin_id: Set(new.admin_id),
        action: Set(new.action),
        target_type: Set(new.target_type),
        target_id: Set(new.target_id),
        details: Set(new.details),
        created_at: Set(Utc::now()),
    }
}

// ---------- row -> record ----------

impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            email: m.email,
            password_hash: m.password_hash,
            first_name: m.first_name,
            last_name: m.last_name,
            supabase_id: m.supabase_id,
            is_admin: m.is_admin,
            created_at: m.created_at,
        }
    }
}

impl TryFrom<interest::Model> for Interest {
    type Error = StoreError;

    fn try_from(m: interest::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            user_id: m.user_id,
            categories: Categories::from_blob(&m.categories)?,
        })
    }
}

impl From<api_key::Model> for ApiKey {
    fn from(m: api_key::Model) -> Self {
        Self { id: m.id, user_id: m.user_id, gemini_key: m.gemini_key }
    }
}

impl From<saved_article::Model> for SavedArticle {
    fn from(m: saved_article::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            article_id: m.article_id,
            title: m.title,
            description: m.description,
            url: m.url,
            image_url: m.image_url,
            source: m.source,
            category: m.category,
            published_at: m.published_at,
            saved_at: m.saved_at,
        }
    }
}

impl From<admin_log::Model> for AdminLog {
    fn from(m: admin_log::Model) -> Self {
        Self {
            id: m.id,
            admin_id: m.admin_id,
            action: m.action,
            target_type: m.target_type,
            target_id: m.target_id,
            details: m.details,
            created_at: m.created_at,
        }
    }
}

impl From<session::Model> for Session {
    fn from(m: session::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            sid: m.sid,
            issued_at: m.issued_at,
            expires_at: m.expires_at,
            revoked_at: m.revoked_at,
        }
    }
}

#[async_trait]
impl Storage for SqlStorage {
    async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(Users::find_by_id(id).one(&self.db).await?.map(User::from))
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(Users::find()
            .filter(UserCol::Username.eq(username))
            .one(&self.db)
            .await?
            .map(User::from))
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(Users::find()
            .filter(UserCol::Email.eq(email))
            .one(&self.db)
            .await?
            .map(User::from))
    }

    async fn get_user_by_supabase_id(&self, supabase_id: &str) -> StoreResult<Option<User>> {
        Ok(Users::find()
            .filter(UserCol::SupabaseId.eq(supabase_id))
            .one(&self.db)
            .await?
            .map(User::from))
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let created = user::ActiveModel {
            id: NotSet,
            username: Set(new.username),
            email: Set(new.email),
            password_hash: Set(new.password_hash),
            first_name: Set(new.first_name),
            last_name: Set(new.last_name),
            supabase_id: Set(new.supabase_id),
            is_admin: Set(new.is_admin),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(on_write("user"))?;
        Ok(created.into())
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> StoreResult<Option<User>> {
        let Some(found) = Users::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        if update.is_empty() {
            return Ok(Some(found.into()));
        }

        let mut am = found.into_active_model();
        if let Some(username) = update.username {
            am.username = Set(username);
        }
        if let Some(email) = update.email {
            am.email = Set(email);
        }
        if let Some(hash) = update.password_hash {
            am.password_hash = Set(hash);
        }
        if let Some(first_name) = update.first_name {
            am.first_name = Set(first_name);
        }
        if let Some(last_name) = update.last_name {
            am.last_name = Set(last_name);
        }
        let updated = am.update(&self.db).await.map_err(on_write("user"))?;
        Ok(Some(updated.into()))
    }

    async fn get_interests(&self, user_id: i64) -> StoreResult<Option<Interest>> {
        Interests::find()
            .filter(InterestCol::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .map(Interest::try_from)
            .transpose()
    }

    async fn create_interests(&self, user_id: i64, categories: Categories) -> StoreResult<Interest> {
        let created = interest::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            categories: Set(categories.to_blob()),
        }
        .insert(&self.db)
        .await
        .map_err(on_write("interests"))?;
        Interest::try_from(created)
    }

    async fn update_interests(&self, user_id: i64, categories: Categories) -> StoreResult<Option<Interest>> {
        let Some(found) = Interests::find()
            .filter(InterestCol::UserId.eq(user_id))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        let mut am = found.into_active_model();
        am.categories = Set(categories.to_blob());
        let updated = am.update(&self.db).await?;
        Interest::try_from(updated).map(Some)
    }

    async fn get_api_key(&self, user_id: i64) -> StoreResult<Option<ApiKey>> {
        Ok(ApiKeys::find()
            .filter(KeyCol::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .map(ApiKey::from))
    }

    async fn create_api_key(&self, user_id: i64, gemini_key: String) -> StoreResult<ApiKey> {
        let created = api_key::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            gemini_key: Set(Some(gemini_key)),
        }
        .insert(&self.db)
        .await
        .map_err(on_write("api key"))?;
        Ok(created.into())
    }

    async fn update_api_key(&self, user_id: i64, gemini_key: String) -> StoreResult<Option<ApiKey>> {
        let Some(found) = ApiKeys::find()
            .filter(KeyCol::UserId.eq(user_id))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        let mut am = found.into_active_model();
        am.gemini_key = Set(Some(gemini_key));
        Ok(Some(am.update(&self.db).await?.into()))
    }

    async fn get_saved_articles(&self, user_id: i64) -> StoreResult<Vec<SavedArticle>> {
        Ok(SavedArticles::find()
            .filter(ArticleCol::UserId.eq(user_id))
            .order_by_desc(ArticleCol::SavedAt)
            .order_by_desc(ArticleCol::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(SavedArticle::from)
            .collect())
    }

    async fn get_saved_article(&self, user_id: i64, article_id: &str) -> StoreResult<Option<SavedArticle>> {
        Ok(SavedArticles::find()
            .filter(ArticleCol::UserId.eq(user_id))
            .filter(ArticleCol::ArticleId.eq(article_id))
            .one(&self.db)
            .await?
            .map(SavedArticle::from))
    }

    async fn create_saved_article(&self, new: NewSavedArticle) -> StoreResult<SavedArticle> {
        let created = saved_article::ActiveModel {
            id: NotSet,
            user_id: Set(new.user_id),
            article_id: Set(new.article_id),
            title: Set(new.title),
            description: Set(new.description),
            url: Set(new.url),
            image_url: Set(new.image_url),
            source: Set(new.source),
            category: Set(new.category),
            published_at: Set(new.published_at),
            saved_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(on_write("saved article"))?;
        Ok(created.into())
    }

    async fn delete_saved_article(&self, user_id: i64, article_id: &str) -> StoreResult<bool> {
        let res = SavedArticles::delete_many()
            .filter(ArticleCol::UserId.eq(user_id))
            .filter(ArticleCol::ArticleId.eq(article_id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    async fn get_all_users(&self) -> StoreResult<Vec<User>> {
        Ok(Users::find()
            .order_by_asc(UserCol::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(User::from)
            .collect())
    }

    async fn get_all_saved_articles(&self) -> StoreResult<Vec<SavedArticle>> {
        Ok(SavedArticles::find()
            .order_by_desc(ArticleCol::SavedAt)
            .order_by_desc(ArticleCol::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(SavedArticle::from)
            .collect())
    }

    async fn set_user_admin_status(
        &self,
        user_id: i64,
        is_admin: bool,
        audit: Option<NewAdminLog>,
    ) -> StoreResult<Option<User>> {
        let txn = self.db.begin().await?;
        let Some(found) = Users::find_by_id(user_id).one(&txn).await? else {
            txn.rollback().await?;
            return Ok(None);
        };
        let mut am = found.into_active_model();
        am.is_admin = Set(is_admin);
        let updated = am.update(&txn).await?;
        if let Some(log) = audit {
            log_row(log).insert(&txn).await?;
        }
        txn.commit().await?;
        Ok(Some(updated.into()))
    }

    async fn delete_user(&self, user_id: i64, audit: Option<NewAdminLog>) -> StoreResult<bool> {
        // dropping `txn` without commit rolls everything back
        let txn = self.db.begin().await?;

        Interests::delete_many()
            .filter(InterestCol::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        ApiKeys::delete_many()
            .filter(KeyCol::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        SavedArticles::delete_many()
            .filter(ArticleCol::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        AdminLogs::delete_many()
            .filter(LogCol::AdminId.eq(user_id))
            .exec(&txn)
            .await?;
        Sessions::delete_many()
            .filter(SessionCol::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        let res = Users::delete_by_id(user_id).exec(&txn).await?;

        if res.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }
        if let Some(log) = audit {
            log_row(log).insert(&txn).await?;
        }
        txn.commit().await?;
        Ok(true)
    }

    async fn create_admin_log(&self, new: NewAdminLog) -> StoreResult<AdminLog> {
        Ok(log_row(new).insert(&self.db).await?.into())
    }

    async fn get_admin_logs(&self) -> StoreResult<Vec<AdminLog>> {
        Ok(AdminLogs::find()
            .order_by_desc(LogCol::CreatedAt)
            .order_by_desc(LogCol::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(AdminLog::from)
            .collect())
    }

    async fn create_session(&self, new: NewSession) -> StoreResult<Session> {
        let row = session::ActiveModel {
            id: NotSet,
            user_id: Set(new.user_id),
            sid: Set(new.sid),
            issued_at: Set(new.issued_at),
            expires_at: Set(new.expires_at),
            revoked_at: Set(None),
            created_at: Set(Utc::now()),
        };
        Ok(row.insert(&self.db).await?.into())
    }

    async fn get_session(&self, sid: Uuid) -> StoreResult<Option<Session>> {
        Ok(Sessions::find()
            .filter(SessionCol::Sid.eq(sid))
            .one(&self.db)
            .await?
            .map(Session::from))
    }

    async fn revoke_session(&self, sid: Uuid) -> StoreResult<()> {
        if let Some(found) = Sessions::find()
            .filter(SessionCol::Sid.eq(sid))
            .one(&self.db)
            .await?
        {
            if found.revoked_at.is_none() {
                let mut am = found.into_active_model();
                am.revoked_at = Set(Some(Utc::now()));
                am.update(&self.db).await?;
            }
        }
        Ok(())
    }

    async fn purge_sessions(&self, retention: Duration) -> StoreResult<u64> {
        let now = Utc::now();
        let res = Sessions::delete_many()
            .filter(
                Condition::any()
                    .add(SessionCol::ExpiresAt.lt(now))
                    .add(
                        Condition::all()
                            .add(SessionCol::RevokedAt.is_not_null())
                            .add(SessionCol::RevokedAt.lt(now - retention)),
                    ),
            )
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected)
    }
}
