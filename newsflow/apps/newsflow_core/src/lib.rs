pub mod models;
pub mod serializers;
pub mod storage;
pub mod urls;
pub mod views;

use std::sync::Arc;

use anyhow::Result;
use chrono::Duration as ChronoDuration;
use jsonwebtoken::{DecodingKey, EncodingKey};
use newsflow_ai::{ArticleSource, GeminiCfg, TextGenerator};
use sea_orm::DatabaseConnection;
use tokio::time::{interval, Duration};
use tracing::{info, warn};

use crate::storage::Storage;

#[derive(Clone)]
pub struct SessionCfg {
    /// Session lifetime (default 7 days). Override with SESSION_TTL_SECS.
    pub ttl: ChronoDuration,
    /// Cookie flags for the session cookie
    pub cookie_secure: bool,
    pub cookie_domain: Option<String>,
    pub cookie_name: String,
    /// Background janitor tick interval in seconds (default 3600 = 1h).
    pub janitor_interval_secs: u64,
    /// How long to keep revoked sessions before hard-delete (default 30 days).
    pub revoked_retention_secs: i64,
    pub password_cost: PasswordCost,
}

/// Argon2id cost parameters for new password hashes. Existing hashes carry
/// their own parameters and verify regardless.
#[derive(Clone, Copy, Debug)]
pub struct PasswordCost {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for PasswordCost {
    fn default() -> Self {
        // ~19MB mem, 2 iters
        Self { memory_kib: 19456, iterations: 2 }
    }
}

impl SessionCfg {
    pub fn from_env() -> Self {
        let defaults = PasswordCost::default();
        Self {
            ttl: ChronoDuration::seconds(env_parse("SESSION_TTL_SECS", 7 * 24 * 3600)),
            cookie_secure: std::env::var("COOKIE_SECURE")
                .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE"))
                .unwrap_or(false),
            cookie_domain: std::env::var("COOKIE_DOMAIN").ok(),
            cookie_name: std::env::var("SESSION_COOKIE_NAME").unwrap_or("newsflow_session".into()),
            janitor_interval_secs: env_parse("JANITOR_INTERVAL_SECS", 3600),
            revoked_retention_secs: env_parse("REVOKED_RETENTION_SECS", 30 * 24 * 3600),
            password_cost: PasswordCost {
                memory_kib: env_parse("ARGON2_MEMORY_KIB", defaults.memory_kib),
                iterations: env_parse("ARGON2_ITERATIONS", defaults.iterations),
            },
        }
    }
}

/// Unset or unparsable values fall back to `default`.
fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key).map(|raw| raw.parse()) {
        Ok(Ok(v)) => v,
        Ok(Err(_)) => {
            warn!("{key} is not valid, using the default");
            default
        }
        Err(_) => default,
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub news: Arc<dyn ArticleSource>,
    pub generator: Arc<dyn TextGenerator>,
    pub gemini_cfg: GeminiCfg,
    pub jwt_enc: Arc<EncodingKey>,
    pub jwt_dec: Arc<DecodingKey>,
    pub session_cfg: SessionCfg,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Storage>,
        news: Arc<dyn ArticleSource>,
        generator: Arc<dyn TextGenerator>,
        gemini_cfg: GeminiCfg,
        session_secret: &[u8],
        session_cfg: SessionCfg,
    ) -> Self {
        Self {
            store,
            news,
            generator,
            gemini_cfg,
            jwt_enc: Arc::new(EncodingKey::from_secret(session_secret)),
            jwt_dec: Arc::new(DecodingKey::from_secret(session_secret)),
            session_cfg,
        }
    }
}

/// Ensure DB schema is up-to-date (calls migration crate).
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<()> {
    use migration::Migrator;
    use sea_orm_migration::migrator::MigratorTrait; // bring the trait into scope
    Migrator::up(db, None).await?;
    Ok(())
}

/// Spawn background janitor: clears expired and stale-revoked sessions.
pub fn spawn_session_janitor(state: AppState) {
    tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(state.session_cfg.janitor_interval_secs));
        let retention = ChronoDuration::seconds(state.session_cfg.revoked_retention_secs);
        loop {
            tick.tick().await;
            match state.store.purge_sessions(retention).await {
                Ok(removed) => info!(removed, "session janitor ran"),
                Err(e) => warn!(error = %e, "session janitor failed"),
            }
        }
    });
}
