#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Duration;
use http_body_util::BodyExt;
use newsflow_ai::{AiError, Article, ArticleSource, GeminiCfg, KeyValidationPolicy, TextGenerator};
use newsflow_core::storage::{MemoryStorage, SqlStorage, Storage};
use newsflow_core::{ensure_schema, AppState, PasswordCost, SessionCfg};
use sea_orm::{ConnectOptions, Database};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const SECRET: &[u8] = b"test-secret-test-secret-test-secret";

/// Every request gets `per_call` articles tagged with the requested name.
/// Calls are recorded as `headlines:<category>` / `search:<query>`.
pub struct FakeSource {
    pub per_call: usize,
    pub calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new(per_call: usize) -> Self {
        Self { per_call, calls: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn serve(&self, kind: &str, name: &str) -> Vec<Article> {
        self.calls.lock().unwrap().push(format!("{kind}:{name}"));
        (0..self.per_call)
            .map(|i| Article::titled(&format!("{name} #{i}"), &format!("https://news.test/{name}/{i}")))
            .collect()
    }
}

#[async_trait]
impl ArticleSource for FakeSource {
    async fn top_headlines(&self, category: &str, _page_size: u32) -> Result<Vec<Article>, AiError> {
        Ok(self.serve("headlines", category))
    }

    async fn search(&self, query: &str, _page_size: u32) -> Result<Vec<Article>, AiError> {
        Ok(self.serve("search", query))
    }
}

/// Echoes the first line of the prompt back.
pub struct EchoGenerator;

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(&self, _api_key: &str, prompt: &str) -> Result<String, AiError> {
        Ok(format!("generated: {}", prompt.lines().next().unwrap_or_default()))
    }
}

pub fn gemini_cfg() -> GeminiCfg {
    GeminiCfg {
        base_url: "http://gemini.invalid".into(),
        model: "test-model".into(),
        generation_timeout_secs: 5,
        validation_timeout_secs: 5,
        validation_policy: KeyValidationPolicy::Lenient,
    }
}

pub fn session_cfg() -> SessionCfg {
    SessionCfg {
        ttl: Duration::hours(1),
        cookie_secure: false,
        cookie_domain: None,
        cookie_name: "newsflow_session".into(),
        janitor_interval_secs: 3600,
        revoked_retention_secs: 3600,
        password_cost: PasswordCost { memory_kib: 64, iterations: 1 },
    }
}

pub async fn sqlite_store() -> Arc<dyn Storage> {
    // one connection, or every pooled connection gets its own empty database
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opts).await.unwrap();
    ensure_schema(&db).await.unwrap();
    Arc::new(SqlStorage::new(db))
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn Storage>,
    pub source: Arc<FakeSource>,
}

pub struct Reply {
    pub status: StatusCode,
    pub cookie: Option<String>,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(Arc::new(MemoryStorage::new()), FakeSource::new(3))
    }

    pub fn with(store: Arc<dyn Storage>, source: FakeSource) -> Self {
        let source = Arc::new(source);
        let state = AppState::new(
            store.clone(),
            source.clone(),
            Arc::new(EchoGenerator),
            gemini_cfg(),
            SECRET,
            session_cfg(),
        );
        Self { router: newsflow_core::urls::router(state), store, source }
    }

    pub async fn call(&self, method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Reply {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        let req = match body {
            Some(v) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(v.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        Reply { status, cookie, body }
    }

    pub async fn get(&self, uri: &str, cookie: &str) -> Reply {
        self.call("GET", uri, Some(cookie), None).await
    }

    /// Sign a fresh user up; returns its session cookie and id.
    pub async fn signup(&self, username: &str) -> (String, i64) {
        let reply = self
            .call(
                "POST",
                "/api/auth/signup",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "hunter22",
                })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        let id = reply.body["id"].as_i64().unwrap();
        (reply.cookie.unwrap(), id)
    }

    pub async fn signup_admin(&self, username: &str) -> (String, i64) {
        let (cookie, id) = self.signup(username).await;
        self.store.set_user_admin_status(id, true, None).await.unwrap();
        (cookie, id)
    }
}
