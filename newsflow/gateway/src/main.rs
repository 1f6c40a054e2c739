mod config;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
};
use dotenvy::dotenv;
use newsflow_ai::{GeminiCfg, GeminiClient, NewsApiClient, NewsCfg};
use newsflow_core::storage::{MemoryStorage, NewUser, SqlStorage, Storage};
use newsflow_core::views::user_auth::hash_password;
use newsflow_core::{ensure_schema, spawn_session_janitor, AppState, PasswordCost, SessionCfg};
use rand::RngCore;
use sea_orm::Database;
use tokio::signal::{self, ctrl_c};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{AdminSeed, GatewayCfg, StorageKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).compact().init();

    let cfg = GatewayCfg::from_env()?;

    let store: Arc<dyn Storage> = match (cfg.storage, cfg.database_url.as_deref()) {
        (StorageKind::Sql, Some(url)) => {
            let db = Database::connect(url).await?;
            ensure_schema(&db).await?;
            info!("storage: sql");
            Arc::new(SqlStorage::new(db))
        }
        _ => {
            info!("storage: memory (data is lost on restart)");
            Arc::new(MemoryStorage::new())
        }
    };

    let gemini_cfg = GeminiCfg::from_env();
    let news = Arc::new(NewsApiClient::new(&NewsCfg::from_env())?);
    let generator = Arc::new(GeminiClient::new(&gemini_cfg)?);
    info!(model = generator.model(), "generative api configured");

    let secret = match cfg.session_secret {
        Some(s) => s.into_bytes(),
        None => {
            warn!("SESSION_SECRET not set; using a random secret, sessions end on restart");
            let mut buf = vec![0u8; 64];
            rand::thread_rng().fill_bytes(&mut buf);
            buf
        }
    };

    let session_cfg = SessionCfg::from_env();
    if let Some(ref seed) = cfg.admin {
        seed_admin(store.as_ref(), seed, session_cfg.password_cost).await?;
    }

    let state = AppState::new(store, news, generator, gemini_cfg, &secret, session_cfg);
    spawn_session_janitor(state.clone());

    let mut app = newsflow_core::urls::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024));

    if let Some(origin) = cfg.cors_origin {
        let cors = CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
            .allow_headers([CONTENT_TYPE])
            .allow_credentials(true);
        app = app.layer(cors);
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    info!("listening on http://{}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

/// Create the configured admin account unless a user with that email exists.
async fn seed_admin(store: &dyn Storage, seed: &AdminSeed, cost: PasswordCost) -> anyhow::Result<()> {
    if store.get_user_by_email(&seed.email).await?.is_some() {
        info!(email = %seed.email, "admin account already present");
        return Ok(());
    }
    let user = store
        .create_user(NewUser {
            username: seed.username.clone(),
            email: seed.email.clone(),
            password_hash: hash_password(&seed.password, cost)?,
            is_admin: true,
            ..Default::default()
        })
        .await?;
    info!(user_id = user.id, "admin account created");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
