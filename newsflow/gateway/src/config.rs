use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Sql,
    Memory,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sql" | "postgres" | "sqlite" => Ok(Self::Sql),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(format!("unknown storage backend `{other}`")),
        }
    }
}

pub struct AdminSeed {
    pub email: String,
    pub username: String,
    pub password: String,
}

pub struct GatewayCfg {
    pub port: u16,
    pub storage: StorageKind,
    pub database_url: Option<String>,
    pub session_secret: Option<String>,
    pub cors_origin: Option<String>,
    pub admin: Option<AdminSeed>,
}

impl GatewayCfg {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = non_empty("DATABASE_URL");
        let storage = match non_empty("STORAGE") {
            Some(raw) => raw.parse().map_err(anyhow::Error::msg)?,
            None if database_url.is_some() => StorageKind::Sql,
            None => {
                info!("DATABASE_URL not set, using in-memory storage");
                StorageKind::Memory
            }
        };
        if storage == StorageKind::Sql && database_url.is_none() {
            anyhow::bail!("STORAGE=sql requires DATABASE_URL");
        }

        let admin = match (non_empty("ADMIN_EMAIL"), non_empty("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => {
                let username = non_empty("ADMIN_USERNAME").unwrap_or_else(|| {
                    email.split('@').next().unwrap_or("admin").to_string()
                });
                Some(AdminSeed { email, username, password })
            }
            (Some(_), None) | (None, Some(_)) => {
                warn!("ADMIN_EMAIL and ADMIN_PASSWORD must both be set; skipping admin bootstrap");
                None
            }
            (None, None) => None,
        };

        Ok(Self {
            port: try_load("PORT", 5000)?,
            storage,
            database_url,
            session_secret: non_empty("SESSION_SECRET"),
            cors_origin: non_empty("CORS_ORIGIN"),
            admin,
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: Display,
{
    match non_empty(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {key} value `{raw}`: {e}")),
        None => Ok(default),
    }
}
