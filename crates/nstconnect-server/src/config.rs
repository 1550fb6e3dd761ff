use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Secrets shipped in sample `.env` files; never accepted.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me",
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "your_jwt_secret",
    "secret",
];

const DB_PATH_VAR: &str = "NSTCONNECT_DB_PATH";
const DEFAULT_DB_PATH: &str = "nstconnect.db";

/// Just the database location, for tooling that never serves requests.
pub fn db_path_from_env() -> PathBuf {
    std::env::var(DB_PATH_VAR)
        .unwrap_or_else(|_| DEFAULT_DB_PATH.into())
        .into()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("NSTCONNECT_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("NSTCONNECT_JWT_SECRET is unset or still a placeholder; set it in your .env file");
        }

        let host = get("NSTCONNECT_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("NSTCONNECT_PORT")
            .unwrap_or_else(|| "4000".into())
            .parse()
            .context("NSTCONNECT_PORT must be a port number")?;
        let db_path: PathBuf = get(DB_PATH_VAR)
            .unwrap_or_else(|| DEFAULT_DB_PATH.into())
            .into();
        let token_ttl_days: i64 = match get("NSTCONNECT_TOKEN_TTL_DAYS") {
            Some(raw) => raw
                .parse()
                .context("NSTCONNECT_TOKEN_TTL_DAYS must be a whole number of days")?,
            None => 7,
        };
        if token_ttl_days < 1 {
            bail!("NSTCONNECT_TOKEN_TTL_DAYS must be at least 1");
        }

        Ok(Self {
            host,
            port,
            db_path,
            jwt_secret,
            token_ttl_days,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}
