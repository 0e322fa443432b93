//! Runtime configuration read from the environment.

use std::time::Duration;

use crate::intent::MatcherKind;

const DEFAULT_DATABASE_URL: &str = "zavalinka.db";
const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_SEND_TIMEOUT_MS: u64 = 5000;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Where game state lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// In-process store; everything is lost on restart
    Memory,
    /// SQLite database file
    Sqlite { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub server_host: String,
    pub server_port: u16,
    /// Upper bound for delivering one message to one recipient
    pub send_timeout: Duration,
    /// How long a session waits for the SQLite write lock
    pub busy_timeout: Duration,
    /// Strategy the per-state grammars are compiled with
    pub intent_matcher: MatcherKind,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database_url = lookup("DATABASE_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.into());

        let path = database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
            .unwrap_or(&database_url);
        // Every pooled connection to ":memory:" would get its own empty database
        let store = if path.eq_ignore_ascii_case("memory") || path == ":memory:" {
            if path == ":memory:" {
                tracing::warn!(
                    url = %database_url,
                    "In-memory SQLite cannot be shared across connections, using the memory store"
                );
            }
            StoreConfig::Memory
        } else {
            StoreConfig::Sqlite {
                path: path.to_string(),
            }
        };

        let server_host =
            lookup("SERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.into());
        let server_port = parse_or(
            "SERVER_PORT",
            lookup("SERVER_PORT").or_else(|| lookup("PORT")),
            DEFAULT_SERVER_PORT,
        );
        let send_timeout_ms = parse_or(
            "BROADCAST_SEND_TIMEOUT_MS",
            lookup("BROADCAST_SEND_TIMEOUT_MS"),
            DEFAULT_SEND_TIMEOUT_MS,
        );
        let busy_timeout_ms = parse_or(
            "SQLITE_BUSY_TIMEOUT_MS",
            lookup("SQLITE_BUSY_TIMEOUT_MS"),
            DEFAULT_BUSY_TIMEOUT_MS,
        );
        let intent_matcher = parse_or(
            "INTENT_MATCHER",
            lookup("INTENT_MATCHER"),
            MatcherKind::default(),
        );

        Self {
            store,
            server_host,
            server_port,
            send_timeout: Duration::from_millis(send_timeout_ms),
            busy_timeout: Duration::from_millis(busy_timeout_ms),
            intent_matcher,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(
                key = %key,
                value = %raw,
                default = %default,
                "Invalid configuration value, using default"
            );
            default
        }),
    }
}
