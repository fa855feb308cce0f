//! Configuration module for the scout backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// One configured API token and the username it authenticates as.
#[derive(Debug, Clone)]
pub struct ApiToken {
    pub token: String,
    pub username: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// API tokens granting write access, `token:username` pairs
    pub api_tokens: Vec<ApiToken>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Root directory for uploaded media files
    pub media_root: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_tokens = env::var("SCOUT_API_TOKENS")
            .map(|raw| parse_api_tokens(&raw))
            .unwrap_or_default();

        let db_path = env::var("SCOUT_DB_PATH")
            .unwrap_or_else(|_| "./data/scout.sqlite".to_string())
            .into();

        let media_root = env::var("SCOUT_MEDIA_ROOT")
            .unwrap_or_else(|_| "./data/media".to_string())
            .into();

        let bind_addr = env::var("SCOUT_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid SCOUT_BIND_ADDR format");

        let log_level = env::var("SCOUT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            api_tokens,
            db_path,
            media_root,
            bind_addr,
            log_level,
        }
    }
}

/// Parse a comma-separated list of `token:username` pairs.
///
/// Entries without a username are skipped with a warning rather than
/// aborting startup.
fn parse_api_tokens(raw: &str) -> Vec<ApiToken> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.split_once(':') {
            Some((token, username)) if !token.is_empty() && !username.is_empty() => {
                Some(ApiToken {
                    token: token.to_string(),
                    username: username.to_string(),
                })
            }
            _ => {
                tracing::warn!("Ignoring malformed SCOUT_API_TOKENS entry");
                None
            }
        })
        .collect()
}
