//! Configuration loader
//!
//! Loads application configuration from environment variables, with `.env`
//! support via dotenvy.
//!
//! ## Environment Variables
//! - `MKTSYNC_DB_PATH`: SQLite database file path
//! - `MKTSYNC_DB_POOL_SIZE`: Connection pool size (default 4)
//! - `MKTSYNC_ENCRYPTION_KEY`: base64-encoded 32-byte vault key (required)
//! - `MKTSYNC_REDIRECT_URI`: OAuth callback URI registered with providers
//! - `MKTSYNC_BATCH_DELAY_MS`: Pause between sync batches (default 1000)
//! - `MKTSYNC_<MARKETPLACE>_CLIENT_ID` / `MKTSYNC_<MARKETPLACE>_CLIENT_SECRET`:
//!   per-marketplace OAuth application credentials (e.g.
//!   `MKTSYNC_MERCADOLIVRE_CLIENT_ID`)

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use mktsync_domain::{MarketplaceError, MarketplaceId, Result};

/// Application configuration resolved at startup.
///
/// Startup fails hard when the encryption key is missing or malformed;
/// there is no insecure fallback key.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: String,
    pub db_pool_size: u32,
    /// Raw 32-byte vault key, decoded from base64.
    pub encryption_key: Vec<u8>,
    pub redirect_uri: String,
    /// Pause between sync batches, in milliseconds.
    pub batch_delay_ms: u64,
}

impl AppConfig {
    /// Load configuration from the environment (and `.env`, if present).
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration strictly from already-set environment variables.
    pub fn from_env() -> Result<Self> {
        let db_path = env_var("MKTSYNC_DB_PATH")?;
        let db_pool_size = env_parse("MKTSYNC_DB_POOL_SIZE", 4)?;
        let redirect_uri = env_var("MKTSYNC_REDIRECT_URI")?;
        let batch_delay_ms = env_parse("MKTSYNC_BATCH_DELAY_MS", 1000)?;
        let encryption_key = decode_key(&env_var("MKTSYNC_ENCRYPTION_KEY")?)?;

        tracing::info!(db_path = %db_path, pool_size = db_pool_size, "configuration loaded");

        Ok(Self { db_path, db_pool_size, encryption_key, redirect_uri, batch_delay_ms })
    }

    /// OAuth application credentials for one marketplace.
    ///
    /// Missing values surface as empty strings; the flow controller rejects
    /// connects for marketplaces without registered credentials.
    pub fn client_credentials(marketplace: MarketplaceId) -> (String, String) {
        let prefix = marketplace.as_str().to_ascii_uppercase();
        let id = std::env::var(format!("MKTSYNC_{prefix}_CLIENT_ID")).unwrap_or_default();
        let secret = std::env::var(format!("MKTSYNC_{prefix}_CLIENT_SECRET")).unwrap_or_default();
        (id, secret)
    }
}

fn decode_key(encoded: &str) -> Result<Vec<u8>> {
    let key = BASE64.decode(encoded.trim()).map_err(|e| {
        MarketplaceError::Config(format!("MKTSYNC_ENCRYPTION_KEY is not valid base64: {e}"))
    })?;
    if key.len() != 32 {
        return Err(MarketplaceError::Config(format!(
            "MKTSYNC_ENCRYPTION_KEY must decode to 32 bytes, got {}",
            key.len()
        )));
    }
    Ok(key)
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        MarketplaceError::Config(format!("Missing required environment variable: {key}"))
    })
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| MarketplaceError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}
