use std::env;
use std::time::Duration;

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use password_hash::rand_core::OsRng;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// When absent the service runs on the in-memory document store.
    pub database_url: Option<String>,
    /// PHC-format argon2 hash of the admin password. `None` disables login.
    pub admin_password_hash: Option<String>,
    /// Interval of the cart reconciliation sweep, in seconds.
    pub cart_sync_seconds: u64,
    /// Idle time after which a session (and its cart slot) is dropped.
    pub session_ttl_minutes: u64,
    pub media_dir: String,
    /// Prefix for hosted image URLs; empty means relative URLs.
    pub public_base_url: String,
    pub frontend_origin: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let database_url = env::var("DATABASE_URL").ok().filter(|u| !u.is_empty());
        let admin_password_hash = resolve_admin_hash()?;
        let cart_sync_seconds = env::var("CART_SYNC_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5)
            .max(1);
        let session_ttl_minutes = env::var("SESSION_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(120)
            .max(1);
        let media_dir = env::var("MEDIA_DIR").unwrap_or_else(|_| "media".to_string());
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_default();
        let frontend_origin =
            env::var("FRONTEND_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());

        Ok(Self {
            host,
            port,
            database_url,
            admin_password_hash,
            cart_sync_seconds,
            session_ttl_minutes,
            media_dir,
            public_base_url,
            frontend_origin,
        })
    }

    pub fn cart_sync_interval(&self) -> Duration {
        Duration::from_secs(self.cart_sync_seconds)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_minutes * 60)
    }
}

/// ADMIN_PASSWORD_HASH wins; a plain ADMIN_PASSWORD is hashed once at boot.
fn resolve_admin_hash() -> anyhow::Result<Option<String>> {
    if let Ok(hash) = env::var("ADMIN_PASSWORD_HASH") {
        if !hash.is_empty() {
            return Ok(Some(hash));
        }
    }
    match env::var("ADMIN_PASSWORD") {
        Ok(password) if !password.is_empty() => {
            let salt = SaltString::generate(&mut OsRng);
            let hash = Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| anyhow::anyhow!(e.to_string()))?
                .to_string();
            Ok(Some(hash))
        }
        _ => {
            tracing::warn!("no ADMIN_PASSWORD or ADMIN_PASSWORD_HASH set; admin login disabled");
            Ok(None)
        }
    }
}
