//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use annonces_shared::constants::DEFAULT_PAGE_SIZE;

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `annonces.db` in the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Directory where uploaded listing images are written.
    /// Env: `MEDIA_STORAGE_PATH`
    /// Default: `./uploads`
    pub media_storage_path: PathBuf,

    /// Maximum upload size in bytes.
    /// Env: `MAX_UPLOAD_SIZE`
    /// Default: 10 MiB
    pub max_upload_size: usize,

    /// Bearer token granting the admin role.
    /// Env: `ADMIN_TOKEN`
    /// Default: empty (admin API disabled).
    pub admin_token: Option<String>,

    /// Bearer token granting the analyst role.
    /// Env: `ANALYST_TOKEN`
    /// Default: empty (only admins see analytics).
    pub analyst_token: Option<String>,

    /// Listings per search page.
    /// Env: `PAGE_SIZE`
    /// Default: `9`
    pub page_size: u32,

    /// Fill an empty catalog with sample listings at startup.
    /// Env: `SEED_DEMO` (`1`/`true`/`yes`)
    /// Default: off
    pub seed_demo: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 8080).into(),
            database_path: None,
            media_storage_path: PathBuf::from("./uploads"),
            max_upload_size: 10 * 1024 * 1024, // 10 MiB
            admin_token: None,
            analyst_token: None,
            page_size: DEFAULT_PAGE_SIZE,
            seed_demo: false,
        }
    }
}

// Tokens stay out of logs.
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("database_path", &self.database_path)
            .field("media_storage_path", &self.media_storage_path)
            .field("max_upload_size", &self.max_upload_size)
            .field("admin_enabled", &self.admin_token.is_some())
            .field("analyst_enabled", &self.analyst_token.is_some())
            .field("page_size", &self.page_size)
            .field("seed_demo", &self.seed_demo)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = var("DATABASE_PATH").filter(|p| !p.is_empty()) {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Some(path) = var("MEDIA_STORAGE_PATH").filter(|p| !p.is_empty()) {
            config.media_storage_path = PathBuf::from(path);
        }

        if let Some(val) = var("MAX_UPLOAD_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_upload_size = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_UPLOAD_SIZE, using default"),
            }
        }

        config.admin_token = var("ADMIN_TOKEN").filter(|t| !t.is_empty());
        config.analyst_token = var("ANALYST_TOKEN").filter(|t| !t.is_empty());

        if let Some(val) = var("PAGE_SIZE") {
            match val.parse::<u32>() {
                Ok(n) if n > 0 => config.page_size = n,
                _ => tracing::warn!(value = %val, "Invalid PAGE_SIZE, using default"),
            }
        }

        if let Some(val) = var("SEED_DEMO") {
            match val.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => config.seed_demo = true,
                "" | "0" | "false" | "no" => config.seed_demo = false,
                _ => tracing::warn!(value = %val, "Invalid SEED_DEMO, demo seeding stays off"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.page_size, 9);
        assert_eq!(config.max_upload_size, 10 * 1024 * 1024);
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HTTP_ADDR", "127.0.0.1:3000"),
            ("DATABASE_PATH", "/tmp/annonces.db"),
            ("ADMIN_TOKEN", "s3cret"),
            ("ANALYST_TOKEN", ""),
            ("PAGE_SIZE", "12"),
        ]);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 3000).into());
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/annonces.db")));
        assert_eq!(config.admin_token.as_deref(), Some("s3cret"));
        assert!(config.analyst_token.is_none());
        assert_eq!(config.page_size, 12);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = config_from(&[
            ("HTTP_ADDR", "not an address"),
            ("MAX_UPLOAD_SIZE", "-5"),
            ("PAGE_SIZE", "0"),
        ]);
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.max_upload_size, 10 * 1024 * 1024);
        assert_eq!(config.page_size, 9);
    }

    #[test]
    fn test_seed_demo_flag() {
        assert!(config_from(&[("SEED_DEMO", "true")]).seed_demo);
        assert!(config_from(&[("SEED_DEMO", "1")]).seed_demo);
        assert!(!config_from(&[("SEED_DEMO", "0")]).seed_demo);
        assert!(!config_from(&[("SEED_DEMO", "maybe")]).seed_demo);
        assert!(!config_from(&[]).seed_demo);
    }

    #[test]
    fn test_debug_hides_tokens() {
        let config = config_from(&[("ADMIN_TOKEN", "s3cret")]);
        let printed = format!("{config:?}");
        assert!(!printed.contains("s3cret"));
        assert!(printed.contains("admin_enabled: true"));
    }
}
