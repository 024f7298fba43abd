//! Admin backend configuration from environment variables

use std::env;

/// Configuration for the admin backend
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Path to SQLite database file
    pub db_path: String,

    /// Directory holding ordered `.sql` schema files
    pub schema_dir: String,

    /// Socket address the HTTP server binds to
    pub bind_addr: String,

    /// Page size used when a listing request omits `limit`
    pub default_page_limit: u32,

    /// Upper bound applied to any requested `limit`
    pub max_page_limit: u32,

    /// Attach a permissive CORS layer to the router
    pub enable_cors: bool,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            db_path: "minepath.db".to_string(),
            schema_dir: "sql".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            default_page_limit: 10,
            max_page_limit: 100,
            enable_cors: false,
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `MINEPATH_DB_PATH` (default: minepath.db)
    /// - `MINEPATH_SCHEMA_DIR` (default: sql)
    /// - `ADMIN_BIND_ADDR` (default: 0.0.0.0:3000)
    /// - `DEFAULT_PAGE_LIMIT` (default: 10)
    /// - `MAX_PAGE_LIMIT` (default: 100)
    /// - `ENABLE_CORS` (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let default_page_limit = env::var("DEFAULT_PAGE_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|v: &u32| *v > 0)
            .unwrap_or(defaults.default_page_limit);

        let max_page_limit = env::var("MAX_PAGE_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|v: &u32| *v > 0)
            .unwrap_or(defaults.max_page_limit)
            .max(default_page_limit);

        Self {
            db_path: env::var("MINEPATH_DB_PATH").unwrap_or(defaults.db_path),

            schema_dir: env::var("MINEPATH_SCHEMA_DIR").unwrap_or(defaults.schema_dir),

            bind_addr: env::var("ADMIN_BIND_ADDR").unwrap_or(defaults.bind_addr),

            default_page_limit,

            max_page_limit,

            enable_cors: env::var("ENABLE_CORS")
                .ok()
                .and_then(|s| s.to_lowercase().parse().ok())
                .unwrap_or(defaults.enable_cors),
        }
    }
}
