/// Configuration management for the flowver service
///
/// Handles server binding, database location, the graph-engine endpoint and
/// comparison runtime parameters.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Graph-engine and comparison configuration
    pub compare: CompareConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL (default: "sqlite://flowver.db?mode=rwc")
    pub url: String,
}

/// Comparison engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Endpoint of the external graph-execution engine
    pub engine_url: String,
    /// History window handed to every executor call
    pub history_window: u32,
    /// Cap on concurrently running comparison tasks
    pub max_concurrency: usize,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("FLOWVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("FLOWVER_PORT")
                    .unwrap_or_else(|_| "3006".to_string())
                    .parse()
                    .unwrap_or(3006),
            },
            database: DatabaseConfig {
                url: std::env::var("FLOWVER_DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://flowver.db?mode=rwc".to_string()),
            },
            compare: CompareConfig {
                engine_url: std::env::var("FLOWVER_ENGINE_URL")
                    .unwrap_or_else(|_| "http://127.0.0.1:7860/execute".to_string()),
                history_window: std::env::var("FLOWVER_HISTORY_WINDOW")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                max_concurrency: std::env::var("FLOWVER_COMPARE_CONCURRENCY")
                    .unwrap_or_else(|_| "8".to_string())
                    .parse()
                    .unwrap_or(8),
            },
        }
    }
}
