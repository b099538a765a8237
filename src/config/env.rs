// src/config/env.rs
// DOCUMENTATION: Environment variable management
// PURPOSE: Load and validate configuration from .env files

use crate::services::{MergeStrategy, NormalizationMethod};
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Application configuration loaded from environment variables
/// DOCUMENTATION: Centralizes all configuration in one struct
/// Load with Config::from_env() at application startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "127.0.0.1")
    pub server_address: String,

    /// Server listen port (default 8003)
    pub server_port: u16,

    /// Environment: development, staging, production
    pub environment: String,

    /// Log level: debug, info, warn, error
    pub log_level: String,

    /// Directory holding one columnar file per lens
    pub data_dir: PathBuf,

    /// Aggregation bin size in degrees (~1 km at 0.01)
    pub bin_size_deg: f64,

    /// How samples sharing a bin are merged
    pub merge_strategy: MergeStrategy,

    /// How aggregated similarities are rescaled to [0, 1]
    pub normalization: NormalizationMethod,

    /// Top-K similarity search backend endpoint
    pub search_backend_url: String,

    /// Timeout for backend search calls in seconds
    pub search_timeout_secs: u64,

    /// Outgoing search requests allowed per second
    pub search_rate_limit_per_sec: u32,

    /// Maximum number of cached tile layouts
    pub tile_cache_capacity: usize,

    /// Tile layout cache TTL in seconds
    pub tile_cache_ttl_secs: u64,

    /// Admin authentication token (for stats and cache endpoints)
    pub admin_token: String,

    /// Settings whose values could not be parsed, as `KEY="value"`
    pub rejected_vars: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    /// DOCUMENTATION: Reads from .env or process environment
    /// Called once at application startup
    pub fn from_env() -> Self {
        // Load .env file if it exists
        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup
    /// DOCUMENTATION: Pipeline choices that fail to parse are recorded in
    /// `rejected_vars` and make `validate()` fail instead of falling back
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut rejected_vars = Vec::new();

        Config {
            server_address: lookup("SERVER_ADDRESS").unwrap_or_else(|| "127.0.0.1".to_string()),

            server_port: parse_var(&lookup, "SERVER_PORT", 8003),

            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            data_dir: lookup("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),

            bin_size_deg: parse_var(&lookup, "BIN_SIZE_DEG", 0.01),

            merge_strategy: parse_choice(
                &lookup,
                "MERGE_STRATEGY",
                MergeStrategy::Pairwise,
                &mut rejected_vars,
            ),

            normalization: parse_choice(
                &lookup,
                "NORMALIZATION",
                NormalizationMethod::Percentile,
                &mut rejected_vars,
            ),

            search_backend_url: lookup("SEARCH_BACKEND_URL")
                .unwrap_or_else(|| "http://localhost:5000/api/search".to_string()),

            search_timeout_secs: parse_var(&lookup, "SEARCH_TIMEOUT_SECS", 30),

            search_rate_limit_per_sec: parse_var(&lookup, "SEARCH_RATE_LIMIT_PER_SEC", 5),

            tile_cache_capacity: parse_var(&lookup, "TILE_CACHE_CAPACITY", 512),

            tile_cache_ttl_secs: parse_var(&lookup, "TILE_CACHE_TTL_SECS", 300),

            admin_token: lookup("ADMIN_TOKEN").unwrap_or_else(|| "admin-token-dev".to_string()),

            rejected_vars,
        }
    }

    /// Validate critical configuration
    /// DOCUMENTATION: Ensures application can start safely
    pub fn validate(&self) -> Result<(), String> {
        if !self.rejected_vars.is_empty() {
            return Err(format!(
                "unrecognized values: {} (MERGE_STRATEGY: pairwise|weighted, NORMALIZATION: percentile|minmax)",
                self.rejected_vars.join(", ")
            ));
        }

        if !(self.bin_size_deg.is_finite() && self.bin_size_deg > 0.0) {
            return Err(format!(
                "BIN_SIZE_DEG must be a positive number, got {}",
                self.bin_size_deg
            ));
        }

        if self.search_rate_limit_per_sec == 0 {
            return Err("SEARCH_RATE_LIMIT_PER_SEC must be at least 1".to_string());
        }

        if self.tile_cache_capacity == 0 {
            return Err("TILE_CACHE_CAPACITY must be at least 1".to_string());
        }

        if !self.data_dir.is_dir() {
            log::warn!(
                "DATA_DIR {} does not exist - every lens will report no data",
                self.data_dir.display()
            );
        }

        if self.admin_token == "admin-token-dev" && self.environment == "production" {
            log::warn!("ADMIN_TOKEN is still the development default");
        }

        Ok(())
    }
}

/// Read and parse a setting, falling back to the default when it is
/// missing or malformed.
fn parse_var<T: FromStr>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring malformed {}={:?}, using default", key, raw);
            default
        }),
        None => default,
    }
}

/// Read a setting that changes pipeline output; a malformed value is
/// recorded instead of replaced
fn parse_choice<T: FromStr>(
    lookup: impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    rejected: &mut Vec<String>,
) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::error!("Unrecognized {}={:?}", key, raw);
            rejected.push(format!("{}={:?}", key, raw));
            default
        }),
        None => default,
    }
}
