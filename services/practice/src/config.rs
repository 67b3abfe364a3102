//! services/practice/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use dental_core::ports::LatencyRange;
use std::path::PathBuf;
use tracing::Level;

/// Default probability that a single workflow step fails.
pub const DEFAULT_FAILURE_RATE: f64 = 0.05;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub log_level: Level,
    /// Directory for the file-backed store. `None` keeps data in memory.
    pub storage_dir: Option<PathBuf>,
    /// Byte quota for the in-memory store. Ignored when `storage_dir` is set.
    pub storage_quota_bytes: Option<usize>,
    pub failure_rate: f64,
    pub simulate_latency: bool,
    pub storage_latency: LatencyRange,
    pub auth_latency: LatencyRange,
    pub backup_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            storage_dir: None,
            storage_quota_bytes: None,
            failure_rate: DEFAULT_FAILURE_RATE,
            simulate_latency: true,
            storage_latency: LatencyRange::STORAGE,
            auth_latency: LatencyRange::AUTH,
            backup_dir: PathBuf::from("./backups"),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        // --- Logging ---
        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Storage ---
        let storage_dir = lookup("DENTAL_STORAGE_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let storage_quota_bytes = lookup("DENTAL_STORAGE_QUOTA_BYTES")
            .map(|raw| {
                raw.parse::<usize>().map_err(|e| {
                    let var = "DENTAL_STORAGE_QUOTA_BYTES".to_string();
                    ConfigError::InvalidValue(var, e.to_string())
                })
            })
            .transpose()?;

        let backup_dir = lookup("DENTAL_BACKUP_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.backup_dir);

        // --- Simulation ---
        let failure_rate = match lookup("DENTAL_FAILURE_RATE") {
            Some(raw) => {
                let rate = raw.parse::<f64>().map_err(|e| {
                    ConfigError::InvalidValue("DENTAL_FAILURE_RATE".to_string(), e.to_string())
                })?;
                if !(0.0..=1.0).contains(&rate) {
                    return Err(ConfigError::InvalidValue(
                        "DENTAL_FAILURE_RATE".to_string(),
                        format!("{} is outside 0.0..=1.0", rate),
                    ));
                }
                rate
            }
            None => defaults.failure_rate,
        };

        let simulate_latency = match lookup("DENTAL_SIMULATE_LATENCY") {
            Some(raw) => parse_bool("DENTAL_SIMULATE_LATENCY", &raw)?,
            None => defaults.simulate_latency,
        };

        let storage_latency = match lookup("DENTAL_READ_LATENCY_MS") {
            Some(raw) => parse_latency("DENTAL_READ_LATENCY_MS", &raw)?,
            None => defaults.storage_latency,
        };
        let auth_latency = match lookup("DENTAL_AUTH_LATENCY_MS") {
            Some(raw) => parse_latency("DENTAL_AUTH_LATENCY_MS", &raw)?,
            None => defaults.auth_latency,
        };

        Ok(Self {
            log_level,
            storage_dir,
            storage_quota_bytes,
            failure_rate,
            simulate_latency,
            storage_latency,
            auth_latency,
            backup_dir,
        })
    }
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue(
            var.to_string(),
            format!("'{}' is not a boolean", other),
        )),
    }
}

/// Parses `MIN-MAX` in milliseconds.
fn parse_latency(var: &str, raw: &str) -> Result<LatencyRange, ConfigError> {
    let invalid = || {
        ConfigError::InvalidValue(var.to_string(), format!("'{}' is not MIN-MAX", raw))
    };

    let (min, max) = raw.split_once('-').ok_or_else(invalid)?;
    let min = min.trim().parse::<u64>().map_err(|_| invalid())?;
    let max = max.trim().parse::<u64>().map_err(|_| invalid())?;
    if min > max {
        return Err(invalid());
    }
    Ok(LatencyRange::from_millis(min, max))
}
