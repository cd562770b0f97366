use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Most recent entries the regime analyzer inspects.
pub const DEFAULT_HISTORY_WINDOW: usize = 7;
/// Most recent entries the history store keeps.
pub const DEFAULT_HISTORY_RETENTION: usize = 30;
pub const DEFAULT_DATABASE_URL: &str = "sqlite:capital_flow.db";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
    #[error("HISTORY_RETENTION ({retention}) must be at least HISTORY_WINDOW ({window})")]
    RetentionBelowWindow { window: usize, retention: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub history_window: usize,
    pub history_retention: usize,
    pub catalog_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            history_window: DEFAULT_HISTORY_WINDOW,
            history_retention: DEFAULT_HISTORY_RETENTION,
            catalog_path: None,
        }
    }
}

impl AppConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let history_window = parse_positive(&lookup, "HISTORY_WINDOW", defaults.history_window)?;
        let history_retention =
            parse_positive(&lookup, "HISTORY_RETENTION", defaults.history_retention)?;
        if history_retention < history_window {
            return Err(ConfigError::RetentionBelowWindow {
                window: history_window,
                retention: history_retention,
            });
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            history_window,
            history_retention,
            catalog_path: lookup("CATALOG_PATH")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn parse_positive<F>(lookup: &F, key: &'static str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::InvalidNumber { key, value: raw }),
        },
    }
}
