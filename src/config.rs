use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Server settings, read from a TOML file. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// sqlx connection url of the course database
    pub database: String,
    pub host: String,
    pub port: u16,
    /// Directory for rotated log files; stdout when unset
    pub log_dir: Option<PathBuf>,
    /// Idle days before a session expires
    pub session_days: i64,
    /// Number of course outlines kept in memory
    pub outline_cache_capacity: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: "sqlite://database/course.db".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_dir: None,
            session_days: 5,
            outline_cache_capacity: 1000,
        }
    }
}

impl Config {
    /// Load `path` if it exists, then apply `COURSE_NAV_DATABASE` from the
    /// environment or a `.env` file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("parse config {}", path.display()))?
        } else {
            Config::default()
        };
        let _ = dotenvy::dotenv();
        if let Ok(database) = dotenvy::var("COURSE_NAV_DATABASE") {
            config.database = database;
        }
        Ok(config)
    }
}
