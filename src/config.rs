use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::models::Category;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub backend: BackendSettings,
    #[serde(default)]
    pub feed: FeedSettings,
    #[serde(default)]
    pub pagination: PaginationSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8088 }

#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    pub base_url: String,
    pub timeout_secs: Option<u64>,
    pub inbox_timeout_secs: Option<u64>,
    pub inbox_buffer: Option<usize>,
}

impl BackendSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(30))
    }

    pub fn inbox_timeout(&self) -> Duration {
        Duration::from_secs(self.inbox_timeout_secs.unwrap_or(15))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedSettings {
    #[serde(default = "default_target_city")]
    pub target_city: String,
    #[serde(default = "default_presentation_ms")]
    pub presentation_ms: u64,
    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold: f64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            target_city: default_target_city(),
            presentation_ms: default_presentation_ms(),
            swipe_threshold: default_swipe_threshold(),
        }
    }
}

impl FeedSettings {
    pub fn presentation(&self) -> Duration {
        Duration::from_millis(self.presentation_ms)
    }
}

fn default_target_city() -> String { "Jaipur".to_string() }
fn default_presentation_ms() -> u64 { 300 }
fn default_swipe_threshold() -> f64 { crate::core::DEFAULT_SWIPE_THRESHOLD }

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationSettings {
    #[serde(default = "default_merge_categories")]
    pub merge_categories: Vec<Category>,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            merge_categories: default_merge_categories(),
        }
    }
}

fn default_merge_categories() -> Vec<Category> { vec![Category::Inbox] }

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    pub token_ttl_secs: Option<u64>,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            token_ttl_secs: None,
            idle_timeout_secs: default_idle_timeout_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_idle_timeout_secs() -> u64 { 1800 }
fn default_max_sessions() -> u64 { 256 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "pretty".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Later sources override earlier ones:
    /// 1. Serde defaults
    /// 2. config/default.toml
    /// 3. config/local.toml
    /// 4. Environment variables prefixed with TRIPMATE (TRIPMATE__BACKEND__BASE_URL -> backend.base_url)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("TRIPMATE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let settings: Settings = toml::from_str(
            r#"
            [backend]
            base_url = "https://api.tripmate.test"
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.port, 8088);
        assert_eq!(settings.feed.target_city, "Jaipur");
        assert_eq!(settings.feed.swipe_threshold, 50.0);
        assert_eq!(settings.feed.presentation(), Duration::from_millis(300));
        assert_eq!(settings.pagination.merge_categories, vec![Category::Inbox]);
        assert_eq!(settings.backend.timeout(), Duration::from_secs(30));
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_overrides() {
        let settings: Settings = toml::from_str(
            r#"
            [backend]
            base_url = "https://api.tripmate.test"
            timeout_secs = 5

            [feed]
            target_city = "Goa"
            presentation_ms = 0

            [pagination]
            merge_categories = ["inbox", "requests"]
            "#,
        )
        .unwrap();

        assert_eq!(settings.backend.timeout(), Duration::from_secs(5));
        assert_eq!(settings.feed.target_city, "Goa");
        assert!(settings.feed.presentation().is_zero());
        assert_eq!(settings.pagination.merge_categories.len(), 2);
    }
}
