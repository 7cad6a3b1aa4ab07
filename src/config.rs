use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RapportConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub classifier: ClassifierConfig,
    pub retrieval: RetrievalConfig,
    pub mood: MoodConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    /// Key-value backend. Currently only `memory` ships; the trait in
    /// `kv` is where a networked backend would plug in.
    pub backend: String,
    /// Most recent memories kept per user; older entries fall off.
    pub memory_cap: usize,
    pub memory_ttl_days: u64,
    pub mood_ttl_days: u64,
    pub history_cap: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClassifierConfig {
    /// `lexicon` (offline keyword matcher) or `http` (completion endpoint
    /// with the lexicon as fallback).
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Minimum spacing between upstream calls.
    pub min_interval_ms: u64,
    /// Calls per rolling minute before degrading to the lexicon.
    pub per_minute_cap: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub max_results: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MoodConfig {
    /// Time constant for the exponential recency weight on mood entries.
    pub decay_hours: f64,
    pub trend_window_days: u32,
    pub trend_recent_days: usize,
    pub trend_threshold: f64,
}

impl Default for RapportConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            classifier: ClassifierConfig::default(),
            retrieval: RetrievalConfig::default(),
            mood: MoodConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8600,
            log_level: "info".into(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "memory".into(),
            memory_cap: 100,
            memory_ttl_days: 90,
            mood_ttl_days: 30,
            history_cap: 50,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: "lexicon".into(),
            endpoint: String::new(),
            model: "local".into(),
            api_key: None,
            timeout_secs: 10,
            min_interval_ms: 1000,
            per_minute_cap: 30,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { max_results: 10 }
    }
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            decay_hours: 24.0,
            trend_window_days: 7,
            trend_recent_days: 3,
            trend_threshold: 0.1,
        }
    }
}

/// Returns `~/.rapport/`
pub fn default_rapport_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".rapport")
}

/// Returns the default config file path: `~/.rapport/config.toml`
pub fn default_config_path() -> PathBuf {
    default_rapport_dir().join("config.toml")
}

impl RapportConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            RapportConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (RAPPORT_PORT, RAPPORT_LOG_LEVEL,
    /// RAPPORT_CLASSIFIER_ENDPOINT, RAPPORT_CLASSIFIER_API_KEY).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("RAPPORT_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("ignoring unparseable RAPPORT_PORT: {val}"),
            }
        }
        if let Ok(val) = std::env::var("RAPPORT_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("RAPPORT_CLASSIFIER_ENDPOINT") {
            self.classifier.endpoint = val;
        }
        if let Ok(val) = std::env::var("RAPPORT_CLASSIFIER_API_KEY") {
            self.classifier.api_key = Some(val);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tests that touch process env vars (directly or through load_from)
    // serialize on this; cargo runs tests in threads within one process.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn default_config_is_valid() {
        let config = RapportConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8600);
        assert_eq!(config.store.backend, "memory");
        assert_eq!(config.store.memory_cap, 100);
        assert_eq!(config.classifier.provider, "lexicon");
        assert_eq!(config.classifier.per_minute_cap, 30);
        assert!((config.mood.decay_hours - 24.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
port = 9000
log_level = "debug"

[store]
memory_cap = 20
history_cap = 10

[classifier]
provider = "http"
endpoint = "http://localhost:11434/v1/completions"
"#;
        let config: RapportConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.store.memory_cap, 20);
        assert_eq!(config.store.history_cap, 10);
        assert_eq!(config.classifier.provider, "http");
        // defaults still apply for unset fields
        assert_eq!(config.store.memory_ttl_days, 90);
        assert_eq!(config.retrieval.max_results, 10);
        assert_eq!(config.mood.trend_recent_days, 3);
    }

    #[test]
    fn load_from_reads_file_and_missing_file_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9100\n").unwrap();

        let config = RapportConfig::load_from(&path).unwrap();
        assert_eq!(config.server.port, 9100);

        let config = RapportConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.port, 8600);
    }

    #[test]
    fn env_overrides_apply() {
        let _guard = ENV_LOCK.lock().unwrap();
        let mut config = RapportConfig::default();
        std::env::set_var("RAPPORT_PORT", "7777");
        std::env::set_var("RAPPORT_LOG_LEVEL", "trace");
        std::env::set_var("RAPPORT_CLASSIFIER_ENDPOINT", "http://localhost:9999");
        std::env::set_var("RAPPORT_CLASSIFIER_API_KEY", "sk-test");

        config.apply_env_overrides();

        assert_eq!(config.server.port, 7777);
        assert_eq!(config.server.log_level, "trace");
        assert_eq!(config.classifier.endpoint, "http://localhost:9999");
        assert_eq!(config.classifier.api_key.as_deref(), Some("sk-test"));

        // Clean up
        std::env::remove_var("RAPPORT_PORT");
        std::env::remove_var("RAPPORT_LOG_LEVEL");
        std::env::remove_var("RAPPORT_CLASSIFIER_ENDPOINT");
        std::env::remove_var("RAPPORT_CLASSIFIER_API_KEY");
    }

    #[test]
    fn unparseable_port_is_ignored() {
        let _guard = ENV_LOCK.lock().unwrap();
        let mut config = RapportConfig::default();
        std::env::set_var("RAPPORT_PORT", "not-a-port");
        config.apply_env_overrides();
        assert_eq!(config.server.port, 8600);
        std::env::remove_var("RAPPORT_PORT");
    }
}
