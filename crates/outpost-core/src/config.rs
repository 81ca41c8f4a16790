//! Configuration management for Outpost.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration.
///
/// This is loaded from `~/.config/outpost/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Source page and scrape pacing settings
    pub scraping: ScrapingConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Address geocoding settings
    pub geocoding: GeocodingConfig,
    /// Outlet storage settings
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `OUTPOST_HEADLESS`: Override browser headless mode (true/false)
    /// - `OUTPOST_REGION`: Override the region filter value
    /// - `OUTPOST_TARGET_URL`: Override the locator page URL
    /// - `OUTPOST_DB_PATH`: Override the database file path
    /// - `OUTPOST_GEOCODING_ENABLED`: Override address geocoding (true/false)
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup, typically the process environment.
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("OUTPOST_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Some(region) = lookup("OUTPOST_REGION") {
            if !region.trim().is_empty() {
                tracing::debug!("Override scraping.region from env: {}", region);
                self.scraping.region = region;
            }
        }

        if let Some(url) = lookup("OUTPOST_TARGET_URL") {
            if !url.trim().is_empty() {
                tracing::debug!("Override scraping.target_url from env: {}", url);
                self.scraping.target_url = url;
            }
        }

        if let Some(path) = lookup("OUTPOST_DB_PATH") {
            if !path.trim().is_empty() {
                tracing::debug!("Override database.path from env: {}", path);
                self.database.path = Some(PathBuf::from(path));
            }
        }

        if let Some(val) = lookup("OUTPOST_GEOCODING_ENABLED") {
            if let Ok(enabled) = val.parse() {
                self.geocoding.enabled = enabled;
                tracing::debug!("Override geocoding.enabled from env: {}", enabled);
            }
        }
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/outpost/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "outpost", "outpost").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/outpost`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "outpost", "outpost").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Resolve the database file, defaulting to `outlets.db` in the data directory.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("outlets.db")),
        }
    }
}

/// Source page, selector and pacing settings for one scrape run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Outlet locator page
    pub target_url: String,
    /// Option value selected in the region filter
    pub region: String,
    /// Brand token every outlet name carries
    pub brand: String,
    /// Visible label of the per-outlet navigation control
    pub navigation_label: String,
    /// Root element rendered by the client-side app
    pub app_selector: String,
    /// Region `<select>` control
    pub filter_selector: String,
    /// Control that applies the region filter
    pub trigger_selector: String,
    /// Element holding the outlet containers
    pub results_selector: String,
    /// A container strategy must match more than this many elements
    pub min_containers: usize,
    /// How long to wait for the page controls before giving up
    pub interactive_timeout_ms: u64,
    /// How long to wait for the results list to populate
    pub results_timeout_ms: u64,
    /// How long to wait for navigation controls to render
    pub navigation_ready_timeout_ms: u64,
    /// Pause after triggering the region filter
    pub filter_settle_ms: u64,
    /// Fixed wait used when navigation controls never became ready
    pub navigation_fallback_wait_ms: u64,
    /// Settle interval after clicking a navigation control
    pub capture_settle_ms: u64,
    /// Extra wait before the first outlet is processed
    pub first_outlet_wait_ms: u64,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            target_url: "https://www.mcdonalds.com.my/locate-us".to_string(),
            region: "Kuala Lumpur".to_string(),
            brand: "McDonald's".to_string(),
            navigation_label: "Waze".to_string(),
            app_selector: "#app".to_string(),
            filter_selector: "#states".to_string(),
            trigger_selector: "#search-now".to_string(),
            results_selector: "#results".to_string(),
            min_containers: 10,
            interactive_timeout_ms: 30_000,
            results_timeout_ms: 15_000,
            navigation_ready_timeout_ms: 15_000,
            filter_settle_ms: 3_000,
            navigation_fallback_wait_ms: 5_000,
            capture_settle_ms: 4_000,
            first_outlet_wait_ms: 2_000,
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
    /// Use a randomized user agent and window size instead of the configured one
    pub randomize_fingerprint: bool,
    /// Explicit Chrome/Chromium binary; auto-detected when absent
    pub executable_path: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            navigation_timeout_secs: 30,
            randomize_fingerprint: false,
            executable_path: None,
        }
    }
}

/// Address geocoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Whether address geocoding is attempted at all
    pub enabled: bool,
    /// Nominatim-compatible service root
    pub base_url: String,
    /// User agent sent to the service (Nominatim requires a descriptive one)
    pub user_agent: String,
    /// ISO country code restricting results
    pub country_code: String,
    /// City appended to addresses and used as the last-resort variant
    pub city: String,
    /// Country appended to addresses and queries
    pub country: String,
    /// Minimum spacing between requests in milliseconds
    pub min_interval_ms: u64,
    /// Attempts per query before giving up
    pub max_retries: u32,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "Outpost/0.1.0 (+https://github.com/outpost-geo/outpost)".to_string(),
            country_code: "my".to_string(),
            city: "Kuala Lumpur".to_string(),
            country: "Malaysia".to_string(),
            min_interval_ms: 1_000,
            max_retries: 3,
            timeout_secs: 10,
        }
    }
}

/// Outlet storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Persist outlets as they are accepted
    pub enabled: bool,
    /// Database file; defaults to the data directory
    pub path: Option<PathBuf>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.scraping.region, "Kuala Lumpur");
        assert_eq!(config.scraping.min_containers, 10);
        assert_eq!(config.scraping.capture_settle_ms, 4_000);
        assert!(config.browser.headless);
        assert!(config.geocoding.enabled);
        assert_eq!(config.geocoding.min_interval_ms, 1_000);
        assert_eq!(config.geocoding.max_retries, 3);
        assert!(config.database.path.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[scraping]"));
        assert!(toml_str.contains("[browser]"));
        assert!(toml_str.contains("[geocoding]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.scraping.target_url, config.scraping.target_url);
        assert_eq!(parsed.geocoding.user_agent, config.geocoding.user_agent);
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");

        let mut config = AppConfig::default();
        config.scraping.region = "Selangor".to_string();
        config.database.path = Some(tmp.path().join("outlets.db"));

        let contents = toml::to_string_pretty(&config).expect("serialize config");
        fs::write(&config_path, contents).expect("write config file");

        let loaded_contents = fs::read_to_string(&config_path).expect("read config file");
        let loaded: AppConfig = toml::from_str(&loaded_contents).expect("parse loaded config");

        assert_eq!(loaded.scraping.region, "Selangor");
        assert_eq!(loaded.database.path, Some(tmp.path().join("outlets.db")));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("OUTPOST_HEADLESS", "false"),
            ("OUTPOST_REGION", "Selangor"),
            ("OUTPOST_DB_PATH", "/tmp/outpost-test.db"),
            ("OUTPOST_GEOCODING_ENABLED", "not-a-bool"),
        ]);

        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| vars.get(key).map(|v| (*v).to_string()));

        assert!(!config.browser.headless);
        assert_eq!(config.scraping.region, "Selangor");
        assert_eq!(
            config.database.path,
            Some(PathBuf::from("/tmp/outpost-test.db"))
        );
        // Unparseable values leave the default in place
        assert!(config.geocoding.enabled);
    }

    #[test]
    fn test_database_path_prefers_explicit() {
        let mut config = AppConfig::default();
        config.database.path = Some(PathBuf::from("/data/outlets.db"));
        assert_eq!(
            config.database_path().expect("resolve path"),
            PathBuf::from("/data/outlets.db")
        );
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[scraping]
region = "Penang"

[geocoding]
min_interval_ms = 1500
"#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.scraping.region, "Penang");
        assert_eq!(config.geocoding.min_interval_ms, 1500);
        // These should be defaults
        assert_eq!(config.scraping.filter_selector, "#states");
        assert_eq!(config.geocoding.country_code, "my");
        assert!(config.browser.headless);
    }
}
