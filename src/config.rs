use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use log::{info, warn};

use crate::delay_manager::{self, MAX_DELAY_SECS};
use crate::error::ConfigError;

pub const CONFIG_ENV: &str = "SCRAPER_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "scraper.toml";

/// Longest listing wait accepted from the config file.
pub const MAX_WAIT_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Listing page to render
    pub target_url: String,

    /// Origin prepended to each relative job href
    pub site_origin: String,

    /// Raw markup of the last successful render
    pub debug_artifact: PathBuf,

    pub csv_path: PathBuf,

    /// Optional case-insensitive title filter
    pub keyword: Option<String>,

    pub browser: BrowserSettings,
    pub sheets: SheetSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run Chrome without a visible window
    pub headless: bool,

    pub user_agent: String,

    /// How long to wait for the first listing to appear, in seconds
    pub wait_timeout_secs: u64,

    /// Bounds of the random pause taken after the listings appear
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,

    pub window_size: (u32, u32),
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SheetSettings {
    pub enabled: bool,
    pub credentials_path: PathBuf,
    pub sheet_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: "https://remoteok.com/remote-sales-marketing-jobs".to_string(),
            site_origin: "https://remoteok.com".to_string(),
            debug_artifact: PathBuf::from("debug.html"),
            csv_path: PathBuf::from("data/remoteok_jobs.csv"),
            keyword: None,
            browser: BrowserSettings::default(),
            sheets: SheetSettings::default(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            wait_timeout_secs: 20,
            min_delay_secs: 2.0,
            max_delay_secs: 5.0,
            window_size: (1920, 1080),
        }
    }
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            credentials_path: PathBuf::from("credentials.json"),
            sheet_name: "job_postings".to_string(),
        }
    }
}

impl BrowserSettings {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs.min(MAX_WAIT_TIMEOUT_SECS))
    }

    /// Upper delay bound, clamped to what the pacing delay will honour.
    pub fn max_delay(&self) -> Duration {
        Duration::from_secs_f64(delay_manager::clamp_secs(self.max_delay_secs))
    }

    /// Replaces out-of-range timing values with the defaults.
    fn sanitize(&mut self) {
        let defaults = BrowserSettings::default();

        let in_range = |s: f64| s.is_finite() && (0.0..=MAX_DELAY_SECS).contains(&s);
        if !in_range(self.min_delay_secs) || !in_range(self.max_delay_secs) {
            warn!(
                "Delay bounds [{}, {}] must lie within [0, {}] seconds. Using [{}, {}].",
                self.min_delay_secs,
                self.max_delay_secs,
                MAX_DELAY_SECS,
                defaults.min_delay_secs,
                defaults.max_delay_secs
            );
            self.min_delay_secs = defaults.min_delay_secs;
            self.max_delay_secs = defaults.max_delay_secs;
        }

        if self.wait_timeout_secs == 0 || self.wait_timeout_secs > MAX_WAIT_TIMEOUT_SECS {
            warn!(
                "wait_timeout_secs = {} must lie within [1, {}]. Using {}.",
                self.wait_timeout_secs, MAX_WAIT_TIMEOUT_SECS, defaults.wait_timeout_secs
            );
            self.wait_timeout_secs = defaults.wait_timeout_secs;
        }
    }
}

impl Config {
    /// Loads `$SCRAPER_CONFIG` or `scraper.toml`. A missing file means
    /// defaults; an unreadable or invalid one is logged and also falls back.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if !path.exists() {
            info!("No config file at {:?}. Using defaults.", path);
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(cfg) => {
                info!("Loaded config from {:?}", path);
                cfg
            }
            Err(e) => {
                warn!("{}. Using defaults.", e);
                Self::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(content)?;
        config.browser.sanitize();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.site_origin, "https://remoteok.com");
        assert_eq!(config.csv_path, PathBuf::from("data/remoteok_jobs.csv"));
        assert_eq!(config.browser.wait_timeout(), Duration::from_secs(20));
        assert_eq!(config.browser.min_delay_secs, 2.0);
        assert_eq!(config.browser.max_delay_secs, 5.0);
        assert_eq!(config.sheets.sheet_name, "job_postings");
        assert!(config.keyword.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            keyword = "sales"

            [browser]
            headless = false
            wait_timeout_secs = 5

            [sheets]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.keyword.as_deref(), Some("sales"));
        assert!(!config.browser.headless);
        assert_eq!(config.browser.wait_timeout_secs, 5);
        assert_eq!(config.browser.max_delay_secs, 5.0);
        assert!(!config.sheets.enabled);
        assert_eq!(config.sheets.credentials_path, PathBuf::from("credentials.json"));
        assert_eq!(config.target_url, Config::default().target_url);
    }

    #[test]
    fn test_infinite_delay_falls_back_to_defaults() {
        let config = Config::from_toml(
            r#"
            [browser]
            min_delay_secs = 1.0
            max_delay_secs = inf
            "#,
        )
        .unwrap();

        assert_eq!(config.browser.min_delay_secs, 2.0);
        assert_eq!(config.browser.max_delay_secs, 5.0);
        assert_eq!(config.browser.max_delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_out_of_range_timing_falls_back_to_defaults() {
        let config = Config::from_toml(
            r#"
            [browser]
            min_delay_secs = -1.0
            max_delay_secs = 1e300
            wait_timeout_secs = 9999999999
            "#,
        )
        .unwrap();

        assert_eq!(config.browser.min_delay_secs, 2.0);
        assert_eq!(config.browser.max_delay_secs, 5.0);
        assert_eq!(config.browser.wait_timeout_secs, 20);
    }

    #[test]
    fn test_hand_built_settings_are_clamped() {
        let settings = BrowserSettings {
            wait_timeout_secs: u64::MAX,
            max_delay_secs: f64::INFINITY,
            ..BrowserSettings::default()
        };
        assert_eq!(settings.wait_timeout(), Duration::from_secs(MAX_WAIT_TIMEOUT_SECS));
        assert_eq!(settings.max_delay(), Duration::from_secs_f64(MAX_DELAY_SECS));
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "target_url = [not toml").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
