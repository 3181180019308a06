use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::hackernews::{self, Category};

const DEFAULT_ENV_PREFIX: &str = "CLONERNEWS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub updates: UpdatesConfig,
    #[serde(default)]
    pub ui: UIConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search_url: default_search_url(),
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    hackernews::HN_API_BASE.to_string()
}

fn default_search_url() -> String {
    hackernews::HN_SEARCH_BASE.to_string()
}

fn default_user_agent() -> String {
    format!("clonernews/{}", crate::VERSION)
}

fn default_timeout() -> Duration {
    Duration::from_secs(20)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub default_category: Category,
    /// Rows from the end of the feed at which the next page is requested.
    #[serde(default = "default_load_threshold")]
    pub load_threshold: usize,
    #[serde(default = "default_sidebar_size")]
    pub sidebar_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            default_category: Category::default(),
            load_threshold: default_load_threshold(),
            sidebar_size: default_sidebar_size(),
        }
    }
}

fn default_page_size() -> usize {
    crate::feed::DEFAULT_PAGE_SIZE
}

fn default_load_threshold() -> usize {
    3
}

fn default_sidebar_size() -> usize {
    crate::sidebar::DEFAULT_SIDEBAR_SIZE
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdatesConfig {
    #[serde(default = "default_update_interval", with = "humantime_serde")]
    pub interval: Duration,
    #[serde(default = "default_update_cooldown", with = "humantime_serde")]
    pub cooldown: Duration,
    #[serde(default = "default_max_shown")]
    pub max_shown: usize,
    #[serde(default = "default_banner_duration", with = "humantime_serde")]
    pub banner_duration: Duration,
}

impl Default for UpdatesConfig {
    fn default() -> Self {
        Self {
            interval: default_update_interval(),
            cooldown: default_update_cooldown(),
            max_shown: default_max_shown(),
            banner_duration: default_banner_duration(),
        }
    }
}

fn default_update_interval() -> Duration {
    crate::update::DEFAULT_INTERVAL
}

fn default_update_cooldown() -> Duration {
    crate::update::DEFAULT_COOLDOWN
}

fn default_max_shown() -> usize {
    crate::update::DEFAULT_MAX_SHOWN
}

fn default_banner_duration() -> Duration {
    crate::update::DEFAULT_BANNER_DURATION
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UIConfig {
    #[serde(default = "default_scroll_throttle", with = "humantime_serde")]
    pub scroll_throttle: Duration,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            scroll_throttle: default_scroll_throttle(),
        }
    }
}

fn default_scroll_throttle() -> Duration {
    Duration::from_millis(200)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_file() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("clonernews").join("clonernews.log"))
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

pub fn load(options: LoadOptions) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(path) = options.config_file.as_ref() {
        if path.exists() {
            let from_file = read_config_file(path)?;
            cfg = merge_config(cfg, from_file);
        }
    } else if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            let from_file = read_config_file(&default_path)?;
            cfg = merge_config(cfg, from_file);
        }
    }

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    apply_env(&mut cfg, prefix);

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn merge_config(mut base: Config, other: Config) -> Config {
    if !other.api.base_url.is_empty() {
        base.api.base_url = other.api.base_url;
    }
    if !other.api.search_url.is_empty() {
        base.api.search_url = other.api.search_url;
    }
    if !other.api.user_agent.is_empty() {
        base.api.user_agent = other.api.user_agent;
    }
    if !other.api.timeout.is_zero() {
        base.api.timeout = other.api.timeout;
    }

    if other.feed.page_size != 0 {
        base.feed.page_size = other.feed.page_size;
    }
    base.feed.default_category = other.feed.default_category;
    base.feed.load_threshold = other.feed.load_threshold;
    if other.feed.sidebar_size != 0 {
        base.feed.sidebar_size = other.feed.sidebar_size;
    }

    if !other.updates.interval.is_zero() {
        base.updates.interval = other.updates.interval;
    }
    base.updates.cooldown = other.updates.cooldown;
    if other.updates.max_shown != 0 {
        base.updates.max_shown = other.updates.max_shown;
    }
    base.updates.banner_duration = other.updates.banner_duration;

    base.ui.scroll_throttle = other.ui.scroll_throttle;

    if !other.log.level.is_empty() {
        base.log.level = other.log.level;
    }
    if other.log.file.is_some() {
        base.log.file = other.log.file;
    }

    base
}

fn apply_env(cfg: &mut Config, prefix: &str) {
    let mut map: HashMap<String, String> = HashMap::new();
    let upper_prefix = format!("{}_", prefix.to_uppercase());

    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(&upper_prefix) {
            let normalized = stripped.to_ascii_lowercase().replace("__", ".");
            map.insert(normalized, value);
        }
    }

    for (key, value) in map {
        apply_env_value(cfg, &key, value);
    }
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) {
    match key {
        "api.base_url" => cfg.api.base_url = value,
        "api.search_url" => cfg.api.search_url = value,
        "api.user_agent" => cfg.api.user_agent = value,
        "api.timeout" => set_duration(&mut cfg.api.timeout, &value),
        "feed.page_size" => set_usize(&mut cfg.feed.page_size, &value),
        "feed.default_category" => {
            if let Some(category) = Category::from_key(&value) {
                cfg.feed.default_category = category;
            }
        }
        "feed.load_threshold" => set_usize(&mut cfg.feed.load_threshold, &value),
        "feed.sidebar_size" => set_usize(&mut cfg.feed.sidebar_size, &value),
        "updates.interval" => set_duration(&mut cfg.updates.interval, &value),
        "updates.cooldown" => set_duration(&mut cfg.updates.cooldown, &value),
        "updates.max_shown" => set_usize(&mut cfg.updates.max_shown, &value),
        "updates.banner_duration" => set_duration(&mut cfg.updates.banner_duration, &value),
        "ui.scroll_throttle" => set_duration(&mut cfg.ui.scroll_throttle, &value),
        "log.level" => cfg.log.level = value,
        "log.file" => cfg.log.file = Some(PathBuf::from(value)),
        _ => {}
    }
}

fn set_usize(slot: &mut usize, value: &str) {
    if let Ok(parsed) = value.trim().parse::<usize>() {
        *slot = parsed;
    }
}

fn set_duration(slot: &mut Duration, value: &str) {
    if let Ok(duration) = humantime::parse_duration(value.trim()) {
        *slot = duration;
    }
}

pub fn default_path() -> Option<PathBuf> {
    default_config_path()
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("clonernews").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::tempdir;

    fn isolated() -> LoadOptions {
        LoadOptions {
            config_file: Some(PathBuf::from("/nonexistent/clonernews.yaml")),
            env_prefix: Some("CLONERNEWS_TEST_UNSET".into()),
        }
    }

    #[test]
    fn load_defaults_without_files() {
        let cfg = load(isolated()).unwrap();
        assert_eq!(cfg.feed.page_size, 7);
        assert_eq!(cfg.feed.default_category, Category::New);
        assert_eq!(cfg.updates.interval, Duration::from_secs(5));
        assert_eq!(cfg.updates.max_shown, 5);
        assert_eq!(cfg.ui.scroll_throttle, Duration::from_millis(200));
        assert_eq!(cfg.api.base_url, hackernews::HN_API_BASE);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "feed:\n  page_size: 12\n  default_category: ask\nupdates:\n  cooldown: 30s\n",
        )
        .unwrap();

        let cfg = load(LoadOptions {
            config_file: Some(path),
            env_prefix: Some("CLONERNEWS_TEST_UNSET".into()),
        })
        .unwrap();
        assert_eq!(cfg.feed.page_size, 12);
        assert_eq!(cfg.feed.default_category, Category::Ask);
        assert_eq!(cfg.updates.cooldown, Duration::from_secs(30));
        assert_eq!(cfg.updates.interval, Duration::from_secs(5));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "feed: [unterminated").unwrap();
        let err = load(LoadOptions {
            config_file: Some(path),
            env_prefix: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn env_overrides() {
        env::set_var("CLONERNEWS_ENVTEST_FEED__PAGE_SIZE", "3");
        env::set_var("CLONERNEWS_ENVTEST_UPDATES__INTERVAL", "10s");
        env::set_var("CLONERNEWS_ENVTEST_FEED__DEFAULT_CATEGORY", "polls");
        let cfg = load(LoadOptions {
            config_file: Some(PathBuf::from("/nonexistent/clonernews.yaml")),
            env_prefix: Some("CLONERNEWS_ENVTEST".into()),
        })
        .unwrap();
        assert_eq!(cfg.feed.page_size, 3);
        assert_eq!(cfg.updates.interval, Duration::from_secs(10));
        assert_eq!(cfg.feed.default_category, Category::Polls);
        env::remove_var("CLONERNEWS_ENVTEST_FEED__PAGE_SIZE");
        env::remove_var("CLONERNEWS_ENVTEST_UPDATES__INTERVAL");
        env::remove_var("CLONERNEWS_ENVTEST_FEED__DEFAULT_CATEGORY");
    }
}
