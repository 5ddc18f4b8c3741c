use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default location of the credential file, relative to the working dir.
pub const DEFAULT_CREDENTIALS_FILE: &str = "creds.yaml";
/// Default export directory.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Largest page the search endpoint will return.
pub const MAX_PAGE_SIZE: usize = 100;

/// Ranking requested from the search endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResultMode {
    #[default]
    Mixed,
    Popular,
    Recent,
}

impl ResultMode {
    pub const ALL: [ResultMode; 3] = [ResultMode::Mixed, ResultMode::Popular, ResultMode::Recent];

    /// Value sent as `result_type`.
    pub fn as_query_value(self) -> &'static str {
        match self {
            ResultMode::Mixed => "mixed",
            ResultMode::Popular => "popular",
            ResultMode::Recent => "recent",
        }
    }
}

impl fmt::Display for ResultMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query_value())
    }
}

impl FromStr for ResultMode {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mix" | "mixed" => Ok(ResultMode::Mixed),
            "popular" => Ok(ResultMode::Popular),
            "recent" => Ok(ResultMode::Recent),
            other => Err(anyhow!("unknown result mode '{other}' (expected mix, popular or recent)")),
        }
    }
}

/// Collection options with defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct CollectOptions {
    pub search_key: String,
    pub target_count: usize,
    pub upper_limit: u64,       // inclusive
    pub lower_limit: u64,       // inclusive
    pub result_mode: ResultMode,
    pub language: String,
    pub page_size: usize,       // 1..=MAX_PAGE_SIZE
    pub cooldown: Duration,     // wait after a rate-limit/transient error
    pub progress: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            search_key: String::new(),
            target_count: 100,
            upper_limit: 0,
            lower_limit: 0,
            result_mode: ResultMode::Mixed,
            language: "en".to_string(),
            page_size: MAX_PAGE_SIZE,
            cooldown: Duration::from_secs(5 * 60),
            progress: true,
        }
    }
}

impl CollectOptions {
    pub fn new(search_key: impl Into<String>) -> Self {
        Self { search_key: search_key.into(), ..Default::default() }
    }
    pub fn with_target_count(mut self, n: usize) -> Self {
        self.target_count = n;
        self
    }
    pub fn with_band(mut self, lower: u64, upper: u64) -> Self {
        self.lower_limit = lower;
        self.upper_limit = upper;
        self
    }
    pub fn with_result_mode(mut self, mode: ResultMode) -> Self {
        self.result_mode = mode;
        self
    }
    pub fn with_language(mut self, lang: impl AsRef<str>) -> Self {
        self.language = lang.as_ref().trim().to_lowercase();
        self
    }
    pub fn with_page_size(mut self, n: usize) -> Self {
        self.page_size = n.clamp(1, MAX_PAGE_SIZE);
        self
    }
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
}

/// OAuth 1.0a user-context credentials, loaded from YAML.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    #[serde(rename = "API_key")]
    pub api_key: String,
    #[serde(rename = "API_secret_keys")]
    pub api_secret: String,
    #[serde(rename = "Access_token")]
    pub access_token: String,
    #[serde(rename = "Access_token_secret")]
    pub access_token_secret: String,
}

impl Credentials {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read credentials {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parse credentials {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

// Secrets never reach logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

/// Credential file path: `ETL_CREDENTIALS_FILE` or `creds.yaml`.
pub fn credentials_path_from_env() -> PathBuf {
    env_path("ETL_CREDENTIALS_FILE").unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_FILE))
}

/// Export directory: `ETL_DATA_DIR` or `./data`.
pub fn data_dir_from_env() -> PathBuf {
    env_path("ETL_DATA_DIR").unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var(var)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(|s| PathBuf::from(s.trim()))
}
