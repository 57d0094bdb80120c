use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetcherConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_data_dir")]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Fixed user agent, a persisted or random one is used otherwise
    #[serde(default)]
    pub user_agent: Option<String>,

    #[serde(default = "default_throttle")]
    pub throttle: bool,

    #[serde(default = "default_retries")]
    pub retries: usize,

    /// The delay in seconds before retrying a failed download
    #[serde(default = "default_retry_delay")]
    pub retry_delay: f32,

    /// The request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: f32,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            data_dir: default_data_dir(),
            username: None,
            password: None,
            user_agent: None,
            throttle: default_throttle(),
            retries: default_retries(),
            retry_delay: default_retry_delay(),
            timeout: default_timeout(),
        }
    }
}

impl FetcherConfig {
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs_f32(self.retry_delay.max(0.0))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f32(self.timeout.max(0.0))
    }
}

fn default_base_url() -> String {
    String::from("http://www.geocaching.com")
}

fn default_data_dir() -> Option<PathBuf> {
    Some(PathBuf::from("~/.geocaching/parser"))
}

fn default_throttle() -> bool {
    true
}

fn default_retries() -> usize {
    3
}

fn default_retry_delay() -> f32 {
    5.0
}

fn default_timeout() -> f32 {
    30.0
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_home(path: &std::path::Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
