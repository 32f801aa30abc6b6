use std::{path::PathBuf, time::Duration};

use rand::Rng;

use crate::prelude::*;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, human_errors::Error> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path).wrap_err_as_user(
            format!("We could not read your config file '{}'.", path.display()),
            &[
                "Ensure the file exists and is readable.",
                "Check that you have the necessary permissions to read the file.",
            ],
        )?;
        let config: Config = toml::from_str(&contents).wrap_err_as_user(
            "Your configuration file could not be loaded.",
            &[
                "Ensure that the file is valid TOML.",
                "Make sure that you are using the correct configuration file format.",
            ],
        )?;
        Ok(config)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub page_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.zhihu.com/api/v4".into(),
            page_size: 20,
        }
    }
}

/// The request identity presented to the upstream API and image hosts.
///
/// The platform rejects requests which don't look like they come from a
/// desktop browser, so these default to one.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/61.0.3163.100 Safari/537.36".into(),
            accept: "text/html,application/json,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".into(),
            accept_language: "zh-CN,zh;q=0.8".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub enabled: bool,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_delay_ms: 500,
            max_delay_ms: 3000,
        }
    }
}

impl ThrottleConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Picks the pause to observe before the next page request.
    pub fn next_delay(&self) -> Option<Duration> {
        if !self.enabled {
            return None;
        }

        let low = self.min_delay_ms.min(self.max_delay_ms);
        let high = self.min_delay_ms.max(self.max_delay_ms);
        let millis = rand::thread_rng().gen_range(low..=high);

        Some(Duration::from_millis(millis))
    }
}
