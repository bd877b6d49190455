use std::time::Duration;

use loadtrace_driver::PageSetup;
use serde::{Deserialize, Serialize};

use crate::{CorrelationPolicy, MatchRule, SessionError};

pub const DEFAULT_PAGE_URL: &str = "http://example.com/";

/// Everything one page-load session needs. Every field is always present;
/// missing keys in a config file take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub url: String,
    /// `[""]` matches every URL.
    pub include_substrings: Vec<String>,
    pub exclude_substrings: Vec<String>,
    pub quiet_period_ms: u64,
    pub timeout_sec: u64,
    /// How long listeners are attached before navigating.
    pub pre_navigation_delay_ms: u64,
    /// Visit the page once beforehand so the measured load hits a warm cache.
    pub use_cache: bool,
    /// Hold the page open for a minute before waiting for it to settle.
    pub prevent_auto_close: bool,
    pub scripts: Vec<String>,
    pub correlation: CorrelationPolicy,
    pub setup: PageSetup,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PAGE_URL.to_string(),
            include_substrings: vec![String::new()],
            exclude_substrings: Vec::new(),
            quiet_period_ms: 2000,
            timeout_sec: 30,
            pre_navigation_delay_ms: 2000,
            use_cache: false,
            prevent_auto_close: false,
            scripts: Vec::new(),
            correlation: CorrelationPolicy::default(),
            setup: PageSetup::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_toml(source: &str) -> Result<Self, SessionError> {
        Ok(toml::from_str(source)?)
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        url::Url::parse(&self.url)
            .map_err(|error| SessionError::InvalidConfig(format!("url {:?}: {error}", self.url)))?;
        if self.quiet_period_ms == 0 {
            return Err(SessionError::InvalidConfig(
                "quiet period must be positive".to_string(),
            ));
        }
        if self.timeout_sec == 0 {
            return Err(SessionError::InvalidConfig(
                "timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn match_rule(&self) -> MatchRule {
        MatchRule::new(
            self.include_substrings.clone(),
            self.exclude_substrings.clone(),
            self.url.clone(),
        )
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }

    pub fn absolute_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_sec)
    }

    pub fn pre_navigation_delay(&self) -> Duration {
        Duration::from_millis(self.pre_navigation_delay_ms)
    }

    /// Non-empty scripts, in order.
    pub fn scripts(&self) -> impl Iterator<Item = &str> {
        self.scripts
            .iter()
            .map(String::as_str)
            .filter(|script| !script.trim().is_empty())
    }
}
