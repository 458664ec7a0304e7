use anyhow::Context;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

const SCHEDULE_ENDPOINT: &str = "https://rozklad.ontu.edu.ua/guest_n.php";
const WEBDRIVER_ENDPOINT: &str = "http://localhost:4444";

/// The env vars needed for scraping. Every field has a default, so an empty
/// environment still yields a working config pointed at the live site.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapingConfig {
    /// The one URL the whole system talks to.
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,

    /// Base URL of a running geckodriver (or compatible) instance.
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    #[serde(default = "default_ttl_secs")]
    pub token_ttl_secs: u64,

    #[serde(default = "default_ttl_secs")]
    pub cookie_ttl_secs: u64,

    /// Timeout for the cookie-priming GET.
    #[serde(default = "default_cookie_timeout_secs")]
    pub cookie_timeout_secs: u64,

    /// Client-level timeout applied to every dispatch.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How long to keep polling the browser cookie jar for `notbot`.
    #[serde(default = "default_token_poll_timeout_secs")]
    pub token_poll_timeout_secs: u64,

    #[serde(default = "default_token_poll_interval_ms")]
    pub token_poll_interval_ms: u64,
}

fn default_endpoint_url() -> String {
    SCHEDULE_ENDPOINT.to_string()
}

fn default_webdriver_url() -> String {
    WEBDRIVER_ENDPOINT.to_string()
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_cookie_timeout_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_token_poll_timeout_secs() -> u64 {
    60
}

fn default_token_poll_interval_ms() -> u64 {
    500
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint_url(),
            webdriver_url: default_webdriver_url(),
            token_ttl_secs: default_ttl_secs(),
            cookie_ttl_secs: default_ttl_secs(),
            cookie_timeout_secs: default_cookie_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            token_poll_timeout_secs: default_token_poll_timeout_secs(),
            token_poll_interval_ms: default_token_poll_interval_ms(),
        }
    }
}

impl ScrapingConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn cookie_ttl(&self) -> Duration {
        Duration::from_secs(self.cookie_ttl_secs)
    }

    pub fn cookie_timeout(&self) -> Duration {
        Duration::from_secs(self.cookie_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn token_poll_timeout(&self) -> Duration {
        Duration::from_secs(self.token_poll_timeout_secs)
    }

    pub fn token_poll_interval(&self) -> Duration {
        Duration::from_millis(self.token_poll_interval_ms)
    }
}

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenv::dotenv();
        let config =
            envy::from_env::<Self>().context("failed to load env variables into config struct")?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_live_site() {
        let config = ScrapingConfig::default();
        assert_eq!(config.endpoint_url, SCHEDULE_ENDPOINT);
        assert_eq!(config.cookie_timeout(), Duration::from_secs(30));
        assert_eq!(config.token_ttl(), Duration::from_secs(3600));
    }
}
