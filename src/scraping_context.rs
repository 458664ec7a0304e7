use crate::config::{LoadFromEnv, ScrapingConfig};
use crate::notbot::{TokenAcquirer, WebDriverTokenAcquirer};
use crate::requests::RequestDispatcher;

/// Everything a scrape run needs, constructed once and passed around by
/// reference. The context owns the dispatcher, which owns the credential
/// caches; nothing else holds them.
pub struct ScrapingContext {
    pub config: ScrapingConfig,
    pub dispatcher: RequestDispatcher,
}

impl ScrapingContext {
    pub fn new() -> anyhow::Result<Self> {
        let config = ScrapingConfig::load_from_env()?;
        Self::from_config(config)
    }

    pub fn from_config(config: ScrapingConfig) -> anyhow::Result<Self> {
        let acquirer = WebDriverTokenAcquirer::new(
            config.webdriver_url.clone(),
            config.endpoint_url.clone(),
            config.token_poll_timeout(),
            config.token_poll_interval(),
        )?;
        Self::with_acquirer(config, Box::new(acquirer))
    }

    /// Builds a context around a caller-supplied token acquirer, so tests
    /// never have to start a browser.
    pub fn with_acquirer(
        config: ScrapingConfig,
        acquirer: Box<dyn TokenAcquirer>,
    ) -> anyhow::Result<Self> {
        let dispatcher = RequestDispatcher::new(&config, acquirer)?;
        Ok(ScrapingContext { config, dispatcher })
    }
}
