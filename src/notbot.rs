use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::errors::{Result, ScraperError};
use crate::timed_value::TimedValue;

/// Cookie name the site's anti-automation check issues after its javascript
/// has run in a real browser.
pub const TOKEN_COOKIE: &str = "notbot";

/// Produces a fresh anti-bot token. Kept behind a trait so tests can swap
/// the browser out entirely.
#[async_trait]
pub trait TokenAcquirer: Send + Sync {
    async fn acquire_token(&self) -> Result<String>;
}

/// TTL cache over the `notbot` token. The getter holds the cache lock across
/// the check and the acquisition, so concurrent callers trigger at most one
/// browser session between them.
pub struct NotBot {
    cache: Mutex<TimedValue<String>>,
    acquirer: Box<dyn TokenAcquirer>,
}

impl NotBot {
    pub fn new(ttl: Duration, acquirer: Box<dyn TokenAcquirer>) -> Self {
        Self {
            cache: Mutex::new(TimedValue::new(ttl)),
            acquirer,
        }
    }

    /// Returns the cached token, acquiring a new one only on miss or expiry.
    pub async fn value(&self) -> Result<String> {
        let mut cache = self.cache.lock().await;
        if cache.is_valid()
            && let Some(token) = cache.value()
        {
            return Ok(token.clone());
        }

        debug!("notbot token missing or expired, starting browser acquisition");
        let token = self.acquirer.acquire_token().await?;
        Ok(cache.set(token).clone())
    }
}

/// Drives a W3C WebDriver endpoint (geckodriver) over its REST wire protocol:
/// open a session, load the schedule page so the anti-bot javascript runs,
/// poll the cookie jar until `notbot` shows up, and tear the session down on
/// every exit path.
pub struct WebDriverTokenAcquirer {
    client: Client,
    webdriver_url: String,
    target_url: String,
    poll_timeout: Duration,
    poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
struct NewSessionResponse {
    value: NewSessionValue,
}

#[derive(Debug, Deserialize)]
struct NewSessionValue {
    #[serde(rename = "sessionId")]
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct CookieJarResponse {
    value: Vec<JarCookie>,
}

#[derive(Debug, Deserialize)]
struct JarCookie {
    name: String,
    value: String,
}

impl WebDriverTokenAcquirer {
    pub fn new(
        webdriver_url: String,
        target_url: String,
        poll_timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            webdriver_url,
            target_url,
            poll_timeout,
            poll_interval,
        })
    }

    async fn start_session(&self) -> Result<String> {
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "firefox",
                    "moz:firefoxOptions": { "args": ["-headless"] }
                }
            }
        });
        let response = self
            .client
            .post(format!("{}/session", self.webdriver_url))
            .json(&capabilities)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ScraperError::WebDriver {
                message: format!("session creation returned {}", response.status()),
            });
        }
        let session: NewSessionResponse =
            response.json().await.map_err(|err| ScraperError::WebDriver {
                message: format!("malformed new-session response: {err}"),
            })?;
        Ok(session.value.session_id)
    }

    async fn navigate(&self, session_id: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/session/{}/url", self.webdriver_url, session_id))
            .json(&json!({ "url": self.target_url }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ScraperError::WebDriver {
                message: format!("navigation returned {}", response.status()),
            });
        }
        Ok(())
    }

    async fn cookie_jar(&self, session_id: &str) -> Result<Vec<JarCookie>> {
        let response = self
            .client
            .get(format!(
                "{}/session/{}/cookie",
                self.webdriver_url, session_id
            ))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ScraperError::WebDriver {
                message: format!("cookie read returned {}", response.status()),
            });
        }
        let jar: CookieJarResponse =
            response.json().await.map_err(|err| ScraperError::WebDriver {
                message: format!("malformed cookie response: {err}"),
            })?;
        Ok(jar.value)
    }

    async fn end_session(&self, session_id: &str) {
        let result = self
            .client
            .delete(format!("{}/session/{}", self.webdriver_url, session_id))
            .send()
            .await;
        if let Err(err) = result {
            warn!("failed to close webdriver session {session_id}: {err}");
        }
    }

    /// Polls the jar until the token cookie appears or the deadline passes.
    async fn wait_for_token(&self, session_id: &str) -> Result<String> {
        let deadline = Instant::now() + self.poll_timeout;
        loop {
            let jar = self.cookie_jar(session_id).await?;
            if let Some(cookie) = jar
                .into_iter()
                .find(|cookie| cookie.name == TOKEN_COOKIE && !cookie.value.is_empty())
            {
                return Ok(cookie.value);
            }
            if Instant::now() >= deadline {
                return Err(ScraperError::TokenTimeout {
                    timeout_ms: self.poll_timeout.as_millis() as u64,
                });
            }
            sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl TokenAcquirer for WebDriverTokenAcquirer {
    async fn acquire_token(&self) -> Result<String> {
        let session_id = self.start_session().await?;

        // Whatever happens after the session exists, it must be closed;
        // geckodriver keeps the browser alive until the DELETE.
        let result = match self.navigate(&session_id).await {
            Ok(()) => self.wait_for_token(&session_id).await,
            Err(err) => Err(err),
        };
        self.end_session(&session_id).await;

        result
    }
}
