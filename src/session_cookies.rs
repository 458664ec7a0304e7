use log::debug;
use reqwest::Client;
use reqwest::header::{COOKIE, SET_COOKIE};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::errors::{Result, ScraperError};
use crate::notbot::{NotBot, TOKEN_COOKIE};
use crate::text_manipulators::parse_cookie_pair;
use crate::timed_value::TimedValue;

/// Session id cookie the server hands out once it has seen a valid token.
pub const SESSION_COOKIE: &str = "PHPSESSID";

/// TTL cache over the outgoing cookie map `{PHPSESSID, notbot}`.
///
/// On miss or expiry it primes a session with a plain GET that carries only
/// the token, then reads the session id off `Set-Cookie`. Refreshing the
/// token transitively (and expensively) restarts the browser, so the lock is
/// held across the whole check-then-refresh.
pub struct SessionCookies {
    cache: Mutex<TimedValue<HashMap<String, String>>>,
    timeout: Duration,
}

impl SessionCookies {
    pub fn new(ttl: Duration, timeout: Duration) -> Self {
        Self {
            cache: Mutex::new(TimedValue::new(ttl)),
            timeout,
        }
    }

    pub async fn value(
        &self,
        client: &Client,
        endpoint: &str,
        notbot: &NotBot,
    ) -> Result<HashMap<String, String>> {
        let mut cache = self.cache.lock().await;
        if cache.is_valid()
            && let Some(cookies) = cache.value()
        {
            return Ok(cookies.clone());
        }

        let token = notbot.value().await?;
        debug!("session cookie missing or expired, priming a new session");
        let response = client
            .get(endpoint)
            .header(COOKIE, format!("{TOKEN_COOKIE}={token}"))
            .timeout(self.timeout)
            .send()
            .await?;

        let session_id = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(parse_cookie_pair)
            .find(|(name, _)| name == SESSION_COOKIE)
            .map(|(_, value)| value)
            .ok_or(ScraperError::MissingCookie {
                name: SESSION_COOKIE,
            })?;

        let cookies = HashMap::from([
            (SESSION_COOKIE.to_string(), session_id),
            (TOKEN_COOKIE.to_string(), token),
        ]);
        Ok(cache.set(cookies).clone())
    }
}
