use log::debug;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, ClientBuilder};
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

use crate::config::ScrapingConfig;
use crate::errors::{Result, ScraperError};
use crate::notbot::{NotBot, TokenAcquirer};
use crate::session_cookies::SessionCookies;
use crate::text_manipulators::parse_cookie_pair;

/// How many past responses are kept around for inspection.
const RESPONSE_HISTORY_LIMIT: usize = 5;
const STATUS_OK: u16 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    /// The endpoint is only ever driven with GET and POST; anything else is
    /// a caller bug and is rejected before any network activity.
    fn parse(method: &str) -> Result<Self> {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            _ => Err(ScraperError::UnsupportedMethod {
                method: method.to_string(),
            }),
        }
    }
}

/// One captured HTTP exchange: status, raw body, and whatever `Set-Cookie`
/// pairs came back.
#[derive(Debug, Clone)]
pub struct ResponseRecord {
    pub status: u16,
    pub body: Vec<u8>,
    pub cookies: HashMap<String, String>,
}

impl ResponseRecord {
    /// Decodes the body for extraction. Empty bodies are rejected up front
    /// so the markup parsers never see them.
    pub fn text(&self) -> Result<String> {
        if self.body.is_empty() {
            return Err(ScraperError::EmptyBody);
        }
        Ok(String::from_utf8(self.body.clone())?)
    }
}

/// Performs the one HTTP round trip the whole system is built around.
///
/// Owns the client, both credential caches, and a bounded ring of recent
/// responses. Every send attaches the current cookie map, which cascades
/// through session-cookie and token refresh when either has expired.
pub struct RequestDispatcher {
    client: Client,
    endpoint: String,
    notbot: NotBot,
    session_cookies: SessionCookies,
    responses: Mutex<VecDeque<ResponseRecord>>,
}

impl RequestDispatcher {
    pub fn new(config: &ScrapingConfig, acquirer: Box<dyn TokenAcquirer>) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint_url.clone(),
            notbot: NotBot::new(config.token_ttl(), acquirer),
            session_cookies: SessionCookies::new(config.cookie_ttl(), config.cookie_timeout()),
            responses: Mutex::new(VecDeque::with_capacity(RESPONSE_HISTORY_LIMIT)),
        })
    }

    /// Sends one request with the current credentials and some form data,
    /// if needed. Only a 200 response is considered a success; no retries
    /// happen here.
    pub async fn send_request(
        &self,
        method: &str,
        data: Option<&HashMap<String, String>>,
    ) -> Result<ResponseRecord> {
        let method = HttpMethod::parse(method)?;

        let cookies = self
            .session_cookies
            .value(&self.client, &self.endpoint, &self.notbot)
            .await?;

        let mut request = match method {
            HttpMethod::Get => self.client.get(&self.endpoint),
            HttpMethod::Post => self.client.post(&self.endpoint),
        };
        request = request.header(COOKIE, cookie_header(&cookies));
        if method == HttpMethod::Post
            && let Some(data) = data
        {
            request = request.form(data);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(parse_cookie_pair)
            .collect();
        let body = response.bytes().await?.to_vec();

        let record = ResponseRecord {
            status,
            body,
            cookies: set_cookies,
        };
        if record.status != STATUS_OK {
            return Err(ScraperError::UnexpectedStatus {
                status: record.status,
                body: String::from_utf8_lossy(&record.body).into_owned(),
            });
        }

        debug!(
            "dispatched {method:?} to {}, {} bytes back",
            self.endpoint,
            record.body.len()
        );
        self.remember(record.clone()).await;
        Ok(record)
    }

    /// Recent successful responses, oldest first. Diagnostic only; nothing
    /// in the pipeline reads these back.
    pub async fn recent_responses(&self) -> Vec<ResponseRecord> {
        self.responses.lock().await.iter().cloned().collect()
    }

    async fn remember(&self, record: ResponseRecord) {
        let mut responses = self.responses.lock().await;
        responses.push_back(record);
        while responses.len() > RESPONSE_HISTORY_LIMIT {
            responses.pop_front();
        }
    }
}

fn cookie_header(cookies: &HashMap<String, String>) -> String {
    let mut pairs: Vec<_> = cookies.iter().collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_get_and_post_parse() {
        assert_eq!(HttpMethod::parse("GET").unwrap(), HttpMethod::Get);
        assert_eq!(HttpMethod::parse("post").unwrap(), HttpMethod::Post);
        assert!(matches!(
            HttpMethod::parse("PUT"),
            Err(ScraperError::UnsupportedMethod { method }) if method == "PUT"
        ));
    }

    #[test]
    fn cookie_header_is_deterministic() {
        let cookies = HashMap::from([
            ("notbot".to_string(), "tok".to_string()),
            ("PHPSESSID".to_string(), "sid".to_string()),
        ]);
        assert_eq!(cookie_header(&cookies), "PHPSESSID=sid; notbot=tok");
    }

    #[test]
    fn empty_body_is_rejected_before_decoding() {
        let record = ResponseRecord {
            status: 200,
            body: vec![],
            cookies: HashMap::new(),
        };
        assert!(matches!(record.text(), Err(ScraperError::EmptyBody)));
    }

    #[test]
    fn non_utf8_body_is_rejected() {
        let record = ResponseRecord {
            status: 200,
            body: vec![0xff, 0xfe, 0x00],
            cookies: HashMap::new(),
        };
        assert!(matches!(record.text(), Err(ScraperError::InvalidEncoding(_))));
    }
}
