use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rozklad_scraper::{Result, ScrapingConfig, ScrapingContext, TokenAcquirer};

pub const TEST_TOKEN: &str = "tok-123";
pub const TEST_SESSION_ID: &str = "sid-1";

/// Cookie header every dispatched request must carry once the caches are
/// primed (names sorted, ASCII order).
pub const DISPATCH_COOKIES: &str = "PHPSESSID=sid-1; notbot=tok-123";

/// Hands out a fixed token and counts how often the "browser" was started.
pub struct CountingAcquirer {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TokenAcquirer for CountingAcquirer {
    async fn acquire_token(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(TEST_TOKEN.to_string())
    }
}

pub fn test_context(endpoint: &str, calls: Arc<AtomicUsize>) -> ScrapingContext {
    let config = ScrapingConfig {
        endpoint_url: endpoint.to_string(),
        ..ScrapingConfig::default()
    };
    ScrapingContext::with_acquirer(config, Box::new(CountingAcquirer { calls }))
        .expect("context construction")
}

/// Mounts the session-priming exchange: a GET carrying only the token cookie
/// is answered with the session id in `Set-Cookie`.
pub async fn mount_session_priming(server: &MockServer) {
    Mock::given(method("GET"))
        .and(header("cookie", format!("notbot={TEST_TOKEN}").as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "set-cookie",
                    format!("PHPSESSID={TEST_SESSION_ID}; path=/").as_str(),
                )
                .set_body_string("<html></html>"),
        )
        .mount(server)
        .await;
}
