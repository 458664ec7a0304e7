mod support;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rozklad_scraper::ScraperError;
use support::{DISPATCH_COOKIES, mount_session_priming, test_context};

#[tokio::test]
async fn unsupported_verb_fails_before_any_network_activity() {
    let server = MockServer::start().await;
    let ctx = test_context(&server.uri(), Arc::new(AtomicUsize::new(0)));

    let err = ctx.dispatcher.send_request("PUT", None).await.unwrap_err();
    assert!(matches!(
        err,
        ScraperError::UnsupportedMethod { ref method } if method == "PUT"
    ));

    // Not even the credential cascade ran.
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_200_status_is_surfaced_with_status_and_body() {
    let server = MockServer::start().await;
    mount_session_priming(&server).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nothing here"))
        .mount(&server)
        .await;

    let ctx = test_context(&server.uri(), Arc::new(AtomicUsize::new(0)));
    let data = HashMap::from([("facultyid".to_string(), "1".to_string())]);
    let err = ctx
        .dispatcher
        .send_request("POST", Some(&data))
        .await
        .unwrap_err();

    match err {
        ScraperError::UnexpectedStatus { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "nothing here");
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
    assert!(err_is_not_recorded(&ctx).await);
}

async fn err_is_not_recorded(ctx: &rozklad_scraper::ScrapingContext) -> bool {
    ctx.dispatcher.recent_responses().await.is_empty()
}

#[tokio::test]
async fn response_ring_keeps_the_last_five_oldest_first() {
    let server = MockServer::start().await;
    mount_session_priming(&server).await;
    // One single-shot mock per page so successive dispatches see distinct
    // bodies.
    for page in 1..=7 {
        Mock::given(method("GET"))
            .and(header("cookie", DISPATCH_COOKIES))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!("page-{page}")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
    }

    let ctx = test_context(&server.uri(), Arc::new(AtomicUsize::new(0)));
    for _ in 0..7 {
        ctx.dispatcher.send_request("GET", None).await.unwrap();
    }

    let recent = ctx.dispatcher.recent_responses().await;
    let bodies: Vec<String> = recent
        .iter()
        .map(|record| String::from_utf8(record.body.clone()).unwrap())
        .collect();
    assert_eq!(bodies, vec!["page-3", "page-4", "page-5", "page-6", "page-7"]);
}

#[tokio::test]
async fn credentials_are_acquired_once_and_reused() {
    let server = MockServer::start().await;
    mount_session_priming(&server).await;
    Mock::given(method("GET"))
        .and(header("cookie", DISPATCH_COOKIES))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let browser_starts = Arc::new(AtomicUsize::new(0));
    let ctx = test_context(&server.uri(), browser_starts.clone());

    ctx.dispatcher.send_request("GET", None).await.unwrap();
    ctx.dispatcher.send_request("GET", None).await.unwrap();
    ctx.dispatcher.send_request("GET", None).await.unwrap();

    // One browser run, one priming GET, three dispatches.
    assert_eq!(browser_starts.load(Ordering::SeqCst), 1);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn missing_session_cookie_is_an_acquisition_error() {
    let server = MockServer::start().await;
    // Priming response with no Set-Cookie at all.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let ctx = test_context(&server.uri(), Arc::new(AtomicUsize::new(0)));
    let err = ctx.dispatcher.send_request("GET", None).await.unwrap_err();
    assert!(matches!(
        err,
        ScraperError::MissingCookie { name: "PHPSESSID" }
    ));
    assert!(err.is_acquisition_error());
}
