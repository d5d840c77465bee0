//! Fetcher behavior against a mock server: Content-Type sniffing, Location
//! following, and error classification.

use crate::create_fetcher;
use feedscout::crawler::FetchError;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn url_for(server: &MockServer, route: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), route)).expect("Failed to build URL")
}

#[tokio::test]
async fn test_head_without_content_type_or_location() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/bare"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let result = create_fetcher(5, 10)
        .fetch(&url_for(&mock_server, "/bare"))
        .await;

    assert!(
        matches!(result, Err(FetchError::NoContentType { .. })),
        "Expected NoContentType, got {:?}",
        result
    );
}

#[tokio::test]
async fn test_follows_location_chain_to_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/middle"))
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/middle"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/final", mock_server.uri()).as_str()),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/final"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/plain"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/final"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("hello", "text/plain"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let page = create_fetcher(5, 10)
        .fetch(&url_for(&mock_server, "/old"))
        .await
        .expect("Fetch failed");

    assert_eq!(page.url, url_for(&mock_server, "/final"));
    assert_eq!(page.content_type, "text/plain");
    assert_eq!(page.body.as_deref(), Some("hello"));
}

#[tokio::test]
async fn test_redirect_with_content_type_is_followed() {
    let mock_server = MockServer::start().await;

    // Web servers usually attach a Content-Type to the redirect notice itself
    Mock::given(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("content-type", "text/html")
                .insert_header("location", "/new"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>moved</html>", "text/html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let page = create_fetcher(5, 10)
        .fetch(&url_for(&mock_server, "/old"))
        .await
        .expect("Fetch failed");

    assert_eq!(page.url, url_for(&mock_server, "/new"));
    assert_eq!(page.content_type, "text/html");
    assert_eq!(page.body.as_deref(), Some("<html>moved</html>"));
}

#[tokio::test]
async fn test_get_redirect_is_followed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("content-type", "text/html")
                .insert_header("location", "/moved/page"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/moved/page"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>here</html>", "text/html"))
        .mount(&mock_server)
        .await;

    let page = create_fetcher(5, 10)
        .fetch(&url_for(&mock_server, "/page"))
        .await
        .expect("Fetch failed");

    assert_eq!(page.url, url_for(&mock_server, "/moved/page"));
    assert_eq!(page.body.as_deref(), Some("<html>here</html>"));
}

#[tokio::test]
async fn test_get_redirect_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/spin"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/spin"))
        .respond_with(ResponseTemplate::new(307).insert_header("location", "/spin"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let result = create_fetcher(5, 2)
        .fetch(&url_for(&mock_server, "/spin"))
        .await;

    assert!(
        matches!(result, Err(FetchError::RedirectLimit { .. })),
        "Expected RedirectLimit, got {:?}",
        result
    );
}

#[tokio::test]
async fn test_redirect_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop"))
        .expect(4)
        .mount(&mock_server)
        .await;

    let result = create_fetcher(5, 3)
        .fetch(&url_for(&mock_server, "/loop"))
        .await;

    assert!(
        matches!(result, Err(FetchError::RedirectLimit { .. })),
        "Expected RedirectLimit, got {:?}",
        result
    );
}

#[tokio::test]
async fn test_non_text_resource_is_not_downloaded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/png"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 16], "image/png"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let page = create_fetcher(5, 10)
        .fetch(&url_for(&mock_server, "/logo.png"))
        .await
        .expect("Fetch failed");

    assert_eq!(page.content_type, "image/png");
    assert!(page.body.is_none());
    assert!(matches!(
        page.into_text(),
        Err(FetchError::NonTextContent { .. })
    ));
}

#[tokio::test]
async fn test_get_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let result = create_fetcher(5, 10)
        .fetch(&url_for(&mock_server, "/gone"))
        .await;

    assert!(
        matches!(result, Err(FetchError::HttpStatus { status: 404, .. })),
        "Expected HttpStatus 404, got {:?}",
        result
    );
}

#[tokio::test]
async fn test_timeout_is_transient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let result = create_fetcher(1, 10)
        .fetch(&url_for(&mock_server, "/slow"))
        .await;

    match result {
        Err(e @ FetchError::Timeout { .. }) => assert!(e.is_transient()),
        other => panic!("Expected Timeout, got {:?}", other),
    }
}
