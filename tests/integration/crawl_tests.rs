//! Full crawl cycle against a mock site

use crate::create_test_config;
use feedscout::crawler::Coordinator;
use feedscout::output::{FeedSink, JsonLinesSink, MemorySink, OutputResult};
use feedscout::JsonFeed;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RSS_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>T</title>
    <link>http://x/</link>
    <description>D</description>
    <item>
      <guid>1</guid>
      <link>http://x/1</link>
      <title>I</title>
      <description>C</description>
    </item>
  </channel>
</rss>"#;

const ATOM_FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Blog</title>
  <entry>
    <title>First</title>
    <link href="http://example.org/first"/>
    <id>urn:uuid:1</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <content type="html">Hello</content>
  </entry>
</feed>"#;

/// Mounts a HEAD response declaring `content_type` for `route`
async fn mount_head(server: &MockServer, route: &str, content_type: &str) {
    Mock::given(method("HEAD"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", content_type))
        .mount(server)
        .await;
}

/// Mounts a page served exactly once
async fn mount_page(server: &MockServer, route: &str, html: &str) {
    mount_head(server, route, "text/html").await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts a feed document served exactly once
async fn mount_feed(server: &MockServer, route: &str, content_type: &str, body: &str) {
    mount_head(server, route, content_type).await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, content_type))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_discovers_each_feed_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><head>
            <link rel="alternate" type="application/rss+xml" href="/feed.xml">
        </head><body>
            <a href="/a">A</a>
            <a href="/a#comments">A again</a>
            <a href="/b?utm_source=home">B</a>
            <a href="/logo.png">Logo</a>
            <a href="mailto:someone@example.com">Mail</a>
        </body></html>"#,
    )
    .await;

    mount_page(
        &mock_server,
        "/a",
        &format!(
            r#"<html><head>
                <link rel="alternate" type="application/rss+xml" href="{}/feed.xml">
                <link rel="alternate" type="application/atom+xml" href="/atom.xml">
            </head><body>
                <a href="/">Home</a>
                <a href="/b">B</a>
            </body></html>"#,
            base_url
        ),
    )
    .await;

    mount_page(
        &mock_server,
        "/b",
        r#"<html><body><a href="/a">A</a><a href="/">Home</a></body></html>"#,
    )
    .await;

    mount_head(&mock_server, "/logo.png", "image/png").await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    mount_feed(&mock_server, "/feed.xml", "application/rss+xml", RSS_FEED).await;
    mount_feed(&mock_server, "/atom.xml", "application/atom+xml", ATOM_FEED).await;

    let sink = Arc::new(MemorySink::new());
    let config = create_test_config(vec![format!("{}/", base_url)]);
    let coordinator = Coordinator::new(config, sink.clone()).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Crawl failed");

    let feeds = sink.feeds();
    assert_eq!(feeds.len(), 2, "Expected two feeds, got {:?}", feeds);

    let sources: HashSet<String> = feeds.iter().map(|(url, _)| url.path().to_string()).collect();
    assert_eq!(
        sources,
        HashSet::from(["/feed.xml".to_string(), "/atom.xml".to_string()])
    );

    let titles: HashSet<&str> = feeds.iter().map(|(_, feed)| feed.title.as_str()).collect();
    assert_eq!(titles, HashSet::from(["T", "Atom Blog"]));

    assert_eq!(report.pages_visited, 4);
    assert_eq!(report.pages_skipped, 1);
    assert_eq!(report.page_failures, 0);
    assert_eq!(report.feeds_discovered, 2);
    assert_eq!(report.feeds_normalized, 2);
    assert_eq!(report.feed_failures, 0);
}

#[tokio::test]
async fn test_failing_seed_still_completes() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // No Content-Type and no Location
    Mock::given(method("HEAD"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    mount_page(
        &mock_server,
        "/ok",
        r#"<html><head><link type="application/rss+xml" href="/feed.xml"></head></html>"#,
    )
    .await;
    mount_feed(&mock_server, "/feed.xml", "application/rss+xml", RSS_FEED).await;

    let sink = Arc::new(MemorySink::new());
    let config = create_test_config(vec![
        format!("{}/broken", base_url),
        format!("{}/ok", base_url),
    ]);
    let report = Coordinator::new(config, sink.clone())
        .expect("Failed to create coordinator")
        .run()
        .await
        .expect("Crawl failed");

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.page_failures, 1);
    assert_eq!(sink.len(), 1);
}

#[tokio::test]
async fn test_malformed_feed_is_dropped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><head>
            <link type="application/rss+xml" href="/broken.xml">
            <link type="application/rss+xml" href="/missing-id.xml">
        </head></html>"#,
    )
    .await;
    mount_feed(
        &mock_server,
        "/broken.xml",
        "application/rss+xml",
        "<rss><channel><title>Cut off",
    )
    .await;
    mount_feed(
        &mock_server,
        "/missing-id.xml",
        "application/rss+xml",
        r#"<rss><channel><title>T</title><link>http://x/</link><description>D</description>
            <item><link>http://x/1</link><title>I</title><description>C</description></item>
        </channel></rss>"#,
    )
    .await;

    let sink = Arc::new(MemorySink::new());
    let config = create_test_config(vec![format!("{}/", base_url)]);
    let report = Coordinator::new(config, sink.clone())
        .expect("Failed to create coordinator")
        .run()
        .await
        .expect("Crawl failed");

    assert!(sink.is_empty());
    assert_eq!(report.feeds_discovered, 2);
    assert_eq!(report.feed_failures, 2);
    assert_eq!(report.feeds_normalized, 0);
}

#[tokio::test]
async fn test_seed_redirect_is_followed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("HEAD"))
        .and(path("/old-home"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/blog/"))
        .mount(&mock_server)
        .await;

    mount_page(
        &mock_server,
        "/blog/",
        r#"<html><head><link type="application/rss+xml" href="feed.xml"></head></html>"#,
    )
    .await;

    // Relative feed hrefs resolve against the site origin, not the page path
    mount_feed(&mock_server, "/feed.xml", "application/rss+xml", RSS_FEED).await;

    let sink = Arc::new(MemorySink::new());
    let config = create_test_config(vec![format!("{}/old-home", base_url)]);
    Coordinator::new(config, sink.clone())
        .expect("Failed to create coordinator")
        .run()
        .await
        .expect("Crawl failed");

    let feeds = sink.feeds();
    assert_eq!(feeds.len(), 1);
    assert_eq!(feeds[0].0.path(), "/feed.xml");
}

#[tokio::test]
async fn test_max_pages_limits_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><body><a href="/1">1</a><a href="/2">2</a><a href="/3">3</a></body></html>"#,
    )
    .await;
    mount_head(&mock_server, "/1", "text/html").await;
    mount_head(&mock_server, "/2", "text/html").await;
    mount_head(&mock_server, "/3", "text/html").await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
        .mount(&mock_server)
        .await;

    let sink = Arc::new(MemorySink::new());
    let mut config = create_test_config(vec![format!("{}/", base_url)]);
    config.crawler.max_pages = Some(2);

    let report = Coordinator::new(config, sink)
        .expect("Failed to create coordinator")
        .run()
        .await
        .expect("Crawl failed");

    assert_eq!(report.pages_visited, 2);
}

#[tokio::test]
async fn test_crawl_writes_json_lines() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><head><link type="application/atom+xml" href="/atom.xml"></head></html>"#,
    )
    .await;
    mount_feed(&mock_server, "/atom.xml", "application/atom+xml", ATOM_FEED).await;

    let output = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let sink = Arc::new(JsonLinesSink::create(output.path()).expect("Failed to open sink"));
    let config = create_test_config(vec![format!("{}/", base_url)]);
    Coordinator::new(config, sink)
        .expect("Failed to create coordinator")
        .run()
        .await
        .expect("Crawl failed");

    let content = std::fs::read_to_string(output.path()).expect("Failed to read output");
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).expect("Invalid JSON line"))
        .collect();

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["source"], format!("{}/atom.xml", base_url));
    assert_eq!(lines[0]["feed"]["version"], "https://jsonfeed.org/version/1");
    assert_eq!(lines[0]["feed"]["items"][0]["id"], "urn:uuid:1");
    assert_eq!(
        lines[0]["feed"]["items"][0]["date_published"],
        "2024-01-01T00:00:00Z"
    );
}

/// Records the thread each feed was emitted on
#[derive(Default)]
struct ThreadRecordingSink {
    threads: Mutex<Vec<ThreadId>>,
}

impl FeedSink for ThreadRecordingSink {
    fn emit(&self, _source: &Url, _feed: &JsonFeed) -> OutputResult<()> {
        self.threads.lock().push(thread::current().id());
        Ok(())
    }
}

#[tokio::test]
async fn test_sink_writes_run_off_the_runtime_thread() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><head>
            <link type="application/rss+xml" href="/feed.xml">
            <link type="application/atom+xml" href="/atom.xml">
        </head></html>"#,
    )
    .await;
    mount_feed(&mock_server, "/feed.xml", "application/rss+xml", RSS_FEED).await;
    mount_feed(&mock_server, "/atom.xml", "application/atom+xml", ATOM_FEED).await;

    let sink = Arc::new(ThreadRecordingSink::default());
    let config = create_test_config(vec![format!("{}/", base_url)]);
    let report = Coordinator::new(config, sink.clone())
        .expect("Failed to create coordinator")
        .run()
        .await
        .expect("Crawl failed");

    // The test runtime is single-threaded, so its thread runs every worker
    let runtime_thread = thread::current().id();
    let threads = sink.threads.lock();
    assert_eq!(report.feeds_normalized, 2);
    assert_eq!(threads.len(), 2);
    assert!(threads.iter().all(|id| *id != runtime_thread));
}
