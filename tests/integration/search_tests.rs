//! Integration tests for the search spider
//!
//! These tests use wiremock to stand in for the search engine and run whole
//! searches through the engine: pagination, output and the captcha round trip.

use google_search::config::{OutputConfig, SpiderConfig, UserAgentConfig};
use google_search::crawler::{build_http_client, CallbackRegistry, Engine};
use google_search::output::{build_sink, MemorySink, OutputSink, SearchResult};
use google_search::spider::{GoogleSpider, Prompt, StaticPrompt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a spider configuration pointed at the mock server
fn create_test_config(base_url: &str, captcha_dir: &str) -> SpiderConfig {
    SpiderConfig {
        search_url: format!("{}/search", base_url),
        // The mock server listens on 127.0.0.1; "localhost" plays the challenge host
        challenge_host: "localhost".to_string(),
        next_page_delay_ms: 10,
        captcha_delay_ms: 10,
        captcha_image_timeout_ms: 5_000,
        captcha_dir: captcha_dir.to_string(),
        ..SpiderConfig::default()
    }
}

fn test_user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: None,
    }
}

/// Runs one search per query and returns the engine's verdict
async fn run_search(
    config: SpiderConfig,
    output: Arc<dyn OutputSink>,
    prompt: Arc<dyn Prompt>,
    queries: &[&str],
) -> google_search::Result<google_search::output::CrawlStatistics> {
    let client = build_http_client(&test_user_agent()).expect("Failed to build client");
    let spider =
        Arc::new(GoogleSpider::new(config, output, prompt).expect("Failed to build spider"));

    let mut registry = CallbackRegistry::new();
    spider.register(&mut registry);

    let engine = Engine::new(client, registry, CancellationToken::new());
    for query in queries {
        engine
            .schedule(spider.search_request(query).expect("Failed to build request"))
            .expect("Failed to seed query");
    }

    tokio::time::timeout(std::time::Duration::from_secs(30), engine.run())
        .await
        .expect("Search did not finish")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

#[tokio::test]
async fn test_search_follows_pagination() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Page 2 is mounted first so it wins over the generic page 1 mock
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "cats"))
        .and(query_param("start", "10"))
        .respond_with(html(
            r#"<h3 class="r"><a href="https://third.example/">3</a></h3>
               <a href="/search?q=cats&amp;start=0">Previous</a>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "cats"))
        .respond_with(html(
            r#"<h3 class="r"><a href="/url?q=https://first.example/&amp;sa=U">1</a></h3>
               <h3 class="r"><a href="/search?q=cats&amp;tbm=isch">Images</a></h3>
               <h3 class="r"><a href="https://second.example/">2</a></h3>
               <a href="/search?q=cats&amp;start=10">Next</a>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let sink = Arc::new(MemorySink::new());
    let stats = run_search(
        create_test_config(&base_url, dir.path().to_str().unwrap()),
        sink.clone(),
        Arc::new(StaticPrompt::default()),
        &["cats"],
    )
    .await
    .expect("Search failed");

    let results = sink.results();
    assert_eq!(
        results,
        vec![
            SearchResult {
                query: "cats".to_string(),
                page: 1,
                results: vec![
                    "https://first.example/".to_string(),
                    "https://second.example/".to_string(),
                ],
                engine: "google".to_string(),
                source: format!("{}/search?q=cats", base_url),
            },
            SearchResult {
                query: "cats".to_string(),
                page: 2,
                results: vec!["https://third.example/".to_string()],
                engine: "google".to_string(),
                source: format!("{}/search?q=cats&start=10", base_url),
            },
        ]
    );

    assert_eq!(stats.requests_fetched, 2);
    assert_eq!(stats.pages_parsed, 2);
    assert_eq!(stats.result_urls, 3);
    assert_eq!(stats.pages_scheduled, 1);
    assert_eq!(stats.branches_failed, 0);
}

#[tokio::test]
async fn test_results_written_as_json_lines() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html(r#"<h3 class="r"><a href="https://example.com/">x</a></h3>"#))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let results_path = dir.path().join("results.jsonl");
    let sink = build_sink(&OutputConfig {
        results_path: Some(results_path.display().to_string()),
        pretty_print: false,
    })
    .expect("Failed to open sink");

    run_search(
        create_test_config(&base_url, dir.path().to_str().unwrap()),
        Arc::new(sink),
        Arc::new(StaticPrompt::default()),
        &["cats", "dogs"],
    )
    .await
    .expect("Search failed");

    let content = std::fs::read_to_string(&results_path).expect("Failed to read results");
    let mut queries: Vec<String> = content
        .lines()
        .map(|line| serde_json::from_str::<SearchResult>(line).expect("Invalid JSON line"))
        .map(|result| result.query)
        .collect();
    queries.sort();
    assert_eq!(queries, vec!["cats", "dogs"]);
}

#[tokio::test]
async fn test_captcha_round_trip() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let port = url::Url::parse(&base_url)
        .expect("Failed to parse base URL")
        .port()
        .expect("Mock server has no port");
    let challenge_url = format!("http://localhost:{}", port);
    let challenge_page = format!("{}/sorry/index?continue=x", challenge_url);

    // After the solved form: the original search, now answered
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("solved", "1"))
        .respond_with(html(r#"<h3 class="r"><a href="https://after-captcha.example/">ok</a></h3>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    // First attempt: bounced to the challenge host
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", challenge_page.as_str()),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    // Solved form goes back to the search
    Mock::given(method("GET"))
        .and(path("/sorry/index"))
        .and(query_param("captcha", "xyz"))
        .and(query_param("q", "token"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/search?q=dogs&solved=1", base_url).as_str()),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sorry/index"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_string(
                    r#"<html><body>
                        <img src="/sorry/image?id=1">
                        <form action="index">
                            <input type="hidden" name="q" value="token">
                            <input type="hidden" name="continue" value="x">
                            <input type="text" name="captcha">
                        </form>
                    </body></html>"#,
                )
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sorry/image"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"\xff\xd8fake-jpeg".to_vec())
                .insert_header("content-type", "image/jpeg"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let sink = Arc::new(MemorySink::new());
    let prompt = Arc::new(StaticPrompt::new(["xyz"]));
    let stats = run_search(
        create_test_config(&base_url, dir.path().to_str().unwrap()),
        sink.clone(),
        prompt.clone(),
        &["dogs"],
    )
    .await
    .expect("Search failed");

    let results = sink.results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].query, "dogs");
    assert_eq!(results[0].results, vec!["https://after-captcha.example/"]);

    assert_eq!(prompt.questions().len(), 1);
    assert_eq!(stats.captcha_episodes, 1);
    assert_eq!(stats.captchas_resolved, 1);
    assert_eq!(stats.branches_failed, 0);

    // The captcha image is gone once the form is resubmitted
    let leftovers = std::fs::read_dir(dir.path()).expect("Failed to list captcha dir").count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_failed_page_ends_only_its_branch() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html(r#"<h3 class="r"><a href="https://fine.example/">x</a></h3>"#))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let sink = Arc::new(MemorySink::new());
    let stats = run_search(
        create_test_config(&base_url, dir.path().to_str().unwrap()),
        sink.clone(),
        Arc::new(StaticPrompt::default()),
        &["broken", "fine"],
    )
    .await
    .expect("Search failed");

    let results = sink.results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].query, "fine");
    assert_eq!(stats.branches_failed, 1);
}
