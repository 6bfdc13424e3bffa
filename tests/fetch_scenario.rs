//! HTTP fetch scenario against a local mock server

use std::net::TcpListener;
use std::time::Duration;

use fanout::config::FetchConfig;
use fanout::parallel::{ErrorKind, ExecutionMode, run_async};
use fanout::scenarios::fetch::{self, HttpFetcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn server_with_pages() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/one"))
        .respond_with(ResponseTemplate::new(200).set_body_string("first page"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/two"))
        .respond_with(ResponseTemplate::new(200).set_body_string("second, longer page"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_fetch_returns_body() {
    let server = server_with_pages().await;
    let body = fetch::fetch(&format!("{}/one", server.uri()), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(body, "first page");
}

#[tokio::test]
async fn test_non_success_status_is_reported() {
    let server = server_with_pages().await;
    let url = format!("{}/missing", server.uri());
    let err = fetch::fetch(&url, Duration::from_secs(5)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HttpStatus);
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(Duration::from_millis(200)).unwrap();
    assert_eq!(fetcher.timeout(), Duration::from_millis(200));
    let err = fetcher.fetch(&format!("{}/slow", server.uri())).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn test_unreachable_host_is_a_connection_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let err = fetch::fetch(&format!("http://127.0.0.1:{port}/"), Duration::from_secs(5))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}

#[tokio::test]
async fn test_batch_keeps_failures_in_their_slots() {
    let server = server_with_pages().await;
    let urls = vec![
        format!("{}/one", server.uri()),
        format!("{}/missing", server.uri()),
        format!("{}/two", server.uri()),
    ];
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

    let report = run_async(
        urls.clone(),
        move |url| {
            let fetcher = fetcher.clone();
            async move { fetcher.page(url).await }
        },
        ExecutionMode::Concurrent,
    )
    .await
    .unwrap();

    assert_eq!(report.total_inputs, 3);
    let first = report.results[0].as_ref().unwrap();
    assert_eq!(first.url, urls[0]);
    assert_eq!(first.body, "first page");
    assert_eq!(report.results[1].as_ref().unwrap_err().kind, ErrorKind::HttpStatus);
    assert_eq!(report.results[2].as_ref().unwrap().bytes, "second, longer page".len());
}

#[tokio::test]
async fn test_scenario_compares_both_modes() {
    let server = server_with_pages().await;
    let settings = FetchConfig {
        urls: vec![
            format!("{}/two", server.uri()),
            format!("{}/one", server.uri()),
        ],
        timeout_secs: 5,
    };

    let comparison = fetch::run(&settings).await.unwrap();

    for report in [&comparison.sequential, &comparison.concurrent] {
        let urls: Vec<&str> = report.successes().map(|(_, page)| page.url.as_str()).collect();
        assert_eq!(urls, vec![settings.urls[0].as_str(), settings.urls[1].as_str()]);
    }
    assert_eq!(comparison.concurrent.mode, ExecutionMode::Concurrent);
}
