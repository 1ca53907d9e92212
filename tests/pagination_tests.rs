use async_trait::async_trait;
use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use yield_records::{
    ExtractError, Extraction, ExtractionConfig, ExtractionEvent, FetchResponse, Fetcher,
    FieldDescriptor, HttpFetcher, PaginationConfig, Result, build_page_url, pagination,
};

const BASE: &str = "https://shop.example/list";

fn listing(titles: &[&str]) -> String {
    let cards: String = titles
        .iter()
        .map(|t| format!(r#"<div class="product"><h2 class="title">{t}</h2></div>"#))
        .collect();
    format!("<html><body>{cards}</body></html>")
}

fn config(max_pages: i64) -> ExtractionConfig {
    let mut config = ExtractionConfig::new(
        ".product",
        vec![FieldDescriptor::text("title", "h2.title")],
        PaginationConfig::new(BASE, "page", max_pages),
    );
    config.delay_ms = 0;
    config
}

fn page_url(page: i64) -> String {
    build_page_url(&PaginationConfig::new(BASE, "page", 1), page)
}

/// Serves canned responses and records every requested URL
#[derive(Default)]
struct MockFetcher {
    pages: HashMap<String, FetchResponse>,
    requested: Mutex<Vec<(String, Instant)>>,
    cancel_on: Option<(String, CancellationToken)>,
    closed: AtomicUsize,
}

impl MockFetcher {
    fn with_page(mut self, page: i64, body: &str) -> Self {
        let url = page_url(page);
        self.pages
            .insert(url.clone(), FetchResponse::ok_with_body(&url, body));
        self
    }

    fn with_status(mut self, page: i64, status: u16, status_text: &str) -> Self {
        let url = page_url(page);
        self.pages.insert(
            url.clone(),
            FetchResponse {
                url,
                status,
                status_text: status_text.to_string(),
                body: String::new(),
            },
        );
        self
    }

    fn cancelling_at(mut self, page: i64, token: CancellationToken) -> Self {
        self.cancel_on = Some((page_url(page), token));
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    fn requested_at(&self) -> Vec<Instant> {
        self.requested.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }

    fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        self.requested
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));

        if let Some((cancel_url, token)) = &self.cancel_on {
            if cancel_url == url {
                token.cancel();
            }
        }

        match self.pages.get(url) {
            Some(response) => Ok(response.clone()),
            None => Err(ExtractError::Fetch(format!("no route to {url}"))),
        }
    }

    async fn close(&self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

async fn drain(mut rx: tokio::sync::mpsc::Receiver<ExtractionEvent>) -> Vec<ExtractionEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_failed_page_yields_one_error_and_run_continues() {
    let fetcher = Arc::new(
        MockFetcher::default()
            .with_page(1, &listing(&["A", "B"]))
            .with_status(2, 500, "Internal Server Error")
            .with_page(3, &listing(&["C"])),
    );

    let rx = pagination::start(&config(3), fetcher.clone(), CancellationToken::new())
        .await
        .unwrap();
    let events = drain(rx).await;

    let pages: Vec<i64> = events.iter().map(ExtractionEvent::page).collect();
    assert_eq!(pages, vec![1, 1, 2, 3]);

    let errors: Vec<&ExtractionEvent> = events.iter().filter(|e| e.is_error()).collect();
    assert_eq!(
        errors,
        vec![&ExtractionEvent::Error {
            page: 2,
            message: "HTTP Error 500: Internal Server Error".to_string(),
        }]
    );

    let json = serde_json::to_value(&events[1]).unwrap();
    assert_eq!(
        json,
        json!({
            "type": "result",
            "page": 1,
            "elementNumber": 2,
            "totalElementsOnPage": 2,
            "data": {"title": "B"}
        })
    );

    assert_eq!(fetcher.requested(), vec![page_url(1), page_url(2), page_url(3)]);
    assert_eq!(fetcher.closed(), 1);
}

#[tokio::test]
async fn test_pages_start_from_configured_value() {
    let fetcher = Arc::new(
        MockFetcher::default()
            .with_page(4, &listing(&["D"]))
            .with_page(5, &listing(&[])),
    );
    let mut cfg = config(2);
    if let Some(p) = cfg.pagination.as_mut() {
        p.page_param_value = "4".to_string();
    }

    let events = drain(
        pagination::start(&cfg, fetcher.clone(), CancellationToken::new())
            .await
            .unwrap(),
    )
    .await;

    // A page without matches is not an error
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].page(), 4);
    assert_eq!(fetcher.requested(), vec![page_url(4), page_url(5)]);
}

#[tokio::test]
async fn test_empty_body_and_fetch_failure_are_page_errors() {
    let fetcher = Arc::new(MockFetcher::default().with_page(1, "  \n "));

    let events = drain(
        pagination::start(&config(2), fetcher, CancellationToken::new())
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(events.len(), 2);
    match &events[0] {
        ExtractionEvent::Error { page, message } => {
            assert_eq!(*page, 1);
            assert_eq!(message, "Empty response received");
        }
        other => panic!("expected an error event, got {other:?}"),
    }
    assert!(events[1].is_error());
    assert_eq!(events[1].page(), 2);
}

#[tokio::test]
async fn test_invalid_config_fails_before_any_request() {
    let fetcher = Arc::new(MockFetcher::default().with_page(1, &listing(&["A"])));
    let mut cfg = config(1);
    cfg.root_selector = None;

    let err = pagination::start(&cfg, fetcher.clone(), CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        ExtractError::Config(errors) => {
            assert_eq!(errors, vec!["Root element not selected".to_string()])
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(fetcher.requested().is_empty());
    assert_eq!(fetcher.closed(), 0);
}

#[tokio::test]
async fn test_cancellation_stops_remaining_pages() {
    let token = CancellationToken::new();
    let fetcher = Arc::new(
        MockFetcher::default()
            .with_page(1, &listing(&["A"]))
            .with_page(2, &listing(&["B"]))
            .with_page(3, &listing(&["C"]))
            .cancelling_at(2, token.clone()),
    );

    let events = drain(
        pagination::start(&config(3), fetcher.clone(), token)
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].page(), 1);
    assert_eq!(fetcher.requested(), vec![page_url(1), page_url(2)]);
    assert_eq!(fetcher.closed(), 1);
}

#[tokio::test]
async fn test_dropping_receiver_stops_run() {
    let fetcher = Arc::new(
        MockFetcher::default()
            .with_page(1, &listing(&["A"]))
            .with_page(2, &listing(&["B"])),
    );

    let rx = pagination::start(&config(2), fetcher.clone(), CancellationToken::new())
        .await
        .unwrap();
    drop(rx);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(fetcher.requested(), vec![page_url(1)]);
    assert_eq!(fetcher.closed(), 1);
}

#[tokio::test]
async fn test_delay_applies_between_pages_only() {
    let fetcher = Arc::new(
        MockFetcher::default()
            .with_page(1, &listing(&["A"]))
            .with_page(2, &listing(&["B"]))
            .with_page(3, &listing(&["C"])),
    );
    let mut cfg = config(3);
    cfg.delay_ms = 100;

    let started = Instant::now();
    let events = drain(
        pagination::start(&cfg, fetcher.clone(), CancellationToken::new())
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(events.len(), 3);

    let times = fetcher.requested_at();
    assert_eq!(times.len(), 3);
    assert!(times[0] - started < Duration::from_millis(100));
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(100));
    }
}

#[tokio::test]
async fn test_cancel_during_delay_stops_run() {
    let fetcher = Arc::new(
        MockFetcher::default()
            .with_page(1, &listing(&["A"]))
            .with_page(2, &listing(&["B"])),
    );
    let mut cfg = config(2);
    cfg.delay_ms = 30_000;
    let token = CancellationToken::new();

    let started = Instant::now();
    let mut rx = pagination::start(&cfg, fetcher.clone(), token.clone())
        .await
        .unwrap();

    let first = rx.recv().await.unwrap();
    assert_eq!(first.page(), 1);
    token.cancel();

    assert!(rx.recv().await.is_none());
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(fetcher.requested(), vec![page_url(1)]);
    assert_eq!(fetcher.closed(), 1);
}

#[tokio::test]
async fn test_collect_gathers_items_and_errors() {
    let fetcher = Arc::new(
        MockFetcher::default()
            .with_page(1, &listing(&["A", "B"]))
            .with_status(2, 404, "Not Found"),
    );

    let dataset = Extraction::new(config(2))
        .with_fetcher(fetcher)
        .collect()
        .await
        .unwrap();

    let titles: Vec<_> = dataset.items.iter().map(|i| i["title"].clone()).collect();
    assert_eq!(titles, vec![json!("A"), json!("B")]);
    assert_eq!(dataset.errors, vec![(2, "HTTP Error 404: Not Found".to_string())]);
}

#[tokio::test]
async fn test_collect_reports_cancellation() {
    let extraction = Extraction::new(config(3));
    let token = extraction.cancel_token();
    let fetcher = Arc::new(
        MockFetcher::default()
            .with_page(1, &listing(&["A"]))
            .with_page(2, &listing(&["B"]))
            .cancelling_at(1, token),
    );

    let err = extraction.with_fetcher(fetcher).collect().await.unwrap_err();
    assert!(matches!(err, ExtractError::Cancelled));
}

#[tokio::test]
async fn test_http_fetcher_reports_redirect_target() {
    let server = MockServer::start_async().await;
    let moved = server
        .mock_async(|when, then| {
            when.method(GET).path("/list");
            then.status(301).header("location", "/catalog/index.html");
        })
        .await;
    let target = server
        .mock_async(|when, then| {
            when.method(GET).path("/catalog/index.html");
            then.status(200).body(
                r#"<html><body><div class="product"><a href="item/9">Nine</a></div></body></html>"#,
            );
        })
        .await;

    let fetcher = HttpFetcher::default();
    let response = fetcher.fetch(&server.url("/list")).await.unwrap();
    moved.assert_async().await;
    target.assert_async().await;
    assert_eq!(response.url, server.url("/catalog/index.html"));

    let items = yield_records::extract::extract_from_html(
        &response.body,
        Some(response.url.as_str()),
        ".product",
        &[FieldDescriptor::link("link", "a")],
    )
    .unwrap();
    assert_eq!(
        items[0]["link"]["href"],
        json!(server.url("/catalog/item/9"))
    );
}

#[tokio::test]
async fn test_http_fetcher_against_live_server() {
    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(GET).path("/list").query_param("page", "1");
            then.status(200)
                .header("content-type", "text/html")
                .body(r#"<html><body><div class="product"><h2 class="title">Lamp</h2><a href="/lamp">x</a></div></body></html>"#);
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET).path("/list").query_param("page", "2");
            then.status(503);
        })
        .await;

    let mut cfg = config(2);
    cfg.fields.push(FieldDescriptor::link("link", "a"));
    if let Some(p) = cfg.pagination.as_mut() {
        p.base_url = server.url("/list");
    }

    let fetcher = Arc::new(HttpFetcher::new(&cfg.user_agent).unwrap());
    let events = drain(
        pagination::start(&cfg, fetcher, CancellationToken::new())
            .await
            .unwrap(),
    )
    .await;

    first.assert_async().await;
    second.assert_async().await;

    assert_eq!(events.len(), 2);
    match &events[0] {
        ExtractionEvent::Result { data, .. } => {
            assert_eq!(data["title"], json!("Lamp"));
            assert_eq!(data["link"]["href"], json!(server.url("/lamp")));
        }
        other => panic!("expected a result, got {other:?}"),
    }
    assert_eq!(
        events[1],
        ExtractionEvent::Error {
            page: 2,
            message: "HTTP Error 503: Service Unavailable".to_string(),
        }
    );
}
