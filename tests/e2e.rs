//! End-to-end tests against a mock recognition service.
//!
//! Every test starts a `wiremock` server that plays the role of the
//! recognition API: a POST endpoint that accepts submissions and a polling
//! endpoint whose responses are scripted per test. Input files are written
//! to a temp directory.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use futures::StreamExt;
use serde_json::{json, Value};
use sight_ocr::{
    dedup_pages, recognize, recognize_stream, recognize_sync, recognize_to_file, ClientConfig,
    ProgressCallback, RecognitionProgressCallback, RecognizedPage, SightError,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Test helpers ─────────────────────────────────────────────────────────────

const API_KEY: &str = "test-api-key";
const POLL_INTERVAL: Duration = Duration::from_millis(20);

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::builder()
        .api_key(API_KEY)
        .endpoint(format!("{}/api/sight/", server.uri()))
        .poll_interval(POLL_INTERVAL)
        .build()
        .expect("valid config")
}

fn polling_url(server: &MockServer) -> String {
    format!("{}/poll/job-1", server.uri())
}

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let p = dir.join(name);
    std::fs::write(&p, bytes).expect("write input file");
    p
}

/// A temp dir holding `doc.pdf` (2 pages on the service side) and `scan.png`.
fn two_files() -> (TempDir, Vec<PathBuf>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let pdf = write_file(dir.path(), "doc.pdf", b"%PDF-1.7 fake");
    let png = write_file(dir.path(), "scan.png", b"\x89PNG fake");
    (dir, vec![pdf, png])
}

fn page(file_index: usize, page_number: usize, of: usize) -> Value {
    json!({
        "FileIndex": file_index,
        "PageNumber": page_number,
        "NumberOfPagesInFile": of,
        "RecognizedText": format!("file {file_index} page {page_number}"),
        "Error": ""
    })
}

fn pages(pages: Vec<Value>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "Pages": pages }))
}

async fn mount_submission(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/sight/"))
        .and(header("Authorization", "Basic test-api-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "PollingURL": polling_url(server) })),
        )
        .expect(1)
        .mount(server)
        .await;
}

/// Mount one scripted poll response that answers exactly `times` requests.
///
/// Mocks registered earlier take precedence, so calling this in sequence
/// scripts the polling endpoint's responses in order.
async fn mount_poll(server: &MockServer, response: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path("/poll/job-1"))
        .and(header("Authorization", "Basic test-api-key"))
        .respond_with(response)
        .up_to_n_times(times)
        .expect(times)
        .mount(server)
        .await;
}

async fn count_requests(server: &MockServer, verb: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == verb)
        .count()
}

fn keys(pages: &[RecognizedPage]) -> Vec<(usize, usize)> {
    pages.iter().map(|p| p.key()).collect()
}

// ── Scenario: two files, two polls ──────────────────────────────────────────

#[tokio::test]
async fn two_files_two_batches_then_stop() {
    let server = MockServer::start().await;
    let (_dir, files) = two_files();

    mount_submission(&server).await;
    mount_poll(&server, pages(vec![page(0, 1, 2)]), 1).await;
    mount_poll(&server, pages(vec![page(0, 2, 2), page(1, 1, 1)]), 1).await;

    let stream = recognize_stream(&files, &config(&server)).await.unwrap();
    let batches: Vec<_> = stream.collect().await;

    assert_eq!(batches.len(), 2, "expected exactly two batches");
    let first = batches[0].as_ref().unwrap();
    let second = batches[1].as_ref().unwrap();
    assert_eq!(keys(first), vec![(0, 1)]);
    assert_eq!(keys(second), vec![(0, 2), (1, 1)]);

    // no third poll after completion
    assert_eq!(count_requests(&server, "GET").await, 2);
}

#[tokio::test]
async fn eager_recognize_returns_pages_in_emission_order() {
    let server = MockServer::start().await;
    let (_dir, files) = two_files();

    mount_submission(&server).await;
    mount_poll(&server, pages(vec![page(0, 1, 2)]), 1).await;
    mount_poll(&server, pages(vec![page(0, 2, 2), page(1, 1, 1)]), 1).await;

    let result = recognize(&files, &config(&server)).await.unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(keys(&result), vec![(0, 1), (0, 2), (1, 1)]);
    assert_eq!(result[2].recognized_text, "file 1 page 1");
}

#[tokio::test]
async fn submission_body_lists_files_in_order() {
    let server = MockServer::start().await;
    let (_dir, files) = two_files();

    mount_submission(&server).await;
    mount_poll(&server, pages(vec![page(0, 1, 1), page(1, 1, 1)]), 1).await;

    recognize(&files, &config(&server)).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let post = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .expect("submission was sent");
    let body: Value = post.body_json().unwrap();
    let submitted = body["files"].as_array().unwrap();

    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0]["mimeType"], "application/pdf");
    assert_eq!(submitted[0]["base64File"], "JVBERi0xLjcgZmFrZQ==");
    assert_eq!(submitted[1]["mimeType"], "image/png");
}

// ── Synchronous shortcut ────────────────────────────────────────────────────

#[tokio::test]
async fn synchronous_response_yields_single_page() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let img = write_file(dir.path(), "small.jpg", b"\xff\xd8\xff");

    Mock::given(method("POST"))
        .and(path("/api/sight/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "RecognizedText": "hello world" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let stream = recognize_stream([&img], &config(&server)).await.unwrap();
    let batches: Vec<_> = stream.collect().await;

    assert_eq!(batches.len(), 1);
    let batch = batches.into_iter().next().unwrap().unwrap();
    assert_eq!(
        batch,
        vec![RecognizedPage {
            file_index: 0,
            page_number: 1,
            number_of_pages_in_file: 1,
            recognized_text: "hello world".into(),
            error: String::new(),
        }]
    );
    assert_eq!(count_requests(&server, "GET").await, 0);
}

// ── Polling behaviour ───────────────────────────────────────────────────────

#[tokio::test]
async fn empty_poll_waits_and_retries_once() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(dir.path(), "one.pdf", b"%PDF");

    mount_submission(&server).await;
    mount_poll(&server, pages(vec![]), 1).await;
    mount_poll(&server, pages(vec![page(0, 1, 1)]), 1).await;

    let start = Instant::now();
    let stream = recognize_stream([&pdf], &config(&server)).await.unwrap();
    let batches: Vec<_> = stream.collect().await;

    // the empty poll emits nothing
    assert_eq!(batches.len(), 1);
    assert_eq!(keys(batches[0].as_ref().unwrap()), vec![(0, 1)]);
    assert_eq!(count_requests(&server, "GET").await, 2);
    assert!(
        start.elapsed() >= POLL_INTERVAL,
        "retry must wait for the poll interval"
    );
}

#[tokio::test]
async fn repeated_pages_are_delivered_and_do_not_block_completion() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(dir.path(), "two-pages.pdf", b"%PDF");

    mount_submission(&server).await;
    mount_poll(&server, pages(vec![page(0, 1, 2)]), 1).await;
    mount_poll(&server, pages(vec![page(0, 1, 2), page(0, 2, 2)]), 1).await;

    let result = recognize([&pdf], &config(&server)).await.unwrap();

    assert_eq!(keys(&result), vec![(0, 1), (0, 1), (0, 2)]);
    assert_eq!(keys(&dedup_pages(result)), vec![(0, 1), (0, 2)]);
}

#[tokio::test]
async fn incomplete_file_keeps_polling() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(dir.path(), "two-pages.pdf", b"%PDF");

    mount_submission(&server).await;
    // page 2 never arrives
    Mock::given(method("GET"))
        .and(path("/poll/job-1"))
        .respond_with(pages(vec![page(0, 1, 2)]))
        .mount(&server)
        .await;

    let stream = recognize_stream([&pdf], &config(&server)).await.unwrap();
    let batches: Vec<_> = stream.take(3).collect().await;

    assert_eq!(batches.len(), 3, "stream must not end while a page is missing");
    assert!(batches.iter().all(|b| b.is_ok()));

    // dropping the stream stops polling: no request beyond the pulled ones
    tokio::time::sleep(POLL_INTERVAL * 3).await;
    assert_eq!(count_requests(&server, "GET").await, 3);
}

#[tokio::test]
async fn pages_with_errors_are_data() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(dir.path(), "bad.pdf", b"%PDF");

    mount_submission(&server).await;
    let mut failed = page(0, 1, 1);
    failed["Error"] = json!("page could not be read");
    failed["RecognizedText"] = json!("");
    mount_poll(&server, pages(vec![failed]), 1).await;

    let result = recognize([&pdf], &config(&server)).await.unwrap();
    assert_eq!(result.len(), 1);
    assert!(result[0].has_error());
    assert_eq!(result[0].error, "page could not be read");
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unsupported_file_never_reaches_the_network() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(dir.path(), "ok.pdf", b"%PDF");
    let txt = write_file(dir.path(), "notes.txt", b"plain");

    let err = recognize([&pdf, &txt], &config(&server)).await.unwrap_err();

    match err {
        SightError::UnsupportedFileType { path } => assert_eq!(path, txt),
        other => panic!("unexpected error: {other}"),
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_file_is_reported_before_submission() {
    let server = MockServer::start().await;
    let err = recognize(["/no/such/dir/missing.png"], &config(&server))
        .await
        .unwrap_err();
    assert!(matches!(err, SightError::FileNotFound { .. }), "got: {err}");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn submission_http_error_is_transport_error() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(dir.path(), "a.pdf", b"%PDF");

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let err = recognize([&pdf], &config(&server)).await.unwrap_err();
    match err {
        SightError::Transport { status, body, .. } => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad key");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn bodiless_error_status_is_still_transport_error() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(dir.path(), "a.pdf", b"%PDF");

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = recognize([&pdf], &config(&server)).await.unwrap_err();
    assert!(
        matches!(err, SightError::Transport { status: 503, ref body, .. } if body.is_empty()),
        "got: {err}"
    );
}

#[tokio::test]
async fn poll_http_error_ends_stream_without_retry() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(dir.path(), "a.pdf", b"%PDF");

    mount_submission(&server).await;
    mount_poll(&server, ResponseTemplate::new(500).set_body_string("boom"), 1).await;

    let mut stream = recognize_stream([&pdf], &config(&server)).await.unwrap();
    match stream.next().await {
        Some(Err(SightError::Transport { status: 500, body, .. })) => assert_eq!(body, "boom"),
        other => panic!("expected transport error, got {other:?}"),
    }
    assert!(stream.next().await.is_none());
    assert_eq!(count_requests(&server, "GET").await, 1);
}

#[tokio::test]
async fn submission_without_known_fields_is_protocol_error() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(dir.path(), "a.pdf", b"%PDF");

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Status": "queued" })))
        .mount(&server)
        .await;

    let err = recognize([&pdf], &config(&server)).await.unwrap_err();
    assert!(matches!(err, SightError::Protocol { .. }), "got: {err}");
}

#[tokio::test]
async fn poll_without_pages_field_is_protocol_error() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(dir.path(), "a.pdf", b"%PDF");

    mount_submission(&server).await;
    mount_poll(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "Status": "working" })),
        1,
    )
    .await;

    let err = recognize([&pdf], &config(&server)).await.unwrap_err();
    assert!(err.to_string().contains("Pages"), "got: {err}");
}

#[tokio::test]
async fn page_for_unknown_file_is_protocol_error() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(dir.path(), "a.pdf", b"%PDF");

    mount_submission(&server).await;
    mount_poll(&server, pages(vec![page(3, 1, 1)]), 1).await;

    let err = recognize([&pdf], &config(&server)).await.unwrap_err();
    assert!(matches!(err, SightError::Protocol { .. }), "got: {err}");
}

// ── Progress, file output, blocking wrapper ────────────────────────────────

#[derive(Default)]
struct Counting {
    submitted: AtomicUsize,
    polling: AtomicUsize,
    batches: AtomicUsize,
    last_complete: AtomicUsize,
    emitted: AtomicUsize,
}

impl RecognitionProgressCallback for Counting {
    fn on_submission_start(&self, file_count: usize) {
        self.submitted.store(file_count, Ordering::SeqCst);
    }

    fn on_polling_started(&self, _polling_url: &str) {
        self.polling.fetch_add(1, Ordering::SeqCst);
    }

    fn on_batch(&self, _batch_len: usize, files_complete: usize, _total_files: usize) {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.last_complete.store(files_complete, Ordering::SeqCst);
    }

    fn on_recognition_complete(&self, pages_emitted: usize) {
        self.emitted.store(pages_emitted, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn progress_callback_sees_every_stage() {
    let server = MockServer::start().await;
    let (_dir, files) = two_files();

    mount_submission(&server).await;
    mount_poll(&server, pages(vec![page(0, 1, 2)]), 1).await;
    mount_poll(&server, pages(vec![page(0, 2, 2), page(1, 1, 1)]), 1).await;

    let counter = Arc::new(Counting::default());
    let callback: ProgressCallback = counter.clone();
    let config = ClientConfig {
        progress_callback: Some(callback),
        ..config(&server)
    };

    recognize(&files, &config).await.unwrap();

    assert_eq!(counter.submitted.load(Ordering::SeqCst), 2);
    assert_eq!(counter.polling.load(Ordering::SeqCst), 1);
    assert_eq!(counter.batches.load(Ordering::SeqCst), 2);
    assert_eq!(counter.last_complete.load(Ordering::SeqCst), 2);
    assert_eq!(counter.emitted.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn recognize_to_file_writes_json_array() {
    let server = MockServer::start().await;
    let (dir, files) = two_files();

    mount_submission(&server).await;
    mount_poll(&server, pages(vec![page(0, 1, 2), page(0, 2, 2), page(1, 1, 1)]), 1).await;

    let out = dir.path().join("out/pages.json");
    let written = recognize_to_file(&files, &out, &config(&server)).await.unwrap();
    assert_eq!(written, 3);

    let saved: Vec<RecognizedPage> =
        serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
    assert_eq!(keys(&saved), vec![(0, 1), (0, 2), (1, 1)]);
    assert!(!out.with_extension("json.tmp").exists());
}

#[test]
fn blocking_wrapper_recognizes() {
    let server = tokio_test::block_on(async {
        let server = MockServer::start().await;
        mount_submission(&server).await;
        mount_poll(&server, pages(vec![page(0, 1, 1)]), 1).await;
        server
    });

    let dir = tempfile::tempdir().unwrap();
    let gif = write_file(dir.path(), "anim.gif", b"GIF89a");

    let result = recognize_sync([&gif], &config(&server)).unwrap();
    assert_eq!(keys(&result), vec![(0, 1)]);
}
