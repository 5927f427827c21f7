//! Integration tests for Reporter using wiremock
//!
//! These tests validate delivery behaviour against a mock report endpoint.

mod common;

use cellwatch::config::ReporterConfig;
use cellwatch::error::{CellwatchErrorTrait, ErrorCategory};
use cellwatch::report::{Endpoint, ReportError, ReportSink, Reporter, Route};
use std::time::Duration;
use tokio::runtime::Handle;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn reporter(timeout_secs: u64, max_pending: usize) -> Reporter {
    let config = ReporterConfig {
        timeout_secs,
        max_pending,
    };
    Reporter::new(&config, Handle::current()).unwrap()
}

/// Test successful delivery honours method and content type
#[tokio::test]
async fn test_deliver_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/monitor"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({"world": "world", "x": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_string("stored"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let endpoint = Endpoint::new(Route::MonitorUpdate, &mock_server.uri(), "/monitor", "put").unwrap();
    let delivery = reporter(5, 4)
        .deliver(&endpoint, r#"{"world":"world","x":1}"#.to_string())
        .await
        .unwrap();

    assert_eq!(delivery.status, 200);
    assert_eq!(delivery.body, "stored");
}

/// Test configured method is used verbatim
#[tokio::test]
async fn test_deliver_uses_endpoint_method() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/monitor/update"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let endpoint =
        Endpoint::new(Route::MonitorUpdate, &mock_server.uri(), "/monitor/update", "PATCH").unwrap();
    let result = reporter(5, 4).deliver(&endpoint, "{}".to_string()).await;

    assert_eq!(result.unwrap().status, 204);
}

/// Test non-2xx is reported as a status error
#[tokio::test]
async fn test_deliver_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/report"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let endpoint = Endpoint::new(Route::Command, &mock_server.uri(), "/report", "POST").unwrap();
    let err = reporter(5, 4)
        .deliver(&endpoint, "{}".to_string())
        .await
        .unwrap_err();

    match &err {
        ReportError::Status { status, body, .. } => {
            assert_eq!(*status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("Expected status error, got: {other:?}"),
    }
    assert_eq!(err.category(), ErrorCategory::HttpStatus);
}

/// Test connection failures are transport errors
#[tokio::test]
async fn test_deliver_connection_refused() {
    let endpoint = Endpoint::new(Route::Command, &common::closed_port_url(), "/report", "POST").unwrap();
    let err = reporter(1, 4)
        .deliver(&endpoint, "{}".to_string())
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::Transport { .. }), "got: {err:?}");
    assert!(err.is_recoverable());
}

/// Test the request timeout applies
#[tokio::test]
async fn test_deliver_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let endpoint = Endpoint::new(Route::MonitorBatch, &mock_server.uri(), "/monitor", "PUT").unwrap();
    let err = reporter(1, 4)
        .deliver(&endpoint, "[]".to_string())
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::Transport { .. }), "got: {err:?}");
}

/// Test fire-and-forget send completes on drain
#[tokio::test]
async fn test_send_then_drain() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/report"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&mock_server)
        .await;

    let reporter = reporter(5, 8);
    let endpoint = Endpoint::new(Route::Command, &mock_server.uri(), "/report", "POST").unwrap();
    for i in 0..3 {
        reporter.submit(&endpoint, format!(r#"{{"n":{i}}}"#));
    }
    reporter.drain().await;

    assert_eq!(reporter.pending(), 0);
    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 3);
}

/// Test failures in fire-and-forget sends never surface
#[tokio::test]
async fn test_send_failures_are_swallowed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let reporter = reporter(1, 4);
    let failing = Endpoint::new(Route::MonitorUpdate, &mock_server.uri(), "/monitor", "PUT").unwrap();
    let refused = Endpoint::new(Route::Command, &common::closed_port_url(), "/report", "POST").unwrap();

    let a = reporter.send(&failing, "{}".to_string()).unwrap();
    let b = reporter.send(&refused, "{}".to_string()).unwrap();

    assert!(a.await.is_ok());
    assert!(b.await.is_ok());
}

/// Test reports beyond the pending limit are dropped
#[tokio::test]
async fn test_pending_limit_drops_reports() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
        .mount(&mock_server)
        .await;

    let reporter = reporter(5, 2);
    let endpoint = Endpoint::new(Route::MonitorUpdate, &mock_server.uri(), "/monitor", "PUT").unwrap();

    assert!(reporter.send(&endpoint, "{}".to_string()).is_some());
    assert!(reporter.send(&endpoint, "{}".to_string()).is_some());
    assert!(reporter.send(&endpoint, "{}".to_string()).is_none());

    reporter.drain().await;
    assert!(reporter.send(&endpoint, "{}".to_string()).is_some());
    reporter.drain().await;

    // The dropped report never went out
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}
