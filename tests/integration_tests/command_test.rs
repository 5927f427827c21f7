//! Block info command integration tests

use cellwatch::command::{CommandSender, Feedback};
use serde_json::Value;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::{sample_world, Harness};
use crate::common;

async fn mount_report(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/report"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

async fn reports(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == "/report")
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}

#[tokio::test]
async fn test_command_reports_cell() {
    let server = MockServer::start().await;
    mount_report(&server).await;

    let world = sample_world();
    let harness = Harness::new(common::create_test_config(&server.uri()), world.clone());
    let handler = harness.monitor.command_handler(world);

    let reply = handler
        .handle(
            &CommandSender::player("alex", "world"),
            "httpblockinfo",
            "httpblockinfo",
            &["10", "5", "-3", "chest-42"],
        )
        .unwrap();
    harness.reporter.drain().await;

    assert_eq!(
        reply.feedback,
        vec![Feedback::Success(
            "Retrieving and sending block information for 10, 5, -3 with extra data: chest-42..."
                .to_string()
        )]
    );

    let sent = reports(&server).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["material"], "CHEST");
    assert_eq!(sent[0]["facing"], "EAST");
    assert_eq!(sent[0]["chest_type"], "SINGLE");
    assert_eq!(sent[0]["extraData"], "chest-42");
    assert!(sent[0].get("id").is_none());
}

#[tokio::test]
async fn test_unmatched_selector_is_sent_as_text() {
    let server = MockServer::start().await;
    mount_report(&server).await;

    let world = sample_world();
    let harness = Harness::new(common::create_test_config(&server.uri()), world.clone());
    let handler = harness.monitor.command_handler(world);

    let reply = handler
        .handle(
            &CommandSender::console(),
            "httpblockinfo",
            "httpblockinfo",
            &["10", "5", "-3", "@nobody"],
        )
        .unwrap();
    harness.reporter.drain().await;

    assert!(matches!(&reply.feedback[0], Feedback::Warning(msg) if msg.contains("@nobody")));
    assert!(matches!(reply.feedback[1], Feedback::Success(_)));

    let sent = reports(&server).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["extraData"], "@nobody");
}

#[tokio::test]
async fn test_selector_matches_become_list() {
    let server = MockServer::start().await;
    mount_report(&server).await;

    let world = sample_world();
    let harness = Harness::new(common::create_test_config(&server.uri()), world.clone());
    let handler = harness.monitor.command_handler(world);

    handler
        .handle(&CommandSender::console(), "localblockinfo", "lbi", &["0", "64", "0", "@a"])
        .unwrap();
    harness.reporter.drain().await;

    let sent = reports(&server).await;
    assert_eq!(sent[0]["extraData"], serde_json::json!(["alex", "steve"]));
    assert_eq!(sent[0]["id"], 0);
}

#[tokio::test]
async fn test_invalid_command_sends_nothing() {
    let server = MockServer::start().await;
    mount_report(&server).await;

    let world = sample_world();
    let harness = Harness::new(common::create_test_config(&server.uri()), world.clone());
    let handler = harness.monitor.command_handler(world);

    let usage = handler
        .handle(&CommandSender::console(), "httpblockinfo", "httpblockinfo", &["1"])
        .unwrap();
    let invalid = handler
        .handle(&CommandSender::console(), "httpblockinfo", "httpblockinfo", &["a", "b", "c"])
        .unwrap();
    harness.reporter.drain().await;

    assert!(usage.feedback[0].is_error());
    assert!(invalid.feedback[0].is_error());
    assert!(reports(&server).await.is_empty());
}
