//! End-to-end query runs against a mock JupiterOne API

use jupiterone_connector::config::{Credentials, OutgoingSettings, QuerySettings};
use jupiterone_connector::deferred::{Outcome, QueryClient};
use jupiterone_connector::network::HttpClient;
use jupiterone_connector::ConnectorError;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "tok-integration";

fn client(server: &MockServer) -> QueryClient {
    let transport = HttpClient::with_settings(&OutgoingSettings::default()).unwrap();
    QueryClient::new(
        Arc::new(transport),
        Credentials::new("acct-1", TOKEN, server.uri()),
        QuerySettings {
            max_cap: 10_000,
            poll_interval_ms: 10,
            timeout_secs: 5,
        },
    )
}

fn deferred(server: &MockServer, job: &str) -> Value {
    json!({
        "data": {
            "queryV1": {
                "type": "deferred",
                "data": null,
                "url": format!("{}/results/{}", server.uri(), job)
            }
        }
    })
}

async fn mount_submission(server: &MockServer, cursor: Option<&str>, job: &str) {
    let mock = Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .and(header("jupiterone-account", "acct-1"));
    let mock = match cursor {
        Some(cursor) => mock.and(body_partial_json(json!({"variables": {"cursor": cursor}}))),
        None => mock,
    };
    mock.respond_with(ResponseTemplate::new(200).set_body_json(deferred(server, job)))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

async fn mount_result(server: &MockServer, job: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/results/{}", job)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_pages_across_two_jobs() {
    let server = MockServer::start().await;

    // cursor-specific mock first so it wins for the second submission
    mount_submission(&server, Some("c1"), "2").await;
    mount_submission(&server, None, "1").await;

    mount_result(&server, "1", json!({"status": "IN_PROGRESS"})).await;
    mount_result(
        &server,
        "1",
        json!({"status": "COMPLETED", "data": [{"id": 1}, {"id": 2}], "cursor": "c1"}),
    )
    .await;
    mount_result(
        &server,
        "2",
        json!({"status": "COMPLETED", "data": [{"id": 3}], "cursor": ""}),
    )
    .await;

    let envelope = client(&server)
        .run("FIND Host LIMIT 1", Some(&json!(10)))
        .await
        .unwrap();

    assert_eq!(envelope.rows, vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})]);
    assert_eq!(envelope.pages, 2);
    assert_eq!(envelope.query, "FIND Host LIMIT 1");

    let requests = server.received_requests().await.unwrap();
    let submissions: Vec<Value> = requests
        .iter()
        .filter(|r| r.url.path() == "/graphql")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0]["variables"]["query"], "FIND Host");
    assert_eq!(submissions[0]["variables"]["deferredResponse"], "FORCE");
}

#[tokio::test]
async fn test_graphql_errors_skip_polling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"errors": [{"message": "Unexpected token"}]})),
        )
        .mount(&server)
        .await;

    let err = client(&server).run("FIND ???", None).await.unwrap_err();
    match err {
        ConnectorError::Query { query, detail } => {
            assert_eq!(query, "FIND ???");
            assert!(detail.contains("Unexpected token"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_unauthorized_response_never_leaks_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string(format!("invalid token {}", TOKEN)),
        )
        .mount(&server)
        .await;

    let outcome = client(&server)
        .invoke("FIND Host", None, true)
        .await
        .unwrap();
    match outcome {
        Outcome::Failure(record) => {
            assert_eq!(record.kind, "TransportError");
            assert!(record.error.contains("401"));
            assert!(!record.error.contains(TOKEN));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_job_reports_server_error() {
    let server = MockServer::start().await;
    mount_submission(&server, None, "9").await;
    mount_result(&server, "9", json!({"status": "FAILED", "error": "query too complex"})).await;

    let err = client(&server).run("FIND *", None).await.unwrap_err();
    assert_eq!(err.kind(), "QueryError");
    assert!(err.to_string().contains("query too complex"));
}
