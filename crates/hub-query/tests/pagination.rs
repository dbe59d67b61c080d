//! Integration tests for query pagination against a mock hub.
//!
//! Every test here drives the public surface (`QueryClient` and the
//! collections it hands out) end to end over HTTP, asserting the exact
//! headers and bodies that cross the wire.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use devicehub_query::{ClientConfig, QueryClient, QueryOptions, QueryType};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_SAS: &str = "SharedAccessSignature sr=test-hub&sig=dGVzdA%3D%3D&se=1735689600";

const PAGE_ONE: &str = r#"[{"deviceId":"d-1"},{"deviceId":"d-2"}]"#;
const PAGE_TWO: &str = r#"[{"deviceId":"d-3"}]"#;

/// Query client pointed at the mock server, with retries off so every
/// wire exchange is visible to the assertions.
fn query_client(server: &MockServer) -> QueryClient {
    let config = ClientConfig::builder().without_retry().build();
    QueryClient::with_config(server.uri(), TEST_SAS, config)
        .expect("mock server URI should be accepted")
}

fn twin_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .append_header("x-ms-item-type", "twin")
}

#[tokio::test]
async fn test_first_page_sends_size_and_body_but_no_continuation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/devices/query"))
        .and(query_param("api-version", "2021-04-12"))
        .and(header("x-ms-max-item-count", "25"))
        .and(body_json(serde_json::json!({"query": "SELECT * FROM devices"})))
        .respond_with(twin_page(PAGE_ONE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = query_client(&mock_server);
    let mut twins = client
        .query_twins_with_page_size("SELECT * FROM devices", 25)
        .unwrap();

    let page = twins.send_query_request(None).await.unwrap();
    assert_eq!(page.body(), PAGE_ONE);
    assert_eq!(page.continuation_token(), None);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(
        !requests[0].headers.contains_key("x-ms-continuation"),
        "a fresh query must not send a continuation token"
    );
    assert_eq!(
        requests[0].headers.get("authorization").unwrap(),
        TEST_SAS,
        "the SAS token travels verbatim, not as a bearer scheme"
    );
}

#[tokio::test]
async fn test_typed_listing_sends_no_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs/v2/query"))
        .and(query_param("api-version", "2021-04-12"))
        .and(query_param("jobType", "scheduleUpdateTwin"))
        .and(query_param("jobStatus", "completed"))
        .and(header("x-ms-max-item-count", "10"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("[]")
                .append_header("x-ms-item-type", "jobResponse"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = query_client(&mock_server);
    let filter = devicehub_query::JobResponseFilter::new()
        .with_job_type("scheduleUpdateTwin")
        .with_job_status("completed");
    let mut jobs = client
        .query_job_responses_with_page_size(&filter, 10)
        .unwrap();

    let page = jobs.send_query_request(None).await.unwrap();
    assert_eq!(page.body(), "[]");

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].body.is_empty(), "typed listings carry no body");
}

#[tokio::test]
async fn test_options_token_wins_over_stored_token() {
    let mock_server = MockServer::start().await;

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    Mock::given(method("POST"))
        .and(path("/devices/query"))
        .respond_with(move |_: &wiremock::Request| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                twin_page(PAGE_ONE).append_header("x-ms-continuation", "stored-tok")
            } else {
                twin_page(PAGE_TWO)
            }
        })
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = query_client(&mock_server);
    let mut twins = client.query_twins("SELECT * FROM devices").unwrap();

    let page = twins.send_query_request(None).await.unwrap();
    assert_eq!(page.continuation_token(), Some("stored-tok"));

    let options = QueryOptions::new().with_continuation_token("caller-tok");
    twins.send_query_request(Some(&options)).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[1].headers.get("x-ms-continuation").unwrap(),
        "caller-tok",
        "an explicit token overrides the stored one"
    );
}

#[tokio::test]
async fn test_stored_token_is_used_when_options_are_silent() {
    let mock_server = MockServer::start().await;

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    Mock::given(method("POST"))
        .and(path("/devices/query"))
        .respond_with(move |_: &wiremock::Request| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                twin_page(PAGE_ONE).append_header("x-ms-continuation", "stored-tok")
            } else {
                twin_page(PAGE_TWO)
            }
        })
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = query_client(&mock_server);
    let mut twins = client.query_twins("SELECT * FROM devices").unwrap();

    twins.send_query_request(None).await.unwrap();
    let page = twins.send_query_request(None).await.unwrap();
    assert_eq!(page.body(), PAGE_TWO);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(
        requests[1].headers.get("x-ms-continuation").unwrap(),
        "stored-tok"
    );
}

#[tokio::test]
async fn test_empty_options_token_falls_back_to_stored() {
    let mock_server = MockServer::start().await;

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    Mock::given(method("POST"))
        .and(path("/devices/query"))
        .respond_with(move |_: &wiremock::Request| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                twin_page(PAGE_ONE).append_header("x-ms-continuation", "stored-tok")
            } else {
                twin_page(PAGE_TWO)
            }
        })
        .mount(&mock_server)
        .await;

    let client = query_client(&mock_server);
    let mut twins = client.query_twins("SELECT * FROM devices").unwrap();

    twins.send_query_request(None).await.unwrap();
    let options = QueryOptions::new().with_continuation_token("");
    twins.send_query_request(Some(&options)).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(
        requests[1].headers.get("x-ms-continuation").unwrap(),
        "stored-tok",
        "an empty token means no preference"
    );
}

#[tokio::test]
async fn test_page_size_override_applies_per_call() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/devices/query"))
        .respond_with(twin_page(PAGE_ONE))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = query_client(&mock_server);
    let mut twins = client
        .query_twins_with_page_size("SELECT * FROM devices", 100)
        .unwrap();

    let options = QueryOptions::new().with_page_size(5);
    twins.send_query_request(Some(&options)).await.unwrap();
    twins.send_query_request(None).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests[0].headers.get("x-ms-max-item-count").unwrap(), "5");
    assert_eq!(
        requests[1].headers.get("x-ms-max-item-count").unwrap(),
        "100",
        "the override does not stick across calls"
    );
}

#[tokio::test]
async fn test_missing_item_type_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/devices/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_ONE))
        .mount(&mock_server)
        .await;

    let client = query_client(&mock_server);
    let sql = "SELECT * FROM devices";
    let collections = [
        client.query_twins(sql).unwrap(),
        client.query_raw(sql).unwrap(),
        client.query_device_jobs(sql).unwrap(),
    ];

    for mut collection in collections {
        let query_type = collection.query_type();
        let err = collection.send_query_request(None).await.unwrap_err();
        assert!(
            err.is_malformed_response(),
            "untagged page must be rejected for {query_type}"
        );
        assert!(err.to_string().contains("x-ms-item-type"));
    }
}

#[tokio::test]
async fn test_unrecognized_item_type_is_malformed() {
    for item_type in ["widget", "unknown"] {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/devices/query"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(PAGE_ONE)
                    .append_header("x-ms-item-type", item_type),
            )
            .mount(&mock_server)
            .await;

        let client = query_client(&mock_server);
        let mut twins = client.query_twins("SELECT * FROM devices").unwrap();

        let err = twins.send_query_request(None).await.unwrap_err();
        assert!(
            err.is_malformed_response(),
            "item type {item_type:?} should be rejected"
        );
    }
}

#[tokio::test]
async fn test_mismatched_item_type_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/devices/query"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PAGE_ONE)
                .append_header("x-ms-item-type", "deviceJob"),
        )
        .mount(&mock_server)
        .await;

    let client = query_client(&mock_server);
    let mut twins = client.query_twins("SELECT * FROM devices").unwrap();

    let err = twins.send_query_request(None).await.unwrap_err();
    assert!(err.is_malformed_response());
    let message = err.to_string();
    assert!(message.contains("twin") && message.contains("deviceJob"));
}

#[tokio::test]
async fn test_has_next_on_fresh_collection_does_not_fetch() {
    let mock_server = MockServer::start().await;

    let client = query_client(&mock_server);
    let mut twins = client.query_twins("SELECT * FROM devices").unwrap();

    assert!(twins.has_next().await.unwrap());
    assert!(twins.has_next().await.unwrap());

    let requests = mock_server.received_requests().await.unwrap();
    assert!(
        requests.is_empty(),
        "peeking a fresh collection must not touch the network"
    );
}

#[tokio::test]
async fn test_single_page_iteration_ends_cleanly() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/devices/query"))
        .respond_with(twin_page(PAGE_ONE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = query_client(&mock_server);
    let mut twins = client.query_twins("SELECT * FROM devices").unwrap();

    assert!(twins.has_next().await.unwrap());
    let page = twins.next().await.unwrap().unwrap();
    assert_eq!(page.body(), PAGE_ONE);

    assert!(!twins.has_next().await.unwrap());
    assert!(twins.next().await.unwrap().is_none());
}

#[tokio::test]
async fn test_two_page_walkthrough() {
    let mock_server = MockServer::start().await;

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    Mock::given(method("POST"))
        .and(path("/devices/query"))
        .and(header("x-ms-max-item-count", "2"))
        .respond_with(move |_: &wiremock::Request| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(200)
                    .set_body_string(PAGE_ONE)
                    .append_header("x-ms-item-type", "raw")
                    .append_header("x-ms-continuation", "tok1")
            } else {
                ResponseTemplate::new(200)
                    .set_body_string(PAGE_TWO)
                    .append_header("x-ms-item-type", "raw")
            }
        })
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = query_client(&mock_server);
    let mut results = client
        .query_raw_with_page_size("SELECT * FROM devices", 2)
        .unwrap();
    assert_eq!(results.query_type(), QueryType::Raw);

    // Fresh: pages remain, nothing fetched yet.
    assert!(results.has_next().await.unwrap());
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 0);

    let first = results.next().await.unwrap().unwrap();
    assert_eq!(first.body(), PAGE_ONE);
    assert_eq!(first.continuation_token(), Some("tok1"));

    // Consumed page left a token, so the peek fetches the next page.
    assert!(results.has_next().await.unwrap());
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(!requests[0].headers.contains_key("x-ms-continuation"));
    assert_eq!(
        requests[1].headers.get("x-ms-continuation").unwrap(),
        "tok1"
    );

    let second = results.next().await.unwrap().unwrap();
    assert_eq!(second.body(), PAGE_TWO);
    assert_eq!(second.continuation_token(), None);

    assert!(!results.has_next().await.unwrap());
    assert!(results.next().await.unwrap().is_none());
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_repeated_has_next_fetches_the_page_once() {
    let mock_server = MockServer::start().await;

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    Mock::given(method("POST"))
        .and(path("/devices/query"))
        .respond_with(move |_: &wiremock::Request| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                twin_page(PAGE_ONE).append_header("x-ms-continuation", "tok1")
            } else {
                twin_page(PAGE_TWO)
            }
        })
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = query_client(&mock_server);
    let mut twins = client.query_twins("SELECT * FROM devices").unwrap();

    twins.next().await.unwrap().unwrap();

    // The first peek prefetches; the ones after it see the buffered page.
    assert!(twins.has_next().await.unwrap());
    assert!(twins.has_next().await.unwrap());
    assert!(twins.has_next().await.unwrap());
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);

    let page = twins.next().await.unwrap().unwrap();
    assert_eq!(page.body(), PAGE_TWO);
}

#[tokio::test]
async fn test_empty_body_with_token_is_a_valid_page() {
    let mock_server = MockServer::start().await;

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    Mock::given(method("POST"))
        .and(path("/devices/query"))
        .respond_with(move |_: &wiremock::Request| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(200)
                    .set_body_string("")
                    .append_header("x-ms-item-type", "twin")
                    .append_header("x-ms-continuation", "after-gap")
            } else {
                twin_page(PAGE_TWO)
            }
        })
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = query_client(&mock_server);
    let mut twins = client.query_twins("SELECT * FROM devices").unwrap();

    let page = twins.next().await.unwrap().unwrap();
    assert_eq!(page.body(), "");
    assert_eq!(page.continuation_token(), Some("after-gap"));

    // The token still advances the iteration past the empty page.
    assert!(twins.has_next().await.unwrap());
    let page = twins.next().await.unwrap().unwrap();
    assert_eq!(page.body(), PAGE_TWO);
}

#[tokio::test]
async fn test_http_failures_surface_as_transport_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/devices/query"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "Message": "ErrorCode:IotHubUnauthorizedAccess;signature expired"
        })))
        .mount(&mock_server)
        .await;

    let client = query_client(&mock_server);
    let mut twins = client.query_twins("SELECT * FROM devices").unwrap();

    let err = twins.send_query_request(None).await.unwrap_err();
    assert!(err.is_transport());
    assert!(err.to_string().contains("IotHubUnauthorizedAccess"));
}

#[tokio::test]
async fn test_peek_failure_propagates_and_keeps_the_token() {
    let mock_server = MockServer::start().await;

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    Mock::given(method("POST"))
        .and(path("/devices/query"))
        .respond_with(move |_: &wiremock::Request| {
            match counter.fetch_add(1, Ordering::SeqCst) {
                0 => twin_page(PAGE_ONE).append_header("x-ms-continuation", "tok1"),
                1 => ResponseTemplate::new(503).set_body_string("try later"),
                _ => twin_page(PAGE_TWO),
            }
        })
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = query_client(&mock_server);
    let mut twins = client.query_twins("SELECT * FROM devices").unwrap();

    twins.next().await.unwrap().unwrap();

    // The failed peek is an error, never a silent `false`.
    let err = twins.has_next().await.unwrap_err();
    assert!(err.is_transport());

    // The token survived the failure, so the peek can be retried.
    assert!(twins.has_next().await.unwrap());
    let page = twins.next().await.unwrap().unwrap();
    assert_eq!(page.body(), PAGE_TWO);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    assert_eq!(
        requests[2].headers.get("x-ms-continuation").unwrap(),
        "tok1"
    );
}

#[tokio::test]
async fn test_next_with_forwards_the_page_size_override() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/devices/query"))
        .and(header("x-ms-max-item-count", "3"))
        .respond_with(twin_page(PAGE_ONE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = query_client(&mock_server);
    let mut twins = client.query_twins("SELECT * FROM devices").unwrap();

    let options = QueryOptions::new().with_page_size(3);
    let page = twins.next_with(&options).await.unwrap().unwrap();
    assert_eq!(page.body(), PAGE_ONE);
}

#[tokio::test]
async fn test_has_next_with_steers_the_triggered_fetch() {
    let mock_server = MockServer::start().await;

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    Mock::given(method("POST"))
        .and(path("/devices/query"))
        .respond_with(move |_: &wiremock::Request| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                twin_page(PAGE_ONE).append_header("x-ms-continuation", "stored-tok")
            } else {
                twin_page(PAGE_TWO)
            }
        })
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = query_client(&mock_server);
    let mut twins = client.query_twins("SELECT * FROM devices").unwrap();

    twins.next().await.unwrap().unwrap();

    // Consuming the first page left a token behind, so this peek fetches,
    // and the caller's overrides beat both the stored token and the default
    // page size.
    let options = QueryOptions::new()
        .with_continuation_token("caller-tok")
        .with_page_size(7);
    assert!(twins.has_next_with(&options).await.unwrap());

    let page = twins.next().await.unwrap().unwrap();
    assert_eq!(page.body(), PAGE_TWO);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[1].headers.get("x-ms-continuation").unwrap(),
        "caller-tok"
    );
    assert_eq!(
        requests[1].headers.get("x-ms-max-item-count").unwrap(),
        "7"
    );
}
