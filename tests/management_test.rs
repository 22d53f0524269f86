// Exercises the management API transport against a local HTTP server that
// plays the broker: request shapes, basic auth and status classification.

use buneary::rabbitmq::{BackendErrorKind, HttpManagement, Management};
use buneary::{
    Binding, ConnectionConfig, ErrorKind, Exchange, ExchangeType, Filter, Provider, Queue, QueueType, Settings,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// admin:s3cret
const AUTHORIZATION: &str = "Basic YWRtaW46czNjcmV0";

fn config_for(server: &MockServer) -> ConnectionConfig {
    let mut config = ConnectionConfig::new("127.0.0.1", "admin", "s3cret", &Settings::default())
        .expect("Failed to build connection config");
    config.management_port = server.address().port();
    config
}

fn management_for(server: &MockServer) -> HttpManagement {
    HttpManagement::new(config_for(server))
}

#[tokio::test]
async fn test_delete_missing_queue_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/queues/%2F/missing-queue"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Object Not Found", "reason": "Not Found"})))
        .mount(&server)
        .await;

    let provider = Provider::new(config_for(&server));
    let error = provider.delete_queue(Queue::named("missing-queue")).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::NotFound);
    assert!(error.to_string().contains("delete queue 'missing-queue'"));
    assert!(error.to_string().contains("HTTP 404: Not Found"));

    // The DELETE is never sent for a queue that could not be read.
    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].method.to_string(), "GET");
}

#[tokio::test]
async fn test_delete_queue_reads_count_then_deletes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/queues/%2F/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "jobs",
            "type": "classic",
            "durable": true,
            "auto_delete": false,
            "messages": 12
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/queues/%2F/jobs"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let purged = management_for(&server).delete_queue("jobs").await.unwrap();
    assert_eq!(purged, 12);

    let received = server.received_requests().await.unwrap();
    let methods: Vec<String> = received.iter().map(|r| r.method.to_string()).collect();
    assert_eq!(methods, ["GET", "DELETE"]);

    for request in &received {
        let auth = request
            .headers
            .get("Authorization")
            .map(|v| v.to_str().unwrap_or("").to_string())
            .unwrap_or_default();
        assert_eq!(auth, AUTHORIZATION);
    }
}

#[tokio::test]
async fn test_unauthorized_is_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/exchanges/%2F"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "not_authorized", "reason": "Login failed"})),
        )
        .mount(&server)
        .await;

    let backend = management_for(&server).list_exchanges().await.unwrap_err();
    assert_eq!(backend.kind, BackendErrorKind::Auth);
    assert_eq!(backend.message, "HTTP 401: Login failed");

    let error = Provider::new(config_for(&server))
        .get_exchanges(&Filter::all())
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Auth);
}

#[tokio::test]
async fn test_conflicting_declare_is_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/exchanges/%2F/orders"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "bad_request",
            "reason": "inequivalent arg 'type' for exchange 'orders' in vhost '/'"
        })))
        .mount(&server)
        .await;

    let exchange = Exchange {
        name: "orders".into(),
        kind: ExchangeType::Fanout,
        ..Exchange::default()
    };
    let error = Provider::new(config_for(&server))
        .create_exchange(exchange)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Protocol);
    assert!(error.to_string().contains("inequivalent arg 'type'"));
}

#[tokio::test]
async fn test_declare_exchange_sends_settings() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/exchanges/%2F/orders"))
        .and(header("Authorization", AUTHORIZATION))
        .and(body_json(json!({
            "type": "topic",
            "durable": true,
            "auto_delete": false,
            "internal": true,
            "arguments": {}
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let exchange = Exchange {
        name: "orders".into(),
        kind: ExchangeType::Topic,
        durable: true,
        internal: true,
        ..Exchange::default()
    };

    management_for(&server).declare_exchange(&exchange).await.unwrap();
}

#[tokio::test]
async fn test_declare_quorum_queue_in_named_vhost() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/queues/staging/jobs"))
        .and(body_json(json!({
            "durable": true,
            "auto_delete": false,
            "arguments": {"x-queue-type": "quorum"}
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let provider = Provider::new(config_for(&server).with_vhost("staging"));
    let queue = Queue {
        name: "jobs".into(),
        kind: QueueType::Quorum,
        durable: true,
        auto_delete: false,
    };

    assert_eq!(provider.create_queue(queue).await.unwrap(), "jobs");
}

#[tokio::test]
async fn test_declare_binding_posts_routing_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/bindings/%2F/e/orders/e/archive"))
        .and(body_json(json!({"routing_key": "order.*", "arguments": {}})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    management_for(&server)
        .declare_binding(&Binding::new("orders", "archive", "order.*", true))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_listing_filters_locally_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/exchanges/%2F"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "", "type": "direct", "durable": true, "auto_delete": false, "internal": false},
            {"name": "orders", "type": "topic", "durable": true, "auto_delete": false, "internal": false},
            {"name": "delayed", "type": "x-delayed-message", "durable": true, "auto_delete": false, "internal": false},
            {"name": "billing", "type": "fanout", "durable": false, "auto_delete": true, "internal": false}
        ])))
        .mount(&server)
        .await;

    let provider = Provider::new(config_for(&server));

    let all = provider.get_exchanges(&Filter::all()).await.unwrap();
    let names: Vec<&str> = all.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["", "orders", "billing"]);

    let billing = provider.get_exchanges(&Filter::named("billing")).await.unwrap();
    assert_eq!(billing.len(), 1);
    assert_eq!(billing[0].kind, ExchangeType::Fanout);
    assert!(billing[0].auto_delete);
}
