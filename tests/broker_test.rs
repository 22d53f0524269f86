// Tests against a live RabbitMQ with the management plugin enabled.
// Ignored by default; run with `cargo test -- --ignored` and, if needed,
// BUNEARY_TEST_ADDRESS / BUNEARY_TEST_USER / BUNEARY_TEST_PASSWORD set.

use buneary::models::parse_headers;
use buneary::{
    Binding, ConnectionConfig, ErrorKind, Exchange, ExchangeType, Filter, Message, Provider, Queue, QueueType,
    Settings,
};
use uuid::Uuid;

fn provider() -> Provider {
    let address = std::env::var("BUNEARY_TEST_ADDRESS").unwrap_or_else(|_| "localhost".to_string());
    let user = std::env::var("BUNEARY_TEST_USER").unwrap_or_else(|_| "guest".to_string());
    let password = std::env::var("BUNEARY_TEST_PASSWORD").unwrap_or_else(|_| "guest".to_string());

    let config = ConnectionConfig::new(&address, &user, &password, &Settings::default())
        .expect("Failed to build connection config");
    Provider::new(config)
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().to_string()[..8])
}

#[tokio::test]
#[ignore] // Ignore by default as it requires a running RabbitMQ instance
async fn test_topology_round_trip() {
    let provider = provider();
    let exchange = Exchange {
        name: unique("buneary-test-exchange"),
        kind: ExchangeType::Direct,
        durable: false,
        auto_delete: false,
        internal: false,
        no_wait: false,
    };
    let queue = Queue {
        name: unique("buneary-test-queue"),
        kind: QueueType::Classic,
        durable: false,
        auto_delete: false,
    };

    provider.create_exchange(exchange.clone()).await.unwrap();
    provider.create_queue(queue.clone()).await.unwrap();
    provider
        .create_binding(Binding::new(&exchange.name, &queue.name, "order.created", false))
        .await
        .unwrap();

    let listed = provider.get_exchanges(&Filter::named(exchange.name.clone())).await.unwrap();
    assert_eq!(listed, vec![exchange.clone()]);

    let bindings = provider
        .get_bindings(&Filter::between(exchange.name.clone(), queue.name.clone()))
        .await
        .unwrap();
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].key, "order.created");

    let message = Message::new(exchange.name.clone(), "order.created", r#"{"id":1}"#)
        .with_headers(parse_headers("priority=high").unwrap());
    provider.publish_message(message).await.unwrap();

    provider.delete_queue(queue).await.unwrap();
    provider.delete_exchange(exchange).await.unwrap();
}

#[tokio::test]
#[ignore] // Ignore by default as it requires a running RabbitMQ instance
async fn test_delete_missing_queue_reports_not_found() {
    let error = provider()
        .delete_queue(Queue::named(unique("missing-queue")))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[tokio::test]
#[ignore] // Ignore by default as it requires a running RabbitMQ instance
async fn test_unreachable_broker_reports_connection_error() {
    let mut config = ConnectionConfig::new("127.0.0.1:1", "guest", "guest", &Settings::default()).unwrap();
    config.management_port = 1;
    let unreachable = Provider::new(config);

    let listing = unreachable.get_queues(&Filter::all()).await.unwrap_err();
    let publish = unreachable
        .publish_message(Message::new("", "key", "body"))
        .await
        .unwrap_err();

    assert_eq!(listing.kind(), ErrorKind::Connection);
    assert_eq!(publish.kind(), ErrorKind::Connection);
}
