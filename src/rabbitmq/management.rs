//! Client for the RabbitMQ HTTP management API.
//!
//! Topology CRUD and listing are not part of AMQP's vocabulary, so everything
//! except publishing goes through here.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::connection::ConnectionConfig;
use super::errors::BackendError;
use crate::models::{Binding, BindingType, Exchange, ExchangeType, Queue, QueueType};

/// The HTTP half of the provider.
#[async_trait]
pub trait Management: Send + Sync {
    async fn list_exchanges(&self) -> Result<Vec<Exchange>, BackendError>;

    async fn declare_exchange(&self, exchange: &Exchange) -> Result<(), BackendError>;

    async fn delete_exchange(&self, name: &str) -> Result<(), BackendError>;

    async fn list_queues(&self) -> Result<Vec<Queue>, BackendError>;

    /// Returns the name the queue was registered under.
    async fn declare_queue(&self, queue: &Queue) -> Result<String, BackendError>;

    /// Returns the number of messages the queue held when it was deleted.
    async fn delete_queue(&self, name: &str) -> Result<u64, BackendError>;

    async fn list_bindings(&self) -> Result<Vec<Binding>, BackendError>;

    async fn declare_binding(&self, binding: &Binding) -> Result<(), BackendError>;
}

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    durable: bool,
    #[serde(default)]
    auto_delete: bool,
    #[serde(default)]
    internal: bool,
}

impl ExchangeInfo {
    /// `None` for exchange types outside the four AMQP kinds (plugin types).
    fn into_exchange(self) -> Option<Exchange> {
        let kind = match self.kind.parse::<ExchangeType>() {
            Ok(kind) => kind,
            Err(_) => {
                warn!(exchange = %self.name, kind = %self.kind, "Skipping exchange of unsupported type");
                return None;
            }
        };

        Some(Exchange {
            name: self.name,
            kind,
            durable: self.durable,
            auto_delete: self.auto_delete,
            internal: self.internal,
            no_wait: false,
        })
    }
}

#[derive(Debug, Serialize)]
struct ExchangeSettings<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    durable: bool,
    auto_delete: bool,
    internal: bool,
    arguments: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct QueueInfo {
    name: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    durable: bool,
    #[serde(default)]
    auto_delete: bool,
    #[serde(default)]
    arguments: HashMap<String, Value>,
    #[serde(default)]
    messages: Option<u64>,
}

impl QueueInfo {
    fn into_queue(self) -> Queue {
        // Older brokers only report the type through the declare argument.
        let kind = self
            .kind
            .as_deref()
            .or_else(|| self.arguments.get("x-queue-type").and_then(Value::as_str))
            .map(QueueType::parse_or_default)
            .unwrap_or_default();

        Queue {
            name: self.name,
            kind,
            durable: self.durable,
            auto_delete: self.auto_delete,
        }
    }
}

#[derive(Debug, Serialize)]
struct QueueSettings {
    durable: bool,
    auto_delete: bool,
    arguments: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct BindingInfo {
    source: String,
    destination: String,
    destination_type: String,
    #[serde(default)]
    routing_key: String,
}

impl BindingInfo {
    fn into_binding(self) -> Option<Binding> {
        let kind = match self.destination_type.as_str() {
            "queue" => BindingType::ToQueue,
            "exchange" => BindingType::ToExchange,
            other => {
                warn!(destination_type = %other, "Skipping binding with unknown destination type");
                return None;
            }
        };

        Some(Binding {
            from: Exchange::named(self.source),
            target_name: self.destination,
            kind,
            key: self.routing_key,
        })
    }
}

#[derive(Debug, Serialize)]
struct BindingSettings<'a> {
    routing_key: &'a str,
    arguments: HashMap<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    reason: Option<String>,
}

/// Pulls the broker's `reason` out of an error response, falling back to the
/// raw body.
fn error_reason(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { reason: Some(reason), .. }) => reason,
        Ok(ErrorBody { error: Some(error), .. }) => error,
        _ => body.to_string(),
    }
}

/// Speaks to `<scheme>://host:<management port>/api` with basic auth.
pub struct HttpManagement {
    config: ConnectionConfig,
}

impl HttpManagement {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    /// A new client per call, so no connection outlives its operation.
    fn client(&self) -> Result<Client, BackendError> {
        let mut builder = Client::builder();
        if let Some(limit) = self.config.timeout {
            builder = builder.timeout(limit);
        }

        builder
            .build()
            .map_err(|e| BackendError::connection(format!("failed to create HTTP client: {}", e)))
    }

    fn url(&self, collection: &str, name: Option<&str>) -> String {
        let mut url = format!(
            "{}/{}/{}",
            self.config.management_url(),
            collection,
            urlencoding::encode(&self.config.vhost)
        );
        if let Some(name) = name {
            url.push('/');
            url.push_str(&urlencoding::encode(name));
        }
        url
    }

    fn binding_url(&self, binding: &Binding) -> String {
        let target = match binding.kind {
            BindingType::ToQueue => "q",
            BindingType::ToExchange => "e",
        };

        format!(
            "{}/e/{}/{}/{}",
            self.url("bindings", None),
            urlencoding::encode(&binding.from.name),
            target,
            urlencoding::encode(&binding.target_name)
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.config.user, Some(&self.config.password))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        debug!(status = status.as_u16(), url = %response.url(), "Management API responded");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(BackendError::from_status(status.as_u16(), &error_reason(&body)))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, BackendError> {
        let client = self.client()?;
        let response = self.send(client.get(url)).await?;

        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::protocol(format!("unexpected response from {}: {}", url, e)))
    }
}

#[async_trait]
impl Management for HttpManagement {
    async fn list_exchanges(&self) -> Result<Vec<Exchange>, BackendError> {
        let exchanges: Vec<ExchangeInfo> = self.get_json(&self.url("exchanges", None)).await?;
        Ok(exchanges.into_iter().filter_map(ExchangeInfo::into_exchange).collect())
    }

    async fn declare_exchange(&self, exchange: &Exchange) -> Result<(), BackendError> {
        let settings = ExchangeSettings {
            kind: exchange.kind.as_str(),
            durable: exchange.durable,
            auto_delete: exchange.auto_delete,
            internal: exchange.internal,
            arguments: HashMap::new(),
        };

        let client = self.client()?;
        self.send(client.put(self.url("exchanges", Some(&exchange.name))).json(&settings))
            .await?;
        Ok(())
    }

    async fn delete_exchange(&self, name: &str) -> Result<(), BackendError> {
        let client = self.client()?;
        self.send(client.delete(self.url("exchanges", Some(name)))).await?;
        Ok(())
    }

    async fn list_queues(&self) -> Result<Vec<Queue>, BackendError> {
        let queues: Vec<QueueInfo> = self.get_json(&self.url("queues", None)).await?;
        Ok(queues.into_iter().map(QueueInfo::into_queue).collect())
    }

    async fn declare_queue(&self, queue: &Queue) -> Result<String, BackendError> {
        let mut arguments = HashMap::new();
        if queue.kind == QueueType::Quorum {
            arguments.insert("x-queue-type".to_string(), Value::from(QueueType::Quorum.as_str()));
        }

        let settings = QueueSettings {
            durable: queue.durable,
            auto_delete: queue.auto_delete,
            arguments,
        };

        let client = self.client()?;
        self.send(client.put(self.url("queues", Some(&queue.name))).json(&settings))
            .await?;
        Ok(queue.name.clone())
    }

    async fn delete_queue(&self, name: &str) -> Result<u64, BackendError> {
        let url = self.url("queues", Some(name));
        let info: QueueInfo = self.get_json(&url).await?;

        let client = self.client()?;
        self.send(client.delete(&url)).await?;

        Ok(info.messages.unwrap_or(0))
    }

    async fn list_bindings(&self) -> Result<Vec<Binding>, BackendError> {
        let bindings: Vec<BindingInfo> = self.get_json(&self.url("bindings", None)).await?;
        Ok(bindings.into_iter().filter_map(BindingInfo::into_binding).collect())
    }

    async fn declare_binding(&self, binding: &Binding) -> Result<(), BackendError> {
        let settings = BindingSettings {
            routing_key: &binding.key,
            arguments: HashMap::new(),
        };

        let client = self.client()?;
        self.send(client.post(self.binding_url(binding)).json(&settings))
            .await?;
        Ok(())
    }
}
