// src/rabbitmq/amqp_client.rs

use amq_protocol_types::{AMQPValue, FieldTable, LongString, ShortString};
use async_trait::async_trait;
use lapin::{
    options::{BasicPublishOptions, ConfirmSelectOptions},
    BasicProperties, Connection, ConnectionProperties,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::connection::ConnectionConfig;
use super::errors::BackendError;
use crate::models::{HeaderValue, Headers, Message};

/// The wire-protocol half of the provider: everything that has to go over AMQP.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one message and wait for the broker to confirm it.
    async fn publish(&self, message: &Message) -> Result<(), BackendError>;
}

/// Publishes over a fresh AMQP connection per call.
pub struct AmqpPublisher {
    config: ConnectionConfig,
}

impl AmqpPublisher {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    async fn connect(&self) -> Result<Connection, BackendError> {
        let name = format!("buneary-{}", &Uuid::new_v4().to_string()[..8]);
        let uri = self.config.amqp_uri();

        info!(
            host = %uri.authority.host,
            port = uri.authority.port,
            vhost = %uri.vhost,
            connection = %name,
            "Connecting to RabbitMQ"
        );

        let properties = ConnectionProperties::default().with_connection_name(name.into());
        let connection = Connection::connect_uri(uri, properties).await?;

        debug!("Successfully connected to RabbitMQ");
        Ok(connection)
    }

    async fn publish_once(&self, message: &Message) -> Result<(), BackendError> {
        let connection = self.connect().await?;
        let result = publish_on(&connection, message).await;

        // The connection is closed on every path; a failed close only matters
        // if the publish itself went through.
        match connection.close(200, "publish complete").await {
            Ok(()) => debug!("Closed RabbitMQ connection"),
            Err(e) if result.is_ok() => return Err(e.into()),
            Err(e) => warn!("Failed to close RabbitMQ connection: {}", e),
        }

        result
    }
}

async fn publish_on(connection: &Connection, message: &Message) -> Result<(), BackendError> {
    let channel = connection.create_channel().await?;
    channel
        .confirm_select(ConfirmSelectOptions::default())
        .await?;

    let properties = match &message.headers {
        Some(headers) => BasicProperties::default().with_headers(header_table(headers)),
        None => BasicProperties::default(),
    };

    let confirmation = channel
        .basic_publish(
            &message.target.name,
            &message.routing_key,
            BasicPublishOptions::default(),
            &message.body,
            properties,
        )
        .await?
        .await?;

    if confirmation.is_nack() {
        return Err(BackendError::protocol("broker did not accept the message"));
    }

    channel.close(200, "publish complete").await?;

    info!(
        "Published message to exchange '{}' with routing key '{}'",
        message.target.name, message.routing_key
    );

    Ok(())
}

#[async_trait]
impl Publisher for AmqpPublisher {
    async fn publish(&self, message: &Message) -> Result<(), BackendError> {
        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, self.publish_once(message)).await?,
            None => self.publish_once(message).await,
        }
    }
}

pub(crate) fn header_table(headers: &Headers) -> FieldTable {
    let mut table = FieldTable::default();

    for (key, value) in headers {
        table.insert(ShortString::from(key.clone()), amqp_value(value));
    }

    table
}

fn amqp_value(value: &HeaderValue) -> AMQPValue {
    match value {
        HeaderValue::String(value) => AMQPValue::LongString(LongString::from(value.clone())),
        HeaderValue::Bool(value) => AMQPValue::Boolean(*value),
        HeaderValue::Int(value) => AMQPValue::LongLongInt(*value),
        HeaderValue::Float(value) => AMQPValue::Double(*value),
    }
}
