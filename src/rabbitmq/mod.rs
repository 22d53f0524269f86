// src/rabbitmq/mod.rs
// Broker access: one provider over two transports

pub mod errors;
pub mod connection;
pub mod amqp_client;
pub mod management;
pub mod provider;

// Re-export specific items to simplify imports elsewhere
pub use amqp_client::{AmqpPublisher, Publisher};
pub use connection::{Address, ConnectionConfig};
pub use errors::{BackendError, BackendErrorKind, Context, Error, ErrorKind, Result};
pub use management::{HttpManagement, Management};
pub use provider::Provider;
