//! buneary: an easy-to-use command line client for RabbitMQ.
//!
//! The [`rabbitmq::Provider`] is the entry point for library use: it creates,
//! lists and deletes exchanges, queues and bindings through the management
//! API and publishes messages over AMQP.

pub mod cli;
pub mod credentials;
pub mod env;
pub mod filter;
pub mod models;
pub mod rabbitmq;
pub mod telemetry;

pub use credentials::{resolve_credentials, Credentials};
pub use env::Settings;
pub use filter::Filter;
pub use models::{Binding, BindingType, Exchange, ExchangeType, HeaderValue, Headers, Message, Queue, QueueType};
pub use rabbitmq::{ConnectionConfig, Error, ErrorKind, Provider, Result};
