// src/models/mod.rs

mod message_types;
mod topology;

pub use message_types::{parse_headers, HeaderValue, Headers, Message};
pub use topology::{Binding, BindingType, Exchange, ExchangeType, Named, Queue, QueueType};
