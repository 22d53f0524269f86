// src/models/topology.rs
use std::fmt;
use std::str::FromStr;

use crate::rabbitmq::Error;

/// Entities that are looked up by name within a virtual host.
pub trait Named {
    fn name(&self) -> &str;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExchangeType {
    /// Also what an exchange referred to only by name reports.
    #[default]
    Direct,
    Fanout,
    Topic,
    Headers,
}

impl ExchangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeType::Direct => "direct",
            ExchangeType::Fanout => "fanout",
            ExchangeType::Topic => "topic",
            ExchangeType::Headers => "headers",
        }
    }
}

impl FromStr for ExchangeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(ExchangeType::Direct),
            "fanout" => Ok(ExchangeType::Fanout),
            "topic" => Ok(ExchangeType::Topic),
            "headers" => Ok(ExchangeType::Headers),
            other => Err(Error::argument(format!(
                "unknown exchange type '{}', expected one of direct, fanout, topic, headers",
                other
            ))),
        }
    }
}

impl fmt::Display for ExchangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Exchange {
    pub name: String,
    pub kind: ExchangeType,
    pub durable: bool,
    pub auto_delete: bool,
    pub internal: bool,
    pub no_wait: bool,
}

impl Exchange {
    /// An exchange known only by its name, as used for binding sources and
    /// publish targets.
    pub fn named(name: impl Into<String>) -> Self {
        Exchange {
            name: name.into(),
            ..Exchange::default()
        }
    }
}

impl Named for Exchange {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum QueueType {
    #[default]
    Classic,
    Quorum,
}

impl QueueType {
    /// Anything other than `quorum` yields `Classic`, including the empty string.
    pub fn parse_or_default(s: &str) -> Self {
        match s {
            "quorum" => QueueType::Quorum,
            _ => QueueType::Classic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueType::Classic => "classic",
            QueueType::Quorum => "quorum",
        }
    }
}

impl fmt::Display for QueueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Queue {
    pub name: String,
    pub kind: QueueType,
    pub durable: bool,
    pub auto_delete: bool,
}

impl Queue {
    pub fn named(name: impl Into<String>) -> Self {
        Queue {
            name: name.into(),
            ..Queue::default()
        }
    }
}

impl Named for Queue {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BindingType {
    #[default]
    ToQueue,
    ToExchange,
}

impl BindingType {
    pub fn from_flag(to_exchange: bool) -> Self {
        if to_exchange {
            BindingType::ToExchange
        } else {
            BindingType::ToQueue
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BindingType::ToQueue => "queue",
            BindingType::ToExchange => "exchange",
        }
    }
}

impl fmt::Display for BindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A routing rule from an exchange to a queue or another exchange. Lookups
/// identify a binding by `(from.name, target_name)`; several bindings may share
/// that pair with different keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Binding {
    pub from: Exchange,
    pub target_name: String,
    pub kind: BindingType,
    pub key: String,
}

impl Binding {
    pub fn new(
        from: impl Into<String>,
        target_name: impl Into<String>,
        key: impl Into<String>,
        to_exchange: bool,
    ) -> Self {
        Binding {
            from: Exchange::named(from),
            target_name: target_name.into(),
            kind: BindingType::from_flag(to_exchange),
            key: key.into(),
        }
    }
}
