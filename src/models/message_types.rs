// src/models/message_types.rs
use std::collections::HashMap;
use std::fmt;

use crate::models::Exchange;
use crate::rabbitmq::{Error, Result};

/// A scalar header value carried in the AMQP header table.
#[derive(Clone, Debug, PartialEq)]
pub enum HeaderValue {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::String(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::String(value)
    }
}

impl From<bool> for HeaderValue {
    fn from(value: bool) -> Self {
        HeaderValue::Bool(value)
    }
}

impl From<i64> for HeaderValue {
    fn from(value: i64) -> Self {
        HeaderValue::Int(value)
    }
}

impl From<f64> for HeaderValue {
    fn from(value: f64) -> Self {
        HeaderValue::Float(value)
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::String(value) => f.write_str(value),
            HeaderValue::Bool(value) => write!(f, "{}", value),
            HeaderValue::Int(value) => write!(f, "{}", value),
            HeaderValue::Float(value) => write!(f, "{}", value),
        }
    }
}

pub type Headers = HashMap<String, HeaderValue>;

/// Parses `key1=val1,key2=val2`. Every token must contain exactly one `=`;
/// a repeated key keeps the last value. Empty input means no headers.
pub fn parse_headers(input: &str) -> Result<Option<Headers>> {
    if input.trim().is_empty() {
        return Ok(None);
    }

    let mut headers = Headers::new();

    for header in input.split(',') {
        let tokens: Vec<&str> = header.trim().split('=').collect();

        if tokens.len() != 2 {
            return Err(Error::argument(format!(
                "expected header in form key=value, got '{}'",
                header.trim()
            )));
        }

        headers.insert(tokens[0].to_string(), HeaderValue::from(tokens[1]));
    }

    Ok(Some(headers))
}

/// A message to publish. `headers: None` sends no header table at all.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub target: Exchange,
    pub routing_key: String,
    pub headers: Option<Headers>,
    pub body: Vec<u8>,
}

impl Message {
    pub fn new(exchange: impl Into<String>, routing_key: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Message {
            target: Exchange::named(exchange),
            routing_key: routing_key.into(),
            headers: None,
            body: body.into(),
        }
    }

    pub fn with_headers(mut self, headers: Option<Headers>) -> Self {
        self.headers = headers;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_headers() {
        let headers = parse_headers("k1=v1,k2=v2").unwrap().unwrap();

        assert_eq!(headers.len(), 2);
        assert_eq!(headers["k1"], HeaderValue::from("v1"));
        assert_eq!(headers["k2"], HeaderValue::from("v2"));
    }

    #[test]
    fn test_parse_trims_tokens() {
        let headers = parse_headers(" priority=high , source=cli ").unwrap().unwrap();

        assert_eq!(headers["priority"], HeaderValue::from("high"));
        assert_eq!(headers["source"], HeaderValue::from("cli"));
    }

    #[test]
    fn test_parse_rejects_malformed_token() {
        assert!(matches!(parse_headers("k1=v1,bad"), Err(Error::Argument(_))));
        assert!(matches!(parse_headers("k1=v1=x"), Err(Error::Argument(_))));
        assert!(matches!(parse_headers("k1=v1,"), Err(Error::Argument(_))));
    }

    #[test]
    fn test_parse_last_write_wins() {
        let headers = parse_headers("k=first,k=second").unwrap().unwrap();

        assert_eq!(headers.len(), 1);
        assert_eq!(headers["k"], HeaderValue::from("second"));
    }

    #[test]
    fn test_parse_empty_means_no_headers() {
        assert_eq!(parse_headers("").unwrap(), None);
        assert_eq!(parse_headers("   ").unwrap(), None);
    }

    #[test]
    fn test_message_body_is_literal_bytes() {
        let message = Message::new("orders", "order.created", r#"{"id":1}"#);

        assert_eq!(message.body, br#"{"id":1}"#.to_vec());
        assert_eq!(message.target.name, "orders");
        assert!(message.headers.is_none());
    }
}
