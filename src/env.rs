use std::env;
use std::time::Duration;

use dotenv::dotenv;
use serde::Deserialize;

use crate::rabbitmq::{Error, Result};

/// Process-wide settings that shape how the provider reaches the broker.
///
/// Values come from the environment (optionally seeded by a `.env` file).
/// Nothing is ever written back.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_vhost")]
    #[serde(rename = "BUNEARY_VHOST")]
    pub vhost: String,

    #[serde(default = "default_amqp_scheme")]
    #[serde(rename = "BUNEARY_AMQP_SCHEME")]
    pub amqp_scheme: String,

    #[serde(default = "default_amqp_port")]
    #[serde(rename = "BUNEARY_AMQP_PORT")]
    pub amqp_port: u16,

    #[serde(default = "default_management_port")]
    #[serde(rename = "BUNEARY_MANAGEMENT_PORT")]
    pub management_port: u16,

    #[serde(default = "default_management_scheme")]
    #[serde(rename = "BUNEARY_MANAGEMENT_SCHEME")]
    pub management_scheme: String,

    #[serde(default)]
    #[serde(rename = "BUNEARY_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

fn default_vhost() -> String {
    "/".to_string()
}

fn default_amqp_scheme() -> String {
    "amqp".to_string()
}

fn default_amqp_port() -> u16 {
    5672
}

fn default_amqps_port() -> u16 {
    5671
}

fn default_management_port() -> u16 {
    15672
}

fn default_management_scheme() -> String {
    "http".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            vhost: default_vhost(),
            amqp_scheme: default_amqp_scheme(),
            amqp_port: default_amqp_port(),
            management_port: default_management_port(),
            management_scheme: default_management_scheme(),
            timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. `load` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let amqp_scheme = lookup("BUNEARY_AMQP_SCHEME")
            .map(|val| val.trim().to_ascii_lowercase())
            .unwrap_or_else(default_amqp_scheme);
        if amqp_scheme != "amqp" && amqp_scheme != "amqps" {
            return Err(Error::argument(format!(
                "BUNEARY_AMQP_SCHEME must be amqp or amqps, got '{}'",
                amqp_scheme
            )));
        }

        let settings = Settings {
            vhost: lookup("BUNEARY_VHOST").unwrap_or_else(default_vhost),
            amqp_port: match lookup("BUNEARY_AMQP_PORT") {
                Some(val) => parse_port("BUNEARY_AMQP_PORT", &val)?,
                None if amqp_scheme == "amqps" => default_amqps_port(),
                None => default_amqp_port(),
            },
            amqp_scheme,
            management_port: match lookup("BUNEARY_MANAGEMENT_PORT") {
                Some(val) => parse_port("BUNEARY_MANAGEMENT_PORT", &val)?,
                None => default_management_port(),
            },
            management_scheme: lookup("BUNEARY_MANAGEMENT_SCHEME")
                .map(|val| val.trim().to_ascii_lowercase())
                .unwrap_or_else(default_management_scheme),
            timeout_secs: match lookup("BUNEARY_TIMEOUT_SECS") {
                Some(val) => Some(val.trim().parse().map_err(|_| {
                    Error::argument(format!("BUNEARY_TIMEOUT_SECS must be a number of seconds, got '{}'", val))
                })?),
                None => None,
            },
        };

        if settings.management_scheme != "http" && settings.management_scheme != "https" {
            return Err(Error::argument(format!(
                "BUNEARY_MANAGEMENT_SCHEME must be http or https, got '{}'",
                settings.management_scheme
            )));
        }

        Ok(settings)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::argument(format!("{} must be a port number, got '{}'", key, value)))
}
