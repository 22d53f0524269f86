use std::fmt;
use std::time::Duration;

use lapin::uri::{AMQPAuthority, AMQPQueryString, AMQPScheme, AMQPUri, AMQPUserInfo};

use super::errors::{Error, Result};
use crate::env::Settings;

/// A broker address as typed by the user: `host`, `host:port` or `[v6]:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub host: String,
    pub port: Option<u16>,
}

impl Address {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let (host, port) = if let Some(rest) = input.strip_prefix('[') {
            let (host, after) = rest
                .split_once(']')
                .ok_or_else(|| Error::argument(format!("unterminated IPv6 address '{}'", input)))?;
            let port = match after {
                "" => None,
                _ => Some(after.strip_prefix(':').ok_or_else(|| {
                    Error::argument(format!("unexpected characters after IPv6 address '{}'", input))
                })?),
            };
            (host, port)
        } else {
            match input.split_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (input, None),
            }
        };

        if host.is_empty() {
            return Err(Error::argument(format!("address '{}' has no host", input)));
        }

        let port = port
            .map(|port| {
                port.parse::<u16>()
                    .map_err(|_| Error::argument(format!("invalid port in address '{}'", input)))
            })
            .transpose()?;

        Ok(Address {
            host: host.to_string(),
            port,
        })
    }

    fn host_for_url(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }
}

/// Everything the provider needs to reach one broker for one operation.
#[derive(Clone)]
pub struct ConnectionConfig {
    pub address: Address,
    pub user: String,
    pub password: String,
    pub vhost: String,
    pub amqp_scheme: String,
    pub amqp_port: u16,
    pub management_port: u16,
    pub management_scheme: String,
    pub timeout: Option<Duration>,
}

impl ConnectionConfig {
    pub fn new(address: &str, user: &str, password: &str, settings: &Settings) -> Result<Self> {
        Ok(Self::for_address(Address::parse(address)?, user, password, settings))
    }

    /// Same as [`ConnectionConfig::new`] for an address that was already parsed.
    pub fn for_address(address: Address, user: &str, password: &str, settings: &Settings) -> Self {
        ConnectionConfig {
            address,
            user: user.to_string(),
            password: password.to_string(),
            vhost: settings.vhost.clone(),
            amqp_scheme: settings.amqp_scheme.clone(),
            amqp_port: settings.amqp_port,
            management_port: settings.management_port,
            management_scheme: settings.management_scheme.clone(),
            timeout: settings.timeout(),
        }
    }

    pub fn with_vhost(mut self, vhost: impl Into<String>) -> Self {
        self.vhost = vhost.into();
        self
    }

    /// The AMQP endpoint. A port in the address wins over the configured one.
    pub fn amqp_uri(&self) -> AMQPUri {
        let scheme = match self.amqp_scheme.as_str() {
            "amqps" => AMQPScheme::AMQPS,
            _ => AMQPScheme::AMQP,
        };

        AMQPUri {
            scheme,
            authority: AMQPAuthority {
                userinfo: AMQPUserInfo {
                    username: self.user.clone(),
                    password: self.password.clone(),
                },
                host: self.address.host.clone(),
                port: self.address.port.unwrap_or(self.amqp_port),
            },
            vhost: self.vhost.clone(),
            query: AMQPQueryString::default(),
        }
    }

    /// Base URL of the management API, always on the management port.
    pub fn management_url(&self) -> String {
        format!(
            "{}://{}:{}/api",
            self.management_scheme,
            self.address.host_for_url(),
            self.management_port
        )
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("address", &self.address)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("vhost", &self.vhost)
            .field("amqp_scheme", &self.amqp_scheme)
            .field("amqp_port", &self.amqp_port)
            .field("management_port", &self.management_port)
            .field("management_scheme", &self.management_scheme)
            .field("timeout", &self.timeout)
            .finish()
    }
}
