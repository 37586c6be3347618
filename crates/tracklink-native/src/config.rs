//! Service configuration proxy.
//!
//! Configuration lives in the service. [`Config`] sends each read or write as
//! a [`ConfigRequest`] over a tokio `mpsc` channel, carrying a `oneshot`
//! sender for the reply, and waits for that reply up to a deadline. A missed
//! deadline is reported as [`ServiceError::Timeout`]; no value is ever
//! fabricated.

use core::fmt;
use core::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::{ServiceError, ServiceResult};

/// A typed configuration value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Boolean switch
    Bool(bool),
    /// 32-bit integer
    Int32(i32),
    /// Single precision float
    Float(f32),
    /// Free text
    String(String),
}

impl ConfigValue {
    /// The value as a bool, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The value as an integer, if it is one.
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int32(i) => Some(*i),
            _ => None,
        }
    }

    /// The value as a float; integers widen.
    #[must_use]
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int32(i) => Some(*i as f32),
            _ => None,
        }
    }

    /// The value as text, if it is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int32(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl FromStr for ConfigValue {
    type Err = core::convert::Infallible;

    /// Parses `true`/`false`, then integers, then floats; anything else is text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(b) = s.parse::<bool>() {
            return Ok(Self::Bool(b));
        }
        if let Ok(i) = s.parse::<i32>() {
            return Ok(Self::Int32(i));
        }
        if let Ok(x) = s.parse::<f32>() {
            return Ok(Self::Float(x));
        }
        Ok(Self::String(s.to_string()))
    }
}

/// One configuration exchange, answered through its `response_tx`.
#[derive(Debug)]
pub enum ConfigRequest {
    /// Read a key
    Get {
        /// Key to read
        key: String,
        /// Reply channel
        response_tx: oneshot::Sender<ServiceResult<ConfigValue>>,
    },
    /// Write a key
    Set {
        /// Key to write
        key: String,
        /// New value
        value: ConfigValue,
        /// Reply channel
        response_tx: oneshot::Sender<ServiceResult<()>>,
    },
}

/// Handle for reading and writing service configuration.
#[derive(Clone, Debug)]
pub struct Config {
    requests: Option<mpsc::Sender<ConfigRequest>>,
    default_timeout: Duration,
}

impl Config {
    /// Proxy over `requests`; `None` means no service is reachable.
    #[must_use]
    pub fn new(requests: Option<mpsc::Sender<ConfigRequest>>, default_timeout: Duration) -> Self {
        Self {
            requests,
            default_timeout,
        }
    }

    /// Whether requests have somewhere to go.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.requests.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Deadline used by [`Config::get`] and [`Config::set_value`].
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Read `key`, waiting at most `timeout` for the reply.
    ///
    /// # Errors
    ///
    /// `Disconnected` without a service, `ChannelClosed` if the service went
    /// away mid-request, `Timeout` if no reply arrived in time, and whatever
    /// the service reports (usually `NotFound`).
    pub async fn value(&self, key: &str, timeout: Duration) -> ServiceResult<ConfigValue> {
        let key = key.to_string();
        self.round_trip(timeout, |response_tx| ConfigRequest::Get { key, response_tx })
            .await
    }

    /// Read `key` with the default deadline.
    ///
    /// # Errors
    ///
    /// As for [`Config::value`].
    pub async fn get(&self, key: &str) -> ServiceResult<ConfigValue> {
        self.value(key, self.default_timeout).await
    }

    /// Write `key` with the default deadline.
    ///
    /// # Errors
    ///
    /// As for [`Config::value`].
    pub async fn set_value(&self, key: &str, value: ConfigValue) -> ServiceResult<()> {
        let key = key.to_string();
        self.round_trip(self.default_timeout, |response_tx| ConfigRequest::Set {
            key,
            value,
            response_tx,
        })
        .await
    }

    async fn round_trip<T, F>(&self, timeout: Duration, build: F) -> ServiceResult<T>
    where
        F: FnOnce(oneshot::Sender<ServiceResult<T>>) -> ConfigRequest,
    {
        let requests = self.requests.as_ref().ok_or(ServiceError::Disconnected)?;
        let (response_tx, response_rx) = oneshot::channel();
        let request = build(response_tx);

        let exchange = async {
            requests
                .send(request)
                .await
                .map_err(|_| ServiceError::ChannelClosed("config request channel closed".to_string()))?;
            response_rx
                .await
                .map_err(|_| ServiceError::ChannelClosed("config response dropped".to_string()))?
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => {
                debug!("Config request completed: ok={}", result.is_ok());
                result
            }
            Err(_) => {
                warn!("Config request timed out after {:?}", timeout);
                Err(ServiceError::Timeout(timeout))
            }
        }
    }
}
