//! Controller settings.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ServiceResult;
use crate::service::PolicyFlags;

/// Frames kept in the controller's history cache by default.
pub const DEFAULT_HISTORY_CAPACITY: usize = 60;

/// Controller configuration, loadable from JSON.
///
/// Missing fields take their default values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Frames kept in the history cache
    pub history_capacity: usize,

    /// Deadline for configuration round-trips, milliseconds
    pub config_timeout_ms: u64,

    /// Service namespace to connect to, if not the default one
    pub server_namespace: Option<String>,

    /// Policy flags requested at startup
    pub policy: PolicyFlags,

    /// Service events buffered before further ones are dropped
    pub event_channel_capacity: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            config_timeout_ms: 1000,
            server_namespace: None,
            policy: PolicyFlags::NONE,
            event_channel_capacity: 256,
        }
    }
}

impl ControllerSettings {
    /// Parse settings from a JSON document.
    ///
    /// # Errors
    ///
    /// `Fixture` if the document is not valid settings JSON.
    pub fn from_json(json: &str) -> ServiceResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read settings from a JSON file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `Fixture` if it does not parse.
    pub fn load(path: impl AsRef<Path>) -> ServiceResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Config deadline as a `Duration`.
    #[must_use]
    pub fn config_timeout(&self) -> Duration {
        Duration::from_millis(self.config_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;

    #[test]
    fn test_defaults() {
        let settings = ControllerSettings::default();
        assert_eq!(settings.history_capacity, 60);
        assert_eq!(settings.config_timeout(), Duration::from_secs(1));
        assert!(settings.policy.is_empty());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = ControllerSettings::from_json(r#"{"history_capacity": 4, "policy": 2}"#).unwrap();
        assert_eq!(settings.history_capacity, 4);
        assert_eq!(settings.policy, PolicyFlags::IMAGES);
        assert_eq!(settings.config_timeout_ms, 1000);
        assert_eq!(settings.server_namespace, None);
    }

    #[test]
    fn test_bad_json_is_fixture_error() {
        let err = ControllerSettings::from_json("{ history_capacity: }").unwrap_err();
        assert!(matches!(err, ServiceError::Fixture(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ControllerSettings::load("/nonexistent/tracklink/settings.json").unwrap_err();
        assert!(matches!(err, ServiceError::Io(_)));
    }
}
