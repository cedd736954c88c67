//! Typed sensor configuration, read from TOML and validated once.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::model::Selector;
use crate::registry::Municipality;
use crate::resolver::{DATE_FORMAT, Labels};
use crate::transform::Template;

const DEFAULT_SCAN_INTERVAL_SECS: u64 = 3600;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str = concat!("abfuhr/", env!("CARGO_PKG_VERSION"));

#[derive(thiserror::Error, Debug)]
/// Errors raised while loading or validating a sensor configuration.
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file '{}': {source}", path.display())]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration is not valid TOML or has unknown fields.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A field holds a value the sensor cannot work with.
    #[error("Invalid value for '{field}': {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

fn default_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL_SECS
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_owned()
}

/// On-disk shape of the configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSensorConfig {
    name: String,
    municipality: String,
    locality: Selector,
    street: Selector,
    #[serde(default)]
    value_template: Option<String>,
    #[serde(default = "default_scan_interval")]
    scan_interval_secs: u64,
    #[serde(default = "default_timeout")]
    timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    user_agent: String,
    #[serde(default)]
    labels: Labels,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Everything one waste collection sensor needs.
pub struct SensorConfig {
    /// Display label of the sensor.
    pub name: String,
    /// Deployment to query.
    pub municipality: Municipality,
    /// Locality by name or id.
    pub locality: Selector,
    /// Street by name or id.
    pub street: Selector,
    /// Optional post-processor for the headline value.
    pub value_template: Option<Template>,
    /// Time between update cycles.
    pub scan_interval: Duration,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
    /// Localizable strings in the published state.
    pub labels: Labels,
}

impl SensorConfig {
    /// Create a configuration with default intervals and labels.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a field fails validation.
    pub fn new(
        name: impl Into<String>,
        municipality: Municipality,
        locality: Selector,
        street: Selector,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            name: name.into(),
            municipality,
            locality,
            street,
            value_template: None,
            scan_interval: Duration::from_secs(DEFAULT_SCAN_INTERVAL_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: default_user_agent(),
            labels: Labels::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown fields and
    /// [`ConfigError::Invalid`] when a field fails validation.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawSensorConfig = toml::from_str(contents)?;
        let municipality =
            raw.municipality
                .parse::<Municipality>()
                .map_err(|err| ConfigError::Invalid {
                    field: "municipality",
                    reason: err.to_string(),
                })?;

        let config = Self {
            name: raw.name,
            municipality,
            locality: raw.locality,
            street: raw.street,
            value_template: raw.value_template.map(Template::new),
            scan_interval: Duration::from_secs(raw.scan_interval_secs),
            timeout: Duration::from_secs(raw.timeout_secs),
            user_agent: raw.user_agent,
            labels: raw.labels,
        };
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise as
    /// [`SensorConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Check the invariants every constructor guarantees.
    ///
    /// Call again after changing fields by hand.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: &str| ConfigError::Invalid {
            field,
            reason: reason.to_owned(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name", "must not be empty"));
        }
        if matches!(&self.locality, Selector::Name(name) if name.trim().is_empty()) {
            return Err(invalid("locality", "must not be empty"));
        }
        if matches!(&self.street, Selector::Name(name) if name.trim().is_empty()) {
            return Err(invalid("street", "must not be empty"));
        }
        if self.scan_interval.is_zero() {
            return Err(invalid("scan_interval_secs", "must be greater than zero"));
        }
        if self.timeout.is_zero() {
            return Err(invalid("timeout_secs", "must be greater than zero"));
        }
        if self.labels.last_refreshed.trim().is_empty() {
            return Err(invalid("labels.last_refreshed", "must not be empty"));
        }
        if NaiveDate::parse_from_str(self.labels.last_refreshed.trim(), DATE_FORMAT).is_ok() {
            return Err(invalid(
                "labels.last_refreshed",
                "must not look like a date key",
            ));
        }
        Ok(())
    }
}
