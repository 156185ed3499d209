//! Client configuration
//!
//! Loaded from defaults overlaid with `FHIR_CLIENT_*` environment variables:
//!
//! | Variable | Field |
//! |---|---|
//! | `FHIR_CLIENT_BASE_URL` | `base_url` |
//! | `FHIR_CLIENT_FHIR_VERSION` | `fhir_version` (`R4` or `R5`) |
//! | `FHIR_CLIENT_TIMEOUT_SECS` | `timeout_secs` |
//! | `FHIR_CLIENT_USER_AGENT` | `user_agent` |

use crate::error::{Error, Result};
use crate::version::FhirVersion;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

const ENV_PREFIX: &str = "FHIR_CLIENT";
const DEFAULT_BASE_URL: &str = "http://localhost:8080/fhir";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Service base URL, e.g. `https://hapi.fhir.org/baseR4`
    pub base_url: String,

    pub fhir_version: FhirVersion,

    /// Whole-request timeout. None leaves requests unbounded; callers can
    /// still impose deadlines by dropping the future.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    pub user_agent: String,

    /// Extra headers sent with every request
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            fhir_version: FhirVersion::default(),
            timeout_secs: None,
            user_agent: concat!("ferrum-client/", env!("CARGO_PKG_VERSION")).to_string(),
            headers: HashMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Defaults overlaid with `FHIR_CLIENT_*` environment variables
    pub fn from_env() -> Result<Self> {
        let config: Self = ::config::Config::builder()
            .add_source(::config::Config::try_from(&Self::default())?)
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            Error::Config(::config::ConfigError::Message(format!(
                "invalid base_url {:?}: {e}",
                self.base_url
            )))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(::config::ConfigError::Message(format!(
                "base_url must use http or https, got {}",
                url.scheme()
            ))));
        }

        if self.timeout_secs == Some(0) {
            return Err(Error::Config(::config::ConfigError::Message(
                "timeout_secs must be greater than zero".to_string(),
            )));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn with_fhir_version(mut self, fhir_version: FhirVersion) -> Self {
        self.fhir_version = fhir_version;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}
