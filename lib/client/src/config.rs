//! Client configuration.
//!
//! Loaded via the `config` crate from `FGA_`-prefixed environment variables
//! or from a file. Nested keys use `__`, e.g. `FGA_RETRY__MAX_RETRIES=5`.
//! The configuration is immutable once a client is built from it.

use crate::error::FgaError;
use fgakit_core::{AuthorizationModelId, StoreId, ValidationError};
use fgakit_transport::{HeaderSet, RetryPolicy};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Connection and default-behaviour settings for an [`FgaClient`](crate::FgaClient).
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the authorization service, e.g. `http://localhost:8080`.
    pub api_url: String,

    /// Store that operations target.
    #[serde(default)]
    pub store_id: Option<String>,

    /// Authorization model pinned for every call unless overridden.
    #[serde(default)]
    pub authorization_model_id: Option<String>,

    /// Bearer token sent in the `Authorization` header.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Headers sent with every call.
    #[serde(default)]
    pub default_headers: HeaderSet,

    /// Retry settings for every call unless overridden.
    #[serde(default)]
    pub retry: RetrySettings,

    /// Per-call timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Retry settings in their configuration-file form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetrySettings {
    /// Retries after the first attempt, at most 15.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds.
    #[serde(default = "default_min_wait_ms")]
    pub min_wait_ms: u64,

    /// Cap on any single delay, in milliseconds.
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_min_wait_ms() -> u64 {
    100
}

fn default_max_wait_ms() -> u64 {
    120_000
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            min_wait_ms: default_min_wait_ms(),
            max_wait_ms: default_max_wait_ms(),
        }
    }
}

impl RetrySettings {
    /// Converts to the policy the transport layer runs.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.min_wait_ms),
            Duration::from_millis(self.max_wait_ms),
        )
    }
}

impl From<RetryPolicy> for RetrySettings {
    fn from(policy: RetryPolicy) -> Self {
        Self {
            max_retries: policy.max_retries,
            min_wait_ms: u64::try_from(policy.min_wait.as_millis()).unwrap_or(u64::MAX),
            max_wait_ms: u64::try_from(policy.max_wait.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for `api_url` with every other setting defaulted.
    #[must_use]
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            store_id: None,
            authorization_model_id: None,
            api_token: None,
            default_headers: HeaderSet::new(),
            retry: RetrySettings::default(),
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Loads configuration from `FGA_`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Loads configuration from a file, with environment variables taking
    /// precedence. The format follows the file extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the result is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    #[must_use]
    pub fn with_store_id(mut self, store_id: impl Into<String>) -> Self {
        self.store_id = Some(store_id.into());
        self
    }

    #[must_use]
    pub fn with_authorization_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.authorization_model_id = Some(model_id.into());
        self
    }

    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = RetrySettings::from(policy);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Per-call timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Checks the URL, identifiers and retry bound.
    ///
    /// # Errors
    ///
    /// Returns [`FgaError::Configuration`] for an unusable URL and
    /// [`FgaError::Validation`] for malformed ids or too many retries.
    pub fn validate(&self) -> Result<(), FgaError> {
        self.resolve().map(|_| ())
    }

    /// Validates and converts into the settings a client runs with.
    pub(crate) fn resolve(&self) -> Result<ResolvedConfig, FgaError> {
        let url = reqwest::Url::parse(&self.api_url).map_err(|e| FgaError::Configuration {
            reason: format!("api_url '{}' is not a valid URL: {e}", self.api_url),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FgaError::Configuration {
                reason: format!("api_url '{}' must use http or https", self.api_url),
            });
        }

        let store_id = self
            .store_id
            .as_deref()
            .map(|raw| parse_id::<StoreId>("store_id", raw))
            .transpose()?;
        let authorization_model_id = self
            .authorization_model_id
            .as_deref()
            .map(|raw| parse_id::<AuthorizationModelId>("authorization_model_id", raw))
            .transpose()?;

        let retry = self.retry.policy();
        retry.validate()?;

        let mut default_headers = self.default_headers.clone();
        if let Some(token) = &self.api_token {
            default_headers.retain(|name, _| !name.eq_ignore_ascii_case("authorization"));
            default_headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        }

        Ok(ResolvedConfig {
            store_id,
            authorization_model_id,
            default_headers,
            retry,
            timeout: self.timeout(),
        })
    }
}

/// Settings a client runs with after validation.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedConfig {
    pub store_id: Option<StoreId>,
    pub authorization_model_id: Option<AuthorizationModelId>,
    pub default_headers: HeaderSet,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

pub(crate) fn parse_id<T: std::str::FromStr>(
    kind: &'static str,
    raw: &str,
) -> Result<T, ValidationError> {
    raw.parse().map_err(|_| ValidationError::MalformedIdentifier {
        kind,
        value: raw.to_string(),
    })
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("FGA")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
