use std::time::Duration;

use crate::PredictionError;

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.replicate.com/v1";
pub(crate) const DEFAULT_POLLING_INTERVAL_MS: u64 = 5_000;

const TOKEN_ENV: &str = "REPLICATE_API_TOKEN";
const PROXY_URL_ENV: &str = "REPLICATE_PROXY_URL";
const BASE_URL_ENV: &str = "REPLICATE_BASE_URL";
const POLLING_INTERVAL_ENV: &str = "REPLICATE_POLLING_INTERVAL_MS";

/// Timing of the status polling loop.
///
/// `deadline` is `None` by default, in which case a prediction is polled
/// until it reaches a terminal status, however long that takes. Set it to
/// bound the wait: it is checked when a tick starts, so every tick begun
/// inside the deadline still polls once. The remote prediction keeps running
/// either way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollingConfig {
    pub interval: Duration,
    pub deadline: Option<Duration>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLLING_INTERVAL_MS),
            deadline: None,
        }
    }
}

/// Settings consumed by [`crate::ReplicateSdk`].
///
/// At least one of `token` and `proxy_url` must be present. When a proxy is
/// configured the relay is expected to attach the real credential, so the
/// token may be omitted.
///
/// ```
/// use std::time::Duration;
/// use replicate_sdk::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_token("r8_example")
///     .with_polling_interval(Duration::from_millis(500));
/// assert_eq!(config.polling.interval, Duration::from_millis(500));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub token: Option<String>,
    pub proxy_url: Option<String>,
    pub base_url: Option<String>,
    pub polling: PollingConfig,
}

impl ClientConfig {
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_proxy_url(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling.interval = interval;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.polling.deadline = Some(deadline);
        self
    }

    /// Build a configuration from `REPLICATE_*` environment variables.
    ///
    /// Reads `REPLICATE_API_TOKEN`, `REPLICATE_PROXY_URL`,
    /// `REPLICATE_BASE_URL` and `REPLICATE_POLLING_INTERVAL_MS`. Unset or
    /// empty variables are left at their defaults. The SDK itself never calls
    /// this; it is meant for binaries and handlers.
    pub fn from_env() -> Result<Self, PredictionError> {
        let mut config = Self {
            token: read_env(TOKEN_ENV),
            proxy_url: read_env(PROXY_URL_ENV),
            base_url: read_env(BASE_URL_ENV),
            polling: PollingConfig::default(),
        };

        if let Some(raw) = read_env(POLLING_INTERVAL_ENV) {
            let millis = raw.parse::<u64>().map_err(|err| {
                PredictionError::Configuration(format!("{POLLING_INTERVAL_ENV}={raw}: {err}"))
            })?;
            config.polling.interval = Duration::from_millis(millis);
        }

        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), PredictionError> {
        if self.token.is_none() && self.proxy_url.is_none() {
            return Err(PredictionError::Configuration(
                "missing Replicate token: provide a token or a proxy url".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }
}

fn read_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
