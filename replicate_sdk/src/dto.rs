use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Lifecycle status of a remote prediction.
///
/// Serialized with lowercase strings (e.g., `"processing"`) to match the API.
/// `Starting` and `Processing` are the only non-terminal states; once a
/// prediction reports any other status it never transitions again.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl PredictionStatus {
    /// Whether polling should stop after observing this status.
    pub fn is_terminal(self) -> bool {
        !matches!(self, PredictionStatus::Starting | PredictionStatus::Processing)
    }
}

/// State of one prediction as observed on a single poll tick.
///
/// * `output` is passed through exactly as returned; models may stream
///   partial outputs while `status` is still `processing`.
/// * `error`, `logs` and `version` are informational and never influence
///   the polling loop.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictionSnapshot {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A published, immutable revision of a model.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ModelVersion {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cog_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openapi_schema: Option<Value>,
}

/// Page returned by `GET /models/{path}/versions`, most recent first.
#[derive(Clone, Debug, Deserialize)]
pub struct ModelVersionList {
    pub results: Vec<ModelVersion>,
    #[serde(default)]
    pub next: Option<String>,
}

/// A model the caller wants to run, optionally pinned to a version id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelReference {
    pub path: String,
    pub version: Option<String>,
}

impl ModelReference {
    pub fn new(path: impl Into<String>, version: Option<String>) -> Self {
        Self {
            path: path.into(),
            version,
        }
    }
}

/// Model path paired with the concrete version every prediction will use.
///
/// `version` is always one of the entries the versions endpoint returned
/// for `path` at lookup time.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedModel {
    pub path: String,
    pub version: ModelVersion,
}

impl ResolvedModel {
    pub fn version_id(&self) -> &str {
        &self.version.id
    }
}

/// Body of `POST /predictions`.
///
/// `input` is opaque to the SDK and forwarded unchanged.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PredictionRequest {
    pub version: String,
    pub input: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_completed: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
/// Request payload for running a prediction end to end.
///
/// * `model` is the owner-qualified model path (e.g., `"kuprel/min-dalle"`).
/// * `version` optionally pins a version id; unknown ids fall back to the
///   most recent version.
/// * `input` is forwarded unchanged and defaults to an empty string.
pub struct PredictionJob {
    pub model: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default = "empty_input")]
    pub input: Value,
}

fn empty_input() -> Value {
    Value::String(String::new())
}

#[derive(Debug, Error)]
/// Failures raised while talking to the API or a relay in front of it.
pub enum TransportError {
    #[error("network call failed: {0}")]
    Network(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => TransportError::Status {
                status: status.as_u16(),
                body: error.to_string(),
            },
            None if error.is_decode() => TransportError::Decode(error.to_string()),
            None => TransportError::Network(error.to_string()),
        }
    }
}

#[derive(Debug, Error)]
/// Errors that can be returned by the SDK while resolving models or running
/// predictions.
pub enum PredictionError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("could not resolve model: {0}")]
    Resolution(String),
    #[error("failed to deserialize response: {0}")]
    Serialization(String),
    #[error("prediction stream already finished")]
    StreamExhausted,
    #[error("prediction {prediction_id} did not finish within {waited:?}")]
    DeadlineExceeded {
        prediction_id: String,
        waited: Duration,
    },
}
