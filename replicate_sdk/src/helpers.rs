use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::dto::{PredictionError, TransportError};

pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Relay base for a given remote base, e.g.
/// `http://localhost:3000/https://api.replicate.com/v1`.
pub(crate) fn proxied_base(proxy_url: &str, base_url: &str) -> String {
    format!("{}/{}", proxy_url.trim_end_matches('/'), base_url)
}

pub(crate) fn versions_path(model_path: &str) -> String {
    format!("/models/{}/versions", model_path.trim_matches('/'))
}

pub(crate) fn prediction_path(id: &str) -> String {
    format!("/predictions/{id}")
}

/// Send a request and parse the body as JSON.
///
/// Non-success statuses become [`TransportError::Status`] carrying the body
/// text. The body is parsed from raw text rather than through
/// `Response::json` because relays may strip the `content-type` header.
pub(crate) async fn send_json(request: RequestBuilder) -> Result<Value, TransportError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        });
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body).map_err(|err| TransportError::Decode(err.to_string()))
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, PredictionError> {
    serde_json::from_value(value).map_err(|err| PredictionError::Serialization(err.to_string()))
}
