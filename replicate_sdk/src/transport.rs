use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use crate::dto::TransportError;
use crate::helpers;

/// Which SDK operation issued a request. Only used for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestEvent {
    GetModel,
    StartPrediction,
    GetPrediction,
}

impl RequestEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestEvent::GetModel => "getModel",
            RequestEvent::StartPrediction => "startPrediction",
            RequestEvent::GetPrediction => "getPrediction",
        }
    }
}

/// A single API call, expressed relative to the API root.
///
/// * `path` starts with `/` (e.g., `/predictions`); each transport decides
///   which absolute URL it maps to.
/// * `token` is the credential the caller holds, if any. Transports that sit
///   behind a relay are free to ignore it.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportRequest {
    pub path: String,
    pub event: RequestEvent,
    pub body: Option<Value>,
    pub token: Option<String>,
}

impl TransportRequest {
    pub fn new(path: impl Into<String>, event: RequestEvent, token: Option<String>) -> Self {
        Self {
            path: path.into(),
            event,
            body: None,
            token,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Issues authenticated GET/POST calls and returns the parsed JSON body.
///
/// Implementations must fail with [`TransportError`] on network errors and on
/// any non-success status; they must not retry. The SDK only talks to the
/// API through this trait, so tests and alternate HTTP stacks can be swapped
/// in via [`crate::ReplicateSdk::with_transport`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: TransportRequest) -> Result<Value, TransportError>;
    async fn post(&self, request: TransportRequest) -> Result<Value, TransportError>;
}

/// Talks to the API directly, sending the token as an `Authorization` header.
#[derive(Clone, Debug)]
pub struct DirectTransport {
    client: Client,
    base_url: String,
}

impl DirectTransport {
    /// Build a transport with a default `reqwest::Client`.
    ///
    /// Fails with [`TransportError::Network`] if the client cannot be built
    /// (e.g., the TLS backend fails to initialise).
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .build()
            .map_err(|err| TransportError::Network(err.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse a pre-configured client, e.g. one with custom timeouts.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, request: &TransportRequest) -> RequestBuilder {
        let url = helpers::join_url(&self.base_url, &request.path);
        debug!(event = request.event.as_str(), %method, %url, "replicate request");

        let mut builder = self.client.request(method, url).header(ACCEPT, "application/json");
        if let Some(token) = request.token.as_deref() {
            builder = builder.header(AUTHORIZATION, format!("Token {token}"));
        }
        if let Some(body) = request.body.as_ref() {
            builder = builder.json(body);
        }
        builder
    }
}

#[async_trait]
impl Transport for DirectTransport {
    async fn get(&self, request: TransportRequest) -> Result<Value, TransportError> {
        helpers::send_json(self.request(Method::GET, &request)).await
    }

    async fn post(&self, request: TransportRequest) -> Result<Value, TransportError> {
        helpers::send_json(self.request(Method::POST, &request)).await
    }
}

/// Routes every call through a CORS relay.
///
/// Requests go to `{proxy_url}/{base_url}{path}`. The relay injects the real
/// credential and relaxes the response headers, so this transport never sends
/// a token of its own.
#[derive(Clone, Debug)]
pub struct ProxiedTransport {
    client: Client,
    base_url: String,
}

impl ProxiedTransport {
    pub fn new(proxy_url: &str, base_url: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .build()
            .map_err(|err| TransportError::Network(err.to_string()))?;
        Ok(Self::with_client(client, proxy_url, base_url))
    }

    pub fn with_client(client: Client, proxy_url: &str, base_url: &str) -> Self {
        Self {
            client,
            base_url: helpers::proxied_base(proxy_url, base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, request: &TransportRequest) -> RequestBuilder {
        let url = helpers::join_url(&self.base_url, &request.path);
        debug!(event = request.event.as_str(), %method, %url, "replicate request via relay");

        let builder = self.client.request(method, url).header(ACCEPT, "application/json");
        match request.body.as_ref() {
            Some(body) => builder.json(body),
            None => builder,
        }
    }
}

#[async_trait]
impl Transport for ProxiedTransport {
    async fn get(&self, request: TransportRequest) -> Result<Value, TransportError> {
        helpers::send_json(self.request(Method::GET, &request)).await
    }

    async fn post(&self, request: TransportRequest) -> Result<Value, TransportError> {
        helpers::send_json(self.request(Method::POST, &request)).await
    }
}
