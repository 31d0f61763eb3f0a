use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::resolver;
use crate::stream::{self, PredictionStream};
use crate::transport::{
    DirectTransport, ProxiedTransport, RequestEvent, Transport, TransportRequest,
};
use crate::{
    helpers, ClientConfig, ModelReference, ModelVersion, ModelVersionList, PollingConfig,
    PredictionError, PredictionRequest, PredictionSnapshot, ResolvedModel, TransportError,
};

/// Entry point for resolving models and running predictions.
///
/// Cloning is cheap; clones share the transport and configuration.
#[derive(Clone)]
pub struct ReplicateSdk {
    transport: Arc<dyn Transport>,
    token: Option<String>,
    polling: PollingConfig,
}

impl ReplicateSdk {
    /// Construct an SDK client from explicit configuration.
    ///
    /// A [`ProxiedTransport`] is used when `proxy_url` is set, a
    /// [`DirectTransport`] otherwise. Fails with
    /// [`PredictionError::Configuration`] when neither a token nor a proxy
    /// url is configured; no request is made in that case.
    ///
    /// ```no_run
    /// use replicate_sdk::{ClientConfig, ReplicateSdk};
    ///
    /// let sdk = ReplicateSdk::new(ClientConfig::default().with_token("r8_example"))?;
    /// # Ok::<(), replicate_sdk::PredictionError>(())
    /// ```
    pub fn new(config: ClientConfig) -> Result<Self, PredictionError> {
        config.validate()?;
        let client = Client::builder()
            .build()
            .map_err(|err| TransportError::Network(err.to_string()))?;
        Self::with_client(client, config)
    }

    /// Build an SDK around a pre-configured HTTP client.
    ///
    /// Use this constructor to inject custom timeouts or instrumentation while
    /// keeping the default direct/relay selection.
    pub fn with_client(client: Client, config: ClientConfig) -> Result<Self, PredictionError> {
        config.validate()?;
        let transport: Arc<dyn Transport> = match config.proxy_url.as_deref() {
            Some(proxy_url) => Arc::new(ProxiedTransport::with_client(
                client,
                proxy_url,
                config.base_url(),
            )),
            None => Arc::new(DirectTransport::with_client(client, config.base_url())),
        };
        Ok(Self::assemble(config, transport))
    }

    /// Build an SDK that sends every call through `transport`.
    ///
    /// `proxy_url` and `base_url` are ignored here; the transport decides where
    /// requests go. The token-or-proxy requirement still applies.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, PredictionError> {
        config.validate()?;
        Ok(Self::assemble(config, transport))
    }

    fn assemble(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            token: config.token,
            polling: config.polling,
        }
    }

    pub fn polling(&self) -> PollingConfig {
        self.polling
    }

    /// Resolve `path` to a concrete version and return a handle for running
    /// predictions against it.
    ///
    /// An unknown `version` falls back to the most recent one with a logged
    /// warning. Transport failures and empty version lists are errors.
    pub async fn lookup(
        &self,
        path: &str,
        version: Option<&str>,
    ) -> Result<Model, PredictionError> {
        let reference = ModelReference::new(path, version.map(str::to_string));
        let resolved =
            resolver::resolve_model(self.transport.as_ref(), self.token.as_deref(), &reference)
                .await?;
        debug!(model = %resolved.path, version = %resolved.version_id(), "resolved model");

        Ok(Model {
            resolved,
            transport: Arc::clone(&self.transport),
            token: self.token.clone(),
            polling: self.polling,
        })
    }

    /// List the published versions of a model, most recent first.
    pub async fn get_model_versions(
        &self,
        path: &str,
    ) -> Result<Vec<ModelVersion>, PredictionError> {
        let request = TransportRequest::new(
            helpers::versions_path(path),
            RequestEvent::GetModel,
            self.token.clone(),
        );
        let listing: ModelVersionList = helpers::decode(self.transport.get(request).await?)?;
        Ok(listing.results)
    }

    /// Fetch the current state of a prediction once.
    pub async fn get_prediction(&self, id: &str) -> Result<PredictionSnapshot, PredictionError> {
        stream::fetch_prediction(self.transport.as_ref(), self.token.as_deref(), id).await
    }

    /// Create a prediction without polling it.
    pub async fn start_prediction(
        &self,
        version: &str,
        input: Value,
        webhook_completed: Option<String>,
    ) -> Result<PredictionSnapshot, PredictionError> {
        let request = PredictionRequest {
            version: version.to_string(),
            input,
            webhook_completed,
        };
        stream::start_prediction(self.transport.as_ref(), self.token.as_deref(), &request).await
    }
}

/// A model pinned to the version chosen at lookup time.
#[derive(Clone)]
pub struct Model {
    resolved: ResolvedModel,
    transport: Arc<dyn Transport>,
    token: Option<String>,
    polling: PollingConfig,
}

impl Model {
    pub fn resolved(&self) -> &ResolvedModel {
        &self.resolved
    }

    pub fn path(&self) -> &str {
        &self.resolved.path
    }

    pub fn version_id(&self) -> &str {
        self.resolved.version_id()
    }

    /// Lazily run a prediction, yielding one snapshot per poll tick.
    ///
    /// See [`PredictionStream`] for the polling rules.
    pub fn predictor(&self, input: Value) -> PredictionStream {
        self.predictor_with_webhook(input, None)
    }

    /// Like [`predictor`](Self::predictor), asking the API to call
    /// `webhook_completed` when the prediction finishes.
    pub fn predictor_with_webhook(
        &self,
        input: Value,
        webhook_completed: Option<String>,
    ) -> PredictionStream {
        PredictionStream::new(
            Arc::clone(&self.transport),
            self.token.clone(),
            self.polling,
            PredictionRequest {
                version: self.resolved.version_id().to_string(),
                input,
                webhook_completed,
            },
        )
    }

    /// Run a prediction to completion and return the terminal snapshot.
    pub async fn run(&self, input: Value) -> Result<PredictionSnapshot, PredictionError> {
        self.predictor(input).final_snapshot().await
    }

    /// Run a prediction to completion and return only its final output.
    ///
    /// The output of the terminal snapshot is returned whatever the terminal
    /// status was; use [`run`](Self::run) to inspect `status` and `error`.
    pub async fn predict(&self, input: Value) -> Result<Option<Value>, PredictionError> {
        Ok(self.run(input).await?.output)
    }
}
