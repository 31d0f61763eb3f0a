use crate::{ClientConfig, PredictionError, PredictionJob, ReplicateSdk};

/// Run a [`PredictionJob`] to completion, returning serialized JSON.
///
/// This helper is intended for MCP or HTTP entry points where callers send a
/// single payload naming the model, an optional version and the input. The
/// SDK is configured from `REPLICATE_*` environment variables (see
/// [`ClientConfig::from_env`]), the model is resolved, and the terminal
/// [`crate::PredictionSnapshot`] is returned as a JSON string. A prediction that
/// ends as `failed` or `canceled` is still returned as JSON; only transport,
/// configuration and resolution problems are errors.
///
/// # Examples
///
/// ```no_run
/// use replicate_sdk::PredictionJob;
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), replicate_sdk::PredictionError> {
/// let job = PredictionJob {
///     model: "kuprel/min-dalle".to_string(),
///     version: None,
///     input: json!({ "text": "an astronaut riding a horse" }),
/// };
///
/// let json = replicate_sdk::run_prediction_handler(job).await?;
/// println!("{json}");
/// # Ok(())
/// # }
/// ```
pub async fn run_prediction_handler(job: PredictionJob) -> Result<String, PredictionError> {
    let sdk = ReplicateSdk::new(ClientConfig::from_env()?)?;
    run_prediction_handler_with(&sdk, job).await
}

/// Same as [`run_prediction_handler`] with a caller-supplied SDK.
pub async fn run_prediction_handler_with(
    sdk: &ReplicateSdk,
    job: PredictionJob,
) -> Result<String, PredictionError> {
    let model = sdk.lookup(&job.model, job.version.as_deref()).await?;
    let snapshot = model.run(job.input).await?;

    serde_json::to_string(&snapshot).map_err(|err| PredictionError::Serialization(err.to_string()))
}
