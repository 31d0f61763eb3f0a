use replicate_sdk::{ClientConfig, ReplicateSdk};
use serde_json::json;
use std::error::Error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // REPLICATE_API_TOKEN or REPLICATE_PROXY_URL must be set.
    let sdk = ReplicateSdk::new(ClientConfig::from_env()?)?;

    let model = sdk.lookup("stability-ai/stable-diffusion", None).await?;
    println!("Using {} @ {}", model.path(), model.version_id());

    let output = model
        .predict(json!({ "prompt": "a watercolor painting of a lighthouse" }))
        .await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
