use std::time::Duration;

use futures::StreamExt;
use replicate_sdk::{ClientConfig, PredictionStatus, ReplicateSdk};
use serde_json::json;
use std::error::Error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ClientConfig::from_env()?
        .with_polling_interval(Duration::from_millis(1_000))
        .with_deadline(Duration::from_secs(300));
    let sdk = ReplicateSdk::new(config)?;

    let model = sdk.lookup("replicate/hello-world", None).await?;
    let mut snapshots = Box::pin(model.predictor(json!({ "text": "streaming" })).into_stream());

    while let Some(snapshot) = snapshots.next().await {
        let snapshot = snapshot?;
        println!("[{}] {:?} -> {:?}", snapshot.id, snapshot.status, snapshot.output);
        if snapshot.status == PredictionStatus::Failed {
            eprintln!("prediction failed: {:?}", snapshot.error);
        }
    }

    Ok(())
}
