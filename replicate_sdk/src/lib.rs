//! Entry point for the Replicate SDK crate.
//! Consumers should import exported types via the crate root.
//!
//! # Example
//!
//! ```no_run
//! use replicate_sdk::{ClientConfig, ReplicateSdk};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), replicate_sdk::PredictionError> {
//!     let sdk = ReplicateSdk::new(ClientConfig::default().with_token("r8_example"))?;
//!     let model = sdk.lookup("kuprel/min-dalle", None).await?;
//!
//!     // Pull snapshots one poll at a time...
//!     let mut predictor = model.predictor(json!({ "text": "a pixel art cat" }));
//!     while let Some(snapshot) = predictor.next().await {
//!         let snapshot = snapshot?;
//!         println!("{:?}: {:?}", snapshot.status, snapshot.output);
//!     }
//!
//!     // ...or wait for the final output.
//!     let output = model.predict(json!({ "text": "a pixel art dog" })).await?;
//!     println!("{output:?}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dto;
pub(crate) mod helpers;
pub mod handler;
pub mod resolver;
pub mod stream;
pub mod transport;
pub mod implementation {
    include!("impl.rs");
}

pub use config::{ClientConfig, PollingConfig};
pub use dto::*;
pub use handler::{run_prediction_handler, run_prediction_handler_with};
pub use implementation::{Model, ReplicateSdk};
pub use stream::PredictionStream;
pub use transport::{DirectTransport, ProxiedTransport, RequestEvent, Transport, TransportRequest};
