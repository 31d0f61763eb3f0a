use std::sync::Arc;

use futures::Stream;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::config::PollingConfig;
use crate::dto::{PredictionError, PredictionRequest, PredictionSnapshot};
use crate::helpers;
use crate::transport::{RequestEvent, Transport, TransportRequest};

pub(crate) async fn start_prediction(
    transport: &dyn Transport,
    token: Option<&str>,
    request: &PredictionRequest,
) -> Result<PredictionSnapshot, PredictionError> {
    let body = serde_json::to_value(request)
        .map_err(|err| PredictionError::Serialization(err.to_string()))?;
    let call = TransportRequest::new(
        "/predictions",
        RequestEvent::StartPrediction,
        token.map(str::to_string),
    )
    .with_body(body);

    helpers::decode(transport.post(call).await?)
}

pub(crate) async fn fetch_prediction(
    transport: &dyn Transport,
    token: Option<&str>,
    id: &str,
) -> Result<PredictionSnapshot, PredictionError> {
    let call = TransportRequest::new(
        helpers::prediction_path(id),
        RequestEvent::GetPrediction,
        token.map(str::to_string),
    );

    helpers::decode(transport.get(call).await?)
}

enum StreamState {
    Pending(PredictionRequest),
    Polling { id: String, started: Instant },
    Finished,
}

/// Lazy sequence of snapshots for one prediction.
///
/// Nothing is sent until the first [`next`](Self::next) call, which creates
/// the prediction. Every call then waits for the polling interval, fetches
/// the prediction once and yields that snapshot, whether or not its output
/// changed since the previous tick. The sequence ends after the first
/// snapshot with a terminal status, or after the first error.
///
/// The stream cannot be restarted. Dropping it stops polling locally but
/// does not cancel the prediction on the server.
pub struct PredictionStream {
    transport: Arc<dyn Transport>,
    token: Option<String>,
    polling: PollingConfig,
    prediction_id: Option<String>,
    state: StreamState,
}

impl PredictionStream {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        token: Option<String>,
        polling: PollingConfig,
        request: PredictionRequest,
    ) -> Self {
        Self {
            transport,
            token,
            polling,
            prediction_id: None,
            state: StreamState::Pending(request),
        }
    }

    /// Remote id of the prediction, once it has been created.
    pub fn prediction_id(&self) -> Option<&str> {
        self.prediction_id.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, StreamState::Finished)
    }

    /// Run one poll tick and return its snapshot.
    ///
    /// Returns `None` once the stream has finished. An error ends the stream;
    /// start a new prediction to recover.
    pub async fn next(&mut self) -> Option<Result<PredictionSnapshot, PredictionError>> {
        self.advance().await.transpose()
    }

    async fn advance(&mut self) -> Result<Option<PredictionSnapshot>, PredictionError> {
        // The state stays `Finished` unless this tick completes with a
        // non-terminal snapshot, so errors and abandoned ticks end the stream.
        let (id, started) = match std::mem::replace(&mut self.state, StreamState::Finished) {
            StreamState::Finished => return Ok(None),
            StreamState::Polling { id, started } => (id, started),
            StreamState::Pending(request) => {
                let created =
                    start_prediction(self.transport.as_ref(), self.token.as_deref(), &request)
                        .await?;
                info!(prediction = %created.id, version = %request.version, "prediction created");
                self.prediction_id = Some(created.id.clone());
                (created.id, Instant::now())
            }
        };

        // A tick that starts inside the deadline always completes its poll.
        if let Some(deadline) = self.polling.deadline {
            let waited = started.elapsed();
            if waited >= deadline {
                return Err(PredictionError::DeadlineExceeded {
                    prediction_id: id,
                    waited,
                });
            }
        }

        sleep(self.polling.interval).await;

        let snapshot =
            fetch_prediction(self.transport.as_ref(), self.token.as_deref(), &id).await?;
        debug!(prediction = %id, status = ?snapshot.status, "polled prediction");

        if snapshot.status.is_terminal() {
            info!(prediction = %id, status = ?snapshot.status, "prediction finished");
        } else {
            self.state = StreamState::Polling { id, started };
        }

        Ok(Some(snapshot))
    }

    /// Drain the stream and return the terminal snapshot.
    pub async fn final_snapshot(mut self) -> Result<PredictionSnapshot, PredictionError> {
        let mut last = None;
        while let Some(snapshot) = self.next().await {
            last = Some(snapshot?);
        }
        last.ok_or(PredictionError::StreamExhausted)
    }

    /// Adapt into a [`futures::Stream`] for use with `StreamExt` combinators.
    pub fn into_stream(
        self,
    ) -> impl Stream<Item = Result<PredictionSnapshot, PredictionError>> + Send {
        futures::stream::unfold(self, |mut stream| async move {
            stream.next().await.map(|item| (item, stream))
        })
    }
}
