use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use replicate_sdk::{
    run_prediction_handler_with, ClientConfig, PredictionError, PredictionJob, PredictionSnapshot,
    PredictionStatus, ReplicateSdk, RequestEvent, Transport, TransportError, TransportRequest,
};
use serde_json::{json, Value};

/// Replays canned responses per verb, in order, and records every call.
#[derive(Default)]
struct MockTransport {
    responses: Mutex<HashMap<&'static str, VecDeque<Value>>>,
    calls: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    fn new(gets: Vec<Value>, posts: Vec<Value>) -> Arc<Self> {
        let mut responses = HashMap::new();
        responses.insert("get", VecDeque::from(gets));
        responses.insert("post", VecDeque::from(posts));
        Arc::new(Self {
            responses: Mutex::new(responses),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<TransportRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn reply(
        &self,
        verb: &'static str,
        request: TransportRequest,
    ) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .get_mut(verb)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| TransportError::Network(format!("no scripted {verb} response")))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, request: TransportRequest) -> Result<Value, TransportError> {
        self.reply("get", request)
    }

    async fn post(&self, request: TransportRequest) -> Result<Value, TransportError> {
        self.reply("post", request)
    }
}

fn config() -> ClientConfig {
    ClientConfig::default()
        .with_token("abctoken")
        .with_polling_interval(Duration::from_millis(1))
}

#[test]
fn missing_credentials_fail_before_any_call() {
    let transport = MockTransport::new(vec![], vec![]);
    let result = ReplicateSdk::with_transport(ClientConfig::default(), transport.clone());

    assert!(matches!(result, Err(PredictionError::Configuration(_))));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn lookup_fetches_model_versions() {
    let transport = MockTransport::new(vec![json!({ "results": [{ "id": "1" }] })], vec![]);
    let sdk = ReplicateSdk::with_transport(config(), transport.clone()).unwrap();

    let model = sdk.lookup("kuprel/min-dalle", None).await.unwrap();

    assert_eq!(model.version_id(), "1");
    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "/models/kuprel/min-dalle/versions");
    assert_eq!(calls[0].event, RequestEvent::GetModel);
    assert_eq!(calls[0].token.as_deref(), Some("abctoken"));
}

#[tokio::test]
async fn lookup_honours_listed_version_and_falls_back_otherwise() {
    let listing = json!({ "results": [{ "id": "1" }, { "id": "2" }] });
    let transport = MockTransport::new(vec![listing.clone(), listing], vec![]);
    let sdk = ReplicateSdk::with_transport(config(), transport).unwrap();

    let pinned = sdk.lookup("owner/model", Some("2")).await.unwrap();
    let fallback = sdk.lookup("owner/model", Some("9")).await.unwrap();

    assert_eq!(pinned.version_id(), "2");
    assert_eq!(fallback.version_id(), "1");
}

#[tokio::test]
async fn lookup_with_no_versions_is_a_resolution_error() {
    let transport = MockTransport::new(vec![json!({ "results": [] })], vec![]);
    let sdk = ReplicateSdk::with_transport(config(), transport).unwrap();

    let err = sdk.lookup("owner/model", None).await.err().unwrap();
    assert!(matches!(err, PredictionError::Resolution(_)));
}

#[tokio::test]
async fn predict_returns_output_of_terminal_tick() {
    let transport = MockTransport::new(
        vec![
            json!({ "results": [{ "id": "1" }] }),
            json!({ "id": "p1", "status": "starting", "output": null }),
            json!({ "id": "p1", "status": "succeeded", "output": "X" }),
        ],
        vec![json!({ "id": "p1", "status": "starting" })],
    );
    let sdk = ReplicateSdk::with_transport(config(), transport.clone()).unwrap();
    let model = sdk.lookup("kuprel/min-dalle", None).await.unwrap();

    let output = model.predict(json!("")).await.unwrap();

    assert_eq!(output, Some(json!("X")));
    let events: Vec<_> = transport.calls().iter().map(|call| call.event).collect();
    assert_eq!(
        events,
        vec![
            RequestEvent::GetModel,
            RequestEvent::StartPrediction,
            RequestEvent::GetPrediction,
            RequestEvent::GetPrediction,
        ]
    );
}

#[tokio::test]
async fn predictor_emits_duplicate_outputs_and_stops_at_terminal_status() {
    let transport = MockTransport::new(
        vec![
            json!({ "results": [{ "id": "1" }] }),
            json!({ "id": "p1", "status": "processing", "output": ["a"] }),
            json!({ "id": "p1", "status": "processing", "output": ["a"] }),
            json!({ "id": "p1", "status": "canceled", "output": ["a"] }),
            json!({ "id": "p1", "status": "succeeded", "output": ["unreachable"] }),
        ],
        vec![json!({ "id": "p1", "status": "starting" })],
    );
    let sdk = ReplicateSdk::with_transport(config(), transport.clone()).unwrap();
    let model = sdk.lookup("owner/model", None).await.unwrap();

    let mut predictor = model.predictor(json!({ "prompt": "hi" }));
    let mut snapshots: Vec<PredictionSnapshot> = Vec::new();
    while let Some(snapshot) = predictor.next().await {
        snapshots.push(snapshot.unwrap());
    }

    assert_eq!(snapshots.len(), 3);
    assert_eq!(snapshots[0].output, snapshots[1].output);
    assert_eq!(snapshots[2].status, PredictionStatus::Canceled);
    // versions + start + three polls; the fourth scripted poll is never issued
    assert_eq!(transport.calls().len(), 5);
}

#[tokio::test]
async fn abandoning_the_predictor_stops_polling() {
    let transport = MockTransport::new(
        vec![
            json!({ "results": [{ "id": "1" }] }),
            json!({ "id": "p1", "status": "processing", "output": null }),
            json!({ "id": "p1", "status": "processing", "output": null }),
        ],
        vec![json!({ "id": "p1", "status": "starting" })],
    );
    let sdk = ReplicateSdk::with_transport(config(), transport.clone()).unwrap();
    let model = sdk.lookup("owner/model", None).await.unwrap();

    let mut predictor = model.predictor(json!(""));
    let first = predictor.next().await.unwrap().unwrap();
    assert_eq!(first.status, PredictionStatus::Processing);
    drop(predictor);

    assert_eq!(transport.calls().len(), 3);
}

#[tokio::test]
async fn handler_serializes_terminal_snapshot() {
    let transport = MockTransport::new(
        vec![
            json!({ "results": [{ "id": "1" }] }),
            json!({ "id": "p1", "status": "failed", "output": null, "error": "boom" }),
        ],
        vec![json!({ "id": "p1", "status": "starting" })],
    );
    let sdk = ReplicateSdk::with_transport(config(), transport).unwrap();
    let job = PredictionJob {
        model: "owner/model".to_string(),
        version: None,
        input: json!({ "prompt": "hi" }),
    };

    let body = run_prediction_handler_with(&sdk, job).await.unwrap();
    let snapshot: PredictionSnapshot = serde_json::from_str(&body).unwrap();

    assert_eq!(snapshot.status, PredictionStatus::Failed);
    assert_eq!(snapshot.error, Some(json!("boom")));
}
