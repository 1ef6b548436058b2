use std::collections::VecDeque;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

use super::*;

struct TestGenerationGateway {
    raw: Value,
    fail_with: Option<String>,
    gate: Option<Arc<Notify>>,
    calls: Arc<Mutex<u32>>,
}

impl TestGenerationGateway {
    fn ok(raw: Value) -> Self {
        Self {
            raw,
            fail_with: None,
            gate: None,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    fn failing(message: impl Into<String>) -> Self {
        Self {
            raw: Value::Null,
            fail_with: Some(message.into()),
            gate: None,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Suspends inside `invoke` until the gate is notified, so tests can
    /// observe the in-flight window.
    fn gated(raw: Value, gate: Arc<Notify>) -> Self {
        Self {
            raw,
            fail_with: None,
            gate: Some(gate),
            calls: Arc::new(Mutex::new(0)),
        }
    }
}

#[async_trait]
impl GenerationGateway for TestGenerationGateway {
    async fn invoke(&self) -> Result<Value, ClientError> {
        {
            let mut calls = self.calls.lock().await;
            *calls += 1;
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(message) = &self.fail_with {
            return Err(ClientError::transport(message.clone()));
        }
        Ok(self.raw.clone())
    }
}

struct TestCounterGateway {
    responses: Mutex<VecDeque<Result<u64, String>>>,
    calls: Arc<Mutex<u32>>,
}

impl TestCounterGateway {
    fn with_sequence(responses: Vec<Result<u64, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Arc::new(Mutex::new(0)),
        }
    }
}

#[async_trait]
impl CounterGateway for TestCounterGateway {
    async fn fetch_current(&self) -> Result<u64, ClientError> {
        {
            let mut calls = self.calls.lock().await;
            *calls += 1;
        }
        match self.responses.lock().await.pop_front() {
            Some(Ok(count)) => Ok(count),
            Some(Err(message)) => Err(ClientError::schema(message)),
            None => Err(ClientError::transport("no scripted counter response")),
        }
    }
}

fn raw_envelope(body: &str) -> Value {
    Value::String(json!({ "statusCode": 200, "headers": {}, "body": body }).to_string())
}

#[tokio::test]
async fn initial_state_is_closed_with_zero_counter() {
    let state = QuoteOrchestrator::new().snapshot().await;
    assert_eq!(state.modal, ModalState::Closed);
    assert_eq!(state.decoded_result, None);
    assert_eq!(state.counter, Some(0));
}

#[tokio::test]
async fn close_resets_state_from_every_modal_state() {
    for modal in [
        ModalState::Closed,
        ModalState::Opening,
        ModalState::Processing,
        ModalState::Result,
        ModalState::Failed,
    ] {
        let orchestrator = QuoteOrchestrator::new();
        orchestrator
            .force_state(modal, Some("stale quote".into()))
            .await;

        orchestrator.close().await;

        let state = orchestrator.snapshot().await;
        assert_eq!(state.modal, ModalState::Closed, "from {modal:?}");
        assert_eq!(state.decoded_result, None, "from {modal:?}");
    }
}

#[tokio::test]
async fn successful_generation_matches_decoder_output() {
    let raw = raw_envelope("Stay curious");
    let generation = Arc::new(TestGenerationGateway::ok(raw.clone()));
    let counter = Arc::new(TestCounterGateway::with_sequence(vec![Ok(1)]));
    let orchestrator = QuoteOrchestrator::new_with_gateways(generation, counter);

    orchestrator.open().await;

    let state = orchestrator.snapshot().await;
    assert_eq!(state.modal, ModalState::Result);
    assert_eq!(state.decoded_result, Some(decoder::decode(&raw).unwrap()));
}

#[tokio::test]
async fn generation_success_updates_quote_and_counter() {
    let generation = Arc::new(TestGenerationGateway::ok(raw_envelope("Be the change")));
    let counter = Arc::new(TestCounterGateway::with_sequence(vec![Ok(5), Ok(6)]));
    let orchestrator = QuoteOrchestrator::new_with_gateways(generation, counter);

    orchestrator.refresh_counter().await;
    assert_eq!(orchestrator.snapshot().await.counter, Some(5));

    orchestrator.open().await;

    let state = orchestrator.snapshot().await;
    assert_eq!(state.modal, ModalState::Result);
    assert_eq!(state.decoded_result.as_deref(), Some("Be the change"));
    assert_eq!(state.counter, Some(6));
}

#[tokio::test]
async fn transport_failure_marks_modal_failed() {
    let generation = Arc::new(TestGenerationGateway::failing("connection reset"));
    let counter = Arc::new(TestCounterGateway::with_sequence(vec![Ok(5)]));
    let counter_calls = counter.calls.clone();
    let orchestrator = QuoteOrchestrator::new_with_gateways(generation, counter);

    orchestrator.refresh_counter().await;
    orchestrator.open().await;

    let state = orchestrator.snapshot().await;
    assert_eq!(state.modal, ModalState::Failed);
    assert_eq!(state.decoded_result, None);
    assert_eq!(state.counter, Some(5));
    // The counter is never refreshed after a failed generation.
    assert_eq!(*counter_calls.lock().await, 1);
}

#[tokio::test]
async fn decode_failure_is_treated_like_remote_failure() {
    // Envelope missing its body fails decoding, not transport.
    let generation = Arc::new(TestGenerationGateway::ok(json!({ "statusCode": 200 })));
    let counter = Arc::new(TestCounterGateway::with_sequence(vec![]));
    let orchestrator = QuoteOrchestrator::new_with_gateways(generation, counter);

    orchestrator.open().await;

    let state = orchestrator.snapshot().await;
    assert_eq!(state.modal, ModalState::Failed);
    assert_eq!(state.decoded_result, None);
}

#[tokio::test]
async fn failed_counter_refresh_keeps_previous_value() {
    let counter = Arc::new(TestCounterGateway::with_sequence(vec![
        Ok(5),
        Err("missing quotesGenerated".into()),
    ]));
    let orchestrator =
        QuoteOrchestrator::new_with_gateways(Arc::new(MissingGenerationGateway), counter);

    orchestrator.refresh_counter().await;
    assert_eq!(orchestrator.snapshot().await.counter, Some(5));

    orchestrator.refresh_counter().await;
    assert_eq!(orchestrator.snapshot().await.counter, Some(5));
}

#[tokio::test]
async fn second_open_while_processing_is_a_noop() {
    let gate = Arc::new(Notify::new());
    let generation = Arc::new(TestGenerationGateway::gated(
        raw_envelope("One call only"),
        gate.clone(),
    ));
    let generation_calls = generation.calls.clone();
    let counter = Arc::new(TestCounterGateway::with_sequence(vec![Ok(1)]));
    let orchestrator = QuoteOrchestrator::new_with_gateways(generation, counter);

    let first = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.open().await })
    };
    // Let the first open reach the suspended gateway call.
    while *generation_calls.lock().await == 0 {
        tokio::task::yield_now().await;
    }

    orchestrator.open().await;

    gate.notify_one();
    first.await.unwrap();

    assert_eq!(*generation_calls.lock().await, 1);
    assert_eq!(orchestrator.snapshot().await.modal, ModalState::Result);
}

#[tokio::test]
async fn result_arriving_after_close_is_discarded() {
    let gate = Arc::new(Notify::new());
    let generation = Arc::new(TestGenerationGateway::gated(
        raw_envelope("Too late"),
        gate.clone(),
    ));
    let generation_calls = generation.calls.clone();
    let counter = Arc::new(TestCounterGateway::with_sequence(vec![Ok(9)]));
    let counter_calls = counter.calls.clone();
    let orchestrator = QuoteOrchestrator::new_with_gateways(generation, counter);

    let task = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.open().await })
    };
    while *generation_calls.lock().await == 0 {
        tokio::task::yield_now().await;
    }

    orchestrator.close().await;
    gate.notify_one();
    task.await.unwrap();

    let state = orchestrator.snapshot().await;
    assert_eq!(state.modal, ModalState::Closed);
    assert_eq!(state.decoded_result, None);
    assert_eq!(*counter_calls.lock().await, 0);
}

#[tokio::test]
async fn state_changes_are_broadcast_to_subscribers() {
    let generation = Arc::new(TestGenerationGateway::ok(raw_envelope("Ship it")));
    let counter = Arc::new(TestCounterGateway::with_sequence(vec![Ok(1)]));
    let orchestrator = QuoteOrchestrator::new_with_gateways(generation, counter);
    let mut events = orchestrator.subscribe_events();

    orchestrator.open().await;

    let mut modals = Vec::new();
    while let Ok(OrchestratorEvent::StateChanged(state)) = events.try_recv() {
        modals.push(state.modal);
    }
    // Opening, Processing, Result, then the counter refresh re-publish.
    assert_eq!(
        modals,
        vec![
            ModalState::Opening,
            ModalState::Processing,
            ModalState::Result,
            ModalState::Result,
        ]
    );
}

#[tokio::test]
async fn missing_gateways_fail_the_workflow_gracefully() {
    let orchestrator = QuoteOrchestrator::new();

    orchestrator.open().await;

    let state = orchestrator.snapshot().await;
    assert_eq!(state.modal, ModalState::Failed);
    assert_eq!(state.decoded_result, None);
    assert_eq!(state.counter, Some(0));
}
