use std::sync::Arc;

use shared::{domain::ModalState, error::ClientError};
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

pub mod config;
pub mod decoder;
pub mod gateway;

pub use gateway::{
    CounterGateway, GenerationGateway, HttpQuoteGateway, MissingCounterGateway,
    MissingGenerationGateway,
};

/// UI-facing orchestrator state. Owned exclusively by the orchestrator; the
/// presenter only reads snapshots of it.
///
/// `decoded_result` is `Some` only while `modal` is `Result`. `counter` only
/// moves forward through this system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorState {
    pub modal: ModalState,
    pub decoded_result: Option<String>,
    pub counter: Option<u64>,
}

impl Default for OrchestratorState {
    fn default() -> Self {
        Self {
            modal: ModalState::Closed,
            decoded_result: None,
            // Displayed as 0 until the first successful read.
            counter: Some(0),
        }
    }
}

#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    StateChanged(OrchestratorState),
}

struct OrchestratorInner {
    state: OrchestratorState,
    /// Bumped on every `close()`. A generation completion applies only if the
    /// epoch it captured still matches, so a result racing a closed modal is
    /// discarded instead of mutating state.
    epoch: u64,
}

/// Owns the modal/request state and sequences the generation workflow:
/// invoke the generation function, decode its envelope, then refresh the
/// usage counter. Gateway failures are logged here and surfaced only as the
/// `Failed` modal state; nothing propagates to the presenter.
pub struct QuoteOrchestrator {
    generation: Arc<dyn GenerationGateway>,
    counter: Arc<dyn CounterGateway>,
    inner: Mutex<OrchestratorInner>,
    events: broadcast::Sender<OrchestratorEvent>,
}

impl QuoteOrchestrator {
    pub fn new() -> Arc<Self> {
        Self::new_with_gateways(
            Arc::new(MissingGenerationGateway),
            Arc::new(MissingCounterGateway),
        )
    }

    pub fn new_with_gateways(
        generation: Arc<dyn GenerationGateway>,
        counter: Arc<dyn CounterGateway>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(32);
        Arc::new(Self {
            generation,
            counter,
            inner: Mutex::new(OrchestratorInner {
                state: OrchestratorState::default(),
                epoch: 0,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> OrchestratorState {
        self.inner.lock().await.state.clone()
    }

    /// Opens the modal and immediately drives one generation workflow to
    /// completion; there is no separate confirmation step. A second `open()`
    /// while a request is outstanding is a no-op, so at most one generation
    /// is in flight at a time.
    pub async fn open(&self) {
        let epoch = {
            let mut guard = self.inner.lock().await;
            if guard.state.modal.is_busy() {
                info!(modal = ?guard.state.modal, "open ignored; generation already in flight");
                return;
            }
            guard.state.modal = ModalState::Opening;
            guard.state.decoded_result = None;
            self.publish(&guard.state);
            guard.epoch
        };
        self.run_generation(epoch).await;
    }

    /// Closes the modal from any state and clears the decoded result. The
    /// in-flight call, if any, is not cancelled; bumping the epoch makes its
    /// eventual completion inert.
    pub async fn close(&self) {
        let mut guard = self.inner.lock().await;
        guard.epoch += 1;
        guard.state.modal = ModalState::Closed;
        guard.state.decoded_result = None;
        self.publish(&guard.state);
    }

    /// Fetches the usage counter. On failure the previously displayed value
    /// is retained.
    pub async fn refresh_counter(&self) {
        match self.counter.fetch_current().await {
            Ok(count) => {
                let mut guard = self.inner.lock().await;
                guard.state.counter = Some(count);
                self.publish(&guard.state);
            }
            Err(err) => {
                warn!(
                    operation = "quoteQueryName",
                    %err,
                    "counter refresh failed; keeping previous value"
                );
            }
        }
    }

    async fn run_generation(&self, epoch: u64) {
        {
            let mut guard = self.inner.lock().await;
            if guard.epoch != epoch || guard.state.modal != ModalState::Opening {
                return;
            }
            guard.state.modal = ModalState::Processing;
            self.publish(&guard.state);
        }

        let decoded = match self.generation.invoke().await {
            Ok(raw) => match decoder::decode(&raw) {
                Ok(body) => Ok(body),
                Err(err) => {
                    error!(operation = "generateAQuote", %err, raw = %raw, "envelope decode failed");
                    Err(ClientError::from(err))
                }
            },
            Err(err) => {
                error!(operation = "generateAQuote", %err, "generation call failed");
                Err(err)
            }
        };

        match decoded {
            Ok(body) => {
                {
                    let mut guard = self.inner.lock().await;
                    if guard.epoch != epoch {
                        info!(operation = "generateAQuote", "discarding stale generation result");
                        return;
                    }
                    guard.state.modal = ModalState::Result;
                    guard.state.decoded_result = Some(body);
                    self.publish(&guard.state);
                }
                // The counter is refreshed only after a successful decode.
                self.refresh_counter().await;
            }
            Err(_) => {
                let mut guard = self.inner.lock().await;
                if guard.epoch != epoch {
                    return;
                }
                guard.state.modal = ModalState::Failed;
                guard.state.decoded_result = None;
                self.publish(&guard.state);
            }
        }
    }

    fn publish(&self, state: &OrchestratorState) {
        let _ = self
            .events
            .send(OrchestratorEvent::StateChanged(state.clone()));
    }

    #[cfg(test)]
    pub(crate) async fn force_state(&self, modal: ModalState, decoded_result: Option<String>) {
        let mut guard = self.inner.lock().await;
        guard.state.modal = modal;
        guard.state.decoded_result = decoded_result;
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
