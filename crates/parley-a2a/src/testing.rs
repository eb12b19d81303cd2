//! # Mock Transport for Testing
//!
//! [`MockTransport`] stands in for a remote peer. Outcomes can be queued one
//! by one (`push_*`) or produced by a handler for every call, and every
//! exchange is recorded so tests can assert on what reached the "network".

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::error::{A2aError, A2aResult};
use crate::transport::Transport;
use crate::types::{AgentCard, Artifact, RpcRequest, SendResult};

type Handler = Arc<dyn Fn(&RpcRequest) -> A2aResult<SendResult> + Send + Sync>;

/// A scripted peer that answers from queued outcomes or a handler
pub struct MockTransport {
    endpoint: String,
    card: Option<AgentCard>,
    card_outcomes: Mutex<VecDeque<A2aResult<AgentCard>>>,
    call_outcomes: Mutex<VecDeque<A2aResult<SendResult>>>,
    handler: Option<Handler>,
    delay: Option<Duration>,
    card_fetches: AtomicUsize,
    calls: AtomicUsize,
    requests: Mutex<Vec<RpcRequest>>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("endpoint", &self.endpoint)
            .field("calls", &self.call_count())
            .finish()
    }
}

impl MockTransport {
    /// Create a mock peer at the given endpoint with nothing scripted
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            card: None,
            card_outcomes: Mutex::new(VecDeque::new()),
            call_outcomes: Mutex::new(VecDeque::new()),
            handler: None,
            delay: None,
            card_fetches: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A peer serving `card` whose replies echo the input
    ///
    /// The reply is one text artifact reading `"<label>: <input text>"`.
    pub fn echo(endpoint: impl Into<String>, card: AgentCard, label: impl Into<String>) -> Self {
        let label = label.into();
        Self::new(endpoint).with_card(card).with_handler(move |request| {
            let text = request.params.message.text_content();
            Ok(SendResult {
                artifacts: vec![Artifact::text(
                    format!("{label}-artifact"),
                    format!("{label}: {text}"),
                )],
            })
        })
    }

    /// Card returned by every fetch once queued card outcomes run out
    pub fn with_card(mut self, card: AgentCard) -> Self {
        self.card = Some(card);
        self
    }

    /// Handler producing the outcome of every call once queued outcomes run out
    pub fn with_handler(
        mut self,
        handler: impl Fn(&RpcRequest) -> A2aResult<SendResult> + Send + Sync + 'static,
    ) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Answer every call with the same artifacts
    pub fn with_artifacts(self, artifacts: Vec<Artifact>) -> Self {
        self.with_handler(move |_| {
            Ok(SendResult {
                artifacts: artifacts.clone(),
            })
        })
    }

    /// Answer every call with the same error
    pub fn with_error(self, error: A2aError) -> Self {
        self.with_handler(move |_| Err(error.clone()))
    }

    /// Wait this long before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue the outcome of the next card fetch
    pub fn push_card_result(&self, outcome: A2aResult<AgentCard>) {
        lock(&self.card_outcomes).push_back(outcome);
    }

    /// Queue the outcome of the next call
    pub fn push_result(&self, outcome: A2aResult<SendResult>) {
        lock(&self.call_outcomes).push_back(outcome);
    }

    /// Queue a failed call
    pub fn push_error(&self, error: A2aError) {
        self.push_result(Err(error));
    }

    /// Queue a successful call returning the given artifacts
    pub fn push_artifacts(&self, artifacts: Vec<Artifact>) {
        self.push_result(Ok(SendResult { artifacts }));
    }

    /// Number of card fetches received
    pub fn card_fetches(&self) -> usize {
        self.card_fetches.load(Ordering::SeqCst)
    }

    /// Number of calls received
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in arrival order
    pub fn requests(&self) -> Vec<RpcRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_card(&self) -> A2aResult<AgentCard> {
        self.card_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(outcome) = lock(&self.card_outcomes).pop_front() {
            return outcome;
        }
        self.card.clone().ok_or_else(|| A2aError::NotFound {
            endpoint: self.endpoint.clone(),
        })
    }

    async fn call(&self, request: &RpcRequest) -> A2aResult<SendResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(outcome) = lock(&self.call_outcomes).pop_front() {
            return outcome;
        }
        match &self.handler {
            Some(handler) => handler(request),
            None => Err(A2aError::protocol(
                self.endpoint.clone(),
                "no scripted response",
            )),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgentSkill, Message};

    #[tokio::test]
    async fn test_queued_outcomes_take_priority() {
        let mock = MockTransport::new("mock://a").with_artifacts(vec![Artifact::text("d", "default")]);
        mock.push_error(A2aError::network("mock://a", "down"));

        let request = RpcRequest::message_send(Message::user("hi"));
        assert!(mock.call(&request).await.is_err());
        let result = mock.call(&request).await.unwrap();
        assert_eq!(result.artifacts[0].text_content(), "default");
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_echo_peer() {
        let card = AgentCard::new("echo", "Echo", "mock://echo").with_skill(AgentSkill::new("echo", "Echo"));
        let mock = MockTransport::echo("mock://echo", card, "echo");

        let result = mock
            .call(&RpcRequest::message_send(Message::user("ping")))
            .await
            .unwrap();
        assert_eq!(result.artifacts[0].text_content(), "echo: ping");
        assert_eq!(mock.fetch_card().await.unwrap().id, "echo");
        assert_eq!(mock.card_fetches(), 1);
    }
}
