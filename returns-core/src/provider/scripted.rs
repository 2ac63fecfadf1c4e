//! Scripted provider for offline runs and tests.
//!
//! [`ScriptedProvider`] answers from a queue of canned responses and, once
//! the queue is empty, from an optional responder closure. Every request is
//! recorded so tests can assert on exactly what the loop sent.

use super::*;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

type Responder =
    Box<dyn Fn(&CompletionRequest) -> Result<CompletionResponse, ProviderError> + Send + Sync>;

/// A deterministic, in-process [`LlmProvider`].
#[derive(Default)]
pub struct ScriptedProvider {
    queue: Mutex<VecDeque<Result<CompletionResponse, ProviderError>>>,
    responder: Option<Responder>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request (after the queue drains) with `responder`
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<CompletionResponse, ProviderError> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Box::new(responder)),
            ..Self::default()
        }
    }

    /// Queue an arbitrary response or error
    pub fn then(self, response: Result<CompletionResponse, ProviderError>) -> Self {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
        self
    }

    /// Queue a plain-text final answer
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.then(Ok(CompletionResponse::text(text)))
    }

    /// Queue a tool-call request
    pub fn then_tool_calls(self, calls: Vec<ToolCall>) -> Self {
        self.then(Ok(CompletionResponse::tool_calls(calls)))
    }

    /// Queue a provider failure
    pub fn then_error(self, error: ProviderError) -> Self {
        self.then(Err(error))
    }

    /// Every request received so far, oldest first
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let queued = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        let response = match (queued, &self.responder) {
            (Some(response), _) => response,
            (None, Some(responder)) => responder(&request),
            (None, None) => Err(ProviderError::Other("scripted provider has no response left".into())),
        };

        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        response.map(|mut r| {
            if r.model.is_empty() {
                r.model = "scripted".into();
            }
            r
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_queue_then_exhaustion() {
        let provider = ScriptedProvider::new()
            .then_tool_calls(vec![ToolCall::new("c1", "lookup_order", json!({"order_id": "ORD-001"}))])
            .then_text("All done");

        let first = tokio_test::block_on(provider.complete(CompletionRequest::default())).unwrap();
        assert!(first.requests_tools());
        assert_eq!(first.model, "scripted");

        let second = tokio_test::block_on(provider.complete(CompletionRequest::default())).unwrap();
        assert_eq!(second.content.as_deref(), Some("All done"));

        let third = tokio_test::block_on(provider.complete(CompletionRequest::default()));
        assert!(matches!(third, Err(ProviderError::Other(_))));
        assert_eq!(provider.call_count(), 3);
    }

    #[test]
    fn test_responder_sees_request() {
        let provider = ScriptedProvider::from_fn(|req| {
            let last = req
                .messages
                .last()
                .and_then(|m| m.content.clone())
                .unwrap_or_default();
            Ok(CompletionResponse::text(format!("echo: {}", last)))
        });

        let request = CompletionRequest::new(vec![ChatMessage::user("hi")]);
        let response = tokio_test::block_on(provider.complete(request)).unwrap();
        assert_eq!(response.content.as_deref(), Some("echo: hi"));
        assert_eq!(provider.recorded_requests()[0].messages.len(), 1);
    }

    #[test]
    fn test_queued_error_is_returned() {
        let provider = ScriptedProvider::new().then_error(ProviderError::AuthenticationFailed);
        let result = tokio_test::block_on(provider.complete(CompletionRequest::default()));
        assert_eq!(result.unwrap_err(), ProviderError::AuthenticationFailed);
    }
}
