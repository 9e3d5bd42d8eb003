// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock generative gateway for deterministic testing.
//!
//! `MockGateway` implements `AiGateway` with pre-configured responses,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use intervox_core::{AiGateway, IntervoxError, PromptPart};

/// A mock gateway that returns pre-configured responses.
///
/// Responses are popped from a FIFO queue; when the queue is empty a default
/// "mock response" text is returned. Flipping [`set_failing`] makes every
/// call fail with a backend error, for exercising degraded paths.
///
/// [`set_failing`]: MockGateway::set_failing
pub struct MockGateway {
    responses: Arc<Mutex<VecDeque<String>>>,
    calls: Arc<Mutex<Vec<Vec<PromptPart>>>>,
    failing: AtomicBool,
}

impl MockGateway {
    /// Create a new mock gateway with an empty response queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            failing: AtomicBool::new(false),
        }
    }

    /// Create a mock gateway pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            calls: Arc::new(Mutex::new(Vec::new())),
            failing: AtomicBool::new(false),
        }
    }

    /// Add a response to the end of the queue.
    pub async fn add_response(&self, text: String) {
        self.responses.lock().await.push_back(text);
    }

    /// When set, every `generate` call fails with a backend error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns the prompt parts of every call made so far.
    pub async fn calls(&self) -> Vec<Vec<PromptPart>> {
        self.calls.lock().await.clone()
    }

    async fn next_response(&self) -> String {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock response".to_string())
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiGateway for MockGateway {
    async fn generate(&self, parts: Vec<PromptPart>) -> Result<String, IntervoxError> {
        self.calls.lock().await.push(parts);
        if self.failing.load(Ordering::SeqCst) {
            return Err(IntervoxError::backend("mock gateway is failing"));
        }
        Ok(self.next_response().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn responses_pop_in_order_then_default() {
        let gateway = MockGateway::with_responses(vec!["one".into(), "two".into()]);
        assert_eq!(gateway.generate(vec![]).await.unwrap(), "one");
        assert_eq!(gateway.generate(vec![]).await.unwrap(), "two");
        assert_eq!(gateway.generate(vec![]).await.unwrap(), "mock response");
    }

    #[tokio::test]
    async fn failing_mode_returns_backend_error() {
        let gateway = MockGateway::new();
        gateway.set_failing(true);
        let err = gateway.generate(vec![]).await.unwrap_err();
        assert!(matches!(err, IntervoxError::Backend { .. }));
        gateway.set_failing(false);
        assert!(gateway.generate(vec![]).await.is_ok());
    }

    #[tokio::test]
    async fn calls_are_recorded() {
        let gateway = MockGateway::new();
        gateway
            .generate(vec![PromptPart::text("prompt")])
            .await
            .unwrap();
        let calls = gateway.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0], PromptPart::text("prompt"));
    }
}
