// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted invocation client for deterministic testing.
//!
//! Replies are popped from a FIFO queue. When the queue is empty the
//! fallback reply is returned, which by default is a success reporting
//! 10 input and 20 output tokens.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use burnrate_core::{
    CallError, InvocationClient, InvocationRequest, InvocationResponse, TokenUsage,
};

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum MockReply {
    Ok(InvocationResponse),
    Err(CallError),
    /// Never completes; only cancellation ends the call.
    Hang,
}

impl MockReply {
    pub fn usage(input_tokens: u64, output_tokens: u64) -> Self {
        MockReply::Ok(InvocationResponse::with_usage(
            "mock response",
            TokenUsage::new(input_tokens, output_tokens),
        ))
    }
}

pub struct MockInvoker {
    script: Mutex<VecDeque<MockReply>>,
    fallback: MockReply,
    delay: Duration,
    started: AtomicU64,
    finished: AtomicU64,
    prompts: Mutex<Vec<String>>,
}

impl MockInvoker {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: MockReply::usage(10, 20),
            delay: Duration::ZERO,
            started: AtomicU64::new(0),
            finished: AtomicU64::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every call succeeds with the given usage.
    pub fn with_usage(input_tokens: u64, output_tokens: u64) -> Self {
        Self::new().fallback(MockReply::usage(input_tokens, output_tokens))
    }

    /// Every call fails with `error`.
    pub fn failing(error: CallError) -> Self {
        Self::new().fallback(MockReply::Err(error))
    }

    /// Replies returned in order before the fallback takes over.
    pub fn with_script(script: Vec<MockReply>) -> Self {
        Self {
            script: Mutex::new(VecDeque::from(script)),
            ..Self::new()
        }
    }

    pub fn fallback(mut self, reply: MockReply) -> Self {
        self.fallback = reply;
        self
    }

    /// Simulated latency applied before every reply.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn push(&self, reply: MockReply) {
        self.script.lock().await.push_back(reply);
    }

    /// Calls that reached the mock, including ones still running.
    pub fn calls(&self) -> u64 {
        self.started.load(Ordering::SeqCst)
    }

    /// Calls that returned a reply.
    pub fn completed(&self) -> u64 {
        self.finished.load(Ordering::SeqCst)
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    async fn next_reply(&self) -> MockReply {
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl Default for MockInvoker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InvocationClient for MockInvoker {
    fn name(&self) -> &str {
        "mock-invoker"
    }

    async fn invoke(&self, request: &InvocationRequest) -> Result<InvocationResponse, CallError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(request.prompt.clone());
        let reply = self.next_reply().await;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let result = match reply {
            MockReply::Ok(response) => Ok(response),
            MockReply::Err(error) => Err(error),
            MockReply::Hang => std::future::pending().await,
        };
        self.finished.fetch_add(1, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burnrate_core::CallErrorKind;

    fn request() -> InvocationRequest {
        InvocationRequest {
            prompt: "ping".into(),
            max_output_tokens: 16,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn script_then_fallback() {
        let mock = MockInvoker::with_script(vec![
            MockReply::Err(CallError::throttled("slow down")),
            MockReply::usage(1, 2),
        ]);
        let first = mock.invoke(&request()).await.unwrap_err();
        assert_eq!(first.kind, CallErrorKind::Throttled);
        let second = mock.invoke(&request()).await.unwrap();
        assert_eq!(second.usage, Some(TokenUsage::new(1, 2)));
        let third = mock.invoke(&request()).await.unwrap();
        assert_eq!(third.usage, Some(TokenUsage::new(10, 20)));
        assert_eq!(mock.calls(), 3);
        assert_eq!(mock.completed(), 3);
        assert_eq!(mock.prompts().await, vec!["ping"; 3]);
    }

    #[tokio::test]
    async fn failing_always_fails() {
        let mock = MockInvoker::failing(CallError::auth("denied"));
        for _ in 0..3 {
            assert!(mock.invoke(&request()).await.is_err());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hang_never_completes() {
        let mock = MockInvoker::new().fallback(MockReply::Hang);
        let result =
            tokio::time::timeout(Duration::from_secs(3600), mock.invoke(&request())).await;
        assert!(result.is_err());
        assert_eq!(mock.calls(), 1);
        assert_eq!(mock.completed(), 0);
    }
}
