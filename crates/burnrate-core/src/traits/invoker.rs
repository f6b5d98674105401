// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invocation client trait for the hosted inference API.

use async_trait::async_trait;

use crate::error::CallError;
use crate::types::{InvocationRequest, InvocationResponse};

/// One opaque call to the inference provider.
///
/// Implementations must not retry internally; the worker pool owns retry,
/// backoff, and the transient/permanent decision via [`CallError::retriable`].
#[async_trait]
pub trait InvocationClient: Send + Sync + 'static {
    /// Human-readable client name used in logs.
    fn name(&self) -> &str;

    /// Sends one prompt and returns the response text and (if reported) token usage.
    async fn invoke(&self, request: &InvocationRequest) -> Result<InvocationResponse, CallError>;
}
