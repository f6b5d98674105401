// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for burnrate.
//!
//! Two layers: [`CallError`] describes the outcome of one invocation attempt
//! and carries the transient/permanent split the worker pool acts on;
//! [`BurnrateError`] is the process-level error used by setup, storage,
//! billing, and the binary.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Category of a failed invocation attempt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CallErrorKind {
    /// The request did not complete within the client timeout.
    Timeout,
    /// The provider rejected the call with a rate-limit signal.
    Throttled,
    /// 5xx-class provider failure.
    Server,
    /// Connection-level failure (DNS, TLS, reset).
    Network,
    /// Credentials missing, expired, or rejected.
    Auth,
    /// Credentials valid but not allowed to invoke this model.
    PermissionDenied,
    /// The model identifier does not exist or is not enabled in the region.
    ModelNotFound,
    /// The request itself was rejected (validation failure, bad parameters).
    InvalidRequest,
    /// Anything the client could not classify.
    Other,
}

impl CallErrorKind {
    /// Whether an attempt failing with this kind should be retried.
    pub fn is_retriable(self) -> bool {
        matches!(
            self,
            CallErrorKind::Timeout
                | CallErrorKind::Throttled
                | CallErrorKind::Server
                | CallErrorKind::Network
        )
    }
}

/// A failed invocation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct CallError {
    pub kind: CallErrorKind,
    pub message: String,
}

impl CallError {
    pub fn new(kind: CallErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn throttled(message: impl Into<String>) -> Self {
        Self::new(CallErrorKind::Throttled, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(CallErrorKind::Auth, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(CallErrorKind::Server, message)
    }

    /// Transient failures are retried with backoff; everything else stops the pool.
    pub fn retriable(&self) -> bool {
        self.kind.is_retriable()
    }

    pub fn is_throttled(&self) -> bool {
        self.kind == CallErrorKind::Throttled
    }
}

/// The primary process-level error type.
#[derive(Debug, Error)]
pub enum BurnrateError {
    /// Configuration errors (invalid TOML, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Missing credentials or dependencies; fatal before the loop starts.
    #[error("setup error: {message}")]
    Setup { message: String },

    /// An invocation failed in a way the caller chose to surface.
    #[error("invocation error: {0}")]
    Invocation(#[from] CallError),

    /// The billing source could not produce a spend figure.
    #[error("billing error: {message}")]
    Billing {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Reading or writing the persisted spend state failed.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BurnrateError {
    pub fn setup(message: impl Into<String>) -> Self {
        BurnrateError::Setup {
            message: message.into(),
        }
    }

    pub fn billing(message: impl Into<String>) -> Self {
        BurnrateError::Billing {
            message: message.into(),
            source: None,
        }
    }
}
