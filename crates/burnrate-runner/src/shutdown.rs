// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C) and cancels a
//! [`CancellationToken`] when either arrives. The pool treats that token as
//! an interrupt: workers stop taking new slots and in-flight calls get the
//! shutdown grace period to finish.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Returns a token cancelled on the first SIGINT or SIGTERM.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), stopping run"),
                        _ = sigterm.recv() => info!("received SIGTERM, stopping run"),
                        _ = token_clone.cancelled() => return,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler, only Ctrl+C will stop the run");
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), stopping run"),
                        _ = token_clone.cancelled() => return,
                    }
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                _ = ctrl_c => info!("received Ctrl+C, stopping run"),
                _ = token_clone.cancelled() => return,
            }
        }

        token_clone.cancel();
        debug!("signal handler completed");
    });

    token
}
