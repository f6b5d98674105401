// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Picking the cost source at startup and refreshing it during the run.

use std::time::Duration;

use burnrate_core::{BillingSource, BurnrateError};
use burnrate_cost::{CostSource, SpendStateFile, Usd};
use tracing::{debug, info, warn};

/// Upper bound on one billing lookup.
pub const BILLING_TIMEOUT: Duration = Duration::from_secs(30);

async fn fetch_month_to_date(billing: &dyn BillingSource) -> Result<Usd, String> {
    match tokio::time::timeout(BILLING_TIMEOUT, billing.month_to_date()).await {
        Ok(Ok(text)) => text
            .parse::<Usd>()
            .map_err(|e| format!("unparseable billing amount `{text}`: {e}")),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!(
            "billing lookup timed out after {}s",
            BILLING_TIMEOUT.as_secs()
        )),
    }
}

/// Build the cost source for a run.
///
/// With a billing source, a successful lookup anchors the run to the
/// month-to-date figure. Otherwise (or if the lookup fails) the run starts
/// from the persisted spend in `state_file`, or zero. A state file that
/// exists but cannot be read is an error: silently starting from zero could
/// spend the target twice.
pub async fn resolve_cost_source(
    billing: Option<&dyn BillingSource>,
    state_file: Option<&SpendStateFile>,
) -> Result<CostSource, BurnrateError> {
    let baseline = match state_file {
        Some(state) => {
            let amount = state.load().await?;
            info!(path = %state.path().display(), accumulated = %amount, "loaded persisted spend");
            amount
        }
        None => Usd::ZERO,
    };

    if let Some(billing) = billing {
        match fetch_month_to_date(billing).await {
            Ok(month_to_date) => {
                info!(
                    source = billing.name(),
                    month_to_date = %month_to_date,
                    "using authoritative billing data"
                );
                return Ok(CostSource::authoritative(month_to_date));
            }
            Err(reason) => {
                warn!(
                    source = billing.name(),
                    reason = %reason,
                    baseline = %baseline,
                    "billing data unavailable at startup, using estimated spend"
                );
            }
        }
    }

    Ok(CostSource::estimated(baseline))
}

/// Refresh the cost source from billing. Degrades it on any failure.
///
/// Returns `false` once the source has degraded and polling should stop.
pub async fn poll_billing(billing: &dyn BillingSource, source: &CostSource) -> bool {
    match fetch_month_to_date(billing).await {
        Ok(amount) => {
            source.observe_billing(amount);
            debug!(source = billing.name(), month_to_date = %amount, "billing refreshed");
            true
        }
        Err(reason) => {
            source.degrade(&reason);
            false
        }
    }
}
