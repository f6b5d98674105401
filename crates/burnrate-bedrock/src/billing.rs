// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Month-to-date Bedrock spend from AWS Cost Explorer.
//!
//! Shells out to `aws ce get-cost-and-usage` so the standard AWS credential
//! chain (profiles, SSO, instance roles) applies without linking an SDK.

use async_trait::async_trait;
use burnrate_config::model::BillingConfig;
use burnrate_core::{BillingSource, BurnrateError};
use burnrate_cost::{ParseUsdError, Usd};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CostExplorerBilling {
    program: String,
    service: String,
}

impl CostExplorerBilling {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            program: "aws".to_string(),
            service: service.into(),
        }
    }

    pub fn from_config(config: &BillingConfig) -> Self {
        Self::new(config.service.clone())
    }

    /// Use a different executable in place of `aws`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn arguments(&self, today: NaiveDate) -> Result<Vec<String>, BurnrateError> {
        let (start, end) = month_to_date_period(today)?;
        let filter = serde_json::json!({
            "Dimensions": {"Key": "SERVICE", "Values": [self.service]}
        });
        Ok(vec![
            "ce".into(),
            "get-cost-and-usage".into(),
            "--time-period".into(),
            format!("Start={start},End={end}"),
            "--granularity".into(),
            "MONTHLY".into(),
            "--metrics".into(),
            "UnblendedCost".into(),
            "--filter".into(),
            filter.to_string(),
            "--output".into(),
            "json".into(),
        ])
    }
}

#[async_trait]
impl BillingSource for CostExplorerBilling {
    fn name(&self) -> &str {
        "cost-explorer"
    }

    async fn month_to_date(&self) -> Result<String, BurnrateError> {
        let args = self.arguments(Utc::now().date_naive())?;
        let output = tokio::process::Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| BurnrateError::Billing {
                message: format!("failed to run `{}`", self.program),
                source: Some(Box::new(e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            return Err(BurnrateError::billing(format!(
                "cost explorer query exited with {exit_code}: {}",
                stderr.trim()
            )));
        }

        let total = parse_cost_and_usage(&output.stdout)?;
        debug!(service = %self.service, total = %total, "cost explorer month-to-date");
        Ok(decimal_string(total))
    }
}

/// `[first of the month, tomorrow)`; Cost Explorer's end date is exclusive.
fn month_to_date_period(today: NaiveDate) -> Result<(NaiveDate, NaiveDate), BurnrateError> {
    let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
        .ok_or_else(|| BurnrateError::Internal(format!("no first day for {today}")))?;
    let end = today
        .succ_opt()
        .ok_or_else(|| BurnrateError::Internal(format!("no day after {today}")))?;
    Ok((start, end))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CostAndUsage {
    #[serde(default)]
    results_by_time: Vec<ResultByTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResultByTime {
    #[serde(default)]
    total: Option<Total>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Total {
    unblended_cost: Option<Metric>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Metric {
    amount: String,
}

/// Sum `UnblendedCost` across every period in a `get-cost-and-usage` reply.
pub fn parse_cost_and_usage(json: &[u8]) -> Result<Usd, BurnrateError> {
    let reply: CostAndUsage = serde_json::from_slice(json).map_err(|e| BurnrateError::Billing {
        message: "unexpected cost explorer output".to_string(),
        source: Some(Box::new(e)),
    })?;

    let mut total = Usd::ZERO;
    for metric in reply
        .results_by_time
        .iter()
        .filter_map(|r| r.total.as_ref())
        .filter_map(|t| t.unblended_cost.as_ref())
    {
        match metric.amount.parse::<Usd>() {
            Ok(amount) => total += amount,
            // Credits and refunds show up as negative amounts.
            Err(ParseUsdError::Negative(_)) => {
                debug!(amount = %metric.amount, "ignoring negative cost amount");
            }
            Err(e) => {
                return Err(BurnrateError::Billing {
                    message: format!("invalid cost amount {:?}", metric.amount),
                    source: Some(Box::new(e)),
                });
            }
        }
    }
    Ok(total)
}

fn decimal_string(amount: Usd) -> String {
    let nanos = amount.nanos();
    format!("{}.{:09}", nanos / 1_000_000_000, nanos % 1_000_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = r#"{
        "GroupDefinitions": [],
        "ResultsByTime": [
            {
                "TimePeriod": {"Start": "2026-10-01", "End": "2026-10-20"},
                "Total": {"UnblendedCost": {"Amount": "12.3456789012", "Unit": "USD"}},
                "Groups": [],
                "Estimated": true
            }
        ],
        "DimensionValueAttributes": []
    }"#;

    #[test]
    fn parses_amount_exactly() {
        let total = parse_cost_and_usage(REPLY.as_bytes()).unwrap();
        assert_eq!(total.nanos(), 12_345_678_901);
        assert_eq!(decimal_string(total), "12.345678901");
    }

    #[test]
    fn sums_multiple_periods() {
        let json = r#"{"ResultsByTime": [
            {"Total": {"UnblendedCost": {"Amount": "1.5", "Unit": "USD"}}},
            {"Total": {"UnblendedCost": {"Amount": "0.25", "Unit": "USD"}}},
            {"Total": {}}
        ]}"#;
        let total = parse_cost_and_usage(json.as_bytes()).unwrap();
        assert_eq!(total, Usd::from_nanos(1_750_000_000));
    }

    #[test]
    fn empty_result_is_zero() {
        let total = parse_cost_and_usage(br#"{"ResultsByTime": []}"#).unwrap();
        assert_eq!(total, Usd::ZERO);
        assert_eq!(decimal_string(total), "0.000000000");
    }

    #[test]
    fn negative_credits_are_ignored() {
        let json = r#"{"ResultsByTime": [
            {"Total": {"UnblendedCost": {"Amount": "2", "Unit": "USD"}}},
            {"Total": {"UnblendedCost": {"Amount": "-0.5", "Unit": "USD"}}}
        ]}"#;
        let total = parse_cost_and_usage(json.as_bytes()).unwrap();
        assert_eq!(total, Usd::from_dollars(2));
    }

    #[test]
    fn malformed_output_is_a_billing_error() {
        assert!(matches!(
            parse_cost_and_usage(b"not json"),
            Err(BurnrateError::Billing { .. })
        ));
        let bad_amount = br#"{"ResultsByTime": [{"Total": {"UnblendedCost": {"Amount": "n/a"}}}]}"#;
        assert!(matches!(
            parse_cost_and_usage(bad_amount),
            Err(BurnrateError::Billing { .. })
        ));
    }

    #[test]
    fn period_runs_from_first_of_month_to_tomorrow() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        let (start, end) = month_to_date_period(today).unwrap();
        assert_eq!(start.to_string(), "2026-02-01");
        assert_eq!(end.to_string(), "2026-03-01");
    }

    #[test]
    fn arguments_filter_on_service() {
        let billing = CostExplorerBilling::new("Amazon Bedrock");
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let args = billing.arguments(today).unwrap();
        assert_eq!(args[0], "ce");
        assert!(args.contains(&"Start=2026-10-01,End=2026-10-20".to_string()));
        let filter = args
            .iter()
            .position(|a| a == "--filter")
            .map(|i| &args[i + 1])
            .unwrap();
        let filter: serde_json::Value = serde_json::from_str(filter).unwrap();
        assert_eq!(filter["Dimensions"]["Values"][0], "Amazon Bedrock");
    }

    #[tokio::test]
    async fn missing_program_is_a_billing_error() {
        let billing =
            CostExplorerBilling::new("Amazon Bedrock").with_program("burnrate-no-such-aws-cli");
        let err = billing.month_to_date().await.unwrap_err();
        assert!(matches!(err, BurnrateError::Billing { .. }));
    }
}
