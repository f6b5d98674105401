// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-point US dollar amounts.
//!
//! Money is held as an integer count of nano-dollars (10^-9 USD) so that
//! summing millions of per-call costs never drifts. A `u64` of nanos covers
//! roughly 18 billion dollars, far above any spend target.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Nano-dollars in one dollar.
pub const NANOS_PER_USD: u64 = 1_000_000_000;

const FRACTION_DIGITS: usize = 9;

/// A non-negative USD amount with nano-dollar resolution.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Usd(u64);

/// Failure to parse a decimal dollar string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseUsdError {
    #[error("empty amount")]
    Empty,
    #[error("negative amount `{0}`")]
    Negative(String),
    #[error("invalid amount `{0}`")]
    Invalid(String),
    #[error("amount `{0}` is too large")]
    Overflow(String),
}

impl Usd {
    pub const ZERO: Usd = Usd(0);

    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub const fn nanos(self) -> u64 {
        self.0
    }

    pub const fn from_dollars(dollars: u64) -> Self {
        Self(dollars.saturating_mul(NANOS_PER_USD))
    }

    /// Convert a configured dollar amount, rounding to the nearest nano.
    ///
    /// Negative and non-finite inputs map to zero; config validation rejects
    /// them before they get here.
    pub fn from_f64(usd: f64) -> Self {
        if !usd.is_finite() || usd <= 0.0 {
            return Self::ZERO;
        }
        let nanos = (usd * NANOS_PER_USD as f64).round();
        if nanos >= u64::MAX as f64 {
            Self(u64::MAX)
        } else {
            Self(nanos as u64)
        }
    }

    /// Lossy conversion for display and JSON output.
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_USD as f64
    }

    pub fn saturating_add(self, other: Usd) -> Usd {
        Usd(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Usd) -> Usd {
        Usd(self.0.saturating_sub(other.0))
    }

    pub fn saturating_mul(self, factor: u64) -> Usd {
        Usd(self.0.saturating_mul(factor))
    }

    /// Scale by a ratio expressed in parts per million, rounding down.
    pub fn scale_ppm(self, ppm: u64) -> Usd {
        let scaled = u128::from(self.0) * u128::from(ppm) / 1_000_000;
        Usd(u64::try_from(scaled).unwrap_or(u64::MAX))
    }
}

impl Add for Usd {
    type Output = Usd;

    fn add(self, other: Usd) -> Usd {
        self.saturating_add(other)
    }
}

impl AddAssign for Usd {
    fn add_assign(&mut self, other: Usd) {
        *self = self.saturating_add(other);
    }
}

impl Sum for Usd {
    fn sum<I: Iterator<Item = Usd>>(iter: I) -> Usd {
        iter.fold(Usd::ZERO, Add::add)
    }
}

/// Six decimal places, truncated: `$6.000000`.
impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / NANOS_PER_USD;
        let micros = (self.0 % NANOS_PER_USD) / 1_000;
        write!(f, "${whole}.{micros:06}")
    }
}

/// Parses plain decimal strings such as `"12.3456"` or `"$0.5"` exactly.
///
/// Digits beyond nano precision are truncated.
impl FromStr for Usd {
    type Err = ParseUsdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix('$').unwrap_or(trimmed);
        if body.is_empty() {
            return Err(ParseUsdError::Empty);
        }
        if body.starts_with('-') {
            return Err(ParseUsdError::Negative(s.to_string()));
        }
        let body = body.strip_prefix('+').unwrap_or(body);

        let (whole, fraction) = match body.split_once('.') {
            Some((w, f)) => (w, f),
            None => (body, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(ParseUsdError::Invalid(s.to_string()));
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole) || !all_digits(fraction) {
            return Err(ParseUsdError::Invalid(s.to_string()));
        }

        let whole_value: u64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| ParseUsdError::Overflow(s.to_string()))?
        };

        let mut fraction_nanos: u64 = 0;
        for (i, digit) in fraction.bytes().take(FRACTION_DIGITS).enumerate() {
            let place = 10u64.pow((FRACTION_DIGITS - 1 - i) as u32);
            fraction_nanos += u64::from(digit - b'0') * place;
        }

        whole_value
            .checked_mul(NANOS_PER_USD)
            .and_then(|n| n.checked_add(fraction_nanos))
            .map(Usd)
            .ok_or_else(|| ParseUsdError::Overflow(s.to_string()))
    }
}
