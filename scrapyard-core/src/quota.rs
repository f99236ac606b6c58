//! Per-adapter request quotas.
//!
//! Sources that report a remaining-request budget (ScreenScraper reports
//! both successful and failed request allowances) expose it through
//! [`QuotaState`]. Sources without a budget report [`Budget::Unlimited`].
//! A bounded budget that reaches zero is terminal for the adapter instance.

use serde::{Deserialize, Serialize};

/// A single request counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Budget {
    /// The source imposes no limit
    Unlimited,
    /// Requests left before the source refuses further calls
    Remaining(u32),
}

impl Budget {
    /// Convert from the wire convention where `-1` means unlimited.
    /// Other negative values are treated as an exhausted budget.
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            -1 => Self::Unlimited,
            n if n < 0 => Self::Remaining(0),
            n => Self::Remaining(u32::try_from(n).unwrap_or(u32::MAX)),
        }
    }

    /// The wire representation: `-1` for unlimited.
    pub fn as_raw(&self) -> i64 {
        match self {
            Self::Unlimited => -1,
            Self::Remaining(n) => i64::from(*n),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Remaining(0))
    }

    /// Spend `n` requests. Unlimited budgets are unaffected.
    pub fn consume(&mut self, n: u32) {
        if let Self::Remaining(left) = self {
            *left = left.saturating_sub(n);
        }
    }
}

impl std::fmt::Display for Budget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unlimited => write!(f, "unlimited"),
            Self::Remaining(n) => write!(f, "{}", n),
        }
    }
}

/// Request and error budgets of one adapter instance.
///
/// Written only by the adapter after each remote call; the engine reads it
/// between files to decide whether the worker may continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
    pub requests: Budget,
    pub errors: Budget,
}

impl QuotaState {
    pub fn unlimited() -> Self {
        Self {
            requests: Budget::Unlimited,
            errors: Budget::Unlimited,
        }
    }

    /// State of an adapter whose setup failed: no request may be issued.
    pub fn exhausted() -> Self {
        Self {
            requests: Budget::Remaining(0),
            errors: Budget::Unlimited,
        }
    }

    /// True when any bounded counter has reached zero.
    pub fn is_exhausted(&self) -> bool {
        self.requests.is_exhausted() || self.errors.is_exhausted()
    }
}

impl Default for QuotaState {
    fn default() -> Self {
        Self::unlimited()
    }
}

#[cfg(test)]
#[path = "tests/quota_tests.rs"]
mod tests;
