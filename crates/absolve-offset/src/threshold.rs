//! Spending ceiling derivation and the purchase decision.
//!
//! Pure computation, no I/O. Two optional limits may be configured: an
//! absolute ceiling in cents and a percentage of gross margin. The percentage
//! is mapped into cents with a fixed business constant. When both are present
//! the tighter one wins. When neither is present there is no ceiling at all.

use std::fmt;

use serde::Serialize;

/// Cents per percentage point of margin.
pub const PERCENT_SCALE: f64 = 2000.0;

/// Percent limits below this are treated as unset.
pub const NEGLIGIBLE_PERCENT: f64 = 0.001;

/// Effective spending ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ceiling {
    /// No limit configured; cost alone never rejects.
    Unlimited,
    /// Costs at or above this many cents are rejected.
    Cents(f64),
}

impl Ceiling {
    /// Strict comparison: a cost equal to the ceiling is not allowed.
    pub fn allows(&self, cost_cents: u64) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Cents(limit) => (cost_cents as f64) < *limit,
        }
    }
}

impl fmt::Display for Ceiling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => f.write_str("unlimited"),
            Self::Cents(limit) => write!(f, "{}", limit),
        }
    }
}

/// Whether a percent limit should be considered at all.
pub fn is_negligible_percent(percent: f64) -> bool {
    percent < NEGLIGIBLE_PERCENT
}

/// Derive the effective ceiling from the configured limits.
pub fn derive_ceiling(absolute: Option<f64>, percent: Option<f64>) -> Ceiling {
    let percent = percent.filter(|p| !is_negligible_percent(*p));
    match (absolute, percent) {
        (Some(absolute), None) => Ceiling::Cents(absolute),
        (None, Some(percent)) => Ceiling::Cents(percent * PERCENT_SCALE),
        (Some(absolute), Some(percent)) => Ceiling::Cents(absolute.min(percent * PERCENT_SCALE)),
        (None, None) => Ceiling::Unlimited,
    }
}

/// Result of checking an estimate against the ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdDecision {
    /// Cost is strictly below the ceiling.
    Approved,
    /// Thresholds were explicitly switched off.
    Bypassed,
    Rejected,
}

impl ThresholdDecision {
    pub fn is_approved(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// Decide whether an estimate may be converted into a purchase.
pub fn evaluate(cost_cents: u64, ceiling: Ceiling, use_thresholds: bool) -> ThresholdDecision {
    if !use_thresholds {
        ThresholdDecision::Bypassed
    } else if ceiling.allows(cost_cents) {
        ThresholdDecision::Approved
    } else {
        ThresholdDecision::Rejected
    }
}
