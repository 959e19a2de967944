//! # Reconciliation Rules
//!
//! Pure per-product discrepancy math and the ordered status decision table.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Reconciliation Run (pure part)                   │
//! │                                                                         │
//! │  manual: {code → qty}        pos: {code → qty}                         │
//! │          │                          │                                   │
//! │          └──────────┬───────────────┘                                   │
//! │                     ▼                                                   │
//! │           keys = manual ∪ pos  (BTreeSet, stable order)                │
//! │                     │                                                   │
//! │                     ▼  per key                                          │
//! │           Discrepancy::compute(manual?, pos?)                           │
//! │             difference   = manual - pos        (both present)          │
//! │             diff_percent = round2(diff/pos*100) (pos present, ≠ 0)     │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │           STATUS_RULES (first match wins)                               │
//! │             1. NoCounterpart   → approved                               │
//! │             2. ExactMatch      → approved                               │
//! │             3. WithinTolerance → approved                               │
//! │             4. ZeroBaseline    → pending                                │
//! │             5. OverTolerance   → pending                                │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │           ComparisonLine + ComparisonSummary counters                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::ComparisonStatus;
use crate::validation::validate_tolerance_percent;
use crate::DEFAULT_TOLERANCE_PERCENT;

/// Product code → quantity. Ordered so that runs are reproducible.
pub type QuantityMap = BTreeMap<String, f64>;

/// Builds a [`QuantityMap`]; a code seen twice keeps its last quantity.
pub fn quantity_map<I>(rows: I) -> QuantityMap
where
    I: IntoIterator<Item = (String, f64)>,
{
    rows.into_iter().collect()
}

/// Rounds to two decimal places (half away from zero).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// Tolerance
// =============================================================================

/// A per-store tolerance, as a percentage of the POS quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Tolerance(f64);

impl Tolerance {
    /// Creates a tolerance, rejecting NaN and values outside 0-100.
    pub fn from_percent(percent: f64) -> Result<Self, ValidationError> {
        validate_tolerance_percent(percent)?;
        Ok(Tolerance(percent))
    }

    /// Accepts a tolerance read back from a store's settings. Only NaN,
    /// infinite, and negative values are rejected; a store may be more
    /// lenient than 100%.
    pub fn from_stored(percent: f64) -> Result<Self, ValidationError> {
        let field = "diff_tolerance_percent";
        if !percent.is_finite() {
            return Err(ValidationError::NotFinite {
                field: field.to_string(),
            });
        }
        if percent < 0.0 {
            return Err(ValidationError::Negative {
                field: field.to_string(),
            });
        }
        Ok(Tolerance(percent))
    }

    #[inline]
    pub fn percent(&self) -> f64 {
        self.0
    }

    /// True when `diff_percent` is within this tolerance in either direction.
    #[inline]
    pub fn admits(&self, diff_percent: f64) -> bool {
        diff_percent.abs() <= self.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance(DEFAULT_TOLERANCE_PERCENT)
    }
}

// =============================================================================
// Discrepancy
// =============================================================================

/// The raw numbers for one product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discrepancy {
    pub manual_quantity: Option<f64>,
    pub pos_quantity: Option<f64>,
    pub difference: Option<f64>,
    pub diff_percent: Option<f64>,
}

impl Discrepancy {
    pub fn compute(manual_quantity: Option<f64>, pos_quantity: Option<f64>) -> Self {
        let difference = match (manual_quantity, pos_quantity) {
            (Some(manual), Some(pos)) => Some(manual - pos),
            _ => None,
        };

        let diff_percent = match (difference, pos_quantity) {
            (Some(diff), Some(pos)) if pos != 0.0 => Some(round2(diff / pos * 100.0)),
            _ => None,
        };

        Discrepancy {
            manual_quantity,
            pos_quantity,
            difference,
            diff_percent,
        }
    }

    /// Present only in the manual count.
    pub fn is_manual_only(&self) -> bool {
        self.manual_quantity.is_some() && self.pos_quantity.is_none()
    }

    /// Present only in the POS batch.
    pub fn is_pos_only(&self) -> bool {
        self.manual_quantity.is_none() && self.pos_quantity.is_some()
    }
}

// =============================================================================
// Status Rules
// =============================================================================

/// One row of the status decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StatusRule {
    /// One side has no data, so there is nothing to reconcile against.
    NoCounterpart,
    /// Both sides agree exactly.
    ExactMatch,
    /// The percentage gap is within tolerance.
    WithinTolerance,
    /// The POS reported zero but the count did not; the percentage is undefined.
    ZeroBaseline,
    /// Anything else.
    OverTolerance,
}

/// The decision table, in evaluation order. The first matching rule wins.
pub const STATUS_RULES: [StatusRule; 5] = [
    StatusRule::NoCounterpart,
    StatusRule::ExactMatch,
    StatusRule::WithinTolerance,
    StatusRule::ZeroBaseline,
    StatusRule::OverTolerance,
];

impl StatusRule {
    /// Whether this rule applies. Rules assume earlier rules did not match.
    pub fn matches(&self, d: &Discrepancy, tolerance: Tolerance) -> bool {
        match self {
            StatusRule::NoCounterpart => d.difference.is_none(),
            StatusRule::ExactMatch => d.difference == Some(0.0),
            StatusRule::WithinTolerance => d.diff_percent.is_some_and(|p| tolerance.admits(p)),
            StatusRule::ZeroBaseline => d.pos_quantity == Some(0.0) && d.diff_percent.is_none(),
            StatusRule::OverTolerance => true,
        }
    }

    /// The status this rule assigns.
    pub fn status(&self) -> ComparisonStatus {
        match self {
            StatusRule::NoCounterpart | StatusRule::ExactMatch | StatusRule::WithinTolerance => {
                ComparisonStatus::Approved
            }
            StatusRule::ZeroBaseline | StatusRule::OverTolerance => ComparisonStatus::Pending,
        }
    }
}

/// Runs the decision table.
pub fn classify(d: &Discrepancy, tolerance: Tolerance) -> StatusRule {
    STATUS_RULES
        .iter()
        .copied()
        .find(|rule| rule.matches(d, tolerance))
        .unwrap_or(StatusRule::OverTolerance)
}

// =============================================================================
// Comparison Lines & Summary
// =============================================================================

/// A computed (not yet persisted) comparison row.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonLine {
    pub product_code: String,
    pub product_name: String,
    pub discrepancy: Discrepancy,
    pub rule: StatusRule,
}

impl ComparisonLine {
    pub fn status(&self) -> ComparisonStatus {
        self.rule.status()
    }
}

/// Counters reported by one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ComparisonSummary {
    pub total: usize,
    #[serde(rename = "match")]
    pub exact_match: usize,
    pub within_tolerance: usize,
    pub over_tolerance: usize,
    pub manual_only: usize,
    pub pos_only: usize,
}

impl ComparisonSummary {
    fn tally(&mut self, line: &ComparisonLine) {
        self.total += 1;

        match line.rule {
            StatusRule::ExactMatch => self.exact_match += 1,
            StatusRule::WithinTolerance => self.within_tolerance += 1,
            StatusRule::ZeroBaseline | StatusRule::OverTolerance => self.over_tolerance += 1,
            StatusRule::NoCounterpart => {}
        }

        // Informational tags, independent of the status.
        if line.discrepancy.is_manual_only() {
            self.manual_only += 1;
        }
        if line.discrepancy.is_pos_only() {
            self.pos_only += 1;
        }
    }
}

/// Output of [`build_comparisons`].
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSet {
    pub lines: Vec<ComparisonLine>,
    pub summary: ComparisonSummary,
}

/// Merges both datasets into one line per product code.
///
/// `names` maps codes to display names; codes without a name fall back to
/// the code itself.
pub fn build_comparisons(
    manual: &QuantityMap,
    pos: &QuantityMap,
    names: &BTreeMap<String, String>,
    tolerance: Tolerance,
) -> ComparisonSet {
    let keys: BTreeSet<&String> = manual.keys().chain(pos.keys()).collect();

    let mut summary = ComparisonSummary::default();
    let mut lines = Vec::with_capacity(keys.len());

    for code in keys {
        let discrepancy = Discrepancy::compute(manual.get(code).copied(), pos.get(code).copied());
        let rule = classify(&discrepancy, tolerance);

        let line = ComparisonLine {
            product_code: code.clone(),
            product_name: names.get(code).cloned().unwrap_or_else(|| code.clone()),
            discrepancy,
            rule,
        };

        summary.tally(&line);
        lines.push(line);
    }

    ComparisonSet { lines, summary }
}

// =============================================================================
// Unit Tests
// =============================================================================
