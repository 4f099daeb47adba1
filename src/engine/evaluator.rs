//! Outcome evaluator.
//!
//! Decides, per scan, which horizons have come due and resolves them
//! against a live price. A horizon only resolves when a price was actually
//! obtained; otherwise the record is left exactly as it was.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use tracing::{debug, info, warn};

use crate::pricing::PriceOracle;
use crate::types::{signed_percent, Horizon, ScanRecord};

/// Result of evaluating one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Horizons that resolved during this evaluation.
    pub resolved: Vec<Horizon>,
    /// Horizons that were due but got no price.
    pub deferred: Vec<Horizon>,
}

impl Evaluation {
    pub fn changed(&self) -> bool {
        !self.resolved.is_empty()
    }
}

pub struct OutcomeEvaluator<'a> {
    oracle: &'a dyn PriceOracle,
}

impl<'a> OutcomeEvaluator<'a> {
    pub fn new(oracle: &'a dyn PriceOracle) -> Self {
        Self { oracle }
    }

    /// Resolve every due horizon of `record` as of `now`.
    ///
    /// Each due horizon gets its own price lookup, so a record crossing both
    /// thresholds in one cycle may resolve 24h and 48h at slightly different
    /// prices.
    pub async fn evaluate(&self, record: &mut ScanRecord, now: DateTime<Utc>) -> Evaluation {
        let mut evaluation = Evaluation::default();
        let elapsed = record.elapsed(now);

        for horizon in Horizon::ALL {
            if !record.is_pending(horizon) || elapsed < horizon.delay() {
                continue;
            }

            let Some(price) = self.oracle.fetch(&record.contract_address).await else {
                debug!(token = %record.token, %horizon, "No price, horizon stays pending");
                evaluation.deferred.push(horizon);
                continue;
            };

            let Some(change) = percent_change(record.price_at_scan, price) else {
                warn!(
                    token = %record.token,
                    price_at_scan = %record.price_at_scan,
                    "Cannot compute change from price at scan, horizon stays pending"
                );
                evaluation.deferred.push(horizon);
                continue;
            };

            apply_outcome(record, horizon, change);
            evaluation.resolved.push(horizon);

            info!(
                token = %record.token,
                %horizon,
                price = %price,
                change = format!("{}%", signed_percent(change)),
                correct = ?record.correct,
                "Outcome resolved"
            );
        }

        evaluation
    }
}

/// Percent change from `base` to `current`, two decimals, half away from zero.
/// `None` when `base` isn't a usable reference price.
pub fn percent_change(base: Decimal, current: Decimal) -> Option<Decimal> {
    if base <= Decimal::ZERO {
        return None;
    }
    let mut change = current
        .checked_sub(base)?
        .checked_div(base)?
        .checked_mul(dec!(100))?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    change.rescale(2);
    Some(change)
}

/// Record a resolved horizon. Correctness is only judged at 48h and only for
/// high-conviction scans, where a rise counts as correct.
fn apply_outcome(record: &mut ScanRecord, horizon: Horizon, change: Decimal) {
    match horizon {
        Horizon::H24 => {
            record.outcome_24h = Some(change);
            record.pending_24h = false;
        }
        Horizon::H48 => {
            record.outcome_48h = Some(change);
            record.pending_48h = false;
            if record.is_high_conviction() {
                record.correct = Some(change > Decimal::ZERO);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
