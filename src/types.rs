//! Shared types for the scan tracker.
//!
//! `ScanRecord` is the persisted unit of state. Its serialized field names
//! match the existing `scans.json` format, so the store can be read and
//! written by older tooling without migration.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum conviction for a scan to count toward the accuracy figure.
pub const HIGH_CONVICTION: u8 = 7;

/// Highest conviction score a scan can carry.
pub const MAX_CONVICTION: u8 = 10;

// ---------------------------------------------------------------------------
// Horizon
// ---------------------------------------------------------------------------

/// A fixed checkpoint after the scan at which the outcome is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Horizon {
    H24,
    H48,
}

impl Horizon {
    /// Both horizons, in evaluation order.
    pub const ALL: [Horizon; 2] = [Horizon::H24, Horizon::H48];

    pub fn hours(&self) -> i64 {
        match self {
            Horizon::H24 => 24,
            Horizon::H48 => 48,
        }
    }

    /// Delay after the scan before this horizon becomes due.
    pub fn delay(&self) -> Duration {
        Duration::hours(self.hours())
    }

    /// Label used by the report pages (`data-label="24H"`).
    pub fn label(&self) -> &'static str {
        match self {
            Horizon::H24 => "24H",
            Horizon::H48 => "48H",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h", self.hours())
    }
}

// ---------------------------------------------------------------------------
// ScanRecord
// ---------------------------------------------------------------------------

/// One logged prediction and its resolution state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub token: String,

    /// Chain address; identity for price lookups.
    #[serde(rename = "ca")]
    pub contract_address: String,

    #[serde(rename = "timestamp")]
    pub scan_timestamp: DateTime<Utc>,

    /// 0–10.
    #[serde(rename = "conviction")]
    pub conviction_score: u8,

    #[serde(rename = "priceAtScan")]
    pub price_at_scan: Decimal,

    #[serde(rename = "pending24h")]
    pub pending_24h: bool,

    #[serde(rename = "pending48h")]
    pub pending_48h: bool,

    /// Percent change at 24h, two decimals, stored as a string.
    #[serde(
        rename = "outcome24h",
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::str_option"
    )]
    pub outcome_24h: Option<Decimal>,

    #[serde(
        rename = "outcome48h",
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::str_option"
    )]
    pub outcome_48h: Option<Decimal>,

    /// Only set for high-conviction scans once the 48h horizon resolves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,

    /// Fields written by other tooling, kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ScanRecord {
    /// A freshly logged scan with both horizons pending.
    pub fn new(
        token: &str,
        contract_address: &str,
        conviction_score: u8,
        price_at_scan: Decimal,
        scan_timestamp: DateTime<Utc>,
    ) -> Result<Self, TrackerError> {
        if token.trim().is_empty() {
            return Err(TrackerError::InvalidScan("token must not be empty".into()));
        }
        if contract_address.trim().is_empty() {
            return Err(TrackerError::InvalidScan("contract address must not be empty".into()));
        }
        if conviction_score > MAX_CONVICTION {
            return Err(TrackerError::InvalidScan(format!(
                "conviction {conviction_score} is above {MAX_CONVICTION}"
            )));
        }
        if price_at_scan <= Decimal::ZERO {
            return Err(TrackerError::InvalidScan(format!(
                "price at scan must be positive, got {price_at_scan}"
            )));
        }

        Ok(Self {
            token: token.trim().to_string(),
            contract_address: contract_address.trim().to_string(),
            scan_timestamp,
            conviction_score,
            price_at_scan,
            pending_24h: true,
            pending_48h: true,
            outcome_24h: None,
            outcome_48h: None,
            correct: None,
            extra: serde_json::Map::new(),
        })
    }

    /// Identifier used to address this scan's slots in the report pages.
    pub fn slug(&self) -> String {
        slugify(&self.token)
    }

    pub fn is_pending(&self, horizon: Horizon) -> bool {
        match horizon {
            Horizon::H24 => self.pending_24h,
            Horizon::H48 => self.pending_48h,
        }
    }

    pub fn outcome(&self, horizon: Horizon) -> Option<Decimal> {
        match horizon {
            Horizon::H24 => self.outcome_24h,
            Horizon::H48 => self.outcome_48h,
        }
    }

    /// Resolved outcome for `horizon`, if the horizon is no longer pending.
    pub fn resolved_outcome(&self, horizon: Horizon) -> Option<Decimal> {
        if self.is_pending(horizon) {
            None
        } else {
            self.outcome(horizon)
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending_24h || self.pending_48h
    }

    pub fn is_high_conviction(&self) -> bool {
        self.conviction_score >= HIGH_CONVICTION
    }

    /// Counts toward the accuracy denominator.
    pub fn is_scored(&self) -> bool {
        self.is_high_conviction() && !self.pending_48h
    }

    /// Time elapsed since the scan as of `now`.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        now - self.scan_timestamp
    }
}

impl fmt::Display for ScanRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |h: Horizon| match self.resolved_outcome(h) {
            Some(v) => format!("{}%", signed_percent(v)),
            None => "pending".to_string(),
        };
        write!(
            f,
            "${} {}/10 @ {} (24h: {} | 48h: {})",
            self.token,
            self.conviction_score,
            self.price_at_scan,
            show(Horizon::H24),
            show(Horizon::H48),
        )
    }
}

/// Lowercase the token and drop everything that isn't `[a-z0-9]`.
pub fn slugify(token: &str) -> String {
    token
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// `+10.00` for positive values, plain `Display` otherwise.
pub fn signed_percent(value: Decimal) -> String {
    if value > Decimal::ZERO {
        format!("+{value}")
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Price unavailable for {address}: {reason}")]
    PriceUnavailable { address: String, reason: String },

    #[error("Invalid scan: {0}")]
    InvalidScan(String),

    #[error("Publish failed ({step}): {message}")]
    Publish { step: String, message: String },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
