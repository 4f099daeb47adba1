//! Market price lookups.
//!
//! Defines the `PriceOracle` trait and the DexScreener implementation used
//! to price a token by contract address.

pub mod dexscreener;

use async_trait::async_trait;
use rust_decimal::Decimal;

/// Abstraction over a market-data provider.
///
/// `fetch` never fails: every network, status, or parse problem collapses
/// to `None` and the caller tries again next cycle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Current USD price for the token at `address`, if one is available.
    async fn fetch(&self, address: &str) -> Option<Decimal>;
}
