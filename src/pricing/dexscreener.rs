//! DexScreener token price lookup.
//!
//! API: `GET https://api.dexscreener.com/latest/dex/tokens/{address}`
//! Auth: none. Returns every trading pair the token appears in; each pair
//! carries a `chainId` and a string `priceUsd`.
//!
//! One request per call, no retries. A token that trades on several chains
//! is priced from the reference-chain pair when present, otherwise from the
//! first pair returned.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::{debug, warn};

use super::PriceOracle;
use crate::config::OracleConfig;
use crate::types::TrackerError;

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

/// `/latest/dex/tokens/{address}` body. `pairs` is `null` for unknown tokens.
#[derive(Debug, Deserialize)]
struct TokensResponse {
    #[serde(default)]
    pairs: Option<Vec<Pair>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pair {
    #[serde(default)]
    chain_id: String,
    /// Decimal string, e.g. `"0.00001234"`.
    #[serde(default)]
    price_usd: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct DexScreenerClient {
    http: Client,
    base_url: String,
    reference_chain: String,
}

impl DexScreenerClient {
    pub fn new(config: &OracleConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent("scan-outcomes/0.1.0");
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .context("Failed to build HTTP client for DexScreener")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            reference_chain: config.reference_chain.clone(),
        })
    }

    fn token_url(&self, address: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(address))
    }

    /// Single lookup; every failure is reported as `PriceUnavailable`.
    pub async fn try_fetch(&self, address: &str) -> Result<Decimal, TrackerError> {
        let unavailable = |reason: String| TrackerError::PriceUnavailable {
            address: address.to_string(),
            reason,
        };

        let url = self.token_url(address);
        debug!(url = %url, "Fetching DexScreener price");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(unavailable(format!("HTTP {}", resp.status())));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| unavailable(format!("failed to read body: {e}")))?;

        parse_price(&body, &self.reference_chain).map_err(|e| unavailable(format!("{e:#}")))
    }
}

/// Pick the price out of a tokens response body.
fn parse_price(body: &str, reference_chain: &str) -> Result<Decimal> {
    let parsed: TokensResponse =
        serde_json::from_str(body).context("Failed to parse DexScreener response")?;

    let pairs = parsed.pairs.unwrap_or_default();
    let pair = pairs
        .iter()
        .find(|p| p.chain_id == reference_chain)
        .or_else(|| pairs.first())
        .context("No trading pairs returned")?;

    let raw = pair
        .price_usd
        .as_deref()
        .context(format!("Pair on {} has no priceUsd", pair.chain_id))?;

    let price = Decimal::from_str(raw.trim())
        .or_else(|_| Decimal::from_scientific(raw.trim()))
        .with_context(|| format!("Unparseable priceUsd: {raw}"))?;

    if price <= Decimal::ZERO {
        anyhow::bail!("Non-positive priceUsd: {raw}");
    }

    Ok(price)
}

// ---------------------------------------------------------------------------
// PriceOracle trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl PriceOracle for DexScreenerClient {
    async fn fetch(&self, address: &str) -> Option<Decimal> {
        match self.try_fetch(address).await {
            Ok(price) => {
                debug!(address, price = %price, "DexScreener price");
                Some(price)
            }
            Err(e) => {
                warn!(error = %e, "Price lookup failed, will retry next cycle");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
