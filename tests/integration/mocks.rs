//! Mock collaborators for integration testing.
//!
//! Deterministic `PriceOracle` and `SyncPublisher` implementations that
//! keep all state in memory and record every call.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use scan_outcomes::pricing::PriceOracle;
use scan_outcomes::publish::SyncPublisher;

/// Fixed prices per address; unknown addresses are unavailable.
#[derive(Clone, Default)]
pub struct MockOracle {
    prices: Arc<Mutex<HashMap<String, Decimal>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(self, address: &str, price: Decimal) -> Self {
        self.set_price(address, price);
        self
    }

    pub fn set_price(&self, address: &str, price: Decimal) {
        self.prices.lock().unwrap().insert(address.to_string(), price);
    }

    /// Make `address` unavailable again.
    pub fn clear_price(&self, address: &str) {
        self.prices.lock().unwrap().remove(address);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceOracle for MockOracle {
    async fn fetch(&self, address: &str) -> Option<Decimal> {
        self.calls.lock().unwrap().push(address.to_string());
        self.prices.lock().unwrap().get(address).copied()
    }
}

/// A published batch.
#[derive(Debug, Clone)]
pub struct Publication {
    pub files: Vec<PathBuf>,
    pub message: String,
}

#[derive(Clone, Default)]
pub struct MockPublisher {
    publications: Arc<Mutex<Vec<Publication>>>,
    /// If set, every publish returns this error.
    force_error: Arc<Mutex<Option<String>>>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    pub fn publications(&self) -> Vec<Publication> {
        self.publications.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncPublisher for MockPublisher {
    async fn publish(&self, files: &[PathBuf], message: &str) -> Result<()> {
        if let Some(err) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{}", err));
        }
        self.publications.lock().unwrap().push(Publication {
            files: files.to_vec(),
            message: message.to_string(),
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
