//! Scanner track record — outcome resolution for logged scans.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry points.

pub mod config;
pub mod types;
pub mod pricing;
pub mod engine;
pub mod documents;
pub mod storage;
pub mod publish;
