//! Core engine — the load → evaluate → save → patch → publish cycle.

pub mod evaluator;
pub mod cycle;
