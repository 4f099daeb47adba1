//! Integration tests: full cycles over temp files with in-memory
//! price and publish collaborators.

mod mocks;
mod cycle;
