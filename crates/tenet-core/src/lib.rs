//! Core types and the belief ledger engine for Tenet.
//!
//! Everything that decides what a vote *means* lives here: key resolution,
//! alert classification, conviction scoring, drift detection and ledger
//! assembly. The scoring functions are pure over an ordered history; only
//! [`engine::Engine`] and the stores hold state.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod alert;
pub mod conviction;
pub mod drift;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod normalize;
pub mod policy;
pub mod resolver;
pub mod store;
pub mod topic;
pub mod vote;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
