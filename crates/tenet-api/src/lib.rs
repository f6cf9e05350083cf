//! JSON REST API for Tenet.
//!
//! Exposes an axum [`Router`] backed by an [`Engine`] over any
//! [`tenet_core::store::BeliefStore`]. Auth, TLS, and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tenet_api::api_router(engine.clone()))
//! ```

pub mod beliefs;
pub mod error;
pub mod ledger;
pub mod meta;
pub mod votes;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use tenet_core::{engine::Engine, store::BeliefStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: Arc<Engine<S>>) -> Router<()>
where
  S: BeliefStore + 'static,
{
  Router::new()
    .route("/health", get(meta::health))
    .route("/topics", get(meta::topics))
    // Votes
    .route("/votes", post(votes::create::<S>))
    .route("/votes/{id}/alert", get(votes::replay::<S>))
    // Ledger
    .route("/ledger", get(ledger::list::<S>))
    .route("/ledger/{topic}", get(ledger::get_one::<S>))
    // Beliefs
    .route("/beliefs", get(beliefs::list::<S>))
    .route("/beliefs/latest", get(beliefs::latest::<S>))
    .with_state(engine)
}
