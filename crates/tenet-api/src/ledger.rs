//! Handlers for `/ledger` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/ledger` | `?user_id` required; one row per topic |
//! | `GET`  | `/ledger/{topic}` | `?user_id` required; a single row |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use tenet_core::{engine::Engine, ledger::LedgerRow, store::BeliefStore};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LedgerParams {
  pub user_id: String,
}

/// `GET /ledger?user_id=<id>`
pub async fn list<S>(
  State(engine): State<Arc<Engine<S>>>,
  Query(params): Query<LedgerParams>,
) -> Result<Json<Vec<LedgerRow>>, ApiError>
where
  S: BeliefStore,
{
  Ok(Json(engine.ledger(&params.user_id).await?))
}

/// `GET /ledger/{topic}?user_id=<id>`
pub async fn get_one<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(topic): Path<String>,
  Query(params): Query<LedgerParams>,
) -> Result<Json<LedgerRow>, ApiError>
where
  S: BeliefStore,
{
  Ok(Json(engine.ledger_row(&params.user_id, &topic).await?))
}
