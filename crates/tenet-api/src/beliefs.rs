//! Handlers for `/beliefs` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use tenet_core::{engine::Engine, store::BeliefStore, vote::Vote};

use crate::error::ApiError;

const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub user_id: String,
  /// If set, restrict to one topic.
  pub topic:   Option<String>,
  pub limit:   Option<usize>,
}

/// `GET /beliefs?user_id=<id>[&topic=...][&limit=...]`: newest first.
pub async fn list<S>(
  State(engine): State<Arc<Engine<S>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Vote>>, ApiError>
where
  S: BeliefStore,
{
  let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
  let votes = engine
    .beliefs(&params.user_id, params.topic.as_deref(), limit)
    .await?;
  Ok(Json(votes))
}

#[derive(Debug, Deserialize)]
pub struct LatestParams {
  pub user_id: String,
  pub topic:   String,
}

/// `GET /beliefs/latest?user_id=<id>&topic=<topic>`: `null` when empty.
pub async fn latest<S>(
  State(engine): State<Arc<Engine<S>>>,
  Query(params): Query<LatestParams>,
) -> Result<Json<Option<Vote>>, ApiError>
where
  S: BeliefStore,
{
  Ok(Json(engine.latest(&params.user_id, &params.topic).await?))
}
