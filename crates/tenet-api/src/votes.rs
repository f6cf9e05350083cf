//! Handlers for `/votes` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/votes` | Body: [`VoteBody`]; returns 201 + `{vote, belief_alert}` |
//! | `GET`  | `/votes/{id}/alert` | The alert the vote received, recomputed |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tenet_core::{
  alert::BeliefAlert,
  engine::Engine,
  store::BeliefStore,
  vote::{Confidence, NewVote, Stance, VoteId},
};

use crate::error::ApiError;

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /votes`.
///
/// Everything after `belief_text` is analyzer output and may be omitted.
#[derive(Debug, Deserialize)]
pub struct VoteBody {
  pub user_id:     String,
  pub topic:       String,
  pub article_id:  String,
  pub stance:      Stance,
  pub belief_text: String,
  pub confidence:  Option<Confidence>,
  pub belief_key:  Option<String>,
  #[serde(default)]
  pub contradicts: Vec<String>,
  pub note:        Option<String>,
  pub claim:       Option<String>,
  #[serde(default)]
  pub conditions:  Vec<String>,
  pub created_at:  Option<DateTime<Utc>>,
}

impl From<VoteBody> for NewVote {
  fn from(b: VoteBody) -> Self {
    NewVote {
      user_id:     b.user_id,
      topic:       b.topic,
      article_id:  b.article_id,
      stance:      b.stance,
      belief_text: b.belief_text,
      confidence:  b.confidence,
      belief_key:  b.belief_key,
      contradicts: b.contradicts,
      note:        b.note,
      claim:       b.claim,
      conditions:  b.conditions,
      created_at:  b.created_at,
    }
  }
}

/// `POST /votes`: returns 201 + the stored vote and its alert.
pub async fn create<S>(
  State(engine): State<Arc<Engine<S>>>,
  Json(body): Json<VoteBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BeliefStore,
{
  let ingested = engine.ingest(body.into()).await?;
  Ok((StatusCode::CREATED, Json(ingested)))
}

// ─── Replay ───────────────────────────────────────────────────────────────────

/// `GET /votes/{id}/alert`
pub async fn replay<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(id): Path<i64>,
) -> Result<Json<BeliefAlert>, ApiError>
where
  S: BeliefStore,
{
  Ok(Json(engine.replay_alert(VoteId(id)).await?))
}
