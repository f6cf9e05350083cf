//! Error types for `tenet-core`.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::topic::Topic;

#[derive(Debug, Error)]
pub enum Error {
  #[error("belief text is empty after normalization")]
  InvalidBeliefText,

  #[error("unknown topic: {0:?}")]
  UnknownTopic(String),

  #[error("user id is required")]
  MissingUserId,

  /// A caller-supplied timestamp is older than the newest stored vote in the
  /// same `(user, topic)` stream. Such votes are rejected, never re-sequenced.
  #[error(
    "vote for {user_id:?} on {topic} at {attempted} is older than the latest \
     stored vote at {latest}"
  )]
  OutOfOrderVote {
    user_id:   String,
    topic:     Topic,
    attempted: DateTime<Utc>,
    latest:    DateTime<Utc>,
  },

  /// A policy value is outside the range the scorer and detector accept.
  #[error("invalid policy: {0}")]
  InvalidPolicy(String),

  #[error("vote not found: {0}")]
  VoteNotFound(i64),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error into [`Error::Store`].
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  /// Whether the error is a rejected input rather than a backend failure.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::InvalidBeliefText | Self::UnknownTopic(_) | Self::MissingUserId
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
