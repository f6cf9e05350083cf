//! Votes: the fundamental unit of the belief ledger.
//!
//! A vote is an immutable stance a user took on one claim at a point in time.
//! Votes are never updated or deleted; everything the ledger reports is
//! recomputed from the ordered sequence of votes.

use std::{cmp::Ordering, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::topic::Topic;

// ─── Stance ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stance {
  Agree,
  Disagree,
  Unsure,
}

impl Stance {
  /// Agree and disagree commit to a position; unsure does not.
  pub fn is_decisive(self) -> bool { !matches!(self, Self::Unsure) }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Agree => "agree",
      Self::Disagree => "disagree",
      Self::Unsure => "unsure",
    }
  }
}

impl fmt::Display for Stance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Confidence ──────────────────────────────────────────────────────────────

/// How sure the upstream analyzer was when it distilled the belief text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
  Low,
  Medium,
  High,
}

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Store-assigned identifier. Strictly increasing in insertion order, which
/// makes it the tie-breaker for votes sharing a timestamp.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VoteId(pub i64);

impl fmt::Display for VoteId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Stable identifier for a cluster of paraphrased claims within a topic.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BeliefKey(String);

impl BeliefKey {
  pub fn new(key: impl Into<String>) -> Self { Self(key.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for BeliefKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── PreparedVote ────────────────────────────────────────────────────────────

/// A fully resolved vote that has not been appended yet. The store turns it
/// into a [`Vote`] by assigning the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedVote {
  pub user_id:     String,
  pub topic:       Topic,
  pub article_id:  String,
  pub stance:      Stance,
  pub belief_text: String,
  pub belief_key:  BeliefKey,
  pub confidence:  Option<Confidence>,
  /// The user's own note attached to the vote.
  pub note:        Option<String>,
  /// The article claim the vote responded to, verbatim.
  pub claim:       Option<String>,
  /// Conditions or assumptions the analyzer attached to the belief.
  pub conditions:  Vec<String>,
  /// Keys the analyzer flagged as contradicting this vote's claim.
  pub contradicts: Vec<BeliefKey>,
  pub created_at:  DateTime<Utc>,
}

impl PreparedVote {
  pub fn into_vote(self, id: VoteId) -> Vote {
    Vote {
      id,
      user_id: self.user_id,
      topic: self.topic,
      article_id: self.article_id,
      stance: self.stance,
      belief_text: self.belief_text,
      belief_key: self.belief_key,
      confidence: self.confidence,
      note: self.note,
      claim: self.claim,
      conditions: self.conditions,
      contradicts: self.contradicts,
      created_at: self.created_at,
    }
  }
}

// ─── Vote ────────────────────────────────────────────────────────────────────

/// An immutable stance record. Once appended, no field is ever updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
  pub id:          VoteId,
  pub user_id:     String,
  pub topic:       Topic,
  pub article_id:  String,
  pub stance:      Stance,
  pub belief_text: String,
  pub belief_key:  BeliefKey,
  pub confidence:  Option<Confidence>,
  pub note:        Option<String>,
  pub claim:       Option<String>,
  pub conditions:  Vec<String>,
  pub contradicts: Vec<BeliefKey>,
  pub created_at:  DateTime<Utc>,
}

impl Vote {
  /// Position in the total order of a `(user, topic)` stream.
  pub fn sequence(&self) -> (DateTime<Utc>, VoteId) { (self.created_at, self.id) }

  /// Whether `self` comes strictly before `other` in the stream order.
  pub fn precedes(&self, other: &Vote) -> bool {
    self.sequence() < other.sequence()
  }

  /// The vote without its id, as it looked before it was appended.
  pub fn to_prepared(&self) -> PreparedVote {
    PreparedVote {
      user_id:     self.user_id.clone(),
      topic:       self.topic,
      article_id:  self.article_id.clone(),
      stance:      self.stance,
      belief_text: self.belief_text.clone(),
      belief_key:  self.belief_key.clone(),
      confidence:  self.confidence,
      note:        self.note.clone(),
      claim:       self.claim.clone(),
      conditions:  self.conditions.clone(),
      contradicts: self.contradicts.clone(),
      created_at:  self.created_at,
    }
  }
}

/// Order votes oldest → newest, ties broken by id.
pub fn sort_history(votes: &mut [Vote]) {
  votes.sort_by(|a, b| match a.created_at.cmp(&b.created_at) {
    Ordering::Equal => a.id.cmp(&b.id),
    other => other,
  });
}

// ─── NewVote ─────────────────────────────────────────────────────────────────

/// Input to [`crate::engine::Engine::ingest`].
///
/// Topic and belief text arrive raw; the engine validates and resolves them.
/// `created_at` is normally left empty and assigned at ingest.
#[derive(Debug, Clone)]
pub struct NewVote {
  pub user_id:     String,
  pub topic:       String,
  pub article_id:  String,
  pub stance:      Stance,
  pub belief_text: String,
  pub confidence:  Option<Confidence>,
  /// Canonical key proposed by the analyzer, if any.
  pub belief_key:  Option<String>,
  pub contradicts: Vec<String>,
  pub note:        Option<String>,
  pub claim:       Option<String>,
  pub conditions:  Vec<String>,
  pub created_at:  Option<DateTime<Utc>>,
}

impl NewVote {
  /// Convenience constructor with all optional fields empty.
  pub fn new(
    user_id: impl Into<String>,
    topic: impl Into<String>,
    article_id: impl Into<String>,
    stance: Stance,
    belief_text: impl Into<String>,
  ) -> Self {
    Self {
      user_id: user_id.into(),
      topic: topic.into(),
      article_id: article_id.into(),
      stance,
      belief_text: belief_text.into(),
      confidence: None,
      belief_key: None,
      contradicts: Vec::new(),
      note: None,
      claim: None,
      conditions: Vec::new(),
      created_at: None,
    }
  }

  pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
    self.created_at = Some(created_at);
    self
  }

  pub fn contradicting(mut self, key: impl Into<String>) -> Self {
    self.contradicts.push(key.into());
    self
  }
}
