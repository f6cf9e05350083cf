//! Per-vote alerts: duplicate, conflict, shift or none.
//!
//! Classification is a total function of the new vote and the ordered history
//! before it. Rules are tried in a fixed order and the first match wins:
//!
//! 1. **duplicate**: the latest vote on the same key has the same stance and
//!    is inside the duplicate window;
//! 2. **conflict**: the latest vote on some *other* key is contradictory to
//!    this claim and carries the same decisive stance;
//! 3. **shift**: the latest vote on the same key has a different stance;
//! 4. **none**.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  normalize::{Claim, ClaimNormalizer},
  policy::Policy,
  resolver::CLUSTER_SIMILARITY,
  topic::Topic,
  vote::{BeliefKey, PreparedVote, Vote, VoteId},
};

// ─── Alert ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
  None,
  Duplicate,
  Conflict,
  Shift,
}

/// Returned once per ingested vote; never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeliefAlert {
  #[serde(rename = "type")]
  pub kind:         AlertKind,
  pub message:      String,
  /// The earlier vote the alert was raised against.
  pub related_vote: Option<VoteId>,
}

impl BeliefAlert {
  pub fn none() -> Self {
    Self { kind: AlertKind::None, message: String::new(), related_vote: None }
  }

  fn against(kind: AlertKind, prior: &Vote, message: String) -> Self {
    Self { kind, message, related_vote: Some(prior.id) }
  }
}

// ─── Contradiction oracle ────────────────────────────────────────────────────

/// Pre-resolved judgement of whether two belief keys contradict each other.
///
/// Consulted synchronously; anything that needs a network round trip must be
/// resolved before ingest and handed in as a table.
pub trait ContradictionOracle: Send + Sync {
  /// `None` when the oracle has no opinion on the pair.
  fn contradicts(&self, topic: Topic, a: &BeliefKey, b: &BeliefKey) -> Option<bool>;
}

/// An oracle with no opinion; classification falls back to claim polarity.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOracle;

impl ContradictionOracle for NoOracle {
  fn contradicts(&self, _: Topic, _: &BeliefKey, _: &BeliefKey) -> Option<bool> { None }
}

/// A symmetric set of key pairs known to contradict.
#[derive(Debug, Clone, Default)]
pub struct ContradictionTable {
  pairs: HashSet<(Topic, BeliefKey, BeliefKey)>,
}

impl ContradictionTable {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, topic: Topic, a: BeliefKey, b: BeliefKey) {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    self.pairs.insert((topic, lo, hi));
  }

  pub fn len(&self) -> usize { self.pairs.len() }

  pub fn is_empty(&self) -> bool { self.pairs.is_empty() }
}

impl ContradictionOracle for ContradictionTable {
  fn contradicts(&self, topic: Topic, a: &BeliefKey, b: &BeliefKey) -> Option<bool> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    self
      .pairs
      .contains(&(topic, lo.clone(), hi.clone()))
      .then_some(true)
  }
}

// ─── Classifier ──────────────────────────────────────────────────────────────

pub struct AlertClassifier<'a> {
  normalizer: &'a dyn ClaimNormalizer,
  oracle:     &'a dyn ContradictionOracle,
  policy:     &'a Policy,
}

impl<'a> AlertClassifier<'a> {
  pub fn new(
    normalizer: &'a dyn ClaimNormalizer,
    oracle: &'a dyn ContradictionOracle,
    policy: &'a Policy,
  ) -> Self {
    Self { normalizer, oracle, policy }
  }

  pub fn policy(&self) -> &Policy { self.policy }

  /// Classify `vote` against `history`, which must hold exactly the votes of
  /// the same `(user, topic)` that precede it, oldest first.
  pub fn classify(&self, vote: &PreparedVote, history: &[Vote]) -> BeliefAlert {
    let same_key = history.iter().rev().find(|p| p.belief_key == vote.belief_key);

    if let Some(prior) = same_key
      && prior.stance == vote.stance
      && vote.created_at - prior.created_at <= self.policy.duplicate_window()
    {
      let message = format!(
        "You already recorded {} on this belief at {}.",
        vote.stance,
        stamp(prior.created_at)
      );
      return BeliefAlert::against(AlertKind::Duplicate, prior, message);
    }

    if let Some(prior) = self.find_conflict(vote, history) {
      let message = format!(
        "Voting {} here contradicts your earlier {} on \"{}\" ({}).",
        vote.stance,
        prior.stance,
        prior.belief_text,
        stamp(prior.created_at)
      );
      return BeliefAlert::against(AlertKind::Conflict, prior, message);
    }

    if let Some(prior) = same_key
      && prior.stance != vote.stance
    {
      let message = format!(
        "You moved from {} to {} on this belief since {}.",
        prior.stance,
        vote.stance,
        stamp(prior.created_at)
      );
      return BeliefAlert::against(AlertKind::Shift, prior, message);
    }

    BeliefAlert::none()
  }

  /// Recompute the alert of an already stored vote from a topic history that
  /// may also contain later votes.
  pub fn replay(&self, vote: &Vote, history: &[Vote]) -> BeliefAlert {
    let prior: Vec<Vote> =
      history.iter().filter(|p| p.precedes(vote)).cloned().collect();
    self.classify(&vote.to_prepared(), &prior)
  }

  /// Latest vote on another key that contradicts `vote` with the same
  /// decisive stance, newest first.
  fn find_conflict<'h>(&self, vote: &PreparedVote, history: &'h [Vote]) -> Option<&'h Vote> {
    if !vote.stance.is_decisive() {
      return None;
    }

    let stated = Stated {
      key:         &vote.belief_key,
      contradicts: &vote.contradicts,
      text:        representative(history, &vote.belief_key).unwrap_or(&vote.belief_text),
    };
    let mut seen: HashSet<&BeliefKey> = HashSet::new();
    for prior in history.iter().rev() {
      if prior.belief_key == vote.belief_key || !seen.insert(&prior.belief_key) {
        continue;
      }
      if prior.stance == vote.stance
        && self.contradictory(vote.topic, &stated, &Stated::of(prior, history))
      {
        return Some(prior);
      }
    }
    None
  }

  /// The newest pair of keys whose latest votes still contradict each other
  /// with the same decisive stance, as `(newer, older)`.
  ///
  /// A later vote that changes the stance on either key resolves the pair.
  pub fn open_conflict<'h>(&self, history: &'h [Vote]) -> Option<(&'h Vote, &'h Vote)> {
    let mut seen: HashSet<&BeliefKey> = HashSet::new();
    let latest: Vec<&Vote> = history
      .iter()
      .rev()
      .filter(|v| seen.insert(&v.belief_key))
      .collect();

    for (i, newer) in latest.iter().enumerate() {
      if !newer.stance.is_decisive() {
        continue;
      }
      let stated = Stated::of(newer, history);
      for older in &latest[i + 1..] {
        if older.stance == newer.stance
          && self.contradictory(newer.topic, &stated, &Stated::of(older, history))
        {
          return Some((*newer, *older));
        }
      }
    }
    None
  }

  /// Analyzer hints on either side, then the oracle, then opposite polarity
  /// over the keys' representative texts.
  fn contradictory(&self, topic: Topic, a: &Stated<'_>, b: &Stated<'_>) -> bool {
    if a.contradicts.contains(b.key) || b.contradicts.contains(a.key) {
      return true;
    }
    match self.oracle.contradicts(topic, a.key, b.key) {
      Some(verdict) => verdict,
      None => self
        .claim(a.text)
        .contradicts(&self.claim(b.text), CLUSTER_SIMILARITY),
    }
  }

  fn claim(&self, text: &str) -> Claim {
    Claim::analyze(&self.normalizer.normalize(text))
  }
}

/// One side of a contradiction check.
struct Stated<'v> {
  key:         &'v BeliefKey,
  contradicts: &'v [BeliefKey],
  text:        &'v str,
}

impl<'v> Stated<'v> {
  fn of(vote: &'v Vote, history: &'v [Vote]) -> Self {
    Self {
      key:         &vote.belief_key,
      contradicts: &vote.contradicts,
      text:        representative(history, &vote.belief_key).unwrap_or(&vote.belief_text),
    }
  }
}

/// Text of the first vote on `key`, which is the cluster's representative.
fn representative<'h>(history: &'h [Vote], key: &BeliefKey) -> Option<&'h str> {
  history
    .iter()
    .find(|v| &v.belief_key == key)
    .map(|v| v.belief_text.as_str())
}

fn stamp(at: DateTime<Utc>) -> String { at.format("%Y-%m-%d %H:%M UTC").to_string() }
