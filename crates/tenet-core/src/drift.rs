//! Drift detection: is the user's position on a topic moving?
//!
//! The newest `N` votes (the recent window) are compared with the `N` before
//! them (the prior window); fewer than `2N` votes never drift that way. A
//! contradiction still standing from a vote in the recent window drifts
//! regardless of history length.

use serde::{Deserialize, Serialize};

use crate::{
  alert::AlertClassifier,
  conviction::{consistency_ratio, majority, round_ratio},
  vote::{Stance, Vote},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftStatus {
  Stable,
  Drifting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drift {
  pub status: DriftStatus,
  /// Empty when stable.
  pub note:   String,
}

impl Drift {
  pub fn stable() -> Self { Self { status: DriftStatus::Stable, note: String::new() } }

  fn drifting(note: String) -> Self { Self { status: DriftStatus::Drifting, note } }

  pub fn is_drifting(&self) -> bool { self.status == DriftStatus::Drifting }
}

/// Compare the recent window of an ordered topic history with the prior one.
///
/// An unresolved conflict raised inside the recent window counts as drift on
/// its own, however short the history.
pub fn detect(history: &[Vote], classifier: &AlertClassifier<'_>) -> Drift {
  let policy = classifier.policy();
  let n = policy.drift_window;
  let len = history.len();
  if n == 0 || len == 0 {
    return Drift::stable();
  }
  let topic = history[len - 1].topic;

  if let Some((newer, older)) = classifier.open_conflict(history)
    && history[len.saturating_sub(n)..].iter().any(|v| v.id == newer.id)
  {
    return Drift::drifting(format!(
      "On {topic} you {} with \"{}\" but also {} with \"{}\", which contradict each other.",
      older.stance, older.belief_text, newer.stance, newer.belief_text
    ));
  }

  let Some(span) = n.checked_mul(2) else {
    return Drift::stable();
  };
  if len < span {
    return Drift::stable();
  }

  let recent = &history[len - n..];
  let prior = &history[len - span..len - n];

  let (Some(old), Some(new)) = (window_majority(prior), window_majority(recent)) else {
    return Drift::stable();
  };

  if old != new {
    return Drift::drifting(format!(
      "Majority stance on {topic} moved from {old} to {new} over the last {span} votes."
    ));
  }

  let before = consistency_ratio(prior, policy.recency_decay).unwrap_or(0.0);
  let after = consistency_ratio(recent, policy.recency_decay).unwrap_or(0.0);
  if round_ratio(before - after) >= policy.drift_consistency_drop {
    return Drift::drifting(format!(
      "Still mostly {new} on {topic}, but consistency fell from {before:.2} to {after:.2}."
    ));
  }

  Drift::stable()
}

fn window_majority(window: &[Vote]) -> Option<Stance> {
  let stances: Vec<Stance> = window.iter().map(|v| v.stance).collect();
  majority(&stances).map(|(stance, _)| stance)
}
