//! Conviction scoring: how internally consistent a user's stances are.
//!
//! Conviction never measures whether a stance is *right*; it only looks at
//! whether the user keeps taking the same stance on the same claim.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::vote::{BeliefKey, Stance, Vote};

/// Votes needed before a topic gets a conviction level.
pub const MIN_EVIDENCE: usize = 3;

const HIGH_THRESHOLD: f64 = 0.8;
const MEDIUM_THRESHOLD: f64 = 0.5;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Conviction {
  Low,
  Medium,
  High,
}

impl Conviction {
  /// Bands are inclusive on their lower bound.
  pub fn from_ratio(ratio: f64) -> Self {
    if ratio >= HIGH_THRESHOLD {
      Self::High
    } else if ratio >= MEDIUM_THRESHOLD {
      Self::Medium
    } else {
      Self::Low
    }
  }
}

impl fmt::Display for Conviction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Low => "Low",
      Self::Medium => "Medium",
      Self::High => "High",
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvictionScore {
  /// `None` while there are fewer than [`MIN_EVIDENCE`] votes.
  pub conviction:     Option<Conviction>,
  pub evidence_count: usize,
  pub consistency:    Option<f64>,
}

impl ConvictionScore {
  pub fn enough_data(&self) -> bool { self.evidence_count >= MIN_EVIDENCE }
}

/// Score an ordered topic history.
pub fn score(history: &[Vote], recency_decay: f64) -> ConvictionScore {
  let evidence_count = history.len();
  if evidence_count < MIN_EVIDENCE {
    return ConvictionScore { conviction: None, evidence_count, consistency: None };
  }
  let consistency = consistency_ratio(history, recency_decay);
  ConvictionScore {
    conviction: consistency.map(Conviction::from_ratio),
    evidence_count,
    consistency,
  }
}

/// Weighted share of votes agreeing with their cluster's majority stance.
///
/// Each cluster contributes its plain majority fraction, weighted by the sum
/// of `decay^rank` over its votes (rank 0 = newest), so old inconsistency
/// fades as newer votes arrive. `None` for an empty slice.
pub fn consistency_ratio(votes: &[Vote], recency_decay: f64) -> Option<f64> {
  let n = votes.len();
  if n == 0 {
    return None;
  }

  let mut clusters: BTreeMap<&BeliefKey, (Vec<Stance>, f64)> = BTreeMap::new();
  for (i, vote) in votes.iter().enumerate() {
    let rank = (n - 1 - i) as i32;
    let entry = clusters.entry(&vote.belief_key).or_default();
    entry.0.push(vote.stance);
    entry.1 += recency_decay.powi(rank);
  }

  let (mut weighted, mut total) = (0.0, 0.0);
  for (stances, weight) in clusters.values() {
    let Some((_, count)) = majority(stances) else { continue };
    weighted += weight * count as f64 / stances.len() as f64;
    total += weight;
  }
  if total == 0.0 {
    return None;
  }
  Some(round_ratio(weighted / total))
}

/// The most frequent stance and its count. Count ties go to the stance that
/// appeared most recently.
pub fn majority(stances: &[Stance]) -> Option<(Stance, usize)> {
  let mut best: Option<(Stance, usize, usize)> = None;
  for stance in [Stance::Agree, Stance::Disagree, Stance::Unsure] {
    let count = stances.iter().filter(|s| **s == stance).count();
    let Some(last) = stances.iter().rposition(|s| *s == stance) else { continue };
    if best.is_none_or(|(_, c, l)| (count, last) > (c, l)) {
      best = Some((stance, count, last));
    }
  }
  best.map(|(stance, count, _)| (stance, count))
}

/// Round to six decimals so band boundaries like `4/5` land exactly.
pub(crate) fn round_ratio(r: f64) -> f64 { (r * 1e6).round() / 1e6 }
