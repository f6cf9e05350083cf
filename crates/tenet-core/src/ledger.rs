//! Ledger rows: the per-topic read model shown to the user.
//!
//! Rows are never stored. [`build`] recomputes one from the topic's ordered
//! history on every read.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  alert::AlertClassifier,
  conviction::{self, Conviction},
  drift::{self, Drift},
  topic::Topic,
  vote::{BeliefKey, Stance, Vote},
};

/// Overall lean across every decisive vote on the topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionLabel {
  #[serde(rename = "leans agree")]
  LeansAgree,
  #[serde(rename = "leans disagree")]
  LeansDisagree,
  #[serde(rename = "mixed/conditional")]
  Mixed,
  #[serde(rename = "unclear")]
  Unclear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
  pub topic:                  Topic,
  /// Absent until the topic has enough evidence.
  pub conviction:             Option<Conviction>,
  pub evidence_count:         usize,
  pub enough_data:            bool,
  pub position_label:         PositionLabel,
  pub summary:                String,
  pub drift:                  Drift,
  pub top_themes:             Vec<String>,
  /// The most recent vote behind each entry of `top_themes`, in the same
  /// order.
  pub representative_beliefs: Vec<Vote>,
  pub last_updated:           Option<DateTime<Utc>>,
}

/// Build the row for `topic` from its ordered history.
///
/// The classifier supplies the policy and the contradiction relation the
/// drift detector checks standing conflicts with.
pub fn build(topic: Topic, history: &[Vote], classifier: &AlertClassifier<'_>) -> LedgerRow {
  let policy = classifier.policy();
  let score = conviction::score(history, policy.recency_decay);
  let last_updated = history.last().map(|v| v.created_at);
  let position_label = position_label(history);

  let Some(level) = score.conviction else {
    return LedgerRow {
      topic,
      conviction: None,
      evidence_count: score.evidence_count,
      enough_data: false,
      position_label,
      summary: String::new(),
      drift: Drift::stable(),
      top_themes: Vec::new(),
      representative_beliefs: Vec::new(),
      last_updated,
    };
  };

  let drift = drift::detect(history, classifier);
  let (top_themes, representative_beliefs) = themes(history, policy.max_themes);

  LedgerRow {
    topic,
    conviction: Some(level),
    evidence_count: score.evidence_count,
    enough_data: score.enough_data(),
    position_label,
    summary: summary(level, score.evidence_count, &drift),
    drift,
    top_themes,
    representative_beliefs,
    last_updated,
  }
}

fn summary(level: Conviction, evidence_count: usize, drift: &Drift) -> String {
  let consistency = match level {
    Conviction::High => "mostly consistent",
    Conviction::Medium => "partly consistent",
    Conviction::Low => "often inconsistent",
  };
  let mut out = format!("{level} conviction from {evidence_count} votes, {consistency}.");
  if drift.is_drifting() {
    out.push_str(" Recent votes suggest your position is drifting.");
  }
  out
}

struct Theme<'h> {
  representative: &'h str,
  count:          usize,
  latest:         usize,
}

/// Most frequent keys first, ties to the most recently used key.
fn themes(history: &[Vote], limit: usize) -> (Vec<String>, Vec<Vote>) {
  let mut by_key: HashMap<&BeliefKey, Theme<'_>> = HashMap::new();
  for (i, vote) in history.iter().enumerate() {
    by_key
      .entry(&vote.belief_key)
      .and_modify(|t| {
        t.count += 1;
        t.latest = i;
      })
      .or_insert(Theme { representative: &vote.belief_text, count: 1, latest: i });
  }

  let mut ranked: Vec<Theme<'_>> = by_key.into_values().collect();
  ranked.sort_by(|a, b| b.count.cmp(&a.count).then(b.latest.cmp(&a.latest)));
  ranked.truncate(limit);

  ranked
    .into_iter()
    .map(|t| (t.representative.to_owned(), history[t.latest].clone()))
    .unzip()
}

fn position_label(history: &[Vote]) -> PositionLabel {
  let agree = history.iter().filter(|v| v.stance == Stance::Agree).count();
  let disagree = history.iter().filter(|v| v.stance == Stance::Disagree).count();
  let decisive = agree + disagree;
  if decisive == 0 {
    PositionLabel::Unclear
  } else if agree * 3 >= decisive * 2 {
    PositionLabel::LeansAgree
  } else if disagree * 3 >= decisive * 2 {
    PositionLabel::LeansDisagree
  } else {
    PositionLabel::Mixed
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    alert::NoOracle,
    normalize::TokenNormalizer,
    policy::Policy,
    testing::{at, run, vote},
  };

  fn row(history: &[Vote]) -> LedgerRow {
    let policy = Policy::default();
    build(Topic::Trade, history, &AlertClassifier::new(&TokenNormalizer, &NoOracle, &policy))
  }

  #[test]
  fn thin_history_has_no_conviction_fields() {
    let h = run(1, 0, 2, Stance::Agree, "tariffs help workers");
    let r = row(&h);
    assert_eq!(r.evidence_count, 2);
    assert!(!r.enough_data);
    assert_eq!(r.conviction, None);
    assert!(r.summary.is_empty());
    assert!(r.top_themes.is_empty());
    assert!(r.representative_beliefs.is_empty());
    assert_eq!(r.last_updated, Some(at(1)));
  }

  #[test]
  fn empty_history_is_unclear() {
    let r = row(&[]);
    assert_eq!(r.evidence_count, 0);
    assert_eq!(r.position_label, PositionLabel::Unclear);
    assert_eq!(r.last_updated, None);
  }

  #[test]
  fn summary_is_templated_from_conviction() {
    let h = run(1, 0, 3, Stance::Agree, "tariffs help workers");
    let r = row(&h);
    assert_eq!(r.conviction, Some(Conviction::High));
    assert_eq!(r.summary, "High conviction from 3 votes, mostly consistent.");
    assert_eq!(r.position_label, PositionLabel::LeansAgree);
  }

  #[test]
  fn themes_rank_by_frequency_then_recency() {
    let mut h = run(1, 0, 3, Stance::Agree, "tariffs help workers");
    h.push(vote(4, Stance::Disagree, "quotas protect steel", at(3)));
    h.push(vote(5, Stance::Agree, "free trade lowers prices", at(4)));
    // The fixture lower-cases keys, so this joins the first cluster.
    h.push(vote(6, Stance::Agree, "Tariffs help workers", at(5)));
    let r = row(&h);
    assert_eq!(
      r.top_themes,
      vec!["tariffs help workers", "free trade lowers prices", "quotas protect steel"]
    );
    let ids: Vec<i64> = r.representative_beliefs.iter().map(|v| v.id.0).collect();
    assert_eq!(ids, vec![6, 5, 4]);
  }

  #[test]
  fn themes_are_capped_by_policy() {
    let h: Vec<Vote> = (0..6)
      .map(|i| vote(i + 1, Stance::Agree, &format!("claim number {i}"), at(i)))
      .collect();
    let r = row(&h);
    assert_eq!(r.top_themes.len(), 4);
    assert_eq!(r.top_themes[0], "claim number 5");
  }

  #[test]
  fn position_label_reflects_decisive_share() {
    let mut h = run(1, 0, 2, Stance::Agree, "a b");
    h.extend(run(3, 2, 2, Stance::Disagree, "c d"));
    h.push(vote(5, Stance::Unsure, "e f", at(9)));
    assert_eq!(row(&h).position_label, PositionLabel::Mixed);

    let h = run(1, 0, 3, Stance::Disagree, "c d");
    assert_eq!(row(&h).position_label, PositionLabel::LeansDisagree);
  }

  #[test]
  fn build_is_deterministic() {
    let mut h = run(1, 0, 6, Stance::Agree, "tariffs help workers");
    h.extend(run(7, 6, 5, Stance::Disagree, "tariffs help workers"));
    let a = row(&h);
    assert_eq!(a, row(&h));
    assert!(a.drift.is_drifting());
    assert!(a.summary.ends_with("position is drifting."));
  }
}
