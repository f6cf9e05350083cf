//! Fixtures shared by the unit tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::{
  topic::Topic,
  vote::{BeliefKey, Stance, Vote, VoteId},
};

/// A fixed base instant plus `minutes`.
pub fn at(minutes: i64) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
}

/// A trade vote whose key is the lower-cased, hyphenated text.
pub fn vote(id: i64, stance: Stance, text: &str, created_at: DateTime<Utc>) -> Vote {
  let key = text.to_lowercase().replace(' ', "-");
  vote_with_key(id, stance, text, &key, created_at)
}

pub fn vote_with_key(
  id: i64,
  stance: Stance,
  text: &str,
  key: &str,
  created_at: DateTime<Utc>,
) -> Vote {
  Vote {
    id: VoteId(id),
    user_id: "u1".into(),
    topic: Topic::Trade,
    article_id: format!("a{id}"),
    stance,
    belief_text: text.into(),
    belief_key: BeliefKey::new(key),
    confidence: None,
    note: None,
    claim: None,
    conditions: vec![],
    contradicts: vec![],
    created_at,
  }
}

/// `n` votes one minute apart starting at minute `start`, ids from `first_id`.
pub fn run(first_id: i64, start: i64, n: usize, stance: Stance, text: &str) -> Vec<Vote> {
  (0..n as i64)
    .map(|i| vote(first_id + i, stance, text, at(start + i)))
    .collect()
}
