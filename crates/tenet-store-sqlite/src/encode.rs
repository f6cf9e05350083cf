//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings so that text order is
//! time order. Lists are stored as compact JSON arrays.

use chrono::{DateTime, SecondsFormat, Utc};
use tenet_core::{
  topic::Topic,
  vote::{BeliefKey, Confidence, Stance, Vote, VoteId},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Stance ──────────────────────────────────────────────────────────────────

pub fn encode_stance(s: Stance) -> &'static str {
  match s {
    Stance::Agree => "AGREE",
    Stance::Disagree => "DISAGREE",
    Stance::Unsure => "UNSURE",
  }
}

pub fn decode_stance(s: &str) -> Result<Stance> {
  match s {
    "AGREE" => Ok(Stance::Agree),
    "DISAGREE" => Ok(Stance::Disagree),
    "UNSURE" => Ok(Stance::Unsure),
    other => Err(unknown("stance", other)),
  }
}

// ─── Confidence ──────────────────────────────────────────────────────────────

pub fn encode_confidence(c: Confidence) -> &'static str {
  match c {
    Confidence::Low => "low",
    Confidence::Medium => "medium",
    Confidence::High => "high",
  }
}

pub fn decode_confidence(s: &str) -> Result<Confidence> {
  match s {
    "low" => Ok(Confidence::Low),
    "medium" => Ok(Confidence::Medium),
    "high" => Ok(Confidence::High),
    other => Err(unknown("confidence", other)),
  }
}

// ─── Topic ───────────────────────────────────────────────────────────────────

pub fn decode_topic(s: &str) -> Result<Topic> {
  Topic::parse(s).map_err(|_| unknown("topic", s))
}

// ─── Lists ───────────────────────────────────────────────────────────────────

pub fn encode_list<T: serde::Serialize>(items: &[T]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

fn unknown(column: &'static str, value: &str) -> Error {
  Error::UnknownValue { column, value: value.to_owned() }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Columns selected by every vote query, in [`RawVote::from_row`] order.
pub const VOTE_COLUMNS: &str = "vote_id, user_id, topic, article_id, stance, \
  belief_text, belief_key, confidence, note, claim, conditions, contradicts, \
  created_at";

/// Raw strings read directly from a `votes` row.
pub struct RawVote {
  pub vote_id:     i64,
  pub user_id:     String,
  pub topic:       String,
  pub article_id:  String,
  pub stance:      String,
  pub belief_text: String,
  pub belief_key:  String,
  pub confidence:  Option<String>,
  pub note:        Option<String>,
  pub claim:       Option<String>,
  pub conditions:  String,
  pub contradicts: String,
  pub created_at:  String,
}

impl RawVote {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      vote_id:     row.get(0)?,
      user_id:     row.get(1)?,
      topic:       row.get(2)?,
      article_id:  row.get(3)?,
      stance:      row.get(4)?,
      belief_text: row.get(5)?,
      belief_key:  row.get(6)?,
      confidence:  row.get(7)?,
      note:        row.get(8)?,
      claim:       row.get(9)?,
      conditions:  row.get(10)?,
      contradicts: row.get(11)?,
      created_at:  row.get(12)?,
    })
  }

  pub fn into_vote(self) -> Result<Vote> {
    let contradicts: Vec<String> = serde_json::from_str(&self.contradicts)?;
    Ok(Vote {
      id:          VoteId(self.vote_id),
      user_id:     self.user_id,
      topic:       decode_topic(&self.topic)?,
      article_id:  self.article_id,
      stance:      decode_stance(&self.stance)?,
      belief_text: self.belief_text,
      belief_key:  BeliefKey::new(self.belief_key),
      confidence:  self.confidence.as_deref().map(decode_confidence).transpose()?,
      note:        self.note,
      claim:       self.claim,
      conditions:  serde_json::from_str(&self.conditions)?,
      contradicts: contradicts.into_iter().map(BeliefKey::new).collect(),
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}
