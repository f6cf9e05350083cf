//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tenet_core::{
  alert::AlertKind,
  conviction::Conviction,
  engine::Engine,
  store::BeliefStore,
  topic::Topic,
  vote::{BeliefKey, Confidence, NewVote, PreparedVote, Stance, VoteId},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn at(minutes: i64) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn prepared(user: &str, topic: Topic, stance: Stance, key: &str, minute: i64) -> PreparedVote {
  PreparedVote {
    user_id:     user.into(),
    topic,
    article_id:  format!("article-{minute}"),
    stance,
    belief_text: key.replace('-', " "),
    belief_key:  BeliefKey::new(key),
    confidence:  None,
    note:        None,
    claim:       None,
    conditions:  vec![],
    contradicts: vec![],
    created_at:  at(minute),
  }
}

// ─── Append & history ────────────────────────────────────────────────────────

#[tokio::test]
async fn append_assigns_increasing_ids() {
  let s = store().await;
  let a = s.append(prepared("u1", Topic::Trade, Stance::Agree, "k", 1)).await.unwrap();
  let b = s.append(prepared("u1", Topic::Trade, Stance::Agree, "k", 2)).await.unwrap();
  let c = s.append(prepared("u2", Topic::Inflation, Stance::Unsure, "k", 0)).await.unwrap();
  assert!(a.id < b.id);
  assert!(b.id < c.id);
}

#[tokio::test]
async fn history_is_scoped_and_ordered() {
  let s = store().await;
  s.append(prepared("u1", Topic::Trade, Stance::Agree, "first", 1)).await.unwrap();
  s.append(prepared("u1", Topic::Inflation, Stance::Agree, "other", 2)).await.unwrap();
  s.append(prepared("u2", Topic::Trade, Stance::Agree, "someone-else", 3)).await.unwrap();
  s.append(prepared("u1", Topic::Trade, Stance::Disagree, "second", 4)).await.unwrap();

  let history = s.history("u1", Topic::Trade).await.unwrap();
  let keys: Vec<_> = history.iter().map(|v| v.belief_key.as_str()).collect();
  assert_eq!(keys, ["first", "second"]);

  let all = s.user_history("u1").await.unwrap();
  assert_eq!(all.len(), 3);
  assert!(all.windows(2).all(|w| w[0].created_at <= w[1].created_at));
}

#[tokio::test]
async fn equal_timestamps_are_ordered_by_id() {
  let s = store().await;
  let a = s.append(prepared("u1", Topic::Trade, Stance::Agree, "a", 5)).await.unwrap();
  let b = s.append(prepared("u1", Topic::Trade, Stance::Disagree, "b", 5)).await.unwrap();

  let history = s.history("u1", Topic::Trade).await.unwrap();
  assert_eq!(history.iter().map(|v| v.id).collect::<Vec<_>>(), [a.id, b.id]);
}

#[tokio::test]
async fn older_vote_is_rejected_and_not_written() {
  let s = store().await;
  s.append(prepared("u1", Topic::Trade, Stance::Agree, "k", 10)).await.unwrap();

  let err = s
    .append(prepared("u1", Topic::Trade, Stance::Agree, "k", 9))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(tenet_core::Error::OutOfOrderVote { topic: Topic::Trade, .. })
  ));
  assert_eq!(s.history("u1", Topic::Trade).await.unwrap().len(), 1);

  // Other streams are unaffected.
  s.append(prepared("u1", Topic::Inflation, Stance::Agree, "k", 0)).await.unwrap();
}

#[tokio::test]
async fn every_field_survives_storage() {
  let s = store().await;
  let mut vote = prepared("u1", Topic::InterestRates, Stance::Disagree, "rates-stay-high", 3);
  vote.confidence = Some(Confidence::High);
  vote.note = Some("depends on the jobs report".into());
  vote.claim = Some("The central bank will hold rates through summer.".into());
  vote.conditions = vec!["inflation stays above target".into()];
  vote.contradicts = vec![BeliefKey::new("rates-fall-soon")];
  vote.created_at += Duration::nanoseconds(123_456_789);

  let stored = s.append(vote).await.unwrap();
  let fetched = s.get_vote(stored.id).await.unwrap().unwrap();
  assert_eq!(fetched, stored);
  assert_eq!(fetched.created_at.timestamp_subsec_micros(), 123_456);
}

#[tokio::test]
async fn get_vote_missing_returns_none() {
  let s = store().await;
  assert!(s.get_vote(VoteId(42)).await.unwrap().is_none());
}

// ─── Recent ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn recent_is_newest_first_and_limited() {
  let s = store().await;
  for minute in 0..5 {
    s.append(prepared("u1", Topic::Trade, Stance::Agree, "t", minute)).await.unwrap();
  }
  s.append(prepared("u1", Topic::Inflation, Stance::Agree, "i", 10)).await.unwrap();

  let recent = s.recent("u1", None, 3).await.unwrap();
  let minutes: Vec<_> = recent.iter().map(|v| v.article_id.as_str()).collect();
  assert_eq!(minutes, ["article-10", "article-4", "article-3"]);

  let trade = s.recent("u1", Some(Topic::Trade), 10).await.unwrap();
  assert_eq!(trade.len(), 5);
  assert!(trade.iter().all(|v| v.topic == Topic::Trade));
  assert_eq!(trade[0].article_id, "article-4");
}

// ─── Immutability ────────────────────────────────────────────────────────────

#[tokio::test]
async fn votes_cannot_be_updated_or_deleted() {
  let s = store().await;
  s.append(prepared("u1", Topic::Trade, Stance::Agree, "k", 1)).await.unwrap();

  let (updated, deleted) = s
    .conn
    .call(|conn| {
      let updated = conn.execute("UPDATE votes SET stance = 'DISAGREE'", []).is_err();
      let deleted = conn.execute("DELETE FROM votes", []).is_err();
      Ok((updated, deleted))
    })
    .await
    .unwrap();
  assert!(updated, "UPDATE must be rejected");
  assert!(deleted, "DELETE must be rejected");

  let history = s.history("u1", Topic::Trade).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].stance, Stance::Agree);
}

// ─── Engine over SQLite ──────────────────────────────────────────────────────

#[tokio::test]
async fn engine_flags_shift_and_duplicate_over_sqlite() {
  let engine = Engine::new(store().await);
  let day = 24 * 60;
  let text = "Tariffs help workers";

  for i in 0..3 {
    let ingested = engine
      .ingest(NewVote::new("u1", "Trade", "a", Stance::Agree, text).at(at(i * 2 * day)))
      .await
      .unwrap();
    assert_ne!(ingested.belief_alert.kind, AlertKind::Duplicate);
  }
  let row = engine.ledger_row("u1", "trade").await.unwrap();
  assert_eq!(row.conviction, Some(Conviction::High));

  let flip = engine
    .ingest(NewVote::new("u1", "trade", "b", Stance::Disagree, text).at(at(7 * day)))
    .await
    .unwrap();
  assert_eq!(flip.belief_alert.kind, AlertKind::Shift);

  let repeat = engine
    .ingest(NewVote::new("u1", "trade", "c", Stance::Disagree, text).at(at(7 * day + 30)))
    .await
    .unwrap();
  assert_eq!(repeat.belief_alert.kind, AlertKind::Duplicate);
  assert_eq!(repeat.belief_alert.related_vote, Some(flip.vote.id));

  let replayed = engine.replay_alert(repeat.vote.id).await.unwrap();
  assert_eq!(replayed, repeat.belief_alert);

  let ledger = engine.ledger("u1").await.unwrap();
  assert_eq!(ledger.len(), Topic::all().count());
}

#[tokio::test]
async fn reopened_file_keeps_votes() {
  let dir = std::env::temp_dir().join(format!("tenet-store-{}", std::process::id()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("reopen.db");
  let _ = std::fs::remove_file(&path);

  let first = SqliteStore::open(&path).await.unwrap();
  let stored = first
    .append(prepared("u1", Topic::Trade, Stance::Unsure, "k", 1))
    .await
    .unwrap();
  drop(first);

  let second = SqliteStore::open(&path).await.unwrap();
  assert_eq!(second.get_vote(stored.id).await.unwrap(), Some(stored));
  let _ = std::fs::remove_dir_all(&dir);
}
