//! [`SqliteStore`]: the SQLite implementation of [`BeliefStore`].

use std::path::Path;

use chrono::SubsecRound;
use rusqlite::{OptionalExtension as _, types::Value};

use tenet_core::{
  store::BeliefStore,
  topic::Topic,
  vote::{PreparedVote, Vote, VoteId},
};

use crate::{
  Error, Result,
  encode::{
    RawVote, VOTE_COLUMNS, decode_dt, encode_confidence, encode_dt, encode_list,
    encode_stance,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A belief store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

/// What happened inside the append transaction.
enum Appended {
  Inserted(i64),
  /// Rejected; carries the newest stored timestamp of the stream.
  OutOfOrder(String),
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let conn = tokio_rusqlite::Connection::open(&path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "belief store opened");
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a vote query and decode every row.
  async fn select(&self, sql: String, args: Vec<Value>) -> Result<Vec<Vote>> {
    let raws: Vec<RawVote> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args), RawVote::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVote::into_vote).collect()
  }
}

// ─── BeliefStore impl ────────────────────────────────────────────────────────

impl BeliefStore for SqliteStore {
  type Error = Error;

  async fn append(&self, mut vote: PreparedVote) -> Result<Vote> {
    // Stored timestamps carry microseconds; keep the returned vote identical
    // to what a later read will produce.
    vote.created_at = vote.created_at.trunc_subsecs(6);

    let user_id     = vote.user_id.clone();
    let topic       = vote.topic.as_str();
    let article_id  = vote.article_id.clone();
    let stance      = encode_stance(vote.stance);
    let belief_text = vote.belief_text.clone();
    let belief_key  = vote.belief_key.as_str().to_owned();
    let confidence  = vote.confidence.map(encode_confidence);
    let note        = vote.note.clone();
    let claim       = vote.claim.clone();
    let conditions  = encode_list(&vote.conditions)?;
    let contradicts = encode_list(&vote.contradicts)?;
    let created_at  = encode_dt(vote.created_at);

    let appended = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let latest: Option<String> = tx
          .query_row(
            "SELECT created_at FROM votes
             WHERE user_id = ?1 AND topic = ?2
             ORDER BY created_at DESC, vote_id DESC
             LIMIT 1",
            rusqlite::params![user_id, topic],
            |r| r.get(0),
          )
          .optional()?;

        if let Some(latest) = latest
          && latest > created_at
        {
          return Ok(Appended::OutOfOrder(latest));
        }

        tx.execute(
          "INSERT INTO votes (
             user_id, topic, article_id, stance, belief_text, belief_key,
             confidence, note, claim, conditions, contradicts, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            user_id,
            topic,
            article_id,
            stance,
            belief_text,
            belief_key,
            confidence,
            note,
            claim,
            conditions,
            contradicts,
            created_at,
          ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Appended::Inserted(id))
      })
      .await?;

    match appended {
      Appended::Inserted(id) => {
        tracing::debug!(vote_id = id, topic = %vote.topic, "vote appended");
        Ok(vote.into_vote(VoteId(id)))
      }
      Appended::OutOfOrder(latest) => Err(Error::Core(tenet_core::Error::OutOfOrderVote {
        user_id:   vote.user_id,
        topic:     vote.topic,
        attempted: vote.created_at,
        latest:    decode_dt(&latest)?,
      })),
    }
  }

  async fn history(&self, user_id: &str, topic: Topic) -> Result<Vec<Vote>> {
    let sql = format!(
      "SELECT {VOTE_COLUMNS} FROM votes
       WHERE user_id = ?1 AND topic = ?2
       ORDER BY created_at, vote_id"
    );
    let args = vec![Value::from(user_id.to_owned()), Value::from(topic.as_str().to_owned())];
    self.select(sql, args).await
  }

  async fn user_history(&self, user_id: &str) -> Result<Vec<Vote>> {
    let sql = format!(
      "SELECT {VOTE_COLUMNS} FROM votes
       WHERE user_id = ?1
       ORDER BY created_at, vote_id"
    );
    self.select(sql, vec![Value::from(user_id.to_owned())]).await
  }

  async fn recent(
    &self,
    user_id: &str,
    topic:   Option<Topic>,
    limit:   usize,
  ) -> Result<Vec<Vote>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut args = vec![Value::from(user_id.to_owned())];
    let topic_clause = match topic {
      Some(t) => {
        args.push(Value::from(t.as_str().to_owned()));
        "AND topic = ?2"
      }
      None => "",
    };
    args.push(Value::from(limit));
    let limit_param = args.len();

    let sql = format!(
      "SELECT {VOTE_COLUMNS} FROM votes
       WHERE user_id = ?1 {topic_clause}
       ORDER BY created_at DESC, vote_id DESC
       LIMIT ?{limit_param}"
    );
    self.select(sql, args).await
  }

  async fn get_vote(&self, id: VoteId) -> Result<Option<Vote>> {
    let sql = format!("SELECT {VOTE_COLUMNS} FROM votes WHERE vote_id = ?1");
    let mut votes = self.select(sql, vec![Value::from(id.0)]).await?;
    Ok(votes.pop())
  }
}
