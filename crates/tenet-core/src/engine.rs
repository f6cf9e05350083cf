//! The ledger engine: ingest orchestration and ledger reads.
//!
//! Ingest runs resolve → classify → append while holding a per-user lock, so
//! every vote is classified against a complete, totally ordered history.
//! Votes from different users never contend.

use std::{collections::HashMap, sync::Arc};

use chrono::{SubsecRound, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
  Error, Result,
  alert::{AlertClassifier, BeliefAlert, ContradictionOracle, NoOracle},
  ledger::{self, LedgerRow},
  normalize::{ClaimNormalizer, TokenNormalizer},
  policy::Policy,
  resolver::BeliefKeyResolver,
  store::BeliefStore,
  topic::Topic,
  vote::{NewVote, PreparedVote, Vote, VoteId},
};

/// The stored vote together with the alert computed for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ingested {
  pub vote:         Vote,
  pub belief_alert: BeliefAlert,
}

pub struct Engine<S> {
  store:      S,
  normalizer: Arc<dyn ClaimNormalizer>,
  oracle:     Arc<dyn ContradictionOracle>,
  policy:     Policy,
  writers:    Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: BeliefStore> Engine<S> {
  /// An engine with the token normalizer, no contradiction oracle and the
  /// default policy.
  pub fn new(store: S) -> Self {
    Self {
      store,
      normalizer: Arc::new(TokenNormalizer),
      oracle: Arc::new(NoOracle),
      policy: Policy::default(),
      writers: Mutex::new(HashMap::new()),
    }
  }

  pub fn with_policy(mut self, policy: Policy) -> Self {
    self.policy = policy;
    self
  }

  pub fn with_oracle(mut self, oracle: impl ContradictionOracle + 'static) -> Self {
    self.oracle = Arc::new(oracle);
    self
  }

  pub fn with_normalizer(mut self, normalizer: impl ClaimNormalizer + 'static) -> Self {
    self.normalizer = Arc::new(normalizer);
    self
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn policy(&self) -> &Policy { &self.policy }

  fn classifier(&self) -> AlertClassifier<'_> {
    AlertClassifier::new(&*self.normalizer, &*self.oracle, &self.policy)
  }

  async fn writer(&self, user_id: &str) -> Arc<Mutex<()>> {
    let mut writers = self.writers.lock().await;
    writers.entry(user_id.to_owned()).or_default().clone()
  }

  /// Drop the user's lock from the map once no other ingest holds or awaits
  /// it. Clones are only handed out under the map lock, so the count cannot
  /// grow while it is checked.
  async fn release_writer(&self, user_id: &str, writer: Arc<Mutex<()>>) {
    let mut writers = self.writers.lock().await;
    if Arc::strong_count(&writer) == 2 {
      writers.remove(user_id);
    }
  }

  // ── Writes ──────────────────────────────────────────────────────────────

  /// Validate, resolve, classify and append one vote.
  ///
  /// Nothing is written when any step fails.
  pub async fn ingest(&self, input: NewVote) -> Result<Ingested> {
    let user_id = input.user_id.trim().to_owned();
    if user_id.is_empty() {
      return Err(Error::MissingUserId);
    }
    let topic = Topic::parse(&input.topic)?;
    if self.normalizer.normalize(&input.belief_text).is_empty() {
      return Err(Error::InvalidBeliefText);
    }

    let writer = self.writer(&user_id).await;
    let ingested = {
      let _guard = writer.lock().await;
      self.ingest_locked(user_id.clone(), topic, input).await
    };
    self.release_writer(&user_id, writer).await;
    ingested
  }

  /// Everything after validation; the caller holds the user's writer lock.
  async fn ingest_locked(
    &self,
    user_id: String,
    topic: Topic,
    input: NewVote,
  ) -> Result<Ingested> {
    let history = self.store.history(&user_id, topic).await.map_err(Error::store)?;
    let latest = history.last().map(|v| v.created_at);

    let created_at = match input.created_at.map(|at| at.trunc_subsecs(6)) {
      Some(attempted) => {
        if let Some(latest) = latest
          && attempted < latest
        {
          return Err(Error::OutOfOrderVote { user_id, topic, attempted, latest });
        }
        attempted
      }
      None => {
        let now = Utc::now().trunc_subsecs(6);
        latest.map_or(now, |l| l.max(now))
      }
    };

    let mut resolver = BeliefKeyResolver::from_history(&*self.normalizer, &history);
    let belief_key =
      resolver.resolve_with(topic, &input.belief_text, input.belief_key.as_deref())?;
    let contradicts = input
      .contradicts
      .iter()
      .filter_map(|k| resolver.canonical_key(k))
      .filter(|k| *k != belief_key)
      .collect();

    let prepared = PreparedVote {
      user_id,
      topic,
      article_id: input.article_id.trim().to_owned(),
      stance: input.stance,
      belief_text: input.belief_text.trim().to_owned(),
      belief_key,
      confidence: input.confidence,
      note: non_blank(input.note),
      claim: non_blank(input.claim),
      conditions: input
        .conditions
        .into_iter()
        .filter_map(|c| non_blank(Some(c)))
        .collect(),
      contradicts,
      created_at,
    };

    let belief_alert = self.classifier().classify(&prepared, &history);
    let vote = self.store.append(prepared).await.map_err(Error::store)?;

    tracing::info!(
      vote_id = %vote.id,
      user_id = %vote.user_id,
      topic = %vote.topic,
      stance = %vote.stance,
      belief_key = %vote.belief_key,
      alert = ?belief_alert.kind,
      "vote recorded"
    );

    Ok(Ingested { vote, belief_alert })
  }

  // ── Reads ───────────────────────────────────────────────────────────────

  /// One row per topic in the ontology, built from a single snapshot.
  pub async fn ledger(&self, user_id: &str) -> Result<Vec<LedgerRow>> {
    let votes = self.store.user_history(user_id).await.map_err(Error::store)?;
    let mut by_topic: HashMap<Topic, Vec<Vote>> = HashMap::new();
    for vote in votes {
      by_topic.entry(vote.topic).or_default().push(vote);
    }

    let classifier = self.classifier();
    let rows = Topic::all()
      .map(|topic| {
        let history = by_topic.remove(&topic).unwrap_or_default();
        ledger::build(topic, &history, &classifier)
      })
      .collect();
    tracing::debug!(user_id, "ledger built");
    Ok(rows)
  }

  pub async fn ledger_row(&self, user_id: &str, topic: &str) -> Result<LedgerRow> {
    let topic = Topic::parse(topic)?;
    let history = self.store.history(user_id, topic).await.map_err(Error::store)?;
    Ok(ledger::build(topic, &history, &self.classifier()))
  }

  /// Most recent votes first, optionally restricted to one topic.
  pub async fn beliefs(
    &self,
    user_id: &str,
    topic: Option<&str>,
    limit: usize,
  ) -> Result<Vec<Vote>> {
    let topic = topic.map(Topic::parse).transpose()?;
    self.store.recent(user_id, topic, limit).await.map_err(Error::store)
  }

  pub async fn latest(&self, user_id: &str, topic: &str) -> Result<Option<Vote>> {
    Ok(self.beliefs(user_id, Some(topic), 1).await?.into_iter().next())
  }

  /// Recompute the alert a stored vote received at ingest.
  pub async fn replay_alert(&self, id: VoteId) -> Result<BeliefAlert> {
    let vote = self
      .store
      .get_vote(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::VoteNotFound(id.0))?;
    let history = self
      .store
      .history(&vote.user_id, vote.topic)
      .await
      .map_err(Error::store)?;
    Ok(self.classifier().replay(&vote, &history))
  }
}

fn non_blank(s: Option<String>) -> Option<String> {
  s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}
