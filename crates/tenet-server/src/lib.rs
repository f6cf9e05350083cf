//! Server wiring for Tenet: configuration, engine assembly and the HTTP app.
//!
//! The binary in `main.rs` only parses arguments, initialises tracing and
//! calls into this module, so everything here is testable in-process.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use serde::Deserialize;
use tenet_core::{
  alert::ContradictionTable,
  engine::Engine,
  normalize::TokenNormalizer,
  policy::Policy,
  resolver::BeliefKeyResolver,
  store::BeliefStore,
  topic::Topic,
};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `TENET_`-prefixed environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:           String,
  #[serde(default = "default_port")]
  pub port:           u16,
  #[serde(default = "default_store_path")]
  pub store_path:     PathBuf,
  #[serde(default)]
  pub policy:         Policy,
  /// Known contradictory key pairs, consulted before the polarity fallback.
  #[serde(default)]
  pub contradictions: Vec<ContradictionEntry>,
}

/// One `[[contradictions]]` table: keys `a` and `b` contradict on `topic`.
#[derive(Debug, Deserialize, Clone)]
pub struct ContradictionEntry {
  pub topic: String,
  pub a:     String,
  pub b:     String,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/tenet/tenet.db") }

impl ServerConfig {
  /// Build the contradiction table, slugging keys the same way ingest does.
  pub fn contradiction_table(&self) -> tenet_core::Result<ContradictionTable> {
    let normalizer = TokenNormalizer;
    let resolver = BeliefKeyResolver::new(&normalizer);
    let mut table = ContradictionTable::new();
    for entry in &self.contradictions {
      let topic = Topic::parse(&entry.topic)?;
      let a = resolver.canonical_key(&entry.a);
      let b = resolver.canonical_key(&entry.b);
      let (Some(a), Some(b)) = (a, b) else {
        return Err(tenet_core::Error::InvalidBeliefText);
      };
      table.insert(topic, a, b);
    }
    Ok(table)
  }

  /// An engine over `store` carrying this configuration's policy and table.
  /// Fails on an out-of-range policy or a malformed contradiction entry.
  pub fn engine<S: BeliefStore>(&self, store: S) -> tenet_core::Result<Engine<S>> {
    self.policy.validate()?;
    let table = self.contradiction_table()?;
    tracing::debug!(pairs = table.len(), "contradiction table loaded");
    Ok(
      Engine::new(store)
        .with_policy(self.policy.clone())
        .with_oracle(table),
    )
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the JSON API with request tracing.
pub fn app<S>(engine: Arc<Engine<S>>) -> Router
where
  S: BeliefStore + 'static,
{
  tenet_api::api_router(engine).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use tenet_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn config(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_config_uses_defaults() {
    let cfg = config("");
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.policy, Policy::default());
    assert!(cfg.contradictions.is_empty());
  }

  #[test]
  fn policy_and_contradictions_are_read() {
    let cfg = config(
      r#"
      port = 9000

      [policy]
      duplicate_window_secs = 3600
      drift_window = 3

      [[contradictions]]
      topic = "Trade"
      a = "Tariffs help workers"
      b = "tariffs-hurt-workers"
      "#,
    );
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.policy.duplicate_window_secs, 3600);
    assert_eq!(cfg.policy.drift_window, 3);
    assert_eq!(cfg.policy.recency_decay, Policy::default().recency_decay);

    let table = cfg.contradiction_table().unwrap();
    assert_eq!(table.len(), 1);
  }

  #[test]
  fn unknown_contradiction_topic_is_rejected() {
    let cfg = config(
      r#"
      [[contradictions]]
      topic = "sports"
      a = "x"
      b = "y"
      "#,
    );
    assert!(matches!(
      cfg.contradiction_table(),
      Err(tenet_core::Error::UnknownTopic(_))
    ));
  }

  #[tokio::test]
  async fn out_of_range_policy_is_rejected_before_serving() {
    let cfg = config(
      r#"
      [policy]
      duplicate_window_secs = 9223372036854775807
      "#,
    );
    let store = SqliteStore::open_in_memory().await.unwrap();
    assert!(matches!(
      cfg.engine(store),
      Err(tenet_core::Error::InvalidPolicy(_))
    ));
  }

  #[tokio::test]
  async fn configured_contradiction_raises_conflict() {
    let cfg = config(
      r#"
      [[contradictions]]
      topic = "trade"
      a = "tariffs help"
      b = "free trade raises wages"
      "#,
    );
    let store = SqliteStore::open_in_memory().await.unwrap();
    let engine = Arc::new(cfg.engine(store).unwrap());

    let mut last = Value::Null;
    // Analyzer-supplied keys match the configured pair; the claims carry no
    // negation, so only the table can report the conflict.
    for (text, key, at) in [
      ("Tariffs help workers", "Tariffs help", "2025-03-01T12:00:00Z"),
      ("Free trade raises wages", "free trade raises wages", "2025-03-01T13:00:00Z"),
    ] {
      let body = json!({
        "user_id": "u1",
        "topic": "trade",
        "article_id": "a1",
        "stance": "AGREE",
        "belief_text": text,
        "belief_key": key,
        "created_at": at,
      });
      let req = Request::builder()
        .method("POST")
        .uri("/votes")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
      let resp = app(engine.clone()).oneshot(req).await.unwrap();
      assert_eq!(resp.status(), StatusCode::CREATED);
      let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
      last = serde_json::from_slice(&bytes).unwrap();
    }
    assert_eq!(last["belief_alert"]["type"], "conflict");
    assert_eq!(last["belief_alert"]["related_vote"], 1);
  }
}
