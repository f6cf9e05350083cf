//! Belief key resolution: clustering paraphrased claims under one key.
//!
//! Clusters are scoped to a topic and rebuilt from stored history, so the
//! key → representative mapping is itself a pure function of the vote log.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::{
  Error, Result,
  normalize::{Claim, ClaimNormalizer},
  topic::Topic,
  vote::{BeliefKey, Vote},
};

/// Minimum content-token Jaccard similarity for a claim to join a cluster.
pub const CLUSTER_SIMILARITY: f64 = 0.6;

/// Content words carried into a minted key's slug.
const SLUG_WORDS: usize = 6;

#[derive(Debug, Clone)]
struct Cluster {
  key:            BeliefKey,
  representative: Claim,
}

/// Maps claim text to belief keys for one user.
pub struct BeliefKeyResolver<'n> {
  normalizer: &'n dyn ClaimNormalizer,
  clusters:   HashMap<Topic, Vec<Cluster>>,
  /// Every normalized text already resolved, with the key it got first.
  aliases:    HashMap<(Topic, String), BeliefKey>,
}

impl<'n> BeliefKeyResolver<'n> {
  pub fn new(normalizer: &'n dyn ClaimNormalizer) -> Self {
    Self { normalizer, clusters: HashMap::new(), aliases: HashMap::new() }
  }

  /// Seed clusters from an ordered history. The first vote carrying a key
  /// supplies that cluster's representative text; every stored text is kept
  /// as an alias of the first key it was stored under.
  pub fn from_history(normalizer: &'n dyn ClaimNormalizer, history: &[Vote]) -> Self {
    let mut resolver = Self::new(normalizer);
    for vote in history {
      let claim = resolver.analyze(&vote.belief_text);
      resolver.register(vote.topic, &vote.belief_key, claim);
    }
    resolver
  }

  /// Normalize and analyse a claim.
  pub fn analyze(&self, text: &str) -> Claim {
    Claim::analyze(&self.normalizer.normalize(text))
  }

  /// Resolve `belief_text` to a key, minting a new cluster if nothing matches.
  pub fn resolve(&mut self, topic: Topic, belief_text: &str) -> Result<BeliefKey> {
    self.resolve_with(topic, belief_text, None)
  }

  /// Like [`resolve`](Self::resolve), but an analyzer-supplied canonical key
  /// takes precedence over similarity matching when it is not blank.
  pub fn resolve_with(
    &mut self,
    topic: Topic,
    belief_text: &str,
    canonical: Option<&str>,
  ) -> Result<BeliefKey> {
    let claim = self.analyze(belief_text);
    if claim.is_blank() {
      return Err(Error::InvalidBeliefText);
    }

    if let Some(key) = canonical.and_then(|k| self.canonical_key(k)) {
      self.register(topic, &key, claim);
      return Ok(key);
    }

    if let Some(key) = self.best_match(topic, &claim) {
      self.alias(topic, &key, &claim);
      return Ok(key);
    }

    let key = mint_key(&claim);
    self.register(topic, &key, claim);
    Ok(key)
  }

  /// Normalize an externally supplied key into slug form. `None` if blank.
  pub fn canonical_key(&self, raw: &str) -> Option<BeliefKey> {
    let normalized = self.normalizer.normalize(raw);
    if normalized.is_empty() {
      return None;
    }
    Some(BeliefKey::new(normalized.replace(' ', "-")))
  }

  /// The representative (normalized) text of a cluster.
  pub fn representative(&self, topic: Topic, key: &BeliefKey) -> Option<&str> {
    self
      .clusters
      .get(&topic)?
      .iter()
      .find(|c| &c.key == key)
      .map(|c| c.representative.text.as_str())
  }

  fn best_match(&self, topic: Topic, claim: &Claim) -> Option<BeliefKey> {
    if let Some(key) = self.aliases.get(&(topic, claim.text.clone())) {
      return Some(key.clone());
    }
    let clusters = self.clusters.get(&topic)?;

    // Oldest cluster wins ties: only a strictly better score replaces it.
    let mut best: Option<(&Cluster, f64)> = None;
    for cluster in clusters {
      if cluster.representative.negated != claim.negated {
        continue;
      }
      let score = cluster.representative.similarity(claim);
      if score < CLUSTER_SIMILARITY {
        continue;
      }
      if best.is_none_or(|(_, s)| score > s) {
        best = Some((cluster, score));
      }
    }
    best.map(|(c, _)| c.key.clone())
  }

  fn register(&mut self, topic: Topic, key: &BeliefKey, claim: Claim) {
    self.alias(topic, key, &claim);
    let clusters = self.clusters.entry(topic).or_default();
    if !clusters.iter().any(|c| &c.key == key) {
      clusters.push(Cluster { key: key.clone(), representative: claim });
    }
  }

  fn alias(&mut self, topic: Topic, key: &BeliefKey, claim: &Claim) {
    self
      .aliases
      .entry((topic, claim.text.clone()))
      .or_insert_with(|| key.clone());
  }
}

/// `<first content words>-<8 hex chars of SHA-256(normalized text)>`.
fn mint_key(claim: &Claim) -> BeliefKey {
  let words: Vec<&str> = if claim.words.is_empty() {
    claim.text.split_whitespace().take(SLUG_WORDS).collect()
  } else {
    claim.words.iter().take(SLUG_WORDS).map(String::as_str).collect()
  };
  let digest = Sha256::digest(claim.text.as_bytes());
  let hash = hex::encode(&digest[..4]);
  BeliefKey::new(format!("{}-{hash}", words.join("-")))
}
