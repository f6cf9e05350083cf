//! Claim text normalization and token-level comparison.
//!
//! [`ClaimNormalizer`] is the seam for swapping in an external canonicalizer;
//! [`TokenNormalizer`] is the deterministic default. [`Claim`] is the analysed
//! form both the key resolver and the contradiction fallback work on.

use std::collections::BTreeSet;

/// Words that flip the polarity of a claim. Apostrophes are stripped before
/// matching, so `don't` arrives here as `dont`.
const NEGATIONS: &[&str] = &[
  "not", "no", "never", "nor", "neither", "cannot", "cant", "dont", "doesnt",
  "didnt", "isnt", "arent", "wasnt", "werent", "wont", "shouldnt", "wouldnt",
  "couldnt", "hasnt", "havent",
];

/// Function words ignored when comparing claims.
const STOPWORDS: &[&str] = &[
  "a", "an", "the", "do", "does", "did", "is", "are", "was", "were", "be",
  "been", "to", "of", "and", "or", "will", "would", "that", "this", "it", "in",
  "on", "for",
];

/// Turns free text into a canonical comparable form.
pub trait ClaimNormalizer: Send + Sync {
  /// Return the canonical text. An empty result means the claim is blank.
  fn normalize(&self, text: &str) -> String;
}

/// Case-folds, strips punctuation and collapses whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenNormalizer;

impl ClaimNormalizer for TokenNormalizer {
  fn normalize(&self, text: &str) -> String {
    let cleaned: String = text
      .chars()
      .filter(|c| !matches!(c, '\'' | '\u{2019}'))
      .map(|c| if c.is_alphanumeric() { c } else { ' ' })
      .flat_map(char::to_lowercase)
      .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
  }
}

/// A normalized claim split into content words and polarity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
  /// The normalized text.
  pub text:    String,
  /// Content words in order of appearance, negations and stopwords removed.
  pub words:   Vec<String>,
  pub tokens:  BTreeSet<String>,
  /// True when the claim carries an odd number of negations.
  pub negated: bool,
}

impl Claim {
  /// Analyse text that has already been through a [`ClaimNormalizer`].
  pub fn analyze(normalized: &str) -> Self {
    let mut negations = 0usize;
    let mut words = Vec::new();
    for word in normalized.split_whitespace() {
      if NEGATIONS.contains(&word) {
        negations += 1;
      } else if !STOPWORDS.contains(&word) {
        words.push(word.to_owned());
      }
    }
    let tokens = words.iter().cloned().collect();
    Self {
      text: normalized.to_owned(),
      words,
      tokens,
      negated: negations % 2 == 1,
    }
  }

  pub fn is_blank(&self) -> bool { self.text.is_empty() }

  /// Jaccard similarity of the content-token sets, in `[0, 1]`.
  pub fn similarity(&self, other: &Claim) -> f64 {
    jaccard(&self.tokens, &other.tokens)
  }

  /// Token-overlap stand-in for a semantic contradiction judgement: the claims
  /// talk about the same thing with opposite polarity.
  pub fn contradicts(&self, other: &Claim, threshold: f64) -> bool {
    self.negated != other.negated && self.similarity(other) >= threshold
  }
}

pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
  let union = a.union(b).count();
  if union == 0 {
    return 0.0;
  }
  a.intersection(b).count() as f64 / union as f64
}
