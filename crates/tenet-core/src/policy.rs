//! Tunable thresholds for classification, scoring and drift detection.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Knobs shared by the classifier, scorer, detector and builder.
///
/// Deserialised from the `[policy]` table of the server configuration; every
/// field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
  /// A repeat of the same stance on the same key within this many seconds is
  /// reported as a duplicate.
  pub duplicate_window_secs:  i64,
  /// Per-rank decay applied to recency weights; rank 0 is the newest vote.
  pub recency_decay:          f64,
  /// Size of the recent and prior windows compared by the drift detector.
  pub drift_window:           usize,
  /// Minimum fall in consistency between windows that counts as drift.
  pub drift_consistency_drop: f64,
  /// Maximum number of themes reported per ledger row.
  pub max_themes:             usize,
}

impl Default for Policy {
  fn default() -> Self {
    Self {
      duplicate_window_secs:  24 * 60 * 60,
      recency_decay:          0.85,
      drift_window:           5,
      drift_consistency_drop: 0.25,
      max_themes:             4,
    }
  }
}

impl Policy {
  /// Saturates at [`TimeDelta::MAX`] for windows chrono cannot represent.
  pub fn duplicate_window(&self) -> TimeDelta {
    TimeDelta::try_seconds(self.duplicate_window_secs).unwrap_or(TimeDelta::MAX)
  }

  /// Reject values the classifier, scorer or detector cannot work with.
  pub fn validate(&self) -> Result<()> {
    if self.duplicate_window_secs < 0
      || TimeDelta::try_seconds(self.duplicate_window_secs).is_none()
    {
      return Err(invalid(format!(
        "duplicate_window_secs must be a non-negative number of seconds chrono can \
         represent, got {}",
        self.duplicate_window_secs
      )));
    }
    if !(self.recency_decay > 0.0 && self.recency_decay <= 1.0) {
      return Err(invalid(format!(
        "recency_decay must be in (0, 1], got {}",
        self.recency_decay
      )));
    }
    if self.drift_window == 0 || self.drift_window.checked_mul(2).is_none() {
      return Err(invalid(format!(
        "drift_window must be positive and doubled without overflow, got {}",
        self.drift_window
      )));
    }
    if !(0.0..=1.0).contains(&self.drift_consistency_drop) {
      return Err(invalid(format!(
        "drift_consistency_drop must be in [0, 1], got {}",
        self.drift_consistency_drop
      )));
    }
    Ok(())
  }
}

fn invalid(message: String) -> Error { Error::InvalidPolicy(message) }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_are_valid() {
    assert!(Policy::default().validate().is_ok());
  }

  #[test]
  fn out_of_range_values_are_rejected() {
    let cases = [
      Policy { duplicate_window_secs: i64::MAX, ..Policy::default() },
      Policy { duplicate_window_secs: -1, ..Policy::default() },
      Policy { recency_decay: 0.0, ..Policy::default() },
      Policy { recency_decay: -0.5, ..Policy::default() },
      Policy { recency_decay: f64::NAN, ..Policy::default() },
      Policy { drift_window: 0, ..Policy::default() },
      Policy { drift_window: usize::MAX, ..Policy::default() },
      Policy { drift_consistency_drop: f64::NAN, ..Policy::default() },
      Policy { drift_consistency_drop: 1.5, ..Policy::default() },
    ];
    for policy in cases {
      assert!(
        matches!(policy.validate(), Err(Error::InvalidPolicy(_))),
        "{policy:?} should be rejected"
      );
    }
  }

  #[test]
  fn huge_window_saturates_instead_of_panicking() {
    let policy = Policy { duplicate_window_secs: i64::MAX, ..Policy::default() };
    assert_eq!(policy.duplicate_window(), TimeDelta::MAX);
  }
}
