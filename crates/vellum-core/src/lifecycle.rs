//! The version lifecycle state machine and its resolved read types.
//!
//! Statuses walk strictly forward: RAW → PROCESSED → APPROVED →
//! ACTIVE_FINAL, one stage at a time. Publishing records a supersession for
//! the previously active version in a separate append-only table; a
//! version's standing is computed at query time by joining against it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, version::DocumentVersion};

// ─── Lifecycle status ────────────────────────────────────────────────────────

/// The stage of a version within the content pipeline.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStatus {
  Raw,
  Processed,
  Approved,
  ActiveFinal,
}

impl LifecycleStatus {
  /// The next stage in the pipeline, or `None` for the terminal stage.
  pub fn successor(self) -> Option<LifecycleStatus> {
    match self {
      Self::Raw => Some(Self::Processed),
      Self::Processed => Some(Self::Approved),
      Self::Approved => Some(Self::ActiveFinal),
      Self::ActiveFinal => None,
    }
  }

  /// All statuses in pipeline order.
  pub const ALL: [LifecycleStatus; 4] =
    [Self::Raw, Self::Processed, Self::Approved, Self::ActiveFinal];
}

/// Check that a version in `from` may transition to `to`.
///
/// Only single forward steps are legal; skips and reversals return
/// [`Error::InvalidTransition`] naming the stage that was expected.
pub fn ensure_transition(
  version: Uuid,
  from: LifecycleStatus,
  to: LifecycleStatus,
) -> Result<()> {
  if from.successor() == Some(to) {
    return Ok(());
  }
  // The expected source stage for `to` is its predecessor.
  let expected = LifecycleStatus::ALL
    .iter()
    .copied()
    .find(|s| s.successor() == Some(to))
    .unwrap_or(LifecycleStatus::Raw);
  Err(Error::InvalidTransition { version, from, expected })
}

// ─── Supersession ────────────────────────────────────────────────────────────

/// Records that a previously active version has been replaced by a newer
/// published one. A version can be superseded at most once (enforced by a
/// UNIQUE constraint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supersession {
  pub supersession_id: Uuid,
  pub old_version_id:  Uuid,
  pub new_version_id:  Uuid,
  pub recorded_at:     DateTime<Utc>,
}

// ─── Computed standing ───────────────────────────────────────────────────────

/// Whether a version still stands, computed at query time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "standing", rename_all = "snake_case")]
pub enum Standing {
  Current,
  Superseded {
    /// The UUID of the version that replaced this one.
    by: Uuid,
    at: DateTime<Utc>,
  },
}

impl Standing {
  pub fn is_current(&self) -> bool { matches!(self, Self::Current) }
}

/// A version bundled with its computed standing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedVersion {
  pub version:  DocumentVersion,
  pub standing: Standing,
}

impl ResolvedVersion {
  /// `true` only for the single unsuperseded ACTIVE_FINAL version.
  pub fn is_active(&self) -> bool {
    self.version.status == LifecycleStatus::ActiveFinal
      && self.standing.is_current()
  }
}

// ─── Publish outcome ─────────────────────────────────────────────────────────

/// Result of [`crate::store::VersionStore::publish`]: the newly active
/// version plus, when a prior active version existed, its supersession.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishOutcome {
  pub published:  DocumentVersion,
  pub superseded: Option<Supersession>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn successor_chain_is_single_step() {
    assert_eq!(
      LifecycleStatus::Raw.successor(),
      Some(LifecycleStatus::Processed)
    );
    assert_eq!(
      LifecycleStatus::Processed.successor(),
      Some(LifecycleStatus::Approved)
    );
    assert_eq!(
      LifecycleStatus::Approved.successor(),
      Some(LifecycleStatus::ActiveFinal)
    );
    assert_eq!(LifecycleStatus::ActiveFinal.successor(), None);
  }

  #[test]
  fn forward_steps_allowed() {
    let id = Uuid::new_v4();
    for from in LifecycleStatus::ALL {
      if let Some(to) = from.successor() {
        assert!(ensure_transition(id, from, to).is_ok());
      }
    }
  }

  #[test]
  fn skips_and_reversals_rejected() {
    let id = Uuid::new_v4();
    // Skip: RAW → APPROVED.
    assert!(matches!(
      ensure_transition(id, LifecycleStatus::Raw, LifecycleStatus::Approved),
      Err(Error::InvalidTransition {
        expected: LifecycleStatus::Processed,
        ..
      })
    ));
    // Reversal: APPROVED → PROCESSED.
    assert!(
      ensure_transition(
        id,
        LifecycleStatus::Approved,
        LifecycleStatus::Processed
      )
      .is_err()
    );
    // Out of the terminal stage.
    assert!(
      ensure_transition(
        id,
        LifecycleStatus::ActiveFinal,
        LifecycleStatus::Raw
      )
      .is_err()
    );
  }

  #[test]
  fn status_serialises_screaming_snake() {
    let json = serde_json::to_string(&LifecycleStatus::ActiveFinal).unwrap();
    assert_eq!(json, r#""ACTIVE_FINAL""#);
  }
}
