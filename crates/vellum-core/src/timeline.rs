//! Timeline and statistics read model for a document's version history.
//!
//! Computed on demand from the resolved version list — never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::{LifecycleStatus, ResolvedVersion, Standing};

// ─── Entries ─────────────────────────────────────────────────────────────────

/// One row of the timeline, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
  pub version_id:   Uuid,
  pub status:       LifecycleStatus,
  pub standing:     Standing,
  pub derived_from: Option<Uuid>,
  pub created_by:   String,
  pub created_at:   DateTime<Utc>,
  /// Seconds until a successor version was derived; `None` while this
  /// version is still the tip of its lineage.
  pub seconds_in_state: Option<i64>,
}

// ─── Stats ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StatusCounts {
  pub raw:          usize,
  pub processed:    usize,
  pub approved:     usize,
  pub active_final: usize,
}

impl StatusCounts {
  fn bump(&mut self, status: LifecycleStatus) {
    match status {
      LifecycleStatus::Raw => self.raw += 1,
      LifecycleStatus::Processed => self.processed += 1,
      LifecycleStatus::Approved => self.approved += 1,
      LifecycleStatus::ActiveFinal => self.active_final += 1,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionStats {
  pub total:              usize,
  pub counts:             StatusCounts,
  /// Stage of the most recently created version.
  pub current_stage:      Option<LifecycleStatus>,
  /// The single current ACTIVE_FINAL version, if the document has one.
  pub active_version_id:  Option<Uuid>,
  pub first_activity_at:  Option<DateTime<Utc>>,
  pub last_transition_at: Option<DateTime<Utc>>,
}

/// The full derived read model returned by the timeline endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionTimeline {
  pub entries: Vec<TimelineEntry>,
  pub stats:   VersionStats,
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Build the timeline from `versions` as returned by
/// [`crate::store::VersionStore::versions_for_document`] (newest first).
pub fn build(versions: &[ResolvedVersion]) -> VersionTimeline {
  let mut counts = StatusCounts::default();
  let mut active_version_id = None;

  for rv in versions {
    counts.bump(rv.version.status);
    if rv.is_active() {
      active_version_id = Some(rv.version.version_id);
    }
  }

  // A version leaves its state when a successor is derived from it.
  let successor_created_at = |id: Uuid| -> Option<DateTime<Utc>> {
    versions
      .iter()
      .find(|rv| rv.version.derived_from == Some(id))
      .map(|rv| rv.version.created_at)
  };

  let entries: Vec<TimelineEntry> = versions
    .iter()
    .map(|rv| {
      let seconds_in_state = successor_created_at(rv.version.version_id)
        .map(|at| (at - rv.version.created_at).num_seconds());
      TimelineEntry {
        version_id: rv.version.version_id,
        status: rv.version.status,
        standing: rv.standing.clone(),
        derived_from: rv.version.derived_from,
        created_by: rv.version.created_by.clone(),
        created_at: rv.version.created_at,
        seconds_in_state,
      }
    })
    .collect();

  // Input ordering is newest first.
  let current_stage = versions.first().map(|rv| rv.version.status);
  let last_transition_at = versions.first().map(|rv| rv.version.created_at);
  let first_activity_at = versions.last().map(|rv| rv.version.created_at);

  VersionTimeline {
    entries,
    stats: VersionStats {
      total: versions.len(),
      counts,
      current_stage,
      active_version_id,
      first_activity_at,
      last_transition_at,
    },
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;
  use crate::version::{ContentRef, DocumentVersion};

  fn content() -> ContentRef {
    ContentRef {
      path:            "aa/bb/aabb.md".into(),
      checksum_sha256: "0".repeat(64),
      size_bytes:      10,
      media_type:      "text/markdown".into(),
    }
  }

  fn version(
    id: Uuid,
    status: LifecycleStatus,
    derived_from: Option<Uuid>,
    at: DateTime<Utc>,
  ) -> ResolvedVersion {
    ResolvedVersion {
      version: DocumentVersion {
        version_id: id,
        document_id: Uuid::nil(),
        status,
        content: content(),
        derived_from,
        created_by: "u-1".into(),
        notes: None,
        created_at: at,
      },
      standing: Standing::Current,
    }
  }

  #[test]
  fn empty_history_yields_empty_stats() {
    let tl = build(&[]);
    assert!(tl.entries.is_empty());
    assert_eq!(tl.stats.total, 0);
    assert!(tl.stats.current_stage.is_none());
    assert!(tl.stats.active_version_id.is_none());
  }

  #[test]
  fn full_pipeline_counts_and_time_in_state() {
    let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let raw = Uuid::new_v4();
    let processed = Uuid::new_v4();
    let approved = Uuid::new_v4();
    let active = Uuid::new_v4();

    // Newest first, as the store returns them.
    let versions = vec![
      version(
        active,
        LifecycleStatus::ActiveFinal,
        Some(approved),
        t0 + Duration::seconds(300),
      ),
      version(
        approved,
        LifecycleStatus::Approved,
        Some(processed),
        t0 + Duration::seconds(180),
      ),
      version(
        processed,
        LifecycleStatus::Processed,
        Some(raw),
        t0 + Duration::seconds(60),
      ),
      version(raw, LifecycleStatus::Raw, None, t0),
    ];

    let tl = build(&versions);
    assert_eq!(tl.stats.total, 4);
    assert_eq!(tl.stats.counts.raw, 1);
    assert_eq!(tl.stats.counts.processed, 1);
    assert_eq!(tl.stats.counts.approved, 1);
    assert_eq!(tl.stats.counts.active_final, 1);
    assert_eq!(tl.stats.current_stage, Some(LifecycleStatus::ActiveFinal));
    assert_eq!(tl.stats.active_version_id, Some(active));
    assert_eq!(tl.stats.first_activity_at, Some(t0));
    assert_eq!(
      tl.stats.last_transition_at,
      Some(t0 + Duration::seconds(300))
    );

    // RAW sat for 60s before processing; the tip has no successor yet.
    assert_eq!(tl.entries[3].seconds_in_state, Some(60));
    assert_eq!(tl.entries[2].seconds_in_state, Some(120));
    assert_eq!(tl.entries[0].seconds_in_state, None);
  }

  #[test]
  fn superseded_active_is_not_the_active_version() {
    let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let old = Uuid::new_v4();
    let new = Uuid::new_v4();

    let mut old_active =
      version(old, LifecycleStatus::ActiveFinal, None, t0);
    old_active.standing = Standing::Superseded {
      by: new,
      at: t0 + Duration::seconds(10),
    };
    let new_active = version(
      new,
      LifecycleStatus::ActiveFinal,
      None,
      t0 + Duration::seconds(10),
    );

    let tl = build(&[new_active, old_active]);
    assert_eq!(tl.stats.active_version_id, Some(new));
    assert_eq!(tl.stats.counts.active_final, 2);
  }
}
