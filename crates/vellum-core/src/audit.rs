//! Audit events — immutable records of state-changing actions.
//!
//! An event is written synchronously after (and only after) the triggering
//! mutation commits, and is never mutated afterwards. Audit writes are
//! best-effort: a failed write is logged by the caller, never surfaced as
//! the operation's failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of mutation an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
  Create,
  Import,
  Process,
  Approve,
  Publish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Info,
  Warning,
  Critical,
}

/// The polymorphic target of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
  Document,
  DocumentVersion,
}

/// An immutable audit record. `recorded_at` is set by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
  pub audit_id:    Uuid,
  pub tenant_id:   Uuid,
  pub kind:        AuditKind,
  pub severity:    Severity,
  pub message:     String,
  pub entity_type: EntityType,
  pub entity_id:   Uuid,
  pub entity_name: String,
  pub actor_id:    String,
  pub actor_name:  String,
  pub recorded_at: DateTime<Utc>,
}

/// Input to [`crate::store::VersionStore::append_audit`].
#[derive(Debug, Clone)]
pub struct NewAuditEvent {
  pub tenant_id:   Uuid,
  pub kind:        AuditKind,
  pub severity:    Severity,
  pub message:     String,
  pub entity_type: EntityType,
  pub entity_id:   Uuid,
  pub entity_name: String,
  pub actor_id:    String,
  pub actor_name:  String,
}

impl NewAuditEvent {
  /// Convenience constructor for the common info-severity case.
  pub fn info(
    tenant_id: Uuid,
    kind: AuditKind,
    entity_type: EntityType,
    entity_id: Uuid,
    message: impl Into<String>,
  ) -> Self {
    Self {
      tenant_id,
      kind,
      severity: Severity::Info,
      message: message.into(),
      entity_type,
      entity_id,
      entity_name: String::new(),
      actor_id: String::new(),
      actor_name: String::new(),
    }
  }

  pub fn entity_name(mut self, name: impl Into<String>) -> Self {
    self.entity_name = name.into();
    self
  }

  pub fn actor(
    mut self,
    id: impl Into<String>,
    name: impl Into<String>,
  ) -> Self {
    self.actor_id = id.into();
    self.actor_name = name.into();
    self
  }
}
