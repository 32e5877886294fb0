//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Enums are stored as their wire
//! discriminants (the same strings serde would produce).

use chrono::{DateTime, Utc};
use uuid::Uuid;
use vellum_core::{
  Error, Result,
  audit::{AuditEvent, AuditKind, EntityType, Severity},
  lifecycle::{LifecycleStatus, ResolvedVersion, Standing},
  version::{ContentRef, Document, DocumentVersion},
};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> {
  Uuid::parse_str(s).map_err(|e| Error::Storage(format!("bad uuid {s:?}: {e}")))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Storage(format!("bad timestamp {s:?}: {e}")))
}

// ─── LifecycleStatus ─────────────────────────────────────────────────────────

pub fn encode_status(s: LifecycleStatus) -> &'static str {
  match s {
    LifecycleStatus::Raw => "RAW",
    LifecycleStatus::Processed => "PROCESSED",
    LifecycleStatus::Approved => "APPROVED",
    LifecycleStatus::ActiveFinal => "ACTIVE_FINAL",
  }
}

pub fn decode_status(s: &str) -> Result<LifecycleStatus> {
  match s {
    "RAW" => Ok(LifecycleStatus::Raw),
    "PROCESSED" => Ok(LifecycleStatus::Processed),
    "APPROVED" => Ok(LifecycleStatus::Approved),
    "ACTIVE_FINAL" => Ok(LifecycleStatus::ActiveFinal),
    other => Err(Error::Storage(format!("unknown status: {other:?}"))),
  }
}

// ─── Audit enums ─────────────────────────────────────────────────────────────

pub fn encode_kind(k: AuditKind) -> &'static str {
  match k {
    AuditKind::Create => "create",
    AuditKind::Import => "import",
    AuditKind::Process => "process",
    AuditKind::Approve => "approve",
    AuditKind::Publish => "publish",
  }
}

pub fn decode_kind(s: &str) -> Result<AuditKind> {
  match s {
    "create" => Ok(AuditKind::Create),
    "import" => Ok(AuditKind::Import),
    "process" => Ok(AuditKind::Process),
    "approve" => Ok(AuditKind::Approve),
    "publish" => Ok(AuditKind::Publish),
    other => Err(Error::Storage(format!("unknown audit kind: {other:?}"))),
  }
}

pub fn encode_severity(s: Severity) -> &'static str {
  match s {
    Severity::Info => "info",
    Severity::Warning => "warning",
    Severity::Critical => "critical",
  }
}

pub fn decode_severity(s: &str) -> Result<Severity> {
  match s {
    "info" => Ok(Severity::Info),
    "warning" => Ok(Severity::Warning),
    "critical" => Ok(Severity::Critical),
    other => Err(Error::Storage(format!("unknown severity: {other:?}"))),
  }
}

pub fn encode_entity_type(t: EntityType) -> &'static str {
  match t {
    EntityType::Document => "document",
    EntityType::DocumentVersion => "document_version",
  }
}

pub fn decode_entity_type(s: &str) -> Result<EntityType> {
  match s {
    "document" => Ok(EntityType::Document),
    "document_version" => Ok(EntityType::DocumentVersion),
    other => Err(Error::Storage(format!("unknown entity type: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `documents` row.
pub struct RawDocument {
  pub document_id: String,
  pub tenant_id:   String,
  pub title:       String,
  pub created_by:  String,
  pub created_at:  String,
}

impl RawDocument {
  pub fn into_document(self) -> Result<Document> {
    Ok(Document {
      document_id: decode_uuid(&self.document_id)?,
      tenant_id:   decode_uuid(&self.tenant_id)?,
      title:       self.title,
      created_by:  self.created_by,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings from a `document_versions` row.
pub struct RawVersion {
  pub version_id:      String,
  pub document_id:     String,
  pub status:          String,
  pub content_path:    String,
  pub checksum_sha256: String,
  pub size_bytes:      i64,
  pub media_type:      String,
  pub derived_from:    Option<String>,
  pub created_by:      String,
  pub notes:           Option<String>,
  pub created_at:      String,
}

impl RawVersion {
  pub fn into_version(self) -> Result<DocumentVersion> {
    let derived_from = self
      .derived_from
      .as_deref()
      .map(decode_uuid)
      .transpose()?;

    Ok(DocumentVersion {
      version_id:   decode_uuid(&self.version_id)?,
      document_id:  decode_uuid(&self.document_id)?,
      status:       decode_status(&self.status)?,
      content:      ContentRef {
        path:            self.content_path,
        checksum_sha256: self.checksum_sha256,
        size_bytes:      self.size_bytes as u64,
        media_type:      self.media_type,
      },
      derived_from,
      created_by:   self.created_by,
      notes:        self.notes,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// A `document_versions` row joined with its `supersessions` row, if any.
pub struct RawResolvedVersion {
  pub version:       RawVersion,
  pub superseded_by: Option<String>,
  pub superseded_at: Option<String>,
}

impl RawResolvedVersion {
  pub fn into_resolved(self) -> Result<ResolvedVersion> {
    let standing = if let (Some(by), Some(at)) =
      (self.superseded_by, self.superseded_at)
    {
      Standing::Superseded {
        by: decode_uuid(&by)?,
        at: decode_dt(&at)?,
      }
    } else {
      Standing::Current
    };

    Ok(ResolvedVersion {
      version: self.version.into_version()?,
      standing,
    })
  }
}

/// Raw strings from an `audit_events` row.
pub struct RawAuditEvent {
  pub audit_id:    String,
  pub tenant_id:   String,
  pub kind:        String,
  pub severity:    String,
  pub message:     String,
  pub entity_type: String,
  pub entity_id:   String,
  pub entity_name: String,
  pub actor_id:    String,
  pub actor_name:  String,
  pub recorded_at: String,
}

impl RawAuditEvent {
  pub fn into_event(self) -> Result<AuditEvent> {
    Ok(AuditEvent {
      audit_id:    decode_uuid(&self.audit_id)?,
      tenant_id:   decode_uuid(&self.tenant_id)?,
      kind:        decode_kind(&self.kind)?,
      severity:    decode_severity(&self.severity)?,
      message:     self.message,
      entity_type: decode_entity_type(&self.entity_type)?,
      entity_id:   decode_uuid(&self.entity_id)?,
      entity_name: self.entity_name,
      actor_id:    self.actor_id,
      actor_name:  self.actor_name,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}
