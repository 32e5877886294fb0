//! Document and version types — the fundamental units of the Vellum store.
//!
//! A version is an immutable snapshot of a document's content at one
//! lifecycle stage. Versions are never updated; each lifecycle transition
//! inserts a new row referencing its predecessor, and supersession is
//! recorded in a separate append-only table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, lifecycle::LifecycleStatus};

// ─── Document ────────────────────────────────────────────────────────────────

/// A tenant-owned document whose content evolves through versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
  pub document_id: Uuid,
  /// Owning tenant; every version operation is scoped through this.
  pub tenant_id:   Uuid,
  pub title:       String,
  pub created_by:  String,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::VersionStore::create_document`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewDocument {
  pub title:      String,
  pub created_by: String,
}

impl NewDocument {
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::Validation("document title is required".into()));
    }
    if self.created_by.trim().is_empty() {
      return Err(Error::Validation("created_by is required".into()));
    }
    Ok(())
  }
}

// ─── Content reference ───────────────────────────────────────────────────────

/// Where a version's binary content lives; no content bytes are stored in
/// the database. Immutable once attached to a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRef {
  /// Path relative to the configured content directory.
  pub path:            String,
  /// SHA-256 hex digest of the content; verified on read.
  pub checksum_sha256: String,
  pub size_bytes:      u64,
  pub media_type:      String,
}

impl ContentRef {
  /// Check the declared metadata is internally consistent.
  pub fn validate(&self) -> Result<()> {
    if self.path.trim().is_empty() {
      return Err(Error::Validation("content path is required".into()));
    }
    let sum = &self.checksum_sha256;
    if sum.len() != 64 || !sum.bytes().all(|b| b.is_ascii_hexdigit()) {
      return Err(Error::Validation(format!(
        "checksum_sha256 must be 64 hex characters, got {:?}",
        sum
      )));
    }
    if sum.bytes().any(|b| b.is_ascii_uppercase()) {
      return Err(Error::Validation(
        "checksum_sha256 must be lowercase hex".into(),
      ));
    }
    if self.size_bytes == 0 {
      return Err(Error::Validation("size_bytes must be non-zero".into()));
    }
    if self.media_type.trim().is_empty() {
      return Err(Error::Validation("media_type is required".into()));
    }
    Ok(())
  }
}

// ─── DocumentVersion ─────────────────────────────────────────────────────────

/// An immutable snapshot of a document at one lifecycle stage. Once written,
/// no field is ever updated. Supersession lives in a separate table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentVersion {
  pub version_id:   Uuid,
  pub document_id:  Uuid,
  pub status:       LifecycleStatus,
  pub content:      ContentRef,
  /// The predecessor this version was derived from; `None` for RAW imports.
  pub derived_from: Option<Uuid>,
  pub created_by:   String,
  /// Free-text context, e.g. approval notes.
  pub notes:        Option<String>,
  /// Server-assigned timestamp; never changes after creation.
  pub created_at:   DateTime<Utc>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::VersionStore::import_raw`].
/// `created_at` is always set by the store; it is not accepted from callers.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRawVersion {
  pub document_id: Uuid,
  pub content:     ContentRef,
  pub created_by:  String,
  pub notes:       Option<String>,
}

impl NewRawVersion {
  pub fn validate(&self) -> Result<()> {
    if self.created_by.trim().is_empty() {
      return Err(Error::Validation("created_by is required".into()));
    }
    self.content.validate()
  }
}

/// Input to [`crate::store::VersionStore::approve`].
#[derive(Debug, Clone, Deserialize)]
pub struct Approval {
  pub approved_by: String,
  pub notes:       Option<String>,
}
