//! The `VersionStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `vellum-store-sqlite`). The HTTP layer depends on this abstraction, not
//! on any concrete backend; the backend is chosen once at process startup.
//!
//! Methods fail with [`crate::Error`] so callers can map failures to their
//! HTTP taxonomy without knowing the backend; backends fold their internal
//! failures into [`crate::Error::Storage`].

use std::future::Future;

use uuid::Uuid;

use crate::{
  Result,
  audit::{AuditEvent, NewAuditEvent},
  lifecycle::{PublishOutcome, ResolvedVersion},
  version::{Approval, ContentRef, Document, DocumentVersion, NewDocument, NewRawVersion},
};

/// Abstraction over a Vellum storage backend.
///
/// All version writes are append-only: each lifecycle transition inserts a
/// new version row, and supersession is itself an append-only record. Every
/// method is scoped by `tenant_id`; entities belonging to another tenant
/// behave as if absent.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait VersionStore: Send + Sync {
  // ── Documents ─────────────────────────────────────────────────────────

  /// Create and persist a new document owned by `tenant_id`.
  fn create_document(
    &self,
    tenant_id: Uuid,
    input: NewDocument,
  ) -> impl Future<Output = Result<Document>> + Send + '_;

  /// Retrieve a document by id. Returns `None` if not found or owned by a
  /// different tenant.
  fn get_document(
    &self,
    tenant_id: Uuid,
    document_id: Uuid,
  ) -> impl Future<Output = Result<Option<Document>>> + Send + '_;

  /// List all documents owned by `tenant_id`, newest first.
  fn list_documents(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Document>>> + Send + '_;

  // ── Lifecycle transitions — append-only writes ────────────────────────

  /// Import staged content as a new RAW version. The input is validated and
  /// the owning document must exist.
  fn import_raw(
    &self,
    tenant_id: Uuid,
    input: NewRawVersion,
  ) -> impl Future<Output = Result<DocumentVersion>> + Send + '_;

  /// Derive a PROCESSED version from a RAW source. Fails with
  /// [`crate::Error::InvalidTransition`] if the source is not RAW, or
  /// [`crate::Error::VersionNotFound`] if it does not exist.
  fn process(
    &self,
    tenant_id: Uuid,
    source_version_id: Uuid,
    content: ContentRef,
    created_by: String,
  ) -> impl Future<Output = Result<DocumentVersion>> + Send + '_;

  /// Derive an APPROVED version from a PROCESSED source.
  fn approve(
    &self,
    tenant_id: Uuid,
    version_id: Uuid,
    approval: Approval,
  ) -> impl Future<Output = Result<DocumentVersion>> + Send + '_;

  /// Derive an ACTIVE_FINAL version from an APPROVED source and atomically
  /// supersede the document's previous active version, if any.
  ///
  /// The supersede-and-activate pair must commit or fail as a unit: at most
  /// one unsuperseded ACTIVE_FINAL version may exist per document. An
  /// APPROVED version can be published at most once; a concurrent or
  /// repeated publish loses with [`crate::Error::PublishConflict`].
  fn publish(
    &self,
    tenant_id: Uuid,
    version_id: Uuid,
    published_by: String,
  ) -> impl Future<Output = Result<PublishOutcome>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve one version with its standing resolved. Returns `None` if not
  /// found within the tenant.
  fn get_version(
    &self,
    tenant_id: Uuid,
    version_id: Uuid,
  ) -> impl Future<Output = Result<Option<ResolvedVersion>>> + Send + '_;

  /// All versions of a document, newest first, with standings resolved.
  /// Returns an empty vec for an unknown document.
  fn versions_for_document(
    &self,
    tenant_id: Uuid,
    document_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ResolvedVersion>>> + Send + '_;

  /// The document's single current ACTIVE_FINAL version, if any.
  fn active_version(
    &self,
    tenant_id: Uuid,
    document_id: Uuid,
  ) -> impl Future<Output = Result<Option<ResolvedVersion>>> + Send + '_;

  // ── Audit ─────────────────────────────────────────────────────────────

  /// Append an audit event. `recorded_at` is set by the store.
  fn append_audit(
    &self,
    input: NewAuditEvent,
  ) -> impl Future<Output = Result<AuditEvent>> + Send + '_;

  /// All audit events referencing `entity_id` within the tenant, newest
  /// first.
  fn audit_for_entity(
    &self,
    tenant_id: Uuid,
    entity_id: Uuid,
  ) -> impl Future<Output = Result<Vec<AuditEvent>>> + Send + '_;
}
