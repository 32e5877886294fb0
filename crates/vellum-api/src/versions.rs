//! Handlers for the version lifecycle endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/documents/versions/import-raw` | Body: [`ImportRawBody`]; returns 201 + RAW version |
//! | `POST` | `/documents/versions/:id/process` | Body: [`ProcessBody`]; derives PROCESSED |
//! | `POST` | `/documents/versions/:id/approve` | Body: [`ApproveBody`]; derives APPROVED |
//! | `POST` | `/documents/versions/:id/publish` | No body; derives ACTIVE_FINAL atomically |
//! | `GET`  | `/documents/:id/versions` | All versions, newest first |
//! | `GET`  | `/documents/:id/versions/timeline` | Timeline entries plus stats |
//! | `GET`  | `/documents/versions/:id/content` | Raw content bytes, checksum-verified |
//!
//! Every mutation follows the same shape: authenticate, scope to tenant,
//! check role, count against the rate limiter, then write. The audit event
//! is emitted only after the store write commits.

use axum::{
  Json,
  extract::{Path, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vellum_core::{
  actor::{Role, require_actor, require_role, require_tenant},
  audit::{AuditKind, EntityType, NewAuditEvent},
  lifecycle::{PublishOutcome, ResolvedVersion},
  store::VersionStore,
  timeline::{self, VersionTimeline},
  version::{Approval, ContentRef, DocumentVersion, NewRawVersion},
};

use crate::{AppState, blob::BlobError, error::ApiError, session::SessionActor};

// ─── Import ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /documents/versions/import-raw`. The content
/// must already sit in the content directory; the store validates the
/// reference, not the bytes.
#[derive(Debug, Deserialize)]
pub struct ImportRawBody {
  pub document_id: Uuid,
  pub content:     ContentRef,
  pub notes:       Option<String>,
}

/// `POST /documents/versions/import-raw` — returns 201 + the RAW version.
pub async fn import_raw<S>(
  State(state): State<AppState<S>>,
  SessionActor(actor): SessionActor,
  Json(body): Json<ImportRawBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: VersionStore + Clone + Send + Sync + 'static,
{
  let actor = require_actor(actor)?;
  let tenant = require_tenant(&actor)?;
  require_role(&actor, Role::CONTRIBUTORS)?;
  state.rate_limit(&tenant, "versions.import")?;

  let version = state
    .store
    .import_raw(tenant.tenant_id, NewRawVersion {
      document_id: body.document_id,
      content:     body.content,
      created_by:  actor.user_id.clone(),
      notes:       body.notes,
    })
    .await?;

  state
    .emit_audit(version_event(
      tenant.tenant_id,
      AuditKind::Import,
      &version,
      &actor.user_id,
      actor.email.as_deref(),
      "raw version imported",
    ))
    .await;

  Ok((StatusCode::CREATED, Json(version)))
}

// ─── Process ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /documents/versions/:id/process`: the
/// extracted markdown rendition of the raw content.
#[derive(Debug, Deserialize)]
pub struct ProcessBody {
  pub markdown: String,
}

/// `POST /documents/versions/:id/process` — stores the markdown as a blob
/// and derives a PROCESSED version referencing it. Returns 201.
pub async fn process<S>(
  State(state): State<AppState<S>>,
  SessionActor(actor): SessionActor,
  Path(id): Path<Uuid>,
  Json(body): Json<ProcessBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: VersionStore + Clone + Send + Sync + 'static,
{
  let actor = require_actor(actor)?;
  let tenant = require_tenant(&actor)?;
  require_role(&actor, Role::CONTRIBUTORS)?;
  state.rate_limit(&tenant, "versions.process")?;

  if body.markdown.trim().is_empty() {
    return Err(ApiError::Validation("markdown content is required".into()));
  }

  let content = state
    .blob
    .put(body.markdown.into_bytes(), "text/markdown")
    .await
    .map_err(blob_internal)?;

  let version = state
    .store
    .process(tenant.tenant_id, id, content, actor.user_id.clone())
    .await?;

  state
    .emit_audit(version_event(
      tenant.tenant_id,
      AuditKind::Process,
      &version,
      &actor.user_id,
      actor.email.as_deref(),
      "version processed",
    ))
    .await;

  Ok((StatusCode::CREATED, Json(version)))
}

// ─── Approve ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /documents/versions/:id/approve`.
#[derive(Debug, Deserialize)]
pub struct ApproveBody {
  pub notes: Option<String>,
}

/// `POST /documents/versions/:id/approve` — derives an APPROVED version
/// from a PROCESSED source. Approver or admin only. Returns 200.
pub async fn approve<S>(
  State(state): State<AppState<S>>,
  SessionActor(actor): SessionActor,
  Path(id): Path<Uuid>,
  Json(body): Json<ApproveBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: VersionStore + Clone + Send + Sync + 'static,
{
  let actor = require_actor(actor)?;
  let tenant = require_tenant(&actor)?;
  require_role(&actor, Role::APPROVERS)?;
  state.rate_limit(&tenant, "versions.approve")?;

  let version = state
    .store
    .approve(tenant.tenant_id, id, Approval {
      approved_by: actor.user_id.clone(),
      notes:       body.notes,
    })
    .await?;

  state
    .emit_audit(version_event(
      tenant.tenant_id,
      AuditKind::Approve,
      &version,
      &actor.user_id,
      actor.email.as_deref(),
      "version approved",
    ))
    .await;

  Ok(Json(version))
}

// ─── Publish ──────────────────────────────────────────────────────────────────

/// `POST /documents/versions/:id/publish` — derives ACTIVE_FINAL and
/// supersedes the previous active version in the same transaction. Returns
/// 200 + [`PublishOutcome`].
pub async fn publish<S>(
  State(state): State<AppState<S>>,
  SessionActor(actor): SessionActor,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: VersionStore + Clone + Send + Sync + 'static,
{
  let actor = require_actor(actor)?;
  let tenant = require_tenant(&actor)?;
  require_role(&actor, Role::APPROVERS)?;
  state.rate_limit(&tenant, "versions.publish")?;

  let outcome: PublishOutcome = state
    .store
    .publish(tenant.tenant_id, id, actor.user_id.clone())
    .await?;

  let message = match &outcome.superseded {
    Some(s) => format!("version published, superseding {}", s.old_version_id),
    None => "version published".to_owned(),
  };
  state
    .emit_audit(version_event(
      tenant.tenant_id,
      AuditKind::Publish,
      &outcome.published,
      &actor.user_id,
      actor.email.as_deref(),
      &message,
    ))
    .await;

  Ok(Json(outcome))
}

// ─── Reads ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct VersionList {
  pub versions: Vec<ResolvedVersion>,
  pub count:    usize,
}

/// `GET /documents/:id/versions` — newest first, standings resolved.
pub async fn list_for_document<S>(
  State(state): State<AppState<S>>,
  SessionActor(actor): SessionActor,
  Path(id): Path<Uuid>,
) -> Result<Json<VersionList>, ApiError>
where
  S: VersionStore + Clone + Send + Sync + 'static,
{
  let actor = require_actor(actor)?;
  let tenant = require_tenant(&actor)?;

  let versions =
    state.store.versions_for_document(tenant.tenant_id, id).await?;
  let count = versions.len();
  Ok(Json(VersionList { versions, count }))
}

/// `GET /documents/:id/versions/timeline`
pub async fn timeline_for_document<S>(
  State(state): State<AppState<S>>,
  SessionActor(actor): SessionActor,
  Path(id): Path<Uuid>,
) -> Result<Json<VersionTimeline>, ApiError>
where
  S: VersionStore + Clone + Send + Sync + 'static,
{
  let actor = require_actor(actor)?;
  let tenant = require_tenant(&actor)?;

  let versions =
    state.store.versions_for_document(tenant.tenant_id, id).await?;
  Ok(Json(timeline::build(&versions)))
}

/// `GET /documents/versions/:id/content` — the version's bytes, served
/// with its recorded media type. Checksum is verified on every read.
pub async fn content<S>(
  State(state): State<AppState<S>>,
  SessionActor(actor): SessionActor,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: VersionStore + Clone + Send + Sync + 'static,
{
  let actor = require_actor(actor)?;
  let tenant = require_tenant(&actor)?;

  let resolved = state
    .store
    .get_version(tenant.tenant_id, id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("version {id} not found")))?;

  let content = resolved.version.content;
  let bytes = state.blob.get(&content).await.map_err(blob_internal)?;

  Ok(([(header::CONTENT_TYPE, content.media_type)], bytes))
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn blob_internal(e: BlobError) -> ApiError {
  match e {
    BlobError::ChecksumMismatch { .. } => ApiError::Internal(e.to_string()),
    BlobError::Io { .. } => ApiError::Internal(e.to_string()),
  }
}

fn version_event(
  tenant_id: Uuid,
  kind: AuditKind,
  version: &DocumentVersion,
  actor_id: &str,
  actor_name: Option<&str>,
  message: &str,
) -> NewAuditEvent {
  NewAuditEvent::info(
    tenant_id,
    kind,
    EntityType::DocumentVersion,
    version.version_id,
    message,
  )
  .entity_name(format!("document {}", version.document_id))
  .actor(actor_id, actor_name.unwrap_or_default())
}
