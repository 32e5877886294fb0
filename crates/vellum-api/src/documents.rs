//! Handlers for `/documents` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/documents` | All documents in the actor's tenant, newest first |
//! | `POST` | `/documents` | Body: [`CreateDocumentBody`]; returns 201 + document |
//! | `GET`  | `/documents/:id` | Single document |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use vellum_core::{
  actor::{Role, require_actor, require_role, require_tenant},
  audit::{AuditKind, EntityType, NewAuditEvent},
  store::VersionStore,
  version::{Document, NewDocument},
};

use crate::{AppState, error::ApiError, session::SessionActor};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /documents`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  SessionActor(actor): SessionActor,
) -> Result<Json<Vec<Document>>, ApiError>
where
  S: VersionStore + Clone + Send + Sync + 'static,
{
  let actor = require_actor(actor)?;
  let tenant = require_tenant(&actor)?;

  let documents = state.store.list_documents(tenant.tenant_id).await?;
  Ok(Json(documents))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /documents/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  SessionActor(actor): SessionActor,
  Path(id): Path<Uuid>,
) -> Result<Json<Document>, ApiError>
where
  S: VersionStore + Clone + Send + Sync + 'static,
{
  let actor = require_actor(actor)?;
  let tenant = require_tenant(&actor)?;

  let document = state
    .store
    .get_document(tenant.tenant_id, id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("document {id} not found")))?;
  Ok(Json(document))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /documents`.
#[derive(Debug, Deserialize)]
pub struct CreateDocumentBody {
  pub title: String,
}

/// `POST /documents` — returns 201 + the stored [`Document`].
pub async fn create<S>(
  State(state): State<AppState<S>>,
  SessionActor(actor): SessionActor,
  Json(body): Json<CreateDocumentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: VersionStore + Clone + Send + Sync + 'static,
{
  let actor = require_actor(actor)?;
  let tenant = require_tenant(&actor)?;
  require_role(&actor, Role::CONTRIBUTORS)?;
  state.rate_limit(&tenant, "documents.create")?;

  let document = state
    .store
    .create_document(tenant.tenant_id, NewDocument {
      title:      body.title,
      created_by: actor.user_id.clone(),
    })
    .await?;

  state
    .emit_audit(
      NewAuditEvent::info(
        tenant.tenant_id,
        AuditKind::Create,
        EntityType::Document,
        document.document_id,
        format!("document '{}' created", document.title),
      )
      .entity_name(document.title.clone())
      .actor(actor.user_id.clone(), actor.email.clone().unwrap_or_default()),
    )
    .await;

  Ok((StatusCode::CREATED, Json(document)))
}
