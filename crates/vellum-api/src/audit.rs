//! Handler for `GET /audit`.

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use uuid::Uuid;
use vellum_core::{
  actor::{require_actor, require_tenant},
  audit::AuditEvent,
  store::VersionStore,
};

use crate::{AppState, error::ApiError, session::SessionActor};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Required: the document or version whose audit trail to return.
  pub entity_id: Uuid,
}

/// `GET /audit?entity_id=<id>` — events for the entity within the actor's
/// tenant, newest first. Any authenticated tenant member may read.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  SessionActor(actor): SessionActor,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<AuditEvent>>, ApiError>
where
  S: VersionStore + Clone + Send + Sync + 'static,
{
  let actor = require_actor(actor)?;
  let tenant = require_tenant(&actor)?;

  let events = state
    .store
    .audit_for_entity(tenant.tenant_id, params.entity_id)
    .await?;
  Ok(Json(events))
}
