//! The resolved per-request identity and its guard functions.
//!
//! Guards are pure and deterministic: they mutate nothing and are expected
//! to run before any store write, so an authorization failure never leaves
//! partial side effects. Call order: authenticate → tenant → role →
//! business operation.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ─── Role ────────────────────────────────────────────────────────────────────

/// The actor's role within its tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Approver,
  Editor,
  Viewer,
}

impl Role {
  pub const ALL: [Role; 4] =
    [Self::Admin, Self::Approver, Self::Editor, Self::Viewer];

  /// Roles allowed to create documents and drive import/process.
  pub const CONTRIBUTORS: &[Role] = &[Self::Admin, Self::Approver, Self::Editor];

  /// Roles allowed to approve and publish.
  pub const APPROVERS: &[Role] = &[Self::Admin, Self::Approver];
}

// ─── Actor ───────────────────────────────────────────────────────────────────

/// The authenticated principal making a request. Constructed only by the
/// session layer; a session missing user id or role never yields an actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
  pub user_id:     String,
  pub role:        Role,
  pub tenant_id:   Option<Uuid>,
  pub tenant_slug: Option<String>,
  pub tenant_tier: Option<String>,
  pub email:       Option<String>,
}

/// The tenant scope extracted from an actor by [`require_tenant`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantRef {
  pub tenant_id: Uuid,
  pub slug:      String,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
  /// No session, or the session could not be resolved to an actor.
  #[error("unauthorized")]
  Unauthorized,

  /// Authenticated but not scoped to a tenant. Stable code `tenant_missing`.
  #[error("tenant_missing")]
  TenantMissing,

  /// Authenticated but the role is not in the allowed set. Stable code
  /// `forbidden`.
  #[error("forbidden")]
  Forbidden,
}

// ─── Guards ──────────────────────────────────────────────────────────────────

/// Fail with [`AuthError::Unauthorized`] unless a resolved actor is present.
pub fn require_actor(actor: Option<Actor>) -> Result<Actor, AuthError> {
  actor.ok_or(AuthError::Unauthorized)
}

/// Fail with [`AuthError::TenantMissing`] unless the actor carries both a
/// tenant id and slug.
pub fn require_tenant(actor: &Actor) -> Result<TenantRef, AuthError> {
  match (actor.tenant_id, actor.tenant_slug.as_deref()) {
    (Some(tenant_id), Some(slug)) if !slug.is_empty() => Ok(TenantRef {
      tenant_id,
      slug: slug.to_owned(),
    }),
    _ => Err(AuthError::TenantMissing),
  }
}

/// Fail with [`AuthError::Forbidden`] unless the actor's role is in
/// `allowed`.
pub fn require_role(actor: &Actor, allowed: &[Role]) -> Result<(), AuthError> {
  if allowed.contains(&actor.role) {
    Ok(())
  } else {
    Err(AuthError::Forbidden)
  }
}
