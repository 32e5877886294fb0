//! JSON REST API for Vellum.
//!
//! Exposes an axum [`Router`] backed by any
//! [`vellum_core::store::VersionStore`]. Requests authenticate with signed
//! bearer session tokens; every handler runs the same guard chain before
//! touching the store: actor → tenant → role → rate limit.

pub mod audit;
pub mod blob;
pub mod documents;
pub mod error;
pub mod session;
pub mod versions;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use vellum_core::{
  actor::TenantRef,
  audit::NewAuditEvent,
  rate_limit::{RateLimiter, RateLimits},
  store::VersionStore,
};

pub use blob::LocalBlobStore;
pub use error::ApiError;
pub use session::{SessionClaims, SessionKey};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  /// Root directory for version content blobs.
  pub content_dir:         PathBuf,
  /// HMAC secret for session tokens. Must be non-empty.
  pub session_secret:      String,
  pub session_ttl_minutes: i64,
  pub rate_per_minute:     u32,
  pub rate_per_day:        u32,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: VersionStore> {
  pub store:    Arc<S>,
  pub blob:     Arc<LocalBlobStore>,
  pub sessions: Arc<SessionKey>,
  pub limiter:  Arc<RateLimiter>,
  pub config:   Arc<ServerConfig>,
}

impl<S: VersionStore> AppState<S> {
  /// Count one write against the tenant's per-endpoint budget.
  pub fn rate_limit(
    &self,
    tenant: &TenantRef,
    endpoint: &str,
  ) -> Result<(), ApiError> {
    let key = format!("{}:{endpoint}", tenant.tenant_id);
    let limits = RateLimits {
      per_minute: self.config.rate_per_minute,
      per_day:    self.config.rate_per_day,
    };
    self.limiter.hit(&key, limits)?;
    Ok(())
  }

  /// Append an audit event, best-effort. The triggering operation has
  /// already committed; a failed audit write is logged and swallowed.
  pub async fn emit_audit(&self, event: NewAuditEvent) {
    if let Err(e) = self.store.append_audit(event).await {
      tracing::warn!(error = %e, "audit write failed");
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the API.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: VersionStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Documents
    .route(
      "/documents",
      get(documents::list::<S>).post(documents::create::<S>),
    )
    .route("/documents/{id}", get(documents::get_one::<S>))
    .route(
      "/documents/{id}/versions",
      get(versions::list_for_document::<S>),
    )
    .route(
      "/documents/{id}/versions/timeline",
      get(versions::timeline_for_document::<S>),
    )
    // Version lifecycle
    .route(
      "/documents/versions/import-raw",
      post(versions::import_raw::<S>),
    )
    .route(
      "/documents/versions/{id}/process",
      post(versions::process::<S>),
    )
    .route(
      "/documents/versions/{id}/approve",
      post(versions::approve::<S>),
    )
    .route(
      "/documents/versions/{id}/publish",
      post(versions::publish::<S>),
    )
    .route(
      "/documents/versions/{id}/content",
      get(versions::content::<S>),
    )
    // Audit
    .route("/audit", get(audit::list::<S>))
    .with_state(state)
}
