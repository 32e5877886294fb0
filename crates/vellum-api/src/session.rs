//! Bearer session tokens and the actor extractor.
//!
//! A token is `base64(claims JSON) . hex(HMAC-SHA256(base64 payload))`,
//! signed with the configured session secret. Verification fails closed:
//! any malformed, tampered, or expired token resolves to *no* actor rather
//! than an error — the guards in handlers decide whether that is a 401.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;
use vellum_core::{
  actor::{Actor, Role},
  store::VersionStore,
};

use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

// ─── Claims ──────────────────────────────────────────────────────────────────

/// The signed payload of a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
  pub user_id:     String,
  pub role:        Role,
  pub tenant_id:   Option<Uuid>,
  pub tenant_slug: Option<String>,
  pub tenant_tier: Option<String>,
  pub email:       Option<String>,
  pub expires_at:  DateTime<Utc>,
}

impl SessionClaims {
  /// Claims for `actor`, expiring `ttl` from now.
  pub fn for_actor(actor: &Actor, ttl: Duration) -> Self {
    Self {
      user_id:     actor.user_id.clone(),
      role:        actor.role,
      tenant_id:   actor.tenant_id,
      tenant_slug: actor.tenant_slug.clone(),
      tenant_tier: actor.tenant_tier.clone(),
      email:       actor.email.clone(),
      expires_at:  Utc::now() + ttl,
    }
  }
}

// ─── Key ─────────────────────────────────────────────────────────────────────

/// The HMAC key used to mint and verify session tokens.
#[derive(Clone)]
pub struct SessionKey {
  secret: Vec<u8>,
}

impl SessionKey {
  pub fn new(secret: &str) -> Self {
    Self { secret: secret.as_bytes().to_vec() }
  }

  fn mac(&self) -> HmacSha256 {
    HmacSha256::new_from_slice(&self.secret)
      .expect("hmac accepts any key length")
  }

  /// Mint a signed token for `claims`.
  pub fn mint(&self, claims: &SessionClaims) -> String {
    let payload =
      B64.encode(serde_json::to_vec(claims).expect("claims serialise"));
    let mut mac = self.mac();
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("{payload}.{signature}")
  }

  /// Resolve a token to an [`Actor`]. Never errors: anything short of a
  /// well-signed, unexpired token with a user id yields `None`.
  pub fn verify(&self, token: &str) -> Option<Actor> {
    let (payload, signature_hex) = token.split_once('.')?;
    let signature = hex::decode(signature_hex).ok()?;

    let mut mac = self.mac();
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature).ok()?;

    let bytes = B64.decode(payload).ok()?;
    let claims: SessionClaims = serde_json::from_slice(&bytes).ok()?;

    if claims.expires_at <= Utc::now() {
      return None;
    }
    if claims.user_id.trim().is_empty() {
      return None;
    }

    Some(Actor {
      user_id:     claims.user_id,
      role:        claims.role,
      tenant_id:   claims.tenant_id,
      tenant_slug: claims.tenant_slug,
      tenant_tier: claims.tenant_tier,
      email:       claims.email,
    })
  }
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// Resolve the actor from request headers — used outside extractors too.
pub fn actor_from_headers(headers: &HeaderMap, key: &SessionKey) -> Option<Actor> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .and_then(|token| key.verify(token))
}

/// The per-request actor, or `None` when unauthenticated. Extraction never
/// rejects; handlers apply `require_actor` themselves.
pub struct SessionActor(pub Option<Actor>);

impl<S> FromRequestParts<AppState<S>> for SessionActor
where
  S: VersionStore + Clone + Send + Sync + 'static,
{
  type Rejection = std::convert::Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    Ok(SessionActor(actor_from_headers(&parts.headers, &state.sessions)))
  }
}
