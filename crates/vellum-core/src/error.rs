//! Error types for `vellum-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::lifecycle::LifecycleStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("document not found: {0}")]
  DocumentNotFound(Uuid),

  #[error("version not found: {0}")]
  VersionNotFound(Uuid),

  #[error("version {version} is {from:?}, expected {expected:?}")]
  InvalidTransition {
    version:  Uuid,
    from:     LifecycleStatus,
    expected: LifecycleStatus,
  },

  #[error("version {0} is already superseded")]
  AlreadySuperseded(Uuid),

  #[error("concurrent publish in flight for document {0}")]
  PublishConflict(Uuid),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// Backend failure (database, decoding). Carries a message only so the
  /// taxonomy stays backend-agnostic.
  #[error("storage error: {0}")]
  Storage(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
