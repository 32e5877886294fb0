//! Filesystem blob storage for version content.
//!
//! Content bytes never touch the database; versions carry a
//! [`ContentRef`] pointing into a content directory. Blobs are stored
//! content-addressed under a two-level fan-out (`ab/cd/<sha256>`), so
//! writing the same bytes twice is idempotent and a stored blob is never
//! overwritten with different content.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use vellum_core::version::ContentRef;

#[derive(Debug, Error)]
pub enum BlobError {
  #[error("blob io error at {path}: {source}")]
  Io {
    path:   PathBuf,
    source: std::io::Error,
  },

  /// Stored bytes no longer match the checksum the version recorded.
  #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
  ChecksumMismatch {
    path:     String,
    expected: String,
    actual:   String,
  },
}

fn io_err(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> BlobError {
  let path = path.into();
  move |source| BlobError::Io { path, source }
}

/// Content-addressed blob storage rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
  root: PathBuf,
}

impl LocalBlobStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// The relative storage path for a digest: `ab/cd/<digest>`.
  fn rel_path(digest: &str) -> String {
    format!("{}/{}/{digest}", &digest[..2], &digest[2..4])
  }

  fn abs_path(&self, rel: &str) -> PathBuf {
    self.root.join(rel)
  }

  /// Store `bytes` and return the [`ContentRef`] describing them.
  pub async fn put(
    &self,
    bytes: Vec<u8>,
    media_type: &str,
  ) -> Result<ContentRef, BlobError> {
    let digest = hex::encode(Sha256::digest(&bytes));
    let rel = Self::rel_path(&digest);
    let abs = self.abs_path(&rel);

    let size_bytes = bytes.len() as u64;
    if !tokio::fs::try_exists(&abs).await.map_err(io_err(&abs))? {
      if let Some(parent) = abs.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err(parent))?;
      }
      tokio::fs::write(&abs, &bytes).await.map_err(io_err(&abs))?;
    }

    Ok(ContentRef {
      path:            rel,
      checksum_sha256: digest,
      size_bytes,
      media_type:      media_type.to_owned(),
    })
  }

  /// Read the bytes a [`ContentRef`] points at, verifying the checksum.
  pub async fn get(&self, content: &ContentRef) -> Result<Vec<u8>, BlobError> {
    let abs = self.abs_path(&content.path);
    let bytes = tokio::fs::read(&abs).await.map_err(io_err(&abs))?;

    let actual = hex::encode(Sha256::digest(&bytes));
    if actual != content.checksum_sha256 {
      return Err(BlobError::ChecksumMismatch {
        path:     content.path.clone(),
        expected: content.checksum_sha256.clone(),
        actual,
      });
    }
    Ok(bytes)
  }

  pub fn root(&self) -> &Path { &self.root }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_store() -> LocalBlobStore {
    let root =
      std::env::temp_dir().join(format!("vellum-blob-{}", uuid::Uuid::new_v4()));
    LocalBlobStore::new(root)
  }

  #[tokio::test]
  async fn put_then_get_round_trips() {
    let store = temp_store();
    let content =
      store.put(b"hello world".to_vec(), "text/plain").await.unwrap();

    assert_eq!(content.size_bytes, 11);
    assert_eq!(content.media_type, "text/plain");
    assert_eq!(content.checksum_sha256.len(), 64);
    assert!(content.validate().is_ok());

    let bytes = store.get(&content).await.unwrap();
    assert_eq!(bytes, b"hello world");
  }

  #[tokio::test]
  async fn put_is_idempotent() {
    let store = temp_store();
    let a = store.put(b"same bytes".to_vec(), "text/plain").await.unwrap();
    let b = store.put(b"same bytes".to_vec(), "text/plain").await.unwrap();
    assert_eq!(a, b);
  }

  #[tokio::test]
  async fn corrupted_blob_fails_checksum() {
    let store = temp_store();
    let content = store.put(b"original".to_vec(), "text/plain").await.unwrap();

    let abs = store.root().join(&content.path);
    tokio::fs::write(&abs, b"tampered").await.unwrap();

    let err = store.get(&content).await.unwrap_err();
    assert!(matches!(err, BlobError::ChecksumMismatch { .. }));
  }

  #[tokio::test]
  async fn missing_blob_is_io_error() {
    let store = temp_store();
    let content = ContentRef {
      path:            "aa/bb/missing".into(),
      checksum_sha256: "a".repeat(64),
      size_bytes:      1,
      media_type:      "text/plain".into(),
    };
    assert!(matches!(
      store.get(&content).await.unwrap_err(),
      BlobError::Io { .. }
    ));
  }
}
