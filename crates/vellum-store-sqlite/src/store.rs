//! [`SqliteStore`] — the SQLite implementation of [`VersionStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use vellum_core::{
  Error, Result,
  audit::{AuditEvent, NewAuditEvent},
  lifecycle::{
    LifecycleStatus, PublishOutcome, ResolvedVersion, Supersession,
    ensure_transition,
  },
  store::VersionStore,
  version::{Approval, ContentRef, Document, DocumentVersion, NewDocument, NewRawVersion},
};

use crate::{
  encode::{
    RawAuditEvent, RawDocument, RawResolvedVersion, RawVersion, decode_status,
    decode_uuid, encode_dt, encode_entity_type, encode_kind, encode_severity,
    encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

fn db(e: tokio_rusqlite::Error) -> Error { Error::Storage(e.to_string()) }

const VERSION_COLUMNS: &str = "v.version_id, v.document_id, v.status, \
   v.content_path, v.checksum_sha256, v.size_bytes, v.media_type, \
   v.derived_from, v.created_by, v.notes, v.created_at";

fn version_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawVersion> {
  Ok(RawVersion {
    version_id:      row.get(0)?,
    document_id:     row.get(1)?,
    status:          row.get(2)?,
    content_path:    row.get(3)?,
    checksum_sha256: row.get(4)?,
    size_bytes:      row.get(5)?,
    media_type:      row.get(6)?,
    derived_from:    row.get(7)?,
    created_by:      row.get(8)?,
    notes:           row.get(9)?,
    created_at:      row.get(10)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Vellum store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// serialise onto one connection; `publish` additionally wraps its writes in
/// an explicit transaction so supersede-and-activate commit as a unit.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await.map_err(db)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(db)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(db)
  }

  /// Fetch one version row scoped to `tenant_id`. Cross-tenant rows behave
  /// as absent.
  async fn fetch_version(
    &self,
    tenant_id: Uuid,
    version_id: Uuid,
  ) -> Result<Option<DocumentVersion>> {
    let tenant_str = encode_uuid(tenant_id);
    let id_str = encode_uuid(version_id);

    let raw: Option<RawVersion> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {VERSION_COLUMNS}
           FROM document_versions v
           JOIN documents d ON d.document_id = v.document_id
           WHERE v.version_id = ?1 AND d.tenant_id = ?2"
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str, tenant_str], version_from_row)
            .optional()?,
        )
      })
      .await
      .map_err(db)?;

    raw.map(RawVersion::into_version).transpose()
  }

  /// Insert a fully-built [`DocumentVersion`] row.
  async fn insert_version(&self, v: &DocumentVersion) -> Result<()> {
    let version_id_str  = encode_uuid(v.version_id);
    let document_id_str = encode_uuid(v.document_id);
    let status_str      = encode_status(v.status).to_owned();
    let content_path    = v.content.path.clone();
    let checksum        = v.content.checksum_sha256.clone();
    let size_bytes      = v.content.size_bytes as i64;
    let media_type      = v.content.media_type.clone();
    let derived_str     = v.derived_from.map(encode_uuid);
    let created_by      = v.created_by.clone();
    let notes           = v.notes.clone();
    let created_at_str  = encode_dt(v.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO document_versions (
             version_id, document_id, status, content_path, checksum_sha256,
             size_bytes, media_type, derived_from, created_by, notes, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            version_id_str,
            document_id_str,
            status_str,
            content_path,
            checksum,
            size_bytes,
            media_type,
            derived_str,
            created_by,
            notes,
            created_at_str,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(db)
  }

  /// Append one version derived from `source`, after validating the
  /// transition. Shared by `process` and `approve`.
  async fn derive_version(
    &self,
    tenant_id: Uuid,
    source_version_id: Uuid,
    to: LifecycleStatus,
    content: ContentRef,
    created_by: String,
    notes: Option<String>,
  ) -> Result<DocumentVersion> {
    let source = self
      .fetch_version(tenant_id, source_version_id)
      .await?
      .ok_or(Error::VersionNotFound(source_version_id))?;

    ensure_transition(source_version_id, source.status, to)?;

    let version = DocumentVersion {
      version_id:   Uuid::new_v4(),
      document_id:  source.document_id,
      status:       to,
      content,
      derived_from: Some(source_version_id),
      created_by,
      notes,
      created_at:   Utc::now(),
    };
    self.insert_version(&version).await?;
    Ok(version)
  }
}

// ─── VersionStore impl ───────────────────────────────────────────────────────

impl VersionStore for SqliteStore {
  // ── Documents ─────────────────────────────────────────────────────────────

  async fn create_document(
    &self,
    tenant_id: Uuid,
    input: NewDocument,
  ) -> Result<Document> {
    input.validate()?;

    let document = Document {
      document_id: Uuid::new_v4(),
      tenant_id,
      title:       input.title,
      created_by:  input.created_by,
      created_at:  Utc::now(),
    };

    let id_str     = encode_uuid(document.document_id);
    let tenant_str = encode_uuid(tenant_id);
    let title      = document.title.clone();
    let created_by = document.created_by.clone();
    let at_str     = encode_dt(document.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (document_id, tenant_id, title, created_by, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, tenant_str, title, created_by, at_str],
        )?;
        Ok(())
      })
      .await
      .map_err(db)?;

    Ok(document)
  }

  async fn get_document(
    &self,
    tenant_id: Uuid,
    document_id: Uuid,
  ) -> Result<Option<Document>> {
    let tenant_str = encode_uuid(tenant_id);
    let id_str = encode_uuid(document_id);

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT document_id, tenant_id, title, created_by, created_at
               FROM documents WHERE document_id = ?1 AND tenant_id = ?2",
              rusqlite::params![id_str, tenant_str],
              |row| {
                Ok(RawDocument {
                  document_id: row.get(0)?,
                  tenant_id:   row.get(1)?,
                  title:       row.get(2)?,
                  created_by:  row.get(3)?,
                  created_at:  row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(db)?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn list_documents(&self, tenant_id: Uuid) -> Result<Vec<Document>> {
    let tenant_str = encode_uuid(tenant_id);

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT document_id, tenant_id, title, created_by, created_at
           FROM documents WHERE tenant_id = ?1
           ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![tenant_str], |row| {
            Ok(RawDocument {
              document_id: row.get(0)?,
              tenant_id:   row.get(1)?,
              title:       row.get(2)?,
              created_by:  row.get(3)?,
              created_at:  row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db)?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }

  // ── Lifecycle transitions ─────────────────────────────────────────────────

  async fn import_raw(
    &self,
    tenant_id: Uuid,
    input: NewRawVersion,
  ) -> Result<DocumentVersion> {
    input.validate()?;

    let document = self
      .get_document(tenant_id, input.document_id)
      .await?
      .ok_or(Error::DocumentNotFound(input.document_id))?;

    let version = DocumentVersion {
      version_id:   Uuid::new_v4(),
      document_id:  document.document_id,
      status:       LifecycleStatus::Raw,
      content:      input.content,
      derived_from: None,
      created_by:   input.created_by,
      notes:        input.notes,
      created_at:   Utc::now(),
    };
    self.insert_version(&version).await?;
    Ok(version)
  }

  async fn process(
    &self,
    tenant_id: Uuid,
    source_version_id: Uuid,
    content: ContentRef,
    created_by: String,
  ) -> Result<DocumentVersion> {
    content.validate()?;
    self
      .derive_version(
        tenant_id,
        source_version_id,
        LifecycleStatus::Processed,
        content,
        created_by,
        None,
      )
      .await
  }

  async fn approve(
    &self,
    tenant_id: Uuid,
    version_id: Uuid,
    approval: Approval,
  ) -> Result<DocumentVersion> {
    if approval.approved_by.trim().is_empty() {
      return Err(Error::Validation("approved_by is required".into()));
    }

    // Approval carries the source content forward unchanged.
    let source = self
      .fetch_version(tenant_id, version_id)
      .await?
      .ok_or(Error::VersionNotFound(version_id))?;

    ensure_transition(version_id, source.status, LifecycleStatus::Approved)?;

    let version = DocumentVersion {
      version_id:   Uuid::new_v4(),
      document_id:  source.document_id,
      status:       LifecycleStatus::Approved,
      content:      source.content,
      derived_from: Some(version_id),
      created_by:   approval.approved_by,
      notes:        approval.notes,
      created_at:   Utc::now(),
    };
    self.insert_version(&version).await?;
    Ok(version)
  }

  async fn publish(
    &self,
    tenant_id: Uuid,
    version_id: Uuid,
    published_by: String,
  ) -> Result<PublishOutcome> {
    let tenant_str  = encode_uuid(tenant_id);
    let source_str  = encode_uuid(version_id);
    let new_id      = Uuid::new_v4();
    let new_id_str  = encode_uuid(new_id);
    let sup_id      = Uuid::new_v4();
    let sup_id_str  = encode_uuid(sup_id);
    let now         = Utc::now();
    let now_str     = encode_dt(now);
    let creator     = published_by.clone();

    // The whole supersede-and-activate pair runs in one transaction so the
    // single-active invariant holds even if the process dies mid-publish.
    let outcome: Result<(RawVersion, Option<String>)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let sql = format!(
          "SELECT {VERSION_COLUMNS}
           FROM document_versions v
           JOIN documents d ON d.document_id = v.document_id
           WHERE v.version_id = ?1 AND d.tenant_id = ?2"
        );
        let source: Option<RawVersion> = tx
          .query_row(&sql, rusqlite::params![source_str, tenant_str], version_from_row)
          .optional()?;

        let source = match source {
          Some(s) => s,
          None => return Ok(Err(Error::VersionNotFound(version_id))),
        };

        if source.status != "APPROVED" {
          let from = match decode_status(&source.status) {
            Ok(s) => s,
            Err(e) => return Ok(Err(e)),
          };
          return Ok(Err(Error::InvalidTransition {
            version:  version_id,
            from,
            expected: LifecycleStatus::Approved,
          }));
        }

        let document_id = match decode_uuid(&source.document_id) {
          Ok(id) => id,
          Err(e) => return Ok(Err(e)),
        };

        // An APPROVED version is consumed by exactly one publish.
        let already: Option<String> = tx
          .query_row(
            "SELECT version_id FROM document_versions
             WHERE derived_from = ?1 AND status = 'ACTIVE_FINAL'",
            rusqlite::params![source_str],
            |r| r.get(0),
          )
          .optional()?;
        if already.is_some() {
          return Ok(Err(Error::PublishConflict(document_id)));
        }

        // The document's current active version, if any.
        let old_active: Option<String> = tx
          .query_row(
            "SELECT v.version_id FROM document_versions v
             WHERE v.document_id = ?1 AND v.status = 'ACTIVE_FINAL'
               AND v.version_id NOT IN
                   (SELECT old_version_id FROM supersessions)",
            rusqlite::params![source.document_id],
            |r| r.get(0),
          )
          .optional()?;

        tx.execute(
          "INSERT INTO document_versions (
             version_id, document_id, status, content_path, checksum_sha256,
             size_bytes, media_type, derived_from, created_by, notes, created_at
           ) VALUES (?1, ?2, 'ACTIVE_FINAL', ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9)",
          rusqlite::params![
            new_id_str,
            source.document_id,
            source.content_path,
            source.checksum_sha256,
            source.size_bytes,
            source.media_type,
            source_str,
            creator,
            now_str,
          ],
        )?;

        if let Some(old_id) = &old_active {
          tx.execute(
            "INSERT INTO supersessions
               (supersession_id, old_version_id, new_version_id, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![sup_id_str, old_id, new_id_str, now_str],
          )?;
        }

        tx.commit()?;
        Ok(Ok((source, old_active)))
      })
      .await
      .map_err(db)?;

    let (source, old_active) = outcome?;

    let published = DocumentVersion {
      version_id:   new_id,
      document_id:  decode_uuid(&source.document_id)?,
      status:       LifecycleStatus::ActiveFinal,
      content:      ContentRef {
        path:            source.content_path,
        checksum_sha256: source.checksum_sha256,
        size_bytes:      source.size_bytes as u64,
        media_type:      source.media_type,
      },
      derived_from: Some(version_id),
      created_by:   published_by,
      notes:        None,
      created_at:   now,
    };

    let superseded = old_active
      .map(|old_id| {
        Ok::<_, Error>(Supersession {
          supersession_id: sup_id,
          old_version_id:  decode_uuid(&old_id)?,
          new_version_id:  new_id,
          recorded_at:     now,
        })
      })
      .transpose()?;

    Ok(PublishOutcome { published, superseded })
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_version(
    &self,
    tenant_id: Uuid,
    version_id: Uuid,
  ) -> Result<Option<ResolvedVersion>> {
    let tenant_str = encode_uuid(tenant_id);
    let id_str = encode_uuid(version_id);

    let raw: Option<RawResolvedVersion> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {VERSION_COLUMNS}, s.new_version_id, s.recorded_at
           FROM document_versions v
           JOIN documents d ON d.document_id = v.document_id
           LEFT JOIN supersessions s ON s.old_version_id = v.version_id
           WHERE v.version_id = ?1 AND d.tenant_id = ?2"
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str, tenant_str], |row| {
              Ok(RawResolvedVersion {
                version:       version_from_row(row)?,
                superseded_by: row.get(11)?,
                superseded_at: row.get(12)?,
              })
            })
            .optional()?,
        )
      })
      .await
      .map_err(db)?;

    raw.map(RawResolvedVersion::into_resolved).transpose()
  }

  async fn versions_for_document(
    &self,
    tenant_id: Uuid,
    document_id: Uuid,
  ) -> Result<Vec<ResolvedVersion>> {
    let tenant_str = encode_uuid(tenant_id);
    let doc_str = encode_uuid(document_id);

    let raws: Vec<RawResolvedVersion> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {VERSION_COLUMNS}, s.new_version_id, s.recorded_at
           FROM document_versions v
           JOIN documents d ON d.document_id = v.document_id
           LEFT JOIN supersessions s ON s.old_version_id = v.version_id
           WHERE v.document_id = ?1 AND d.tenant_id = ?2
           ORDER BY v.created_at DESC, v.rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![doc_str, tenant_str], |row| {
            Ok(RawResolvedVersion {
              version:       version_from_row(row)?,
              superseded_by: row.get(11)?,
              superseded_at: row.get(12)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db)?;

    raws
      .into_iter()
      .map(RawResolvedVersion::into_resolved)
      .collect()
  }

  async fn active_version(
    &self,
    tenant_id: Uuid,
    document_id: Uuid,
  ) -> Result<Option<ResolvedVersion>> {
    let versions = self.versions_for_document(tenant_id, document_id).await?;
    Ok(versions.into_iter().find(ResolvedVersion::is_active))
  }

  // ── Audit ─────────────────────────────────────────────────────────────────

  async fn append_audit(&self, input: NewAuditEvent) -> Result<AuditEvent> {
    let event = AuditEvent {
      audit_id:    Uuid::new_v4(),
      tenant_id:   input.tenant_id,
      kind:        input.kind,
      severity:    input.severity,
      message:     input.message,
      entity_type: input.entity_type,
      entity_id:   input.entity_id,
      entity_name: input.entity_name,
      actor_id:    input.actor_id,
      actor_name:  input.actor_name,
      recorded_at: Utc::now(),
    };

    let audit_id_str  = encode_uuid(event.audit_id);
    let tenant_str    = encode_uuid(event.tenant_id);
    let kind_str      = encode_kind(event.kind).to_owned();
    let severity_str  = encode_severity(event.severity).to_owned();
    let message       = event.message.clone();
    let entity_type   = encode_entity_type(event.entity_type).to_owned();
    let entity_id_str = encode_uuid(event.entity_id);
    let entity_name   = event.entity_name.clone();
    let actor_id      = event.actor_id.clone();
    let actor_name    = event.actor_name.clone();
    let at_str        = encode_dt(event.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO audit_events (
             audit_id, tenant_id, kind, severity, message,
             entity_type, entity_id, entity_name, actor_id, actor_name,
             recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            audit_id_str,
            tenant_str,
            kind_str,
            severity_str,
            message,
            entity_type,
            entity_id_str,
            entity_name,
            actor_id,
            actor_name,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(db)?;

    Ok(event)
  }

  async fn audit_for_entity(
    &self,
    tenant_id: Uuid,
    entity_id: Uuid,
  ) -> Result<Vec<AuditEvent>> {
    let tenant_str = encode_uuid(tenant_id);
    let entity_str = encode_uuid(entity_id);

    let raws: Vec<RawAuditEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT audit_id, tenant_id, kind, severity, message,
                  entity_type, entity_id, entity_name, actor_id, actor_name,
                  recorded_at
           FROM audit_events
           WHERE tenant_id = ?1 AND entity_id = ?2
           ORDER BY recorded_at DESC, rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![tenant_str, entity_str], |row| {
            Ok(RawAuditEvent {
              audit_id:    row.get(0)?,
              tenant_id:   row.get(1)?,
              kind:        row.get(2)?,
              severity:    row.get(3)?,
              message:     row.get(4)?,
              entity_type: row.get(5)?,
              entity_id:   row.get(6)?,
              entity_name: row.get(7)?,
              actor_id:    row.get(8)?,
              actor_name:  row.get(9)?,
              recorded_at: row.get(10)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db)?;

    raws.into_iter().map(RawAuditEvent::into_event).collect()
  }
}
