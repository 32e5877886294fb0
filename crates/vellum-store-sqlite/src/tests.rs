//! Integration tests for `SqliteStore` against an in-memory database.

use uuid::Uuid;
use vellum_core::{
  Error,
  audit::{AuditKind, EntityType, NewAuditEvent},
  lifecycle::{LifecycleStatus, Standing},
  store::VersionStore,
  version::{Approval, ContentRef, Document, NewDocument, NewRawVersion},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn content(label: &str) -> ContentRef {
  ContentRef {
    path:            format!("ab/cd/{label}.pdf"),
    checksum_sha256: "ab".repeat(32),
    size_bytes:      2048,
    media_type:      "application/pdf".into(),
  }
}

async fn document(s: &SqliteStore, tenant_id: Uuid) -> Document {
  s.create_document(
    tenant_id,
    NewDocument {
      title:      "FY26 Comp Plan".into(),
      created_by: "u-alice".into(),
    },
  )
  .await
  .unwrap()
}

fn raw_input(document_id: Uuid) -> NewRawVersion {
  NewRawVersion {
    document_id,
    content:    content("upload"),
    created_by: "u-alice".into(),
    notes:      None,
  }
}

// ─── Documents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_document() {
  let s = store().await;
  let tenant = Uuid::new_v4();

  let doc = document(&s, tenant).await;
  assert_eq!(doc.tenant_id, tenant);

  let fetched = s.get_document(tenant, doc.document_id).await.unwrap();
  assert!(fetched.is_some());
  assert_eq!(fetched.unwrap().title, "FY26 Comp Plan");
}

#[tokio::test]
async fn get_document_missing_returns_none() {
  let s = store().await;
  let result = s.get_document(Uuid::new_v4(), Uuid::new_v4()).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn documents_are_tenant_scoped() {
  let s = store().await;
  let tenant_a = Uuid::new_v4();
  let tenant_b = Uuid::new_v4();

  let doc = document(&s, tenant_a).await;

  // The other tenant cannot see it.
  let fetched = s.get_document(tenant_b, doc.document_id).await.unwrap();
  assert!(fetched.is_none());
  assert!(s.list_documents(tenant_b).await.unwrap().is_empty());
  assert_eq!(s.list_documents(tenant_a).await.unwrap().len(), 1);
}

#[tokio::test]
async fn create_document_rejects_blank_title() {
  let s = store().await;
  let err = s
    .create_document(
      Uuid::new_v4(),
      NewDocument { title: "  ".into(), created_by: "u-1".into() },
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

// ─── Import ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn import_raw_creates_raw_version() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let doc = document(&s, tenant).await;

  let version = s.import_raw(tenant, raw_input(doc.document_id)).await.unwrap();
  assert_eq!(version.status, LifecycleStatus::Raw);
  assert_eq!(version.document_id, doc.document_id);
  assert!(version.derived_from.is_none());

  let versions = s
    .versions_for_document(tenant, doc.document_id)
    .await
    .unwrap();
  assert_eq!(versions.len(), 1);
  assert!(versions[0].standing.is_current());
}

#[tokio::test]
async fn import_raw_unknown_document_errors() {
  let s = store().await;
  let err = s
    .import_raw(Uuid::new_v4(), raw_input(Uuid::new_v4()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DocumentNotFound(_)));
}

#[tokio::test]
async fn import_raw_rejects_bad_checksum() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let doc = document(&s, tenant).await;

  let mut input = raw_input(doc.document_id);
  input.content.checksum_sha256 = "not-hex".into();
  let err = s.import_raw(tenant, input).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

// ─── Process / approve ───────────────────────────────────────────────────────

#[tokio::test]
async fn process_derives_processed_version() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let doc = document(&s, tenant).await;
  let raw = s.import_raw(tenant, raw_input(doc.document_id)).await.unwrap();

  let processed = s
    .process(tenant, raw.version_id, content("markdown"), "u-bob".into())
    .await
    .unwrap();
  assert_eq!(processed.status, LifecycleStatus::Processed);
  assert_eq!(processed.derived_from, Some(raw.version_id));
  assert_eq!(processed.document_id, doc.document_id);
}

#[tokio::test]
async fn process_non_raw_source_errors() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let doc = document(&s, tenant).await;
  let raw = s.import_raw(tenant, raw_input(doc.document_id)).await.unwrap();
  let processed = s
    .process(tenant, raw.version_id, content("md"), "u-bob".into())
    .await
    .unwrap();

  // Processing a PROCESSED version skips no stage but repeats one.
  let err = s
    .process(tenant, processed.version_id, content("md2"), "u-bob".into())
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidTransition { from: LifecycleStatus::Processed, .. }
  ));
}

#[tokio::test]
async fn process_missing_source_errors() {
  let s = store().await;
  let err = s
    .process(Uuid::new_v4(), Uuid::new_v4(), content("md"), "u".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::VersionNotFound(_)));
}

#[tokio::test]
async fn approve_requires_processed_source() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let doc = document(&s, tenant).await;
  let raw = s.import_raw(tenant, raw_input(doc.document_id)).await.unwrap();

  // Approving a RAW version skips the processing stage.
  let err = s
    .approve(
      tenant,
      raw.version_id,
      Approval { approved_by: "u-carol".into(), notes: None },
    )
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidTransition {
      from:     LifecycleStatus::Raw,
      expected: LifecycleStatus::Processed,
      ..
    }
  ));

  // No version row was created by the failed attempt.
  let versions = s
    .versions_for_document(tenant, doc.document_id)
    .await
    .unwrap();
  assert_eq!(versions.len(), 1);
}

#[tokio::test]
async fn approve_carries_content_and_notes() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let doc = document(&s, tenant).await;
  let raw = s.import_raw(tenant, raw_input(doc.document_id)).await.unwrap();
  let processed = s
    .process(tenant, raw.version_id, content("md"), "u-bob".into())
    .await
    .unwrap();

  let approved = s
    .approve(
      tenant,
      processed.version_id,
      Approval {
        approved_by: "u-carol".into(),
        notes:       Some("meets policy".into()),
      },
    )
    .await
    .unwrap();

  assert_eq!(approved.status, LifecycleStatus::Approved);
  assert_eq!(approved.content, processed.content);
  assert_eq!(approved.notes.as_deref(), Some("meets policy"));
  assert_eq!(approved.created_by, "u-carol");
}

// ─── Publish ─────────────────────────────────────────────────────────────────

/// Walk one import through the full pipeline, returning the APPROVED id.
async fn approved_version(s: &SqliteStore, tenant: Uuid, doc: Uuid) -> Uuid {
  let raw = s.import_raw(tenant, raw_input(doc)).await.unwrap();
  let processed = s
    .process(tenant, raw.version_id, content("md"), "u-bob".into())
    .await
    .unwrap();
  s.approve(
    tenant,
    processed.version_id,
    Approval { approved_by: "u-carol".into(), notes: None },
  )
  .await
  .unwrap()
  .version_id
}

#[tokio::test]
async fn first_publish_has_no_supersession() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let doc = document(&s, tenant).await;
  let approved = approved_version(&s, tenant, doc.document_id).await;

  let outcome = s.publish(tenant, approved, "u-dana".into()).await.unwrap();
  assert_eq!(outcome.published.status, LifecycleStatus::ActiveFinal);
  assert!(outcome.superseded.is_none());

  let active = s.active_version(tenant, doc.document_id).await.unwrap();
  assert_eq!(
    active.unwrap().version.version_id,
    outcome.published.version_id
  );
}

#[tokio::test]
async fn publish_supersedes_previous_active() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let doc = document(&s, tenant).await;

  let first = approved_version(&s, tenant, doc.document_id).await;
  let first_pub = s.publish(tenant, first, "u-dana".into()).await.unwrap();

  // A second pipeline run for the same document.
  let second = approved_version(&s, tenant, doc.document_id).await;
  let second_pub = s.publish(tenant, second, "u-dana".into()).await.unwrap();

  let sup = second_pub.superseded.expect("previous active superseded");
  assert_eq!(sup.old_version_id, first_pub.published.version_id);
  assert_eq!(sup.new_version_id, second_pub.published.version_id);

  // Exactly one current ACTIVE_FINAL at any observed instant.
  let versions = s
    .versions_for_document(tenant, doc.document_id)
    .await
    .unwrap();
  let active: Vec<_> = versions.iter().filter(|rv| rv.is_active()).collect();
  assert_eq!(active.len(), 1);
  assert_eq!(
    active[0].version.version_id,
    second_pub.published.version_id
  );

  let old = versions
    .iter()
    .find(|rv| rv.version.version_id == first_pub.published.version_id)
    .unwrap();
  assert!(matches!(
    old.standing,
    Standing::Superseded { by, .. } if by == second_pub.published.version_id
  ));
}

#[tokio::test]
async fn double_publish_of_same_version_conflicts() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let doc = document(&s, tenant).await;
  let approved = approved_version(&s, tenant, doc.document_id).await;

  s.publish(tenant, approved, "u-dana".into()).await.unwrap();
  let err = s
    .publish(tenant, approved, "u-erin".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::PublishConflict(id) if id == doc.document_id));

  // Exactly one new ACTIVE_FINAL version resulted, not two.
  let versions = s
    .versions_for_document(tenant, doc.document_id)
    .await
    .unwrap();
  let finals: Vec<_> = versions
    .iter()
    .filter(|rv| rv.version.status == LifecycleStatus::ActiveFinal)
    .collect();
  assert_eq!(finals.len(), 1);
}

#[tokio::test]
async fn publish_unapproved_version_errors() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let doc = document(&s, tenant).await;
  let raw = s.import_raw(tenant, raw_input(doc.document_id)).await.unwrap();

  let err = s
    .publish(tenant, raw.version_id, "u-dana".into())
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidTransition {
      from:     LifecycleStatus::Raw,
      expected: LifecycleStatus::Approved,
      ..
    }
  ));
}

#[tokio::test]
async fn publish_cross_tenant_behaves_as_absent() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let doc = document(&s, tenant).await;
  let approved = approved_version(&s, tenant, doc.document_id).await;

  let err = s
    .publish(Uuid::new_v4(), approved, "u-mallory".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::VersionNotFound(_)));
}

// ─── Full pipeline ───────────────────────────────────────────────────────────

#[tokio::test]
async fn pipeline_leaves_four_versions_in_order() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let doc = document(&s, tenant).await;
  let approved = approved_version(&s, tenant, doc.document_id).await;
  s.publish(tenant, approved, "u-dana".into()).await.unwrap();

  let versions = s
    .versions_for_document(tenant, doc.document_id)
    .await
    .unwrap();
  assert_eq!(versions.len(), 4);

  // Newest first.
  let statuses: Vec<_> = versions.iter().map(|rv| rv.version.status).collect();
  assert_eq!(
    statuses,
    vec![
      LifecycleStatus::ActiveFinal,
      LifecycleStatus::Approved,
      LifecycleStatus::Processed,
      LifecycleStatus::Raw,
    ]
  );

  // Each derived row references its predecessor.
  for pair in versions.windows(2) {
    assert_eq!(
      pair[0].version.derived_from,
      Some(pair[1].version.version_id)
    );
  }
}

// ─── Audit ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn audit_append_and_read_back() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let entity = Uuid::new_v4();

  let event = s
    .append_audit(
      NewAuditEvent::info(
        tenant,
        AuditKind::Import,
        EntityType::DocumentVersion,
        entity,
        "imported raw version",
      )
      .entity_name("FY26 Comp Plan")
      .actor("u-alice", "Alice"),
    )
    .await
    .unwrap();
  assert_eq!(event.kind, AuditKind::Import);

  let events = s.audit_for_entity(tenant, entity).await.unwrap();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].audit_id, event.audit_id);
  assert_eq!(events[0].actor_name, "Alice");
}

#[tokio::test]
async fn audit_reads_are_tenant_scoped() {
  let s = store().await;
  let tenant_a = Uuid::new_v4();
  let tenant_b = Uuid::new_v4();
  let entity = Uuid::new_v4();

  s.append_audit(NewAuditEvent::info(
    tenant_a,
    AuditKind::Create,
    EntityType::Document,
    entity,
    "created",
  ))
  .await
  .unwrap();

  assert!(s.audit_for_entity(tenant_b, entity).await.unwrap().is_empty());
  assert_eq!(s.audit_for_entity(tenant_a, entity).await.unwrap().len(), 1);
}
