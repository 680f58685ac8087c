mod common;

use common::*;
use docket_backend::error::ReconcileError;
use async_trait::async_trait;
use docket_backend::object_store::{MemoryObjectStore, ObjectStore, ObjectStoreError};
use docket_backend::store::reminders;
use docket_common::model::conflict::ConflictReport;
use docket_common::model::workspace::{ReminderConfig, WorkspaceStatus};
use docket_common::jobs::ArchiveJobStatus;
use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use zip::ZipArchive;

fn entries(archive: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut reader = ZipArchive::new(Cursor::new(archive)).expect("zip archive");
    (0..reader.len())
        .map(|i| {
            let mut file = reader.by_index(i).expect("entry");
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes).expect("read entry");
            (file.name().to_string(), bytes)
        })
        .collect()
}

fn entry_names(archive: &[u8]) -> Vec<String> {
    entries(archive).into_iter().map(|(name, _)| name).collect()
}

fn entry_bytes(archive: &[u8]) -> Vec<Vec<u8>> {
    entries(archive).into_iter().map(|(_, bytes)| bytes).collect()
}

/// Workspace W with participants A (with email) and B, and requirement R1.
async fn seeded(h: &Harness) -> String {
    let ws = h.workspace().await;
    h.apply_settled(
        &ws,
        desired(
            vec![person("A", Some("a@x.com")), person("B", None)],
            vec![doc("R1", vec![])],
        ),
    )
    .await;
    ws
}

#[tokio::test]
async fn removing_items_without_submissions_succeeds() {
    let h = Harness::new();
    let ws = seeded(&h).await;
    let view = h.view(&ws).await;

    let applied = h
        .apply_settled(&ws, desired(vec![known(by_name(&view, "A"))], vec![]))
        .await;

    assert_eq!(applied.summary.removed, 2);
    assert_eq!(applied.summary.cascaded, 0);
    let after = h.view(&ws).await;
    assert_eq!(after.participants.len(), 1);
    assert_eq!(after.participants[0].id, by_name(&view, "A").id);
    assert!(after.requirements.is_empty());
}

#[tokio::test]
async fn blocked_removal_leaves_everything_unchanged() {
    let h = Harness::new();
    let ws = seeded(&h).await;
    let view = h.view(&ws).await;
    let b = by_name(&view, "B");
    let r1 = by_title(&view, "R1");
    h.submit(&b.id, &r1.id, "uploads/b-1").await;
    h.submit(&b.id, &r1.id, "uploads/b-2").await;

    let mut renamed = known(by_name(&view, "A"));
    renamed.name = "A. Renamed".into();
    let mut update = desired(
        vec![renamed, person("C", Some("c@x.com"))],
        vec![known_doc(r1)],
    );
    update.title = "Renamed workspace".into();

    let err = h.apply(&ws, update).await.expect_err("removal of B must conflict");
    match err {
        ReconcileError::Conflict(report) => assert_eq!(
            report,
            ConflictReport {
                participants: vec!["B".into()],
                requirements: vec![],
            }
        ),
        other => panic!("unexpected error {other:?}"),
    }

    assert_eq!(h.view(&ws).await, view);
    assert_eq!(h.submissions(&ws).await.len(), 2);
    assert!(h.store.contains("uploads/b-1").await);
}

#[tokio::test]
async fn conflicts_are_collected_for_both_sides() {
    let h = Harness::new();
    let ws = seeded(&h).await;
    let view = h.view(&ws).await;
    let a = by_name(&view, "A");
    let b = by_name(&view, "B");
    let r1 = by_title(&view, "R1");
    h.submit(&b.id, &r1.id, "uploads/b-1").await;

    let err = h
        .apply(&ws, desired(vec![known(a)], vec![]))
        .await
        .expect_err("conflict");
    let ReconcileError::Conflict(report) = err else {
        panic!("expected conflict");
    };
    assert_eq!(report.participants, vec!["B".to_string()]);
    assert_eq!(report.requirements, vec!["R1".to_string()]);
}

#[tokio::test]
async fn forced_removal_cascades_and_purges_submission_blobs() {
    let h = Harness::new();
    let ws = seeded(&h).await;
    let view = h.view(&ws).await;
    let b = by_name(&view, "B");
    let r1 = by_title(&view, "R1");
    h.submit(&b.id, &r1.id, "uploads/b-1").await;
    h.submit(&b.id, &r1.id, "uploads/b-2").await;
    let participant = b.id.clone();
    h.db
        .run(move |conn| {
            reminders::record(conn, &participant, chrono::Utc::now()).map_err(ReconcileError::from)
        })
        .await
        .expect("record reminder");

    let mut update = desired(vec![known(by_name(&view, "A"))], vec![known_doc(r1)]);
    update.force = true;
    let applied = h.apply_settled(&ws, update).await;

    assert_eq!(applied.summary.removed, 1);
    assert_eq!(applied.summary.cascaded, 1);
    let after = h.view(&ws).await;
    assert!(after.participants.iter().all(|p| p.name != "B"));
    assert!(h.submissions(&ws).await.is_empty());
    assert!(!h.store.contains("uploads/b-1").await);
    assert!(!h.store.contains("uploads/b-2").await);
}

#[tokio::test]
async fn force_is_harmless_without_dependents() {
    let h = Harness::new();
    let ws = seeded(&h).await;
    let view = h.view(&ws).await;

    let mut update = desired(vec![known(by_name(&view, "A"))], vec![known_doc(by_title(&view, "R1"))]);
    update.force = true;
    let applied = h.apply_settled(&ws, update).await;

    assert_eq!(applied.summary.removed, 1);
    assert_eq!(applied.summary.cascaded, 0);
}

#[tokio::test]
async fn applying_the_same_configuration_twice_is_a_no_op() {
    let h = Harness::new();
    let ws = seeded(&h).await;
    let view = h.view(&ws).await;
    let update = desired(
        view.participants.iter().map(known).collect(),
        view.requirements.iter().map(known_doc).collect(),
    );

    h.apply_settled(&ws, update.clone()).await;
    let once = h.view(&ws).await;
    let applied = h.apply_settled(&ws, update).await;
    let twice = h.view(&ws).await;

    assert_eq!(once, twice);
    assert_eq!(applied.summary.created, 0);
    assert_eq!(applied.summary.removed, 0);
}

#[tokio::test]
async fn participants_are_matched_by_email_when_ids_are_missing() {
    let h = Harness::new();
    let ws = seeded(&h).await;
    let view = h.view(&ws).await;
    let a = by_name(&view, "A");
    let r1 = by_title(&view, "R1");
    h.submit(&a.id, &r1.id, "uploads/a-1").await;

    let applied = h
        .apply_settled(
            &ws,
            desired(
                vec![person("Alice", Some(" A@X.com ")), known(by_name(&view, "B"))],
                vec![known_doc(r1)],
            ),
        )
        .await;

    assert_eq!(applied.summary.created, 0);
    let after = h.view(&ws).await;
    let alice = by_name(&after, "Alice");
    assert_eq!(alice.id, a.id);
    assert_eq!(alice.email.as_deref(), Some("A@X.com"));
    assert_eq!(h.submissions(&ws).await.len(), 1);
}

#[tokio::test]
async fn email_fallback_can_be_disabled() {
    let h = Harness::with_config(docket_backend::config::AppConfig {
        object_store: docket_backend::config::ObjectStoreConfig::Memory,
        match_by_email: false,
        ..Default::default()
    });
    let ws = seeded(&h).await;
    let view = h.view(&ws).await;

    let applied = h
        .apply_settled(
            &ws,
            desired(
                vec![person("A", Some("a@x.com")), known(by_name(&view, "B"))],
                vec![known_doc(by_title(&view, "R1"))],
            ),
        )
        .await;

    assert_eq!(applied.summary.created, 1);
    assert_eq!(applied.summary.removed, 1);
    assert_ne!(by_name(&h.view(&ws).await, "A").id, by_name(&view, "A").id);
}

#[tokio::test]
async fn template_removal_rebuilds_archive_and_purges_dropped_blobs() {
    let h = Harness::new();
    let ws = h.workspace().await;
    for id in ["templates/t1", "templates/t2", "templates/t3"] {
        h.put_blob(id, id.as_bytes()).await;
    }
    h.apply_settled(
        &ws,
        desired(
            vec![],
            vec![doc(
                "R2",
                vec![template("templates/t1"), template("templates/t2"), template("templates/t3")],
            )],
        ),
    )
    .await;
    let before = by_title(&h.view(&ws).await, "R2").clone();
    let first = before.archive_content_id.clone().expect("archive built");
    let bundle = h.store.get(&first).await.expect("archive stored");
    assert_eq!(entry_names(&bundle), vec!["t1.pdf", "t2.pdf", "t3.pdf"]);

    let mut next = known_doc(&before);
    next.templates = vec![template("templates/t1"), template("templates/t3")];
    h.apply_settled(&ws, desired(vec![], vec![next])).await;

    let after = by_title(&h.view(&ws).await, "R2").clone();
    let second = after.archive_content_id.clone().expect("archive rebuilt");
    assert_ne!(first, second);
    let bundle = h.store.get(&second).await.expect("archive stored");
    assert_eq!(entry_names(&bundle), vec!["t1.pdf", "t3.pdf"]);
    assert_eq!(
        entry_bytes(&bundle),
        vec![b"templates/t1".to_vec(), b"templates/t3".to_vec()]
    );
    assert!(!h.store.contains("templates/t2").await);
    assert!(!h.store.contains(&first).await);
    assert!(h.store.contains("templates/t1").await);
}

#[tokio::test]
async fn reordering_templates_keeps_the_archive() {
    let h = Harness::new();
    let ws = h.workspace().await;
    for id in ["templates/t1", "templates/t3"] {
        h.put_blob(id, b"page").await;
    }
    h.apply_settled(
        &ws,
        desired(vec![], vec![doc("R2", vec![template("templates/t1"), template("templates/t3")])]),
    )
    .await;
    let before = by_title(&h.view(&ws).await, "R2").clone();
    let archive = before.archive_content_id.clone().expect("archive built");

    let mut next = known_doc(&before);
    next.templates.reverse();
    let applied = h.apply(&ws, desired(vec![], vec![next])).await.expect("apply");

    assert!(applied.background.is_empty());
    let after = by_title(&h.view(&ws).await, "R2").clone();
    assert_eq!(after.archive_content_id, Some(archive.clone()));
    assert_eq!(after.templates[0].content_id, "templates/t3");
    assert!(h.store.contains(&archive).await);
}

#[tokio::test]
async fn archives_need_at_least_two_templates() {
    let h = Harness::new();
    let ws = h.workspace().await;
    for id in ["templates/t1", "templates/t2"] {
        h.put_blob(id, b"page").await;
    }
    h.apply_settled(
        &ws,
        desired(
            vec![],
            vec![
                doc("Empty", vec![]),
                doc("Single", vec![template("templates/t1")]),
                doc("Pair", vec![template("templates/t1"), template("templates/t2")]),
            ],
        ),
    )
    .await;
    let view = h.view(&ws).await;
    assert_eq!(by_title(&view, "Empty").archive_content_id, None);
    assert_eq!(by_title(&view, "Single").archive_content_id, None);
    let pair = by_title(&view, "Pair").clone();
    let archive = pair.archive_content_id.clone().expect("pair bundled");

    let mut shrunk = known_doc(&pair);
    shrunk.templates.truncate(1);
    let others: Vec<_> = view
        .requirements
        .iter()
        .filter(|r| r.title != "Pair")
        .map(known_doc)
        .collect();
    h.apply_settled(&ws, desired(vec![], [others, vec![shrunk]].concat()))
        .await;

    let view = h.view(&ws).await;
    assert_eq!(by_title(&view, "Pair").archive_content_id, None);
    assert!(!h.store.contains(&archive).await);
    // t2 left Pair and no other requirement uses it.
    assert!(!h.store.contains("templates/t2").await);
    assert!(h.store.contains("templates/t1").await);
}

#[tokio::test]
async fn shared_template_blobs_survive_removal_from_one_requirement() {
    let h = Harness::new();
    let ws = h.workspace().await;
    h.put_blob("templates/shared", b"page").await;
    h.apply_settled(
        &ws,
        desired(
            vec![],
            vec![
                doc("R1", vec![template("templates/shared")]),
                doc("R2", vec![template("templates/shared")]),
            ],
        ),
    )
    .await;
    let view = h.view(&ws).await;

    h.apply_settled(&ws, desired(vec![], vec![known_doc(by_title(&view, "R2"))]))
        .await;

    assert!(h.store.contains("templates/shared").await);
}

#[tokio::test]
async fn failed_archive_build_leaves_pointer_null() {
    let h = Harness::new();
    let ws = h.workspace().await;
    h.put_blob("templates/t1", b"page").await;
    h.apply_settled(
        &ws,
        desired(
            vec![],
            vec![doc("R2", vec![template("templates/t1"), template("templates/missing")])],
        ),
    )
    .await;

    let requirement = by_title(&h.view(&ws).await, "R2").clone();
    assert_eq!(requirement.archive_content_id, None);
    let status = h.state.jobs.status(&requirement.id).await;
    assert!(matches!(
        status,
        Some(ArchiveJobStatus::Failed(_))
    ));
}

#[tokio::test]
async fn only_the_owner_may_reconcile() {
    let h = Harness::new();
    let ws = seeded(&h).await;
    let view = h.view(&ws).await;

    let err = h
        .state
        .reconciler
        .apply("someone-else", &ws, desired(vec![], vec![]))
        .await
        .expect_err("not the owner");
    assert!(matches!(err, ReconcileError::Unauthorized));

    let err = h
        .apply("missing-workspace", desired(vec![], vec![]))
        .await
        .expect_err("unknown workspace");
    assert!(matches!(err, ReconcileError::WorkspaceNotFound(_)));
    assert_eq!(h.view(&ws).await, view);
}

#[tokio::test]
async fn invalid_input_is_rejected_before_any_write() {
    let h = Harness::new();
    let ws = seeded(&h).await;
    let view = h.view(&ws).await;

    let mut update = desired(vec![], vec![]);
    update.deadline = "next tuesday".into();
    let err = h.apply(&ws, update).await.expect_err("bad deadline");
    assert!(matches!(err, ReconcileError::InvalidInput(_)));

    let err = h
        .apply(&ws, desired(vec![person("Z", Some("not-an-email"))], vec![]))
        .await
        .expect_err("bad email");
    assert!(matches!(err, ReconcileError::InvalidInput(_)));

    assert_eq!(h.view(&ws).await, view);
}

#[tokio::test]
async fn reminder_settings_and_reopen_are_persisted() {
    let h = Harness::new();
    let ws = h.workspace().await;
    let id = ws.clone();
    h.db
        .run(move |conn| {
            conn.execute("UPDATE workspaces SET status = 'closed' WHERE id = ?1", [&id])
                .map(|_| ())
                .map_err(ReconcileError::from)
        })
        .await
        .expect("close workspace");

    let mut update = desired(vec![], vec![]);
    update.reminder_config = Some(ReminderConfig {
        enabled: true,
        days_before: vec![3, 1],
    });
    h.apply_settled(&ws, update.clone()).await;
    let view = h.view(&ws).await;
    assert_eq!(view.workspace.status, WorkspaceStatus::Closed);
    assert!(view.workspace.reminder_config.enabled);
    assert_eq!(view.workspace.reminder_config.days_before, vec![3, 1]);

    update.reopen = true;
    update.deadline = "2001-01-01T00:00:00Z".into();
    let err = h.apply(&ws, update.clone()).await.expect_err("past deadline");
    assert!(matches!(err, ReconcileError::InvalidInput(_)));

    update.deadline = FUTURE.into();
    h.apply_settled(&ws, update).await;
    assert_eq!(h.view(&ws).await.workspace.status, WorkspaceStatus::Reopened);
}

#[tokio::test]
async fn template_blobs_shared_across_workspaces_survive_removal() {
    let h = Harness::new();
    let mine = h.workspace().await;
    let theirs = h.workspace().await;
    h.put_blob("templates/a", b"page").await;
    h.apply_settled(&mine, desired(vec![], vec![doc("Mine", vec![template("templates/a")])]))
        .await;
    h.apply_settled(
        &theirs,
        desired(vec![], vec![doc("Borrowed", vec![template("templates/a")])]),
    )
    .await;

    h.apply_settled(&theirs, desired(vec![], vec![])).await;

    assert!(h.view(&theirs).await.requirements.is_empty());
    assert!(h.store.contains("templates/a").await);
    let kept = h.view(&mine).await;
    assert_eq!(by_title(&kept, "Mine").templates[0].content_id, "templates/a");
}

#[tokio::test]
async fn submitted_blob_reused_as_template_survives_removal() {
    let h = Harness::new();
    let ws = seeded(&h).await;
    let view = h.view(&ws).await;
    let participant = view.participants[0].clone();
    let requirement = view.requirements[0].clone();
    h.submit(&participant.id, &requirement.id, "uploads/scan-1").await;

    let participants: Vec<_> = view.participants.iter().map(known).collect();
    let requirements: Vec<_> = view.requirements.iter().map(known_doc).collect();
    h.apply_settled(
        &ws,
        desired(
            participants.clone(),
            [requirements.clone(), vec![doc("Tmp", vec![template("uploads/scan-1")])]].concat(),
        ),
    )
    .await;
    assert!(h.view(&ws).await.requirements.iter().any(|r| r.title == "Tmp"));

    h.apply_settled(&ws, desired(participants, requirements)).await;

    assert!(h.view(&ws).await.requirements.iter().all(|r| r.title != "Tmp"));
    assert!(h.store.contains("uploads/scan-1").await);
    let submissions = h.submissions(&ws).await;
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].content_id, "uploads/scan-1");
}

/// Holds deletes of one chosen blob until the test hands out a permit.
struct HeldDeletes {
    inner: Arc<MemoryObjectStore>,
    held: Mutex<Option<String>>,
    release: Semaphore,
}

impl HeldDeletes {
    fn new(inner: Arc<MemoryObjectStore>) -> Self {
        Self {
            inner,
            held: Mutex::new(None),
            release: Semaphore::new(0),
        }
    }

    fn hold(&self, content_id: &str) {
        *self.held.lock().expect("held lock") = Some(content_id.to_string());
    }
}

#[async_trait]
impl ObjectStore for HeldDeletes {
    async fn get(&self, content_id: &str) -> Result<Vec<u8>, ObjectStoreError> {
        self.inner.get(content_id).await
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, ObjectStoreError> {
        self.inner.put(key, bytes).await
    }

    async fn delete(&self, content_id: &str) -> Result<(), ObjectStoreError> {
        let held = self.held.lock().expect("held lock").as_deref() == Some(content_id);
        if held {
            let _permit = self.release.acquire().await.expect("release gate");
        }
        self.inner.delete(content_id).await
    }
}

#[tokio::test]
async fn late_purge_of_a_replaced_archive_spares_the_rebuilt_one() {
    let mut gate = None;
    let h = Harness::with_store(|memory| {
        let held = Arc::new(HeldDeletes::new(memory));
        gate = Some(Arc::clone(&held));
        held as Arc<dyn ObjectStore>
    });
    let gate = gate.expect("gate installed");
    let ws = h.workspace().await;
    for id in ["templates/t1", "templates/t2", "templates/t3"] {
        h.put_blob(id, id.as_bytes()).await;
    }
    let first_set = vec![template("templates/t1"), template("templates/t2")];
    h.apply_settled(&ws, desired(vec![], vec![doc("Forms", first_set.clone())]))
        .await;
    let original = by_title(&h.view(&ws).await, "Forms").clone();
    let first_archive = original.archive_content_id.clone().expect("archive built");
    gate.hold(&first_archive);

    let mut widened = known_doc(&original);
    widened.templates.push(template("templates/t3"));
    let stale = h.apply(&ws, desired(vec![], vec![widened])).await.expect("widen");

    let mut restored = known_doc(&original);
    restored.templates = first_set;
    h.apply_settled(&ws, desired(vec![], vec![restored])).await;

    gate.release.add_permits(1);
    for task in stale.background {
        task.await.expect("post-commit task");
    }

    let live = by_title(&h.view(&ws).await, "Forms")
        .archive_content_id
        .clone()
        .expect("archive rebuilt");
    assert_ne!(live, first_archive);
    assert!(h.store.contains(&live).await);
    assert!(!h.store.contains(&first_archive).await);
    let bundle = h.store.get(&live).await.expect("live archive");
    assert_eq!(entry_names(&bundle), vec!["t1.pdf", "t2.pdf"]);
}

#[tokio::test]
async fn removing_a_requirement_forgets_its_archive_job() {
    let h = Harness::new();
    let ws = h.workspace().await;
    h.put_blob("templates/t1", b"page").await;
    h.put_blob("templates/t2", b"page").await;
    h.apply_settled(
        &ws,
        desired(vec![], vec![doc("Forms", vec![template("templates/t1"), template("templates/t2")])]),
    )
    .await;
    let requirement = by_title(&h.view(&ws).await, "Forms").clone();
    assert!(matches!(
        h.state.jobs.status(&requirement.id).await,
        Some(ArchiveJobStatus::Completed(_))
    ));

    h.apply_settled(&ws, desired(vec![], vec![])).await;

    assert_eq!(h.state.jobs.status(&requirement.id).await, None);
}
