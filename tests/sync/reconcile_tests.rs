// Tests for Reconciler::observe and Reconciler::reconcile

use std::fs;

use dirmirror::sync::{ChangeEvent, ChangeKind, ReconcileOutcome};

use crate::common::Fixture;

fn event(fixture: &Fixture, kind: ChangeKind, name: &str) -> ChangeEvent {
    ChangeEvent {
        kind,
        name: name.to_string(),
        containing_path: fixture.src_root(),
        destination: fixture.dst.path().join(name),
    }
}

#[test]
fn test_observe_logs_identical_rendering_once() {
    let fixture = Fixture::new();
    let mut reconciler = fixture.reconciler();
    let created = event(&fixture, ChangeKind::FileCreated, "report.txt");

    assert!(reconciler.observe(&created));
    assert!(!reconciler.observe(&created));
    assert!(!reconciler.observe(&created.clone()));

    let expected = format!(r#"Created file "report.txt" in "{}""#, fixture.src_root());
    assert_eq!(fixture.log_messages(), vec![expected]);
}

#[test]
fn test_log_line_layout() {
    let fixture = Fixture::new();
    let mut reconciler = fixture.reconciler();
    reconciler.observe(&event(&fixture, ChangeKind::DirectoryDeleted, "old"));

    let content = fs::read_to_string(fixture.log_path()).unwrap();
    let parts: Vec<&str> = content.trim_end().splitn(3, " - ").collect();

    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "INFO");
    assert_eq!(parts[1].len(), "2024-01-01 00:00:00,000".len());
    assert_eq!(parts[2], format!(r#"Deleted directory "old" in "{}""#, fixture.src_root()));
}

#[test]
fn test_reconcile_clears_cycle_state() {
    let fixture = Fixture::new();
    fs::write(fixture.dst.path().join("b.txt"), "stale").unwrap();
    fs::create_dir(fixture.dst.path().join("old")).unwrap();

    let mut reconciler = fixture.reconciler();
    reconciler.observe(&event(&fixture, ChangeKind::FileDeleted, "b.txt"));
    reconciler.observe(&event(&fixture, ChangeKind::DirectoryDeleted, "old"));
    reconciler.observe(&event(&fixture, ChangeKind::FileModified, "c.txt"));
    assert_eq!(reconciler.state().pending_files().len(), 1);
    assert_eq!(reconciler.state().pending_dirs().len(), 1);

    let outcome = reconciler.reconcile();

    assert_eq!(outcome, ReconcileOutcome::Success { files_copied: 0, removed: 2 });
    assert!(reconciler.state().is_empty());
    assert_eq!(reconciler.state().seen_count(), 0);
    assert!(reconciler.state().pending_dirs().is_empty());
    assert!(reconciler.state().pending_files().is_empty());
    assert!(!fixture.dst.path().join("b.txt").exists());
    assert!(!fixture.dst.path().join("old").exists());
}

#[test]
fn test_reconcile_copies_source_and_keeps_unscheduled_extras() {
    let fixture = Fixture::new();
    fs::create_dir_all(fixture.src.path().join("docs/2024")).unwrap();
    fs::write(fixture.src.path().join("docs/2024/q1.txt"), "q1").unwrap();
    fs::write(fixture.src.path().join("top.txt"), "top").unwrap();
    fs::write(fixture.dst.path().join("unscheduled.txt"), "not yet seen").unwrap();

    let mut reconciler = fixture.reconciler();
    let outcome = reconciler.reconcile();

    assert_eq!(outcome, ReconcileOutcome::Success { files_copied: 2, removed: 0 });
    assert_eq!(fs::read_to_string(fixture.dst.path().join("docs/2024/q1.txt")).unwrap(), "q1");
    assert_eq!(fs::read_to_string(fixture.dst.path().join("top.txt")).unwrap(), "top");
    assert!(fixture.dst.path().join("unscheduled.txt").exists());
    assert_eq!(fixture.log_messages(), vec!["A full copy was made".to_string()]);
}

#[test]
fn test_reconcile_creates_missing_destination_root() {
    let fixture = Fixture::new();
    fs::write(fixture.src.path().join("a.txt"), "X").unwrap();
    let nested = fixture.dst.path().join("mirror/root");
    let config = dirmirror::config::SyncConfig::new(
        fixture.src_root(),
        crate::common::path_str(&nested),
        std::time::Duration::from_secs(60),
        fixture.log_path(),
    );

    let mut reconciler = fixture.reconciler_with(config);

    assert!(reconciler.reconcile().is_success());
    assert_eq!(fs::read_to_string(nested.join("a.txt")).unwrap(), "X");
}

#[test]
fn test_failed_reconcile_keeps_state_for_next_attempt() {
    let fixture = Fixture::new();
    fs::write(fixture.dst.path().join("b.txt"), "stale").unwrap();
    let missing_source = fixture.src.path().join("vanished");
    let config = dirmirror::config::SyncConfig::new(
        crate::common::path_str(&missing_source),
        fixture.dst_root(),
        std::time::Duration::from_secs(60),
        fixture.log_path(),
    );

    let mut reconciler = fixture.reconciler_with(config);
    let deleted = event(&fixture, ChangeKind::FileDeleted, "b.txt");
    assert!(reconciler.observe(&deleted));

    let outcome = reconciler.reconcile();

    assert!(matches!(outcome, ReconcileOutcome::PartialFailure { .. }));
    assert_eq!(reconciler.state().pending_files().len(), 1);
    assert!(!reconciler.observe(&deleted));
    // Deletions only run after a successful copy
    assert!(fixture.dst.path().join("b.txt").exists());

    let messages = fixture.log_messages();
    assert!(!messages.contains(&"A full copy was made".to_string()));

    // Source comes back: the queued deletion is applied
    fs::create_dir(&missing_source).unwrap();
    assert!(reconciler.reconcile().is_success());
    assert!(!fixture.dst.path().join("b.txt").exists());
    assert!(reconciler.state().is_empty());
}

#[test]
fn test_queued_entry_already_gone_is_not_a_failure() {
    let fixture = Fixture::new();
    let mut reconciler = fixture.reconciler();
    reconciler.observe(&event(&fixture, ChangeKind::FileDeleted, "never-existed.txt"));
    reconciler.observe(&event(&fixture, ChangeKind::DirectoryDeleted, "also-missing"));

    let outcome = reconciler.reconcile();

    assert_eq!(outcome, ReconcileOutcome::Success { files_copied: 0, removed: 0 });
    assert!(reconciler.state().is_empty());
}

#[test]
fn test_failed_deletion_keeps_state_for_next_attempt() {
    let fixture = Fixture::new();
    fs::write(fixture.src.path().join("a.txt"), "X").unwrap();
    fs::write(fixture.dst.path().join("plain.txt"), "not a directory").unwrap();

    let mut reconciler = fixture.reconciler();
    reconciler.observe(&event(&fixture, ChangeKind::FileModified, "a.txt"));
    // A path below a regular file cannot be removed (ENOTDIR, not NotFound)
    let blocked = ChangeEvent {
        kind: ChangeKind::FileDeleted,
        name: "inner".to_string(),
        containing_path: format!("{}/plain.txt", fixture.src_root()),
        destination: fixture.dst.path().join("plain.txt").join("inner"),
    };
    assert!(reconciler.observe(&blocked));

    let outcome = reconciler.reconcile();

    assert!(matches!(outcome, ReconcileOutcome::PartialFailure { .. }));
    // The copy itself went through before the deletion step failed
    assert_eq!(fs::read_to_string(fixture.dst.path().join("a.txt")).unwrap(), "X");
    assert_eq!(
        reconciler.state().pending_files(),
        [fixture.dst.path().join("plain.txt").join("inner")]
    );
    assert_eq!(reconciler.state().seen_count(), 2);
    assert!(!reconciler.observe(&blocked));

    let messages = fixture.log_messages();
    assert!(!messages.contains(&"A full copy was made".to_string()));
    assert!(messages.last().unwrap().contains("inner"));
}
