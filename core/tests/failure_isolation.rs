/// Failure isolation integration tests
///
/// One entry that cannot be wiped must not stop its siblings, and must keep
/// its directory chain in place.
use sayonara_shred::report::WipeStatus;
use sayonara_shred::{
    DirectoryWipeScheduler, ErrorClass, FileWipeOperation, PatternBufferPool, TargetKind,
    WipeError, WipeMethod, WipeOrchestrator,
};
use std::fs;
use std::os::unix::fs::PermissionsExt;

#[path = "common/mod.rs"]
mod common;

use common::test_helpers::test_config;
use common::tree_fixture::TreeFixture;

#[test]
fn test_fifo_does_not_block_siblings() {
    let fixture = TreeFixture::new();
    let a = fixture.file("root/a.txt", 100);
    let b = fixture.file("root/b.txt", 100);
    let pipe = fixture.fifo("root/pipe");
    let root = fixture.path("root");

    let pool = PatternBufferPool::init(4096).expect("pool");
    let report = DirectoryWipeScheduler::new(&pool)
        .wipe_tree(&root, WipeMethod::Purge)
        .expect("root is listable");

    assert!(!a.exists());
    assert!(!b.exists());
    assert!(pipe.exists(), "special files are left alone");
    assert!(root.exists(), "directory not fully removed");
    assert_eq!(report.files_wiped, 2);
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(
        &report.errors[0],
        WipeError::UnsupportedEntry { path } if path == &pipe
    ));
    assert_eq!(report.directories_retained, vec![root.clone()]);

    match report.into_result() {
        Err(WipeError::TreeIncomplete { failed_entries, .. }) => assert_eq!(failed_entries, 1),
        other => panic!("expected TreeIncomplete, got {:?}", other),
    }
}

#[test]
fn test_failure_keeps_ancestors_but_not_cousins() {
    let fixture = TreeFixture::new();
    fixture.fifo("root/left/deep/pipe");
    fixture.file("root/left/deep/ok.txt", 10);
    fixture.file("root/right/fine.txt", 10);
    let root = fixture.path("root");

    let pool = PatternBufferPool::init(4096).expect("pool");
    let report = DirectoryWipeScheduler::new(&pool)
        .wipe_tree(&root, WipeMethod::Clear)
        .expect("tree wipe");

    assert!(!fixture.path("root/right").exists());
    assert!(!fixture.path("root/left/deep/ok.txt").exists());
    assert!(fixture.path("root/left/deep").exists());
    assert!(fixture.path("root/left").exists());
    assert!(root.exists());
    assert_eq!(report.files_wiped, 2);
    assert_eq!(report.directories_retained.len(), 3);
}

#[test]
fn test_orchestrated_partial_tree_exit_code() {
    let fixture = TreeFixture::new();
    fixture.file("root/a", 10);
    fixture.fifo("root/p");
    let root = fixture.path("root");

    let orchestrator = WipeOrchestrator::new(test_config()).expect("orchestrator");
    let report = orchestrator.execute(TargetKind::Folder, &root, WipeMethod::Clear);

    assert_eq!(report.status, WipeStatus::Incomplete);
    assert_eq!(report.error_class(), Some(ErrorClass::Partial));
    assert_eq!(report.exit_code(), 5);
    assert_eq!(report.files_wiped, 1);
}

#[test]
fn test_missing_file_is_open_error_not_delete_error() {
    let fixture = TreeFixture::new();
    let pool = PatternBufferPool::init(4096).expect("pool");

    let err = FileWipeOperation::new(&pool)
        .wipe(&fixture.path("never-existed"), WipeMethod::Clear)
        .unwrap_err();

    assert!(matches!(err, WipeError::Open { .. }));
    assert_eq!(err.class(), ErrorClass::Rejected);
}

#[test]
fn test_unreadable_file_is_isolated() {
    // Root ignores permission bits
    if nix::unistd::geteuid().is_root() {
        return;
    }

    let fixture = TreeFixture::new();
    let locked = fixture.file("root/locked", 100);
    let ok = fixture.file("root/ok", 100);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("chmod");
    let root = fixture.path("root");

    let pool = PatternBufferPool::init(4096).expect("pool");
    let report = DirectoryWipeScheduler::new(&pool)
        .wipe_tree(&root, WipeMethod::Clear)
        .expect("tree wipe");

    assert!(!ok.exists());
    assert!(locked.exists());
    assert!(matches!(&report.errors[0], WipeError::Open { .. }));

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o600)).expect("chmod back");
}
