//! Integration tests for the cached tag index.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use tagnav::{App, Config, IndexStore, TagError, TagIndex, TagKind};

const TAGS: &str = "!_TAG_FILE_FORMAT\t2\t/extended format/\n\
                    App\tsrc/app.rs\t10;\"\tc\n\
                    run\tsrc/app.rs\t42;\"\tm\tclass:App\n\
                    main\tsrc/main.rs\t3;\"\tf\n";

fn write_tags(dir: &Path, content: &str) {
    fs::write(dir.join(".tags"), content).expect("Failed to write tag file");
}

#[tokio::test]
async fn test_load_parses_and_caches() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_tags(dir.path(), TAGS);
    let index = TagIndex::default();

    let snapshot = index
        .load(dir.path(), Path::new(".tags"), false)
        .await
        .expect("Failed to load tags");

    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot.skipped, 0);
    let run = snapshot.records.iter().find(|r| r.name == "run").unwrap();
    assert_eq!(run.kind, TagKind::Method);
    assert_eq!(run.scope.as_deref(), Some("class:App"));
    assert_eq!(run.file_path, dir.path().join("src/app.rs"));
    assert!(index.cached(dir.path()).is_some());
}

#[tokio::test]
async fn test_unforced_load_uses_cache_after_file_removed() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_tags(dir.path(), TAGS);
    let index = TagIndex::default();
    index.load(dir.path(), Path::new(".tags"), false).await.unwrap();

    fs::remove_file(dir.path().join(".tags")).unwrap();

    let cached = index.load(dir.path(), Path::new(".tags"), false).await;
    assert_eq!(cached.unwrap().len(), 3);

    let forced = index.load(dir.path(), Path::new(".tags"), true).await;
    assert!(matches!(forced, Err(TagError::IndexUnavailable { .. })));
    // A failed reload keeps the previous snapshot
    assert_eq!(index.cached(dir.path()).unwrap().len(), 3);
}

#[tokio::test]
async fn test_forced_load_picks_up_changes() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_tags(dir.path(), TAGS);
    let index = TagIndex::default();
    index.load(dir.path(), Path::new(".tags"), false).await.unwrap();

    write_tags(dir.path(), "only\tsrc/only.rs\t1;\"\tf\n");

    let stale = index.load(dir.path(), Path::new(".tags"), false).await.unwrap();
    assert_eq!(stale.len(), 3);

    let fresh = index.load(dir.path(), Path::new(".tags"), true).await.unwrap();
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh.records[0].name, "only");
}

#[tokio::test]
async fn test_forced_load_replaces_unchanged_snapshot() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_tags(dir.path(), TAGS);
    let index = TagIndex::default();

    let first = index.load(dir.path(), Path::new(".tags"), false).await.unwrap();
    let cached = index.load(dir.path(), Path::new(".tags"), false).await.unwrap();
    assert!(Arc::ptr_eq(&first.records, &cached.records));

    let forced = index.load(dir.path(), Path::new(".tags"), true).await.unwrap();
    assert!(!Arc::ptr_eq(&first.records, &forced.records));
    assert!(forced.loaded_at >= first.loaded_at);
    assert_eq!(forced.len(), first.len());

    let current = index.cached(dir.path()).unwrap();
    assert!(Arc::ptr_eq(&current.records, &forced.records));
}

#[tokio::test]
async fn test_missing_tag_file_is_unavailable() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let index = TagIndex::default();

    let result = index.load(dir.path(), Path::new(".tags"), false).await;
    match result {
        Err(TagError::IndexUnavailable { path, .. }) => {
            assert_eq!(path, dir.path().join(".tags"));
        }
        other => panic!("expected IndexUnavailable, got {:?}", other.map(|s| s.len())),
    }
    assert!(!TagIndex::exists(dir.path(), Path::new(".tags")));
}

#[tokio::test]
async fn test_late_subscriber_receives_latest_snapshot() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_tags(dir.path(), TAGS);
    let store = Arc::new(IndexStore::new());
    let index = TagIndex::new(Arc::clone(&store));

    index.load(dir.path(), Path::new(".tags"), false).await.unwrap();

    let rx = index.subscribe(dir.path());
    let replayed = rx.borrow().clone().expect("snapshot should be replayed");
    assert_eq!(replayed.len(), 3);

    let ready = index.wait_ready(dir.path()).await.unwrap();
    assert_eq!(ready.len(), 3);
}

#[tokio::test]
async fn test_waiter_is_woken_by_first_load() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_tags(dir.path(), TAGS);
    let index = TagIndex::default();

    let waiter = {
        let index = index.clone();
        let root = dir.path().to_path_buf();
        tokio::spawn(async move { index.wait_ready(&root).await })
    };
    tokio::task::yield_now().await;

    index.load(dir.path(), Path::new(".tags"), false).await.unwrap();
    let snapshot = waiter.await.unwrap().expect("waiter should see the snapshot");
    assert_eq!(snapshot.len(), 3);
}

#[tokio::test]
async fn test_roots_are_independent() {
    let a = TempDir::new().unwrap();
    let b = TempDir::new().unwrap();
    write_tags(a.path(), TAGS);
    write_tags(b.path(), "solo\tx.c\t5;\"\tf\n");
    let index = TagIndex::default();

    assert_eq!(index.load(a.path(), Path::new(".tags"), false).await.unwrap().len(), 3);
    assert_eq!(index.load(b.path(), Path::new(".tags"), false).await.unwrap().len(), 1);

    index.invalidate(a.path());
    assert!(index.cached(a.path()).is_none());
    assert_eq!(index.cached(b.path()).unwrap().len(), 1);
}

#[tokio::test]
async fn test_watcher_reloads_changed_tag_file() {
    let dir = TempDir::new().unwrap();
    write_tags(dir.path(), TAGS);
    let app = App::new(dir.path(), Config::parse("tag_path: .tags\n").unwrap());
    assert_eq!(app.startup().await.unwrap().len(), 3);
    let mut notices = app.subscribe_reindex();

    // Give the OS watcher a moment to register
    tokio::time::sleep(Duration::from_millis(200)).await;
    write_tags(dir.path(), "only\tsrc/only.rs\t1;\"\tf\n");

    let notice = tokio::time::timeout(Duration::from_secs(10), notices.recv())
        .await
        .expect("no reload within timeout")
        .unwrap();
    assert_eq!(notice.tag_count, 1);
    assert_eq!(app.index().cached(dir.path()).unwrap().len(), 1);
    app.shutdown();
}
