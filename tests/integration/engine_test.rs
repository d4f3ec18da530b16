//! Engine scenarios across stores, storage, and locks.

use std::collections::HashSet;

use knohub_core::error::ErrorKind;
use knohub_entity::file_item::{DropPosition, FileItemNode};
use knohub_service::UploadedFile;

use crate::helpers::Harness;

async fn tree(h: &Harness) -> Vec<FileItemNode> {
    h.engine.list_tree(h.resource_id, &|_| None).await.unwrap()
}

fn names(nodes: &[FileItemNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.name.as_str()).collect()
}

#[tokio::test]
async fn test_delete_sequences_per_name() {
    let h = Harness::new().await;
    let folder = h
        .engine
        .create_folder(h.resource_id, None, "F")
        .await
        .unwrap();

    let first = h
        .engine
        .upload(h.resource_id, Some(folder.id), UploadedFile::new("notes.txt", "v1"))
        .await
        .unwrap();
    h.engine.soft_delete_file(first.id).await.unwrap();

    let second = h
        .engine
        .upload(h.resource_id, Some(folder.id), UploadedFile::new("notes.txt", "v2"))
        .await
        .unwrap();
    h.engine.soft_delete_file(second.id).await.unwrap();

    let items = h.store.all_items().await;
    let deleted: HashSet<(String, Option<i32>)> = items
        .iter()
        .filter(|item| item.deleted)
        .map(|item| (item.name.clone(), item.delete_sequence))
        .collect();
    assert!(deleted.contains(&("notes.txt_deleted_1".to_string(), Some(1))));
    assert!(deleted.contains(&("notes.txt_deleted_2".to_string(), Some(2))));

    let blobs = h.blob_names();
    assert_eq!(blobs.len(), 2);
    assert!(blobs.iter().any(|b| b.ends_with("_notes.txt_deleted_1")));
    assert!(blobs.iter().any(|b| b.ends_with("_notes.txt_deleted_2")));
}

#[tokio::test]
async fn test_folder_delete_reaches_every_descendant() {
    let h = Harness::new().await;
    let rid = h.resource_id;
    let top = h.engine.create_folder(rid, None, "labs").await.unwrap();
    let mid = h.engine.create_folder(rid, Some(top.id), "week1").await.unwrap();
    let deep = h.engine.create_folder(rid, Some(mid.id), "extra").await.unwrap();
    h.engine
        .upload(rid, Some(top.id), UploadedFile::new("readme.md", "a"))
        .await
        .unwrap();
    h.engine
        .upload(rid, Some(mid.id), UploadedFile::new("adder.circ", "b"))
        .await
        .unwrap();
    h.engine
        .upload(rid, Some(deep.id), UploadedFile::new("bonus.pdf", "c"))
        .await
        .unwrap();
    let keep = h
        .engine
        .upload(rid, None, UploadedFile::new("syllabus.pdf", "d"))
        .await
        .unwrap();

    h.engine.soft_delete_folder(top.id).await.unwrap();

    let items = h.store.all_items().await;
    let active: Vec<_> = items.iter().filter(|i| !i.deleted).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, keep.id);
    assert_eq!(active[0].display_order, 0);
    assert!(items.iter().filter(|i| i.deleted).all(|i| i.delete_sequence == Some(1)));

    assert_eq!(names(&tree(&h).await), vec!["syllabus.pdf"]);
}

#[tokio::test]
async fn test_reorder_before_scenario() {
    let h = Harness::new().await;
    let rid = h.resource_id;
    let a = h.engine.create_folder(rid, None, "A").await.unwrap();
    let _b = h.engine.create_folder(rid, None, "B").await.unwrap();
    let c = h.engine.create_folder(rid, None, "C").await.unwrap();

    h.engine
        .reorder(c.id, a.id, DropPosition::Before)
        .await
        .unwrap();

    assert_eq!(names(&tree(&h).await), vec!["C", "A", "B"]);
    let mut orders: Vec<i32> = h
        .store
        .all_items()
        .await
        .iter()
        .map(|i| i.display_order)
        .collect();
    orders.sort();
    assert_eq!(orders, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_reorder_across_scopes_renumbers_both() {
    let h = Harness::new().await;
    let rid = h.resource_id;
    let docs = h.engine.create_folder(rid, None, "docs").await.unwrap();
    let a = h
        .engine
        .upload(rid, None, UploadedFile::new("a.txt", "a"))
        .await
        .unwrap();
    h.engine
        .upload(rid, None, UploadedFile::new("b.txt", "b"))
        .await
        .unwrap();
    let inner = h
        .engine
        .upload(rid, Some(docs.id), UploadedFile::new("inner.txt", "i"))
        .await
        .unwrap();

    h.engine
        .reorder(a.id, inner.id, DropPosition::Before)
        .await
        .unwrap();

    let nodes = tree(&h).await;
    assert_eq!(names(&nodes), vec!["docs", "b.txt"]);
    assert_eq!(names(&nodes[0].children), vec!["a.txt", "inner.txt"]);

    let items = h.store.all_items().await;
    let order_of = |name: &str| {
        items
            .iter()
            .find(|i| i.name == name)
            .map(|i| i.display_order)
            .unwrap()
    };
    assert_eq!(order_of("docs"), 0);
    assert_eq!(order_of("b.txt"), 1);
    assert_eq!(order_of("a.txt"), 0);
    assert_eq!(order_of("inner.txt"), 1);

    // Moving the folder into itself is refused.
    let err = h
        .engine
        .reorder(docs.id, inner.id, DropPosition::After)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidTarget);
}

#[tokio::test]
async fn test_reorder_inside_with_taken_name_conflicts() {
    let h = Harness::new().await;
    let rid = h.resource_id;
    let docs = h.engine.create_folder(rid, None, "docs").await.unwrap();
    let outer = h
        .engine
        .upload(rid, None, UploadedFile::new("lab.txt", "outer"))
        .await
        .unwrap();
    h.engine
        .upload(rid, Some(docs.id), UploadedFile::new("lab.txt", "inner"))
        .await
        .unwrap();

    let err = h
        .engine
        .reorder(outer.id, docs.id, DropPosition::Inside)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NameConflict);

    let err = h
        .engine
        .reorder(docs.id, outer.id, DropPosition::Inside)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidTarget);
}

#[tokio::test]
async fn test_concurrent_same_name_uploads_admit_one() {
    let h = Harness::new().await;
    let rid = h.resource_id;

    let uploads = (0..8).map(|i| {
        let engine = h.engine.clone();
        tokio::spawn(async move {
            engine
                .upload(rid, None, UploadedFile::new("race.txt", format!("copy {i}")))
                .await
        })
    });
    let mut ok = 0;
    let mut conflicts = 0;
    for handle in uploads.collect::<Vec<_>>() {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(e) => {
                assert_eq!(e.kind, ErrorKind::NameConflict);
                conflicts += 1;
            }
        }
    }

    assert_eq!(ok, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(h.blob_names().len(), 1);
}

#[tokio::test]
async fn test_concurrent_distinct_uploads_keep_contiguous_order() {
    let h = Harness::new().await;
    let rid = h.resource_id;

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let engine = h.engine.clone();
            tokio::spawn(async move {
                engine
                    .upload(rid, None, UploadedFile::new(format!("f{i}.txt"), "x"))
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut orders: Vec<i32> = h
        .store
        .all_items()
        .await
        .iter()
        .map(|i| i.display_order)
        .collect();
    orders.sort();
    assert_eq!(orders, (0..6).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_soft_delete_survives_blob_move_failure() {
    let h = Harness::with_failing_moves().await;
    let item = h
        .engine
        .upload(h.resource_id, None, UploadedFile::new("keep.txt", "x"))
        .await
        .unwrap();

    h.engine.soft_delete_file(item.id).await.unwrap();

    let stored = h.store.all_items().await;
    assert_eq!(stored.len(), 1);
    assert!(stored[0].deleted);
    assert_eq!(stored[0].name, "keep.txt_deleted_1");
    assert_eq!(stored[0].storage_path, item.storage_path);
    assert!(h.blob_names()[0].ends_with("_keep.txt"));
}

#[tokio::test]
async fn test_failed_blob_write_commits_nothing() {
    let h = Harness::with_failing_puts().await;
    let err = h
        .engine
        .upload(h.resource_id, None, UploadedFile::new("lost.txt", "x"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::IoFailure);
    assert!(h.store.all_items().await.is_empty());
}

#[tokio::test]
async fn test_failed_blob_rename_commits_nothing() {
    let h = Harness::with_failing_renames().await;
    let item = h
        .engine
        .upload(h.resource_id, None, UploadedFile::new("a.txt", "x"))
        .await
        .unwrap();

    let err = h.engine.rename(item.id, "b.txt").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::IoFailure);

    let stored = h.store.all_items().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "a.txt");
    assert_eq!(stored[0].original_name, item.original_name);
    assert_eq!(stored[0].storage_path, item.storage_path);
    assert_eq!(stored[0].url, item.url);
    assert!(h.blob_names()[0].ends_with("_a.txt"));
}

#[tokio::test]
async fn test_rename_keeps_download_url_in_step() {
    let h = Harness::new().await;
    let item = h
        .engine
        .upload(h.resource_id, None, UploadedFile::new("report.pdf", "pdf"))
        .await
        .unwrap();

    let renamed = h.engine.rename(item.id, "final.txt").await.unwrap();
    assert_eq!(renamed.name, "final.pdf");
    assert_eq!(renamed.file_type.as_deref(), Some("pdf"));

    let path = renamed.storage_path.clone().unwrap();
    let file_name = path.rsplit('/').next().unwrap();
    assert!(file_name.ends_with("_final.pdf"));
    assert_eq!(
        renamed.url.as_deref(),
        Some(format!("/api/files/{}/download/{file_name}", h.resource_id).as_str())
    );

    let download = h
        .engine
        .open_download(h.resource_id, file_name)
        .await
        .unwrap();
    assert_eq!(download.file_name, "final.pdf");
    assert_eq!(download.size, Some(3));
}
