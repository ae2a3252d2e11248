//! Unit tests for the BookmarkManager public API.
//!
//! These tests exercise folder and bookmark CRUD, ordering, search and
//! import/export through `BookmarkManagerTrait`, using in-memory storage.

use std::sync::Arc;

use rstest::rstest;
use serde_json::json;

use armrest::database::Storage;
use armrest::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait, BOOKMARKS_KEY};
use armrest::types::bookmark::{BookmarkPatch, BookmarkState, FolderPatch, NewBookmark};
use armrest::types::errors::BookmarkError;
use armrest::types::storage::StorageArea;

fn setup() -> (Arc<Storage>, BookmarkManager) {
    let storage = Arc::new(Storage::open_in_memory().expect("Failed to open in-memory storage"));
    let mgr = BookmarkManager::new(storage.clone());
    (storage, mgr)
}

fn new_bookmark(name: &str, url: &str) -> NewBookmark {
    NewBookmark {
        name: name.to_string(),
        url: url.to_string(),
        ..Default::default()
    }
}

fn first_folder_id(state: &BookmarkState) -> String {
    state.folders[0].id.clone()
}

fn ids_in(state: &BookmarkState, folder_id: &str) -> Vec<String> {
    state
        .folder(folder_id)
        .unwrap()
        .bookmarks
        .iter()
        .map(|b| b.id.clone())
        .collect()
}

fn orders_in(state: &BookmarkState, folder_id: &str) -> Vec<usize> {
    state
        .folder(folder_id)
        .unwrap()
        .bookmarks
        .iter()
        .map(|b| b.order)
        .collect()
}

#[test]
fn test_first_read_seeds_and_persists_defaults() {
    let (storage, mgr) = setup();
    let state = mgr.get_bookmarks().unwrap();
    assert_eq!(state.version, 1);
    assert_eq!(state.folders.len(), 4);
    assert!(storage.get(StorageArea::Sync, BOOKMARKS_KEY).unwrap().is_some());

    // Second read returns the same ids instead of reseeding.
    let again = mgr.get_bookmarks().unwrap();
    assert_eq!(state, again);
}

#[test]
fn test_wrong_version_reseeds() {
    let (storage, mgr) = setup();
    storage
        .set(
            StorageArea::Sync,
            BOOKMARKS_KEY,
            json!({"version": 2, "folders": [{"id": "old", "name": "Old", "bookmarks": []}]}),
        )
        .unwrap();
    let state = mgr.get_bookmarks().unwrap();
    assert!(state.folder("old").is_none());
    assert_eq!(state.folders.len(), 4);
}

#[test]
fn test_read_normalizes_stored_order() {
    let (storage, mgr) = setup();
    storage
        .set(
            StorageArea::Sync,
            BOOKMARKS_KEY,
            json!({"version": 1, "folders": [{
                "id": "f", "name": "F", "createdAt": 1, "updatedAt": 1,
                "bookmarks": [
                    {"id": "c", "name": "C", "url": "https://c.dev", "order": 7},
                    {"id": "x", "name": "X", "url": "https://x.dev"},
                    {"id": "a", "name": "A", "url": "https://a.dev", "order": 3}
                ]
            }]}),
        )
        .unwrap();

    let state = mgr.get_bookmarks().unwrap();
    assert_eq!(ids_in(&state, "f"), vec!["a", "c", "x"]);
    assert_eq!(orders_in(&state, "f"), vec![0, 1, 2]);

    let stored = storage.get(StorageArea::Sync, BOOKMARKS_KEY).unwrap().unwrap();
    assert_eq!(stored["folders"][0]["bookmarks"][2]["order"], 2);
}

#[test]
fn test_add_folder_and_bookmark() {
    let (_storage, mgr) = setup();
    let state = mgr.add_folder("Reading", Some("bookmark"), Some("#000000")).unwrap();
    let folder = state.folders.last().unwrap();
    assert_eq!(folder.name, "Reading");
    assert_eq!(folder.icon.as_deref(), Some("bookmark"));
    let folder_id = folder.id.clone();

    mgr.add_bookmark(&folder_id, new_bookmark("Docs", "https://docs.rs")).unwrap();
    let state = mgr
        .add_bookmark(&folder_id, new_bookmark("Crates", "https://crates.io"))
        .unwrap();
    let bookmarks = &state.folder(&folder_id).unwrap().bookmarks;
    assert_eq!(bookmarks.len(), 2);
    assert_eq!(bookmarks[1].name, "Crates");
    assert_eq!(bookmarks[1].order, 1);
    assert!(bookmarks[0].created_at > 0);
}

#[test]
fn test_add_bookmark_to_unknown_folder_fails() {
    let (_storage, mgr) = setup();
    let result = mgr.add_bookmark("missing", new_bookmark("X", "https://x.dev"));
    assert!(matches!(result, Err(BookmarkError::FolderNotFound(_))));
}

#[test]
fn test_update_folder_patch_keeps_unset_fields() {
    let (_storage, mgr) = setup();
    let state = mgr.get_bookmarks().unwrap();
    let id = first_folder_id(&state);
    let icon_before = state.folders[0].icon.clone();

    let state = mgr
        .update_folder(&id, FolderPatch { name: Some("Job".into()), ..Default::default() })
        .unwrap();
    let folder = state.folder(&id).unwrap();
    assert_eq!(folder.name, "Job");
    assert_eq!(folder.icon, icon_before);
}

#[test]
fn test_update_bookmark() {
    let (_storage, mgr) = setup();
    let folder_id = first_folder_id(&mgr.get_bookmarks().unwrap());
    let state = mgr.add_bookmark(&folder_id, new_bookmark("Old", "https://old.dev")).unwrap();
    let bm_id = ids_in(&state, &folder_id)[0].clone();

    let state = mgr
        .update_bookmark(
            &folder_id,
            &bm_id,
            BookmarkPatch {
                name: Some("New".into()),
                description: Some(Some("renamed".into())),
                ..Default::default()
            },
        )
        .unwrap();
    let bm = &state.folder(&folder_id).unwrap().bookmarks[0];
    assert_eq!(bm.name, "New");
    assert_eq!(bm.url, "https://old.dev");
    assert_eq!(bm.description.as_deref(), Some("renamed"));

    let missing = mgr.update_bookmark(&folder_id, "nope", BookmarkPatch::default());
    assert!(matches!(missing, Err(BookmarkError::NotFound(_))));
}

#[test]
fn test_update_bookmark_clears_optional_fields_on_null() {
    let (_storage, mgr) = setup();
    let folder_id = first_folder_id(&mgr.get_bookmarks().unwrap());
    let data = NewBookmark {
        description: Some("docs".into()),
        logo: Some("https://docs.rs/logo.png".into()),
        color: Some("#ff0000".into()),
        ..new_bookmark("Docs", "https://docs.rs")
    };
    let state = mgr.add_bookmark(&folder_id, data).unwrap();
    let bm_id = ids_in(&state, &folder_id)[0].clone();

    let patch: BookmarkPatch =
        serde_json::from_value(json!({"description": null, "color": null})).unwrap();
    let state = mgr.update_bookmark(&folder_id, &bm_id, patch).unwrap();
    let bm = &state.folder(&folder_id).unwrap().bookmarks[0];
    assert_eq!(bm.description, None);
    assert_eq!(bm.color, None);
    assert_eq!(bm.logo.as_deref(), Some("https://docs.rs/logo.png"));
    assert_eq!(bm.name, "Docs");
}

#[test]
fn test_delete_bookmark_closes_gap() {
    let (_storage, mgr) = setup();
    let folder_id = first_folder_id(&mgr.get_bookmarks().unwrap());
    for i in 0..3 {
        mgr.add_bookmark(&folder_id, new_bookmark(&format!("B{}", i), &format!("https://b{}.dev", i)))
            .unwrap();
    }
    let ids = ids_in(&mgr.get_bookmarks().unwrap(), &folder_id);

    let state = mgr.delete_bookmark(&folder_id, &ids[1]).unwrap();
    assert_eq!(ids_in(&state, &folder_id), vec![ids[0].clone(), ids[2].clone()]);
    assert_eq!(orders_in(&state, &folder_id), vec![0, 1]);
}

#[test]
fn test_delete_unknown_ids_fail() {
    let (_storage, mgr) = setup();
    let folder_id = first_folder_id(&mgr.get_bookmarks().unwrap());
    assert!(matches!(
        mgr.delete_bookmark(&folder_id, "nope"),
        Err(BookmarkError::NotFound(_))
    ));
    assert!(matches!(
        mgr.delete_folder("nope"),
        Err(BookmarkError::FolderNotFound(_))
    ));
}

#[test]
fn test_delete_folder_removes_its_bookmarks() {
    let (_storage, mgr) = setup();
    let folder_id = first_folder_id(&mgr.get_bookmarks().unwrap());
    mgr.add_bookmark(&folder_id, new_bookmark("A", "https://a.dev")).unwrap();
    let state = mgr.delete_folder(&folder_id).unwrap();
    assert_eq!(state.folders.len(), 3);
    assert!(mgr.search_bookmarks("a.dev").unwrap().is_empty());
}

#[test]
fn test_move_bookmark_between_folders() {
    let (_storage, mgr) = setup();
    let state = mgr.get_bookmarks().unwrap();
    let from = state.folders[0].id.clone();
    let to = state.folders[1].id.clone();

    mgr.add_bookmark(&from, new_bookmark("A", "https://a.dev")).unwrap();
    mgr.add_bookmark(&from, new_bookmark("B", "https://b.dev")).unwrap();
    mgr.add_bookmark(&to, new_bookmark("C", "https://c.dev")).unwrap();
    let state = mgr.get_bookmarks().unwrap();
    let moving = ids_in(&state, &from)[0].clone();

    let state = mgr.move_bookmark(&from, &to, &moving).unwrap();
    assert_eq!(orders_in(&state, &from), vec![0]);
    assert_eq!(orders_in(&state, &to), vec![0, 1]);
    assert_eq!(ids_in(&state, &to)[1], moving);
}

#[test]
fn test_move_to_unknown_folder_changes_nothing() {
    let (_storage, mgr) = setup();
    let from = first_folder_id(&mgr.get_bookmarks().unwrap());
    let state = mgr.add_bookmark(&from, new_bookmark("A", "https://a.dev")).unwrap();
    let id = ids_in(&state, &from)[0].clone();

    assert!(matches!(
        mgr.move_bookmark(&from, "nowhere", &id),
        Err(BookmarkError::FolderNotFound(_))
    ));
    assert_eq!(ids_in(&mgr.get_bookmarks().unwrap(), &from), vec![id]);
}

#[test]
fn test_reorder_applies_permutation() {
    let (_storage, mgr) = setup();
    let folder_id = first_folder_id(&mgr.get_bookmarks().unwrap());
    for name in ["a", "b", "c"] {
        mgr.add_bookmark(&folder_id, new_bookmark(name, &format!("https://{}.dev", name)))
            .unwrap();
    }
    let ids = ids_in(&mgr.get_bookmarks().unwrap(), &folder_id);
    let reversed: Vec<String> = ids.iter().rev().cloned().collect();

    let state = mgr.reorder_bookmarks(&folder_id, &reversed).unwrap();
    assert_eq!(ids_in(&state, &folder_id), reversed);
    assert_eq!(orders_in(&state, &folder_id), vec![0, 1, 2]);
}

#[rstest]
#[case::too_short(vec![0, 1])]
#[case::duplicate(vec![0, 0, 1])]
fn test_reorder_rejects_non_permutations(#[case] picks: Vec<usize>) {
    let (_storage, mgr) = setup();
    let folder_id = first_folder_id(&mgr.get_bookmarks().unwrap());
    for name in ["a", "b", "c"] {
        mgr.add_bookmark(&folder_id, new_bookmark(name, &format!("https://{}.dev", name)))
            .unwrap();
    }
    let ids = ids_in(&mgr.get_bookmarks().unwrap(), &folder_id);
    let request: Vec<String> = picks.iter().map(|i| ids[*i].clone()).collect();

    let result = mgr.reorder_bookmarks(&folder_id, &request);
    assert!(matches!(result, Err(BookmarkError::InvalidReorder(_))));
    assert_eq!(ids_in(&mgr.get_bookmarks().unwrap(), &folder_id), ids);
}

#[test]
fn test_reorder_rejects_unknown_id() {
    let (_storage, mgr) = setup();
    let folder_id = first_folder_id(&mgr.get_bookmarks().unwrap());
    mgr.add_bookmark(&folder_id, new_bookmark("a", "https://a.dev")).unwrap();
    let result = mgr.reorder_bookmarks(&folder_id, &["ghost".to_string()]);
    assert!(matches!(result, Err(BookmarkError::NotFound(_))));
}

#[rstest]
#[case("RUST", 1)]
#[case("docs.rs", 1)]
#[case("handbook", 1)]
#[case("", 2)]
#[case("nothing-matches", 0)]
fn test_search_is_case_insensitive(#[case] query: &str, #[case] expected: usize) {
    let (_storage, mgr) = setup();
    let folder_id = first_folder_id(&mgr.get_bookmarks().unwrap());
    mgr.add_bookmark(&folder_id, new_bookmark("Rust Book", "https://doc.rust-lang.org")).unwrap();
    mgr.add_bookmark(
        &folder_id,
        NewBookmark {
            description: Some("The API Handbook".into()),
            ..new_bookmark("Docs", "https://docs.rs")
        },
    )
    .unwrap();

    let hits = mgr.search_bookmarks(query).unwrap();
    assert_eq!(hits.len(), expected);
    if let Some(hit) = hits.first() {
        assert_eq!(hit.folder_id, folder_id);
        assert_eq!(hit.folder_name, "Work");
    }
}

#[test]
fn test_export_then_replace_import_restores_document() {
    let (_storage, mgr) = setup();
    let folder_id = first_folder_id(&mgr.get_bookmarks().unwrap());
    mgr.add_bookmark(&folder_id, new_bookmark("A", "https://a.dev")).unwrap();
    let exported = mgr.export_bookmarks().unwrap();
    let before = mgr.get_bookmarks().unwrap();

    mgr.clear_all_bookmarks().unwrap();
    let restored = mgr.import_bookmarks(&exported, false).unwrap();
    assert_eq!(restored, before);
    assert_eq!(mgr.get_bookmarks().unwrap(), before);
}

#[test]
fn test_replace_import_fills_missing_identity() {
    let (_storage, mgr) = setup();
    let payload = json!({"folders": [{"name": "Imported", "bookmarks": [
        {"name": "B", "url": "https://b.dev", "order": 4},
        {"name": "A", "url": "https://a.dev", "order": 1}
    ]}]});
    let state = mgr.import_bookmarks(&payload.to_string(), false).unwrap();
    assert_eq!(state.version, 1);
    let folder = &state.folders[0];
    assert!(!folder.id.is_empty());
    assert_eq!(folder.bookmarks[0].name, "A");
    assert_eq!(folder.bookmarks[1].order, 1);
    assert!(folder.bookmarks.iter().all(|b| !b.id.is_empty() && b.created_at > 0));
}

#[test]
fn test_merge_import_skips_known_urls_and_appends_new_folders() {
    let (_storage, mgr) = setup();
    let state = mgr.get_bookmarks().unwrap();
    let work_id = state.folders[0].id.clone();
    let state = mgr.add_bookmark(&work_id, new_bookmark("A", "https://a.dev")).unwrap();
    let existing_id = ids_in(&state, &work_id)[0].clone();

    let payload = json!({"version": 1, "folders": [
        {"id": "x", "name": "Work", "bookmarks": [
            {"id": "i1", "name": "A again", "url": "https://a.dev", "order": 0},
            {"id": "i2", "name": "B", "url": "https://b.dev", "order": 1},
            {"id": "i3", "name": "B dup", "url": "https://b.dev", "order": 2}
        ]},
        {"id": "y", "name": "Reading", "bookmarks": [
            {"id": "i4", "name": "C", "url": "https://c.dev", "order": 0}
        ]}
    ]});
    let state = mgr.import_bookmarks(&payload.to_string(), true).unwrap();

    let work = state.folder(&work_id).unwrap();
    let urls: Vec<_> = work.bookmarks.iter().map(|b| b.url.as_str()).collect();
    assert_eq!(urls, vec!["https://a.dev", "https://b.dev"]);
    assert_eq!(work.bookmarks[0].id, existing_id);
    assert_ne!(work.bookmarks[1].id, "i2");
    assert_eq!(orders_in(&state, &work_id), vec![0, 1]);

    assert_eq!(state.folders.len(), 5);
    let reading = state.folders.last().unwrap();
    assert_eq!(reading.name, "Reading");
    assert_ne!(reading.id, "y");
}

#[rstest]
#[case("not json")]
#[case(r#"{"version": 1}"#)]
#[case(r#"{"folders": "nope"}"#)]
fn test_invalid_import_leaves_document_untouched(#[case] payload: &str) {
    let (_storage, mgr) = setup();
    let before = mgr.get_bookmarks().unwrap();
    assert!(matches!(
        mgr.import_bookmarks(payload, false),
        Err(BookmarkError::InvalidImport(_))
    ));
    assert_eq!(mgr.get_bookmarks().unwrap(), before);
}

#[test]
fn test_clear_all_reseeds() {
    let (_storage, mgr) = setup();
    let folder_id = first_folder_id(&mgr.get_bookmarks().unwrap());
    mgr.add_bookmark(&folder_id, new_bookmark("A", "https://a.dev")).unwrap();
    let state = mgr.clear_all_bookmarks().unwrap();
    assert_eq!(state.folders.len(), 4);
    assert!(state.folders.iter().all(|f| f.bookmarks.is_empty()));
    assert!(state.folder(&folder_id).is_none());
}
