use super::test_db;
use crate::{DbError, PlaylistKind};

#[test]
fn test_playlist_crud() {
    let db = test_db();
    let p = db.create_playlist("Mix", PlaylistKind::Manual, None).unwrap();
    assert_eq!(p.name, "Mix");
    assert_eq!(p.kind, PlaylistKind::Manual);
    assert!(!p.is_synced());

    db.set_playlist_youtube_id(p.id, "PL1").unwrap();
    let got = db.get_playlist_by_name("Mix").unwrap().unwrap();
    assert_eq!(got.youtube_playlist_id.as_deref(), Some("PL1"));
    assert!(got.is_synced());

    db.delete_playlist(p.id).unwrap();
    assert!(db.get_playlist(p.id).unwrap().is_none());
}

#[test]
fn test_rebind_detached_playlist() {
    let db = test_db();
    let old = db.create_watched_channel("123", "general").unwrap();
    let p = db
        .create_playlist("general", PlaylistKind::Channel, Some(old.id))
        .unwrap();
    db.delete_watched_channel(old.id).unwrap();
    assert_eq!(db.get_playlist(p.id).unwrap().unwrap().watched_channel_id, None);

    let new = db.create_watched_channel("123", "general").unwrap();
    db.set_playlist_watched_channel(p.id, new.id).unwrap();
    let latest = db.get_latest_playlist_for_channel(new.id).unwrap().unwrap();
    assert_eq!(latest.id, p.id);

    let err = db.set_playlist_watched_channel(9999, new.id).unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)), "got {err:?}");
}

#[test]
fn test_playlist_name_is_unique() {
    let db = test_db();
    db.create_playlist("Mix", PlaylistKind::Manual, None).unwrap();
    let err = db
        .create_playlist("Mix", PlaylistKind::Server, None)
        .unwrap_err();
    assert!(matches!(err, DbError::Conflict(_)), "got {err:?}");
}

#[test]
fn test_latest_playlist_for_channel() {
    let db = test_db();
    let ch = db.create_watched_channel("123", "general").unwrap();
    assert!(db.get_latest_playlist_for_channel(ch.id).unwrap().is_none());

    db.create_playlist("general", PlaylistKind::Channel, Some(ch.id))
        .unwrap();
    let second = db
        .create_playlist("general 2", PlaylistKind::Channel, Some(ch.id))
        .unwrap();
    db.create_playlist("other", PlaylistKind::Manual, None).unwrap();

    let latest = db.get_latest_playlist_for_channel(ch.id).unwrap().unwrap();
    assert_eq!(latest.id, second.id);
}

#[test]
fn test_search_playlists() {
    let db = test_db();
    for name in ["Rock classics", "rock new", "Jazz", "Hard Rock"] {
        db.create_playlist(name, PlaylistKind::Manual, None).unwrap();
    }
    let names: Vec<String> = db
        .search_playlists("Rock", 25)
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Hard Rock", "Rock classics"]);

    assert_eq!(db.search_playlists("", 2).unwrap().len(), 2);
}

#[test]
fn test_set_youtube_id_on_missing_playlist() {
    let db = test_db();
    let err = db.set_playlist_youtube_id(7, "PL1").unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)));
}
