use super::test_db;
use crate::{DbError, PlaylistKind};

#[test]
fn test_song_crud() {
    let db = test_db();
    let p = db.create_playlist("Mix", PlaylistKind::Manual, None).unwrap();
    let s = db.create_song(p.id, "abc123").unwrap();
    assert_eq!(s.playlist_id, p.id);
    assert!(!s.is_linked());
    assert_eq!(s.watch_url(), "https://www.youtube.com/watch?v=abc123");

    db.set_song_playlist_item_id(s.id, "IT1").unwrap();
    let got = db.get_song_by_video_id(p.id, "abc123").unwrap().unwrap();
    assert_eq!(got.youtube_playlist_item_id.as_deref(), Some("IT1"));

    db.delete_song(s.id).unwrap();
    assert!(db.get_song(s.id).unwrap().is_none());
}

#[test]
fn test_video_unique_within_playlist_only() {
    let db = test_db();
    let a = db.create_playlist("A", PlaylistKind::Manual, None).unwrap();
    let b = db.create_playlist("B", PlaylistKind::Manual, None).unwrap();

    db.create_song(a.id, "abc123").unwrap();
    let err = db.create_song(a.id, "abc123").unwrap_err();
    assert!(matches!(err, DbError::Conflict(_)), "got {err:?}");

    db.create_song(b.id, "abc123").unwrap();
    assert_eq!(db.get_playlist_songs(a.id).unwrap().len(), 1);
    assert_eq!(db.get_playlist_songs(b.id).unwrap().len(), 1);
}

#[test]
fn test_deleting_playlist_cascades_songs() {
    let db = test_db();
    let p = db.create_playlist("Mix", PlaylistKind::Manual, None).unwrap();
    let s1 = db.create_song(p.id, "v1").unwrap();
    let s2 = db.create_song(p.id, "v2").unwrap();

    db.delete_playlist(p.id).unwrap();
    assert!(db.get_song(s1.id).unwrap().is_none());
    assert!(db.get_song(s2.id).unwrap().is_none());
}
