//! End-to-end workflow over a session document on disk
//!
//! Mirrors what the `cfix` binary does: load a session, run actions against
//! it, write it back, and teach the artist lookup from the corrected files.

use cfix_common::config::ReconcileConfig;
use cfix_common::Error;
use cfix_tagger::actions;
use cfix_tagger::models::Session;
use cfix_tagger::registry::{ArtistRegistry, ArtistRole};
use cfix_tagger::services::FieldReconciler;
use tempfile::TempDir;

const SESSION: &str = r#"{
    "clusters": [
        {
            "album": "Symphonies 5 & 7",
            "albumartist": "Herbert von Karajan; Berliner Philharmoniker",
            "files": [
                {
                    "filename": "02 Andante.flac",
                    "metadata": {
                        "title": "Sym. 5: Andante con moto",
                        "album": "Symphonies 5 & 7",
                        "artist": ["Herbert von Karajan", "Berliner Philharmoniker"],
                        "conductor": "Herbert von Karajan",
                        "tracknumber": 2,
                        "label": "DG"
                    }
                },
                {
                    "filename": "01 Allegro.flac",
                    "metadata": {
                        "title": "Sym. 5: Allegro con brio",
                        "album": "Symphonies 5 & 7",
                        "artist": "Herbert von Karajan; Berliner Philharmoniker",
                        "conductor": "Herbert von Karajan",
                        "tracknumber": "1"
                    }
                }
            ]
        }
    ]
}"#;

fn write_session(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("session.json");
    std::fs::write(&path, SESSION).unwrap();
    path
}

#[test]
fn test_fix_renumber_and_save() {
    let dir = TempDir::new().unwrap();
    let session_path = write_session(&dir);
    let registry = ArtistRegistry::open(dir.path().join("lookup").join("artists.csv"));
    let reconciler = FieldReconciler::new(&registry, &ReconcileConfig::default()).unwrap();

    let mut session = Session::load(&session_path).unwrap();
    assert_eq!(session.file_count(), 2);

    let reports = actions::fix_clusters(&mut session.clusters, &reconciler);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].processed, 2);
    assert_eq!(reports[0].failed, 0);

    assert_eq!(actions::renumber_clusters(&mut session.clusters), 2);
    assert_eq!(session.dirty_files().count(), 2);
    session.save(&session_path).unwrap();

    let reloaded = Session::load(&session_path).unwrap();
    let files: Vec<_> = reloaded.files().collect();
    assert_eq!(files[0].filename, "02 Andante.flac");
    assert_eq!(files[0].metadata.tracknumber.as_deref(), Some("2"));
    assert_eq!(files[1].metadata.tracknumber.as_deref(), Some("1"));
    assert_eq!(files[0].metadata.title.as_deref(), Some("Symphony 5: Andante con moto"));
    assert_eq!(
        files[0].metadata.orchestra.as_deref(),
        Some("Berliner Philharmoniker")
    );
    // Tags the reconciler does not know survive the round trip
    assert_eq!(files[0].metadata.extra.get("label"), Some(&serde_json::json!("DG")));
    // Dirty flags are not part of the document
    assert_eq!(reloaded.dirty_files().count(), 0);
}

#[test]
fn test_learned_artists_are_found_after_reopen() {
    let dir = TempDir::new().unwrap();
    let session_path = write_session(&dir);
    let lookup_path = dir.path().join("lookup").join("artists.csv");

    let registry = ArtistRegistry::open(&lookup_path);
    assert!(!registry.is_available());

    let mut session = Session::load(&session_path).unwrap();
    let reconciler = FieldReconciler::new(&registry, &ReconcileConfig::default()).unwrap();
    actions::fix_clusters(&mut session.clusters, &reconciler);

    assert_eq!(actions::add_conductors(session.files(), &registry), Some(2));
    assert_eq!(actions::add_orchestras(session.files(), &registry), Some(2));
    // Nothing has composer, composer view and epoque together
    assert_eq!(actions::add_composers(session.files(), &registry), Some(0));
    assert!(registry.is_available());

    let reopened = ArtistRegistry::open(&lookup_path);
    let (conductor, orchestra) = reopened
        .read(|table| {
            let table = table.expect("lookup file was written");
            (table.lookup("Karajan").cloned(), table.lookup("berliner philharmoniker").cloned())
        })
        .unwrap();

    let conductor = conductor.expect("secondary key for the conductor");
    assert_eq!(conductor.name, "Herbert von Karajan");
    assert_eq!(conductor.sort_order, "Karajan, Herbert von");
    assert_eq!(conductor.role, ArtistRole::Conductor);

    let orchestra = orchestra.expect("orchestra entry");
    assert_eq!(orchestra.role, ArtistRole::Orchestra);
    assert_eq!(orchestra.sort_order, "Berliner Philharmoniker");
}

#[test]
fn test_missing_session_file() {
    let dir = TempDir::new().unwrap();
    let result = Session::load(&dir.path().join("nope.json"));
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
fn test_malformed_session_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ \"clusters\": [ { \"files\": 3 } ] }").unwrap();
    assert!(matches!(Session::load(&path), Err(Error::Parse(_))));
}
