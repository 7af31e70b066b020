//! Group-level consistency around per-track reconciliation
//!
//! Reconciling tracks one by one can make album-level tags drift apart (one
//! track loses a bracketed conductor name, its neighbours do not). When the
//! album name, or the album artist, was identical across the group before
//! and is not afterwards, it is restored on every track.

use super::field_reconciler::FieldReconciler;
use crate::models::{Track, TrackMetadata};
use std::borrow::{Borrow, BorrowMut};
use tracing::{error, info, warn};

/// Outcome of one guarded reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Tracks reconciled successfully
    pub processed: usize,
    /// Tracks whose reconciliation failed (left untouched)
    pub failed: usize,
    /// Tracks changed by reconciliation
    pub changed: usize,
    pub album_rolled_back: bool,
    pub album_artist_rolled_back: bool,
}

fn metadata<T: Borrow<Track>>(track: &T) -> &TrackMetadata {
    &<T as Borrow<Track>>::borrow(track).metadata
}

/// Uniformity of the album-level tags across a group
struct Snapshot {
    album: Option<String>,
    album_uniform: bool,
    album_artist: Vec<String>,
    album_artist_uniform: bool,
}

impl Snapshot {
    fn take<T: Borrow<Track>>(tracks: &[T]) -> Self {
        let first = tracks.first().map(metadata);
        let album = first.and_then(|m| m.album.clone());
        let album_artist = first.map(|m| m.albumartist.clone()).unwrap_or_default();
        Self {
            album_uniform: tracks.iter().all(|t| metadata(t).album == album),
            album_artist_uniform: tracks
                .iter()
                .all(|t| metadata(t).albumartist == album_artist),
            album,
            album_artist,
        }
    }
}

/// Reconcile every track, then undo album-level drift
///
/// Accepts owned tracks (a cluster's files) or borrowed ones (a selection
/// spanning clusters). A failing track is logged and skipped; the rest of the
/// group is still processed.
pub fn reconcile_group<T: BorrowMut<Track>>(
    tracks: &mut [T],
    reconciler: &FieldReconciler<'_>,
) -> BatchReport {
    let before = Snapshot::take(tracks);
    let mut report = BatchReport::default();

    for track in tracks.iter_mut() {
        let track = <T as BorrowMut<Track>>::borrow_mut(track);
        match reconciler.reconcile(track) {
            Ok(changed) => {
                report.processed += 1;
                if changed {
                    report.changed += 1;
                }
            }
            Err(e) => {
                report.failed += 1;
                error!(track = %track.filename, error = %e, "Failed to reconcile track");
            }
        }
    }

    let after = Snapshot::take(tracks);

    if before.album_uniform && !after.album_uniform {
        warn!(album = ?before.album, "Album name diverged, rolling back");
        for track in tracks.iter_mut() {
            let track = <T as BorrowMut<Track>>::borrow_mut(track);
            if track.metadata.album != before.album {
                track.metadata.album = before.album.clone();
                track.commit();
            }
        }
        report.album_rolled_back = true;
    }

    if before.album_artist_uniform && !after.album_artist_uniform {
        warn!(albumartist = ?before.album_artist, "Album artist diverged, rolling back");
        for track in tracks.iter_mut() {
            let track = <T as BorrowMut<Track>>::borrow_mut(track);
            if track.metadata.albumartist != before.album_artist
                || track.metadata.album_artist_compat != before.album_artist
            {
                track.metadata.albumartist = before.album_artist.clone();
                track.metadata.album_artist_compat = before.album_artist.clone();
                track.commit();
            }
        }
        report.album_artist_rolled_back = true;
    }

    info!(
        processed = report.processed,
        failed = report.failed,
        changed = report.changed,
        "Reconciled group"
    );
    report
}
