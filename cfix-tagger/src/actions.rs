//! Host entry points
//!
//! One function per menu action. Each runs to completion, logs its own
//! failures and hands back a summary; nothing here propagates an error to the
//! host.

use crate::models::{Cluster, Track};
use crate::registry::{ArtistRegistry, NewArtist};
use crate::services::lookup_learner::{composer_entries, conductor_entries, orchestra_entries};
use crate::services::{self, reconcile_group, track_sort_key, BatchReport, FieldReconciler, MergeReport};
use tracing::{error, info};

/// Classical fixes over a selection of files
pub fn fix_files(tracks: &mut [&mut Track], reconciler: &FieldReconciler<'_>) -> BatchReport {
    info!(files = tracks.len(), "Fixing selected files");
    reconcile_group(tracks, reconciler)
}

/// Classical fixes over each cluster's files, one consistency group per cluster
pub fn fix_clusters(clusters: &mut [Cluster], reconciler: &FieldReconciler<'_>) -> Vec<BatchReport> {
    info!(clusters = clusters.len(), "Fixing selected clusters");
    let mut reports = Vec::with_capacity(clusters.len());
    for cluster in clusters.iter_mut() {
        if cluster.files.is_empty() {
            continue;
        }
        reports.push(reconcile_group(&mut cluster.files, reconciler));
        cluster.update();
    }
    reports
}

/// Merge per-disc clusters into one album; `None` when the selection was rejected
pub fn combine_discs(clusters: &mut [Cluster]) -> Option<MergeReport> {
    match services::combine_discs(clusters) {
        Ok(report) => Some(report),
        Err(e) => {
            error!(error = %e, "Not combining discs");
            None
        }
    }
}

/// Renumber a file selection in album order
pub fn renumber_files(tracks: &mut [&mut Track]) -> usize {
    tracks.sort_by_cached_key(|t| track_sort_key(t));
    services::renumber(tracks)
}

/// Renumber every file of the selected clusters, ordered by filename
pub fn renumber_clusters(clusters: &mut [Cluster]) -> usize {
    let count = {
        let mut files: Vec<&mut Track> = clusters
            .iter_mut()
            .flat_map(|c| c.files.iter_mut())
            .collect();
        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        services::renumber(&mut files)
    };
    for cluster in clusters.iter_mut() {
        cluster.update();
    }
    count
}

/// Add the composers of the selected files to the lookup
pub fn add_composers<'t>(
    tracks: impl IntoIterator<Item = &'t Track>,
    registry: &ArtistRegistry,
) -> Option<usize> {
    learn("composer", composer_entries(tracks), registry)
}

/// Add the conductors of the selected files to the lookup
pub fn add_conductors<'t>(
    tracks: impl IntoIterator<Item = &'t Track>,
    registry: &ArtistRegistry,
) -> Option<usize> {
    learn("conductor", conductor_entries(tracks), registry)
}

/// Add the orchestras of the selected files to the lookup
pub fn add_orchestras<'t>(
    tracks: impl IntoIterator<Item = &'t Track>,
    registry: &ArtistRegistry,
) -> Option<usize> {
    learn("orchestra", orchestra_entries(tracks), registry)
}

/// Persist `entries`, returning how many were learned
fn learn(role: &'static str, entries: Vec<NewArtist>, registry: &ArtistRegistry) -> Option<usize> {
    if entries.is_empty() {
        info!(role, "Nothing to add to lookup");
        return Some(0);
    }
    match registry.learn(&entries) {
        Ok(total) => {
            info!(role, added = entries.len(), total, "Updated artist lookup");
            Some(entries.len())
        }
        Err(e) => {
            error!(role, path = %registry.path().display(), error = %e, "Failed to update artist lookup");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClusterMetadata, TrackMetadata};

    fn track(filename: &str, album: &str, disc: &str, number: &str) -> Track {
        Track::new(
            filename,
            TrackMetadata {
                album: Some(album.into()),
                discnumber: Some(disc.into()),
                tracknumber: Some(number.into()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_renumber_files_sorts_before_numbering() {
        let mut a = track("b.flac", "Requiem", "2", "1");
        let mut b = track("a.flac", "Requiem", "1", "1");
        let mut selection = vec![&mut a, &mut b];
        assert_eq!(renumber_files(&mut selection), 2);

        assert_eq!(b.metadata.tracknumber.as_deref(), Some("1"));
        assert_eq!(a.metadata.tracknumber.as_deref(), Some("2"));
        assert_eq!(a.metadata.origdiscnumber.as_deref(), Some("2"));
    }

    #[test]
    fn test_renumber_clusters_uses_filename_order() {
        let mut clusters = vec![
            Cluster::new(ClusterMetadata::default(), vec![track("02.flac", "Requiem", "1", "9")]),
            Cluster::new(ClusterMetadata::default(), vec![track("01.flac", "Requiem", "1", "3")]),
        ];
        assert_eq!(renumber_clusters(&mut clusters), 2);
        assert_eq!(clusters[1].files[0].metadata.tracknumber.as_deref(), Some("1"));
        assert_eq!(clusters[0].files[0].metadata.tracknumber.as_deref(), Some("2"));
        assert!(clusters.iter().all(|c| c.is_dirty()));
    }

    #[test]
    fn test_rejected_merge_returns_none() {
        let mut clusters = vec![Cluster::new(
            ClusterMetadata {
                album: Some("Requiem".into()),
                albumartist: None,
            },
            vec![track("01.flac", "Requiem", "1", "1")],
        )];
        assert!(combine_discs(&mut clusters).is_none());
        assert!(!clusters[0].is_dirty());
    }
}
