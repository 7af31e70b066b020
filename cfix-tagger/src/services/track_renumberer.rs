//! Sequential track numbering across merged discs
//!
//! Tracks are expected in album order (see [`track_sort_key`]). Each album
//! becomes a single disc numbered 1..n; any disc or track number that changes
//! is kept in `origdiscnumber` / `origtracknumber`.

use crate::models::{join_names, tag_value, Track};
use tracing::{debug, info};

/// Left-pad with zeros to `width` characters
fn zero_pad(value: &str, width: usize) -> String {
    format!("{:0>width$}", value, width = width)
}

/// Sort key grouping an album's tracks in disc and track order
///
/// `albumartist + album + discnumber (4 wide) + tracknumber (7 wide)`.
pub fn track_sort_key(track: &Track) -> String {
    let meta = &track.metadata;
    format!(
        "{}{}{}{}",
        join_names(&meta.albumartist),
        meta.album.as_deref().unwrap_or_default(),
        zero_pad(meta.discnumber.as_deref().unwrap_or_default(), 4),
        zero_pad(meta.tracknumber.as_deref().unwrap_or_default(), 7),
    )
}

/// Renumber already-sorted tracks, returning how many were touched
pub fn renumber(tracks: &mut [&mut Track]) -> usize {
    debug!(count = tracks.len(), "Renumbering tracks");

    let mut current: Option<(Option<String>, Vec<String>)> = None;
    let mut counter = 1usize;

    for track in tracks.iter_mut() {
        let album_key = (track.metadata.album.clone(), track.metadata.albumartist.clone());
        if current.as_ref() != Some(&album_key) {
            counter = 1;
            current = Some(album_key);
        }

        let number = counter.to_string();
        let meta = &mut track.metadata;
        if let Some(disc) = tag_value(&meta.discnumber) {
            if disc != "1" {
                meta.origdiscnumber = Some(disc.to_string());
            }
        }
        if let Some(old) = tag_value(&meta.tracknumber) {
            if old != number {
                meta.origtracknumber = Some(old.to_string());
            }
        }
        meta.discnumber = Some("1".to_string());
        meta.tracknumber = Some(number);

        info!(track = %track.filename, tracknumber = counter, "Renumbered track");
        track.commit();
        counter += 1;
    }

    tracks.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrackMetadata;

    fn track(album: &str, disc: &str, number: &str) -> Track {
        Track::new(
            format!("{}-{}-{}.flac", album, disc, number),
            TrackMetadata {
                album: Some(album.to_string()),
                albumartist: vec!["Karl Böhm".to_string()],
                discnumber: Some(disc.to_string()),
                tracknumber: Some(number.to_string()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_sort_key_orders_discs_then_tracks() {
        let a = track_sort_key(&track("Requiem", "1", "10"));
        let b = track_sort_key(&track("Requiem", "2", "2"));
        let c = track_sort_key(&track("Requiem", "1", "9"));
        assert!(c < a);
        assert!(a < b);
        assert!(a.ends_with("00010000010"));
    }

    #[test]
    fn test_renumber_continues_across_discs() {
        let mut tracks = vec![
            track("Requiem", "1", "1"),
            track("Requiem", "1", "2"),
            track("Requiem", "2", "1"),
            track("Requiem", "2", "2"),
        ];
        let mut refs: Vec<&mut Track> = tracks.iter_mut().collect();
        assert_eq!(renumber(&mut refs), 4);

        let numbers: Vec<_> = tracks
            .iter()
            .map(|t| t.metadata.tracknumber.clone().unwrap())
            .collect();
        assert_eq!(numbers, vec!["1", "2", "3", "4"]);
        assert!(tracks.iter().all(|t| t.metadata.discnumber.as_deref() == Some("1")));

        assert_eq!(tracks[0].metadata.origtracknumber, None);
        assert_eq!(tracks[0].metadata.origdiscnumber, None);
        assert_eq!(tracks[2].metadata.origdiscnumber.as_deref(), Some("2"));
        assert_eq!(tracks[2].metadata.origtracknumber.as_deref(), Some("1"));
        assert!(tracks.iter().all(|t| t.is_dirty()));
    }

    #[test]
    fn test_counter_resets_per_album() {
        let mut tracks = vec![
            track("Requiem", "1", "1"),
            track("Requiem", "1", "2"),
            track("Vespers", "1", "5"),
        ];
        let mut refs: Vec<&mut Track> = tracks.iter_mut().collect();
        renumber(&mut refs);

        assert_eq!(tracks[2].metadata.tracknumber.as_deref(), Some("1"));
        assert_eq!(tracks[2].metadata.origtracknumber.as_deref(), Some("5"));
    }
}
