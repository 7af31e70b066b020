//! Teach the artist registry from hand-corrected tracks
//!
//! Each function reads one role's tags from the selected tracks and returns
//! the registry entries to upsert. Tracks lacking the required tags are
//! skipped. [`ArtistRegistry::learn`] then persists them in one cycle.
//!
//! [`ArtistRegistry::learn`]: crate::registry::ArtistRegistry::learn

use crate::models::{tag_value, Track};
use crate::registry::{ArtistRole, NewArtist};
use crate::text::reverse_name;
use tracing::{debug, info};

/// Sort order from a composer view: text before the first `(`, trimmed
///
/// "Bach, Johann Sebastian (1685-1750)" gives "Bach, Johann Sebastian".
pub fn composer_sort_order(composer_view: &str) -> String {
    composer_view
        .split('(')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Composers from tracks carrying composer, composer view and epoque
pub fn composer_entries<'t>(tracks: impl IntoIterator<Item = &'t Track>) -> Vec<NewArtist> {
    let mut entries = Vec::new();
    for track in tracks {
        let meta = &track.metadata;
        let (Some(name), Some(view), Some(epoch)) = (
            tag_value(&meta.composer),
            tag_value(&meta.composer_view),
            tag_value(&meta.epoque),
        ) else {
            info!(track = %track.filename, "No composer metadata available");
            continue;
        };
        entries.push(NewArtist {
            name: name.to_string(),
            sort_order: composer_sort_order(view),
            sort_order_with_dates: view.to_string(),
            role: ArtistRole::Composer,
            epoch: epoch.to_string(),
        });
    }
    entries
}

/// Conductors, sorted "Last, First" with no dates
pub fn conductor_entries<'t>(tracks: impl IntoIterator<Item = &'t Track>) -> Vec<NewArtist> {
    tracks
        .into_iter()
        .filter_map(|track| match tag_value(&track.metadata.conductor) {
            Some(name) => Some(NewArtist {
                name: name.to_string(),
                sort_order: reverse_name(name),
                sort_order_with_dates: String::new(),
                role: ArtistRole::Conductor,
                epoch: String::new(),
            }),
            None => {
                debug!(track = %track.filename, "No conductor tag");
                None
            }
        })
        .collect()
}

/// Orchestras, sorted under their own name
pub fn orchestra_entries<'t>(tracks: impl IntoIterator<Item = &'t Track>) -> Vec<NewArtist> {
    tracks
        .into_iter()
        .filter_map(|track| {
            tag_value(&track.metadata.orchestra).map(|name| NewArtist {
                name: name.to_string(),
                sort_order: name.to_string(),
                sort_order_with_dates: String::new(),
                role: ArtistRole::Orchestra,
                epoch: String::new(),
            })
        })
        .collect()
}
