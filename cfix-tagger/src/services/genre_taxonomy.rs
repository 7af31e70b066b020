//! Classical genre stamping
//!
//! Tracks end up with genre "Classical". A recognised classical sub-genre
//! ("Symphonic", "Opera", ...) is kept in `origgenre`; any other genre is
//! left alone so a rock album is never relabelled.

use crate::models::{tag_value, TrackMetadata};

pub const CLASSICAL: &str = "Classical";

/// Sub-genres folded into "Classical" (compared lower-cased)
pub const SUB_GENRES: &[&str] = &[
    "opera",
    "operetta",
    "orchestral",
    "keyboard",
    "symphonic",
    "chamber",
    "choral",
    "vocal",
    "sacred",
    "concerto",
    "sonata",
    "oratorio",
];

/// True for genres that belong under "Classical"
pub fn is_sub_genre(genre: &str) -> bool {
    let lower = genre.trim().to_lowercase();
    SUB_GENRES.contains(&lower.as_str())
}

/// Apply the genre rule to one track, returning true if anything changed
pub fn stamp_genre(metadata: &mut TrackMetadata) -> bool {
    match tag_value(&metadata.genre).map(str::to_string) {
        None => {
            tracing::info!(genre = CLASSICAL, "Setting missing genre");
            metadata.genre = Some(CLASSICAL.to_string());
            true
        }
        Some(genre) if genre != CLASSICAL && is_sub_genre(&genre) => {
            tracing::info!(origgenre = %genre, "Moving sub-genre to origgenre");
            metadata.origgenre = Some(genre);
            metadata.genre = Some(CLASSICAL.to_string());
            true
        }
        Some(_) => false,
    }
}
