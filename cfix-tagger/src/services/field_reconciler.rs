//! Per-track metadata reconciliation
//!
//! **Algorithm** (fixed order, later steps read what earlier steps wrote):
//! 1. Normalize the artist and album-artist lists
//! 2. Fill empty composer/conductor/orchestra from registry hits in the lists
//! 3. Re-look up a single composer, or fabricate its sort name
//! 4. Canonicalize conductor and orchestra spellings
//! 5. Guess an orchestra from ensemble-like names in the lists
//! 6. Move conductor and orchestra to the front of each list
//! 7. Split `&`-joined credits (except configured ensemble phrases)
//! 8. Remove the composer from the lists
//! 9. Cross-fill empty lists, mirror `albumartist` into `album artist`
//! 10. Strip `[Conductor]` / `[Composer]` last-name brackets from the album
//! 11. Apply the title/album text rules
//! 12. Stamp the genre taxonomy
//! 13. Stamp `classicalfixesdate` and commit when anything changed
//!
//! Steps 2 to 4 need the artist registry; without one they are skipped,
//! except that a composer sort name is still fabricated.

use crate::models::{split_names, tag_value, Track, TrackMetadata};
use crate::registry::{ArtistRecord, ArtistRegistry, ArtistRole, ArtistTable};
use crate::services::genre_taxonomy::stamp_genre;
use crate::text::{apply_rules, last_name, reverse_name, SimilarityMatcher};
use cfix_common::config::ReconcileConfig;
use cfix_common::{time, Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

/// Names that look like an ensemble rather than a person
static ORCHESTRA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)orchestr|orkest|philharmoni|consort|ensemb|sinfonia|symphon|band")
        .expect("orchestra pattern must compile")
});

/// Per-track reconciliation engine bound to one registry
pub struct FieldReconciler<'a> {
    registry: &'a ArtistRegistry,
    matcher: SimilarityMatcher,
    ampersand_exceptions: Vec<Regex>,
}

impl<'a> FieldReconciler<'a> {
    /// Build a reconciler from the `[reconcile]` config section
    ///
    /// # Errors
    /// `Error::Config` if an ampersand exception is not a valid regex.
    pub fn new(registry: &'a ArtistRegistry, config: &ReconcileConfig) -> Result<Self> {
        let ampersand_exceptions = config
            .ampersand_exceptions
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    Error::Config(format!("Invalid ampersand exception '{}': {}", pattern, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            registry,
            matcher: SimilarityMatcher::new(config.similarity_threshold),
            ampersand_exceptions,
        })
    }

    /// Reconcile one track in place
    ///
    /// Works on a copy of the metadata; the track is only touched when the
    /// whole pass succeeds. Returns true if the track changed (and was
    /// committed).
    pub fn reconcile(&self, track: &mut Track) -> Result<bool> {
        let _span = tracing::info_span!("reconcile", track = %track.filename).entered();
        info!("Processing track");

        let original = track.metadata.clone();
        let mut metadata = original.clone();
        self.registry
            .read(|table| self.apply(&mut metadata, table))??;

        if metadata == original {
            debug!("Nothing changed");
            return Ok(false);
        }

        metadata.classicalfixesdate = Some(time::stamp());
        track.metadata = metadata;
        track.commit();
        Ok(true)
    }

    fn apply(&self, meta: &mut TrackMetadata, table: Option<&ArtistTable>) -> Result<()> {
        // 1. List normalization
        let mut artists = expand(&meta.artist);
        let mut album_artists = if meta.albumartist.is_empty() {
            if !meta.album_artist_compat.is_empty() {
                debug!("Using 'album artist' for missing albumartist");
            }
            expand(&meta.album_artist_compat)
        } else {
            expand(&meta.albumartist)
        };
        if album_artists.is_empty() {
            album_artists = artists.clone();
        } else if artists.is_empty() {
            artists = album_artists.clone();
        }
        if album_artists.len() == 1 && album_artists[0] == "Various" {
            album_artists[0] = "Various Artists".to_string();
        }

        if let Some(table) = table {
            // 2. Role inference, artist list first
            for name in artists.iter().chain(album_artists.iter()) {
                match table.lookup(name) {
                    Some(record) => fill_role(meta, record),
                    None => debug!(name = %name, "No artist found in lookup"),
                }
            }
        }

        // 3. Single composer
        self.resolve_composer(meta, table);

        // 4. Conductor and orchestra spelling
        if let Some(table) = table {
            canonicalize(&mut meta.conductor, "conductor", ArtistRole::Conductor, table);
            canonicalize(&mut meta.orchestra, "orchestra", ArtistRole::Orchestra, table);
        }

        // 5. Orchestra from free text
        if tag_value(&meta.orchestra).is_none() {
            let guess = artists
                .iter()
                .chain(album_artists.iter())
                .find(|name| ORCHESTRA_RE.is_match(name))
                .cloned();
            if let Some(name) = guess {
                set_tag(&mut meta.orchestra, "orchestra", &name);
            }
        }

        // 6. Conductor and orchestra first
        let conductor = tag_value(&meta.conductor);
        let orchestra = tag_value(&meta.orchestra);
        album_artists = self.rearrange(&album_artists, conductor, orchestra);
        artists = self.rearrange(&artists, conductor, orchestra);

        // 7. Ampersand credits
        album_artists = self.split_ampersands(album_artists);
        artists = self.split_ampersands(artists);

        // 8. Composer is not an artist credit
        if let Some(composer) = tag_value(&meta.composer) {
            let composer = composer.trim().to_lowercase();
            album_artists = self.without_similar(album_artists, &composer);
            artists = self.without_similar(artists, &composer);
        }

        // 9. Cross-fill
        if artists.is_empty() {
            artists = album_artists.clone();
        }
        if album_artists.is_empty() {
            album_artists = artists.clone();
        }
        set_list(&mut meta.artist, "artist", artists);
        set_list(&mut meta.albumartist, "albumartist", album_artists.clone());
        set_list(&mut meta.album_artist_compat, "album artist", album_artists);

        // 10. Bracketed last names in the album
        if let Some(album) = tag_value(&meta.album) {
            let mut cleaned = album.to_string();
            for person in [tag_value(&meta.conductor), tag_value(&meta.composer)]
                .into_iter()
                .flatten()
            {
                cleaned = strip_bracketed(&cleaned, &last_name(person))?;
            }
            set_tag(&mut meta.album, "album", &cleaned);
        }

        // 11. Text rules
        if let Some(title) = tag_value(&meta.title) {
            let fixed = apply_rules(title);
            set_tag(&mut meta.title, "title", &fixed);
        }
        if let Some(album) = tag_value(&meta.album) {
            let fixed = apply_rules(album);
            set_tag(&mut meta.album, "album", &fixed);
        }

        // 12. Genre
        stamp_genre(meta);

        Ok(())
    }

    fn resolve_composer(&self, meta: &mut TrackMetadata, table: Option<&ArtistTable>) {
        let Some(composer) = tag_value(&meta.composer).map(str::to_string) else {
            return;
        };
        if split_names(&composer).len() != 1 {
            return;
        }

        match table.and_then(|t| t.lookup(&composer)) {
            Some(record) if record.role == ArtistRole::Composer => {
                info!(composer = %record.name, "Found composer in lookup");
                set_tag(&mut meta.composer, "composer", &record.name);
                set_tag(&mut meta.composer_view, "composer view", &record.sort_order_with_dates);
                set_tag(&mut meta.composersort, "composersort", &record.sort_order);
                if !record.epoch.is_empty() {
                    set_tag(&mut meta.epoque, "epoque", &record.epoch);
                }
            }
            Some(record) => {
                debug!(name = %record.name, role = %record.role, "Composer key held by another role");
            }
            None => {
                if tag_value(&meta.composer_view).is_none() {
                    info!(composer = %composer, "Composer not in lookup, fabricating sort name");
                    let view = reverse_name(&composer);
                    set_tag(&mut meta.composer_view, "composer view", &view);
                    set_tag(&mut meta.composersort, "composersort", &view);
                }
            }
        }
    }

    /// Rebuild `names` as `[conductor?, orchestra?, rest...]` when either is credited
    fn rearrange(
        &self,
        names: &[String],
        conductor: Option<&str>,
        orchestra: Option<&str>,
    ) -> Vec<String> {
        let conductor_lower = conductor.map(str::to_lowercase);
        let orchestra_lower = orchestra.map(str::to_lowercase);

        let mut found_conductor: Option<String> = None;
        let mut found_orchestra: Option<String> = None;
        for name in names {
            let lower = name.to_lowercase();
            if let Some(c) = &conductor_lower {
                if self.matcher.is_similar(&lower, c) {
                    debug!(name = %name, "Found conductor in credits");
                    found_conductor = Some(lower);
                    continue;
                }
            }
            if let Some(o) = &orchestra_lower {
                if self.matcher.is_similar(&lower, o) {
                    debug!(name = %name, "Found orchestra in credits");
                    found_orchestra = Some(lower);
                }
            }
        }

        if found_conductor.is_none() && found_orchestra.is_none() {
            return names.to_vec();
        }

        let mut out = Vec::with_capacity(names.len());
        if let (Some(_), Some(c)) = (&found_conductor, conductor) {
            out.push(c.to_string());
        }
        if let (Some(_), Some(o)) = (&found_orchestra, orchestra) {
            out.push(o.to_string());
        }
        for name in names {
            let lower = name.to_lowercase();
            if found_conductor.as_deref() == Some(lower.as_str())
                || found_orchestra.as_deref() == Some(lower.as_str())
            {
                continue;
            }
            out.push(name.clone());
        }
        out
    }

    fn split_ampersands(&self, names: Vec<String>) -> Vec<String> {
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            if !name.contains('&') || self.ampersand_exceptions.iter().any(|re| re.is_match(&name)) {
                out.push(name);
                continue;
            }
            debug!(name = %name, "Splitting ampersand credit");
            out.extend(
                name.split('&')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from),
            );
        }
        out
    }

    /// Drop entries similar to `composer`, unless nothing would be left
    fn without_similar(&self, names: Vec<String>, composer: &str) -> Vec<String> {
        let kept: Vec<String> = names
            .iter()
            .filter(|n| !self.matcher.is_similar(&n.trim().to_lowercase(), composer))
            .map(|n| n.trim().to_string())
            .collect();
        if kept.is_empty() {
            names
        } else {
            kept
        }
    }
}

fn expand(names: &[String]) -> Vec<String> {
    names.iter().flat_map(|n| split_names(n)).collect()
}

/// Fill the empty field matching the record's role
fn fill_role(meta: &mut TrackMetadata, record: &ArtistRecord) {
    match record.role {
        ArtistRole::Orchestra if tag_value(&meta.orchestra).is_none() => {
            set_tag(&mut meta.orchestra, "orchestra", &record.name);
        }
        ArtistRole::Conductor if tag_value(&meta.conductor).is_none() => {
            set_tag(&mut meta.conductor, "conductor", &record.name);
        }
        ArtistRole::Composer if tag_value(&meta.composer).is_none() => {
            set_tag(&mut meta.composer, "composer", &record.name);
            set_tag(&mut meta.composer_view, "composer view", &record.sort_order_with_dates);
            set_tag(&mut meta.composersort, "composersort", &record.sort_order);
            set_tag(&mut meta.epoque, "epoque", &record.epoch);
        }
        _ => {}
    }
}

fn canonicalize(slot: &mut Option<String>, field: &'static str, role: ArtistRole, table: &ArtistTable) {
    let Some(current) = tag_value(slot) else {
        return;
    };
    if let Some(record) = table.lookup(current).filter(|r| r.role == role) {
        let name = record.name.clone();
        set_tag(slot, field, &name);
    }
}

/// Remove `[last]` (any case) from `album`
fn strip_bracketed(album: &str, last: &str) -> Result<String> {
    if last.is_empty() {
        return Ok(album.to_string());
    }
    let re = Regex::new(&format!(r"(?i)\[{}\]", regex::escape(last)))
        .map_err(|e| Error::Internal(format!("bracket pattern for '{}': {}", last, e)))?;
    Ok(re.replace_all(album, "").trim().to_string())
}

/// Assign a single-valued tag, logging real changes (empty clears the tag)
fn set_tag(slot: &mut Option<String>, field: &'static str, value: &str) {
    let value = (!value.is_empty()).then(|| value.to_string());
    if *slot != value {
        info!(field, old = ?slot, new = ?value, "Updating tag");
        *slot = value;
    }
}

fn set_list(slot: &mut Vec<String>, field: &'static str, value: Vec<String>) {
    if *slot != value {
        info!(field, old = ?slot, new = ?value, "Updating tag");
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NewArtist;

    fn registry() -> ArtistRegistry {
        let mut table = ArtistTable::new();
        for (name, sort, dates, role, epoch) in [
            ("Herbert von Karajan", "Karajan, Herbert von", "", ArtistRole::Conductor, ""),
            ("Berlin Philharmonic", "Berlin Philharmonic", "", ArtistRole::Orchestra, ""),
            (
                "Johann Sebastian Bach",
                "Bach, Johann Sebastian",
                "Bach, Johann Sebastian (1685-1750)",
                ArtistRole::Composer,
                "Baroque",
            ),
        ] {
            table.upsert(&NewArtist {
                name: name.to_string(),
                sort_order: sort.to_string(),
                sort_order_with_dates: dates.to_string(),
                role,
                epoch: epoch.to_string(),
            });
        }
        ArtistRegistry::with_table("unused.csv", table)
    }

    fn track(metadata: TrackMetadata) -> Track {
        Track::new("01.flac", metadata)
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_conductor_and_orchestra_from_artists() {
        let registry = registry();
        let reconciler = FieldReconciler::new(&registry, &ReconcileConfig::default()).unwrap();
        let mut t = track(TrackMetadata {
            artist: names(&["Herbert von Karajan; Berlin Philharmonic"]),
            ..Default::default()
        });

        assert!(reconciler.reconcile(&mut t).unwrap());
        let m = &t.metadata;
        assert_eq!(m.conductor.as_deref(), Some("Herbert von Karajan"));
        assert_eq!(m.orchestra.as_deref(), Some("Berlin Philharmonic"));
        assert_eq!(m.albumartist, names(&["Herbert von Karajan", "Berlin Philharmonic"]));
        assert_eq!(m.album_artist_compat, m.albumartist);
        assert!(m.classicalfixesdate.is_some());
        assert!(t.is_dirty());
    }

    #[test]
    fn test_composer_filled_and_removed_from_credits() {
        let registry = registry();
        let reconciler = FieldReconciler::new(&registry, &ReconcileConfig::default()).unwrap();
        let mut t = track(TrackMetadata {
            artist: names(&["Johann Sebastian Bach", "Glenn Gould"]),
            ..Default::default()
        });

        reconciler.reconcile(&mut t).unwrap();
        let m = &t.metadata;
        assert_eq!(m.composer.as_deref(), Some("Johann Sebastian Bach"));
        assert_eq!(m.composer_view.as_deref(), Some("Bach, Johann Sebastian (1685-1750)"));
        assert_eq!(m.composersort.as_deref(), Some("Bach, Johann Sebastian"));
        assert_eq!(m.epoque.as_deref(), Some("Baroque"));
        assert_eq!(m.artist, names(&["Glenn Gould"]));
    }

    #[test]
    fn test_unknown_composer_gets_fabricated_sort_name() {
        let registry = ArtistRegistry::with_table("unused.csv", ArtistTable::new());
        let reconciler = FieldReconciler::new(&registry, &ReconcileConfig::default()).unwrap();
        let mut t = track(TrackMetadata {
            composer: Some("Arvo Pärt".into()),
            genre: Some("Classical".into()),
            ..Default::default()
        });

        reconciler.reconcile(&mut t).unwrap();
        assert_eq!(t.metadata.composer_view.as_deref(), Some("Pärt, Arvo"));
        assert_eq!(t.metadata.composersort.as_deref(), Some("Pärt, Arvo"));
    }

    #[test]
    fn test_sole_composer_credit_is_kept() {
        let registry = registry();
        let reconciler = FieldReconciler::new(&registry, &ReconcileConfig::default()).unwrap();
        let mut t = track(TrackMetadata {
            artist: names(&["Johann Sebastian Bach"]),
            ..Default::default()
        });

        reconciler.reconcile(&mut t).unwrap();
        assert_eq!(t.metadata.artist, names(&["Johann Sebastian Bach"]));
    }

    #[test]
    fn test_orchestra_guessed_from_free_text() {
        let registry = registry();
        let reconciler = FieldReconciler::new(&registry, &ReconcileConfig::default()).unwrap();
        let mut t = track(TrackMetadata {
            artist: names(&["Jordi Savall", "Le Concert des Nations"]),
            albumartist: names(&["Hespèrion XXI Consort"]),
            ..Default::default()
        });

        reconciler.reconcile(&mut t).unwrap();
        assert_eq!(t.metadata.orchestra.as_deref(), Some("Hespèrion XXI Consort"));
        assert_eq!(t.metadata.albumartist, names(&["Hespèrion XXI Consort"]));
    }

    #[test]
    fn test_credits_reordered_with_canonical_spelling() {
        let registry = registry();
        let reconciler = FieldReconciler::new(&registry, &ReconcileConfig::default()).unwrap();
        let mut t = track(TrackMetadata {
            conductor: Some("Herbert von Karajan".into()),
            albumartist: names(&["Anne-Sophie Mutter", "herbert von karajan."]),
            ..Default::default()
        });

        reconciler.reconcile(&mut t).unwrap();
        assert_eq!(
            t.metadata.albumartist,
            names(&["Herbert von Karajan", "Anne-Sophie Mutter"])
        );
    }

    #[test]
    fn test_ampersand_split_and_exception() {
        let registry = registry();
        let reconciler = FieldReconciler::new(&registry, &ReconcileConfig::default()).unwrap();
        let mut t = track(TrackMetadata {
            artist: names(&["Itzhak Perlman & Vladimir Ashkenazy", "Mantovani & His Orchestra"]),
            ..Default::default()
        });

        reconciler.reconcile(&mut t).unwrap();
        // The ensemble credit is also taken as the orchestra and moved first
        assert_eq!(t.metadata.orchestra.as_deref(), Some("Mantovani & His Orchestra"));
        assert_eq!(
            t.metadata.artist,
            names(&["Mantovani & His Orchestra", "Itzhak Perlman", "Vladimir Ashkenazy"])
        );
    }

    #[test]
    fn test_bracketed_conductor_removed_from_album() {
        let registry = registry();
        let reconciler = FieldReconciler::new(&registry, &ReconcileConfig::default()).unwrap();
        let mut t = track(TrackMetadata {
            album: Some("Beethoven: Symphony No. 5 [KARAJAN]".into()),
            conductor: Some("Herbert von Karajan".into()),
            ..Default::default()
        });

        reconciler.reconcile(&mut t).unwrap();
        assert_eq!(t.metadata.album.as_deref(), Some("Beethoven: Symphony #5"));
    }

    #[test]
    fn test_various_becomes_various_artists() {
        let registry = registry();
        let reconciler = FieldReconciler::new(&registry, &ReconcileConfig::default()).unwrap();
        let mut t = track(TrackMetadata {
            artist: names(&["Maria Callas"]),
            albumartist: names(&["Various"]),
            ..Default::default()
        });

        reconciler.reconcile(&mut t).unwrap();
        assert_eq!(t.metadata.albumartist, names(&["Various Artists"]));
        assert_eq!(t.metadata.album_artist_compat, names(&["Various Artists"]));
    }

    #[test]
    fn test_second_pass_changes_nothing() {
        let registry = registry();
        let reconciler = FieldReconciler::new(&registry, &ReconcileConfig::default()).unwrap();
        let mut t = track(TrackMetadata {
            title: Some("Symphony No. 9 Op.125".into()),
            artist: names(&["Herbert von Karajan; Berlin Philharmonic"]),
            genre: Some("Symphonic".into()),
            ..Default::default()
        });

        assert!(reconciler.reconcile(&mut t).unwrap());
        let first = t.metadata.clone();
        assert!(!reconciler.reconcile(&mut t).unwrap());
        assert_eq!(t.metadata, first);
        assert_eq!(first.title.as_deref(), Some("Symphony #9 Op. 125"));
        assert_eq!(first.origgenre.as_deref(), Some("Symphonic"));
    }

    #[test]
    fn test_invalid_exception_pattern_rejected() {
        let registry = registry();
        let config = ReconcileConfig {
            ampersand_exceptions: vec!["(unclosed".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            FieldReconciler::new(&registry, &config),
            Err(Error::Config(_))
        ));
    }
}
