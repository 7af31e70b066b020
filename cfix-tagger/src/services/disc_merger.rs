//! Combine per-disc clusters into one multi-disc album
//!
//! **Algorithm:**
//! 1. Validate: every cluster is non-empty and its album reads
//!    "<name> Disc <n>" (also "Disk", "Disc#"), with the same name everywhere
//! 2. Resolve disc ordinals 1..=N: by the number in the cluster album, else
//!    by a member track's `discnumber`
//! 3. Rewrite album, album artist, disc number, disc count and date on every
//!    track of a resolved cluster, then refresh each cluster view
//!
//! Validation is all-or-nothing and runs before anything is modified. An
//! ordinal that cannot be resolved is skipped and reported.

use crate::models::{join_names, split_names, tag_value, Cluster};
use cfix_common::Error;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error as ThisError;
use tracing::{debug, info, warn};

/// Prefix, a trailing "Disc"/"Disk" word, then an optional number ending the title
static DISC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.*)\b(?i:dis[ck])\b\s*#?\s*([0-9]*)\s*$").expect("disc pattern must compile")
});

/// Reasons the clusters cannot be merged
#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum DiscMergeError {
    #[error("no clusters selected")]
    NoClusters,

    #[error("cluster {index} has no files")]
    EmptyCluster { index: usize },

    #[error("album '{album}' does not look like part of a multi-disc set")]
    NotMultiDisc { album: String },

    #[error("album name mismatch: '{expected}' vs '{found}'")]
    AlbumMismatch { expected: String, found: String },
}

impl From<DiscMergeError> for Error {
    fn from(err: DiscMergeError) -> Self {
        Error::InvalidInput(err.to_string())
    }
}

/// What a merge did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub album: String,
    pub album_artist: Vec<String>,
    pub total_discs: usize,
    /// Ordinals no cluster could be matched to
    pub skipped_ordinals: Vec<usize>,
    pub tracks_updated: usize,
}

/// Album name and disc number parsed from a cluster album
#[derive(Debug, Clone, PartialEq, Eq)]
struct DiscTitle {
    name: String,
    number: Option<usize>,
}

fn parse_disc_title(album: &str) -> Option<DiscTitle> {
    let caps = DISC_RE.captures(album)?;
    let name = caps
        .get(1)
        .map(|m| m.as_str())
        .unwrap_or_default()
        .trim_matches(|c: char| matches!(c, ';' | ',' | '-' | ':' | ' '))
        .to_string();
    let number = caps.get(2).and_then(|m| m.as_str().parse().ok());
    Some(DiscTitle { name, number })
}

/// Leading integer of a disc number tag ("2/3" is disc 2)
fn leading_number(value: &str) -> Option<usize> {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn validate(clusters: &[Cluster]) -> Result<Vec<DiscTitle>, DiscMergeError> {
    if clusters.is_empty() {
        return Err(DiscMergeError::NoClusters);
    }

    let mut titles: Vec<DiscTitle> = Vec::with_capacity(clusters.len());
    for (index, cluster) in clusters.iter().enumerate() {
        if cluster.files.is_empty() {
            return Err(DiscMergeError::EmptyCluster { index });
        }
        let album = tag_value(&cluster.metadata.album).unwrap_or_default();
        let title = parse_disc_title(album)
            .filter(|t| !t.name.is_empty())
            .ok_or_else(|| DiscMergeError::NotMultiDisc {
                album: album.to_string(),
            })?;
        if let Some(first) = titles.first() {
            if first.name != title.name {
                return Err(DiscMergeError::AlbumMismatch {
                    expected: first.name.clone(),
                    found: title.name,
                });
            }
        }
        titles.push(title);
    }
    Ok(titles)
}

/// Cluster index for each ordinal `1..=titles.len()`
fn resolve_ordinals(clusters: &[Cluster], titles: &[DiscTitle]) -> Vec<Option<usize>> {
    let mut taken = vec![false; clusters.len()];
    let mut resolved = Vec::with_capacity(clusters.len());

    for ordinal in 1..=clusters.len() {
        let by_title = titles
            .iter()
            .enumerate()
            .position(|(i, t)| !taken[i] && t.number == Some(ordinal));
        let found = by_title.or_else(|| {
            clusters.iter().enumerate().position(|(i, c)| {
                !taken[i]
                    && c.files.iter().any(|f| {
                        tag_value(&f.metadata.discnumber).and_then(leading_number) == Some(ordinal)
                    })
            })
        });
        if let Some(i) = found {
            debug!(ordinal, cluster = i, by_title = by_title.is_some(), "Resolved disc");
            taken[i] = true;
        }
        resolved.push(found);
    }
    resolved
}

/// Merge `clusters` into a single album
///
/// # Errors
/// `Error::InvalidInput` (from [`DiscMergeError`]) when validation fails, in
/// which case no cluster or track has been modified.
pub fn combine_discs(clusters: &mut [Cluster]) -> cfix_common::Result<MergeReport> {
    let titles = validate(clusters)?;
    let total = clusters.len();
    let album = titles[0].name.clone();
    info!(album = %album, discs = total, "Clusters form one multi-disc set, combining");

    let resolved = resolve_ordinals(clusters, &titles);

    // Album artist and date come from disc 1, read before anything changes
    let disc_one = resolved.first().copied().flatten().map(|i| &clusters[i]);
    let album_artist: Option<Vec<String>> = disc_one.and_then(|c| {
        tag_value(&c.metadata.albumartist)
            .map(split_names)
            .filter(|names| !names.is_empty())
            .or_else(|| {
                c.files
                    .first()
                    .map(|f| f.metadata.albumartist.clone())
                    .filter(|names| !names.is_empty())
            })
    });
    let date: Option<String> =
        disc_one.and_then(|c| c.files.first()).and_then(|f| f.metadata.date.clone());

    let mut report = MergeReport {
        album: album.clone(),
        album_artist: album_artist.clone().unwrap_or_default(),
        total_discs: total,
        ..Default::default()
    };

    for (offset, slot) in resolved.iter().enumerate() {
        let ordinal = offset + 1;
        let Some(index) = *slot else {
            warn!(ordinal, album = %album, "No cluster found for disc, skipping");
            report.skipped_ordinals.push(ordinal);
            continue;
        };

        for file in clusters[index].files.iter_mut() {
            info!(track = %file.filename, disc = ordinal, "Updating track for combined album");
            let meta = &mut file.metadata;
            meta.album = Some(album.clone());
            if let Some(names) = &album_artist {
                meta.albumartist = names.clone();
                meta.album_artist_compat = names.clone();
            }
            meta.discnumber = Some(ordinal.to_string());
            meta.totaldiscs = Some(total.to_string());
            if date.is_some() {
                meta.date = date.clone();
            }
            file.commit();
            report.tracks_updated += 1;
        }
    }

    for cluster in clusters.iter_mut() {
        cluster.metadata.album = Some(album.clone());
        if let Some(names) = &album_artist {
            cluster.metadata.albumartist = Some(join_names(names));
        }
        cluster.update();
    }

    Ok(report)
}
