//! In-memory artist lookup table and its pipe-delimited file format
//!
//! One record per line: `key|name|sortOrder|sortOrderWithDates|role|epoch`.
//! Fields are not escaped, so a `|` inside a name corrupts the line.

use crate::text::{initials_name, last_name, make_key, SimilarityMatcher};
use cfix_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

const FIELD_SEPARATOR: char = '|';
const FIELD_COUNT: usize = 6;

/// Primary classification of an artist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtistRole {
    Composer,
    Conductor,
    Orchestra,
}

impl ArtistRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtistRole::Composer => "Composer",
            ArtistRole::Conductor => "Conductor",
            ArtistRole::Orchestra => "Orchestra",
        }
    }
}

impl fmt::Display for ArtistRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtistRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Composer" => Ok(ArtistRole::Composer),
            "Conductor" => Ok(ArtistRole::Conductor),
            "Orchestra" => Ok(ArtistRole::Orchestra),
            other => Err(Error::Parse(format!("unknown artist role '{}'", other))),
        }
    }
}

/// One row of the lookup table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRecord {
    /// Lookup key this row is stored under
    pub key: String,
    /// Canonical display name
    pub name: String,
    /// "Last, First"
    pub sort_order: String,
    /// "Last, First (1685-1750)"
    pub sort_order_with_dates: String,
    pub role: ArtistRole,
    /// Musical era (composers only)
    pub epoch: String,
}

impl ArtistRecord {
    /// Parse one line of the lookup file
    ///
    /// Returns `None` for lines with fewer than six fields or an unknown role.
    pub fn parse_line(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if parts.len() < FIELD_COUNT {
            return None;
        }
        let role = match parts[4].trim().parse::<ArtistRole>() {
            Ok(role) => role,
            Err(e) => {
                debug!(line = %line, error = %e, "Skipping lookup line");
                return None;
            }
        };
        Some(Self {
            key: parts[0].trim().to_string(),
            name: parts[1].trim().to_string(),
            sort_order: parts[2].trim().to_string(),
            sort_order_with_dates: parts[3].trim().to_string(),
            role,
            epoch: parts[5].trim().to_string(),
        })
    }

    pub fn to_line(&self) -> String {
        [
            self.key.as_str(),
            self.name.as_str(),
            self.sort_order.as_str(),
            self.sort_order_with_dates.as_str(),
            self.role.as_str(),
            self.epoch.as_str(),
        ]
        .join("|")
    }
}

/// Values supplied when learning a new or corrected artist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArtist {
    pub name: String,
    pub sort_order: String,
    pub sort_order_with_dates: String,
    pub role: ArtistRole,
    pub epoch: String,
}

impl NewArtist {
    fn record_for(&self, key: String) -> ArtistRecord {
        ArtistRecord {
            key,
            name: self.name.clone(),
            sort_order: self.sort_order.clone(),
            sort_order_with_dates: self.sort_order_with_dates.clone(),
            role: self.role,
            epoch: self.epoch.clone(),
        }
    }
}

/// Mapping from lookup key to record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistTable {
    records: BTreeMap<String, ArtistRecord>,
}

impl ArtistTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact lookup by an already-computed key
    pub fn get(&self, key: &str) -> Option<&ArtistRecord> {
        self.records.get(key)
    }

    /// Look up a display name by its canonical key
    pub fn lookup(&self, name: &str) -> Option<&ArtistRecord> {
        let key = make_key(name);
        if key.is_empty() {
            return None;
        }
        self.records.get(&key)
    }

    pub fn records(&self) -> impl Iterator<Item = &ArtistRecord> {
        self.records.values()
    }

    /// Parse the whole lookup file body; malformed lines are skipped
    pub fn parse(body: &str) -> Self {
        let mut table = Self::new();
        let mut skipped = 0usize;
        for line in body.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match ArtistRecord::parse_line(line) {
                Some(record) => {
                    table.records.insert(record.key.clone(), record);
                }
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!(skipped, "Skipped malformed lookup lines");
        }
        table
    }

    /// Render the table, one line per record in key order
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for record in self.records.values() {
            out.push_str(&record.to_line());
            out.push('\n');
        }
        out
    }

    /// Read a lookup file
    ///
    /// # Errors
    /// `Error::NotFound` when the file does not exist; `Error::Io` when it
    /// cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("artist lookup file {}", path.display())));
        }
        let body = std::fs::read_to_string(path)?;
        let table = Self::parse(&body);
        info!(path = %path.display(), artists = table.len(), "Loaded artist lookup");
        Ok(table)
    }

    /// Overwrite the lookup file with this table
    ///
    /// Writes to a sibling temp file and renames it over the target, so a
    /// failed write leaves the previous file intact.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, self.serialize())?;
        std::fs::rename(&temp_path, path)?;
        info!(path = %path.display(), artists = self.len(), "Saved artist lookup");
        Ok(())
    }

    /// Insert or update an artist
    ///
    /// The full-name key is always overwritten. Composers and conductors are
    /// also filed under their last name and their initials, but only when that
    /// key is free or already belongs to a similarly named artist, so a common
    /// surname is never taken over by an unrelated person. Orchestras are only
    /// keyed by full name.
    ///
    /// Similarity uses the default threshold; see [`ArtistTable::upsert_with`].
    pub fn upsert(&mut self, artist: &NewArtist) {
        self.upsert_with(artist, &SimilarityMatcher::default());
    }

    /// [`ArtistTable::upsert`] deciding secondary-key ownership with `matcher`
    pub fn upsert_with(&mut self, artist: &NewArtist, matcher: &SimilarityMatcher) {
        let key = make_key(&artist.name);
        self.records.insert(key.clone(), artist.record_for(key.clone()));
        info!(key = %key, role = %artist.role, "Added artist to lookup");

        if artist.role == ArtistRole::Orchestra {
            return;
        }

        for secondary in [make_key(&last_name(&artist.name)), make_key(&initials_name(&artist.name))] {
            if secondary.is_empty() || secondary == key {
                continue;
            }
            let claimable = match self.records.get(&secondary) {
                None => true,
                Some(existing) => matcher.is_similar(&existing.name, &artist.name),
            };
            if claimable {
                self.records
                    .insert(secondary.clone(), artist.record_for(secondary.clone()));
                info!(key = %secondary, "Added artist to lookup");
            } else {
                debug!(key = %secondary, name = %artist.name, "Secondary key held by another artist");
            }
        }
    }
}
