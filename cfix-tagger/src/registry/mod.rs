//! Artist registry service
//!
//! Owns the lookup table for the lifetime of the process. Reads go through
//! [`ArtistRegistry::read`]; the "add to lookup" operations go through
//! [`ArtistRegistry::learn`], which performs a full reload/mutate/save cycle
//! while holding the write lock.
//!
//! A registry whose file could not be read is still usable: it reports
//! "no table" to readers and reconciliation skips every lookup-dependent step.

pub mod table;

pub use table::{ArtistRecord, ArtistRole, ArtistTable, NewArtist};

use crate::text::SimilarityMatcher;
use cfix_common::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{info, warn};

pub struct ArtistRegistry {
    path: PathBuf,
    table: RwLock<Option<ArtistTable>>,
    matcher: SimilarityMatcher,
}

impl ArtistRegistry {
    /// Load the registry file, degrading to "no registry" on any error
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let table = match ArtistTable::load(&path) {
            Ok(table) => Some(table),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Artist lookup unavailable, continuing without it");
                None
            }
        };
        Self {
            path,
            table: RwLock::new(table),
            matcher: SimilarityMatcher::default(),
        }
    }

    /// Registry backed by an already-built table (never touches disk until `learn`)
    pub fn with_table(path: impl Into<PathBuf>, table: ArtistTable) -> Self {
        Self {
            path: path.into(),
            table: RwLock::new(Some(table)),
            matcher: SimilarityMatcher::default(),
        }
    }

    /// Use `matcher` when `learn` decides who owns a secondary key
    pub fn with_matcher(mut self, matcher: SimilarityMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn matcher(&self) -> &SimilarityMatcher {
        &self.matcher
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when a table is loaded
    pub fn is_available(&self) -> bool {
        self.table.read().map(|t| t.is_some()).unwrap_or(false)
    }

    /// Run `f` against the current table (`None` when no registry is loaded)
    pub fn read<R>(&self, f: impl FnOnce(Option<&ArtistTable>) -> R) -> Result<R> {
        let guard = self
            .table
            .read()
            .map_err(|_| Error::Internal("artist registry lock poisoned".to_string()))?;
        Ok(f(guard.as_ref()))
    }

    /// Upsert `artists` and persist the result
    ///
    /// Reloads the file first so edits made by another process since startup
    /// are kept; a missing file starts an empty table. The in-memory table is
    /// replaced only after the save succeeds.
    ///
    /// # Errors
    /// I/O errors from reading or writing the lookup file. Nothing is retried.
    pub fn learn(&self, artists: &[NewArtist]) -> Result<usize> {
        let mut guard = self
            .table
            .write()
            .map_err(|_| Error::Internal("artist registry lock poisoned".to_string()))?;

        let mut table = match ArtistTable::load(&self.path) {
            Ok(table) => table,
            Err(Error::NotFound(_)) => {
                info!(path = %self.path.display(), "Creating new artist lookup file");
                ArtistTable::new()
            }
            Err(e) => return Err(e),
        };

        for artist in artists {
            table.upsert_with(artist, &self.matcher);
        }
        table.save(&self.path)?;

        let count = table.len();
        *guard = Some(table);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn orchestra(name: &str) -> NewArtist {
        NewArtist {
            name: name.to_string(),
            sort_order: name.to_string(),
            sort_order_with_dates: String::new(),
            role: ArtistRole::Orchestra,
            epoch: String::new(),
        }
    }

    #[test]
    fn test_missing_file_means_no_registry() {
        let dir = TempDir::new().unwrap();
        let registry = ArtistRegistry::open(dir.path().join("artists.csv"));
        assert!(!registry.is_available());
        assert!(registry.read(|t| t.is_none()).unwrap());
    }

    #[test]
    fn test_learn_creates_file_and_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("artists.csv");
        let registry = ArtistRegistry::open(&path);

        let count = registry.learn(&[orchestra("Berlin Philharmonic")]).unwrap();
        assert_eq!(count, 1);
        assert!(registry.is_available());
        assert!(path.exists());

        let reopened = ArtistRegistry::open(&path);
        let name = reopened
            .read(|t| t.and_then(|t| t.lookup("berlin philharmonic")).map(|r| r.name.clone()))
            .unwrap();
        assert_eq!(name.as_deref(), Some("Berlin Philharmonic"));
    }

    #[test]
    fn test_learn_keeps_entries_written_by_others() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artists.csv");
        let registry = ArtistRegistry::open(&path);

        std::fs::write(&path, "wienerphilharmoniker|Wiener Philharmoniker|Wiener Philharmoniker||Orchestra|\n")
            .unwrap();
        registry.learn(&[orchestra("London Symphony Orchestra")]).unwrap();

        let both = registry
            .read(|t| {
                let t = t.unwrap();
                t.lookup("Wiener Philharmoniker").is_some()
                    && t.lookup("London Symphony Orchestra").is_some()
            })
            .unwrap();
        assert!(both);
    }

    #[test]
    fn test_learn_uses_registry_threshold() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artists.csv");
        let registry = ArtistRegistry::open(&path).with_matcher(SimilarityMatcher::new(0.95));
        let conductor = |name: &str| NewArtist {
            name: name.to_string(),
            sort_order: crate::text::reverse_name(name),
            sort_order_with_dates: String::new(),
            role: ArtistRole::Conductor,
            epoch: String::new(),
        };

        registry.learn(&[conductor("Karl Bohm")]).unwrap();
        registry.learn(&[conductor("Karl Böhm")]).unwrap();

        let owner = registry
            .read(|t| t.and_then(|t| t.get("bohm")).map(|r| r.name.clone()))
            .unwrap();
        assert_eq!(owner.as_deref(), Some("Karl Bohm"));
    }

    #[test]
    fn test_learn_reports_unwritable_path() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes both read and write fail
        let path = dir.path().join("artists.csv");
        std::fs::create_dir_all(&path).unwrap();
        let registry = ArtistRegistry::open(&path);

        assert!(registry.learn(&[orchestra("Concentus Musicus")]).is_err());
        assert!(!registry.is_available());
    }
}
