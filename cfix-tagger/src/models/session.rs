//! JSON session document handled by the command-line host
//!
//! A session is a snapshot of the host's clusters and files:
//! `{ "clusters": [ { "album": .., "albumartist": .., "files": [ .. ] } ] }`.

use super::track::{Cluster, Track};
use cfix_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub clusters: Vec<Cluster>,
}

impl Session {
    /// Parse a session document
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| Error::Parse(format!("session document: {}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Internal(format!("Failed to serialize session: {}", e)))
    }

    /// Read a session file
    ///
    /// # Errors
    /// `Error::NotFound` if the file is missing, `Error::Parse` if it is not a
    /// valid session document.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("session file {}", path.display())));
        }
        let body = std::fs::read_to_string(path)?;
        let session = Self::from_json(&body)?;
        info!(
            path = %path.display(),
            clusters = session.clusters.len(),
            files = session.file_count(),
            "Loaded session"
        );
        Ok(session)
    }

    /// Write the session back (temp file + rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        let body = self.to_json()?;
        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, body)?;
        std::fs::rename(&temp_path, path)?;
        info!(path = %path.display(), "Saved session");
        Ok(())
    }

    pub fn file_count(&self) -> usize {
        self.clusters.iter().map(|c| c.files.len()).sum()
    }

    pub fn files(&self) -> impl Iterator<Item = &Track> {
        self.clusters.iter().flat_map(|c| c.files.iter())
    }

    /// Files of every cluster, in cluster order
    pub fn files_mut(&mut self) -> Vec<&mut Track> {
        self.clusters
            .iter_mut()
            .flat_map(|c| c.files.iter_mut())
            .collect()
    }

    /// Files whose metadata must be persisted
    pub fn dirty_files(&self) -> impl Iterator<Item = &Track> {
        self.files().filter(|t| t.is_dirty())
    }
}
