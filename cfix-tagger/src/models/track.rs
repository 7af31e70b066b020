//! Track, cluster and the fixed tag schema they carry
//!
//! Every single-valued tag is an `Option<String>`; artist-like tags are
//! ordered name lists. An absent tag and an empty string both mean "not set":
//! empty strings are dropped while deserializing and [`tag_value`] treats any
//! that are assigned later the same way.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Separator used for multi-valued tags stored as a single string
pub const NAME_SEPARATOR: char = ';';

/// Split a `;`-separated credit into trimmed, non-empty names
pub fn split_names(value: &str) -> Vec<String> {
    value
        .split(NAME_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Render a name list the way tag editors display it
pub fn join_names(names: &[String]) -> String {
    names.join("; ")
}

/// Value of an optional tag, `None` when absent or empty
pub fn tag_value(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Tags of one audio file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,

    #[serde(default, deserialize_with = "name_list", skip_serializing_if = "Vec::is_empty")]
    pub artist: Vec<String>,
    #[serde(default, deserialize_with = "name_list", skip_serializing_if = "Vec::is_empty")]
    pub albumartist: Vec<String>,
    /// Duplicate of `albumartist` kept for players that read the spaced name
    #[serde(
        rename = "album artist",
        default,
        deserialize_with = "name_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub album_artist_compat: Vec<String>,

    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub composer: Option<String>,
    /// Composer sort name with dates, e.g. "Bach, Johann Sebastian (1685-1750)"
    #[serde(
        rename = "composer view",
        default,
        deserialize_with = "opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub composer_view: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub composersort: Option<String>,
    /// Musical era of the composer
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub epoque: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub conductor: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub orchestra: Option<String>,

    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub origgenre: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub discnumber: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub totaldiscs: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub tracknumber: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub origdiscnumber: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub origtracknumber: Option<String>,

    /// When the track was last changed by reconciliation
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub classicalfixesdate: Option<String>,

    /// Tags this engine does not interpret, carried through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawText {
    Text(String),
    Integer(i64),
    Float(f64),
}

/// Accept strings or bare numbers (track numbers are often written unquoted)
fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawText> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawText::Text(s)) if s.is_empty() => None,
        Some(RawText::Text(s)) => Some(s),
        Some(RawText::Integer(n)) => Some(n.to_string()),
        Some(RawText::Float(n)) => Some(n.to_string()),
        None => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNames {
    Joined(String),
    List(Vec<String>),
}

/// Accept either `"A; B"` or `["A", "B"]`
fn name_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawNames> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawNames::Joined(s)) => split_names(&s),
        Some(RawNames::List(items)) => items.iter().flat_map(|s| split_names(s)).collect(),
        None => Vec::new(),
    })
}

/// One file as the host presents it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub filename: String,
    #[serde(default)]
    pub metadata: TrackMetadata,
    #[serde(skip)]
    dirty: bool,
}

impl Track {
    pub fn new(filename: impl Into<String>, metadata: TrackMetadata) -> Self {
        Self {
            filename: filename.into(),
            metadata,
            dirty: false,
        }
    }

    /// Signal that the metadata must be persisted
    pub fn commit(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Album-level view a cluster keeps alongside its files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterMetadata {
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub albumartist: Option<String>,
}

/// A group of files the host believes form one album
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(flatten)]
    pub metadata: ClusterMetadata,
    #[serde(default)]
    pub files: Vec<Track>,
    #[serde(skip)]
    dirty: bool,
}

impl Cluster {
    pub fn new(metadata: ClusterMetadata, files: Vec<Track>) -> Self {
        Self {
            metadata,
            files,
            dirty: false,
        }
    }

    /// Signal that the cluster view changed
    pub fn update(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
