//! cfix-tagger: classical music metadata normalization
//!
//! Normalizes track tags (composer, conductor, orchestra, artist credits,
//! titles, genre) against a local artist lookup table, keeps album-level
//! tags consistent across a group of tracks, and merges per-disc albums.
//!
//! Layering, leaves first:
//! - [`text`]: key folding, name transforms, similarity, title rewrite rules
//! - [`registry`]: the artist lookup table and its owning service
//! - [`models`]: tracks, clusters and the session document
//! - [`services`]: reconciliation, batch guard, disc merge, renumbering, learning
//! - [`actions`]: the host-facing entry points
//! - [`logging`]: subscriber setup for the binary

pub mod actions;
pub mod logging;
pub mod models;
pub mod registry;
pub mod services;
pub mod text;

pub use cfix_common::{Error, Result};
