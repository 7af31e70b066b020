//! Host-side data: tracks, clusters and the session document

pub mod session;
pub mod track;

pub use session::Session;
pub use track::{join_names, split_names, tag_value, Cluster, ClusterMetadata, Track, TrackMetadata};
