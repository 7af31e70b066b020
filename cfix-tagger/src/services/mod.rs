//! Metadata services: reconciliation, album-level guards, merging, numbering

pub mod batch_guard;
pub mod disc_merger;
pub mod field_reconciler;
pub mod genre_taxonomy;
pub mod lookup_learner;
pub mod track_renumberer;

pub use batch_guard::{reconcile_group, BatchReport};
pub use disc_merger::{combine_discs, DiscMergeError, MergeReport};
pub use field_reconciler::FieldReconciler;
pub use track_renumberer::{renumber, track_sort_key};
