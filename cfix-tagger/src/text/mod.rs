//! Pure string transforms shared by the registry and the reconciler

pub mod key;
pub mod names;
pub mod rules;
pub mod similarity;

pub use key::make_key;
pub use names::{initials_name, last_name, reverse_name};
pub use rules::{apply_rules, TextRule, TEXT_RULES};
pub use similarity::{are_similar, SimilarityMatcher};
