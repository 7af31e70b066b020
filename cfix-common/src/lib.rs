//! # cfix Common Library
//!
//! Shared code for the cfix workspace:
//! - Error and result types
//! - TOML bootstrap configuration and config path resolution
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
