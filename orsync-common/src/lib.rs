//! # OrSync Common Library
//!
//! Shared code for the OrSync services including:
//! - Configuration loading (TOML bootstrap file)
//! - ORCID iD parsing and validation
//! - Researcher profile types (identity, summaries, following entries)

pub mod config;
pub mod error;
pub mod orcid_id;
pub mod profile;

pub use error::{Error, Result};
pub use profile::{FollowEntry, Identity, ResearcherSummary, StoredCredential};
