//! Test helper modules for orsync-dashboard integration tests
//!
//! Provides fake collaborators that record how often they were called:
//! - FakeGraph: social-graph service
//! - FakeProfiles: ORCID profile directory
//! - FakeTokenExchange: ORCID OAuth token endpoint

#![allow(dead_code)]

pub mod fakes;

pub use fakes::{debug_config, summary, test_config, FakeGraph, FakeProfiles, FakeTokenExchange};
