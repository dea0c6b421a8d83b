//! Common test utilities for brokkr-builders
//!
//! Provides shared test infrastructure for resolution testing including:
//! - Fragment fixtures written to temporary directories
//! - Assertions over aggregated errors

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
