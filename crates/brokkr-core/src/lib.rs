//! # brokkr-core
//!
//! Configuration resolution shared by every Brokkr builder:
//! - Layered decoding of ordered YAML/JSON fragments with per-field merge strategies
//! - Template interpolation against a per-build context
//! - Defaulting and validation helpers for prepare steps
//! - Error aggregation with component attribution
//! - Sub-configurations common to several builders (communicator, shutdown, output, HTTP)

pub mod aggregate;
pub mod common;
pub mod decode;
pub mod defaults;
pub mod error;
pub mod interpolate;
pub mod validate;

pub use aggregate::{aggregate, AggregateError, AttributedError, ComponentErrors};
pub use decode::{
    decode, field_table_mismatches, resolve, Configuration, DecodeOptions, FieldSpec, Fragment,
    MergeStrategy, Prepare, Resolution, Schema, Section, SectionReader,
};
pub use error::{ConfigError, Error, InterpolationError, Result};
pub use interpolate::{InterpolationContext, Render, TeraRenderer};
