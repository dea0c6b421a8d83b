//! Error types for brokkr-core

use thiserror::Error;

/// Result type alias using brokkr-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading fragments or talking to the filesystem.
///
/// These are distinct from [`ConfigError`]: an `Error` means the input could
/// not be read at all, a `ConfigError` means it was read but is wrong.
#[derive(Error, Debug)]
pub enum Error {
    /// Fragment file not found
    #[error("Fragment file not found: {path}")]
    FragmentNotFound { path: String },

    /// Fragment is not a key/value mapping
    #[error("Invalid fragment: {message}")]
    InvalidFragment { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown builder type
    #[error("Unknown builder: {name}. Valid builders: {valid}")]
    UnknownBuilder { name: String, valid: String },
}

impl Error {
    /// Create a fragment not found error
    pub fn fragment_not_found(path: impl Into<String>) -> Self {
        Self::FragmentNotFound { path: path.into() }
    }

    /// Create an invalid fragment error
    pub fn invalid_fragment(message: impl Into<String>) -> Self {
        Self::InvalidFragment {
            message: message.into(),
        }
    }

    /// Create an unknown builder error
    pub fn unknown_builder(name: impl Into<String>, valid: &[&str]) -> Self {
        Self::UnknownBuilder {
            name: name.into(),
            valid: valid.join(", "),
        }
    }
}

/// A single problem found while resolving a configuration.
///
/// Resolution never stops at the first `ConfigError`; they are collected per
/// component and handed to [`crate::aggregate`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A fragment carried a key no section declares
    #[error("unknown configuration key: '{key}'")]
    UnknownKey { key: String },

    /// A key carried a value of the wrong shape
    #[error("invalid value for '{field}': {message}")]
    Decode { field: String, message: String },

    /// A template expression failed to render
    #[error("error rendering '{field}': {message}")]
    Interpolation { field: String, message: String },

    /// A rule was violated by an otherwise well-typed value
    #[error("{message}")]
    Validation { field: String, message: String },

    /// A derived artifact could not be built from validated data
    #[error("cannot build {artifact}: {message}")]
    Derivation { artifact: String, message: String },
}

impl ConfigError {
    /// Create an unknown key error
    pub fn unknown_key(key: impl Into<String>) -> Self {
        Self::UnknownKey { key: key.into() }
    }

    /// Create a decode error
    pub fn decode(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an interpolation error
    pub fn interpolation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Interpolation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a derivation error
    pub fn derivation(artifact: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Derivation {
            artifact: artifact.into(),
            message: message.into(),
        }
    }

    /// The configuration key this error is about, if it names one
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::UnknownKey { key } => Some(key),
            Self::Decode { field, .. }
            | Self::Interpolation { field, .. }
            | Self::Validation { field, .. } => Some(field),
            Self::Derivation { .. } => None,
        }
    }
}

/// Error returned by a [`crate::Render`] implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct InterpolationError {
    pub message: String,
}

impl InterpolationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
