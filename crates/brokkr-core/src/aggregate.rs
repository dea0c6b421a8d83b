//! Error aggregation
//!
//! Every component of a configuration reports its own list of problems. The
//! aggregator flattens those lists, in the order they were produced, into a
//! single [`AggregateError`] that keeps track of which component each problem
//! came from. An empty result is the only success signal.

use std::fmt;

use crate::error::ConfigError;

/// Errors reported by one component (a sub-configuration, the decoder, or a
/// backend's own leaf rules).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentErrors {
    pub component: String,
    pub errors: Vec<ConfigError>,
}

impl ComponentErrors {
    pub fn new(component: impl Into<String>, errors: Vec<ConfigError>) -> Self {
        Self {
            component: component.into(),
            errors,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A [`ConfigError`] tagged with the component that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributedError {
    pub component: String,
    pub error: ConfigError,
}

impl fmt::Display for AttributedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.component, self.error)
    }
}

impl std::error::Error for AttributedError {}

/// The complete, ordered set of problems found by one resolution attempt.
///
/// Never empty: an attempt that found nothing wrong returns `Ok` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateError {
    errors: Vec<AttributedError>,
}

impl AggregateError {
    /// All errors in the order they were reported
    pub fn errors(&self) -> &[AttributedError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// One `component: message` line per error
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Errors concerning the given configuration key
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a AttributedError> {
        self.errors
            .iter()
            .filter(move |e| e.error.field() == Some(field))
    }

    /// Whether any error message contains `needle`
    pub fn mentions(&self, needle: &str) -> bool {
        self.errors.iter().any(|e| e.to_string().contains(needle))
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.errors.len();
        writeln!(
            f,
            "{} error{} occurred:",
            n,
            if n == 1 { "" } else { "s" }
        )?;
        for err in &self.errors {
            write!(f, "\n* {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

impl IntoIterator for AggregateError {
    type Item = AttributedError;
    type IntoIter = std::vec::IntoIter<AttributedError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Flatten per-component error lists into one result.
///
/// Input order is preserved exactly. Returns `Ok(())` when no component
/// reported anything.
pub fn aggregate<I>(lists: I) -> Result<(), AggregateError>
where
    I: IntoIterator<Item = ComponentErrors>,
{
    let errors: Vec<AttributedError> = lists
        .into_iter()
        .flat_map(|list| {
            let component = list.component;
            list.errors.into_iter().map(move |error| AttributedError {
                component: component.clone(),
                error,
            })
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AggregateError { errors })
    }
}
