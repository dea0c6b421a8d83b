//! Declarative field tables
//!
//! Each configuration section lists the keys it reads and how repeated
//! values for those keys combine across fragments. A backend's [`Schema`] is
//! the ordered list of its sections.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;

/// How values for one key combine when several fragments set it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    /// The later fragment's value replaces the earlier one outright
    #[default]
    Replace,
    /// Maps accumulate keys (later value wins per key); lists concatenate
    Union,
}

/// One key in a section's field table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub merge: MergeStrategy,
}

impl FieldSpec {
    pub const fn replace(name: &'static str) -> Self {
        Self {
            name,
            merge: MergeStrategy::Replace,
        }
    }

    pub const fn union(name: &'static str) -> Self {
        Self {
            name,
            merge: MergeStrategy::Union,
        }
    }
}

/// A sub-configuration decoded from its own slice of the flat key space.
///
/// Implementors must be `#[serde(default)]` so a section can be decoded
/// from any subset of its keys.
pub trait Section: Serialize + DeserializeOwned + Default {
    /// Component name used when attributing errors
    const NAME: &'static str;
    /// Every key this section reads
    const FIELDS: &'static [FieldSpec];
}

#[derive(Debug, Clone, Copy)]
struct SectionSpec {
    name: &'static str,
    fields: &'static [FieldSpec],
}

/// Field table for one backend: its sections, in embedding order, plus the
/// keys that must not be interpolated.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    sections: Vec<SectionSpec>,
    no_interpolate: Vec<&'static str>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a section. Earlier sections own keys they share with later ones.
    pub fn section<T: Section>(mut self) -> Self {
        self.sections.push(SectionSpec {
            name: T::NAME,
            fields: T::FIELDS,
        });
        self
    }

    /// Keys whose values are taken verbatim (scripts, boot commands, ...)
    pub fn exclude_from_interpolation(mut self, keys: &[&'static str]) -> Self {
        self.no_interpolate.extend_from_slice(keys);
        self
    }

    /// The owning section and spec for a key
    pub fn field(&self, key: &str) -> Option<(&'static str, FieldSpec)> {
        self.sections.iter().find_map(|section| {
            section
                .fields
                .iter()
                .find(|f| f.name == key)
                .map(|f| (section.name, *f))
        })
    }

    /// Name of the section that owns a key
    pub fn owner(&self, key: &str) -> Option<&'static str> {
        self.field(key).map(|(owner, _)| owner)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    pub fn merge_strategy(&self, key: &str) -> MergeStrategy {
        self.field(key)
            .map(|(_, spec)| spec.merge)
            .unwrap_or_default()
    }

    pub fn is_interpolated(&self, key: &str) -> bool {
        !self.no_interpolate.contains(&key)
    }

    /// Section names in embedding order
    pub fn section_names(&self) -> Vec<&'static str> {
        self.sections.iter().map(|s| s.name).collect()
    }

    /// Every declared key, sorted
    pub fn keys(&self) -> BTreeSet<&'static str> {
        self.sections
            .iter()
            .flat_map(|s| s.fields.iter().map(|f| f.name))
            .collect()
    }

    /// Keys declared by more than one section, sorted
    pub fn collisions(&self) -> Vec<&'static str> {
        let mut seen = BTreeSet::new();
        let mut dupes = BTreeSet::new();
        for section in &self.sections {
            for field in section.fields {
                if !seen.insert(field.name) {
                    dupes.insert(field.name);
                }
            }
        }
        dupes.into_iter().collect()
    }
}

/// Keys a section serializes but does not declare, and keys it declares but
/// never serializes. Both lists are empty for a well-formed section.
pub fn field_table_mismatches<T: Section>() -> (Vec<String>, Vec<&'static str>) {
    let serialized: BTreeSet<String> = match serde_json::to_value(T::default()) {
        Ok(serde_json::Value::Object(map)) => map.keys().cloned().collect(),
        _ => BTreeSet::new(),
    };
    let declared: BTreeSet<&'static str> = T::FIELDS.iter().map(|f| f.name).collect();

    let undeclared = serialized
        .iter()
        .filter(|k| !declared.contains(k.as_str()))
        .cloned()
        .collect();
    let unserialized = declared
        .iter()
        .filter(|k| !serialized.contains(**k))
        .copied()
        .collect();
    (undeclared, unserialized)
}
