//! Cache generations: one named, versioned collection per namespace.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two managed cache namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Static UI assets, versioned by build
    Shell,
    /// Session tracks, versioned by content format
    Audio,
}

/// A generation is identified by `prefix + version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Generation {
    prefix: String,
    version: String,
}

impl Generation {
    pub fn new(prefix: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            version: version.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The storage name of this generation.
    pub fn name(&self) -> String {
        format!("{}{}", self.prefix, self.version)
    }

    /// A stored generation is stale for this one when it shares the prefix
    /// but is not this exact generation.
    pub fn supersedes(&self, stored_name: &str) -> bool {
        stored_name.starts_with(&self.prefix) && stored_name != self.name()
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.version)
    }
}

/// Select the stored generation names that any of `current` supersedes.
///
/// Names matching no managed prefix are never selected.
pub fn stale_generations<'a>(stored: &'a [String], current: &[Generation]) -> Vec<&'a str> {
    stored
        .iter()
        .map(String::as_str)
        .filter(|name| current.iter().any(|generation| generation.supersedes(name)))
        .collect()
}
