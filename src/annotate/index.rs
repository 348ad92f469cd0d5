//! Term index: normalized term to the identifier embedded in markup.

use std::path::Path;

use indexmap::IndexMap;

use crate::config::CollisionPolicy;
use crate::error::{AnnotateError, AnnotateResult};

/// Two distinct raw terms that share a normalized key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub key: String,
    pub first_term: String,
    pub second_term: String,
    /// Identifier left in the index after the policy applied.
    pub resolved_id: String,
}

/// Ordered mapping, document order of first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermIndex {
    entries: IndexMap<String, String>,
    /// Raw term behind each key, for collision reporting. Not persisted.
    origins: IndexMap<String, String>,
}

impl TermIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key -> id` coming from raw term `term`.
    ///
    /// Returns the collision when `key` was already taken by a different raw
    /// term and the policy let the run continue.
    pub fn insert(
        &mut self,
        key: &str,
        id: &str,
        term: &str,
        policy: CollisionPolicy,
    ) -> AnnotateResult<Option<Collision>> {
        let Some(previous_term) = self.origins.get(key).cloned() else {
            self.entries.insert(key.to_string(), id.to_string());
            self.origins.insert(key.to_string(), term.to_string());
            return Ok(None);
        };

        if previous_term == term {
            // Same entry listed twice; treated like the overwrite case without a report.
            if policy != CollisionPolicy::KeepFirst {
                self.entries.insert(key.to_string(), id.to_string());
            }
            return Ok(None);
        }

        match policy {
            CollisionPolicy::Error => Err(AnnotateError::Collision {
                key: key.to_string(),
                first: previous_term,
                second: term.to_string(),
            }),
            CollisionPolicy::KeepFirst => Ok(Some(Collision {
                key: key.to_string(),
                first_term: previous_term,
                second_term: term.to_string(),
                resolved_id: self.entries[key].clone(),
            })),
            CollisionPolicy::Overwrite => {
                // IndexMap::insert keeps the original position.
                self.entries.insert(key.to_string(), id.to_string());
                self.origins.insert(key.to_string(), term.to_string());
                Ok(Some(Collision {
                    key: key.to_string(),
                    first_term: previous_term,
                    second_term: term.to_string(),
                    resolved_id: id.to_string(),
                }))
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Pretty JSON, two-space indent, non-ASCII left as is.
    pub fn to_json(&self) -> AnnotateResult<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    /// Parse a persisted index.
    pub fn from_json(json: &str) -> AnnotateResult<Self> {
        let entries: IndexMap<String, String> = serde_json::from_str(json)?;
        Ok(Self {
            entries,
            origins: IndexMap::new(),
        })
    }

    /// Load a persisted index file.
    pub fn load(path: &Path) -> AnnotateResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| AnnotateError::IndexLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json(&json).map_err(|e| AnnotateError::IndexLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
