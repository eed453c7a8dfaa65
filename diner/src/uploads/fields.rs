use std::collections::BTreeMap;

use crate::errors::{Error, Result};

/// Accepted multipart file fields and how many files each may carry.
///
/// Fields that are not declared accept zero files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadFieldSpec {
    limits: BTreeMap<String, usize>,
}

impl UploadFieldSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name` with a maximum of `max_count` files.
    pub fn field(mut self, name: impl Into<String>, max_count: usize) -> Self {
        self.limits.insert(name.into(), max_count);
        self
    }

    /// `logo` and `heroImage`, one file each.
    pub fn restaurant_images() -> Self {
        Self::new().field("logo", 1).field("heroImage", 1)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.limits.contains_key(name)
    }

    pub fn max_count(&self, name: &str) -> usize {
        self.limits.get(name).copied().unwrap_or(0)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, usize)> {
        self.limits.iter().map(|(name, max)| (name.as_str(), *max))
    }

    /// Check that one more file for `name` fits, given `accepted` files already taken for it.
    pub fn check(&self, name: &str, accepted: usize) -> Result<()> {
        let max = self.max_count(name);
        if accepted >= max {
            return Err(Error::Validation {
                message: format!("Too many files for field '{name}': at most {max} allowed"),
            });
        }
        Ok(())
    }
}
