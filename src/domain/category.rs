//! Category tree vocabulary.
//!
//! Categories carry a materialized `path` of their ancestors' ids, so the
//! descendants of a category are every row whose path mentions its id.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Category kinds stored in the `category.type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryType {
    Page,
    Folder,
    /// Aliases another target instead of containing children.
    Link,
}

impl CategoryType {
    pub const fn as_str(self) -> &'static str {
        match self {
            CategoryType::Page => "page",
            CategoryType::Folder => "folder",
            CategoryType::Link => "link",
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "page" => Ok(CategoryType::Page),
            "folder" => Ok(CategoryType::Folder),
            "link" => Ok(CategoryType::Link),
            other => Err(DomainError::unknown_variant("category type", other)),
        }
    }
}
