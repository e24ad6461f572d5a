//! Sort preference for note lists

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Secondary sort key applied after pinned notes are grouped first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Most recently updated first
    #[default]
    Updated,
    /// Most recently created first
    Created,
    /// Title, ascending
    Title,
}

impl SortBy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::Created => "created",
            Self::Title => "title",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "updated" => Ok(Self::Updated),
            "created" => Ok(Self::Created),
            "title" => Ok(Self::Title),
            other => Err(Error::InvalidInput(format!("unknown sort key '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_default_is_updated() {
        assert_eq!(SortBy::default(), SortBy::Updated);
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!("TITLE".parse::<SortBy>().unwrap(), SortBy::Title);
        assert!("size".parse::<SortBy>().is_err());
    }
}
