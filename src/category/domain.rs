//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, database_id::CategoryId};

/// A validated, non-empty category title.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct CategoryTitle(String);

impl CategoryTitle {
    /// Create a category title.
    ///
    /// Leading and trailing whitespace is removed.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryTitle] if `title` is empty or just whitespace.
    pub fn new(title: &str) -> Result<Self, Error> {
        let title = title.trim();

        if title.is_empty() {
            Err(Error::EmptyCategoryTitle)
        } else {
            Ok(Self(title.to_string()))
        }
    }

    /// Create a category title without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(title: &str) -> Self {
        Self(title.to_string())
    }
}

impl AsRef<str> for CategoryTitle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryTitle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryTitle::new(s)
    }
}

impl Display for CategoryTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named grouping label attached to transactions.
///
/// Categories are created lazily the first time a transaction references an
/// unseen title and are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The unique, human-readable title of the category.
    pub title: CategoryTitle,
    /// When the category was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the category was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[cfg(test)]
mod category_title_tests {
    use crate::{Error, category::CategoryTitle};

    #[test]
    fn new_fails_on_empty_string() {
        let title = CategoryTitle::new("");

        assert_eq!(title, Err(Error::EmptyCategoryTitle));
    }

    #[test]
    fn new_fails_on_just_whitespace() {
        let title = CategoryTitle::new("\n\t \r");

        assert_eq!(title, Err(Error::EmptyCategoryTitle));
    }

    #[test]
    fn new_trims_whitespace() {
        let title = CategoryTitle::new("  Housing ").unwrap();

        assert_eq!(title.as_ref(), "Housing");
    }

    #[test]
    fn parses_from_str() {
        let title: Result<CategoryTitle, _> = "Salary".parse();

        assert_eq!(title, Ok(CategoryTitle::new_unchecked("Salary")));
    }
}
