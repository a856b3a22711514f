//! Authorities Value Object
//!
//! Ordered, de-duplicated set of fine-grained permission strings such as
//! `article:create`. Travels inside access tokens as a comma-joined string.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Authorities(Vec<String>);

impl Authorities {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Parse a comma-delimited list, trimming entries and dropping blanks
    /// and duplicates while keeping first-seen order.
    pub fn parse(joined: &str) -> Self {
        joined.split(',').collect()
    }

    /// Comma-joined wire form
    pub fn joined(&self) -> String {
        self.0.join(",")
    }

    pub fn contains(&self, authority: &str) -> bool {
        self.0.iter().any(|a| a == authority)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Authorities {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut authorities: Vec<String> = Vec::new();
        for item in iter {
            let item = item.as_ref().trim();
            if !item.is_empty() && !authorities.iter().any(|a| a == item) {
                authorities.push(item.to_string());
            }
        }
        Self(authorities)
    }
}

impl fmt::Display for Authorities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_order() {
        let authorities =
            Authorities::parse("article:create,article:read,article:update,article:delete");
        assert_eq!(
            authorities.iter().collect::<Vec<_>>(),
            vec!["article:create", "article:read", "article:update", "article:delete"]
        );
    }

    #[test]
    fn test_parse_trims_and_dedups() {
        let authorities = Authorities::parse(" article:read, ,article:read,paper:read ");
        assert_eq!(authorities.joined(), "article:read,paper:read");
        assert_eq!(authorities.len(), 2);
    }

    #[test]
    fn test_parse_empty() {
        assert!(Authorities::parse("").is_empty());
        assert_eq!(Authorities::empty().joined(), "");
    }

    #[test]
    fn test_contains() {
        let authorities = Authorities::parse("article:create,article:read");
        assert!(authorities.contains("article:read"));
        assert!(!authorities.contains("article:delete"));
        assert!(!authorities.contains("article"));
    }
}
