//! Product and shop categories.

use serde::{Deserialize, Serialize};
use ushop_core::CategoryId;

/// A row in `categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// Insert body for `categories`.
#[derive(Debug, Clone, Serialize)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
}

/// Derive a URL slug from a category name.
///
/// Lowercases, keeps ASCII alphanumerics, and collapses every other run of
/// characters into a single `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Food & Drinks"), "food-drinks");
        assert_eq!(slugify("  Home -- Garden  "), "home-garden");
        assert_eq!(slugify("Électronique 2"), "lectronique-2");
        assert_eq!(slugify("!!!"), "");
    }
}
