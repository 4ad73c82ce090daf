//! Image tag sets.
//!
//! Tags come from two sources (vision labels and named entities found in the
//! generated description) and are persisted as one delimited string in the
//! `images.tags` column. A [`TagSet`] keeps insertion order, rejects exact
//! duplicates, and normalizes every tag so that
//! `TagSet::parse(&set.to_joined()) == set` always holds.

use std::collections::HashSet;
use std::fmt;

/// Delimiter between tags in the persisted string.
pub const TAG_DELIMITER: &str = ", ";

/// Normalize a raw tag for storage.
///
/// Trims surrounding whitespace, replaces commas (the delimiter character)
/// with spaces and collapses whitespace runs to a single space. Returns
/// `None` when nothing is left. Case is preserved.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let cleaned = raw.replace(',', " ");
    let normalized = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Ordered set of normalized, case-sensitively unique tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<String>,
    seen: HashSet<String>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag. Returns `true` if it was new after normalization.
    pub fn insert(&mut self, raw: &str) -> bool {
        let Some(tag) = normalize_tag(raw) else {
            return false;
        };
        if self.seen.contains(&tag) {
            return false;
        }
        self.seen.insert(tag.clone());
        self.tags.push(tag);
        true
    }

    /// Insert every tag from an iterator, skipping duplicates.
    pub fn extend<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            self.insert(tag.as_ref());
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.seen.contains(tag)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Tags in insertion order.
    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }

    /// Render the persisted form, e.g. `"Car, Road, Ford"`.
    pub fn to_joined(&self) -> String {
        self.tags.join(TAG_DELIMITER)
    }

    /// Parse the persisted form back into a set.
    ///
    /// Splits on `,` so strings written by older revisions without the
    /// trailing space still parse.
    pub fn parse(joined: &str) -> Self {
        joined.split(',').collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for TagSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.into_iter()
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_joined())
    }
}
