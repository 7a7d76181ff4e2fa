//! Identifier Sets
//!
//! Sorted, de-duplicated identifier lists used for target variants, order
//! condition ids and buy-x-get-y groups. Membership is a binary search and
//! comparison is exact (case-sensitive).

use std::string::ToString;

use smallvec::SmallVec;

/// A sorted set of string identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IdSet {
    ids: SmallVec<[String; 4]>,
}

impl IdSet {
    /// Build a set, sorting and removing duplicates.
    pub fn new(ids: impl IntoIterator<Item = String>) -> Self {
        let mut ids: SmallVec<[String; 4]> = ids.into_iter().collect();

        ids.sort();
        ids.dedup();

        Self { ids }
    }

    /// Build a set from string slices.
    pub fn from_strs(ids: &[&str]) -> Self {
        Self::new(ids.iter().map(ToString::to_string))
    }

    /// Whether `id` is a member.
    pub fn contains(&self, id: &str) -> bool {
        self.ids
            .binary_search_by(|probe| probe.as_str().cmp(id))
            .is_ok()
    }

    /// Whether any of `ids` is a member.
    pub fn contains_any<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> bool {
        ids.into_iter().any(|id| self.contains(id))
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of identifiers.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Iterate identifiers in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Copy the identifiers out.
    pub fn to_vec(&self) -> Vec<String> {
        self.ids.to_vec()
    }
}

impl FromIterator<String> for IdSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a IdSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sorts_and_dedups() {
        let set = IdSet::from_strs(&["b", "a", "b"]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn contains_is_case_sensitive() {
        let set = IdSet::from_strs(&["VAR-1"]);

        assert!(set.contains("VAR-1"));
        assert!(!set.contains("var-1"));
        assert!(!set.contains("VAR-2"));
    }

    #[test]
    fn contains_any_checks_every_candidate() {
        let set = IdSet::from_strs(&["summer", "winter"]);

        assert!(set.contains_any(["autumn", "winter"]));
        assert!(!set.contains_any(["autumn"]));
        assert!(!set.contains_any(std::iter::empty()));
    }
}
