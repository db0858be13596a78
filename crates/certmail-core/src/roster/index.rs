//! Name-keyed roster index.

use super::model::{Contact, RosterRow};
use std::collections::HashMap;

/// Contacts in roster order, deduplicated by name.
///
/// A repeated name keeps the position of its first appearance and takes the
/// email and row of its last appearance. Rows with an empty name are kept
/// individually so each one surfaces as its own skip.
#[derive(Debug, Clone, Default)]
pub struct RosterIndex {
    contacts: Vec<Contact>,
    by_name: HashMap<String, usize>,
}

impl RosterIndex {
    /// Builds the index from raw rows.
    #[must_use]
    pub fn build<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = RosterRow>,
    {
        let mut index = Self::default();
        for row in rows {
            index.insert(Contact::from(row));
        }
        index
    }

    fn insert(&mut self, contact: Contact) {
        if contact.name.is_empty() {
            self.contacts.push(contact);
            return;
        }
        if let Some(&pos) = self.by_name.get(&contact.name) {
            self.contacts[pos] = contact;
        } else {
            self.by_name.insert(contact.name.clone(), self.contacts.len());
            self.contacts.push(contact);
        }
    }

    /// Looks up a contact by trimmed name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Contact> {
        self.by_name.get(name).map(|&pos| &self.contacts[pos])
    }

    /// Number of entries, including blank-name rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Returns true if the roster has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Iterates entries in roster order.
    pub fn iter(&self) -> std::slice::Iter<'_, Contact> {
        self.contacts.iter()
    }
}

impl<'a> IntoIterator for &'a RosterIndex {
    type Item = &'a Contact;
    type IntoIter = std::slice::Iter<'a, Contact>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[(&str, &str)]) -> Vec<RosterRow> {
        data.iter()
            .enumerate()
            .map(|(i, (n, e))| RosterRow::new(i + 2, *n, *e))
            .collect()
    }

    #[test]
    fn later_row_wins_for_duplicate_names() {
        let index = RosterIndex::build(rows(&[
            ("Alice", "a1@x.com"),
            ("Bob", "b@x.com"),
            ("Alice", "a2@x.com"),
        ]));

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("Alice").map(|c| c.email.as_str()), Some("a2@x.com"));
        let order: Vec<_> = index.iter().map(|c| (c.name.as_str(), c.row)).collect();
        assert_eq!(order, vec![("Alice", 4), ("Bob", 3)]);
    }

    #[test]
    fn names_and_emails_are_trimmed() {
        let index = RosterIndex::build(rows(&[(" Alice ", " a@x.com\t")]));
        assert_eq!(index.get("Alice").map(|c| c.email.as_str()), Some("a@x.com"));
    }

    #[test]
    fn blank_names_are_kept_separately() {
        let index = RosterIndex::build(rows(&[("", "a@x.com"), ("  ", "b@x.com"), ("Cat", "")]));
        assert_eq!(index.len(), 3);
        assert!(index.get("").is_none());
        assert_eq!(index.get("Cat").map(|c| c.email.as_str()), Some(""));
    }

    #[test]
    fn empty_roster() {
        let index = RosterIndex::build(Vec::new());
        assert!(index.is_empty());
        assert_eq!((&index).into_iter().count(), 0);
    }
}
