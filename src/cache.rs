//! Session cache of learned server addresses and final answers.
//!
//! Entries are never overwritten and never expire; the cache lives for
//! the process and is only emptied by explicit user command.

use std::net::Ipv4Addr;

/// One learned fact: `name` resolves to `address`, discovered while
/// working on `served_domain`.
///
/// `served_domain` is what lets a later walk skip hops: a query for
/// `example.com` can jump straight to any server whose entry was learned
/// while resolving `example.com`, without asking the root again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub address: Ipv4Addr,
    pub served_domain: String,
}

/// Insertion-ordered cache of [`Entry`] values, unique by name.
///
/// A `Vec` rather than a map: the interactive `.list`/`.remove` commands
/// address entries by their 1-based display position, and the cache is
/// small enough that every lookup is a linear scan anyway.
#[derive(Debug, Default)]
pub struct Cache {
    entries: Vec<Entry>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-match lookup by entry name.
    pub fn lookup(&self, name: &str) -> Option<Ipv4Addr> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.address)
    }

    /// Address of the first server learned while resolving `target`.
    pub fn server_for(&self, target: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.served_domain == target)
    }

    /// Insert a fact. First write wins: if `name` is already cached the
    /// call is a no-op and the stored address is untouched.
    pub fn insert(&mut self, name: &str, address: Ipv4Addr, served_domain: &str) {
        if self.lookup(name).is_some() {
            return;
        }
        self.entries.push(Entry {
            name: name.to_string(),
            address,
            served_domain: served_domain.to_string(),
        });
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove the entry at a 1-based display index.
    ///
    /// Returns the removed entry, or `None` (cache unchanged) when the
    /// index is out of range.
    pub fn remove(&mut self, index: usize) -> Option<Entry> {
        if index == 0 || index > self.entries.len() {
            return None;
        }
        Some(self.entries.remove(index - 1))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
