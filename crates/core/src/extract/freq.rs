//! Insertion-ordered frequency map.

use std::collections::HashMap;

/// Counts occurrences per key while remembering first-seen order, so that
/// `top(n)` ties break deterministically by document order.
#[derive(Debug, Clone)]
pub struct FreqMap<T> {
    entries: Vec<(String, u32, T)>,
    index: HashMap<String, usize>,
}

impl<T: Default> FreqMap<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Count one occurrence of `key` and let the caller update its stat.
    pub fn tally(&mut self, key: &str, update: impl FnOnce(&mut T)) {
        let at = match self.index.get(key) {
            Some(&at) => at,
            None => {
                self.index.insert(key.to_owned(), self.entries.len());
                self.entries.push((key.to_owned(), 0, T::default()));
                self.entries.len() - 1
            }
        };
        self.entries[at].1 += 1;
        update(&mut self.entries[at].2);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `n` most frequent entries, descending by count; ties keep
    /// first-seen order (the sort is stable).
    pub fn top(mut self, n: usize) -> Vec<(String, u32, T)> {
        self.entries.sort_by_key(|(_, count, _)| std::cmp::Reverse(*count));
        self.entries.truncate(n);
        self.entries
    }
}

impl<T: Default> Default for FreqMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Push `value` if the list doesn't already contain it (small lists, so a
/// linear scan beats a set).
pub fn push_distinct(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_owned());
    }
}
