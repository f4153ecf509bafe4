//! The answer database.

/// Ordered question → answer entries, replaced wholesale on upload.
///
/// Kept as a plain vector of pairs rather than a hash map: matching
/// tie-breaks on insertion order, so iteration order is part of the
/// store's contract, not an accident.
#[derive(Debug, Clone, Default)]
pub struct AnswerStore {
    entries: Vec<(String, String)>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a complete new answer set. There are no partial updates;
    /// the previous set is discarded whole.
    pub fn replace(&mut self, entries: Vec<(String, String)>) {
        self.entries = entries;
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
