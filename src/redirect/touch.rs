//! Touch id mapping
//!
//! Backends number touch points on their own; the seat hands out protocol
//! ids. The map between both stays injective: a protocol id is owned by at
//! most one internal id.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct TouchIds {
    ids: HashMap<i32, i32>,
}

impl TouchIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair an internal id with a protocol id, dropping any older pairing
    /// that used the same protocol id
    pub fn insert(&mut self, internal: i32, protocol: i32) {
        self.ids.retain(|_, p| *p != protocol);
        self.ids.insert(internal, protocol);
    }

    pub fn mapped(&self, internal: i32) -> Option<i32> {
        self.ids.get(&internal).copied()
    }

    pub fn remove(&mut self, internal: i32) -> Option<i32> {
        self.ids.remove(&internal)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_id_stays_unique() {
        let mut ids = TouchIds::new();
        ids.insert(1, 10);
        ids.insert(2, 10);
        assert_eq!(ids.mapped(1), None);
        assert_eq!(ids.mapped(2), Some(10));
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut ids = TouchIds::new();
        ids.insert(1, 10);
        ids.insert(2, 11);
        assert_eq!(ids.remove(1), Some(10));
        assert_eq!(ids.remove(1), None);
        ids.clear();
        assert!(ids.is_empty());
    }
}
