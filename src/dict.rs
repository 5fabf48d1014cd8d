//! Name -> entry dictionary of an open container.
//!
//! Entries start Unresolved (known from the footer, not loaded) and become
//! resolved on first get, or are created resolved by set/new_table.

use anyhow::Result;
use std::sync::{Arc, Mutex};

use crate::error::HioError;
use crate::omap::OrderedMap;
use crate::table::TableHeader;
use crate::value::Payload;

/// Resolved table: shared header plus where its rows start.
#[derive(Clone)]
pub(crate) struct TableState {
    pub header: Arc<Mutex<TableHeader>>,
    pub rows_from: u64,
}

pub(crate) enum Entry {
    Unresolved,
    Value(Box<dyn Payload>),
    Table(TableState),
}

impl Entry {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Entry::Unresolved)
    }
}

#[derive(Default)]
pub(crate) struct Dictionary {
    map: OrderedMap<Entry>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn has(&self, name: &str) -> bool {
        self.map.contains(name)
    }

    pub fn get(&self, name: &str) -> Result<&Entry> {
        self.map
            .get(name)
            .ok_or_else(|| HioError::not_found(name).into())
    }

    pub fn put(&mut self, name: &str, e: Entry) -> Option<Entry> {
        self.map.insert(name, e)
    }

    pub fn del(&mut self, name: &str) -> Result<Entry> {
        self.map
            .remove(name)
            .ok_or_else(|| HioError::not_found(name).into())
    }

    /// Names in lexicographic order.
    pub fn keys(&self) -> Vec<String> {
        self.map.keys_sorted()
    }

    pub fn is_resolved(&self, name: &str) -> bool {
        self.map.get(name).map(Entry::is_resolved).unwrap_or(false)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::boxed;

    #[test]
    fn keys_are_sorted_whatever_the_insert_order() {
        let mut d = Dictionary::new();
        for k in ["zeta", "alpha", "n", "f", "Beta"] {
            d.put(k, Entry::Unresolved);
        }
        assert_eq!(d.keys(), vec!["Beta", "alpha", "f", "n", "zeta"]);
    }

    #[test]
    fn resolution_state() {
        let mut d = Dictionary::new();
        d.put("a", Entry::Unresolved);
        assert!(d.has("a"));
        assert!(!d.is_resolved("a"));
        assert!(d.put("a", Entry::Value(boxed(1u8))).is_some());
        assert!(d.is_resolved("a"));
        assert_eq!(d.len(), 1);
        assert!(!d.is_resolved("missing"));
    }

    #[test]
    fn del_missing_is_not_found() {
        let mut d = Dictionary::new();
        let err = d.del("x").err().expect("error");
        assert_eq!(
            err.downcast_ref::<HioError>(),
            Some(&HioError::not_found("x"))
        );
        d.put("x", Entry::Unresolved);
        assert!(d.del("x").is_ok());
        assert!(!d.has("x"));
    }
}
