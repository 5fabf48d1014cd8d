//! Insertion-ordered map with linear lookup.
//!
//! Containers hold dozens to low thousands of names, so a Vec of pairs is
//! enough; `keys_sorted()` gives the lexicographic listing.

#[derive(Debug, Clone)]
pub struct OrderedMap<V> {
    items: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn index_of(&self, key: &str) -> Option<usize> {
        self.items.iter().position(|(k, _)| k == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index_of(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.index_of(key).map(|i| &self.items[i].1)
    }

    /// Insert or replace. A replaced key keeps its original position.
    /// Returns the previous value.
    pub fn insert(&mut self, key: &str, v: V) -> Option<V> {
        match self.index_of(key) {
            Some(i) => Some(std::mem::replace(&mut self.items[i].1, v)),
            None => {
                self.items.push((key.to_string(), v));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.index_of(key).map(|i| self.items.remove(i).1)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(k, _)| k.as_str())
    }

    pub fn keys_sorted(&self) -> Vec<String> {
        let mut out: Vec<String> = self.keys().map(str::to_string).collect();
        out.sort();
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_and_replace_in_place() {
        let mut m = OrderedMap::new();
        assert!(m.insert("b", 1).is_none());
        assert!(m.insert("a", 2).is_none());
        assert!(m.insert("c", 3).is_none());
        assert_eq!(m.insert("b", 10), Some(1));
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(m.get("b"), Some(&10));
        assert_eq!(m.keys_sorted(), vec!["a", "b", "c"]);
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn remove_and_contains() {
        let mut m = OrderedMap::new();
        m.insert("x", ());
        m.insert("y", ());
        assert!(m.contains("x"));
        assert_eq!(m.remove("x"), Some(()));
        assert!(!m.contains("x"));
        assert!(m.remove("x").is_none());
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["y"]);
        m.remove("y");
        assert!(m.is_empty());
    }
}
