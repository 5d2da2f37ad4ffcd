//! # index
//!
//! bidirectional key <-> ordinal mapping for one axis of a table

use std::collections::{HashMap, HashSet};

use crate::{
    df::Key,
    error::{AxisType, TableError, TableResult},
};

#[derive(Clone, Debug)]
pub struct Index<K: Key> {
    axis: AxisType,
    keys: Vec<K>,
    ordinals: HashMap<K, usize>,
}

impl<K: Key> Index<K> {
    pub fn empty(axis: AxisType) -> Self {
        Self {
            axis,
            keys: Vec::new(),
            ordinals: HashMap::new(),
        }
    }

    /// builds an index from keys in ordinal order, failing on the first duplicate
    pub fn new(axis: AxisType, keys: impl IntoIterator<Item = K>) -> TableResult<Self> {
        let mut index = Self::empty(axis);
        index.add_all(keys)?;
        Ok(index)
    }

    /// builds an index from keys already known to be unique
    pub(crate) fn from_unique(axis: AxisType, keys: Vec<K>) -> Self {
        let ordinals: HashMap<K, usize> =
            keys.iter().cloned().enumerate().map(|(i, k)| (k, i)).collect();
        debug_assert_eq!(ordinals.len(), keys.len());
        Self {
            axis,
            keys,
            ordinals,
        }
    }

    pub fn axis(&self) -> AxisType {
        self.axis
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn ordinal(&self, key: &K) -> Option<usize> {
        self.ordinals.get(key).copied()
    }

    pub fn ordinal_or_fail(&self, op: &'static str, key: &K) -> TableResult<usize> {
        self.ordinal(key)
            .ok_or_else(|| TableError::key_not_found(op, self.axis, key))
    }

    pub fn key(&self, ordinal: usize) -> Option<&K> {
        self.keys.get(ordinal)
    }

    pub fn key_or_fail(&self, op: &'static str, ordinal: usize) -> TableResult<&K> {
        self.keys.get(ordinal).ok_or(TableError::OrdinalOutOfBounds {
            op,
            axis: self.axis,
            ordinal,
            len: self.keys.len(),
        })
    }

    pub fn check_ordinal(&self, op: &'static str, ordinal: usize) -> TableResult<usize> {
        self.key_or_fail(op, ordinal).map(|_| ordinal)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.ordinals.contains_key(key)
    }

    pub fn contains_all<'k>(&self, keys: impl IntoIterator<Item = &'k K>) -> bool {
        keys.into_iter().all(|k| self.contains(k))
    }

    pub fn first_key(&self) -> Option<&K> {
        self.keys.first()
    }

    pub fn last_key(&self) -> Option<&K> {
        self.keys.last()
    }

    pub fn is_sorted(&self) -> bool {
        self.keys.windows(2).all(|w| w[0] <= w[1])
    }

    /// the greatest key strictly lower than `key`
    ///
    /// only meaningful on a sorted index, on an unsorted one the answer is arbitrary.
    pub fn lower_key(&self, key: &K) -> Option<&K> {
        let i = self.keys.partition_point(|k| k < key);
        i.checked_sub(1).and_then(|i| self.keys.get(i))
    }

    /// the least key strictly higher than `key`, see [`Index::lower_key`]
    pub fn higher_key(&self, key: &K) -> Option<&K> {
        let i = self.keys.partition_point(|k| k <= key);
        self.keys.get(i)
    }

    pub fn replace_key(&mut self, old: &K, new: K) -> TableResult<()> {
        if self.contains(&new) {
            return Err(TableError::duplicate_key("replace_key", self.axis, &new));
        }
        let ordinal = self.ordinal_or_fail("replace_key", old)?;
        self.ordinals.remove(old);
        self.ordinals.insert(new.clone(), ordinal);
        self.keys[ordinal] = new;
        Ok(())
    }

    pub fn add(&mut self, key: K) -> TableResult<usize> {
        if self.contains(&key) {
            return Err(TableError::duplicate_key("add", self.axis, &key));
        }
        let ordinal = self.keys.len();
        self.ordinals.insert(key.clone(), ordinal);
        self.keys.push(key);
        Ok(ordinal)
    }

    /// appends keys at the end of the ordinal space, leaving the index untouched if any
    /// key is a duplicate
    pub fn add_all(&mut self, keys: impl IntoIterator<Item = K>) -> TableResult<usize> {
        let keys: Vec<K> = keys.into_iter().collect();
        let mut seen = HashSet::with_capacity(keys.len());
        for key in &keys {
            if self.contains(key) || !seen.insert(key) {
                return Err(TableError::duplicate_key("add_all", self.axis, key));
            }
        }
        let added = keys.len();
        self.keys.reserve(added);
        self.ordinals.reserve(added);
        for key in keys {
            self.ordinals.insert(key.clone(), self.keys.len());
            self.keys.push(key);
        }
        Ok(added)
    }

    /// a densified sub-index holding the keys at `ordinals`, in that order
    pub fn take(&self, ordinals: &[usize]) -> Self {
        let keys = ordinals.iter().map(|&i| self.keys[i].clone()).collect();
        Self::from_unique(self.axis, keys)
    }

    /// reorders in place so that ordinal `k` holds the key previously at `ordinals[k]`
    pub fn permute(&mut self, ordinals: &[usize]) {
        *self = self.take(ordinals);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> Index<&'static str> {
        Index::new(AxisType::Rows, ["a", "c", "e"]).unwrap()
    }

    #[test]
    fn test_key_ordinal_round_trip() {
        let index = index();
        for (i, k) in index.keys().iter().enumerate() {
            assert_eq!(index.ordinal(k), Some(i));
            assert_eq!(index.key(i), Some(k));
        }
        assert_eq!(index.ordinal(&"b"), None);
        assert!(index.ordinal_or_fail("test", &"b").is_err());
        assert!(index.key_or_fail("test", 3).is_err());
    }

    #[test]
    fn test_lower_higher() {
        let index = index();
        assert_eq!(index.lower_key(&"c"), Some(&"a"));
        assert_eq!(index.lower_key(&"d"), Some(&"c"));
        assert_eq!(index.lower_key(&"a"), None);
        assert_eq!(index.higher_key(&"c"), Some(&"e"));
        assert_eq!(index.higher_key(&"e"), None);
        let unsorted = Index::new(AxisType::Cols, [3, 1, 2]).unwrap();
        assert!(!unsorted.is_sorted());
        let _ = unsorted.lower_key(&2);
        let _ = unsorted.higher_key(&2);
    }

    #[test]
    fn test_add_all_is_atomic() {
        let mut index = index();
        assert!(matches!(
            index.add_all(["f", "g", "f"]),
            Err(TableError::DuplicateKey { .. })
        ));
        assert!(index.add_all(["x", "a"]).is_err());
        assert_eq!(index.len(), 3);
        assert_eq!(index.add_all(["f", "g"]).unwrap(), 2);
        assert_eq!(index.ordinal(&"g"), Some(4));
    }

    #[test]
    fn test_replace_key() {
        let mut index = index();
        assert!(matches!(
            index.replace_key(&"a", "c"),
            Err(TableError::DuplicateKey { .. })
        ));
        assert!(matches!(
            index.replace_key(&"z", "y"),
            Err(TableError::KeyNotFound { .. })
        ));
        index.replace_key(&"c", "d").unwrap();
        assert_eq!(index.ordinal(&"d"), Some(1));
        assert!(!index.contains(&"c"));
    }

    #[test]
    fn test_take_and_permute() {
        let mut index = index();
        let sub = index.take(&[2, 0]);
        assert_eq!(sub.keys(), &["e", "a"]);
        assert_eq!(sub.ordinal(&"a"), Some(1));
        index.permute(&[2, 1, 0]);
        assert_eq!(index.keys(), &["e", "c", "a"]);
        assert_eq!(index.ordinal(&"e"), Some(0));
    }
}
