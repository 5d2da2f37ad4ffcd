use std::collections::HashMap;

use super::{Axis, Dimension};
use crate::{
    array::Value,
    df::{frame::DataFrame, vector::Vector, Key},
    error::{TableError, TableResult},
};

/// the bucket a vector falls in when grouping
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Values(Vec<Value>),
    /// vectors with a null in any grouping position
    Unmatched,
}

impl GroupKey {
    fn of(values: Vec<Value>) -> Self {
        if values.iter().any(Value::is_null) {
            GroupKey::Unmatched
        } else {
            GroupKey::Values(values)
        }
    }
}

/// tables keyed by [`GroupKey`], in order of first appearance
#[derive(Clone, Debug)]
pub struct Grouping<R: Key, C: Key> {
    groups: Vec<(GroupKey, DataFrame<R, C>)>,
    lookup: HashMap<GroupKey, usize>,
}

impl<R: Key, C: Key> Grouping<R, C> {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.groups.iter().map(|(k, _)| k)
    }

    pub fn get(&self, key: &GroupKey) -> Option<&DataFrame<R, C>> {
        self.lookup.get(key).map(|&i| &self.groups[i].1)
    }

    pub fn group(&self, values: &[Value]) -> Option<&DataFrame<R, C>> {
        self.get(&GroupKey::Values(values.to_vec()))
    }

    pub fn unmatched(&self) -> Option<&DataFrame<R, C>> {
        self.get(&GroupKey::Unmatched)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &DataFrame<R, C>)> {
        self.groups.iter().map(|(k, f)| (k, f))
    }
}

impl<R: Key, C: Key> IntoIterator for Grouping<R, C> {
    type Item = (GroupKey, DataFrame<R, C>);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

impl<'a, R: Key, C: Key, D: Dimension<R, C>> Axis<'a, R, C, D> {
    /// buckets the vectors of this view by their values at `other_keys`
    pub fn group_by(&self, other_keys: &[D::Other]) -> TableResult<Grouping<R, C>> {
        let other = D::other_index(self.frame);
        let positions = other_keys
            .iter()
            .map(|k| other.ordinal_or_fail("group_by", k))
            .collect::<TableResult<Vec<_>>>()?;
        if positions.is_empty() {
            return Err(TableError::invalid_argument(
                "group_by",
                "at least one grouping key is required",
            ));
        }
        Ok(self.group_by_fn(|v| positions.iter().map(|&o| v.value_unchecked(o)).collect()))
    }

    /// buckets the vectors of this view by the values `f` extracts from each of them
    pub fn group_by_fn<F>(&self, f: F) -> Grouping<R, C>
    where
        F: Fn(&Vector<'a, R, C, D>) -> Vec<Value> + Sync + Send,
    {
        let keys = self.map(|v| GroupKey::of(f(&v)));
        let mut lookup: HashMap<GroupKey, usize> = HashMap::new();
        let mut buckets: Vec<(GroupKey, Vec<usize>)> = Vec::new();
        for (position, key) in keys.into_iter().enumerate() {
            let ordinal = self.resolve(position);
            match lookup.get(&key) {
                Some(&i) => buckets[i].1.push(ordinal),
                None => {
                    lookup.insert(key.clone(), buckets.len());
                    buckets.push((key, vec![ordinal]));
                }
            }
        }
        log::debug!("grouped {} {} into {} buckets", self.count(), D::AXIS, buckets.len());
        let groups = buckets
            .into_iter()
            .map(|(key, ordinals)| (key, D::take(self.frame, &ordinals)))
            .collect();
        Grouping { groups, lookup }
    }
}
