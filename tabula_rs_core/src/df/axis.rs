//! row / column axes of a [`DataFrame`]
//!
//! [`Axis`] is a read-only (and optionally filtered) view over one dimension, [`AxisMut`]
//! restructures the table along it. both are generic over a [`Dimension`], so every
//! operation is written once for rows and columns.

use std::{
    collections::{HashMap, HashSet},
    marker::PhantomData,
    sync::Arc,
};

use rayon::prelude::*;

use super::{frame::DataFrame, stats::AxisStats, vector::Vector, Key};
use crate::{
    array::{widest_of, ElementKind},
    error::{AxisType, TableError, TableResult},
    index::Index,
    toolkit::parallel::Parallelism,
};

mod group;
mod mutate;

pub use group::{GroupKey, Grouping};
pub use mutate::AxisMut;

/// selects the rows or the columns of a `DataFrame<R, C>`
pub trait Dimension<R: Key, C: Key>: Copy + Default + Send + Sync + 'static {
    /// key type along this dimension
    type Key: Key;
    /// key type along the other dimension
    type Other: Key;
    const AXIS: AxisType;

    fn index(frame: &DataFrame<R, C>) -> &Index<Self::Key>;
    fn other_index(frame: &DataFrame<R, C>) -> &Index<Self::Other>;
    fn index_mut(frame: &mut DataFrame<R, C>) -> &mut Index<Self::Key>;
    /// `(row, col)` of the cell at ordinal `this` here and ordinal `other` on the other axis
    fn cell(this: usize, other: usize) -> (usize, usize);
    fn take(frame: &DataFrame<R, C>, ordinals: &[usize]) -> DataFrame<R, C>;
    fn permute(frame: &mut DataFrame<R, C>, ordinals: &[usize]);
    /// the kind able to hold every cell of the vector at `ordinal`
    fn kind(frame: &DataFrame<R, C>, ordinal: usize) -> ElementKind;
    /// appends empty vectors for `keys`, shaped like their counterparts in `source`
    fn add_empty(
        frame: &mut DataFrame<R, C>,
        source: &DataFrame<R, C>,
        keys: &[Self::Key],
    ) -> TableResult<()>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Rows;

#[derive(Clone, Copy, Debug, Default)]
pub struct Cols;

impl<R: Key, C: Key> Dimension<R, C> for Rows {
    type Key = R;
    type Other = C;
    const AXIS: AxisType = AxisType::Rows;

    fn index(frame: &DataFrame<R, C>) -> &Index<R> {
        &frame.rows
    }
    fn other_index(frame: &DataFrame<R, C>) -> &Index<C> {
        &frame.cols
    }
    fn index_mut(frame: &mut DataFrame<R, C>) -> &mut Index<R> {
        &mut frame.rows
    }
    #[inline]
    fn cell(this: usize, other: usize) -> (usize, usize) {
        (this, other)
    }
    fn take(frame: &DataFrame<R, C>, ordinals: &[usize]) -> DataFrame<R, C> {
        frame.take_rows(ordinals)
    }
    fn permute(frame: &mut DataFrame<R, C>, ordinals: &[usize]) {
        frame.permute_rows(ordinals)
    }
    fn kind(frame: &DataFrame<R, C>, _: usize) -> ElementKind {
        frame
            .data
            .iter()
            .map(|a| a.kind())
            .reduce(widest_of)
            .unwrap_or(ElementKind::Object)
    }
    fn add_empty(
        frame: &mut DataFrame<R, C>,
        _: &DataFrame<R, C>,
        keys: &[R],
    ) -> TableResult<()> {
        frame.add_rows(keys.iter().cloned()).map(|_| ())
    }
}

impl<R: Key, C: Key> Dimension<R, C> for Cols {
    type Key = C;
    type Other = R;
    const AXIS: AxisType = AxisType::Cols;

    fn index(frame: &DataFrame<R, C>) -> &Index<C> {
        &frame.cols
    }
    fn other_index(frame: &DataFrame<R, C>) -> &Index<R> {
        &frame.rows
    }
    fn index_mut(frame: &mut DataFrame<R, C>) -> &mut Index<C> {
        &mut frame.cols
    }
    #[inline]
    fn cell(this: usize, other: usize) -> (usize, usize) {
        (other, this)
    }
    fn take(frame: &DataFrame<R, C>, ordinals: &[usize]) -> DataFrame<R, C> {
        frame.take_cols(ordinals)
    }
    fn permute(frame: &mut DataFrame<R, C>, ordinals: &[usize]) {
        frame.permute_cols(ordinals)
    }
    fn kind(frame: &DataFrame<R, C>, ordinal: usize) -> ElementKind {
        frame.data[ordinal].kind()
    }
    fn add_empty(
        frame: &mut DataFrame<R, C>,
        source: &DataFrame<R, C>,
        keys: &[C],
    ) -> TableResult<()> {
        for key in keys {
            frame.add_column(key.clone(), source.kind(key)?)?;
        }
        Ok(())
    }
}

impl<R: Key, C: Key> DataFrame<R, C> {
    pub fn rows(&self) -> Axis<'_, R, C, Rows> {
        Axis::new(self)
    }

    pub fn cols(&self) -> Axis<'_, R, C, Cols> {
        Axis::new(self)
    }

    pub fn rows_mut(&mut self) -> AxisMut<'_, R, C, Rows> {
        AxisMut::new(self)
    }

    pub fn cols_mut(&mut self) -> AxisMut<'_, R, C, Cols> {
        AxisMut::new(self)
    }
}

/// a read-only view over the rows or columns of a table, possibly narrowed by a filter
///
/// positions (`key(i)`, `ordinal(k)`) are relative to the view: on a filtered axis they
/// run over `0..count()`.
pub struct Axis<'a, R: Key, C: Key, D: Dimension<R, C>> {
    frame: &'a DataFrame<R, C>,
    parallelism: Parallelism,
    subset: Option<Arc<Subset>>,
    _dim: PhantomData<D>,
}

/// table ordinals of a filtered view, with the reverse ordinal -> position lookup
#[derive(Debug)]
struct Subset {
    ordinals: Vec<usize>,
    positions: HashMap<usize, usize>,
}

impl Subset {
    fn new(ordinals: Vec<usize>) -> Self {
        let positions = ordinals.iter().enumerate().map(|(k, &o)| (o, k)).collect();
        Self {
            ordinals,
            positions,
        }
    }
}

impl<R: Key, C: Key, D: Dimension<R, C>> Clone for Axis<'_, R, C, D> {
    fn clone(&self) -> Self {
        Self {
            frame: self.frame,
            parallelism: self.parallelism,
            subset: self.subset.clone(),
            _dim: PhantomData,
        }
    }
}

impl<'a, R: Key, C: Key, D: Dimension<R, C>> Axis<'a, R, C, D> {
    pub(crate) fn new(frame: &'a DataFrame<R, C>) -> Self {
        Self {
            frame,
            parallelism: frame.parallelism,
            subset: None,
            _dim: PhantomData,
        }
    }

    fn with_subset(&self, subset: Vec<usize>) -> Self {
        Self {
            frame: self.frame,
            parallelism: self.parallelism,
            subset: Some(Arc::new(Subset::new(subset))),
            _dim: PhantomData,
        }
    }

    pub fn frame(&self) -> &'a DataFrame<R, C> {
        self.frame
    }

    pub fn parallelism(&self) -> Parallelism {
        self.parallelism
    }

    pub fn is_parallel(&self) -> bool {
        self.parallelism.is_parallel()
    }

    pub fn parallel(mut self) -> Self {
        self.parallelism = Parallelism::Parallel;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallelism = Parallelism::Sequential;
        self
    }

    fn index(&self) -> &'a Index<D::Key> {
        D::index(self.frame)
    }

    /// table ordinal of view position `k`
    #[inline]
    fn resolve(&self, k: usize) -> usize {
        match &self.subset {
            Some(subset) => subset.ordinals[k],
            None => k,
        }
    }

    #[inline]
    fn vector_at_ordinal(&self, ordinal: usize) -> Vector<'a, R, C, D> {
        Vector::new(self.frame, ordinal)
    }

    // shape & keys

    pub fn count(&self) -> usize {
        match &self.subset {
            Some(subset) => subset.ordinals.len(),
            None => self.index().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// the table ordinals covered by this view, in view order
    pub fn ordinals(&self) -> Vec<usize> {
        match &self.subset {
            Some(subset) => subset.ordinals.clone(),
            None => (0..self.index().len()).collect(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a D::Key> + '_ {
        let keys = self.index().keys();
        (0..self.count()).map(move |k| &keys[self.resolve(k)])
    }

    pub fn key_array(&self) -> Vec<D::Key> {
        self.keys().cloned().collect()
    }

    pub fn key(&self, position: usize) -> Option<&'a D::Key> {
        (position < self.count()).then(|| &self.index().keys()[self.resolve(position)])
    }

    pub fn ordinal(&self, key: &D::Key) -> Option<usize> {
        let ordinal = self.index().ordinal(key)?;
        match &self.subset {
            Some(subset) => subset.positions.get(&ordinal).copied(),
            None => Some(ordinal),
        }
    }

    pub fn ordinal_or_fail(&self, key: &D::Key) -> TableResult<usize> {
        self.ordinal(key)
            .ok_or_else(|| TableError::key_not_found("ordinal", D::AXIS, key))
    }

    pub fn contains(&self, key: &D::Key) -> bool {
        match &self.subset {
            Some(_) => self.ordinal(key).is_some(),
            None => self.index().contains(key),
        }
    }

    pub fn contains_all<'k>(&self, keys: impl IntoIterator<Item = &'k D::Key>) -> bool {
        keys.into_iter().all(|k| self.contains(k))
    }

    pub fn kind(&self, key: &D::Key) -> TableResult<ElementKind> {
        let ordinal = self.index().ordinal_or_fail("kind", key)?;
        Ok(D::kind(self.frame, ordinal))
    }

    pub fn kinds(&self) -> Vec<ElementKind> {
        (0..self.count())
            .map(|k| D::kind(self.frame, self.resolve(k)))
            .collect()
    }

    pub fn first_key(&self) -> Option<&'a D::Key> {
        self.key(0)
    }

    pub fn last_key(&self) -> Option<&'a D::Key> {
        self.count().checked_sub(1).and_then(|k| self.key(k))
    }

    /// nearest key strictly below `key`, by binary search on an unfiltered axis
    pub fn lower_key(&self, key: &D::Key) -> Option<&'a D::Key> {
        match &self.subset {
            None => self.index().lower_key(key),
            Some(_) => self.keys().filter(|k| *k < key).max(),
        }
    }

    /// nearest key strictly above `key`, by binary search on an unfiltered axis
    pub fn higher_key(&self, key: &D::Key) -> Option<&'a D::Key> {
        match &self.subset {
            None => self.index().higher_key(key),
            Some(_) => self.keys().filter(|k| *k > key).min(),
        }
    }

    // vectors

    pub fn vector(&self, key: &D::Key) -> TableResult<Vector<'a, R, C, D>> {
        if !self.contains(key) {
            return Err(TableError::key_not_found("vector", D::AXIS, key));
        }
        let ordinal = self.index().ordinal_or_fail("vector", key)?;
        Ok(self.vector_at_ordinal(ordinal))
    }

    pub fn vector_at(&self, position: usize) -> Option<Vector<'a, R, C, D>> {
        (position < self.count()).then(|| self.vector_at_ordinal(self.resolve(position)))
    }

    pub fn first(&self) -> Option<Vector<'a, R, C, D>> {
        self.vector_at(0)
    }

    pub fn last(&self) -> Option<Vector<'a, R, C, D>> {
        self.count().checked_sub(1).and_then(|k| self.vector_at(k))
    }

    pub fn first_where<F>(&self, predicate: F) -> Option<Vector<'a, R, C, D>>
    where
        F: Fn(&Vector<'a, R, C, D>) -> bool,
    {
        self.iter().find(|v| predicate(v))
    }

    pub fn last_where<F>(&self, predicate: F) -> Option<Vector<'a, R, C, D>>
    where
        F: Fn(&Vector<'a, R, C, D>) -> bool,
    {
        (0..self.count())
            .rev()
            .map(|k| self.vector_at_ordinal(self.resolve(k)))
            .find(|v| predicate(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = Vector<'a, R, C, D>> + '_ {
        (0..self.count()).map(move |k| self.vector_at_ordinal(self.resolve(k)))
    }

    pub fn for_each<F>(&self, f: F)
    where
        F: Fn(Vector<'a, R, C, D>) + Sync + Send,
    {
        self.parallelism
            .maybe_par_for_each(0..self.count(), |k| f(self.vector_at_ordinal(self.resolve(k))));
    }

    /// maps every vector, results come back in view order in both modes
    pub fn map<T, F>(&self, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(Vector<'a, R, C, D>) -> T + Sync + Send,
    {
        self.parallelism
            .maybe_par_map(0..self.count(), |k| f(self.vector_at_ordinal(self.resolve(k))))
    }

    // filtering & selection

    /// narrows the view to `keys`, in that order; every key must be present and distinct
    pub fn filter_keys<'k>(&self, keys: impl IntoIterator<Item = &'k D::Key>) -> TableResult<Self> {
        let mut seen = HashSet::new();
        let mut subset = Vec::new();
        for key in keys {
            let k = self
                .ordinal(key)
                .ok_or_else(|| TableError::key_not_found("filter_keys", D::AXIS, key))?;
            if !seen.insert(k) {
                return Err(TableError::duplicate_key("filter_keys", D::AXIS, key));
            }
            subset.push(self.resolve(k));
        }
        Ok(self.with_subset(subset))
    }

    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Vector<'a, R, C, D>) -> bool + Sync + Send,
    {
        let keep = self.map(|v| predicate(&v).then_some(v.ordinal()));
        self.with_subset(keep.into_iter().flatten().collect())
    }

    /// the vectors of this view as a new, densified table
    pub fn to_frame(&self) -> DataFrame<R, C> {
        D::take(self.frame, &self.ordinals())
    }

    pub fn select_keys<'k>(
        &self,
        keys: impl IntoIterator<Item = &'k D::Key>,
    ) -> TableResult<DataFrame<R, C>> {
        Ok(self.filter_keys(keys)?.to_frame())
    }

    pub fn select<F>(&self, predicate: F) -> DataFrame<R, C>
    where
        F: Fn(&Vector<'a, R, C, D>) -> bool + Sync + Send,
    {
        self.filter(predicate).to_frame()
    }

    /// `length` vectors starting at view position `start`
    pub fn select_range(&self, start: usize, length: usize) -> TableResult<DataFrame<R, C>> {
        let end = start.checked_add(length).filter(|&end| end <= self.count());
        let Some(end) = end else {
            return Err(TableError::invalid_argument(
                "select_range",
                format!(
                    "range {start}..{start}+{length} out of bounds for {} of length {}",
                    D::AXIS,
                    self.count()
                ),
            ));
        };
        let ordinals: Vec<usize> = (start..end).map(|k| self.resolve(k)).collect();
        Ok(D::take(self.frame, &ordinals))
    }

    /// a new table without the vectors matching `predicate`
    pub fn remove<F>(&self, predicate: F) -> DataFrame<R, C>
    where
        F: Fn(&Vector<'a, R, C, D>) -> bool + Sync + Send,
    {
        self.select(|v| !predicate(v))
    }

    // reductions

    fn extreme<F>(&self, f: F, wanted: std::cmp::Ordering) -> Option<Vector<'a, R, C, D>>
    where
        F: Fn(&Vector<'a, R, C, D>, &Vector<'a, R, C, D>) -> std::cmp::Ordering + Sync + Send,
    {
        // keeps the left operand unless the right one is strictly better
        let pick = |a: Vector<'a, R, C, D>, b: Vector<'a, R, C, D>| {
            if f(&b, &a) == wanted {
                b
            } else {
                a
            }
        };
        if self.is_parallel() {
            (0..self.count())
                .into_par_iter()
                .map(|k| self.vector_at_ordinal(self.resolve(k)))
                .reduce_with(pick)
        } else {
            self.iter().reduce(pick)
        }
    }

    /// the least vector under `comparator`, the first one wins on ties
    pub fn min<F>(&self, comparator: F) -> Option<Vector<'a, R, C, D>>
    where
        F: Fn(&Vector<'a, R, C, D>, &Vector<'a, R, C, D>) -> std::cmp::Ordering + Sync + Send,
    {
        self.extreme(comparator, std::cmp::Ordering::Less)
    }

    /// the greatest vector under `comparator`, the first one wins on ties
    pub fn max<F>(&self, comparator: F) -> Option<Vector<'a, R, C, D>>
    where
        F: Fn(&Vector<'a, R, C, D>, &Vector<'a, R, C, D>) -> std::cmp::Ordering + Sync + Send,
    {
        self.extreme(comparator, std::cmp::Ordering::Greater)
    }

    /// a demeaned copy of the vectors in this view, see [`AxisMut::demean`]
    pub fn demean(&self) -> DataFrame<R, C> {
        let mut copy = self.to_frame();
        copy.set_parallelism(self.parallelism);
        AxisMut::<R, C, D>::new(&mut copy).demean();
        copy
    }

    pub fn stats(&self) -> AxisStats<'a, R, C, D> {
        AxisStats::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{Array, Value};
    use pretty_assertions::assert_eq;

    pub(super) fn sample() -> DataFrame<&'static str, &'static str> {
        DataFrame::from_columns(
            ["r0", "r1", "r2", "r3"],
            [
                ("a", Array::Int(vec![3, 1, 4, 1])),
                ("b", Array::Double(vec![0.5, 2.5, f64::NAN, 1.5])),
                (
                    "c",
                    Array::from_values(vec!["x".into(), "y".into(), "x".into(), "z".into()]),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_axis_keys_and_kinds() {
        let frame = sample();
        let rows = frame.rows();
        assert_eq!(rows.count(), 4);
        assert_eq!(rows.key_array(), vec!["r0", "r1", "r2", "r3"]);
        assert_eq!(rows.ordinal(&"r2"), Some(2));
        assert_eq!(rows.first_key(), Some(&"r0"));
        assert_eq!(rows.last_key(), Some(&"r3"));
        assert_eq!(rows.lower_key(&"r2"), Some(&"r1"));
        assert_eq!(rows.higher_key(&"r3"), None);
        assert_eq!(rows.kind(&"r0").unwrap(), ElementKind::Object);
        assert_eq!(
            frame.cols().kinds(),
            vec![ElementKind::Int, ElementKind::Double, ElementKind::Object]
        );
        assert!(frame.cols().contains_all(&["a", "c"]));
        assert!(!frame.cols().contains(&"d"));
    }

    #[test]
    fn test_filter_is_a_live_view() {
        let frame = sample();
        let filtered = frame
            .rows()
            .filter(|v| v.get_int(&"a").map(|x| x > 1).unwrap_or(false));
        assert_eq!(filtered.key_array(), vec!["r0", "r2"]);
        assert_eq!(filtered.ordinal(&"r2"), Some(1));
        assert!(!filtered.contains(&"r1"));
        assert_eq!(filtered.last().map(|v| *v.key()), Some("r2"));

        let selected = filtered.to_frame();
        assert_eq!(selected.shape(), (2, 3));
        assert_eq!(selected.get_value(&"r2", &"c").unwrap(), Value::from("x"));
        assert_eq!(selected.rows().ordinal(&"r2"), Some(1));
    }

    #[test]
    fn test_filter_keys_rejects_duplicates() {
        let frame = sample();
        assert!(matches!(
            frame.cols().select_keys(&["a", "a"]),
            Err(TableError::DuplicateKey { .. })
        ));
        assert!(matches!(
            frame.rows().filter_keys(&["r1", "r3", "r1"]),
            Err(TableError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_filtered_positions_round_trip() {
        let frame = sample();
        let view = frame.rows().filter_keys(&["r3", "r0", "r2"]).unwrap();
        for (k, key) in view.keys().enumerate() {
            assert_eq!(view.ordinal(key), Some(k));
            assert_eq!(view.key(k), Some(key));
        }
        assert!(view.contains(&"r0"));
        assert!(!view.contains(&"r1"));
        let narrowed = view.filter_keys(&["r2"]).unwrap();
        assert_eq!(narrowed.ordinals(), vec![2]);
        assert_eq!(narrowed.ordinal(&"r2"), Some(0));
    }

    #[test]
    fn test_select_keys_and_range() {
        let frame = sample();
        let cols = frame.cols().select_keys(&["c", "a"]).unwrap();
        assert_eq!(cols.cols().key_array(), vec!["c", "a"]);
        assert_eq!(cols.get_int(&"r2", &"a").unwrap(), 4);
        assert!(frame.cols().select_keys(&["nope"]).is_err());

        let range = frame.rows().select_range(1, 2).unwrap();
        assert_eq!(range.rows().key_array(), vec!["r1", "r2"]);
        assert!(matches!(
            frame.rows().select_range(3, 2),
            Err(TableError::InvalidArgument { .. })
        ));

        let removed = frame.rows().remove(|v| *v.key() == "r1");
        assert_eq!(removed.row_count(), 3);
        assert_eq!(frame.row_count(), 4);
    }

    #[test]
    fn test_min_max_first_wins_on_ties() {
        let frame = sample();
        type Row<'a> = Vector<'a, &'static str, &'static str, Rows>;
        fn by_a(x: &Row, y: &Row) -> std::cmp::Ordering {
            x.get_int(&"a").unwrap().cmp(&y.get_int(&"a").unwrap())
        }
        for axis in [frame.rows().sequential(), frame.rows().parallel()] {
            assert_eq!(axis.min(by_a).map(|v| *v.key()), Some("r1"));
            assert_eq!(axis.max(by_a).map(|v| *v.key()), Some("r2"));
            assert!(axis.filter(|_| false).min(by_a).is_none());
        }
    }

    #[test]
    fn test_first_last_where_and_map() {
        let frame = sample();
        let cols = frame.cols();
        let numeric = cols.first_where(|v| !v.is_numeric());
        assert_eq!(numeric.map(|v| *v.key()), Some("c"));
        assert_eq!(cols.last_where(|v| v.is_numeric()).map(|v| *v.key()), Some("b"));
        let sizes = frame.rows().parallel().map(|v| v.ordinal() * 10);
        assert_eq!(sizes, vec![0, 10, 20, 30]);
    }
}
