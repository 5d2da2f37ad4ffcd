use std::{cmp::Ordering, marker::PhantomData};

use rayon::prelude::*;

use super::{Axis, Dimension};
use crate::{
    array::{Element, Value},
    df::{frame::DataFrame, frame::DataFrameValue, stats::nan_mean, vector::Vector, Key},
    error::{AxisType, TableError, TableResult},
};

/// restructures a table along its rows or columns
pub struct AxisMut<'a, R: Key, C: Key, D: Dimension<R, C>> {
    frame: &'a mut DataFrame<R, C>,
    _dim: PhantomData<D>,
}

/// nulls last in both directions, non-null values by their natural order
fn compare_values(a: &Value, b: &Value, ascending: bool) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ordering = a.try_cmp(b).unwrap_or(Ordering::Equal);
            if ascending {
                ordering
            } else {
                ordering.reverse()
            }
        }
    }
}

fn check_comparable(
    op: &'static str,
    key: &impl std::fmt::Debug,
    values: &[Value],
) -> TableResult<()> {
    let mut non_null = values.iter().filter(|v| !v.is_null());
    if let Some(first) = non_null.next() {
        if let Some(other) = non_null.find(|v| first.try_cmp(v).is_none()) {
            return Err(TableError::NotComparable {
                op,
                column: format!("{key:?}"),
                left: format!("{first:?}"),
                right: format!("{other:?}"),
            });
        }
    }
    Ok(())
}

impl<'a, R: Key, C: Key, D: Dimension<R, C>> AxisMut<'a, R, C, D> {
    pub(crate) fn new(frame: &'a mut DataFrame<R, C>) -> Self {
        Self {
            frame,
            _dim: PhantomData,
        }
    }

    pub fn view(&self) -> Axis<'_, R, C, D> {
        Axis::new(self.frame)
    }

    pub fn count(&self) -> usize {
        D::index(self.frame).len()
    }

    // sorting

    /// a stable ordering of `0..count()` under `compare`
    fn sorted_ordinals<F>(&self, compare: F) -> Vec<usize>
    where
        F: Fn(&usize, &usize) -> Ordering + Sync,
    {
        let mut ordinals: Vec<usize> = (0..self.count()).collect();
        if self.frame.is_parallel() {
            ordinals.par_sort_by(compare);
        } else {
            ordinals.sort_by(compare);
        }
        ordinals
    }

    fn reorder(&mut self, op: &'static str, ordinals: Vec<usize>) {
        log::debug!("{op}: reordering {} {}", ordinals.len(), D::AXIS);
        D::permute(self.frame, &ordinals);
    }

    pub fn sort_keys(&mut self, ascending: bool) {
        let keys = D::index(self.frame).keys();
        let ordinals = self.sorted_ordinals(|&a, &b| {
            let ordering = keys[a].cmp(&keys[b]);
            if ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
        self.reorder("sort_keys", ordinals);
    }

    pub fn sort_by(&mut self, ascending: bool, other_key: &D::Other) -> TableResult<()> {
        self.sort_by_many(ascending, std::slice::from_ref(other_key))
    }

    /// sorts by the values at `other_keys`, later keys breaking ties of earlier ones
    ///
    /// nulls go last. the table is left untouched if any key holds values that cannot be
    /// ordered against each other.
    pub fn sort_by_many(&mut self, ascending: bool, other_keys: &[D::Other]) -> TableResult<()> {
        let frame = &*self.frame;
        let other = D::other_index(frame);
        let positions = other_keys
            .iter()
            .map(|k| other.ordinal_or_fail("sort_by", k))
            .collect::<TableResult<Vec<_>>>()?;
        let n = self.count();
        let sort_keys: Vec<Vec<Value>> = positions
            .iter()
            .map(|&o| {
                (0..n)
                    .map(|t| Vector::<R, C, D>::new(frame, t).value_unchecked(o))
                    .collect()
            })
            .collect();
        for (key, values) in other_keys.iter().zip(&sort_keys) {
            check_comparable("sort_by", key, values)?;
        }
        let ordinals = self.sorted_ordinals(|&a, &b| {
            sort_keys
                .iter()
                .map(|values| compare_values(&values[a], &values[b], ascending))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        self.reorder("sort_by", ordinals);
        Ok(())
    }

    /// stable sort under a caller-supplied comparator
    pub fn sort_with<F>(&mut self, comparator: F)
    where
        F: for<'v> Fn(&Vector<'v, R, C, D>, &Vector<'v, R, C, D>) -> Ordering + Sync,
    {
        let frame = &*self.frame;
        let ordinals = self.sorted_ordinals(|&a, &b| {
            comparator(&Vector::new(frame, a), &Vector::new(frame, b))
        });
        self.reorder("sort_with", ordinals);
    }

    pub fn replace_key(&mut self, old: &D::Key, new: D::Key) -> TableResult<()> {
        D::index_mut(self.frame).replace_key(old, new)
    }

    /// subtracts from every numeric cell the mean of its vector
    ///
    /// int and long columns are widened to double first, non-numeric cells are left as
    /// they are and do not count towards the means.
    pub fn demean(&mut self) {
        let parallelism = self.frame.parallelism;
        let frame = &mut *self.frame;
        for array in frame.data.iter_mut().filter(|a| a.kind().is_integer()) {
            array.widen_to_double();
        }
        match D::AXIS {
            AxisType::Cols => parallelism.maybe_par_for_each(&mut frame.data, |array| {
                if let Some(values) = array.as_double_slice_mut() {
                    let mean = nan_mean(values);
                    values.iter_mut().for_each(|x| *x -= mean);
                }
            }),
            AxisType::Rows => {
                let data = &frame.data;
                let means = parallelism.maybe_par_map(0..frame.rows.len(), |i| {
                    let row: Vec<f64> = data
                        .iter()
                        .filter_map(|a| a.as_double_slice())
                        .map(|v| v[i])
                        .collect();
                    nan_mean(&row)
                });
                parallelism.maybe_par_for_each(&mut frame.data, |array| {
                    if let Some(values) = array.as_double_slice_mut() {
                        values.iter_mut().zip(&means).for_each(|(x, m)| *x -= m);
                    }
                });
            }
        }
    }

    /// adds the vectors of `other` missing here, copying the cells both tables share
    ///
    /// returns the keys that were added.
    pub fn add_all(&mut self, other: &DataFrame<R, C>) -> TableResult<Vec<D::Key>> {
        let mine = D::index(self.frame);
        let added: Vec<D::Key> = D::index(other)
            .keys()
            .iter()
            .filter(|k| !mine.contains(k))
            .cloned()
            .collect();
        D::add_empty(self.frame, other, &added)?;
        let shared: Vec<(usize, usize)> = D::other_index(other)
            .keys()
            .iter()
            .enumerate()
            .filter_map(|(source, k)| D::other_index(self.frame).ordinal(k).map(|t| (t, source)))
            .collect();
        for key in &added {
            let target = D::index(self.frame).ordinal_or_fail("add_all", key)?;
            let source = D::index(other).ordinal_or_fail("add_all", key)?;
            for &(to, so) in &shared {
                let (i, j) = D::cell(target, to);
                let (si, sj) = D::cell(source, so);
                self.frame.data[j].set_value(i, other.data[sj].get_value(si));
            }
        }
        log::debug!("add_all: added {} {}", added.len(), D::AXIS);
        Ok(added)
    }

    // per-vector visitors

    fn cells(&self, op: &'static str, key: &D::Key) -> TableResult<Vec<(usize, usize)>> {
        let t = D::index(self.frame).ordinal_or_fail(op, key)?;
        Ok((0..D::other_index(self.frame).len())
            .map(|o| D::cell(t, o))
            .collect())
    }

    fn compute<T, F>(&self, cells: &[(usize, usize)], f: &F) -> TableResult<Vec<T>>
    where
        T: Send,
        F: Fn(&DataFrameValue<R, C>) -> TableResult<T> + Sync + Send,
    {
        let frame = &*self.frame;
        frame
            .parallelism
            .maybe_par_try_map(cells, |&(i, j)| f(&DataFrameValue::new(frame, i, j)))
    }

    /// replaces every cell of the vector at `key` with `f`'s result, all or nothing
    pub fn apply<T, F>(&mut self, key: &D::Key, f: F) -> TableResult<()>
    where
        T: Element,
        F: Fn(&DataFrameValue<R, C>) -> TableResult<T> + Sync + Send,
    {
        let cells = self.cells("apply", key)?;
        for &(_, j) in &cells {
            let found = self.frame.data[j].kind();
            if found != T::KIND {
                return Err(TableError::TypeMismatch {
                    op: "apply",
                    column: format!("{:?}", self.frame.cols.keys()[j]),
                    expected: T::KIND,
                    found,
                });
            }
        }
        let values = self.compute(&cells, &f)?;
        for (&(i, j), value) in cells.iter().zip(values) {
            self.frame.data[j]
                .set(i, value)
                .map_err(|e| e.at("apply", &self.frame.cols.keys()[j]))?;
        }
        Ok(())
    }

    pub fn apply_booleans<F>(&mut self, key: &D::Key, f: F) -> TableResult<()>
    where
        F: Fn(&DataFrameValue<R, C>) -> TableResult<bool> + Sync + Send,
    {
        self.apply(key, f)
    }

    pub fn apply_ints<F>(&mut self, key: &D::Key, f: F) -> TableResult<()>
    where
        F: Fn(&DataFrameValue<R, C>) -> TableResult<i32> + Sync + Send,
    {
        self.apply(key, f)
    }

    pub fn apply_longs<F>(&mut self, key: &D::Key, f: F) -> TableResult<()>
    where
        F: Fn(&DataFrameValue<R, C>) -> TableResult<i64> + Sync + Send,
    {
        self.apply(key, f)
    }

    pub fn apply_doubles<F>(&mut self, key: &D::Key, f: F) -> TableResult<()>
    where
        F: Fn(&DataFrameValue<R, C>) -> TableResult<f64> + Sync + Send,
    {
        self.apply(key, f)
    }

    pub fn apply_values<F>(&mut self, key: &D::Key, f: F) -> TableResult<()>
    where
        F: Fn(&DataFrameValue<R, C>) -> TableResult<Value> + Sync + Send,
    {
        let cells = self.cells("apply_values", key)?;
        let values = self.compute(&cells, &f)?;
        for (&(i, j), value) in cells.iter().zip(values) {
            self.frame.data[j].set_value(i, value);
        }
        Ok(())
    }

    pub fn for_each_value<F>(&self, key: &D::Key, f: F) -> TableResult<()>
    where
        F: Fn(&DataFrameValue<R, C>) + Sync + Send,
    {
        let cells = self.cells("for_each_value", key)?;
        let frame = &*self.frame;
        frame
            .parallelism
            .maybe_par_for_each(&cells, |&(i, j)| f(&DataFrameValue::new(frame, i, j)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        array::{Array, ElementKind},
        df::axis::tests::sample,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sort_by_is_stable_with_nulls_last() {
        for parallel in [false, true] {
            let mut frame = sample();
            if parallel {
                frame = frame.parallel();
            }
            frame.rows_mut().sort_by(true, &"a").unwrap();
            assert_eq!(frame.rows().key_array(), vec!["r1", "r3", "r0", "r2"]);
            frame.rows_mut().sort_by(true, &"a").unwrap();
            assert_eq!(frame.rows().key_array(), vec!["r1", "r3", "r0", "r2"]);
            assert_eq!(frame.get_int(&"r0", &"a").unwrap(), 3);
            assert_eq!(frame.rows().ordinal(&"r0"), Some(2));

            frame.rows_mut().sort_by(false, &"b").unwrap();
            assert_eq!(frame.rows().key_array(), vec!["r1", "r3", "r0", "r2"]);
            frame.rows_mut().sort_by(true, &"b").unwrap();
            assert_eq!(frame.rows().key_array(), vec!["r0", "r3", "r1", "r2"]);
        }
    }

    #[test]
    fn test_sort_by_many_and_keys() {
        let mut frame = sample();
        frame.rows_mut().sort_by_many(false, &["a", "c"]).unwrap();
        assert_eq!(frame.rows().key_array(), vec!["r2", "r0", "r3", "r1"]);
        frame.rows_mut().sort_keys(true);
        assert_eq!(frame.rows().key_array(), vec!["r0", "r1", "r2", "r3"]);
        frame.cols_mut().sort_keys(false);
        assert_eq!(frame.cols().key_array(), vec!["c", "b", "a"]);
        assert_eq!(frame.get_value(&"r1", &"c").unwrap(), Value::from("y"));
    }

    #[test]
    fn test_failed_sort_leaves_table_unchanged() {
        let mut frame = sample();
        frame.set_value(&"r1", &"c", 7).unwrap();
        let result = frame.rows_mut().sort_by(true, &"c");
        assert!(matches!(
            result,
            Err(TableError::NotComparable { ref column, .. }) if column == "\"c\""
        ));
        assert_eq!(frame.rows().key_array(), vec!["r0", "r1", "r2", "r3"]);
        let err = frame.rows_mut().sort_by_many(true, &["a", "c"]).unwrap_err();
        assert!(err.to_string().contains("of \"c\""));
    }

    #[test]
    fn test_sort_with_comparator() {
        let mut frame = sample();
        frame
            .cols_mut()
            .sort_with(|a, b| b.kind().cmp(&a.kind()));
        assert_eq!(frame.cols().key_array(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_replace_key() {
        let mut frame = sample();
        frame.rows_mut().replace_key(&"r1", "one").unwrap();
        assert_eq!(frame.get_int(&"one", &"a").unwrap(), 1);
        assert!(frame.rows_mut().replace_key(&"r0", "r2").is_err());
    }

    #[test]
    fn test_demean_columns_widens_ints() {
        let mut frame = sample();
        frame.cols_mut().demean();
        assert_eq!(frame.kind(&"a").unwrap(), ElementKind::Double);
        assert_eq!(frame.get_double(&"r0", &"a").unwrap(), 3. - 2.25);
        assert_eq!(frame.get_double(&"r0", &"b").unwrap(), 0.5 - 1.5);
        assert!(frame.get_double(&"r2", &"b").unwrap().is_nan());
        assert_eq!(frame.get_value(&"r0", &"c").unwrap(), Value::from("x"));
    }

    #[test]
    fn test_demean_rows_copy() {
        let frame = sample();
        let demeaned = frame.rows().demean();
        assert_eq!(demeaned.get_double(&"r1", &"a").unwrap(), 1. - 1.75);
        assert_eq!(demeaned.get_double(&"r1", &"b").unwrap(), 2.5 - 1.75);
        assert_eq!(demeaned.get_double(&"r2", &"a").unwrap(), 0.);
        assert_eq!(frame.kind(&"a").unwrap(), ElementKind::Int);
    }

    #[test]
    fn test_add_all() {
        let mut frame = sample();
        let other = DataFrame::from_columns(
            ["r1", "r9"],
            [
                ("a", Array::Int(vec![100, 9])),
                ("z", Array::Boolean(vec![true, false])),
            ],
        )
        .unwrap();
        let added = frame.rows_mut().add_all(&other).unwrap();
        assert_eq!(added, vec!["r9"]);
        assert_eq!(frame.get_int(&"r9", &"a").unwrap(), 9);
        assert_eq!(frame.get_int(&"r1", &"a").unwrap(), 1);
        assert!(frame.is_null(&"r9", &"b").unwrap());

        let added = frame.cols_mut().add_all(&other).unwrap();
        assert_eq!(added, vec!["z"]);
        assert_eq!(frame.kind(&"z").unwrap(), ElementKind::Boolean);
        assert!(frame.get_boolean(&"r1", &"z").unwrap());
        assert!(!frame.get_boolean(&"r0", &"z").unwrap());
    }

    #[test]
    fn test_apply_on_one_vector() {
        let mut frame = sample().parallel();
        frame
            .cols_mut()
            .apply_ints(&"a", |v| Ok(v.get_int()? * 2))
            .unwrap();
        assert_eq!(frame.column(&"a").unwrap(), &Array::Int(vec![6, 2, 8, 2]));
        assert!(matches!(
            frame.rows_mut().apply_doubles(&"r0", |_| Ok(0.)),
            Err(TableError::TypeMismatch { .. })
        ));
        assert_eq!(frame.get_double(&"r0", &"b").unwrap(), 0.5);
        frame
            .rows_mut()
            .apply_values(&"r0", |_| Ok(Value::Double(0.)))
            .unwrap();
        assert_eq!(frame.kind(&"a").unwrap(), ElementKind::Object);
        assert_eq!(frame.get_double(&"r0", &"b").unwrap(), 0.);

        let seen = std::sync::atomic::AtomicUsize::new(0);
        frame
            .rows_mut()
            .for_each_value(&"r1", |_| {
                seen.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            })
            .unwrap();
        assert_eq!(seen.into_inner(), 3);
    }
}
