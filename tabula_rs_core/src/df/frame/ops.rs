use std::cmp::Ordering;

use super::DataFrame;
use crate::{
    array::{Element, ElementKind, Value},
    df::Key,
    error::{TableError, TableResult},
};

/// one cell of a table, as seen by visitors of `apply_*` / `for_each_value` / reductions
pub struct DataFrameValue<'a, R: Key, C: Key> {
    frame: &'a DataFrame<R, C>,
    row: usize,
    col: usize,
}

impl<R: Key, C: Key> Clone for DataFrameValue<'_, R, C> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<R: Key, C: Key> Copy for DataFrameValue<'_, R, C> {}

impl<'a, R: Key, C: Key> DataFrameValue<'a, R, C> {
    #[inline]
    pub(crate) fn new(frame: &'a DataFrame<R, C>, row: usize, col: usize) -> Self {
        Self { frame, row, col }
    }

    pub fn frame(&self) -> &'a DataFrame<R, C> {
        self.frame
    }

    pub fn row_key(&self) -> &'a R {
        &self.frame.rows.keys()[self.row]
    }

    pub fn col_key(&self) -> &'a C {
        &self.frame.cols.keys()[self.col]
    }

    pub fn row_ordinal(&self) -> usize {
        self.row
    }

    pub fn col_ordinal(&self) -> usize {
        self.col
    }

    pub fn kind(&self) -> ElementKind {
        self.frame.data[self.col].kind()
    }

    #[inline]
    pub fn get<T: Element>(&self) -> TableResult<T> {
        self.frame.data[self.col]
            .get::<T>(self.row)
            .map_err(|e| e.at("get", self.col_key()))
    }

    pub fn get_boolean(&self) -> TableResult<bool> {
        self.get()
    }

    pub fn get_int(&self) -> TableResult<i32> {
        self.get()
    }

    pub fn get_long(&self) -> TableResult<i64> {
        self.get()
    }

    pub fn get_double(&self) -> TableResult<f64> {
        self.get()
    }

    pub fn get_value(&self) -> Value {
        self.frame.data[self.col].get_value(self.row)
    }

    pub fn is_null(&self) -> bool {
        self.frame.data[self.col].is_null(self.row)
    }
}

impl<R: Key, C: Key> std::fmt::Debug for DataFrameValue<'_, R, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFrameValue")
            .field("row", self.row_key())
            .field("col", self.col_key())
            .field("value", &self.get_value())
            .finish()
    }
}

/// one writable cell, as seen by [`DataFrame::for_each_value_mut`]
pub struct DataFrameValueMut<'a, R: Key, C: Key> {
    frame: &'a mut DataFrame<R, C>,
    row: usize,
    col: usize,
}

macro_rules! typed_value_mut_impl {
    ($t:ty, $get:ident, $set:ident) => {
        pub fn $get(&self) -> TableResult<$t> {
            self.get()
        }

        pub fn $set(&mut self, value: $t) -> TableResult<()> {
            self.set(value)
        }
    };
}

impl<R: Key, C: Key> DataFrameValueMut<'_, R, C> {
    pub fn row_key(&self) -> &R {
        &self.frame.rows.keys()[self.row]
    }

    pub fn col_key(&self) -> &C {
        &self.frame.cols.keys()[self.col]
    }

    pub fn row_ordinal(&self) -> usize {
        self.row
    }

    pub fn col_ordinal(&self) -> usize {
        self.col
    }

    pub fn kind(&self) -> ElementKind {
        self.frame.data[self.col].kind()
    }

    pub fn get<T: Element>(&self) -> TableResult<T> {
        self.frame.get_at(self.row, self.col)
    }

    /// an exact-kind write, fails with `TypeMismatch` like [`DataFrame::set_at`]
    pub fn set<T: Element>(&mut self, value: T) -> TableResult<()> {
        self.frame.set_at(self.row, self.col, value)
    }

    typed_value_mut_impl!(bool, get_boolean, set_boolean);
    typed_value_mut_impl!(i32, get_int, set_int);
    typed_value_mut_impl!(i64, get_long, set_long);
    typed_value_mut_impl!(f64, get_double, set_double);

    pub fn get_value(&self) -> Value {
        self.frame.data[self.col].get_value(self.row)
    }

    /// writes any value, widening or promoting the column as needed
    pub fn set_value(&mut self, value: impl Into<Value>) -> TableResult<()> {
        self.frame.set_value_at(self.row, self.col, value)
    }

    pub fn is_null(&self) -> bool {
        self.frame.data[self.col].is_null(self.row)
    }
}

impl<R: Key, C: Key> DataFrame<R, C> {
    pub(crate) fn ensure_kind(&self, op: &'static str, kind: ElementKind) -> TableResult<()> {
        match self.data.iter().position(|a| a.kind() != kind) {
            None => Ok(()),
            Some(j) => Err(TableError::TypeMismatch {
                op,
                column: format!("{:?}", self.cols.keys()[j]),
                expected: kind,
                found: self.data[j].kind(),
            }),
        }
    }

    /// evaluates `f` on every cell and returns the results grouped per column
    ///
    /// sequential mode walks row-major, parallel mode fans columns out over the pool.
    fn compute<T, F>(&self, f: &F) -> TableResult<Vec<Vec<T>>>
    where
        T: Send,
        F: Fn(&DataFrameValue<R, C>) -> TableResult<T> + Sync + Send,
    {
        let (nrows, ncols) = self.shape();
        if self.is_parallel() {
            return self.parallelism.maybe_par_try_map(0..ncols, |j| {
                (0..nrows)
                    .map(|i| f(&DataFrameValue::new(self, i, j)))
                    .collect()
            });
        }
        let mut buffers: Vec<Vec<T>> = (0..ncols).map(|_| Vec::with_capacity(nrows)).collect();
        for i in 0..nrows {
            for (j, buffer) in buffers.iter_mut().enumerate() {
                buffer.push(f(&DataFrameValue::new(self, i, j))?);
            }
        }
        Ok(buffers)
    }

    /// replaces every cell with `f`'s result, every column must already be of kind `T`
    ///
    /// visitors observe the table as it was before the call, and nothing is written
    /// unless every cell succeeded.
    pub fn apply<T, F>(&mut self, f: F) -> TableResult<()>
    where
        T: Element,
        F: Fn(&DataFrameValue<R, C>) -> TableResult<T> + Sync + Send,
    {
        self.ensure_kind("apply", T::KIND)?;
        let buffers = self.compute(&f)?;
        self.data
            .iter_mut()
            .zip(buffers)
            .for_each(|(array, buffer)| *array = T::wrap(buffer));
        Ok(())
    }

    pub fn apply_booleans<F>(&mut self, f: F) -> TableResult<()>
    where
        F: Fn(&DataFrameValue<R, C>) -> TableResult<bool> + Sync + Send,
    {
        self.apply(f)
    }

    pub fn apply_ints<F>(&mut self, f: F) -> TableResult<()>
    where
        F: Fn(&DataFrameValue<R, C>) -> TableResult<i32> + Sync + Send,
    {
        self.apply(f)
    }

    pub fn apply_longs<F>(&mut self, f: F) -> TableResult<()>
    where
        F: Fn(&DataFrameValue<R, C>) -> TableResult<i64> + Sync + Send,
    {
        self.apply(f)
    }

    pub fn apply_doubles<F>(&mut self, f: F) -> TableResult<()>
    where
        F: Fn(&DataFrameValue<R, C>) -> TableResult<f64> + Sync + Send,
    {
        self.apply(f)
    }

    /// like [`DataFrame::apply`] for boxed values, columns widen or promote as needed
    pub fn apply_values<F>(&mut self, f: F) -> TableResult<()>
    where
        F: Fn(&DataFrameValue<R, C>) -> TableResult<Value> + Sync + Send,
    {
        let buffers = self.compute(&f)?;
        for (j, buffer) in buffers.into_iter().enumerate() {
            let array = &mut self.data[j];
            let promoted = buffer
                .into_iter()
                .enumerate()
                .fold(false, |acc, (i, v)| array.set_value(i, v) | acc);
            if promoted {
                log::debug!("apply_values promoted column {:?}", self.cols.keys()[j]);
            }
        }
        Ok(())
    }

    pub fn for_each_value<F>(&self, f: F)
    where
        F: Fn(&DataFrameValue<R, C>) + Sync + Send,
    {
        let (nrows, ncols) = self.shape();
        if self.is_parallel() {
            self.parallelism.maybe_par_for_each(0..ncols, |j| {
                (0..nrows).for_each(|i| f(&DataFrameValue::new(self, i, j)))
            });
        } else {
            for i in 0..nrows {
                for j in 0..ncols {
                    f(&DataFrameValue::new(self, i, j));
                }
            }
        }
    }

    /// visits every cell row-major with write access, stopping at the first error
    ///
    /// writes land immediately, so later cells observe earlier writes and a failed
    /// visit keeps whatever was written before it.
    pub fn for_each_value_mut<F>(&mut self, mut f: F) -> TableResult<()>
    where
        F: FnMut(&mut DataFrameValueMut<R, C>) -> TableResult<()>,
    {
        let (nrows, ncols) = self.shape();
        for row in 0..nrows {
            for col in 0..ncols {
                f(&mut DataFrameValueMut {
                    frame: &mut *self,
                    row,
                    col,
                })?;
            }
        }
        Ok(())
    }

    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&DataFrameValue<R, C>) -> bool + Sync + Send,
    {
        let nrows = self.row_count();
        self.parallelism
            .maybe_par_map(0..self.col_count(), |j| {
                (0..nrows)
                    .filter(|&i| predicate(&DataFrameValue::new(self, i, j)))
                    .count()
            })
            .into_iter()
            .sum()
    }

    /// the best non-null cell matching `predicate`, ties resolved in row-major order
    fn extreme<F>(
        &self,
        op: &'static str,
        wanted: Ordering,
        predicate: &F,
    ) -> TableResult<Option<DataFrameValue<'_, R, C>>>
    where
        F: Fn(&DataFrameValue<R, C>) -> bool + Sync + Send,
    {
        let better = |a: &DataFrameValue<R, C>, b: &DataFrameValue<R, C>| -> TableResult<bool> {
            let (va, vb) = (a.get_value(), b.get_value());
            match va.try_cmp(&vb) {
                Some(Ordering::Equal) => Ok((a.row, a.col) < (b.row, b.col)),
                Some(ord) => Ok(ord == wanted),
                None => Err(TableError::NotComparable {
                    op,
                    column: format!("{:?}", a.col_key()),
                    left: format!("{va:?}"),
                    right: format!("{vb:?}"),
                }),
            }
        };
        let nrows = self.row_count();
        let per_column = self.parallelism.maybe_par_try_map(0..self.col_count(), |j| {
            let mut best: Option<DataFrameValue<R, C>> = None;
            for i in 0..nrows {
                let cell = DataFrameValue::new(self, i, j);
                if cell.is_null() || !predicate(&cell) {
                    continue;
                }
                best = match best {
                    Some(current) if !better(&cell, &current)? => Some(current),
                    _ => Some(cell),
                };
            }
            Ok(best)
        })?;
        let mut best: Option<DataFrameValue<R, C>> = None;
        for cell in per_column.into_iter().flatten() {
            best = match best {
                Some(current) if !better(&cell, &current)? => Some(current),
                _ => Some(cell),
            };
        }
        Ok(best)
    }

    pub fn min_value<F>(&self, predicate: F) -> TableResult<Option<DataFrameValue<'_, R, C>>>
    where
        F: Fn(&DataFrameValue<R, C>) -> bool + Sync + Send,
    {
        self.extreme("min_value", Ordering::Less, &predicate)
    }

    pub fn max_value<F>(&self, predicate: F) -> TableResult<Option<DataFrameValue<'_, R, C>>>
    where
        F: Fn(&DataFrameValue<R, C>) -> bool + Sync + Send,
    {
        self.extreme("max_value", Ordering::Greater, &predicate)
    }

    /// `(min, max)` over the non-null cells matching `predicate`
    pub fn bounds<F>(&self, predicate: F) -> TableResult<Option<(Value, Value)>>
    where
        F: Fn(&DataFrameValue<R, C>) -> bool + Sync + Send,
    {
        let min = self.extreme("bounds", Ordering::Less, &predicate)?;
        let max = self.extreme("bounds", Ordering::Greater, &predicate)?;
        Ok(min.zip(max).map(|(a, b)| (a.get_value(), b.get_value())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{array::Array, toolkit::parallel::Parallelism};

    fn frame(parallelism: Parallelism) -> DataFrame<i32, &'static str> {
        let mut frame = DataFrame::from_columns(
            0..3,
            [
                ("a", Array::Double(vec![1., 2., 3.])),
                ("b", Array::Double(vec![4., f64::NAN, 6.])),
            ],
        )
        .unwrap();
        frame.set_parallelism(parallelism);
        frame
    }

    #[test]
    fn test_apply_doubles() {
        for parallelism in [Parallelism::Sequential, Parallelism::Parallel] {
            let mut frame = frame(parallelism);
            frame
                .apply_doubles(|v| Ok(v.get_double()? * 10. + v.row_ordinal() as f64))
                .unwrap();
            assert_eq!(frame.get_double(&2, &"a").unwrap(), 32.);
            assert_eq!(frame.get_double(&0, &"b").unwrap(), 40.);
            assert!(frame.get_double(&1, &"b").unwrap().is_nan());
        }
    }

    #[test]
    fn test_apply_sees_snapshot_and_is_atomic() {
        let mut frame = frame(Parallelism::Sequential);
        // every cell reads its upper neighbour, which must still hold the old value
        frame
            .apply_doubles(|v| {
                let i = v.row_ordinal().saturating_sub(1);
                v.frame().get_double_at(i, v.col_ordinal())
            })
            .unwrap();
        assert_eq!(frame.get_double(&2, &"a").unwrap(), 2.);

        let before = frame.copy();
        let failed = frame.apply_doubles(|v| {
            if v.row_ordinal() == 2 {
                Err(TableError::invalid_argument("test", "boom"))
            } else {
                Ok(0.)
            }
        });
        assert!(failed.is_err());
        assert_eq!(frame.column(&"a").unwrap(), before.column(&"a").unwrap());
    }

    #[test]
    fn test_apply_rejects_wrong_kind() {
        let mut frame = frame(Parallelism::Sequential);
        assert!(matches!(
            frame.apply_ints(|_| Ok(1)),
            Err(TableError::TypeMismatch { .. })
        ));
        frame.apply_values(|v| Ok(Value::from(v.row_key().to_string()))).unwrap();
        assert_eq!(frame.kind(&"a").unwrap(), ElementKind::Object);
        assert_eq!(frame.get_value(&1, &"b").unwrap(), Value::from("1"));
    }

    #[test]
    fn test_reductions() {
        for parallelism in [Parallelism::Sequential, Parallelism::Parallel] {
            let frame = frame(parallelism);
            assert_eq!(frame.count(|v| v.is_null()), 1);
            let min = frame.min_value(|_| true).unwrap().unwrap();
            assert_eq!((min.row_ordinal(), min.col_ordinal()), (0, 0));
            let max = frame.max_value(|v| *v.col_key() == "a").unwrap().unwrap();
            assert_eq!(max.get_double().unwrap(), 3.);
            assert_eq!(
                frame.bounds(|_| true).unwrap(),
                Some((Value::Double(1.), Value::Double(6.)))
            );
            assert!(frame.min_value(|_| false).unwrap().is_none());
        }
    }

    #[test]
    fn test_reduction_names_incomparable_column() {
        let mut frame = frame(Parallelism::Sequential);
        frame.set_value(&2, &"b", "x").unwrap();
        assert!(matches!(
            frame.max_value(|_| true),
            Err(TableError::NotComparable { ref column, .. }) if column == "\"b\""
        ));
    }

    #[test]
    fn test_for_each_value_mut() {
        let mut frame = frame(Parallelism::Sequential);
        let mut visited = Vec::new();
        frame
            .for_each_value_mut(|v| {
                visited.push((*v.row_key(), *v.col_key()));
                if v.is_null() {
                    return v.set_double(0.);
                }
                let doubled = v.get_double()? * 2.;
                v.set_double(doubled)
            })
            .unwrap();
        assert_eq!(visited[..3], [(0, "a"), (0, "b"), (1, "a")]);
        assert_eq!(frame.get_double(&2, &"a").unwrap(), 6.);
        assert_eq!(frame.get_double(&1, &"b").unwrap(), 0.);

        assert!(matches!(
            frame.for_each_value_mut(|v| v.set_int(1)),
            Err(TableError::TypeMismatch { .. })
        ));
        frame
            .for_each_value_mut(|v| {
                if v.row_ordinal() == 0 && *v.col_key() == "a" {
                    v.set_value("first")?;
                }
                Ok(())
            })
            .unwrap();
        assert_eq!(frame.kind(&"a").unwrap(), ElementKind::Object);
        assert_eq!(frame.get_value(&0, &"a").unwrap(), Value::from("first"));
        assert_eq!(frame.get_value(&1, &"a").unwrap(), Value::Double(4.));
    }
}
