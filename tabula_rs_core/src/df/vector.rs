use std::{fmt, marker::PhantomData};

use super::{axis::Dimension, frame::DataFrame, stats::Stats, Key};
use crate::{
    array::{Element, ElementKind, Value},
    error::TableResult,
};

/// one row or one column of a table, depending on `D`
pub struct Vector<'a, R: Key, C: Key, D: Dimension<R, C>> {
    frame: &'a DataFrame<R, C>,
    ordinal: usize,
    _dim: PhantomData<D>,
}

impl<R: Key, C: Key, D: Dimension<R, C>> Clone for Vector<'_, R, C, D> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<R: Key, C: Key, D: Dimension<R, C>> Copy for Vector<'_, R, C, D> {}

macro_rules! typed_get_impl {
    ($ty:ty, $get_at:ident, $get:ident) => {
        #[inline]
        pub fn $get_at(&self, other: usize) -> TableResult<$ty> {
            self.get_at::<$ty>(other)
        }
        #[inline]
        pub fn $get(&self, key: &D::Other) -> TableResult<$ty> {
            self.get::<$ty>(key)
        }
    };
}

impl<'a, R: Key, C: Key, D: Dimension<R, C>> Vector<'a, R, C, D> {
    #[inline]
    pub(crate) fn new(frame: &'a DataFrame<R, C>, ordinal: usize) -> Self {
        Self {
            frame,
            ordinal,
            _dim: PhantomData,
        }
    }

    pub fn frame(&self) -> &'a DataFrame<R, C> {
        self.frame
    }

    pub fn key(&self) -> &'a D::Key {
        &D::index(self.frame).keys()[self.ordinal]
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// number of cells, i.e. the length of the other axis
    pub fn size(&self) -> usize {
        D::other_index(self.frame).len()
    }

    pub fn kind(&self) -> ElementKind {
        D::kind(self.frame, self.ordinal)
    }

    pub fn is_numeric(&self) -> bool {
        self.kind().is_numeric()
    }

    #[inline]
    fn cell(&self, other: usize) -> (usize, usize) {
        D::cell(self.ordinal, other)
    }

    fn other_ordinal(&self, key: &D::Other) -> TableResult<usize> {
        D::other_index(self.frame).ordinal_or_fail("vector", key)
    }

    pub fn get_at<T: Element>(&self, other: usize) -> TableResult<T> {
        let (i, j) = self.cell(other);
        self.frame.get_at(i, j)
    }

    pub fn get<T: Element>(&self, key: &D::Other) -> TableResult<T> {
        self.get_at(self.other_ordinal(key)?)
    }

    typed_get_impl!(bool, get_boolean_at, get_boolean);
    typed_get_impl!(i32, get_int_at, get_int);
    typed_get_impl!(i64, get_long_at, get_long);
    typed_get_impl!(f64, get_double_at, get_double);

    pub fn get_value_at(&self, other: usize) -> TableResult<Value> {
        let (i, j) = self.cell(other);
        self.frame.get_value_at(i, j)
    }

    pub fn get_value(&self, key: &D::Other) -> TableResult<Value> {
        self.get_value_at(self.other_ordinal(key)?)
    }

    pub fn is_null_at(&self, other: usize) -> TableResult<bool> {
        let (i, j) = self.cell(other);
        self.frame.is_null_at(i, j)
    }

    /// the cell at `other` without bounds checks beyond slice indexing
    #[inline]
    pub(crate) fn value_unchecked(&self, other: usize) -> Value {
        let (i, j) = self.cell(other);
        self.frame.data[j].get_value(i)
    }

    #[inline]
    pub(crate) fn double_or_nan(&self, other: usize) -> f64 {
        let (i, j) = self.cell(other);
        self.frame.data[j].get_double(i).unwrap_or(f64::NAN)
    }

    pub fn values(&self) -> impl Iterator<Item = Value> + 'a {
        let this = *self;
        (0..self.size()).map(move |o| this.value_unchecked(o))
    }

    /// every cell as a double, non-numeric cells read as `NaN`
    pub fn doubles(&self) -> Vec<f64> {
        (0..self.size()).map(|o| self.double_or_nan(o)).collect()
    }

    pub fn stats(&self) -> Stats {
        Stats::of(&self.doubles())
    }
}

impl<R: Key, C: Key, D: Dimension<R, C>> fmt::Debug for Vector<'_, R, C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vector")
            .field("axis", &D::AXIS)
            .field("key", self.key())
            .field("values", &self.values().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        array::{Array, Value},
        df::DataFrame,
        error::TableError,
    };

    #[test]
    fn test_row_and_col_vectors() {
        let frame = DataFrame::from_columns(
            ["x", "y"],
            [
                (0, Array::Int(vec![1, 2])),
                (1, Array::from_values(vec!["a".into(), "b".into()])),
            ],
        )
        .unwrap();
        let row = frame.rows().vector(&"y").unwrap();
        assert_eq!(row.size(), 2);
        assert_eq!(row.get_long(&0).unwrap(), 2);
        assert_eq!(row.get_value_at(1).unwrap(), Value::from("b"));
        assert!(row.doubles()[1].is_nan());
        assert!(matches!(
            row.get_double_at(1),
            Err(TableError::TypeMismatch { .. })
        ));

        let col = frame.cols().vector(&0).unwrap();
        assert!(col.is_numeric());
        assert_eq!(col.doubles(), vec![1., 2.]);
        assert_eq!(col.key(), &0);
        assert_eq!(col.stats().sum(), 3.);
    }
}
