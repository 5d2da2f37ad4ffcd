use super::DataFrame;
use crate::{
    array::{Array, ElementKind},
    df::Key,
    error::{AxisType, TableError, TableResult},
    index::Index,
    toolkit::parallel::Parallelism,
};

macro_rules! of_kind_impl {
    ($name:ident, $kind:ident) => {
        #[doc = concat!("a table whose columns are all `", stringify!($kind), "`, filled with nulls")]
        pub fn $name(
            rows: impl IntoIterator<Item = R>,
            cols: impl IntoIterator<Item = C>,
        ) -> TableResult<Self> {
            Self::of_kind(rows, cols, ElementKind::$kind)
        }
    };
}

impl<R: Key, C: Key> DataFrame<R, C> {
    pub fn empty() -> Self {
        Self {
            rows: Index::empty(AxisType::Rows),
            cols: Index::empty(AxisType::Cols),
            data: Vec::new(),
            parallelism: Parallelism::Sequential,
        }
    }

    pub fn of_kind(
        rows: impl IntoIterator<Item = R>,
        cols: impl IntoIterator<Item = C>,
        kind: ElementKind,
    ) -> TableResult<Self> {
        let rows = Index::new(AxisType::Rows, rows)?;
        let cols = Index::new(AxisType::Cols, cols)?;
        let data = (0..cols.len())
            .map(|_| Array::of_kind(kind, rows.len()))
            .collect();
        Ok(Self {
            rows,
            cols,
            data,
            parallelism: Parallelism::Sequential,
        })
    }

    of_kind_impl!(of_booleans, Boolean);
    of_kind_impl!(of_ints, Int);
    of_kind_impl!(of_longs, Long);
    of_kind_impl!(of_doubles, Double);
    of_kind_impl!(of_objects, Object);

    /// a table from ready-made columns, each of which must hold one element per row
    pub fn from_columns(
        rows: impl IntoIterator<Item = R>,
        columns: impl IntoIterator<Item = (C, Array)>,
    ) -> TableResult<Self> {
        let mut frame = Self::empty();
        frame.rows.add_all(rows)?;
        for (key, array) in columns {
            frame.add_column_with(key, array)?;
        }
        Ok(frame)
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn col_count(&self) -> usize {
        self.cols.len()
    }

    /// `(row_count, col_count)`
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.cols.len())
    }

    pub fn row_index(&self) -> &Index<R> {
        &self.rows
    }

    pub fn col_index(&self) -> &Index<C> {
        &self.cols
    }

    pub fn column(&self, key: &C) -> TableResult<&Array> {
        let j = self.cols.ordinal_or_fail("column", key)?;
        Ok(&self.data[j])
    }

    pub fn column_at(&self, j: usize) -> Option<&Array> {
        self.data.get(j)
    }

    /// a deep copy, sharing nothing with `self`
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn parallelism(&self) -> Parallelism {
        self.parallelism
    }

    pub fn is_parallel(&self) -> bool {
        self.parallelism.is_parallel()
    }

    pub fn set_parallelism(&mut self, parallelism: Parallelism) {
        self.parallelism = parallelism;
    }

    pub fn parallel(mut self) -> Self {
        self.parallelism = Parallelism::Parallel;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallelism = Parallelism::Sequential;
        self
    }

    /// appends rows, filling every column with its null sentinel
    pub fn add_rows(&mut self, keys: impl IntoIterator<Item = R>) -> TableResult<usize> {
        let added = self.rows.add_all(keys)?;
        let len = self.rows.len();
        self.data.iter_mut().for_each(|array| array.resize(len));
        Ok(added)
    }

    pub fn add_column(&mut self, key: C, kind: ElementKind) -> TableResult<usize> {
        self.add_column_with(key, Array::of_kind(kind, self.rows.len()))
    }

    pub fn add_column_with(&mut self, key: C, array: Array) -> TableResult<usize> {
        if array.len() != self.rows.len() {
            return Err(TableError::invalid_argument(
                "add_column",
                format!(
                    "column {key:?} holds {} values but the table has {} rows",
                    array.len(),
                    self.rows.len()
                ),
            ));
        }
        let ordinal = self.cols.add(key)?;
        self.data.push(array);
        Ok(ordinal)
    }

    pub(crate) fn take_rows(&self, ordinals: &[usize]) -> Self {
        Self {
            rows: self.rows.take(ordinals),
            cols: self.cols.clone(),
            data: self.data.iter().map(|a| a.take(ordinals)).collect(),
            parallelism: self.parallelism,
        }
    }

    pub(crate) fn take_cols(&self, ordinals: &[usize]) -> Self {
        Self {
            rows: self.rows.clone(),
            cols: self.cols.take(ordinals),
            data: ordinals.iter().map(|&j| self.data[j].clone()).collect(),
            parallelism: self.parallelism,
        }
    }

    pub(crate) fn permute_rows(&mut self, ordinals: &[usize]) {
        self.rows.permute(ordinals);
        self.data.iter_mut().for_each(|a| a.permute(ordinals));
    }

    pub(crate) fn permute_cols(&mut self, ordinals: &[usize]) {
        self.cols.permute(ordinals);
        let mut slots: Vec<Option<Array>> =
            std::mem::take(&mut self.data).into_iter().map(Some).collect();
        self.data = ordinals.iter().filter_map(|&j| slots[j].take()).collect();
    }
}
