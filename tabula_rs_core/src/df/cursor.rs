use std::{
    marker::PhantomData,
    ops::{Deref, DerefMut},
};

use super::{frame::DataFrame, Key};
use crate::{
    array::{Element, Value},
    error::TableResult,
};

/// a movable pointer at one cell of a table
///
/// repositioning never allocates or checks bounds, out-of-range coordinates are reported
/// by the next read or write. `Cursor`s over `&mut DataFrame` can also write.
pub struct Cursor<R: Key, C: Key, F: Deref<Target = DataFrame<R, C>>> {
    frame: F,
    row: usize,
    col: usize,
    _keys: PhantomData<(R, C)>,
}

impl<R: Key, C: Key> DataFrame<R, C> {
    pub fn cursor(&self) -> Cursor<R, C, &Self> {
        Cursor::new(self)
    }

    pub fn cursor_mut(&mut self) -> Cursor<R, C, &mut Self> {
        Cursor::new(self)
    }
}

macro_rules! typed_read_impl {
    ($($ty:ty => $name:ident),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(&self) -> TableResult<$ty> {
                self.get::<$ty>()
            }
        )*
    };
}

macro_rules! typed_write_impl {
    ($($ty:ty => $name:ident),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(&mut self, value: $ty) -> TableResult<&mut Self> {
                self.set::<$ty>(value)
            }
        )*
    };
}

impl<R: Key, C: Key, F: Deref<Target = DataFrame<R, C>>> Cursor<R, C, F> {
    fn new(frame: F) -> Self {
        Self {
            frame,
            row: 0,
            col: 0,
            _keys: PhantomData,
        }
    }

    pub fn row_ordinal(&self) -> usize {
        self.row
    }

    pub fn col_ordinal(&self) -> usize {
        self.col
    }

    pub fn row_key(&self) -> Option<&R> {
        self.frame.rows.key(self.row)
    }

    pub fn col_key(&self) -> Option<&C> {
        self.frame.cols.key(self.col)
    }

    pub fn row_at(&mut self, i: usize) -> &mut Self {
        self.row = i;
        self
    }

    pub fn col_at(&mut self, j: usize) -> &mut Self {
        self.col = j;
        self
    }

    pub fn at(&mut self, i: usize, j: usize) -> &mut Self {
        self.row = i;
        self.col = j;
        self
    }

    pub fn to_row(&mut self, key: &R) -> TableResult<&mut Self> {
        self.row = self.frame.rows.ordinal_or_fail("cursor", key)?;
        Ok(self)
    }

    pub fn to_col(&mut self, key: &C) -> TableResult<&mut Self> {
        self.col = self.frame.cols.ordinal_or_fail("cursor", key)?;
        Ok(self)
    }

    pub fn to(&mut self, row: &R, col: &C) -> TableResult<&mut Self> {
        let (i, j) = self.frame.locate("cursor", row, col)?;
        Ok(self.at(i, j))
    }

    pub fn get<T: Element>(&self) -> TableResult<T> {
        self.frame.get_at(self.row, self.col)
    }

    typed_read_impl!(
        bool => get_boolean,
        i32 => get_int,
        i64 => get_long,
        f64 => get_double,
    );

    pub fn get_value(&self) -> TableResult<Value> {
        self.frame.get_value_at(self.row, self.col)
    }

    pub fn is_null(&self) -> TableResult<bool> {
        self.frame.is_null_at(self.row, self.col)
    }
}

impl<R: Key, C: Key, F: DerefMut<Target = DataFrame<R, C>>> Cursor<R, C, F> {
    pub fn set<T: Element>(&mut self, value: T) -> TableResult<&mut Self> {
        self.frame.set_at(self.row, self.col, value)?;
        Ok(self)
    }

    typed_write_impl!(
        bool => set_boolean,
        i32 => set_int,
        i64 => set_long,
        f64 => set_double,
    );

    pub fn set_value(&mut self, value: impl Into<Value>) -> TableResult<&mut Self> {
        self.frame.set_value_at(self.row, self.col, value)?;
        Ok(self)
    }
}
