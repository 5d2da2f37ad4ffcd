use super::DataFrame;
use crate::{
    array::{Element, ElementKind, Value},
    df::Key,
    error::TableResult,
};

macro_rules! typed_cells_impl {
    ($ty:ty, $get_at:ident, $get:ident, $set_at:ident, $set:ident) => {
        #[inline]
        pub fn $get_at(&self, i: usize, j: usize) -> TableResult<$ty> {
            self.get_at::<$ty>(i, j)
        }
        #[inline]
        pub fn $get(&self, row: &R, col: &C) -> TableResult<$ty> {
            self.get::<$ty>(row, col)
        }
        #[inline]
        pub fn $set_at(&mut self, i: usize, j: usize, value: $ty) -> TableResult<()> {
            self.set_at::<$ty>(i, j, value)
        }
        #[inline]
        pub fn $set(&mut self, row: &R, col: &C, value: $ty) -> TableResult<()> {
            self.set::<$ty>(row, col, value)
        }
    };
}

impl<R: Key, C: Key> DataFrame<R, C> {
    pub(crate) fn locate(&self, op: &'static str, row: &R, col: &C) -> TableResult<(usize, usize)> {
        Ok((
            self.rows.ordinal_or_fail(op, row)?,
            self.cols.ordinal_or_fail(op, col)?,
        ))
    }

    #[inline]
    pub(crate) fn check(&self, op: &'static str, i: usize, j: usize) -> TableResult<()> {
        self.rows.check_ordinal(op, i)?;
        self.cols.check_ordinal(op, j)?;
        Ok(())
    }

    pub fn get_at<T: Element>(&self, i: usize, j: usize) -> TableResult<T> {
        self.check("get", i, j)?;
        self.data[j]
            .get::<T>(i)
            .map_err(|e| e.at("get", &self.cols.keys()[j]))
    }

    pub fn get<T: Element>(&self, row: &R, col: &C) -> TableResult<T> {
        let (i, j) = self.locate("get", row, col)?;
        self.get_at(i, j)
    }

    /// an exact-kind write, use [`DataFrame::set_value_at`] to widen or box
    pub fn set_at<T: Element>(&mut self, i: usize, j: usize, value: T) -> TableResult<()> {
        self.check("set", i, j)?;
        self.data[j]
            .set::<T>(i, value)
            .map_err(|e| e.at("set", &self.cols.keys()[j]))
    }

    pub fn set<T: Element>(&mut self, row: &R, col: &C, value: T) -> TableResult<()> {
        let (i, j) = self.locate("set", row, col)?;
        self.set_at(i, j, value)
    }

    typed_cells_impl!(bool, get_boolean_at, get_boolean, set_boolean_at, set_boolean);
    typed_cells_impl!(i32, get_int_at, get_int, set_int_at, set_int);
    typed_cells_impl!(i64, get_long_at, get_long, set_long_at, set_long);
    typed_cells_impl!(f64, get_double_at, get_double, set_double_at, set_double);

    pub fn get_value_at(&self, i: usize, j: usize) -> TableResult<Value> {
        self.check("get_value", i, j)?;
        Ok(self.data[j].get_value(i))
    }

    pub fn get_value(&self, row: &R, col: &C) -> TableResult<Value> {
        let (i, j) = self.locate("get_value", row, col)?;
        Ok(self.data[j].get_value(i))
    }

    /// stores any value, promoting the column to `Object` when the value does not fit
    pub fn set_value_at(&mut self, i: usize, j: usize, value: impl Into<Value>) -> TableResult<()> {
        self.check("set_value", i, j)?;
        if self.data[j].set_value(i, value.into()) {
            log::debug!(
                "column {:?} promoted to {}",
                self.cols.keys()[j],
                ElementKind::Object
            );
        }
        Ok(())
    }

    pub fn set_value(&mut self, row: &R, col: &C, value: impl Into<Value>) -> TableResult<()> {
        let (i, j) = self.locate("set_value", row, col)?;
        self.set_value_at(i, j, value)
    }

    pub fn is_null_at(&self, i: usize, j: usize) -> TableResult<bool> {
        self.check("is_null", i, j)?;
        Ok(self.data[j].is_null(i))
    }

    pub fn is_null(&self, row: &R, col: &C) -> TableResult<bool> {
        let (i, j) = self.locate("is_null", row, col)?;
        Ok(self.data[j].is_null(i))
    }

    pub fn kind(&self, col: &C) -> TableResult<ElementKind> {
        self.column(col).map(|a| a.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TableError;

    fn frame() -> DataFrame<&'static str, &'static str> {
        let mut frame = DataFrame::of_ints(["r0", "r1"], ["a"]).unwrap();
        frame.add_column("b", ElementKind::Double).unwrap();
        frame.set_int(&"r0", &"a", 3).unwrap();
        frame.set_double(&"r1", &"b", 1.5).unwrap();
        frame
    }

    #[test]
    fn test_typed_reads_widen() {
        let frame = frame();
        assert_eq!(frame.get_long(&"r0", &"a").unwrap(), 3);
        assert_eq!(frame.get_double_at(0, 0).unwrap(), 3.);
        assert!(frame.get_double(&"r1", &"a").unwrap().is_nan());
        assert!(frame.is_null(&"r1", &"a").unwrap());
        assert!(matches!(
            frame.get_int(&"r1", &"b"),
            Err(TableError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_bad_coordinates() {
        let frame = frame();
        assert!(matches!(
            frame.get_value(&"r9", &"a"),
            Err(TableError::KeyNotFound { .. })
        ));
        assert!(matches!(
            frame.get_value_at(0, 2),
            Err(TableError::OrdinalOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_set_value_promotes() {
        let mut frame = frame();
        assert!(frame.set_long(&"r0", &"a", 1).is_err());
        frame.set_value(&"r0", &"a", "text").unwrap();
        assert_eq!(frame.kind(&"a").unwrap(), ElementKind::Object);
        assert_eq!(frame.get_value(&"r0", &"a").unwrap(), Value::from("text"));
        frame.set_value(&"r0", &"b", 2).unwrap();
        assert_eq!(frame.kind(&"b").unwrap(), ElementKind::Double);
        assert_eq!(frame.get_double(&"r0", &"b").unwrap(), 2.);
    }
}
