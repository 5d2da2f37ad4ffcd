//! # array
//!
//! typed, contiguous column storage with a null sentinel per element kind
//!
//! every column of a [`crate::df::DataFrame`] is an [`Array`]. primitive kinds are stored
//! unboxed so numeric access never allocates; [`Value`] is the boxed form used at the
//! edges (object columns, generic reads and writes, grouping keys).
//!
//! nulls are modelled explicitly as [`Value::Null`] and only translated to a sentinel at
//! this storage boundary:
//! - `Int`: [`NULL_INT`] (`i32::MIN`)
//! - `Long`: [`NULL_LONG`] (`i64::MIN`)
//! - `Double`: `NaN`
//! - `Object`: [`Value::Null`]
//! - `Boolean`: no null, defaults to `false`
//!
//! > a legitimate `i32::MIN` / `i64::MIN` cannot be told apart from a null, and reads as one.

use std::{cmp::Ordering, fmt, hash, sync::Arc};

use ordered_float::OrderedFloat;

use crate::error::KindError;

pub const NULL_INT: i32 = i32::MIN;
pub const NULL_LONG: i64 = i64::MIN;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Boolean,
    Int,
    Long,
    Double,
    Object,
}

impl ElementKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, ElementKind::Int | ElementKind::Long | ElementKind::Double)
    }

    pub fn is_integer(self) -> bool {
        matches!(self, ElementKind::Int | ElementKind::Long)
    }

    /// the null sentinel of this kind, in boxed form
    pub fn default_value(self) -> Value {
        match self {
            ElementKind::Boolean => Value::Boolean(false),
            _ => Value::Null,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Boolean => "boolean",
            ElementKind::Int => "int",
            ElementKind::Long => "long",
            ElementKind::Double => "double",
            ElementKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// a boxed cell value
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Str(Arc<str>),
}

impl Value {
    /// the kind this value naturally belongs to, `None` for [`Value::Null`]
    pub fn kind(&self) -> Option<ElementKind> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(ElementKind::Boolean),
            Value::Int(_) => Some(ElementKind::Int),
            Value::Long(_) => Some(ElementKind::Long),
            Value::Double(_) => Some(ElementKind::Double),
            Value::Str(_) => Some(ElementKind::Object),
        }
    }

    /// true for [`Value::Null`] and for a `NaN` double
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Double(v) => v.is_nan(),
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Long(_) | Value::Double(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Long(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// natural ordering between two non-null values, `None` if they are not comparable
    ///
    /// numbers compare numerically across int/long/double, strings and booleans compare
    /// with their own kind only.
    pub fn try_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Long(a), Value::Long(b)) => Some(a.cmp(b)),
            (Value::Int(_) | Value::Long(_), Value::Int(_) | Value::Long(_)) => {
                Some(self.as_i64()?.cmp(&other.as_i64()?))
            }
            (a, b) if a.is_numeric() && b.is_numeric() => {
                Some(a.as_f64()?.total_cmp(&b.as_f64()?))
            }
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v as i64),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    fn hash_key(&self) -> (u8, i64, OrderedFloat<f64>, Option<&str>) {
        match self {
            Value::Null => (0, 0, OrderedFloat(0.), None),
            Value::Boolean(v) => (1, *v as i64, OrderedFloat(0.), None),
            Value::Int(v) => (2, *v as i64, OrderedFloat(0.), None),
            Value::Long(v) => (3, *v, OrderedFloat(0.), None),
            Value::Double(v) => (4, 0, OrderedFloat(*v), None),
            Value::Str(v) => (5, 0, OrderedFloat(0.), Some(v)),
        }
    }
}

// doubles compare through `OrderedFloat`, so two NaNs are equal and a NaN never equals a number
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.hash_key() == other.hash_key()
    }
}
impl Eq for Value {}
impl hash::Hash for Value {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.hash_key().hash(state)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
        }
    }
}

macro_rules! value_from_impl {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v.into())
            }
        }
    };
}

value_from_impl!(bool, Boolean);
value_from_impl!(i32, Int);
value_from_impl!(i64, Long);
value_from_impl!(f64, Double);
value_from_impl!(&str, Str);
value_from_impl!(String, Str);
value_from_impl!(Arc<str>, Str);

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// a column of values, stored contiguously per element kind
#[derive(Clone, Debug, PartialEq)]
pub enum Array {
    Boolean(Vec<bool>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Double(Vec<f64>),
    Object(Vec<Value>),
}

#[inline]
fn mismatch(expected: ElementKind, found: ElementKind) -> KindError {
    KindError { expected, found }
}

#[inline]
fn int_to_value(v: i32) -> Value {
    if v == NULL_INT {
        Value::Null
    } else {
        Value::Int(v)
    }
}

#[inline]
fn long_to_value(v: i64) -> Value {
    if v == NULL_LONG {
        Value::Null
    } else {
        Value::Long(v)
    }
}

#[inline]
fn next_capacity_tier(len: usize) -> usize {
    len.checked_next_power_of_two().unwrap_or(len)
}

impl Array {
    /// an array of `len` null sentinels of the given kind
    pub fn of_kind(kind: ElementKind, len: usize) -> Self {
        match kind {
            ElementKind::Boolean => Array::Boolean(vec![false; len]),
            ElementKind::Int => Array::Int(vec![NULL_INT; len]),
            ElementKind::Long => Array::Long(vec![NULL_LONG; len]),
            ElementKind::Double => Array::Double(vec![f64::NAN; len]),
            ElementKind::Object => Array::Object(vec![Value::Null; len]),
        }
    }

    /// builds the narrowest array able to hold every value without loss
    pub fn from_values(values: Vec<Value>) -> Self {
        let kind = values
            .iter()
            .filter_map(Value::kind)
            .reduce(|a, b| if a == b { a } else { widest_of(a, b) })
            .unwrap_or(ElementKind::Object);
        let mut array = Array::of_kind(kind, values.len());
        for (i, v) in values.into_iter().enumerate() {
            array.set_value(i, v);
        }
        array
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Array::Boolean(_) => ElementKind::Boolean,
            Array::Int(_) => ElementKind::Int,
            Array::Long(_) => ElementKind::Long,
            Array::Double(_) => ElementKind::Double,
            Array::Object(_) => ElementKind::Object,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Array::Boolean(v) => v.len(),
            Array::Int(v) => v.len(),
            Array::Long(v) => v.len(),
            Array::Double(v) => v.len(),
            Array::Object(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn default_value(&self) -> Value {
        self.kind().default_value()
    }

    // reads

    pub fn get_boolean(&self, i: usize) -> Result<bool, KindError> {
        match self {
            Array::Boolean(v) => Ok(v[i]),
            Array::Object(v) => match &v[i] {
                Value::Boolean(b) => Ok(*b),
                _ => Err(mismatch(ElementKind::Boolean, ElementKind::Object)),
            },
            other => Err(mismatch(ElementKind::Boolean, other.kind())),
        }
    }

    pub fn get_int(&self, i: usize) -> Result<i32, KindError> {
        match self {
            Array::Int(v) => Ok(v[i]),
            Array::Object(v) => match &v[i] {
                Value::Int(x) => Ok(*x),
                Value::Null => Ok(NULL_INT),
                _ => Err(mismatch(ElementKind::Int, ElementKind::Object)),
            },
            other => Err(mismatch(ElementKind::Int, other.kind())),
        }
    }

    /// reads a long, widening from int storage
    pub fn get_long(&self, i: usize) -> Result<i64, KindError> {
        match self {
            Array::Long(v) => Ok(v[i]),
            Array::Int(v) => Ok(if v[i] == NULL_INT {
                NULL_LONG
            } else {
                v[i] as i64
            }),
            Array::Object(v) => match &v[i] {
                Value::Long(x) => Ok(*x),
                Value::Int(x) => Ok(*x as i64),
                Value::Null => Ok(NULL_LONG),
                _ => Err(mismatch(ElementKind::Long, ElementKind::Object)),
            },
            other => Err(mismatch(ElementKind::Long, other.kind())),
        }
    }

    /// reads a double, widening from int / long storage (nulls read as `NaN`)
    pub fn get_double(&self, i: usize) -> Result<f64, KindError> {
        match self {
            Array::Double(v) => Ok(v[i]),
            Array::Int(v) => Ok(if v[i] == NULL_INT {
                f64::NAN
            } else {
                v[i] as f64
            }),
            Array::Long(v) => Ok(if v[i] == NULL_LONG {
                f64::NAN
            } else {
                v[i] as f64
            }),
            Array::Object(v) => match &v[i] {
                Value::Null => Ok(f64::NAN),
                value => value
                    .as_f64()
                    .ok_or(mismatch(ElementKind::Double, ElementKind::Object)),
            },
            Array::Boolean(_) => Err(mismatch(ElementKind::Double, ElementKind::Boolean)),
        }
    }

    pub fn get_value(&self, i: usize) -> Value {
        match self {
            Array::Boolean(v) => Value::Boolean(v[i]),
            Array::Int(v) => int_to_value(v[i]),
            Array::Long(v) => long_to_value(v[i]),
            Array::Double(v) => Value::Double(v[i]),
            Array::Object(v) => v[i].clone(),
        }
    }

    pub fn is_null(&self, i: usize) -> bool {
        match self {
            Array::Boolean(_) => false,
            Array::Int(v) => v[i] == NULL_INT,
            Array::Long(v) => v[i] == NULL_LONG,
            Array::Double(v) => v[i].is_nan(),
            Array::Object(v) => v[i].is_null(),
        }
    }

    // writes

    pub fn set_boolean(&mut self, i: usize, value: bool) -> Result<(), KindError> {
        match self {
            Array::Boolean(v) => {
                v[i] = value;
                Ok(())
            }
            other => Err(mismatch(ElementKind::Boolean, other.kind())),
        }
    }

    pub fn set_int(&mut self, i: usize, value: i32) -> Result<(), KindError> {
        match self {
            Array::Int(v) => {
                v[i] = value;
                Ok(())
            }
            other => Err(mismatch(ElementKind::Int, other.kind())),
        }
    }

    pub fn set_long(&mut self, i: usize, value: i64) -> Result<(), KindError> {
        match self {
            Array::Long(v) => {
                v[i] = value;
                Ok(())
            }
            other => Err(mismatch(ElementKind::Long, other.kind())),
        }
    }

    pub fn set_double(&mut self, i: usize, value: f64) -> Result<(), KindError> {
        match self {
            Array::Double(v) => {
                v[i] = value;
                Ok(())
            }
            other => Err(mismatch(ElementKind::Double, other.kind())),
        }
    }

    /// stores a boxed value, promoting the whole array to `Object` if the value does not
    /// fit the declared kind without loss
    ///
    /// returns `true` if a promotion happened.
    pub fn set_value(&mut self, i: usize, value: Value) -> bool {
        match (&mut *self, value) {
            (Array::Object(v), value) => v[i] = value,
            (Array::Boolean(v), Value::Boolean(x)) => v[i] = x,
            (Array::Int(v), Value::Int(x)) => v[i] = x,
            (Array::Int(v), Value::Null) => v[i] = NULL_INT,
            (Array::Long(v), Value::Long(x)) => v[i] = x,
            (Array::Long(v), Value::Int(x)) => v[i] = x as i64,
            (Array::Long(v), Value::Null) => v[i] = NULL_LONG,
            (Array::Double(v), Value::Double(x)) => v[i] = x,
            (Array::Double(v), Value::Int(x)) => v[i] = x as f64,
            (Array::Double(v), Value::Long(x)) => v[i] = x as f64,
            (Array::Double(v), Value::Null) => v[i] = f64::NAN,
            (_, value) => {
                self.promote_to_object();
                if let Array::Object(v) = self {
                    v[i] = value;
                }
                return true;
            }
        }
        false
    }

    /// boxes every element, turning this array into an `Object` array
    pub fn promote_to_object(&mut self) {
        if let Array::Object(_) = self {
            return;
        }
        let values = (0..self.len()).map(|i| self.get_value(i)).collect();
        *self = Array::Object(values);
    }

    /// converts int / long storage to double storage, keeping nulls as `NaN`
    ///
    /// returns `false` (and leaves the array untouched) for non-numeric kinds.
    pub fn widen_to_double(&mut self) -> bool {
        let widened: Vec<f64> = match self {
            Array::Double(_) => return true,
            Array::Int(_) | Array::Long(_) => (0..self.len())
                .map(|i| self.get_double(i).unwrap_or(f64::NAN))
                .collect(),
            _ => return false,
        };
        *self = Array::Double(widened);
        true
    }

    // structure

    /// grows (or shrinks) the array to `len`, filling new slots with the null sentinel
    pub fn resize(&mut self, len: usize) {
        let current = self.len();
        if len > current {
            let additional = next_capacity_tier(len) - current;
            match self {
                Array::Boolean(v) => v.reserve(additional),
                Array::Int(v) => v.reserve(additional),
                Array::Long(v) => v.reserve(additional),
                Array::Double(v) => v.reserve(additional),
                Array::Object(v) => v.reserve(additional),
            }
        }
        match self {
            Array::Boolean(v) => v.resize(len, false),
            Array::Int(v) => v.resize(len, NULL_INT),
            Array::Long(v) => v.resize(len, NULL_LONG),
            Array::Double(v) => v.resize(len, f64::NAN),
            Array::Object(v) => v.resize(len, Value::Null),
        }
    }

    /// gathers the given ordinals into a new, densified array
    pub fn take(&self, ordinals: &[usize]) -> Array {
        match self {
            Array::Boolean(v) => Array::Boolean(ordinals.iter().map(|&i| v[i]).collect()),
            Array::Int(v) => Array::Int(ordinals.iter().map(|&i| v[i]).collect()),
            Array::Long(v) => Array::Long(ordinals.iter().map(|&i| v[i]).collect()),
            Array::Double(v) => Array::Double(ordinals.iter().map(|&i| v[i]).collect()),
            Array::Object(v) => Array::Object(ordinals.iter().map(|&i| v[i].clone()).collect()),
        }
    }

    /// reorders in place so that slot `k` holds the element previously at `ordinals[k]`
    pub fn permute(&mut self, ordinals: &[usize]) {
        debug_assert_eq!(ordinals.len(), self.len());
        *self = self.take(ordinals);
    }

    /// every element as a double, or a kind error for non-numeric storage
    pub fn to_doubles(&self) -> Result<Vec<f64>, KindError> {
        match self {
            Array::Double(v) => Ok(v.clone()),
            _ => (0..self.len()).map(|i| self.get_double(i)).collect(),
        }
    }

    #[inline(always)]
    pub fn as_double_slice(&self) -> Option<&[f64]> {
        match self {
            Array::Double(v) => Some(v),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_double_slice_mut(&mut self) -> Option<&mut [f64]> {
        match self {
            Array::Double(v) => Some(v),
            _ => None,
        }
    }
}

/// an unboxed element type with its own [`Array`] variant
pub trait Element: Copy + Send + Sync + 'static {
    const KIND: ElementKind;

    /// reads with the widening rules of the matching `get_*` method
    fn read(array: &Array, i: usize) -> Result<Self, KindError>;
    fn storage_mut(array: &mut Array) -> Option<&mut Vec<Self>>;
    fn wrap(values: Vec<Self>) -> Array;
}

macro_rules! element_impl {
    ($ty:ty, $variant:ident, $getter:ident) => {
        impl Element for $ty {
            const KIND: ElementKind = ElementKind::$variant;

            #[inline]
            fn read(array: &Array, i: usize) -> Result<Self, KindError> {
                array.$getter(i)
            }
            #[inline]
            fn storage_mut(array: &mut Array) -> Option<&mut Vec<Self>> {
                match array {
                    Array::$variant(v) => Some(v),
                    _ => None,
                }
            }
            #[inline]
            fn wrap(values: Vec<Self>) -> Array {
                Array::$variant(values)
            }
        }
    };
}

element_impl!(bool, Boolean, get_boolean);
element_impl!(i32, Int, get_int);
element_impl!(i64, Long, get_long);
element_impl!(f64, Double, get_double);

impl Array {
    #[inline]
    pub fn get<T: Element>(&self, i: usize) -> Result<T, KindError> {
        T::read(self, i)
    }

    /// exact-kind write, see [`Array::set_double`]
    #[inline]
    pub fn set<T: Element>(&mut self, i: usize, value: T) -> Result<(), KindError> {
        let found = self.kind();
        match T::storage_mut(self) {
            Some(v) => {
                v[i] = value;
                Ok(())
            }
            None => Err(mismatch(T::KIND, found)),
        }
    }
}

pub(crate) fn widest_of(a: ElementKind, b: ElementKind) -> ElementKind {
    match (a, b) {
        (x, y) if x == y => x,
        (ElementKind::Int, ElementKind::Long) | (ElementKind::Long, ElementKind::Int) => {
            ElementKind::Long
        }
        (x, y) if x.is_numeric() && y.is_numeric() => ElementKind::Double,
        _ => ElementKind::Object,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_kind_fills_sentinels() {
        let ints = Array::of_kind(ElementKind::Int, 3);
        assert_eq!(ints, Array::Int(vec![NULL_INT; 3]));
        assert!((0..3).all(|i| ints.is_null(i)));
        assert_eq!(ints.get_value(0), Value::Null);

        let doubles = Array::of_kind(ElementKind::Double, 2);
        assert!(doubles.get_double(1).unwrap().is_nan());
        assert_eq!(Array::of_kind(ElementKind::Boolean, 1).get_value(0), Value::Boolean(false));
    }

    #[test]
    fn test_read_widening() {
        let ints = Array::Int(vec![1, NULL_INT, 3]);
        assert_eq!(ints.get_long(0).unwrap(), 1);
        assert_eq!(ints.get_long(1).unwrap(), NULL_LONG);
        assert_eq!(ints.get_double(2).unwrap(), 3.);
        assert!(ints.get_double(1).unwrap().is_nan());

        let longs = Array::Long(vec![7]);
        assert_eq!(longs.get_double(0).unwrap(), 7.);
        assert_eq!(
            longs.get_int(0),
            Err(KindError {
                expected: ElementKind::Int,
                found: ElementKind::Long
            })
        );
    }

    #[test]
    fn test_kind_specific_writes_reject_mismatch() {
        let mut doubles = Array::Double(vec![0.; 2]);
        assert!(doubles.set_int(0, 1).is_err());
        assert!(doubles.set_double(0, 1.5).is_ok());
        let mut ints = Array::Int(vec![0; 2]);
        assert!(ints.set_long(0, 1).is_err());
        assert!(ints.set_double(0, 1.).is_err());
        assert_eq!(ints, Array::Int(vec![0; 2]));
    }

    #[test]
    fn test_set_value_widens_or_promotes() {
        let mut longs = Array::Long(vec![0; 2]);
        assert!(!longs.set_value(0, Value::Int(5)));
        assert_eq!(longs.get_long(0).unwrap(), 5);

        let mut ints = Array::Int(vec![1, 2]);
        assert!(ints.set_value(1, Value::Double(2.5)));
        assert_eq!(ints.kind(), ElementKind::Object);
        assert_eq!(ints.get_value(0), Value::Int(1));
        assert_eq!(ints.get_value(1), Value::Double(2.5));

        let mut doubles = Array::Double(vec![1.]);
        doubles.set_value(0, Value::Null);
        assert!(doubles.is_null(0));
    }

    #[test]
    fn test_resize_fills_new_slots() {
        let mut longs = Array::Long(vec![1]);
        longs.resize(4);
        assert_eq!(longs.len(), 4);
        assert!((1..4).all(|i| longs.is_null(i)));
        if let Array::Long(v) = &longs {
            assert!(v.capacity() >= 4);
        }
    }

    #[test]
    fn test_take_and_permute() {
        let mut array = Array::from_values(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(array.kind(), ElementKind::Object);
        assert_eq!(array.take(&[2, 0]).get_value(0), Value::from("c"));
        array.permute(&[1, 2, 0]);
        assert_eq!(array.get_value(0), Value::from("b"));
        assert_eq!(array.get_value(2), Value::from("a"));
    }

    #[test]
    fn test_from_values_picks_narrowest_kind() {
        assert_eq!(Array::from_values(vec![1.into(), Value::Null]).kind(), ElementKind::Int);
        assert_eq!(Array::from_values(vec![1.into(), 2i64.into()]).kind(), ElementKind::Long);
        assert_eq!(Array::from_values(vec![1.into(), 2.5.into()]).kind(), ElementKind::Double);
        assert_eq!(Array::from_values(vec![1.into(), true.into()]).kind(), ElementKind::Object);
    }

    #[test]
    fn test_value_equality_and_ordering() {
        assert_eq!(Value::Double(f64::NAN), Value::Double(f64::NAN));
        assert_ne!(Value::Double(f64::NAN), Value::Double(1.));
        assert!(Value::Double(f64::NAN).is_null());
        assert_eq!(Value::Int(1).try_cmp(&Value::Double(1.5)), Some(Ordering::Less));
        assert_eq!(Value::Long(3).try_cmp(&Value::Int(2)), Some(Ordering::Greater));
        assert_eq!(Value::from("a").try_cmp(&Value::Int(1)), None);
    }
}
