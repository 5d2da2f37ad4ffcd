//! # algebra
//!
//! elementwise arithmetic between tables or against a scalar, the matrix product and
//! pairwise correlation. every operation works on a copy, operands are never modified.

use std::iter::zip;

use num_traits::ToPrimitive;

use super::{frame::DataFrame, Key};
use crate::{
    array::{widest_of, Array, ElementKind, NULL_INT, NULL_LONG},
    error::{AxisType, TableError, TableResult},
    index::Index,
    toolkit::parallel::fill_bisect,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Op {
    Plus,
    Minus,
    Times,
    Divide,
}

impl Op {
    fn name(self) -> &'static str {
        match self {
            Op::Plus => "plus",
            Op::Minus => "minus",
            Op::Times => "times",
            Op::Divide => "divide",
        }
    }

    /// two's complement wrapping, `None` on division by zero
    ///
    /// a result that wraps onto [`NULL_INT`] reads back as null, the same holds for
    /// [`NULL_LONG`] in [`Op::long`].
    fn int(self, a: i32, b: i32) -> Option<i32> {
        match self {
            Op::Plus => Some(a.wrapping_add(b)),
            Op::Minus => Some(a.wrapping_sub(b)),
            Op::Times => Some(a.wrapping_mul(b)),
            Op::Divide => (b != 0).then(|| a.wrapping_div(b)),
        }
    }

    fn long(self, a: i64, b: i64) -> Option<i64> {
        match self {
            Op::Plus => Some(a.wrapping_add(b)),
            Op::Minus => Some(a.wrapping_sub(b)),
            Op::Times => Some(a.wrapping_mul(b)),
            Op::Divide => (b != 0).then(|| a.wrapping_div(b)),
        }
    }

    fn double(self, a: f64, b: f64) -> f64 {
        match self {
            Op::Plus => a + b,
            Op::Minus => a - b,
            Op::Times => a * b,
            Op::Divide => a / b,
        }
    }

    fn invalid(self, column: &str, reason: &str) -> TableError {
        TableError::ArithmeticInvalid {
            op: self.name(),
            column: column.to_string(),
            reason: reason.to_string(),
        }
    }

    fn division_by_zero(self, column: &str) -> TableError {
        self.invalid(column, "integer division by zero")
    }
}

/// a scalar operand, keeping its integral value when it has one
#[derive(Clone, Copy, Debug)]
struct Scalar {
    integral: Option<i64>,
    double: f64,
}

impl Scalar {
    fn of<N: ToPrimitive>(n: N) -> Result<Self, &'static str> {
        let double = n
            .to_f64()
            .ok_or("scalar is not representable as a double")?;
        let integral = n.to_i64().filter(|&i| i as f64 == double);
        Ok(Self { integral, double })
    }
}

fn ensure_numeric<R: Key, C: Key>(op: &'static str, frame: &DataFrame<R, C>) -> TableResult<()> {
    match frame.data.iter().position(|a| !a.kind().is_numeric()) {
        None => Ok(()),
        Some(j) => Err(TableError::not_numeric(
            op,
            &frame.cols.keys()[j],
            frame.data[j].kind(),
        )),
    }
}

fn combine_columns(op: Op, column: &str, left: &Array, right: &Array) -> TableResult<Array> {
    let n = left.len();
    let result = match (widest_of(left.kind(), right.kind()), left, right) {
        (ElementKind::Int, Array::Int(a), Array::Int(b)) => Array::Int(
            zip(a, b)
                .map(|(&x, &y)| {
                    if x == NULL_INT || y == NULL_INT {
                        Ok(NULL_INT)
                    } else {
                        op.int(x, y).ok_or_else(|| op.division_by_zero(column))
                    }
                })
                .collect::<TableResult<_>>()?,
        ),
        (ElementKind::Long, _, _) => Array::Long(
            (0..n)
                .map(|i| {
                    let (x, y) = (left.get_long(i), right.get_long(i));
                    match (x, y) {
                        (Ok(NULL_LONG), _) | (_, Ok(NULL_LONG)) => Ok(NULL_LONG),
                        (Ok(x), Ok(y)) => op.long(x, y).ok_or_else(|| op.division_by_zero(column)),
                        _ => Ok(NULL_LONG),
                    }
                })
                .collect::<TableResult<_>>()?,
        ),
        _ => Array::Double(
            (0..n)
                .map(|i| {
                    let x = left.get_double(i).unwrap_or(f64::NAN);
                    let y = right.get_double(i).unwrap_or(f64::NAN);
                    op.double(x, y)
                })
                .collect(),
        ),
    };
    Ok(result)
}

fn apply_scalar(op: Op, column: &str, array: &Array, scalar: Scalar) -> TableResult<Array> {
    if op == Op::Divide && scalar.double == 0. {
        return Err(op.invalid(column, "division by a zero scalar"));
    }
    let fits_int = scalar
        .integral
        .and_then(|i| i32::try_from(i).ok())
        .filter(|&i| i != NULL_INT);
    let result = match (array, fits_int, scalar.integral) {
        (Array::Int(a), Some(s), _) => Array::Int(
            a.iter()
                .map(|&x| {
                    if x == NULL_INT {
                        Ok(NULL_INT)
                    } else {
                        op.int(x, s).ok_or_else(|| op.division_by_zero(column))
                    }
                })
                .collect::<TableResult<_>>()?,
        ),
        (Array::Int(_) | Array::Long(_), _, Some(s)) if s != NULL_LONG => Array::Long(
            (0..array.len())
                .map(|i| match array.get_long(i) {
                    Ok(NULL_LONG) | Err(_) => Ok(NULL_LONG),
                    Ok(x) => op.long(x, s).ok_or_else(|| op.division_by_zero(column)),
                })
                .collect::<TableResult<_>>()?,
        ),
        _ => Array::Double(
            (0..array.len())
                .map(|i| op.double(array.get_double(i).unwrap_or(f64::NAN), scalar.double))
                .collect(),
        ),
    };
    Ok(result)
}

macro_rules! elementwise_impl {
    ($($name:ident, $scalar_name:ident => $op:expr;)*) => {
        $(
            pub fn $name(&self, other: &DataFrame<R, C>) -> TableResult<Self> {
                self.combine($op, other)
            }

            pub fn $scalar_name<N: ToPrimitive>(&self, n: N) -> TableResult<Self> {
                self.combine_scalar($op, n)
            }
        )*
    };
}

impl<R: Key, C: Key> DataFrame<R, C> {
    fn with_columns(&self, data: Vec<Array>) -> Self {
        Self {
            rows: self.rows.clone(),
            cols: self.cols.clone(),
            data,
            parallelism: self.parallelism,
        }
    }

    fn combine(&self, op: Op, other: &DataFrame<R, C>) -> TableResult<Self> {
        if self.shape() != other.shape() {
            return Err(TableError::ShapeMismatch {
                op: op.name(),
                left: self.shape(),
                right: other.shape(),
            });
        }
        ensure_numeric(op.name(), self)?;
        ensure_numeric(op.name(), other)?;
        let data = self.parallelism.maybe_par_try_map(0..self.col_count(), |j| {
            let column = format!("{:?}", self.cols.keys()[j]);
            combine_columns(op, &column, &self.data[j], &other.data[j])
        })?;
        Ok(self.with_columns(data))
    }

    fn combine_scalar<N: ToPrimitive>(&self, op: Op, n: N) -> TableResult<Self> {
        let scalar = Scalar::of(n);
        ensure_numeric(op.name(), self)?;
        let data = self.parallelism.maybe_par_try_map(0..self.col_count(), |j| {
            let column = format!("{:?}", self.cols.keys()[j]);
            let scalar = scalar.map_err(|reason| op.invalid(&column, reason))?;
            apply_scalar(op, &column, &self.data[j], scalar)
        })?;
        Ok(self.with_columns(data))
    }

    elementwise_impl! {
        plus, plus_scalar => Op::Plus;
        minus, minus_scalar => Op::Minus;
        times, times_scalar => Op::Times;
        divide, divide_scalar => Op::Divide;
    }

    /// the matrix product `self · right`, as doubles
    ///
    /// result cells are laid out column-major over `0..rows * cols` and computed by
    /// recursive bisection of that range, in parallel when this table is parallel.
    pub fn dot<R2: Key, C2: Key>(&self, right: &DataFrame<R2, C2>) -> TableResult<DataFrame<R, C2>> {
        let (m, k) = self.shape();
        let (k2, n) = right.shape();
        if k != k2 {
            return Err(TableError::ShapeMismatch {
                op: "dot",
                left: (m, k),
                right: (k2, n),
            });
        }
        ensure_numeric("dot", self)?;
        ensure_numeric("dot", right)?;
        let lhs: Vec<Vec<f64>> = self.data.iter().map(doubles_of).collect();
        let rhs: Vec<Vec<f64>> = right.data.iter().map(doubles_of).collect();

        let total = m * n;
        let threshold = self.parallelism.split_threshold(total);
        log::debug!("dot: ({m}, {k}) x ({k2}, {n}), {total} cells, split threshold {threshold}");
        let mut out = vec![0.; total];
        fill_bisect(&mut out, 0, threshold, &|idx| {
            let (row, col) = (idx % m, idx / m);
            let column = &rhs[col];
            (0..k).map(|p| lhs[p][row] * column[p]).sum()
        });
        let data = (0..n)
            .map(|j| Array::Double(out[j * m..(j + 1) * m].to_vec()))
            .collect();
        Ok(DataFrame {
            rows: self.rows.clone(),
            cols: right.cols.clone(),
            data,
            parallelism: self.parallelism,
        })
    }

    /// pairwise correlation of the numeric columns, skipping rows where either side is `NaN`
    pub fn corr(&self) -> DataFrame<C, C> {
        let numeric: Vec<usize> = (0..self.col_count())
            .filter(|&j| self.data[j].kind().is_numeric())
            .collect();
        let columns: Vec<Vec<f64>> = numeric.iter().map(|&j| doubles_of(&self.data[j])).collect();
        let data = self.parallelism.maybe_par_map(0..numeric.len(), |a| {
            Array::Double(
                (0..numeric.len())
                    .map(|b| corr(&columns[a], &columns[b]))
                    .collect(),
            )
        });
        let keys: Vec<C> = numeric.iter().map(|&j| self.cols.keys()[j].clone()).collect();
        DataFrame {
            rows: Index::from_unique(AxisType::Rows, keys.clone()),
            cols: Index::from_unique(AxisType::Cols, keys),
            data,
            parallelism: self.parallelism,
        }
    }
}

#[inline]
fn doubles_of(array: &Array) -> Vec<f64> {
    array.to_doubles().unwrap_or_else(|_| vec![f64::NAN; array.len()])
}

fn corr(a: &[f64], b: &[f64]) -> f64 {
    let valid: Vec<(f64, f64)> = zip(a, b)
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .map(|(&x, &y)| (x, y))
        .collect();
    if valid.is_empty() {
        return f64::NAN;
    }
    let n = valid.len() as f64;
    let a_mean = valid.iter().map(|p| p.0).sum::<f64>() / n;
    let b_mean = valid.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut var1, mut var2) = (0., 0., 0.);
    for (x, y) in valid {
        let (dx, dy) = (x - a_mean, y - b_mean);
        cov += dx * dy;
        var1 += dx * dx;
        var2 += dy * dy;
    }
    cov / (var1.sqrt() * var2.sqrt())
}
