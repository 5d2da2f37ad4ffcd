//! # stats
//!
//! summary statistics over samples of doubles, per vector of an axis and over rolling /
//! expanding windows. `NaN` (and therefore every null read as a double) is skipped.

use std::fmt;

use super::{
    axis::{Axis, Dimension},
    frame::DataFrame,
    Key,
};
use itertools::Itertools;

use crate::{
    array::Array,
    error::{AxisType, TableError, TableResult},
    index::Index,
};

/// a statistic, also used as the column key of stats tables
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatType {
    Min,
    Max,
    Sum,
    Mean,
    Count,
    Skewness,
    Kurtosis,
    Variance,
    StdDev,
    Median,
    /// the given percentile, in percent
    Percentile(u8),
}

impl StatType {
    pub const SUMMARY: [StatType; 10] = [
        StatType::Count,
        StatType::Min,
        StatType::Max,
        StatType::Sum,
        StatType::Mean,
        StatType::Median,
        StatType::Variance,
        StatType::StdDev,
        StatType::Skewness,
        StatType::Kurtosis,
    ];
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatType::Min => f.write_str("min"),
            StatType::Max => f.write_str("max"),
            StatType::Sum => f.write_str("sum"),
            StatType::Mean => f.write_str("mean"),
            StatType::Count => f.write_str("count"),
            StatType::Skewness => f.write_str("skew"),
            StatType::Kurtosis => f.write_str("kurtosis"),
            StatType::Variance => f.write_str("variance"),
            StatType::StdDev => f.write_str("std_dev"),
            StatType::Median => f.write_str("median"),
            StatType::Percentile(p) => write!(f, "p{p}"),
        }
    }
}

pub(crate) fn nan_mean(values: &[f64]) -> f64 {
    let mut sum = 0.;
    let mut num = 0.;
    for &x in values {
        if x.is_nan() {
            continue;
        }
        sum += x;
        num += 1.;
    }
    if num == 0. {
        f64::NAN
    } else {
        sum / num
    }
}

/// statistics of one sample, with `NaN`s dropped
///
/// an empty sample has a count of 0 and every other statistic `NaN`.
#[derive(Clone, Debug, Default)]
pub struct Stats {
    values: Vec<f64>,
}

impl Stats {
    pub fn of(values: &[f64]) -> Self {
        Self {
            values: values.iter().copied().filter(|x| !x.is_nan()).collect(),
        }
    }

    #[inline]
    fn n(&self) -> f64 {
        self.values.len() as f64
    }

    /// sum of `(x - mean)^k`
    fn central_moment_sum(&self, k: i32) -> f64 {
        let mean = self.mean();
        self.values.iter().map(|x| (x - mean).powi(k)).sum()
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn min(&self) -> f64 {
        self.values.iter().copied().reduce(f64::min).unwrap_or(f64::NAN)
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().reduce(f64::max).unwrap_or(f64::NAN)
    }

    pub fn sum(&self) -> f64 {
        if self.values.is_empty() {
            return f64::NAN;
        }
        self.values.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        self.sum() / self.n()
    }

    /// sample variance (`n - 1` denominator), 0 for a single observation
    pub fn variance(&self) -> f64 {
        match self.values.len() {
            0 => f64::NAN,
            1 => 0.,
            _ => self.central_moment_sum(2) / (self.n() - 1.),
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// bias-corrected skewness, `NaN` below 3 observations
    pub fn skew(&self) -> f64 {
        if self.values.len() < 3 {
            return f64::NAN;
        }
        let n = self.n();
        let s = self.std_dev();
        n / ((n - 1.) * (n - 2.)) * self.central_moment_sum(3) / s.powi(3)
    }

    /// bias-corrected excess kurtosis, `NaN` below 4 observations
    pub fn kurtosis(&self) -> f64 {
        if self.values.len() < 4 {
            return f64::NAN;
        }
        let n = self.n();
        let s2 = self.variance();
        let a = n * (n + 1.) / ((n - 1.) * (n - 2.) * (n - 3.));
        let b = 3. * (n - 1.).powi(2) / ((n - 2.) * (n - 3.));
        a * self.central_moment_sum(4) / (s2 * s2) - b
    }

    pub fn median(&self) -> f64 {
        self.quantile(0.5)
    }

    /// the `nth` quantile (`0 <= nth <= 1`), estimated at position `nth * (n + 1)` of the
    /// sorted sample with linear interpolation
    pub fn percentile(&self, nth: f64) -> TableResult<f64> {
        if !(0. ..=1.).contains(&nth) {
            return Err(TableError::invalid_argument(
                "percentile",
                format!("nth must lie in [0, 1], got {nth}"),
            ));
        }
        Ok(self.quantile(nth))
    }

    fn quantile(&self, nth: f64) -> f64 {
        if self.values.is_empty() {
            return f64::NAN;
        }
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        let pos = nth * (n as f64 + 1.);
        if pos < 1. {
            return sorted[0];
        }
        if pos >= n as f64 {
            return sorted[n - 1];
        }
        let floor = pos.floor();
        let lower = sorted[floor as usize - 1];
        let upper = sorted[floor as usize];
        lower + (pos - floor) * (upper - lower)
    }

    pub fn get(&self, stat: StatType) -> f64 {
        match stat {
            StatType::Min => self.min(),
            StatType::Max => self.max(),
            StatType::Sum => self.sum(),
            StatType::Mean => self.mean(),
            StatType::Count => self.count() as f64,
            StatType::Skewness => self.skew(),
            StatType::Kurtosis => self.kurtosis(),
            StatType::Variance => self.variance(),
            StatType::StdDev => self.std_dev(),
            StatType::Median => self.median(),
            StatType::Percentile(p) => self.quantile(f64::from(p.min(100)) / 100.),
        }
    }
}

impl<R: Key, C: Key> DataFrame<R, C> {
    /// statistics over every numeric cell, non-numeric columns are ignored
    pub fn stats(&self) -> Stats {
        let values: Vec<f64> = self
            .data
            .iter()
            .filter(|a| a.kind().is_numeric())
            .flat_map(|a| a.to_doubles().unwrap_or_default())
            .collect();
        Stats::of(&values)
    }
}

/// per-vector statistics of an axis, see [`Axis::stats`]
pub struct AxisStats<'a, R: Key, C: Key, D: Dimension<R, C>> {
    axis: Axis<'a, R, C, D>,
}

macro_rules! axis_stat_impl {
    ($($name:ident => $stat:expr),* $(,)?) => {
        $(
            pub fn $name(&self) -> DataFrame<D::Key, StatType> {
                self.describe_one($stat)
            }
        )*
    };
}

impl<'a, R: Key, C: Key, D: Dimension<R, C>> AxisStats<'a, R, C, D> {
    pub(crate) fn new(axis: Axis<'a, R, C, D>) -> Self {
        Self { axis }
    }

    fn describe_one(&self, stat: StatType) -> DataFrame<D::Key, StatType> {
        self.describe(&[stat])
    }

    axis_stat_impl!(
        min => StatType::Min,
        max => StatType::Max,
        sum => StatType::Sum,
        mean => StatType::Mean,
        count => StatType::Count,
        skew => StatType::Skewness,
        kurtosis => StatType::Kurtosis,
        variance => StatType::Variance,
        std_dev => StatType::StdDev,
        median => StatType::Median,
    );

    pub fn percentile(&self, percent: u8) -> DataFrame<D::Key, StatType> {
        self.describe_one(StatType::Percentile(percent))
    }

    /// a table keyed by the axis keys with one column per requested statistic
    pub fn describe(&self, stats: &[StatType]) -> DataFrame<D::Key, StatType> {
        let stats: Vec<StatType> = stats.iter().copied().unique().collect();
        let per_vector = self.axis.map(|v| {
            let sample = v.stats();
            stats.iter().map(|&s| sample.get(s)).collect::<Vec<f64>>()
        });
        let data = (0..stats.len())
            .map(|j| Array::Double(per_vector.iter().map(|values| values[j]).collect()))
            .collect();
        DataFrame {
            rows: Index::from_unique(AxisType::Rows, self.axis.key_array()),
            cols: Index::from_unique(AxisType::Cols, stats),
            data,
            parallelism: self.axis.parallelism(),
        }
    }

    pub fn rolling(&self, window: usize) -> TableResult<WindowStats<'a, R, C, D>> {
        if window == 0 {
            return Err(TableError::invalid_argument(
                "rolling",
                "window size must be positive",
            ));
        }
        Ok(WindowStats {
            axis: self.axis.clone(),
            window: Window::Rolling(window),
        })
    }

    pub fn expanding(&self, min_periods: usize) -> TableResult<WindowStats<'a, R, C, D>> {
        Ok(WindowStats {
            axis: self.axis.clone(),
            window: Window::Expanding(min_periods.max(1)),
        })
    }
}

#[derive(Clone, Copy, Debug)]
enum Window {
    Rolling(usize),
    Expanding(usize),
}

impl Window {
    /// the half-open range of cells feeding position `k`, `None` if there are too few
    fn bounds(self, k: usize) -> Option<(usize, usize)> {
        match self {
            Window::Rolling(w) => (k + 1 >= w).then(|| (k + 1 - w, k + 1)),
            Window::Expanding(min) => (k + 1 >= min).then_some((0, k + 1)),
        }
    }
}

/// windowed statistics along each vector of an axis
///
/// results have the shape of the axis' table: on the rows axis windows slide along each
/// row, on the columns axis down each column.
pub struct WindowStats<'a, R: Key, C: Key, D: Dimension<R, C>> {
    axis: Axis<'a, R, C, D>,
    window: Window,
}

macro_rules! window_stat_impl {
    ($($name:ident => $stat:expr),* $(,)?) => {
        $(
            pub fn $name(&self) -> DataFrame<R, C> {
                self.get($stat)
            }
        )*
    };
}

impl<R: Key, C: Key, D: Dimension<R, C>> WindowStats<'_, R, C, D> {
    window_stat_impl!(
        min => StatType::Min,
        max => StatType::Max,
        sum => StatType::Sum,
        mean => StatType::Mean,
        count => StatType::Count,
        skew => StatType::Skewness,
        kurtosis => StatType::Kurtosis,
        variance => StatType::Variance,
        std_dev => StatType::StdDev,
        median => StatType::Median,
    );

    pub fn percentile(&self, percent: u8) -> DataFrame<R, C> {
        self.get(StatType::Percentile(percent))
    }

    pub fn get(&self, stat: StatType) -> DataFrame<R, C> {
        let window = self.window;
        let per_vector: Vec<Vec<f64>> = self.axis.map(|v| {
            let values = v.doubles();
            (0..values.len())
                .map(|k| match window.bounds(k) {
                    Some((start, end)) => Stats::of(&values[start..end]).get(stat),
                    None => f64::NAN,
                })
                .collect()
        });
        let mut frame = self.axis.to_frame();
        frame.data = match D::AXIS {
            AxisType::Cols => per_vector.into_iter().map(Array::Double).collect(),
            AxisType::Rows => (0..frame.col_count())
                .map(|j| Array::Double(per_vector.iter().map(|row| row[j]).collect()))
                .collect(),
        };
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::Array;
    use pretty_assertions::assert_eq;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_sample_stats() {
        let stats = Stats::of(&[2., 4., f64::NAN, 4., 4., 5., 5., 7., 9.]);
        assert_eq!(stats.count(), 8);
        assert_eq!(stats.sum(), 40.);
        assert_eq!(stats.mean(), 5.);
        assert_eq!(stats.min(), 2.);
        assert_eq!(stats.max(), 9.);
        assert!(close(stats.variance(), 32. / 7.));
        assert!(close(stats.median(), 4.5));
        assert!(close(stats.skew(), 0.818_487_553_356_8));
        assert!(close(stats.kurtosis(), 0.940_625));
    }

    #[test]
    fn test_percentile_estimation() {
        let stats = Stats::of(&[1., 2., 3., 4.]);
        assert_eq!(stats.percentile(0.).unwrap(), 1.);
        assert_eq!(stats.percentile(1.).unwrap(), 4.);
        assert!(close(stats.percentile(0.25).unwrap(), 1.25));
        assert!(close(stats.get(StatType::Percentile(50)), 2.5));
        assert!(stats.percentile(1.5).is_err());
    }

    #[test]
    fn test_empty_sample() {
        let stats = Stats::of(&[f64::NAN]);
        assert_eq!(stats.count(), 0);
        for stat in StatType::SUMMARY.into_iter().filter(|s| *s != StatType::Count) {
            assert!(stats.get(stat).is_nan(), "{stat}");
        }
    }

    fn frame() -> DataFrame<&'static str, i32> {
        DataFrame::from_columns(
            ["x", "y"],
            [
                (0, Array::Int(vec![1, 10])),
                (1, Array::Double(vec![2., 20.])),
                (2, Array::Long(vec![3, 30])),
                (3, Array::Double(vec![4., f64::NAN])),
                (4, Array::Int(vec![5, 50])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_axis_stats() {
        let frame = frame();
        let means = frame.rows().stats().mean();
        assert_eq!(means.shape(), (2, 1));
        assert_eq!(means.get_double(&"x", &StatType::Mean).unwrap(), 3.);
        assert_eq!(means.get_double(&"y", &StatType::Mean).unwrap(), 27.5);

        let summary = frame.cols().stats().describe(&[StatType::Count, StatType::Max]);
        assert_eq!(summary.cols().key_array(), vec![StatType::Count, StatType::Max]);
        assert_eq!(summary.get_double(&3, &StatType::Count).unwrap(), 1.);
        assert_eq!(summary.get_double(&4, &StatType::Max).unwrap(), 50.);
        assert_eq!(frame.stats().count(), 9);
    }

    #[test]
    fn test_expanding_along_rows() {
        let frame = frame();
        let expanding = frame.rows().stats().expanding(1).unwrap();
        let mean = expanding.mean();
        let count = expanding.count();
        assert_eq!(mean.shape(), frame.shape());
        assert_eq!(mean.get_double(&"x", &4).unwrap(), 3.);
        assert_eq!(count.get_double(&"x", &4).unwrap(), 5.);
        assert_eq!(count.get_double(&"y", &4).unwrap(), 4.);
        assert_eq!(mean.get_double(&"x", &0).unwrap(), 1.);
    }

    #[test]
    fn test_rolling_down_columns() {
        let frame = DataFrame::from_columns(
            0..5,
            [("v", Array::Double(vec![1., 2., 3., 4., 5.]))],
        )
        .unwrap();
        let rolling = frame.cols().stats().rolling(3).unwrap();
        let sums = rolling.sum();
        assert!(sums.get_double(&1, &"v").unwrap().is_nan());
        assert_eq!(sums.get_double(&2, &"v").unwrap(), 6.);
        assert_eq!(sums.get_double(&4, &"v").unwrap(), 12.);
        assert!(frame.cols().stats().rolling(0).is_err());
    }
}
