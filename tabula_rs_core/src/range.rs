//! # range
//!
//! half-open integer and date ranges usable as row / column keys, in either direction

use std::{fmt, sync::Arc};

use chrono::{Datelike, Days, NaiveDate};

use crate::{
    error::{TableError, TableResult},
    toolkit::parallel::num_threads,
};

type Excludes = Arc<dyn Fn(i64) -> bool + Send + Sync>;

/// `start` (inclusive) to `end` (exclusive) by `step`
///
/// the direction follows the bounds: `start > end` iterates downwards, `start == end` is
/// empty. `step` is always a positive magnitude.
#[derive(Clone)]
pub struct IntRange {
    start: i64,
    end: i64,
    step: i64,
    excludes: Option<Excludes>,
}

impl IntRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start,
            end,
            step: 1,
            excludes: None,
        }
    }

    pub fn with_step(start: i64, end: i64, step: i64) -> TableResult<Self> {
        if step <= 0 {
            return Err(TableError::invalid_argument(
                "range",
                format!("step must be positive, got {step}"),
            ));
        }
        Ok(Self {
            step,
            ..Self::new(start, end)
        })
    }

    /// skips every element matching `predicate` during iteration
    pub fn excluding<F>(mut self, predicate: F) -> Self
    where
        F: Fn(i64) -> bool + Send + Sync + 'static,
    {
        self.excludes = Some(Arc::new(predicate));
        self
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    pub fn is_ascending(&self) -> bool {
        self.start < self.end
    }

    /// number of steps between the bounds, ignoring exclusions
    pub fn estimate_size(&self) -> usize {
        let span = self.start.abs_diff(self.end);
        span.div_ceil(self.step.unsigned_abs()) as usize
    }

    pub fn iter(&self) -> IntRangeIter {
        IntRangeIter {
            next: Some(self.start),
            end: self.end,
            step: if self.start <= self.end {
                self.step
            } else {
                -self.step
            },
            excludes: self.excludes.clone(),
        }
    }

    /// cuts the range into one contiguous segment per worker thread, or returns it whole
    /// when the segments would be shorter than `threshold`
    pub fn split(&self, threshold: usize) -> Vec<IntRange> {
        let size = self.estimate_size();
        let per_segment = size.div_ceil(num_threads());
        if size == 0 || per_segment < threshold.max(1) {
            return vec![self.clone()];
        }
        let stride = (per_segment as i64).saturating_mul(self.step);
        let mut segments = Vec::new();
        let mut from = self.start;
        while from != self.end {
            let to = if self.is_ascending() {
                from.saturating_add(stride).min(self.end)
            } else {
                from.saturating_sub(stride).max(self.end)
            };
            segments.push(IntRange {
                start: from,
                end: to,
                step: self.step,
                excludes: self.excludes.clone(),
            });
            from = to;
        }
        segments
    }
}

impl fmt::Debug for IntRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntRange")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("step", &self.step)
            .field("excludes", &self.excludes.is_some())
            .finish()
    }
}

pub struct IntRangeIter {
    next: Option<i64>,
    end: i64,
    step: i64,
    excludes: Option<Excludes>,
}

impl Iterator for IntRangeIter {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        loop {
            let value = self.next?;
            let in_bounds = if self.step > 0 {
                value < self.end
            } else {
                value > self.end
            };
            if !in_bounds {
                self.next = None;
                return None;
            }
            self.next = value.checked_add(self.step);
            match &self.excludes {
                Some(excludes) if excludes(value) => continue,
                _ => return Some(value),
            }
        }
    }
}

type DateExcludes = Arc<dyn Fn(NaiveDate) -> bool + Send + Sync>;

/// calendar dates from `start` (inclusive) to `end` (exclusive), `step` days apart
///
/// follows the same direction rules as [`IntRange`].
#[derive(Clone)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
    step: u64,
    excludes: Option<DateExcludes>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            step: 1,
            excludes: None,
        }
    }

    pub fn with_step(start: NaiveDate, end: NaiveDate, days: i64) -> TableResult<Self> {
        let step = u64::try_from(days).ok().filter(|&d| d > 0).ok_or_else(|| {
            TableError::invalid_argument("range", format!("step must be positive, got {days}"))
        })?;
        Ok(Self {
            step,
            ..Self::new(start, end)
        })
    }

    pub fn excluding<F>(mut self, predicate: F) -> Self
    where
        F: Fn(NaiveDate) -> bool + Send + Sync + 'static,
    {
        self.excludes = Some(Arc::new(predicate));
        self
    }

    /// skips saturdays and sundays
    pub fn weekdays(self) -> Self {
        self.excluding(|d| d.weekday().number_from_monday() > 5)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn is_ascending(&self) -> bool {
        self.start < self.end
    }

    pub fn estimate_size(&self) -> usize {
        let span = self.end.signed_duration_since(self.start).num_days().unsigned_abs();
        span.div_ceil(self.step) as usize
    }

    pub fn iter(&self) -> DateRangeIter {
        DateRangeIter {
            next: Some(self.start),
            end: self.end,
            step: Days::new(self.step),
            ascending: self.start <= self.end,
            excludes: self.excludes.clone(),
        }
    }

    /// like [`IntRange::split`], segment bounds stay on the step grid
    pub fn split(&self, threshold: usize) -> Vec<DateRange> {
        let size = self.estimate_size();
        let per_segment = size.div_ceil(num_threads());
        if size == 0 || per_segment < threshold.max(1) {
            return vec![self.clone()];
        }
        let stride = Days::new((per_segment as u64).saturating_mul(self.step));
        let mut segments = Vec::new();
        let mut from = self.start;
        while from != self.end {
            let to = if self.is_ascending() {
                from.checked_add_days(stride).map_or(self.end, |d| d.min(self.end))
            } else {
                from.checked_sub_days(stride).map_or(self.end, |d| d.max(self.end))
            };
            segments.push(DateRange {
                start: from,
                end: to,
                step: self.step,
                excludes: self.excludes.clone(),
            });
            from = to;
        }
        segments
    }
}

impl fmt::Debug for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DateRange")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("step", &self.step)
            .field("excludes", &self.excludes.is_some())
            .finish()
    }
}

pub struct DateRangeIter {
    next: Option<NaiveDate>,
    end: NaiveDate,
    step: Days,
    ascending: bool,
    excludes: Option<DateExcludes>,
}

impl Iterator for DateRangeIter {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        loop {
            let value = self.next?;
            let in_bounds = if self.ascending {
                value < self.end
            } else {
                value > self.end
            };
            if !in_bounds {
                self.next = None;
                return None;
            }
            self.next = if self.ascending {
                value.checked_add_days(self.step)
            } else {
                value.checked_sub_days(self.step)
            };
            match &self.excludes {
                Some(excludes) if excludes(value) => continue,
                _ => return Some(value),
            }
        }
    }
}

impl IntoIterator for DateRange {
    type Item = NaiveDate;
    type IntoIter = DateRangeIter;

    fn into_iter(self) -> DateRangeIter {
        self.iter()
    }
}

impl IntoIterator for IntRange {
    type Item = i64;
    type IntoIter = IntRangeIter;

    fn into_iter(self) -> IntRangeIter {
        self.iter()
    }
}

impl IntoIterator for &IntRange {
    type Item = i64;
    type IntoIter = IntRangeIter;

    fn into_iter(self) -> IntRangeIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::df::DataFrame;

    #[test]
    fn test_directions() {
        let up = IntRange::new(0, 5);
        assert!(up.is_ascending());
        assert_eq!(up.iter().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        let down = IntRange::with_step(10, 0, 3).unwrap();
        assert!(!down.is_ascending());
        assert_eq!(down.estimate_size(), 4);
        assert_eq!(down.iter().collect::<Vec<_>>(), vec![10, 7, 4, 1]);
        assert_eq!(IntRange::new(5, 4).iter().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_zero_length_is_empty() {
        let empty = IntRange::new(3, 3);
        assert_eq!(empty.estimate_size(), 0);
        assert_eq!(empty.iter().next(), None);
        assert_eq!(empty.split(1).len(), 1);
    }

    #[test]
    fn test_invalid_step() {
        assert!(matches!(
            IntRange::with_step(0, 10, 0),
            Err(TableError::InvalidArgument { .. })
        ));
        assert!(IntRange::with_step(0, 10, -1).is_err());
    }

    #[test]
    fn test_excludes() {
        let odds = IntRange::new(0, 10).excluding(|v| v % 2 == 0);
        assert_eq!(odds.iter().collect::<Vec<_>>(), vec![1, 3, 5, 7, 9]);
        assert_eq!(odds.estimate_size(), 10);
    }

    #[test]
    fn test_split_covers_range() {
        let range = IntRange::with_step(1000, -1000, 2).unwrap();
        assert_eq!(range.split(usize::MAX).len(), 1);
        let segments = range.split(1);
        let joined: Vec<i64> = segments.iter().flat_map(|s| s.iter()).collect();
        assert_eq!(joined, range.iter().collect::<Vec<_>>());
        assert_eq!(segments.first().map(|s| s.start()), Some(1000));
        assert_eq!(segments.last().map(|s| s.end()), Some(-1000));
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_directions() {
        let up = DateRange::new(date(2024, 2, 27), date(2024, 3, 2));
        assert!(up.is_ascending());
        assert_eq!(
            up.iter().collect::<Vec<_>>(),
            vec![date(2024, 2, 27), date(2024, 2, 28), date(2024, 2, 29), date(2024, 3, 1)]
        );
        let down = DateRange::with_step(date(2024, 1, 10), date(2024, 1, 1), 4).unwrap();
        assert!(!down.is_ascending());
        assert_eq!(down.estimate_size(), 3);
        assert_eq!(
            down.iter().collect::<Vec<_>>(),
            vec![date(2024, 1, 10), date(2024, 1, 6), date(2024, 1, 2)]
        );
        let day = date(2020, 1, 1);
        assert_eq!(DateRange::new(day, day).iter().next(), None);
        assert!(matches!(
            DateRange::with_step(day, date(2020, 2, 1), 0),
            Err(TableError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_date_weekdays_and_split() {
        // 2024-01-01 is a monday
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 15)).weekdays();
        let days: Vec<NaiveDate> = range.iter().collect();
        assert_eq!(days.len(), 10);
        assert!(!days.contains(&date(2024, 1, 6)));
        assert_eq!(range.estimate_size(), 14);

        let long = DateRange::with_step(date(2000, 1, 1), date(2030, 1, 1), 3).unwrap();
        let segments = long.split(1);
        let joined: Vec<NaiveDate> = segments.iter().flat_map(|s| s.iter()).collect();
        assert_eq!(joined, long.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_range_as_keys() {
        let frame = DataFrame::<i64, i64>::of_ints(IntRange::new(0, 3), IntRange::new(2, 0)).unwrap();
        assert_eq!(frame.row_index().keys(), &[0, 1, 2]);
        assert_eq!(frame.col_index().keys(), &[2, 1]);

        let days = DateRange::new(date(2024, 1, 1), date(2024, 1, 4));
        let frame = DataFrame::<NaiveDate, i64>::of_doubles(days, IntRange::new(0, 2)).unwrap();
        assert_eq!(frame.rows().ordinal(&date(2024, 1, 3)), Some(2));
    }
}
