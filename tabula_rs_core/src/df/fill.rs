use super::{frame::DataFrame, Key};
use crate::array::{Array, Value};

/// copies the nearest non-empty value into the gaps that follow it
pub struct Fill<'a, R: Key, C: Key> {
    frame: &'a mut DataFrame<R, C>,
}

impl<R: Key, C: Key> DataFrame<R, C> {
    pub fn fill(&mut self) -> Fill<'_, R, C> {
        Fill { frame: self }
    }
}

/// tracks the current source value and how far the running gap has been filled
#[derive(Default)]
struct Gap {
    source: Option<Value>,
    run: usize,
}

impl Gap {
    /// visits cell `i`, returns whether it was filled
    fn step(&mut self, array: &mut Array, i: usize, intervals: usize) -> bool {
        if !array.is_null(i) {
            self.source = Some(array.get_value(i));
            self.run = 0;
            return false;
        }
        match &self.source {
            Some(value) if self.run < intervals => {
                array.set_value(i, value.clone());
                self.run += 1;
                true
            }
            _ => false,
        }
    }
}

fn fill_array(array: &mut Array, positions: impl Iterator<Item = usize>, intervals: usize) -> usize {
    let mut gap = Gap::default();
    positions.filter(|&i| gap.step(array, i, intervals)).count()
}

impl<R: Key, C: Key> Fill<'_, R, C> {
    fn along_columns(&mut self, intervals: usize, downwards: bool) -> usize {
        let nrows = self.frame.row_count();
        let parallelism = self.frame.parallelism;
        parallelism
            .maybe_par_map(&mut self.frame.data, |array: &mut Array| {
                if downwards {
                    fill_array(array, 0..nrows, intervals)
                } else {
                    fill_array(array, (0..nrows).rev(), intervals)
                }
            })
            .into_iter()
            .sum()
    }

    fn along_rows(&mut self, intervals: usize, rightwards: bool) -> usize {
        let ncols = self.frame.col_count();
        let order: Vec<usize> = if rightwards {
            (0..ncols).collect()
        } else {
            (0..ncols).rev().collect()
        };
        let data = &mut self.frame.data;
        (0..self.frame.rows.len())
            .map(|i| {
                let mut gap = Gap::default();
                order
                    .iter()
                    .filter(|&&j| gap.step(&mut data[j], i, intervals))
                    .count()
            })
            .sum()
    }

    fn report(op: &str, filled: usize) -> usize {
        log::debug!("fill {op}: {filled} cells filled");
        filled
    }

    /// fills each gap from the nearest value below it, at most `intervals` cells per gap
    pub fn up(&mut self, intervals: usize) -> usize {
        let filled = self.along_columns(intervals, false);
        Self::report("up", filled)
    }

    /// fills each gap from the nearest value above it, at most `intervals` cells per gap
    pub fn down(&mut self, intervals: usize) -> usize {
        let filled = self.along_columns(intervals, true);
        Self::report("down", filled)
    }

    /// fills each gap from the nearest value to its right
    pub fn left(&mut self, intervals: usize) -> usize {
        let filled = self.along_rows(intervals, false);
        Self::report("left", filled)
    }

    /// fills each gap from the nearest value to its left
    pub fn right(&mut self, intervals: usize) -> usize {
        let filled = self.along_rows(intervals, true);
        Self::report("right", filled)
    }
}
