use super::{frame::DataFrame, stats::nan_mean, Key};
use crate::{
    array::Array,
    error::{TableError, TableResult},
};

#[derive(Clone, Copy, Debug)]
enum Kernel {
    Ema { alpha: f64 },
    Sma { window: usize },
}

impl Kernel {
    fn ema(half_life: f64) -> TableResult<Option<Self>> {
        if half_life.is_nan() || half_life < 0. {
            return Err(TableError::invalid_argument(
                "ema",
                format!("half-life must be >= 0, got {half_life}"),
            ));
        }
        if half_life == 0. {
            return Ok(None);
        }
        let alpha = 1. - (0.5f64.ln() / half_life).exp();
        Ok(Some(Kernel::Ema { alpha }))
    }

    fn sma(window: usize) -> TableResult<Self> {
        if window == 0 {
            return Err(TableError::invalid_argument(
                "sma",
                "window size must be positive",
            ));
        }
        Ok(Kernel::Sma { window })
    }

    /// smooths one column top to bottom, `NaN`s stay `NaN` and are stepped over
    fn run(self, values: &mut [f64]) {
        match self {
            Kernel::Ema { alpha } => {
                let mut prior = f64::NAN;
                for x in values.iter_mut().filter(|x| !x.is_nan()) {
                    if !prior.is_nan() {
                        *x = alpha * *x + (1. - alpha) * prior;
                    }
                    prior = *x;
                }
            }
            Kernel::Sma { window } => {
                let raw = values.to_vec();
                for (k, x) in values.iter_mut().enumerate() {
                    if !x.is_nan() {
                        *x = nan_mean(&raw[(k + 1).saturating_sub(window)..=k]);
                    }
                }
            }
        }
    }
}

fn smooth_columns<R: Key, C: Key>(frame: &mut DataFrame<R, C>, kernel: Kernel) {
    let parallelism = frame.parallelism;
    let smoothed = parallelism.maybe_par_map(&mut frame.data, |array: &mut Array| {
        if !array.widen_to_double() {
            return false;
        }
        if let Some(values) = array.as_double_slice_mut() {
            kernel.run(values);
        }
        true
    });
    log::debug!(
        "{kernel:?} smoothed {} of {} columns",
        smoothed.into_iter().filter(|&s| s).count(),
        frame.col_count()
    );
}

/// smoothing down the columns of a borrowed table, producing a new one
pub struct Smooth<'a, R: Key, C: Key> {
    frame: &'a DataFrame<R, C>,
}

/// smoothing down the columns of a table, in place
pub struct SmoothMut<'a, R: Key, C: Key> {
    frame: &'a mut DataFrame<R, C>,
}

impl<R: Key, C: Key> DataFrame<R, C> {
    pub fn smooth(&self) -> Smooth<'_, R, C> {
        Smooth { frame: self }
    }

    pub fn smooth_mut(&mut self) -> SmoothMut<'_, R, C> {
        SmoothMut { frame: self }
    }
}

impl<R: Key, C: Key> Smooth<'_, R, C> {
    /// exponentially weighted moving average with the given half-life (in rows)
    ///
    /// the first value of each column is kept, a half-life of 0 returns an unchanged copy.
    pub fn ema(&self, half_life: f64) -> TableResult<DataFrame<R, C>> {
        let mut copy = self.frame.copy();
        copy.smooth_mut().ema(half_life)?;
        Ok(copy)
    }

    /// trailing simple moving average over up to `window` rows
    pub fn sma(&self, window: usize) -> TableResult<DataFrame<R, C>> {
        let mut copy = self.frame.copy();
        copy.smooth_mut().sma(window)?;
        Ok(copy)
    }
}

impl<R: Key, C: Key> SmoothMut<'_, R, C> {
    pub fn ema(&mut self, half_life: f64) -> TableResult<()> {
        if let Some(kernel) = Kernel::ema(half_life)? {
            smooth_columns(self.frame, kernel);
        }
        Ok(())
    }

    pub fn sma(&mut self, window: usize) -> TableResult<()> {
        smooth_columns(self.frame, Kernel::sma(window)?);
        Ok(())
    }
}
