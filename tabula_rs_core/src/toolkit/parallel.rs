use std::thread::available_parallelism;

use rayon::prelude::*;

/// whether an operation may fan out over the rayon pool
///
/// only the evaluation strategy changes with this flag, never the observable result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Parallelism {
    #[default]
    Sequential,
    Parallel,
}

impl Parallelism {
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    #[inline]
    pub fn maybe_par_for_each<T, I, F>(self, iter: I, f: F)
    where
        T: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().for_each(f);
        } else {
            iter.into_iter().for_each(f);
        }
    }

    #[inline]
    pub fn maybe_par_map<T, B, I, F>(self, iter: I, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> B + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map(f).collect()
        } else {
            iter.into_iter().map(f).collect()
        }
    }

    /// like [`Parallelism::maybe_par_map`], but stops at the first error
    ///
    /// in parallel mode the error reported is one of the failing items, not necessarily
    /// the first one in iteration order.
    #[inline]
    pub fn maybe_par_try_map<T, B, E, I, F>(self, iter: I, f: F) -> Result<Vec<B>, E>
    where
        T: Send,
        B: Send,
        E: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> Result<B, E> + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map(f).collect()
        } else {
            iter.into_iter().map(f).collect()
        }
    }

    /// the leaf size below which [`fill_bisect`] stops splitting
    pub fn split_threshold(self, total: usize) -> usize {
        match self {
            Parallelism::Sequential => usize::MAX,
            Parallelism::Parallel => (total / num_threads()).max(10),
        }
    }
}

pub fn num_threads() -> usize {
    available_parallelism()
        .map(|n| n.get())
        .unwrap_or_else(|_| rayon::current_num_threads())
        .max(1)
}

/// fills `out[i]` with `f(offset + i)`, bisecting the index space with [`rayon::join`]
/// until a half is no longer than `threshold`
///
/// each half owns a disjoint part of `out`, so leaves write without synchronization.
pub fn fill_bisect<T, F>(out: &mut [T], offset: usize, threshold: usize, f: &F)
where
    T: Send,
    F: Fn(usize) -> T + Sync,
{
    if out.len() <= threshold.max(1) {
        out.iter_mut()
            .enumerate()
            .for_each(|(i, slot)| *slot = f(offset + i));
        return;
    }
    let mid = out.len() / 2;
    let (left, right) = out.split_at_mut(mid);
    rayon::join(
        || fill_bisect(left, offset, threshold, f),
        || fill_bisect(right, offset + mid, threshold, f),
    );
}
