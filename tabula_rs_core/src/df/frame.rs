use crate::{array::Array, index::Index, toolkit::parallel::Parallelism};

use super::Key;

mod cells;
mod meta;
mod ops;

pub use ops::{DataFrameValue, DataFrameValueMut};

/// a table of typed columns addressed by row keys `R` and column keys `C`
///
/// every column holds exactly `rows.len()` elements.
#[derive(Clone, Debug)]
pub struct DataFrame<R: Key, C: Key> {
    pub(crate) rows: Index<R>,
    pub(crate) cols: Index<C>,
    pub(crate) data: Vec<Array>,
    pub(crate) parallelism: Parallelism,
}
