//! # df
//!
//! a labeled, column-typed DataFrame with row / column axes, cursors, fill, algebra and
//! windowed statistics

use std::{fmt::Debug, hash::Hash};

/// anything usable as a row or column key
pub trait Key: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static {}
impl<T> Key for T where T: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static {}

pub mod algebra;
pub mod axis;
pub mod cursor;
pub mod fill;
pub mod frame;
pub mod smooth;
pub mod source;
pub mod stats;
pub mod vector;

pub use axis::{Axis, AxisMut, Cols, Dimension, GroupKey, Grouping, Rows};
pub use cursor::Cursor;
pub use fill::Fill;
pub use frame::{DataFrame, DataFrameValue, DataFrameValueMut};
pub use smooth::{Smooth, SmoothMut};
pub use source::{Formats, Parser, RowSource};
pub use stats::{AxisStats, StatType, Stats, WindowStats};
pub use vector::Vector;
