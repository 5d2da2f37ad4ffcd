pub mod array;
pub mod coding;
pub mod df;
pub mod error;
pub mod index;
pub mod range;
pub mod toolkit;

pub use array::{Array, Element, ElementKind, Value};
pub use coding::{DateCoding, LongCoding};
pub use df::{DataFrame, Key};
pub use error::{AxisType, TableError, TableResult};
pub use range::{DateRange, IntRange};
pub use toolkit::parallel::Parallelism;
