//! # coding
//!
//! reversible mappings between domain values and `i64` codes, so that values such as
//! dates live in plain `Long` columns. [`NULL_LONG`] is reserved as the code of a
//! missing value.

use std::fmt::Debug;

use chrono::{Datelike, NaiveDate};

use crate::{
    array::NULL_LONG,
    df::{DataFrame, Key},
    error::TableResult,
};

pub trait LongCoding: Debug + Send + Sync {
    type Value;

    /// the code of `value`, or [`NULL_LONG`] for `None`
    fn code(&self, value: Option<&Self::Value>) -> i64;

    /// the value behind `code`, `None` for [`NULL_LONG`] or an undecodable code
    fn value(&self, code: i64) -> Option<Self::Value>;

    /// reads a non-null text token
    fn parse(&self, token: &str) -> Option<Self::Value>;
}

const EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// calendar dates as days since 1970-01-01, read from text with a `chrono` format
#[derive(Clone, Debug)]
pub struct DateCoding {
    format: String,
}

impl Default for DateCoding {
    fn default() -> Self {
        Self::new("%Y-%m-%d")
    }
}

impl DateCoding {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }
}

impl LongCoding for DateCoding {
    type Value = NaiveDate;

    fn code(&self, value: Option<&NaiveDate>) -> i64 {
        match value {
            Some(date) => i64::from(date.num_days_from_ce()) - EPOCH_DAYS_FROM_CE,
            None => NULL_LONG,
        }
    }

    fn value(&self, code: i64) -> Option<NaiveDate> {
        if code == NULL_LONG {
            return None;
        }
        let days = i32::try_from(code.checked_add(EPOCH_DAYS_FROM_CE)?).ok()?;
        NaiveDate::from_num_days_from_ce_opt(days)
    }

    fn parse(&self, token: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(token.trim(), &self.format).ok()
    }
}

impl<R: Key, C: Key> DataFrame<R, C> {
    /// decodes a `Long` cell, `None` when the cell holds the null code
    pub fn get_coded<L: LongCoding>(&self, row: &R, col: &C, coding: &L) -> TableResult<Option<L::Value>> {
        Ok(coding.value(self.get_long(row, col)?))
    }

    pub fn set_coded<L: LongCoding>(
        &mut self,
        row: &R,
        col: &C,
        coding: &L,
        value: Option<&L::Value>,
    ) -> TableResult<()> {
        self.set_long(row, col, coding.code(value))
    }
}
