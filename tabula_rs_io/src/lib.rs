//! # tabula_io
//!
//! csv reading and writing for [`tabula_core::DataFrame`]
//!
//! reading goes through [`CsvSource`], a [`RowSource`] over a [`csv::Reader`], so column
//! kinds are inferred by the core's [`Formats`] like for any other source.

use std::{fmt, fs::File, io, path::Path, str::FromStr};

use tabula_core::{
    df::{Formats, RowSource},
    DataFrame, Key, TableError,
};

#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("row key column {0:?} is not in the header")]
    MissingKeyColumn(String),
}

#[derive(Clone, Debug)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub has_header: bool,
    /// the column holding row keys, rows are keyed by ordinal when unset
    ///
    /// requires a header. when writing, this is the header of the key column.
    pub row_key_column: Option<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            row_key_column: None,
        }
    }
}

/// a row key type that can be read back from csv
pub trait RowKey: Key {
    /// builds the key of row `ordinal` from its key field, `None` when there is no key column
    fn from_field(ordinal: usize, field: Option<&str>) -> anyhow::Result<Self>;
}

impl RowKey for String {
    fn from_field(ordinal: usize, field: Option<&str>) -> anyhow::Result<Self> {
        Ok(field.map_or_else(|| ordinal.to_string(), str::to_string))
    }
}

macro_rules! numeric_row_key_impl {
    ($($ty:ty),*) => {
        $(
            impl RowKey for $ty {
                fn from_field(ordinal: usize, field: Option<&str>) -> anyhow::Result<Self> {
                    match field {
                        Some(field) => Ok(<$ty>::from_str(field.trim())?),
                        None => Ok(<$ty>::try_from(ordinal)?),
                    }
                }
            }
        )*
    };
}

numeric_row_key_impl!(usize, u64, i32, i64);

pub struct CsvSource<Rd: io::Read, K: RowKey> {
    reader: csv::Reader<Rd>,
    names: Vec<String>,
    key_position: Option<usize>,
    record: csv::StringRecord,
    next: usize,
    _key: std::marker::PhantomData<K>,
}

impl<Rd: io::Read, K: RowKey> CsvSource<Rd, K> {
    pub fn new(reader: Rd, options: &CsvOptions) -> Result<Self, CsvError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(options.has_header)
            .flexible(true)
            .from_reader(reader);
        let header = reader.headers()?.clone();
        let key_position = match &options.row_key_column {
            None => None,
            Some(name) if options.has_header => Some(
                header
                    .iter()
                    .position(|h| h == name)
                    .ok_or_else(|| CsvError::MissingKeyColumn(name.clone()))?,
            ),
            Some(name) => return Err(CsvError::MissingKeyColumn(name.clone())),
        };
        let names: Vec<String> = header
            .iter()
            .enumerate()
            .filter(|(j, _)| Some(*j) != key_position)
            .map(|(j, h)| {
                if options.has_header {
                    h.to_string()
                } else {
                    j.to_string()
                }
            })
            .collect();
        log::debug!(
            "csv: {} columns, row keys from {}",
            names.len(),
            options.row_key_column.as_deref().unwrap_or("ordinals")
        );
        Ok(Self {
            reader,
            names,
            key_position,
            record: csv::StringRecord::new(),
            next: 0,
            _key: std::marker::PhantomData,
        })
    }

    fn split_record(&self, ordinal: usize) -> anyhow::Result<(K, Vec<String>)> {
        let key_field = match self.key_position {
            None => None,
            Some(position) => Some(self.record.get(position).ok_or_else(|| {
                anyhow::anyhow!("record {ordinal} has no field for the row key column")
            })?),
        };
        let key = K::from_field(ordinal, key_field)?;
        let tokens = self
            .record
            .iter()
            .enumerate()
            .filter(|(j, _)| Some(*j) != self.key_position)
            .map(|(_, field)| field.to_string())
            .collect();
        Ok((key, tokens))
    }
}

impl<Rd: io::Read, K: RowKey> RowSource for CsvSource<Rd, K> {
    type Key = K;

    fn column_names(&self) -> &[String] {
        &self.names
    }

    fn next_row(&mut self) -> Option<anyhow::Result<(K, Vec<String>)>> {
        match self.reader.read_record(&mut self.record) {
            Ok(false) => None,
            Err(err) => Some(Err(err.into())),
            Ok(true) => {
                let ordinal = self.next;
                self.next += 1;
                Some(self.split_record(ordinal))
            }
        }
    }
}

pub fn read_csv<K: RowKey>(
    path: impl AsRef<Path>,
    options: &CsvOptions,
    formats: &Formats,
) -> Result<DataFrame<K, String>, CsvError> {
    let file = File::open(path)?;
    read_csv_from(io::BufReader::new(file), options, formats)
}

pub fn read_csv_from<K: RowKey, Rd: io::Read>(
    reader: Rd,
    options: &CsvOptions,
    formats: &Formats,
) -> Result<DataFrame<K, String>, CsvError> {
    let source = CsvSource::<Rd, K>::new(reader, options)?;
    Ok(DataFrame::from_source(source, formats)?)
}

/// writes `frame` with its row keys as the first column, nulls as empty fields
pub fn write_csv<R, C, W>(frame: &DataFrame<R, C>, writer: W, options: &CsvOptions) -> Result<(), CsvError>
where
    R: Key + fmt::Display,
    C: Key + fmt::Display,
    W: io::Write,
{
    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);
    if options.has_header {
        let key_header = options.row_key_column.as_deref().unwrap_or("");
        writer.write_record(
            std::iter::once(key_header.to_string()).chain(frame.cols().keys().map(|c| c.to_string())),
        )?;
    }
    for row in frame.rows().iter() {
        let fields = std::iter::once(row.key().to_string()).chain(row.values().map(|v| {
            if v.is_null() {
                String::new()
            } else {
                v.to_string()
            }
        }));
        writer.write_record(fields)?;
    }
    writer.flush()?;
    Ok(())
}
