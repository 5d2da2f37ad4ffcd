//! # source
//!
//! the seam between row producers (csv readers, generators, ...) and typed tables
//!
//! a [`RowSource`] yields raw text rows, [`Formats`] decides how each column is parsed,
//! and [`DataFrame::from_source`] ties the two together.

use std::{collections::HashMap, fmt, sync::Arc};

use super::{frame::DataFrame, Key};
use crate::{
    array::{ElementKind, Value},
    coding::LongCoding,
    error::{TableError, TableResult},
};

type TokenCoder = Arc<dyn Fn(&str) -> Option<i64> + Send + Sync>;

/// a producer of keyed text rows
pub trait RowSource {
    type Key: Key;

    fn column_names(&self) -> &[String];

    /// the next row, `None` once the source is exhausted
    fn next_row(&mut self) -> Option<anyhow::Result<(Self::Key, Vec<String>)>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Parser {
    Boolean,
    Int,
    Long,
    Double,
    Str,
}

impl Parser {
    pub fn kind(self) -> ElementKind {
        match self {
            Parser::Boolean => ElementKind::Boolean,
            Parser::Int => ElementKind::Int,
            Parser::Long => ElementKind::Long,
            Parser::Double => ElementKind::Double,
            Parser::Str => ElementKind::Object,
        }
    }

    /// parses a non-null token, `None` if it does not fit this parser
    pub fn parse(self, token: &str) -> Option<Value> {
        let token = token.trim();
        match self {
            Parser::Boolean => {
                if token.eq_ignore_ascii_case("true") {
                    Some(Value::Boolean(true))
                } else if token.eq_ignore_ascii_case("false") {
                    Some(Value::Boolean(false))
                } else {
                    None
                }
            }
            Parser::Int => token.parse().ok().map(Value::Int),
            Parser::Long => token.parse().ok().map(Value::Long),
            Parser::Double => token.parse().ok().map(Value::Double),
            Parser::Str => Some(Value::from(token)),
        }
    }
}

/// parsing configuration for [`DataFrame::from_source`]
#[derive(Clone)]
pub struct Formats {
    pub null_tokens: Vec<String>,
    /// rows buffered to infer a parser for columns without an override
    pub sample_rows: usize,
    overrides: HashMap<String, Parser>,
    codings: HashMap<String, TokenCoder>,
}

impl fmt::Debug for Formats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formats")
            .field("null_tokens", &self.null_tokens)
            .field("sample_rows", &self.sample_rows)
            .field("overrides", &self.overrides)
            .field("codings", &self.codings.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Formats {
    fn default() -> Self {
        Self {
            null_tokens: ["", "null", "NULL", "NaN", "N/A", "NA"]
                .into_iter()
                .map(String::from)
                .collect(),
            sample_rows: 100,
            overrides: HashMap::new(),
            codings: HashMap::new(),
        }
    }
}

impl Formats {
    pub fn with_parser(mut self, column: impl Into<String>, parser: Parser) -> Self {
        self.overrides.insert(column.into(), parser);
        self
    }

    /// stores `column` as a `Long` column of `coding`'s codes
    ///
    /// takes precedence over a parser override for the same column.
    pub fn with_coding<L>(mut self, column: impl Into<String>, coding: L) -> Self
    where
        L: LongCoding + 'static,
    {
        let coder = move |token: &str| coding.parse(token).map(|v| coding.code(Some(&v)));
        self.codings.insert(column.into(), Arc::new(coder));
        self
    }

    pub fn is_coded(&self, column: &str) -> bool {
        self.codings.contains_key(column)
    }

    /// the code of a non-null token in a coded column, `None` if the column is not
    /// coded or the token does not decode
    pub fn encode(&self, column: &str, token: &str) -> Option<i64> {
        self.codings.get(column).and_then(|coder| coder(token))
    }

    pub fn with_null_tokens<S: Into<String>>(mut self, tokens: impl IntoIterator<Item = S>) -> Self {
        self.null_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sample_rows(mut self, sample_rows: usize) -> Self {
        self.sample_rows = sample_rows;
        self
    }

    pub fn parser_for(&self, column: &str) -> Option<Parser> {
        self.overrides.get(column).copied()
    }

    pub fn is_null(&self, token: &str) -> bool {
        self.null_tokens.iter().any(|t| t == token)
    }

    /// the narrowest parser accepting every non-null token of `sample`
    ///
    /// a sample made only of nulls is read as strings.
    pub fn find_parser<'s>(&self, sample: impl IntoIterator<Item = &'s str>) -> Parser {
        let tokens: Vec<&str> = sample.into_iter().filter(|t| !self.is_null(t)).collect();
        if tokens.is_empty() {
            return Parser::Str;
        }
        [Parser::Boolean, Parser::Int, Parser::Long, Parser::Double]
            .into_iter()
            .find(|parser| tokens.iter().all(|t| parser.parse(t).is_some()))
            .unwrap_or(Parser::Str)
    }

    /// the value of `token` under `parser`, where null tokens read as the kind's null
    pub fn parse(&self, parser: Parser, token: &str) -> Option<Value> {
        if self.is_null(token) {
            return Some(parser.kind().default_value());
        }
        parser.parse(token)
    }
}

impl<R: Key> DataFrame<R, String> {
    /// drains `source` into a table whose columns are the source's column names
    ///
    /// the first `formats.sample_rows` rows are buffered to pick each column's parser.
    /// a token the chosen parser rejects is stored as a string, which turns its column
    /// into an object column.
    pub fn from_source<S>(mut source: S, formats: &Formats) -> TableResult<Self>
    where
        S: RowSource<Key = R>,
    {
        let names = source.column_names().to_vec();
        let mut frame = Self::empty();
        let mut sample = Vec::with_capacity(formats.sample_rows);
        while sample.len() < formats.sample_rows.max(1) {
            match next_checked(&mut source, names.len()) {
                Some(row) => sample.push(row?),
                None => break,
            }
        }

        let mut parsers = Vec::with_capacity(names.len());
        for (j, name) in names.iter().enumerate() {
            let parser = if formats.is_coded(name) {
                Parser::Long
            } else {
                formats.parser_for(name).unwrap_or_else(|| {
                    formats.find_parser(sample.iter().map(|(_, tokens)| tokens[j].as_str()))
                })
            };
            log::debug!("from_source: column {name:?} parsed as {parser:?}");
            frame.add_column(name.clone(), parser.kind())?;
            parsers.push(parser);
        }

        let mut ingest = |key: R, tokens: Vec<String>| -> TableResult<()> {
            let i = frame.row_count();
            frame.add_rows([key])?;
            for (j, token) in tokens.iter().enumerate() {
                let parsed = if formats.is_coded(&names[j]) && !formats.is_null(token) {
                    formats.encode(&names[j], token).map(Value::Long)
                } else {
                    formats.parse(parsers[j], token)
                };
                let value = match parsed {
                    Some(value) => value,
                    None => {
                        log::warn!(
                            "from_source: {token:?} is not a valid {:?} for column {:?}, \
                             storing it as a string",
                            parsers[j],
                            names[j]
                        );
                        Value::from(token.as_str())
                    }
                };
                frame.set_value_at(i, j, value)?;
            }
            Ok(())
        };
        for (key, tokens) in sample {
            ingest(key, tokens)?;
        }
        while let Some(row) = next_checked(&mut source, names.len()) {
            let (key, tokens) = row?;
            ingest(key, tokens)?;
        }
        Ok(frame)
    }
}

fn next_checked<S: RowSource>(
    source: &mut S,
    width: usize,
) -> Option<TableResult<(S::Key, Vec<String>)>> {
    let row = source.next_row()?.and_then(|(key, tokens)| {
        if tokens.len() == width {
            Ok((key, tokens))
        } else {
            Err(anyhow::anyhow!(
                "row {key:?} holds {} fields but the source has {width} columns",
                tokens.len()
            ))
        }
    });
    Some(row.map_err(|source| TableError::Source {
        op: "from_source",
        source,
    }))
}
