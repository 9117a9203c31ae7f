//! Result rows and nullable column values.

use thiserror::Error;

/// Errors raised while decoding a row into samples.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    /// Row width differs from what the query selects.
    #[error("expected {expected} columns, got {found}")]
    ColumnCount { expected: usize, found: usize },

    /// A numeric column held something that is not a number.
    #[error("column {column}: cannot convert {value:?} to float")]
    InvalidNumber { column: usize, value: String },
}

/// A nullable scalar read from one result column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL null.
    Null,
    /// Textual value. Numeric columns arrive as text from the SQL API.
    Text(String),
    /// Numeric value.
    Number(f64),
}

impl Value {
    /// Decode as a nullable float.
    ///
    /// `Null` yields `None`; text must parse as a float.
    pub fn as_f64(&self, column: usize) -> Result<Option<f64>, DecodeError> {
        match self {
            Self::Null => Ok(None),
            Self::Number(n) => Ok(Some(*n)),
            Self::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| DecodeError::InvalidNumber {
                    column,
                    value: s.clone(),
                }),
        }
    }

    /// Render as a label value. Null renders as the empty string.
    pub fn to_label(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

impl From<Option<String>> for Value {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Null, Self::Text)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// One result row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Create a row from its column values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Borrow the columns, checking the row has exactly `N` of them.
    pub fn columns<const N: usize>(&self) -> Result<&[Value; N], DecodeError> {
        self.values
            .as_slice()
            .try_into()
            .map_err(|_| DecodeError::ColumnCount {
                expected: N,
                found: self.values.len(),
            })
    }
}

impl FromIterator<Value> for Row {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Build a [`Row`] from expressions convertible into [`Value`].
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        $crate::collector::Row::new(vec![$($crate::collector::Value::from($value)),*])
    };
}
