use thiserror::Error;

/// Errors raised by the strict literal parser.
///
/// These never escape the extractors: [`crate::extract::literal::parse_cell_or_empty`]
/// maps every variant to an empty sequence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected end of input at offset {0}")]
    UnexpectedEnd(usize),

    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    #[error("invalid number {text:?} at offset {offset}")]
    InvalidNumber { text: String, offset: usize },

    #[error("invalid escape sequence at offset {0}")]
    InvalidEscape(usize),

    #[error("unknown name {0:?}")]
    UnknownName(String),

    #[error("unhashable dict key at offset {0}")]
    UnhashableKey(usize),

    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),

    #[error("trailing input at offset {0}")]
    TrailingInput(usize),

    /// The cell was not text (already typed as a number or bool).
    #[error("cell is not text")]
    NotText,
}

/// Contract violations: configuration naming something the table lacks.
///
/// Unlike [`ParseError`] these are fatal to a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("table '{table}' has no column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("table '{table}' already has a column '{column}'")]
    DuplicateColumn { table: String, column: String },
}

impl NormalizeError {
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// Problems found while loading or validating a [`crate::config::PipelineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("nested concept #{0} has an empty column name")]
    EmptyColumn(usize),

    #[error("output table name '{0}' is used more than once")]
    DuplicateTable(String),

    #[error("precision {0} is out of range (0..=12)")]
    Precision(u32),
}
