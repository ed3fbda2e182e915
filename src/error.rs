use thiserror::Error;

/// Fatal errors raised while parsing or building a query.
///
/// Every variant maps to a stable numeric code through [`InvalidQueryError::code`],
/// which front ends use to pick a localized message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidQueryError {
    #[error("Missing SELECT keyword")]
    MissingSelect,

    #[error("Missing FROM keyword")]
    MissingFrom,

    #[error("No table defined")]
    EmptyFrom,

    #[error("Nothing SELECTed")]
    EmptySelect,

    #[error("Unbalanced parentheses in SELECT list at position {position}")]
    UnbalancedParentheses { position: usize },

    #[error("Unterminated string literal starting at position {position}")]
    UnterminatedLiteral { position: usize },

    #[error("Invalid {clause} value '{value}'")]
    InvalidLimit { clause: &'static str, value: String },

    #[error("A uid field must be selected when using DISTINCT")]
    MissingUid,

    #[error("No match found for table {table} from component {component}")]
    UnknownTable { table: String, component: String },

    #[error("Table {table} has no index \"{index}\"")]
    UnknownIndex { table: String, index: String },

    #[error("Empty fulltext search condition")]
    EmptySearch,

    #[error("Unknown condition operator '{0}'")]
    UnknownOperator(String),
}

impl InvalidQueryError {
    pub fn code(&self) -> u32 {
        match self {
            InvalidQueryError::MissingSelect => 1272556228,
            InvalidQueryError::MissingFrom => 1272556601,
            InvalidQueryError::EmptyFrom => 1280323639,
            InvalidQueryError::EmptySelect => 1280323976,
            InvalidQueryError::UnbalancedParentheses { .. } => 1272954424,
            InvalidQueryError::UnterminatedLiteral { .. } => 1272954425,
            InvalidQueryError::InvalidLimit { .. } => 1272954426,
            InvalidQueryError::MissingUid => 1313354033,
            InvalidQueryError::UnknownTable { .. } => 1291753564,
            InvalidQueryError::UnknownIndex { .. } => 1421769189,
            InvalidQueryError::EmptySearch => 1423068811,
            InvalidQueryError::UnknownOperator(_) => 1291753565,
        }
    }

    pub fn err<T>(self) -> Result<T, InvalidQueryError> {
        Err(self)
    }
}

/// Failure reported by a schema or policy collaborator.
///
/// The builder never propagates these; the affected mechanism is skipped instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ProviderError(pub String);

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}
