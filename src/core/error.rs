use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TinbergenError {
    #[error("Parse error at byte {position}: {detail}")]
    ParseError { position: usize, detail: String },
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Lookup error: {0}")]
    LookupError(String),
    #[error("Definition error on line {line}")]
    DefinitionError {
        line: usize,
        #[source]
        source: Box<TinbergenError>,
    },
    #[error("Document error: {0}")]
    DocumentError(String),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

impl TinbergenError {
    pub(crate) fn parse(position: usize, detail: impl Into<String>) -> Self {
        TinbergenError::ParseError {
            position,
            detail: detail.into(),
        }
    }

    pub(crate) fn at_line(line: usize, source: TinbergenError) -> Self {
        TinbergenError::DefinitionError {
            line,
            source: Box::new(source),
        }
    }

    /// Innermost error, looking through `DefinitionError` wrappers.
    pub fn root_cause(&self) -> &TinbergenError {
        match self {
            TinbergenError::DefinitionError { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
