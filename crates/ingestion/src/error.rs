//! URL classification errors

use std::fmt;
use std::num::ParseIntError;

use contracts::TimestampError;
use thiserror::Error;

/// Wire grammar a path was matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    Ndjson,
    Resolved,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ndjson => f.write_str("ndjson"),
            Self::Resolved => f.write_str("resolved"),
        }
    }
}

/// A path did not match one grammar.
///
/// Structural and permanent: the same path never becomes parseable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    /// Path shape does not fit the grammar
    #[error("can't parse url {path:?} as {grammar}: {reason}")]
    Mismatch {
        grammar: Grammar,
        path: String,
        reason: &'static str,
    },

    /// Timestamp block has the right shape but does not decode
    #[error("can't parse url {path:?} as {grammar}: {source}")]
    Timestamp {
        grammar: Grammar,
        path: String,
        #[source]
        source: TimestampError,
    },

    /// Id field is empty or contains non-digits
    #[error("can't parse url {path:?} as {grammar}: {field} {value:?} must be digits")]
    NotDigits {
        grammar: Grammar,
        path: String,
        field: &'static str,
        value: String,
    },

    /// Digit-only field overflows
    #[error("can't parse url {path:?} as {grammar}: {field} {value:?}: {source}")]
    Number {
        grammar: Grammar,
        path: String,
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

impl UrlError {
    /// Grammar that produced this error
    pub fn grammar(&self) -> Grammar {
        match self {
            Self::Mismatch { grammar, .. }
            | Self::Timestamp { grammar, .. }
            | Self::NotDigits { grammar, .. }
            | Self::Number { grammar, .. } => *grammar,
        }
    }
}

/// Neither grammar matched; carries both attempts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("URL pattern does not match either an ndjson ({ndjson}) or a resolved ({resolved})")]
pub struct UnrecognizedUrl {
    pub path: String,
    pub ndjson: UrlError,
    pub resolved: UrlError,
}
