//! Error taxonomy for hio.
//!
//! Public functions return `anyhow::Result`; the variants below are attached
//! to those errors so callers can classify them with
//! `err.downcast_ref::<HioError>()`. Seek/sync/close failures stay
//! `std::io::Error` wrapped with context naming the operation.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HioError {
    /// Header or footer record missing or malformed.
    #[error("hio: could not open [{path}]: {reason}")]
    Open { path: String, reason: String },

    #[error("hio: no such key [{name}]")]
    NotFound { name: String },

    /// Mutation attempted on a container opened read-only.
    #[error("hio: {op}({name}) on a read-only file")]
    ReadOnly { op: &'static str, name: String },

    #[error("hio: type mismatch for [{name}]: requested {expected}, stored {found}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("hio: encode [{name}]: {reason}")]
    Encode { name: String, reason: String },

    #[error("hio: decode [{name}]: {reason}")]
    Decode { name: String, reason: String },

    /// Not a failure: every row of the table has been read.
    #[error("hio: end of table [{name}]")]
    EndOfTable { name: String },
}

impl HioError {
    pub fn not_found(name: &str) -> Self {
        HioError::NotFound {
            name: name.to_string(),
        }
    }

    pub fn encode(name: &str, reason: impl ToString) -> Self {
        HioError::Encode {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn decode(name: &str, reason: impl ToString) -> Self {
        HioError::Decode {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Record stream state errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RioError {
    #[error("rio: record [{record}] already connected to block [{block}]")]
    BlockConnected { record: String, block: String },

    #[error("rio: record [{record}] has no connected block")]
    NotConnected { record: String },

    #[error("rio: stream [{path}] is not open for {op}")]
    WrongMode { path: String, op: &'static str },

    #[error("rio: stream [{path}] is closed")]
    Closed { path: String },
}

/// True when `err` is the end-of-table sentinel returned by `Table::read`.
pub fn is_end_of_table(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<HioError>(),
        Some(HioError::EndOfTable { .. })
    )
}

/// Shorthand used by tests and callers: the `HioError` carried by `err`, if any.
pub fn hio_error(err: &anyhow::Error) -> Option<&HioError> {
    err.downcast_ref::<HioError>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_of_table_is_detected_through_anyhow() {
        let e: anyhow::Error = HioError::EndOfTable {
            name: "t".into(),
        }
        .into();
        assert!(is_end_of_table(&e));

        let e: anyhow::Error = HioError::not_found("x").into();
        assert!(!is_end_of_table(&e));
        assert_eq!(hio_error(&e), Some(&HioError::not_found("x")));
    }

    #[test]
    fn context_keeps_the_typed_error() {
        use anyhow::Context;
        let r: anyhow::Result<()> = Err(HioError::not_found("k").into());
        let e = r.context("get k").unwrap_err();
        assert!(matches!(hio_error(&e), Some(HioError::NotFound { .. })));
    }
}
