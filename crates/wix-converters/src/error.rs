//! Boundary errors of the conversion session.
//!
//! These never escape [`Converter`](crate::Converter): loading and saving
//! failures are turned into `Unparsable` and `SaveFailed` diagnostics.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Xml(#[from] wix_xml::Error),
}

impl ConvertError {
    /// Source line the error points at, when there is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            ConvertError::Xml(err) => err.line(),
            ConvertError::Read { .. } | ConvertError::Write { .. } => None,
        }
    }
}
