//! Error types for XML loading.

use thiserror::Error;

/// Result type alias for wix-xml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading a document.
///
/// Every variant carries the 1-based line where the problem was detected
/// when one is known.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// XML syntax error from quick-xml.
    #[error("XML syntax error: {message}")]
    XmlSyntax { message: String, line: Option<usize> },

    /// The input ended while elements were still open.
    #[error("Unexpected end of input, expected closing tag </{expected}>")]
    UnexpectedEof { expected: String, line: Option<usize> },

    /// End tag does not match the open element.
    #[error("Mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedEndTag {
        expected: String,
        found: String,
        line: Option<usize>,
    },

    /// A prefix is used without a declaration in scope.
    #[error("The prefix '{prefix}' is not bound to a namespace")]
    UnboundPrefix { prefix: String, line: Option<usize> },

    /// The same attribute appears twice on one element.
    #[error("Duplicate attribute '{name}'")]
    DuplicateAttribute { name: String, line: Option<usize> },

    /// Text or other content outside the root element that XML forbids there.
    #[error("Invalid XML structure: {message}")]
    InvalidStructure { message: String, line: Option<usize> },

    /// Empty document (no root element).
    #[error("Empty XML document: no root element found")]
    EmptyDocument,

    /// Multiple root elements.
    #[error("Invalid XML: multiple root elements")]
    MultipleRoots { line: Option<usize> },
}

impl Error {
    /// Line where the error was detected, if known.
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::XmlSyntax { line, .. }
            | Error::UnexpectedEof { line, .. }
            | Error::MismatchedEndTag { line, .. }
            | Error::UnboundPrefix { line, .. }
            | Error::DuplicateAttribute { line, .. }
            | Error::InvalidStructure { line, .. }
            | Error::MultipleRoots { line } => *line,
            Error::EmptyDocument => None,
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlSyntax {
            message: err.to_string(),
            line: None,
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlSyntax {
            message: format!("Attribute error: {}", err),
            line: None,
        }
    }
}
