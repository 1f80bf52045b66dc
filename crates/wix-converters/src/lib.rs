//! Migration of WiX v3 source documents to the v4 schema, and canonical
//! formatting of WiX source.
//!
//! [`Converter`] is the entry point. Converting rewrites legacy namespaces,
//! elements and attributes; formatting only touches whitespace and the XML
//! declaration. Both report every change as a [`Diagnostic`] and can write
//! the result back to disk.
//!
//! ```
//! use wix_converters::{Converter, ConverterOptions, DiagnosticCode};
//!
//! let source = r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs"><Fragment><File src="a.txt"/></Fragment></Wix>"#;
//! let (converted, diagnostics) = Converter::new(ConverterOptions::default()).convert_str(source);
//!
//! assert_eq!(
//!     converted,
//!     r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs"><Fragment><File Source="a.txt"/></Fragment></Wix>"#
//! );
//! assert_eq!(diagnostics[0].code, DiagnosticCode::SrcAttributeRenamed);
//! ```

pub mod diagnostics;
pub mod error;
pub mod known;
pub mod namespaces;
pub mod options;
pub mod prune;
pub mod rules;
pub mod session;
pub mod surgery;
pub mod walker;
pub mod whitespace;

pub use diagnostics::{Applicability, Diagnostic, DiagnosticCode, Mode, Reporter, Severity};
pub use error::ConvertError;
pub use namespaces::SourceVersion;
pub use options::{ConverterOptions, CustomTableSetting};
pub use session::{Converter, FileOutcome};
