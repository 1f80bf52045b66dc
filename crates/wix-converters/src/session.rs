//! The conversion session: load a document, walk it, prune namespaces and
//! optionally write the result back.

use std::path::{Path, PathBuf};

use serde::Serialize;
use wix_xml::{Document, parse, to_xml_string};

use crate::diagnostics::{Diagnostic, DiagnosticCode, Mode, Reporter};
use crate::error::ConvertError;
use crate::namespaces::SourceVersion;
use crate::options::ConverterOptions;
use crate::prune::remove_unused_namespaces;
use crate::rules::RuleContext;
use crate::walker::walk;

/// Label used for in-memory sources.
const INPUT_LABEL: &str = "<input>";

/// Result of processing one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,

    /// Number of diagnostics reported, including ones whose fix was applied.
    pub count: usize,

    /// Whether the file was rewritten.
    pub saved: bool,

    pub diagnostics: Vec<Diagnostic>,
}

/// Converts and formats WiX source documents.
///
/// A `Converter` holds only configuration; every call builds its own
/// per-document state, so one converter can process any number of files.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConverterOptions,
}

impl Converter {
    pub fn new(options: ConverterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }

    /// Migrate a file to the current schema. With `fix`, the file is
    /// rewritten when anything was reported.
    pub fn convert_file(&self, path: &Path, fix: bool) -> FileOutcome {
        self.process_file(Mode::Convert, path, fix)
    }

    /// Canonicalize a file's formatting. With `fix`, the file is rewritten
    /// when anything was reported.
    pub fn format_file(&self, path: &Path, fix: bool) -> FileOutcome {
        self.process_file(Mode::Format, path, fix)
    }

    pub fn convert_document(&self, doc: &mut Document, path: &str) -> Vec<Diagnostic> {
        let mut reporter = Reporter::new(Mode::Convert, path, &self.options);
        self.run(doc, &mut reporter);
        reporter.into_diagnostics()
    }

    pub fn format_document(&self, doc: &mut Document, path: &str) -> Vec<Diagnostic> {
        let mut reporter = Reporter::new(Mode::Format, path, &self.options);
        self.run(doc, &mut reporter);
        reporter.into_diagnostics()
    }

    /// Convert markup held in memory. Unparsable input comes back unchanged
    /// with a single `Unparsable` diagnostic.
    pub fn convert_str(&self, source: &str) -> (String, Vec<Diagnostic>) {
        self.process_str(Mode::Convert, source)
    }

    /// Format markup held in memory. Unparsable input comes back unchanged
    /// with a single `Unparsable` diagnostic.
    pub fn format_str(&self, source: &str) -> (String, Vec<Diagnostic>) {
        self.process_str(Mode::Format, source)
    }

    fn process_str(&self, mode: Mode, source: &str) -> (String, Vec<Diagnostic>) {
        let mut reporter = Reporter::new(mode, INPUT_LABEL, &self.options);
        match parse(source) {
            Ok(mut doc) => {
                self.run(&mut doc, &mut reporter);
                (to_xml_string(&doc), reporter.into_diagnostics())
            }
            Err(err) => {
                let line = err.line();
                reporter.report(DiagnosticCode::Unparsable, line, err.to_string());
                (source.to_string(), reporter.into_diagnostics())
            }
        }
    }

    fn process_file(&self, mode: Mode, path: &Path, fix: bool) -> FileOutcome {
        let mut reporter = Reporter::new(mode, path.display().to_string(), &self.options);
        let mut saved = false;

        match load(path) {
            Ok(mut doc) => {
                self.run(&mut doc, &mut reporter);
                if fix && reporter.count() > 0 {
                    match save(path, &doc) {
                        Ok(()) => saved = true,
                        Err(err) => {
                            reporter.report(DiagnosticCode::SaveFailed, None, err.to_string());
                        }
                    }
                }
            }
            Err(err) => {
                let line = err.line();
                reporter.report(DiagnosticCode::Unparsable, line, err.to_string());
            }
        }

        tracing::info!(
            path = %path.display(),
            mode = %mode,
            count = reporter.count(),
            saved,
            "Processed file"
        );
        FileOutcome {
            path: path.to_path_buf(),
            count: reporter.count(),
            saved,
            diagnostics: reporter.into_diagnostics(),
        }
    }

    fn run<'o>(&'o self, doc: &mut Document, reporter: &mut Reporter<'o>) {
        let source_version = SourceVersion::detect(doc);
        tracing::debug!(?source_version, mode = %reporter.mode(), "Walking document");

        if doc.declaration.is_some()
            && reporter.report(
                DiagnosticCode::DeclarationPresent,
                Some(1),
                "The XML declaration is unnecessary and will be removed.",
            )
        {
            doc.declaration = None;
        }

        let mut ctx = RuleContext {
            doc: &mut *doc,
            reporter: &mut *reporter,
            options: &self.options,
            source_version,
        };
        walk(&mut ctx, Document::DOCUMENT, 0);

        remove_unused_namespaces(doc, reporter);
    }
}

fn load(path: &Path) -> Result<Document, ConvertError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConvertError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "Loaded file");
    Ok(parse(&content)?)
}

fn save(path: &Path, doc: &Document) -> Result<(), ConvertError> {
    std::fs::write(path, to_xml_string(doc)).map_err(|source| ConvertError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "Saved file");
    Ok(())
}
