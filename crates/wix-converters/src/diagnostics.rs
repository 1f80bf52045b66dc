//! Diagnostic codes, severities and the per-document reporter.
//!
//! Every change the converter makes is announced through [`Reporter::report`]
//! first. The reporter decides whether the change is allowed (the code may be
//! ignored, or belong to the other mode) and records what it allowed.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::options::ConverterOptions;

/// Which operation a diagnostic code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Applicability {
    /// Only reported when formatting.
    FormatOnly,
    /// Reported by both operations.
    Both,
    /// Only reported when converting.
    ConvertOnly,
}

/// The operation a session is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Convert,
    Format,
}

impl Mode {
    /// Whether a code with the given applicability may be reported in this mode.
    pub fn allows(self, applicability: Applicability) -> bool {
        match (self, applicability) {
            (_, Applicability::Both) => true,
            (Mode::Convert, Applicability::ConvertOnly) => true,
            (Mode::Format, Applicability::FormatOnly) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Convert => write!(f, "convert"),
            Mode::Format => write!(f, "format"),
        }
    }
}

/// Severity of a surfaced diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

macro_rules! diagnostic_codes {
    ($( $(#[$meta:meta])* $code:ident ($applicability:ident) => $summary:literal, )*) => {
        /// Every kind of problem the converter can report.
        ///
        /// Variants are declared format-only first, then shared, then
        /// convert-only. Each variant's [`Applicability`] is listed next to it
        /// rather than derived from its position.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum DiagnosticCode {
            $( $(#[$meta])* $code, )*
        }

        impl DiagnosticCode {
            /// All codes in declaration order.
            pub const ALL: &'static [DiagnosticCode] = &[ $( DiagnosticCode::$code, )* ];

            pub fn name(self) -> &'static str {
                match self {
                    $( DiagnosticCode::$code => stringify!($code), )*
                }
            }

            /// One-line description, shown by `list-checks`.
            pub fn summary(self) -> &'static str {
                match self {
                    $( DiagnosticCode::$code => $summary, )*
                }
            }

            pub fn applicability(self) -> Applicability {
                match self {
                    $( DiagnosticCode::$code => Applicability::$applicability, )*
                }
            }
        }
    };
}

diagnostic_codes! {
    WhitespacePrecedingCDATAWrong(FormatOnly) => "Whitespace before a CDATA section is removed",
    WhitespacePrecedingNodeWrong(FormatOnly) => "Indentation before an element, comment or processing instruction is wrong",
    NotEmptyElement(FormatOnly) => "Element containing only whitespace is made empty",
    WhitespaceFollowingCDATAWrong(FormatOnly) => "Whitespace after a CDATA section is removed",
    WhitespacePrecedingEndElementWrong(FormatOnly) => "Indentation before a closing tag is wrong",

    /// The document could not be loaded.
    Unparsable(Both) => "The document is not well-formed XML",
    /// The converted document could not be written back.
    SaveFailed(Both) => "The converted document could not be saved",
    DeclarationPresent(Both) => "The XML declaration is unnecessary",
    UnusedNamespaceDeclaration(Both) => "A namespace is declared but never used",

    XmlnsMissing(ConvertOnly) => "The root element has no WiX namespace",
    XmlnsValueWrong(ConvertOnly) => "A namespace declaration uses a deprecated namespace",
    ProductAndPackageRenamed(ConvertOnly) => "Product is renamed to Package",
    ProductIdObsolete(ConvertOnly) => "Product/@Id is replaced by Package/@ProductCode",
    PackageAttributeMoved(ConvertOnly) => "An attribute moves from the old Package element to its parent",
    PackageAttributeNotConvertible(ConvertOnly) => "An old Package attribute has no place in the new schema",
    InstallScopeRenamed(ConvertOnly) => "Package/@InstallScope is renamed to Scope",
    PackagePlatformObsolete(ConvertOnly) => "Package/@Platform is obsolete",
    SummaryInformationCreated(ConvertOnly) => "Descriptive attributes move to SummaryInformation",
    ModulePackageMerged(ConvertOnly) => "The Package child of Module is merged into Module",
    TagElementRenamed(ConvertOnly) => "Tag is renamed to SoftwareTag",
    SoftwareTagLicensedObsolete(ConvertOnly) => "SoftwareTag/@Licensed is obsolete",
    SoftwareTagTypeObsolete(ConvertOnly) => "SoftwareTag/@Type is obsolete",
    InnerTextDeprecated(ConvertOnly) => "Inner text moves to an attribute",
    MultiStringValueRenamed(ConvertOnly) => "MultiStringValue is renamed to MultiString",
    ComponentConditionMoved(ConvertOnly) => "Component condition moves to Component/@Condition",
    FeatureConditionRenamed(ConvertOnly) => "Feature condition is renamed to Level",
    LaunchConditionRenamed(ConvertOnly) => "Launch condition is renamed to Launch",
    ConditionNotConvertible(ConvertOnly) => "Condition cannot be converted automatically",
    ControlConditionMoved(ConvertOnly) => "Control condition moves to a Control attribute",
    ControlConditionActionUnknown(ConvertOnly) => "Control condition has an unknown action",
    ControlTextMoved(ConvertOnly) => "Control Text element moves to Control/@Text",
    FeatureAbsentRenamed(ConvertOnly) => "Feature/@Absent is replaced by AllowAbsent",
    FeatureAbsentValueUnknown(ConvertOnly) => "Feature/@Absent has an unknown value",
    FeatureAllowAdvertiseSystemObsolete(ConvertOnly) => "Feature/@AllowAdvertise=\"system\" is obsolete",
    TargetDirDeprecated(ConvertOnly) => "The TARGETDIR directory is implicit",
    DefiningStandardDirectoryDeprecated(ConvertOnly) => "Standard directories are referenced with StandardDirectory",
    StandardDirectoryRefDeprecated(ConvertOnly) => "DirectoryRef to a standard directory is replaced by StandardDirectory",
    StandardPropertyRefUnnecessary(ConvertOnly) => "PropertyRef to a standard property is unnecessary",
    CustomActionKeysRenamed(ConvertOnly) => "CustomAction BinaryKey/FileKey are renamed",
    Win64AttributeRenamed(ConvertOnly) => "Win64 is replaced by Bitness",
    Win64AttributeValueUnknown(ConvertOnly) => "Win64 has a value that cannot be converted",
    InlineScriptNotConvertible(ConvertOnly) => "Inline script custom actions cannot be converted",
    SrcAttributeRenamed(ConvertOnly) => "File/@src is renamed to Source",
    RegistryKeyActionObsolete(ConvertOnly) => "RegistryKey/@Action is obsolete",
    RegistryKeyActionValueUnknown(ConvertOnly) => "RegistryKey/@Action has an unknown value",
    AttributeValueCaseWrong(ConvertOnly) => "An enumerated attribute value has the wrong case",
    BootstrapperApplicationRefRenamed(ConvertOnly) => "BootstrapperApplicationRef is renamed to BootstrapperApplication",
    WixStandardBootstrapperApplicationCreated(ConvertOnly) => "A WixStandardBootstrapperApplication element is created",
    BootstrapperApplicationRefNotConvertible(ConvertOnly) => "BootstrapperApplicationRef cannot be converted automatically",
    ExePackageCommandRenamed(ConvertOnly) => "ExePackage command attributes are renamed to arguments",
    SuppressSignatureValidationDeprecated(ConvertOnly) => "SuppressSignatureValidation is obsolete",
    RemotePayloadRenamed(ConvertOnly) => "RemotePayload is renamed to a package payload",
    RemotePayloadParentUnknown(ConvertOnly) => "RemotePayload has a parent that cannot be converted",
    PayloadAttributeMoved(ConvertOnly) => "A package attribute moves to its payload",
    RemotePayloadCertificateObsolete(ConvertOnly) => "RemotePayload certificate attributes are obsolete",
    CustomTableNotAlwaysConvertable(ConvertOnly) => "CustomTable needs --custom-table to be converted",
    CustomTableRenamed(ConvertOnly) => "CustomTable is converted to bundle custom data",
    CustomTableRefRenamed(ConvertOnly) => "CustomTableRef is converted to BundleCustomDataRef",
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown diagnostic code: {0}")]
pub struct UnknownDiagnosticCode(pub String);

impl FromStr for DiagnosticCode {
    type Err = UnknownDiagnosticCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiagnosticCode::ALL
            .iter()
            .copied()
            .find(|code| code.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownDiagnosticCode(s.to_string()))
    }
}

/// A surfaced diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub path: String,

    /// 1-based source line; absent for whole-document problems.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}({})", self.path, line)?,
            None => write!(f, "{}", self.path)?,
        }
        write!(f, " : {} {} : {}", self.severity, self.code, self.message)
    }
}

/// Collects the diagnostics of one document.
#[derive(Debug)]
pub struct Reporter<'o> {
    mode: Mode,
    path: String,
    warnings: &'o HashSet<DiagnosticCode>,
    ignored: &'o HashSet<DiagnosticCode>,
    count: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'o> Reporter<'o> {
    pub fn new(mode: Mode, path: impl Into<String>, options: &'o ConverterOptions) -> Self {
        Self {
            mode,
            path: path.into(),
            warnings: &options.warnings,
            ignored: &options.ignored,
            count: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Report a problem and ask whether the paired change may be made.
    ///
    /// Returns false, and records nothing, when the code is ignored or
    /// belongs to the other mode. Otherwise the count goes up by one and the
    /// diagnostic is kept.
    pub fn report(
        &mut self,
        code: DiagnosticCode,
        line: Option<usize>,
        message: impl Into<String>,
    ) -> bool {
        if self.ignored.contains(&code) || !self.mode.allows(code.applicability()) {
            return false;
        }

        self.count += 1;
        let severity = if self.warnings.contains(&code) {
            Severity::Warning
        } else {
            Severity::Error
        };

        let diagnostic = Diagnostic {
            code,
            severity,
            path: self.path.clone(),
            line,
            message: message.into(),
        };
        tracing::debug!(code = %code, line = ?line, "{}", diagnostic.message);
        self.diagnostics.push(diagnostic);

        true
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
