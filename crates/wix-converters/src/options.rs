//! Converter configuration.

use std::collections::HashSet;

use serde::Deserialize;

use crate::diagnostics::DiagnosticCode;

/// How `CustomTable` elements should be converted.
///
/// A v3 `CustomTable` may describe either an MSI table or bundle custom data,
/// and the source alone does not say which.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomTableSetting {
    /// Leave tables with inline data unconverted and report them.
    #[default]
    NotSet,
    /// Convert to `BundleCustomData` and friends.
    Bundle,
    /// Keep as MSI custom tables.
    Msi,
}

/// Settings shared by every document a [`Converter`](crate::Converter) processes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConverterOptions {
    /// Spaces per nesting level.
    pub indentation_amount: usize,

    /// Codes reported as warnings instead of errors.
    pub warnings: HashSet<DiagnosticCode>,

    /// Codes that are neither reported nor acted upon.
    pub ignored: HashSet<DiagnosticCode>,

    pub custom_table: CustomTableSetting,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            indentation_amount: 4,
            warnings: HashSet::new(),
            ignored: HashSet::new(),
            custom_table: CustomTableSetting::NotSet,
        }
    }
}

impl ConverterOptions {
    pub fn with_indentation(mut self, amount: usize) -> Self {
        self.indentation_amount = amount;
        self
    }

    pub fn with_warnings(mut self, codes: impl IntoIterator<Item = DiagnosticCode>) -> Self {
        self.warnings.extend(codes);
        self
    }

    pub fn with_ignored(mut self, codes: impl IntoIterator<Item = DiagnosticCode>) -> Self {
        self.ignored.extend(codes);
        self
    }

    pub fn with_custom_table(mut self, setting: CustomTableSetting) -> Self {
        self.custom_table = setting;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ConverterOptions::default();
        assert_eq!(options.indentation_amount, 4);
        assert!(options.warnings.is_empty());
        assert_eq!(options.custom_table, CustomTableSetting::NotSet);
    }

    #[test]
    fn test_deserialize_partial_settings() {
        let options: ConverterOptions = serde_json::from_str(
            r#"{"indentation-amount": 2, "ignored": ["DeclarationPresent"], "custom-table": "bundle"}"#,
        )
        .unwrap();
        assert_eq!(options.indentation_amount, 2);
        assert!(options.ignored.contains(&DiagnosticCode::DeclarationPresent));
        assert_eq!(options.custom_table, CustomTableSetting::Bundle);
        assert!(options.warnings.is_empty());
    }
}
