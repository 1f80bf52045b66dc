//! Directories and properties Windows Installer already defines.

use wix_xml::NodeId;

use super::RuleContext;
use super::helpers::{attribute, remove_element, rename_element};
use crate::diagnostics::DiagnosticCode;
use crate::known::{is_standard_directory, is_standard_property};
use crate::namespaces::WXS;
use crate::surgery::SiblingSurgery;

pub fn convert_directory(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    let Some(id) = attribute(ctx, node, "Id") else {
        return;
    };

    if id == "TARGETDIR" {
        if !ctx.report(
            DiagnosticCode::TargetDirDeprecated,
            node,
            "The TARGETDIR directory is implicit and no longer needs to be defined. Its children move up a level.",
        ) {
            return;
        }
        let has_children = !ctx.doc.element_children(node).is_empty();
        if let Some(mut surgery) = SiblingSurgery::new(ctx.doc, node) {
            if has_children {
                surgery.unwrap_target();
            } else {
                surgery.remove_target();
            }
        }
        return;
    }

    if !is_standard_directory(&id) {
        return;
    }
    let message = format!(
        "Standard directory '{}' is defined by Windows Installer. Use the 'StandardDirectory' element to reference it.",
        id
    );
    if ctx.report(DiagnosticCode::DefiningStandardDirectoryDeprecated, node, message) {
        rename_element(ctx, node, WXS, "StandardDirectory");
        if let Some(el) = ctx.doc.element_mut(node) {
            el.attributes
                .retain(|a| a.is_namespace_declaration() || a.name.is(None, "Id"));
        }
    }
}

pub fn convert_directory_ref(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    let Some(id) = attribute(ctx, node, "Id") else {
        return;
    };
    if !is_standard_directory(&id) {
        return;
    }
    let message = format!(
        "The DirectoryRef to standard directory '{}' has been replaced. Use the 'StandardDirectory' element instead.",
        id
    );
    if ctx.report(DiagnosticCode::StandardDirectoryRefDeprecated, node, message) {
        rename_element(ctx, node, WXS, "StandardDirectory");
    }
}

pub fn convert_property_ref(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    let Some(id) = attribute(ctx, node, "Id") else {
        return;
    };
    if !is_standard_property(&id) {
        return;
    }
    let message = format!(
        "A PropertyRef to standard property '{}' is unnecessary and will be removed.",
        id
    );
    if ctx.report(DiagnosticCode::StandardPropertyRefUnnecessary, node, message) {
        remove_element(ctx, node);
    }
}

#[cfg(test)]
mod tests {
    use crate::{Converter, ConverterOptions, DiagnosticCode};

    fn convert(body: &str) -> (String, Vec<DiagnosticCode>) {
        let source = format!(
            "<Wix xmlns=\"http://wixtoolset.org/schemas/v4/wxs\">\n    <Fragment>\n        {}\n    </Fragment>\n</Wix>",
            body
        );
        let (out, diagnostics) = Converter::new(ConverterOptions::default()).convert_str(&source);
        (out, diagnostics.into_iter().map(|d| d.code).collect())
    }

    #[test]
    fn test_targetdir_is_unwrapped() {
        let (out, codes) = convert(
            "<Directory Id=\"TARGETDIR\" Name=\"SourceDir\">\n            <Directory Id=\"ProgramFilesFolder\">\n                <Directory Id=\"INSTALLFOLDER\" Name=\"App\"/>\n            </Directory>\n        </Directory>",
        );
        assert!(!out.contains("TARGETDIR"), "{out}");
        assert!(
            out.contains(r#"<StandardDirectory Id="ProgramFilesFolder">"#),
            "{out}"
        );
        assert!(out.contains(r#"<Directory Id="INSTALLFOLDER" Name="App"/>"#), "{out}");
        assert_eq!(
            codes,
            vec![
                DiagnosticCode::TargetDirDeprecated,
                DiagnosticCode::DefiningStandardDirectoryDeprecated,
            ]
        );
    }

    #[test]
    fn test_empty_targetdir_is_removed() {
        let (out, _) = convert(r#"<Directory Id="TARGETDIR" Name="SourceDir"/>"#);
        assert_eq!(
            out,
            "<Wix xmlns=\"http://wixtoolset.org/schemas/v4/wxs\">\n    <Fragment>\n    </Fragment>\n</Wix>"
        );
    }

    #[test]
    fn test_standard_directory_keeps_only_id() {
        let (out, _) = convert(r#"<Directory Id="ProgramMenuFolder" Name="PMenu"/>"#);
        assert!(out.contains(r#"<StandardDirectory Id="ProgramMenuFolder"/>"#), "{out}");
    }

    #[test]
    fn test_directory_ref() {
        let (out, _) = convert(r#"<DirectoryRef Id="DesktopFolder"/><DirectoryRef Id="MyDir"/>"#);
        assert!(out.contains(r#"<StandardDirectory Id="DesktopFolder"/>"#), "{out}");
        assert!(out.contains(r#"<DirectoryRef Id="MyDir"/>"#), "{out}");
    }

    #[test]
    fn test_standard_property_ref_removed() {
        let (out, codes) = convert(r#"<PropertyRef Id="VersionNT"/><PropertyRef Id="MY_PROP"/>"#);
        assert!(!out.contains("VersionNT"), "{out}");
        assert!(out.contains(r#"<PropertyRef Id="MY_PROP"/>"#), "{out}");
        assert_eq!(codes, vec![DiagnosticCode::StandardPropertyRefUnnecessary]);
    }
}
