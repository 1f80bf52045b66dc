//! `Product`, `Module` and software tags.

use wix_xml::NodeId;

use super::RuleContext;
use super::helpers::{
    attribute, local_name, new_element, remove_attribute, remove_obsolete_attribute,
    rename_element, set_attribute,
};
use crate::diagnostics::DiagnosticCode;
use crate::namespaces::WXS;
use crate::surgery::SiblingSurgery;

/// Old `Package` attributes that now live on `SummaryInformation`, with
/// their new names.
const SUMMARY_ATTRIBUTES: &[(&str, &str)] = &[
    ("Description", "Description"),
    ("Comments", "Comments"),
    ("Keywords", "Keywords"),
    ("Manufacturer", "Manufacturer"),
    ("SummaryCodepage", "Codepage"),
];

/// Old `Package` attributes that move up unchanged onto a new `Package`.
const PACKAGE_ATTRIBUTES: &[&str] = &["Compressed", "InstallerVersion", "InstallPrivileges"];

/// Old `Package` attributes that move up unchanged onto a `Module`.
const MODULE_ATTRIBUTES: &[&str] = &["InstallerVersion"];

pub fn convert_product(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    let package = ctx.doc.children_named(node, Some(WXS), "Package").first().copied();

    if !ctx.report(
        DiagnosticCode::ProductAndPackageRenamed,
        node,
        "The Product and Package elements have been merged. Use the 'Package' element instead.",
    ) {
        return;
    }
    rename_element(ctx, node, WXS, "Package");

    match attribute(ctx, node, "Id").as_deref() {
        Some("*") => {
            if ctx.report(
                DiagnosticCode::ProductIdObsolete,
                node,
                "The Product/@Id=\"*\" value is the default and will be removed.",
            ) {
                remove_attribute(ctx, node, "Id");
            }
        }
        Some(_) if attribute(ctx, node, "ProductCode").is_none() => {
            if ctx.report(
                DiagnosticCode::ProductIdObsolete,
                node,
                "The Product/@Id attribute has been renamed. Use the 'ProductCode' attribute instead.",
            ) {
                if let Some(el) = ctx.doc.element_mut(node) {
                    el.rename_attribute("Id", "ProductCode");
                }
            }
        }
        _ => {}
    }

    if let Some(package) = package {
        if remove_package_code(ctx, package) {
            merge_package(ctx, node, package, PACKAGE_ATTRIBUTES);
        }
    }
}

pub fn convert_module(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    let Some(package) = ctx.doc.children_named(node, Some(WXS), "Package").first().copied() else {
        return;
    };
    if !ctx.report(
        DiagnosticCode::ModulePackageMerged,
        package,
        "The Package element is obsolete in modules. Its attributes move to Module and SummaryInformation.",
    ) {
        return;
    }

    if let Some(guid) = attribute(ctx, package, "Id") {
        if attribute(ctx, node, "Guid").is_none()
            && ctx.report(
                DiagnosticCode::PackageAttributeMoved,
                package,
                "The Package/@Id attribute moves to Module/@Guid.",
            )
        {
            set_attribute(ctx, node, "Guid", &guid);
            remove_attribute(ctx, package, "Id");
        }
    }

    merge_package(ctx, node, package, MODULE_ATTRIBUTES);
}

/// The old `Package/@Id` of a product is a package code, which is now always
/// generated. Returns false when the package still carries it.
fn remove_package_code(ctx: &mut RuleContext<'_, '_>, package: NodeId) -> bool {
    if attribute(ctx, package, "Id").is_none() {
        return true;
    }
    if ctx.report(
        DiagnosticCode::ProductIdObsolete,
        package,
        "The Package/@Id attribute is obsolete. Package codes are always generated.",
    ) {
        remove_attribute(ctx, package, "Id");
        return true;
    }
    false
}

/// Fold an old `Package` child into `parent`: summary attributes go to a new
/// `SummaryInformation` element and the attributes in `moved` go to `parent`.
/// Anything else stays on the child, which is removed only once nothing is
/// left on it.
fn merge_package(ctx: &mut RuleContext<'_, '_>, parent: NodeId, package: NodeId, moved: &[&str]) {
    let names: Vec<String> = ctx
        .doc
        .element(package)
        .map(|el| {
            el.attributes
                .iter()
                .filter(|a| a.name.namespace.is_none())
                .map(|a| a.name.local.clone())
                .collect()
        })
        .unwrap_or_default();
    let parent_name = local_name(ctx, parent);

    let mut summary: Vec<(&str, String)> = Vec::new();
    for name in names {
        if let Some((_, new_name)) = SUMMARY_ATTRIBUTES.iter().find(|(old, _)| *old == name) {
            if let Some(value) = attribute(ctx, package, &name) {
                summary.push((*new_name, value));
            }
            continue;
        }

        match name.as_str() {
            "Platform" => {
                remove_obsolete_attribute(
                    ctx,
                    package,
                    "Platform",
                    DiagnosticCode::PackagePlatformObsolete,
                );
            }
            "InstallScope" => {
                if attribute(ctx, parent, "Scope").is_none()
                    && ctx.report(
                        DiagnosticCode::InstallScopeRenamed,
                        package,
                        format!(
                            "The Package/@InstallScope attribute moves to {}/@Scope.",
                            parent_name
                        ),
                    )
                {
                    if let Some(value) = remove_attribute(ctx, package, "InstallScope") {
                        set_attribute(ctx, parent, "Scope", &value);
                    }
                }
            }
            other if !moved.contains(&other) => {
                ctx.report(
                    DiagnosticCode::PackageAttributeNotConvertible,
                    package,
                    format!(
                        "The Package/@{} attribute has no counterpart on {} and must be converted by hand.",
                        other, parent_name
                    ),
                );
            }
            other => {
                if attribute(ctx, parent, other).is_none()
                    && ctx.report(
                        DiagnosticCode::PackageAttributeMoved,
                        package,
                        format!(
                            "The Package/@{} attribute is now set on the parent {} element.",
                            other, parent_name
                        ),
                    )
                {
                    if let Some(value) = remove_attribute(ctx, package, other) {
                        set_attribute(ctx, parent, other, &value);
                    }
                }
            }
        }
    }

    let mut summary_node = None;
    if !summary.is_empty()
        && ctx.report(
            DiagnosticCode::SummaryInformationCreated,
            package,
            "Descriptive Package attributes move to a SummaryInformation element.",
        )
    {
        for (new_name, _) in &summary {
            let old_name = SUMMARY_ATTRIBUTES
                .iter()
                .find(|(_, n)| n == new_name)
                .map_or(*new_name, |(o, _)| *o);
            remove_attribute(ctx, package, old_name);
        }
        summary_node = Some(new_element(ctx, WXS, "SummaryInformation", &summary));
    }

    let emptied = ctx.doc.element(package).is_some_and(|el| {
        el.attributes.iter().all(|a| a.is_namespace_declaration())
    }) && ctx.doc.element_children(package).is_empty();

    let Some(mut surgery) = SiblingSurgery::new(ctx.doc, package) else {
        return;
    };
    match (summary_node, emptied) {
        (Some(summary), true) => surgery.replace_target(summary),
        (Some(summary), false) => surgery.insert_before_target(&[summary]),
        (None, true) => surgery.remove_target(),
        (None, false) => {}
    }
}

pub fn convert_tag(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    if !ctx.report(
        DiagnosticCode::TagElementRenamed,
        node,
        "The Tag element has been renamed. Use the 'SoftwareTag' element instead.",
    ) {
        return;
    }
    rename_element(ctx, node, WXS, "SoftwareTag");
    remove_obsolete_attribute(ctx, node, "Licensed", DiagnosticCode::SoftwareTagLicensedObsolete);
    remove_obsolete_attribute(ctx, node, "Type", DiagnosticCode::SoftwareTagTypeObsolete);
}

pub fn convert_tag_ref(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    if ctx.report(
        DiagnosticCode::TagElementRenamed,
        node,
        "The TagRef element has been renamed. Use the 'SoftwareTagRef' element instead.",
    ) {
        rename_element(ctx, node, WXS, "SoftwareTagRef");
    }
}

#[cfg(test)]
mod tests {
    use crate::{Converter, ConverterOptions, DiagnosticCode};

    fn convert(source: &str) -> (String, Vec<DiagnosticCode>) {
        let (out, diagnostics) = Converter::new(ConverterOptions::default()).convert_str(source);
        (out, diagnostics.into_iter().map(|d| d.code).collect())
    }

    #[test]
    fn test_unknown_package_attributes_stay_on_child() {
        let source = r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs"><Product Id="*" Name="App" Language="1033"><Package InstallerVersion="500" Languages="1033" Platforms="Intel" SummaryCodepage="1252"/></Product></Wix>"#;
        let (out, codes) = convert(source);
        assert_eq!(
            out,
            r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs"><Package Name="App" Language="1033" InstallerVersion="500"><SummaryInformation Codepage="1252"/><Package Languages="1033" Platforms="Intel"/></Package></Wix>"#
        );
        let moved = codes
            .iter()
            .filter(|c| **c == DiagnosticCode::PackageAttributeMoved)
            .count();
        let manual = codes
            .iter()
            .filter(|c| **c == DiagnosticCode::PackageAttributeNotConvertible)
            .count();
        assert_eq!(moved, 1);
        assert_eq!(manual, 2);
    }

    #[test]
    fn test_module_keeps_package_only_attributes() {
        let source = r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs"><Module Id="M" Language="1033" Version="1.0"><Package Id="GUID-1" InstallerVersion="200" Compressed="yes"/></Module></Wix>"#;
        let (out, codes) = convert(source);
        assert_eq!(
            out,
            r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs"><Module Id="M" Language="1033" Version="1.0" Guid="GUID-1" InstallerVersion="200"><Package Compressed="yes"/></Module></Wix>"#
        );
        assert!(codes.contains(&DiagnosticCode::PackageAttributeNotConvertible));
    }
}
