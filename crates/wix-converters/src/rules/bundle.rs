//! Bundle authoring: the standard bootstrapper application, chain packages
//! and their remote payloads.

use wix_xml::NodeId;

use super::RuleContext;
use super::helpers::{
    append_indented_child, attribute, local_name, lowercase_first, new_element,
    remove_attribute, remove_obsolete_attribute, rename_attribute, rename_element, set_attribute,
};
use crate::diagnostics::DiagnosticCode;
use crate::namespaces::{BAL, SourceVersion, WXS, ensure_root_declaration};

const STANDARD_BA_PREFIX: &str = "WixStandardBootstrapperApplication.";

pub fn convert_bootstrapper_application_ref(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    let id = attribute(ctx, node, "Id").unwrap_or_default();
    let Some(variant) = id.strip_prefix(STANDARD_BA_PREFIX).filter(|v| !v.is_empty()) else {
        // Other references are still valid once the source is v4.
        if ctx.source_version != SourceVersion::V3 {
            return;
        }
        ctx.report(
            DiagnosticCode::BootstrapperApplicationRefNotConvertible,
            node,
            format!(
                "BootstrapperApplicationRef '{}' cannot be converted automatically. Use a 'BootstrapperApplication' element with the extension's bootstrapper application child.",
                id
            ),
        );
        return;
    };
    let theme = lowercase_first(variant).unwrap_or_else(|| variant.to_string());

    if !ctx.report(
        DiagnosticCode::BootstrapperApplicationRefRenamed,
        node,
        "The BootstrapperApplicationRef element has been renamed. Use the 'BootstrapperApplication' element instead.",
    ) {
        return;
    }
    rename_element(ctx, node, WXS, "BootstrapperApplication");
    remove_attribute(ctx, node, "Id");

    let existing = ctx
        .doc
        .children_named(node, Some(BAL), "WixStandardBootstrapperApplication")
        .first()
        .copied();
    match existing {
        Some(standard) => {
            if attribute(ctx, standard, "Theme").is_none() {
                set_attribute(ctx, standard, "Theme", &theme);
            }
        }
        None => {
            let message = format!(
                "A bal:WixStandardBootstrapperApplication element with Theme=\"{}\" is required and will be added.",
                theme
            );
            if ctx.report(DiagnosticCode::WixStandardBootstrapperApplicationCreated, node, message) {
                let standard = new_element(
                    ctx,
                    BAL,
                    "WixStandardBootstrapperApplication",
                    &[("Theme", theme)],
                );
                append_indented_child(ctx, node, standard);
                ensure_root_declaration(ctx.doc, "bal", BAL);
            }
        }
    }
}

pub fn convert_exe_package(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    for (from, to) in [
        ("InstallCommand", "InstallArguments"),
        ("RepairCommand", "RepairArguments"),
        ("UninstallCommand", "UninstallArguments"),
    ] {
        rename_attribute(ctx, node, from, to, DiagnosticCode::ExePackageCommandRenamed);
    }
    remove_suppress_signature_validation(ctx, node);
}

pub fn remove_suppress_signature_validation(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    remove_obsolete_attribute(
        ctx,
        node,
        "SuppressSignatureValidation",
        DiagnosticCode::SuppressSignatureValidationDeprecated,
    );
}

pub fn convert_remote_payload(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    let Some(parent) = ctx.doc.parent(node) else {
        return;
    };
    let parent_name = local_name(ctx, parent);
    let new_name = match parent_name.as_str() {
        "ExePackage" => "ExePackagePayload",
        "MsuPackage" => "MsuPackagePayload",
        _ => {
            ctx.report(
                DiagnosticCode::RemotePayloadParentUnknown,
                node,
                format!(
                    "A RemotePayload under {} cannot be converted automatically.",
                    parent_name
                ),
            );
            return;
        }
    };

    let message = format!(
        "The RemotePayload element has been renamed. Use the '{}' element instead.",
        new_name
    );
    if !ctx.report(DiagnosticCode::RemotePayloadRenamed, node, message) {
        return;
    }
    rename_element(ctx, node, WXS, new_name);

    for name in ["Name", "DownloadUrl"] {
        if attribute(ctx, parent, name).is_none() || attribute(ctx, node, name).is_some() {
            continue;
        }
        let message = format!(
            "The {}/@{} attribute moves to {}/@{}.",
            parent_name, name, new_name, name
        );
        if ctx.report(DiagnosticCode::PayloadAttributeMoved, parent, message) {
            if let Some(value) = remove_attribute(ctx, parent, name) {
                set_attribute(ctx, node, name, &value);
            }
        }
    }

    for name in ["CertificatePublicKey", "CertificateThumbprint"] {
        remove_obsolete_attribute(ctx, node, name, DiagnosticCode::RemotePayloadCertificateObsolete);
    }
}
