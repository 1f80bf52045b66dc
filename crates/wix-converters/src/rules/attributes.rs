//! Attribute-level rewrites: renamed attributes, enumerations whose values
//! changed, and values that must be lower case.

use wix_xml::NodeId;

use super::RuleContext;
use super::helpers::{
    attribute, convert_win64, element_text, lowercase_attribute_value, remove_attribute,
    rename_attribute, set_attribute,
};
use crate::diagnostics::DiagnosticCode;
use crate::namespaces::SourceVersion;

pub fn convert_feature(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    if ctx.source_version != SourceVersion::V3 {
        return;
    }

    if let Some(absent) = attribute(ctx, node, "Absent") {
        match absent.as_str() {
            "allow" => {
                if ctx.report(
                    DiagnosticCode::FeatureAbsentRenamed,
                    node,
                    "The Feature/@Absent=\"allow\" value is the default and will be removed.",
                ) {
                    remove_attribute(ctx, node, "Absent");
                }
            }
            "disallow" => {
                if ctx.report(
                    DiagnosticCode::FeatureAbsentRenamed,
                    node,
                    "The Feature/@Absent attribute has been replaced. Use AllowAbsent=\"no\" instead.",
                ) {
                    remove_attribute(ctx, node, "Absent");
                    set_attribute(ctx, node, "AllowAbsent", "no");
                }
            }
            other => {
                ctx.report(
                    DiagnosticCode::FeatureAbsentValueUnknown,
                    node,
                    format!(
                        "The Feature/@Absent value '{}' cannot be converted. Use the 'AllowAbsent' attribute instead.",
                        other
                    ),
                );
            }
        }
    }

    if attribute(ctx, node, "AllowAdvertise").as_deref() == Some("system")
        && ctx.report(
            DiagnosticCode::FeatureAllowAdvertiseSystemObsolete,
            node,
            "The Feature/@AllowAdvertise value 'system' is obsolete. Use 'yes' instead.",
        )
    {
        set_attribute(ctx, node, "AllowAdvertise", "yes");
    }
}

pub fn convert_custom_action(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    rename_attribute(ctx, node, "BinaryKey", "BinaryRef", DiagnosticCode::CustomActionKeysRenamed);
    rename_attribute(ctx, node, "FileKey", "FileRef", DiagnosticCode::CustomActionKeysRenamed);
    convert_win64(ctx, node);

    if attribute(ctx, node, "Script").is_some() && element_text(ctx, node).is_some() {
        let id = attribute(ctx, node, "Id").unwrap_or_default();
        ctx.report(
            DiagnosticCode::InlineScriptNotConvertible,
            node,
            format!(
                "CustomAction '{}' embeds its script. Move the script to a file and reference it with a Binary element.",
                id
            ),
        );
    }
}

/// Elements whose only change is `Win64` → `Bitness`.
pub fn convert_win64_owner(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    convert_win64(ctx, node);
}

pub fn convert_file(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    rename_attribute(ctx, node, "src", "Source", DiagnosticCode::SrcAttributeRenamed);
}

pub fn convert_registry_key(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    let Some(action) = attribute(ctx, node, "Action") else {
        return;
    };
    let replacements: &[&str] = match action.as_str() {
        "create" => &["ForceCreateOnInstall"],
        "createAndRemoveOnUninstall" => &["ForceCreateOnInstall", "ForceDeleteOnUninstall"],
        "none" => &[],
        other => {
            ctx.report(
                DiagnosticCode::RegistryKeyActionValueUnknown,
                node,
                format!("The RegistryKey/@Action value '{}' cannot be converted.", other),
            );
            return;
        }
    };

    let message = if replacements.is_empty() {
        "The RegistryKey/@Action attribute is obsolete and will be removed.".to_string()
    } else {
        format!(
            "The RegistryKey/@Action attribute is obsolete. Use {} instead.",
            replacements
                .iter()
                .map(|name| format!("{}=\"yes\"", name))
                .collect::<Vec<_>>()
                .join(" ")
        )
    };
    if ctx.report(DiagnosticCode::RegistryKeyActionObsolete, node, message) {
        remove_attribute(ctx, node, "Action");
        for name in replacements {
            set_attribute(ctx, node, name, "yes");
        }
    }
}

pub fn lowercase_type(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    lowercase_attribute_value(ctx, node, "Type");
}

pub fn lowercase_theme(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    lowercase_attribute_value(ctx, node, "Theme");
}
