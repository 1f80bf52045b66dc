//! Element rules and the table that dispatches to them.
//!
//! A rule is a plain function keyed by the qualified name of the element it
//! converts. Rules never call one another; when one rule produces an element
//! another rule handles, the walker reaches it on its own.

mod attributes;
mod bundle;
mod conditions;
mod custom_table;
mod directory;
pub mod helpers;
mod inner_text;
mod package;
mod wix;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use wix_xml::{Document, NodeId, QName};

use crate::diagnostics::{DiagnosticCode, Reporter};
use crate::namespaces::{BAL, FIREWALL, SourceVersion, TAG, UTIL, WXS};
use crate::options::ConverterOptions;

/// Everything a rule may touch while converting one element.
pub struct RuleContext<'a, 'o> {
    pub doc: &'a mut Document,
    pub reporter: &'a mut Reporter<'o>,
    pub options: &'o ConverterOptions,
    pub source_version: SourceVersion,
}

impl RuleContext<'_, '_> {
    /// Report `code` at `node`'s line. Callers must leave the tree alone
    /// when this returns false.
    pub fn report(&mut self, code: DiagnosticCode, node: NodeId, message: impl Into<String>) -> bool {
        let line = self.doc.line(node);
        self.reporter
            .report(code, (line > 0).then_some(line), message)
    }
}

pub type Rule = fn(&mut RuleContext<'_, '_>, NodeId);

static RULES: Lazy<HashMap<QName, (&'static str, Rule)>> = Lazy::new(|| {
    let entries: &[(Option<&str>, &'static str, Rule)] = &[
        (None, "Wix", wix::convert_unqualified_root),
        // Package authoring
        (Some(WXS), "Product", package::convert_product),
        (Some(WXS), "Module", package::convert_module),
        (Some(TAG), "Tag", package::convert_tag),
        (Some(TAG), "TagRef", package::convert_tag_ref),
        // Inner text
        (Some(WXS), "Error", inner_text::to_message),
        (Some(WXS), "ProgressText", inner_text::to_message),
        (Some(WXS), "UIText", inner_text::to_value),
        (Some(WXS), "ServiceArgument", inner_text::to_value),
        (Some(WXS), "ShortcutProperty", inner_text::to_value),
        (Some(UTIL), "XmlConfig", inner_text::to_value),
        (Some(FIREWALL), "RemoteAddress", inner_text::to_value),
        (Some(WXS), "Property", inner_text::convert_property),
        (Some(WXS), "RequiredPrivilege", inner_text::to_name),
        (Some(WXS), "MultiStringValue", inner_text::convert_multi_string_value),
        (Some(WXS), "SetDirectory", inner_text::to_condition),
        (Some(WXS), "SetProperty", inner_text::to_condition),
        (Some(WXS), "Custom", inner_text::to_condition),
        (Some(WXS), "Show", inner_text::to_condition),
        (Some(WXS), "Publish", inner_text::to_condition),
        (Some(WXS), "EmbeddedChainer", inner_text::to_condition),
        (Some(UTIL), "CloseApplication", inner_text::to_condition),
        (Some(BAL), "Condition", inner_text::to_condition),
        (Some(WXS), "AdminExecuteSequence", inner_text::convert_sequence),
        (Some(WXS), "AdminUISequence", inner_text::convert_sequence),
        (Some(WXS), "AdvertiseExecuteSequence", inner_text::convert_sequence),
        (Some(WXS), "InstallExecuteSequence", inner_text::convert_sequence),
        (Some(WXS), "InstallUISequence", inner_text::convert_sequence),
        // Conditions
        (Some(WXS), "Condition", conditions::convert_condition),
        (Some(WXS), "Control", conditions::convert_control),
        // Attributes
        (Some(WXS), "Feature", attributes::convert_feature),
        (Some(WXS), "CustomAction", attributes::convert_custom_action),
        (Some(WXS), "Component", attributes::convert_win64_owner),
        (Some(UTIL), "RegistrySearch", attributes::convert_win64_owner),
        (Some(WXS), "File", attributes::convert_file),
        (Some(WXS), "RegistryKey", attributes::convert_registry_key),
        (Some(WXS), "RegistryValue", attributes::lowercase_type),
        (Some(WXS), "Variable", attributes::lowercase_type),
        (Some(BAL), "WixStandardBootstrapperApplication", attributes::lowercase_theme),
        // Directories and properties
        (Some(WXS), "Directory", directory::convert_directory),
        (Some(WXS), "DirectoryRef", directory::convert_directory_ref),
        (Some(WXS), "PropertyRef", directory::convert_property_ref),
        // Bundles
        (Some(WXS), "BootstrapperApplicationRef", bundle::convert_bootstrapper_application_ref),
        (Some(WXS), "ExePackage", bundle::convert_exe_package),
        (Some(WXS), "MsiPackage", bundle::remove_suppress_signature_validation),
        (Some(WXS), "MspPackage", bundle::remove_suppress_signature_validation),
        (Some(WXS), "MsuPackage", bundle::remove_suppress_signature_validation),
        (Some(WXS), "Payload", bundle::remove_suppress_signature_validation),
        (Some(WXS), "RemotePayload", bundle::convert_remote_payload),
        // Custom tables
        (Some(WXS), "CustomTable", custom_table::convert_custom_table),
        (Some(WXS), "CustomTableRef", custom_table::convert_custom_table_ref),
    ];

    entries
        .iter()
        .map(|(ns, local, rule)| (QName::new(*ns, *local), (*local, *rule)))
        .collect()
});

/// Run the rule registered for `node`'s name, if any.
pub fn dispatch(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    let Some((name, rule)) = ctx
        .doc
        .element(node)
        .and_then(|el| RULES.get(&el.name))
        .copied()
    else {
        return;
    };
    tracing::trace!(rule = name, line = ctx.doc.line(node), "Running rule");
    rule(ctx, node);
}

/// Names with a registered rule, for listings and tests.
pub fn registered_rules() -> Vec<QName> {
    let mut names: Vec<QName> = RULES.keys().cloned().collect();
    names.sort_by(|a, b| (a.namespace(), &a.local).cmp(&(b.namespace(), &b.local)));
    names
}
