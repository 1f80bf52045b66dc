use wix_xml::{Attribute, Document, NodeId};

use super::RuleContext;
use crate::diagnostics::DiagnosticCode;
use crate::namespaces::WXS;

/// A `Wix` root with no namespace: declare the v4 namespace and move every
/// un-namespaced element into it.
pub fn convert_unqualified_root(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    if ctx.doc.parent(node) != Some(Document::DOCUMENT) {
        return;
    }
    let message = format!(
        "The xmlns attribute is missing. It must be present with a value of '{}'.",
        WXS
    );
    if !ctx.report(DiagnosticCode::XmlnsMissing, node, message) {
        return;
    }

    for id in ctx.doc.descendants_and_self(node) {
        if let Some(el) = ctx.doc.element_mut(id) {
            if el.name.namespace.is_none() {
                el.name.namespace = Some(WXS.to_string());
                el.prefix = None;
            }
        }
    }

    if let Some(root) = ctx.doc.element_mut(node) {
        if !root.attributes.iter().any(|a| a.is_default_namespace_declaration()) {
            root.attributes
                .insert(0, Attribute::namespace_declaration(None, WXS));
        }
    }
}
