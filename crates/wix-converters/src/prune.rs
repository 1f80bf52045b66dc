//! Removal of namespace declarations nothing refers to any more.
//!
//! Runs once after the walk, so namespaces freed by renames and deletions
//! anywhere in the document are seen as unused.

use wix_xml::{Document, NodeId};

use crate::diagnostics::{DiagnosticCode, Reporter};

/// Whether any element or non-declaration attribute under `scope` (inclusive)
/// is in `namespace`.
pub fn namespace_used(doc: &Document, scope: NodeId, namespace: &str) -> bool {
    doc.descendants_and_self(scope).into_iter().any(|id| {
        doc.element(id).is_some_and(|el| {
            el.name.namespace() == Some(namespace)
                || el
                    .attributes
                    .iter()
                    .any(|a| !a.is_namespace_declaration() && a.name.namespace() == Some(namespace))
        })
    })
}

pub fn remove_unused_namespaces(doc: &mut Document, reporter: &mut Reporter<'_>) {
    let Some(root) = doc.root_element() else {
        return;
    };

    for id in doc.descendants_and_self(root) {
        let Some(element) = doc.element(id) else {
            continue;
        };

        let unused: Vec<(String, String)> = element
            .namespace_declarations()
            .filter(|decl| !decl.value.is_empty())
            .filter(|decl| !namespace_used(doc, id, &decl.value))
            .map(|decl| (decl.name.local.clone(), decl.value.clone()))
            .collect();
        if unused.is_empty() {
            continue;
        }

        let line = doc.line(id);
        for (local, namespace) in unused {
            let message = match local.as_str() {
                "xmlns" => format!("The default namespace '{}' is not used.", namespace),
                prefix => format!(
                    "The namespace prefix '{}' ('{}') is not used.",
                    prefix, namespace
                ),
            };
            if reporter.report(DiagnosticCode::UnusedNamespaceDeclaration, Some(line), message) {
                if let Some(element) = doc.element_mut(id) {
                    element
                        .attributes
                        .retain(|a| !(a.is_namespace_declaration() && a.name.local == local));
                }
            }
        }
    }
}
