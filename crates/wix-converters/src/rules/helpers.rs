//! Building blocks shared by several rules.

use wix_xml::{Element, NodeId, QName, TextKind};

use super::RuleContext;
use crate::diagnostics::DiagnosticCode;
use crate::surgery::SiblingSurgery;

/// Trimmed text of an element whose children are all text, or `None` when it
/// has element children or only whitespace.
pub fn element_text(ctx: &RuleContext<'_, '_>, node: NodeId) -> Option<String> {
    if !ctx.doc.has_only_text_children(node) {
        return None;
    }
    let text = ctx.doc.inner_text(node);
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn local_name(ctx: &RuleContext<'_, '_>, node: NodeId) -> String {
    ctx.doc
        .element(node)
        .map(|el| el.name.local.clone())
        .unwrap_or_default()
}

pub fn attribute(ctx: &RuleContext<'_, '_>, node: NodeId, name: &str) -> Option<String> {
    ctx.doc
        .element(node)
        .and_then(|el| el.attribute(name))
        .map(str::to_string)
}

pub fn set_attribute(ctx: &mut RuleContext<'_, '_>, node: NodeId, name: &str, value: &str) {
    if let Some(el) = ctx.doc.element_mut(node) {
        el.set_attribute(name, value);
    }
}

pub fn remove_attribute(ctx: &mut RuleContext<'_, '_>, node: NodeId, name: &str) -> Option<String> {
    ctx.doc.element_mut(node)?.remove_attribute(name)
}

/// Give an element a new name. The source prefix is kept only when the
/// namespace does not change.
pub fn rename_element(ctx: &mut RuleContext<'_, '_>, node: NodeId, namespace: &str, local: &str) {
    if let Some(el) = ctx.doc.element_mut(node) {
        if el.name.namespace() != Some(namespace) {
            el.prefix = None;
        }
        el.name = QName::in_namespace(namespace, local);
    }
}

/// Move an element's inner text into `attribute` and drop the text.
///
/// Elements with element children, an empty body, or an existing
/// `attribute` are left alone.
pub fn promote_inner_text(ctx: &mut RuleContext<'_, '_>, node: NodeId, attribute_name: &str) -> bool {
    let Some(text) = element_text(ctx, node) else {
        return false;
    };
    if attribute(ctx, node, attribute_name).is_some() {
        return false;
    }

    let element = local_name(ctx, node);
    let message = format!(
        "Using {} element text is deprecated. Use the '{}' attribute instead.",
        element, attribute_name
    );
    if !ctx.report(DiagnosticCode::InnerTextDeprecated, node, message) {
        return false;
    }

    set_attribute(ctx, node, attribute_name, &text);
    ctx.doc.remove_children(node);
    true
}

/// Rename `from` to `to` behind `code`. Skipped when `to` is already present.
pub fn rename_attribute(
    ctx: &mut RuleContext<'_, '_>,
    node: NodeId,
    from: &str,
    to: &str,
    code: DiagnosticCode,
) -> bool {
    if attribute(ctx, node, from).is_none() || attribute(ctx, node, to).is_some() {
        return false;
    }
    let element = local_name(ctx, node);
    let message = format!(
        "The {}/@{} attribute has been renamed. Use the '{}' attribute instead.",
        element, from, to
    );
    if !ctx.report(code, node, message) {
        return false;
    }
    ctx.doc
        .element_mut(node)
        .is_some_and(|el| el.rename_attribute(from, to))
}

/// Remove an obsolete attribute behind `code`.
pub fn remove_obsolete_attribute(
    ctx: &mut RuleContext<'_, '_>,
    node: NodeId,
    name: &str,
    code: DiagnosticCode,
) -> bool {
    if attribute(ctx, node, name).is_none() {
        return false;
    }
    let element = local_name(ctx, node);
    let message = format!("The {}/@{} attribute is obsolete and will be removed.", element, name);
    if !ctx.report(code, node, message) {
        return false;
    }
    remove_attribute(ctx, node, name);
    true
}

/// Replace `Win64` with the matching `Bitness` value.
pub fn convert_win64(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    let Some(value) = attribute(ctx, node, "Win64") else {
        return;
    };
    let element = local_name(ctx, node);

    let bitness = match value.as_str() {
        "yes" => "always64",
        "no" => "always32",
        _ => {
            ctx.report(
                DiagnosticCode::Win64AttributeValueUnknown,
                node,
                format!(
                    "The {}/@Win64 value '{}' cannot be converted. Use the 'Bitness' attribute instead.",
                    element, value
                ),
            );
            return;
        }
    };

    if attribute(ctx, node, "Bitness").is_some() {
        return;
    }
    let message = format!(
        "The {}/@Win64 attribute has been replaced. Use Bitness=\"{}\" instead.",
        element, bitness
    );
    if ctx.report(DiagnosticCode::Win64AttributeRenamed, node, message) {
        if let Some(el) = ctx.doc.element_mut(node) {
            el.rename_attribute("Win64", "Bitness");
            el.set_attribute("Bitness", bitness);
        }
    }
}

/// `value` with its first character lower-cased, when that changes it.
pub fn lowercase_first(value: &str) -> Option<String> {
    let mut chars = value.chars();
    let first = chars.next()?;
    if !first.is_uppercase() {
        return None;
    }
    Some(first.to_lowercase().chain(chars).collect())
}

/// Lower-case the first character of `name`'s value behind
/// `AttributeValueCaseWrong`.
pub fn lowercase_attribute_value(ctx: &mut RuleContext<'_, '_>, node: NodeId, name: &str) {
    let Some(value) = attribute(ctx, node, name) else {
        return;
    };
    // Preprocessor references keep their case.
    if value.starts_with("$(") || value.starts_with("!(") {
        return;
    }
    let Some(lowered) = lowercase_first(&value) else {
        return;
    };
    let element = local_name(ctx, node);
    let message = format!(
        "The {}/@{} value '{}' must be lower case. Use '{}' instead.",
        element, name, value, lowered
    );
    if ctx.report(DiagnosticCode::AttributeValueCaseWrong, node, message) {
        set_attribute(ctx, node, name, &lowered);
    }
}

/// Detach `node` together with one neighboring blank line.
pub fn remove_element(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    if let Some(mut surgery) = SiblingSurgery::new(ctx.doc, node) {
        surgery.remove_target();
    }
}

/// A new, detached element with the given attributes.
pub fn new_element(ctx: &mut RuleContext<'_, '_>, namespace: &str, local: &str, attributes: &[(&str, String)]) -> NodeId {
    let mut element = Element::new(QName::in_namespace(namespace, local));
    for (name, value) in attributes {
        element.set_attribute(name, value.clone());
    }
    ctx.doc.create_element(element, 0)
}

/// Append `child` to `parent`, indented one level deeper than `parent`.
///
/// The indentation is derived from the blank text in front of `parent`, so
/// the result looks right before any formatting pass.
pub fn append_indented_child(ctx: &mut RuleContext<'_, '_>, parent: NodeId, child: NodeId) {
    let outer = ctx
        .doc
        .previous_sibling(parent)
        .filter(|p| ctx.doc.is_blank_text(*p))
        .and_then(|p| ctx.doc.text(p))
        .map(|t| t.content.clone());

    let Some(outer) = outer else {
        ctx.doc.append_child(parent, child);
        return;
    };
    let line_start = outer.rfind('\n').map_or(0, |pos| pos + 1);
    let indent = format!(
        "\n{}{}",
        &outer[line_start..],
        " ".repeat(ctx.options.indentation_amount)
    );

    let last_is_blank = ctx
        .doc
        .children(parent)
        .last()
        .is_some_and(|last| ctx.doc.is_blank_text(*last));
    if last_is_blank {
        // Keep the existing text before the closing tag in place.
        let closing = ctx.doc.children(parent).len() - 1;
        let ws = ctx.doc.create_text(indent, TextKind::Plain, 0);
        ctx.doc.insert_child(parent, closing, ws);
        ctx.doc.insert_child(parent, closing + 1, child);
    } else {
        let ws = ctx.doc.create_text(indent, TextKind::Plain, 0);
        let closing = ctx
            .doc
            .create_text(format!("\n{}", &outer[line_start..]), TextKind::Plain, 0);
        ctx.doc.append_child(parent, ws);
        ctx.doc.append_child(parent, child);
        ctx.doc.append_child(parent, closing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_first() {
        assert_eq!(lowercase_first("String"), Some("string".to_string()));
        assert_eq!(lowercase_first("HyperlinkLicense"), Some("hyperlinkLicense".to_string()));
        assert_eq!(lowercase_first("string"), None);
        assert_eq!(lowercase_first(""), None);
    }
}
