//! The `Condition` element, which v4 replaced with attributes on whatever
//! the condition applied to.

use wix_xml::NodeId;

use super::RuleContext;
use super::helpers::{
    attribute, element_text, local_name, remove_attribute, remove_element, rename_element,
    set_attribute,
};
use crate::diagnostics::DiagnosticCode;
use crate::namespaces::WXS;

pub fn convert_condition(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    let Some(parent) = ctx.doc.parent(node) else {
        return;
    };
    let in_core = ctx
        .doc
        .element(parent)
        .is_some_and(|el| el.name.namespace() == Some(WXS));
    let parent_name = if in_core { local_name(ctx, parent) } else { String::new() };

    match parent_name.as_str() {
        "Component" => move_to_component(ctx, parent, node),
        "Feature" => {
            if ctx.report(
                DiagnosticCode::FeatureConditionRenamed,
                node,
                "The Feature/Condition element has been renamed. Use the 'Level' element instead.",
            ) {
                rename_element(ctx, node, WXS, "Level");
                if let Some(level) = remove_attribute(ctx, node, "Level") {
                    set_attribute(ctx, node, "Value", &level);
                }
                move_text_to_condition(ctx, node);
            }
        }
        "Package" | "Product" | "Fragment" => {
            if ctx.report(
                DiagnosticCode::LaunchConditionRenamed,
                node,
                format!(
                    "The {}/Condition element has been renamed. Use the 'Launch' element instead.",
                    parent_name
                ),
            ) {
                rename_element(ctx, node, WXS, "Launch");
                move_text_to_condition(ctx, node);
            }
        }
        // Control conditions belong to the Control rule.
        "Control" => {}
        _ => {
            ctx.report(
                DiagnosticCode::ConditionNotConvertible,
                node,
                "This Condition element cannot be converted automatically. Move the condition to the attribute of the element it applies to.",
            );
        }
    }
}

fn move_to_component(ctx: &mut RuleContext<'_, '_>, component: NodeId, node: NodeId) {
    let Some(condition) = element_text(ctx, node) else {
        ctx.report(
            DiagnosticCode::ConditionNotConvertible,
            node,
            "This Component/Condition element has no condition text and cannot be converted automatically.",
        );
        return;
    };
    if attribute(ctx, component, "Condition").is_some() {
        ctx.report(
            DiagnosticCode::ConditionNotConvertible,
            node,
            "The Component already has a Condition attribute. Merge this Condition element into it by hand.",
        );
        return;
    }
    if ctx.report(
        DiagnosticCode::ComponentConditionMoved,
        node,
        "The Component/Condition element is deprecated. Use the 'Condition' attribute instead.",
    ) {
        set_attribute(ctx, component, "Condition", &condition);
        remove_element(ctx, node);
    }
}

fn move_text_to_condition(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    if let Some(condition) = element_text(ctx, node) {
        set_attribute(ctx, node, "Condition", &condition);
        ctx.doc.remove_children(node);
    }
}

/// `Control/Condition/@Action` value → the `Control` attribute replacing it.
fn control_attribute(action: &str) -> Option<&'static str> {
    match action {
        "default" => Some("DefaultCondition"),
        "disable" => Some("DisableCondition"),
        "enable" => Some("EnableCondition"),
        "hide" => Some("HideCondition"),
        "show" => Some("ShowCondition"),
        _ => None,
    }
}

pub fn convert_control(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    for condition in ctx.doc.children_named(node, Some(WXS), "Condition") {
        let action = attribute(ctx, condition, "Action").unwrap_or_default();
        let Some(target) = control_attribute(&action) else {
            ctx.report(
                DiagnosticCode::ControlConditionActionUnknown,
                condition,
                format!(
                    "The Control/Condition/@Action value '{}' cannot be converted automatically.",
                    action
                ),
            );
            continue;
        };
        let Some(text) = element_text(ctx, condition) else {
            ctx.report(
                DiagnosticCode::ConditionNotConvertible,
                condition,
                "This Control/Condition element has no condition text and cannot be converted automatically.",
            );
            continue;
        };
        if attribute(ctx, node, target).is_some() {
            ctx.report(
                DiagnosticCode::ConditionNotConvertible,
                condition,
                format!(
                    "The Control already has a {} attribute. Merge this Condition element into it by hand.",
                    target
                ),
            );
            continue;
        }
        if ctx.report(
            DiagnosticCode::ControlConditionMoved,
            condition,
            format!(
                "The Control/Condition element is deprecated. Use the '{}' attribute instead.",
                target
            ),
        ) {
            set_attribute(ctx, node, target, &text);
            remove_element(ctx, condition);
        }
    }

    for text_element in ctx.doc.children_named(node, Some(WXS), "Text") {
        let Some(text) = element_text(ctx, text_element) else {
            continue;
        };
        if attribute(ctx, node, "Text").is_some() {
            continue;
        }
        if ctx.report(
            DiagnosticCode::ControlTextMoved,
            text_element,
            "The Control/Text element is deprecated. Use the 'Text' attribute instead.",
        ) {
            set_attribute(ctx, node, "Text", &text);
            remove_element(ctx, text_element);
        }
    }
}
