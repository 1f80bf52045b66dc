//! `CustomTable`, which v3 used both for MSI tables and for bundle custom
//! data. The configured [`CustomTableSetting`] picks the reading.

use wix_xml::NodeId;

use super::RuleContext;
use super::helpers::{element_text, promote_inner_text, remove_attribute, rename_element, set_attribute};
use crate::diagnostics::DiagnosticCode;
use crate::namespaces::WXS;
use crate::options::CustomTableSetting;

/// `Data` elements of every `Row` in the table.
fn data_elements(ctx: &RuleContext<'_, '_>, table: NodeId) -> Vec<NodeId> {
    ctx.doc
        .children_named(table, Some(WXS), "Row")
        .into_iter()
        .flat_map(|row| ctx.doc.children_named(row, Some(WXS), "Data"))
        .collect()
}

pub fn convert_custom_table(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    match ctx.options.custom_table {
        CustomTableSetting::NotSet => {
            let has_text = data_elements(ctx, node)
                .into_iter()
                .any(|data| element_text(ctx, data).is_some());
            if has_text {
                ctx.report(
                    DiagnosticCode::CustomTableNotAlwaysConvertable,
                    node,
                    "CustomTable elements with inline data may be MSI tables or bundle custom data. Pass --custom-table msi or --custom-table bundle to convert them.",
                );
            }
        }
        CustomTableSetting::Msi => {
            for data in data_elements(ctx, node) {
                promote_inner_text(ctx, data, "Value");
            }
        }
        CustomTableSetting::Bundle => convert_to_bundle_custom_data(ctx, node),
    }
}

fn convert_to_bundle_custom_data(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    if !ctx.report(
        DiagnosticCode::CustomTableRenamed,
        node,
        "The CustomTable element describes bundle data. Use the 'BundleCustomData' element instead.",
    ) {
        return;
    }
    rename_element(ctx, node, WXS, "BundleCustomData");

    for column in ctx.doc.children_named(node, Some(WXS), "Column") {
        rename_element(ctx, column, WXS, "BundleAttributeDefinition");
        if let Some(el) = ctx.doc.element_mut(column) {
            el.attributes
                .retain(|a| a.is_namespace_declaration() || a.name.is(None, "Id"));
        }
    }

    for row in ctx.doc.children_named(node, Some(WXS), "Row") {
        rename_element(ctx, row, WXS, "BundleElement");
        for data in ctx.doc.children_named(row, Some(WXS), "Data") {
            rename_element(ctx, data, WXS, "BundleAttribute");
            if let Some(column) = remove_attribute(ctx, data, "Column") {
                set_attribute(ctx, data, "Id", &column);
            }
            if let Some(value) = element_text(ctx, data) {
                set_attribute(ctx, data, "Value", &value);
                ctx.doc.remove_children(data);
            }
        }
    }
}

pub fn convert_custom_table_ref(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    if ctx.options.custom_table != CustomTableSetting::Bundle {
        return;
    }
    if ctx.report(
        DiagnosticCode::CustomTableRefRenamed,
        node,
        "The CustomTableRef element references bundle data. Use the 'BundleCustomDataRef' element instead.",
    ) {
        rename_element(ctx, node, WXS, "BundleCustomDataRef");
    }
}
