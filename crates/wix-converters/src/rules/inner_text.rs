//! Elements whose text content becomes an attribute.

use wix_xml::NodeId;

use super::RuleContext;
use super::helpers::{local_name, promote_inner_text, rename_element};
use crate::diagnostics::DiagnosticCode;
use crate::namespaces::{SourceVersion, WXS};

pub fn to_message(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    promote_inner_text(ctx, node, "Message");
}

pub fn to_value(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    promote_inner_text(ctx, node, "Value");
}

pub fn to_name(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    promote_inner_text(ctx, node, "Name");
}

pub fn to_condition(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    promote_inner_text(ctx, node, "Condition");
}

/// v4 allows `Property` text again, so only legacy documents are touched.
pub fn convert_property(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    if ctx.source_version == SourceVersion::V3 {
        promote_inner_text(ctx, node, "Value");
    }
}

pub fn convert_multi_string_value(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    if ctx.report(
        DiagnosticCode::MultiStringValueRenamed,
        node,
        "The MultiStringValue element has been renamed. Use the 'MultiString' element instead.",
    ) {
        rename_element(ctx, node, WXS, "MultiString");
    }
    promote_inner_text(ctx, node, "Value");
}

/// Standard actions in a sequence table carry their condition as text.
/// `Custom` and `Show` have rules of their own.
pub fn convert_sequence(ctx: &mut RuleContext<'_, '_>, node: NodeId) {
    for child in ctx.doc.element_children(node) {
        if matches!(local_name(ctx, child).as_str(), "Custom" | "Show") {
            continue;
        }
        promote_inner_text(ctx, child, "Condition");
    }
}

#[cfg(test)]
mod tests {
    use crate::{ConverterOptions, Converter};

    fn convert(body: &str) -> String {
        let source = format!(
            "<Wix xmlns=\"http://wixtoolset.org/schemas/v4/wxs\">\n    <Fragment>\n        {}\n    </Fragment>\n</Wix>",
            body
        );
        let (out, _) = Converter::new(ConverterOptions::default()).convert_str(&source);
        out
    }

    #[test]
    fn test_error_text_becomes_message() {
        let out = convert(r#"<UI><Error Id="1">Some message</Error></UI>"#);
        assert!(out.contains(r#"<Error Id="1" Message="Some message"/>"#), "{out}");
    }

    #[test]
    fn test_element_children_block_promotion() {
        let out = convert(r#"<UIText Id="a">x<Sub/></UIText>"#);
        assert!(out.contains(r#"<UIText Id="a">x<Sub/></UIText>"#), "{out}");
    }

    #[test]
    fn test_cdata_text_is_promoted() {
        let out = convert(r#"<SetProperty Id="P" Value="1"><![CDATA[A < B]]></SetProperty>"#);
        assert!(out.contains(r#"<SetProperty Id="P" Value="1" Condition="A &lt; B"/>"#), "{out}");
    }

    #[test]
    fn test_property_text_left_alone_in_v4() {
        let out = convert(r#"<Property Id="P">value</Property>"#);
        assert!(out.contains(r#"<Property Id="P">value</Property>"#), "{out}");
    }

    #[test]
    fn test_multi_string_value() {
        let out = convert(r#"<MultiStringValue>one</MultiStringValue>"#);
        assert!(out.contains(r#"<MultiString Value="one"/>"#), "{out}");
    }

    #[test]
    fn test_sequence_standard_actions() {
        let out = convert(
            r#"<InstallExecuteSequence><LaunchConditions>NOT Installed</LaunchConditions><Custom Action="A" After="B">X</Custom></InstallExecuteSequence>"#,
        );
        assert!(out.contains(r#"<LaunchConditions Condition="NOT Installed"/>"#), "{out}");
        assert!(out.contains(r#"<Custom Action="A" After="B" Condition="X"/>"#), "{out}");
    }
}
