//! Depth-first traversal that runs the namespace conversion and element
//! rules on every element and canonicalizes the whitespace between nodes.

use wix_xml::{Document, NodeId, NodeKind};

use crate::diagnostics::DiagnosticCode;
use crate::namespaces;
use crate::rules::{self, RuleContext};
use crate::whitespace::{canonicalize, is_canonical};

/// Walk `node` and everything below it. The root element is at level 0.
pub fn walk(ctx: &mut RuleContext<'_, '_>, node: NodeId, level: usize) {
    match ctx.doc.kind(node) {
        NodeKind::Document => walk_children(ctx, node, 0),
        NodeKind::Element(_) => {
            namespaces::convert_declarations(ctx.doc, ctx.reporter, node);
            rules::dispatch(ctx, node);
            // A rule may have removed the element it was called for.
            if ctx.doc.is_attached(node) {
                walk_children(ctx, node, level + 1);
            }
        }
        NodeKind::Text(text) if text.is_blank() => normalize_whitespace(ctx, node, level),
        _ => {}
    }
}

/// Walk a snapshot of the children, then once more over any children the
/// first pass added. Children detached in the meantime are skipped.
fn walk_children(ctx: &mut RuleContext<'_, '_>, node: NodeId, level: usize) {
    let snapshot = ctx.doc.children(node).to_vec();
    for child in &snapshot {
        if ctx.doc.parent(*child) == Some(node) {
            walk(ctx, *child, level);
        }
    }

    let added: Vec<NodeId> = ctx
        .doc
        .children(node)
        .iter()
        .copied()
        .filter(|child| !snapshot.contains(child))
        .collect();
    for child in added {
        if ctx.doc.parent(child) == Some(node) {
            walk(ctx, child, level);
        }
    }
}

fn normalize_whitespace(ctx: &mut RuleContext<'_, '_>, node: NodeId, level: usize) {
    let Some(parent) = ctx.doc.parent(node) else {
        return;
    };

    match ctx.doc.next_sibling(node) {
        Some(next) if ctx.doc.is_literal_text(next) => {
            if ctx.report(
                DiagnosticCode::WhitespacePrecedingCDATAWrong,
                next,
                "There should be no whitespace preceding a CDATA section.",
            ) {
                ctx.doc.detach(node);
            }
        }
        // Adjacent plain text belongs to its neighbor.
        Some(next) if ctx.doc.text(next).is_some() => {}
        Some(next) => {
            fix_indentation(
                ctx,
                node,
                next,
                level,
                DiagnosticCode::WhitespacePrecedingNodeWrong,
                "The whitespace preceding this node is incorrect.",
            );
        }
        None => match ctx.doc.previous_sibling(node) {
            None if parent != Document::DOCUMENT => {
                if ctx.report(
                    DiagnosticCode::NotEmptyElement,
                    node,
                    "This element contains only whitespace and should be empty.",
                ) {
                    ctx.doc.remove_children(parent);
                }
            }
            Some(previous) if ctx.doc.is_literal_text(previous) => {
                if ctx.report(
                    DiagnosticCode::WhitespaceFollowingCDATAWrong,
                    node,
                    "There should be no whitespace following a CDATA section.",
                ) {
                    ctx.doc.detach(node);
                }
            }
            _ => {
                let closing_level = if parent == Document::DOCUMENT {
                    level
                } else {
                    level.saturating_sub(1)
                };
                fix_indentation(
                    ctx,
                    node,
                    node,
                    closing_level,
                    DiagnosticCode::WhitespacePrecedingEndElementWrong,
                    "The whitespace preceding this end element is incorrect.",
                );
            }
        },
    }
}

fn fix_indentation(
    ctx: &mut RuleContext<'_, '_>,
    node: NodeId,
    report_at: NodeId,
    level: usize,
    code: DiagnosticCode,
    message: &str,
) {
    let unit = ctx.options.indentation_amount;
    let Some(content) = ctx.doc.text(node).map(|t| t.content.clone()) else {
        return;
    };
    if is_canonical(&content, unit, level) {
        return;
    }
    if ctx.report(code, report_at, message) {
        if let Some(text) = ctx.doc.text_mut(node) {
            text.content = canonicalize(&content, unit, level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Mode, Reporter};
    use crate::namespaces::SourceVersion;
    use crate::options::ConverterOptions;
    use wix_xml::{parse, to_xml_string};

    fn format(source: &str, options: &ConverterOptions) -> (String, Vec<DiagnosticCode>) {
        let mut doc = parse(source).unwrap();
        let mut reporter = Reporter::new(Mode::Format, "t.wxs", options);
        let mut ctx = RuleContext {
            doc: &mut doc,
            reporter: &mut reporter,
            options,
            source_version: SourceVersion::V4,
        };
        walk(&mut ctx, Document::DOCUMENT, 0);
        let codes = reporter.diagnostics().iter().map(|d| d.code).collect();
        (to_xml_string(&doc), codes)
    }

    #[test]
    fn test_indentation_is_canonicalized() {
        let options = ConverterOptions::default();
        let (out, codes) = format(
            "<Wix xmlns=\"urn:x\">\n  <Fragment>\n      <Property Id=\"A\" />\n  </Fragment>\n</Wix>",
            &options,
        );
        assert_eq!(
            out,
            "<Wix xmlns=\"urn:x\">\n    <Fragment>\n        <Property Id=\"A\"/>\n    </Fragment>\n</Wix>"
        );
        assert_eq!(
            codes,
            vec![
                DiagnosticCode::WhitespacePrecedingNodeWrong,
                DiagnosticCode::WhitespacePrecedingNodeWrong,
                DiagnosticCode::WhitespacePrecedingEndElementWrong,
            ]
        );
    }

    #[test]
    fn test_blank_lines_are_kept() {
        let options = ConverterOptions::default().with_indentation(2);
        let source = "<Wix>\n\n  <A/>\n\n\n  <B/>\n</Wix>";
        let (out, codes) = format(source, &options);
        assert_eq!(out, source);
        assert!(codes.is_empty());
    }

    #[test]
    fn test_whitespace_only_element_is_emptied() {
        let options = ConverterOptions::default();
        let (out, codes) = format("<Wix>\n    <A>\n    \n    </A>\n</Wix>", &options);
        assert_eq!(out, "<Wix>\n    <A/>\n</Wix>");
        assert_eq!(codes, vec![DiagnosticCode::NotEmptyElement]);
    }

    #[test]
    fn test_whitespace_around_cdata_is_removed() {
        let options = ConverterOptions::default();
        let (out, codes) = format("<Wix>\n    <A>\n  <![CDATA[x < y]]>  \n</A>\n</Wix>", &options);
        assert_eq!(out, "<Wix>\n    <A><![CDATA[x < y]]></A>\n</Wix>");
        assert_eq!(
            codes,
            vec![
                DiagnosticCode::WhitespacePrecedingCDATAWrong,
                DiagnosticCode::WhitespaceFollowingCDATAWrong,
            ]
        );
    }

    #[test]
    fn test_comments_are_indented_like_elements() {
        let options = ConverterOptions::default();
        let (out, _) = format("<Wix>\n<!-- note -->\n<A/>\n</Wix>", &options);
        assert_eq!(out, "<Wix>\n    <!-- note -->\n    <A/>\n</Wix>");
    }

    #[test]
    fn test_text_content_is_untouched() {
        let options = ConverterOptions::default();
        let source = "<Wix>\n    <A>  some text  </A>\n</Wix>";
        let (out, codes) = format(source, &options);
        assert_eq!(out, source);
        assert!(codes.is_empty());
    }

    #[test]
    fn test_convert_mode_leaves_whitespace() {
        let options = ConverterOptions::default();
        let source = "<Wix xmlns=\"http://wixtoolset.org/schemas/v4/wxs\">\n  <Fragment/>\n</Wix>";
        let mut doc = parse(source).unwrap();
        let mut reporter = Reporter::new(Mode::Convert, "t.wxs", &options);
        let mut ctx = RuleContext {
            doc: &mut doc,
            reporter: &mut reporter,
            options: &options,
            source_version: SourceVersion::V4,
        };
        walk(&mut ctx, Document::DOCUMENT, 0);
        assert_eq!(reporter.count(), 0);
        assert_eq!(to_xml_string(&doc), source);
    }
}
