//! Serialization of a [`Document`] back to XML text.
//!
//! Prefixes are re-derived from the declarations in scope at each element,
//! because conversions may retarget namespaces or move nodes between scopes.
//! The prefix recorded at load time is only a preference.

use std::borrow::Cow;

use quick_xml::escape::partial_escape;

use crate::types::{Attribute, Document, Element, NodeId, NodeKind, XML_NAMESPACE};

/// Serialize the whole document.
///
/// The declaration is written only when [`Document::declaration`] is set.
/// Without it, whitespace ahead of the first top-level node is dropped so the
/// output does not start with a blank line.
pub fn to_xml_string(doc: &Document) -> String {
    let mut writer = XmlWriter::default();

    let top_level = doc.children(Document::DOCUMENT);
    let mut skip_leading = 0;
    match &doc.declaration {
        Some(decl) => {
            writer.out.push_str("<?xml version=\"");
            writer.out.push_str(&decl.version);
            writer.out.push('"');
            if let Some(encoding) = &decl.encoding {
                writer.out.push_str(" encoding=\"");
                writer.out.push_str(encoding);
                writer.out.push('"');
            }
            if let Some(standalone) = &decl.standalone {
                writer.out.push_str(" standalone=\"");
                writer.out.push_str(standalone);
                writer.out.push('"');
            }
            writer.out.push_str("?>");
        }
        None => {
            skip_leading = top_level
                .iter()
                .take_while(|id| doc.is_blank_text(**id))
                .count();
        }
    }

    for child in &top_level[skip_leading..] {
        writer.write_node(doc, *child);
    }

    writer.out
}

#[derive(Default)]
struct XmlWriter {
    out: String,

    /// Declarations in effect per open element, innermost last. `None` keys
    /// the default namespace; an empty value undeclares it.
    scopes: Vec<Vec<(Option<String>, String)>>,
}

impl XmlWriter {
    fn write_node(&mut self, doc: &Document, id: NodeId) {
        match doc.kind(id) {
            NodeKind::Document => {
                for child in doc.children(id) {
                    self.write_node(doc, *child);
                }
            }
            NodeKind::Element(element) => self.write_element(doc, id, element),
            NodeKind::Text(text) if text.is_literal() => {
                self.out.push_str("<![CDATA[");
                self.out.push_str(&text.content.replace("]]>", "]]]]><![CDATA[>"));
                self.out.push_str("]]>");
            }
            NodeKind::Text(text) => {
                self.out.push_str(&partial_escape(&text.content));
            }
            NodeKind::Comment(content) => {
                self.out.push_str("<!--");
                self.out.push_str(content);
                self.out.push_str("-->");
            }
            NodeKind::ProcessingInstruction { target, content } => {
                self.out.push_str("<?");
                self.out.push_str(target);
                if !content.is_empty() && !content.starts_with(char::is_whitespace) {
                    self.out.push(' ');
                }
                self.out.push_str(content);
                self.out.push_str("?>");
            }
        }
    }

    fn write_element(&mut self, doc: &Document, id: NodeId, element: &Element) {
        let frame = element
            .namespace_declarations()
            .map(|decl| (decl.declared_prefix().map(str::to_string), decl.value.clone()))
            .collect();
        self.scopes.push(frame);

        let mut synthesized: Vec<(Option<String>, String)> = Vec::new();
        let tag = self.element_tag(element, &mut synthesized);

        let mut attributes = String::new();
        for attribute in &element.attributes {
            let name = self.attribute_name(attribute, &mut synthesized);
            push_attribute(&mut attributes, &name, &attribute.value);
        }

        self.out.push('<');
        self.out.push_str(&tag);
        for (prefix, namespace) in &synthesized {
            match prefix {
                Some(p) => push_attribute(&mut self.out, &format!("xmlns:{}", p), namespace),
                None => push_attribute(&mut self.out, "xmlns", namespace),
            }
        }
        self.out.push_str(&attributes);

        let children = doc.children(id);
        if children.is_empty() {
            self.out.push_str("/>");
        } else {
            self.out.push('>');
            for child in children {
                self.write_node(doc, *child);
            }
            self.out.push_str("</");
            self.out.push_str(&tag);
            self.out.push('>');
        }

        self.scopes.pop();
    }

    /// Innermost binding of `prefix`.
    fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, ns)| ns.as_str())
    }

    /// A non-default prefix currently bound to `namespace`, innermost first.
    fn any_prefix_for(&self, namespace: &str) -> Option<String> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .filter_map(|(p, ns)| p.as_deref().filter(|_| ns == namespace))
            .find(|p| self.lookup(Some(*p)) == Some(namespace))
            .map(str::to_string)
    }

    fn bind(
        &mut self,
        prefix: Option<String>,
        namespace: &str,
        synthesized: &mut Vec<(Option<String>, String)>,
    ) {
        if let Some(frame) = self.scopes.last_mut() {
            frame.push((prefix.clone(), namespace.to_string()));
        }
        synthesized.push((prefix, namespace.to_string()));
    }

    /// Pick a prefix not declared on the current element.
    fn fresh_prefix(&self, hint: Option<&str>) -> String {
        let declared_here = |p: &str| {
            self.scopes
                .last()
                .is_some_and(|frame| frame.iter().any(|(q, _)| q.as_deref() == Some(p)))
        };
        if let Some(h) = hint {
            if h != "xml" && h != "xmlns" && !declared_here(h) {
                return h.to_string();
            }
        }
        (0..)
            .map(|n| format!("ns{}", n))
            .find(|p| !declared_here(p.as_str()) && self.lookup(Some(p.as_str())).is_none())
            .unwrap_or_else(|| "ns".to_string())
    }

    fn element_tag(
        &mut self,
        element: &Element,
        synthesized: &mut Vec<(Option<String>, String)>,
    ) -> String {
        let local = &element.name.local;
        let default = self.lookup(None).filter(|ns| !ns.is_empty());

        let Some(namespace) = element.name.namespace() else {
            if default.is_some() {
                self.bind(None, "", synthesized);
            }
            return local.clone();
        };

        if namespace == XML_NAMESPACE {
            return format!("xml:{}", local);
        }

        if default == Some(namespace) {
            return local.clone();
        }
        if let Some(hint) = element.prefix.as_deref() {
            if self.lookup(Some(hint)) == Some(namespace) {
                return format!("{}:{}", hint, local);
            }
        }
        if let Some(prefix) = self.any_prefix_for(namespace) {
            return format!("{}:{}", prefix, local);
        }

        let declares_default_here = self
            .scopes
            .last()
            .is_some_and(|frame| frame.iter().any(|(p, _)| p.is_none()));
        if element.prefix.is_none() && !declares_default_here {
            self.bind(None, namespace, synthesized);
            return local.clone();
        }

        let prefix = self.fresh_prefix(element.prefix.as_deref());
        self.bind(Some(prefix.clone()), namespace, synthesized);
        format!("{}:{}", prefix, local)
    }

    fn attribute_name(
        &mut self,
        attribute: &Attribute,
        synthesized: &mut Vec<(Option<String>, String)>,
    ) -> String {
        let local = &attribute.name.local;

        if attribute.is_default_namespace_declaration() {
            return "xmlns".to_string();
        }
        if attribute.is_namespace_declaration() {
            return format!("xmlns:{}", local);
        }

        let Some(namespace) = attribute.name.namespace() else {
            return local.clone();
        };

        if namespace == XML_NAMESPACE {
            return format!("xml:{}", local);
        }

        if let Some(hint) = attribute.prefix.as_deref() {
            if self.lookup(Some(hint)) == Some(namespace) {
                return format!("{}:{}", hint, local);
            }
        }
        if let Some(prefix) = self.any_prefix_for(namespace) {
            return format!("{}:{}", prefix, local);
        }

        let prefix = self.fresh_prefix(attribute.prefix.as_deref());
        self.bind(Some(prefix.clone()), namespace, synthesized);
        format!("{}:{}", prefix, local)
    }
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_attribute(value));
    out.push('"');
}

fn escape_attribute(value: &str) -> Cow<'_, str> {
    let escaped = partial_escape(value);
    if escaped.contains('"') {
        Cow::Owned(escaped.replace('"', "&quot;"))
    } else {
        escaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use crate::types::{QName, TextKind, XmlDeclaration};

    #[test]
    fn test_round_trip_preserves_layout() {
        let source = "<Wix xmlns=\"http://wixtoolset.org/schemas/v4/wxs\">\n    <Fragment>\n        <Property Id=\"A\" Value=\"1\"/>\n    </Fragment>\n</Wix>";
        let doc = parse(source).unwrap();
        assert_eq!(to_xml_string(&doc), source);
    }

    #[test]
    fn test_declaration_written_when_present() {
        let doc = parse("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Wix/>").unwrap();
        assert_eq!(
            to_xml_string(&doc),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Wix/>"
        );
    }

    #[test]
    fn test_leading_whitespace_dropped_without_declaration() {
        let mut doc = parse("<?xml version=\"1.0\"?>\n<Wix/>\n").unwrap();
        doc.declaration = None;
        assert_eq!(to_xml_string(&doc), "<Wix/>\n");

        doc.declaration = Some(XmlDeclaration::default());
        assert_eq!(
            to_xml_string(&doc),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Wix/>\n"
        );
    }

    #[test]
    fn test_escaping() {
        let doc = parse(r#"<Wix Condition="A &lt; B AND C=&quot;x&quot;">a &amp; b<![CDATA[<raw>]]></Wix>"#).unwrap();
        assert_eq!(
            to_xml_string(&doc),
            r#"<Wix Condition="A &lt; B AND C=&quot;x&quot;">a &amp; b<![CDATA[<raw>]]></Wix>"#
        );
    }

    #[test]
    fn test_retargeted_namespace_keeps_prefix() {
        let mut doc = parse(r#"<Wix xmlns:util="urn:old"><util:User/></Wix>"#).unwrap();
        let root = doc.root_element().unwrap();
        let user = doc.element_children(root)[0];
        doc.element_mut(root).unwrap().attributes[0].value = "urn:new".to_string();
        doc.element_mut(user).unwrap().name = QName::in_namespace("urn:new", "User");
        assert_eq!(
            to_xml_string(&doc),
            r#"<Wix xmlns:util="urn:new"><util:User/></Wix>"#
        );
    }

    #[test]
    fn test_element_moved_to_default_namespace_loses_prefix() {
        let mut doc = parse(r#"<Wix xmlns="urn:core" xmlns:dep="urn:dep"><dep:Provides/></Wix>"#).unwrap();
        let root = doc.root_element().unwrap();
        let provides = doc.element_children(root)[0];
        doc.element_mut(provides).unwrap().name = QName::in_namespace("urn:core", "Provides");
        assert_eq!(
            to_xml_string(&doc),
            r#"<Wix xmlns="urn:core" xmlns:dep="urn:dep"><Provides/></Wix>"#
        );
    }

    #[test]
    fn test_unbound_namespace_is_declared() {
        let mut doc = parse(r#"<Wix xmlns="urn:core"/>"#).unwrap();
        let root = doc.root_element().unwrap();
        let mut ba = Element::new(QName::in_namespace("urn:bal", "Theme"));
        ba.prefix = Some("bal".to_string());
        let child = doc.create_element(ba, 0);
        doc.append_child(root, child);
        insta::assert_snapshot!(
            to_xml_string(&doc),
            @r#"<Wix xmlns="urn:core"><bal:Theme xmlns:bal="urn:bal"/></Wix>"#
        );
    }

    #[test]
    fn test_unqualified_child_under_default_namespace() {
        let mut doc = parse(r#"<Wix xmlns="urn:core"/>"#).unwrap();
        let root = doc.root_element().unwrap();
        let child = doc.create_element(Element::new(QName::unqualified("Plain")), 0);
        doc.append_child(root, child);
        let text = doc.create_text("x", TextKind::Plain, 0);
        doc.append_child(child, text);
        assert_eq!(
            to_xml_string(&doc),
            r#"<Wix xmlns="urn:core"><Plain xmlns="">x</Plain></Wix>"#
        );
    }

    #[test]
    fn test_comments_and_instructions() {
        let source = "<!-- c -->\n<Wix><?define A = 1 ?><!--inner--></Wix>";
        let doc = parse(source).unwrap();
        assert_eq!(to_xml_string(&doc), source);
    }
}
