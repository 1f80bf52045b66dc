//! XML loader that builds a mutable [`Document`] with line numbers.

use std::borrow::Cow;

use crate::line_index::LineIndex;
use crate::types::{
    Attribute, Document, Element, NodeId, QName, TextKind, XML_NAMESPACE, XMLNS_NAMESPACE,
    XmlDeclaration,
};
use crate::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesCData, BytesDecl, BytesStart, BytesText, Event};

/// Parse XML from a string, producing a [`Document`].
///
/// Newlines are normalized to `\n` first; no whitespace is trimmed.
///
/// # Example
///
/// ```rust
/// use wix_xml::parse;
///
/// let doc = parse("<Wix>\n  <Fragment/>\n</Wix>").unwrap();
/// let root = doc.root_element().unwrap();
/// assert_eq!(doc.element(root).unwrap().name.local, "Wix");
/// assert_eq!(doc.children(root).len(), 3);
/// ```
///
/// # Errors
///
/// Returns an error if the XML is not well-formed, including unbound
/// namespace prefixes.
pub fn parse(content: &str) -> Result<Document> {
    let normalized = normalize_newlines(content);
    let parser = XmlParser::new(&normalized);
    parser.parse()
}

/// Replace `\r\n` and lone `\r` with `\n`.
pub fn normalize_newlines(content: &str) -> Cow<'_, str> {
    if content.contains('\r') {
        Cow::Owned(content.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(content)
    }
}

/// Internal parser state.
struct XmlParser<'a> {
    reader: Reader<&'a [u8]>,

    lines: LineIndex,

    doc: Document,

    /// Open elements, innermost last, with their raw (prefixed) names.
    stack: Vec<(NodeId, String)>,

    /// Namespace bindings introduced by each open element.
    scopes: Vec<Vec<(Option<String>, String)>>,
}

impl<'a> XmlParser<'a> {
    fn new(source: &'a str) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        Self {
            reader,
            lines: LineIndex::new(source),
            doc: Document::new(),
            stack: Vec::new(),
            scopes: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<Document> {
        loop {
            // Capture position before reading the event
            let event_start = self.reader.buffer_position() as usize;
            let line = self.lines.line_of(event_start);

            match self.reader.read_event() {
                Ok(Event::Start(e)) => {
                    let id = self.handle_start(&e, line)?;
                    let raw = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    self.stack.push((id, raw));
                }
                Ok(Event::Empty(e)) => {
                    self.handle_start(&e, line)?;
                    self.scopes.pop();
                }
                Ok(Event::End(e)) => {
                    let found = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    match self.stack.pop() {
                        Some((_, expected)) if expected == found => {
                            self.scopes.pop();
                        }
                        Some((_, expected)) => {
                            return Err(Error::MismatchedEndTag {
                                expected,
                                found,
                                line: Some(line),
                            });
                        }
                        None => {
                            return Err(Error::InvalidStructure {
                                message: format!("Unexpected closing tag </{}>", found),
                                line: Some(line),
                            });
                        }
                    }
                }
                Ok(Event::Text(e)) => self.handle_text(&e, line)?,
                Ok(Event::CData(e)) => self.handle_cdata(&e, line)?,
                Ok(Event::Comment(e)) => {
                    let content = String::from_utf8_lossy(&e).into_owned();
                    let id = self.doc.create_comment(content, line);
                    self.doc.append_child(self.current_parent(), id);
                }
                Ok(Event::PI(e)) => {
                    let target = String::from_utf8_lossy(e.target()).into_owned();
                    let content = String::from_utf8_lossy(e.content()).into_owned();
                    let id = self.doc.create_processing_instruction(target, content, line);
                    self.doc.append_child(self.current_parent(), id);
                }
                Ok(Event::Decl(e)) => {
                    self.doc.declaration = Some(read_declaration(&e)?);
                }
                Ok(Event::DocType(_)) => {
                    // Skip DOCTYPE declarations
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    let position = self.reader.error_position() as usize;
                    return Err(Error::XmlSyntax {
                        message: e.to_string(),
                        line: Some(self.lines.line_of(position)),
                    });
                }
            }
        }

        if let Some((id, raw)) = self.stack.last() {
            return Err(Error::UnexpectedEof {
                expected: raw.clone(),
                line: Some(self.doc.line(*id)),
            });
        }

        if self.doc.root_element().is_none() {
            return Err(Error::EmptyDocument);
        }

        Ok(self.doc)
    }

    fn current_parent(&self) -> NodeId {
        self.stack
            .last()
            .map_or(Document::DOCUMENT, |(id, _)| *id)
    }

    /// Build the element for a start or empty tag, attach it, and push its
    /// namespace scope.
    fn handle_start(&mut self, e: &BytesStart<'_>, line: usize) -> Result<NodeId> {
        let parent = self.current_parent();
        if parent == Document::DOCUMENT && self.doc.root_element().is_some() {
            return Err(Error::MultipleRoots { line: Some(line) });
        }

        let mut raw_attributes = Vec::new();
        let mut bindings = Vec::new();
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|err| Error::XmlSyntax {
                message: format!("Attribute error: {}", err),
                line: Some(line),
            })?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| Error::XmlSyntax {
                    message: format!("Invalid attribute value: {}", err),
                    line: Some(line),
                })?
                .into_owned();

            if key == "xmlns" {
                bindings.push((None, value.clone()));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                bindings.push((Some(prefix.to_string()), value.clone()));
            }
            raw_attributes.push((key, value));
        }
        self.scopes.push(bindings);

        let raw_name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let (prefix, local) = split_name(&raw_name);
        let namespace = self.resolve_element_prefix(prefix, line)?;

        let mut attributes: Vec<Attribute> = Vec::with_capacity(raw_attributes.len());
        for (key, value) in raw_attributes {
            let attribute = self.resolve_attribute(&key, value, line)?;
            if attributes.iter().any(|a| a.name == attribute.name) {
                return Err(Error::DuplicateAttribute {
                    name: key,
                    line: Some(line),
                });
            }
            attributes.push(attribute);
        }

        let element = Element {
            name: QName {
                namespace,
                local: local.to_string(),
            },
            prefix: prefix.map(str::to_string),
            attributes,
        };
        let id = self.doc.create_element(element, line);
        self.doc.append_child(parent, id);
        Ok(id)
    }

    fn handle_text(&mut self, e: &BytesText<'_>, line: usize) -> Result<()> {
        let text = e.unescape().map_err(|err| Error::XmlSyntax {
            message: format!("Invalid text content: {}", err),
            line: Some(line),
        })?;

        let parent = self.current_parent();
        if parent == Document::DOCUMENT && !crate::types::is_xml_whitespace(&text) {
            return Err(Error::InvalidStructure {
                message: "Text is not allowed outside the root element".to_string(),
                line: Some(line),
            });
        }

        // Merge with a preceding plain text sibling so that neighbors are
        // always element, literal, comment or instruction nodes.
        if let Some(&last) = self.doc.children(parent).last() {
            if let Some(existing) = self.doc.text_mut(last) {
                if existing.is_plain() {
                    existing.content.push_str(&text);
                    return Ok(());
                }
            }
        }

        let id = self.doc.create_text(text.into_owned(), TextKind::Plain, line);
        self.doc.append_child(parent, id);
        Ok(())
    }

    fn handle_cdata(&mut self, e: &BytesCData<'_>, line: usize) -> Result<()> {
        let parent = self.current_parent();
        if parent == Document::DOCUMENT {
            return Err(Error::InvalidStructure {
                message: "CDATA is not allowed outside the root element".to_string(),
                line: Some(line),
            });
        }

        let content = String::from_utf8_lossy(e).into_owned();
        let id = self.doc.create_text(content, TextKind::Literal, line);
        self.doc.append_child(parent, id);
        Ok(())
    }

    fn lookup_prefix(&self, prefix: Option<&str>) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, ns)| ns.as_str())
    }

    fn resolve_element_prefix(&self, prefix: Option<&str>, line: usize) -> Result<Option<String>> {
        match prefix {
            None => Ok(self
                .lookup_prefix(None)
                .filter(|ns| !ns.is_empty())
                .map(str::to_string)),
            Some("xml") => Ok(Some(XML_NAMESPACE.to_string())),
            Some(p) => match self.lookup_prefix(Some(p)) {
                Some(ns) if !ns.is_empty() => Ok(Some(ns.to_string())),
                _ => Err(Error::UnboundPrefix {
                    prefix: p.to_string(),
                    line: Some(line),
                }),
            },
        }
    }

    fn resolve_attribute(&self, key: &str, value: String, line: usize) -> Result<Attribute> {
        if key == "xmlns" {
            return Ok(Attribute::namespace_declaration(None, value));
        }

        let (prefix, local) = split_name(key);
        let namespace = match prefix {
            None => None,
            Some("xmlns") => Some(XMLNS_NAMESPACE.to_string()),
            Some("xml") => Some(XML_NAMESPACE.to_string()),
            Some(p) => match self.lookup_prefix(Some(p)) {
                Some(ns) if !ns.is_empty() => Some(ns.to_string()),
                _ => {
                    return Err(Error::UnboundPrefix {
                        prefix: p.to_string(),
                        line: Some(line),
                    });
                }
            },
        };

        Ok(Attribute {
            name: QName {
                namespace,
                local: local.to_string(),
            },
            prefix: prefix.map(str::to_string),
            value,
        })
    }
}

fn split_name(raw: &str) -> (Option<&str>, &str) {
    match raw.find(':') {
        Some(pos) => (Some(&raw[..pos]), &raw[pos + 1..]),
        None => (None, raw),
    }
}

fn read_declaration(e: &BytesDecl<'_>) -> Result<XmlDeclaration> {
    let version = String::from_utf8_lossy(&e.version()?).into_owned();
    let encoding = match e.encoding() {
        Some(enc) => Some(String::from_utf8_lossy(&enc?).into_owned()),
        None => None,
    };
    let standalone = match e.standalone() {
        Some(sa) => Some(String::from_utf8_lossy(&sa?).into_owned()),
        None => None,
    };

    Ok(XmlDeclaration {
        version,
        encoding,
        standalone,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeKind;

    /// Kinds of nodes the parser produced, for quick inspection in tests.
    fn kinds(doc: &Document, id: NodeId) -> Vec<&'static str> {
        doc.children(id)
            .iter()
            .map(|c| match doc.kind(*c) {
                NodeKind::Document => "document",
                NodeKind::Element(_) => "element",
                NodeKind::Text(t) if t.is_literal() => "cdata",
                NodeKind::Text(_) => "text",
                NodeKind::Comment(_) => "comment",
                NodeKind::ProcessingInstruction { .. } => "pi",
            })
            .collect()
    }

    #[test]
    fn test_parse_simple_element() {
        let doc = parse("<Wix/>").unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.element(root).unwrap().name.local, "Wix");
        assert!(doc.children(root).is_empty());
    }

    #[test]
    fn test_whitespace_is_preserved() {
        let doc = parse("<Wix>\n    <Fragment />\n</Wix>\n").unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(kinds(&doc, root), vec!["text", "element", "text"]);
        assert_eq!(doc.text(doc.children(root)[0]).unwrap().content, "\n    ");
        assert_eq!(kinds(&doc, Document::DOCUMENT), vec!["element", "text"]);
    }

    #[test]
    fn test_line_numbers() {
        let doc = parse("<Wix>\n  <Fragment>\n    <Component />\n  </Fragment>\n</Wix>").unwrap();
        let root = doc.root_element().unwrap();
        let fragment = doc.element_children(root)[0];
        let component = doc.element_children(fragment)[0];
        assert_eq!(doc.line(root), 1);
        assert_eq!(doc.line(fragment), 2);
        assert_eq!(doc.line(component), 3);
    }

    #[test]
    fn test_crlf_is_normalized() {
        let doc = parse("<Wix>\r\n  <Fragment />\r\n</Wix>").unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.text(doc.children(root)[0]).unwrap().content, "\n  ");
        assert_eq!(doc.line(doc.element_children(root)[0]), 2);
    }

    #[test]
    fn test_namespaces_resolved() {
        let doc = parse(
            r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs" xmlns:util="urn:util"><util:User util:Name="x" Id="u" /></Wix>"#,
        )
        .unwrap();
        let root = doc.root_element().unwrap();
        let root_el = doc.element(root).unwrap();
        assert_eq!(
            root_el.name.namespace(),
            Some("http://wixtoolset.org/schemas/v4/wxs")
        );
        assert_eq!(root_el.namespace_declarations().count(), 2);

        let user = doc.element(doc.element_children(root)[0]).unwrap();
        assert!(user.is(Some("urn:util"), "User"));
        assert_eq!(user.prefix.as_deref(), Some("util"));
        assert_eq!(user.attributes[0].name.namespace(), Some("urn:util"));
        assert_eq!(user.attribute("Id"), Some("u"));
    }

    #[test]
    fn test_cdata_is_literal() {
        let doc = parse("<Wix><![CDATA[a < b]]></Wix>").unwrap();
        let root = doc.root_element().unwrap();
        let text = doc.text(doc.children(root)[0]).unwrap();
        assert!(text.is_literal());
        assert_eq!(text.content, "a < b");
    }

    #[test]
    fn test_comments_and_instructions() {
        let doc = parse("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!-- top -->\n<Wix><?define X = 1 ?></Wix>").unwrap();
        let decl = doc.declaration.as_ref().unwrap();
        assert_eq!(decl.version, "1.0");
        assert_eq!(decl.encoding.as_deref(), Some("utf-8"));
        assert_eq!(
            kinds(&doc, Document::DOCUMENT),
            vec!["text", "comment", "text", "element"]
        );
        let root = doc.root_element().unwrap();
        match doc.kind(doc.children(root)[0]) {
            NodeKind::ProcessingInstruction { target, content } => {
                assert_eq!(target, "define");
                assert_eq!(content.trim(), "X = 1");
            }
            other => panic!("expected processing instruction, got {:?}", other),
        }
    }

    #[test]
    fn test_entities_unescaped() {
        let doc = parse(r#"<Wix Name="a &amp; b">x &lt; y</Wix>"#).unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.element(root).unwrap().attribute("Name"), Some("a & b"));
        assert_eq!(doc.inner_text(root), "x < y");
    }

    #[test]
    fn test_empty_document_error() {
        assert!(matches!(parse(""), Err(Error::EmptyDocument)));
    }

    #[test]
    fn test_unclosed_element_error() {
        let result = parse("<Wix>\n<Fragment>");
        assert!(
            matches!(result, Err(Error::UnexpectedEof { .. } | Error::XmlSyntax { .. })),
            "got {:?}",
            result
        );
    }

    #[test]
    fn test_mismatched_tags_error() {
        let result = parse("<Wix></Wrong>");
        // quick-xml checks end names itself and reports a syntax error
        assert!(
            matches!(
                result,
                Err(Error::MismatchedEndTag { .. } | Error::XmlSyntax { .. })
            ),
            "got {:?}",
            result
        );
    }

    #[test]
    fn test_multiple_roots_error() {
        let result = parse("<Wix/><Other/>");
        assert!(matches!(result, Err(Error::MultipleRoots { .. })));
    }

    #[test]
    fn test_unbound_prefix_error() {
        let result = parse("<Wix><util:User /></Wix>");
        assert!(matches!(result, Err(Error::UnboundPrefix { ref prefix, line: Some(1) }) if prefix == "util"));
    }
}
