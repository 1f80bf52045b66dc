//! Core types for the mutable, line-tracked XML tree.
//!
//! The tree is an arena: every node lives in [`Document::nodes`] and is
//! addressed by a copyable [`NodeId`]. Detaching a node only unlinks it from
//! its parent; the record stays in the arena so that ids held by callers stay
//! valid while a conversion is in progress.

/// Namespace reserved for namespace-declaration attributes (`xmlns`, `xmlns:p`).
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// Namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Index of a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// A namespace-qualified name.
///
/// `namespace` is the resolved namespace identifier, never the prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(namespace: Option<&str>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            local: local.into(),
        }
    }

    /// A name in no namespace.
    pub fn unqualified(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }

    /// A name in the given namespace.
    pub fn in_namespace(namespace: &str, local: impl Into<String>) -> Self {
        Self::new(Some(namespace), local)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn is(&self, namespace: Option<&str>, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == namespace
    }
}

impl std::fmt::Display for QName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// An attribute: qualified name, value, and the prefix it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,

    /// Prefix used in the source, kept as a serialization hint.
    pub prefix: Option<String>,

    /// The attribute value (after unescaping XML entities).
    pub value: String,
}

impl Attribute {
    /// An attribute in no namespace.
    pub fn new(local: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: QName::unqualified(local),
            prefix: None,
            value: value.into(),
        }
    }

    /// A namespace declaration binding `prefix` (or the default namespace when
    /// `None`) to `namespace`.
    pub fn namespace_declaration(prefix: Option<&str>, namespace: impl Into<String>) -> Self {
        match prefix {
            Some(p) => Self {
                name: QName::in_namespace(XMLNS_NAMESPACE, p),
                prefix: Some("xmlns".to_string()),
                value: namespace.into(),
            },
            None => Self {
                name: QName::in_namespace(XMLNS_NAMESPACE, "xmlns"),
                prefix: None,
                value: namespace.into(),
            },
        }
    }

    pub fn is_namespace_declaration(&self) -> bool {
        self.name.namespace.as_deref() == Some(XMLNS_NAMESPACE)
    }

    pub fn is_default_namespace_declaration(&self) -> bool {
        self.is_namespace_declaration() && self.prefix.is_none() && self.name.local == "xmlns"
    }

    /// The prefix bound by this declaration; `None` for the default
    /// declaration and for ordinary attributes.
    pub fn declared_prefix(&self) -> Option<&str> {
        if self.is_namespace_declaration() && !self.is_default_namespace_declaration() {
            Some(&self.name.local)
        } else {
            None
        }
    }
}

/// Whether text is subject to whitespace canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    /// Ordinary character data.
    Plain,
    /// CDATA section; never trimmed or re-indented.
    Literal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub content: String,
    pub kind: TextKind,
}

impl Text {
    pub fn is_plain(&self) -> bool {
        self.kind == TextKind::Plain
    }

    pub fn is_literal(&self) -> bool {
        self.kind == TextKind::Literal
    }

    /// Plain text made only of XML whitespace.
    pub fn is_blank(&self) -> bool {
        self.is_plain() && is_xml_whitespace(&self.content)
    }
}

/// An element: qualified name, source prefix, ordered attributes.
///
/// Children live on the owning [`NodeData`], not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QName,

    /// Prefix used in the source, kept as a serialization hint.
    pub prefix: Option<String>,

    pub attributes: Vec<Attribute>,
}

impl Element {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            prefix: None,
            attributes: Vec::new(),
        }
    }

    pub fn is(&self, namespace: Option<&str>, local: &str) -> bool {
        self.name.is(namespace, local)
    }

    /// Value of an un-namespaced attribute.
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.namespace.is_none() && a.name.local == local)
            .map(|a| a.value.as_str())
    }

    pub fn has_attribute(&self, local: &str) -> bool {
        self.attribute(local).is_some()
    }

    /// Set an un-namespaced attribute, replacing the value in place when it
    /// already exists and appending it otherwise.
    pub fn set_attribute(&mut self, local: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name.namespace.is_none() && a.name.local == local)
        {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute::new(local, value)),
        }
    }

    /// Remove an un-namespaced attribute, returning its value.
    pub fn remove_attribute(&mut self, local: &str) -> Option<String> {
        let pos = self
            .attributes
            .iter()
            .position(|a| a.name.namespace.is_none() && a.name.local == local)?;
        Some(self.attributes.remove(pos).value)
    }

    /// Rename an un-namespaced attribute, keeping its position.
    ///
    /// Returns false when the attribute is missing or the new name is taken.
    pub fn rename_attribute(&mut self, from: &str, to: &str) -> bool {
        if self.has_attribute(to) {
            return false;
        }
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name.namespace.is_none() && a.name.local == from)
        {
            Some(attr) => {
                attr.name.local = to.to_string();
                true
            }
            None => false,
        }
    }

    pub fn namespace_declarations(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| a.is_namespace_declaration())
    }
}

/// The kind-specific payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(Text),
    Comment(String),
    ProcessingInstruction { target: String, content: String },
}

/// One arena record.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,

    /// 1-based line where the node starts in the source (0 for synthesized nodes).
    pub line: usize,
}

/// The `<?xml ...?>` declaration, when the source had one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Default for XmlDeclaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: Some("utf-8".to_string()),
            standalone: None,
        }
    }
}

/// A mutable XML document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    pub declaration: Option<XmlDeclaration>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns true when every character is XML whitespace (space, tab, CR, LF).
/// The empty string counts as whitespace.
pub fn is_xml_whitespace(s: &str) -> bool {
    s.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}

impl Document {
    /// The document node; parent of the root element.
    pub const DOCUMENT: NodeId = NodeId(0);

    /// An empty document holding only the document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
                line: 0,
            }],
            declaration: None,
        }
    }

    // ---- node access ------------------------------------------------------

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn line(&self, id: NodeId) -> usize {
        self.nodes[id.0].line
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&Text> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn text_mut(&mut self, id: NodeId) -> Option<&mut Text> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Element(_))
    }

    pub fn is_element_named(&self, id: NodeId, namespace: Option<&str>, local: &str) -> bool {
        self.element(id).is_some_and(|e| e.is(namespace, local))
    }

    /// Plain whitespace-only text node.
    pub fn is_blank_text(&self, id: NodeId) -> bool {
        self.text(id).is_some_and(Text::is_blank)
    }

    pub fn is_literal_text(&self, id: NodeId) -> bool {
        self.text(id).is_some_and(Text::is_literal)
    }

    // ---- navigation -------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
            .collect()
    }

    /// Element children with the given name.
    pub fn children_named(&self, id: NodeId, namespace: Option<&str>, local: &str) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.is_element_named(*c, namespace, local))
            .collect()
    }

    /// The single element child of the document node.
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(Self::DOCUMENT)
            .iter()
            .copied()
            .find(|c| self.is_element(*c))
    }

    fn position_in_parent(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let pos = self.children(parent).iter().position(|c| *c == id)?;
        Some((parent, pos))
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, pos) = self.position_in_parent(id)?;
        pos.checked_sub(1).map(|p| self.children(parent)[p])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, pos) = self.position_in_parent(id)?;
        self.children(parent).get(pos + 1).copied()
    }

    /// The node and all nodes below it, in document order.
    pub fn descendants_and_self(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Whether `id` is still reachable from the document node.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == Self::DOCUMENT {
                return true;
            }
            match self.parent(current) {
                Some(p) => current = p,
                None => return false,
            }
        }
    }

    /// Concatenated content of all text descendants.
    pub fn inner_text(&self, id: NodeId) -> String {
        self.descendants_and_self(id)
            .into_iter()
            .filter_map(|n| self.text(n).map(|t| t.content.as_str()))
            .collect()
    }

    /// True when the node has children and all of them are text.
    pub fn has_only_text_children(&self, id: NodeId) -> bool {
        let children = self.children(id);
        !children.is_empty() && children.iter().all(|c| self.text(*c).is_some())
    }

    // ---- construction and mutation ---------------------------------------

    fn push_node(&mut self, kind: NodeKind, line: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            line,
        });
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, element: Element, line: usize) -> NodeId {
        self.push_node(NodeKind::Element(element), line)
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, content: impl Into<String>, kind: TextKind, line: usize) -> NodeId {
        self.push_node(
            NodeKind::Text(Text {
                content: content.into(),
                kind,
            }),
            line,
        )
    }

    pub fn create_comment(&mut self, content: impl Into<String>, line: usize) -> NodeId {
        self.push_node(NodeKind::Comment(content.into()), line)
    }

    pub fn create_processing_instruction(
        &mut self,
        target: impl Into<String>,
        content: impl Into<String>,
        line: usize,
    ) -> NodeId {
        self.push_node(
            NodeKind::ProcessingInstruction {
                target: target.into(),
                content: content.into(),
            },
            line,
        )
    }

    /// Copy a node (and its subtree) into new, detached arena records.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let kind = self.nodes[id.0].kind.clone();
        let line = self.nodes[id.0].line;
        let copy = self.push_node(kind, line);
        let children = self.nodes[id.0].children.clone();
        for child in children {
            let child_copy = self.deep_clone(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Unlink a node from its parent. No-op for detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` at `index` (clamped to the child count).
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
    }

    /// Detach every child of `id`.
    pub fn remove_children(&mut self, id: NodeId) {
        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
    }

    /// Move the whole child list out of `parent`.
    ///
    /// The children keep their parent link so that lookups made while the
    /// list is held elsewhere still see where they belong; [`set_children`]
    /// fixes the links up when the list comes back.
    ///
    /// [`set_children`]: Document::set_children
    pub fn take_children(&mut self, parent: NodeId) -> Vec<NodeId> {
        std::mem::take(&mut self.nodes[parent.0].children)
    }

    /// Install `children` as the complete child list of `parent`.
    ///
    /// Nodes that pointed at `parent` but are not in the list are detached.
    pub fn set_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        for node in self.nodes.iter_mut() {
            if node.parent == Some(parent) {
                node.parent = None;
            }
        }
        for child in &children {
            self.detach(*child);
            self.nodes[child.0].parent = Some(parent);
        }
        self.nodes[parent.0].children = children;
    }
}
