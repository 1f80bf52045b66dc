//! Editing a node's place among its siblings together with the whitespace
//! around it.
//!
//! [`SiblingSurgery`] takes the whole child list of the target's parent out
//! of the document, lets the caller edit that list, and puts it back when it
//! is dropped. Looking at "the blank text before the target" is then a plain
//! index lookup instead of a walk over a list that is changing underneath.

use wix_xml::{Document, NodeId};

pub struct SiblingSurgery<'d> {
    doc: &'d mut Document,
    parent: NodeId,
    siblings: Vec<NodeId>,
    target: NodeId,

    /// Position of the target, or where it stood before it was removed.
    index: usize,
    removed: bool,
}

impl<'d> SiblingSurgery<'d> {
    /// Start editing around `target`. Returns `None` for a detached node.
    pub fn new(doc: &'d mut Document, target: NodeId) -> Option<Self> {
        let parent = doc.parent(target)?;
        let index = doc.children(parent).iter().position(|c| *c == target)?;
        let siblings = doc.take_children(parent);
        Some(Self {
            doc,
            parent,
            siblings,
            target,
            index,
            removed: false,
        })
    }

    /// The document, for creating or editing nodes while the list is out.
    pub fn document(&mut self) -> &mut Document {
        self.doc
    }

    pub fn parent(&self) -> NodeId {
        self.parent
    }

    fn is_blank_at(&self, index: usize) -> bool {
        self.siblings
            .get(index)
            .is_some_and(|id| self.doc.is_blank_text(*id))
    }

    /// The blank text directly before the target, if any.
    pub fn preceding_whitespace(&self) -> Option<NodeId> {
        let before = self.index.checked_sub(1)?;
        self.is_blank_at(before).then(|| self.siblings[before])
    }

    /// Remove the target along with one adjacent blank text node: the one
    /// before it, or the one after it when there is none before.
    ///
    /// Only one is dropped: removing both would join the neighbors on one
    /// line.
    pub fn remove_target(&mut self) {
        if self.removed {
            return;
        }
        self.siblings.remove(self.index);
        self.removed = true;

        if self.index > 0 && self.is_blank_at(self.index - 1) {
            self.siblings.remove(self.index - 1);
            self.index -= 1;
        } else if self.is_blank_at(self.index) {
            self.siblings.remove(self.index);
        }
    }

    /// Put `replacement` where the target is.
    pub fn replace_target(&mut self, replacement: NodeId) {
        if self.removed {
            self.siblings.insert(self.index, replacement);
            self.removed = false;
        } else {
            self.siblings[self.index] = replacement;
        }
        self.target = replacement;
    }

    /// Insert `nodes` in order before the target. Each inserted node is
    /// followed by a copy of the blank text that precedes the target, so every
    /// new sibling sits on its own line.
    pub fn insert_before_target(&mut self, nodes: &[NodeId]) {
        let separator = self.preceding_whitespace();
        for node in nodes {
            self.siblings.insert(self.index, *node);
            self.index += 1;
            if let Some(ws) = separator {
                let copy = self.doc.deep_clone(ws);
                self.siblings.insert(self.index, copy);
                self.index += 1;
            }
        }
    }

    /// Replace the target with its own children. At most one blank text node
    /// is dropped from each end of the moved children.
    pub fn unwrap_target(&mut self) {
        if self.removed {
            return;
        }
        let mut children = self.doc.take_children(self.target);
        if children.last().is_some_and(|c| self.doc.is_blank_text(*c)) {
            children.pop();
        }
        if children.first().is_some_and(|c| self.doc.is_blank_text(*c)) {
            children.remove(0);
        }
        // The emptied wrapper keeps no stale links to the moved nodes.
        self.doc.set_children(self.target, Vec::new());

        self.siblings
            .splice(self.index..=self.index, children.iter().copied());
        self.removed = true;
    }
}

impl Drop for SiblingSurgery<'_> {
    fn drop(&mut self) {
        let siblings = std::mem::take(&mut self.siblings);
        self.doc.set_children(self.parent, siblings);
    }
}
