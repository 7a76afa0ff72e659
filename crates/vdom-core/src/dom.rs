//! In-memory presentation tree mutated by the reconciler.
//!
//! `Document` is an arena of element and text nodes addressed by [`NodeId`].
//! It models the small slice of host behavior the engine relies on: child
//! order, attributes, class and style, live form properties, inner HTML and
//! listener registration. Every mutation is counted in [`MutationStats`] so
//! callers can assert that a render did no more work than necessary.

use std::fmt;
use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::collections::map::HashMap;
use crate::component::{ComponentId, StatefulUnit};
use crate::value::{AttrValue, Attributes, Handler};

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    Missing { id: NodeId },
    NotAnElement { id: NodeId },
    NotText { id: NodeId },
    Rejected { id: NodeId, name: String },
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::Missing { id } => write!(f, "node {id} missing"),
            DomError::NotAnElement { id } => write!(f, "node {id} is not an element"),
            DomError::NotText { id } => write!(f, "node {id} is not a text node"),
            DomError::Rejected { id, name } => {
                write!(f, "node {id} rejected value for property {name}")
            }
        }
    }
}

impl std::error::Error for DomError {}

/// Host mutation counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MutationStats {
    pub created: usize,
    pub inserted: usize,
    pub removed: usize,
    pub text_writes: usize,
    pub attribute_writes: usize,
    pub listener_writes: usize,
}

impl MutationStats {
    pub fn total(&self) -> usize {
        self.created
            + self.inserted
            + self.removed
            + self.text_writes
            + self.attribute_writes
            + self.listener_writes
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DomKind {
    Text(String),
    Element { tag: String, name: String },
}

/// Engine bookkeeping attached to a presentation node.
#[derive(Default)]
pub(crate) struct Binding {
    /// Outermost unit instance whose root this node is.
    pub(crate) component: Option<ComponentId>,
    pub(crate) unit: Option<StatefulUnit>,
    /// Attributes last applied from a description.
    pub(crate) props_cache: Option<Attributes>,
    pub(crate) handlers: HashMap<String, Handler>,
    /// Set while the node sits in the engine's node pool.
    pub(crate) pooled: bool,
}

pub struct DomNode {
    kind: DomKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: IndexMap<String, String>,
    class_name: String,
    style: IndexMap<String, String>,
    value: Option<String>,
    checked: bool,
    inner_html: Option<String>,
    listeners: IndexMap<String, bool>,
    pub(crate) binding: Binding,
}

impl DomNode {
    fn new(kind: DomKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: IndexMap::new(),
            class_name: String::new(),
            style: IndexMap::new(),
            value: None,
            checked: false,
            inner_html: None,
            listeners: IndexMap::new(),
            binding: Binding::default(),
        }
    }

    pub fn kind(&self) -> &DomKind {
        &self.kind
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, DomKind::Text(_))
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            DomKind::Text(text) => Some(text),
            DomKind::Element { .. } => None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            DomKind::Element { tag, .. } => Some(tag),
            DomKind::Text(_) => None,
        }
    }

    /// Lower-cased tag used for type matching and pooling.
    pub fn normalized_name(&self) -> Option<&str> {
        match &self.kind {
            DomKind::Element { name, .. } => Some(name),
            DomKind::Text(_) => None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn style_property(&self, name: &str) -> Option<&str> {
        self.style.get(name).map(String::as_str)
    }

    pub fn css_text(&self) -> String {
        self.style
            .iter()
            .map(|(name, value)| format!("{name}: {value};"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn checked(&self) -> bool {
        self.checked
    }

    pub fn inner_html(&self) -> Option<&str> {
        self.inner_html.as_deref()
    }

    /// Registered listeners as `(event, capture)` pairs.
    pub fn listeners(&self) -> impl Iterator<Item = (&str, bool)> {
        self.listeners
            .iter()
            .map(|(name, capture)| (name.as_str(), *capture))
    }

    pub fn has_listener(&self, event: &str) -> bool {
        self.listeners.contains_key(event)
    }

    /// Owning unit instance, if this node is a unit's root.
    pub fn component(&self) -> Option<ComponentId> {
        self.binding.component
    }
}

impl fmt::Debug for DomNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomNode")
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish()
    }
}

/// Properties reflected by the host; everything else is written as an attribute.
const REFLECTED_STRING_PROPS: &[&str] = &[
    "id",
    "title",
    "name",
    "placeholder",
    "href",
    "src",
    "alt",
    "lang",
    "dir",
    "tabIndex",
];

const REFLECTED_BOOL_PROPS: &[&str] = &[
    "disabled",
    "selected",
    "hidden",
    "readOnly",
    "multiple",
    "required",
    "autofocus",
];

/// Whether `name` is a host property on elements rather than a plain attribute.
pub fn is_property(name: &str) -> bool {
    name == "value"
        || name == "checked"
        || REFLECTED_STRING_PROPS.contains(&name)
        || REFLECTED_BOOL_PROPS.contains(&name)
}

#[derive(Default)]
pub struct Document {
    nodes: Vec<Option<DomNode>>,
    stats: MutationStats,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let name = tag.to_lowercase();
        self.insert(DomNode::new(DomKind::Element {
            tag: tag.to_string(),
            name,
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.insert(DomNode::new(DomKind::Text(text.to_string())))
    }

    fn insert(&mut self, node: DomNode) -> NodeId {
        self.stats.created += 1;
        let id = self.nodes.len();
        self.nodes.push(Some(node));
        id
    }

    pub fn node(&self, id: NodeId) -> Result<&DomNode, DomError> {
        self.nodes
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(DomError::Missing { id })
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut DomNode, DomError> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(DomError::Missing { id })
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut DomNode, DomError> {
        let node = self.node_mut(id)?;
        if node.is_text() {
            return Err(DomError::NotAnElement { id });
        }
        Ok(node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok().and_then(DomNode::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(DomNode::children).unwrap_or(&[])
    }

    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.child_at(id, 0)
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Moves `child` before `before` under `parent`; appends when `before` is
    /// `None` or not a child of `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.element_mut(parent)?;
        self.node(child)?;
        self.detach(child)?;
        let node = self.node_mut(parent)?;
        let index = before
            .and_then(|before| node.children.iter().position(|&c| c == before))
            .unwrap_or(node.children.len());
        node.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        self.stats.inserted += 1;
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), DomError> {
        self.insert_before(parent, new_child, Some(old_child))?;
        self.remove(old_child)
    }

    /// Detaches a node from its parent; a no-op for detached nodes.
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        if self.detach(id)? {
            self.stats.removed += 1;
        }
        Ok(())
    }

    fn detach(&mut self, id: NodeId) -> Result<bool, DomError> {
        let Some(parent) = self.node_mut(id)?.parent.take() else {
            return Ok(false);
        };
        let parent = self.node_mut(parent)?;
        parent.children.retain(|&c| c != id);
        Ok(true)
    }

    /// Drops a detached node from the arena.
    pub fn release(&mut self, id: NodeId) -> Result<(), DomError> {
        self.remove(id)?;
        let slot = self.nodes.get_mut(id).ok_or(DomError::Missing { id })?;
        slot.take();
        Ok(())
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        let node = self.node_mut(id)?;
        match &mut node.kind {
            DomKind::Text(current) => {
                if current != text {
                    *current = text.to_string();
                    self.stats.text_writes += 1;
                }
                Ok(())
            }
            DomKind::Element { .. } => Err(DomError::NotText { id }),
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.element_mut(id)?
            .attributes
            .insert(name.to_string(), value.to_string());
        self.stats.attribute_writes += 1;
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        if self.element_mut(id)?.attributes.shift_remove(name).is_some() {
            self.stats.attribute_writes += 1;
        }
        Ok(())
    }

    pub fn set_class_name(&mut self, id: NodeId, class_name: &str) -> Result<(), DomError> {
        self.element_mut(id)?.class_name = class_name.to_string();
        self.stats.attribute_writes += 1;
        Ok(())
    }

    /// Replaces every style declaration with those parsed from `css`.
    pub fn set_css_text(&mut self, id: NodeId, css: &str) -> Result<(), DomError> {
        let node = self.element_mut(id)?;
        node.style.clear();
        for declaration in css.split(';') {
            if let Some((name, value)) = declaration.split_once(':') {
                let (name, value) = (name.trim(), value.trim());
                if !name.is_empty() && !value.is_empty() {
                    node.style.insert(name.to_string(), value.to_string());
                }
            }
        }
        self.stats.attribute_writes += 1;
        Ok(())
    }

    /// Sets one style declaration; an empty value clears it.
    pub fn set_style_property(
        &mut self,
        id: NodeId,
        name: &str,
        value: &str,
    ) -> Result<(), DomError> {
        let node = self.element_mut(id)?;
        if value.is_empty() {
            node.style.shift_remove(name);
        } else {
            node.style.insert(name.to_string(), value.to_string());
        }
        self.stats.attribute_writes += 1;
        Ok(())
    }

    /// Sets raw markup content; `None` restores rendering of child nodes.
    pub fn set_inner_html(&mut self, id: NodeId, html: Option<&str>) -> Result<(), DomError> {
        let node = self.element_mut(id)?;
        let html = html.map(str::to_string);
        if node.inner_html != html {
            node.inner_html = html;
            self.stats.attribute_writes += 1;
        }
        Ok(())
    }

    /// Writes a host property. Non-scalar values are rejected the way a
    /// host throws on an impossible assignment.
    pub fn set_property(
        &mut self,
        id: NodeId,
        name: &str,
        value: &AttrValue,
    ) -> Result<(), DomError> {
        if !(value.is_scalar() || value.is_null()) {
            return Err(DomError::Rejected {
                id,
                name: name.to_string(),
            });
        }
        let node = self.element_mut(id)?;
        match name {
            "value" => node.value = Some(value.to_host_string().unwrap_or_default()),
            "checked" => node.checked = value.is_truthy(),
            _ if REFLECTED_BOOL_PROPS.contains(&name) => {
                let attr = name.to_lowercase();
                if value.is_truthy() {
                    node.attributes.insert(attr, String::new());
                } else {
                    node.attributes.shift_remove(&attr);
                }
            }
            _ => {
                let text = value.to_host_string().unwrap_or_default();
                node.attributes.insert(name.to_string(), text);
            }
        }
        self.stats.attribute_writes += 1;
        Ok(())
    }

    /// Simulates the user editing a form control; not counted as a mutation.
    pub fn set_live_value(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        self.element_mut(id)?.value = Some(value.to_string());
        Ok(())
    }

    /// Simulates the user toggling a checkbox; not counted as a mutation.
    pub fn set_live_checked(&mut self, id: NodeId, checked: bool) -> Result<(), DomError> {
        self.element_mut(id)?.checked = checked;
        Ok(())
    }

    /// Whether the live `value`/`checked` property already holds `value`.
    pub(crate) fn live_property_matches(&self, id: NodeId, name: &str, value: &AttrValue) -> bool {
        let Ok(node) = self.node(id) else {
            return false;
        };
        match name {
            "value" => value.to_host_string().as_deref() == Some(node.value().unwrap_or("")),
            "checked" => value.as_bool() == Some(node.checked),
            _ => false,
        }
    }

    pub fn add_event_listener(
        &mut self,
        id: NodeId,
        event: &str,
        capture: bool,
    ) -> Result<(), DomError> {
        self.element_mut(id)?
            .listeners
            .insert(event.to_string(), capture);
        self.stats.listener_writes += 1;
        Ok(())
    }

    pub fn remove_event_listener(&mut self, id: NodeId, event: &str) -> Result<(), DomError> {
        if self.element_mut(id)?.listeners.shift_remove(event).is_some() {
            self.stats.listener_writes += 1;
        }
        Ok(())
    }

    pub fn stats(&self) -> MutationStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = MutationStats::default();
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Ok(node) = self.node(id) else { return };
        match &node.kind {
            DomKind::Text(text) => out.push_str(text),
            DomKind::Element { .. } => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Serializes the subtree rooted at `id` as markup.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    pub fn inner_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Ok(node) = self.node(id) else { return };
        match &node.kind {
            DomKind::Text(text) => out.push_str(&escape(text)),
            DomKind::Element { tag, .. } => {
                let _ = write!(out, "<{tag}");
                if !node.class_name.is_empty() {
                    let _ = write!(out, " class=\"{}\"", escape(&node.class_name));
                }
                for (name, value) in &node.attributes {
                    let _ = write!(out, " {name}=\"{}\"", escape(value));
                }
                if !node.style.is_empty() {
                    let _ = write!(out, " style=\"{}\"", escape(&node.css_text()));
                }
                out.push('>');
                match &node.inner_html {
                    Some(html) => out.push_str(html),
                    None => {
                        for &child in &node.children {
                            self.write_html(child, out);
                        }
                    }
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    /// Indented tree dump for diagnostics.
    pub fn dump_tree(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.dump_node(id, 0, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let Ok(node) = self.node(id) else {
            let _ = writeln!(out, "{indent}<missing #{id}>");
            return;
        };
        match &node.kind {
            DomKind::Text(text) => {
                let _ = writeln!(out, "{indent}#{id} {text:?}");
            }
            DomKind::Element { tag, .. } => {
                let _ = write!(out, "{indent}#{id} <{tag}>");
                if !node.class_name.is_empty() {
                    let _ = write!(out, " .{}", node.class_name);
                }
                if let Some(value) = &node.value {
                    let _ = write!(out, " value={value:?}");
                }
                out.push('\n');
                for &child in &node.children {
                    self.dump_node(child, depth + 1, out);
                }
            }
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
#[path = "tests/dom_tests.rs"]
mod tests;
