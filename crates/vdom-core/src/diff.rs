//! Lock-step reconciliation of presentation nodes against descriptions.

use std::borrow::Cow;

use indexmap::IndexMap;

use crate::dom::NodeId;
use crate::engine::{Engine, RenderError};
use crate::value::{AttrValue, Attributes, Context, Key, RefTarget};
use crate::vnode::{NodeKind, UnitType, VNode};

/// Calls functional units until the description names something else.
pub(crate) fn resolve_functional<'a>(
    vnode: Option<&'a VNode>,
    context: &Context,
) -> Option<Cow<'a, VNode>> {
    let mut current = Cow::Borrowed(vnode?);
    loop {
        let next = match current.kind() {
            NodeKind::Unit(UnitType::Functional(unit)) => {
                unit.call(&current.unit_props(None), context)
            }
            _ => return Some(current),
        };
        current = Cow::Owned(next?);
    }
}

impl Engine {
    /// Reconciles `dom` against `vnode` and returns the resulting node.
    ///
    /// Tracks nesting depth; the outermost call that is not a unit root
    /// flushes deferred mount hooks. When `parent` is given the result is
    /// appended to it unless it already lives there.
    pub(crate) fn diff(
        &mut self,
        dom: Option<NodeId>,
        vnode: Option<&VNode>,
        context: &Context,
        mount_all: bool,
        parent: Option<NodeId>,
        component_root: bool,
    ) -> Result<NodeId, RenderError> {
        self.diff_level += 1;
        let result = self.idiff(dom, vnode, context, mount_all).and_then(|out| {
            if let Some(parent) = parent {
                if self.document.parent(out) != Some(parent) {
                    self.document.append_child(parent, out)?;
                }
            }
            Ok(out)
        });
        self.diff_level -= 1;
        if self.diff_level == 0 && !component_root && result.is_ok() {
            self.flush_mounts();
        }
        result
    }

    pub(crate) fn idiff(
        &mut self,
        dom: Option<NodeId>,
        vnode: Option<&VNode>,
        context: &Context,
        mount_all: bool,
    ) -> Result<NodeId, RenderError> {
        let original_ref = vnode.and_then(VNode::ref_callback);
        let original_key = vnode
            .filter(|vnode| matches!(vnode.kind(), NodeKind::Unit(UnitType::Functional(_))))
            .and_then(VNode::key)
            .cloned();

        let mut current = vnode.map(Cow::Borrowed);
        let (tag, vnode) = loop {
            let Some(node) = current else {
                return self.diff_text(dom, "");
            };
            match node.kind() {
                NodeKind::Text(text) => return self.diff_text(dom, text),
                NodeKind::Unit(UnitType::Stateful(unit)) => {
                    return self.build_component_from_vnode(dom, &node, *unit, context, mount_all);
                }
                NodeKind::Unit(UnitType::Functional(unit)) => {
                    current = unit.call(&node.unit_props(None), context).map(Cow::Owned);
                }
                NodeKind::Element(tag) => break (tag.clone(), node),
            }
        };
        let tag = tag.as_str();

        let out = match dom {
            None => self.create_node(tag),
            Some(existing) if self.is_named_node(existing, tag) => existing,
            Some(existing) => {
                let out = self.create_node(tag);
                while let Some(child) = self.document.first_child(existing) {
                    self.document.append_child(out, child)?;
                }
                if let Some(parent) = self.document.parent(existing) {
                    self.document.replace_child(parent, out, existing)?;
                }
                self.recollect_node_tree(existing, false)?;
                out
            }
        };

        let raw_html = vnode
            .attribute("dangerouslySetInnerHTML")
            .is_some_and(AttrValue::is_truthy);
        if !raw_html {
            let vchildren = vnode.children();
            let live = self.document.children(out);
            let single_text = match (vchildren, live) {
                ([only], [first]) => only
                    .as_text()
                    .filter(|_| self.document.node(*first).is_ok_and(|n| n.is_text()))
                    .map(|text| (*first, text)),
                _ => None,
            };
            if let Some((first, text)) = single_text {
                self.document.set_text(first, text)?;
            } else if !vchildren.is_empty() || !live.is_empty() {
                self.inner_diff_node(out, vchildren, context, mount_all)?;
            }
        }

        let mut cache = self.take_props_cache(out)?;
        let diffed = self.diff_attributes(out, vnode.attributes(), &mut cache);
        if let Some(callback) = &original_ref {
            cache.insert("ref".to_string(), AttrValue::Ref(callback.clone()));
        }
        // Siblings match a functional unit by its own key.
        if let Some(key) = original_key {
            cache.insert("key".to_string(), AttrValue::Str(key.as_str().to_string()));
        }
        self.document.node_mut(out)?.binding.props_cache = Some(cache);
        diffed?;

        if let Some(callback) = original_ref {
            callback.call(Some(RefTarget::Node(out)));
        }
        Ok(out)
    }

    /// Applied-attribute snapshot of `node`, seeded from its host attributes
    /// the first time the engine touches it.
    fn take_props_cache(&mut self, node: NodeId) -> Result<Attributes, RenderError> {
        let dom = self.document.node_mut(node)?;
        if let Some(cache) = dom.binding.props_cache.take() {
            return Ok(cache);
        }
        Ok(dom
            .attributes()
            .map(|(name, value)| (name.to_string(), AttrValue::from(value)))
            .collect())
    }

    fn diff_text(&mut self, dom: Option<NodeId>, text: &str) -> Result<NodeId, RenderError> {
        if let Some(existing) = dom {
            let node = self.document.node(existing)?;
            if node.is_text() && node.parent().is_some() {
                self.document.set_text(existing, text)?;
                return Ok(existing);
            }
            self.recollect_node_tree(existing, false)?;
        }
        Ok(self.document.create_text(text))
    }

    /// Key an existing child was rendered with.
    fn node_key(&self, node: NodeId) -> Option<Key> {
        let dom = self.document.node(node).ok()?;
        if let Some(component) = dom.binding.component {
            return self.components.get(&component)?.key.clone();
        }
        dom.binding
            .props_cache
            .as_ref()?
            .get("key")
            .and_then(Key::from_value)
    }

    /// Reconciles the children of `dom` against `vchildren`.
    ///
    /// Keyed descriptions claim the old child holding the same key. Unkeyed
    /// ones take the first unclaimed old child of the same type, scanning
    /// from the lowest unclaimed index. Whatever is left unclaimed is torn
    /// down: keyed leftovers first, then unkeyed ones in reverse order.
    pub(crate) fn inner_diff_node(
        &mut self,
        dom: NodeId,
        vchildren: &[VNode],
        context: &Context,
        mount_all: bool,
    ) -> Result<(), RenderError> {
        let original: Vec<NodeId> = self.document.children(dom).to_vec();
        let mut keyed: IndexMap<Key, Option<NodeId>> = IndexMap::new();
        let mut keyed_len = 0;
        let mut children: Vec<Option<NodeId>> = Vec::with_capacity(original.len());

        for &child in &original {
            let key = if vchildren.is_empty() {
                None
            } else {
                self.node_key(child)
            };
            match key {
                Some(key) if !keyed.contains_key(&key) => {
                    keyed.insert(key, Some(child));
                    keyed_len += 1;
                }
                // Later holders of a duplicate key are matched by type.
                _ => children.push(Some(child)),
            }
        }

        let mut min = 0;
        let mut children_len = children.len();
        for (i, vchild) in vchildren.iter().enumerate() {
            let mut child = None;
            if let Some(key) = vchild.key() {
                if keyed_len > 0 {
                    if let Some(found) = keyed.get_mut(key).and_then(Option::take) {
                        child = Some(found);
                        keyed_len -= 1;
                    }
                }
            } else if min < children_len {
                for j in min..children_len {
                    let Some(candidate) = children[j] else { continue };
                    if self.is_same_node_type(candidate, vchild) {
                        child = Some(candidate);
                        children[j] = None;
                        if j == children_len - 1 {
                            children_len -= 1;
                        }
                        if j == min {
                            min += 1;
                        }
                        break;
                    }
                }
                let is_unit = matches!(vchild.kind(), NodeKind::Unit(_));
                if child.is_none() && min < children_len && is_unit && mount_all {
                    child = children[min].take();
                    min += 1;
                }
            }

            let child = self.idiff(child, Some(vchild), context, mount_all)?;
            let live = self.document.child_at(dom, i);
            if child != dom && Some(child) != live {
                self.document.insert_before(dom, child, live)?;
            }
        }

        if keyed_len > 0 {
            for node in keyed.into_values().flatten() {
                self.recollect_node_tree(node, false)?;
            }
        }

        if min < children_len {
            self.remove_orphaned_children(&children, false)?;
        }
        Ok(())
    }

    pub(crate) fn remove_orphaned_children(
        &mut self,
        children: &[Option<NodeId>],
        unmount_only: bool,
    ) -> Result<(), RenderError> {
        for child in children.iter().rev().flatten() {
            self.recollect_node_tree(*child, unmount_only)?;
        }
        Ok(())
    }

    /// Tears down a subtree. Unit roots are unmounted; other nodes get their
    /// `ref` cleared and, unless `unmount_only`, are removed and pooled.
    pub(crate) fn recollect_node_tree(
        &mut self,
        node: NodeId,
        unmount_only: bool,
    ) -> Result<(), RenderError> {
        let Ok(dom) = self.document.node(node) else {
            return Ok(());
        };
        if dom.binding.pooled {
            return Ok(());
        }
        if let Some(component) = dom.binding.component {
            return self.unmount_component(component, !unmount_only);
        }

        let ref_callback = dom
            .binding
            .props_cache
            .as_ref()
            .and_then(|cache| cache.get("ref"))
            .and_then(AttrValue::as_ref_callback)
            .cloned();
        let children: Vec<Option<NodeId>> = dom.children().iter().copied().map(Some).collect();
        if let Some(callback) = ref_callback {
            callback.call(None);
        }
        if !unmount_only {
            self.collect_node(node)?;
        }
        self.remove_orphaned_children(&children, unmount_only)
    }

    /// Detaches `node`; elements go to the pool, text nodes are dropped.
    pub(crate) fn collect_node(&mut self, node: NodeId) -> Result<(), RenderError> {
        self.document.remove(node)?;
        let dom = self.document.node_mut(node)?;
        match dom.normalized_name().map(str::to_string) {
            Some(name) => {
                dom.binding.component = None;
                dom.binding.unit = None;
                dom.binding.pooled = true;
                self.nodes.collect(&name, node);
            }
            None => self.document.release(node)?,
        }
        Ok(())
    }

    /// A pooled element with this tag, or a fresh one.
    pub(crate) fn create_node(&mut self, tag: &str) -> NodeId {
        let name = tag.to_lowercase();
        while let Some(pooled) = self.nodes.take(&name) {
            if let Ok(dom) = self.document.node_mut(pooled) {
                dom.binding.pooled = false;
                log::trace!("reusing pooled <{name}> #{pooled}");
                return pooled;
            }
        }
        self.document.create_element(tag)
    }

    fn is_named_node(&self, node: NodeId, tag: &str) -> bool {
        self.document
            .node(node)
            .ok()
            .and_then(|dom| dom.normalized_name())
            .is_some_and(|name| name == tag.to_lowercase())
    }

    fn is_same_node_type(&self, node: NodeId, vnode: &VNode) -> bool {
        let Ok(dom) = self.document.node(node) else {
            return false;
        };
        match vnode.kind() {
            NodeKind::Text(_) => dom.is_text(),
            NodeKind::Element(tag) => self.is_named_node(node, tag),
            NodeKind::Unit(UnitType::Stateful(unit)) => dom.binding.unit == Some(*unit),
            NodeKind::Unit(UnitType::Functional(_)) => true,
        }
    }
}

#[cfg(test)]
#[path = "tests/diff_tests.rs"]
mod tests;
