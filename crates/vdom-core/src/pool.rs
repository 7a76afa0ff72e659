//! Recycling pools for detached presentation nodes.

use std::any::TypeId;

use crate::collections::map::HashMap;
use crate::dom::NodeId;

/// Detached elements keyed by normalized tag name.
#[derive(Debug, Default)]
pub struct NodePool {
    nodes: HashMap<String, Vec<NodeId>>,
}

impl NodePool {
    pub fn collect(&mut self, name: &str, id: NodeId) {
        self.nodes.entry(name.to_string()).or_default().push(id);
    }

    /// Most recently collected element with this normalized name.
    pub fn take(&mut self, name: &str) -> Option<NodeId> {
        self.nodes.get_mut(name).and_then(Vec::pop)
    }

    pub fn len(&self) -> usize {
        self.nodes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Root shells of unmounted units, keyed by unit type.
///
/// A new instance of the same type adopts the shell as its `next_base`, so
/// its first render diffs against an existing element instead of building one.
#[derive(Debug, Default)]
pub struct ComponentPool {
    shells: HashMap<TypeId, Vec<NodeId>>,
}

impl ComponentPool {
    pub fn collect(&mut self, unit: TypeId, shell: NodeId) {
        self.shells.entry(unit).or_default().push(shell);
    }

    pub fn take(&mut self, unit: TypeId) -> Option<NodeId> {
        self.shells.get_mut(&unit).and_then(Vec::pop)
    }

    pub fn len(&self) -> usize {
        self.shells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
