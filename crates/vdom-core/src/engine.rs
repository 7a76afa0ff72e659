//! The engine context: document, pools, unit arena, mount queue and scheduler.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::attributes::NON_BUBBLING_EVENTS;
use crate::collections::map::HashMap;
use crate::component::{Component, ComponentId, ComponentInstance};
use crate::dom::{Document, DomError, NodeId};
use crate::lifecycle::RenderMode;
use crate::options::Options;
use crate::pool::{ComponentPool, NodePool};
use crate::scheduler::{DefaultScheduler, Scheduler, SchedulerHandle};
use crate::value::{Context, Event};
use crate::vnode::VNode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    MissingNode { id: NodeId },
    MissingComponent { id: ComponentId },
    /// A unit finished rendering without producing a root node.
    Unrendered { id: ComponentId },
    Dom(DomError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::MissingNode { id } => write!(f, "node {id} missing"),
            RenderError::MissingComponent { id } => write!(f, "{id} missing"),
            RenderError::Unrendered { id } => write!(f, "{id} has no root node"),
            RenderError::Dom(err) => write!(f, "host error: {err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Dom(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DomError> for RenderError {
    fn from(err: DomError) -> Self {
        match err {
            DomError::Missing { id } => RenderError::MissingNode { id },
            other => RenderError::Dom(other),
        }
    }
}

/// Owns everything one tree of rendered units needs.
///
/// Pools, the unit arena and the mount queue live here rather than in
/// process globals, so independent engines never share recycled nodes.
pub struct Engine {
    pub(crate) document: Document,
    pub(crate) nodes: NodePool,
    pub(crate) shells: ComponentPool,
    pub(crate) components: HashMap<ComponentId, ComponentInstance>,
    pub(crate) mounts: VecDeque<ComponentId>,
    pub(crate) diff_level: usize,
    pub(crate) scheduler: Scheduler,
    pub(crate) options: Options,
    next_component: u64,
}

impl Engine {
    /// An engine with default options. Its scheduler backend never wakes
    /// the host, so state changes wait until [`Engine::flush`] is called;
    /// use `StdRuntime::engine` for a backend that signals pending work.
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        let backend = options
            .scheduler()
            .unwrap_or_else(|| Arc::new(DefaultScheduler));
        Self {
            document: Document::new(),
            nodes: NodePool::default(),
            shells: ComponentPool::default(),
            components: HashMap::new(),
            mounts: VecDeque::new(),
            diff_level: 0,
            scheduler: Scheduler::new(backend),
            options,
            next_component: 1,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn scheduler_handle(&self) -> SchedulerHandle {
        self.scheduler.handle()
    }

    pub fn has_pending_updates(&self) -> bool {
        self.scheduler.has_pending()
    }

    /// Creates a detached element to render into.
    pub fn create_container(&mut self, tag: &str) -> NodeId {
        self.document.create_element(tag)
    }

    /// Renders `vnode` into `container`.
    ///
    /// With `merge` set, the existing tree rooted there is reconciled in
    /// place; otherwise a fresh tree is built and appended.
    pub fn render(
        &mut self,
        vnode: &VNode,
        container: NodeId,
        merge: Option<NodeId>,
    ) -> Result<NodeId, RenderError> {
        self.document.node(container)?;
        self.diff(
            merge,
            Some(vnode),
            &Context::default(),
            false,
            Some(container),
            false,
        )
    }

    /// Tears down the tree rooted at `root`, unmounting its units and
    /// returning its elements to the pool.
    pub fn unmount(&mut self, root: NodeId) -> Result<(), RenderError> {
        self.recollect_node_tree(root, false)
    }

    /// Re-renders every unit queued since the last flush, most recently
    /// queued first. Returns how many units rendered.
    ///
    /// On error the units not yet rendered stay queued for the next flush.
    pub fn flush(&mut self) -> Result<usize, RenderError> {
        let mut batch = self.scheduler.take_pending();
        let mut rendered = 0;
        while let Some(id) = batch.pop() {
            let dirty = self
                .components
                .get(&id)
                .map(|instance| instance.behavior.is_dirty())
                .unwrap_or(false);
            if dirty {
                if let Err(err) = self.render_component(id, RenderMode::Async, false, false) {
                    log::warn!("flush stopped at {id}: {err}");
                    self.scheduler.restore_pending(batch);
                    return Err(err);
                }
                rendered += 1;
            }
        }
        if rendered > 0 {
            log::debug!("flushed {rendered} dirty unit(s)");
        }
        Ok(rendered)
    }

    /// Renders a unit immediately, bypassing `should_update`.
    pub fn force_update(&mut self, id: ComponentId) -> Result<(), RenderError> {
        self.instance(id)?;
        self.render_component(id, RenderMode::Force, false, false)
    }

    /// Delivers an event through the listener proxies of `target` and its
    /// ancestors. Bubbling events run innermost first; non-bubbling ones run
    /// the ancestors' capture listeners outermost first, then the target's
    /// own. Returns how many handlers ran.
    pub fn dispatch_event(&mut self, target: NodeId, kind: &str) -> Result<usize, RenderError> {
        let node = self.document.node(target)?;
        let mut event = Event::new(kind, target);
        event.value = node.value().map(str::to_string);
        event.checked = Some(node.checked());
        if let Some(hook) = self.options.event_hook() {
            event = hook(event);
        }

        let bubbles = !NON_BUBBLING_EVENTS.contains(&kind);
        let mut handlers = Vec::new();
        let mut current = Some(target);
        while let Some(id) = current {
            let node = self.document.node(id)?;
            // Past the target a non-bubbling event only reaches capture listeners.
            let reaches = node
                .listeners()
                .any(|(name, capture)| name == kind && (bubbles || capture || id == target));
            if reaches {
                if let Some(handler) = node.binding.handlers.get(kind) {
                    handlers.push(handler.clone());
                }
            }
            current = node.parent();
        }
        if !bubbles {
            // Capture runs outermost first.
            handlers.reverse();
        }

        log::trace!("dispatching {kind} on {target} to {} handler(s)", handlers.len());
        for handler in &handlers {
            handler.call(&event);
        }
        Ok(handlers.len())
    }

    pub fn component<C: Component>(&self, id: ComponentId) -> Option<&C> {
        self.components
            .get(&id)
            .and_then(ComponentInstance::mounted::<C>)
            .map(|mounted| mounted.component())
    }

    pub fn component_mut<C: Component>(&mut self, id: ComponentId) -> Option<&mut C> {
        self.components
            .get_mut(&id)
            .and_then(ComponentInstance::mounted_mut::<C>)
            .map(|mounted| mounted.component_mut())
    }

    pub fn state<C: Component>(&self, id: ComponentId) -> Option<&C::State> {
        self.components
            .get(&id)
            .and_then(ComponentInstance::mounted::<C>)
            .map(|mounted| mounted.state())
    }

    /// First live instance of `C`, by creation order.
    pub fn find_component<C: Component>(&self) -> Option<ComponentId> {
        self.components
            .values()
            .filter(|instance| instance.mounted::<C>().is_some())
            .map(|instance| instance.id)
            .min()
    }

    /// Outermost unit whose root is `node`.
    pub fn component_of(&self, node: NodeId) -> Option<ComponentId> {
        self.document.node(node).ok().and_then(|node| node.component())
    }

    pub fn base_of(&self, id: ComponentId) -> Option<NodeId> {
        self.components.get(&id).and_then(|instance| instance.base)
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn pooled_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn pooled_shells(&self) -> usize {
        self.shells.len()
    }

    pub(crate) fn next_component_id(&mut self) -> ComponentId {
        let id = ComponentId::new(self.next_component);
        self.next_component += 1;
        id
    }

    pub(crate) fn instance(&self, id: ComponentId) -> Result<&ComponentInstance, RenderError> {
        self.components
            .get(&id)
            .ok_or(RenderError::MissingComponent { id })
    }

    pub(crate) fn instance_mut(
        &mut self,
        id: ComponentId,
    ) -> Result<&mut ComponentInstance, RenderError> {
        self.components
            .get_mut(&id)
            .ok_or(RenderError::MissingComponent { id })
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("nodes", &self.document.len())
            .field("components", &self.components.len())
            .field("pooled_nodes", &self.nodes.len())
            .field("pooled_shells", &self.shells.len())
            .field("options", &self.options)
            .finish()
    }
}
