use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use vdom_core::{
    DomNode, Engine, MutationStats, NodeId, Options, RenderError, RuntimeScheduler, VNode,
};

/// Scheduler backend that only counts flush requests.
///
/// Tests drive flushing by hand through [`RenderTestRule::pump_until_idle`]
/// and use the counter to assert how often the engine armed a batch.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    requests: AtomicUsize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of flushes requested since creation.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl RuntimeScheduler for ManualScheduler {
    fn schedule_flush(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

/// Headless harness for exercising renders in tests.
///
/// `RenderTestRule` owns an engine wired to a [`ManualScheduler`], a
/// container element and the content closure, so a test can render, poke
/// state or events and then pump queued re-renders until nothing is dirty.
pub struct RenderTestRule {
    engine: Engine,
    scheduler: Arc<ManualScheduler>,
    container: NodeId,
    content: Option<Box<dyn FnMut() -> VNode>>,
    root: Option<NodeId>,
}

impl RenderTestRule {
    /// Create a new test rule with default engine options.
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    /// Create a test rule from `options`; its scheduler backend is replaced
    /// with a counting one.
    pub fn with_options(options: Options) -> Self {
        let scheduler = Arc::new(ManualScheduler::new());
        let mut engine = Engine::with_options(options.with_scheduler(scheduler.clone()));
        let container = engine.create_container("body");
        Self {
            engine,
            scheduler,
            container,
            content: None,
            root: None,
        }
    }

    /// Install the provided content and perform an initial render.
    pub fn set_content(
        &mut self,
        content: impl FnMut() -> VNode + 'static,
    ) -> Result<NodeId, RenderError> {
        self.content = Some(Box::new(content));
        self.root = None;
        self.render()
    }

    /// Render the installed content again, diffing against the current root.
    pub fn rerender(&mut self) -> Result<NodeId, RenderError> {
        self.render()
    }

    /// Flush queued unit re-renders until none remain. Returns how many
    /// units rendered in total.
    pub fn pump_until_idle(&mut self) -> Result<usize, RenderError> {
        let mut rendered = 0;
        while self.engine.has_pending_updates() {
            rendered += self.engine.flush()?;
        }
        Ok(rendered)
    }

    /// Dispatch an event at `target` and pump the resulting updates.
    pub fn dispatch(&mut self, target: NodeId, kind: &str) -> Result<usize, RenderError> {
        let handled = self.engine.dispatch_event(target, kind)?;
        self.pump_until_idle()?;
        Ok(handled)
    }

    /// Simulate typing into an input, then deliver `kind` to it.
    pub fn input(&mut self, target: NodeId, value: &str, kind: &str) -> Result<usize, RenderError> {
        self.engine.document_mut().set_live_value(target, value)?;
        self.dispatch(target, kind)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    /// Root node produced by the last render.
    pub fn root_id(&self) -> Option<NodeId> {
        self.root
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    /// Number of deferred flushes the engine has requested.
    pub fn flush_requests(&self) -> usize {
        self.scheduler.requests()
    }

    /// Markup of the container's children.
    pub fn html(&self) -> String {
        self.engine.document().inner_markup(self.container)
    }

    pub fn stats(&self) -> MutationStats {
        self.engine.document().stats()
    }

    pub fn reset_stats(&mut self) {
        self.engine.document_mut().reset_stats();
    }

    pub fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.engine.document().node(id).ok()
    }

    /// First element under the container, in document order, whose class
    /// list contains `class`.
    pub fn find_by_class(&self, class: &str) -> Option<NodeId> {
        self.find(|node| node.class_name().split_whitespace().any(|c| c == class))
    }

    /// First element under the container with this tag.
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        let tag = tag.to_lowercase();
        self.find(|node| node.normalized_name() == Some(tag.as_str()))
    }

    /// Every element under the container with this tag, in document order.
    pub fn find_all_by_tag(&self, tag: &str) -> Vec<NodeId> {
        let tag = tag.to_lowercase();
        let mut found = Vec::new();
        self.walk(self.container, &mut |id, node| {
            if node.normalized_name() == Some(tag.as_str()) {
                found.push(id);
            }
            false
        });
        found
    }

    pub fn text_of(&self, id: NodeId) -> String {
        self.engine.document().text_content(id)
    }

    fn find(&self, predicate: impl Fn(&DomNode) -> bool) -> Option<NodeId> {
        let mut found = None;
        self.walk(self.container, &mut |id, node| {
            if predicate(node) {
                found = Some(id);
                return true;
            }
            false
        });
        found
    }

    /// Depth-first walk below `id`; stops once `visit` returns true.
    fn walk(&self, id: NodeId, visit: &mut dyn FnMut(NodeId, &DomNode) -> bool) -> bool {
        let document = self.engine.document();
        for &child in document.children(id) {
            if let Ok(node) = document.node(child) {
                if visit(child, node) || self.walk(child, visit) {
                    return true;
                }
            }
        }
        false
    }

    fn render(&mut self) -> Result<NodeId, RenderError> {
        let Some(content) = self.content.as_mut() else {
            return Err(RenderError::MissingNode { id: self.container });
        };
        let vnode = content();
        let root = self.engine.render(&vnode, self.container, self.root)?;
        self.root = Some(root);
        Ok(root)
    }
}

impl Default for RenderTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `RenderTestRule`.
pub fn run_test_render<R>(f: impl FnOnce(&mut RenderTestRule) -> R) -> R {
    let mut rule = RenderTestRule::new();
    f(&mut rule)
}
