#![doc = r"Virtual DOM reconciliation engine with stateful units, lifecycle hooks and batched re-renders."]

extern crate self as vdom_core;

mod attributes;
pub mod collections;
pub mod component;
mod diff;
pub mod dom;
pub mod engine;
pub mod lifecycle;
pub mod options;
pub mod platform;
pub mod pool;
pub mod scheduler;
pub mod value;
pub mod vnode;

pub use attributes::{class_list, NON_BUBBLING_EVENTS, NON_DIMENSION_PROPS};
pub use component::{Component, ComponentId, Link, StatefulUnit, View};
pub use dom::{Document, DomError, DomKind, DomNode, MutationStats, NodeId};
pub use engine::{Engine, RenderError};
pub use lifecycle::RenderMode;
pub use options::{set_vnode_hook, EventHook, Options, VNodeHook, VNodeHookGuard, SYNC_UPDATES_ENV};
pub use platform::{Clock, RuntimeScheduler};
pub use pool::{ComponentPool, NodePool};
pub use scheduler::{DefaultScheduler, Scheduler, SchedulerHandle};
pub use value::{
    format_number, AttrValue, Attributes, Context, Event, Handler, Key, Props, RefCallback,
    RefTarget,
};
pub use vnode::{h, Child, FunctionalUnit, NodeKind, UnitType, VNode};

/// Renders `vnode` into `container` with a fresh context.
///
/// Shorthand for [`Engine::render`].
pub fn render(
    engine: &mut Engine,
    vnode: &VNode,
    container: NodeId,
    merge: Option<NodeId>,
) -> Result<NodeId, RenderError> {
    engine.render(vnode, container, merge)
}
