//! Stateful units: the author-facing [`Component`] trait, the [`Link`]
//! handle used to queue state changes, and the type-erased instances the
//! engine keeps in its arena.

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::mem;
use std::rc::Rc;

use crate::dom::NodeId;
use crate::scheduler::SchedulerHandle;
use crate::value::{Attributes, Context, Event, Handler, Key, Props, RefCallback};
use crate::vnode::VNode;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component#{}", self.0)
    }
}

/// Inputs of one render: properties, state and inherited context.
pub struct View<'a, C: Component> {
    pub props: &'a Props,
    pub state: &'a C::State,
    pub context: &'a Context,
}

impl<C: Component> Clone for View<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Component> Copy for View<'_, C> {}

/// A unit with state and lifecycle.
///
/// Only `create` and `render` are required. Every hook defaults to a no-op
/// (or to `true` for [`should_update`](Component::should_update)), so an
/// implementation overrides just the capabilities it needs.
pub trait Component: Sized + 'static {
    type State: Clone + Default + 'static;

    fn create(props: &Props, context: &Context, link: Link<Self>) -> Self;

    fn render(&self, view: View<'_, Self>) -> Option<VNode>;

    /// Descriptor used as the kind of a description node.
    fn unit() -> StatefulUnit {
        StatefulUnit::of::<Self>()
    }

    fn initial_state(&self, _props: &Props, _context: &Context) -> Self::State {
        Self::State::default()
    }

    /// Values filled into props for attributes the description leaves unset.
    fn default_props() -> Option<Attributes> {
        None
    }

    fn will_mount(&mut self, _view: View<'_, Self>) {}

    fn will_receive_props(
        &mut self,
        _current: View<'_, Self>,
        _next_props: &Props,
        _next_context: &Context,
    ) {
    }

    fn should_update(&self, _current: View<'_, Self>, _next: View<'_, Self>) -> bool {
        true
    }

    fn will_update(&mut self, _current: View<'_, Self>, _next: View<'_, Self>) {}

    fn did_update(&mut self, _previous: View<'_, Self>, _current: View<'_, Self>) {}

    fn did_mount(&mut self, _view: View<'_, Self>) {}

    fn will_unmount(&mut self, _view: View<'_, Self>) {}

    fn did_unmount(&mut self) {}

    /// Extra context entries visible to this unit's subtree.
    fn child_context(&self, _view: View<'_, Self>) -> Option<Attributes> {
        None
    }
}

type StateUpdate<S> = Box<dyn FnOnce(&mut S, &Props)>;

pub(crate) struct UpdateQueue<S> {
    dirty: Cell<bool>,
    updates: RefCell<Vec<StateUpdate<S>>>,
    callbacks: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl<S> UpdateQueue<S> {
    fn new() -> Self {
        Self {
            // Fresh units count as dirty until their first render.
            dirty: Cell::new(true),
            updates: RefCell::new(Vec::new()),
            callbacks: RefCell::new(Vec::new()),
        }
    }
}

/// Handle a unit uses to schedule its own re-render.
pub struct Link<C: Component> {
    id: ComponentId,
    queue: Rc<UpdateQueue<C::State>>,
    scheduler: SchedulerHandle,
}

impl<C: Component> Clone for Link<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            queue: Rc::clone(&self.queue),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<C: Component> Link<C> {
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Queues a state change. Changes are applied in call order at the next
    /// render; any number of calls before a flush produce one render.
    pub fn set_state(&self, update: impl FnOnce(&mut C::State, &Props) + 'static) {
        self.queue.updates.borrow_mut().push(Box::new(update));
        self.mark_dirty();
    }

    /// Like [`set_state`](Link::set_state), running `callback` once the
    /// resulting render completes.
    pub fn set_state_with_callback(
        &self,
        update: impl FnOnce(&mut C::State, &Props) + 'static,
        callback: impl FnOnce() + 'static,
    ) {
        self.queue.callbacks.borrow_mut().push(Box::new(callback));
        self.set_state(update);
    }

    /// Event handler that turns each event into a state change.
    pub fn handler(&self, on_event: impl Fn(&mut C::State, &Props, &Event) + 'static) -> Handler {
        let link = self.clone();
        let on_event = Rc::new(on_event);
        Handler::new(move |event| {
            let on_event = Rc::clone(&on_event);
            let event = event.clone();
            link.set_state(move |state, props| on_event(state, props, &event));
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.queue.dirty.get()
    }

    fn mark_dirty(&self) {
        if !self.queue.dirty.replace(true) {
            self.scheduler.enqueue(self.id);
        }
    }
}

impl<C: Component> fmt::Debug for Link<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("id", &self.id)
            .field("dirty", &self.queue.dirty.get())
            .finish()
    }
}

pub(crate) struct Seed<'a> {
    pub(crate) id: ComponentId,
    pub(crate) props: &'a Props,
    pub(crate) context: &'a Context,
    pub(crate) scheduler: SchedulerHandle,
}

/// Type descriptor for a [`Component`], compared by type identity.
#[derive(Clone, Copy)]
pub struct StatefulUnit {
    type_id: TypeId,
    name: &'static str,
    default_props: fn() -> Option<Attributes>,
    build: fn(Seed<'_>) -> Box<dyn ErasedComponent>,
}

impl StatefulUnit {
    pub fn of<C: Component>() -> Self {
        let full = std::any::type_name::<C>();
        Self {
            type_id: TypeId::of::<C>(),
            name: full.rsplit("::").next().unwrap_or(full),
            default_props: C::default_props,
            build: build_mounted::<C>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub(crate) fn default_props(&self) -> Option<Attributes> {
        (self.default_props)()
    }

    pub(crate) fn build(&self, seed: Seed<'_>) -> Box<dyn ErasedComponent> {
        (self.build)(seed)
    }
}

impl PartialEq for StatefulUnit {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for StatefulUnit {}

impl fmt::Debug for StatefulUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatefulUnit({})", self.name)
    }
}

fn build_mounted<C: Component>(seed: Seed<'_>) -> Box<dyn ErasedComponent> {
    let queue = Rc::new(UpdateQueue::new());
    let link = Link {
        id: seed.id,
        queue: Rc::clone(&queue),
        scheduler: seed.scheduler,
    };
    let component = C::create(seed.props, seed.context, link);
    let state = component.initial_state(seed.props, seed.context);
    Box::new(Mounted {
        component,
        state,
        prev_state: None,
        queue,
    })
}

pub(crate) type Inputs<'a> = (&'a Props, &'a Context);

/// Object-safe face of a mounted [`Component`].
pub(crate) trait ErasedComponent {
    fn is_dirty(&self) -> bool;
    /// Marks the unit dirty; true when it was clean before.
    fn mark_dirty(&self) -> bool;
    fn clear_dirty(&self);
    /// Applies queued state changes, keeping the pre-change state as the
    /// previous snapshot until the render finishes.
    fn apply_updates(&mut self, props: &Props);
    fn take_callbacks(&self) -> Vec<Box<dyn FnOnce()>>;
    fn finish_render(&mut self);

    fn render(&self, current: Inputs<'_>) -> Option<VNode>;
    fn child_context(&self, current: Inputs<'_>) -> Option<Attributes>;
    fn will_mount(&mut self, current: Inputs<'_>);
    fn will_receive_props(&mut self, current: Inputs<'_>, next: Inputs<'_>);
    fn should_update(&self, previous: Inputs<'_>, next: Inputs<'_>) -> bool;
    fn will_update(&mut self, previous: Inputs<'_>, next: Inputs<'_>);
    fn did_update(&mut self, previous: Inputs<'_>, current: Inputs<'_>);
    fn did_mount(&mut self, current: Inputs<'_>);
    fn will_unmount(&mut self, current: Inputs<'_>);
    fn did_unmount(&mut self);

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub(crate) struct Mounted<C: Component> {
    component: C,
    state: C::State,
    prev_state: Option<C::State>,
    queue: Rc<UpdateQueue<C::State>>,
}

impl<C: Component> Mounted<C> {
    pub(crate) fn component(&self) -> &C {
        &self.component
    }

    pub(crate) fn component_mut(&mut self) -> &mut C {
        &mut self.component
    }

    pub(crate) fn state(&self) -> &C::State {
        &self.state
    }

    fn previous_state(&self) -> &C::State {
        self.prev_state.as_ref().unwrap_or(&self.state)
    }
}

fn view<'a, C: Component>(inputs: Inputs<'a>, state: &'a C::State) -> View<'a, C> {
    View {
        props: inputs.0,
        state,
        context: inputs.1,
    }
}

impl<C: Component> ErasedComponent for Mounted<C> {
    fn is_dirty(&self) -> bool {
        self.queue.dirty.get()
    }

    fn mark_dirty(&self) -> bool {
        !self.queue.dirty.replace(true)
    }

    fn clear_dirty(&self) {
        self.queue.dirty.set(false);
    }

    fn apply_updates(&mut self, props: &Props) {
        let updates = mem::take(&mut *self.queue.updates.borrow_mut());
        if updates.is_empty() {
            return;
        }
        if self.prev_state.is_none() {
            self.prev_state = Some(self.state.clone());
        }
        for update in updates {
            update(&mut self.state, props);
        }
    }

    fn take_callbacks(&self) -> Vec<Box<dyn FnOnce()>> {
        mem::take(&mut *self.queue.callbacks.borrow_mut())
    }

    fn finish_render(&mut self) {
        self.prev_state = None;
    }

    fn render(&self, current: Inputs<'_>) -> Option<VNode> {
        self.component.render(view(current, &self.state))
    }

    fn child_context(&self, current: Inputs<'_>) -> Option<Attributes> {
        self.component.child_context(view(current, &self.state))
    }

    fn will_mount(&mut self, current: Inputs<'_>) {
        self.component.will_mount(view(current, &self.state));
    }

    fn will_receive_props(&mut self, current: Inputs<'_>, next: Inputs<'_>) {
        self.component
            .will_receive_props(view(current, &self.state), next.0, next.1);
    }

    fn should_update(&self, previous: Inputs<'_>, next: Inputs<'_>) -> bool {
        self.component.should_update(
            view(previous, self.previous_state()),
            view(next, &self.state),
        )
    }

    fn will_update(&mut self, previous: Inputs<'_>, next: Inputs<'_>) {
        let prev_state = self.prev_state.as_ref().unwrap_or(&self.state);
        self.component
            .will_update(view(previous, prev_state), view(next, &self.state));
    }

    fn did_update(&mut self, previous: Inputs<'_>, current: Inputs<'_>) {
        let prev_state = self.prev_state.as_ref().unwrap_or(&self.state);
        self.component
            .did_update(view(previous, prev_state), view(current, &self.state));
    }

    fn did_mount(&mut self, current: Inputs<'_>) {
        self.component.did_mount(view(current, &self.state));
    }

    fn will_unmount(&mut self, current: Inputs<'_>) {
        self.component.will_unmount(view(current, &self.state));
    }

    fn did_unmount(&mut self) {
        self.component.did_unmount();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Delegation chain of units sharing one presentation root, outermost first.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct DelegationChain {
    members: Vec<ComponentId>,
}

impl DelegationChain {
    pub(crate) fn new(owner: ComponentId) -> Self {
        Self {
            members: vec![owner],
        }
    }

    fn position(&self, id: ComponentId) -> Option<usize> {
        self.members.iter().position(|&member| member == id)
    }

    /// The unit `id` renders directly, if it renders a stateful unit.
    pub(crate) fn delegate_of(&self, id: ComponentId) -> Option<ComponentId> {
        let index = self.position(id)?;
        self.members.get(index + 1).copied()
    }

    /// `id` and every unit wrapping it, innermost first.
    pub(crate) fn wrappers_of(&self, id: ComponentId) -> Vec<ComponentId> {
        match self.position(id) {
            Some(index) => self.members[..=index].iter().rev().copied().collect(),
            None => vec![id],
        }
    }

    /// Detaches and returns everything below `id`.
    pub(crate) fn split_after(&mut self, id: ComponentId) -> Vec<ComponentId> {
        match self.position(id) {
            Some(index) => self.members.split_off(index + 1),
            None => Vec::new(),
        }
    }

    /// Detaches and returns `id` with everything below it.
    pub(crate) fn split_at(&mut self, id: ComponentId) -> Vec<ComponentId> {
        match self.position(id) {
            Some(index) => self.members.split_off(index),
            None => vec![id],
        }
    }

    pub(crate) fn push(&mut self, id: ComponentId) {
        self.members.push(id);
    }

    pub(crate) fn members(&self) -> &[ComponentId] {
        &self.members
    }
}

/// Engine-side record of a mounted unit.
pub(crate) struct ComponentInstance {
    pub(crate) id: ComponentId,
    pub(crate) unit: StatefulUnit,
    pub(crate) behavior: Box<dyn ErasedComponent>,
    pub(crate) props: Rc<Props>,
    pub(crate) prev_props: Option<Rc<Props>>,
    pub(crate) context: Context,
    pub(crate) prev_context: Option<Context>,
    pub(crate) base: Option<NodeId>,
    pub(crate) next_base: Option<NodeId>,
    pub(crate) disabled: bool,
    pub(crate) key: Option<Key>,
    pub(crate) ref_cb: Option<RefCallback>,
    /// Outermost unit of the chain this instance belongs to (itself when outermost).
    pub(crate) owner: ComponentId,
    /// Populated on the owner only.
    pub(crate) chain: DelegationChain,
}

impl ComponentInstance {
    pub(crate) fn new(
        id: ComponentId,
        unit: StatefulUnit,
        behavior: Box<dyn ErasedComponent>,
        props: Props,
        context: Context,
    ) -> Self {
        Self {
            id,
            unit,
            behavior,
            props: Rc::new(props),
            prev_props: None,
            context,
            prev_context: None,
            base: None,
            next_base: None,
            disabled: false,
            key: None,
            ref_cb: None,
            owner: id,
            chain: DelegationChain::new(id),
        }
    }

    pub(crate) fn mounted<C: Component>(&self) -> Option<&Mounted<C>> {
        self.behavior.as_any().downcast_ref::<Mounted<C>>()
    }

    pub(crate) fn mounted_mut<C: Component>(&mut self) -> Option<&mut Mounted<C>> {
        self.behavior.as_any_mut().downcast_mut::<Mounted<C>>()
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("id", &self.id)
            .field("unit", &self.unit)
            .field("base", &self.base)
            .field("owner", &self.owner)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/component_tests.rs"]
mod tests;
