//! Unit lifecycle: property hand-off, rendering, delegation chains and
//! teardown.

use std::borrow::Cow;
use std::rc::Rc;

use crate::component::{ComponentId, ComponentInstance, Seed, StatefulUnit};
use crate::diff::resolve_functional;
use crate::dom::NodeId;
use crate::engine::{Engine, RenderError};
use crate::value::{AttrValue, Context, Key, Props, RefTarget};
use crate::vnode::{NodeKind, UnitType, VNode};

/// How a property hand-off or re-render should proceed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// Store the new properties without rendering.
    Skip,
    /// Render now.
    Sync,
    /// Render now, ignoring `should_update`.
    Force,
    /// Render now when synchronous updates are enabled or the unit has no
    /// root yet; otherwise queue it on the scheduler.
    Async,
}

impl Engine {
    /// Instantiates a unit, adopting a pooled root shell of the same type.
    pub(crate) fn create_component(
        &mut self,
        unit: StatefulUnit,
        props: Props,
        context: &Context,
    ) -> ComponentId {
        let id = self.next_component_id();
        let behavior = unit.build(Seed {
            id,
            props: &props,
            context,
            scheduler: self.scheduler.handle(),
        });
        let mut instance = ComponentInstance::new(id, unit, behavior, props, context.clone());
        instance.next_base = self.shells.take(unit.type_id());
        log::trace!(
            "created {} as {id} (recycled shell: {:?})",
            unit.name(),
            instance.next_base
        );
        self.components.insert(id, instance);
        id
    }

    /// Hands new properties and context to a unit, then renders or queues it
    /// according to `mode`.
    pub(crate) fn set_component_props(
        &mut self,
        id: ComponentId,
        mut props: Props,
        mode: RenderMode,
        context: &Context,
        mount_all: bool,
    ) -> Result<(), RenderError> {
        let sync_updates = self.options.sync_component_updates();
        let instance = self.instance_mut(id)?;
        if instance.disabled {
            return Ok(());
        }
        instance.disabled = true;

        instance.ref_cb = props
            .remove("ref")
            .and_then(|value| value.as_ref_callback().cloned());
        instance.key = props.remove("key").and_then(|value| Key::from_value(&value));

        if instance.base.is_none() || mount_all {
            instance
                .behavior
                .will_mount((&*instance.props, &instance.context));
        } else {
            instance
                .behavior
                .will_receive_props((&*instance.props, &instance.context), (&props, context));
        }

        if !instance.context.ptr_eq(context) {
            if instance.prev_context.is_none() {
                instance.prev_context = Some(instance.context.clone());
            }
            instance.context = context.clone();
        }

        if instance.prev_props.is_none() {
            instance.prev_props = Some(Rc::clone(&instance.props));
        }
        instance.props = Rc::new(props);
        instance.disabled = false;

        let has_base = instance.base.is_some();
        let ref_cb = instance.ref_cb.clone();
        match mode {
            RenderMode::Skip => {}
            RenderMode::Async if !sync_updates && has_base => self.enqueue_render(id)?,
            _ => self.render_component(id, RenderMode::Sync, mount_all, false)?,
        }

        if let Some(callback) = ref_cb {
            callback.call(Some(RefTarget::Component(id)));
        }
        Ok(())
    }

    /// Marks a unit dirty and queues it for the next flush.
    pub(crate) fn enqueue_render(&mut self, id: ComponentId) -> Result<(), RenderError> {
        if self.instance(id)?.behavior.mark_dirty() {
            self.scheduler.handle().enqueue(id);
        }
        Ok(())
    }

    /// The unit `id` renders directly, when it delegates to another unit.
    pub(crate) fn delegate_of(&self, id: ComponentId) -> Option<ComponentId> {
        let owner = self.components.get(&id)?.owner;
        self.components.get(&owner)?.chain.delegate_of(id)
    }

    /// Detaches everything below `id` from its delegation chain.
    fn detach_delegates(&mut self, id: ComponentId) -> Result<Vec<ComponentId>, RenderError> {
        let owner = self.instance(id)?.owner;
        Ok(self.instance_mut(owner)?.chain.split_after(id))
    }

    /// Renders a unit and reconciles its output against its current root.
    pub(crate) fn render_component(
        &mut self,
        id: ComponentId,
        mode: RenderMode,
        mount_all: bool,
        is_child: bool,
    ) -> Result<(), RenderError> {
        let initial_child = self.delegate_of(id);
        let instance = self.instance_mut(id)?;
        if instance.disabled {
            return Ok(());
        }

        let props = Rc::clone(&instance.props);
        instance.behavior.apply_updates(&props);
        let context = instance.context.clone();
        let previous_props = instance
            .prev_props
            .take()
            .unwrap_or_else(|| Rc::clone(&props));
        let previous_context = instance
            .prev_context
            .take()
            .unwrap_or_else(|| context.clone());
        let is_update = instance.base.is_some();
        let next_base = instance.next_base.take();
        let initial_base = instance.base.or(next_base);
        let owner = instance.owner;
        let has_wrapper = owner != id;

        let mut skip = false;
        if is_update {
            let previous = (&*previous_props, &previous_context);
            let next = (&*props, &context);
            if mode != RenderMode::Force && !instance.behavior.should_update(previous, next) {
                skip = true;
            } else {
                instance.behavior.will_update(previous, next);
            }
        }
        instance.behavior.clear_dirty();

        if !skip {
            let rendered = instance.behavior.render((&*props, &context));
            let child_context = match instance.behavior.child_context((&*props, &context)) {
                Some(extra) => context.extend(extra),
                None => context.clone(),
            };
            let rendered = resolve_functional(rendered.as_ref(), &child_context).map(Cow::into_owned);

            let mut to_unmount = Vec::new();
            let mut delegate = None;
            let mut cbase = None;
            let mut base = None;

            let child_unit = match rendered.as_ref().map(VNode::kind) {
                Some(NodeKind::Unit(UnitType::Stateful(unit))) => Some(*unit),
                _ => None,
            };
            if let (Some(child_unit), Some(rendered)) = (child_unit, rendered.as_ref()) {
                let child_props = rendered.unit_props(child_unit.default_props());
                let reusable = initial_child
                    .filter(|child| self.components.get(child).map(|c| c.unit) == Some(child_unit));
                let inst = match reusable {
                    Some(existing) => {
                        self.set_component_props(
                            existing,
                            child_props,
                            RenderMode::Sync,
                            &child_context,
                            false,
                        )?;
                        existing
                    }
                    None => {
                        to_unmount = self.detach_delegates(id)?;
                        let created =
                            self.create_component(child_unit, child_props.clone(), &child_context);
                        {
                            let child = self.instance_mut(created)?;
                            if child.next_base.is_none() {
                                child.next_base = next_base;
                            }
                            child.owner = owner;
                        }
                        self.instance_mut(owner)?.chain.push(created);
                        self.set_component_props(
                            created,
                            child_props,
                            RenderMode::Skip,
                            &child_context,
                            false,
                        )?;
                        self.render_component(created, RenderMode::Sync, mount_all, true)?;
                        created
                    }
                };
                delegate = Some(inst);
                base = self.instance(inst)?.base;
            } else {
                cbase = initial_base;
                if initial_child.is_some() {
                    to_unmount = self.detach_delegates(id)?;
                    cbase = None;
                }
                if initial_base.is_some() || mode == RenderMode::Sync {
                    if let Some(cbase) = cbase {
                        self.document.node_mut(cbase)?.binding.component = None;
                    }
                    let parent = initial_base.and_then(|node| self.document.parent(node));
                    base = Some(self.diff(
                        cbase,
                        rendered.as_ref(),
                        &child_context,
                        mount_all || !is_update,
                        parent,
                        true,
                    )?);
                }
            }

            if let Some(initial) = initial_base {
                if base != Some(initial) && delegate != initial_child {
                    if let (Some(parent), Some(base)) = (self.document.parent(initial), base) {
                        if base != parent {
                            self.document.replace_child(parent, base, initial)?;
                        }
                    }
                    if cbase.is_none() && to_unmount.is_empty() && has_wrapper {
                        if let Ok(node) = self.document.node_mut(initial) {
                            node.binding.component = None;
                        }
                        self.recollect_node_tree(initial, false)?;
                    }
                }
            }

            if !to_unmount.is_empty() {
                self.unmount_chain(to_unmount, base != initial_base)?;
            }

            self.instance_mut(id)?.base = base;
            if let Some(base) = base {
                if !is_child {
                    self.adopt_base(id, owner, base)?;
                }
            }
        }

        let instance = self
            .components
            .get_mut(&id)
            .ok_or(RenderError::MissingComponent { id })?;
        if !is_update || mount_all {
            self.mounts.push_front(id);
        } else if !skip {
            instance.behavior.did_update(
                (&*previous_props, &previous_context),
                (&*instance.props, &instance.context),
            );
        }
        instance.behavior.finish_render();
        let callbacks = instance.behavior.take_callbacks();
        for callback in callbacks.into_iter().rev() {
            callback();
        }

        if self.diff_level == 0 && !is_child {
            self.flush_mounts();
        }
        Ok(())
    }

    /// Shares `base` with `id` and every unit wrapping it, and records the
    /// chain owner on the node.
    fn adopt_base(
        &mut self,
        id: ComponentId,
        owner: ComponentId,
        base: NodeId,
    ) -> Result<(), RenderError> {
        let wrappers = self.instance(owner)?.chain.wrappers_of(id);
        for wrapper in wrappers {
            if let Some(instance) = self.components.get_mut(&wrapper) {
                instance.base = Some(base);
            }
        }
        let unit = self.instance(owner)?.unit;
        let binding = &mut self.document.node_mut(base)?.binding;
        binding.component = Some(owner);
        binding.unit = Some(unit);
        Ok(())
    }

    /// Reconciles a node against a description naming a stateful unit.
    pub(crate) fn build_component_from_vnode(
        &mut self,
        dom: Option<NodeId>,
        vnode: &VNode,
        unit: StatefulUnit,
        context: &Context,
        mount_all: bool,
    ) -> Result<NodeId, RenderError> {
        let binding = dom
            .and_then(|node| self.document.node(node).ok())
            .map(|node| (node.binding.component, node.binding.unit));
        let (owner, owner_unit) = binding.unwrap_or((None, None));
        let is_direct_owner = owner.is_some() && owner_unit == Some(unit);
        let props = vnode.unit_props(unit.default_props());

        if let Some(owner) = owner.filter(|_| is_direct_owner) {
            if !mount_all || self.delegate_of(owner).is_some() {
                self.set_component_props(owner, props, RenderMode::Async, context, mount_all)?;
                return self
                    .instance(owner)?
                    .base
                    .ok_or(RenderError::Unrendered { id: owner });
            }
        }

        let mut dom = dom;
        let mut old_dom = dom;
        if let Some(owner) = owner {
            if is_direct_owner {
                // Replaced wholesale while mounting; its hooks never run.
                self.discard_chain(owner);
            } else {
                self.unmount_component(owner, true)?;
                dom = None;
                old_dom = None;
            }
        }

        let created = self.create_component(unit, props.clone(), context);
        if let Some(node) = dom {
            let instance = self.instance_mut(created)?;
            if instance.next_base.is_none() {
                instance.next_base = Some(node);
            }
        }
        self.set_component_props(created, props, RenderMode::Sync, context, mount_all)?;
        let base = self.instance(created)?.base;

        if let Some(old) = old_dom {
            if base != Some(old) {
                if let Ok(node) = self.document.node_mut(old) {
                    node.binding.component = None;
                }
                self.recollect_node_tree(old, false)?;
            }
        }
        base.ok_or(RenderError::Unrendered { id: created })
    }

    /// Unmounts `id` together with every unit it delegates to.
    pub(crate) fn unmount_component(
        &mut self,
        id: ComponentId,
        remove: bool,
    ) -> Result<(), RenderError> {
        let owner = self.instance(id)?.owner;
        let segment = self.instance_mut(owner)?.chain.split_at(id);
        self.unmount_chain(segment, remove)
    }

    /// Tears down a chain segment, outermost first.
    ///
    /// `will_unmount` runs outer to inner. The innermost unit's root is then
    /// detached (and its shell pooled when `remove`), its children torn down,
    /// and finally `ref` callbacks and `did_unmount` run inner to outer.
    pub(crate) fn unmount_chain(
        &mut self,
        segment: Vec<ComponentId>,
        remove: bool,
    ) -> Result<(), RenderError> {
        let mut base = None;
        let mut innermost = None;
        for &id in &segment {
            let Some(instance) = self.components.get_mut(&id) else {
                continue;
            };
            log::trace!("unmounting {} {id}", instance.unit.name());
            instance.disabled = true;
            instance
                .behavior
                .will_unmount((&*instance.props, &instance.context));
            base = instance.base.take();
            innermost = Some(instance.unit);
        }

        if let Some(base) = base.filter(|&node| self.document.contains(node)) {
            let dom = self.document.node_mut(base)?;
            dom.binding.component = None;
            dom.binding.unit = None;
            let ref_callback = dom
                .binding
                .props_cache
                .as_ref()
                .and_then(|cache| cache.get("ref"))
                .and_then(AttrValue::as_ref_callback)
                .cloned();
            if let Some(callback) = ref_callback {
                callback.call(None);
            }
            if remove {
                self.document.remove(base)?;
                if let Some(unit) = innermost {
                    self.shells.collect(unit.type_id(), base);
                }
            }
            let children: Vec<Option<NodeId>> = self
                .document
                .children(base)
                .iter()
                .copied()
                .map(Some)
                .collect();
            self.remove_orphaned_children(&children, !remove)?;
        }

        for id in segment.into_iter().rev() {
            let Some(mut instance) = self.components.remove(&id) else {
                continue;
            };
            if let Some(callback) = instance.ref_cb.take() {
                callback.call(None);
            }
            instance.behavior.did_unmount();
        }
        Ok(())
    }

    /// Drops a chain's records without running any hooks.
    fn discard_chain(&mut self, owner: ComponentId) {
        let members = self
            .components
            .get(&owner)
            .map(|instance| instance.chain.members().to_vec())
            .unwrap_or_default();
        for id in members {
            self.components.remove(&id);
        }
    }

    /// Runs deferred `did_mount` hooks, children before their ancestors.
    pub(crate) fn flush_mounts(&mut self) {
        while let Some(id) = self.mounts.pop_back() {
            if let Some(instance) = self.components.get_mut(&id) {
                instance
                    .behavior
                    .did_mount((&*instance.props, &instance.context));
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lifecycle_tests.rs"]
mod tests;
