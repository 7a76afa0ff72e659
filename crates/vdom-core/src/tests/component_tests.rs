use super::*;
use crate::scheduler::Scheduler;
use crate::value::AttrValue;
use crate::RuntimeScheduler;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct CountingScheduler {
    armed: AtomicUsize,
}

impl RuntimeScheduler for CountingScheduler {
    fn schedule_flush(&self) {
        self.armed.fetch_add(1, Ordering::SeqCst);
    }
}

struct Greeting;

impl Component for Greeting {
    type State = Vec<&'static str>;

    fn create(_props: &Props, _context: &Context, _link: Link<Self>) -> Self {
        Greeting
    }

    fn render(&self, view: View<'_, Self>) -> Option<VNode> {
        Some(VNode::text(view.state.join(",")))
    }

    fn default_props() -> Option<Attributes> {
        let mut defaults = Attributes::new();
        defaults.insert("greeting".to_string(), "hello".into());
        Some(defaults)
    }
}

fn mount_greeting(scheduler: &Scheduler) -> Box<dyn ErasedComponent> {
    let props = Props::new();
    let context = Context::default();
    Greeting::unit().build(Seed {
        id: ComponentId::new(1),
        props: &props,
        context: &context,
        scheduler: scheduler.handle(),
    })
}

fn link_of(behavior: &dyn ErasedComponent, scheduler: &Scheduler) -> Link<Greeting> {
    let mounted = behavior
        .as_any()
        .downcast_ref::<Mounted<Greeting>>()
        .expect("greeting");
    Link {
        id: ComponentId::new(1),
        queue: Rc::clone(&mounted.queue),
        scheduler: scheduler.handle(),
    }
}

#[test]
fn unit_descriptor_uses_short_type_name() {
    let unit = Greeting::unit();
    assert_eq!(unit.name(), "Greeting");
    assert_eq!(unit, StatefulUnit::of::<Greeting>());
    let defaults = unit.default_props().expect("defaults");
    assert_eq!(defaults.get("greeting"), Some(&AttrValue::from("hello")));
}

#[test]
fn fresh_units_start_dirty_and_queue_once_clean() {
    let backend = Arc::new(CountingScheduler::default());
    let scheduler = Scheduler::new(backend.clone());
    let behavior = mount_greeting(&scheduler);
    assert!(behavior.is_dirty());
    assert!(!behavior.mark_dirty(), "already dirty");

    behavior.clear_dirty();
    assert!(behavior.mark_dirty());
    assert!(!behavior.mark_dirty());
}

#[test]
fn queued_updates_apply_in_order_and_keep_previous_snapshot() {
    let scheduler = Scheduler::new(Arc::new(CountingScheduler::default()));
    let mut behavior = mount_greeting(&scheduler);
    let link = link_of(&*behavior, &scheduler);

    link.set_state(|log, _| log.push("a"));
    link.set_state(|log, _| log.push("b"));
    behavior.apply_updates(&Props::new());

    let mounted = behavior
        .as_any()
        .downcast_ref::<Mounted<Greeting>>()
        .expect("greeting");
    assert_eq!(mounted.state(), &vec!["a", "b"]);
    assert_eq!(mounted.previous_state(), &Vec::<&str>::new());

    behavior.finish_render();
    let mounted = behavior
        .as_any()
        .downcast_ref::<Mounted<Greeting>>()
        .expect("greeting");
    assert_eq!(mounted.previous_state(), &vec!["a", "b"]);
}

#[test]
fn render_callbacks_are_collected_once() {
    let scheduler = Scheduler::new(Arc::new(CountingScheduler::default()));
    let behavior = mount_greeting(&scheduler);
    let link = link_of(&*behavior, &scheduler);
    let hits = Rc::new(Cell::new(0));
    link.set_state_with_callback(|log, _| log.push("x"), {
        let hits = Rc::clone(&hits);
        move || hits.set(hits.get() + 1)
    });
    let callbacks = behavior.take_callbacks();
    assert_eq!(callbacks.len(), 1);
    for callback in callbacks {
        callback();
    }
    assert_eq!(hits.get(), 1);
    assert!(behavior.take_callbacks().is_empty());
}

#[test]
fn link_enqueues_on_clean_to_dirty_transition() {
    let backend = Arc::new(CountingScheduler::default());
    let scheduler = Scheduler::new(backend.clone());
    let behavior = mount_greeting(&scheduler);
    let mounted = behavior
        .as_any()
        .downcast_ref::<Mounted<Greeting>>()
        .expect("greeting");
    let link = Link::<Greeting> {
        id: ComponentId::new(1),
        queue: Rc::clone(&mounted.queue),
        scheduler: scheduler.handle(),
    };

    link.set_state(|log, _| log.push("ignored while dirty"));
    assert!(!scheduler.has_pending());

    behavior.clear_dirty();
    link.set_state(|log, _| log.push("first"));
    link.set_state(|log, _| log.push("second"));
    assert_eq!(scheduler.take_pending(), vec![ComponentId::new(1)]);
    assert_eq!(backend.armed.load(Ordering::SeqCst), 1);
}

#[test]
fn delegation_chain_splits_and_reports_wrappers() {
    let outer = ComponentId::new(1);
    let middle = ComponentId::new(2);
    let inner = ComponentId::new(3);
    let mut chain = DelegationChain::new(outer);
    chain.push(middle);
    chain.push(inner);

    assert_eq!(chain.delegate_of(outer), Some(middle));
    assert_eq!(chain.delegate_of(inner), None);
    assert_eq!(chain.wrappers_of(middle), vec![middle, outer]);

    let tail = chain.split_after(middle);
    assert_eq!(tail, vec![inner]);
    assert_eq!(chain.members(), &[outer, middle]);

    let removed = chain.split_at(middle);
    assert_eq!(removed, vec![middle]);
    assert_eq!(chain.members(), &[outer]);
    assert_eq!(chain.split_at(inner), vec![inner]);
}

#[test]
fn component_id_displays_with_prefix() {
    assert_eq!(ComponentId::new(7).to_string(), "component#7");
    assert_eq!(ComponentId::new(7).raw(), 7);
}
