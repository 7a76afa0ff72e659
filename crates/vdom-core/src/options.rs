//! Engine configuration.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::thread_local;

use crate::platform::RuntimeScheduler;
use crate::value::Event;
use crate::vnode::VNode;

/// Environment variable consulted by [`Options::from_env`].
pub const SYNC_UPDATES_ENV: &str = "VDOM_SYNC_UPDATES";

pub type VNodeHook = Rc<dyn Fn(&mut VNode)>;
pub type EventHook = Rc<dyn Fn(Event) -> Event>;

/// Per-engine configuration.
#[derive(Clone)]
pub struct Options {
    sync_component_updates: bool,
    event_hook: Option<EventHook>,
    scheduler: Option<Arc<dyn RuntimeScheduler>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            sync_component_updates: true,
            event_hook: None,
            scheduler: None,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with `sync_component_updates` overridden by
    /// `VDOM_SYNC_UPDATES` (`0`, `false` or `off` disable it).
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Ok(raw) = std::env::var(SYNC_UPDATES_ENV) {
            options.sync_component_updates = parse_flag(&raw).unwrap_or_else(|| {
                log::warn!("ignoring unrecognized {SYNC_UPDATES_ENV}={raw:?}");
                true
            });
            log::debug!(
                "sync_component_updates={} from environment",
                options.sync_component_updates
            );
        }
        options
    }

    /// When false, property changes on an already-mounted unit are queued on
    /// the scheduler instead of rendered in place.
    pub fn with_sync_component_updates(mut self, enabled: bool) -> Self {
        self.sync_component_updates = enabled;
        self
    }

    /// Installs a hook that may rewrite every event before it reaches a handler.
    pub fn with_event_hook(mut self, hook: impl Fn(Event) -> Event + 'static) -> Self {
        self.event_hook = Some(Rc::new(hook));
        self
    }

    /// Replaces the deferred-flush backend.
    pub fn with_scheduler(mut self, scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn sync_component_updates(&self) -> bool {
        self.sync_component_updates
    }

    pub fn event_hook(&self) -> Option<&EventHook> {
        self.event_hook.as_ref()
    }

    pub(crate) fn scheduler(&self) -> Option<Arc<dyn RuntimeScheduler>> {
        self.scheduler.clone()
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("sync_component_updates", &self.sync_component_updates)
            .field("event_hook", &self.event_hook.is_some())
            .field("scheduler", &self.scheduler.is_some())
            .finish()
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

thread_local! {
    static VNODE_HOOK: RefCell<Option<VNodeHook>> = RefCell::new(None);
}

/// Restores the previously installed vnode hook when dropped.
#[must_use = "the hook is removed when the guard is dropped"]
pub struct VNodeHookGuard {
    previous: Option<VNodeHook>,
}

impl Drop for VNodeHookGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        VNODE_HOOK.with(|slot| *slot.borrow_mut() = previous);
    }
}

/// Installs a hook that sees every description node `h` builds on this thread.
pub fn set_vnode_hook(hook: impl Fn(&mut VNode) + 'static) -> VNodeHookGuard {
    let hook: VNodeHook = Rc::new(hook);
    let previous = VNODE_HOOK.with(|slot| slot.borrow_mut().replace(hook));
    VNodeHookGuard { previous }
}

pub(crate) fn run_vnode_hook(node: &mut VNode) {
    // Cloned out so a hook may itself call `h`.
    if let Some(hook) = VNODE_HOOK.with(|slot| slot.borrow().clone()) {
        hook(node);
    }
}
