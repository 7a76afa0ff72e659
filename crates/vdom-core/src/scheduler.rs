use std::cell::RefCell;
use std::mem;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::component::ComponentId;
use crate::platform::RuntimeScheduler;

struct SchedulerInner {
    backend: Arc<dyn RuntimeScheduler>,
    pending: RefCell<Vec<ComponentId>>,
}

impl SchedulerInner {
    fn enqueue(&self, id: ComponentId) {
        let armed = {
            let mut pending = self.pending.borrow_mut();
            pending.push(id);
            pending.len() == 1
        };
        if armed {
            log::trace!("arming deferred flush for {id:?}");
            self.backend.schedule_flush();
        }
    }
}

/// Dirty-set batching for unit re-renders.
///
/// Owned by the engine. Units reach it through a [`SchedulerHandle`].
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

impl Scheduler {
    pub fn new(backend: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                backend,
                pending: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle(Rc::downgrade(&self.inner))
    }

    /// Swaps the pending list for a fresh one, so units dirtied while the
    /// returned batch is processed land in the next batch.
    pub(crate) fn take_pending(&self) -> Vec<ComponentId> {
        mem::take(&mut *self.inner.pending.borrow_mut())
    }

    /// Puts an unfinished batch back ahead of anything queued since it was
    /// taken, re-arming the backend if the list was empty.
    pub(crate) fn restore_pending(&self, batch: Vec<ComponentId>) {
        if batch.is_empty() {
            return;
        }
        let armed = {
            let mut pending = self.inner.pending.borrow_mut();
            let was_empty = pending.is_empty();
            let newer = mem::replace(&mut *pending, batch);
            pending.extend(newer);
            was_empty
        };
        if armed {
            self.inner.backend.schedule_flush();
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.pending.borrow().is_empty()
    }
}

#[derive(Clone)]
pub struct SchedulerHandle(Weak<SchedulerInner>);

impl SchedulerHandle {
    /// Queues a dirty unit; the backend is armed only on the empty to
    /// non-empty transition.
    pub fn enqueue(&self, id: ComponentId) {
        if let Some(inner) = self.0.upgrade() {
            inner.enqueue(id);
        }
    }

    pub fn has_pending(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| !inner.pending.borrow().is_empty())
            .unwrap_or(false)
    }
}

/// Backend that never wakes anything; callers flush by hand.
///
/// `Engine::new` uses it, so queued updates wait for an explicit
/// [`Engine::flush`](crate::Engine::flush). `StdRuntime::engine` in
/// `vdom-runtime-std` wires a backend that raises a flush flag instead.
#[derive(Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn schedule_flush(&self) {}
}
