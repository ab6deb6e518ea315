//! Virtual time for deterministic time-based sources.
//!
//! Timers never fire on their own. [`VirtualClock::advance`] moves time
//! forward and fires every timer that falls due, in due-time order, with ties
//! broken by registration order.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::stream::{Sink, Stream};

struct Timer {
    due: u64,
    period: Option<u64>,
    fire: Rc<dyn Fn()>,
}

#[derive(Default)]
struct ClockInner {
    now: Cell<u64>,
    next_id: Cell<u64>,
    timers: RefCell<BTreeMap<u64, Timer>>,
}

impl ClockInner {
    fn schedule(&self, delay: u64, period: Option<u64>, fire: Rc<dyn Fn()>) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let due = self.now.get().saturating_add(delay);
        self.timers.borrow_mut().insert(id, Timer { due, period, fire });
        id
    }

    /// Earliest timer due at or before `limit`.
    fn next_due(&self, limit: u64) -> Option<(u64, u64, Rc<dyn Fn()>)> {
        self.timers
            .borrow()
            .iter()
            .filter(|(_, timer)| timer.due <= limit)
            .min_by_key(|(id, timer)| (timer.due, **id))
            .map(|(id, timer)| (*id, timer.due, timer.fire.clone()))
    }
}

/// A manually driven clock. Times are in milliseconds.
#[derive(Clone, Default)]
pub struct VirtualClock {
    inner: Rc<ClockInner>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> u64 {
        self.inner.now.get()
    }

    /// Number of scheduled timers. Cancelled subscriptions remove theirs.
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Move time forward by `ms`, firing every timer that falls due.
    pub fn advance(&self, ms: u64) {
        let target = self.now().saturating_add(ms);
        while let Some((id, due, fire)) = self.inner.next_due(target) {
            self.inner.now.set(due);
            {
                let mut timers = self.inner.timers.borrow_mut();
                // A periodic timer whose next due time is past the end of
                // time is dropped after this firing.
                let next = timers
                    .get(&id)
                    .and_then(|timer| timer.period)
                    .and_then(|period| due.checked_add(period));
                match next {
                    Some(next) => {
                        if let Some(timer) = timers.get_mut(&id) {
                            timer.due = next;
                        }
                    }
                    None => {
                        timers.remove(&id);
                    }
                }
            }
            trace!(timer = id, at = due, "timer fired");
            fire();
        }
        self.inner.now.set(target);
    }

    /// Emit `0, 1, 2, ...` every `period` ms, starting one period from now.
    /// A zero period is treated as one millisecond.
    pub fn interval<E: 'static>(&self, period: u64) -> Stream<u64, E> {
        let clock = Rc::downgrade(&self.inner);
        let period = period.max(1);
        Stream::new(move |sink: &Sink<u64, E>| {
            let Some(inner) = clock.upgrade() else {
                return;
            };
            let counter = Cell::new(0u64);
            let target = sink.clone();
            let fire: Rc<dyn Fn()> = Rc::new(move || {
                let tick = counter.get();
                counter.set(tick + 1);
                target.next(tick);
            });
            let id = inner.schedule(period, Some(period), fire);
            register_cancel(sink, &inner, id);
        })
    }

    /// Emit `value` once after `delay` ms, then complete.
    pub fn timer<T: Clone + 'static, E: 'static>(&self, delay: u64, value: T) -> Stream<T, E> {
        let clock = Rc::downgrade(&self.inner);
        Stream::new(move |sink: &Sink<T, E>| {
            let Some(inner) = clock.upgrade() else {
                return;
            };
            let target = sink.clone();
            let value = value.clone();
            let fire: Rc<dyn Fn()> = Rc::new(move || {
                target.next(value.clone());
                target.complete();
            });
            let id = inner.schedule(delay, None, fire);
            register_cancel(sink, &inner, id);
        })
    }
}

fn register_cancel<T, E>(sink: &Sink<T, E>, inner: &Rc<ClockInner>, id: u64) {
    let clock: Weak<ClockInner> = Rc::downgrade(inner);
    sink.subscription().on_cancel(move || {
        if let Some(inner) = clock.upgrade() {
            inner.timers.borrow_mut().remove(&id);
        }
    });
}
