//! Cancellation handles.
//!
//! A [`Subscription`] owns the teardown work of one running stream: callbacks
//! that release resources and child subscriptions of upstream sources and
//! inner streams. Cancelling runs every teardown exactly once; cancelling
//! again is a no-op.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

enum Teardown {
    Callback(Box<dyn FnOnce()>),
    Child(Subscription),
}

#[derive(Default)]
struct Inner {
    closed: Cell<bool>,
    teardowns: RefCell<Vec<Teardown>>,
}

/// A shared, idempotent cancellation handle.
#[derive(Clone, Default)]
pub struct Subscription {
    inner: Rc<Inner>,
}

impl Subscription {
    /// Create an open subscription with no teardown work.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once [`cancel`](Self::cancel) has run.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }

    /// Attach a child: cancelling `self` cancels `child`. Adding to a closed
    /// subscription cancels the child immediately.
    pub fn add(&self, child: Subscription) {
        if Rc::ptr_eq(&self.inner, &child.inner) || child.is_closed() {
            return;
        }
        if self.is_closed() {
            child.cancel();
            return;
        }
        let mut teardowns = self.inner.teardowns.borrow_mut();
        teardowns.retain(|t| !matches!(t, Teardown::Child(c) if c.is_closed()));
        teardowns.push(Teardown::Child(child));
    }

    /// Register a callback to run on cancellation. On a closed subscription
    /// the callback runs immediately.
    pub fn on_cancel(&self, callback: impl FnOnce() + 'static) {
        if self.is_closed() {
            callback();
            return;
        }
        self.inner
            .teardowns
            .borrow_mut()
            .push(Teardown::Callback(Box::new(callback)));
    }

    /// Cancel, running every teardown exactly once in registration order.
    pub fn cancel(&self) {
        if self.inner.closed.replace(true) {
            return;
        }
        let teardowns = std::mem::take(&mut *self.inner.teardowns.borrow_mut());
        for teardown in teardowns {
            match teardown {
                Teardown::Callback(callback) => callback(),
                Teardown::Child(child) => child.cancel(),
            }
        }
    }

    /// Number of teardowns still registered.
    pub fn teardown_count(&self) -> usize {
        self.inner.teardowns.borrow().len()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .field("teardowns", &self.teardown_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_runs_callbacks_once() {
        let count = Rc::new(Cell::new(0));
        let sub = Subscription::new();
        let c = count.clone();
        sub.on_cancel(move || c.set(c.get() + 1));
        sub.cancel();
        sub.cancel();
        assert_eq!(count.get(), 1);
        assert!(sub.is_closed());
    }

    #[test]
    fn test_cancel_propagates_to_children() {
        let parent = Subscription::new();
        let child = Subscription::new();
        parent.add(child.clone());
        parent.cancel();
        assert!(child.is_closed());
    }

    #[test]
    fn test_child_cancel_leaves_parent_open() {
        let parent = Subscription::new();
        let child = Subscription::new();
        parent.add(child.clone());
        child.cancel();
        assert!(!parent.is_closed());
    }

    #[test]
    fn test_add_to_closed_cancels_child() {
        let parent = Subscription::new();
        parent.cancel();
        let child = Subscription::new();
        parent.add(child.clone());
        assert!(child.is_closed());
    }

    #[test]
    fn test_on_cancel_after_close_runs_immediately() {
        let sub = Subscription::new();
        sub.cancel();
        let ran = Rc::new(Cell::new(false));
        let r = ran.clone();
        sub.on_cancel(move || r.set(true));
        assert!(ran.get());
    }

    #[test]
    fn test_closed_children_are_pruned() {
        let parent = Subscription::new();
        let first = Subscription::new();
        parent.add(first.clone());
        first.cancel();
        parent.add(Subscription::new());
        assert_eq!(parent.teardown_count(), 1);
    }
}
