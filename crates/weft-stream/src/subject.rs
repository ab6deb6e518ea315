//! Hot, multicast sources driven from outside.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::stream::{Event, Sink, Stream};

enum Terminal<E> {
    Error(E),
    Complete,
}

struct SubjectInner<T, E> {
    observers: RefCell<Vec<(u64, Sink<T, E>)>>,
    next_id: Cell<u64>,
    /// When set, the latest value is replayed to new observers.
    current: RefCell<Option<T>>,
    replay: bool,
    terminal: RefCell<Option<Terminal<E>>>,
}

/// A hot source that pushes the same events to every current observer.
///
/// A subject created with [`Subject::with_value`] behaves like a cell: it
/// remembers its latest value and delivers it to each new observer on
/// subscription. A plain [`Subject::new`] only delivers future values.
pub struct Subject<T, E> {
    inner: Rc<SubjectInner<T, E>>,
}

impl<T, E> Clone for Subject<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Default for Subject<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Subject<T, E> {
    /// A subject without replay.
    pub fn new() -> Self {
        Self::build(None, false)
    }

    /// A subject that replays its latest value, starting with `initial`.
    pub fn with_value(initial: T) -> Self {
        Self::build(Some(initial), true)
    }

    fn build(current: Option<T>, replay: bool) -> Self {
        Self {
            inner: Rc::new(SubjectInner {
                observers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                current: RefCell::new(current),
                replay,
                terminal: RefCell::new(None),
            }),
        }
    }

    /// A stream view of this subject. Each subscription registers an
    /// observer that is removed again when the subscription is cancelled.
    pub fn stream(&self) -> Stream<T, E> {
        let inner = self.inner.clone();
        Stream::new(move |sink: &Sink<T, E>| {
            let terminal = match &*inner.terminal.borrow() {
                Some(Terminal::Error(error)) => Some(Event::Error(error.clone())),
                Some(Terminal::Complete) => Some(Event::Complete),
                None => None,
            };
            if let Some(event) = terminal {
                sink.emit(event);
                return;
            }

            if inner.replay {
                let current = inner.current.borrow().clone();
                if let Some(value) = current {
                    sink.next(value);
                }
            }
            if sink.is_stopped() {
                return;
            }

            let id = inner.next_id.get();
            inner.next_id.set(id + 1);
            inner.observers.borrow_mut().push((id, sink.clone()));

            let weak = Rc::downgrade(&inner);
            sink.subscription().on_cancel(move || remove_observer(&weak, id));
        })
    }

    /// Push a value to every current observer.
    pub fn next(&self, value: T) {
        if self.inner.terminal.borrow().is_some() {
            return;
        }
        if self.inner.replay {
            *self.inner.current.borrow_mut() = Some(value.clone());
        }
        for sink in self.snapshot() {
            sink.next(value.clone());
        }
    }

    /// Fail every current and future observer.
    pub fn error(&self, error: E) {
        if !self.terminate(Terminal::Error(error.clone())) {
            return;
        }
        for (_, sink) in self.inner.observers.take() {
            sink.error(error.clone());
        }
    }

    /// Complete every current and future observer.
    pub fn complete(&self) {
        if !self.terminate(Terminal::Complete) {
            return;
        }
        for (_, sink) in self.inner.observers.take() {
            sink.complete();
        }
    }

    /// The latest value, for replaying subjects.
    pub fn value(&self) -> Option<T> {
        self.inner.current.borrow().clone()
    }

    /// Number of live observers.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    fn terminate(&self, terminal: Terminal<E>) -> bool {
        let mut slot = self.inner.terminal.borrow_mut();
        if slot.is_some() {
            return false;
        }
        *slot = Some(terminal);
        true
    }

    fn snapshot(&self) -> Vec<Sink<T, E>> {
        self.inner
            .observers
            .borrow()
            .iter()
            .map(|(_, sink)| sink.clone())
            .collect()
    }
}

fn remove_observer<T, E>(inner: &Weak<SubjectInner<T, E>>, id: u64) {
    if let Some(inner) = inner.upgrade() {
        inner.observers.borrow_mut().retain(|(i, _)| *i != id);
    }
}
