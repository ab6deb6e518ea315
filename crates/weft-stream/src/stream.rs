//! Cold streams, sinks and the simple operators.
//!
//! A [`Stream`] is a producer function. Nothing happens until it is
//! subscribed; every subscription runs the producer again with a fresh
//! [`Sink`]. A sink delivers any number of `Next` events followed by at most
//! one terminal event (`Error` or `Complete`), after which it is stopped and
//! its subscription is cancelled.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::subscription::Subscription;

/// A notification delivered to an observer.
#[derive(Debug, Clone, PartialEq)]
pub enum Event<T, E> {
    Next(T),
    Error(E),
    Complete,
}

// ─────────────────────────────────────────────────────────────────────
// Sink
// ─────────────────────────────────────────────────────────────────────

struct SinkInner<T, E> {
    observer: Box<dyn Fn(Event<T, E>)>,
    stopped: Cell<bool>,
    subscription: Subscription,
}

/// The receiving end handed to a producer.
pub struct Sink<T, E> {
    inner: Rc<SinkInner<T, E>>,
}

impl<T, E> Clone for Sink<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, E> Sink<T, E> {
    /// Wrap an observer callback.
    pub fn new(observer: impl Fn(Event<T, E>) + 'static) -> Self {
        Self {
            inner: Rc::new(SinkInner {
                observer: Box::new(observer),
                stopped: Cell::new(false),
                subscription: Subscription::new(),
            }),
        }
    }

    /// The subscription that tears this sink's producer down.
    pub fn subscription(&self) -> &Subscription {
        &self.inner.subscription
    }

    /// Returns `true` after a terminal event or cancellation.
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.get() || self.inner.subscription.is_closed()
    }

    pub fn next(&self, value: T) {
        if !self.is_stopped() {
            (self.inner.observer)(Event::Next(value));
        }
    }

    pub fn error(&self, error: E) {
        if self.is_stopped() {
            return;
        }
        self.inner.stopped.set(true);
        (self.inner.observer)(Event::Error(error));
        self.inner.subscription.cancel();
    }

    pub fn complete(&self) {
        if self.is_stopped() {
            return;
        }
        self.inner.stopped.set(true);
        (self.inner.observer)(Event::Complete);
        self.inner.subscription.cancel();
    }

    /// Dispatch an event to the matching method.
    pub fn emit(&self, event: Event<T, E>) {
        match event {
            Event::Next(value) => self.next(value),
            Event::Error(error) => self.error(error),
            Event::Complete => self.complete(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Stream
// ─────────────────────────────────────────────────────────────────────

type Producer<T, E> = dyn Fn(&Sink<T, E>);

/// A cold, single-threaded, push-based stream.
pub struct Stream<T, E> {
    producer: Rc<Producer<T, E>>,
}

impl<T, E> Clone for Stream<T, E> {
    fn clone(&self) -> Self {
        Self {
            producer: self.producer.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Stream<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stream({:p})", Rc::as_ptr(&self.producer))
    }
}

impl<T, E> Stream<T, E> {
    /// Identity comparison: two handles to the same producer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.producer, &other.producer)
    }
}

impl<T: 'static, E: 'static> Stream<T, E> {
    /// Build a stream from a producer. The producer registers its teardown
    /// work on `sink.subscription()`.
    pub fn new(producer: impl Fn(&Sink<T, E>) + 'static) -> Self {
        Self {
            producer: Rc::new(producer),
        }
    }

    /// Emit `value` once, then complete.
    pub fn of(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(move |sink| {
            sink.next(value.clone());
            sink.complete();
        })
    }

    /// Emit every value in order, then complete.
    pub fn from_values(values: Vec<T>) -> Self
    where
        T: Clone,
    {
        Self::new(move |sink| {
            for value in &values {
                if sink.is_stopped() {
                    return;
                }
                sink.next(value.clone());
            }
            sink.complete();
        })
    }

    /// Fail immediately.
    pub fn error(error: E) -> Self
    where
        E: Clone,
    {
        Self::new(move |sink| sink.error(error.clone()))
    }

    /// Complete immediately without emitting.
    pub fn empty() -> Self {
        Self::new(|sink| sink.complete())
    }

    /// Never emit and never terminate.
    pub fn never() -> Self {
        Self::new(|_| {})
    }

    // ── Subscribing ──────────────────────────────────────────────────────

    /// Run the producer against an existing sink.
    pub fn subscribe_sink(&self, sink: &Sink<T, E>) {
        if !sink.is_stopped() {
            (self.producer)(sink);
        }
    }

    /// Subscribe an observer. The returned handle cancels the producer.
    pub fn subscribe(&self, observer: impl Fn(Event<T, E>) + 'static) -> Subscription {
        let sink = Sink::new(observer);
        self.subscribe_sink(&sink);
        sink.subscription().clone()
    }

    /// Subscribe with the new subscription linked under `parent` before the
    /// producer runs, so cancelling `parent` stops even a synchronous source.
    pub fn subscribe_within(
        &self,
        parent: &Subscription,
        observer: impl Fn(Event<T, E>) + 'static,
    ) -> Subscription {
        let sink = Sink::new(observer);
        parent.add(sink.subscription().clone());
        self.subscribe_sink(&sink);
        sink.subscription().clone()
    }

    /// Forward every event into `downstream`, linked under its subscription.
    pub fn forward_to(&self, downstream: &Sink<T, E>) -> Subscription {
        let target = downstream.clone();
        self.subscribe_within(downstream.subscription(), move |event| target.emit(event))
    }

    /// Subscribe, collect whatever is emitted synchronously, and cancel.
    /// Returns the first value or error, or `None` when nothing arrived.
    pub fn first_now(&self) -> Option<Result<T, E>> {
        let slot: Rc<RefCell<Option<Result<T, E>>>> = Rc::new(RefCell::new(None));
        let writer = slot.clone();
        let subscription = self.take(1).subscribe(move |event| {
            let mut slot = writer.borrow_mut();
            if slot.is_some() {
                return;
            }
            match event {
                Event::Next(value) => *slot = Some(Ok(value)),
                Event::Error(error) => *slot = Some(Err(error)),
                Event::Complete => {}
            }
        });
        subscription.cancel();
        let first = slot.borrow_mut().take();
        first
    }

    // ── Operators ────────────────────────────────────────────────────────

    /// Transform each value.
    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> Stream<U, E> {
        let source = self.clone();
        let f = Rc::new(f);
        Stream::new(move |downstream: &Sink<U, E>| {
            let f = f.clone();
            let target = downstream.clone();
            source.subscribe_within(downstream.subscription(), move |event| match event {
                Event::Next(value) => target.next(f(value)),
                Event::Error(error) => target.error(error),
                Event::Complete => target.complete(),
            });
        })
    }

    /// Transform each value; an `Err` terminates the stream with that error.
    pub fn try_map<U: 'static>(&self, f: impl Fn(T) -> Result<U, E> + 'static) -> Stream<U, E> {
        let source = self.clone();
        let f = Rc::new(f);
        Stream::new(move |downstream: &Sink<U, E>| {
            let f = f.clone();
            let target = downstream.clone();
            source.subscribe_within(downstream.subscription(), move |event| match event {
                Event::Next(value) => match f(value) {
                    Ok(mapped) => target.next(mapped),
                    Err(error) => target.error(error),
                },
                Event::Error(error) => target.error(error),
                Event::Complete => target.complete(),
            });
        })
    }

    /// On error, continue with the stream returned by `handler`.
    pub fn catch_error(&self, handler: impl Fn(E) -> Stream<T, E> + 'static) -> Self {
        let source = self.clone();
        let handler = Rc::new(handler);
        Stream::new(move |downstream: &Sink<T, E>| {
            let handler = handler.clone();
            let target = downstream.clone();
            source.subscribe_within(downstream.subscription(), move |event| match event {
                Event::Next(value) => target.next(value),
                Event::Complete => target.complete(),
                Event::Error(error) => {
                    handler(error).forward_to(&target);
                }
            });
        })
    }

    /// Emit at most `count` values, then complete and cancel upstream.
    pub fn take(&self, count: usize) -> Self {
        let source = self.clone();
        Stream::new(move |downstream: &Sink<T, E>| {
            if count == 0 {
                downstream.complete();
                return;
            }
            let remaining = Rc::new(Cell::new(count));
            let target = downstream.clone();
            source.subscribe_within(downstream.subscription(), move |event| match event {
                Event::Next(value) => {
                    let left = remaining.get();
                    if left == 0 {
                        return;
                    }
                    remaining.set(left - 1);
                    target.next(value);
                    if left == 1 {
                        target.complete();
                    }
                }
                other => target.emit(other),
            });
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<T: Clone + 'static>(stream: &Stream<T, String>) -> Rc<RefCell<Vec<Event<T, String>>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        stream.subscribe(move |e| sink.borrow_mut().push(e));
        events
    }

    #[test]
    fn test_of_emits_then_completes() {
        let events = collect(&Stream::<i32, String>::of(1));
        assert_eq!(*events.borrow(), vec![Event::Next(1), Event::Complete]);
    }

    #[test]
    fn test_nothing_after_terminal() {
        let stream = Stream::<i32, String>::new(|sink| {
            sink.next(1);
            sink.error("boom".into());
            sink.next(2);
            sink.complete();
        });
        let events = collect(&stream);
        assert_eq!(
            *events.borrow(),
            vec![Event::Next(1), Event::Error("boom".into())]
        );
    }

    #[test]
    fn test_cold_streams_rerun_producer() {
        let runs = Rc::new(Cell::new(0));
        let r = runs.clone();
        let stream = Stream::<i32, String>::new(move |sink| {
            r.set(r.get() + 1);
            sink.complete();
        });
        stream.subscribe(|_| {});
        stream.subscribe(|_| {});
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_first_now() {
        assert_eq!(Stream::<i32, String>::of(7).first_now(), Some(Ok(7)));
        assert_eq!(Stream::<i32, String>::never().first_now(), None);
        assert_eq!(Stream::<i32, String>::empty().first_now(), None);
        assert_eq!(
            Stream::<i32, String>::error("e".into()).first_now(),
            Some(Err("e".into()))
        );
    }
}
