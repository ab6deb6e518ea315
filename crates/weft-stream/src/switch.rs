//! Switch-to-latest flattening.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

use crate::stream::{Event, Sink, Stream};
use crate::subscription::Subscription;

#[derive(Default)]
struct SwitchState {
    /// Subscription of the inner stream currently mirrored.
    inner: RefCell<Option<Subscription>>,
    /// Bumped for every outer value; stale inner completions are ignored.
    generation: Cell<u64>,
    inner_active: Cell<bool>,
    outer_done: Cell<bool>,
}

impl SwitchState {
    /// Cancel the current inner subscription, if any.
    fn cancel_inner(&self) {
        let previous = self.inner.borrow_mut().take();
        if let Some(previous) = previous.filter(|p| !p.is_closed()) {
            trace!(generation = self.generation.get(), "tearing down inner stream");
            previous.cancel();
        }
    }
}

impl<T: 'static, E: 'static> Stream<T, E> {
    /// Map every value to a stream and mirror only the most recent one.
    ///
    /// When a new outer value arrives, the previous inner subscription is
    /// cancelled exactly once before the new inner stream is subscribed.
    /// Errors from either side terminate the result. The result completes
    /// once the outer stream has completed and no inner stream is active.
    pub fn switch_map<U: 'static>(
        &self,
        project: impl Fn(T) -> Stream<U, E> + 'static,
    ) -> Stream<U, E> {
        let source = self.clone();
        let project = Rc::new(project);
        Stream::new(move |downstream: &Sink<U, E>| {
            let state = Rc::new(SwitchState::default());
            let project = project.clone();
            let target = downstream.clone();
            let outer_state = state.clone();

            source.subscribe_within(downstream.subscription(), move |event| match event {
                Event::Next(value) => {
                    let state = &outer_state;
                    let generation = state.generation.get() + 1;
                    state.generation.set(generation);
                    state.cancel_inner();
                    if target.is_stopped() {
                        return;
                    }
                    state.inner_active.set(true);

                    let inner_target = target.clone();
                    let inner_state = outer_state.clone();
                    let inner_sink = Sink::new(move |event| match event {
                        Event::Next(value) => inner_target.next(value),
                        Event::Error(error) => inner_target.error(error),
                        Event::Complete => {
                            if inner_state.generation.get() != generation {
                                return;
                            }
                            inner_state.inner_active.set(false);
                            if inner_state.outer_done.get() {
                                inner_target.complete();
                            }
                        }
                    });
                    *state.inner.borrow_mut() = Some(inner_sink.subscription().clone());
                    target.subscription().add(inner_sink.subscription().clone());
                    project(value).subscribe_sink(&inner_sink);
                }
                Event::Error(error) => target.error(error),
                Event::Complete => {
                    outer_state.outer_done.set(true);
                    if !outer_state.inner_active.get() {
                        target.complete();
                    }
                }
            });
        })
    }
}
