//! Latest-value combination.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::stream::{Event, Sink, Stream};

struct CombineState<T> {
    latest: RefCell<Vec<Option<T>>>,
    completed: Cell<usize>,
}

impl<T: Clone + 'static, E: 'static> Stream<T, E> {
    /// Combine streams into a stream of arrays.
    ///
    /// Nothing is emitted until every input has produced a value; after that
    /// each input value emits the array of the latest value from every input,
    /// in input order. The first error from any input terminates the result.
    /// The result completes once every input has completed, or as soon as one
    /// input completes without ever producing a value. With no inputs the
    /// result completes immediately without emitting.
    pub fn combine_latest(sources: Vec<Stream<T, E>>) -> Stream<Vec<T>, E> {
        let sources = Rc::new(sources);
        Stream::new(move |downstream: &Sink<Vec<T>, E>| {
            let count = sources.len();
            if count == 0 {
                downstream.complete();
                return;
            }
            let state = Rc::new(CombineState {
                latest: RefCell::new(vec![None; count]),
                completed: Cell::new(0),
            });

            for (index, source) in sources.iter().enumerate() {
                if downstream.is_stopped() {
                    return;
                }
                let state = state.clone();
                let target = downstream.clone();
                source.subscribe_within(downstream.subscription(), move |event| match event {
                    Event::Next(value) => {
                        let snapshot = {
                            let mut latest = state.latest.borrow_mut();
                            latest[index] = Some(value);
                            latest.iter().cloned().collect::<Option<Vec<T>>>()
                        };
                        if let Some(values) = snapshot {
                            target.next(values);
                        }
                    }
                    Event::Error(error) => target.error(error),
                    Event::Complete => {
                        let done = state.completed.get() + 1;
                        state.completed.set(done);
                        let never_emitted = state.latest.borrow()[index].is_none();
                        if never_emitted || done == count {
                            target.complete();
                        }
                    }
                });
            }
        })
    }
}

/// Free-function form of [`Stream::combine_latest`].
pub fn combine_latest<T: Clone + 'static, E: 'static>(
    sources: Vec<Stream<T, E>>,
) -> Stream<Vec<T>, E> {
    Stream::combine_latest(sources)
}
