//! Weft streams: single-threaded, push-based reactive sources.
//!
//! - [`Stream`]: a cold producer. Each subscription runs it afresh.
//! - [`Sink`]: what a producer pushes into. Stops after one terminal event.
//! - [`Subscription`]: idempotent cancellation with child teardown.
//! - [`Subject`]: a hot source driven from outside, with optional replay.
//! - [`VirtualClock`]: deterministic timers advanced by hand.
//!
//! Operators: [`Stream::map`], [`Stream::try_map`], [`Stream::switch_map`],
//! [`Stream::combine_latest`], [`Stream::catch_error`], [`Stream::take`].

pub mod clock;
pub mod combine;
pub mod stream;
pub mod subject;
pub mod subscription;
mod switch;

pub use clock::VirtualClock;
pub use combine::combine_latest;
pub use stream::{Event, Sink, Stream};
pub use subject::Subject;
pub use subscription::Subscription;
