//! Cancellation tests: unsubscribing a compiled stream releases every
//! nested subscription, timer and observer exactly once.

use std::cell::Cell;
use std::rc::Rc;

use weft_compiler::{
    compile_template, Context, Function, HostError, Subject, Subscription, TemplateError, Value,
    ValueStream, VirtualClock,
};

/// Subscribe and count `Next` events.
fn count(stream: &ValueStream) -> (Rc<Cell<usize>>, Subscription) {
    let emitted = Rc::new(Cell::new(0));
    let counter = emitted.clone();
    let sub = stream.subscribe(move |event| {
        if matches!(event, weft_compiler::Event::Next(_)) {
            counter.set(counter.get() + 1);
        }
    });
    (emitted, sub)
}

fn evaluate(source: &str, ctx: &Context) -> ValueStream {
    compile_template(source)
        .expect("template compiles")
        .evaluate(ctx)
        .expect("evaluator instantiates")
}

fn ticker(clock: &VirtualClock) -> Function {
    let clock = clock.clone();
    Function::unary(move |v| {
        let base = v.as_number().ok_or(HostError::failed("not a number"))?;
        let ticks = clock
            .interval::<TemplateError>(10)
            .map(move |tick| Value::Number(base + tick as f64));
        Ok(ticks.into())
    })
}

#[test]
fn test_cancel_releases_subject_observers() {
    let a = Subject::<Value, TemplateError>::with_value(Value::Number(1.0));
    let b = Subject::<Value, TemplateError>::with_value(Value::Number(2.0));
    let ctx = Context::new().with("a", a.stream()).with("b", b.stream());
    let (emitted, sub) = count(&evaluate("sum {{ a + b }} of {{ [a, b] }}", &ctx));

    assert_eq!(emitted.get(), 1);
    assert_eq!(a.observer_count(), 2);
    assert_eq!(b.observer_count(), 2);

    sub.cancel();
    assert_eq!(a.observer_count(), 0);
    assert_eq!(b.observer_count(), 0);
    a.next(Value::Number(5.0));
    assert_eq!(emitted.get(), 1);
}

#[test]
fn test_cancel_stops_live_pipe_stage() {
    let clock = VirtualClock::new();
    let ctx = Context::new().with("ticker", ticker(&clock));
    let (emitted, sub) = count(&evaluate("{{ 1 | ticker }}", &ctx));

    clock.advance(30);
    assert_eq!(emitted.get(), 3);

    sub.cancel();
    assert_eq!(clock.pending_timers(), 0);
    clock.advance(100);
    assert_eq!(emitted.get(), 3);
}

#[test]
fn test_cancel_reaches_deeply_nested_sources() {
    let clock = VirtualClock::new();
    let x = Subject::<Value, TemplateError>::with_value(Value::Number(0.0));
    let ctx = Context::new()
        .with("x", x.stream())
        .with("ticker", ticker(&clock))
        .with("wrap", Function::unary(|v| Ok(Value::Array(vec![v.clone()]))));
    let stream = evaluate("{{ { tick: wrap(x | ticker)[0], label: \"t\" } }}", &ctx);
    let (emitted, sub) = count(&stream);

    clock.advance(20);
    assert_eq!(emitted.get(), 2);
    x.next(Value::Number(100.0));
    assert_eq!(clock.pending_timers(), 1);

    sub.cancel();
    assert_eq!(clock.pending_timers(), 0);
    assert_eq!(x.observer_count(), 0);
    clock.advance(50);
    x.next(Value::Number(200.0));
    assert_eq!(emitted.get(), 2);
}

#[test]
fn test_switching_call_result_releases_previous_inner() {
    let first = Subject::<Value, TemplateError>::new();
    let second = Subject::<Value, TemplateError>::new();
    let (a, b) = (first.stream(), second.stream());
    let pick = Function::unary(move |which| {
        Ok(match which {
            Value::Number(n) if *n == 1.0 => a.clone().into(),
            _ => b.clone().into(),
        })
    });
    let which = Subject::<Value, TemplateError>::with_value(Value::Number(1.0));
    let ctx = Context::new().with("pick", pick).with("which", which.stream());
    let (emitted, sub) = count(&evaluate("{{ pick(which) }}", &ctx));

    assert_eq!(first.observer_count(), 1);
    which.next(Value::Number(2.0));
    assert_eq!(first.observer_count(), 0);
    assert_eq!(second.observer_count(), 1);

    first.next("stale".into());
    assert_eq!(emitted.get(), 0);
    second.next("fresh".into());
    assert_eq!(emitted.get(), 1);

    sub.cancel();
    assert_eq!(second.observer_count(), 0);
    assert_eq!(which.observer_count(), 0);
}

#[test]
fn test_cancel_is_idempotent() {
    let clock = VirtualClock::new();
    let ctx = Context::new().with("ticker", ticker(&clock));
    let (_, sub) = count(&evaluate("{{ 1 | ticker }}", &ctx));
    sub.cancel();
    sub.cancel();
    assert!(sub.is_closed());
    assert_eq!(clock.pending_timers(), 0);
}

#[test]
fn test_error_releases_everything() {
    let a = Subject::<Value, TemplateError>::new();
    let clock = VirtualClock::new();
    let ctx = Context::new()
        .with("a", a.stream())
        .with("ticker", ticker(&clock));
    let (_, sub) = count(&evaluate("{{ [a * 2, 1 | ticker] }}", &ctx));
    assert_eq!(clock.pending_timers(), 1);

    a.next("x".into());
    assert!(sub.is_closed());
    assert_eq!(a.observer_count(), 0);
    assert_eq!(clock.pending_timers(), 0);
}
