//! Structured template tests: JSON documents with template leaves.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use weft_compiler::{
    compile_structure, resolve_structure, Context, ErrorCode, Event, Subject, TemplateError,
    Value,
};

fn collect(source: &serde_json::Value, ctx: &Context) -> Rc<RefCell<Vec<Event<Value, TemplateError>>>> {
    let structure = compile_structure(source).expect("structure compiles");
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    structure
        .evaluate(ctx)
        .expect("evaluator instantiates")
        .subscribe(move |e| sink.borrow_mut().push(e));
    events
}

fn json_of(event: &Event<Value, TemplateError>) -> Option<serde_json::Value> {
    match event {
        Event::Next(value) => value.to_json(),
        _ => None,
    }
}

#[test]
fn test_leaves_resolve_in_place() {
    let source = json!({
        "title": "Hello {{ name }}",
        "count": "{{ n + 1 }}",
        "fixed": 3,
        "items": ["{{ n }}", "plain", { "deep": "{{ [n, name] }}" }, null, true]
    });
    let ctx = Context::new().with("name", "Ada").with("n", 1);
    let resolved = resolve_structure(&source, &ctx).unwrap().unwrap();
    assert_eq!(
        resolved.to_json(),
        Some(json!({
            "title": "Hello Ada",
            "count": 2.0,
            "fixed": 3.0,
            "items": [1.0, "plain", { "deep": [1.0, "Ada"] }, null, true]
        }))
    );
}

#[test]
fn test_input_is_not_mutated() {
    let source = json!({ "a": "{{ 1 }}", "b": ["{{ 2 }}"] });
    let before = source.clone();
    let structure = compile_structure(&source).unwrap();
    structure.evaluate(&Context::new()).unwrap().first_now();
    assert_eq!(source, before);
    assert_eq!(structure.leaf_count(), 2);
}

#[test]
fn test_live_leaf_rebuilds_document() {
    let status = Subject::<Value, TemplateError>::with_value("idle".into());
    let ctx = Context::new().with("status", status.stream());
    let events = collect(&json!({ "state": "{{ status }}", "id": 7 }), &ctx);
    status.next("busy".into());

    let documents: Vec<_> = events.borrow().iter().filter_map(json_of).collect();
    assert_eq!(
        documents,
        vec![
            json!({ "state": "idle", "id": 7.0 }),
            json!({ "state": "busy", "id": 7.0 })
        ]
    );
}

#[test]
fn test_document_without_templates_emits_once() {
    let events = collect(&json!({ "a": [1, 2], "b": "text" }), &Context::new());
    assert_eq!(events.borrow().len(), 2);
    assert!(matches!(events.borrow().last(), Some(Event::Complete)));
    assert_eq!(json_of(&events.borrow()[0]), Some(json!({ "a": [1.0, 2.0], "b": "text" })));
}

#[test]
fn test_top_level_string_template() {
    let resolved = resolve_structure(&json!("{{ 40 + 2 }}"), &Context::new()).unwrap();
    assert_eq!(resolved, Some(Value::Number(42.0)));
}

#[test]
fn test_leaf_syntax_error_aborts_compile() {
    let err = compile_structure(&json!({ "ok": "{{ 1 }}", "bad": ["{{ [1, 2 "] })).unwrap_err();
    assert!(err.is_syntax());
}

#[test]
fn test_unbound_leaf_fails_at_evaluate() {
    let structure = compile_structure(&json!({ "a": "{{ missing }}" })).unwrap();
    let err = structure.evaluate(&Context::new()).unwrap_err();
    assert_eq!(err.code, ErrorCode::UNBOUND_REFERENCE);
}
