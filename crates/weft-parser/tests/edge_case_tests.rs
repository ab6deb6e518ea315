//! Parser edge cases: every malformed input fails with a syntax error that
//! carries a useful offset and snippet.

use weft_parser::parse_template;
use weft_types::{ErrorCategory, ErrorCode, SourceFile, TemplateError};

fn parse_err(source: &str) -> TemplateError {
    let sf = SourceFile::new(source);
    match parse_template(&sf) {
        Ok(t) => panic!("expected an error for {source:?}, got {t:?}"),
        Err(e) => e,
    }
}

fn assert_fails(source: &str, code: ErrorCode, offset: usize) {
    let err = parse_err(source);
    assert_eq!(err.code, code, "{source:?}: {err}");
    assert_eq!(err.offset, offset, "{source:?}: {err}");
}

// ─────────────────────────────────────────────────────────────────────
// Unterminated constructs
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_lone_open_template() {
    assert_fails("{{", ErrorCode::UNTERMINATED, 0);
}

#[test]
fn test_region_without_close() {
    assert_fails("ab {{ x", ErrorCode::UNTERMINATED, 3);
}

#[test]
fn test_unterminated_string() {
    assert_fails("{{ 'abc }}", ErrorCode::UNTERMINATED, 3);
    let err = parse_err("{{ 'abc }}");
    assert!(err.message.contains("String not closed"));
}

#[test]
fn test_unterminated_array() {
    assert_fails("{{ [1, 2", ErrorCode::UNTERMINATED, 3);
    assert!(parse_err("{{ [1, 2").message.contains("Array not terminated"));
}

#[test]
fn test_unterminated_object() {
    assert_fails("{{ { a: 1", ErrorCode::UNTERMINATED, 3);
    assert!(parse_err("{{ { a: 1").message.contains("Object not closed"));
}

#[test]
fn test_unterminated_argument_list() {
    assert_fails("{{ f(1, ", ErrorCode::UNTERMINATED, 4);
    assert!(parse_err("{{ f(1, ").message.contains("Argument list not closed"));
}

#[test]
fn test_innermost_opener_is_reported() {
    // `[` at 5 is the innermost unclosed construct
    assert_fails("{{ f([1", ErrorCode::UNTERMINATED, 5);
}

#[test]
fn test_unterminated_group_and_index() {
    assert_fails("{{ (a", ErrorCode::UNTERMINATED, 3);
    assert_fails("{{ a[0", ErrorCode::UNTERMINATED, 4);
}

#[test]
fn test_dangling_member_access() {
    let err = parse_err("{{ a.");
    assert_eq!(err.code, ErrorCode::UNTERMINATED);
}

// ─────────────────────────────────────────────────────────────────────
// Missing expressions
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_empty_region() {
    assert_fails("{{}}", ErrorCode::EXPECTED_EXPRESSION, 2);
    assert_fails("{{   }}", ErrorCode::EXPECTED_EXPRESSION, 5);
}

#[test]
fn test_pipe_without_right_operand() {
    let err = parse_err("{{ a | }}");
    assert_eq!(err.code, ErrorCode::EXPECTED_EXPRESSION);
    assert_eq!(err.offset, 7);
    assert_eq!(err.snippet, "`{{ a | }}`\n        ^");
}

#[test]
fn test_pipe_without_left_operand() {
    assert_fails("{{ | f }}", ErrorCode::EXPECTED_EXPRESSION, 3);
}

#[test]
fn test_operator_without_operand() {
    assert_fails("{{ * 2 }}", ErrorCode::EXPECTED_EXPRESSION, 3);
    assert_fails("{{ 2 * }}", ErrorCode::EXPECTED_EXPRESSION, 7);
}

#[test]
fn test_leading_dot() {
    assert_fails("{{ .a }}", ErrorCode::EXPECTED_EXPRESSION, 3);
}

// ─────────────────────────────────────────────────────────────────────
// Misplaced tokens
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_nested_region_outside_string() {
    assert_fails("{{ {{ }} }}", ErrorCode::TEMPLATE_OUTSIDE_STRING, 3);
    let err = parse_err("{{ {{ }} }}");
    assert!(err.message.contains("Can only open templates inside strings"));
}

#[test]
fn test_adjacent_operands() {
    assert_fails("{{ a b }}", ErrorCode::UNEXPECTED_TOKEN, 5);
    assert_fails("{{ 1 2 }}", ErrorCode::UNEXPECTED_TOKEN, 5);
    assert_fails("{{ a 'b' }}", ErrorCode::UNEXPECTED_TOKEN, 5);
}

#[test]
fn test_stray_closer_inside_region() {
    assert_fails("{{ a) }}", ErrorCode::UNEXPECTED_TOKEN, 4);
}

#[test]
fn test_missing_comma_between_properties() {
    assert_fails("{{ { a: 1 b: 2 } }}", ErrorCode::UNEXPECTED_TOKEN, 10);
}

#[test]
fn test_quoted_property_name() {
    assert_fails("{{ { 'a': 1 } }}", ErrorCode::UNEXPECTED_TOKEN, 5);
}

#[test]
fn test_missing_colon() {
    assert_fails("{{ { a 1 } }}", ErrorCode::UNEXPECTED_TOKEN, 7);
}

#[test]
fn test_colon_in_expression() {
    assert_fails("{{ : }}", ErrorCode::UNEXPECTED_TOKEN, 3);
}

#[test]
fn test_invalid_token_surfaces_from_lexer() {
    let err = parse_err(r"{{ 'a\n' }}");
    assert_eq!(err.code, ErrorCode::INVALID_TOKEN);
    assert_eq!(err.offset, 5);
    assert_eq!(err.category, ErrorCategory::Lex);
}

// ─────────────────────────────────────────────────────────────────────
// Things that are fine
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_stray_close_outside_region_is_text() {
    let sf = SourceFile::new("a }} b");
    assert!(parse_template(&sf).is_ok());
}

#[test]
fn test_whitespace_everywhere() {
    let sf = SourceFile::new("{{  f (  1 ,  [ 2 ] , { a :  3 } )  .  b  }}");
    assert!(parse_template(&sf).is_ok());
}

#[test]
fn test_errors_are_syntax_category() {
    let err = parse_err("{{ a b }}");
    assert_eq!(err.category, ErrorCategory::Syntax);
    assert!(err.is_syntax());
    assert!(err.to_string().starts_with("At 5; "));
}

#[test]
fn test_long_source_snippet_is_windowed() {
    let source = format!("{}{{{{ a b }}}}", "x".repeat(200));
    let err = parse_err(&source);
    assert_eq!(err.offset, 205);
    let first_line = err.snippet.lines().next().unwrap();
    assert!(first_line.len() < 100);
    assert!(err.snippet.ends_with('^'));
}
