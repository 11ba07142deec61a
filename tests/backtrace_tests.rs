mod common;

use common::*;
use miette::Report;
use protocore::ast::builder::*;
use protocore::ast::Location;
use protocore::ErrorType;

/// `check = lambda x: assert x` defined at line 1, called at line 5.
fn failing_call() -> protocore::ProtoError {
    let env = env();
    let check = lambda(&["x"], vec![assert_stmt(lookup("x")).located("line 2")]).located("line 1");
    env.execute_statement(&assign("check", check).located("line 1"))
        .unwrap();
    let call_site = call(lookup("check"), vec![num(0.0)]).located("line 5");
    env.execute_statement(&assign("result", call_site).located("line 5 statement"))
        .unwrap_err()
}

#[test]
fn frames_run_from_failure_to_top_level() {
    let err = failing_call();
    assert_eq!(err.error_type(), ErrorType::Assertion);
    let locations: Vec<String> = err
        .backtrace()
        .iter()
        .map(|frame| frame.location.as_str().to_string())
        .collect();
    assert_eq!(locations, vec!["line 2", "line 2", "line 1", "line 5", "line 5 statement"]);
    assert_eq!(err.backtrace()[0].message, "Assertion failed: result is zero.");
    assert_eq!(err.location(), &Location::new("line 5 statement"));
}

#[test]
fn rendered_backtrace_lists_innermost_first() {
    let rendered = failing_call().render_backtrace(true);
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines[0], "Assertion error; backtrace (innermost first):");
    assert_eq!(lines[1], "  #0 line 2: Assertion failed: result is zero.");
    assert_eq!(lines.last().copied(), Some("  #4 line 5 statement: Called from line 5 statement"));
}

#[test]
fn miette_report_walks_the_chain() {
    let err = failing_call().with_help("pass a non-zero value");
    let report = Report::new(err);
    let debug = format!("{report:?}");
    assert!(debug.contains("Assertion failed: result is zero."));
    assert!(debug.contains("pass a non-zero value"));
}

#[test]
fn unbound_name_inside_nested_expression() {
    let env = env();
    let e = tuple(vec![num(1.0), lookup("nope").located("line 9")]);
    let err = eval(&env, e).unwrap_err();
    assert_eq!(err.backtrace().len(), 1);
    assert_eq!(err.location(), &Location::new("line 9"));
    assert_eq!(err.to_string(), "Unbound name: Name nope is not defined in this environment.");
}
