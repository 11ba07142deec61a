mod common;

use common::*;
use protocore::ast::builder::*;
use protocore::ast::Constant;
use protocore::atoms::Operator;
use protocore::runtime::eval::{evaluate, EvalOptions, EvaluationContext};
use protocore::value::Value;
use protocore::ErrorType;

fn scaled_sum() -> protocore::ast::ExprNode {
    // (a, b=10, scale=2) -> (a + b) * scale
    let body = apply(
        Operator::Times,
        vec![apply(Operator::Plus, vec![lookup("a"), lookup("b")]), lookup("scale")],
    );
    lambda_with_defaults(
        &["a", "b", "scale"],
        vec![ret(body)],
        vec![None, Some(Constant::Number(10.0)), Some(Constant::Number(2.0))],
    )
}

#[test]
fn default_marker_matches_omitted_argument() {
    let env = env();
    run(&env, vec![assign("f", scaled_sum())]);
    let omitted = eval_ok(&env, call(lookup("f"), vec![num(1.0)]));
    let marked = eval_ok(&env, call(lookup("f"), vec![num(1.0), default_marker(), default_marker()]));
    assert_eq!(omitted, Value::Number(22.0));
    assert_eq!(omitted, marked);
    let explicit = eval_ok(&env, call(lookup("f"), vec![num(1.0), default_marker(), num(3.0)]));
    assert_eq!(explicit, Value::Number(33.0));
}

#[test]
fn default_marker_without_a_default_fails() {
    let env = env();
    run(&env, vec![assign("f", scaled_sum())]);
    let err = eval(&env, call(lookup("f"), vec![default_marker()])).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Arity);
    assert_eq!(err.message(), "Default value requested for parameter 0, but no default supplied.");
}

#[test]
fn wrong_argument_count() {
    let env = env();
    run(&env, vec![assign("g", lambda_expr(&["x", "y"], lookup("x")))]);
    let err = eval(&env, call(lookup("g"), vec![num(1.0)])).unwrap_err();
    assert_eq!(err.message(), "Function expected 2 parameters, but received 1.");
    let err = eval(&env, call(lookup("g"), vec![num(1.0), num(2.0), num(3.0)])).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Arity);
}

#[test]
fn recursion_through_the_defining_scope() {
    let env = env();
    let n_minus_1 = apply(Operator::Minus, vec![lookup("n"), num(1.0)]);
    let body = if_expr(
        apply(Operator::Leq, vec![lookup("n"), num(1.0)]),
        num(1.0),
        apply(
            Operator::Times,
            vec![lookup("n"), call(lookup("fact"), vec![n_minus_1])],
        ),
    );
    run(&env, vec![assign("fact", lambda_expr(&["n"], body))]);
    assert_eq!(eval_ok(&env, call(lookup("fact"), vec![num(5.0)])), Value::Number(120.0));
}

#[test]
fn runaway_recursion_hits_the_depth_limit() {
    let env = env();
    let body = call(lookup("loop"), vec![lookup("n")]);
    run(&env, vec![assign("loop", lambda_expr(&["n"], body))]);
    let mut context = EvaluationContext::new(EvalOptions {
        max_call_depth: 32,
        ..EvalOptions::default()
    });
    let err = evaluate(&call(lookup("loop"), vec![num(0.0)]), &env, &mut context).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Internal);
    assert_eq!(err.message(), "Recursion limit exceeded: more than 32 nested function calls.");
    assert_eq!(context.depth, 0);
}

fn count_down() -> protocore::ast::ExprNode {
    // n <= 0 ? 0 : 1 + count(n - 1)
    let recurse = call(lookup("count"), vec![apply(Operator::Minus, vec![lookup("n"), num(1.0)])]);
    lambda_expr(
        &["n"],
        if_expr(
            apply(Operator::Leq, vec![lookup("n"), num(0.0)]),
            num(0.0),
            apply(Operator::Plus, vec![num(1.0), recurse]),
        ),
    )
}

#[test]
fn default_depth_limit_is_reached_before_the_stack_runs_out() {
    let env = env();
    run(&env, vec![assign("count", count_down())]);
    let limit = EvalOptions::default().max_call_depth;

    let mut context = EvaluationContext::default();
    let within = call(lookup("count"), vec![num((limit - 1) as f64)]);
    assert_eq!(evaluate(&within, &env, &mut context).unwrap(), Value::Number((limit - 1) as f64));

    let beyond = call(lookup("count"), vec![num((limit + 100) as f64)]);
    let err = evaluate(&beyond, &env, &mut context).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Internal);
    assert_eq!(err.message(), format!("Recursion limit exceeded: more than {limit} nested function calls."));
    assert_eq!(context.depth, 0);
}

#[test]
fn body_without_return_yields_null() {
    let env = env();
    let f = lambda(&["x"], vec![assign("y", lookup("x"))]);
    assert_eq!(eval_ok(&env, call(f, vec![num(1.0)])), Value::Null);
}

#[test]
fn multiple_return_values_form_a_tuple() {
    let env = env();
    let f = lambda(
        &["x"],
        vec![ret_many(vec![lookup("x"), apply(Operator::Times, vec![lookup("x"), lookup("x")])])],
    );
    run(&env, vec![assign_many(&["v", "sq"], call(f, vec![num(3.0)]))]);
    assert_eq!(env.lookup("sq", &loc()).unwrap(), Value::Number(9.0));
}

#[test]
fn parameters_are_local_to_each_call() {
    let env = env();
    define(&env, "x", 100.0);
    run(&env, vec![assign("id", lambda_expr(&["x"], lookup("x")))]);
    assert_eq!(eval_ok(&env, call(lookup("id"), vec![num(1.0)])), Value::Number(1.0));
    assert_eq!(eval_ok(&env, call(lookup("id"), vec![num(2.0)])), Value::Number(2.0));
    assert_eq!(env.lookup("x", &loc()).unwrap(), Value::Number(100.0));
}

#[test]
fn closures_outliving_their_scope_cannot_run() {
    let env = env();
    // make_adder(x) returns a function defined in make_adder's call scope
    let adder = lambda_expr(&["y"], apply(Operator::Plus, vec![lookup("x"), lookup("y")]));
    run(&env, vec![assign("make_adder", lambda_expr(&["x"], adder))]);
    let err = eval(&env, call(call(lookup("make_adder"), vec![num(1.0)]), vec![num(2.0)])).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Internal);
    assert_eq!(err.message(), "The environment this function was defined in no longer exists.");
}

#[test]
fn defaults_must_cover_every_parameter() {
    let env = env();
    let f = lambda_with_defaults(&["a", "b"], vec![ret(lookup("a"))], vec![Some(Constant::Null)]);
    let err = eval(&env, f).unwrap_err();
    assert_eq!(
        err.message(),
        "If default values are given, the vector should have the same size as the number of parameters (2); length was 1."
    );
}
