mod common;

#[cfg(test)]
mod tests {
    use crate::common::*;
    use pretty_assertions::assert_eq;
    use protocore::ast::builder::*;
    use protocore::ast::Attribute;
    use protocore::atoms::Operator;
    use protocore::value::Value;
    use protocore::ErrorType;

    #[test]
    fn constants_and_tuples() {
        let env = env();
        assert_eq!(eval_ok(&env, num(2.5)), Value::Number(2.5));
        assert_eq!(eval_ok(&env, string("abc")), Value::from("abc"));
        assert_eq!(eval_ok(&env, null()), Value::Null);
        assert_eq!(eval_ok(&env, default_marker()), Value::Default);
        let t = eval_ok(&env, tuple(vec![num(1.0), string("s"), null()]));
        assert_eq!(t.to_string(), "(1, \"s\", null)");
    }

    #[test]
    fn arithmetic_and_relations() {
        let env = env();
        define(&env, "x", 4.0);
        let e = apply(
            Operator::Divide,
            vec![apply(Operator::Plus, vec![lookup("x"), num(2.0), num(2.0)]), num(2.0)],
        );
        assert_eq!(eval_ok(&env, e), Value::Number(4.0));
        assert_eq!(eval_ok(&env, apply(Operator::Lt, vec![lookup("x"), num(5.0)])), Value::Number(1.0));
        assert_eq!(eval_ok(&env, apply(Operator::Minus, vec![lookup("x")])), Value::Number(-4.0));
        assert_eq!(eval_ok(&env, apply(Operator::Not, vec![num(0.0)])), Value::Number(1.0));
    }

    #[test]
    fn operands_must_be_numbers() {
        let env = env();
        let err = eval(&env, apply(Operator::Lt, vec![string("a"), num(1.0)])).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::KindMismatch);
        assert_eq!(err.message(), "Less-than operator requires its operands to be simple values.");
    }

    #[test]
    fn if_requires_a_number_and_skips_other_branch() {
        let env = env();
        let e = if_expr(num(0.0), lookup("unbound"), num(7.0));
        assert_eq!(eval_ok(&env, e), Value::Number(7.0));
        let err = eval(&env, if_expr(string("yes"), num(1.0), num(2.0))).unwrap_err();
        assert_eq!(err.message(), "The test in an if expression must be a simple value.");
    }

    #[test]
    fn or_stops_at_first_true_operand() {
        let env = env();
        let e = apply(Operator::Or, vec![num(1.0), lookup("unbound")]);
        assert_eq!(eval_ok(&env, e), Value::Number(1.0));
        let e = apply(Operator::And, vec![num(1.0), lookup("unbound")]);
        assert_eq!(eval(&env, e).unwrap_err().error_type(), ErrorType::Unbound);
    }

    #[test]
    fn only_functions_can_be_called() {
        let env = env();
        let err = eval(&env, call(num(3.0), vec![])).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::KindMismatch);
        assert_eq!(err.message(), "Only functions can be called; this is a Number.");
    }

    #[test]
    fn accessors_classify_values() {
        let env = env();
        define(&env, "a", counting(&[2, 3]));
        let is = |operand, attribute| eval_ok(&env, accessor(operand, attribute));
        assert_eq!(is(lookup("a"), Attribute::IsArray), Value::Number(1.0));
        assert_eq!(is(num(1.0), Attribute::IsArray), Value::Number(1.0));
        assert_eq!(is(string("s"), Attribute::IsString), Value::Number(1.0));
        assert_eq!(is(wrap(Operator::Plus, 2), Attribute::IsFunction), Value::Number(1.0));
        assert_eq!(is(null(), Attribute::IsNull), Value::Number(1.0));
        assert_eq!(is(tuple(vec![null()]), Attribute::IsSimpleValue), Value::Number(0.0));
        assert_eq!(is(lookup("a"), Attribute::NumElements), Value::Number(6.0));
        assert_eq!(is(lookup("a"), Attribute::Shape).to_string(), "{2,3}");
    }

    #[test]
    fn statements_run_in_order() {
        let env = env();
        run(
            &env,
            vec![
                assign("x", num(2.0)),
                assign("y", apply(Operator::Times, vec![lookup("x"), num(3.0)])),
                assign_many(&["p", "q"], tuple(vec![lookup("y"), string("q")])),
                assert_stmt(apply(Operator::Eq, vec![lookup("p"), num(6.0)])),
            ],
        );
        assert_eq!(env.lookup("q", &loc()).unwrap(), Value::from("q"));
    }

    #[test]
    fn assertion_failures() {
        let env = env();
        let err = env.execute_statement(&assert_stmt(num(0.0))).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Assertion);
        assert_eq!(err.message(), "Assertion failed: result is zero.");

        let err = env.execute_statement(&assert_stmt(null())).unwrap_err();
        assert_eq!(err.message(), "Assertion failed: result is Null.");

        let err = env.execute_statement(&assert_stmt(string("ok"))).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::KindMismatch);
    }

    #[test]
    fn multiple_assignment_checks_shape() {
        let env = env();
        let err = env.execute_statement(&assign_many(&["a", "b"], num(1.0))).unwrap_err();
        assert_eq!(err.message(), "When assigning multiple names the value to assign must be a tuple.");
        let stmt = assign_many(&["a", "b"], tuple(vec![num(1.0), num(2.0), num(3.0)]));
        let err = env.execute_statement(&stmt).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Arity);
        assert_eq!(err.message(), "Cannot assign 3 values to 2 names.");
        assert!(!env.has_name("a"));
    }

    #[test]
    fn return_is_only_allowed_in_functions() {
        let env = env();
        let err = env.execute_statement(&ret(num(1.0))).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Internal);
        assert_eq!(err.message(), "Return statement found in non-function.");

        let value = env.execute_statements(&[assign("z", num(1.0)), ret(lookup("z"))], true).unwrap();
        assert_eq!(value, Value::Number(1.0));
    }

    #[test]
    fn wrapped_operator_checks_arity_up_front() {
        let env = env();
        let err = eval(&env, wrap(Operator::Exp, 2)).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Arity);
        let sum = eval_ok(&env, call(wrap(Operator::Plus, 3), vec![num(1.0), num(2.0), num(3.0)]));
        assert_eq!(sum, Value::Number(6.0));
    }

    #[test]
    fn tracing_does_not_change_results() {
        use protocore::runtime::eval::{evaluate, EvalOptions, EvaluationContext};
        init_tracing();
        let env = env();
        let mut context = EvaluationContext::new(EvalOptions {
            trace_results: true,
            ..EvalOptions::default()
        });
        let e = apply(Operator::Plus, vec![num(1.0), num(2.0)]);
        assert_eq!(evaluate(&e, &env, &mut context).unwrap(), Value::Number(3.0));
        assert_eq!(context.depth, 0);
    }
}
