//! # Protocore Test Helpers
//!
//! Shared setup for the integration tests: environments, evaluation shortcuts
//! and array constructors.

#![allow(dead_code)]

use protocore::array::NdArray;
use protocore::ast::{ExprNode, Location, StatementNode};
use protocore::runtime::eval::{evaluate, execute_statements, EvaluationContext};
use protocore::runtime::Environment;
use protocore::value::Value;
use protocore::ProtoError;

/// Installs a test-writer subscriber once; set `RUST_LOG=protocore=trace` to see events.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn loc() -> Location {
    Location::new("test")
}

/// A fresh root environment that does not permit overwriting.
pub fn env() -> Environment {
    Environment::new(false)
}

pub fn eval(env: &Environment, expr: ExprNode) -> Result<Value, ProtoError> {
    evaluate(&expr, env, &mut EvaluationContext::default())
}

/// Evaluates, panicking with the rendered backtrace on failure.
pub fn eval_ok(env: &Environment, expr: ExprNode) -> Value {
    match eval(env, expr) {
        Ok(value) => value,
        Err(e) => panic!("evaluation failed:\n{}", e.render_backtrace(true)),
    }
}

/// Runs top-level statements, panicking with the rendered backtrace on failure.
pub fn run(env: &Environment, statements: Vec<StatementNode>) {
    let mut context = EvaluationContext::default();
    if let Err(e) = execute_statements(&statements, env, &mut context, false) {
        panic!("execution failed:\n{}", e.render_backtrace(true));
    }
}

pub fn nd_array(shape: &[usize], data: &[f64]) -> NdArray {
    NdArray::from_elements(shape.to_vec(), data).expect("data length matches shape")
}

/// A row-major array holding 0, 1, 2, ... of the given shape.
pub fn counting(shape: &[usize]) -> NdArray {
    let n: usize = shape.iter().product();
    let data: Vec<f64> = (0..n).map(|i| i as f64).collect();
    nd_array(shape, &data)
}

pub fn define(env: &Environment, name: &str, value: impl Into<Value>) {
    env.define(name, value.into(), &loc()).expect("name is free");
}

/// Unwraps an array result into (shape, values).
pub fn contents(value: &Value) -> (Vec<usize>, Vec<f64>) {
    let array = value.as_array().expect("value is an array");
    (array.shape().to_vec(), array.to_vec())
}
