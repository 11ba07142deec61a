//! # Evaluation Engine
//!
//! Turns expression nodes into values and executes statements against an
//! `Environment`.
//!
//! ## Atom Calling Conventions
//!
//! Operator applications dispatch on the operator's `Atom` variant. `Pure`
//! atoms receive their operands already evaluated; `SpecialForm` atoms
//! (`and`, `or`) receive the unevaluated nodes and decide which to evaluate.
//! Operand counts are checked before anything is evaluated.
//!
//! ## Error Handling
//!
//! Errors are `ProtoError`s built with `proto_err!`. Statement execution,
//! function calls and closure bodies wrap errors passing through them with
//! their own location, so the final error carries a backtrace.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::ast::builder::{apply, lookup, ret};
use crate::ast::{Expr, ExprNode, Statement, StatementNode};
use crate::atoms::Atom;
use crate::diagnostics::{ProtoError, Propagate};
use crate::proto_err;
use crate::runtime::arrays::{self, IndexArgs};
use crate::runtime::closure::Closure;
use crate::runtime::environment::Environment;
use crate::runtime::stack::ensure_sufficient_stack;
use crate::value::Value;

// ===================================================================================================
// CORE DATA STRUCTURES: Evaluation Context
// ===================================================================================================

/// Evaluation limits and tracing switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    /// Nested closure calls allowed before evaluation fails.
    pub max_call_depth: usize,
    /// Emit a `trace` event for every expression result.
    pub trace_results: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            max_call_depth: 512,
            trace_results: false,
        }
    }
}

/// State threaded through one evaluation: the options in force and the
/// current closure call depth.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    pub options: EvalOptions,
    pub depth: usize,
}

impl EvaluationContext {
    pub fn new(options: EvalOptions) -> Self {
        Self { options, depth: 0 }
    }
}

// ===================================================================================================
// PUBLIC API: Expressions
// ===================================================================================================

/// Evaluates an expression node in `env`.
pub fn evaluate(
    expr: &ExprNode,
    env: &Environment,
    context: &mut EvaluationContext,
) -> Result<Value, ProtoError> {
    let value = ensure_sufficient_stack(|| evaluate_expr(expr, env, context))?;
    if context.options.trace_results {
        trace!(kind = expr.value.kind_name(), location = %expr.location, result = %value, "evaluated");
    }
    Ok(value)
}

/// Evaluates nodes left to right, stopping at the first failure.
pub fn evaluate_all(
    exprs: &[ExprNode],
    env: &Environment,
    context: &mut EvaluationContext,
) -> Result<Vec<Value>, ProtoError> {
    exprs.iter().map(|e| evaluate(e, env, context)).collect()
}

fn evaluate_optional(
    expr: Option<&ExprNode>,
    absent: Value,
    env: &Environment,
    context: &mut EvaluationContext,
) -> Result<Value, ProtoError> {
    match expr {
        Some(e) => evaluate(e, env, context),
        None => Ok(absent),
    }
}

fn evaluate_expr(
    expr: &ExprNode,
    env: &Environment,
    context: &mut EvaluationContext,
) -> Result<Value, ProtoError> {
    let loc = &expr.location;
    match &*expr.value {
        Expr::Lookup(name) => env.lookup(name, loc),
        Expr::Constant(constant) => Ok(constant.to_value()),
        Expr::Tuple(items) => Ok(Value::tuple(evaluate_all(items, env, context)?)),
        Expr::If {
            test,
            then_branch,
            else_branch,
        } => {
            let test = evaluate(test, env, context)?;
            let x = test.as_number().ok_or_else(|| {
                proto_err!(KindMismatch, loc, "The test in an if expression must be a simple value.")
            })?;
            if x != 0.0 {
                evaluate(then_branch, env, context)
            } else {
                evaluate(else_branch, env, context)
            }
        }
        Expr::Call { function, args } => {
            let callee = evaluate(function, env, context)?;
            let closure = callee.as_closure().cloned().ok_or_else(|| {
                proto_err!(
                    KindMismatch,
                    loc,
                    "Only functions can be called; this is a {}.",
                    callee.type_name()
                )
            })?;
            let args = evaluate_all(args, env, context)?;
            closure.call(args, context).at(loc)
        }
        Expr::Lambda {
            params,
            body,
            defaults,
        } => {
            let defaults = defaults
                .iter()
                .map(|d| d.as_ref().map(|c| c.to_value()))
                .collect();
            let closure = Closure::new(params.clone(), body.clone(), defaults, env, loc.clone())?;
            Ok(Value::Closure(Rc::new(closure)))
        }
        Expr::WrapOperator { operator, arity } => {
            operator.check_arity(*arity, loc)?;
            let params: Vec<String> = (0..*arity).map(|_| Environment::fresh_ident()).collect();
            let operands = params.iter().map(|p| lookup(p)).collect();
            let body = ret(apply(*operator, operands)).located(loc.as_str());
            let closure = Closure::new(params, vec![body], Vec::new(), env, loc.clone())?;
            Ok(Value::Closure(Rc::new(closure)))
        }
        Expr::ArrayCreate(elements) => {
            let elements = evaluate_all(elements, env, context)?;
            arrays::create_literal(&elements, loc)
        }
        Expr::Comprehension { generator, ranges } => {
            let ranges = evaluate_all(ranges, env, context)?;
            arrays::comprehension(generator, &ranges, env, context, loc)
        }
        Expr::View { array, ranges } => {
            let array = evaluate(array, env, context)?;
            let ranges = evaluate_all(ranges, env, context)?;
            arrays::view(&array, &ranges, loc)
        }
        Expr::Find(operand) => {
            let operand = evaluate(operand, env, context)?;
            arrays::find(&operand, loc)
        }
        Expr::Index {
            operand,
            indices,
            dim,
            shrink,
            pad,
            pad_value,
        } => {
            let args = IndexArgs {
                operand: evaluate(operand, env, context)?,
                indices: evaluate(indices, env, context)?,
                dim: evaluate_optional(dim.as_ref(), Value::Default, env, context)?,
                shrink: evaluate_optional(shrink.as_ref(), Value::Default, env, context)?,
                pad: evaluate_optional(pad.as_ref(), Value::Default, env, context)?,
                pad_value: evaluate_optional(pad_value.as_ref(), Value::Default, env, context)?,
            };
            arrays::index(args, loc)
        }
        Expr::Fold {
            function,
            array,
            init,
            dim,
        } => {
            let function = evaluate(function, env, context)?;
            let array = evaluate(array, env, context)?;
            let init = evaluate_optional(init.as_ref(), Value::Null, env, context)?;
            let dim = evaluate_optional(dim.as_ref(), Value::Default, env, context)?;
            arrays::fold(&function, &array, &init, &dim, context, loc)
        }
        Expr::Map {
            function,
            arrays: operands,
            broadcast,
        } => {
            let function = evaluate(function, env, context)?;
            let operands = evaluate_all(operands, env, context)?;
            arrays::map(&function, &operands, *broadcast, context, loc)
        }
        Expr::Accessor { operand, attribute } => {
            let value = evaluate(operand, env, context)?;
            arrays::accessor(&value, *attribute, loc)
        }
        Expr::Apply { operator, operands } => {
            operator.check_arity(operands.len(), loc)?;
            match operator.atom() {
                Atom::Pure(f) => {
                    let args = evaluate_all(operands, env, context)?;
                    f(&args, loc)
                }
                Atom::SpecialForm(f) => f(operands, env, context, loc),
            }
        }
    }
}

// ===================================================================================================
// PUBLIC API: Statements
// ===================================================================================================

/// Executes one statement, yielding Null unless it is a return.
///
/// Errors are wrapped with the statement's location. A return where
/// `return_allowed` is false fails.
pub fn execute_statement(
    statement: &StatementNode,
    env: &Environment,
    context: &mut EvaluationContext,
    return_allowed: bool,
) -> Result<Value, ProtoError> {
    let loc = &statement.location;
    debug!(kind = statement.value.kind_name(), location = %loc, "executing statement");
    let result = run_statement(statement, env, context).at(loc)?;
    if !result.is_null() && !return_allowed {
        return Err(proto_err!(Internal, loc, "Return statement found in non-function."));
    }
    Ok(result)
}

/// Executes statements in order until one yields a non-Null value, which is
/// returned; Null if none does.
pub fn execute_statements(
    statements: &[StatementNode],
    env: &Environment,
    context: &mut EvaluationContext,
    return_allowed: bool,
) -> Result<Value, ProtoError> {
    for statement in statements {
        let result = execute_statement(statement, env, context, return_allowed)?;
        if !result.is_null() {
            return Ok(result);
        }
    }
    Ok(Value::Null)
}

fn run_statement(
    statement: &StatementNode,
    env: &Environment,
    context: &mut EvaluationContext,
) -> Result<Value, ProtoError> {
    let loc = &statement.location;
    match &*statement.value {
        Statement::Assign { names, rhs } => {
            let value = evaluate(rhs, env, context)?;
            if let [name] = names.as_slice() {
                env.define(name, value, loc)?;
                return Ok(Value::Null);
            }
            let items = value.as_tuple().ok_or_else(|| {
                proto_err!(
                    KindMismatch,
                    loc,
                    "When assigning multiple names the value to assign must be a tuple."
                )
            })?;
            if items.len() != names.len() {
                return Err(proto_err!(
                    Arity,
                    loc,
                    "Cannot assign {} values to {} names.",
                    items.len(),
                    names.len()
                ));
            }
            env.define_names(names, items.to_vec(), loc)?;
            Ok(Value::Null)
        }
        Statement::Assert(assertion) => {
            let value = evaluate(assertion, env, context)?;
            if value.is_null() {
                return Err(proto_err!(Assertion, loc, "Assertion failed: result is Null."));
            }
            match value.as_number() {
                Some(x) if x == 0.0 => Err(proto_err!(Assertion, loc, "Assertion failed: result is zero.")),
                Some(_) => Ok(Value::Null),
                None => Err(proto_err!(
                    KindMismatch,
                    loc,
                    "Assertion did not yield a simple value or null."
                )),
            }
        }
        Statement::Return(exprs) => match exprs.as_slice() {
            [] => Ok(Value::Null),
            [single] => evaluate(single, env, context),
            many => Ok(Value::tuple(evaluate_all(many, env, context)?)),
        },
    }
}
