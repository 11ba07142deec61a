//! # AST Builder Helpers
//!
//! Terse constructors for expression and statement nodes. Parsers, the
//! standard library and tests use these instead of spelling out
//! `WithLocation { value: Arc::new(...), location }` by hand. Every node is
//! created at the anonymous location; chain `.located(...)` to set one.
//!
//! ```rust
//! use protocore::ast::builder::*;
//! use protocore::atoms::Operator;
//! let stmt = assign("z", apply(Operator::Times, vec![lookup("x"), num(2.0)])).located("line 4");
//! assert_eq!(stmt.location.as_str(), "line 4");
//! ```

use std::sync::Arc;

use crate::ast::{Attribute, Constant, Expr, ExprNode, Location, Statement, StatementNode, WithLocation};
use crate::atoms::Operator;

pub fn expr(value: Expr) -> ExprNode {
    WithLocation {
        value: Arc::new(value),
        location: Location::default(),
    }
}

pub fn statement(value: Statement) -> StatementNode {
    WithLocation {
        value: Arc::new(value),
        location: Location::default(),
    }
}

// --- Expressions ---

pub fn lookup(name: &str) -> ExprNode {
    expr(Expr::Lookup(name.to_string()))
}

pub fn num(value: f64) -> ExprNode {
    expr(Expr::Constant(Constant::Number(value)))
}

pub fn string(value: &str) -> ExprNode {
    expr(Expr::Constant(Constant::String(value.to_string())))
}

pub fn null() -> ExprNode {
    expr(Expr::Constant(Constant::Null))
}

pub fn default_marker() -> ExprNode {
    expr(Expr::Constant(Constant::Default))
}

pub fn tuple(items: Vec<ExprNode>) -> ExprNode {
    expr(Expr::Tuple(items))
}

pub fn if_expr(test: ExprNode, then_branch: ExprNode, else_branch: ExprNode) -> ExprNode {
    expr(Expr::If {
        test,
        then_branch,
        else_branch,
    })
}

pub fn call(function: ExprNode, args: Vec<ExprNode>) -> ExprNode {
    expr(Expr::Call { function, args })
}

pub fn lambda(params: &[&str], body: Vec<StatementNode>) -> ExprNode {
    lambda_with_defaults(params, body, Vec::new())
}

pub fn lambda_with_defaults(
    params: &[&str],
    body: Vec<StatementNode>,
    defaults: Vec<Option<Constant>>,
) -> ExprNode {
    expr(Expr::Lambda {
        params: params.iter().map(|p| p.to_string()).collect(),
        body,
        defaults,
    })
}

/// A lambda whose body is one expression, returned implicitly.
pub fn lambda_expr(params: &[&str], body: ExprNode) -> ExprNode {
    let ret = statement(Statement::Return(vec![body])).located("(Implicit return statement)");
    lambda(params, vec![ret])
}

pub fn wrap(operator: Operator, arity: usize) -> ExprNode {
    expr(Expr::WrapOperator { operator, arity })
}

pub fn array(elements: Vec<ExprNode>) -> ExprNode {
    expr(Expr::ArrayCreate(elements))
}

pub fn comprehension(generator: ExprNode, ranges: Vec<ExprNode>) -> ExprNode {
    expr(Expr::Comprehension { generator, ranges })
}

/// `(dim, start, stride, end, name)` range specification for a comprehension.
pub fn comprehension_range(dim: usize, start: f64, stride: f64, end: f64, name: &str) -> ExprNode {
    tuple(vec![num(dim as f64), num(start), num(stride), num(end), string(name)])
}

pub fn view(array: ExprNode, ranges: Vec<ExprNode>) -> ExprNode {
    expr(Expr::View { array, ranges })
}

/// `(start, stride, end)` view range; `None` bounds mean "to the edge".
pub fn range(start: Option<f64>, stride: f64, end: Option<f64>) -> ExprNode {
    let bound = |b: Option<f64>| b.map_or_else(null, num);
    tuple(vec![bound(start), num(stride), bound(end)])
}

/// `(dim, start, stride, end)` view range; a `None` dimension gives the default range.
pub fn dim_range(dim: Option<usize>, start: Option<f64>, stride: f64, end: Option<f64>) -> ExprNode {
    let bound = |b: Option<f64>| b.map_or_else(null, num);
    tuple(vec![
        dim.map_or_else(null, |d| num(d as f64)),
        bound(start),
        num(stride),
        bound(end),
    ])
}

pub fn find(operand: ExprNode) -> ExprNode {
    expr(Expr::Find(operand))
}

pub fn index(operand: ExprNode, indices: ExprNode) -> ExprNode {
    index_with(operand, indices, None, None, None, None)
}

pub fn index_with(
    operand: ExprNode,
    indices: ExprNode,
    dim: Option<ExprNode>,
    shrink: Option<ExprNode>,
    pad: Option<ExprNode>,
    pad_value: Option<ExprNode>,
) -> ExprNode {
    expr(Expr::Index {
        operand,
        indices,
        dim,
        shrink,
        pad,
        pad_value,
    })
}

pub fn fold(function: ExprNode, array: ExprNode, init: Option<ExprNode>, dim: Option<ExprNode>) -> ExprNode {
    expr(Expr::Fold {
        function,
        array,
        init,
        dim,
    })
}

pub fn map(function: ExprNode, arrays: Vec<ExprNode>) -> ExprNode {
    expr(Expr::Map {
        function,
        arrays,
        broadcast: false,
    })
}

pub fn map_broadcast(function: ExprNode, arrays: Vec<ExprNode>) -> ExprNode {
    expr(Expr::Map {
        function,
        arrays,
        broadcast: true,
    })
}

pub fn accessor(operand: ExprNode, attribute: Attribute) -> ExprNode {
    expr(Expr::Accessor { operand, attribute })
}

pub fn apply(operator: Operator, operands: Vec<ExprNode>) -> ExprNode {
    expr(Expr::Apply { operator, operands })
}

// --- Statements ---

pub fn assign(name: &str, rhs: ExprNode) -> StatementNode {
    assign_many(&[name], rhs)
}

pub fn assign_many(names: &[&str], rhs: ExprNode) -> StatementNode {
    statement(Statement::Assign {
        names: names.iter().map(|n| n.to_string()).collect(),
        rhs,
    })
}

pub fn assert_stmt(assertion: ExprNode) -> StatementNode {
    statement(Statement::Assert(assertion))
}

pub fn ret(value: ExprNode) -> StatementNode {
    statement(Statement::Return(vec![value]))
}

pub fn ret_many(values: Vec<ExprNode>) -> StatementNode {
    statement(Statement::Return(values))
}
