//! AST module for the protocol language
//!
//! This module provides the expression and statement trees evaluated by the
//! runtime. Trees are produced by an external parser; every node carries the
//! source location string the parser assigned to it, which is what error
//! messages and backtraces report.
//!
//! Trees are `serde`-compatible so a parser running elsewhere can hand one over
//! as JSON.

// ============================================================================
// IMPORTS
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::atoms::Operator;
use crate::value::Value;

pub mod builder;

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Free-form description of where a construct appears in the protocol source.
///
/// # Examples
///
/// ```rust
/// use protocore::ast::Location;
/// let loc = Location::new("protocol.txt:12:4");
/// assert_eq!(loc.as_str(), "protocol.txt:12:4");
/// assert_eq!(Location::default().as_str(), "<anon>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(Arc<str>);

impl Location {
    pub fn new(text: impl AsRef<str>) -> Self {
        Location(Arc::from(text.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::new("<anon>")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wrapper for carrying a source location with any node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithLocation<T> {
    pub value: T,
    #[serde(default)]
    pub location: Location,
}

impl<T> WithLocation<T> {
    /// Replaces the location, keeping the node.
    pub fn located(mut self, location: impl AsRef<str>) -> Self {
        self.location = Location::new(location);
        self
    }
}

/// Canonical expression node type with shared ownership, so closures can keep
/// their bodies without copying the tree.
pub type ExprNode = WithLocation<Arc<Expr>>;

/// Canonical statement node type.
pub type StatementNode = WithLocation<Arc<Statement>>;

/// A literal value embedded in the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Number(f64),
    String(String),
    Null,
    Default,
}

impl Constant {
    pub fn to_value(&self) -> Value {
        match self {
            Constant::Number(n) => Value::Number(*n),
            Constant::String(s) => Value::String(s.as_str().into()),
            Constant::Null => Value::Null,
            Constant::Default => Value::Default,
        }
    }
}

/// Properties of a value queried by an accessor expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Attribute {
    IsSimpleValue,
    IsArray,
    IsString,
    IsFunction,
    IsTuple,
    IsNull,
    IsDefault,
    NumDims,
    NumElements,
    Shape,
}

impl Attribute {
    const ALL: [Attribute; 10] = [
        Attribute::IsSimpleValue,
        Attribute::IsArray,
        Attribute::IsString,
        Attribute::IsFunction,
        Attribute::IsTuple,
        Attribute::IsNull,
        Attribute::IsDefault,
        Attribute::NumDims,
        Attribute::NumElements,
        Attribute::Shape,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::IsSimpleValue => "IS_SIMPLE_VALUE",
            Attribute::IsArray => "IS_ARRAY",
            Attribute::IsString => "IS_STRING",
            Attribute::IsFunction => "IS_FUNCTION",
            Attribute::IsTuple => "IS_TUPLE",
            Attribute::IsNull => "IS_NULL",
            Attribute::IsDefault => "IS_DEFAULT",
            Attribute::NumDims => "NUM_DIMS",
            Attribute::NumElements => "NUM_ELEMENTS",
            Attribute::Shape => "SHAPE",
        }
    }

    /// Decodes the upper-case attribute name used in protocol source.
    pub fn from_name(name: &str) -> Option<Attribute> {
        Attribute::ALL.into_iter().find(|attr| attr.as_str() == name)
    }
}

/// The expression kinds of the protocol language.
///
/// Optional operands (`dim`, `shrink`, `init`, ...) may be omitted or may
/// evaluate to the default marker; both select the documented default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Lookup(String),
    Constant(Constant),
    Tuple(Vec<ExprNode>),
    If {
        test: ExprNode,
        then_branch: ExprNode,
        else_branch: ExprNode,
    },
    Call {
        function: ExprNode,
        args: Vec<ExprNode>,
    },
    Lambda {
        params: Vec<String>,
        body: Vec<StatementNode>,
        defaults: Vec<Option<Constant>>,
    },
    /// An operator wrapped up as a function taking `arity` arguments.
    WrapOperator { operator: Operator, arity: usize },
    /// Array literal: stacks same-shaped elements along a new leading dimension.
    ArrayCreate(Vec<ExprNode>),
    /// Array comprehension; each range evaluates to a `(dim, start, stride, end, name)` tuple.
    Comprehension {
        generator: ExprNode,
        ranges: Vec<ExprNode>,
    },
    /// Each range evaluates to a `(start, stride, end)` or `(dim, start, stride, end)` tuple.
    View {
        array: ExprNode,
        ranges: Vec<ExprNode>,
    },
    Find(ExprNode),
    Index {
        operand: ExprNode,
        indices: ExprNode,
        dim: Option<ExprNode>,
        shrink: Option<ExprNode>,
        pad: Option<ExprNode>,
        pad_value: Option<ExprNode>,
    },
    Fold {
        function: ExprNode,
        array: ExprNode,
        init: Option<ExprNode>,
        dim: Option<ExprNode>,
    },
    Map {
        function: ExprNode,
        arrays: Vec<ExprNode>,
        #[serde(default)]
        broadcast: bool,
    },
    Accessor {
        operand: ExprNode,
        attribute: Attribute,
    },
    Apply {
        operator: Operator,
        operands: Vec<ExprNode>,
    },
}

/// The statement kinds of the protocol language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Binds one name, or several names from a tuple of matching length.
    Assign { names: Vec<String>, rhs: ExprNode },
    Assert(ExprNode),
    /// Yields one value, or a tuple when given several expressions.
    Return(Vec<ExprNode>),
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl Expr {
    /// Short name of the node kind, used in trace output.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Lookup(_) => "lookup",
            Expr::Constant(_) => "constant",
            Expr::Tuple(_) => "tuple",
            Expr::If { .. } => "if",
            Expr::Call { .. } => "call",
            Expr::Lambda { .. } => "lambda",
            Expr::WrapOperator { .. } => "wrap",
            Expr::ArrayCreate(_) => "array",
            Expr::Comprehension { .. } => "comprehension",
            Expr::View { .. } => "view",
            Expr::Find(_) => "find",
            Expr::Index { .. } => "index",
            Expr::Fold { .. } => "fold",
            Expr::Map { .. } => "map",
            Expr::Accessor { .. } => "accessor",
            Expr::Apply { operator, .. } => operator.name(),
        }
    }
}

impl Statement {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Assign { .. } => "assign",
            Statement::Assert(_) => "assert",
            Statement::Return(_) => "return",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::builder::*;
    use super::*;

    #[test]
    fn attribute_names_round_trip() {
        for attr in Attribute::ALL {
            assert_eq!(Attribute::from_name(attr.as_str()), Some(attr));
        }
        assert_eq!(Attribute::from_name("LENGTH"), None);
    }

    #[test]
    fn tree_survives_json() {
        let stmt = assign("y", apply(Operator::Plus, vec![lookup("x"), num(1.0)])).located("p.txt:3");
        let json = serde_json::to_string(&stmt).unwrap();
        let back: StatementNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stmt);
        assert_eq!(back.location.as_str(), "p.txt:3");
    }

    #[test]
    fn missing_location_defaults_to_anon() {
        let node: ExprNode = serde_json::from_str(r#"{"value":{"Lookup":"x"}}"#).unwrap();
        assert_eq!(node.location, Location::default());
        assert_eq!(node.value.kind_name(), "lookup");
    }
}
