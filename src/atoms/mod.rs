//! # Operator Atom System
//!
//! This module provides the primitive numeric and boolean operators of the
//! protocol language, named after their MathML counterparts (`plus`, `minus`,
//! `eq`, `arcsin`, ...).
//!
//! ## Module Structure
//!
//! - **`helpers`**: Shared infrastructure for all atoms
//! - **`math`**: Arithmetic (`plus`, `minus`, `times`, `divide`, `power`, `root`, ...)
//! - **`logic`**: Relations and boolean operators (`eq`, `lt`, `and`, `not`, ...)
//! - **`elementary`**: Exponentials, logarithms and trigonometry
//!
//! ## Calling Conventions
//!
//! - `Atom::Pure` atoms receive their operands already evaluated.
//! - `Atom::SpecialForm` atoms receive unevaluated operands and evaluate them
//!   themselves; `and` and `or` use this to short-circuit.
//!
//! Every operator checks its operand count before any operand is evaluated,
//! and checks that every operand is a number before computing.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::ast::{ExprNode, Location};
use crate::diagnostics::ProtoError;
use crate::proto_err;
use crate::runtime::environment::Environment;
use crate::runtime::eval::EvaluationContext;
use crate::value::Value;

pub mod elementary;
pub mod helpers;
pub mod logic;
pub mod math;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Pure atoms: operate only on evaluated operands.
pub type PureAtomFn = fn(args: &[Value], location: &Location) -> Result<Value, ProtoError>;

/// Special forms: control evaluation of their own operands.
pub type SpecialFormFn = fn(
    operands: &[ExprNode],
    env: &Environment,
    context: &mut EvaluationContext,
    location: &Location,
) -> Result<Value, ProtoError>;

/// The two calling conventions of operator atoms.
#[derive(Clone, Copy)]
pub enum Atom {
    Pure(PureAtomFn),
    SpecialForm(SpecialFormFn),
}

/// Number of operands an operator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    Between(usize, usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Arity::Exactly(k) => n == k,
            Arity::Between(lo, hi) => (lo..=hi).contains(&n),
            Arity::AtLeast(k) => n >= k,
            Arity::Any => true,
        }
    }
}

/// The primitive operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Plus,
    Minus,
    Times,
    Divide,
    Max,
    Min,
    Rem,
    Quotient,
    Power,
    Root,
    Abs,
    Floor,
    Ceiling,
    Eq,
    Neq,
    Lt,
    Gt,
    Leq,
    Geq,
    And,
    Or,
    Xor,
    Not,
    Exp,
    Ln,
    Log,
    Sin,
    Cos,
    Tan,
    Sec,
    Csc,
    Cot,
    Sinh,
    Cosh,
    Tanh,
    Sech,
    Csch,
    Coth,
    ArcSin,
    ArcCos,
    ArcTan,
    ArcSec,
    ArcCsc,
    ArcCot,
    ArcSinh,
    ArcCosh,
    ArcTanh,
    ArcSech,
    ArcCsch,
    ArcCoth,
}

impl Operator {
    pub const ALL: [Operator; 50] = [
        Operator::Plus,
        Operator::Minus,
        Operator::Times,
        Operator::Divide,
        Operator::Max,
        Operator::Min,
        Operator::Rem,
        Operator::Quotient,
        Operator::Power,
        Operator::Root,
        Operator::Abs,
        Operator::Floor,
        Operator::Ceiling,
        Operator::Eq,
        Operator::Neq,
        Operator::Lt,
        Operator::Gt,
        Operator::Leq,
        Operator::Geq,
        Operator::And,
        Operator::Or,
        Operator::Xor,
        Operator::Not,
        Operator::Exp,
        Operator::Ln,
        Operator::Log,
        Operator::Sin,
        Operator::Cos,
        Operator::Tan,
        Operator::Sec,
        Operator::Csc,
        Operator::Cot,
        Operator::Sinh,
        Operator::Cosh,
        Operator::Tanh,
        Operator::Sech,
        Operator::Csch,
        Operator::Coth,
        Operator::ArcSin,
        Operator::ArcCos,
        Operator::ArcTan,
        Operator::ArcSec,
        Operator::ArcCsc,
        Operator::ArcCot,
        Operator::ArcSinh,
        Operator::ArcCosh,
        Operator::ArcTanh,
        Operator::ArcSech,
        Operator::ArcCsch,
        Operator::ArcCoth,
    ];

    /// The MathML element name.
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Plus => "plus",
            Operator::Minus => "minus",
            Operator::Times => "times",
            Operator::Divide => "divide",
            Operator::Max => "max",
            Operator::Min => "min",
            Operator::Rem => "rem",
            Operator::Quotient => "quotient",
            Operator::Power => "power",
            Operator::Root => "root",
            Operator::Abs => "abs",
            Operator::Floor => "floor",
            Operator::Ceiling => "ceiling",
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Lt => "lt",
            Operator::Gt => "gt",
            Operator::Leq => "leq",
            Operator::Geq => "geq",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Xor => "xor",
            Operator::Not => "not",
            Operator::Exp => "exp",
            Operator::Ln => "ln",
            Operator::Log => "log",
            Operator::Sin => "sin",
            Operator::Cos => "cos",
            Operator::Tan => "tan",
            Operator::Sec => "sec",
            Operator::Csc => "csc",
            Operator::Cot => "cot",
            Operator::Sinh => "sinh",
            Operator::Cosh => "cosh",
            Operator::Tanh => "tanh",
            Operator::Sech => "sech",
            Operator::Csch => "csch",
            Operator::Coth => "coth",
            Operator::ArcSin => "arcsin",
            Operator::ArcCos => "arccos",
            Operator::ArcTan => "arctan",
            Operator::ArcSec => "arcsec",
            Operator::ArcCsc => "arccsc",
            Operator::ArcCot => "arccot",
            Operator::ArcSinh => "arcsinh",
            Operator::ArcCosh => "arccosh",
            Operator::ArcTanh => "arctanh",
            Operator::ArcSech => "arcsech",
            Operator::ArcCsch => "arccsch",
            Operator::ArcCoth => "arccoth",
        }
    }

    /// Human-readable name used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Operator::Plus => "Plus",
            Operator::Minus => "Minus",
            Operator::Times => "Times",
            Operator::Divide => "Divide",
            Operator::Max => "Max",
            Operator::Min => "Min",
            Operator::Rem => "Remainder",
            Operator::Quotient => "Quotient",
            Operator::Power => "Power",
            Operator::Root => "Root",
            Operator::Abs => "Absolute value",
            Operator::Floor => "Floor",
            Operator::Ceiling => "Ceiling",
            Operator::Eq => "Equality",
            Operator::Neq => "Not-equal",
            Operator::Lt => "Less-than",
            Operator::Gt => "Greater-than",
            Operator::Leq => "Less-than-or-equal",
            Operator::Geq => "Greater-than-or-equal",
            Operator::And => "Boolean 'and'",
            Operator::Or => "Boolean 'or'",
            Operator::Xor => "Boolean 'xor'",
            Operator::Not => "Boolean 'not'",
            Operator::Exp => "Exponential",
            Operator::Ln => "Natural logarithm",
            Operator::Log => "Logarithm",
            Operator::Sin => "Sin",
            Operator::Cos => "Cos",
            Operator::Tan => "Tan",
            Operator::Sec => "Sec",
            Operator::Csc => "Csc",
            Operator::Cot => "Cot",
            Operator::Sinh => "Sinh",
            Operator::Cosh => "Cosh",
            Operator::Tanh => "Tanh",
            Operator::Sech => "Sech",
            Operator::Csch => "Csch",
            Operator::Coth => "Coth",
            Operator::ArcSin => "ArcSin",
            Operator::ArcCos => "ArcCos",
            Operator::ArcTan => "ArcTan",
            Operator::ArcSec => "ArcSec",
            Operator::ArcCsc => "ArcCsc",
            Operator::ArcCot => "ArcCot",
            Operator::ArcSinh => "ArcSinh",
            Operator::ArcCosh => "ArcCosh",
            Operator::ArcTanh => "ArcTanh",
            Operator::ArcSech => "ArcSech",
            Operator::ArcCsch => "ArcCsch",
            Operator::ArcCoth => "ArcCoth",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Operator::Plus | Operator::Times => Arity::Any,
            Operator::Minus | Operator::Root | Operator::Log => Arity::Between(1, 2),
            Operator::Max | Operator::Min | Operator::And | Operator::Or | Operator::Xor => {
                Arity::AtLeast(1)
            }
            Operator::Divide
            | Operator::Rem
            | Operator::Quotient
            | Operator::Power
            | Operator::Eq
            | Operator::Neq
            | Operator::Lt
            | Operator::Gt
            | Operator::Leq
            | Operator::Geq => Arity::Exactly(2),
            _ => Arity::Exactly(1),
        }
    }

    fn arity_message(&self) -> String {
        let label = self.label();
        match (self, self.arity()) {
            (Operator::Root, _) => {
                "Root operator requires 1 operand, optionally with a degree qualifier.".to_string()
            }
            (Operator::Log, _) => {
                "Logarithm operator requires 1 operand, and optionally a logbase qualifier.".to_string()
            }
            (_, Arity::Exactly(1)) => format!("{label} operator requires 1 operand."),
            (_, Arity::Exactly(n)) => format!("{label} operator requires {n} operands."),
            (_, Arity::Between(..)) => format!("{label} operator requires one or two operands."),
            (_, Arity::AtLeast(_)) => format!("{label} operator requires operands."),
            (_, Arity::Any) => format!("{label} operator accepts any number of operands."),
        }
    }

    /// Fails with an arity error unless `n` operands are acceptable.
    pub fn check_arity(&self, n: usize, location: &Location) -> Result<(), ProtoError> {
        if self.arity().accepts(n) {
            Ok(())
        } else {
            Err(proto_err!(Arity, location, "{}", self.arity_message()))
        }
    }

    /// Resolves a MathML element name.
    pub fn from_name(name: &str) -> Option<Operator> {
        OPERATORS_BY_NAME.get(name).copied()
    }

    /// The implementation of this operator.
    pub fn atom(&self) -> Atom {
        match self {
            Operator::Plus => Atom::Pure(math::ATOM_PLUS),
            Operator::Minus => Atom::Pure(math::ATOM_MINUS),
            Operator::Times => Atom::Pure(math::ATOM_TIMES),
            Operator::Divide => Atom::Pure(math::ATOM_DIVIDE),
            Operator::Max => Atom::Pure(math::ATOM_MAX),
            Operator::Min => Atom::Pure(math::ATOM_MIN),
            Operator::Rem => Atom::Pure(math::ATOM_REM),
            Operator::Quotient => Atom::Pure(math::ATOM_QUOTIENT),
            Operator::Power => Atom::Pure(math::ATOM_POWER),
            Operator::Root => Atom::Pure(math::ATOM_ROOT),
            Operator::Abs => Atom::Pure(math::ATOM_ABS),
            Operator::Floor => Atom::Pure(math::ATOM_FLOOR),
            Operator::Ceiling => Atom::Pure(math::ATOM_CEILING),
            Operator::Eq => Atom::Pure(logic::ATOM_EQ),
            Operator::Neq => Atom::Pure(logic::ATOM_NEQ),
            Operator::Lt => Atom::Pure(logic::ATOM_LT),
            Operator::Gt => Atom::Pure(logic::ATOM_GT),
            Operator::Leq => Atom::Pure(logic::ATOM_LEQ),
            Operator::Geq => Atom::Pure(logic::ATOM_GEQ),
            Operator::And => Atom::SpecialForm(logic::ATOM_AND),
            Operator::Or => Atom::SpecialForm(logic::ATOM_OR),
            Operator::Xor => Atom::Pure(logic::ATOM_XOR),
            Operator::Not => Atom::Pure(logic::ATOM_NOT),
            Operator::Exp => Atom::Pure(elementary::ATOM_EXP),
            Operator::Ln => Atom::Pure(elementary::ATOM_LN),
            Operator::Log => Atom::Pure(elementary::ATOM_LOG),
            Operator::Sin => Atom::Pure(elementary::ATOM_SIN),
            Operator::Cos => Atom::Pure(elementary::ATOM_COS),
            Operator::Tan => Atom::Pure(elementary::ATOM_TAN),
            Operator::Sec => Atom::Pure(elementary::ATOM_SEC),
            Operator::Csc => Atom::Pure(elementary::ATOM_CSC),
            Operator::Cot => Atom::Pure(elementary::ATOM_COT),
            Operator::Sinh => Atom::Pure(elementary::ATOM_SINH),
            Operator::Cosh => Atom::Pure(elementary::ATOM_COSH),
            Operator::Tanh => Atom::Pure(elementary::ATOM_TANH),
            Operator::Sech => Atom::Pure(elementary::ATOM_SECH),
            Operator::Csch => Atom::Pure(elementary::ATOM_CSCH),
            Operator::Coth => Atom::Pure(elementary::ATOM_COTH),
            Operator::ArcSin => Atom::Pure(elementary::ATOM_ARCSIN),
            Operator::ArcCos => Atom::Pure(elementary::ATOM_ARCCOS),
            Operator::ArcTan => Atom::Pure(elementary::ATOM_ARCTAN),
            Operator::ArcSec => Atom::Pure(elementary::ATOM_ARCSEC),
            Operator::ArcCsc => Atom::Pure(elementary::ATOM_ARCCSC),
            Operator::ArcCot => Atom::Pure(elementary::ATOM_ARCCOT),
            Operator::ArcSinh => Atom::Pure(elementary::ATOM_ARCSINH),
            Operator::ArcCosh => Atom::Pure(elementary::ATOM_ARCCOSH),
            Operator::ArcTanh => Atom::Pure(elementary::ATOM_ARCTANH),
            Operator::ArcSech => Atom::Pure(elementary::ATOM_ARCSECH),
            Operator::ArcCsch => Atom::Pure(elementary::ATOM_ARCCSCH),
            Operator::ArcCoth => Atom::Pure(elementary::ATOM_ARCCOTH),
        }
    }
}

// Name table, built once; the enum is the single source of truth.
static OPERATORS_BY_NAME: Lazy<im::HashMap<&'static str, Operator>> =
    Lazy::new(|| Operator::ALL.iter().map(|op| (op.name(), *op)).collect());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_to_operators() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_name(op.name()), Some(op));
        }
        assert_eq!(Operator::from_name("arccoth"), Some(Operator::ArcCoth));
        assert!(Operator::from_name("sqrt").is_none());
    }

    #[test]
    fn serde_uses_mathml_names() {
        for op in Operator::ALL {
            let json = serde_json::to_string(&op).unwrap();
            assert_eq!(json, format!("\"{}\"", op.name()));
        }
    }

    #[test]
    fn arity_messages() {
        let loc = Location::default();
        let err = Operator::Minus.check_arity(3, &loc).unwrap_err();
        assert_eq!(err.message(), "Minus operator requires one or two operands.");
        let err = Operator::Max.check_arity(0, &loc).unwrap_err();
        assert_eq!(err.message(), "Max operator requires operands.");
        let err = Operator::Exp.check_arity(2, &loc).unwrap_err();
        assert_eq!(err.message(), "Exponential operator requires 1 operand.");
        assert!(Operator::Plus.check_arity(0, &loc).is_ok());
    }
}
