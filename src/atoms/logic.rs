//! # Logic and Comparison Operations
//!
//! Relations yield 1 for true and 0 for false. Boolean operators treat any
//! non-zero number as true.
//!
//! ## Atoms Provided
//!
//! - **Relations**: `eq`, `neq`, `lt`, `gt`, `leq`, `geq`
//! - **Boolean**: `and`, `or` (special forms, short-circuiting), `xor`, `not`

use crate::atoms::helpers::{binary, numbers, truthy, unary};
use crate::atoms::{PureAtomFn, SpecialFormFn};
use crate::proto_err;
use crate::runtime::eval::evaluate;
use crate::value::Value;

pub const ATOM_EQ: PureAtomFn = |args, loc| {
    let (a, b) = binary(args, "Equality", loc)?;
    Ok(Value::from_bool(a == b))
};

pub const ATOM_NEQ: PureAtomFn = |args, loc| {
    let (a, b) = binary(args, "Not-equal", loc)?;
    Ok(Value::from_bool(a != b))
};

pub const ATOM_LT: PureAtomFn = |args, loc| {
    let (a, b) = binary(args, "Less-than", loc)?;
    Ok(Value::from_bool(a < b))
};

pub const ATOM_GT: PureAtomFn = |args, loc| {
    let (a, b) = binary(args, "Greater-than", loc)?;
    Ok(Value::from_bool(a > b))
};

pub const ATOM_LEQ: PureAtomFn = |args, loc| {
    let (a, b) = binary(args, "Less-than-or-equal", loc)?;
    Ok(Value::from_bool(a <= b))
};

pub const ATOM_GEQ: PureAtomFn = |args, loc| {
    let (a, b) = binary(args, "Greater-than-or-equal", loc)?;
    Ok(Value::from_bool(a >= b))
};

/// Boolean conjunction; stops at the first false operand.
///
/// Usage: (and <a> <b> ...)
///
/// Operands after the first false one are never evaluated, so they may be
/// expressions that would fail.
pub const ATOM_AND: SpecialFormFn = |operands, env, context, loc| {
    for operand in operands {
        let value = evaluate(operand, env, context)?;
        let x = value.as_number().ok_or_else(|| {
            proto_err!(
                KindMismatch,
                loc,
                "Boolean 'and' operator requires its operands to be simple values."
            )
        })?;
        if !truthy(x) {
            return Ok(Value::from_bool(false));
        }
    }
    Ok(Value::from_bool(true))
};

/// Boolean disjunction; stops at the first true operand.
pub const ATOM_OR: SpecialFormFn = |operands, env, context, loc| {
    for operand in operands {
        let value = evaluate(operand, env, context)?;
        let x = value.as_number().ok_or_else(|| {
            proto_err!(
                KindMismatch,
                loc,
                "Boolean 'or' operator requires its operands to be simple values."
            )
        })?;
        if truthy(x) {
            return Ok(Value::from_bool(true));
        }
    }
    Ok(Value::from_bool(false))
};

/// True when an odd number of operands are true.
pub const ATOM_XOR: PureAtomFn = |args, loc| {
    let values = numbers(args, "Boolean 'xor'", loc)?;
    let result = values.into_iter().fold(false, |acc, x| acc ^ truthy(x));
    Ok(Value::from_bool(result))
};

pub const ATOM_NOT: PureAtomFn = |args, loc| {
    let x = unary(args, "Boolean 'not'", loc)?;
    Ok(Value::from_bool(!truthy(x)))
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Location;

    fn run(atom: PureAtomFn, args: &[f64]) -> f64 {
        let values: Vec<Value> = args.iter().map(|n| Value::Number(*n)).collect();
        atom(&values, &Location::default()).unwrap().as_number().unwrap()
    }

    #[test]
    fn relations() {
        assert_eq!(run(ATOM_EQ, &[2.0, 2.0]), 1.0);
        assert_eq!(run(ATOM_NEQ, &[2.0, 2.0]), 0.0);
        assert_eq!(run(ATOM_LT, &[1.0, 2.0]), 1.0);
        assert_eq!(run(ATOM_GT, &[1.0, 2.0]), 0.0);
        assert_eq!(run(ATOM_LEQ, &[2.0, 2.0]), 1.0);
        assert_eq!(run(ATOM_GEQ, &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn boolean_operators() {
        assert_eq!(run(ATOM_XOR, &[1.0, 1.0, 1.0]), 1.0);
        assert_eq!(run(ATOM_XOR, &[1.0, 5.0]), 0.0);
        assert_eq!(run(ATOM_NOT, &[0.0]), 1.0);
        assert_eq!(run(ATOM_NOT, &[-3.0]), 0.0);
    }

    #[test]
    fn relation_rejects_strings() {
        let err = ATOM_LT(&[Value::from("a"), Value::Number(1.0)], &Location::default()).unwrap_err();
        assert_eq!(err.message(), "Less-than operator requires its operands to be simple values.");
    }
}
