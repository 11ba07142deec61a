//! # Arithmetic Operations
//!
//! Pure arithmetic atoms over `Value::Number` operands.
//!
//! ## Atoms Provided
//!
//! - **Arithmetic**: `plus`, `minus`, `times`, `divide`, `rem`, `quotient`
//! - **Powers**: `power`, `root`
//! - **Math Functions**: `abs`, `floor`, `ceiling`, `max`, `min`
//!
//! Division follows IEEE semantics: dividing by zero yields an infinity or NaN
//! rather than an error, matching how numeric results flow through arrays.

use crate::atoms::helpers::{binary, numbers, qualified, unary};
use crate::atoms::PureAtomFn;
use crate::proto_err;
use crate::value::Value;

/// Adds numbers.
///
/// Usage: (plus <a> <b> ...)
///
///   Returns: Number (sum; 0 with no operands)
///
/// Example:
///   (plus 1 2 3) ; => 6
pub const ATOM_PLUS: PureAtomFn = |args, loc| {
    let values = numbers(args, "Plus", loc)?;
    Ok(Value::Number(values.iter().sum()))
};

/// Negates one number or subtracts the second from the first.
///
/// Usage: (minus <a>) or (minus <a> <b>)
///
/// Example:
///   (minus 5 2) ; => 3
///   (minus 5)   ; => -5
pub const ATOM_MINUS: PureAtomFn = |args, loc| {
    let values = numbers(args, "Minus", loc)?;
    let result = match values.as_slice() {
        [a] => -a,
        [a, b] => a - b,
        _ => {
            return Err(proto_err!(Arity, loc, "Minus operator requires one or two operands."));
        }
    };
    Ok(Value::Number(result))
};

/// Multiplies numbers.
///
/// Usage: (times <a> <b> ...)
///
/// Example:
///   (times 2 3 4) ; => 24
pub const ATOM_TIMES: PureAtomFn = |args, loc| {
    let values = numbers(args, "Times", loc)?;
    Ok(Value::Number(values.iter().product()))
};

/// Divides two numbers.
///
/// Example:
///   (divide 6 2) ; => 3
pub const ATOM_DIVIDE: PureAtomFn = |args, loc| {
    let (a, b) = binary(args, "Divide", loc)?;
    Ok(Value::Number(a / b))
};

/// Largest of one or more numbers.
pub const ATOM_MAX: PureAtomFn = |args, loc| {
    let values = numbers(args, "Max", loc)?;
    Ok(Value::Number(values.into_iter().fold(f64::MIN, f64::max)))
};

/// Smallest of one or more numbers.
pub const ATOM_MIN: PureAtomFn = |args, loc| {
    let values = numbers(args, "Min", loc)?;
    Ok(Value::Number(values.into_iter().fold(f64::MAX, f64::min)))
};

/// Floating-point remainder with the sign of the dividend.
///
/// Example:
///   (rem 7 3) ; => 1
pub const ATOM_REM: PureAtomFn = |args, loc| {
    let (a, b) = binary(args, "Remainder", loc)?;
    Ok(Value::Number(a % b))
};

/// Integer part of the quotient, truncated toward zero.
///
/// Example:
///   (quotient -7 2) ; => -3
pub const ATOM_QUOTIENT: PureAtomFn = |args, loc| {
    let (a, b) = binary(args, "Quotient", loc)?;
    Ok(Value::Number((a / b).trunc()))
};

pub const ATOM_POWER: PureAtomFn = |args, loc| {
    let (a, b) = binary(args, "Power", loc)?;
    Ok(Value::Number(a.powf(b)))
};

/// Square root, or the root of a given degree when a qualifier comes first.
///
/// Example:
///   (root 9)    ; => 3
///   (root 3 27) ; => 3
pub const ATOM_ROOT: PureAtomFn = |args, loc| {
    let (operand, degree) = qualified(args, "Root", loc)?;
    let result = match degree {
        Some(d) if d != 2.0 => operand.powf(1.0 / d),
        _ => operand.sqrt(),
    };
    Ok(Value::Number(result))
};

pub const ATOM_ABS: PureAtomFn = |args, loc| Ok(Value::Number(unary(args, "Absolute value", loc)?.abs()));

pub const ATOM_FLOOR: PureAtomFn = |args, loc| Ok(Value::Number(unary(args, "Floor", loc)?.floor()));

pub const ATOM_CEILING: PureAtomFn = |args, loc| Ok(Value::Number(unary(args, "Ceiling", loc)?.ceil()));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Location;

    fn run(atom: PureAtomFn, args: &[f64]) -> f64 {
        let values: Vec<Value> = args.iter().map(|n| Value::Number(*n)).collect();
        atom(&values, &Location::default()).unwrap().as_number().unwrap()
    }

    #[test]
    fn arithmetic() {
        assert_eq!(run(ATOM_PLUS, &[1.0, 2.0, 3.0]), 6.0);
        assert_eq!(run(ATOM_PLUS, &[]), 0.0);
        assert_eq!(run(ATOM_MINUS, &[5.0]), -5.0);
        assert_eq!(run(ATOM_MINUS, &[5.0, 2.0]), 3.0);
        assert_eq!(run(ATOM_TIMES, &[2.0, 3.0, 4.0]), 24.0);
        assert_eq!(run(ATOM_DIVIDE, &[6.0, 4.0]), 1.5);
        assert!(run(ATOM_DIVIDE, &[1.0, 0.0]).is_infinite());
    }

    #[test]
    fn integer_like_operations() {
        assert_eq!(run(ATOM_REM, &[7.0, 3.0]), 1.0);
        assert_eq!(run(ATOM_REM, &[-7.0, 3.0]), -1.0);
        assert_eq!(run(ATOM_QUOTIENT, &[-7.0, 2.0]), -3.0);
        assert_eq!(run(ATOM_FLOOR, &[-1.5]), -2.0);
        assert_eq!(run(ATOM_CEILING, &[-1.5]), -1.0);
        assert_eq!(run(ATOM_ABS, &[-4.0]), 4.0);
    }

    #[test]
    fn powers_and_extrema() {
        assert_eq!(run(ATOM_POWER, &[2.0, 10.0]), 1024.0);
        assert_eq!(run(ATOM_ROOT, &[9.0]), 3.0);
        assert!((run(ATOM_ROOT, &[3.0, 27.0]) - 3.0).abs() < 1e-12);
        assert_eq!(run(ATOM_MAX, &[1.0, 7.0, -2.0]), 7.0);
        assert_eq!(run(ATOM_MIN, &[1.0, 7.0, -2.0]), -2.0);
    }

    #[test]
    fn non_number_operand_is_rejected() {
        let err = ATOM_TIMES(&[Value::Number(1.0), Value::from("x")], &Location::default()).unwrap_err();
        assert_eq!(err.message(), "Times operator requires its operands to be simple values.");
    }
}
